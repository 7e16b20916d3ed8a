//! Relationship inference tests

use odata_metadata_sdk::config::{ConstraintResolution, MetadataOptions};
use odata_metadata_sdk::error::MetadataError;
use odata_metadata_sdk::inference::{ForeignKeyConvention, infer};
use odata_metadata_sdk::models::{
    EntityContainer, EntitySet, EntityType, Multiplicity, NavigationProperty, Property,
    ReferentialConstraintPair, SchemaDocument,
};

fn product(navigation: NavigationProperty) -> EntityType {
    EntityType::new("Product")
        .with_key(&["ID"])
        .with_property(Property::new("ID", "Edm.Int32").not_null())
        .with_property(Property::new("SupplierID", "Edm.Int32"))
        .with_navigation_property(navigation)
}

fn supplier() -> EntityType {
    EntityType::new("Supplier")
        .with_key(&["ID"])
        .with_property(Property::new("ID", "Edm.Int32").not_null())
}

fn reciprocal_schema(supplier_first: bool) -> SchemaDocument {
    let product =
        product(NavigationProperty::new("Supplier", "Demo.Supplier").with_partner("Products"));
    let supplier = supplier().with_navigation_property(
        NavigationProperty::new("Products", "Collection(Demo.Product)").with_partner("Supplier"),
    );
    let mut schema = SchemaDocument::new("Demo");
    if supplier_first {
        schema.entity_types = vec![supplier, product];
    } else {
        schema.entity_types = vec![product, supplier];
    }
    schema
}

mod pairing_tests {
    use super::*;

    #[test]
    fn test_reciprocal_partners_yield_one_association() {
        for supplier_first in [false, true] {
            let mut schema = reciprocal_schema(supplier_first);
            infer(&mut schema, &MetadataOptions::default()).unwrap();

            assert_eq!(schema.associations.len(), 1);
            let set = &schema.associations[0];
            assert_eq!(set.name, "Product_Supplier");
            assert_eq!(set.association_name, "Demo.Product_Supplier");
            assert!(set.fully_mapped());
        }
    }

    #[test]
    fn test_product_supplier_endpoints() {
        let mut schema = reciprocal_schema(false);
        infer(&mut schema, &MetadataOptions::default()).unwrap();
        let set = &schema.associations[0];

        let [to_one, to_many] = &set.endpoints;
        assert_eq!(to_one.containing_entity_type, "Demo.Product");
        assert_eq!(to_one.multiplicity(), Multiplicity::One);
        assert_eq!(to_one.role, "Product_Supplier_Target");
        assert_eq!(to_many.containing_entity_type, "Demo.Supplier");
        assert_eq!(to_many.multiplicity(), Multiplicity::Many);
        assert_eq!(to_many.role, "Product_Supplier_Source");
    }

    #[test]
    fn test_roles_are_written_onto_navigation_properties() {
        let mut schema = reciprocal_schema(false);
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        let nav = schema
            .entity_type("Product")
            .and_then(|e| e.navigation_property("Supplier"))
            .unwrap();
        assert_eq!(nav.relationship.as_deref(), Some("Demo.Product_Supplier"));
        assert_eq!(nav.to_role.as_deref(), Some("Product_Supplier_Target"));
        assert_eq!(nav.from_role.as_deref(), Some("Product_Supplier_Source"));

        let back = schema
            .entity_type("Supplier")
            .and_then(|e| e.navigation_property("Products"))
            .unwrap();
        assert_eq!(back.to_role.as_deref(), Some("Product_Supplier_Source"));
        assert_eq!(back.from_role.as_deref(), Some("Product_Supplier_Target"));
    }

    #[test]
    fn test_one_sided_navigation_gets_unmapped_partner() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            product(NavigationProperty::new("Supplier", "Demo.Supplier")),
            supplier(),
        ];
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        let set = &schema.associations[0];
        assert!(!set.fully_mapped());
        let unmapped = &set.endpoints[1];
        assert_eq!(unmapped.containing_entity_type, "Demo.Supplier");
        assert_eq!(unmapped.property_name, "Product");
        assert!(unmapped.is_collection);
        assert_eq!(unmapped.navigation_property, None);
    }

    #[test]
    fn test_undeclared_reverse_property_completes_the_association() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            product(NavigationProperty::new("Supplier", "Demo.Supplier")),
            supplier().with_navigation_property(NavigationProperty::new(
                "Products",
                "Collection(Demo.Product)",
            )),
        ];
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        assert_eq!(schema.associations.len(), 1);
        let set = &schema.associations[0];
        assert!(set.fully_mapped());
        assert_eq!(set.endpoints[1].property_name, "Products");
    }

    #[test]
    fn test_undeclared_partners_pair_in_either_order() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            supplier().with_navigation_property(NavigationProperty::new(
                "Products",
                "Collection(Demo.Product)",
            )),
            product(NavigationProperty::new("Supplier", "Demo.Supplier")),
        ];
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        assert_eq!(schema.associations.len(), 1);
        let set = &schema.associations[0];
        assert_eq!(set.name, "Product_Supplier");
        assert!(set.fully_mapped());
        let [to_one, to_many] = &set.endpoints;
        assert_eq!(to_one.containing_entity_type, "Demo.Product");
        assert_eq!(to_one.role, "Product_Supplier_Target");
        assert_eq!(to_many.containing_entity_type, "Demo.Supplier");
        assert_eq!(to_many.role, "Product_Supplier_Source");
        assert_eq!(
            set.referential_constraint.as_ref().unwrap().properties,
            vec![ReferentialConstraintPair::new("SupplierID", "ID")]
        );
    }

    #[test]
    fn test_reverse_property_with_other_cardinality_gets_own_association() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            EntityType::new("Order")
                .with_key(&["ID"])
                .with_property(Property::new("ID", "Edm.Int32"))
                .with_property(Property::new("CustomerID", "Edm.Int32"))
                .with_navigation_property(NavigationProperty::new("Customer", "Demo.Customer")),
            EntityType::new("Customer")
                .with_key(&["ID"])
                .with_property(Property::new("ID", "Edm.Int32"))
                .with_property(Property::new("LastOrderID", "Edm.Int32"))
                .with_navigation_property(NavigationProperty::new("LastOrder", "Demo.Order")),
        ];
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        let names: Vec<&str> = schema.associations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Order_Customer", "Customer_LastOrder"]);
        for set in &schema.associations {
            assert!(!set.fully_mapped());
            assert_eq!(set.endpoints[1].multiplicity(), Multiplicity::Many);
        }
        let dependent = |i: usize| {
            schema.associations[i].referential_constraint.as_ref().unwrap().properties[0]
                .property
                .clone()
        };
        assert_eq!(dependent(0), "CustomerID");
        assert_eq!(dependent(1), "LastOrderID");
    }

    #[test]
    fn test_partner_inference_can_be_disabled() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            product(NavigationProperty::new("Supplier", "Demo.Supplier")),
            supplier(),
        ];
        let options = MetadataOptions {
            infer_navigation_property_partner: false,
            ..Default::default()
        };
        infer(&mut schema, &options).unwrap();

        assert!(schema.associations.is_empty());
        let nav = schema
            .entity_type("Product")
            .and_then(|e| e.navigation_property("Supplier"))
            .unwrap();
        assert_eq!(nav.relationship, None);
    }

    #[test]
    fn test_inference_is_repeatable() {
        let mut schema = reciprocal_schema(false);
        let options = MetadataOptions::default();
        infer(&mut schema, &options).unwrap();
        let first = schema.associations.clone();
        infer(&mut schema, &options).unwrap();
        assert_eq!(schema.associations, first);
    }
}

mod self_reference_tests {
    use super::*;

    fn employee() -> EntityType {
        EntityType::new("Employee")
            .with_key(&["ID"])
            .with_property(Property::new("ID", "Edm.Int32").not_null())
            .with_property(Property::new("ManagerID", "Edm.Int32"))
    }

    #[test]
    fn test_declared_self_reference_has_distinct_roles() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types.push(
            employee()
                .with_navigation_property(
                    NavigationProperty::new("Manager", "Demo.Employee")
                        .with_partner("DirectReports"),
                )
                .with_navigation_property(
                    NavigationProperty::new("DirectReports", "Collection(Demo.Employee)")
                        .with_partner("Manager"),
                ),
        );
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        assert_eq!(schema.associations.len(), 1);
        let set = &schema.associations[0];
        assert!(set.is_self_reference());
        assert_eq!(set.name, "Employee_Manager");
        assert_ne!(set.endpoints[0].role, set.endpoints[1].role);

        let employee = schema.entity_type("Employee").unwrap();
        let manager = employee.navigation_property("Manager").unwrap();
        let reports = employee.navigation_property("DirectReports").unwrap();
        assert_eq!(manager.to_role, reports.from_role);
        assert_eq!(manager.from_role, reports.to_role);
        assert_ne!(manager.to_role, manager.from_role);
    }

    #[test]
    fn test_undeclared_self_references_stay_separate() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types.push(
            employee()
                .with_navigation_property(NavigationProperty::new("Manager", "Demo.Employee"))
                .with_navigation_property(NavigationProperty::new(
                    "DirectReports",
                    "Collection(Demo.Employee)",
                )),
        );
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        let names: Vec<&str> = schema.associations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Employee_Manager", "Employee_DirectReports"]);

        let manager = &schema.associations[0];
        let constraint = manager.referential_constraint.as_ref().unwrap();
        assert_eq!(
            constraint.properties,
            vec![ReferentialConstraintPair::new("ManagerID", "ID")]
        );

        // No foreign key by name on the reverse side; keys are shared instead
        let reports = &schema.associations[1];
        let constraint = reports.referential_constraint.as_ref().unwrap();
        assert_eq!(
            constraint.properties,
            vec![ReferentialConstraintPair::new("ID", "ID")]
        );
    }
}

mod many_to_many_tests {
    use super::*;

    fn schema() -> SchemaDocument {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            EntityType::new("Product")
                .with_key(&["ID"])
                .with_property(Property::new("ID", "Edm.Int32"))
                .with_navigation_property(
                    NavigationProperty::new("Categories", "Collection(Demo.Category)")
                        .with_partner("Products"),
                ),
            EntityType::new("Category")
                .with_key(&["ID"])
                .with_property(Property::new("ID", "Edm.Int32"))
                .with_navigation_property(
                    NavigationProperty::new("Products", "Collection(Demo.Product)")
                        .with_partner("Categories"),
                ),
        ];
        schema
    }

    #[test]
    fn test_many_to_many_rejected_by_default() {
        let mut schema = schema();
        let err = infer(&mut schema, &MetadataOptions::default()).unwrap_err();
        assert_eq!(
            err,
            MetadataError::DisallowedManyToMany("Demo.Category_Products".to_string())
        );
    }

    #[test]
    fn test_many_to_many_allowed_has_two_many_ends() {
        let mut schema = schema();
        let options = MetadataOptions {
            allow_many_to_many: true,
            ..Default::default()
        };
        infer(&mut schema, &options).unwrap();

        let set = &schema.associations[0];
        assert!(set.is_many_to_many());
        assert!(set.endpoints.iter().all(|e| e.multiplicity() == Multiplicity::Many));
        assert_eq!(set.referential_constraint, None);
    }
}

mod constraint_tests {
    use super::*;

    #[test]
    fn test_convention_finds_foreign_key() {
        let mut schema = reciprocal_schema(false);
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        let constraint = schema.associations[0].referential_constraint.as_ref().unwrap();
        assert_eq!(constraint.dependent_entity_type, "Demo.Product");
        assert_eq!(constraint.principal_entity_type, "Demo.Supplier");
        assert_eq!(
            constraint.properties,
            vec![ReferentialConstraintPair::new("SupplierID", "ID")]
        );
    }

    #[test]
    fn test_declared_constraint_wins() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            product(
                NavigationProperty::new("Supplier", "Demo.Supplier")
                    .with_constraint("VendorRef", "ID"),
            )
            .with_property(Property::new("VendorRef", "Edm.Int32")),
            supplier(),
        ];
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        let constraint = schema.associations[0].referential_constraint.as_ref().unwrap();
        assert_eq!(
            constraint.properties,
            vec![ReferentialConstraintPair::new("VendorRef", "ID")]
        );
    }

    #[test]
    fn test_shared_key_first_prefers_keys() {
        let mut schema = reciprocal_schema(false);
        let options = MetadataOptions {
            constraint_resolution: ConstraintResolution::SharedKeyFirst,
            ..Default::default()
        };
        infer(&mut schema, &options).unwrap();

        let constraint = schema.associations[0].referential_constraint.as_ref().unwrap();
        assert_eq!(
            constraint.properties,
            vec![ReferentialConstraintPair::new("ID", "ID")]
        );
    }

    #[test]
    fn test_custom_convention_runs_before_built_ins() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            product(NavigationProperty::new("Supplier", "Demo.Supplier"))
                .with_property(Property::new("Supplier_ID", "Edm.Int32")),
            supplier(),
        ];
        let options = MetadataOptions::default().with_foreign_key_convention(
            ForeignKeyConvention::custom(|endpoint, key| {
                Some(format!("{}_{}", endpoint.property_name, key))
            }),
        );
        infer(&mut schema, &options).unwrap();

        let constraint = schema.associations[0].referential_constraint.as_ref().unwrap();
        assert_eq!(
            constraint.properties,
            vec![ReferentialConstraintPair::new("Supplier_ID", "ID")]
        );
    }

    #[test]
    fn test_unresolvable_constraint_is_an_error() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            EntityType::new("Order")
                .with_key(&["ID", "Revision"])
                .with_property(Property::new("ID", "Edm.Int32"))
                .with_property(Property::new("Revision", "Edm.Int32"))
                .with_navigation_property(NavigationProperty::new("Customer", "Demo.Customer")),
            EntityType::new("Customer")
                .with_key(&["ID"])
                .with_property(Property::new("ID", "Edm.Int32")),
        ];
        let err = infer(&mut schema, &MetadataOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::UnresolvedReferentialConstraint { ref association, .. }
                if association == "Demo.Order_Customer"
        ));
    }

    #[test]
    fn test_shared_key_fallback_can_be_disabled() {
        let mut schema = SchemaDocument::new("Demo");
        schema.entity_types = vec![
            EntityType::new("Profile")
                .with_key(&["ID"])
                .with_property(Property::new("ID", "Edm.Int32"))
                .with_navigation_property(NavigationProperty::new("Account", "Demo.Account")),
            EntityType::new("Account")
                .with_key(&["ID"])
                .with_property(Property::new("ID", "Edm.Int32")),
        ];
        let options = MetadataOptions {
            infer_referential_constraints: false,
            ..Default::default()
        };
        assert!(matches!(
            infer(&mut schema, &options),
            Err(MetadataError::UnresolvedReferentialConstraint { .. })
        ));
        assert!(infer(&mut schema, &MetadataOptions::default()).is_ok());
    }
}

mod lookup_tests {
    use super::*;

    #[test]
    fn test_missing_target_names_the_type() {
        let mut schema = SchemaDocument::new("Demo");
        schema
            .entity_types
            .push(product(NavigationProperty::new("Supplier", "Demo.Vendor")));
        let err = infer(&mut schema, &MetadataOptions::default()).unwrap_err();
        assert_eq!(err, MetadataError::EntityNotFound("Demo.Vendor".to_string()));
        assert_eq!(err.to_string(), "Entity type not found: Demo.Vendor");
    }

    #[test]
    fn test_target_in_other_namespace_is_not_found() {
        let mut schema = SchemaDocument::new("Demo");
        schema
            .entity_types
            .push(product(NavigationProperty::new("Supplier", "Other.Supplier")));
        assert_eq!(
            infer(&mut schema, &MetadataOptions::default()).unwrap_err(),
            MetadataError::EntityNotFound("Other.Supplier".to_string())
        );
    }

    #[test]
    fn test_alias_qualified_targets_resolve() {
        let mut schema = SchemaDocument::new("Demo");
        schema.alias = Some("d".to_string());
        schema.entity_types = vec![
            product(NavigationProperty::new("Supplier", "d.Supplier")),
            supplier(),
        ];
        infer(&mut schema, &MetadataOptions::default()).unwrap();
        assert_eq!(
            schema.associations[0].endpoints[0].partner_entity_type,
            "Demo.Supplier"
        );
    }

    #[test]
    fn test_container_association_sets_bind_entity_sets() {
        let mut schema = reciprocal_schema(false);
        let mut container = EntityContainer::new("Catalog");
        container.entity_sets = vec![
            EntitySet::new("Products", "Demo.Product"),
            EntitySet::new("Suppliers", "Demo.Supplier"),
        ];
        schema.entity_container = Some(container);
        infer(&mut schema, &MetadataOptions::default()).unwrap();

        let container = schema.entity_container.as_ref().unwrap();
        assert_eq!(container.association_sets.len(), 1);
        let set = &container.association_sets[0];
        assert_eq!(set.association, "Demo.Product_Supplier");
        assert_eq!(set.ends[0].role, "Product_Supplier_Target");
        assert_eq!(set.ends[0].entity_set.as_deref(), Some("Suppliers"));
        assert_eq!(set.ends[1].entity_set.as_deref(), Some("Products"));
    }
}

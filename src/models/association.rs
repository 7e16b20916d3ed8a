//! Association model produced by relationship inference

use super::schema::{NavigationProperty, ReferentialConstraintPair, short_name};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Association end multiplicity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "*")]
    Many,
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Multiplicity::One => f.write_str("1"),
            Multiplicity::Many => f.write_str("*"),
        }
    }
}

/// One side of an association.
///
/// A mapped endpoint is backed by a navigation property declared on
/// `containing_entity_type`; an unmapped endpoint was synthesized for a
/// relationship only the other side declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationEndpoint {
    /// Qualified name of the type the property lives on
    pub containing_entity_type: String,
    /// Qualified name of the type the property navigates to
    pub partner_entity_type: String,
    pub property_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_property: Option<String>,
    pub is_collection: bool,
    #[serde(default)]
    pub role: String,
    #[serde(skip)]
    pub declares_constraint: bool,
}

impl AssociationEndpoint {
    pub fn mapped(
        containing_entity_type: impl Into<String>,
        partner_entity_type: impl Into<String>,
        navigation: &NavigationProperty,
    ) -> Self {
        Self {
            containing_entity_type: containing_entity_type.into(),
            partner_entity_type: partner_entity_type.into(),
            property_name: navigation.name.clone(),
            navigation_property: Some(navigation.name.clone()),
            is_collection: navigation.is_collection(),
            role: String::new(),
            declares_constraint: !navigation.referential_constraints.is_empty(),
        }
    }

    /// Synthesized counterpart of `partner`, which must be mapped.
    ///
    /// The unmapped side is named after the type it points back to and has
    /// the opposite collection flag (a to-one property implies a collection
    /// on the other side and vice versa).
    pub fn unmapped_partner_of(partner: &AssociationEndpoint) -> Self {
        Self {
            containing_entity_type: partner.partner_entity_type.clone(),
            partner_entity_type: partner.containing_entity_type.clone(),
            property_name: short_name(&partner.containing_entity_type).to_string(),
            navigation_property: None,
            is_collection: !partner.is_collection,
            role: String::new(),
            declares_constraint: false,
        }
    }

    /// Back this endpoint with `navigation`, replacing any synthesized values.
    pub fn attach(&mut self, navigation: &NavigationProperty) {
        self.property_name = navigation.name.clone();
        self.navigation_property = Some(navigation.name.clone());
        self.is_collection = navigation.is_collection();
        self.declares_constraint = !navigation.referential_constraints.is_empty();
    }

    pub fn is_mapped(&self) -> bool {
        self.navigation_property.is_some()
    }

    pub fn multiplicity(&self) -> Multiplicity {
        if self.is_collection {
            Multiplicity::Many
        } else {
            Multiplicity::One
        }
    }

    /// Sort rank: mapped to-one, then mapped collection, then unmapped
    pub fn order(&self) -> u8 {
        match (self.is_mapped(), self.is_collection) {
            (true, false) => 0,
            (true, true) => 1,
            (false, _) => 2,
        }
    }

    /// `{containingShortName}_{propertyName}`
    pub fn property_role(&self) -> String {
        format!(
            "{}_{}",
            short_name(&self.containing_entity_type),
            self.property_name
        )
    }

    fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.order()
            .cmp(&other.order())
            .then_with(|| other.declares_constraint.cmp(&self.declares_constraint))
            .then_with(|| self.property_role().cmp(&other.property_role()))
    }
}

/// Referential constraint resolved for an association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReferentialConstraint {
    pub principal_role: String,
    pub principal_entity_type: String,
    pub dependent_role: String,
    pub dependent_entity_type: String,
    /// `property` on the dependent, `referenced_property` on the principal
    pub properties: Vec<ReferentialConstraintPair>,
}

/// A bidirectional relationship between two entity types
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::models::{AssociationEndpoint, AssociationSet, Multiplicity, NavigationProperty};
///
/// let supplier = NavigationProperty::new("Supplier", "Demo.Supplier");
/// let endpoint = AssociationEndpoint::mapped("Demo.Product", "Demo.Supplier", &supplier);
/// let partner = AssociationEndpoint::unmapped_partner_of(&endpoint);
/// let set = AssociationSet::new("Demo", partner, endpoint);
///
/// assert_eq!(set.name, "Product_Supplier");
/// assert_eq!(set.association_name, "Demo.Product_Supplier");
/// assert_eq!(set.endpoints[0].multiplicity(), Multiplicity::One);
/// assert_eq!(set.endpoints[1].role, "Product_Supplier_Source");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationSet {
    pub namespace: String,
    pub name: String,
    pub association_name: String,
    pub endpoints: [AssociationEndpoint; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referential_constraint: Option<ResolvedReferentialConstraint>,
}

impl AssociationSet {
    pub fn new(
        namespace: impl Into<String>,
        first: AssociationEndpoint,
        second: AssociationEndpoint,
    ) -> Self {
        let mut set = Self {
            namespace: namespace.into(),
            name: String::new(),
            association_name: String::new(),
            endpoints: [first, second],
            referential_constraint: None,
        };
        set.normalize();
        set
    }

    /// Re-sort the endpoints and recompute names and roles.
    pub fn normalize(&mut self) {
        if self.endpoints[0].canonical_cmp(&self.endpoints[1]) == Ordering::Greater {
            self.endpoints.swap(0, 1);
        }
        self.name = self.endpoints[0].property_role();
        self.association_name = format!("{}.{}", self.namespace, self.name);
        self.endpoints[0].role = format!("{}_Target", self.name);
        self.endpoints[1].role = format!("{}_Source", self.name);
    }

    pub fn fully_mapped(&self) -> bool {
        self.endpoints.iter().all(AssociationEndpoint::is_mapped)
    }

    pub fn is_self_reference(&self) -> bool {
        self.endpoints[0].containing_entity_type == self.endpoints[0].partner_entity_type
    }

    pub fn is_many_to_many(&self) -> bool {
        self.endpoints.iter().all(|e| e.is_collection)
    }

    /// Index of the endpoint backed by `navigation` on `entity_type`
    pub fn endpoint_index(&self, entity_type: &str, navigation: &str) -> Option<usize> {
        self.endpoints.iter().position(|e| {
            e.containing_entity_type == entity_type
                && e.navigation_property.as_deref() == Some(navigation)
        })
    }

    /// The to-one endpoint whose containing type holds the foreign key.
    ///
    /// `None` for many-to-many associations.
    pub fn dependent_index(&self) -> Option<usize> {
        self.endpoints.iter().position(|e| !e.is_collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_supplier() -> AssociationEndpoint {
        let nav = NavigationProperty::new("Supplier", "Demo.Supplier");
        AssociationEndpoint::mapped("Demo.Product", "Demo.Supplier", &nav)
    }

    #[test]
    fn unmapped_partner_mirrors_the_mapped_side() {
        let mapped = product_supplier();
        let unmapped = AssociationEndpoint::unmapped_partner_of(&mapped);
        assert_eq!(unmapped.containing_entity_type, "Demo.Supplier");
        assert_eq!(unmapped.partner_entity_type, "Demo.Product");
        assert_eq!(unmapped.property_name, "Product");
        assert!(unmapped.is_collection);
        assert!(!unmapped.is_mapped());
        assert_eq!(unmapped.order(), 2);
    }

    #[test]
    fn endpoints_sort_by_order() {
        let mapped = product_supplier();
        let unmapped = AssociationEndpoint::unmapped_partner_of(&mapped);
        let set = AssociationSet::new("Demo", unmapped, mapped);
        assert!(set.endpoints[0].is_mapped());
        assert!(!set.fully_mapped());
        assert_eq!(set.endpoints[0].role, "Product_Supplier_Target");
        assert_eq!(set.dependent_index(), Some(0));
    }

    #[test]
    fn attaching_upgrades_an_unmapped_endpoint() {
        let mapped = product_supplier();
        let mut unmapped = AssociationEndpoint::unmapped_partner_of(&mapped);
        unmapped.attach(&NavigationProperty::new(
            "Products",
            "Collection(Demo.Product)",
        ));
        let set = AssociationSet::new("Demo", unmapped, mapped);
        assert!(set.fully_mapped());
        assert_eq!(set.endpoints[1].property_role(), "Supplier_Products");
        assert_eq!(set.endpoints[1].multiplicity(), Multiplicity::Many);
    }

    #[test]
    fn multiplicity_renders_as_symbol() {
        assert_eq!(Multiplicity::One.to_string(), "1");
        assert_eq!(
            serde_json::to_value(Multiplicity::Many).unwrap(),
            serde_json::json!("*")
        );
    }
}

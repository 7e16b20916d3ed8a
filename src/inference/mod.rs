//! Relationship inference
//!
//! Builds bidirectional associations from the one-directional navigation
//! properties of a schema. The pass runs in three steps:
//!
//! 1. pair navigation properties into associations, attaching declared
//!    partners and synthesizing unmapped endpoints for one-sided properties,
//! 2. gate many-to-many associations and resolve referential constraints,
//! 3. write relationship names and roles back onto the navigation properties
//!    and register the associations on the schema and its container.
//!
//! All working state lives inside one [`infer`] call.

pub mod conventions;

pub use conventions::{ConventionFn, ForeignKeyConvention};

use crate::config::{ConstraintResolution, MetadataOptions};
use crate::error::{MetadataError, MetadataResult};
use crate::models::{
    AssociationEndpoint, AssociationSet, AssociationSetEnd, ContainerAssociationSet, EntityType,
    NavigationProperty, ReferentialConstraintPair, ResolvedReferentialConstraint, SchemaDocument,
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Populate `schema.associations` and the container's association sets.
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::config::MetadataOptions;
/// use odata_metadata_sdk::inference::infer;
/// use odata_metadata_sdk::models::{EntityType, NavigationProperty, Property, SchemaDocument};
///
/// let mut schema = SchemaDocument::new("Demo");
/// schema.entity_types.push(
///     EntityType::new("Product")
///         .with_key(&["ID"])
///         .with_property(Property::new("ID", "Edm.Int32"))
///         .with_property(Property::new("SupplierID", "Edm.Int32"))
///         .with_navigation_property(NavigationProperty::new("Supplier", "Demo.Supplier")),
/// );
/// schema.entity_types.push(
///     EntityType::new("Supplier")
///         .with_key(&["ID"])
///         .with_property(Property::new("ID", "Edm.Int32")),
/// );
///
/// infer(&mut schema, &MetadataOptions::default()).unwrap();
/// assert_eq!(schema.associations.len(), 1);
/// assert_eq!(schema.associations[0].name, "Product_Supplier");
/// ```
pub fn infer(schema: &mut SchemaDocument, options: &MetadataOptions) -> MetadataResult<()> {
    AssociationInferrer::new(options).infer(schema)
}

/// Association under construction during pairing
#[derive(Debug)]
struct PendingAssociation {
    endpoints: [AssociationEndpoint; 2],
    /// Set for self-references so each navigation property gets its own association
    discriminator: Option<String>,
}

impl PendingAssociation {
    fn links(&self, a: &str, b: &str) -> bool {
        let [first, second] = &self.endpoints;
        (first.containing_entity_type == a && second.containing_entity_type == b)
            || (first.containing_entity_type == b && second.containing_entity_type == a)
    }

    /// Unmapped endpoint on `entity_type` with the same cardinality as `nav`
    fn unmapped_endpoint_for(&self, entity_type: &str, nav: &NavigationProperty) -> Option<usize> {
        self.endpoints.iter().position(|e| {
            !e.is_mapped()
                && e.containing_entity_type == entity_type
                && e.is_collection == nav.is_collection()
        })
    }
}

/// Relationship inference engine configured by [`MetadataOptions`]
pub struct AssociationInferrer<'a> {
    options: &'a MetadataOptions,
    conventions: Vec<ForeignKeyConvention>,
}

impl<'a> AssociationInferrer<'a> {
    pub fn new(options: &'a MetadataOptions) -> Self {
        Self {
            options,
            conventions: options.effective_conventions(),
        }
    }

    pub fn infer(&self, schema: &mut SchemaDocument) -> MetadataResult<()> {
        let pending = self.pair(schema)?;

        let mut associations = Vec::with_capacity(pending.len());
        for candidate in pending {
            let [first, second] = candidate.endpoints;
            let mut set = AssociationSet::new(schema.namespace.clone(), first, second);
            if set.is_many_to_many() {
                if !self.options.allow_many_to_many {
                    return Err(MetadataError::DisallowedManyToMany(set.association_name));
                }
                debug!("Association {} is many-to-many", set.association_name);
            } else {
                set.referential_constraint = Some(self.resolve_constraint(schema, &set)?);
            }
            associations.push(set);
        }

        assign_roles(schema, &associations);
        register_container_sets(schema, &associations);
        info!(
            "Inferred {} associations for schema {}",
            associations.len(),
            schema.namespace
        );
        schema.associations = associations;
        Ok(())
    }

    fn pair(&self, schema: &SchemaDocument) -> MetadataResult<Vec<PendingAssociation>> {
        let mut pending: Vec<PendingAssociation> = Vec::new();
        let mut covered: HashSet<(String, String)> = HashSet::new();

        for entity in &schema.entity_types {
            let source = schema.qualified_name(&entity.name);
            for nav in &entity.navigation_properties {
                if !covered.insert((source.clone(), nav.name.clone())) {
                    continue;
                }
                let target_entity = schema.entity_type(nav.target_type()).ok_or_else(|| {
                    MetadataError::EntityNotFound(schema.canonical_name(nav.target_type()))
                })?;
                let target = schema.qualified_name(&target_entity.name);
                let self_reference = source == target;
                let mapped = AssociationEndpoint::mapped(&source, &target, nav);

                if let Some(partner_nav) = explicit_partner(schema, &source, nav, target_entity) {
                    debug!(
                        "Navigation property {}.{} pairs with declared partner {}.{}",
                        entity.name, nav.name, target_entity.name, partner_nav.name
                    );
                    covered.insert((target.clone(), partner_nav.name.clone()));
                    let partner = AssociationEndpoint::mapped(&target, &source, partner_nav);
                    pending.push(PendingAssociation {
                        endpoints: [mapped, partner],
                        discriminator: self_reference.then(|| nav.name.clone()),
                    });
                    continue;
                }

                if !self_reference
                    && let Some(existing) = pending.iter_mut().find(|p| {
                        p.discriminator.is_none()
                            && p.links(&source, &target)
                            && p.unmapped_endpoint_for(&source, nav).is_some()
                    })
                    && let Some(idx) = existing.unmapped_endpoint_for(&source, nav)
                {
                    debug!(
                        "Navigation property {}.{} completes an inferred association",
                        entity.name, nav.name
                    );
                    existing.endpoints[idx].attach(nav);
                    continue;
                }

                if !self.options.infer_navigation_property_partner {
                    debug!(
                        "Skipping {}.{}: no declared partner and partner inference is disabled",
                        entity.name, nav.name
                    );
                    continue;
                }
                let unmapped = AssociationEndpoint::unmapped_partner_of(&mapped);
                pending.push(PendingAssociation {
                    endpoints: [mapped, unmapped],
                    discriminator: self_reference.then(|| nav.name.clone()),
                });
            }
        }
        Ok(pending)
    }

    fn resolve_constraint(
        &self,
        schema: &SchemaDocument,
        set: &AssociationSet,
    ) -> MetadataResult<ResolvedReferentialConstraint> {
        if let Some(explicit) = explicit_constraint(schema, set) {
            return Ok(explicit);
        }

        let unresolved = |dependent: &str, principal: &str| {
            MetadataError::UnresolvedReferentialConstraint {
                association: set.association_name.clone(),
                dependent: dependent.to_string(),
                principal: principal.to_string(),
            }
        };
        let Some(dep_idx) = set.dependent_index() else {
            return Err(unresolved("", ""));
        };
        let dependent_end = &set.endpoints[dep_idx];
        let principal_end = &set.endpoints[1 - dep_idx];
        let dependent_name = &dependent_end.containing_entity_type;
        let principal_name = &dependent_end.partner_entity_type;
        let (Some(dependent), Some(principal)) = (
            schema.entity_type(dependent_name),
            schema.entity_type(principal_name),
        ) else {
            return Err(unresolved(dependent_name, principal_name));
        };

        let properties = match self.options.constraint_resolution {
            ConstraintResolution::ConventionsFirst => self
                .by_convention(dependent_end, dependent, principal)
                .or_else(|| self.by_shared_key(dependent, principal)),
            ConstraintResolution::SharedKeyFirst => self
                .by_shared_key(dependent, principal)
                .or_else(|| self.by_convention(dependent_end, dependent, principal)),
        }
        .ok_or_else(|| unresolved(dependent_name, principal_name))?;

        Ok(ResolvedReferentialConstraint {
            principal_role: dependent_end.role.clone(),
            principal_entity_type: principal_name.clone(),
            dependent_role: principal_end.role.clone(),
            dependent_entity_type: dependent_name.clone(),
            properties,
        })
    }

    fn by_convention(
        &self,
        endpoint: &AssociationEndpoint,
        dependent: &EntityType,
        principal: &EntityType,
    ) -> Option<Vec<ReferentialConstraintPair>> {
        if principal.key.is_empty() {
            return None;
        }
        self.conventions.iter().find_map(|convention| {
            let pairs = principal
                .key
                .iter()
                .map(|key| {
                    let candidate = convention.apply(endpoint, key)?;
                    dependent
                        .property(&candidate)
                        .map(|_| ReferentialConstraintPair::new(candidate, key.clone()))
                })
                .collect::<Option<Vec<_>>>()?;
            debug!(
                "Foreign key for {} via {:?}: {:?}",
                endpoint.property_role(),
                convention,
                pairs
            );
            Some(pairs)
        })
    }

    fn by_shared_key(
        &self,
        dependent: &EntityType,
        principal: &EntityType,
    ) -> Option<Vec<ReferentialConstraintPair>> {
        if !self.options.infer_referential_constraints
            || dependent.key.is_empty()
            || dependent.key.len() != principal.key.len()
        {
            return None;
        }
        debug!(
            "Using shared key between {} and {}",
            dependent.name, principal.name
        );
        Some(
            dependent
                .key
                .iter()
                .zip(&principal.key)
                .map(|(dep, prin)| ReferentialConstraintPair::new(dep.clone(), prin.clone()))
                .collect(),
        )
    }
}

/// The navigation property on `target` declared as partner of `nav`, or
/// declaring `nav` as its own partner.
fn explicit_partner<'s>(
    schema: &SchemaDocument,
    source: &str,
    nav: &NavigationProperty,
    target: &'s EntityType,
) -> Option<&'s NavigationProperty> {
    let self_reference = schema.qualified_name(&target.name) == source;
    let points_back = |candidate: &NavigationProperty| {
        let same_property = self_reference && candidate.name == nav.name;
        !same_property && schema.canonical_name(candidate.target_type()) == source
    };

    if let Some(partner_name) = &nav.partner {
        match target.navigation_property(partner_name) {
            Some(partner) if points_back(partner) => return Some(partner),
            _ => warn!(
                "Declared partner {} of {} not found on {}",
                partner_name, nav.name, target.name
            ),
        }
    }
    target.navigation_properties.iter().find(|candidate| {
        candidate.partner.as_deref() == Some(nav.name.as_str()) && points_back(candidate)
    })
}

fn explicit_constraint(
    schema: &SchemaDocument,
    set: &AssociationSet,
) -> Option<ResolvedReferentialConstraint> {
    set.endpoints.iter().enumerate().find_map(|(idx, endpoint)| {
        let nav_name = endpoint.navigation_property.as_deref()?;
        let nav = schema
            .entity_type(&endpoint.containing_entity_type)?
            .navigation_property(nav_name)?;
        if nav.referential_constraints.is_empty() {
            return None;
        }
        Some(ResolvedReferentialConstraint {
            principal_role: endpoint.role.clone(),
            principal_entity_type: endpoint.partner_entity_type.clone(),
            dependent_role: set.endpoints[1 - idx].role.clone(),
            dependent_entity_type: endpoint.containing_entity_type.clone(),
            properties: nav.referential_constraints.clone(),
        })
    })
}

fn assign_roles(schema: &mut SchemaDocument, associations: &[AssociationSet]) {
    for set in associations {
        for (idx, endpoint) in set.endpoints.iter().enumerate() {
            let Some(nav_name) = endpoint.navigation_property.as_deref() else {
                continue;
            };
            let other = &set.endpoints[1 - idx];
            if let Some(entity) = schema.entity_type_mut(&endpoint.containing_entity_type)
                && let Some(nav) = entity
                    .navigation_properties
                    .iter_mut()
                    .find(|n| n.name == nav_name)
            {
                nav.relationship = Some(set.association_name.clone());
                nav.to_role = Some(endpoint.role.clone());
                nav.from_role = Some(other.role.clone());
            }
        }
    }
}

fn register_container_sets(schema: &mut SchemaDocument, associations: &[AssociationSet]) {
    let Some(container) = schema.entity_container.as_ref() else {
        return;
    };
    let sets: Vec<ContainerAssociationSet> = associations
        .iter()
        .map(|set| ContainerAssociationSet {
            name: set.name.clone(),
            association: set.association_name.clone(),
            ends: set
                .endpoints
                .iter()
                .map(|endpoint| AssociationSetEnd {
                    role: endpoint.role.clone(),
                    entity_set: container
                        .entity_set_for(schema, &endpoint.partner_entity_type)
                        .map(|s| s.name.clone()),
                })
                .collect(),
        })
        .collect();
    if let Some(container) = schema.entity_container.as_mut() {
        container.association_sets = sets;
    }
}

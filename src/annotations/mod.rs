//! Annotation dispatch
//!
//! Resolves the target path of every `Annotations` element in a schema and
//! hands each annotation to the first decorator that accepts it. Annotations
//! no decorator accepts are skipped.

pub mod converters;
pub mod decorators;

pub use decorators::{
    AnnotationDecorator, CustomFacetDecorator, DescriptionDecorator, DisplayNameDecorator,
    PublicationDecorator, StoreGeneratedPatternDecorator, ValidatorDecorator, built_in_decorators,
};

use crate::config::MetadataOptions;
use crate::error::{MetadataError, MetadataResult};
use crate::models::{Annotation, Facets, SchemaDocument};
use std::sync::Arc;
use tracing::{debug, info};

/// A schema element an annotation can be applied to, by index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationTarget {
    EntityType(usize),
    Property { entity_type: usize, property: usize },
    NavigationProperty { entity_type: usize, property: usize },
    EntityContainer,
    EntitySet(usize),
    Singleton(usize),
    ActionImport(usize),
    FunctionImport(usize),
    Action(usize),
    Function(usize),
    EnumType(usize),
    EnumMember { enum_type: usize, member: usize },
}

impl AnnotationTarget {
    pub fn facets<'s>(&self, schema: &'s SchemaDocument) -> Option<&'s Facets> {
        let container = || schema.entity_container.as_ref();
        match *self {
            Self::EntityType(e) => schema.entity_types.get(e).map(|t| &t.facets),
            Self::Property { entity_type, property } => schema
                .entity_types
                .get(entity_type)?
                .properties
                .get(property)
                .map(|p| &p.facets),
            Self::NavigationProperty { entity_type, property } => schema
                .entity_types
                .get(entity_type)?
                .navigation_properties
                .get(property)
                .map(|p| &p.facets),
            Self::EntityContainer => container().map(|c| &c.facets),
            Self::EntitySet(i) => container()?.entity_sets.get(i).map(|m| &m.facets),
            Self::Singleton(i) => container()?.singletons.get(i).map(|m| &m.facets),
            Self::ActionImport(i) => container()?.action_imports.get(i).map(|m| &m.facets),
            Self::FunctionImport(i) => container()?.function_imports.get(i).map(|m| &m.facets),
            Self::Action(i) => schema.actions.get(i).map(|a| &a.facets),
            Self::Function(i) => schema.functions.get(i).map(|f| &f.facets),
            Self::EnumType(i) => schema.enum_types.get(i).map(|e| &e.facets),
            Self::EnumMember { enum_type, member } => schema
                .enum_types
                .get(enum_type)?
                .members
                .get(member)
                .map(|m| &m.facets),
        }
    }

    pub fn facets_mut<'s>(&self, schema: &'s mut SchemaDocument) -> Option<&'s mut Facets> {
        match *self {
            Self::EntityType(e) => schema.entity_types.get_mut(e).map(|t| &mut t.facets),
            Self::Property { entity_type, property } => schema
                .entity_types
                .get_mut(entity_type)?
                .properties
                .get_mut(property)
                .map(|p| &mut p.facets),
            Self::NavigationProperty { entity_type, property } => schema
                .entity_types
                .get_mut(entity_type)?
                .navigation_properties
                .get_mut(property)
                .map(|p| &mut p.facets),
            Self::EntityContainer => schema.entity_container.as_mut().map(|c| &mut c.facets),
            Self::EntitySet(i) => schema
                .entity_container
                .as_mut()?
                .entity_sets
                .get_mut(i)
                .map(|m| &mut m.facets),
            Self::Singleton(i) => schema
                .entity_container
                .as_mut()?
                .singletons
                .get_mut(i)
                .map(|m| &mut m.facets),
            Self::ActionImport(i) => schema
                .entity_container
                .as_mut()?
                .action_imports
                .get_mut(i)
                .map(|m| &mut m.facets),
            Self::FunctionImport(i) => schema
                .entity_container
                .as_mut()?
                .function_imports
                .get_mut(i)
                .map(|m| &mut m.facets),
            Self::Action(i) => schema.actions.get_mut(i).map(|a| &mut a.facets),
            Self::Function(i) => schema.functions.get_mut(i).map(|f| &mut f.facets),
            Self::EnumType(i) => schema.enum_types.get_mut(i).map(|e| &mut e.facets),
            Self::EnumMember { enum_type, member } => schema
                .enum_types
                .get_mut(enum_type)?
                .members
                .get_mut(member)
                .map(|m| &mut m.facets),
        }
    }
}

/// Resolve a `/`-separated target path.
///
/// Action and function paths resolve to every overload of that name. A
/// second segment that names nothing falls back to the first segment's
/// element.
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::annotations::{AnnotationTarget, resolve_target};
/// use odata_metadata_sdk::models::{EntityType, Property, SchemaDocument};
///
/// let mut schema = SchemaDocument::new("Demo");
/// schema.entity_types.push(EntityType::new("Product").with_property(Property::new("Price", "Edm.Decimal")));
///
/// let targets = resolve_target(&schema, "Demo.Product/Price").unwrap();
/// assert_eq!(targets, vec![AnnotationTarget::Property { entity_type: 0, property: 0 }]);
/// assert!(resolve_target(&schema, "Demo.Missing").is_err());
/// ```
pub fn resolve_target(
    schema: &SchemaDocument,
    path: &str,
) -> MetadataResult<Vec<AnnotationTarget>> {
    let mut segments = path.split('/');
    let head = segments.next().unwrap_or_default().trim();
    let member = segments.next().map(str::trim).filter(|m| !m.is_empty());
    let head = head.split_once('(').map_or(head, |(name, _)| name);
    let not_found = || MetadataError::TargetNotFound(path.to_string());

    if let Some(idx) = schema.entity_type_index(head) {
        let entity = &schema.entity_types[idx];
        let target = member
            .and_then(|name| {
                if let Some(p) = entity.properties.iter().position(|p| p.name == name) {
                    Some(AnnotationTarget::Property {
                        entity_type: idx,
                        property: p,
                    })
                } else {
                    entity
                        .navigation_properties
                        .iter()
                        .position(|n| n.name == name)
                        .map(|p| AnnotationTarget::NavigationProperty {
                            entity_type: idx,
                            property: p,
                        })
                }
            })
            .unwrap_or(AnnotationTarget::EntityType(idx));
        return Ok(vec![target]);
    }

    let local = schema.local_name(head);

    if let (Some(container), Some(local)) = (schema.entity_container.as_ref(), local) {
        if container.name == local {
            let target = member
                .and_then(|name| container_member(schema, name))
                .unwrap_or(AnnotationTarget::EntityContainer);
            return Ok(vec![target]);
        }
        if let Some(target) = container_member(schema, local) {
            return Ok(vec![target]);
        }
    }

    let Some(local) = local else {
        return Err(not_found());
    };

    let actions: Vec<AnnotationTarget> = overloads(&schema.actions, local)
        .map(AnnotationTarget::Action)
        .collect();
    if !actions.is_empty() {
        return Ok(actions);
    }
    let functions: Vec<AnnotationTarget> = overloads(&schema.functions, local)
        .map(AnnotationTarget::Function)
        .collect();
    if !functions.is_empty() {
        return Ok(functions);
    }

    if let Some(idx) = schema.enum_types.iter().position(|e| e.name == local) {
        let target = member
            .and_then(|name| {
                schema.enum_types[idx]
                    .members
                    .iter()
                    .position(|m| m.name == name)
            })
            .map(|m| AnnotationTarget::EnumMember {
                enum_type: idx,
                member: m,
            })
            .unwrap_or(AnnotationTarget::EnumType(idx));
        return Ok(vec![target]);
    }

    Err(not_found())
}

fn overloads<'s>(
    operations: &'s [crate::models::Operation],
    name: &'s str,
) -> impl Iterator<Item = usize> + 's {
    operations
        .iter()
        .enumerate()
        .filter(move |(_, op)| op.name == name)
        .map(|(idx, _)| idx)
}

fn container_member(schema: &SchemaDocument, name: &str) -> Option<AnnotationTarget> {
    let container = schema.entity_container.as_ref()?;
    if let Some(i) = container.entity_sets.iter().position(|m| m.name == name) {
        return Some(AnnotationTarget::EntitySet(i));
    }
    if let Some(i) = container.singletons.iter().position(|m| m.name == name) {
        return Some(AnnotationTarget::Singleton(i));
    }
    if let Some(i) = container.action_imports.iter().position(|m| m.name == name) {
        return Some(AnnotationTarget::ActionImport(i));
    }
    container
        .function_imports
        .iter()
        .position(|m| m.name == name)
        .map(AnnotationTarget::FunctionImport)
}

/// Ordered decorator registry
#[derive(Clone)]
pub struct AnnotationDispatcher {
    decorators: Vec<Arc<dyn AnnotationDecorator>>,
}

impl Default for AnnotationDispatcher {
    fn default() -> Self {
        Self {
            decorators: built_in_decorators(),
        }
    }
}

impl AnnotationDispatcher {
    /// Built-ins followed by the decorators registered on `options`
    pub fn new(options: &MetadataOptions) -> Self {
        let mut dispatcher = Self::default();
        dispatcher
            .decorators
            .extend(options.annotation_decorators.iter().cloned());
        dispatcher
    }

    pub fn with_decorators(decorators: Vec<Arc<dyn AnnotationDecorator>>) -> Self {
        Self { decorators }
    }

    pub fn push(&mut self, decorator: Arc<dyn AnnotationDecorator>) {
        self.decorators.push(decorator);
    }

    pub fn decorator_names(&self) -> Vec<&str> {
        self.decorators.iter().map(|d| d.name()).collect()
    }

    /// First decorator accepting `annotation`
    pub fn find(&self, annotation: &Annotation) -> Option<&Arc<dyn AnnotationDecorator>> {
        self.decorators.iter().find(|d| d.can_decorate(annotation))
    }

    /// Apply every annotation element of `schema`; returns how many
    /// annotations a decorator handled.
    pub fn apply(&self, schema: &mut SchemaDocument) -> MetadataResult<usize> {
        let elements = std::mem::take(&mut schema.annotations);
        let result = self.apply_elements(schema, &elements);
        schema.annotations = elements;
        let applied = result?;
        info!(
            "Applied {} annotations in schema {}",
            applied, schema.namespace
        );
        Ok(applied)
    }

    fn apply_elements(
        &self,
        schema: &mut SchemaDocument,
        elements: &[crate::models::Annotations],
    ) -> MetadataResult<usize> {
        let mut applied = 0;
        for element in elements {
            let targets = resolve_target(schema, &element.target)?;
            for annotation in &element.annotations {
                let Some(decorator) = self.find(annotation) else {
                    debug!(
                        "No decorator for {} on {}, skipping",
                        annotation.term, element.target
                    );
                    continue;
                };
                for target in &targets {
                    if let Some(facets) = target.facets_mut(schema) {
                        decorator.decorate(facets, annotation)?;
                    }
                }
                applied += 1;
            }
        }
        Ok(applied)
    }
}

/// Apply `schema`'s annotation elements with the given decorators.
pub fn apply_annotations(
    schema: &mut SchemaDocument,
    decorators: &[Arc<dyn AnnotationDecorator>],
) -> MetadataResult<usize> {
    AnnotationDispatcher::with_decorators(decorators.to_vec()).apply(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EntityContainer, EntitySet, EntityType, EnumType, NavigationProperty, Operation, Property,
    };

    fn schema() -> SchemaDocument {
        let mut schema = SchemaDocument::new("Demo");
        schema.alias = Some("d".to_string());
        schema.entity_types.push(
            EntityType::new("Product")
                .with_property(Property::new("Name", "Edm.String"))
                .with_navigation_property(NavigationProperty::new("Supplier", "Demo.Supplier")),
        );
        schema.enum_types.push(EnumType::new("Color").with_member("Red", None));
        schema.actions.push(Operation::new("Restock"));
        schema.actions.push(Operation::new("Restock"));
        schema.functions.push(Operation::new("TopSellers"));
        let mut container = EntityContainer::new("Catalog");
        container
            .entity_sets
            .push(EntitySet::new("Products", "Demo.Product"));
        schema.entity_container = Some(container);
        schema
    }

    #[test]
    fn resolves_entity_members() {
        let schema = schema();
        assert_eq!(
            resolve_target(&schema, "d.Product/Supplier").unwrap(),
            vec![AnnotationTarget::NavigationProperty {
                entity_type: 0,
                property: 0
            }]
        );
        assert_eq!(
            resolve_target(&schema, "Demo.Product/Unknown").unwrap(),
            vec![AnnotationTarget::EntityType(0)]
        );
    }

    #[test]
    fn resolves_container_forms() {
        let schema = schema();
        assert_eq!(
            resolve_target(&schema, "Demo.Catalog/Products").unwrap(),
            vec![AnnotationTarget::EntitySet(0)]
        );
        assert_eq!(
            resolve_target(&schema, "Demo.Products").unwrap(),
            vec![AnnotationTarget::EntitySet(0)]
        );
        assert_eq!(
            resolve_target(&schema, "Demo.Catalog").unwrap(),
            vec![AnnotationTarget::EntityContainer]
        );
    }

    #[test]
    fn resolves_operations_and_enums() {
        let schema = schema();
        assert_eq!(
            resolve_target(&schema, "Demo.Restock(Demo.Product)").unwrap(),
            vec![AnnotationTarget::Action(0), AnnotationTarget::Action(1)]
        );
        assert_eq!(
            resolve_target(&schema, "Demo.TopSellers()").unwrap(),
            vec![AnnotationTarget::Function(0)]
        );
        assert_eq!(
            resolve_target(&schema, "Demo.Color/Red").unwrap(),
            vec![AnnotationTarget::EnumMember {
                enum_type: 0,
                member: 0
            }]
        );
    }

    #[test]
    fn unknown_head_is_target_not_found() {
        let schema = schema();
        let err = resolve_target(&schema, "Other.Product").unwrap_err();
        assert_eq!(err, MetadataError::TargetNotFound("Other.Product".to_string()));
    }

    #[test]
    fn dispatcher_orders_user_decorators_last() {
        let options = MetadataOptions::default().with_decorator(Arc::new(DisplayNameDecorator));
        let dispatcher = AnnotationDispatcher::new(&options);
        let names = dispatcher.decorator_names();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], "DisplayName");
        assert_eq!(names[5], "Publication");
    }
}

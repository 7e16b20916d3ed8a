//! CSDL schema model
//!
//! A [`SchemaDocument`] is a flat arena: entity types, enum types, operations
//! and the container are addressed by name or index, never by back-pointer.

use super::annotation::Annotations;
use super::association::AssociationSet;
use super::facets::{Facets, StoreGeneratedPattern};
use serde::{Deserialize, Serialize};

/// Last dot-separated segment of a qualified name
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Element type of `Collection(T)`, or `T` itself
pub fn element_type(type_name: &str) -> &str {
    type_name
        .strip_prefix("Collection(")
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(type_name)
}

fn default_true() -> bool {
    true
}

/// One CSDL schema: a namespace and the elements declared in it
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::models::{EntityType, SchemaDocument};
///
/// let mut schema = SchemaDocument::new("Demo");
/// schema.entity_types.push(EntityType::new("Product").with_key(&["ID"]));
/// assert!(schema.entity_type("Demo.Product").is_some());
/// assert!(schema.entity_type("Product").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub entity_types: Vec<EntityType>,
    #[serde(default)]
    pub enum_types: Vec<EnumType>,
    #[serde(default)]
    pub actions: Vec<Operation>,
    #[serde(default)]
    pub functions: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_container: Option<EntityContainer>,
    #[serde(default)]
    pub annotations: Vec<Annotations>,
    /// Associations produced by relationship inference
    #[serde(default)]
    pub associations: Vec<AssociationSet>,
}

impl SchemaDocument {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn qualified_name(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }

    /// Strip this schema's namespace or alias from `name`.
    ///
    /// Unqualified names are returned unchanged; names qualified with a
    /// different namespace yield `None`.
    pub fn local_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        let strip = |prefix: &str| {
            name.strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
        };
        if let Some(rest) = strip(&self.namespace) {
            return Some(rest);
        }
        if let Some(rest) = self.alias.as_deref().and_then(strip) {
            return Some(rest);
        }
        if name.contains('.') { None } else { Some(name) }
    }

    /// Canonical `Namespace.Name` for a name qualified by namespace or alias
    pub fn canonical_name(&self, name: &str) -> String {
        match self.local_name(name) {
            Some(local) => self.qualified_name(local),
            None => name.to_string(),
        }
    }

    pub fn entity_type_index(&self, name: &str) -> Option<usize> {
        let local = self.local_name(name)?;
        self.entity_types.iter().position(|e| e.name == local)
    }

    pub fn entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entity_type_index(name).map(|idx| &self.entity_types[idx])
    }

    pub fn entity_type_mut(&mut self, name: &str) -> Option<&mut EntityType> {
        self.entity_type_index(name)
            .map(move |idx| &mut self.entity_types[idx])
    }

    pub fn enum_type_index(&self, name: &str) -> Option<usize> {
        let local = self.local_name(name)?;
        self.enum_types.iter().position(|e| e.name == local)
    }
}

/// Entity type with key, structural and navigation properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityType {
    pub name: String,
    #[serde(default)]
    pub key: Vec<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub navigation_properties: Vec<NavigationProperty>,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: &[&str]) -> Self {
        self.key = key.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_navigation_property(mut self, navigation: NavigationProperty) -> Self {
        self.navigation_properties.push(navigation);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn navigation_property(&self, name: &str) -> Option<&NavigationProperty> {
        self.navigation_properties.iter().find(|n| n.name == name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some() || self.navigation_property(name).is_some()
    }

    pub fn key_properties(&self) -> impl Iterator<Item = &Property> {
        self.key.iter().filter_map(|k| self.property(k))
    }

    /// How the store generates this type's key, when every key property agrees.
    ///
    /// Returns `None` for keys without a declared pattern or with mixed patterns.
    pub fn auto_generated_key_type(&self) -> Option<StoreGeneratedPattern> {
        let mut patterns = self
            .key_properties()
            .map(|p| p.facets.store_generated_pattern);
        let first = patterns.next()??;
        if first == StoreGeneratedPattern::None {
            return None;
        }
        patterns.all(|p| p == Some(first)).then_some(first)
    }
}

/// Structural property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

impl Property {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            facets: Facets::default(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// `Property` / `ReferencedProperty` pair of a referential constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferentialConstraintPair {
    pub property: String,
    pub referenced_property: String,
}

impl ReferentialConstraintPair {
    pub fn new(property: impl Into<String>, referenced_property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            referenced_property: referenced_property.into(),
        }
    }
}

/// Navigation property; `relationship`/`from_role`/`to_role` are filled in by
/// relationship inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationProperty {
    pub name: String,
    /// Target type, `Collection(...)` for collection-valued properties
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referential_constraints: Vec<ReferentialConstraintPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_role: Option<String>,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

impl NavigationProperty {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            partner: None,
            referential_constraints: Vec::new(),
            relationship: None,
            from_role: None,
            to_role: None,
            facets: Facets::default(),
        }
    }

    pub fn with_partner(mut self, partner: impl Into<String>) -> Self {
        self.partner = Some(partner.into());
        self
    }

    pub fn with_constraint(
        mut self,
        property: impl Into<String>,
        referenced_property: impl Into<String>,
    ) -> Self {
        self.referential_constraints
            .push(ReferentialConstraintPair::new(property, referenced_property));
        self
    }

    pub fn is_collection(&self) -> bool {
        self.type_name.starts_with("Collection(")
    }

    /// Target entity type name without the `Collection(...)` wrapper
    pub fn target_type(&self) -> &str {
        element_type(&self.type_name)
    }
}

/// Enum type declaration as written in the document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_flags: Option<bool>,
    #[serde(default)]
    pub members: Vec<EnumTypeMember>,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_member(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.members.push(EnumTypeMember {
            name: name.into(),
            value: value.map(str::to_string),
            facets: Facets::default(),
        });
        self
    }
}

/// Enum member; the value stays textual until synthesis parses it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumTypeMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

/// Action or function overload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub is_bound: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Entity container and its members
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityContainer {
    pub name: String,
    #[serde(default)]
    pub entity_sets: Vec<EntitySet>,
    #[serde(default)]
    pub singletons: Vec<Singleton>,
    #[serde(default)]
    pub action_imports: Vec<OperationImport>,
    #[serde(default)]
    pub function_imports: Vec<OperationImport>,
    /// One per inferred association, ends bound to entity sets
    #[serde(default)]
    pub association_sets: Vec<ContainerAssociationSet>,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

impl EntityContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// First entity set whose type is `entity_type` (qualified by `schema`)
    pub fn entity_set_for(&self, schema: &SchemaDocument, entity_type: &str) -> Option<&EntitySet> {
        let wanted = schema.canonical_name(entity_type);
        self.entity_sets
            .iter()
            .find(|set| schema.canonical_name(&set.entity_type) == wanted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySet {
    pub name: String,
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

impl EntitySet {
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            facets: Facets::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Singleton {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

/// Action or function import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationImport {
    pub name: String,
    /// Qualified name of the imported action/function
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_set: Option<String>,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

/// Container-level binding of an association to entity sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerAssociationSet {
    pub name: String,
    /// Qualified association (relationship) name
    pub association: String,
    pub ends: Vec<AssociationSetEnd>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationSetEnd {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_set: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_accepts_namespace_and_alias() {
        let mut schema = SchemaDocument::new("Sample.Catalog");
        schema.alias = Some("cat".to_string());
        assert_eq!(schema.local_name("Sample.Catalog.Product"), Some("Product"));
        assert_eq!(schema.local_name("cat.Product"), Some("Product"));
        assert_eq!(schema.local_name("Product"), Some("Product"));
        assert_eq!(schema.local_name("Other.Product"), None);
        assert_eq!(schema.canonical_name("cat.Product"), "Sample.Catalog.Product");
    }

    #[test]
    fn navigation_collection_detection() {
        let many = NavigationProperty::new("Products", "Collection(Demo.Product)");
        let one = NavigationProperty::new("Supplier", "Demo.Supplier");
        assert!(many.is_collection());
        assert_eq!(many.target_type(), "Demo.Product");
        assert!(!one.is_collection());
        assert_eq!(one.target_type(), "Demo.Supplier");
        assert_eq!(short_name("Demo.Supplier"), "Supplier");
    }

    #[test]
    fn auto_generated_key_type_requires_agreement() {
        let mut id = Property::new("ID", "Edm.Int32").not_null();
        id.facets.store_generated_pattern = Some(StoreGeneratedPattern::Identity);
        let entity = EntityType::new("Order").with_key(&["ID"]).with_property(id.clone());
        assert_eq!(
            entity.auto_generated_key_type(),
            Some(StoreGeneratedPattern::Identity)
        );

        let entity = entity
            .with_property(Property::new("Line", "Edm.Int32"))
            .with_key(&["ID", "Line"]);
        assert_eq!(entity.auto_generated_key_type(), None);

        let plain = EntityType::new("Tag")
            .with_key(&["Name"])
            .with_property(Property::new("Name", "Edm.String"));
        assert_eq!(plain.auto_generated_key_type(), None);
    }
}

//! Enum synthesis
//!
//! Turns the enum types declared in a schema into [`EnumTypeDescriptor`]s and
//! registers them in a caller-owned [`TypeRegistry`].

use crate::error::MetadataResult;
use crate::models::{EnumTypeDescriptor, SchemaDocument, UnderlyingType};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Enum descriptors keyed by qualified name
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    enum_types: BTreeMap<String, EnumTypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor`, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: EnumTypeDescriptor) -> Option<EnumTypeDescriptor> {
        self.enum_types
            .insert(descriptor.qualified_name(), descriptor)
    }

    pub fn get(&self, qualified_name: &str) -> Option<&EnumTypeDescriptor> {
        self.enum_types.get(qualified_name)
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.enum_types.contains_key(qualified_name)
    }

    pub fn len(&self) -> usize {
        self.enum_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enum_types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnumTypeDescriptor> {
        self.enum_types.values()
    }

    pub fn into_descriptors(self) -> Vec<EnumTypeDescriptor> {
        self.enum_types.into_values().collect()
    }
}

/// Build one descriptor per declared enum type and register each.
///
/// Missing underlying types default to `Edm.Int32`, missing flags to
/// `false` and missing member values to the member's position. Member
/// display names come from the member's `display_name` facet when set.
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::enums::{TypeRegistry, synthesize};
/// use odata_metadata_sdk::models::{EnumType, SchemaDocument};
///
/// let mut schema = SchemaDocument::new("Demo");
/// schema.enum_types.push(EnumType::new("Size").with_member("Small", None).with_member("Large", None));
///
/// let mut registry = TypeRegistry::new();
/// let descriptors = synthesize(&schema, &mut registry).unwrap();
/// assert_eq!(descriptors[0].members[1].value, 1);
/// assert!(registry.contains("Demo.Size"));
/// ```
pub fn synthesize(
    schema: &SchemaDocument,
    registry: &mut TypeRegistry,
) -> MetadataResult<Vec<EnumTypeDescriptor>> {
    let mut descriptors = Vec::with_capacity(schema.enum_types.len());
    for declared in &schema.enum_types {
        let underlying_type = match declared.underlying_type.as_deref() {
            Some(name) => schema.canonical_name(name).parse()?,
            None => UnderlyingType::default(),
        };
        let mut descriptor = EnumTypeDescriptor::new(
            schema.namespace.clone(),
            declared.name.clone(),
            underlying_type,
            declared.is_flags.unwrap_or(false),
        );
        for (position, member) in declared.members.iter().enumerate() {
            let (raw_value, value) = match member.value.as_deref() {
                Some(raw) => (raw.to_string(), underlying_type.parse_value(raw)?),
                None => (position.to_string(), position as i64),
            };
            descriptor.push_member(member.name.clone(), raw_value, value);
            if let Some(display_name) = &member.facets.display_name
                && let Some(last) = descriptor.members.last_mut()
            {
                last.display_name = display_name.clone();
            }
        }
        debug!(
            "Synthesized enum {} with {} members",
            descriptor.qualified_name(),
            descriptor.members.len()
        );
        registry.register(descriptor.clone());
        descriptors.push(descriptor);
    }
    info!(
        "Synthesized {} enum types for schema {}",
        descriptors.len(),
        schema.namespace
    );
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::models::EnumType;

    #[test]
    fn defaults_fill_missing_fields() {
        let mut schema = SchemaDocument::new("Demo");
        schema
            .enum_types
            .push(EnumType::new("Size").with_member("S", None).with_member("M", None));
        let mut registry = TypeRegistry::new();
        let descriptors = synthesize(&schema, &mut registry).unwrap();

        let size = &descriptors[0];
        assert_eq!(size.underlying_type, UnderlyingType::Int32);
        assert!(!size.is_flags);
        assert_eq!(size.members[0].value, 0);
        assert_eq!(size.members[1].raw_value, "1");
        assert_eq!(size.members[1].display_name, "M");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn member_values_parse_through_underlying_type() {
        let mut schema = SchemaDocument::new("Demo");
        let mut declared = EnumType::new("Tiny").with_member("Big", Some("300"));
        declared.underlying_type = Some("Edm.Byte".to_string());
        schema.enum_types.push(declared);

        let err = synthesize(&schema, &mut TypeRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::InvalidPrimitiveValue(ref e) if e.type_name == "Edm.Byte"
        ));
    }

    #[test]
    fn annotated_display_names_are_used() {
        let mut schema = SchemaDocument::new("Demo");
        let mut declared = EnumType::new("Status").with_member("Open", Some("1"));
        declared.members[0].facets.display_name = Some("Open for business".to_string());
        schema.enum_types.push(declared);

        let descriptors = synthesize(&schema, &mut TypeRegistry::new()).unwrap();
        assert_eq!(descriptors[0].members[0].display_name, "Open for business");
    }
}

//! Runtime enum type descriptors and member lookups

use crate::primitives::PrimitiveError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Integral type backing an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnderlyingType {
    #[serde(rename = "Edm.Byte")]
    Byte,
    #[serde(rename = "Edm.SByte")]
    SByte,
    #[serde(rename = "Edm.Int16")]
    Int16,
    #[default]
    #[serde(rename = "Edm.Int32")]
    Int32,
    #[serde(rename = "Edm.Int64")]
    Int64,
}

impl UnderlyingType {
    pub fn edm_name(&self) -> &'static str {
        match self {
            Self::Byte => "Edm.Byte",
            Self::SByte => "Edm.SByte",
            Self::Int16 => "Edm.Int16",
            Self::Int32 => "Edm.Int32",
            Self::Int64 => "Edm.Int64",
        }
    }

    fn range(&self) -> (i64, i64) {
        match self {
            Self::Byte => (u8::MIN as i64, u8::MAX as i64),
            Self::SByte => (i8::MIN as i64, i8::MAX as i64),
            Self::Int16 => (i16::MIN as i64, i16::MAX as i64),
            Self::Int32 => (i32::MIN as i64, i32::MAX as i64),
            Self::Int64 => (i64::MIN, i64::MAX),
        }
    }

    /// Parse a member's raw value, checking it fits this type.
    pub fn parse_value(&self, raw: &str) -> Result<i64, PrimitiveError> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| PrimitiveError::new(raw, self.edm_name(), "not an integer"))?;
        let (min, max) = self.range();
        if value < min || value > max {
            return Err(PrimitiveError::new(
                raw,
                self.edm_name(),
                format!("outside {}..={}", min, max),
            ));
        }
        Ok(value)
    }
}

impl FromStr for UnderlyingType {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Edm.Byte" => Ok(Self::Byte),
            "Edm.SByte" => Ok(Self::SByte),
            "Edm.Int16" => Ok(Self::Int16),
            "Edm.Int32" => Ok(Self::Int32),
            "Edm.Int64" => Ok(Self::Int64),
            other => Err(PrimitiveError::new(
                other,
                "enum underlying type",
                "expected Edm.Byte, Edm.SByte, Edm.Int16, Edm.Int32 or Edm.Int64",
            )),
        }
    }
}

impl fmt::Display for UnderlyingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.edm_name())
    }
}

/// Enum member as registered at runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumMember {
    /// Qualified name of the owning enum type
    pub enum_type: String,
    pub name: String,
    pub display_name: String,
    pub raw_value: String,
    pub value: i64,
}

/// Input accepted by [`EnumTypeDescriptor::parse`]
#[derive(Debug, Clone, Copy)]
pub enum EnumInput<'a> {
    Null,
    Member(&'a EnumMember),
    Name(&'a str),
    Value(i64),
    Unsupported,
}

impl<'a> From<&'a str> for EnumInput<'a> {
    fn from(name: &'a str) -> Self {
        EnumInput::Name(name)
    }
}

impl From<i64> for EnumInput<'_> {
    fn from(value: i64) -> Self {
        EnumInput::Value(value)
    }
}

impl<'a> From<&'a EnumMember> for EnumInput<'a> {
    fn from(member: &'a EnumMember) -> Self {
        EnumInput::Member(member)
    }
}

impl<'a> From<Option<&'a str>> for EnumInput<'a> {
    fn from(name: Option<&'a str>) -> Self {
        name.map_or(EnumInput::Null, EnumInput::Name)
    }
}

impl<'a> From<&'a Value> for EnumInput<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => EnumInput::Null,
            Value::String(s) => EnumInput::Name(s),
            Value::Number(n) => n.as_i64().map_or(EnumInput::Unsupported, EnumInput::Value),
            _ => EnumInput::Unsupported,
        }
    }
}

/// Enum type ready for registration in a [`crate::enums::TypeRegistry`]
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::models::{EnumTypeDescriptor, UnderlyingType};
///
/// let mut colors = EnumTypeDescriptor::new("Demo", "Color", UnderlyingType::Int32, true);
/// colors.push_member("Red", "1", 1);
/// colors.push_member("Blue", "4", 4);
///
/// let purple = colors.from_value(5).unwrap();
/// assert_eq!(purple.name, "Red,Blue");
/// assert_eq!(purple.display_name, "Red, Blue");
/// assert_eq!(colors.from_name("Blue, Red").unwrap().value, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumTypeDescriptor {
    pub name: String,
    pub namespace: String,
    pub is_flags: bool,
    pub underlying_type: UnderlyingType,
    pub members: Vec<EnumMember>,
}

impl EnumTypeDescriptor {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        underlying_type: UnderlyingType,
        is_flags: bool,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            is_flags,
            underlying_type,
            members: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn push_member(
        &mut self,
        name: impl Into<String>,
        raw_value: impl Into<String>,
        value: i64,
    ) {
        let name = name.into();
        self.members.push(EnumMember {
            enum_type: self.qualified_name(),
            display_name: name.clone(),
            name,
            raw_value: raw_value.into(),
            value,
        });
    }

    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Member for a numeric value.
    ///
    /// Flags enums fall back to a composite of every positive member whose
    /// bits are set in `value`; the composite value is the sum of the matched
    /// members and is returned, never stored.
    pub fn from_value(&self, value: i64) -> Option<EnumMember> {
        if let Some(member) = self.members.iter().find(|m| m.value == value) {
            return Some(member.clone());
        }
        if !self.is_flags {
            return None;
        }
        let matched: Vec<&EnumMember> = self
            .members
            .iter()
            .filter(|m| m.value > 0 && m.value & value == m.value)
            .collect();
        self.composite(&matched)
    }

    /// Member for a name, a numeric string or (flags) a comma-separated list.
    pub fn from_name(&self, name: &str) -> Option<EnumMember> {
        let trimmed = name.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return self.from_value(value);
        }
        if self.is_flags && trimmed.contains(',') {
            let matched: Vec<&EnumMember> = trimmed
                .split(',')
                .filter_map(|token| self.member(token.trim()))
                .collect();
            return self.composite(&matched);
        }
        self.member(trimmed).cloned()
    }

    /// Coerce loosely typed input to a member of this enum.
    pub fn parse<'a>(&self, input: impl Into<EnumInput<'a>>) -> Option<EnumMember> {
        match input.into() {
            EnumInput::Null | EnumInput::Unsupported => None,
            EnumInput::Member(member) if member.enum_type == self.qualified_name() => {
                Some(member.clone())
            }
            EnumInput::Member(member) => self.from_name(&member.name),
            EnumInput::Name(name) => self.from_name(name),
            EnumInput::Value(value) => self.from_value(value),
        }
    }

    fn composite(&self, matched: &[&EnumMember]) -> Option<EnumMember> {
        match matched {
            [] => None,
            [single] => Some((*single).clone()),
            many => {
                let names: Vec<&str> = many.iter().map(|m| m.name.as_str()).collect();
                let display_names: Vec<&str> =
                    many.iter().map(|m| m.display_name.as_str()).collect();
                let value = many
                    .iter()
                    .try_fold(0i64, |acc, m| acc.checked_add(m.value))?;
                Some(EnumMember {
                    enum_type: self.qualified_name(),
                    name: names.join(","),
                    display_name: display_names.join(", "),
                    raw_value: value.to_string(),
                    value,
                })
            }
        }
    }
}

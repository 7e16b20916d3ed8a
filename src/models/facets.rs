//! Metadata facets written onto schema elements by annotation decorators

use crate::primitives::{EdmDate, EdmDateTimeOffset, EdmDuration, EdmTimeOfDay};
use base64::Engine;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How the store generates values for a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreGeneratedPattern {
    None,
    Identity,
    Computed,
}

impl FromStr for StoreGeneratedPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "identity" => Ok(Self::Identity),
            "computed" => Ok(Self::Computed),
            other => Err(format!("Unknown store generated pattern: {}", other)),
        }
    }
}

impl fmt::Display for StoreGeneratedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Identity => "Identity",
            Self::Computed => "Computed",
        };
        f.write_str(name)
    }
}

/// Typed value produced from an annotation expression.
///
/// Serializes as the plain JSON value (binary as base64, temporal values in
/// their Edm text form). Deserializing goes through [`serde_json::Value`] and
/// only recovers the JSON-native shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum AnnotationLiteral {
    Null,
    Binary(Vec<u8>),
    Bool(bool),
    Date(EdmDate),
    DateTimeOffset(EdmDateTimeOffset),
    TimeOfDay(EdmTimeOfDay),
    Duration(EdmDuration),
    Decimal(f64),
    Float(f64),
    Guid(Uuid),
    Int(i64),
    String(String),
    /// Expression kinds without a converter (records, collections, paths)
    Json(Value),
}

impl AnnotationLiteral {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Binary(bytes) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            Self::Bool(b) => Value::Bool(*b),
            Self::Date(d) => Value::String(d.to_string()),
            Self::DateTimeOffset(d) => Value::String(d.to_string()),
            Self::TimeOfDay(t) => Value::String(t.to_string()),
            Self::Duration(d) => Value::String(d.to_string()),
            Self::Decimal(n) | Self::Float(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Guid(g) => Value::String(g.to_string()),
            Self::Int(i) => Value::from(*i),
            Self::String(s) => Value::String(s.clone()),
            Self::Json(v) => v.clone(),
        }
    }
}

impl From<Value> for AnnotationLiteral {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s),
            other => Self::Json(other),
        }
    }
}

impl Serialize for AnnotationLiteral {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A named validator with its properties (`errorMessage`, `max`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub properties: BTreeMap<String, AnnotationLiteral>,
}

impl ValidatorDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }
}

pub type FacetMap = BTreeMap<String, FacetValue>;

/// Node of a nested custom/publication facet tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetValue {
    Object(FacetMap),
    Literal(AnnotationLiteral),
}

impl From<AnnotationLiteral> for FacetValue {
    fn from(literal: AnnotationLiteral) -> Self {
        FacetValue::Literal(literal)
    }
}

/// Write `value` at `path`, creating intermediate objects.
///
/// A literal sitting where an object is needed gets replaced.
pub fn merge_facet_path(map: &mut FacetMap, path: &[&str], value: AnnotationLiteral) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = map;
    for segment in parents {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| FacetValue::Object(FacetMap::new()));
        if !matches!(slot, FacetValue::Object(_)) {
            *slot = FacetValue::Object(FacetMap::new());
        }
        current = match slot {
            FacetValue::Object(inner) => inner,
            FacetValue::Literal(_) => return,
        };
    }
    current.insert((*last).to_string(), FacetValue::Literal(value));
}

/// Facets carried by every annotatable element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_generated_pattern: Option<StoreGeneratedPattern>,
    #[serde(default, skip_serializing_if = "FacetMap::is_empty")]
    pub custom: FacetMap,
    #[serde(default, skip_serializing_if = "FacetMap::is_empty")]
    pub publication: FacetMap,
}

impl Facets {
    pub fn is_empty(&self) -> bool {
        self == &Facets::default()
    }

    pub fn validator(&self, name: &str) -> Option<&ValidatorDescriptor> {
        self.validators.iter().find(|v| v.name == name)
    }

    /// Validator entry for `name`, created on first use
    pub fn validator_mut(&mut self, name: &str) -> &mut ValidatorDescriptor {
        let idx = match self.validators.iter().position(|v| v.name == name) {
            Some(idx) => idx,
            None => {
                self.validators.push(ValidatorDescriptor::new(name));
                self.validators.len() - 1
            }
        };
        &mut self.validators[idx]
    }
}

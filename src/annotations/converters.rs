//! Conversion of raw annotation expressions into typed literals
//!
//! The expression kind (`String`, `Int`, `Date`, ...) selects the converter;
//! matching is case-insensitive. Kinds without a converter keep the raw JSON.

use crate::error::MetadataResult;
use crate::models::annotation::value_text;
use crate::models::{Annotation, AnnotationLiteral};
use crate::primitives::{
    EdmDate, EdmDateTimeOffset, EdmDuration, EdmPrimitive, EdmTimeOfDay, PrimitiveError,
};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde_json::Value;
use uuid::Uuid;

/// Convert the value expression of `annotation`.
///
/// An annotation without expressions converts to [`AnnotationLiteral::Null`].
pub fn convert_annotation(annotation: &Annotation) -> MetadataResult<AnnotationLiteral> {
    match annotation.expressions.first() {
        Some(expression) => convert(&expression.kind, &expression.value),
        None => Ok(AnnotationLiteral::Null),
    }
}

/// Convert `value` according to the expression `kind`.
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::annotations::converters::convert;
/// use odata_metadata_sdk::models::AnnotationLiteral;
/// use serde_json::json;
///
/// assert_eq!(convert("Int", &json!("42")).unwrap(), AnnotationLiteral::Int(42));
/// assert_eq!(convert("bool", &json!("true")).unwrap(), AnnotationLiteral::Bool(true));
/// assert!(convert("Date", &json!("2023-02-30")).is_err());
/// ```
pub fn convert(kind: &str, value: &Value) -> MetadataResult<AnnotationLiteral> {
    if value.is_null() {
        return Ok(AnnotationLiteral::Null);
    }
    let literal = match kind.to_ascii_lowercase().as_str() {
        "binary" => AnnotationLiteral::Binary(binary(value)?),
        "bool" => AnnotationLiteral::Bool(boolean(value)?),
        "date" => AnnotationLiteral::Date(EdmDate::create(text(value, "Edm.Date")?.as_str())?),
        "datetimeoffset" => AnnotationLiteral::DateTimeOffset(EdmDateTimeOffset::create(
            text(value, "Edm.DateTimeOffset")?.as_str(),
        )?),
        "timeofday" => AnnotationLiteral::TimeOfDay(EdmTimeOfDay::create(
            text(value, "Edm.TimeOfDay")?.as_str(),
        )?),
        "duration" => AnnotationLiteral::Duration(EdmDuration::create(
            text(value, "Edm.Duration")?.as_str(),
        )?),
        "decimal" => AnnotationLiteral::Decimal(float(value, "Edm.Decimal")?),
        "float" => AnnotationLiteral::Float(float(value, "Edm.Double")?),
        "guid" => AnnotationLiteral::Guid(guid(value)?),
        "int" => AnnotationLiteral::Int(integer(value)?),
        "string" => AnnotationLiteral::String(text(value, "Edm.String")?),
        _ => AnnotationLiteral::Json(value.clone()),
    };
    Ok(literal)
}

fn text(value: &Value, type_name: &str) -> Result<String, PrimitiveError> {
    value_text(value)
        .ok_or_else(|| PrimitiveError::new(value.to_string(), type_name, "expected a text value"))
}

fn binary(value: &Value) -> Result<Vec<u8>, PrimitiveError> {
    let encoded = text(value, "Edm.Binary")?;
    URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .or_else(|_| STANDARD.decode(&encoded))
        .map_err(|e| PrimitiveError::new(&encoded, "Edm.Binary", e.to_string()))
}

fn boolean(value: &Value) -> Result<bool, PrimitiveError> {
    if let Value::Bool(b) = value {
        return Ok(*b);
    }
    let raw = text(value, "Edm.Boolean")?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(PrimitiveError::new(raw, "Edm.Boolean", "expected true or false")),
    }
}

fn float(value: &Value, type_name: &str) -> Result<f64, PrimitiveError> {
    if let Some(n) = value.as_f64() {
        return Ok(n);
    }
    let raw = text(value, type_name)?;
    raw.trim()
        .parse()
        .map_err(|_| PrimitiveError::new(raw, type_name, "not a number"))
}

fn integer(value: &Value) -> Result<i64, PrimitiveError> {
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    let raw = text(value, "Edm.Int64")?;
    raw.trim()
        .parse()
        .map_err(|_| PrimitiveError::new(raw, "Edm.Int64", "not an integer"))
}

fn guid(value: &Value) -> Result<Uuid, PrimitiveError> {
    let raw = text(value, "Edm.Guid")?;
    Uuid::parse_str(raw.trim()).map_err(|e| PrimitiveError::new(&raw, "Edm.Guid", e.to_string()))
}

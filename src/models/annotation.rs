//! Annotation terms and the `Annotations` elements that target schema paths

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One expression of an annotation: its kind (`String`, `Int`, `Record`, ...)
/// and raw payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationExpression {
    pub kind: String,
    pub value: Value,
}

/// A single annotation: term, optional qualifier and its value expressions
///
/// The first expression is the annotation's value.
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::models::Annotation;
///
/// let annotation = Annotation::new("Org.OData.Core.V1.Description").with_value("String", "Price in EUR");
/// assert_eq!(annotation.value_kind(), Some("String"));
/// assert_eq!(annotation.text().as_deref(), Some("Price in EUR"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    #[serde(default)]
    pub expressions: Vec<AnnotationExpression>,
}

impl Annotation {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            qualifier: None,
            expressions: Vec::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn with_value(mut self, kind: impl Into<String>, value: impl Into<Value>) -> Self {
        self.expressions.push(AnnotationExpression {
            kind: kind.into(),
            value: value.into(),
        });
        self
    }

    /// Build from an object shaped like `{"term": ..., "qualifier": ..., "<kind>": value}`.
    ///
    /// Every key other than `term`/`qualifier` becomes an expression, in
    /// document order.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let term = object.get("term")?.as_str()?.to_string();
        let qualifier = object
            .get("qualifier")
            .and_then(Value::as_str)
            .map(str::to_string);
        let expressions = object
            .iter()
            .filter(|(key, _)| key.as_str() != "term" && key.as_str() != "qualifier")
            .map(|(kind, value)| AnnotationExpression {
                kind: kind.clone(),
                value: value.clone(),
            })
            .collect();
        Some(Self {
            term,
            qualifier,
            expressions,
        })
    }

    pub fn value_kind(&self) -> Option<&str> {
        self.expressions.first().map(|e| e.kind.as_str())
    }

    pub fn raw_value(&self) -> Option<&Value> {
        self.expressions.first().map(|e| &e.value)
    }

    /// Value as text: a plain string, a `{"text": ..}` / `{"$text": ..}` wrapper,
    /// or a scalar rendered as a string.
    pub fn text(&self) -> Option<String> {
        self.raw_value().and_then(value_text)
    }

    /// Portion of the term after `prefix`, when the term starts with it
    pub fn term_suffix(&self, prefix: &str) -> Option<&str> {
        self.term.strip_prefix(prefix)
    }
}

pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => wrapped_text(map),
        _ => None,
    }
}

fn wrapped_text(map: &Map<String, Value>) -> Option<String> {
    map.get("text")
        .or_else(|| map.get("$text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// An `Annotations` element: annotations applied to the element at `target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    pub target: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Annotations {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

//! Import functionality
//!
//! Provides parsers that build [`SchemaDocument`]s from published metadata:
//! - CSDL JSON (OData 4.01 JSON metadata documents)

pub mod csdl_json;

pub use csdl_json::CsdlJsonImporter;

use crate::models::SchemaDocument;

/// Result of an import operation.
///
/// Contains the parsed schemas and any non-fatal warnings from the import.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
#[must_use = "import results should be processed or errors checked"]
pub struct ImportResult {
    /// `$Version` of the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Qualified name of the `$EntityContainer`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_container: Option<String>,
    /// URIs of referenced documents
    #[serde(default)]
    pub references: Vec<String>,
    /// One schema per namespace, in document order
    pub schemas: Vec<SchemaDocument>,
    /// Elements that were skipped
    #[serde(default)]
    pub errors: Vec<ImportError>,
}

/// Error during import
#[derive(Debug, Clone, PartialEq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ImportError {
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Unsupported element: {0}")]
    Unsupported(String),
}

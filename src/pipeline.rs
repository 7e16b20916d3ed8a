//! Adapter pipeline
//!
//! Runs an ordered list of adapters over every schema of a metadata document
//! set. The default order is relationship inference, then annotation
//! dispatch, then enum synthesis, so annotations can target inferred roles
//! and enum descriptors pick up annotated member display names.

use crate::annotations::AnnotationDispatcher;
use crate::config::MetadataOptions;
use crate::enums::{TypeRegistry, synthesize};
use crate::error::MetadataResult;
use crate::inference::AssociationInferrer;
use crate::models::{EnumTypeDescriptor, SchemaDocument};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// State shared by the adapters of one pipeline run
pub struct AdapterContext<'a> {
    pub options: &'a MetadataOptions,
    pub registry: &'a mut TypeRegistry,
}

/// One resolution pass applied to each schema in turn
pub trait Adapter: Send + Sync {
    fn name(&self) -> &str;

    fn adapt(&self, schema: &mut SchemaDocument, context: &mut AdapterContext<'_>)
    -> MetadataResult<()>;
}

/// Relationship inference
#[derive(Debug, Clone, Copy, Default)]
pub struct AssociationAdapter;

impl Adapter for AssociationAdapter {
    fn name(&self) -> &str {
        "associations"
    }

    fn adapt(
        &self,
        schema: &mut SchemaDocument,
        context: &mut AdapterContext<'_>,
    ) -> MetadataResult<()> {
        AssociationInferrer::new(context.options).infer(schema)
    }
}

/// Annotation dispatch with the built-in and configured decorators
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationAdapter;

impl Adapter for AnnotationAdapter {
    fn name(&self) -> &str {
        "annotations"
    }

    fn adapt(
        &self,
        schema: &mut SchemaDocument,
        context: &mut AdapterContext<'_>,
    ) -> MetadataResult<()> {
        AnnotationDispatcher::new(context.options).apply(schema)?;
        Ok(())
    }
}

/// Enum synthesis into the run's registry
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumTypeAdapter;

impl Adapter for EnumTypeAdapter {
    fn name(&self) -> &str {
        "enum types"
    }

    fn adapt(
        &self,
        schema: &mut SchemaDocument,
        context: &mut AdapterContext<'_>,
    ) -> MetadataResult<()> {
        synthesize(schema, context.registry)?;
        Ok(())
    }
}

/// Output of a pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMetadata {
    pub schemas: Vec<SchemaDocument>,
    pub enum_types: Vec<EnumTypeDescriptor>,
}

impl ResolvedMetadata {
    pub fn schema(&self, namespace: &str) -> Option<&SchemaDocument> {
        self.schemas.iter().find(|s| s.namespace == namespace)
    }

    pub fn enum_type(&self, qualified_name: &str) -> Option<&EnumTypeDescriptor> {
        self.enum_types
            .iter()
            .find(|e| e.qualified_name() == qualified_name)
    }
}

/// Ordered adapters plus the options they read
///
/// # Example
///
/// ```rust
/// use odata_metadata_sdk::models::{EnumType, SchemaDocument};
/// use odata_metadata_sdk::pipeline::MetadataPipeline;
///
/// let mut schema = SchemaDocument::new("Demo");
/// schema.enum_types.push(EnumType::new("Size").with_member("Small", Some("1")));
///
/// let resolved = MetadataPipeline::default().process(vec![schema]).unwrap();
/// assert_eq!(resolved.enum_types.len(), 1);
/// assert!(resolved.enum_type("Demo.Size").is_some());
/// ```
pub struct MetadataPipeline {
    options: MetadataOptions,
    adapters: Vec<Arc<dyn Adapter>>,
}

impl Default for MetadataPipeline {
    fn default() -> Self {
        Self::new(MetadataOptions::default())
    }
}

impl MetadataPipeline {
    pub fn new(options: MetadataOptions) -> Self {
        Self {
            options,
            adapters: default_adapters(),
        }
    }

    /// Pipeline without any adapters
    pub fn empty(options: MetadataOptions) -> Self {
        Self {
            options,
            adapters: Vec::new(),
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn options(&self) -> &MetadataOptions {
        &self.options
    }

    pub fn adapter_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Run every adapter over every schema, adapter by adapter.
    ///
    /// The first error aborts the run; the documents are consumed so no
    /// partially resolved schema escapes.
    pub fn process(&self, mut schemas: Vec<SchemaDocument>) -> MetadataResult<ResolvedMetadata> {
        let mut registry = TypeRegistry::new();
        let mut context = AdapterContext {
            options: &self.options,
            registry: &mut registry,
        };
        for adapter in &self.adapters {
            info!(
                "Running adapter '{}' over {} schemas",
                adapter.name(),
                schemas.len()
            );
            for schema in schemas.iter_mut() {
                adapter.adapt(schema, &mut context)?;
            }
        }
        Ok(ResolvedMetadata {
            schemas,
            enum_types: registry.into_descriptors(),
        })
    }
}

/// Association, annotation and enum adapters, in that order
pub fn default_adapters() -> Vec<Arc<dyn Adapter>> {
    vec![
        Arc::new(AssociationAdapter),
        Arc::new(AnnotationAdapter),
        Arc::new(EnumTypeAdapter),
    ]
}

//! OData Metadata SDK - Resolves OData v4 CSDL metadata into a relationally complete model
//!
//! Provides:
//! - Relationship inference (associations, roles, referential constraints)
//! - Annotation dispatch through pluggable decorators
//! - Enum type synthesis, including flags composition
//! - Canonical codecs for the Edm temporal primitives
//! - CSDL JSON import
//!
//! # Example
//!
//! ```rust
//! use odata_metadata_sdk::{CsdlJsonImporter, MetadataPipeline};
//!
//! let document = r#"{
//!   "$Version": "4.01",
//!   "Demo": {
//!     "Product": {
//!       "$Kind": "EntityType",
//!       "$Key": ["ID"],
//!       "ID": {"$Type": "Edm.Int32", "$Nullable": false},
//!       "SupplierID": {"$Type": "Edm.Int32"},
//!       "Supplier": {"$Kind": "NavigationProperty", "$Type": "Demo.Supplier", "$Partner": "Products"}
//!     },
//!     "Supplier": {
//!       "$Kind": "EntityType",
//!       "$Key": ["ID"],
//!       "ID": {"$Type": "Edm.Int32", "$Nullable": false},
//!       "Products": {"$Kind": "NavigationProperty", "$Type": "Demo.Product", "$Collection": true, "$Partner": "Supplier"}
//!     }
//!   }
//! }"#;
//!
//! let imported = CsdlJsonImporter::new().import(document).unwrap();
//! let resolved = MetadataPipeline::default().process(imported.schemas).unwrap();
//!
//! let association = &resolved.schema("Demo").unwrap().associations[0];
//! assert_eq!(association.association_name, "Demo.Product_Supplier");
//! ```

pub mod annotations;
pub mod config;
pub mod enums;
pub mod error;
pub mod import;
pub mod inference;
pub mod models;
pub mod pipeline;
pub mod primitives;

// Re-export commonly used types
pub use annotations::{AnnotationDecorator, AnnotationDispatcher, built_in_decorators};
pub use config::{ConfigError, ConstraintResolution, MetadataOptions};
pub use enums::TypeRegistry;
pub use error::{MetadataError, MetadataResult};
pub use import::{CsdlJsonImporter, ImportError, ImportResult};
pub use inference::{AssociationInferrer, ForeignKeyConvention};
pub use pipeline::{Adapter, MetadataPipeline, ResolvedMetadata};

// Re-export models
pub use models::{
    Annotation, Annotations, AssociationEndpoint, AssociationSet, EntityType, EnumInput,
    EnumMember, EnumTypeDescriptor, Facets, Multiplicity, NavigationProperty, Property,
    SchemaDocument,
};

// Re-export primitives
pub use primitives::{
    EdmDate, EdmDateTimeOffset, EdmDuration, EdmOffset, EdmPrimitive, EdmTimeOfDay,
    PrimitiveError,
};

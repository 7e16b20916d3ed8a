//! Models module for the SDK
//!
//! The in-memory CSDL schema graph and the structures the resolution passes
//! produce from it (associations, facets, enum descriptors).

pub mod annotation;
pub mod association;
pub mod enum_type;
pub mod facets;
pub mod schema;

pub use annotation::{Annotation, AnnotationExpression, Annotations};
pub use association::{
    AssociationEndpoint, AssociationSet, Multiplicity, ResolvedReferentialConstraint,
};
pub use enum_type::{EnumInput, EnumMember, EnumTypeDescriptor, UnderlyingType};
pub use facets::{
    AnnotationLiteral, FacetMap, FacetValue, Facets, StoreGeneratedPattern, ValidatorDescriptor,
};
pub use schema::{
    AssociationSetEnd, ContainerAssociationSet, EntityContainer, EntitySet, EntityType, EnumType,
    EnumTypeMember, NavigationProperty, Operation, OperationImport, Parameter, Property,
    ReferentialConstraintPair, SchemaDocument, Singleton,
};

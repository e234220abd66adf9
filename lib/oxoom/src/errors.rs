use crate::entity::InstanceKey;
use oxaxiom::{ConnectorError, NamedResource};
use thiserror::Error;

/// An error raised while building a [`Metamodel`](crate::Metamodel).
///
/// Mapping declarations are validated once, when the metamodel is assembled; a metamodel that
/// builds successfully cannot produce these errors later.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetamodelError {
    #[error("entity type {type_iri} is declared twice")]
    DuplicateType { type_iri: NamedResource },
    #[error("type {type_iri} maps the predicate {predicate} to more than one attribute")]
    DuplicatePredicate {
        type_iri: NamedResource,
        predicate: NamedResource,
    },
    #[error("type {type_iri} declares the attribute name {name} twice")]
    DuplicateAttributeName { type_iri: NamedResource, name: String },
    #[error("type {type_iri} declares more than one {role} attribute")]
    DuplicateSpecialAttribute {
        type_iri: NamedResource,
        /// Either `"types"` or `"properties"`.
        role: &'static str,
    },
    #[error("attribute {name} of type {type_iri} is inferred and cannot be a sequence")]
    InferredSequence { type_iri: NamedResource, name: String },
    #[error("metamodel contains no entity types")]
    Empty,
}

/// An error raised by the object–ontology mapping engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OomError {
    #[error(transparent)]
    Metamodel(#[from] MetamodelError),
    #[error(transparent)]
    Connector(#[from] ConnectorError),
    /// The requested class IRI is not part of the metamodel.
    #[error("unknown entity type {type_iri}")]
    UnknownEntityType { type_iri: NamedResource },
    /// The named attribute does not exist on the entity type.
    #[error("type {type_iri} has no attribute named {attribute}")]
    UnknownAttribute {
        type_iri: NamedResource,
        attribute: String,
    },
    /// A value was written through an attribute whose values the store infers.
    #[error("attribute {attribute} of {type_iri} is inferred and cannot be modified")]
    InferredAttributeModified {
        type_iri: NamedResource,
        attribute: String,
    },
    /// An entity with the same identifier already exists in the target context.
    #[error("an individual identified by {identifier} already exists in the target context")]
    EntityAlreadyExists { identifier: NamedResource },
    /// The instance is not part of this persistence context.
    #[error("entity is not managed by this persistence context")]
    EntityNotManaged,
    /// An instance was registered under a key that already names another instance.
    #[error("instance key {key} is already in use")]
    KeyInUse { key: InstanceKey },
    /// A persisted entity still references instances that were never persisted.
    #[error("commit would leave {} dangling references to unpersisted instances", keys.len())]
    PendingReferences { keys: Vec<InstanceKey> },
    /// An attribute value does not match the declared shape of the attribute.
    #[error("value of attribute {attribute} does not match its declared shape")]
    ShapeMismatch { attribute: String },
    /// The operation requires an active transaction, or the session was already closed.
    #[error("transaction is not active")]
    TransactionNotActive,
    /// The entity has no identifier and one was required.
    #[error("entity has no identifier")]
    MissingIdentifier,
}

use crate::axiom::Axiom;
use crate::descriptor::{
    AxiomDescriptor, AxiomValueDescriptor, ReferencedListDescriptor,
    ReferencedListValueDescriptor, SimpleListDescriptor, SimpleListValueDescriptor,
};
use crate::named_resource::NamedResource;
use crate::value::Value;
use std::error::Error;
use thiserror::Error;

/// The storage-agnostic contract the object–ontology mapping layer depends on.
///
/// One connector instance represents one connection to the underlying store and carries the
/// state of at most one transaction at a time. Mutating operations require an active
/// transaction, started with [`begin`](Connector::begin); reads outside a transaction observe
/// the last committed state.
pub trait Connector: Send {
    /// Loads the axioms matching the descriptor's assertions, from the descriptor's contexts.
    ///
    /// Inferred axioms are only included when the descriptor asks for them; their assertions
    /// carry the inferred marker.
    fn load_axioms(&self, descriptor: &AxiomDescriptor) -> Result<Vec<Axiom>, ConnectorError>;

    /// Writes the descriptor's values. [`Value::Null`] entries mark assertions without values
    /// and produce no triples.
    fn save_axioms(&mut self, descriptor: &AxiomValueDescriptor) -> Result<(), ConnectorError>;

    /// Removes all property values matching the descriptor's assertions. A descriptor without
    /// assertions removes every statement about the subject.
    fn remove_axioms(&mut self, descriptor: &AxiomDescriptor) -> Result<(), ConnectorError>;

    /// Loads a simple list, returning one axiom per element in sequence order.
    ///
    /// A malformed chain (fork, non-resource link, cycle) is an error, never a truncated
    /// result.
    fn load_simple_list(
        &self,
        descriptor: &SimpleListDescriptor,
    ) -> Result<Vec<Axiom>, ConnectorError>;

    /// Persists a simple list from scratch.
    fn persist_simple_list(
        &mut self,
        descriptor: &SimpleListValueDescriptor,
    ) -> Result<(), ConnectorError>;

    /// Merges a simple list with its stored state, replacing differing positions in place,
    /// dropping the obsolete tail and appending extra values.
    fn update_simple_list(
        &mut self,
        descriptor: &SimpleListValueDescriptor,
    ) -> Result<(), ConnectorError>;

    /// Loads a referenced list, returning one content axiom per sequence node in order. The
    /// axiom subjects are the sequence nodes.
    fn load_referenced_list(
        &self,
        descriptor: &ReferencedListDescriptor,
    ) -> Result<Vec<Axiom>, ConnectorError>;

    /// Persists a referenced list from scratch, generating fresh sequence nodes.
    fn persist_referenced_list(
        &mut self,
        descriptor: &ReferencedListValueDescriptor,
    ) -> Result<(), ConnectorError>;

    /// Merges a referenced list with its stored state. Surviving positions keep their sequence
    /// node identity; only the contents of differing positions are rewritten.
    fn update_referenced_list(
        &mut self,
        descriptor: &ReferencedListValueDescriptor,
    ) -> Result<(), ConnectorError>;

    /// Checks whether the given axiom is asserted in the given contexts. An empty context
    /// slice means the default graph.
    fn contains(&self, axiom: &Axiom, contexts: &[NamedResource]) -> Result<bool, ConnectorError> {
        Ok(!self
            .find(
                Some(axiom.subject()),
                Some(axiom.assertion().identifier()),
                Some(axiom.value()),
                contexts,
            )?
            .is_empty())
    }

    /// Checks whether any statement about the subject exists in the given contexts. An empty
    /// context slice means the default graph.
    fn contains_subject(
        &self,
        subject: &NamedResource,
        contexts: &[NamedResource],
    ) -> Result<bool, ConnectorError>;

    /// Pattern probe: all axioms matching the given subject, predicate and value, any of which
    /// may be left open. An empty context slice means the default graph.
    fn find(
        &self,
        subject: Option<&NamedResource>,
        predicate: Option<&NamedResource>,
        value: Option<&Value>,
        contexts: &[NamedResource],
    ) -> Result<Vec<Axiom>, ConnectorError>;

    /// Generates a fresh individual identifier derived from the given class IRI,
    /// collision-checked against the current store content.
    fn generate_identifier(
        &self,
        type_iri: &NamedResource,
    ) -> Result<NamedResource, ConnectorError>;

    /// Starts a transaction.
    fn begin(&mut self) -> Result<(), ConnectorError>;

    /// Atomically applies all changes accumulated since [`begin`](Connector::begin).
    fn commit(&mut self) -> Result<(), ConnectorError>;

    /// Discards all changes accumulated since [`begin`](Connector::begin).
    fn rollback(&mut self) -> Result<(), ConnectorError>;

    /// Whether a transaction is currently active on this connection.
    fn is_active(&self) -> bool;
}

/// An error raised by a store connector.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectorError {
    /// A mutating operation was invoked without an active transaction, or commit/rollback
    /// without one to finish.
    #[error("transaction is not active")]
    TransactionNotActive,
    /// `begin` was invoked while a transaction was already running.
    #[error("transaction is already active")]
    TransactionAlreadyActive,
    /// A list chain in the store is structurally broken and cannot be interpreted.
    #[error("malformed list chain at node {node}: {message}")]
    ListIntegrity {
        /// The node at which the walk failed.
        node: NamedResource,
        message: String,
    },
    /// No unused identifier could be derived for the given type.
    #[error("cannot generate a fresh identifier for type {type_iri}")]
    IdentifierGeneration { type_iri: NamedResource },
    /// A driver-specific failure.
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl ConnectorError {
    /// Wraps a driver-specific error.
    pub fn other(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }

    pub(crate) fn list_integrity(node: NamedResource, message: impl Into<String>) -> Self {
        Self::ListIntegrity {
            node,
            message: message.into(),
        }
    }
}

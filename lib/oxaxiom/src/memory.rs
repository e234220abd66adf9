//! A lightweight in-memory implementation of the [`Connector`] contract.
//!
//! [`MemoryStore`] holds committed content behind an `Arc<RwLock<_>>` and hands out
//! [`MemoryConnector`] connections. Each connection buffers its transaction as an operation
//! log that is replayed over the committed content for reads and applied atomically on
//! commit, so concurrent transactions interleave at the triple level (last commit wins).
//!
//! The store performs no reasoning. Inferred axioms can be seeded directly through
//! [`MemoryStore::insert_inferred`] to stand in for reasoner output; they are only visible to
//! descriptors that ask for inferred content.

use crate::assertion::Assertion;
use crate::axiom::Axiom;
use crate::connector::{Connector, ConnectorError};
use crate::descriptor::{
    AxiomDescriptor, AxiomValueDescriptor, ReferencedListDescriptor,
    ReferencedListValueDescriptor, SimpleListDescriptor, SimpleListValueDescriptor,
};
use crate::named_resource::NamedResource;
use crate::value::Value;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared in-memory triple content, partitioned into named graphs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    content: Arc<RwLock<Content>>,
}

#[derive(Default)]
struct Content {
    // None is the default graph
    graphs: FxHashMap<Option<NamedResource>, Vec<StoredAxiom>>,
}

#[derive(Clone)]
struct StoredAxiom {
    axiom: Axiom,
    inferred: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new connection to this store.
    pub fn connection(&self) -> MemoryConnector {
        MemoryConnector {
            store: self.clone(),
            transaction: None,
        }
    }

    /// Seeds an asserted axiom directly, bypassing transactions.
    pub fn insert(&self, axiom: Axiom, context: Option<NamedResource>) {
        self.insert_stored(axiom, context, false);
    }

    /// Seeds an inferred axiom directly, standing in for reasoner output.
    pub fn insert_inferred(&self, axiom: Axiom, context: Option<NamedResource>) {
        self.insert_stored(axiom, context, true);
    }

    fn insert_stored(&self, axiom: Axiom, context: Option<NamedResource>, inferred: bool) {
        let mut content = self.content.write().unwrap_or_else(PoisonError::into_inner);
        content
            .graphs
            .entry(context)
            .or_default()
            .push(StoredAxiom { axiom, inferred });
    }

    /// The number of asserted and inferred axioms across all graphs.
    pub fn len(&self) -> usize {
        let content = self.content.read().unwrap_or_else(PoisonError::into_inner);
        content.graphs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One connection to a [`MemoryStore`], carrying at most one open transaction.
pub struct MemoryConnector {
    store: MemoryStore,
    transaction: Option<Vec<TxOp>>,
}

#[derive(Debug, Clone)]
enum TxOp {
    Add {
        context: Option<NamedResource>,
        axiom: Axiom,
    },
    RemoveExact {
        context: Option<NamedResource>,
        axiom: Axiom,
    },
    RemoveMatching {
        context: Option<NamedResource>,
        subject: NamedResource,
        assertion: Option<Assertion>,
    },
}

/// Graph keys a context slice resolves to: the default graph when empty.
fn graph_keys(contexts: &[NamedResource]) -> Vec<Option<NamedResource>> {
    if contexts.is_empty() {
        vec![None]
    } else {
        contexts.iter().cloned().map(Some).collect()
    }
}

fn single_graph_key(context: Option<&NamedResource>) -> Vec<Option<NamedResource>> {
    vec![context.cloned()]
}

/// Kind compatibility: an unspecified side matches anything.
fn kinds_match(requested: &Assertion, stored: &Assertion) -> bool {
    use crate::assertion::AssertionKind::Unspecified;
    requested.identifier() == stored.identifier()
        && (requested.kind() == Unspecified
            || stored.kind() == Unspecified
            || requested.kind() == stored.kind())
}

/// A language-constrained assertion only accepts lang strings in its language;
/// untagged literals and resources always pass.
fn language_matches(requested: &Assertion, value: &Value) -> bool {
    match (requested.language(), value.language()) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => true,
    }
}

impl MemoryConnector {
    /// Committed content plus the replayed transaction log, restricted to the given graphs
    /// (all graphs when `scope` is `None`).
    fn view(
        &self,
        scope: Option<&[Option<NamedResource>]>,
    ) -> Vec<(Option<NamedResource>, Axiom, bool)> {
        let in_scope = |context: &Option<NamedResource>| match scope {
            Some(keys) => keys.contains(context),
            None => true,
        };
        let mut view = {
            let content = self
                .store
                .content
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            let mut view = Vec::new();
            for (context, axioms) in &content.graphs {
                if !in_scope(context) {
                    continue;
                }
                for stored in axioms {
                    view.push((context.clone(), stored.axiom.clone(), stored.inferred));
                }
            }
            view
        };
        if let Some(ops) = &self.transaction {
            for op in ops {
                match op {
                    TxOp::Add { context, axiom } => {
                        if in_scope(context) {
                            view.push((context.clone(), axiom.clone(), false));
                        }
                    }
                    TxOp::RemoveExact { context, axiom } => {
                        view.retain(|(c, a, _)| c != context || a != axiom);
                    }
                    TxOp::RemoveMatching {
                        context,
                        subject,
                        assertion,
                    } => {
                        view.retain(|(c, a, _)| {
                            c != context
                                || a.subject() != subject
                                || assertion
                                    .as_ref()
                                    .is_some_and(|requested| !kinds_match(requested, a.assertion()))
                        });
                    }
                }
            }
        }
        view
    }

    fn ops(&mut self) -> Result<&mut Vec<TxOp>, ConnectorError> {
        self.transaction
            .as_mut()
            .ok_or(ConnectorError::TransactionNotActive)
    }

    /// Successor probe used by the chain walks: the values of `assertion` on `subject`.
    fn links_of(
        &self,
        subject: &NamedResource,
        assertion: &Assertion,
        context: Option<&NamedResource>,
    ) -> Vec<Axiom> {
        self.view(Some(&single_graph_key(context)))
            .into_iter()
            .filter(|(_, a, _)| a.subject() == subject && kinds_match(assertion, a.assertion()))
            .map(|(_, a, _)| a)
            .collect()
    }

    fn walk_simple_list(
        &self,
        descriptor: &SimpleListDescriptor,
    ) -> Result<Vec<Axiom>, ConnectorError> {
        let mut result = Vec::new();
        let mut visited = FxHashSet::default();
        let mut current = descriptor.owner().clone();
        let mut link = descriptor.has_list().clone();
        loop {
            let mut successors = self.links_of(&current, &link, descriptor.context());
            if successors.is_empty() {
                return Ok(result);
            }
            if successors.len() > 1 {
                return Err(ConnectorError::list_integrity(
                    current,
                    "node has multiple successors",
                ));
            }
            let axiom = successors.swap_remove(0);
            let Some(element) = axiom.value().as_resource().cloned() else {
                return Err(ConnectorError::list_integrity(
                    current,
                    "list link points at a literal",
                ));
            };
            if !visited.insert(element.clone()) {
                return Err(ConnectorError::list_integrity(element, "cycle in list chain"));
            }
            result.push(axiom);
            current = element;
            link = descriptor.has_next().clone();
        }
    }

    /// The node chain of a referenced list, as `(node, content axiom)` pairs.
    fn walk_referenced_list(
        &self,
        descriptor: &ReferencedListDescriptor,
    ) -> Result<Vec<Axiom>, ConnectorError> {
        let mut result = Vec::new();
        let mut visited = FxHashSet::default();
        let mut previous = descriptor.owner().clone();
        let mut link = descriptor.has_list().clone();
        loop {
            let successors = self.links_of(&previous, &link, descriptor.context());
            if successors.is_empty() {
                return Ok(result);
            }
            if successors.len() > 1 {
                return Err(ConnectorError::list_integrity(
                    previous,
                    "node has multiple successors",
                ));
            }
            let Some(node) = successors[0].value().as_resource().cloned() else {
                return Err(ConnectorError::list_integrity(
                    previous,
                    "list link points at a literal",
                ));
            };
            if !visited.insert(node.clone()) {
                return Err(ConnectorError::list_integrity(node, "cycle in list chain"));
            }
            let mut contents = self.links_of(&node, descriptor.has_content(), descriptor.context());
            match contents.len() {
                0 => {
                    return Err(ConnectorError::list_integrity(
                        node,
                        "sequence node has no content",
                    ));
                }
                1 => result.push(contents.remove(0)),
                _ => {
                    return Err(ConnectorError::list_integrity(
                        node,
                        "sequence node has multiple contents",
                    ));
                }
            }
            previous = node;
            link = descriptor.has_next().clone();
        }
    }

    /// Probes `<owner>-SEQ_<n>` for increasing `n` until an unused node IRI is found.
    ///
    /// Probing instead of counting is deliberate: concurrent owners may have created sequence
    /// nodes this connection cannot see counted.
    fn generate_sequence_node(
        &self,
        owner: &NamedResource,
        context: Option<&NamedResource>,
        reserved: &FxHashSet<NamedResource>,
    ) -> NamedResource {
        let scope = single_graph_key(context);
        let mut index = 0u32;
        loop {
            let candidate = NamedResource::new_unchecked(format!("{}-SEQ_{index}", owner.as_str()));
            let used = reserved.contains(&candidate)
                || self
                    .view(Some(&scope))
                    .iter()
                    .any(|(_, a, _)| *a.subject() == candidate);
            if !used {
                return candidate;
            }
            index += 1;
        }
    }
}

impl Connector for MemoryConnector {
    fn load_axioms(&self, descriptor: &AxiomDescriptor) -> Result<Vec<Axiom>, ConnectorError> {
        let mut result = Vec::new();
        for assertion in descriptor.assertions() {
            let scope = graph_keys(descriptor.contexts_of(assertion));
            for (_, axiom, inferred) in self.view(Some(&scope)) {
                if axiom.subject() != descriptor.subject()
                    || !kinds_match(assertion, axiom.assertion())
                    || !language_matches(assertion, axiom.value())
                {
                    continue;
                }
                if inferred && !descriptor.include_inferred() {
                    continue;
                }
                let (subject, loaded_assertion, value) = axiom.into_parts();
                let loaded_assertion = if inferred {
                    loaded_assertion.into_inferred()
                } else {
                    loaded_assertion
                };
                result.push(Axiom::new(subject, loaded_assertion, value));
            }
        }
        Ok(result)
    }

    fn save_axioms(&mut self, descriptor: &AxiomValueDescriptor) -> Result<(), ConnectorError> {
        let subject = descriptor.subject().clone();
        let mut additions = Vec::new();
        for assertion in descriptor.assertions() {
            let context = descriptor.context_of(assertion).cloned();
            for value in descriptor.values_of(assertion) {
                if value.is_null() {
                    continue;
                }
                additions.push(TxOp::Add {
                    context: context.clone(),
                    axiom: Axiom::new(subject.clone(), assertion.clone(), value.clone()),
                });
            }
        }
        self.ops()?.extend(additions);
        Ok(())
    }

    fn remove_axioms(&mut self, descriptor: &AxiomDescriptor) -> Result<(), ConnectorError> {
        let subject = descriptor.subject().clone();
        let mut removals = Vec::new();
        if descriptor.assertions().is_empty() {
            for context in graph_keys(descriptor.subject_contexts()) {
                removals.push(TxOp::RemoveMatching {
                    context,
                    subject: subject.clone(),
                    assertion: None,
                });
            }
        } else {
            for assertion in descriptor.assertions() {
                for context in graph_keys(descriptor.contexts_of(assertion)) {
                    removals.push(TxOp::RemoveMatching {
                        context,
                        subject: subject.clone(),
                        assertion: Some(assertion.clone()),
                    });
                }
            }
        }
        self.ops()?.extend(removals);
        Ok(())
    }

    fn load_simple_list(
        &self,
        descriptor: &SimpleListDescriptor,
    ) -> Result<Vec<Axiom>, ConnectorError> {
        self.walk_simple_list(descriptor)
    }

    fn persist_simple_list(
        &mut self,
        descriptor: &SimpleListValueDescriptor,
    ) -> Result<(), ConnectorError> {
        if descriptor.values().is_empty() {
            return Ok(());
        }
        let list = descriptor.list();
        let context = list.context().cloned();
        let mut additions = Vec::with_capacity(descriptor.values().len());
        let mut previous = list.owner().clone();
        let mut link = list.has_list().clone();
        for element in descriptor.values() {
            additions.push(TxOp::Add {
                context: context.clone(),
                axiom: Axiom::new(previous, link, Value::Resource(element.clone())),
            });
            previous = element.clone();
            link = list.has_next().clone();
        }
        self.ops()?.extend(additions);
        Ok(())
    }

    fn update_simple_list(
        &mut self,
        descriptor: &SimpleListValueDescriptor,
    ) -> Result<(), ConnectorError> {
        let list = descriptor.list();
        let context = list.context().cloned();
        let existing: Vec<NamedResource> = self
            .walk_simple_list(list)?
            .into_iter()
            .filter_map(|axiom| axiom.value().as_resource().cloned())
            .collect();
        let desired = descriptor.values();

        let mut ops = Vec::new();
        let mut previous = list.owner().clone();
        let mut link = list.has_list().clone();
        let shared = existing.len().min(desired.len());
        for position in 0..shared {
            let old = &existing[position];
            let new = &desired[position];
            if old != new {
                // replace in place: relink the predecessor and move the outgoing link
                ops.push(TxOp::RemoveExact {
                    context: context.clone(),
                    axiom: Axiom::new(previous.clone(), link.clone(), Value::Resource(old.clone())),
                });
                ops.push(TxOp::Add {
                    context: context.clone(),
                    axiom: Axiom::new(previous.clone(), link.clone(), Value::Resource(new.clone())),
                });
                if position + 1 < existing.len() {
                    let successor = existing[position + 1].clone();
                    ops.push(TxOp::RemoveExact {
                        context: context.clone(),
                        axiom: Axiom::new(
                            old.clone(),
                            list.has_next().clone(),
                            Value::Resource(successor.clone()),
                        ),
                    });
                    ops.push(TxOp::Add {
                        context: context.clone(),
                        axiom: Axiom::new(
                            new.clone(),
                            list.has_next().clone(),
                            Value::Resource(successor),
                        ),
                    });
                }
                previous = new.clone();
            } else {
                previous = old.clone();
            }
            link = list.has_next().clone();
        }
        if existing.len() > desired.len() {
            // the obsolete nodes are the tail, no re-linking needed
            let link_to_tail = if shared == 0 {
                list.has_list().clone()
            } else {
                list.has_next().clone()
            };
            ops.push(TxOp::RemoveExact {
                context: context.clone(),
                axiom: Axiom::new(
                    previous,
                    link_to_tail,
                    Value::Resource(existing[shared].clone()),
                ),
            });
            for position in shared..existing.len() - 1 {
                ops.push(TxOp::RemoveExact {
                    context: context.clone(),
                    axiom: Axiom::new(
                        existing[position].clone(),
                        list.has_next().clone(),
                        Value::Resource(existing[position + 1].clone()),
                    ),
                });
            }
        } else {
            for element in &desired[shared..] {
                ops.push(TxOp::Add {
                    context: context.clone(),
                    axiom: Axiom::new(previous, link, Value::Resource(element.clone())),
                });
                previous = element.clone();
                link = list.has_next().clone();
            }
        }
        self.ops()?.extend(ops);
        Ok(())
    }

    fn load_referenced_list(
        &self,
        descriptor: &ReferencedListDescriptor,
    ) -> Result<Vec<Axiom>, ConnectorError> {
        self.walk_referenced_list(descriptor)
    }

    fn persist_referenced_list(
        &mut self,
        descriptor: &ReferencedListValueDescriptor,
    ) -> Result<(), ConnectorError> {
        if descriptor.values().is_empty() {
            return Ok(());
        }
        let list = descriptor.list();
        let context = list.context().cloned();
        let mut reserved = FxHashSet::default();
        let mut ops = Vec::with_capacity(descriptor.values().len() * 2);
        let mut previous = list.owner().clone();
        let mut link = list.has_list().clone();
        for element in descriptor.values() {
            let node = self.generate_sequence_node(list.owner(), list.context(), &reserved);
            reserved.insert(node.clone());
            ops.push(TxOp::Add {
                context: context.clone(),
                axiom: Axiom::new(previous, link, Value::Resource(node.clone())),
            });
            ops.push(TxOp::Add {
                context: context.clone(),
                axiom: Axiom::new(
                    node.clone(),
                    list.has_content().clone(),
                    Value::Resource(element.clone()),
                ),
            });
            previous = node;
            link = list.has_next().clone();
        }
        self.ops()?.extend(ops);
        Ok(())
    }

    fn update_referenced_list(
        &mut self,
        descriptor: &ReferencedListValueDescriptor,
    ) -> Result<(), ConnectorError> {
        let list = descriptor.list();
        let context = list.context().cloned();
        let existing: Vec<(NamedResource, Value)> = self
            .walk_referenced_list(list)?
            .into_iter()
            .map(|axiom| {
                let (node, _, value) = axiom.into_parts();
                (node, value)
            })
            .collect();
        let desired = descriptor.values();

        let mut ops = Vec::new();
        let shared = existing.len().min(desired.len());
        for position in 0..shared {
            let (node, content) = &existing[position];
            let new_content = Value::Resource(desired[position].clone());
            if *content != new_content {
                // the sequence node survives, only its content is rewritten
                ops.push(TxOp::RemoveExact {
                    context: context.clone(),
                    axiom: Axiom::new(node.clone(), list.has_content().clone(), content.clone()),
                });
                ops.push(TxOp::Add {
                    context: context.clone(),
                    axiom: Axiom::new(node.clone(), list.has_content().clone(), new_content),
                });
            }
        }
        if existing.len() > desired.len() {
            let last_surviving = if shared == 0 {
                list.owner().clone()
            } else {
                existing[shared - 1].0.clone()
            };
            let link_to_tail = if shared == 0 {
                list.has_list().clone()
            } else {
                list.has_next().clone()
            };
            ops.push(TxOp::RemoveExact {
                context: context.clone(),
                axiom: Axiom::new(
                    last_surviving,
                    link_to_tail,
                    Value::Resource(existing[shared].0.clone()),
                ),
            });
            for position in shared..existing.len() {
                let node = existing[position].0.clone();
                ops.push(TxOp::RemoveMatching {
                    context: context.clone(),
                    subject: node,
                    assertion: None,
                });
            }
        } else if desired.len() > existing.len() {
            let mut reserved = FxHashSet::default();
            let mut previous = if shared == 0 {
                list.owner().clone()
            } else {
                existing[shared - 1].0.clone()
            };
            let mut link = if shared == 0 {
                list.has_list().clone()
            } else {
                list.has_next().clone()
            };
            for element in &desired[shared..] {
                let node = self.generate_sequence_node(list.owner(), list.context(), &reserved);
                reserved.insert(node.clone());
                ops.push(TxOp::Add {
                    context: context.clone(),
                    axiom: Axiom::new(previous, link, Value::Resource(node.clone())),
                });
                ops.push(TxOp::Add {
                    context: context.clone(),
                    axiom: Axiom::new(
                        node.clone(),
                        list.has_content().clone(),
                        Value::Resource(element.clone()),
                    ),
                });
                previous = node;
                link = list.has_next().clone();
            }
        }
        self.ops()?.extend(ops);
        Ok(())
    }

    fn contains_subject(
        &self,
        subject: &NamedResource,
        contexts: &[NamedResource],
    ) -> Result<bool, ConnectorError> {
        let scope = graph_keys(contexts);
        Ok(self
            .view(Some(&scope))
            .iter()
            .any(|(_, axiom, _)| axiom.subject() == subject))
    }

    fn find(
        &self,
        subject: Option<&NamedResource>,
        predicate: Option<&NamedResource>,
        value: Option<&Value>,
        contexts: &[NamedResource],
    ) -> Result<Vec<Axiom>, ConnectorError> {
        let scope = graph_keys(contexts);
        Ok(self
            .view(Some(&scope))
            .into_iter()
            .filter(|(_, axiom, _)| {
                subject.is_none_or(|s| axiom.subject() == s)
                    && predicate.is_none_or(|p| axiom.assertion().identifier() == p)
                    && value.is_none_or(|v| axiom.value() == v)
            })
            .map(|(_, axiom, _)| axiom)
            .collect())
    }

    fn generate_identifier(
        &self,
        type_iri: &NamedResource,
    ) -> Result<NamedResource, ConnectorError> {
        for _ in 0..64 {
            let candidate = NamedResource::new_unchecked(format!(
                "{}_instance_{:08x}",
                type_iri.as_str(),
                rand::random::<u32>()
            ));
            let used = self
                .view(None)
                .iter()
                .any(|(_, axiom, _)| *axiom.subject() == candidate);
            if !used {
                return Ok(candidate);
            }
        }
        Err(ConnectorError::IdentifierGeneration {
            type_iri: type_iri.clone(),
        })
    }

    fn begin(&mut self) -> Result<(), ConnectorError> {
        if self.transaction.is_some() {
            return Err(ConnectorError::TransactionAlreadyActive);
        }
        self.transaction = Some(Vec::new());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), ConnectorError> {
        let ops = self
            .transaction
            .take()
            .ok_or(ConnectorError::TransactionNotActive)?;
        let mut content = self
            .store
            .content
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for op in ops {
            match op {
                TxOp::Add { context, axiom } => {
                    content.graphs.entry(context).or_default().push(StoredAxiom {
                        axiom,
                        inferred: false,
                    });
                }
                TxOp::RemoveExact { context, axiom } => {
                    if let Some(graph) = content.graphs.get_mut(&context) {
                        graph.retain(|stored| stored.axiom != axiom);
                    }
                }
                TxOp::RemoveMatching {
                    context,
                    subject,
                    assertion,
                } => {
                    if let Some(graph) = content.graphs.get_mut(&context) {
                        graph.retain(|stored| {
                            stored.axiom.subject() != &subject
                                || assertion.as_ref().is_some_and(|requested| {
                                    !kinds_match(requested, stored.axiom.assertion())
                                })
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ConnectorError> {
        if self.transaction.take().is_none() {
            return Err(ConnectorError::TransactionNotActive);
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.transaction.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(iri: &str) -> NamedResource {
        NamedResource::new_unchecked(iri)
    }

    fn property(iri: &str) -> Assertion {
        Assertion::data_property(resource(iri), false)
    }

    #[test]
    fn reads_outside_transaction_see_committed_state_only() {
        let store = MemoryStore::new();
        let mut writer = store.connection();
        let reader = store.connection();
        let subject = resource("http://e.com/a");
        let assertion = property("http://e.com/p");

        writer.begin().unwrap();
        let mut save = AxiomValueDescriptor::new(subject.clone());
        save.add_value(&assertion, "v".into());
        writer.save_axioms(&save).unwrap();

        let mut load = AxiomDescriptor::new(subject);
        load.add_assertion(assertion);
        assert!(reader.load_axioms(&load).unwrap().is_empty());
        writer.commit().unwrap();
        assert_eq!(reader.load_axioms(&load).unwrap().len(), 1);
    }

    #[test]
    fn rollback_discards_buffered_changes() {
        let store = MemoryStore::new();
        let mut connector = store.connection();
        let subject = resource("http://e.com/a");
        let assertion = property("http://e.com/p");

        connector.begin().unwrap();
        let mut save = AxiomValueDescriptor::new(subject.clone());
        save.add_value(&assertion, "v".into());
        connector.save_axioms(&save).unwrap();
        connector.rollback().unwrap();

        assert!(store.is_empty());
        assert!(!connector.is_active());
    }

    #[test]
    fn mutations_require_active_transaction() {
        let store = MemoryStore::new();
        let mut connector = store.connection();
        let mut save = AxiomValueDescriptor::new(resource("http://e.com/a"));
        save.add_value(&property("http://e.com/p"), "v".into());
        assert!(matches!(
            connector.save_axioms(&save),
            Err(ConnectorError::TransactionNotActive)
        ));
    }

    #[test]
    fn null_values_produce_no_triples() {
        let store = MemoryStore::new();
        let mut connector = store.connection();
        connector.begin().unwrap();
        let mut save = AxiomValueDescriptor::new(resource("http://e.com/a"));
        save.add_value(&property("http://e.com/p"), Value::null());
        connector.save_axioms(&save).unwrap();
        connector.commit().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn inferred_axioms_are_hidden_by_default() {
        let store = MemoryStore::new();
        let subject = resource("http://e.com/a");
        let assertion = property("http://e.com/p");
        store.insert_inferred(
            Axiom::new(subject.clone(), assertion.clone(), "derived".into()),
            None,
        );

        let connector = store.connection();
        let mut load = AxiomDescriptor::new(subject);
        load.add_assertion(assertion);
        assert!(connector.load_axioms(&load).unwrap().is_empty());

        load.set_include_inferred(true);
        let loaded = connector.load_axioms(&load).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].assertion().is_inferred());
    }

    #[test]
    fn language_constrained_load_filters_translations() {
        let store = MemoryStore::new();
        let subject = resource("http://e.com/a");
        let untagged = property("http://e.com/p");
        store.insert(
            Axiom::new(
                subject.clone(),
                untagged.clone(),
                crate::LiteralValue::lang_string("building", "en").unwrap().into(),
            ),
            None,
        );
        store.insert(
            Axiom::new(
                subject.clone(),
                untagged,
                crate::LiteralValue::lang_string("budova", "cs").unwrap().into(),
            ),
            None,
        );

        let connector = store.connection();
        let english =
            Assertion::data_property_with_language(resource("http://e.com/p"), "en", false)
                .unwrap();
        let mut load = AxiomDescriptor::new(subject);
        load.add_assertion(english);
        let loaded = connector.load_axioms(&load).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].value().language(), Some("en"));
    }

    #[test]
    fn contains_matches_exact_axioms() {
        let store = MemoryStore::new();
        let subject = resource("http://e.com/a");
        let assertion = property("http://e.com/p");
        store.insert(
            Axiom::new(subject.clone(), assertion.clone(), "v".into()),
            None,
        );

        let connector = store.connection();
        assert!(
            connector
                .contains(&Axiom::new(subject.clone(), assertion.clone(), "v".into()), &[])
                .unwrap()
        );
        assert!(
            !connector
                .contains(&Axiom::new(subject, assertion, "w".into()), &[])
                .unwrap()
        );
    }

    #[test]
    fn generated_identifiers_are_fresh() {
        let store = MemoryStore::new();
        let connector = store.connection();
        let type_iri = resource("http://e.com/Type");
        let first = connector.generate_identifier(&type_iri).unwrap();
        let second = connector.generate_identifier(&type_iri).unwrap();
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("http://e.com/Type_instance_"));
    }
}

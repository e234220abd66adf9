//! Request objects exchanged with a [`Connector`](crate::Connector).
//!
//! A descriptor names a subject and the assertions of interest, together with the contexts
//! (named graphs) to read from or write into. Descriptors are built fresh for each field load
//! or save operation and are never persisted.

use crate::assertion::Assertion;
use crate::named_resource::NamedResource;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::fmt;

/// A read request: a subject plus, for each assertion of interest, the contexts to load from.
///
/// An assertion without explicit contexts falls back to the subject-level contexts; an empty
/// context set means the default graph.
#[derive(Debug, Clone)]
pub struct AxiomDescriptor {
    subject: NamedResource,
    assertions: Vec<Assertion>,
    assertion_contexts: FxHashMap<Assertion, Vec<NamedResource>>,
    subject_contexts: Vec<NamedResource>,
    include_inferred: bool,
}

impl AxiomDescriptor {
    pub fn new(subject: NamedResource) -> Self {
        Self {
            subject,
            assertions: Vec::new(),
            assertion_contexts: FxHashMap::default(),
            subject_contexts: Vec::new(),
            include_inferred: false,
        }
    }

    #[inline]
    pub fn subject(&self) -> &NamedResource {
        &self.subject
    }

    /// Registers an assertion to load. Duplicates are ignored.
    pub fn add_assertion(&mut self, assertion: Assertion) {
        if !self.assertions.contains(&assertion) {
            self.assertions.push(assertion);
        }
    }

    /// The registered assertions, in registration order.
    #[inline]
    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    /// Adds a context applying to every assertion without explicit contexts.
    pub fn add_subject_context(&mut self, context: NamedResource) {
        if !self.subject_contexts.contains(&context) {
            self.subject_contexts.push(context);
        }
    }

    /// Adds a context applying to the given assertion only.
    pub fn add_assertion_context(&mut self, assertion: &Assertion, context: NamedResource) {
        let contexts = self
            .assertion_contexts
            .entry(assertion.clone())
            .or_default();
        if !contexts.contains(&context) {
            contexts.push(context);
        }
    }

    /// The subject-level contexts. Empty means the default graph.
    #[inline]
    pub fn subject_contexts(&self) -> &[NamedResource] {
        &self.subject_contexts
    }

    /// The contexts to load the given assertion from. Empty means the default graph.
    pub fn contexts_of(&self, assertion: &Assertion) -> &[NamedResource] {
        self.assertion_contexts
            .get(assertion)
            .map_or(&self.subject_contexts, Vec::as_slice)
    }

    #[inline]
    pub fn set_include_inferred(&mut self, include_inferred: bool) {
        self.include_inferred = include_inferred;
    }

    #[inline]
    pub fn include_inferred(&self) -> bool {
        self.include_inferred
    }
}

impl fmt::Display for AxiomDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} assertions", self.subject, self.assertions.len())
    }
}

/// A write request: a subject plus, for each assertion, the ordered values to save and the
/// context to save them into.
#[derive(Debug, Clone)]
pub struct AxiomValueDescriptor {
    subject: NamedResource,
    assertions: Vec<Assertion>,
    values: FxHashMap<Assertion, Vec<Value>>,
    assertion_contexts: FxHashMap<Assertion, NamedResource>,
    subject_context: Option<NamedResource>,
}

impl AxiomValueDescriptor {
    pub fn new(subject: NamedResource) -> Self {
        Self {
            subject,
            assertions: Vec::new(),
            values: FxHashMap::default(),
            assertion_contexts: FxHashMap::default(),
            subject_context: None,
        }
    }

    #[inline]
    pub fn subject(&self) -> &NamedResource {
        &self.subject
    }

    /// Appends a value for the given assertion, keeping per-assertion insertion order.
    pub fn add_value(&mut self, assertion: &Assertion, value: Value) {
        if !self.assertions.contains(assertion) {
            self.assertions.push(assertion.clone());
        }
        self.values
            .entry(assertion.clone())
            .or_default()
            .push(value);
    }

    /// The registered assertions, in registration order.
    #[inline]
    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    /// The ordered values registered for the given assertion.
    pub fn values_of(&self, assertion: &Assertion) -> &[Value] {
        self.values.get(assertion).map_or(&[], Vec::as_slice)
    }

    /// Sets the context applying to every assertion without an explicit one.
    pub fn set_subject_context(&mut self, context: Option<NamedResource>) {
        self.subject_context = context;
    }

    /// Sets the context the given assertion's values are saved into.
    pub fn set_assertion_context(&mut self, assertion: &Assertion, context: NamedResource) {
        self.assertion_contexts.insert(assertion.clone(), context);
    }

    /// The context the given assertion's values are saved into. `None` means the default graph.
    pub fn context_of(&self, assertion: &Assertion) -> Option<&NamedResource> {
        self.assertion_contexts
            .get(assertion)
            .or(self.subject_context.as_ref())
    }
}

/// A read request for a simple list: the owner's `has_list` edge points directly at the head
/// element and each element links to its successor via `has_next`.
#[derive(Debug, Clone)]
pub struct SimpleListDescriptor {
    owner: NamedResource,
    has_list: Assertion,
    has_next: Assertion,
    context: Option<NamedResource>,
}

impl SimpleListDescriptor {
    pub fn new(owner: NamedResource, has_list: Assertion, has_next: Assertion) -> Self {
        Self {
            owner,
            has_list,
            has_next,
            context: None,
        }
    }

    #[inline]
    pub fn owner(&self) -> &NamedResource {
        &self.owner
    }

    #[inline]
    pub fn has_list(&self) -> &Assertion {
        &self.has_list
    }

    #[inline]
    pub fn has_next(&self) -> &Assertion {
        &self.has_next
    }

    pub fn set_context(&mut self, context: Option<NamedResource>) {
        self.context = context;
    }

    #[inline]
    pub fn context(&self) -> Option<&NamedResource> {
        self.context.as_ref()
    }
}

/// A write request for a simple list: the descriptor plus the desired element sequence.
#[derive(Debug, Clone)]
pub struct SimpleListValueDescriptor {
    list: SimpleListDescriptor,
    values: Vec<NamedResource>,
}

impl SimpleListValueDescriptor {
    pub fn new(list: SimpleListDescriptor) -> Self {
        Self {
            list,
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn list(&self) -> &SimpleListDescriptor {
        &self.list
    }

    pub fn add_value(&mut self, value: NamedResource) {
        self.values.push(value);
    }

    #[inline]
    pub fn values(&self) -> &[NamedResource] {
        &self.values
    }
}

/// A read request for a referenced list: the owner's `has_list` edge points at a synthetic
/// sequence node; each node carries a `has_content` edge to the element and a `has_next` edge
/// to the following node.
#[derive(Debug, Clone)]
pub struct ReferencedListDescriptor {
    owner: NamedResource,
    has_list: Assertion,
    has_next: Assertion,
    has_content: Assertion,
    context: Option<NamedResource>,
}

impl ReferencedListDescriptor {
    pub fn new(
        owner: NamedResource,
        has_list: Assertion,
        has_next: Assertion,
        has_content: Assertion,
    ) -> Self {
        Self {
            owner,
            has_list,
            has_next,
            has_content,
            context: None,
        }
    }

    #[inline]
    pub fn owner(&self) -> &NamedResource {
        &self.owner
    }

    #[inline]
    pub fn has_list(&self) -> &Assertion {
        &self.has_list
    }

    #[inline]
    pub fn has_next(&self) -> &Assertion {
        &self.has_next
    }

    #[inline]
    pub fn has_content(&self) -> &Assertion {
        &self.has_content
    }

    pub fn set_context(&mut self, context: Option<NamedResource>) {
        self.context = context;
    }

    #[inline]
    pub fn context(&self) -> Option<&NamedResource> {
        self.context.as_ref()
    }
}

/// A write request for a referenced list: the descriptor plus the desired element sequence.
#[derive(Debug, Clone)]
pub struct ReferencedListValueDescriptor {
    list: ReferencedListDescriptor,
    values: Vec<NamedResource>,
}

impl ReferencedListValueDescriptor {
    pub fn new(list: ReferencedListDescriptor) -> Self {
        Self {
            list,
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn list(&self) -> &ReferencedListDescriptor {
        &self.list
    }

    pub fn add_value(&mut self, value: NamedResource) {
        self.values.push(value);
    }

    #[inline]
    pub fn values(&self) -> &[NamedResource] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assertion(iri: &str) -> Assertion {
        Assertion::data_property(NamedResource::new_unchecked(iri), false)
    }

    #[test]
    fn assertion_contexts_fall_back_to_subject_contexts() {
        let mut descriptor = AxiomDescriptor::new(NamedResource::new_unchecked("http://e.com/a"));
        let first = assertion("http://e.com/p1");
        let second = assertion("http://e.com/p2");
        descriptor.add_assertion(first.clone());
        descriptor.add_assertion(second.clone());
        let shared = NamedResource::new_unchecked("http://e.com/ctx");
        let dedicated = NamedResource::new_unchecked("http://e.com/other");
        descriptor.add_subject_context(shared.clone());
        descriptor.add_assertion_context(&second, dedicated.clone());

        assert_eq!(descriptor.contexts_of(&first), &[shared]);
        assert_eq!(descriptor.contexts_of(&second), &[dedicated]);
    }

    #[test]
    fn duplicate_assertions_are_registered_once() {
        let mut descriptor = AxiomDescriptor::new(NamedResource::new_unchecked("http://e.com/a"));
        descriptor.add_assertion(assertion("http://e.com/p"));
        descriptor.add_assertion(assertion("http://e.com/p"));
        assert_eq!(descriptor.assertions().len(), 1);
    }

    #[test]
    fn value_descriptor_keeps_per_assertion_order() {
        let mut descriptor =
            AxiomValueDescriptor::new(NamedResource::new_unchecked("http://e.com/a"));
        let property = assertion("http://e.com/p");
        descriptor.add_value(&property, "one".into());
        descriptor.add_value(&property, "two".into());
        assert_eq!(
            descriptor.values_of(&property),
            &[Value::from("one"), Value::from("two")]
        );
    }
}

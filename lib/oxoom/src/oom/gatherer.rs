use oxaxiom::{
    Assertion, AxiomValueDescriptor, Connector, ConnectorError, NamedResource,
    ReferencedListValueDescriptor, SimpleListValueDescriptor, Value,
};

/// Accumulates the axiom values produced for one entity and writes them out in one pass.
///
/// Attribute strategies append plain values and list operations here; nothing touches the
/// connector until [`flush`](Self::flush).
#[derive(Debug)]
pub(crate) struct AxiomValueGatherer {
    values: AxiomValueDescriptor,
    simple_persists: Vec<SimpleListValueDescriptor>,
    simple_updates: Vec<SimpleListValueDescriptor>,
    referenced_persists: Vec<ReferencedListValueDescriptor>,
    referenced_updates: Vec<ReferencedListValueDescriptor>,
}

impl AxiomValueGatherer {
    pub fn new(subject: NamedResource, context: Option<NamedResource>) -> Self {
        let mut values = AxiomValueDescriptor::new(subject);
        values.set_subject_context(context);
        Self {
            values,
            simple_persists: Vec::new(),
            simple_updates: Vec::new(),
            referenced_persists: Vec::new(),
            referenced_updates: Vec::new(),
        }
    }

    pub fn add_value(
        &mut self,
        assertion: &Assertion,
        value: Value,
        context: Option<&NamedResource>,
    ) {
        self.values.add_value(assertion, value);
        if let Some(context) = context {
            self.values.set_assertion_context(assertion, context.clone());
        }
    }

    pub fn add_values(
        &mut self,
        assertion: &Assertion,
        values: Vec<Value>,
        context: Option<&NamedResource>,
    ) {
        for value in values {
            self.values.add_value(assertion, value);
        }
        if let Some(context) = context {
            self.values.set_assertion_context(assertion, context.clone());
        }
    }

    pub fn persist_simple_list(&mut self, descriptor: SimpleListValueDescriptor) {
        self.simple_persists.push(descriptor);
    }

    pub fn update_simple_list(&mut self, descriptor: SimpleListValueDescriptor) {
        self.simple_updates.push(descriptor);
    }

    pub fn persist_referenced_list(&mut self, descriptor: ReferencedListValueDescriptor) {
        self.referenced_persists.push(descriptor);
    }

    pub fn update_referenced_list(&mut self, descriptor: ReferencedListValueDescriptor) {
        self.referenced_updates.push(descriptor);
    }

    /// Writes everything gathered so far into the connector's transaction.
    pub fn flush(self, connector: &mut dyn Connector) -> Result<(), ConnectorError> {
        if !self.values.assertions().is_empty() {
            connector.save_axioms(&self.values)?;
        }
        for descriptor in &self.simple_persists {
            connector.persist_simple_list(descriptor)?;
        }
        for descriptor in &self.simple_updates {
            connector.update_simple_list(descriptor)?;
        }
        for descriptor in &self.referenced_persists {
            connector.persist_referenced_list(descriptor)?;
        }
        for descriptor in &self.referenced_updates {
            connector.update_referenced_list(descriptor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxaxiom::{AxiomDescriptor, MemoryStore};

    #[test]
    fn flush_writes_values_and_lists_together() -> Result<(), ConnectorError> {
        let store = MemoryStore::new();
        let mut connection = store.connection();
        let subject = NamedResource::new_unchecked("http://example.com/a");
        let name = Assertion::data_property(
            NamedResource::new_unchecked("http://example.com/name"),
            false,
        );

        let mut gatherer = AxiomValueGatherer::new(subject.clone(), None);
        gatherer.add_value(&name, "building".into(), None);

        connection.begin()?;
        gatherer.flush(&mut connection)?;
        connection.commit()?;

        let mut load = AxiomDescriptor::new(subject);
        load.add_assertion(name);
        assert_eq!(connection.load_axioms(&load)?.len(), 1);
        Ok(())
    }
}

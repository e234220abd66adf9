//! Translation between entities and axioms.
//!
//! [`ObjectOntologyMapper`] is the stateful heart of a persistence context: it turns loaded
//! axioms into entity instances and entity state into connector writes, tracking references
//! to instances that have not been persisted yet.

mod gatherer;
mod pending;
mod strategy;

use crate::config::OomConfig;
use crate::descriptor::EntityDescriptor;
use crate::entity::{InstanceKey, OntologyEntity};
use crate::errors::OomError;
use crate::metamodel::{Attribute, AttributeKind, EntityType, FetchKind, Metamodel};
use crate::oom::gatherer::AxiomValueGatherer;
use crate::oom::pending::{PendingAssertion, PendingAssertionRegistry, PendingTarget};
use crate::oom::strategy::{AttributeStrategy, ReferenceResolver, SaveMode};
use oxaxiom::{
    Assertion, Axiom, AxiomDescriptor, AxiomValueDescriptor, Connector, NamedResource,
    ReferencedListDescriptor, ReferencedListValueDescriptor, SimpleListDescriptor,
    SimpleListValueDescriptor, Value,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

pub(crate) use crate::oom::strategy::validate_shape;

/// A sequence attribute whose write was deferred and must be replayed now that a referenced
/// instance has an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRebuild {
    pub owner_key: InstanceKey,
    pub attribute: String,
}

struct PendingContext<'a> {
    owner_key: Option<InstanceKey>,
    identifiers: &'a FxHashMap<InstanceKey, NamedResource>,
    registry: &'a mut PendingAssertionRegistry,
    references: &'a mut FxHashSet<NamedResource>,
}

impl ReferenceResolver for PendingContext<'_> {
    fn owner_key(&self) -> Option<InstanceKey> {
        self.owner_key
    }

    fn identifier_of(&self, key: InstanceKey) -> Option<NamedResource> {
        self.identifiers.get(&key).cloned()
    }

    fn record_pending(&mut self, key: InstanceKey, pending: PendingAssertion) {
        self.registry.add_pending(key, pending);
    }

    fn record_reference(&mut self, identifier: &NamedResource) {
        self.references.insert(identifier.clone());
    }
}

/// Translates between entity instances and their axiom representation.
///
/// One mapper serves one persistence context. It remembers which working instances were
/// persisted under which identifier and keeps the registry of references still waiting for
/// one.
#[derive(Debug)]
pub struct ObjectOntologyMapper {
    metamodel: Arc<Metamodel>,
    config: OomConfig,
    pending: PendingAssertionRegistry,
    identifiers: FxHashMap<InstanceKey, NamedResource>,
    referenced_individuals: FxHashSet<NamedResource>,
}

impl ObjectOntologyMapper {
    pub fn new(metamodel: Arc<Metamodel>, config: OomConfig) -> Self {
        Self {
            metamodel,
            config,
            pending: PendingAssertionRegistry::default(),
            identifiers: FxHashMap::default(),
            referenced_individuals: FxHashSet::default(),
        }
    }

    #[inline]
    pub fn metamodel(&self) -> &Arc<Metamodel> {
        &self.metamodel
    }

    /// Whether references to unpersisted instances are still outstanding.
    pub fn has_pending(&self) -> bool {
        self.pending.has_pending()
    }

    /// The keys of all instances something still references without an identifier.
    pub fn pending_keys(&self) -> Vec<InstanceKey> {
        self.pending.pending_keys()
    }

    /// The identifier the given working instance was persisted under, if any.
    pub fn identifier_of(&self, key: InstanceKey) -> Option<&NamedResource> {
        self.identifiers.get(&key)
    }

    /// Makes references to the given working instance resolvable through its identifier.
    pub fn register_identifier(&mut self, key: InstanceKey, identifier: NamedResource) {
        self.identifiers.insert(key, identifier);
    }

    /// Whether this transaction already wrote the individual as a reference value of another
    /// instance. Such individuals may still be persisted in the same transaction.
    pub fn is_referenced_individual(&self, identifier: &NamedResource) -> bool {
        self.referenced_individuals.contains(identifier)
    }

    /// Loads the entity identified by `identifier`, or `None` when the store holds no
    /// individual of the requested type under that identifier.
    pub fn load_entity(
        &self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        descriptor: &EntityDescriptor,
        connector: &dyn Connector,
    ) -> Result<Option<Box<dyn OntologyEntity>>, OomError> {
        let entity_type = Arc::clone(self.metamodel.entity_type(type_iri)?);
        let axioms = self.load_declared_axioms(&entity_type, identifier, descriptor, connector)?;

        let mut found_type = false;
        let mut types_strategy = entity_type.types_attribute().map(|attribute| {
            AttributeStrategy::new(
                attribute,
                descriptor.attribute_context(attribute.name()).cloned(),
            )
        });
        let mut strategies: Vec<_> = entity_type
            .attributes()
            .iter()
            .filter(|a| is_eagerly_routed(a))
            .map(|attribute| {
                AttributeStrategy::new(
                    attribute,
                    descriptor.attribute_context(attribute.name()).cloned(),
                )
            })
            .collect();

        for axiom in axioms {
            if axiom.assertion().is_class_assertion() {
                if axiom.value().as_resource() == Some(entity_type.type_iri()) {
                    found_type = true;
                } else if let Some(strategy) = &mut types_strategy {
                    strategy.add_axiom_value(axiom);
                }
                continue;
            }
            if let Some(strategy) = strategies
                .iter_mut()
                .find(|s| s.attribute().assertion().identifier() == axiom.assertion().identifier())
            {
                strategy.add_axiom_value(axiom);
            }
        }
        if !found_type {
            return Ok(None);
        }

        let mut entity = entity_type.new_instance();
        entity.set_identifier(identifier.clone());
        for strategy in strategies {
            strategy.build_instance_value(&mut *entity);
        }
        if let Some(strategy) = types_strategy {
            strategy.build_instance_value(&mut *entity);
        }
        self.load_properties(&entity_type, identifier, descriptor, connector, &mut *entity)?;
        for attribute in entity_type.attributes() {
            if attribute.kind().is_sequence() && attribute.fetch() == FetchKind::Eager {
                self.load_sequence_into(attribute, identifier, descriptor, connector, &mut *entity)?;
            }
        }
        Ok(Some(entity))
    }

    /// Loads the value of a single attribute into the entity, used for lazy fetching.
    pub fn load_field(
        &self,
        entity: &mut dyn OntologyEntity,
        attribute_name: &str,
        descriptor: &EntityDescriptor,
        connector: &dyn Connector,
    ) -> Result<(), OomError> {
        let type_iri = entity.type_iri();
        let entity_type = Arc::clone(self.metamodel.entity_type(&type_iri)?);
        let attribute = named_attribute(&entity_type, attribute_name)?;
        let identifier = required_identifier(entity)?;

        match attribute.kind() {
            AttributeKind::Properties => {
                self.load_properties(&entity_type, &identifier, descriptor, connector, entity)
            }
            kind if kind.is_sequence() => {
                self.load_sequence_into(attribute, &identifier, descriptor, connector, entity)
            }
            kind => {
                let mut load = AxiomDescriptor::new(identifier.clone());
                if let Some(context) = descriptor.attribute_context(attribute_name) {
                    load.add_subject_context(context.clone());
                }
                load.add_assertion(attribute.assertion().clone());
                load.set_include_inferred(attribute.is_inferred());
                let mut strategy = AttributeStrategy::new(
                    attribute,
                    descriptor.attribute_context(attribute_name).cloned(),
                );
                for axiom in connector.load_axioms(&load)? {
                    if *kind == AttributeKind::Types
                        && axiom.value().as_resource() == Some(entity_type.type_iri())
                    {
                        continue;
                    }
                    strategy.add_axiom_value(axiom);
                }
                strategy.build_instance_value(entity);
                Ok(())
            }
        }
    }

    /// Writes a fresh entity into the connector's transaction.
    ///
    /// References to already persisted working instances are resolved through their recorded
    /// identifiers; references to unpersisted ones are registered as pending. The returned
    /// rebuilds name sequence attributes of other instances that were waiting for this one
    /// and must now be replayed by the caller.
    pub fn persist_entity(
        &mut self,
        key: InstanceKey,
        entity: &dyn OntologyEntity,
        descriptor: &EntityDescriptor,
        connector: &mut dyn Connector,
    ) -> Result<Vec<ListRebuild>, OomError> {
        let type_iri = entity.type_iri();
        let entity_type = Arc::clone(self.metamodel.entity_type(&type_iri)?);
        let identifier = required_identifier(entity)?;
        let context = descriptor.context().cloned();

        let mut gatherer = AxiomValueGatherer::new(identifier.clone(), context.clone());
        gatherer.add_value(
            &Assertion::class_assertion(false),
            Value::Resource(entity_type.type_iri().clone()),
            context.as_ref(),
        );
        let mut resolver = PendingContext {
            owner_key: Some(key),
            identifiers: &self.identifiers,
            registry: &mut self.pending,
            references: &mut self.referenced_individuals,
        };
        for attribute in entity_type.attributes() {
            let value = entity.value_of(attribute.name());
            if attribute.is_inferred() {
                if value.is_empty() {
                    continue;
                }
                return Err(OomError::InferredAttributeModified {
                    type_iri: type_iri.clone(),
                    attribute: attribute.name().to_owned(),
                });
            }
            let strategy = AttributeStrategy::new(
                attribute,
                descriptor.attribute_context(attribute.name()).cloned(),
            )
            .with_default_language(self.config.default_language());
            strategy.build_axiom_values(
                &identifier,
                value,
                &mut gatherer,
                &mut resolver,
                SaveMode::Persist,
            )?;
        }
        gatherer.flush(connector)?;
        self.identifiers.insert(key, identifier.clone());
        self.resolve_pending(key, &identifier, connector)
    }

    /// Replaces the stored value of one attribute with the entity's current one.
    pub fn merge_field(
        &mut self,
        key: Option<InstanceKey>,
        entity: &dyn OntologyEntity,
        attribute_name: &str,
        descriptor: &EntityDescriptor,
        connector: &mut dyn Connector,
    ) -> Result<(), OomError> {
        let type_iri = entity.type_iri();
        let entity_type = Arc::clone(self.metamodel.entity_type(&type_iri)?);
        let attribute = named_attribute(&entity_type, attribute_name)?;
        let identifier = required_identifier(entity)?;
        if attribute.is_inferred() {
            if self.config.ignore_inferred_value_removal() {
                return Ok(());
            }
            return Err(OomError::InferredAttributeModified {
                type_iri: type_iri.clone(),
                attribute: attribute_name.to_owned(),
            });
        }
        let value = entity.value_of(attribute_name);
        let context = descriptor.attribute_context(attribute_name).cloned();

        // sequences merge through the connector's list update, everything else is
        // remove-then-save
        if !attribute.kind().is_sequence() {
            let mut remove = AxiomDescriptor::new(identifier.clone());
            if let Some(context) = &context {
                remove.add_subject_context(context.clone());
            }
            match attribute.kind() {
                AttributeKind::Properties => {
                    for assertion in self.stored_unmapped_assertions(
                        &entity_type,
                        &identifier,
                        context.as_ref(),
                        connector,
                    )? {
                        remove.add_assertion(assertion);
                    }
                }
                _ => remove.add_assertion(attribute.assertion().clone()),
            }
            if !remove.assertions().is_empty() {
                connector.remove_axioms(&remove)?;
            }
        }

        let mut gatherer = AxiomValueGatherer::new(identifier.clone(), context.clone());
        if *attribute.kind() == AttributeKind::Types {
            // the removal above dropped the declared type as well, reassert it
            gatherer.add_value(
                &Assertion::class_assertion(false),
                Value::Resource(entity_type.type_iri().clone()),
                context.as_ref(),
            );
        }
        let mut resolver = PendingContext {
            owner_key: key,
            identifiers: &self.identifiers,
            registry: &mut self.pending,
            references: &mut self.referenced_individuals,
        };
        let strategy = AttributeStrategy::new(attribute, context)
            .with_default_language(self.config.default_language());
        strategy.build_axiom_values(
            &identifier,
            value,
            &mut gatherer,
            &mut resolver,
            SaveMode::Update,
        )?;
        gatherer.flush(connector)?;
        Ok(())
    }

    /// Removes the entity and the auxiliary structure of its sequences from the store.
    pub fn remove_entity(
        &mut self,
        entity: &dyn OntologyEntity,
        descriptor: &EntityDescriptor,
        connector: &mut dyn Connector,
    ) -> Result<(), OomError> {
        let type_iri = entity.type_iri();
        let entity_type = Arc::clone(self.metamodel.entity_type(&type_iri)?);
        let identifier = required_identifier(entity)?;

        // empty list updates drop sequence links and nodes that removing the subject's own
        // statements would leave behind
        for attribute in entity_type.attributes() {
            let context = descriptor.attribute_context(attribute.name()).cloned();
            match attribute.kind() {
                AttributeKind::SimpleList { has_next } => {
                    let mut list = SimpleListDescriptor::new(
                        identifier.clone(),
                        attribute.assertion().clone(),
                        has_next.clone(),
                    );
                    list.set_context(context);
                    connector.update_simple_list(&SimpleListValueDescriptor::new(list))?;
                }
                AttributeKind::ReferencedList {
                    has_next,
                    has_content,
                } => {
                    let mut list = ReferencedListDescriptor::new(
                        identifier.clone(),
                        attribute.assertion().clone(),
                        has_next.clone(),
                        has_content.clone(),
                    );
                    list.set_context(context);
                    connector.update_referenced_list(&ReferencedListValueDescriptor::new(list))?;
                }
                _ => {}
            }
        }

        let mut remove = AxiomDescriptor::new(identifier.clone());
        if let Some(context) = descriptor.context() {
            remove.add_subject_context(context.clone());
        }
        connector.remove_axioms(&remove)?;
        self.pending.remove_pending_of_owner(&identifier);
        Ok(())
    }

    fn resolve_pending(
        &mut self,
        key: InstanceKey,
        identifier: &NamedResource,
        connector: &mut dyn Connector,
    ) -> Result<Vec<ListRebuild>, OomError> {
        let mut rebuilds = Vec::new();
        for entry in self.pending.remove_pending_with(key) {
            match entry.target {
                PendingTarget::Direct => {
                    let mut save = AxiomValueDescriptor::new(entry.owner);
                    save.set_subject_context(entry.context);
                    save.add_value(&entry.assertion, Value::Resource(identifier.clone()));
                    connector.save_axioms(&save)?;
                }
                PendingTarget::Sequence {
                    owner_key,
                    attribute,
                } => rebuilds.push(ListRebuild {
                    owner_key,
                    attribute,
                }),
            }
        }
        Ok(rebuilds)
    }

    fn load_declared_axioms(
        &self,
        entity_type: &EntityType,
        identifier: &NamedResource,
        descriptor: &EntityDescriptor,
        connector: &dyn Connector,
    ) -> Result<Vec<Axiom>, OomError> {
        let mut load = AxiomDescriptor::new(identifier.clone());
        if let Some(context) = descriptor.context() {
            load.add_subject_context(context.clone());
        }
        load.add_assertion(Assertion::class_assertion(false));
        let mut include_inferred = entity_type
            .types_attribute()
            .is_some_and(Attribute::is_inferred);
        for attribute in entity_type.attributes() {
            if !is_eagerly_routed(attribute) {
                continue;
            }
            let assertion = attribute.assertion().clone();
            load.add_assertion(assertion.clone());
            if let Some(context) = descriptor.attribute_context(attribute.name()) {
                load.add_assertion_context(&assertion, context.clone());
            }
            include_inferred |= attribute.is_inferred();
        }
        load.set_include_inferred(include_inferred);
        Ok(connector.load_axioms(&load)?)
    }

    fn load_properties(
        &self,
        entity_type: &EntityType,
        identifier: &NamedResource,
        descriptor: &EntityDescriptor,
        connector: &dyn Connector,
        entity: &mut dyn OntologyEntity,
    ) -> Result<(), OomError> {
        let Some(attribute) = entity_type.properties_attribute() else {
            return Ok(());
        };
        let context = descriptor.attribute_context(attribute.name()).cloned();
        let contexts: Vec<_> = context.clone().into_iter().collect();
        let mut strategy = AttributeStrategy::new(attribute, context);
        for axiom in connector.find(Some(identifier), None, None, &contexts)? {
            if axiom.assertion().is_class_assertion()
                || entity_type
                    .attribute_by_predicate(axiom.assertion().identifier())
                    .is_some()
            {
                continue;
            }
            strategy.add_axiom_value(axiom);
        }
        strategy.build_instance_value(entity);
        Ok(())
    }

    fn load_sequence_into(
        &self,
        attribute: &Attribute,
        identifier: &NamedResource,
        descriptor: &EntityDescriptor,
        connector: &dyn Connector,
        entity: &mut dyn OntologyEntity,
    ) -> Result<(), OomError> {
        let context = descriptor.attribute_context(attribute.name()).cloned();
        let axioms = match attribute.kind() {
            AttributeKind::SimpleList { has_next } => {
                let mut list = SimpleListDescriptor::new(
                    identifier.clone(),
                    attribute.assertion().clone(),
                    has_next.clone(),
                );
                list.set_context(context.clone());
                connector.load_simple_list(&list)?
            }
            AttributeKind::ReferencedList {
                has_next,
                has_content,
            } => {
                let mut list = ReferencedListDescriptor::new(
                    identifier.clone(),
                    attribute.assertion().clone(),
                    has_next.clone(),
                    has_content.clone(),
                );
                list.set_context(context.clone());
                connector.load_referenced_list(&list)?
            }
            _ => Vec::new(),
        };
        let mut strategy = AttributeStrategy::new(attribute, context);
        for axiom in axioms {
            strategy.add_axiom_value(axiom);
        }
        strategy.build_instance_value(entity);
        Ok(())
    }

    /// The distinct unmapped assertions currently stored about the subject.
    fn stored_unmapped_assertions(
        &self,
        entity_type: &EntityType,
        identifier: &NamedResource,
        context: Option<&NamedResource>,
        connector: &dyn Connector,
    ) -> Result<Vec<Assertion>, OomError> {
        let contexts: Vec<_> = context.cloned().into_iter().collect();
        let mut assertions: Vec<Assertion> = Vec::new();
        for axiom in connector.find(Some(identifier), None, None, &contexts)? {
            if axiom.assertion().is_class_assertion()
                || entity_type
                    .attribute_by_predicate(axiom.assertion().identifier())
                    .is_some()
                || assertions.contains(axiom.assertion())
            {
                continue;
            }
            assertions.push(axiom.assertion().clone());
        }
        Ok(assertions)
    }
}

/// Whether the attribute's axioms are loaded with the entity and routed by predicate.
fn is_eagerly_routed(attribute: &Attribute) -> bool {
    attribute.fetch() == FetchKind::Eager
        && !attribute.kind().is_sequence()
        && !matches!(
            attribute.kind(),
            AttributeKind::Types | AttributeKind::Properties
        )
}

fn named_attribute<'a>(
    entity_type: &'a EntityType,
    attribute_name: &str,
) -> Result<&'a Attribute, OomError> {
    entity_type
        .attribute(attribute_name)
        .ok_or_else(|| OomError::UnknownAttribute {
            type_iri: entity_type.type_iri().clone(),
            attribute: attribute_name.to_owned(),
        })
}

fn required_identifier(entity: &dyn OntologyEntity) -> Result<NamedResource, OomError> {
    entity
        .identifier()
        .cloned()
        .ok_or(OomError::MissingIdentifier)
}

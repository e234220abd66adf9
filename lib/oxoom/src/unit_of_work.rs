//! The transactional persistence context.
//!
//! A [`UnitOfWork`] manages working copies of entities for the duration of one transaction.
//! Loaded entities are cloned; the caller mutates the clone and the commit diffs it against
//! the retained original, writing only the attributes that changed. New entities are written
//! into the connector's transaction immediately on persist, so reads within the transaction
//! observe them.

use crate::descriptor::EntityDescriptor;
use crate::entity::{InstanceKey, OntologyEntity};
use crate::errors::OomError;
use crate::oom::{ListRebuild, ObjectOntologyMapper, validate_shape};
use crate::session::ServerSession;
use oxaxiom::{Connector, NamedResource};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

/// One persistence context bound to one transaction on one connection.
///
/// Entities are addressed through the [`InstanceKey`]s this context hands out; the typed
/// instances behind them are reachable via [`typed`](Self::typed) and
/// [`typed_mut`](Self::typed_mut).
pub struct UnitOfWork<'a> {
    session: &'a ServerSession,
    mapper: ObjectOntologyMapper,
    connector: Box<dyn Connector>,
    state: TransactionState,
    next_key: u64,
    clones: FxHashMap<InstanceKey, Box<dyn OntologyEntity>>,
    originals: FxHashMap<InstanceKey, Box<dyn OntologyEntity>>,
    descriptors: FxHashMap<InstanceKey, EntityDescriptor>,
    by_identifier: FxHashMap<(NamedResource, NamedResource), InstanceKey>,
    staged: FxHashSet<InstanceKey>,
    persisted_new: FxHashSet<InstanceKey>,
    removed: FxHashSet<InstanceKey>,
    wrote: bool,
}

impl<'a> UnitOfWork<'a> {
    pub(crate) fn new(session: &'a ServerSession, connector: Box<dyn Connector>) -> Self {
        Self {
            session,
            mapper: ObjectOntologyMapper::new(
                Arc::clone(session.metamodel()),
                session.config().clone(),
            ),
            connector,
            state: TransactionState::Active,
            next_key: 0,
            clones: FxHashMap::default(),
            originals: FxHashMap::default(),
            descriptors: FxHashMap::default(),
            by_identifier: FxHashMap::default(),
            staged: FxHashSet::default(),
            persisted_new: FxHashSet::default(),
            removed: FxHashSet::default(),
            wrote: false,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Whether this context has written anything into its transaction yet.
    #[inline]
    pub fn has_changes(&self) -> bool {
        self.wrote
    }

    #[inline]
    pub fn contains(&self, key: InstanceKey) -> bool {
        self.clones.contains_key(&key)
    }

    /// Reserves a key for an instance that will be registered later. References built with a
    /// reserved key stay pending until the instance is persisted.
    pub fn reserve_key(&mut self) -> InstanceKey {
        self.next_key += 1;
        InstanceKey::new(self.next_key)
    }

    /// The managed instance behind the key.
    pub fn entity(&self, key: InstanceKey) -> Option<&dyn OntologyEntity> {
        self.clones.get(&key).map(|e| &**e)
    }

    /// Mutable access to the managed instance. Changes are picked up by the commit diff.
    pub fn entity_mut(&mut self, key: InstanceKey) -> Option<&mut (dyn OntologyEntity + '_)> {
        match self.clones.get_mut(&key) {
            Some(entity) => Some(&mut **entity),
            None => None,
        }
    }

    /// The managed instance downcast to its concrete type.
    pub fn typed<T: 'static>(&self, key: InstanceKey) -> Option<&T> {
        self.entity(key)?.as_any().downcast_ref()
    }

    pub fn typed_mut<T: 'static>(&mut self, key: InstanceKey) -> Option<&mut T> {
        self.entity_mut(key)?.as_any_mut().downcast_mut()
    }

    /// The identifier the instance is (or was) persisted under.
    pub fn identifier_of(&self, key: InstanceKey) -> Option<&NamedResource> {
        self.clones.get(&key).and_then(|e| e.identifier())
    }

    /// Looks the entity up in this context, the shared cache and finally the store.
    pub fn find(
        &mut self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
    ) -> Result<Option<InstanceKey>, OomError> {
        self.find_with_descriptor(type_iri, identifier, EntityDescriptor::new())
    }

    pub fn find_with_descriptor(
        &mut self,
        type_iri: &NamedResource,
        identifier: &NamedResource,
        descriptor: EntityDescriptor,
    ) -> Result<Option<InstanceKey>, OomError> {
        self.ensure_active()?;
        if let Some(&key) = self
            .by_identifier
            .get(&(type_iri.clone(), identifier.clone()))
        {
            return Ok(if self.removed.contains(&key) {
                None
            } else {
                Some(key)
            });
        }

        let cache = self.session.cache();
        let mut original = None;
        if cache.acquire_read_lock() {
            original = cache.get(type_iri, identifier, descriptor.context());
            cache.release_read_lock();
        }
        if original.is_none() {
            original =
                self.mapper
                    .load_entity(type_iri, identifier, &descriptor, &*self.connector)?;
            if let Some(entity) = &original {
                if cache.acquire_write_lock() {
                    cache.add(
                        type_iri,
                        identifier,
                        entity.clone_entity(),
                        descriptor.context(),
                    );
                    cache.release_write_lock();
                }
            }
        }
        let Some(original) = original else {
            return Ok(None);
        };

        let key = self.reserve_key();
        self.clones.insert(key, original.clone_entity());
        self.originals.insert(key, original);
        self.descriptors.insert(key, descriptor);
        self.by_identifier
            .insert((type_iri.clone(), identifier.clone()), key);
        self.mapper.register_identifier(key, identifier.clone());
        Ok(Some(key))
    }

    /// Registers a new instance with this context without writing it yet. Unpersisted
    /// registered instances are written automatically at commit.
    pub fn register_new(
        &mut self,
        entity: Box<dyn OntologyEntity>,
        descriptor: EntityDescriptor,
    ) -> Result<InstanceKey, OomError> {
        self.ensure_active()?;
        let key = self.reserve_key();
        self.clones.insert(key, entity);
        self.descriptors.insert(key, descriptor);
        self.staged.insert(key);
        Ok(key)
    }

    /// Registers the instance under a previously reserved key.
    pub fn register_new_with_key(
        &mut self,
        key: InstanceKey,
        entity: Box<dyn OntologyEntity>,
        descriptor: EntityDescriptor,
    ) -> Result<(), OomError> {
        self.ensure_active()?;
        if self.clones.contains_key(&key) {
            return Err(OomError::KeyInUse { key });
        }
        self.clones.insert(key, entity);
        self.descriptors.insert(key, descriptor);
        self.staged.insert(key);
        Ok(())
    }

    /// Registers and immediately persists a new instance.
    pub fn persist_new(
        &mut self,
        entity: Box<dyn OntologyEntity>,
        descriptor: EntityDescriptor,
    ) -> Result<InstanceKey, OomError> {
        let key = self.register_new(entity, descriptor)?;
        self.persist(key)?;
        Ok(key)
    }

    /// Writes a registered instance into the transaction, generating an identifier when the
    /// instance has none. References to other registered instances cascade when their
    /// attribute allows it; the rest become pending until their target is persisted.
    pub fn persist(&mut self, key: InstanceKey) -> Result<(), OomError> {
        self.ensure_active()?;
        if self.persisted_new.contains(&key) {
            return Ok(());
        }
        if !self.staged.contains(&key) {
            return Err(OomError::EntityNotManaged);
        }
        let descriptor = self.descriptors.get(&key).cloned().unwrap_or_default();
        let Some(entity) = self.clones.get_mut(&key) else {
            return Err(OomError::EntityNotManaged);
        };
        let type_iri = entity.type_iri();
        let identifier = match entity.identifier() {
            Some(identifier) => identifier.clone(),
            None => {
                let identifier = self.connector.generate_identifier(&type_iri)?;
                entity.set_identifier(identifier.clone());
                identifier
            }
        };

        // individuals this transaction wrote as reference values of other instances are not
        // duplicates, they are just being persisted after their referrer
        let contexts: Vec<_> = descriptor.context().cloned().into_iter().collect();
        if self
            .by_identifier
            .contains_key(&(type_iri.clone(), identifier.clone()))
            || (!self.mapper.is_referenced_individual(&identifier)
                && self.connector.contains_subject(&identifier, &contexts)?)
        {
            return Err(OomError::EntityAlreadyExists { identifier });
        }

        // mark first and register the identifier so reference cycles terminate and back
        // references resolve directly
        self.persisted_new.insert(key);
        self.by_identifier
            .insert((type_iri.clone(), identifier), key);
        let entity_type = Arc::clone(self.mapper.metamodel().entity_type(&type_iri)?);
        if let Some(identifier) = self.clones.get(&key).and_then(|e| e.identifier()) {
            self.mapper.register_identifier(key, identifier.clone());
        }

        let mut cascade_keys = Vec::new();
        if let Some(entity) = self.clones.get(&key) {
            for attribute in entity_type.attributes() {
                if attribute.cascade().persist {
                    cascade_keys.extend(entity.value_of(attribute.name()).pending_keys());
                }
            }
        }
        for cascade_key in cascade_keys {
            if self.staged.contains(&cascade_key) && !self.persisted_new.contains(&cascade_key) {
                self.persist(cascade_key)?;
            }
        }

        let Some(entity) = self.clones.get(&key) else {
            return Err(OomError::EntityNotManaged);
        };
        let rebuilds =
            self.mapper
                .persist_entity(key, &**entity, &descriptor, &mut *self.connector)?;
        self.wrote = true;
        self.replay_rebuilds(rebuilds)
    }

    /// Writes the current value of one attribute, replacing the stored one.
    pub fn merge_field(&mut self, key: InstanceKey, attribute_name: &str) -> Result<(), OomError> {
        self.ensure_active()?;
        let descriptor = self.descriptors.get(&key).cloned().unwrap_or_default();
        let Some(entity) = self.clones.get(&key) else {
            return Err(OomError::EntityNotManaged);
        };
        self.mapper.merge_field(
            Some(key),
            &**entity,
            attribute_name,
            &descriptor,
            &mut *self.connector,
        )?;
        self.wrote = true;
        let value = entity.value_of(attribute_name);
        if let Some(original) = self.originals.get_mut(&key) {
            original.set_value(attribute_name, value);
        }
        Ok(())
    }

    /// Loads a lazily fetched attribute into the managed instance.
    pub fn load_field(&mut self, key: InstanceKey, attribute_name: &str) -> Result<(), OomError> {
        self.ensure_active()?;
        let descriptor = self.descriptors.get(&key).cloned().unwrap_or_default();
        let Some(entity) = self.clones.get_mut(&key) else {
            return Err(OomError::EntityNotManaged);
        };
        self.mapper
            .load_field(&mut **entity, attribute_name, &descriptor, &*self.connector)?;
        let value = entity.value_of(attribute_name);
        // mirror the loaded value into the original so the commit diff stays clean
        if let Some(original) = self.originals.get_mut(&key) {
            original.set_value(attribute_name, value);
        }
        Ok(())
    }

    /// Marks the instance for removal at commit. Removal cascades through references whose
    /// attribute allows it, to targets managed by this context.
    pub fn remove(&mut self, key: InstanceKey) -> Result<(), OomError> {
        self.ensure_active()?;
        if !self.clones.contains_key(&key) {
            return Err(OomError::EntityNotManaged);
        }
        if !self.removed.insert(key) {
            return Ok(());
        }
        let mut cascade_keys = Vec::new();
        if let Some(entity) = self.clones.get(&key) {
            let entity_type = Arc::clone(self.mapper.metamodel().entity_type(&entity.type_iri())?);
            for attribute in entity_type.attributes() {
                if !attribute.cascade().remove {
                    continue;
                }
                let value = entity.value_of(attribute.name());
                cascade_keys.extend(value.pending_keys());
                if let Some(target_type) = attribute.target_type() {
                    for reference in referenced_identifiers(&value) {
                        if let Some(&target) = self
                            .by_identifier
                            .get(&(target_type.clone(), reference.clone()))
                        {
                            cascade_keys.push(target);
                        }
                    }
                }
            }
        }
        for cascade_key in cascade_keys {
            if self.clones.contains_key(&cascade_key) && !self.removed.contains(&cascade_key) {
                self.remove(cascade_key)?;
            }
        }
        Ok(())
    }

    /// Commits the context: writes remaining registered instances, verifies that no pending
    /// references are left, applies removals and the change diff, commits the connector
    /// transaction and finally refreshes the shared cache.
    ///
    /// On any failure the connector transaction is rolled back and the store is left
    /// untouched.
    pub fn commit(&mut self) -> Result<(), OomError> {
        self.ensure_active()?;
        match self.try_commit() {
            Ok(()) => {
                self.state = TransactionState::Committed;
                Ok(())
            }
            Err(error) => {
                let _ = self.connector.rollback();
                self.state = TransactionState::RolledBack;
                Err(error)
            }
        }
    }

    /// Discards everything this context wrote.
    pub fn rollback(&mut self) -> Result<(), OomError> {
        self.ensure_active()?;
        self.connector.rollback()?;
        self.state = TransactionState::RolledBack;
        Ok(())
    }

    fn try_commit(&mut self) -> Result<(), OomError> {
        let mut unpersisted: Vec<_> = self
            .staged
            .iter()
            .copied()
            .filter(|key| !self.persisted_new.contains(key) && !self.removed.contains(key))
            .collect();
        unpersisted.sort_unstable();
        for key in unpersisted {
            self.persist(key)?;
        }

        if self.mapper.has_pending() {
            return Err(OomError::PendingReferences {
                keys: self.mapper.pending_keys(),
            });
        }

        let mut removed: Vec<_> = self.removed.iter().copied().collect();
        removed.sort_unstable();
        for key in &removed {
            // instances never written need no removal
            if self.staged.contains(key) && !self.persisted_new.contains(key) {
                continue;
            }
            let descriptor = self.descriptors.get(key).cloned().unwrap_or_default();
            let Some(entity) = self.clones.get(key) else {
                continue;
            };
            self.mapper
                .remove_entity(&**entity, &descriptor, &mut *self.connector)?;
            self.wrote = true;
        }

        let mut managed: Vec<_> = self
            .originals
            .keys()
            .copied()
            .filter(|key| !self.removed.contains(key))
            .collect();
        managed.sort_unstable();
        for key in managed {
            for attribute_name in self.changed_attributes(key)? {
                self.merge_field(key, &attribute_name)?;
            }
        }

        self.connector.commit()?;
        self.refresh_cache(&removed);
        Ok(())
    }

    /// The attributes whose working value differs from the loaded original, in declaration
    /// order.
    fn changed_attributes(&self, key: InstanceKey) -> Result<Vec<String>, OomError> {
        let (Some(clone), Some(original)) = (self.clones.get(&key), self.originals.get(&key))
        else {
            return Ok(Vec::new());
        };
        let type_iri = clone.type_iri();
        let entity_type = Arc::clone(self.mapper.metamodel().entity_type(&type_iri)?);
        let mut changed = Vec::new();
        for attribute in entity_type.attributes() {
            let current = clone.value_of(attribute.name());
            if current == original.value_of(attribute.name()) {
                continue;
            }
            if attribute.is_inferred() {
                if self.session.config().ignore_inferred_value_removal() {
                    continue;
                }
                return Err(OomError::InferredAttributeModified {
                    type_iri: type_iri.clone(),
                    attribute: attribute.name().to_owned(),
                });
            }
            validate_shape(attribute, &current)?;
            changed.push(attribute.name().to_owned());
        }
        Ok(changed)
    }

    /// Cache maintenance after a successful base commit: removed entities are evicted, new
    /// and changed ones stored, and inferred-type entries dropped when anything changed.
    fn refresh_cache(&self, removed: &[InstanceKey]) {
        if !self.wrote {
            return;
        }
        let cache = self.session.cache();
        if !cache.acquire_write_lock() {
            return;
        }
        for key in removed {
            if let Some(entity) = self.clones.get(key) {
                if let Some(identifier) = entity.identifier() {
                    let context = self
                        .descriptors
                        .get(key)
                        .and_then(EntityDescriptor::context);
                    cache.evict(&entity.type_iri(), identifier, context);
                }
            }
        }
        for (key, entity) in &self.clones {
            if self.removed.contains(key) {
                continue;
            }
            if let Some(identifier) = entity.identifier() {
                let context = self
                    .descriptors
                    .get(key)
                    .and_then(EntityDescriptor::context);
                cache.add(
                    &entity.type_iri(),
                    identifier,
                    entity.clone_entity(),
                    context,
                );
            }
        }
        cache.clear_inferred_objects();
        cache.release_write_lock();
    }

    fn replay_rebuilds(&mut self, rebuilds: Vec<ListRebuild>) -> Result<(), OomError> {
        for rebuild in rebuilds {
            if self.clones.contains_key(&rebuild.owner_key) {
                self.merge_field(rebuild.owner_key, &rebuild.attribute)?;
            }
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), OomError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(OomError::TransactionNotActive)
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.connector.rollback();
        }
    }
}

fn referenced_identifiers(value: &crate::entity::AttributeValue) -> Vec<&NamedResource> {
    use crate::entity::{AttributeValue, EntityRef};
    match value {
        AttributeValue::Reference(reference) => reference.identifier().into_iter().collect(),
        AttributeValue::References(references) | AttributeValue::Sequence(references) => {
            references.iter().filter_map(EntityRef::identifier).collect()
        }
        _ => Vec::new(),
    }
}

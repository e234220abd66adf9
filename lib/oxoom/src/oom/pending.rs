use crate::entity::InstanceKey;
use oxaxiom::{Assertion, NamedResource};
use rustc_hash::FxHashMap;

/// What to do with a pending reference once the referenced instance gets an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingTarget {
    /// Write the single axiom `owner assertion <identifier>`.
    Direct,
    /// Rebuild the whole sequence attribute of the owning instance.
    Sequence {
        owner_key: InstanceKey,
        attribute: String,
    },
}

/// A reference that could not be written because its target has no identifier yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingAssertion {
    pub owner: NamedResource,
    pub assertion: Assertion,
    pub context: Option<NamedResource>,
    pub target: PendingTarget,
}

/// Tracks references to instances that have not been persisted yet, keyed by the referenced
/// instance.
///
/// Every pending entry must be resolved before a transaction may commit; a non-empty registry
/// at commit time means the object graph still points at instances the store knows nothing
/// about.
#[derive(Debug, Default)]
pub(crate) struct PendingAssertionRegistry {
    pending: FxHashMap<InstanceKey, Vec<PendingAssertion>>,
}

impl PendingAssertionRegistry {
    /// Registers a pending reference to the given instance. Duplicates are ignored.
    pub fn add_pending(&mut self, key: InstanceKey, assertion: PendingAssertion) {
        let entries = self.pending.entry(key).or_default();
        if !entries.contains(&assertion) {
            entries.push(assertion);
        }
    }

    /// Removes and returns everything waiting for the given instance.
    pub fn remove_pending_with(&mut self, key: InstanceKey) -> Vec<PendingAssertion> {
        self.pending.remove(&key).unwrap_or_default()
    }

    /// Drops all entries owned by the given subject, used when the owner itself is removed.
    pub fn remove_pending_of_owner(&mut self, owner: &NamedResource) {
        self.pending.retain(|_, entries| {
            entries.retain(|entry| entry.owner != *owner);
            !entries.is_empty()
        });
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The keys of all instances something is still waiting for.
    pub fn pending_keys(&self) -> Vec<InstanceKey> {
        let mut keys: Vec<_> = self.pending.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(owner: &str) -> PendingAssertion {
        PendingAssertion {
            owner: NamedResource::new_unchecked(owner),
            assertion: Assertion::object_property(
                NamedResource::new_unchecked("http://example.com/p"),
                false,
            ),
            context: None,
            target: PendingTarget::Direct,
        }
    }

    #[test]
    fn duplicates_are_registered_once() {
        let mut registry = PendingAssertionRegistry::default();
        let key = InstanceKey::new(1);
        registry.add_pending(key, entry("http://example.com/a"));
        registry.add_pending(key, entry("http://example.com/a"));
        assert_eq!(registry.remove_pending_with(key).len(), 1);
        assert!(!registry.has_pending());
    }

    #[test]
    fn removing_an_owner_drops_its_entries() {
        let mut registry = PendingAssertionRegistry::default();
        registry.add_pending(InstanceKey::new(1), entry("http://example.com/a"));
        registry.add_pending(InstanceKey::new(1), entry("http://example.com/b"));
        registry.add_pending(InstanceKey::new(2), entry("http://example.com/a"));
        registry.remove_pending_of_owner(&NamedResource::new_unchecked("http://example.com/a"));
        assert_eq!(registry.pending_keys(), vec![InstanceKey::new(1)]);
    }
}

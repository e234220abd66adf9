//! The dynamic entity surface the engine works against.
//!
//! The engine never sees concrete domain structs. It manipulates entities through the
//! [`OntologyEntity`] trait, exchanging attribute values as [`AttributeValue`] variants and
//! object references as [`EntityRef`]s, so one mapping pipeline serves every entity type the
//! [`Metamodel`](crate::Metamodel) declares.

use oxaxiom::{Assertion, LiteralValue, MultilingualString, NamedResource, Value};
use std::any::Any;
use std::fmt;

/// An opaque handle identifying one working instance inside a persistence context.
///
/// Keys are allocated by the [`UnitOfWork`](crate::UnitOfWork) and are meaningless outside the
/// context that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceKey(u64);

impl InstanceKey {
    #[inline]
    pub(crate) fn new(key: u64) -> Self {
        Self(key)
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reference from one entity to another.
///
/// A reference is either already resolvable to an individual in the store, or it points at a
/// working instance that has not been persisted yet and therefore has no identifier to write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// The referenced individual, by identifier.
    Identified(NamedResource),
    /// A not-yet-persisted working instance.
    Pending(InstanceKey),
}

impl EntityRef {
    #[inline]
    pub fn identifier(&self) -> Option<&NamedResource> {
        match self {
            Self::Identified(identifier) => Some(identifier),
            Self::Pending(_) => None,
        }
    }

    #[inline]
    pub fn key(&self) -> Option<InstanceKey> {
        match self {
            Self::Identified(_) => None,
            Self::Pending(key) => Some(*key),
        }
    }
}

impl From<NamedResource> for EntityRef {
    #[inline]
    fn from(identifier: NamedResource) -> Self {
        Self::Identified(identifier)
    }
}

impl From<InstanceKey> for EntityRef {
    #[inline]
    fn from(key: InstanceKey) -> Self {
        Self::Pending(key)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identified(identifier) => identifier.fmt(f),
            Self::Pending(key) => key.fmt(f),
        }
    }
}

/// The value of one entity attribute, shaped by the attribute's
/// [`AttributeKind`](crate::AttributeKind).
///
/// `None` stands both for an absent singular value and for an empty plural one.
#[derive(Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
pub enum AttributeValue {
    #[default]
    None,
    /// A singular object reference.
    Reference(EntityRef),
    /// An unordered set of object references.
    References(Vec<EntityRef>),
    /// A singular literal.
    Literal(LiteralValue),
    /// An unordered set of literals.
    Literals(Vec<LiteralValue>),
    /// A singular multilingual string.
    Multilingual(MultilingualString),
    /// A set of multilingual strings.
    Multilinguals(Vec<MultilingualString>),
    /// Additional class memberships beyond the declared entity type.
    Types(Vec<NamedResource>),
    /// Unmapped property values, keyed by assertion.
    Properties(Vec<(Assertion, Vec<Value>)>),
    /// An ordered sequence of object references.
    Sequence(Vec<EntityRef>),
}

impl AttributeValue {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether the value holds nothing to write: absent, or a plural shape without elements.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::References(values) | Self::Sequence(values) => values.is_empty(),
            Self::Literals(values) => values.is_empty(),
            Self::Multilingual(value) => value.is_empty(),
            Self::Multilinguals(values) => values.is_empty(),
            Self::Types(values) => values.is_empty(),
            Self::Properties(values) => values.is_empty(),
            Self::Reference(_) | Self::Literal(_) => false,
        }
    }

    /// The keys of all pending references the value contains.
    pub fn pending_keys(&self) -> Vec<InstanceKey> {
        match self {
            Self::Reference(reference) => reference.key().into_iter().collect(),
            Self::References(references) | Self::Sequence(references) => {
                references.iter().filter_map(EntityRef::key).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// The dynamic surface every mapped entity exposes to the engine.
///
/// Implementations are typically thin adapters over a domain struct: `value_of` and
/// `set_value` translate between the struct's fields and the engine's [`AttributeValue`]
/// shapes, keyed by the attribute names declared in the metamodel.
pub trait OntologyEntity: Send {
    /// The IRI of the entity's declared class.
    fn type_iri(&self) -> NamedResource;

    /// The identifier of the individual this instance stands for, if it has one yet.
    fn identifier(&self) -> Option<&NamedResource>;

    fn set_identifier(&mut self, identifier: NamedResource);

    /// The current value of the named attribute. Unknown names return
    /// [`AttributeValue::None`].
    fn value_of(&self, attribute: &str) -> AttributeValue;

    /// Replaces the value of the named attribute. Unknown names are ignored.
    fn set_value(&mut self, attribute: &str, value: AttributeValue);

    /// A deep copy of this instance, used for change tracking and caching.
    fn clone_entity(&self) -> Box<dyn OntologyEntity>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl fmt::Debug for dyn OntologyEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OntologyEntity({}", self.type_iri())?;
        if let Some(identifier) = self.identifier() {
            write!(f, ", {identifier}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_value_emptiness() {
        assert!(AttributeValue::None.is_empty());
        assert!(AttributeValue::References(Vec::new()).is_empty());
        assert!(!AttributeValue::Literal("x".into()).is_empty());
        assert!(
            !AttributeValue::Reference(EntityRef::Identified(NamedResource::new_unchecked(
                "http://example.com/a"
            )))
            .is_empty()
        );
    }

    #[test]
    fn pending_keys_are_collected_from_references() {
        let key = InstanceKey::new(7);
        let mixed = AttributeValue::References(vec![
            EntityRef::Identified(NamedResource::new_unchecked("http://example.com/a")),
            EntityRef::Pending(key),
        ]);
        assert_eq!(mixed.pending_keys(), vec![key]);
        assert!(AttributeValue::Literal("x".into()).pending_keys().is_empty());
    }
}

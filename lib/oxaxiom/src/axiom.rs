use crate::assertion::Assertion;
use crate::named_resource::NamedResource;
use crate::value::Value;
use std::fmt;

/// One statement about an individual: subject, assertion and value.
///
/// This is the atomic unit exchanged between the object–ontology mapping layer and a store
/// connector. Immutable once built.
///
/// ```
/// use oxaxiom::{Assertion, Axiom, NamedResource};
///
/// let subject = NamedResource::new("http://example.com/a")?;
/// let assertion = Assertion::data_property(NamedResource::new("http://example.com/name")?, false);
/// let axiom = Axiom::new(subject, assertion, "building".into());
/// assert_eq!(
///     axiom.to_string(),
///     "<http://example.com/a> <http://example.com/name> \"building\""
/// );
/// # Result::<_, oxiri::IriParseError>::Ok(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Axiom {
    subject: NamedResource,
    assertion: Assertion,
    value: Value,
}

impl Axiom {
    #[inline]
    pub fn new(subject: NamedResource, assertion: Assertion, value: Value) -> Self {
        Self {
            subject,
            assertion,
            value,
        }
    }

    #[inline]
    pub fn subject(&self) -> &NamedResource {
        &self.subject
    }

    #[inline]
    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn into_value(self) -> Value {
        self.value
    }

    #[inline]
    pub fn into_parts(self) -> (NamedResource, Assertion, Value) {
        (self.subject, self.assertion, self.value)
    }
}

impl fmt::Display for Axiom {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.assertion, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        let subject = NamedResource::new_unchecked("http://example.com/a");
        let assertion =
            Assertion::object_property(NamedResource::new_unchecked("http://example.com/p"), false);
        let value = Value::from(NamedResource::new_unchecked("http://example.com/b"));
        assert_eq!(
            Axiom::new(subject.clone(), assertion.clone(), value.clone()),
            Axiom::new(subject, assertion, value)
        );
    }
}

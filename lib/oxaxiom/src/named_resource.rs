use oxiri::{Iri, IriParseError};
use std::cmp::Ordering;
use std::fmt;

/// An owned identity of an [RDF individual](https://www.w3.org/TR/rdf11-concepts/#dfn-iri).
///
/// It is the universal key for axiom subjects and for object-valued axiom targets.
/// Equality is defined by the IRI string.
///
/// The default string formatter returns an N-Triples, Turtle, and SPARQL compatible representation:
/// ```
/// use oxaxiom::NamedResource;
///
/// assert_eq!(
///     "<http://example.com/foo>",
///     NamedResource::new("http://example.com/foo")?.to_string()
/// );
/// # Result::<_, oxiri::IriParseError>::Ok(())
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct NamedResource {
    iri: String,
}

impl NamedResource {
    /// Builds and validates an individual identifier from an IRI string.
    pub fn new(iri: impl Into<String>) -> Result<Self, IriParseError> {
        Ok(Self::new_unchecked(Iri::parse(iri.into())?.into_inner()))
    }

    /// Builds an individual identifier from a string.
    ///
    /// It is the caller's responsibility to ensure that `iri` is a valid IRI.
    ///
    /// [`NamedResource::new()`] is a safe version of this constructor and should be used for
    /// untrusted data.
    #[inline]
    pub fn new_unchecked(iri: impl Into<String>) -> Self {
        Self { iri: iri.into() }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.iri.as_str()
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.iri
    }

    #[inline]
    pub fn as_ref(&self) -> NamedResourceRef<'_> {
        NamedResourceRef::new_unchecked(&self.iri)
    }
}

impl fmt::Display for NamedResource {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl PartialEq<str> for NamedResource {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<NamedResource> for str {
    #[inline]
    fn eq(&self, other: &NamedResource) -> bool {
        self == other.as_str()
    }
}

/// A borrowed identity of an [RDF individual](https://www.w3.org/TR/rdf11-concepts/#dfn-iri).
///
/// Mostly used for ready-made vocabulary constants.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub struct NamedResourceRef<'a> {
    iri: &'a str,
}

impl<'a> NamedResourceRef<'a> {
    /// Builds and validates an individual identifier from an IRI string.
    pub fn new(iri: &'a str) -> Result<Self, IriParseError> {
        Iri::parse(iri)?;
        Ok(Self { iri })
    }

    /// Builds an individual identifier from a string.
    ///
    /// It is the caller's responsibility to ensure that `iri` is a valid IRI.
    #[inline]
    pub const fn new_unchecked(iri: &'a str) -> Self {
        Self { iri }
    }

    #[inline]
    pub const fn as_str(self) -> &'a str {
        self.iri
    }

    #[inline]
    pub fn into_owned(self) -> NamedResource {
        NamedResource::new_unchecked(self.iri)
    }
}

impl fmt::Display for NamedResourceRef<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iri)
    }
}

impl From<NamedResourceRef<'_>> for NamedResource {
    #[inline]
    fn from(resource: NamedResourceRef<'_>) -> Self {
        resource.into_owned()
    }
}

impl<'a> From<&'a NamedResource> for NamedResourceRef<'a> {
    #[inline]
    fn from(resource: &'a NamedResource) -> Self {
        resource.as_ref()
    }
}

impl PartialEq<NamedResource> for NamedResourceRef<'_> {
    #[inline]
    fn eq(&self, other: &NamedResource) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialEq<NamedResourceRef<'_>> for NamedResource {
    #[inline]
    fn eq(&self, other: &NamedResourceRef<'_>) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialOrd<NamedResource> for NamedResourceRef<'_> {
    #[inline]
    fn partial_cmp(&self, other: &NamedResource) -> Option<Ordering> {
        self.as_str().partial_cmp(other.as_str())
    }
}

impl PartialOrd<NamedResourceRef<'_>> for NamedResource {
    #[inline]
    fn partial_cmp(&self, other: &NamedResourceRef<'_>) -> Option<Ordering> {
        self.as_str().partial_cmp(other.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_partial_eq() {
        let iri = "http://example.com/foo";
        let resource = NamedResource::new(iri).unwrap();
        assert_eq!(resource, *iri);
        assert_eq!(*iri, resource);
        assert_eq!(resource.as_str(), iri);
        assert_eq!(resource, NamedResourceRef::new_unchecked(iri));
    }

    #[test]
    fn invalid_iri_is_rejected() {
        assert!(NamedResource::new("not an iri").is_err());
        assert!(NamedResourceRef::new("no scheme").is_err());
    }
}

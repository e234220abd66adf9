use crate::named_resource::NamedResource;
use crate::vocab::rdf;
use oxilangtag::{LanguageTag, LanguageTagParseError};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The semantic kind of an [`Assertion`](crate::Assertion) predicate.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
#[non_exhaustive]
pub enum AssertionKind {
    /// Class membership, i.e. an `rdf:type` assertion.
    Class,
    /// An OWL object property, its values are individuals.
    ObjectProperty,
    /// An OWL data property, its values are literals.
    DataProperty,
    /// An OWL annotation property, its values may be literals or individuals.
    AnnotationProperty,
    /// A property whose kind is not known, e.g. one loaded from an unmapped store predicate.
    Unspecified,
}

/// A predicate reference: an IRI together with its semantic kind, an optional language tag
/// constraint and an inferred marker.
///
/// Two assertions are equal iff their identifier, kind and language match. The inferred marker
/// is carried along but excluded from equality, it describes where a loaded value came from
/// rather than what the predicate is.
///
/// ```
/// use oxaxiom::Assertion;
/// use oxaxiom::NamedResource;
///
/// let name = NamedResource::new("http://example.com/name")?;
/// let a = Assertion::data_property(name.clone(), false);
/// let b = Assertion::data_property(name, true);
/// assert_eq!(a, b);
/// assert!(!a.is_inferred());
/// assert!(b.is_inferred());
/// # Result::<_, oxiri::IriParseError>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct Assertion {
    identifier: NamedResource,
    kind: AssertionKind,
    language: Option<String>,
    inferred: bool,
}

impl Assertion {
    /// Builds the class-membership assertion, its identifier is always `rdf:type`.
    #[inline]
    pub fn class_assertion(inferred: bool) -> Self {
        Self {
            identifier: rdf::TYPE.into_owned(),
            kind: AssertionKind::Class,
            language: None,
            inferred,
        }
    }

    /// Builds an object-property assertion.
    #[inline]
    pub fn object_property(identifier: NamedResource, inferred: bool) -> Self {
        Self {
            identifier,
            kind: AssertionKind::ObjectProperty,
            language: None,
            inferred,
        }
    }

    /// Builds a data-property assertion without a language constraint.
    #[inline]
    pub fn data_property(identifier: NamedResource, inferred: bool) -> Self {
        Self {
            identifier,
            kind: AssertionKind::DataProperty,
            language: None,
            inferred,
        }
    }

    /// Builds a data-property assertion constrained to the given language.
    ///
    /// The language tag is validated as [BCP47](https://tools.ietf.org/html/bcp47) and
    /// normalized to lowercase.
    pub fn data_property_with_language(
        identifier: NamedResource,
        language: impl Into<String>,
        inferred: bool,
    ) -> Result<Self, LanguageTagParseError> {
        Ok(Self {
            identifier,
            kind: AssertionKind::DataProperty,
            language: Some(parse_language(language)?),
            inferred,
        })
    }

    /// Builds an annotation-property assertion.
    #[inline]
    pub fn annotation_property(identifier: NamedResource, inferred: bool) -> Self {
        Self {
            identifier,
            kind: AssertionKind::AnnotationProperty,
            language: None,
            inferred,
        }
    }

    /// Builds an annotation-property assertion constrained to the given language.
    pub fn annotation_property_with_language(
        identifier: NamedResource,
        language: impl Into<String>,
        inferred: bool,
    ) -> Result<Self, LanguageTagParseError> {
        Ok(Self {
            identifier,
            kind: AssertionKind::AnnotationProperty,
            language: Some(parse_language(language)?),
            inferred,
        })
    }

    /// Builds an assertion whose semantic kind is not known.
    #[inline]
    pub fn unspecified(identifier: NamedResource, inferred: bool) -> Self {
        Self {
            identifier,
            kind: AssertionKind::Unspecified,
            language: None,
            inferred,
        }
    }

    #[inline]
    pub fn identifier(&self) -> &NamedResource {
        &self.identifier
    }

    #[inline]
    pub fn kind(&self) -> AssertionKind {
        self.kind
    }

    /// The language constraint, if any. Always lowercase.
    #[inline]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    #[inline]
    pub fn has_language(&self) -> bool {
        self.language.is_some()
    }

    /// Whether values of this assertion were derived by the store's reasoner rather than
    /// explicitly asserted.
    #[inline]
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    /// Whether this is the class-membership assertion.
    #[inline]
    pub fn is_class_assertion(&self) -> bool {
        self.kind == AssertionKind::Class
    }

    /// Returns a copy of this assertion with the inferred marker set.
    #[inline]
    pub fn into_inferred(mut self) -> Self {
        self.inferred = true;
        self
    }
}

impl PartialEq for Assertion {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.kind == other.kind
            && self.language == other.language
    }
}

impl Eq for Assertion {}

impl Hash for Assertion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
        self.kind.hash(state);
        self.language.hash(state);
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.identifier.fmt(f)?;
        if let Some(language) = &self.language {
            write!(f, "@{language}")?;
        }
        Ok(())
    }
}

fn parse_language(language: impl Into<String>) -> Result<String, LanguageTagParseError> {
    let mut language = language.into();
    language.make_ascii_lowercase();
    Ok(LanguageTag::parse(language)?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_inferred_marker() {
        let identifier = NamedResource::new_unchecked("http://example.com/p");
        let plain = Assertion::object_property(identifier.clone(), false);
        let inferred = Assertion::object_property(identifier, true);
        assert_eq!(plain, inferred);
    }

    #[test]
    fn equality_distinguishes_kind_and_language() {
        let identifier = NamedResource::new_unchecked("http://example.com/p");
        let data = Assertion::data_property(identifier.clone(), false);
        let annotation = Assertion::annotation_property(identifier.clone(), false);
        assert_ne!(data, annotation);

        let english =
            Assertion::data_property_with_language(identifier, "en", false).unwrap();
        assert_ne!(data, english);
        assert_eq!(english.language(), Some("en"));
    }

    #[test]
    fn language_is_normalized_and_validated() {
        let identifier = NamedResource::new_unchecked("http://example.com/p");
        let assertion =
            Assertion::data_property_with_language(identifier.clone(), "EN", false).unwrap();
        assert_eq!(assertion.language(), Some("en"));
        assert!(Assertion::data_property_with_language(identifier, "not a tag", false).is_err());
    }

    #[test]
    fn class_assertion_uses_rdf_type() {
        assert_eq!(
            Assertion::class_assertion(false).identifier().as_str(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type"
        );
    }
}

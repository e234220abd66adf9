use crate::named_resource::NamedResource;
use oxilangtag::{LanguageTag, LanguageTagParseError};
use oxsdatatypes::DateTime;
use std::fmt;

/// A typed literal payload of an axiom value.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum LiteralValue {
    /// A plain string without a language tag.
    String(String),
    /// A [language-tagged string](https://www.w3.org/TR/rdf11-concepts/#dfn-language-tagged-string).
    /// The language tag is lowercase.
    LangString { value: String, language: String },
    Boolean(bool),
    Integer(i64),
    Double(f64),
    DateTime(DateTime),
}

impl LiteralValue {
    /// Builds a language-tagged string, validating the tag as
    /// [BCP47](https://tools.ietf.org/html/bcp47) and normalizing it to lowercase.
    pub fn lang_string(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, LanguageTagParseError> {
        let mut language = language.into();
        language.make_ascii_lowercase();
        Ok(Self::LangString {
            value: value.into(),
            language: LanguageTag::parse(language)?.into_inner(),
        })
    }

    /// The language tag, if this is a language-tagged string.
    #[inline]
    pub fn language(&self) -> Option<&str> {
        if let Self::LangString { language, .. } = self {
            Some(language)
        } else {
            None
        }
    }

    /// The lexical form for string-shaped literals.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) | Self::LangString { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl From<String> for LiteralValue {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for LiteralValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<bool> for LiteralValue {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for LiteralValue {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for LiteralValue {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<DateTime> for LiteralValue {
    #[inline]
    fn from(value: DateTime) -> Self {
        Self::DateTime(value)
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "\"{value}\""),
            Self::LangString { value, language } => write!(f, "\"{value}\"@{language}"),
            Self::Boolean(value) => value.fmt(f),
            Self::Integer(value) => value.fmt(f),
            Self::Double(value) => value.fmt(f),
            Self::DateTime(value) => value.fmt(f),
        }
    }
}

/// An axiom value: a literal, a reference to an individual, or the distinguished null marker.
///
/// [`Value::Null`] signals "this assertion must appear but carries no value". Merge-delta
/// computation relies on the difference between an absent assertion and an explicitly empty
/// one, so the marker is a first-class value rather than an `Option`.
#[derive(Debug, Clone, PartialEq, Default)]
#[non_exhaustive]
pub enum Value {
    /// The explicit "no value" marker.
    #[default]
    Null,
    Literal(LiteralValue),
    Resource(NamedResource),
}

impl Value {
    /// The distinguished "assertion present, no value" marker.
    #[inline]
    pub fn null() -> Self {
        Self::Null
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub fn as_resource(&self) -> Option<&NamedResource> {
        if let Self::Resource(resource) = self {
            Some(resource)
        } else {
            None
        }
    }

    #[inline]
    pub fn as_literal(&self) -> Option<&LiteralValue> {
        if let Self::Literal(literal) = self {
            Some(literal)
        } else {
            None
        }
    }

    /// The language tag, if this wraps a language-tagged string.
    #[inline]
    pub fn language(&self) -> Option<&str> {
        self.as_literal().and_then(LiteralValue::language)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Literal(literal) => literal.fmt(f),
            Self::Resource(resource) => resource.fmt(f),
        }
    }
}

impl From<LiteralValue> for Value {
    #[inline]
    fn from(literal: LiteralValue) -> Self {
        Self::Literal(literal)
    }
}

impl From<NamedResource> for Value {
    #[inline]
    fn from(resource: NamedResource) -> Self {
        Self::Resource(resource)
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Self::Literal(LiteralValue::String(value))
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Literal(LiteralValue::String(value.into()))
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Literal(LiteralValue::Boolean(value))
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Literal(LiteralValue::Integer(value))
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Literal(LiteralValue::Double(value))
    }
}

impl From<DateTime> for Value {
    #[inline]
    fn from(value: DateTime) -> Self {
        Self::Literal(LiteralValue::DateTime(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_marker_is_not_a_literal() {
        let value = Value::null();
        assert!(value.is_null());
        assert!(value.as_literal().is_none());
        assert!(value.as_resource().is_none());
        assert_ne!(value, Value::from(""));
    }

    #[test]
    fn lang_string_normalizes_language() {
        let literal = LiteralValue::lang_string("building", "EN").unwrap();
        assert_eq!(literal.language(), Some("en"));
        assert_eq!(literal.as_str(), Some("building"));
        assert!(LiteralValue::lang_string("building", "42 not a tag").is_err());
    }

    #[test]
    fn display_is_turtle_like() {
        assert_eq!(Value::from("a").to_string(), "\"a\"");
        assert_eq!(
            Value::from(LiteralValue::lang_string("a", "en").unwrap()).to_string(),
            "\"a\"@en"
        );
        assert_eq!(
            Value::from(NamedResource::new_unchecked("http://example.com/i")).to_string(),
            "<http://example.com/i>"
        );
    }
}

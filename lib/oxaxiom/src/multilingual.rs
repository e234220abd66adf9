use crate::value::LiteralValue;
use std::collections::BTreeMap;
use std::fmt;

/// A string attribute value with translations in several languages.
///
/// One logical element holds at most one translation per language. An untagged translation is
/// represented by the `None` language.
///
/// ```
/// use oxaxiom::MultilingualString;
///
/// let mut label = MultilingualString::new();
/// label.set("building", "en");
/// label.set("budova", "cs");
/// assert_eq!(label.get("en"), Some("building"));
/// assert_eq!(label.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultilingualString {
    // keyed by lowercase language tag, None for the untagged translation
    values: BTreeMap<Option<String>, String>,
}

impl MultilingualString {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a multilingual string holding a single translation.
    pub fn from_translation(value: impl Into<String>, language: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.set(value, language);
        result
    }

    /// Sets the translation for the given language, replacing any previous one.
    pub fn set(&mut self, value: impl Into<String>, language: impl Into<String>) {
        let mut language = language.into();
        language.make_ascii_lowercase();
        self.values.insert(Some(language), value.into());
    }

    /// Sets the untagged translation.
    pub fn set_untagged(&mut self, value: impl Into<String>) {
        self.values.insert(None, value.into());
    }

    /// The translation for the given language, if present.
    pub fn get(&self, language: &str) -> Option<&str> {
        self.values
            .get(&Some(language.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// The untagged translation, if present.
    pub fn get_untagged(&self) -> Option<&str> {
        self.values.get(&None).map(String::as_str)
    }

    pub fn contains_language(&self, language: Option<&str>) -> bool {
        match language {
            Some(language) => self
                .values
                .contains_key(&Some(language.to_ascii_lowercase())),
            None => self.values.contains_key(&None),
        }
    }

    pub fn remove(&mut self, language: &str) -> Option<String> {
        self.values.remove(&Some(language.to_ascii_lowercase()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterates over `(language, translation)` pairs in language order, untagged first.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.values
            .iter()
            .map(|(language, value)| (language.as_deref(), value.as_str()))
    }

    /// Converts the translations into the corresponding literal values.
    pub fn to_literals(&self) -> Vec<LiteralValue> {
        self.values
            .iter()
            .map(|(language, value)| match language {
                Some(language) => LiteralValue::LangString {
                    value: value.clone(),
                    language: language.clone(),
                },
                None => LiteralValue::String(value.clone()),
            })
            .collect()
    }
}

impl fmt::Display for MultilingualString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (language, value) in &self.values {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            match language {
                Some(language) => write!(f, "\"{value}\"@{language}")?,
                None => write!(f, "\"{value}\"")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_translation_for_language() {
        let mut string = MultilingualString::new();
        string.set("building", "en");
        string.set("edifice", "en");
        assert_eq!(string.get("en"), Some("edifice"));
        assert_eq!(string.len(), 1);
    }

    #[test]
    fn language_lookup_is_case_insensitive() {
        let string = MultilingualString::from_translation("budova", "CS");
        assert_eq!(string.get("cs"), Some("budova"));
        assert_eq!(string.get("CS"), Some("budova"));
        assert!(string.contains_language(Some("Cs")));
    }

    #[test]
    fn untagged_translation_is_distinct() {
        let mut string = MultilingualString::new();
        string.set_untagged("construction");
        string.set("construction", "en");
        assert_eq!(string.len(), 2);
        assert_eq!(string.get_untagged(), Some("construction"));
    }

    #[test]
    fn to_literals_tags_translations() {
        let mut string = MultilingualString::new();
        string.set("building", "en");
        string.set_untagged("plain");
        let literals = string.to_literals();
        assert_eq!(
            literals,
            vec![
                LiteralValue::String("plain".into()),
                LiteralValue::LangString {
                    value: "building".into(),
                    language: "en".into()
                },
            ]
        );
    }
}

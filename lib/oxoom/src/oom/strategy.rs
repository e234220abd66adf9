//! Per-attribute translation between axiom values and entity attribute values.
//!
//! One [`AttributeStrategy`] instance handles one attribute for one load or save operation. On
//! load it buffers the axioms routed to it and folds them into an
//! [`AttributeValue`]; on save it explodes the attribute value into axiom values and list
//! operations on the [`AxiomValueGatherer`].

use crate::entity::{AttributeValue, EntityRef, InstanceKey, OntologyEntity};
use crate::errors::OomError;
use crate::metamodel::{Attribute, AttributeKind};
use crate::oom::gatherer::AxiomValueGatherer;
use crate::oom::pending::{PendingAssertion, PendingTarget};
use oxaxiom::{
    Assertion, Axiom, LiteralValue, MultilingualString, NamedResource, ReferencedListDescriptor,
    ReferencedListValueDescriptor, SimpleListDescriptor, SimpleListValueDescriptor, Value,
};

/// Whether a save writes a fresh entity or merges into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveMode {
    Persist,
    Update,
}

/// Resolves pending object references during a save.
pub(crate) trait ReferenceResolver {
    /// The working key of the entity currently being saved.
    fn owner_key(&self) -> Option<InstanceKey>;

    /// The identifier of the given working instance, if it has been persisted already.
    fn identifier_of(&self, key: InstanceKey) -> Option<NamedResource>;

    /// Records a reference that must be completed once the instance gets an identifier.
    fn record_pending(&mut self, key: InstanceKey, pending: PendingAssertion);

    /// Records an individual written into the transaction as a reference value.
    fn record_reference(&mut self, identifier: &NamedResource);
}

#[derive(Debug)]
enum Buffer {
    Untouched,
    Values(Vec<Value>),
    Multilingual(Vec<MultilingualString>),
    Properties(Vec<(Assertion, Vec<Value>)>),
}

#[derive(Debug)]
pub(crate) struct AttributeStrategy<'a> {
    attribute: &'a Attribute,
    context: Option<NamedResource>,
    default_language: Option<&'a str>,
    buffer: Buffer,
}

impl<'a> AttributeStrategy<'a> {
    pub fn new(attribute: &'a Attribute, context: Option<NamedResource>) -> Self {
        Self {
            attribute,
            context,
            default_language: None,
            buffer: Buffer::Untouched,
        }
    }

    /// Language tag applied on save to plain strings of attributes without a language of
    /// their own.
    #[must_use]
    pub fn with_default_language(mut self, language: Option<&'a str>) -> Self {
        self.default_language = language;
        self
    }

    #[inline]
    pub fn attribute(&self) -> &'a Attribute {
        self.attribute
    }

    /// Buffers one loaded axiom routed to this attribute.
    pub fn add_axiom_value(&mut self, axiom: Axiom) {
        match self.attribute.kind() {
            AttributeKind::SingularMultilingual | AttributeKind::PluralMultilingual => {
                let plural = *self.attribute.kind() == AttributeKind::PluralMultilingual;
                if let Value::Literal(literal) = axiom.into_value() {
                    let (text, language) = match literal {
                        LiteralValue::LangString { value, language } => (value, Some(language)),
                        LiteralValue::String(value) => (value, None),
                        // non-string literals cannot carry a translation
                        _ => return,
                    };
                    let strings = self.multilingual_buffer();
                    if plural {
                        // a translation joins the most recently started element unless that
                        // element already holds its language
                        match strings.last_mut() {
                            Some(last) if !last.contains_language(language.as_deref()) => {
                                set_translation(last, text, language);
                            }
                            _ => {
                                let mut fresh = MultilingualString::new();
                                set_translation(&mut fresh, text, language);
                                strings.push(fresh);
                            }
                        }
                    } else {
                        if strings.is_empty() {
                            strings.push(MultilingualString::new());
                        }
                        set_translation(&mut strings[0], text, language);
                    }
                }
            }
            AttributeKind::Properties => {
                let (_, assertion, value) = axiom.into_parts();
                let entries = self.properties_buffer();
                if let Some((_, values)) = entries.iter_mut().find(|(a, _)| *a == assertion) {
                    values.push(value);
                } else {
                    entries.push((assertion, vec![value]));
                }
            }
            _ => self.values_buffer().push(axiom.into_value()),
        }
    }

    /// Folds the buffered axioms into the entity's attribute. An untouched buffer leaves the
    /// attribute alone, which keeps never-loaded distinct from loaded-empty.
    pub fn build_instance_value(self, entity: &mut dyn OntologyEntity) {
        let name = self.attribute.name();
        match self.buffer {
            Buffer::Untouched => {}
            Buffer::Values(values) => {
                let value = match self.attribute.kind() {
                    AttributeKind::SingularReference => values
                        .into_iter()
                        .find_map(|v| v.as_resource().cloned())
                        .map_or(AttributeValue::None, |id| {
                            AttributeValue::Reference(EntityRef::Identified(id))
                        }),
                    AttributeKind::PluralReference => AttributeValue::References(
                        resources_of(values).map(EntityRef::Identified).collect(),
                    ),
                    AttributeKind::SingularData | AttributeKind::SingularAnnotation => values
                        .into_iter()
                        .find_map(|v| match v {
                            Value::Literal(literal) => Some(AttributeValue::Literal(literal)),
                            Value::Resource(id) => Some(AttributeValue::Reference(
                                EntityRef::Identified(id),
                            )),
                            _ => None,
                        })
                        .unwrap_or(AttributeValue::None),
                    AttributeKind::PluralData => AttributeValue::Literals(
                        values
                            .into_iter()
                            .filter_map(|v| match v {
                                Value::Literal(literal) => Some(literal),
                                _ => None,
                            })
                            .collect(),
                    ),
                    AttributeKind::Types => AttributeValue::Types(resources_of(values).collect()),
                    AttributeKind::SimpleList { .. } | AttributeKind::ReferencedList { .. } => {
                        AttributeValue::Sequence(
                            resources_of(values).map(EntityRef::Identified).collect(),
                        )
                    }
                    AttributeKind::SingularMultilingual
                    | AttributeKind::PluralMultilingual
                    | AttributeKind::Properties => return,
                };
                entity.set_value(name, value);
            }
            Buffer::Multilingual(mut strings) => {
                let value = if *self.attribute.kind() == AttributeKind::SingularMultilingual {
                    if strings.is_empty() {
                        AttributeValue::None
                    } else {
                        AttributeValue::Multilingual(strings.swap_remove(0))
                    }
                } else {
                    AttributeValue::Multilinguals(strings)
                };
                entity.set_value(name, value);
            }
            Buffer::Properties(entries) => {
                entity.set_value(name, AttributeValue::Properties(entries));
            }
        }
    }

    /// Explodes the attribute's current value into axiom values and list operations.
    pub fn build_axiom_values(
        &self,
        owner: &NamedResource,
        value: AttributeValue,
        gatherer: &mut AxiomValueGatherer,
        resolver: &mut dyn ReferenceResolver,
        mode: SaveMode,
    ) -> Result<(), OomError> {
        validate_shape(self.attribute, &value)?;
        let assertion = self.attribute.assertion();
        let context = self.context.as_ref();
        match (self.attribute.kind(), value) {
            (AttributeKind::SimpleList { has_next }, value) => {
                let Some(elements) =
                    self.resolve_sequence(owner, assertion, value, resolver)?
                else {
                    return Ok(());
                };
                let mut list = SimpleListDescriptor::new(
                    owner.clone(),
                    assertion.clone(),
                    has_next.clone(),
                );
                list.set_context(self.context.clone());
                let mut descriptor = SimpleListValueDescriptor::new(list);
                for element in elements {
                    descriptor.add_value(element);
                }
                match mode {
                    SaveMode::Persist => gatherer.persist_simple_list(descriptor),
                    SaveMode::Update => gatherer.update_simple_list(descriptor),
                }
            }
            (
                AttributeKind::ReferencedList {
                    has_next,
                    has_content,
                },
                value,
            ) => {
                let Some(elements) =
                    self.resolve_sequence(owner, assertion, value, resolver)?
                else {
                    return Ok(());
                };
                let mut list = ReferencedListDescriptor::new(
                    owner.clone(),
                    assertion.clone(),
                    has_next.clone(),
                    has_content.clone(),
                );
                list.set_context(self.context.clone());
                let mut descriptor = ReferencedListValueDescriptor::new(list);
                for element in elements {
                    descriptor.add_value(element);
                }
                match mode {
                    SaveMode::Persist => gatherer.persist_referenced_list(descriptor),
                    SaveMode::Update => gatherer.update_referenced_list(descriptor),
                }
            }
            (AttributeKind::Types, AttributeValue::Types(types)) => {
                for type_iri in types {
                    gatherer.add_value(assertion, Value::Resource(type_iri), context);
                }
            }
            (AttributeKind::Types | AttributeKind::Properties, AttributeValue::None) => {}
            (AttributeKind::Properties, AttributeValue::Properties(entries)) => {
                for (entry_assertion, values) in entries {
                    gatherer.add_values(&entry_assertion, values, context);
                }
            }
            (_, AttributeValue::None) => gatherer.add_value(assertion, Value::null(), context),
            (_, AttributeValue::Reference(reference)) => {
                if let Some(value) = self.resolve_reference(owner, assertion, reference, resolver)
                {
                    gatherer.add_value(assertion, value, context);
                }
            }
            (_, AttributeValue::References(references)) => {
                if references.is_empty() {
                    gatherer.add_value(assertion, Value::null(), context);
                } else {
                    for reference in references {
                        if let Some(value) =
                            self.resolve_reference(owner, assertion, reference, resolver)
                        {
                            gatherer.add_value(assertion, value, context);
                        }
                    }
                }
            }
            (_, AttributeValue::Literal(literal)) => {
                gatherer.add_value(assertion, self.apply_language(literal).into(), context);
            }
            (_, AttributeValue::Literals(literals)) => {
                if literals.is_empty() {
                    gatherer.add_value(assertion, Value::null(), context);
                } else {
                    for literal in literals {
                        gatherer.add_value(assertion, self.apply_language(literal).into(), context);
                    }
                }
            }
            (_, AttributeValue::Multilingual(string)) => {
                if string.is_empty() {
                    gatherer.add_value(assertion, Value::null(), context);
                } else {
                    gatherer.add_values(
                        assertion,
                        string.to_literals().into_iter().map(Value::from).collect(),
                        context,
                    );
                }
            }
            (_, AttributeValue::Multilinguals(strings)) => {
                if strings.is_empty() {
                    gatherer.add_value(assertion, Value::null(), context);
                } else {
                    for string in strings {
                        gatherer.add_values(
                            assertion,
                            string.to_literals().into_iter().map(Value::from).collect(),
                            context,
                        );
                    }
                }
            }
            _ => {
                return Err(OomError::ShapeMismatch {
                    attribute: self.attribute.name().to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Resolves a single object reference, registering a pending entry when the target has no
    /// identifier yet.
    fn resolve_reference(
        &self,
        owner: &NamedResource,
        assertion: &Assertion,
        reference: EntityRef,
        resolver: &mut dyn ReferenceResolver,
    ) -> Option<Value> {
        match reference {
            EntityRef::Identified(identifier) => {
                resolver.record_reference(&identifier);
                Some(Value::Resource(identifier))
            }
            EntityRef::Pending(key) => match resolver.identifier_of(key) {
                Some(identifier) => {
                    resolver.record_reference(&identifier);
                    Some(Value::Resource(identifier))
                }
                None => {
                    resolver.record_pending(
                        key,
                        PendingAssertion {
                            owner: owner.clone(),
                            assertion: assertion.clone(),
                            context: self.context.clone(),
                            target: PendingTarget::Direct,
                        },
                    );
                    None
                }
            },
        }
    }

    /// Resolves all sequence elements, or returns `None` when the sequence still contains
    /// unpersisted elements and its write has to wait for them.
    fn resolve_sequence(
        &self,
        owner: &NamedResource,
        assertion: &Assertion,
        value: AttributeValue,
        resolver: &mut dyn ReferenceResolver,
    ) -> Result<Option<Vec<NamedResource>>, OomError> {
        let references = match value {
            AttributeValue::None => Vec::new(),
            AttributeValue::Sequence(references) => references,
            _ => {
                return Err(OomError::ShapeMismatch {
                    attribute: self.attribute.name().to_owned(),
                });
            }
        };
        let mut elements = Vec::with_capacity(references.len());
        let mut unresolved = Vec::new();
        for reference in references {
            match reference {
                EntityRef::Identified(identifier) => elements.push(identifier),
                EntityRef::Pending(key) => match resolver.identifier_of(key) {
                    Some(identifier) => elements.push(identifier),
                    None => unresolved.push(key),
                },
            }
        }
        if unresolved.is_empty() {
            for element in &elements {
                resolver.record_reference(element);
            }
            return Ok(Some(elements));
        }
        let owner_key = resolver.owner_key().ok_or(OomError::EntityNotManaged)?;
        for key in unresolved {
            resolver.record_pending(
                key,
                PendingAssertion {
                    owner: owner.clone(),
                    assertion: assertion.clone(),
                    context: self.context.clone(),
                    target: PendingTarget::Sequence {
                        owner_key,
                        attribute: self.attribute.name().to_owned(),
                    },
                },
            );
        }
        Ok(None)
    }

    /// Applies the attribute's language constraint to plain strings, falling back to the
    /// configured default language.
    fn apply_language(&self, literal: LiteralValue) -> LiteralValue {
        let language = self
            .attribute
            .assertion()
            .language()
            .or(self.default_language);
        match (language, literal) {
            (Some(language), LiteralValue::String(value)) => LiteralValue::LangString {
                value,
                language: language.to_owned(),
            },
            (_, literal) => literal,
        }
    }

    fn values_buffer(&mut self) -> &mut Vec<Value> {
        if !matches!(self.buffer, Buffer::Values(_)) {
            self.buffer = Buffer::Values(Vec::new());
        }
        match &mut self.buffer {
            Buffer::Values(values) => values,
            _ => unreachable!(),
        }
    }

    fn multilingual_buffer(&mut self) -> &mut Vec<MultilingualString> {
        if !matches!(self.buffer, Buffer::Multilingual(_)) {
            self.buffer = Buffer::Multilingual(Vec::new());
        }
        match &mut self.buffer {
            Buffer::Multilingual(strings) => strings,
            _ => unreachable!(),
        }
    }

    fn properties_buffer(&mut self) -> &mut Vec<(Assertion, Vec<Value>)> {
        if !matches!(self.buffer, Buffer::Properties(_)) {
            self.buffer = Buffer::Properties(Vec::new());
        }
        match &mut self.buffer {
            Buffer::Properties(entries) => entries,
            _ => unreachable!(),
        }
    }
}

/// Checks that the value's shape matches the attribute's declared kind.
pub(crate) fn validate_shape(
    attribute: &Attribute,
    value: &AttributeValue,
) -> Result<(), OomError> {
    let matches = match (attribute.kind(), value) {
        (_, AttributeValue::None) => true,
        (AttributeKind::SingularReference, AttributeValue::Reference(_))
        | (AttributeKind::PluralReference, AttributeValue::References(_))
        | (AttributeKind::SingularData, AttributeValue::Literal(_))
        | (AttributeKind::PluralData, AttributeValue::Literals(_))
        | (AttributeKind::SingularMultilingual, AttributeValue::Multilingual(_))
        | (AttributeKind::PluralMultilingual, AttributeValue::Multilinguals(_))
        | (
            AttributeKind::SingularAnnotation,
            AttributeValue::Literal(_) | AttributeValue::Reference(_),
        )
        | (AttributeKind::Types, AttributeValue::Types(_))
        | (AttributeKind::Properties, AttributeValue::Properties(_))
        | (
            AttributeKind::SimpleList { .. } | AttributeKind::ReferencedList { .. },
            AttributeValue::Sequence(_),
        ) => true,
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(OomError::ShapeMismatch {
            attribute: attribute.name().to_owned(),
        })
    }
}

fn set_translation(string: &mut MultilingualString, text: String, language: Option<String>) {
    match language {
        Some(language) => string.set(text, language),
        None => string.set_untagged(text),
    }
}

fn resources_of(values: Vec<Value>) -> impl Iterator<Item = NamedResource> {
    values.into_iter().filter_map(|v| match v {
        Value::Resource(resource) => Some(resource),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::Attribute;

    fn resource(iri: &str) -> NamedResource {
        NamedResource::new_unchecked(iri)
    }

    fn axiom(value: Value) -> Axiom {
        Axiom::new(
            resource("http://example.com/a"),
            Assertion::data_property(resource("http://example.com/p"), false),
            value,
        )
    }

    fn tagged(value: &str, language: &str) -> Value {
        LiteralValue::lang_string(value, language).unwrap().into()
    }

    fn plural_strings(values: &[Value]) -> Vec<MultilingualString> {
        let attribute =
            Attribute::plural_multilingual("labels", resource("http://example.com/p"));
        let mut strategy = AttributeStrategy::new(&attribute, None);
        for value in values {
            strategy.add_axiom_value(axiom(value.clone()));
        }
        match strategy.buffer {
            Buffer::Multilingual(strings) => strings,
            _ => Vec::new(),
        }
    }

    #[test]
    fn repeated_language_starts_a_new_element() {
        // two same-language translations cannot share an element
        let strings = plural_strings(&[tagged("construction", "en"), tagged("building", "en")]);
        assert_eq!(strings.len(), 2);
        assert_eq!(strings[0].get("en"), Some("construction"));
        assert_eq!(strings[1].get("en"), Some("building"));
    }

    #[test]
    fn translation_joins_the_most_recent_element() {
        let strings = plural_strings(&[
            tagged("construction", "en"),
            tagged("stavba", "cs"),
            tagged("building", "en"),
            tagged("budova", "cs"),
        ]);
        assert_eq!(strings.len(), 2);
        assert_eq!(strings[0].get("en"), Some("construction"));
        assert_eq!(strings[0].get("cs"), Some("stavba"));
        assert_eq!(strings[1].get("en"), Some("building"));
        assert_eq!(strings[1].get("cs"), Some("budova"));
    }

    #[test]
    fn untagged_translations_behave_like_a_language() {
        let strings = plural_strings(&[
            Value::from("plain"),
            tagged("building", "en"),
            Value::from("other"),
        ]);
        assert_eq!(strings.len(), 2);
        assert_eq!(strings[0].get_untagged(), Some("plain"));
        assert_eq!(strings[0].get("en"), Some("building"));
        assert_eq!(strings[1].get_untagged(), Some("other"));
    }

    #[test]
    fn singular_multilingual_folds_all_translations_into_one() {
        let attribute =
            Attribute::singular_multilingual("label", resource("http://example.com/p"));
        let mut strategy = AttributeStrategy::new(&attribute, None);
        strategy.add_axiom_value(axiom(tagged("building", "en")));
        strategy.add_axiom_value(axiom(tagged("budova", "cs")));
        let Buffer::Multilingual(strings) = &strategy.buffer else {
            panic!("expected a multilingual buffer");
        };
        assert_eq!(strings.len(), 1);
        assert_eq!(strings[0].len(), 2);
    }

    #[test]
    fn properties_group_values_by_assertion() {
        let attribute = Attribute::properties("properties");
        let mut strategy = AttributeStrategy::new(&attribute, None);
        let first = Assertion::unspecified(resource("http://example.com/p1"), false);
        let second = Assertion::unspecified(resource("http://example.com/p2"), false);
        let subject = resource("http://example.com/a");
        strategy.add_axiom_value(Axiom::new(subject.clone(), first.clone(), "one".into()));
        strategy.add_axiom_value(Axiom::new(subject.clone(), second, "other".into()));
        strategy.add_axiom_value(Axiom::new(subject, first, "two".into()));
        let Buffer::Properties(entries) = &strategy.buffer else {
            panic!("expected a properties buffer");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1.len(), 2);
    }

    #[test]
    fn language_constraint_tags_plain_strings_on_save() {
        let attribute = Attribute::singular_data("name", resource("http://example.com/p"))
            .with_language("en")
            .unwrap();
        let strategy = AttributeStrategy::new(&attribute, None);
        assert_eq!(
            strategy.apply_language(LiteralValue::String("building".into())),
            LiteralValue::LangString {
                value: "building".into(),
                language: "en".into()
            }
        );
        assert_eq!(
            strategy.apply_language(LiteralValue::Integer(4)),
            LiteralValue::Integer(4)
        );
    }

    #[test]
    fn default_language_applies_when_the_attribute_declares_none() {
        let attribute = Attribute::singular_data("name", resource("http://example.com/p"));
        let strategy = AttributeStrategy::new(&attribute, None).with_default_language(Some("en"));
        assert_eq!(
            strategy.apply_language(LiteralValue::String("building".into())),
            LiteralValue::LangString {
                value: "building".into(),
                language: "en".into()
            }
        );

        // an attribute-level language wins over the default
        let tagged_attribute = Attribute::singular_data("name", resource("http://example.com/p"))
            .with_language("cs")
            .unwrap();
        let strategy =
            AttributeStrategy::new(&tagged_attribute, None).with_default_language(Some("en"));
        assert_eq!(
            strategy.apply_language(LiteralValue::String("budova".into())),
            LiteralValue::LangString {
                value: "budova".into(),
                language: "cs".into()
            }
        );
    }

    #[test]
    fn shape_validation_rejects_mismatches() {
        let attribute = Attribute::singular_data("name", resource("http://example.com/p"));
        assert!(validate_shape(&attribute, &AttributeValue::None).is_ok());
        assert!(validate_shape(&attribute, &AttributeValue::Literal("x".into())).is_ok());
        assert!(matches!(
            validate_shape(&attribute, &AttributeValue::Literals(vec!["x".into()])),
            Err(OomError::ShapeMismatch { .. })
        ));
    }
}

//! Static mapping declarations: which classes map to entities and how each attribute is
//! stored.
//!
//! A [`Metamodel`] is assembled once from [`EntityType`] declarations and validated as a
//! whole; everything the engine does afterwards is driven by lookups into it.

use crate::entity::OntologyEntity;
use crate::errors::{MetamodelError, OomError};
use oxaxiom::{Assertion, LanguageTagParseError, NamedResource, vocab};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// When an attribute's values are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchKind {
    /// Loaded together with the entity.
    #[default]
    Eager,
    /// Loaded on demand through
    /// [`UnitOfWork::load_field`](crate::UnitOfWork::load_field).
    Lazy,
}

/// Which lifecycle operations propagate through an object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadePolicy {
    pub persist: bool,
    pub remove: bool,
}

impl CascadePolicy {
    pub const NONE: Self = Self {
        persist: false,
        remove: false,
    };
    pub const ALL: Self = Self {
        persist: true,
        remove: true,
    };
    pub const PERSIST: Self = Self {
        persist: true,
        remove: false,
    };
}

/// The storage shape of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttributeKind {
    /// At most one object reference.
    SingularReference,
    /// An unordered set of object references.
    PluralReference,
    /// At most one literal.
    SingularData,
    /// An unordered set of literals.
    PluralData,
    /// At most one multilingual string, stored as one language-tagged literal per translation.
    SingularMultilingual,
    /// A set of multilingual strings.
    PluralMultilingual,
    /// At most one annotation value.
    SingularAnnotation,
    /// Class memberships beyond the declared entity type.
    Types,
    /// Unmapped property values.
    Properties,
    /// An ordered sequence linked element to element through `has_next`.
    SimpleList { has_next: Assertion },
    /// An ordered sequence of synthetic nodes, each pointing at its element through
    /// `has_content` and at its successor through `has_next`.
    ReferencedList {
        has_next: Assertion,
        has_content: Assertion,
    },
}

impl AttributeKind {
    /// Whether the attribute holds at most one value.
    pub fn is_singular(&self) -> bool {
        matches!(
            self,
            Self::SingularReference
                | Self::SingularData
                | Self::SingularMultilingual
                | Self::SingularAnnotation
        )
    }

    /// Whether the attribute is an ordered sequence.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::SimpleList { .. } | Self::ReferencedList { .. })
    }

    /// Whether the attribute's values are object references.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::SingularReference | Self::PluralReference) || self.is_sequence()
    }
}

/// One mapped attribute of an entity type.
///
/// ```
/// use oxoom::{Attribute, CascadePolicy, FetchKind};
/// use oxaxiom::NamedResource;
///
/// let predicate = NamedResource::new("http://example.com/hasMember")?;
/// let target = NamedResource::new("http://example.com/Member")?;
/// let members = Attribute::plural_reference("members", predicate, target)
///     .with_cascade(CascadePolicy::PERSIST)
///     .with_fetch(FetchKind::Lazy);
/// assert_eq!(members.name(), "members");
/// # Result::<_, oxiri::IriParseError>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
    assertion: Assertion,
    fetch: FetchKind,
    cascade: CascadePolicy,
    target_type: Option<NamedResource>,
    inferred: bool,
}

impl Attribute {
    fn new(
        name: impl Into<String>,
        kind: AttributeKind,
        assertion: Assertion,
        target_type: Option<NamedResource>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            assertion,
            fetch: FetchKind::default(),
            cascade: CascadePolicy::default(),
            target_type,
            inferred: false,
        }
    }

    pub fn singular_data(name: impl Into<String>, predicate: NamedResource) -> Self {
        Self::new(
            name,
            AttributeKind::SingularData,
            Assertion::data_property(predicate, false),
            None,
        )
    }

    pub fn plural_data(name: impl Into<String>, predicate: NamedResource) -> Self {
        Self::new(
            name,
            AttributeKind::PluralData,
            Assertion::data_property(predicate, false),
            None,
        )
    }

    pub fn singular_multilingual(name: impl Into<String>, predicate: NamedResource) -> Self {
        Self::new(
            name,
            AttributeKind::SingularMultilingual,
            Assertion::data_property(predicate, false),
            None,
        )
    }

    pub fn plural_multilingual(name: impl Into<String>, predicate: NamedResource) -> Self {
        Self::new(
            name,
            AttributeKind::PluralMultilingual,
            Assertion::data_property(predicate, false),
            None,
        )
    }

    pub fn singular_annotation(name: impl Into<String>, predicate: NamedResource) -> Self {
        Self::new(
            name,
            AttributeKind::SingularAnnotation,
            Assertion::annotation_property(predicate, false),
            None,
        )
    }

    pub fn singular_reference(
        name: impl Into<String>,
        predicate: NamedResource,
        target_type: NamedResource,
    ) -> Self {
        Self::new(
            name,
            AttributeKind::SingularReference,
            Assertion::object_property(predicate, false),
            Some(target_type),
        )
    }

    pub fn plural_reference(
        name: impl Into<String>,
        predicate: NamedResource,
        target_type: NamedResource,
    ) -> Self {
        Self::new(
            name,
            AttributeKind::PluralReference,
            Assertion::object_property(predicate, false),
            Some(target_type),
        )
    }

    /// Declares a simple-list sequence: `has_list` links the owner to the first element,
    /// `has_next` links each element to its successor.
    pub fn simple_list(
        name: impl Into<String>,
        has_list: NamedResource,
        has_next: NamedResource,
        target_type: NamedResource,
    ) -> Self {
        Self::new(
            name,
            AttributeKind::SimpleList {
                has_next: Assertion::object_property(has_next, false),
            },
            Assertion::object_property(has_list, false),
            Some(target_type),
        )
    }

    /// Declares a referenced-list sequence built from synthetic order-keeping nodes.
    pub fn referenced_list(
        name: impl Into<String>,
        has_list: NamedResource,
        has_next: NamedResource,
        has_content: NamedResource,
        target_type: NamedResource,
    ) -> Self {
        Self::new(
            name,
            AttributeKind::ReferencedList {
                has_next: Assertion::object_property(has_next, false),
                has_content: Assertion::object_property(has_content, false),
            },
            Assertion::object_property(has_list, false),
            Some(target_type),
        )
    }

    /// Declares the types attribute holding class memberships beyond the declared entity
    /// type.
    pub fn types(name: impl Into<String>) -> Self {
        Self::new(
            name,
            AttributeKind::Types,
            Assertion::class_assertion(false),
            None,
        )
    }

    /// Declares the properties attribute capturing values of unmapped predicates. The stored
    /// assertion is a placeholder, properties values carry their own assertions.
    pub fn properties(name: impl Into<String>) -> Self {
        Self::new(
            name,
            AttributeKind::Properties,
            Assertion::unspecified(vocab::rdf::TYPE.into_owned(), false),
            None,
        )
    }

    /// Constrains a data or annotation attribute to the given language.
    pub fn with_language(
        mut self,
        language: impl Into<String>,
    ) -> Result<Self, LanguageTagParseError> {
        let identifier = self.assertion.identifier().clone();
        self.assertion = match self.kind {
            AttributeKind::SingularAnnotation => Assertion::annotation_property_with_language(
                identifier,
                language,
                self.inferred,
            )?,
            _ => Assertion::data_property_with_language(identifier, language, self.inferred)?,
        };
        Ok(self)
    }

    /// Marks the attribute's values as maintained by the store's reasoner.
    #[must_use]
    pub fn with_inferred(mut self) -> Self {
        self.inferred = true;
        self.assertion = self.assertion.clone().into_inferred();
        self
    }

    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchKind) -> Self {
        self.fetch = fetch;
        self
    }

    #[must_use]
    pub fn with_cascade(mut self, cascade: CascadePolicy) -> Self {
        self.cascade = cascade;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// The assertion this attribute reads and writes. For sequences this is the `has_list`
    /// edge.
    #[inline]
    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    #[inline]
    pub fn fetch(&self) -> FetchKind {
        self.fetch
    }

    #[inline]
    pub fn cascade(&self) -> CascadePolicy {
        self.cascade
    }

    /// The declared entity type of referenced values, for reference-valued attributes.
    #[inline]
    pub fn target_type(&self) -> Option<&NamedResource> {
        self.target_type.as_ref()
    }

    #[inline]
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }
}

/// The mapping declaration of one entity class.
#[derive(Debug, Clone)]
pub struct EntityType {
    type_iri: NamedResource,
    attributes: Vec<Attribute>,
    factory: fn() -> Box<dyn OntologyEntity>,
}

impl EntityType {
    pub fn new(type_iri: NamedResource, factory: fn() -> Box<dyn OntologyEntity>) -> Self {
        Self {
            type_iri,
            attributes: Vec::new(),
            factory,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[inline]
    pub fn type_iri(&self) -> &NamedResource {
        &self.type_iri
    }

    /// The attributes in declaration order.
    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// The attribute reading the given predicate, excluding types and properties attributes.
    pub fn attribute_by_predicate(&self, predicate: &NamedResource) -> Option<&Attribute> {
        self.attributes.iter().find(|a| {
            !matches!(a.kind(), AttributeKind::Types | AttributeKind::Properties)
                && a.assertion().identifier() == predicate
        })
    }

    pub fn types_attribute(&self) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| *a.kind() == AttributeKind::Types)
    }

    pub fn properties_attribute(&self) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| *a.kind() == AttributeKind::Properties)
    }

    pub fn has_inferred_attributes(&self) -> bool {
        self.attributes.iter().any(Attribute::is_inferred)
    }

    /// Builds a fresh, empty instance of the mapped entity.
    pub fn new_instance(&self) -> Box<dyn OntologyEntity> {
        (self.factory)()
    }
}

/// Collects entity type declarations and validates them into a [`Metamodel`].
#[derive(Debug, Default)]
pub struct MetamodelBuilder {
    types: Vec<EntityType>,
}

impl MetamodelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, entity_type: EntityType) -> Self {
        self.types.push(entity_type);
        self
    }

    pub fn build(self) -> Result<Metamodel, MetamodelError> {
        if self.types.is_empty() {
            return Err(MetamodelError::Empty);
        }
        let mut types = FxHashMap::default();
        for entity_type in self.types {
            Self::validate(&entity_type)?;
            let type_iri = entity_type.type_iri().clone();
            if types.insert(type_iri.clone(), Arc::new(entity_type)).is_some() {
                return Err(MetamodelError::DuplicateType { type_iri });
            }
        }
        Ok(Metamodel { types })
    }

    fn validate(entity_type: &EntityType) -> Result<(), MetamodelError> {
        let type_iri = entity_type.type_iri();
        let mut names = FxHashSet::default();
        let mut predicates = FxHashSet::default();
        let mut types_seen = false;
        let mut properties_seen = false;
        for attribute in entity_type.attributes() {
            if !names.insert(attribute.name()) {
                return Err(MetamodelError::DuplicateAttributeName {
                    type_iri: type_iri.clone(),
                    name: attribute.name().to_owned(),
                });
            }
            match attribute.kind() {
                AttributeKind::Types => {
                    if types_seen {
                        return Err(MetamodelError::DuplicateSpecialAttribute {
                            type_iri: type_iri.clone(),
                            role: "types",
                        });
                    }
                    types_seen = true;
                }
                AttributeKind::Properties => {
                    if properties_seen {
                        return Err(MetamodelError::DuplicateSpecialAttribute {
                            type_iri: type_iri.clone(),
                            role: "properties",
                        });
                    }
                    properties_seen = true;
                }
                kind => {
                    if kind.is_sequence() && attribute.is_inferred() {
                        return Err(MetamodelError::InferredSequence {
                            type_iri: type_iri.clone(),
                            name: attribute.name().to_owned(),
                        });
                    }
                    if !predicates.insert(attribute.assertion().identifier().clone()) {
                        return Err(MetamodelError::DuplicatePredicate {
                            type_iri: type_iri.clone(),
                            predicate: attribute.assertion().identifier().clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// The validated set of all entity type declarations.
#[derive(Debug, Clone)]
pub struct Metamodel {
    types: FxHashMap<NamedResource, Arc<EntityType>>,
}

impl Metamodel {
    /// The declaration of the given class, or
    /// [`OomError::UnknownEntityType`] when the class is not mapped.
    pub fn entity_type(&self, type_iri: &NamedResource) -> Result<&Arc<EntityType>, OomError> {
        self.types
            .get(type_iri)
            .ok_or_else(|| OomError::UnknownEntityType {
                type_iri: type_iri.clone(),
            })
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<EntityType>> {
        self.types.values()
    }

    /// The IRIs of all entity types with at least one inferred attribute.
    pub fn inferred_types(&self) -> Vec<NamedResource> {
        self.types
            .values()
            .filter(|t| t.has_inferred_attributes())
            .map(|t| t.type_iri().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AttributeValue;
    use std::any::Any;

    #[derive(Default)]
    struct Dummy {
        identifier: Option<NamedResource>,
    }

    impl OntologyEntity for Dummy {
        fn type_iri(&self) -> NamedResource {
            NamedResource::new_unchecked("http://example.com/Dummy")
        }

        fn identifier(&self) -> Option<&NamedResource> {
            self.identifier.as_ref()
        }

        fn set_identifier(&mut self, identifier: NamedResource) {
            self.identifier = Some(identifier);
        }

        fn value_of(&self, _attribute: &str) -> AttributeValue {
            AttributeValue::None
        }

        fn set_value(&mut self, _attribute: &str, _value: AttributeValue) {}

        fn clone_entity(&self) -> Box<dyn OntologyEntity> {
            Box::new(Self {
                identifier: self.identifier.clone(),
            })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn resource(iri: &str) -> NamedResource {
        NamedResource::new_unchecked(iri)
    }

    fn dummy_type() -> EntityType {
        EntityType::new(resource("http://example.com/Dummy"), || {
            Box::new(Dummy::default())
        })
    }

    #[test]
    fn builds_a_valid_metamodel() {
        let metamodel = MetamodelBuilder::new()
            .with_type(
                dummy_type()
                    .with_attribute(Attribute::singular_data(
                        "name",
                        resource("http://example.com/name"),
                    ))
                    .with_attribute(Attribute::types("types"))
                    .with_attribute(Attribute::properties("properties")),
            )
            .build()
            .unwrap();
        assert_eq!(metamodel.len(), 1);
        let entity_type = metamodel
            .entity_type(&resource("http://example.com/Dummy"))
            .unwrap();
        assert!(entity_type.attribute("name").is_some());
        assert!(entity_type.types_attribute().is_some());
        assert!(entity_type.properties_attribute().is_some());
    }

    #[test]
    fn rejects_duplicate_predicates() {
        let result = MetamodelBuilder::new()
            .with_type(
                dummy_type()
                    .with_attribute(Attribute::singular_data(
                        "first",
                        resource("http://example.com/p"),
                    ))
                    .with_attribute(Attribute::plural_data(
                        "second",
                        resource("http://example.com/p"),
                    )),
            )
            .build();
        assert!(matches!(
            result,
            Err(MetamodelError::DuplicatePredicate { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_attribute_names() {
        let result = MetamodelBuilder::new()
            .with_type(
                dummy_type()
                    .with_attribute(Attribute::singular_data(
                        "name",
                        resource("http://example.com/a"),
                    ))
                    .with_attribute(Attribute::singular_data(
                        "name",
                        resource("http://example.com/b"),
                    )),
            )
            .build();
        assert!(matches!(
            result,
            Err(MetamodelError::DuplicateAttributeName { .. })
        ));
    }

    #[test]
    fn rejects_second_types_attribute() {
        let result = MetamodelBuilder::new()
            .with_type(
                dummy_type()
                    .with_attribute(Attribute::types("a"))
                    .with_attribute(Attribute::types("b")),
            )
            .build();
        assert!(matches!(
            result,
            Err(MetamodelError::DuplicateSpecialAttribute { role: "types", .. })
        ));
    }

    #[test]
    fn rejects_inferred_sequences() {
        let result = MetamodelBuilder::new()
            .with_type(
                dummy_type().with_attribute(
                    Attribute::simple_list(
                        "items",
                        resource("http://example.com/hasList"),
                        resource("http://example.com/hasNext"),
                        resource("http://example.com/Item"),
                    )
                    .with_inferred(),
                ),
            )
            .build();
        assert!(matches!(result, Err(MetamodelError::InferredSequence { .. })));
    }

    #[test]
    fn inferred_marker_propagates_to_the_assertion() {
        let attribute = Attribute::singular_data("a", resource("http://example.com/p"))
            .with_inferred();
        assert!(attribute.assertion().is_inferred());
    }

    #[test]
    fn language_constraint_is_applied() {
        let attribute = Attribute::singular_data("a", resource("http://example.com/p"))
            .with_language("en")
            .unwrap();
        assert_eq!(attribute.assertion().language(), Some("en"));
        assert!(
            Attribute::singular_data("a", resource("http://example.com/p"))
                .with_language("no such tag")
                .is_err()
        );
    }

    #[test]
    fn inferred_types_are_reported() {
        let metamodel = MetamodelBuilder::new()
            .with_type(dummy_type().with_attribute(
                Attribute::singular_data("a", resource("http://example.com/p")).with_inferred(),
            ))
            .build()
            .unwrap();
        assert_eq!(
            metamodel.inferred_types(),
            vec![resource("http://example.com/Dummy")]
        );
    }
}

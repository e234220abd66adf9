use oxaxiom::NamedResource;
use rustc_hash::FxHashMap;

/// Where an entity and its attribute values live.
///
/// The descriptor names the context (named graph) the entity is read from and written into,
/// with optional per-attribute overrides. `None` means the store's default graph. Attribute
/// contexts inherit the entity context unless overridden.
#[derive(Debug, Clone, Default)]
pub struct EntityDescriptor {
    context: Option<NamedResource>,
    attribute_contexts: FxHashMap<String, NamedResource>,
}

impl EntityDescriptor {
    /// The default-graph descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// A descriptor reading from and writing into the given context.
    pub fn in_context(context: NamedResource) -> Self {
        Self {
            context: Some(context),
            attribute_contexts: FxHashMap::default(),
        }
    }

    /// Overrides the context of one attribute.
    #[must_use]
    pub fn with_attribute_context(
        mut self,
        attribute: impl Into<String>,
        context: NamedResource,
    ) -> Self {
        self.attribute_contexts.insert(attribute.into(), context);
        self
    }

    #[inline]
    pub fn context(&self) -> Option<&NamedResource> {
        self.context.as_ref()
    }

    /// The context of the given attribute, falling back to the entity context.
    pub fn attribute_context(&self, attribute: &str) -> Option<&NamedResource> {
        self.attribute_contexts
            .get(attribute)
            .or(self.context.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_contexts_inherit_the_entity_context() {
        let shared = NamedResource::new_unchecked("http://example.com/ctx");
        let dedicated = NamedResource::new_unchecked("http://example.com/other");
        let descriptor = EntityDescriptor::in_context(shared.clone())
            .with_attribute_context("name", dedicated.clone());
        assert_eq!(descriptor.attribute_context("name"), Some(&dedicated));
        assert_eq!(descriptor.attribute_context("age"), Some(&shared));
        assert_eq!(EntityDescriptor::new().attribute_context("name"), None);
    }
}

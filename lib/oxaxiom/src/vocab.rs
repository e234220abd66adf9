//! Ready to use [`NamedResourceRef`](super::NamedResourceRef)s for the vocabularies the mapping
//! layer depends on.

pub mod rdf {
    //! [RDF](https://www.w3.org/TR/rdf11-concepts/) vocabulary.
    use crate::named_resource::NamedResourceRef;

    /// The subject is an instance of a class.
    pub const TYPE: NamedResourceRef<'_> =
        NamedResourceRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
    /// The class of language-tagged string literal values.
    pub const LANG_STRING: NamedResourceRef<'_> =
        NamedResourceRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#langString");
}

pub mod owl {
    //! [OWL 2](https://www.w3.org/TR/owl2-overview/) vocabulary.
    use crate::named_resource::NamedResourceRef;

    /// The class of OWL individuals.
    pub const THING: NamedResourceRef<'_> =
        NamedResourceRef::new_unchecked("http://www.w3.org/2002/07/owl#Thing");
    /// The class of OWL classes.
    pub const CLASS: NamedResourceRef<'_> =
        NamedResourceRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");
}

pub mod seq {
    //! Default sequence vocabulary for the two ordered-list encodings.
    use crate::named_resource::NamedResourceRef;

    /// Links a list owner to the head of the sequence.
    pub const HAS_LIST: NamedResourceRef<'_> =
        NamedResourceRef::new_unchecked("http://oxoom.org/ontologies/sequences#hasListItem");
    /// Links a sequence node (or element) to its successor.
    pub const HAS_NEXT: NamedResourceRef<'_> =
        NamedResourceRef::new_unchecked("http://oxoom.org/ontologies/sequences#hasNext");
    /// Links a referenced-list sequence node to the element it carries.
    pub const HAS_CONTENT: NamedResourceRef<'_> =
        NamedResourceRef::new_unchecked("http://oxoom.org/ontologies/sequences#hasContents");
}

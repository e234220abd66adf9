//! OxAxiom provides the axiom data model and the storage connector contract used by the
//! [Oxoom](https://crates.io/crates/oxoom) object–ontology mapping engine.
//!
//! It is deliberately storage-agnostic: an [`Axiom`] (subject, [`Assertion`], [`Value`]) is
//! the atomic unit exchanged with a store, and the [`Connector`] trait is the whole surface a
//! driver has to implement. The crate ships [`MemoryStore`], a small in-memory reference
//! connector used by the engine's test suites and usable as an embedded store.
//!
//! Usage example:
//! ```
//! use oxaxiom::*;
//!
//! let store = MemoryStore::new();
//! let mut connection = store.connection();
//!
//! let subject = NamedResource::new("http://example.com/a")?;
//! let name = Assertion::data_property(NamedResource::new("http://example.com/name")?, false);
//!
//! connection.begin()?;
//! let mut save = AxiomValueDescriptor::new(subject.clone());
//! save.add_value(&name, "building".into());
//! connection.save_axioms(&save)?;
//! connection.commit()?;
//!
//! let mut load = AxiomDescriptor::new(subject);
//! load.add_assertion(name);
//! assert_eq!(connection.load_axioms(&load)?.len(), 1);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

mod assertion;
mod axiom;
mod connector;
mod descriptor;
mod memory;
mod multilingual;
mod named_resource;
mod value;
pub mod vocab;

pub use crate::assertion::{Assertion, AssertionKind};
pub use crate::axiom::Axiom;
pub use crate::connector::{Connector, ConnectorError};
pub use crate::descriptor::{
    AxiomDescriptor, AxiomValueDescriptor, ReferencedListDescriptor,
    ReferencedListValueDescriptor, SimpleListDescriptor, SimpleListValueDescriptor,
};
pub use crate::memory::{MemoryConnector, MemoryStore};
pub use crate::multilingual::MultilingualString;
pub use crate::named_resource::{NamedResource, NamedResourceRef};
pub use crate::value::{LiteralValue, Value};
pub use oxilangtag::LanguageTagParseError;
pub use oxiri::IriParseError;

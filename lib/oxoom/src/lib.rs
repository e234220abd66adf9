//! Oxoom is an object–ontology mapping engine: a JPA-like entity layer over RDF/OWL triple
//! stores.
//!
//! A [`Metamodel`] declares how entity classes map to ontology classes and how each attribute
//! is stored. A [`ServerSession`] holds the metamodel, the shared entity cache and a source
//! of store connections; each call to [`ServerSession::begin`] opens a [`UnitOfWork`], a
//! transactional persistence context with working copies, change tracking and commit-time
//! diffing. Storage access goes exclusively through the
//! [`Connector`](oxaxiom::Connector) contract of the companion `oxaxiom` crate.
//!
//! Usage example:
//! ```
//! use oxaxiom::{MemoryStore, NamedResource};
//! use oxoom::*;
//! use std::any::Any;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Person {
//!     identifier: Option<NamedResource>,
//!     name: Option<String>,
//! }
//!
//! impl Person {
//!     fn type_iri() -> NamedResource {
//!         NamedResource::new_unchecked("http://example.com/Person")
//!     }
//! }
//!
//! impl OntologyEntity for Person {
//!     fn type_iri(&self) -> NamedResource {
//!         Self::type_iri()
//!     }
//!     fn identifier(&self) -> Option<&NamedResource> {
//!         self.identifier.as_ref()
//!     }
//!     fn set_identifier(&mut self, identifier: NamedResource) {
//!         self.identifier = Some(identifier);
//!     }
//!     fn value_of(&self, attribute: &str) -> AttributeValue {
//!         match (attribute, &self.name) {
//!             ("name", Some(name)) => AttributeValue::Literal(name.clone().into()),
//!             _ => AttributeValue::None,
//!         }
//!     }
//!     fn set_value(&mut self, attribute: &str, value: AttributeValue) {
//!         if attribute == "name" {
//!             self.name = match value {
//!                 AttributeValue::Literal(literal) => literal.as_str().map(ToOwned::to_owned),
//!                 _ => None,
//!             };
//!         }
//!     }
//!     fn clone_entity(&self) -> Box<dyn OntologyEntity> {
//!         Box::new(Self {
//!             identifier: self.identifier.clone(),
//!             name: self.name.clone(),
//!         })
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//! }
//!
//! let metamodel = Arc::new(
//!     MetamodelBuilder::new()
//!         .with_type(
//!             EntityType::new(Person::type_iri(), || Box::new(Person::default()))
//!                 .with_attribute(Attribute::singular_data(
//!                     "name",
//!                     NamedResource::new("http://example.com/name")?,
//!                 )),
//!         )
//!         .build()?,
//! );
//! let session = ServerSession::with_store(metamodel, OomConfig::default(), MemoryStore::new());
//!
//! let mut context = session.begin()?;
//! let key = context.persist_new(
//!     Box::new(Person {
//!         identifier: None,
//!         name: Some("Ada".into()),
//!     }),
//!     EntityDescriptor::new(),
//! )?;
//! let identifier = context.identifier_of(key).unwrap().clone();
//! context.commit()?;
//!
//! let mut reader = session.begin()?;
//! let found = reader.find(&Person::type_iri(), &identifier)?.unwrap();
//! assert_eq!(
//!     reader.typed::<Person>(found).unwrap().name.as_deref(),
//!     Some("Ada")
//! );
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

mod cache;
mod config;
mod descriptor;
mod entity;
mod errors;
mod metamodel;
mod oom;
mod session;
mod unit_of_work;

pub use crate::cache::{CacheManager, DisabledCacheManager, LruCacheManager, TtlCacheManager};
pub use crate::config::{CacheKind, OomConfig};
pub use crate::descriptor::EntityDescriptor;
pub use crate::entity::{AttributeValue, EntityRef, InstanceKey, OntologyEntity};
pub use crate::errors::{MetamodelError, OomError};
pub use crate::metamodel::{
    Attribute, AttributeKind, CascadePolicy, EntityType, FetchKind, Metamodel, MetamodelBuilder,
};
pub use crate::oom::{ListRebuild, ObjectOntologyMapper};
pub use crate::session::{ConnectionFactory, ServerSession};
pub use crate::unit_of_work::UnitOfWork;

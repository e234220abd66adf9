use crate::cache::{CacheManager, new_cache_manager};
use crate::config::OomConfig;
use crate::errors::OomError;
use crate::metamodel::Metamodel;
use crate::unit_of_work::UnitOfWork;
use oxaxiom::{Connector, MemoryStore};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Produces one store connection per persistence context.
pub type ConnectionFactory = Box<dyn Fn() -> Box<dyn Connector> + Send + Sync>;

/// The long-lived server-side session: metamodel, configuration, the shared cache and the
/// source of store connections.
///
/// Persistence contexts are started with [`begin`](Self::begin); each gets its own
/// connection and its own [`UnitOfWork`], all sharing this session's cache.
pub struct ServerSession {
    metamodel: Arc<Metamodel>,
    config: OomConfig,
    cache: Box<dyn CacheManager>,
    connections: ConnectionFactory,
    open: AtomicBool,
}

impl ServerSession {
    pub fn new(metamodel: Arc<Metamodel>, config: OomConfig, connections: ConnectionFactory) -> Self {
        let cache = new_cache_manager(&config);
        cache.set_inferred_types(metamodel.inferred_types());
        Self {
            metamodel,
            config,
            cache,
            connections,
            open: AtomicBool::new(true),
        }
    }

    /// A session backed by the in-memory reference store.
    pub fn with_store(metamodel: Arc<Metamodel>, config: OomConfig, store: MemoryStore) -> Self {
        Self::new(
            metamodel,
            config,
            Box::new(move || Box::new(store.connection())),
        )
    }

    #[inline]
    pub fn metamodel(&self) -> &Arc<Metamodel> {
        &self.metamodel
    }

    #[inline]
    pub fn config(&self) -> &OomConfig {
        &self.config
    }

    #[inline]
    pub fn cache(&self) -> &dyn CacheManager {
        &*self.cache
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Starts a fresh persistence context on its own connection.
    pub fn begin(&self) -> Result<UnitOfWork<'_>, OomError> {
        if !self.is_open() {
            return Err(OomError::TransactionNotActive);
        }
        let mut connector = (self.connections)();
        connector.begin()?;
        Ok(UnitOfWork::new(self, connector))
    }

    /// Closes the session. Already running persistence contexts keep working; new ones can no
    /// longer be started.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.cache.evict_all();
    }
}

impl fmt::Debug for ServerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSession")
            .field("open", &self.is_open())
            .field("types", &self.metamodel.len())
            .finish_non_exhaustive()
    }
}

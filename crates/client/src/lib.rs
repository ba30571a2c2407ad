//! Local backend facade for MedVision.
//!
//! Bundles the identity store, document collections, blob shim, and
//! analysis service over one shared key-value substrate. This is the only
//! type the application shell talks to; every operation returns a
//! `Result` (or an `Option` for the session read) instead of throwing
//! across the boundary.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use analysis::{AnalysisConfig, AnalysisService};
use blob_store::BlobStore;
use doc_store::{DocStore, DocStoreResult, Document, Query};
use identity::IdentityStore;
use kv_store::{FileKvStore, KeyValueStore, MemoryKvStore};

/// Construction options for [`LocalBackend`].
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Disable all artificial latency (tests).
    pub zero_latency: bool,
    /// Always use the simulated analyzer, even when a credential exists.
    pub force_simulation: bool,
}

/// The local backend: one shared substrate behind every component.
pub struct LocalBackend {
    auth: IdentityStore,
    docs: Arc<DocStore>,
    storage: BlobStore,
    analysis: AnalysisService,
}

impl LocalBackend {
    /// Opens a backend over the given substrate with default options.
    pub fn open(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::open_with(kv, BackendOptions::default())
    }

    /// Opens a backend over the given substrate.
    pub fn open_with(kv: Arc<dyn KeyValueStore>, options: BackendOptions) -> Self {
        let mut docs = DocStore::new(kv.clone());
        if options.zero_latency {
            docs = docs.with_delays(Duration::ZERO, Duration::ZERO);
        }
        let docs = Arc::new(docs);

        let mut auth = IdentityStore::new(kv.clone(), docs.clone());
        if options.zero_latency {
            auth = auth.with_delays(Duration::ZERO, Duration::ZERO);
        }

        let mut storage = BlobStore::new();
        if options.zero_latency {
            storage = storage.with_delay(Duration::ZERO);
        }

        let mut analysis_config = AnalysisConfig {
            force_simulation: options.force_simulation,
            ..AnalysisConfig::default()
        };
        if options.zero_latency {
            analysis_config.simulator_delay = Duration::ZERO;
        }
        let analysis = AnalysisService::from_config(analysis_config, kv.as_ref());

        Self {
            auth,
            docs,
            storage,
            analysis,
        }
    }

    /// Opens a throwaway in-memory backend.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryKvStore::new()))
    }

    /// Opens a backend persisted to a single file.
    pub fn open_file(path: impl AsRef<Path>) -> Self {
        Self::open(Arc::new(FileKvStore::open(path.as_ref())))
    }

    /// Identity operations.
    pub fn auth(&self) -> &IdentityStore {
        &self.auth
    }

    /// Starts a query over a named collection.
    pub fn collection(&self, name: &str) -> Query<'_> {
        self.docs.query(name)
    }

    /// Inserts a document into a named collection.
    pub async fn insert(&self, collection: &str, payload: Document) -> DocStoreResult<Document> {
        self.docs.insert(collection, payload).await
    }

    /// Blob storage shim.
    pub fn storage(&self) -> &BlobStore {
        &self.storage
    }

    /// Diagnostic analysis service.
    pub fn analysis(&self) -> &AnalysisService {
        &self.analysis
    }
}

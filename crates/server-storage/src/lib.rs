#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! The pluggable storage contract and its three backends: in-memory, file-journaled,
//! and relational (Postgres).

pub mod error;
pub mod file;
pub mod memory;
pub mod merge;
pub mod relational;
pub mod store;

pub use error::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use relational::RelationalStore;
pub use store::MetricStore;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Backend selection, mirroring the server's `-d`/`-f` precedence: a database DSN wins
/// over a file path, which wins over the in-memory default.
#[derive(Debug, Clone)]
pub enum BackendSelection {
    Memory,
    File { path: PathBuf, store_interval: Duration },
    Relational { dsn: String },
}

impl BackendSelection {
    pub fn resolve(dsn: Option<String>, file_path: Option<PathBuf>, store_interval: Duration) -> Self {
        if let Some(dsn) = dsn.filter(|s| !s.is_empty()) {
            BackendSelection::Relational { dsn }
        } else if let Some(path) = file_path {
            BackendSelection::File { path, store_interval }
        } else {
            BackendSelection::Memory
        }
    }
}

/// Constructs the selected backend, running `startup_restore` and (for the relational
/// backend) schema migrations before handing back a ready-to-use store.
pub async fn build_store(selection: BackendSelection, restore: bool) -> Result<Arc<dyn MetricStore>, StorageError> {
    match selection {
        BackendSelection::Memory => Ok(Arc::new(MemoryStore::new())),
        BackendSelection::File { path, store_interval } => {
            let store = Arc::new(FileStore::new(path, store_interval));
            if restore {
                store.startup_restore().await?;
            }
            if !store_interval.is_zero() {
                store.spawn_background_flush(store_interval);
            }
            Ok(store)
        }
        BackendSelection::Relational { dsn } => {
            let store = RelationalStore::connect(&dsn).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}

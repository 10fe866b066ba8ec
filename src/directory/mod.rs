pub mod provider;
pub mod snapshot;
pub mod traits;

pub use provider::{CachedProvider, DirectoryMode, PerRequestProvider};
pub use snapshot::DirectorySnapshot;
pub use traits::{CityDirectory, DirectoryEntry, DirectoryProvider};

use std::sync::Arc;

use crate::storage::Storage;

/// Build the provider matching the configured caching policy.
pub fn provider_for(mode: DirectoryMode, storage: Arc<dyn Storage>) -> Arc<dyn DirectoryProvider> {
    match mode {
        DirectoryMode::PerRequest => Arc::new(PerRequestProvider::new(storage)),
        DirectoryMode::Cached => Arc::new(CachedProvider::new(storage)),
    }
}

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{CityId, Route};

use super::snapshot::DirectorySnapshot;

/// A city as resolved by the directory, with its assigned route (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub city_id: CityId,

    /// Display name as stored, used in quote descriptions
    pub name: String,

    pub province: String,

    /// `None` when the city exists but has no route assigned
    pub route: Option<Route>,
}

/// Lookup from normalized city name to its directory entry.
///
/// Callers pass names already normalized with
/// [`normalize_city_name`](crate::domain::normalize_city_name).
pub trait CityDirectory: Send + Sync {
    fn find_by_normalized_name(&self, name: &str) -> Option<&DirectoryEntry>;
}

/// Source of directory snapshots for rate requests.
///
/// Implementations decide the caching policy. The rate engine only ever sees
/// the immutable snapshot.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// Get the snapshot to price the current request with.
    async fn snapshot(&self) -> anyhow::Result<Arc<DirectorySnapshot>>;

    /// Drop any cached state so the next `snapshot()` reloads from storage.
    ///
    /// Called after every route or city mutation.
    fn invalidate(&self);

    /// Short name of the caching policy, for health output.
    fn mode(&self) -> &'static str;
}

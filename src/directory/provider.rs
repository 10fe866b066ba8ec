use async_trait::async_trait;
use clap::ValueEnum;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::storage::Storage;

use super::snapshot::DirectorySnapshot;
use super::traits::DirectoryProvider;

/// Caching policy for directory snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectoryMode {
    /// Reload routes and cities from storage on every request
    #[default]
    PerRequest,
    /// Keep a snapshot in memory until an admin mutation invalidates it
    Cached,
}

impl DirectoryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryMode::PerRequest => "per-request",
            DirectoryMode::Cached => "cached",
        }
    }
}

/// Load a fresh snapshot of every route and city.
pub async fn load_snapshot(storage: &dyn Storage) -> anyhow::Result<DirectorySnapshot> {
    let (routes, cities) = tokio::try_join!(storage.list_routes(), storage.list_cities())?;
    Ok(DirectorySnapshot::build(routes, cities))
}

/// Provider that reads storage on every call.
pub struct PerRequestProvider {
    storage: Arc<dyn Storage>,
}

impl PerRequestProvider {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        PerRequestProvider { storage }
    }
}

#[async_trait]
impl DirectoryProvider for PerRequestProvider {
    async fn snapshot(&self) -> anyhow::Result<Arc<DirectorySnapshot>> {
        let snapshot = load_snapshot(self.storage.as_ref()).await?;
        Ok(Arc::new(snapshot))
    }

    fn invalidate(&self) {}

    fn mode(&self) -> &'static str {
        DirectoryMode::PerRequest.as_str()
    }
}

/// Provider that caches the last snapshot until invalidated.
pub struct CachedProvider {
    storage: Arc<dyn Storage>,
    current: RwLock<Option<Arc<DirectorySnapshot>>>,
    generation: AtomicU64,
}

impl CachedProvider {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        CachedProvider {
            storage,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether a snapshot is currently cached.
    pub fn is_warm(&self) -> bool {
        self.current.read().is_some()
    }
}

#[async_trait]
impl DirectoryProvider for CachedProvider {
    async fn snapshot(&self) -> anyhow::Result<Arc<DirectorySnapshot>> {
        let cached = self.current.read().clone();
        if let Some(snapshot) = cached {
            return Ok(snapshot);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let snapshot = Arc::new(load_snapshot(self.storage.as_ref()).await?);

        // An invalidation during the load means this snapshot may already be stale.
        let mut current = self.current.write();
        if self.generation.load(Ordering::Acquire) == generation {
            *current = Some(snapshot.clone());
            info!(
                routes = snapshot.route_count(),
                cities = snapshot.city_count(),
                "Directory snapshot cached"
            );
        } else {
            debug!("Directory invalidated while loading, not caching snapshot");
        }

        Ok(snapshot)
    }

    fn invalidate(&self) {
        let mut current = self.current.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        if current.take().is_some() {
            debug!("Directory cache invalidated");
        }
    }

    fn mode(&self) -> &'static str {
        DirectoryMode::Cached.as_str()
    }
}

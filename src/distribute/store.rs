use crate::snapshot::Snapshot;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Latest snapshot held for serve mode.
///
/// Single writer (the scheduler), many readers (HTTP handlers). A publish
/// swaps the whole `Arc`, so readers see either the previous document or the
/// new one.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, snapshot: Arc<Snapshot>) {
        *self.inner.write().await = Some(snapshot);
    }

    pub async fn latest(&self) -> Option<Arc<Snapshot>> {
        self.inner.read().await.clone()
    }

    /// Whether at least one cycle has completed.
    pub async fn has_data(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

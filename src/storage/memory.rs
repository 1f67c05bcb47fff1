// src/storage/memory.rs
use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::scoreboard::Snapshot;

/// Holds the one current snapshot. Readers clone the `Arc` and release the
/// lock straight away, so a write only ever waits for a pointer copy.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn read(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Only the refresh coordinator calls this, from inside its exclusive section.
    pub fn write(&self, snapshot: Arc<Snapshot>) {
        *self.current.write() = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scoreboard::ServerSummary;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use tokio::time::Instant;

    #[test]
    fn starts_with_the_initial_snapshot() {
        let now = Instant::now();
        let store = SnapshotStore::new(Snapshot::empty(now));
        let current = store.read();
        assert_eq!(current.expiry, now);
        assert!(current.clients.is_empty());
    }

    #[test]
    fn write_replaces_the_whole_snapshot() {
        let now = Instant::now();
        let store = SnapshotStore::new(Snapshot::empty(now));
        let before = store.read();

        let summary = ServerSummary {
            map: "complex".to_string(),
            secs_left: 300,
            ..Default::default()
        };
        let next = Arc::new(Snapshot::new(summary, BTreeMap::new(), now + Duration::from_secs(1)));
        store.write(next.clone());

        let after = store.read();
        assert!(Arc::ptr_eq(&after, &next));
        assert_eq!(after.summary.map, "complex");
        // readers holding the old snapshot keep seeing it unchanged
        assert_eq!(before.summary.map, "");
        assert_eq!(before.expiry, now);
    }
}

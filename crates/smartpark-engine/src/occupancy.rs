//! Occupancy reconciler.
//!
//! Three sources describe each slot: the sensor report, the slot document
//! in the remote store, and a local cache refreshed by a slow poll of that
//! document. The sensor wins except that a `Vacant` reading never clears a
//! slot either other source knows as `Reserved`.

use smartpark_core::SlotState;
use smartpark_store::{
    AnyStore, RemoteStore, StorePaths,
    documents::{OccupancyDocument, parse_slots},
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::status::{StatusBoard, StatusUpdate};

/// Merge rule for one slot.
///
/// ```
/// use smartpark_core::SlotState::*;
/// use smartpark_engine::occupancy::merge_slot;
///
/// assert_eq!(merge_slot(Reserved, Vacant, Vacant), Reserved);
/// assert_eq!(merge_slot(Vacant, Vacant, Occupied), Occupied);
/// ```
#[must_use]
pub fn merge_slot(remote: SlotState, cached: SlotState, hardware: SlotState) -> SlotState {
    if hardware.is_vacant() && (remote.is_reserved() || cached.is_reserved()) {
        SlotState::Reserved
    } else {
        hardware
    }
}

/// Apply [`merge_slot`] over `0..num_sensors`. Missing entries read as
/// `Vacant`, extra entries are ignored.
#[must_use]
pub fn merge_slots(
    remote: &[SlotState],
    cached: &[SlotState],
    hardware: &[SlotState],
    num_sensors: usize,
) -> Vec<SlotState> {
    let at = |slots: &[SlotState], i: usize| slots.get(i).copied().unwrap_or_default();
    (0..num_sensors)
        .map(|i| merge_slot(at(remote, i), at(cached, i), at(hardware, i)))
        .collect()
}

#[derive(Debug)]
pub struct OccupancyReconciler {
    store: AnyStore,
    paths: StorePaths,
    num_sensors: usize,
    cache: Mutex<Vec<SlotState>>,
    status: Arc<StatusBoard>,
}

impl OccupancyReconciler {
    pub fn new(
        store: AnyStore,
        paths: StorePaths,
        num_sensors: usize,
        status: Arc<StatusBoard>,
    ) -> Self {
        Self {
            store,
            paths,
            num_sensors,
            cache: Mutex::new(vec![SlotState::Vacant; num_sensors]),
            status,
        }
    }

    fn cache(&self) -> MutexGuard<'_, Vec<SlotState>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn num_sensors(&self) -> usize {
        self.num_sensors
    }

    /// Copy of the local slot cache.
    pub fn cached(&self) -> Vec<SlotState> {
        self.cache().clone()
    }

    /// Merge a sensor report with remote and cached state and publish the
    /// result. Returns the merged slots.
    ///
    /// An unreadable remote slot document counts as all vacant; the cache
    /// still protects known reservations.
    pub async fn merge_and_publish(&self, hardware: &[SlotState]) -> Vec<SlotState> {
        let slots_path = self.paths.slots();
        let remote = match self.store.get(&slots_path).await {
            Ok(doc) => parse_slots(&doc, self.num_sensors),
            Err(e) => {
                self.status
                    .warn(format!("Slot document unavailable, merging without it: {e}"));
                Vec::new()
            }
        };
        let cached = self.cached();
        let merged = merge_slots(&remote, &cached, hardware, self.num_sensors);
        debug!(?hardware, ?remote, ?cached, ?merged, "slots merged");

        self.publish(&merged).await;
        merged
    }

    async fn publish(&self, merged: &[SlotState]) {
        let document = OccupancyDocument::from_slots(merged);
        let body = match document.to_value() {
            Ok(body) => body,
            Err(e) => {
                self.status.fault(e.category(), e.to_string());
                return;
            }
        };
        match self.store.put(self.paths.occupancy(), &body).await {
            Ok(()) => {
                self.status
                    .update(StatusUpdate::new().store_reachable(true));
                self.status.info(format!(
                    "Occupancy published: {} free, {} occupied",
                    document.vacant, document.occupied
                ));
            }
            Err(e) => self
                .status
                .fault(e.category(), format!("publishing occupancy failed: {e}")),
        }
    }

    /// Replace the cache with the remote slot document.
    ///
    /// Returns the new cache, or `None` (cache kept) if the read failed.
    pub async fn refresh_cache(&self) -> Option<Vec<SlotState>> {
        match self.store.get(&self.paths.slots()).await {
            Ok(doc) => {
                let slots = parse_slots(&doc, self.num_sensors);
                *self.cache() = slots.clone();
                Some(slots)
            }
            Err(e) => {
                self.status
                    .fault(e.category(), format!("polling slot document failed: {e}"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use smartpark_core::SlotState::{Occupied, Reserved, Vacant};
    use smartpark_store::{MemoryStore, memory::RequestKind};

    #[rstest]
    #[case(Reserved, Vacant, Vacant, Reserved)]
    #[case(Vacant, Reserved, Vacant, Reserved)]
    #[case(Vacant, Vacant, Occupied, Occupied)]
    #[case(Reserved, Reserved, Occupied, Occupied)]
    #[case(Vacant, Vacant, Vacant, Vacant)]
    #[case(Occupied, Vacant, Vacant, Vacant)]
    #[case(Vacant, Vacant, Reserved, Reserved)]
    fn test_merge_slot(
        #[case] remote: SlotState,
        #[case] cached: SlotState,
        #[case] hardware: SlotState,
        #[case] expected: SlotState,
    ) {
        assert_eq!(merge_slot(remote, cached, hardware), expected);
    }

    #[test]
    fn test_merge_slots_pads_and_truncates() {
        let merged = merge_slots(&[Reserved], &[], &[Vacant, Occupied, Occupied, Vacant, Occupied], 4);
        assert_eq!(merged, vec![Reserved, Occupied, Occupied, Vacant]);
    }

    fn reconciler(store: &MemoryStore) -> (OccupancyReconciler, Arc<StatusBoard>) {
        let status = Arc::new(StatusBoard::default());
        let reconciler = OccupancyReconciler::new(
            store.clone().into(),
            StorePaths::new("Estacionamiento_inteligente"),
            4,
            Arc::clone(&status),
        );
        (reconciler, status)
    }

    #[tokio::test]
    async fn test_sensor_lag_keeps_reservation() {
        let store =
            MemoryStore::with_tree(json!({"estado": {"lugares": {"0": 0, "1": 0, "2": 2, "3": 0}}}));
        let (reconciler, _) = reconciler(&store);

        let merged = reconciler
            .merge_and_publish(&[Vacant, Occupied, Vacant, Vacant])
            .await;
        assert_eq!(merged, vec![Vacant, Occupied, Reserved, Vacant]);
        assert_eq!(
            store.document("estado"),
            json!({
                "libres": 2,
                "ocupados": 1,
                "lugares": {"0": 0, "1": 1, "2": 2, "3": 0}
            })
        );
    }

    #[tokio::test]
    async fn test_cache_protects_when_remote_unreadable() {
        let store = MemoryStore::with_tree(json!({"estado": {"lugares": [0, 0, 0, 2]}}));
        let (reconciler, _) = reconciler(&store);
        assert_eq!(
            reconciler.refresh_cache().await,
            Some(vec![Vacant, Vacant, Vacant, Reserved])
        );

        store.set_document("estado/lugares", json!("garbage"));
        let merged = reconciler.merge_and_publish(&[Vacant; 4]).await;
        assert_eq!(merged, vec![Vacant, Vacant, Vacant, Reserved]);
    }

    #[tokio::test]
    async fn test_offline_store_is_soft() {
        let store = MemoryStore::new();
        let (reconciler, status) = reconciler(&store);
        store.set_offline(true);

        let merged = reconciler.merge_and_publish(&[Occupied]).await;
        assert_eq!(merged, vec![Occupied, Vacant, Vacant, Vacant]);
        assert!(!status.snapshot().store_reachable);
        assert_eq!(store.request_count(RequestKind::Put, "estado"), 1);

        assert_eq!(reconciler.refresh_cache().await, None);
        assert_eq!(reconciler.cached(), vec![Vacant; 4]);
    }
}

//! Authorization resolver.
//!
//! Matches a canonical plate against the holders of active reservations
//! and consumes the matched reservation. The write-back filters the list
//! read in the same call; there is no compare-and-swap on the store, so a
//! concurrent external edit between the read and the write is lost.

use serde_json::json;
use smartpark_core::{Identity, Plate, constants::ARRIVED_FIELD, extract_plate_from_document};
use smartpark_store::{
    AnyStore, RemoteStore, StorePaths,
    documents::{AuthorizationRoot, ReservationList},
};
use std::sync::Arc;
use tracing::debug;

use crate::status::{StatusBoard, StatusUpdate};

#[derive(Debug)]
pub struct AuthorizationResolver {
    store: AnyStore,
    paths: StorePaths,
    status: Arc<StatusBoard>,
}

impl AuthorizationResolver {
    pub fn new(store: AnyStore, paths: StorePaths, status: Arc<StatusBoard>) -> Self {
        Self {
            store,
            paths,
            status,
        }
    }

    /// Identity holding a reservation for `plate`, if any.
    ///
    /// On a match the identity is removed from the active-reservations
    /// list. A failed removal is logged and the match still stands.
    pub async fn resolve(&self, plate: &Plate) -> Option<Identity> {
        if plate.is_empty() {
            self.status.info("Empty plate, nothing to authorize");
            return None;
        }

        let root = self.fetch_root().await?;
        let reservations = root.reservations();
        if reservations.is_empty() {
            self.status.info(format!("No active reservations for {plate}"));
            return None;
        }

        for identity in reservations.identities() {
            let Some(candidate) = self.plate_of(&root, identity).await else {
                continue;
            };
            debug!(identity = %identity, candidate = %candidate, "comparing reservation");
            if candidate == *plate {
                self.status
                    .info(format!("Plate {plate} matches reservation of {identity}"));
                self.consume(reservations, identity).await;
                return Some(identity.clone());
            }
        }

        self.status
            .info(format!("Plate {plate} has no active reservation"));
        None
    }

    /// Flag the identity as arrived. Returns `false` if the write failed.
    pub async fn mark_arrival(&self, identity: &Identity) -> bool {
        let path = self.paths.user_state(identity);
        match self.store.patch(&path, &json!({ ARRIVED_FIELD: true })).await {
            Ok(()) => {
                self.status.info(format!("Arrival recorded for {identity}"));
                true
            }
            Err(e) => {
                self.status.fault(
                    e.category(),
                    format!("recording arrival of {identity} failed: {e}"),
                );
                false
            }
        }
    }

    async fn fetch_root(&self) -> Option<AuthorizationRoot> {
        let path = self.paths.root();
        let doc = match self.store.get(path).await {
            Ok(doc) => doc,
            Err(e) => {
                self.status
                    .fault(e.category(), format!("reading reservations failed: {e}"));
                return None;
            }
        };
        match AuthorizationRoot::parse(path, doc) {
            Ok(root) => {
                self.status
                    .update(StatusUpdate::new().store_reachable(true));
                Some(root)
            }
            Err(e) => {
                self.status.fault(e.category(), e.to_string());
                self.status
                    .update(StatusUpdate::new().store_reachable(false));
                None
            }
        }
    }

    async fn plate_of(&self, root: &AuthorizationRoot, identity: &Identity) -> Option<Plate> {
        if let Some(record) = root.record(identity) {
            return Some(extract_plate_from_document(record));
        }
        match self.store.get(&self.paths.user_record(identity)).await {
            Ok(record) => Some(extract_plate_from_document(&record)),
            Err(e) => {
                self.status
                    .warn(format!("Record of {identity} unavailable: {e}"));
                None
            }
        }
    }

    async fn consume(&self, reservations: &ReservationList, identity: &Identity) {
        let remaining = reservations.without(identity);
        let path = self.paths.reservations();
        if let Err(e) = self.store.put(&path, &remaining.to_value()).await {
            self.status.fault(
                e.category(),
                format!("removing reservation of {identity} failed: {e}"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use smartpark_core::FaultCategory;
    use smartpark_store::{MemoryStore, memory::RequestKind};

    const ROOT: &str = "Estacionamiento_inteligente";

    fn resolver_over(store: &MemoryStore) -> (AuthorizationResolver, Arc<StatusBoard>) {
        let status = Arc::new(StatusBoard::default());
        let resolver = AuthorizationResolver::new(
            store.clone().into(),
            StorePaths::new(ROOT),
            Arc::clone(&status),
        );
        (resolver, status)
    }

    fn seeded() -> MemoryStore {
        MemoryStore::with_tree(json!({
            ROOT: {
                "Reservas": "[\"ana\",\"juan\"]",
                "ana": "{\"Plate\":\"AA111BB\"}",
                "juan": {"Plate": "xy 999 zz"},
            }
        }))
    }

    #[tokio::test]
    async fn test_match_consumes_reservation() {
        let store = seeded();
        let (resolver, _) = resolver_over(&store);

        let identity = resolver.resolve(&Plate::normalize("xy-999zz")).await;
        assert_eq!(identity, Some(Identity::from("juan")));
        assert_eq!(
            store.document(&format!("{ROOT}/Reservas")),
            json!("[\"ana\"]")
        );
    }

    #[tokio::test]
    async fn test_no_match_leaves_list() {
        let store = seeded();
        let (resolver, _) = resolver_over(&store);

        assert_eq!(resolver.resolve(&Plate::normalize("AB123CD")).await, None);
        assert_eq!(
            store.request_count(RequestKind::Put, &format!("{ROOT}/Reservas")),
            0
        );
    }

    #[tokio::test]
    async fn test_empty_plate_skips_store() {
        let store = seeded();
        let (resolver, _) = resolver_over(&store);

        assert_eq!(resolver.resolve(&Plate::normalize("--")).await, None);
        assert!(store.requests().is_empty());
    }

    #[tokio::test]
    async fn test_store_offline_is_no_match() {
        let store = seeded();
        store.set_offline(true);
        let (resolver, status) = resolver_over(&store);

        assert_eq!(resolver.resolve(&Plate::normalize("XY999ZZ")).await, None);
        let snapshot = status.snapshot();
        assert!(!snapshot.store_reachable);
        assert_eq!(snapshot.last_fault, Some(FaultCategory::Transport));
    }

    #[tokio::test]
    async fn test_malformed_root_is_no_match() {
        let store = MemoryStore::with_tree(json!({ ROOT: [1, 2, 3] }));
        let (resolver, status) = resolver_over(&store);

        assert_eq!(resolver.resolve(&Plate::normalize("XY999ZZ")).await, None);
        let snapshot = status.snapshot();
        assert_eq!(snapshot.last_fault, Some(FaultCategory::MalformedData));
        assert!(!snapshot.store_reachable);

        // A readable root afterwards restores the flag.
        store.set_document(ROOT, json!({"Reservas": "[]"}));
        assert_eq!(resolver.resolve(&Plate::normalize("XY999ZZ")).await, None);
        assert!(status.snapshot().store_reachable);
    }

    #[tokio::test]
    async fn test_native_list_and_legacy_record() {
        let store = MemoryStore::with_tree(json!({
            ROOT: {
                "Reservas": ["pedro", "juan"],
                "pedro": "[\"pedro\", \"kk-42-ll\"]",
                "juan": {"Patente": "XY999ZZ"},
            }
        }));
        let (resolver, _) = resolver_over(&store);

        assert_eq!(
            resolver.resolve(&Plate::normalize("KK42LL")).await,
            Some(Identity::from("pedro"))
        );
        assert_eq!(
            store.document(&format!("{ROOT}/Reservas")),
            json!(["juan"])
        );
        assert_eq!(
            resolver.resolve(&Plate::normalize("XY999ZZ")).await,
            Some(Identity::from("juan"))
        );
        assert_eq!(store.document(&format!("{ROOT}/Reservas")), json!([]));
    }

    #[tokio::test]
    async fn test_first_match_in_list_order_wins() {
        let store = MemoryStore::with_tree(json!({
            ROOT: {
                "Reservas": "[\"b\",\"a\"]",
                "a": {"Plate": "SAME1"},
                "b": {"Plate": "SAME1"},
            }
        }));
        let (resolver, _) = resolver_over(&store);

        assert_eq!(
            resolver.resolve(&Plate::normalize("same1")).await,
            Some(Identity::from("b"))
        );
        assert_eq!(store.document(&format!("{ROOT}/Reservas")), json!("[\"a\"]"));
    }

    #[tokio::test]
    async fn test_mark_arrival() {
        let store = seeded();
        let (resolver, _) = resolver_over(&store);

        assert!(resolver.mark_arrival(&Identity::from("juan")).await);
        assert_eq!(
            store.document(&format!("{ROOT}/usuarios/juan/estado/llego")),
            Value::Bool(true)
        );

        store.set_offline(true);
        assert!(!resolver.mark_arrival(&Identity::from("juan")).await);
    }
}

//! Delivery store.
//!
//! Owns the in-memory delivery collection and its persistence. Every
//! mutation reads the latest snapshot under the write lock, applies the
//! change, recomputes the full summary snapshot from scratch, publishes it
//! on the watch channel and writes the whole collection back to storage
//! (primary + backup). Write failures are logged, never retried; the
//! in-memory state remains the source of truth for the session.

use chrono::NaiveDate;
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::domain::catalog::ALL_REGIONS;
use crate::domain::{
    CreateDeliveryRequest, DeliveryRecord, DeliveryStatus, FurnitureFlags, SummarySnapshot,
    UpdateDeliveryRequest,
};
use crate::services::inventory::Baseline;
use crate::services::summary::compute_summaries;
use crate::storage::Storage;

struct Inner {
    records: Vec<DeliveryRecord>,
    next_id: u64,
}

pub struct DeliveryStore {
    inner: RwLock<Inner>,
    storage: Storage,
    summaries: watch::Sender<SummarySnapshot>,
}

impl DeliveryStore {
    /// Load the collection from storage (primary, then backup, then empty)
    /// and derive the initial summary snapshot.
    pub async fn load(storage: Storage) -> Self {
        let records = storage.load_deliveries().await;
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;

        tracing::info!(count = records.len(), "Delivery store loaded");

        let (summaries, _) = watch::channel(compute_summaries(&records, None));
        Self {
            inner: RwLock::new(Inner { records, next_id }),
            storage,
            summaries,
        }
    }

    // ---- reads -----------------------------------------------------------

    pub fn get_all(&self) -> Vec<DeliveryRecord> {
        self.inner.read().records.clone()
    }

    /// Records for one region; the "Toutes" sentinel returns the full
    /// collection.
    pub fn get_by_region(&self, region: &str) -> Vec<DeliveryRecord> {
        if region == ALL_REGIONS {
            return self.get_all();
        }
        self.inner
            .read()
            .records
            .iter()
            .filter(|r| r.region == region)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<DeliveryRecord> {
        self.inner.read().records.iter().find(|r| r.id == id).cloned()
    }

    /// Current derived summary snapshot.
    pub fn summary(&self) -> SummarySnapshot {
        self.summaries.borrow().clone()
    }

    /// Change notification channel; receivers always observe the latest
    /// snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SummarySnapshot> {
        self.summaries.subscribe()
    }

    // ---- mutations -------------------------------------------------------

    pub async fn create(&self, req: CreateDeliveryRequest) -> DeliveryRecord {
        let record = {
            let mut inner = self.inner.write();
            let record = build_record(&mut inner, req);
            inner.records.push(record.clone());
            record
        };

        tracing::info!(id = record.id, region = %record.region, "Delivery record created");
        self.after_mutation().await;
        record
    }

    /// Bulk create; ids are assigned sequentially in input order.
    pub async fn create_many(&self, requests: Vec<CreateDeliveryRequest>) -> Vec<DeliveryRecord> {
        let created = {
            let mut inner = self.inner.write();
            requests
                .into_iter()
                .map(|req| {
                    let record = build_record(&mut inner, req);
                    inner.records.push(record.clone());
                    record
                })
                .collect::<Vec<_>>()
        };

        tracing::info!(count = created.len(), "Bulk delivery records created");
        self.after_mutation().await;
        created
    }

    /// Partial update. Fields not supplied are left unchanged; the status
    /// goes through normalization whenever present. Unknown ids are a
    /// logged no-op.
    pub async fn update(&self, id: u64, req: UpdateDeliveryRequest) -> Option<DeliveryRecord> {
        let updated = {
            let mut inner = self.inner.write();
            let record = match inner.records.iter_mut().find(|r| r.id == id) {
                Some(record) => record,
                None => {
                    tracing::warn!(id, "update: no delivery record with this id");
                    return None;
                }
            };

            if let Some(region) = req.region {
                record.region = region;
            }
            if let Some(localite) = req.localite {
                record.localite = localite;
            }
            if let Some(personnel_type) = req.personnel_type {
                record.personnel_type = personnel_type;
            }
            if let Some(personnel_name) = req.personnel_name {
                record.personnel_name = personnel_name;
            }
            if let Some(date) = req.delivery_date {
                record.delivery_date = Some(date);
            }
            if let Some(status) = req.status {
                record.status = status;
            }
            if let Some(furniture) = req.furniture {
                warn_on_multiple_flags(id, &furniture);
                record.furniture = furniture;
            }
            if let Some(observation) = req.observation {
                record.observation = Some(observation);
            }

            record.clone()
        };

        self.after_mutation().await;
        Some(updated)
    }

    /// Mark a record delivered with the given date. Unknown ids are a
    /// logged no-op.
    pub async fn mark_delivered(&self, id: u64, date: NaiveDate) -> Option<DeliveryRecord> {
        let updated = {
            let mut inner = self.inner.write();
            let record = match inner.records.iter_mut().find(|r| r.id == id) {
                Some(record) => record,
                None => {
                    tracing::warn!(id, "markDelivered: no delivery record with this id");
                    return None;
                }
            };
            record.status = DeliveryStatus::Delivered;
            record.delivery_date = Some(date);
            record.clone()
        };

        self.after_mutation().await;
        Some(updated)
    }

    /// Force a record back to its freshly seeded shape: not delivered, no
    /// date, no observation, placeholder labels derived from the id.
    pub async fn reset_to_initial(&self, id: u64) -> Option<DeliveryRecord> {
        let reset = {
            let mut inner = self.inner.write();
            let record = match inner.records.iter_mut().find(|r| r.id == id) {
                Some(record) => record,
                None => {
                    tracing::warn!(id, "resetToInitial: no delivery record with this id");
                    return None;
                }
            };
            record.status = DeliveryStatus::NotDelivered;
            record.delivery_date = None;
            record.observation = None;
            record.localite = DeliveryRecord::placeholder_locality(id);
            record.personnel_name = DeliveryRecord::placeholder_personnel(id);
            record.clone()
        };

        tracing::info!(id, "Delivery record reset to initial state");
        self.after_mutation().await;
        Some(reset)
    }

    /// Delete a record. Unknown ids are a logged no-op.
    pub async fn delete(&self, id: u64) -> bool {
        let removed = {
            let mut inner = self.inner.write();
            let before = inner.records.len();
            inner.records.retain(|r| r.id != id);
            inner.records.len() != before
        };

        if !removed {
            tracing::warn!(id, "delete: no delivery record with this id");
            return false;
        }

        tracing::info!(id, "Delivery record deleted");
        self.after_mutation().await;
        true
    }

    /// Full collection for export.
    pub fn export_snapshot(&self) -> Vec<DeliveryRecord> {
        self.get_all()
    }

    /// Replace the entire collection. Records were already normalized
    /// during deserialization (status fallback, furniture map default);
    /// multi-flag records are logged here.
    pub async fn import_snapshot(&self, records: Vec<DeliveryRecord>) -> usize {
        let count = records.len();
        {
            let mut inner = self.inner.write();
            for record in &records {
                warn_on_multiple_flags(record.id, &record.furniture);
            }
            inner.next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            inner.records = records;
        }

        tracing::info!(count, "Delivery collection replaced by import");
        self.after_mutation().await;
        count
    }

    /// Empty the delivery collection. Associated confirmations are cleared
    /// by the caller via the confirmation workflow.
    pub async fn clear_all(&self) {
        {
            let mut inner = self.inner.write();
            inner.records.clear();
            inner.next_id = 1;
        }

        tracing::info!("Delivery collection cleared");
        self.after_mutation().await;
    }

    /// One-time seeding: one placeholder slot per planned furniture unit,
    /// each carrying exactly one true flag. Gated by the persisted
    /// stock-initialized flag; returns None when seeding already ran.
    pub async fn initialize_from_stock(&self, baseline: &Baseline) -> Option<usize> {
        if self.storage.stock_initialized().await {
            tracing::warn!("Stock seeding skipped: already initialized");
            return None;
        }

        let created = {
            let mut inner = self.inner.write();
            let mut created = 0usize;
            for (region, quantities) in baseline {
                for (furniture_type, quantity) in quantities {
                    for _ in 0..*quantity {
                        let id = inner.next_id;
                        inner.next_id += 1;
                        inner.records.push(DeliveryRecord {
                            id,
                            region: region.clone(),
                            localite: DeliveryRecord::placeholder_locality(id),
                            personnel_type: String::new(),
                            personnel_name: DeliveryRecord::placeholder_personnel(id),
                            delivery_date: None,
                            status: DeliveryStatus::NotDelivered,
                            furniture: FurnitureFlags::single(*furniture_type),
                            observation: None,
                        });
                        created += 1;
                    }
                }
            }
            created
        };

        if let Err(e) = self.storage.set_stock_initialized().await {
            tracing::error!(error = %e, "Failed to persist stock-initialized flag");
        }

        tracing::info!(created, "Delivery slots seeded from planned stock");
        self.after_mutation().await;
        Some(created)
    }

    /// Recompute the derived snapshot from scratch and persist the full
    /// collection. Persistence is best-effort.
    async fn after_mutation(&self) {
        let records = self.get_all();
        let mut snapshot = compute_summaries(&records, None);
        snapshot.revision = self.summaries.borrow().revision + 1;
        self.summaries.send_replace(snapshot);

        if let Err(e) = self.storage.save_deliveries(&records).await {
            tracing::error!(error = %e, "Failed to persist delivery collection");
        }
    }
}

fn build_record(inner: &mut Inner, req: CreateDeliveryRequest) -> DeliveryRecord {
    let id = inner.next_id;
    inner.next_id += 1;

    warn_on_multiple_flags(id, &req.furniture);

    DeliveryRecord {
        id,
        region: req.region,
        localite: req.localite,
        personnel_type: req.personnel_type,
        personnel_name: req.personnel_name,
        delivery_date: req.delivery_date,
        status: req.status,
        furniture: req.furniture,
        observation: req.observation,
    }
}

fn warn_on_multiple_flags(id: u64, furniture: &FurnitureFlags) {
    if furniture.count_true() > 1 {
        tracing::warn!(
            id,
            flags = furniture.count_true(),
            "Delivery record carries more than one furniture flag; per-type bookkeeping will use the first flag in catalog order"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FurnitureType;
    use std::collections::BTreeMap;

    async fn store() -> (tempfile::TempDir, DeliveryStore) {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();
        (dir, DeliveryStore::load(storage).await)
    }

    fn request(region: &str, furniture_type: FurnitureType) -> CreateDeliveryRequest {
        CreateDeliveryRequest {
            region: region.into(),
            localite: "Korhogo".into(),
            personnel_type: "CESF".into(),
            personnel_name: "A. Koné".into(),
            delivery_date: None,
            status: DeliveryStatus::NotDelivered,
            furniture: FurnitureFlags::single(furniture_type),
            observation: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let (_dir, store) = store().await;
        let a = store.create(request("PORO", FurnitureType::Bureau)).await;
        let b = store.create(request("PORO", FurnitureType::Armoire)).await;
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        let bulk = store
            .create_many(vec![
                request("NAWA", FurnitureType::Bureau),
                request("NAWA", FurnitureType::Tableau),
            ])
            .await;
        assert_eq!(bulk[0].id, 3);
        assert_eq!(bulk[1].id, 4);
    }

    #[tokio::test]
    async fn update_leaves_absent_fields_unchanged() {
        let (_dir, store) = store().await;
        let created = store.create(request("PORO", FurnitureType::Bureau)).await;

        let updated = store
            .update(
                created.id,
                UpdateDeliveryRequest {
                    observation: Some("livraison partielle".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.region, "PORO");
        assert_eq!(updated.localite, "Korhogo");
        assert_eq!(updated.observation.as_deref(), Some("livraison partielle"));
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_a_noop() {
        let (_dir, store) = store().await;
        store.create(request("PORO", FurnitureType::Bureau)).await;

        assert!(store.update(999, UpdateDeliveryRequest::default()).await.is_none());
        assert!(store.mark_delivered(999, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()).await.is_none());
        assert!(!store.delete(999).await);
        assert_eq!(store.get_all().len(), 1);
    }

    #[tokio::test]
    async fn mark_delivered_sets_status_and_date() {
        let (_dir, store) = store().await;
        let created = store.create(request("PORO", FurnitureType::Bureau)).await;

        let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let updated = store.mark_delivered(created.id, date).await.unwrap();
        assert_eq!(updated.status, DeliveryStatus::Delivered);
        assert_eq!(updated.delivery_date, Some(date));
    }

    #[tokio::test]
    async fn reset_regenerates_placeholder_labels() {
        let (_dir, store) = store().await;
        let created = store.create(request("PORO", FurnitureType::Bureau)).await;
        store
            .mark_delivered(created.id, NaiveDate::from_ymd_opt(2025, 5, 20).unwrap())
            .await;

        let reset = store.reset_to_initial(created.id).await.unwrap();
        assert_eq!(reset.status, DeliveryStatus::NotDelivered);
        assert_eq!(reset.delivery_date, None);
        assert_eq!(reset.observation, None);
        assert_eq!(reset.localite, format!("Localité {}", created.id));
        assert_eq!(reset.personnel_name, format!("Personnel {}", created.id));
        // Region and furniture flags survive a reset.
        assert_eq!(reset.region, "PORO");
        assert!(reset.furniture.is_set(FurnitureType::Bureau));
    }

    #[tokio::test]
    async fn region_filter_honors_the_sentinel() {
        let (_dir, store) = store().await;
        store.create(request("PORO", FurnitureType::Bureau)).await;
        store.create(request("NAWA", FurnitureType::Bureau)).await;

        assert_eq!(store.get_by_region("PORO").len(), 1);
        assert_eq!(store.get_by_region(ALL_REGIONS).len(), 2);
        assert_eq!(store.get_by_region("GONTOUGO").len(), 0);
    }

    #[tokio::test]
    async fn mutations_refresh_the_summary_snapshot() {
        let (_dir, store) = store().await;
        assert_eq!(store.summary().overall_progress, 0.0);

        let created = store.create(request("PORO", FurnitureType::Bureau)).await;
        let after_create = store.summary();
        assert_eq!(after_create.by_region.len(), 1);
        assert_eq!(after_create.revision, 1);

        store
            .mark_delivered(created.id, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
            .await;
        let after_deliver = store.summary();
        assert_eq!(after_deliver.overall_progress, 100.0);
        assert_eq!(after_deliver.revision, 2);
    }

    #[tokio::test]
    async fn collection_survives_a_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();

        let store = DeliveryStore::load(storage.clone()).await;
        store.create(request("PORO", FurnitureType::Bureau)).await;
        store.create(request("NAWA", FurnitureType::Armoire)).await;

        let reloaded = DeliveryStore::load(storage).await;
        assert_eq!(reloaded.get_all().len(), 2);
        // Id assignment continues after the highest persisted id.
        let next = reloaded.create(request("PORO", FurnitureType::Tableau)).await;
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn seeding_creates_one_slot_per_planned_unit_and_runs_once() {
        let (_dir, store) = store().await;
        let baseline = Baseline::from([(
            "PORO".to_string(),
            BTreeMap::from([
                (FurnitureType::Bureau, 3u32),
                (FurnitureType::Armoire, 2u32),
            ]),
        )]);

        let created = store.initialize_from_stock(&baseline).await;
        assert_eq!(created, Some(5));

        let records = store.get_all();
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.furniture.count_true() == 1));
        assert!(records.iter().all(|r| r.status == DeliveryStatus::NotDelivered));

        // Second run is gated by the persisted flag.
        assert_eq!(store.initialize_from_stock(&baseline).await, None);
        assert_eq!(store.get_all().len(), 5);
    }

    #[tokio::test]
    async fn clear_all_empties_and_restarts_ids() {
        let (_dir, store) = store().await;
        store.create(request("PORO", FurnitureType::Bureau)).await;
        store.clear_all().await;

        assert!(store.get_all().is_empty());
        let fresh = store.create(request("NAWA", FurnitureType::Bureau)).await;
        assert_eq!(fresh.id, 1);
    }
}

//! Region confirmation workflow.
//!
//! State machine per region over {Unconfirmed, Partial, Confirmed}. The
//! state is never set directly: every mutating operation funnels through
//! `save`, which restores the count invariant and re-derives the status
//! before persisting. At most one confirmation exists per region (region
//! name is the natural key).

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use parking_lot::RwLock;

use crate::domain::{
    ConfirmationStatus, ConfirmedDeliveryItem, DeliveryStatus, EquipmentTypeCount,
    FurnitureConfirmation, FurnitureType, RegionConfirmation,
};
use crate::services::store::DeliveryStore;
use crate::storage::Storage;

pub struct ConfirmationWorkflow {
    store: Arc<DeliveryStore>,
    inner: RwLock<Vec<RegionConfirmation>>,
    storage: Storage,
}

impl ConfirmationWorkflow {
    pub async fn load(storage: Storage, store: Arc<DeliveryStore>) -> Self {
        let confirmations = storage.load_confirmations().await;
        tracing::info!(count = confirmations.len(), "Region confirmations loaded");
        Self {
            store,
            inner: RwLock::new(confirmations),
            storage,
        }
    }

    // ---- reads -----------------------------------------------------------

    pub fn get(&self, region: &str) -> Option<RegionConfirmation> {
        self.inner.read().iter().find(|c| c.region == region).cloned()
    }

    pub fn get_all(&self) -> Vec<RegionConfirmation> {
        self.inner.read().clone()
    }

    pub fn is_region_confirmed(&self, region: &str) -> bool {
        self.get(region)
            .map(|c| c.status == ConfirmationStatus::Confirmed)
            .unwrap_or(false)
    }

    /// Whether a delivery record was individually confirmed, looked up via
    /// its owning region's confirmation.
    pub fn is_delivery_item_confirmed(&self, delivery_id: u64) -> bool {
        match self.store.get(delivery_id) {
            Some(record) => self
                .get(&record.region)
                .map(|c| c.has_confirmed_item(delivery_id))
                .unwrap_or(false),
            // Record gone: fall back to scanning all confirmations.
            None => self
                .inner
                .read()
                .iter()
                .any(|c| c.has_confirmed_item(delivery_id)),
        }
    }

    /// Type-level confirmed count for display, 0 when none was recorded.
    pub fn furniture_confirmation_count(&self, region: &str, furniture_type: FurnitureType) -> u32 {
        self.get(region)
            .and_then(|c| c.furniture_confirmation_count(furniture_type))
            .unwrap_or(0)
    }

    // ---- mutations -------------------------------------------------------

    /// Build a fresh, unpersisted confirmation from the region's current
    /// delivery totals. Anything already delivered is seeded as implicitly
    /// confirmed, both in the per-type counts and in the confirmed-items
    /// list, so a later item confirmation never counts the same record
    /// twice. This is a convenience starting point; nothing is stored until
    /// `save` (or another mutating operation) runs.
    pub fn generate(&self, region: &str, responsible: &str, comment: &str) -> RegionConfirmation {
        let records = self.store.get_by_region(region);

        let mut confirmation =
            RegionConfirmation::new(region, today(), responsible, comment);

        for furniture_type in FurnitureType::ALL {
            let total = records
                .iter()
                .filter(|r| r.furniture.is_set(furniture_type))
                .count() as u32;
            let confirmed = records
                .iter()
                .filter(|r| {
                    r.furniture.is_set(furniture_type) && r.status == DeliveryStatus::Delivered
                })
                .count() as u32;
            confirmation
                .equipment_received
                .details
                .insert(furniture_type, EquipmentTypeCount { total, confirmed });
        }

        for record in &records {
            if record.status == DeliveryStatus::Delivered {
                confirmation.confirmed_items.push(ConfirmedDeliveryItem {
                    delivery_id: record.id,
                    date: today(),
                    confirmed_by: responsible.to_string(),
                    comment: None,
                });
            }
        }

        confirmation.recompute_totals();
        confirmation
    }

    /// Upsert a region confirmation. The single funnel for all confirmation
    /// writes: restores the invariant, stores, persists.
    pub async fn save(&self, mut confirmation: RegionConfirmation) -> RegionConfirmation {
        confirmation.recompute_totals();

        {
            let mut inner = self.inner.write();
            match inner.iter_mut().find(|c| c.region == confirmation.region) {
                Some(existing) => *existing = confirmation.clone(),
                None => inner.push(confirmation.clone()),
            }
        }

        self.persist().await;
        confirmation
    }

    /// Confirm one delivery record. Idempotent: an id already confirmed is
    /// an informational no-op. A region confirmation is lazily generated on
    /// first use.
    pub async fn confirm_delivery_item(
        &self,
        delivery_id: u64,
        responsible: &str,
        comment: Option<&str>,
    ) -> Option<RegionConfirmation> {
        let record = match self.store.get(delivery_id) {
            Some(record) => record,
            None => {
                tracing::warn!(delivery_id, "confirmDeliveryItem: no delivery record with this id");
                return None;
            }
        };

        let (mut confirmation, lazily_generated) = match self.get(&record.region) {
            Some(confirmation) => (confirmation, false),
            None => (self.generate(&record.region, responsible, ""), true),
        };

        if confirmation.has_confirmed_item(delivery_id) {
            tracing::info!(
                delivery_id,
                region = %record.region,
                "Delivery already confirmed, nothing to do"
            );
            // A freshly generated confirmation still has to be stored.
            if lazily_generated {
                return Some(self.save(confirmation).await);
            }
            return Some(confirmation);
        }

        confirmation.confirmed_items.push(ConfirmedDeliveryItem {
            delivery_id,
            date: today(),
            confirmed_by: responsible.to_string(),
            comment: comment.map(str::to_string),
        });

        // Attribute the record to its first true flag in catalog order.
        if let Some(furniture_type) = record.furniture.primary() {
            confirmation
                .equipment_received
                .details
                .entry(furniture_type)
                .or_default()
                .confirmed += 1;
        } else {
            tracing::warn!(delivery_id, "Confirmed delivery carries no furniture flag");
        }

        tracing::info!(delivery_id, region = %record.region, "Delivery confirmed");
        Some(self.save(confirmation).await)
    }

    /// Undo an individual confirmation. Missing confirmation or missing
    /// item is a logged no-op.
    pub async fn unconfirm_delivery_item(
        &self,
        delivery_id: u64,
        region: &str,
    ) -> Option<RegionConfirmation> {
        let mut confirmation = match self.get(region) {
            Some(confirmation) => confirmation,
            None => {
                tracing::warn!(region, "unconfirmDeliveryItem: region has no confirmation");
                return None;
            }
        };

        if !confirmation.has_confirmed_item(delivery_id) {
            tracing::warn!(
                delivery_id,
                region,
                "unconfirmDeliveryItem: delivery was never confirmed"
            );
            return None;
        }

        // Cross-check the owning record when it still exists.
        if let Some(record) = self.store.get(delivery_id) {
            if record.region != region {
                tracing::warn!(
                    delivery_id,
                    requested = region,
                    actual = %record.region,
                    "unconfirmDeliveryItem: region mismatch"
                );
                return None;
            }
            if let Some(furniture_type) = record.furniture.primary() {
                if let Some(detail) = confirmation
                    .equipment_received
                    .details
                    .get_mut(&furniture_type)
                {
                    detail.confirmed = detail.confirmed.saturating_sub(1);
                }
            }
        }

        confirmation
            .confirmed_items
            .retain(|i| i.delivery_id != delivery_id);

        tracing::info!(delivery_id, region, "Delivery confirmation removed");
        Some(self.save(confirmation).await)
    }

    /// Set (not increment) the confirmed count for a furniture type. The
    /// caller validates the count against [0, planned] at the boundary;
    /// this path trusts its input. The region total is recomputed from the
    /// per-type details, superseding any items-based tally.
    pub async fn confirm_furniture_type(
        &self,
        region: &str,
        furniture_type: FurnitureType,
        confirmed_count: u32,
        responsible: &str,
        comment: Option<&str>,
    ) -> RegionConfirmation {
        let mut confirmation = self
            .get(region)
            .unwrap_or_else(|| self.generate(region, responsible, ""));

        let entry = FurnitureConfirmation {
            furniture_type,
            confirmed_count,
            date: today(),
            confirmed_by: responsible.to_string(),
            comment: comment.map(str::to_string),
        };

        let confirmations = confirmation.furniture_confirmations.get_or_insert_with(Vec::new);
        match confirmations
            .iter_mut()
            .find(|c| c.furniture_type == furniture_type)
        {
            Some(existing) => *existing = entry,
            None => confirmations.push(entry),
        }

        confirmation
            .equipment_received
            .details
            .entry(furniture_type)
            .or_default()
            .confirmed = confirmed_count;

        confirmation.date = today();
        confirmation.responsible = responsible.to_string();

        tracing::info!(
            region,
            furniture_type = %furniture_type,
            confirmed_count,
            "Furniture type confirmation recorded"
        );
        self.save(confirmation).await
    }

    pub async fn clear_all(&self) {
        self.inner.write().clear();
        if let Err(e) = self.storage.clear_confirmations().await {
            tracing::error!(error = %e, "Failed to clear confirmation collection");
        }
        tracing::info!("Region confirmations cleared");
    }

    async fn persist(&self) {
        let confirmations = self.get_all();
        if let Err(e) = self.storage.save_confirmations(&confirmations).await {
            tracing::error!(error = %e, "Failed to persist confirmation collection");
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CreateDeliveryRequest, FurnitureFlags};

    async fn setup() -> (tempfile::TempDir, Arc<DeliveryStore>, ConfirmationWorkflow) {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();
        let store = Arc::new(DeliveryStore::load(storage.clone()).await);
        let workflow = ConfirmationWorkflow::load(storage, Arc::clone(&store)).await;
        (dir, store, workflow)
    }

    fn request(region: &str, status: DeliveryStatus, furniture_type: FurnitureType) -> CreateDeliveryRequest {
        CreateDeliveryRequest {
            region: region.into(),
            localite: "L".into(),
            personnel_type: "CESF".into(),
            personnel_name: "P".into(),
            delivery_date: None,
            status,
            furniture: FurnitureFlags::single(furniture_type),
            observation: None,
        }
    }

    #[tokio::test]
    async fn generate_seeds_delivered_records_as_confirmed() {
        let (_dir, store, workflow) = setup().await;
        store
            .create(request("PORO", DeliveryStatus::Delivered, FurnitureType::Bureau))
            .await;
        store
            .create(request("PORO", DeliveryStatus::NotDelivered, FurnitureType::Bureau))
            .await;

        let generated = workflow.generate("PORO", "Jean", "");
        let bureau = generated.equipment_received.details[&FurnitureType::Bureau];
        assert_eq!(bureau.total, 2);
        assert_eq!(bureau.confirmed, 1);
        assert_eq!(generated.status, ConfirmationStatus::Partial);
        // The delivered record is also listed as an individually confirmed
        // item, matching the seeded per-type count.
        assert_eq!(generated.confirmed_items.len(), 1);

        // Convenience only: nothing persisted until an explicit save.
        assert!(workflow.get("PORO").is_none());
    }

    #[tokio::test]
    async fn confirming_a_delivered_record_counts_it_once() {
        let (_dir, store, workflow) = setup().await;
        let record = store
            .create(request("PORO", DeliveryStatus::Delivered, FurnitureType::Bureau))
            .await;

        // No prior confirmation for the region: one is generated on the fly
        // with the delivered record already seeded as confirmed. The same
        // record must not be counted a second time.
        let confirmation = workflow
            .confirm_delivery_item(record.id, "Jean", None)
            .await
            .unwrap();

        let bureau = confirmation.equipment_received.details[&FurnitureType::Bureau];
        assert_eq!(bureau.total, 1);
        assert_eq!(bureau.confirmed, 1);
        assert_eq!(confirmation.equipment_received.percentage, 100);
        assert_eq!(confirmation.status, ConfirmationStatus::Confirmed);
        assert_eq!(confirmation.confirmed_items.len(), 1);

        // And the lazily generated confirmation was stored.
        let stored = workflow.get("PORO").unwrap();
        assert!(stored.has_confirmed_item(record.id));
        assert_eq!(stored.equipment_received.confirmed, 1);
    }

    #[tokio::test]
    async fn confirm_delivery_item_is_idempotent() {
        let (_dir, store, workflow) = setup().await;
        let record = store
            .create(request("PORO", DeliveryStatus::Delivered, FurnitureType::Bureau))
            .await;

        let first = workflow
            .confirm_delivery_item(record.id, "Jean", None)
            .await
            .unwrap();
        let confirmed_after_first = first.equipment_received.confirmed;

        let second = workflow
            .confirm_delivery_item(record.id, "Jean", None)
            .await
            .unwrap();
        assert_eq!(second.equipment_received.confirmed, confirmed_after_first);
        assert_eq!(second.confirmed_items.len(), 1);
        assert!(workflow.is_delivery_item_confirmed(record.id));
    }

    #[tokio::test]
    async fn confirm_unknown_delivery_is_a_noop() {
        let (_dir, _store, workflow) = setup().await;
        assert!(workflow.confirm_delivery_item(42, "Jean", None).await.is_none());
        assert!(workflow.get_all().is_empty());
    }

    #[tokio::test]
    async fn unconfirm_reverses_an_item_confirmation() {
        let (_dir, store, workflow) = setup().await;
        let record = store
            .create(request("PORO", DeliveryStatus::NotDelivered, FurnitureType::Bureau))
            .await;

        let confirmed = workflow
            .confirm_delivery_item(record.id, "Jean", Some("vérifié"))
            .await
            .unwrap();
        assert!(confirmed.has_confirmed_item(record.id));

        let unconfirmed = workflow
            .unconfirm_delivery_item(record.id, "PORO")
            .await
            .unwrap();
        assert!(!unconfirmed.has_confirmed_item(record.id));
        assert_eq!(
            unconfirmed.equipment_received.details[&FurnitureType::Bureau].confirmed,
            0
        );
    }

    #[tokio::test]
    async fn unconfirm_of_never_confirmed_id_changes_nothing() {
        let (_dir, store, workflow) = setup().await;
        let record = store
            .create(request("PORO", DeliveryStatus::Delivered, FurnitureType::Bureau))
            .await;
        workflow.confirm_delivery_item(record.id, "Jean", None).await;
        let before = workflow.get("PORO").unwrap();

        assert!(workflow.unconfirm_delivery_item(9999, "PORO").await.is_none());
        assert_eq!(workflow.get("PORO").unwrap(), before);

        // No confirmation at all for the region: also a silent no-op.
        assert!(workflow.unconfirm_delivery_item(record.id, "NAWA").await.is_none());
    }

    #[tokio::test]
    async fn confirm_furniture_type_overwrites_the_count() {
        let (_dir, store, workflow) = setup().await;
        for _ in 0..23 {
            store
                .create(request("PORO", DeliveryStatus::NotDelivered, FurnitureType::Bureau))
                .await;
        }

        let first = workflow
            .confirm_furniture_type("PORO", FurnitureType::Bureau, 10, "Jean", None)
            .await;
        assert_eq!(
            first.equipment_received.details[&FurnitureType::Bureau].confirmed,
            10
        );

        let second = workflow
            .confirm_furniture_type("PORO", FurnitureType::Bureau, 15, "Jean", None)
            .await;
        assert_eq!(
            second.equipment_received.details[&FurnitureType::Bureau].confirmed,
            15
        );
        assert_eq!(second.equipment_received.confirmed, 15);
        assert_eq!(
            workflow.furniture_confirmation_count("PORO", FurnitureType::Bureau),
            15
        );
        assert_eq!(second.furniture_confirmations.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn region_becomes_confirmed_only_when_all_items_are() {
        let (_dir, store, workflow) = setup().await;
        let a = store
            .create(request("PORO", DeliveryStatus::NotDelivered, FurnitureType::Bureau))
            .await;
        let b = store
            .create(request("PORO", DeliveryStatus::NotDelivered, FurnitureType::Bureau))
            .await;

        let partial = workflow.confirm_delivery_item(a.id, "Jean", None).await.unwrap();
        assert_eq!(partial.status, ConfirmationStatus::Partial);
        assert!(!workflow.is_region_confirmed("PORO"));

        let full = workflow.confirm_delivery_item(b.id, "Jean", None).await.unwrap();
        assert_eq!(full.status, ConfirmationStatus::Confirmed);
        assert!(workflow.is_region_confirmed("PORO"));

        let reverted = workflow
            .unconfirm_delivery_item(b.id, "PORO")
            .await
            .unwrap();
        assert_eq!(reverted.status, ConfirmationStatus::Partial);
    }

    #[tokio::test]
    async fn confirmations_survive_a_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).await.unwrap();
        let store = Arc::new(DeliveryStore::load(storage.clone()).await);
        let workflow = ConfirmationWorkflow::load(storage.clone(), Arc::clone(&store)).await;

        workflow
            .confirm_furniture_type("PORO", FurnitureType::Bureau, 4, "Jean", None)
            .await;

        let reloaded = ConfirmationWorkflow::load(storage, store).await;
        assert_eq!(
            reloaded.furniture_confirmation_count("PORO", FurnitureType::Bureau),
            4
        );
    }
}

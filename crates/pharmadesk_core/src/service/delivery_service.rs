//! Deliveries tracked against purchase orders.
//!
//! # Invariants
//! - Stage follows the payment and delivery status updates:
//!   payment `PAID` -> stage `PAID`, any other payment status -> `CONFIRMED`;
//!   delivery `DELIVERED` -> stage `DELIVERED` with a completion date,
//!   any other delivery status -> stage `PAID` with the date cleared.

use crate::model::purchase::{Delivery, DeliveryDraft, DeliveryStage, DeliveryStatus, PaymentStatus};
use crate::service::clock::{Clock, SystemClock};
use crate::service::{load_all, update_one, Collection, ServiceResult, StoredRecord};
use crate::store::{KeyValueStore, PURCHASE_DELIVERIES_KEY};
use log::info;

impl StoredRecord for Delivery {
    const KIND: &'static str = "delivery";

    fn id(&self) -> &str {
        &self.id
    }
}

pub struct DeliveryService<S: KeyValueStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore> DeliveryService<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> DeliveryService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn create_delivery(&self, draft: DeliveryDraft) -> ServiceResult<Delivery> {
        let mut deliveries: Collection<Delivery> =
            Collection::load(&self.store, PURCHASE_DELIVERIES_KEY)?;
        let id = deliveries.new_id(draft.id.as_deref(), "DLV", &self.clock)?;
        let delivery = Delivery {
            id,
            created_at: self.clock.now(),
            stage: draft.stage.unwrap_or(DeliveryStage::Created),
            order_id: draft.order_id,
            supplier: draft.supplier,
            amount: draft.amount,
            payment_status: None,
            delivery_status: None,
            completed_date: None,
            extra: Default::default(),
        };
        deliveries.push(delivery.clone());
        deliveries.save(&self.store)?;
        info!(
            "event=delivery_create module=service status=ok delivery_id={} stage={}",
            delivery.id, delivery.stage
        );
        Ok(delivery)
    }

    pub fn list_deliveries(&self) -> ServiceResult<Vec<Delivery>> {
        load_all(&self.store, PURCHASE_DELIVERIES_KEY)
    }

    pub fn deliveries_for_order(&self, order_id: &str) -> ServiceResult<Vec<Delivery>> {
        Ok(self
            .list_deliveries()?
            .into_iter()
            .filter(|delivery| delivery.order_id.as_deref() == Some(order_id))
            .collect())
    }

    pub fn update_stage(&self, id: &str, stage: DeliveryStage) -> ServiceResult<Delivery> {
        self.update(id, "stage", |delivery| delivery.stage = stage)
    }

    pub fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> ServiceResult<Delivery> {
        self.update(id, "payment", |delivery| {
            delivery.payment_status = Some(status);
            delivery.stage = match status {
                PaymentStatus::Paid => DeliveryStage::Paid,
                PaymentStatus::Pending => DeliveryStage::Confirmed,
            };
        })
    }

    pub fn update_delivery_status(
        &self,
        id: &str,
        status: DeliveryStatus,
    ) -> ServiceResult<Delivery> {
        let now = self.clock.now();
        self.update(id, "delivery", |delivery| {
            delivery.delivery_status = Some(status);
            if status == DeliveryStatus::Delivered {
                delivery.stage = DeliveryStage::Delivered;
                delivery.completed_date = Some(now);
            } else {
                delivery.stage = DeliveryStage::Paid;
                delivery.completed_date = None;
            }
        })
    }

    fn update<F>(&self, id: &str, field: &'static str, apply: F) -> ServiceResult<Delivery>
    where
        F: FnOnce(&mut Delivery),
    {
        let delivery = update_one(&self.store, PURCHASE_DELIVERIES_KEY, id, |delivery: &mut Delivery| {
            apply(delivery);
            Ok(())
        })?;
        info!(
            "event=delivery_update module=service status=ok delivery_id={} field={} stage={}",
            delivery.id, field, delivery.stage
        );
        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::DeliveryService;
    use crate::model::purchase::{DeliveryDraft, DeliveryStage, DeliveryStatus, PaymentStatus};
    use crate::service::clock::FixedClock;
    use crate::service::ServiceError;
    use crate::store::MemoryKeyValueStore;
    use chrono::{TimeZone, Utc};

    fn service(store: &MemoryKeyValueStore) -> DeliveryService<&MemoryKeyValueStore, FixedClock> {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 2, 14, 0, 0).unwrap());
        DeliveryService::with_clock(store, clock)
    }

    #[test]
    fn create_defaults_to_created_stage() {
        let store = MemoryKeyValueStore::unbounded();
        let delivery = service(&store)
            .create_delivery(DeliveryDraft {
                order_id: Some("PO-1".to_string()),
                ..DeliveryDraft::default()
            })
            .expect("create");
        assert!(delivery.id.starts_with("DLV-"));
        assert_eq!(delivery.stage, DeliveryStage::Created);
    }

    #[test]
    fn payment_status_drives_stage() {
        let store = MemoryKeyValueStore::unbounded();
        let service = service(&store);
        let delivery = service
            .create_delivery(DeliveryDraft::default())
            .expect("create");
        let paid = service
            .update_payment_status(&delivery.id, PaymentStatus::Paid)
            .expect("paid");
        assert_eq!(paid.stage, DeliveryStage::Paid);
        let pending = service
            .update_payment_status(&delivery.id, PaymentStatus::Pending)
            .expect("pending");
        assert_eq!(pending.stage, DeliveryStage::Confirmed);
    }

    #[test]
    fn delivery_status_sets_and_clears_completion() {
        let store = MemoryKeyValueStore::unbounded();
        let service = service(&store);
        let delivery = service
            .create_delivery(DeliveryDraft::default())
            .expect("create");
        let done = service
            .update_delivery_status(&delivery.id, DeliveryStatus::Delivered)
            .expect("delivered");
        assert_eq!(done.stage, DeliveryStage::Delivered);
        assert!(done.completed_date.is_some());

        let reopened = service
            .update_delivery_status(&delivery.id, DeliveryStatus::Shipped)
            .expect("shipped");
        assert_eq!(reopened.stage, DeliveryStage::Paid);
        assert_eq!(reopened.completed_date, None);
        assert_eq!(service.list_deliveries().expect("list").len(), 1);
    }

    #[test]
    fn explicit_id_must_be_unused() {
        let store = MemoryKeyValueStore::unbounded();
        let service = service(&store);
        let draft = DeliveryDraft {
            id: Some("DLV-7".to_string()),
            ..DeliveryDraft::default()
        };
        service.create_delivery(draft.clone()).expect("first");
        assert!(matches!(
            service.create_delivery(draft),
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(service.list_deliveries().expect("list").len(), 1);
    }
}

//! Supplier bills raised for purchase orders.

use crate::model::purchase::{BillDraft, BillStatus, SupplierBill};
use crate::service::clock::{Clock, SystemClock};
use crate::service::{
    load_all, update_one, Collection, ServiceError, ServiceResult, StoredRecord,
};
use crate::store::{KeyValueStore, PURCHASE_BILLS_KEY};
use log::info;

impl StoredRecord for SupplierBill {
    const KIND: &'static str = "bill";

    fn id(&self) -> &str {
        &self.id
    }
}

pub struct BillService<S: KeyValueStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore> BillService<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> BillService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Stores a bill; status defaults to `PENDING`.
    pub fn create_bill(&self, draft: BillDraft) -> ServiceResult<SupplierBill> {
        if !(draft.amount.is_finite() && draft.amount >= 0.0) {
            return Err(ServiceError::Validation(
                "bill amount cannot be negative".to_string(),
            ));
        }
        let mut bills: Collection<SupplierBill> = Collection::load(&self.store, PURCHASE_BILLS_KEY)?;
        let id = bills.new_id(draft.id.as_deref(), "BILL", &self.clock)?;
        let bill = SupplierBill {
            id,
            created_at: self.clock.now(),
            status: draft.status.unwrap_or(BillStatus::Pending),
            order_id: draft.order_id,
            supplier: draft.supplier,
            amount: draft.amount,
            due_date: draft.due_date,
            extra: Default::default(),
        };
        bills.push(bill.clone());
        bills.save(&self.store)?;
        info!(
            "event=bill_create module=service status=ok bill_id={} bill_status={}",
            bill.id, bill.status
        );
        Ok(bill)
    }

    pub fn list_bills(&self) -> ServiceResult<Vec<SupplierBill>> {
        load_all(&self.store, PURCHASE_BILLS_KEY)
    }

    pub fn update_bill_status(&self, id: &str, status: BillStatus) -> ServiceResult<SupplierBill> {
        let bill = update_one(&self.store, PURCHASE_BILLS_KEY, id, |bill: &mut SupplierBill| {
            bill.status = status;
            Ok(())
        })?;
        info!(
            "event=bill_status module=service status=ok bill_id={} bill_status={}",
            bill.id, bill.status
        );
        Ok(bill)
    }

    /// First bill raised for `order_id`, if any.
    pub fn bill_for_order(&self, order_id: &str) -> ServiceResult<Option<SupplierBill>> {
        Ok(self
            .list_bills()?
            .into_iter()
            .find(|bill| bill.order_id.as_deref() == Some(order_id)))
    }

    /// Bills past their due date that are still pending, as of `today`.
    pub fn overdue_bills(&self) -> ServiceResult<Vec<SupplierBill>> {
        let today = self.clock.today();
        Ok(self
            .list_bills()?
            .into_iter()
            .filter(|bill| {
                bill.status == BillStatus::Pending
                    && bill.due_date.is_some_and(|due| due < today)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::BillService;
    use crate::model::purchase::{BillDraft, BillStatus};
    use crate::service::clock::FixedClock;
    use crate::store::MemoryKeyValueStore;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn service(store: &MemoryKeyValueStore) -> BillService<&MemoryKeyValueStore, FixedClock> {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap());
        BillService::with_clock(store, clock)
    }

    #[test]
    fn bills_default_to_pending_and_resolve_by_order() {
        let store = MemoryKeyValueStore::unbounded();
        let service = service(&store);
        let bill = service
            .create_bill(BillDraft {
                order_id: Some("PO-7".to_string()),
                supplier: Some("MedSupply Co".to_string()),
                amount: 1250.0,
                ..BillDraft::default()
            })
            .expect("create");
        assert!(bill.id.starts_with("BILL-"));
        assert_eq!(bill.status, BillStatus::Pending);

        let found = service.bill_for_order("PO-7").expect("lookup");
        assert_eq!(found.map(|bill| bill.id), Some(bill.id.clone()));
        assert_eq!(service.bill_for_order("PO-8").expect("lookup"), None);

        let paid = service
            .update_bill_status(&bill.id, BillStatus::Paid)
            .expect("pay");
        assert_eq!(paid.status, BillStatus::Paid);
    }

    #[test]
    fn overdue_only_counts_pending_bills_past_due() {
        let store = MemoryKeyValueStore::unbounded();
        let service = service(&store);
        let due = NaiveDate::from_ymd_opt(2024, 3, 1);
        service
            .create_bill(BillDraft {
                amount: 10.0,
                due_date: due,
                ..BillDraft::default()
            })
            .expect("overdue");
        service
            .create_bill(BillDraft {
                amount: 10.0,
                due_date: due,
                status: Some(BillStatus::Paid),
                ..BillDraft::default()
            })
            .expect("paid");
        assert_eq!(service.overdue_bills().expect("overdue").len(), 1);
    }

    #[test]
    fn explicit_id_must_be_unused() {
        let store = MemoryKeyValueStore::unbounded();
        let service = service(&store);
        let draft = BillDraft {
            id: Some("BILL-1".to_string()),
            amount: 5.0,
            ..BillDraft::default()
        };
        service.create_bill(draft.clone()).expect("first");
        let err = service.create_bill(draft).expect_err("duplicate");
        assert_eq!(err.to_string(), "bill `BILL-1` already exists");
    }

    #[test]
    fn negative_amount_is_rejected() {
        let store = MemoryKeyValueStore::unbounded();
        let draft = BillDraft {
            amount: -1.0,
            ..BillDraft::default()
        };
        assert!(service(&store).create_bill(draft).is_err());
    }
}

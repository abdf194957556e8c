//! Purchase orders placed by the owner and answered by suppliers.
//!
//! # Responsibility
//! - Persist orders under `purchase_orders_v1` while the backend has no
//!   purchase endpoints.
//! - Enforce the order pipeline:
//!   `PENDING -> ACCEPTED|REJECTED`, `ACCEPTED -> PAID -> SHIPPED -> DELIVERED`.
//!
//! # Invariants
//! - Supplier responses apply only to `PENDING` orders.
//! - Payment applies only to `ACCEPTED` orders; card details are never stored.
//! - Reaching `DELIVERED` stamps `delivered_at`.

use crate::model::purchase::{
    OrderDraft, OrderStatus, PaymentRecord, PurchaseOrder, SupplierResponse,
};
use crate::service::clock::{Clock, SystemClock};
use crate::service::{
    load_all, update_one, Collection, ServiceError, ServiceResult, StoredRecord,
};
use crate::store::{KeyValueStore, PURCHASE_DELIVERIES_KEY, PURCHASE_ORDERS_KEY};
use log::info;
use serde::Serialize;

impl StoredRecord for PurchaseOrder {
    const KIND: &'static str = "order";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Steps shown by the order tracker, in pipeline order.
pub const TRACKER_STEPS: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Accepted,
    OrderStatus::Paid,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressStep {
    pub status: OrderStatus,
    pub completed: bool,
    pub current: bool,
}

/// Tracker state for an order in `status`.
///
/// A rejected order only completes `PENDING` and has no current step.
pub fn status_progress(status: OrderStatus) -> Vec<ProgressStep> {
    let reached = TRACKER_STEPS.iter().position(|step| *step == status);
    TRACKER_STEPS
        .iter()
        .enumerate()
        .map(|(index, step)| ProgressStep {
            status: *step,
            completed: match reached {
                Some(position) => index <= position,
                None => index == 0,
            },
            current: reached == Some(index),
        })
        .collect()
}

pub struct PurchaseService<S: KeyValueStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore> PurchaseService<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> PurchaseService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Validates and stores a new order.
    ///
    /// # Contract
    /// - `id` defaults to `PO-<epoch_ms>`; an explicit id must be unused.
    /// - `status` defaults to `PENDING`.
    /// - `total` defaults to the sum of item line totals.
    pub fn create_order(&self, draft: OrderDraft) -> ServiceResult<PurchaseOrder> {
        validate_draft(&draft)?;
        let mut orders: Collection<PurchaseOrder> =
            Collection::load(&self.store, PURCHASE_ORDERS_KEY)?;
        let id = orders.new_id(draft.id.as_deref(), "PO", &self.clock)?;

        let total = draft.total.unwrap_or_else(|| draft.items_total());
        let order = PurchaseOrder {
            id,
            created_at: self.clock.now(),
            status: draft.status.unwrap_or(OrderStatus::Pending),
            supplier_response: None,
            delivered_at: None,
            payment: None,
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            customer_email: draft.customer_email,
            delivery_address: draft.delivery_address,
            notes: draft.notes,
            items: draft.items,
            total,
            extra: Default::default(),
        };
        orders.push(order.clone());
        orders.save(&self.store)?;

        info!(
            "event=order_create module=service status=ok order_id={} items={} total={:.2}",
            order.id,
            order.items.len(),
            order.total
        );
        Ok(order)
    }

    pub fn list_orders(&self) -> ServiceResult<Vec<PurchaseOrder>> {
        load_all(&self.store, PURCHASE_ORDERS_KEY)
    }

    pub fn get_order(&self, id: &str) -> ServiceResult<PurchaseOrder> {
        self.list_orders()?
            .into_iter()
            .find(|order| order.id == id)
            .ok_or_else(|| ServiceError::NotFound {
                kind: PurchaseOrder::KIND,
                id: id.to_string(),
            })
    }

    /// Sets `status` without pipeline checks.
    pub fn update_order_status(&self, id: &str, status: OrderStatus) -> ServiceResult<PurchaseOrder> {
        let now = self.clock.now();
        let order = update_one(&self.store, PURCHASE_ORDERS_KEY, id, |order: &mut PurchaseOrder| {
            order.status = status;
            if status == OrderStatus::Delivered {
                order.delivered_at = Some(now);
            }
            Ok(())
        })?;
        info!(
            "event=order_status module=service status=ok order_id={} order_status={}",
            order.id, order.status
        );
        Ok(order)
    }

    pub fn delivered_orders(&self) -> ServiceResult<Vec<PurchaseOrder>> {
        Ok(self
            .list_orders()?
            .into_iter()
            .filter(|order| order.status == OrderStatus::Delivered)
            .collect())
    }

    pub fn active_orders(&self) -> ServiceResult<Vec<PurchaseOrder>> {
        Ok(self
            .list_orders()?
            .into_iter()
            .filter(|order| order.status.is_active())
            .collect())
    }

    /// Orders waiting for a supplier answer.
    pub fn pending_orders(&self) -> ServiceResult<Vec<PurchaseOrder>> {
        Ok(self
            .list_orders()?
            .into_iter()
            .filter(|order| order.status == OrderStatus::Pending)
            .collect())
    }

    pub fn respond_to_order(
        &self,
        id: &str,
        response: SupplierResponse,
    ) -> ServiceResult<PurchaseOrder> {
        let order = self.transition(id, OrderStatus::Pending, "respond to", |order| {
            order.status = match response {
                SupplierResponse::Accepted => OrderStatus::Accepted,
                SupplierResponse::Rejected => OrderStatus::Rejected,
            };
            order.supplier_response = Some(response);
        })?;
        info!(
            "event=order_respond module=service status=ok order_id={} response={}",
            order.id, response
        );
        Ok(order)
    }

    /// Records a payment against an accepted order.
    pub fn process_payment(&self, payment: PaymentRecord) -> ServiceResult<PurchaseOrder> {
        if !(payment.amount.is_finite() && payment.amount > 0.0) {
            return Err(ServiceError::Validation(
                "payment amount must be positive".to_string(),
            ));
        }
        let order_id = payment.order_id.clone();
        let order = self.transition(&order_id, OrderStatus::Accepted, "pay", move |order| {
            order.status = OrderStatus::Paid;
            order.payment = Some(payment);
        })?;
        info!(
            "event=order_pay module=service status=ok order_id={}",
            order.id
        );
        Ok(order)
    }

    /// Supplier marks a paid order as shipped.
    pub fn ship_order(&self, id: &str) -> ServiceResult<PurchaseOrder> {
        self.transition(id, OrderStatus::Paid, "ship", |order| {
            order.status = OrderStatus::Shipped;
        })
    }

    /// Supplier marks a shipped order as delivered.
    pub fn mark_delivered(&self, id: &str) -> ServiceResult<PurchaseOrder> {
        let now = self.clock.now();
        self.transition(id, OrderStatus::Shipped, "deliver", move |order| {
            order.status = OrderStatus::Delivered;
            order.delivered_at = Some(now);
        })
    }

    /// Drops every stored order and delivery.
    pub fn clear_all(&self) -> ServiceResult<()> {
        self.store.remove(PURCHASE_ORDERS_KEY)?;
        self.store.remove(PURCHASE_DELIVERIES_KEY)?;
        info!("event=order_clear module=service status=ok");
        Ok(())
    }

    fn transition<F>(
        &self,
        id: &str,
        required: OrderStatus,
        action: &'static str,
        apply: F,
    ) -> ServiceResult<PurchaseOrder>
    where
        F: FnOnce(&mut PurchaseOrder),
    {
        update_one(&self.store, PURCHASE_ORDERS_KEY, id, |order: &mut PurchaseOrder| {
            if order.status != required {
                return Err(ServiceError::InvalidTransition {
                    id: order.id.clone(),
                    from: order.status.to_string(),
                    action,
                });
            }
            apply(order);
            Ok(())
        })
    }
}

fn validate_draft(draft: &OrderDraft) -> ServiceResult<()> {
    if draft.items.is_empty() {
        return Err(ServiceError::Validation(
            "order needs at least one item".to_string(),
        ));
    }
    for item in &draft.items {
        if item.name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "every item needs a medicine name".to_string(),
            ));
        }
        if item.quantity == 0 {
            return Err(ServiceError::Validation(format!(
                "quantity for `{}` must be at least 1",
                item.name
            )));
        }
        if !(item.price.is_finite() && item.price >= 0.0) {
            return Err(ServiceError::Validation(format!(
                "price for `{}` cannot be negative",
                item.name
            )));
        }
    }
    Ok(())
}

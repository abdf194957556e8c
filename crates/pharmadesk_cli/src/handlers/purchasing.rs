//! Purchase orders, deliveries and supplier bills over the local store.

use super::parse_order_item;
use crate::app::App;
use crate::commands::{BillCommand, DeliveryCommand, OrderCommand, OrderFilter, ResponseArg};
use anyhow::{Error, Result};
use pharmadesk_core::access::permission::Permission;
use pharmadesk_core::access::route::Route;
use pharmadesk_core::model::purchase::{
    BillDraft, BillStatus, DeliveryDraft, DeliveryStage, DeliveryStatus, OrderDraft,
    PaymentRecord, PaymentStatus, SupplierResponse,
};
use pharmadesk_core::service::bill_service::BillService;
use pharmadesk_core::service::delivery_service::DeliveryService;
use pharmadesk_core::service::purchase_service::{status_progress, PurchaseService};
use serde_json::json;

/// Pages from which either side of the pipeline can read orders.
const ORDER_VIEW_ROUTES: &[Route] = &[
    Route::PurchaseHistory,
    Route::SupplierOrders,
    Route::SupplierOrderHistory,
];

pub(crate) fn orders(app: &App<'_>, command: OrderCommand) -> Result<()> {
    let orders = PurchaseService::new(app.store);
    match command {
        OrderCommand::Create {
            items,
            customer_name,
            customer_phone,
            customer_email,
            delivery_address,
            notes,
        } => {
            app.require_route(Route::PurchaseCreate)?;
            app.require_permission(Permission::CreatePurchaseOrder)?;
            let items = items
                .iter()
                .map(|raw| parse_order_item(raw))
                .collect::<Result<Vec<_>>>()?;
            let order = orders.create_order(OrderDraft {
                customer_name,
                customer_phone,
                customer_email,
                delivery_address,
                notes,
                items,
                ..OrderDraft::default()
            })?;
            app.emit_value(&order)
        }
        OrderCommand::List { filter } => {
            app.require_any_route(ORDER_VIEW_ROUTES)?;
            let list = match filter {
                OrderFilter::All => orders.list_orders()?,
                OrderFilter::Active => orders.active_orders()?,
                OrderFilter::Pending => orders.pending_orders()?,
                OrderFilter::Delivered => orders.delivered_orders()?,
            };
            app.emit_value(&list)
        }
        OrderCommand::Show { id } => {
            app.require_any_route(ORDER_VIEW_ROUTES)?;
            app.emit_value(&orders.get_order(&id)?)
        }
        OrderCommand::Track { id } => {
            app.require_any_route(ORDER_VIEW_ROUTES)?;
            let order = orders.get_order(&id)?;
            app.emit(json!({
                "id": order.id,
                "status": order.status,
                "steps": status_progress(order.status),
            }))
        }
        OrderCommand::Respond { id, response } => {
            app.require_route(Route::SupplierOrders)?;
            app.require_permission(Permission::RespondToOrders)?;
            let response = match response {
                ResponseArg::Accept => SupplierResponse::Accepted,
                ResponseArg::Reject => SupplierResponse::Rejected,
            };
            app.emit_value(&orders.respond_to_order(&id, response)?)
        }
        OrderCommand::Pay { id, method } => {
            app.require_route(Route::PurchasePayments)?;
            app.require_permission(Permission::PayPurchaseOrder)?;
            let amount = orders.get_order(&id)?.total;
            app.emit_value(&orders.process_payment(PaymentRecord {
                order_id: id,
                amount,
                payment_method: method,
            })?)
        }
        OrderCommand::Ship { id } => {
            app.require_route(Route::SupplierOrders)?;
            app.require_permission(Permission::UpdateShipment)?;
            app.emit_value(&orders.ship_order(&id)?)
        }
        OrderCommand::Deliver { id } => {
            app.require_route(Route::SupplierOrders)?;
            app.require_permission(Permission::UpdateShipment)?;
            app.emit_value(&orders.mark_delivered(&id)?)
        }
        OrderCommand::Clear => {
            app.require_route(Route::PurchaseHub)?;
            orders.clear_all()?;
            app.emit(json!({ "status": "cleared" }))
        }
    }
}

pub(crate) fn deliveries(app: &App<'_>, command: DeliveryCommand) -> Result<()> {
    app.require_route(Route::PurchaseDeliveries)?;
    let deliveries = DeliveryService::new(app.store);
    match command {
        DeliveryCommand::Create {
            order,
            supplier,
            amount,
        } => app.emit_value(&deliveries.create_delivery(DeliveryDraft {
            order_id: order,
            supplier,
            amount,
            ..DeliveryDraft::default()
        })?),
        DeliveryCommand::List { order } => {
            let list = match order {
                Some(order_id) => deliveries.deliveries_for_order(&order_id)?,
                None => deliveries.list_deliveries()?,
            };
            app.emit_value(&list)
        }
        DeliveryCommand::Stage { id, stage } => {
            let stage: DeliveryStage = stage.parse().map_err(Error::msg)?;
            app.emit_value(&deliveries.update_stage(&id, stage)?)
        }
        DeliveryCommand::Payment { id, status } => {
            let status: PaymentStatus = status.parse().map_err(Error::msg)?;
            app.emit_value(&deliveries.update_payment_status(&id, status)?)
        }
        DeliveryCommand::Status { id, status } => {
            let status: DeliveryStatus = status.parse().map_err(Error::msg)?;
            app.emit_value(&deliveries.update_delivery_status(&id, status)?)
        }
    }
}

pub(crate) fn bills(app: &App<'_>, command: BillCommand) -> Result<()> {
    app.require_route(Route::PurchasePayments)?;
    app.require_permission(Permission::ManageBills)?;
    let bills = BillService::new(app.store);
    match command {
        BillCommand::Create {
            order,
            supplier,
            amount,
            due,
        } => app.emit_value(&bills.create_bill(BillDraft {
            order_id: order,
            supplier,
            amount,
            due_date: due,
            ..BillDraft::default()
        })?),
        BillCommand::List { overdue } => {
            let list = if overdue {
                bills.overdue_bills()?
            } else {
                bills.list_bills()?
            };
            app.emit_value(&list)
        }
        BillCommand::Status { id, status } => {
            let status: BillStatus = status.parse().map_err(Error::msg)?;
            app.emit_value(&bills.update_bill_status(&id, status)?)
        }
        BillCommand::ForOrder { order } => app.emit_value(&bills.bill_for_order(&order)?),
    }
}

use chrono::{TimeZone, Utc};
use pharmadesk_core::db::open_db_in_memory;
use pharmadesk_core::model::purchase::{
    BillDraft, BillStatus, DeliveryDraft, DeliveryStage, DeliveryStatus, OrderDraft, OrderItem,
    OrderStatus, PaymentRecord, PaymentStatus, SupplierResponse,
};
use pharmadesk_core::service::bill_service::BillService;
use pharmadesk_core::service::delivery_service::DeliveryService;
use pharmadesk_core::service::purchase_service::PurchaseService;
use pharmadesk_core::service::ServiceError;
use pharmadesk_core::store::{KeyValueStore, SqliteKeyValueStore, PURCHASE_ORDERS_KEY};
use pharmadesk_core::FixedClock;

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 3, 11, 15, 0).unwrap())
}

fn order_draft() -> OrderDraft {
    OrderDraft {
        customer_name: Some("City Pharmacy".to_string()),
        delivery_address: Some("12 Market Road".to_string()),
        items: vec![
            OrderItem::new("Metformin 500mg", 100, 1.2),
            OrderItem::new("Atorvastatin 10mg", 50, 2.0),
        ],
        ..OrderDraft::default()
    }
}

#[test]
fn order_moves_through_the_full_pipeline() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, u64::MAX);
    let orders = PurchaseService::with_clock(&store, clock());

    let order = orders.create_order(order_draft()).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!((order.total - 220.0).abs() < 1e-9);

    let err = orders
        .process_payment(PaymentRecord {
            order_id: order.id.clone(),
            amount: order.total,
            payment_method: "card".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition { .. }));

    orders
        .respond_to_order(&order.id, SupplierResponse::Accepted)
        .unwrap();
    let paid = orders
        .process_payment(PaymentRecord {
            order_id: order.id.clone(),
            amount: order.total,
            payment_method: "card".to_string(),
        })
        .unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(paid.payment.as_ref().map(|p| p.amount), Some(order.total));

    assert!(orders.mark_delivered(&order.id).is_err());
    orders.ship_order(&order.id).unwrap();
    let delivered = orders.mark_delivered(&order.id).unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.delivered_at, Some(clock().at()));

    assert_eq!(orders.delivered_orders().unwrap().len(), 1);
    assert!(orders.active_orders().unwrap().is_empty());
}

#[test]
fn direct_status_update_stamps_delivery_time() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, u64::MAX);
    let orders = PurchaseService::with_clock(&store, clock());

    let order = orders.create_order(order_draft()).unwrap();
    let shipped = orders
        .update_order_status(&order.id, OrderStatus::Shipped)
        .unwrap();
    assert_eq!(shipped.delivered_at, None);
    let delivered = orders
        .update_order_status(&order.id, OrderStatus::Delivered)
        .unwrap();
    assert!(delivered.delivered_at.is_some());
}

#[test]
fn stored_orders_keep_unknown_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, u64::MAX);
    store
        .set(
            PURCHASE_ORDERS_KEY,
            r#"[{"id":"PO-1","createdAt":"2024-06-01T08:00:00Z","status":"PENDING",
                "items":[{"medicineName":"Insulin","quantity":2,"price":300}],
                "total":600,"priority":"urgent"}]"#,
        )
        .unwrap();
    let orders = PurchaseService::with_clock(&store, clock());

    let order = orders.get_order("PO-1").unwrap();
    assert_eq!(order.items[0].name, "Insulin");
    orders
        .respond_to_order("PO-1", SupplierResponse::Accepted)
        .unwrap();

    let raw = store.get(PURCHASE_ORDERS_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["priority"], "urgent");
    assert_eq!(value[0]["status"], "ACCEPTED");
    assert_eq!(value[0]["supplierResponse"], "ACCEPTED");
}

#[test]
fn deliveries_and_bills_follow_their_orders() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, u64::MAX);
    let orders = PurchaseService::with_clock(&store, clock());
    let deliveries = DeliveryService::with_clock(&store, clock());
    let bills = BillService::with_clock(&store, clock());

    let order = orders.create_order(order_draft()).unwrap();
    let delivery = deliveries
        .create_delivery(DeliveryDraft {
            order_id: Some(order.id.clone()),
            supplier: Some("MedSupply Co".to_string()),
            amount: Some(order.total),
            ..DeliveryDraft::default()
        })
        .unwrap();
    deliveries
        .update_payment_status(&delivery.id, PaymentStatus::Paid)
        .unwrap();
    let done = deliveries
        .update_delivery_status(&delivery.id, DeliveryStatus::Delivered)
        .unwrap();
    assert_eq!(done.stage, DeliveryStage::Delivered);
    assert_eq!(deliveries.deliveries_for_order(&order.id).unwrap().len(), 1);

    let bill = bills
        .create_bill(BillDraft {
            order_id: Some(order.id.clone()),
            amount: order.total,
            ..BillDraft::default()
        })
        .unwrap();
    bills.update_bill_status(&bill.id, BillStatus::Paid).unwrap();
    assert_eq!(
        bills.bill_for_order(&order.id).unwrap().map(|b| b.status),
        Some(BillStatus::Paid)
    );

    orders.clear_all().unwrap();
    assert!(orders.list_orders().unwrap().is_empty());
    assert!(deliveries.list_deliveries().unwrap().is_empty());
    assert_eq!(bills.list_bills().unwrap().len(), 1);
}

#[test]
fn browser_written_orders_survive_new_orders() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, u64::MAX);
    store
        .set(
            PURCHASE_ORDERS_KEY,
            r#"[
                {"id":"PO-1","createdAt":"2024-02-01T09:30:00.000Z","status":"PAID",
                 "items":[{"medicineId":2,"medicineName":"B","price":null,"quantity":1}],
                 "total":0,
                 "paymentData":{"orderId":"PO-1","amount":"2","paymentMethod":"card"}},
                {"id":"PO-2","status":"SHIPPED","createdAt":"not a date"}
            ]"#,
        )
        .unwrap();
    let orders = PurchaseService::with_clock(&store, clock());

    let listed = orders.list_orders().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].payment.as_ref().map(|payment| payment.amount), Some(2.0));

    let err = orders
        .create_order(OrderDraft {
            id: Some("PO-2".to_string()),
            ..order_draft()
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    orders.create_order(order_draft()).unwrap();
    let raw = store.get(PURCHASE_ORDERS_KEY).unwrap().unwrap();
    assert!(raw.contains("\"PO-1\""));
    assert!(raw.contains("\"PO-2\""));
    assert!(raw.contains("not a date"));
    assert_eq!(orders.list_orders().unwrap().len(), 2);
}

#[test]
fn non_array_collection_is_never_overwritten() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, u64::MAX);
    store.set(PURCHASE_ORDERS_KEY, "{\"broken\":true}").unwrap();
    let orders = PurchaseService::with_clock(&store, clock());

    assert!(orders.list_orders().unwrap().is_empty());
    let err = orders.create_order(order_draft()).unwrap_err();
    assert!(matches!(err, ServiceError::UnreadableCollection { .. }));
    assert_eq!(
        store.get(PURCHASE_ORDERS_KEY).unwrap().as_deref(),
        Some("{\"broken\":true}")
    );

    orders.clear_all().unwrap();
    orders.create_order(order_draft()).unwrap();
    assert_eq!(orders.list_orders().unwrap().len(), 1);
}

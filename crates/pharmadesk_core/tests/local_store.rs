use pharmadesk_core::db::open_db_in_memory;
use pharmadesk_core::store::{
    clear_except, read_json_or_default, safe_set, write_json, KeyValueStore, SqliteKeyValueStore,
    StoreError, AUTH_TOKEN_KEY, AUTH_USER_KEY, PURCHASE_BILLS_KEY, PURCHASE_ORDERS_KEY,
    SUPPLIER_PROFILE_KEY,
};

#[test]
fn size_counts_key_and_value_bytes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, u64::MAX);

    store.set("ab", "cde").unwrap();
    store.set("k", "värde").unwrap();

    // "värde" is 6 bytes in UTF-8.
    assert_eq!(store.size_bytes().unwrap(), 2 + 3 + 1 + 6);
    assert_eq!(store.keys().unwrap(), vec!["ab".to_string(), "k".to_string()]);
}

#[test]
fn replacing_a_value_only_counts_the_new_size() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, 20);

    store.set("orders", "0123456789").unwrap();
    store.set("orders", "9876543210").unwrap();
    assert_eq!(store.size_bytes().unwrap(), 16);

    let err = store.set("orders", "01234567890123456789").unwrap_err();
    assert!(matches!(err, StoreError::QuotaExceeded { quota: 20, .. }));
    assert_eq!(store.get("orders").unwrap().as_deref(), Some("9876543210"));
}

#[test]
fn safe_set_recovers_by_dropping_non_auth_entries() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, 120);

    store.set(AUTH_TOKEN_KEY, "jwt-token").unwrap();
    store.set(AUTH_USER_KEY, r#"{"name":"Asha"}"#).unwrap();
    store.set(PURCHASE_BILLS_KEY, &"x".repeat(40)).unwrap();

    safe_set(&store, PURCHASE_ORDERS_KEY, &"y".repeat(40)).unwrap();

    assert_eq!(store.get(PURCHASE_BILLS_KEY).unwrap(), None);
    assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("jwt-token"));
    assert!(store.get(AUTH_USER_KEY).unwrap().is_some());
    assert_eq!(store.get(PURCHASE_ORDERS_KEY).unwrap().map(|v| v.len()), Some(40));
}

#[test]
fn safe_set_fails_when_value_alone_exceeds_quota() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, 16);

    let err = safe_set(&store, PURCHASE_ORDERS_KEY, "[]").unwrap_err();
    assert!(matches!(err, StoreError::QuotaExceeded { .. }));
}

#[test]
fn corrupt_json_reads_as_default() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, u64::MAX);

    store.set(PURCHASE_ORDERS_KEY, "[{broken").unwrap();
    let orders: Vec<serde_json::Value> = read_json_or_default(&store, PURCHASE_ORDERS_KEY).unwrap();
    assert!(orders.is_empty());

    write_json(&store, PURCHASE_ORDERS_KEY, &vec![serde_json::json!({"id": "PO-1"})]).unwrap();
    let orders: Vec<serde_json::Value> = read_json_or_default(&store, PURCHASE_ORDERS_KEY).unwrap();
    assert_eq!(orders.len(), 1);
}

#[test]
fn clear_except_keeps_listed_keys() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteKeyValueStore::new(&conn, u64::MAX);
    for key in [AUTH_TOKEN_KEY, SUPPLIER_PROFILE_KEY, PURCHASE_ORDERS_KEY] {
        store.set(key, "v").unwrap();
    }

    clear_except(&store, &[AUTH_TOKEN_KEY]).unwrap();
    assert_eq!(store.keys().unwrap(), vec![AUTH_TOKEN_KEY.to_string()]);

    store.clear().unwrap();
    assert_eq!(store.size_bytes().unwrap(), 0);
}

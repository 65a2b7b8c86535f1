use gateway_core::model::CreateWebhookRequest;
use gateway_store::{catalog, EngineHandle};

fn test_engine() -> EngineHandle {
    let engine = EngineHandle::open_in_memory().unwrap();
    catalog::bootstrap(&engine).unwrap();
    engine
}

#[test]
fn registers_and_finds_a_webhook_by_path() {
    let engine = test_engine();
    let req = CreateWebhookRequest {
        name: "orders".to_string(),
        path: "orders/new".to_string(),
        destination_url: "https://example.com/sink".to_string(),
        filter_sql: None,
        transform_sql: None,
    };

    let created = catalog::insert_webhook(&engine, &req).unwrap();
    let found = catalog::find_webhook_by_path(&engine, "orders/new").unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert!(found.enabled);
}

#[test]
fn rejects_duplicate_path() {
    let engine = test_engine();
    let req = CreateWebhookRequest {
        name: "orders".to_string(),
        path: "orders/new".to_string(),
        destination_url: "https://example.com/sink".to_string(),
        filter_sql: None,
        transform_sql: None,
    };
    catalog::insert_webhook(&engine, &req).unwrap();
    let err = catalog::insert_webhook(&engine, &req).unwrap_err();
    assert!(matches!(err, gateway_core::GatewayError::Conflict(_)));
}

#[test]
fn deleting_unknown_webhook_is_not_found() {
    let engine = test_engine();
    let err = catalog::delete_webhook(&engine, uuid::Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, gateway_core::GatewayError::NotFound(_)));
}

#[test]
fn toggling_webhook_status_flips_enabled() {
    let engine = test_engine();
    let req = CreateWebhookRequest {
        name: "orders".to_string(),
        path: "orders/new".to_string(),
        destination_url: "https://example.com/sink".to_string(),
        filter_sql: None,
        transform_sql: None,
    };
    let created = catalog::insert_webhook(&engine, &req).unwrap();
    let updated = catalog::set_webhook_enabled(&engine, created.id, false).unwrap();
    assert!(!updated.enabled);
    let reloaded = catalog::find_webhook_by_id(&engine, created.id).unwrap().unwrap();
    assert!(!reloaded.enabled);
}

#[test]
fn reference_tables_with_the_same_logical_name_can_belong_to_different_webhooks() {
    let engine = test_engine();
    let webhook_a = uuid::Uuid::new_v4();
    let webhook_b = uuid::Uuid::new_v4();

    let table_a = catalog::insert_reference_table(&engine, webhook_a, "customers", "ref_a_customers").unwrap();
    let table_b = catalog::insert_reference_table(&engine, webhook_b, "customers", "ref_b_customers").unwrap();

    assert_ne!(table_a.id, table_b.id);
    assert_eq!(
        catalog::find_reference_table(&engine, webhook_a, "customers").unwrap().unwrap().id,
        table_a.id
    );
    assert_eq!(
        catalog::find_reference_table(&engine, webhook_b, "customers").unwrap().unwrap().id,
        table_b.id
    );
    assert!(catalog::find_reference_table(&engine, webhook_b, "does-not-exist").unwrap().is_none());
}

#[test]
fn reference_table_name_reuse_within_the_same_webhook_conflicts() {
    let engine = test_engine();
    let webhook_id = uuid::Uuid::new_v4();
    catalog::insert_reference_table(&engine, webhook_id, "customers", "ref_1_customers").unwrap();
    let err = catalog::insert_reference_table(&engine, webhook_id, "customers", "ref_2_customers").unwrap_err();
    assert!(matches!(err, gateway_core::GatewayError::EngineError(_)));
}

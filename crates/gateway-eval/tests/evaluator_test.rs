use chrono::Utc;
use gateway_core::model::WebhookDefinition;
use gateway_eval::{evaluate, EvalOutcome};
use gateway_store::{catalog, EngineHandle};
use uuid::Uuid;

fn webhook(filter_sql: Option<&str>, transform_sql: Option<&str>) -> WebhookDefinition {
    WebhookDefinition {
        id: Uuid::new_v4(),
        name: "orders".to_string(),
        path: "orders/new".to_string(),
        destination_url: "https://example.com/sink".to_string(),
        filter_sql: filter_sql.map(String::from),
        transform_sql: transform_sql.map(String::from),
        enabled: true,
        created_at: Utc::now(),
    }
}

#[test]
fn passes_through_payload_without_transform() {
    let engine = EngineHandle::open_in_memory().unwrap();
    catalog::bootstrap(&engine).unwrap();

    let wh = webhook(None, None);
    let payload = serde_json::json!({ "amount": 42 });
    match evaluate(&engine, &wh, &payload).unwrap() {
        EvalOutcome::Pass(p) => assert_eq!(p, payload),
        EvalOutcome::Filtered => panic!("expected pass"),
    }
}

#[test]
fn filter_sql_rejects_events_below_threshold() {
    let engine = EngineHandle::open_in_memory().unwrap();
    catalog::bootstrap(&engine).unwrap();

    let wh = webhook(
        Some("SELECT (payload->>'amount')::DOUBLE > 100 FROM {{payload}}"),
        None,
    );
    let payload = serde_json::json!({ "amount": 10 });
    match evaluate(&engine, &wh, &payload).unwrap() {
        EvalOutcome::Filtered => {}
        EvalOutcome::Pass(_) => panic!("expected filtered"),
    }
}

#[test]
fn transform_sql_keys_the_payload_by_result_column_name() {
    let engine = EngineHandle::open_in_memory().unwrap();
    catalog::bootstrap(&engine).unwrap();

    let wh = webhook(
        None,
        Some("SELECT (payload->>'amount')::DOUBLE * 2 AS doubled FROM {{payload}}"),
    );
    let payload = serde_json::json!({ "amount": 10 });
    match evaluate(&engine, &wh, &payload).unwrap() {
        EvalOutcome::Pass(p) => assert_eq!(p, serde_json::json!({ "doubled": 20.0 })),
        EvalOutcome::Filtered => panic!("expected pass"),
    }
}

#[test]
fn transform_sql_emits_a_single_text_column_as_a_keyed_object() {
    let engine = EngineHandle::open_in_memory().unwrap();
    catalog::bootstrap(&engine).unwrap();

    let wh = webhook(
        None,
        Some("SELECT payload->>'$.type' AS t FROM {{payload}}"),
    );
    let payload = serde_json::json!({ "type": "PushEvent" });
    match evaluate(&engine, &wh, &payload).unwrap() {
        EvalOutcome::Pass(p) => assert_eq!(p, serde_json::json!({ "t": "PushEvent" })),
        EvalOutcome::Filtered => panic!("expected pass"),
    }
}

#[test]
fn transform_sql_emits_a_json_array_for_multiple_rows() {
    let engine = EngineHandle::open_in_memory().unwrap();
    catalog::bootstrap(&engine).unwrap();

    let wh = webhook(
        None,
        Some(
            "SELECT * FROM (VALUES (1, 'a'), (2, 'b')) AS t(id, label), {{payload}}",
        ),
    );
    let payload = serde_json::json!({ "amount": 10 });
    match evaluate(&engine, &wh, &payload).unwrap() {
        EvalOutcome::Pass(p) => {
            assert_eq!(
                p,
                serde_json::json!([
                    { "id": 1, "label": "a" },
                    { "id": 2, "label": "b" },
                ])
            );
        }
        EvalOutcome::Filtered => panic!("expected pass"),
    }
}

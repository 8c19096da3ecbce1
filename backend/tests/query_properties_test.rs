//! Parameter building, enrichment and output reading through the public API

use claims_service::data::{OutputValues, ParamValue, Record, ScriptedDataAccess, WriteResult};
use claims_service::data::procedures::names;
use claims_service::error::AppError;
use claims_service::query::{Pagination, PaginationDefaults, ToParams};
use claims_service::services::chat::{ChatRoomSearch, CreateChatRoomRequest};
use claims_service::services::claimant::ClaimantSearch;
use claims_service::services::Services;
use std::sync::Arc;

fn scripted_services() -> (Arc<ScriptedDataAccess>, Services) {
    let data = Arc::new(ScriptedDataAccess::new());
    let services = Services::new(data.clone(), PaginationDefaults::default());
    (data, services)
}

fn room_row(room_id: i64) -> Record {
    Record::new()
        .with("room_id", room_id)
        .with("customer_id", 7)
        .with("claim_id", serde_json::Value::Null)
        .with("room_name", format!("Room {}", room_id))
        .with("status", "Active")
        .with("created_by", serde_json::Value::Null)
        .with("created_at", "2024-06-01 12:00:00")
        .with("closed_at", serde_json::Value::Null)
        .with("message_count", 0)
        .with("total_count", 2)
}

#[test]
fn test_absent_fields_are_not_sent() {
    let params = ClaimantSearch {
        tenant_id: 3,
        claimant_id: Some(0),
        customer_id: None,
        first_name: Some("John".to_string()),
        last_name: Some("   ".to_string()),
        ..Default::default()
    }
    .to_params(&PaginationDefaults::default());

    assert_eq!(
        params.names(),
        vec!["tenant_id", "first_name", "page", "limit", "offset"]
    );
    assert_eq!(params.get("first_name").and_then(ParamValue::as_str), Some("John%"));
    assert_eq!(params.get("page"), Some(&ParamValue::Integer(1)));
    assert_eq!(params.get("limit"), Some(&ParamValue::Integer(10)));
}

#[test]
fn test_configured_defaults_and_limit_cap() {
    let defaults = PaginationDefaults {
        page: 1,
        limit: 25,
        max_limit: 50,
    };

    let implicit = ClaimantSearch::default().to_params(&defaults);
    assert_eq!(implicit.get("limit"), Some(&ParamValue::Integer(25)));

    let capped = ClaimantSearch {
        pagination: Pagination::new(3, 500),
        ..Default::default()
    }
    .to_params(&defaults);
    assert_eq!(capped.get("limit"), Some(&ParamValue::Integer(50)));
    assert_eq!(capped.get("offset"), Some(&ParamValue::Integer(100)));
}

#[tokio::test]
async fn test_enrichment_attaches_customer_to_every_row() {
    let (data, services) = scripted_services();
    data.push_rows(names::CHAT_SEARCH_ROOMS, vec![room_row(1), room_row(2)]);
    data.push_single(
        names::MISC_GET_CUSTOMER_INFO,
        Some(
            Record::new()
                .with("customer_name", "Acme Corp")
                .with("company_name", "Acme Services"),
        ),
    );

    let page = services
        .chat
        .search_rooms(&ChatRoomSearch {
            tenant_id: 1,
            customer_id: 7,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    for room in &page.items {
        assert_eq!(room.customer_name, "Acme Corp");
        assert_eq!(room.company_name, "Acme Services");
    }
    assert_eq!(data.calls_to(names::MISC_GET_CUSTOMER_INFO).len(), 1);
}

#[tokio::test]
async fn test_lookup_miss_blanks_every_row() {
    let (data, services) = scripted_services();
    data.push_rows(names::CHAT_SEARCH_ROOMS, vec![room_row(1), room_row(2)]);

    let page = services
        .chat
        .search_rooms(&ChatRoomSearch {
            tenant_id: 1,
            customer_id: 7,
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(page
        .items
        .iter()
        .all(|r| r.customer_name.is_empty() && r.company_name.is_empty()));
}

#[tokio::test]
async fn test_empty_primary_result_is_empty_page() {
    let (data, services) = scripted_services();

    let page = services
        .chat
        .search_rooms(&ChatRoomSearch {
            tenant_id: 1,
            customer_id: 7,
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 0);
    assert!(data.calls_to(names::MISC_GET_CUSTOMER_INFO).is_empty());
}

#[tokio::test]
async fn test_room_page_past_the_end_keeps_total() {
    let (data, services) = scripted_services();
    data.push_single(
        names::CHAT_COUNT_ROOMS,
        Some(Record::new().with("total_count", 2)),
    );

    let page = services
        .chat
        .search_rooms(&ChatRoomSearch {
            tenant_id: 1,
            customer_id: 7,
            pagination: Pagination::new(4, 1),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 2);
    assert_eq!(page.total_pages, 2);
    let count_params = data.last_params(names::CHAT_COUNT_ROOMS).unwrap();
    assert_eq!(count_params.get("customer_id"), Some(&ParamValue::Integer(7)));
    assert!(data.calls_to(names::MISC_GET_CUSTOMER_INFO).is_empty());
}

#[tokio::test]
async fn test_create_room_envelope_round_trip() {
    let (data, services) = scripted_services();
    data.push_write(
        names::CHAT_CREATE_ROOM,
        WriteResult::new(
            1,
            OutputValues::new()
                .with("room_id", 2001)
                .with("response_code", 1)
                .with("message", "Room created successfully")
                .with("status", "Active"),
        ),
    );

    let envelope = services
        .chat
        .create_room(&CreateChatRoomRequest {
            tenant_id: 1,
            customer_id: 7,
            room_name: "Claim intake".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(envelope.id, Some(2001));
    assert_eq!(envelope.response_code, Some(1));
    assert_eq!(envelope.message.as_deref(), Some("Room created successfully"));
    assert_eq!(envelope.status.as_deref(), Some("Active"));
    assert_eq!(envelope.affected_rows, 1);
}

#[tokio::test]
async fn test_data_access_failure_is_not_swallowed() {
    let (data, services) = scripted_services();
    data.push_failure(names::MISC_GET_STATES, "login failed");

    let result = services.misc.get_states().await;

    match result {
        Err(AppError::DataAccess(err)) => assert_eq!(err.to_string(), "Scripted failure: login failed"),
        other => panic!("Expected data access error, got: {:?}", other),
    }
}

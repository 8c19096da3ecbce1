//! End-to-end service flows against an on-disk SQLite database

use chrono::NaiveDate;
use claims_service::config::DatabaseConfig;
use claims_service::data::SqliteDataAccess;
use claims_service::query::{Pagination, PaginationDefaults};
use claims_service::services::chat::{
    ChatMessageSearch, ChatRoomSearch, CreateChatRoomRequest, SendChatMessageRequest,
};
use claims_service::services::claimant::{ClaimantSearch, SaveClaimantRequest};
use claims_service::services::claims::{
    ClaimSearch, CreateClaimRequest, UpdateClaimStatusRequest,
};
use claims_service::services::email::{EmailSearch, QueueEmailRequest, SaveTemplateRequest};
use claims_service::services::misc::SaveCustomerRequest;
use claims_service::services::Services;
use std::sync::Arc;
use tempfile::TempDir;

const TENANT: i64 = 1;

async fn open_services() -> (TempDir, Services) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("claims.db");
    let data = SqliteDataAccess::connect(&DatabaseConfig::new(path.to_string_lossy()))
        .await
        .expect("Failed to open database");
    let services = Services::new(Arc::new(data), PaginationDefaults::default());
    (dir, services)
}

async fn seed_customer(services: &Services) -> i64 {
    let envelope = services
        .misc
        .save_customer(&SaveCustomerRequest {
            tenant_id: TENANT,
            customer_name: "Acme Corp".to_string(),
            company_name: Some("Acme Services".to_string()),
            email: Some("claims@acme.example".to_string()),
        })
        .await
        .expect("Failed to save customer");
    envelope.id.expect("Customer id should be populated")
}

async fn seed_claimant(services: &Services, customer_id: i64, first: &str, last: &str) -> i64 {
    let envelope = services
        .claimant
        .save_claimant(&SaveClaimantRequest {
            tenant_id: TENANT,
            customer_id: Some(customer_id),
            first_name: first.to_string(),
            last_name: last.to_string(),
            state_code: Some("TX".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 1),
            ..Default::default()
        })
        .await
        .expect("Failed to save claimant");
    assert_eq!(envelope.message.as_deref(), Some("Claimant created"));
    envelope.id.expect("Claimant id should be populated")
}

#[tokio::test]
async fn test_lookups_are_seeded() {
    let (_dir, services) = open_services().await;

    let statuses = services.misc.get_claim_statuses().await.unwrap();
    let states = services.misc.get_states().await.unwrap();

    let names: Vec<&str> = statuses.iter().map(|s| s.status_name.as_str()).collect();
    assert_eq!(names, vec!["Open", "In Review", "Approved", "Denied", "Closed"]);
    assert_eq!(states.len(), 7);
    assert_eq!(states[0].state_name, "Arizona");
}

#[tokio::test]
async fn test_chat_room_lifecycle() {
    let (_dir, services) = open_services().await;
    let customer_id = seed_customer(&services).await;

    let created = services
        .chat
        .create_room(&CreateChatRoomRequest {
            tenant_id: TENANT,
            customer_id,
            room_name: "Claim intake".to_string(),
            created_by: Some("agent-7".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(created.is_success());
    assert_eq!(created.message.as_deref(), Some("Room created successfully"));
    assert_eq!(created.status.as_deref(), Some("Active"));
    let room_id = created.id.expect("Room id should be populated");

    for body in ["Hello", "I need help with my claim"] {
        let sent = services
            .chat
            .send_message(&SendChatMessageRequest {
                tenant_id: TENANT,
                room_id,
                sender: "customer".to_string(),
                body: body.to_string(),
            })
            .await
            .unwrap();
        assert!(sent.is_success());
        assert!(sent.id.is_some());
    }

    let rooms = services
        .chat
        .search_rooms(&ChatRoomSearch {
            tenant_id: TENANT,
            customer_id,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rooms.total_count, 1);
    assert_eq!(rooms.items[0].message_count, 2);
    assert_eq!(rooms.items[0].customer_name, "Acme Corp");
    assert_eq!(rooms.items[0].company_name, "Acme Services");

    let second_page = services
        .chat
        .get_messages(&ChatMessageSearch {
            tenant_id: TENANT,
            room_id,
            pagination: Pagination::new(2, 1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(second_page.items.len(), 1);
    assert_eq!(second_page.items[0].body, "I need help with my claim");
    assert_eq!(second_page.total_count, 2);
    assert_eq!(second_page.total_pages, 2);

    let closed = services.chat.close_room(TENANT, room_id).await.unwrap();
    assert!(closed.is_success());
    assert_eq!(closed.status.as_deref(), Some("Closed"));

    let closed_again = services.chat.close_room(TENANT, room_id).await.unwrap();
    assert_eq!(closed_again.response_code, Some(0));
    assert_eq!(closed_again.status.as_deref(), Some("Closed"));

    let rejected = services
        .chat
        .send_message(&SendChatMessageRequest {
            tenant_id: TENANT,
            room_id,
            sender: "customer".to_string(),
            body: "Anyone there?".to_string(),
        })
        .await
        .unwrap();
    assert!(!rejected.is_success());
    assert_eq!(rejected.id, None);
    assert_eq!(rejected.message.as_deref(), Some("Room is not active"));
}

#[tokio::test]
async fn test_chat_room_for_unknown_customer() {
    let (_dir, services) = open_services().await;

    let envelope = services
        .chat
        .create_room(&CreateChatRoomRequest {
            tenant_id: TENANT,
            customer_id: 99,
            room_name: "Orphan".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(envelope.id, None);
    assert_eq!(envelope.response_code, Some(0));
    assert_eq!(envelope.message.as_deref(), Some("Customer not found"));
    assert_eq!(envelope.status, None);
}

#[tokio::test]
async fn test_rooms_are_tenant_scoped() {
    let (_dir, services) = open_services().await;
    let customer_id = seed_customer(&services).await;
    services
        .chat
        .create_room(&CreateChatRoomRequest {
            tenant_id: TENANT,
            customer_id,
            room_name: "Claim intake".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let other_tenant = services
        .chat
        .search_rooms(&ChatRoomSearch {
            tenant_id: TENANT + 1,
            customer_id,
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(other_tenant.items.is_empty());
    assert_eq!(other_tenant.total_count, 0);
    assert_eq!(other_tenant.page, 1);
    assert_eq!(other_tenant.limit, 10);
}

#[tokio::test]
async fn test_claimant_save_search_and_update() {
    let (_dir, services) = open_services().await;
    let customer_id = seed_customer(&services).await;
    let jane = seed_claimant(&services, customer_id, "Jane", "Doe").await;
    seed_claimant(&services, customer_id, "John", "Smith").await;

    let found = services
        .claimant
        .search_claimants(&ClaimantSearch {
            tenant_id: TENANT,
            first_name: Some("Jo".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.total_count, 1);
    assert_eq!(found.items[0].first_name, "John");
    assert_eq!(found.items[0].last_name, "Smith");

    let updated = services
        .claimant
        .save_claimant(&SaveClaimantRequest {
            tenant_id: TENANT,
            claimant_id: Some(jane),
            first_name: "Janet".to_string(),
            last_name: "Doe".to_string(),
            is_active: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.id, Some(jane));
    assert_eq!(updated.message.as_deref(), Some("Claimant updated"));

    let janet = services
        .claimant
        .get_claimant(TENANT, jane)
        .await
        .unwrap()
        .expect("Claimant should exist");
    assert_eq!(janet.first_name, "Janet");
    assert!(!janet.is_active);
    assert_eq!(janet.state_code.as_deref(), Some("TX"));
    assert_eq!(janet.date_of_birth.as_deref(), Some("1990-06-01"));

    let active = services
        .claimant
        .search_claimants(&ClaimantSearch {
            tenant_id: TENANT,
            is_active: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.items.len(), 1);
    assert_eq!(active.items[0].first_name, "John");

    let missing = services
        .claimant
        .save_claimant(&SaveClaimantRequest {
            tenant_id: TENANT,
            claimant_id: Some(99),
            first_name: "Nobody".to_string(),
            last_name: "Here".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(missing.id, None);
    assert_eq!(missing.response_code, Some(0));
    assert!(services.claimant.get_claimant(TENANT, 99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_page_past_the_end_reports_search_total() {
    let (_dir, services) = open_services().await;
    let customer_id = seed_customer(&services).await;
    seed_claimant(&services, customer_id, "Ann", "Archer").await;
    seed_claimant(&services, customer_id, "Ben", "Baker").await;
    seed_claimant(&services, customer_id, "Cal", "Cooper").await;

    let last = services
        .claimant
        .search_claimants(&ClaimantSearch {
            tenant_id: TENANT,
            pagination: Pagination::new(2, 2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].last_name, "Cooper");

    let past = services
        .claimant
        .search_claimants(&ClaimantSearch {
            tenant_id: TENANT,
            pagination: Pagination::new(3, 2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(past.items.is_empty());
    assert_eq!(past.page, 3);
    assert_eq!(past.total_count, 3);
    assert_eq!(past.total_pages, 2);

    let none = services
        .claimant
        .search_claimants(&ClaimantSearch {
            tenant_id: TENANT,
            last_name: Some("Zed".to_string()),
            pagination: Pagination::new(3, 2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(none.total_count, 0);
    assert_eq!(none.total_pages, 0);
}

#[tokio::test]
async fn test_claims_flow() {
    let (_dir, services) = open_services().await;
    let customer_id = seed_customer(&services).await;
    let claimant_id = seed_claimant(&services, customer_id, "Jane", "Doe").await;

    let first = services
        .claims
        .create_claim(&CreateClaimRequest {
            tenant_id: TENANT,
            customer_id,
            claimant_id: Some(claimant_id),
            claim_number: Some("CLM-1001".to_string()),
            description: Some("Water damage".to_string()),
            amount: Some(1250.5),
            incident_date: NaiveDate::from_ymd_opt(2024, 4, 2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(first.is_success());
    let first_id = first.id.expect("Claim id should be populated");

    let second = services
        .claims
        .create_claim(&CreateClaimRequest {
            tenant_id: TENANT,
            customer_id,
            ..Default::default()
        })
        .await
        .unwrap();
    let second_id = second.id.expect("Claim id should be populated");

    let duplicate = services
        .claims
        .create_claim(&CreateClaimRequest {
            tenant_id: TENANT,
            customer_id,
            claim_number: Some("CLM-1001".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(duplicate.id, None);
    assert_eq!(duplicate.message.as_deref(), Some("Claim number already exists"));

    let all = services
        .claims
        .get_customer_claims(TENANT, customer_id, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|c| c.customer_name == "Acme Corp"));
    assert_eq!(all[0].claimant_name.as_deref(), Some("Jane Doe"));
    assert_eq!(all[0].amount, 1250.5);
    assert_eq!(all[1].claimant_name, None);
    assert!(all[1].claim_number.starts_with("CLM-"));

    let one = services
        .claims
        .get_customer_claims(TENANT, customer_id, Some(second_id))
        .await
        .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].claim_id, second_id);
    assert_eq!(one[0].company_name, "Acme Services");

    let by_number = services
        .claims
        .search_claims(&ClaimSearch {
            tenant_id: TENANT,
            claim_number: Some("CLM-1001".to_string()),
            from_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_number.total_count, 1);
    assert_eq!(by_number.items[0].status_name, "Open");

    let closed = services
        .claims
        .update_claim_status(&UpdateClaimStatusRequest {
            tenant_id: TENANT,
            claim_id: first_id,
            status_id: 5,
        })
        .await
        .unwrap();
    assert!(closed.is_success());
    assert_eq!(closed.status.as_deref(), Some("Closed"));

    let bad_status = services
        .claims
        .update_claim_status(&UpdateClaimStatusRequest {
            tenant_id: TENANT,
            claim_id: first_id,
            status_id: 99,
        })
        .await
        .unwrap();
    assert_eq!(bad_status.response_code, Some(0));
    assert_eq!(bad_status.status.as_deref(), Some("Closed"));

    let open = services
        .claims
        .search_claims(&ClaimSearch {
            tenant_id: TENANT,
            status_id: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(open.items.len(), 1);
    assert_eq!(open.items[0].claim_id, second_id);

    let counts = services.misc.get_dashboard_counts(TENANT).await.unwrap();
    assert_eq!(counts.total_claims, 2);
    assert_eq!(counts.open_claims, 1);
}

#[tokio::test]
async fn test_email_queue_flow() {
    let (_dir, services) = open_services().await;

    for subject in ["Claim received", "We received your claim"] {
        let saved = services
            .email
            .save_template(&SaveTemplateRequest {
                tenant_id: TENANT,
                template_code: "CLAIM_RECEIVED".to_string(),
                subject: subject.to_string(),
                body: Some("Thank you for filing.".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(saved.id, Some(1));
    }

    let templates = services.email.get_templates(TENANT).await.unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].subject, "We received your claim");

    let queued = services
        .email
        .queue_email(&QueueEmailRequest {
            tenant_id: TENANT,
            template_code: Some("CLAIM_RECEIVED".to_string()),
            recipient: "jane@example.com".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(queued.is_success());
    let email_id = queued.id.expect("Email id should be populated");

    let rejected = services
        .email
        .queue_email(&QueueEmailRequest {
            tenant_id: TENANT,
            recipient: "jane@example.com".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rejected.id, None);
    assert_eq!(rejected.response_code, Some(0));

    let pending = services
        .email
        .search_emails(&EmailSearch {
            tenant_id: TENANT,
            recipient: Some("jane".to_string()),
            is_sent: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(pending.total_count, 1);
    assert_eq!(pending.items[0].subject, "We received your claim");
    assert_eq!(pending.items[0].template_id, Some(1));
    assert!(uuid::Uuid::parse_str(&pending.items[0].tracking_id).is_ok());
    assert_eq!(
        services.misc.get_dashboard_counts(TENANT).await.unwrap().pending_emails,
        1
    );

    assert_eq!(services.email.mark_sent(TENANT + 1, email_id).await.unwrap(), 0);
    assert_eq!(services.email.mark_sent(TENANT, email_id).await.unwrap(), 1);
    assert_eq!(services.email.mark_sent(TENANT, email_id).await.unwrap(), 0);

    let sent = services
        .email
        .search_emails(&EmailSearch {
            tenant_id: TENANT,
            is_sent: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(sent.items.len(), 1);
    assert!(sent.items[0].is_sent);
    assert!(sent.items[0].sent_at.is_some());
}

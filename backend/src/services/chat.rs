//! Chat service
//!
//! Chat rooms opened for a customer (optionally tied to a claim) and the
//! messages posted in them.

use crate::data::params::QueryParams;
use crate::data::procedures::names;
use crate::error::AppResult;
use crate::query::enrich::enrich_with_customer;
use crate::query::{
    CustomerEnriched, EnvelopeContract, OutputEnvelope, Page, PageRow, Pagination,
    PaginationDefaults, ParamsBuilder, QueryDispatcher, ToParams,
};
use crate::services::{require_id, require_text};
use serde::{Deserialize, Serialize};
use tracing::info;

const CREATE_ROOM: EnvelopeContract = EnvelopeContract::code_and_message()
    .with_id("room_id")
    .with_status("status");

const SEND_MESSAGE: EnvelopeContract = EnvelopeContract::code_and_message().with_id("message_id");

const CLOSE_ROOM: EnvelopeContract = EnvelopeContract::code_and_message().with_status("status");

/// Request to open a chat room
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateChatRoomRequest {
    /// Tenant the room belongs to
    pub tenant_id: i64,
    /// Customer the room is opened for
    pub customer_id: i64,
    /// Claim the conversation is about, if any
    pub claim_id: Option<i64>,
    /// Room display name
    pub room_name: String,
    /// User who opened the room
    pub created_by: Option<String>,
}

/// Chat room search criteria
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRoomSearch {
    /// Tenant scope
    pub tenant_id: i64,
    /// Customer whose rooms are listed (also the enrichment key)
    pub customer_id: i64,
    /// Exact room id
    pub room_id: Option<i64>,
    /// Rooms tied to this claim
    pub claim_id: Option<i64>,
    /// Room status, e.g. `Active` or `Closed`
    pub status: Option<String>,
    /// Room name prefix
    pub room_name: Option<String>,
    /// Requested page
    #[serde(flatten)]
    pub pagination: Pagination,
}

impl ToParams for ChatRoomSearch {
    fn to_params(&self, defaults: &PaginationDefaults) -> QueryParams {
        ParamsBuilder::for_tenant(self.tenant_id)
            .add("customer_id", self.customer_id)
            .add_id("room_id", self.room_id)
            .add_id("claim_id", self.claim_id)
            .add_text("status", self.status.as_deref())
            .add_prefix("room_name", self.room_name.as_deref())
            .add_pagination(&self.pagination, defaults)
            .build()
    }
}

/// Chat room as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoomResponse {
    /// Room id
    pub room_id: i64,
    /// Owning customer
    pub customer_id: i64,
    /// Linked claim
    pub claim_id: Option<i64>,
    /// Room display name
    pub room_name: String,
    /// `Active` or `Closed`
    pub status: String,
    /// User who opened the room
    pub created_by: Option<String>,
    /// Creation time
    pub created_at: String,
    /// Close time
    pub closed_at: Option<String>,
    /// Messages posted in the room
    #[serde(default)]
    pub message_count: i64,
    /// Customer name (enriched)
    #[serde(default)]
    pub customer_name: String,
    /// Customer company (enriched)
    #[serde(default)]
    pub company_name: String,
    #[serde(default, skip_serializing)]
    total_count: i64,
}

impl CustomerEnriched for ChatRoomResponse {
    fn set_customer(&mut self, customer_name: &str, company_name: &str) {
        self.customer_name = customer_name.to_string();
        self.company_name = company_name.to_string();
    }
}

impl PageRow for ChatRoomResponse {
    fn total_count(&self) -> i64 {
        self.total_count
    }
}

/// Request to post a message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendChatMessageRequest {
    /// Tenant scope
    pub tenant_id: i64,
    /// Target room
    pub room_id: i64,
    /// Sender identifier
    pub sender: String,
    /// Message text
    pub body: String,
}

/// Message history search criteria
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessageSearch {
    /// Tenant scope
    pub tenant_id: i64,
    /// Room whose messages are listed
    pub room_id: i64,
    /// Only messages from this sender
    pub sender: Option<String>,
    /// Requested page
    #[serde(flatten)]
    pub pagination: Pagination,
}

impl ToParams for ChatMessageSearch {
    fn to_params(&self, defaults: &PaginationDefaults) -> QueryParams {
        ParamsBuilder::for_tenant(self.tenant_id)
            .add("room_id", self.room_id)
            .add_text("sender", self.sender.as_deref())
            .add_pagination(&self.pagination, defaults)
            .build()
    }
}

/// Chat message as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    /// Message id
    pub message_id: i64,
    /// Room the message was posted in
    pub room_id: i64,
    /// Sender identifier
    pub sender: String,
    /// Message text
    pub body: String,
    /// Post time
    pub created_at: String,
    #[serde(default, skip_serializing)]
    total_count: i64,
}

impl PageRow for ChatMessageResponse {
    fn total_count(&self) -> i64 {
        self.total_count
    }
}

/// Chat rooms and messages
#[derive(Clone)]
pub struct ChatService {
    dispatcher: QueryDispatcher,
    defaults: PaginationDefaults,
}

impl ChatService {
    /// Create the service
    pub fn new(dispatcher: QueryDispatcher, defaults: PaginationDefaults) -> Self {
        Self {
            dispatcher,
            defaults,
        }
    }

    /// Open a chat room for a customer
    pub async fn create_room(&self, request: &CreateChatRoomRequest) -> AppResult<OutputEnvelope> {
        let customer_id = require_id("customer_id", request.customer_id)?;
        let room_name = require_text("room_name", &request.room_name)?;

        let params = ParamsBuilder::for_tenant(request.tenant_id)
            .add("customer_id", customer_id)
            .add_id("claim_id", request.claim_id)
            .add("room_name", room_name)
            .add_text("created_by", request.created_by.as_deref())
            .build();

        let envelope = self
            .dispatcher
            .execute_procedure(names::CHAT_CREATE_ROOM, params, CREATE_ROOM)
            .await?;

        info!(
            tenant_id = request.tenant_id,
            customer_id,
            room_id = ?envelope.id,
            response_code = ?envelope.response_code,
            "Chat room create requested"
        );
        Ok(envelope)
    }

    /// Search a customer's rooms, enriched with the customer's name and company
    pub async fn search_rooms(&self, search: &ChatRoomSearch) -> AppResult<Page<ChatRoomResponse>> {
        let customer_id = require_id("customer_id", search.customer_id)?;
        let (page, limit) = search.pagination.resolve(&self.defaults);
        let params = search.to_params(&self.defaults);

        let mut rooms: Page<ChatRoomResponse> = self
            .dispatcher
            .fetch_page(
                names::CHAT_SEARCH_ROOMS,
                names::CHAT_COUNT_ROOMS,
                &params,
                page,
                limit,
            )
            .await?;
        enrich_with_customer(&self.dispatcher, search.tenant_id, customer_id, &mut rooms.items)
            .await?;

        Ok(rooms)
    }

    /// Post a message to an active room
    pub async fn send_message(&self, request: &SendChatMessageRequest) -> AppResult<OutputEnvelope> {
        let room_id = require_id("room_id", request.room_id)?;
        let sender = require_text("sender", &request.sender)?;
        let body = require_text("body", &request.body)?;

        let params = ParamsBuilder::for_tenant(request.tenant_id)
            .add("room_id", room_id)
            .add("sender", sender)
            .add("body", body)
            .build();

        self.dispatcher
            .execute_procedure(names::CHAT_SEND_MESSAGE, params, SEND_MESSAGE)
            .await
    }

    /// Page through a room's messages, oldest first
    pub async fn get_messages(&self, search: &ChatMessageSearch) -> AppResult<Page<ChatMessageResponse>> {
        require_id("room_id", search.room_id)?;
        let (page, limit) = search.pagination.resolve(&self.defaults);
        let params = search.to_params(&self.defaults);

        self.dispatcher
            .fetch_page(
                names::CHAT_GET_MESSAGES,
                names::CHAT_COUNT_MESSAGES,
                &params,
                page,
                limit,
            )
            .await
    }

    /// Close an active room
    pub async fn close_room(&self, tenant_id: i64, room_id: i64) -> AppResult<OutputEnvelope> {
        let params = ParamsBuilder::for_tenant(tenant_id)
            .add("room_id", require_id("room_id", room_id)?)
            .build();

        let envelope = self
            .dispatcher
            .execute_procedure(names::CHAT_CLOSE_ROOM, params, CLOSE_ROOM)
            .await?;

        info!(tenant_id, room_id, status = ?envelope.status, "Chat room close requested");
        Ok(envelope)
    }
}

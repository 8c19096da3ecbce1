//! Email service
//!
//! Outbound emails are queued with a tracking id and later marked sent by
//! the delivery worker. Templates are stored per tenant and keyed by code.

use crate::data::command::Command;
use crate::data::params::QueryParams;
use crate::data::procedures::names;
use crate::data::record::bool_from_int;
use crate::error::AppResult;
use crate::query::{
    EnvelopeContract, OutputEnvelope, Page, PageRow, Pagination, PaginationDefaults,
    ParamsBuilder, QueryDispatcher, ToParams,
};
use crate::services::{require_id, require_text};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

const QUEUE_EMAIL: EnvelopeContract = EnvelopeContract::code_and_message().with_id("email_id");

const SAVE_TEMPLATE: EnvelopeContract = EnvelopeContract::code_and_message().with_id("template_id");

const MARK_SENT_SQL: &str = "UPDATE emails SET is_sent = 1, sent_at = datetime('now') \
     WHERE email_id = @email_id AND tenant_id = @tenant_id AND is_sent = 0";

/// Request to queue an outbound email
///
/// Either `subject` or a `template_code` whose template has a subject must be
/// given. Explicit subject and body override the template's.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueEmailRequest {
    /// Tenant scope
    pub tenant_id: i64,
    /// Claim the email relates to
    pub claim_id: Option<i64>,
    /// Template to render from
    pub template_code: Option<String>,
    /// Recipient address
    pub recipient: String,
    /// Subject line
    pub subject: Option<String>,
    /// Message body
    pub body: Option<String>,
}

/// Email template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplateResponse {
    /// Template id
    pub template_id: i64,
    /// Tenant-unique code
    pub template_code: String,
    /// Subject line
    pub subject: String,
    /// Body
    pub body: String,
}

/// Insert or replace the template with this code
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveTemplateRequest {
    /// Tenant scope
    pub tenant_id: i64,
    /// Tenant-unique code
    pub template_code: String,
    /// Subject line
    pub subject: String,
    /// Body
    pub body: Option<String>,
}

/// Email log search criteria
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailSearch {
    /// Tenant scope
    pub tenant_id: i64,
    /// Emails for this claim
    pub claim_id: Option<i64>,
    /// Recipient prefix
    pub recipient: Option<String>,
    /// Sent flag
    pub is_sent: Option<bool>,
    /// Requested page
    #[serde(flatten)]
    pub pagination: Pagination,
}

impl ToParams for EmailSearch {
    fn to_params(&self, defaults: &PaginationDefaults) -> QueryParams {
        ParamsBuilder::for_tenant(self.tenant_id)
            .add_id("claim_id", self.claim_id)
            .add_prefix("recipient", self.recipient.as_deref())
            .add_opt("is_sent", self.is_sent)
            .add_pagination(&self.pagination, defaults)
            .build()
    }
}

/// Email log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailResponse {
    /// Email id
    pub email_id: i64,
    /// Related claim
    pub claim_id: Option<i64>,
    /// Template it was rendered from
    pub template_id: Option<i64>,
    /// Recipient address
    pub recipient: String,
    /// Subject line
    pub subject: String,
    /// Tracking id assigned when queued
    pub tracking_id: String,
    /// Whether the email was delivered
    #[serde(deserialize_with = "bool_from_int")]
    pub is_sent: bool,
    /// Delivery time
    pub sent_at: Option<String>,
    /// Queue time
    pub created_at: String,
    #[serde(default, skip_serializing)]
    total_count: i64,
}

impl PageRow for EmailResponse {
    fn total_count(&self) -> i64 {
        self.total_count
    }
}

/// Outbound email queue and templates
#[derive(Clone)]
pub struct EmailService {
    dispatcher: QueryDispatcher,
    defaults: PaginationDefaults,
}

impl EmailService {
    /// Create the service
    pub fn new(dispatcher: QueryDispatcher, defaults: PaginationDefaults) -> Self {
        Self {
            dispatcher,
            defaults,
        }
    }

    /// Queue an email; the envelope id is the new email id
    pub async fn queue_email(&self, request: &QueueEmailRequest) -> AppResult<OutputEnvelope> {
        let recipient = require_text("recipient", &request.recipient)?;
        let tracking_id = Uuid::new_v4().to_string();

        let params = ParamsBuilder::for_tenant(request.tenant_id)
            .add_id("claim_id", request.claim_id)
            .add_text("template_code", request.template_code.as_deref())
            .add("recipient", recipient)
            .add_text("subject", request.subject.as_deref())
            .add_text("body", request.body.as_deref())
            .add("tracking_id", tracking_id.as_str())
            .build();

        let envelope = self
            .dispatcher
            .execute_procedure(names::EMAIL_QUEUE, params, QUEUE_EMAIL)
            .await?;

        info!(
            tenant_id = request.tenant_id,
            tracking_id = %tracking_id,
            email_id = ?envelope.id,
            queued = envelope.is_success(),
            "Email queue requested"
        );
        Ok(envelope)
    }

    /// Templates of a tenant, ordered by code
    pub async fn get_templates(&self, tenant_id: i64) -> AppResult<Vec<EmailTemplateResponse>> {
        self.dispatcher
            .fetch_all(
                &Command::procedure(names::EMAIL_GET_TEMPLATES),
                &ParamsBuilder::for_tenant(tenant_id).build(),
            )
            .await
    }

    /// Insert or replace a template
    pub async fn save_template(&self, request: &SaveTemplateRequest) -> AppResult<OutputEnvelope> {
        let params = ParamsBuilder::for_tenant(request.tenant_id)
            .add(
                "template_code",
                require_text("template_code", &request.template_code)?,
            )
            .add("subject", require_text("subject", &request.subject)?)
            .add_opt("body", request.body.as_deref())
            .build();

        self.dispatcher
            .execute_procedure(names::EMAIL_SAVE_TEMPLATE, params, SAVE_TEMPLATE)
            .await
    }

    /// Paged email log search
    pub async fn search_emails(&self, search: &EmailSearch) -> AppResult<Page<EmailResponse>> {
        let (page, limit) = search.pagination.resolve(&self.defaults);
        self.dispatcher
            .fetch_page(
                names::EMAIL_SEARCH,
                names::EMAIL_COUNT,
                &search.to_params(&self.defaults),
                page,
                limit,
            )
            .await
    }

    /// Mark a queued email as sent
    ///
    /// Returns the number of rows updated: 0 when the email is unknown,
    /// belongs to another tenant, or was already sent.
    pub async fn mark_sent(&self, tenant_id: i64, email_id: i64) -> AppResult<u64> {
        let params = ParamsBuilder::for_tenant(tenant_id)
            .add("email_id", require_id("email_id", email_id)?)
            .build();

        let result = self
            .dispatcher
            .execute(&Command::text(MARK_SENT_SQL), &params)
            .await?;

        debug!(tenant_id, email_id, affected_rows = result.affected_rows, "Email marked sent");
        Ok(result.affected_rows)
    }
}

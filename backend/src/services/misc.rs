//! Lookups, customers and dashboard counters

use crate::data::command::Command;
use crate::data::procedures::names;
use crate::error::AppResult;
use crate::query::{CustomerInfo, EnvelopeContract, OutputEnvelope, ParamsBuilder, QueryDispatcher};
use crate::services::{require_id, require_text};
use serde::{Deserialize, Serialize};
use tracing::info;

const SAVE_CUSTOMER: EnvelopeContract = EnvelopeContract::code_and_message().with_id("customer_id");

/// Claim status lookup entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimStatus {
    /// Status id
    pub status_id: i64,
    /// Display name
    pub status_name: String,
    /// Display order
    pub sort_order: i64,
}

/// State lookup entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Two-letter code
    pub state_code: String,
    /// Full name
    pub state_name: String,
}

/// Per-tenant counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    /// All claims
    pub total_claims: i64,
    /// Claims not closed or denied
    pub open_claims: i64,
    /// Chat rooms still active
    pub active_rooms: i64,
    /// Emails queued but not sent
    pub pending_emails: i64,
}

/// Request to create a customer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveCustomerRequest {
    /// Tenant scope
    pub tenant_id: i64,
    /// Display name
    pub customer_name: String,
    /// Company name
    pub company_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
}

/// Lookups, customers and dashboard counters
#[derive(Clone)]
pub struct MiscService {
    dispatcher: QueryDispatcher,
}

impl MiscService {
    /// Create the service
    pub fn new(dispatcher: QueryDispatcher) -> Self {
        Self { dispatcher }
    }

    /// All claim statuses in display order
    pub async fn get_claim_statuses(&self) -> AppResult<Vec<ClaimStatus>> {
        self.dispatcher
            .fetch_static(&Command::procedure(names::MISC_GET_CLAIM_STATUSES))
            .await
    }

    /// All states ordered by name
    pub async fn get_states(&self) -> AppResult<Vec<State>> {
        self.dispatcher
            .fetch_static(&Command::procedure(names::MISC_GET_STATES))
            .await
    }

    /// Name and company of a customer, `None` when unknown
    pub async fn get_customer_info(
        &self,
        tenant_id: i64,
        customer_id: i64,
    ) -> AppResult<Option<CustomerInfo>> {
        let params = ParamsBuilder::for_tenant(tenant_id)
            .add("customer_id", require_id("customer_id", customer_id)?)
            .build();

        self.dispatcher
            .fetch_optional(&Command::procedure(names::MISC_GET_CUSTOMER_INFO), &params)
            .await
    }

    /// Create a customer
    pub async fn save_customer(&self, request: &SaveCustomerRequest) -> AppResult<OutputEnvelope> {
        let params = ParamsBuilder::for_tenant(request.tenant_id)
            .add(
                "customer_name",
                require_text("customer_name", &request.customer_name)?,
            )
            .add_text("company_name", request.company_name.as_deref())
            .add_text("email", request.email.as_deref())
            .build();

        let envelope = self
            .dispatcher
            .execute_procedure(names::MISC_SAVE_CUSTOMER, params, SAVE_CUSTOMER)
            .await?;

        info!(
            tenant_id = request.tenant_id,
            customer_id = ?envelope.id,
            "Customer saved"
        );
        Ok(envelope)
    }

    /// Dashboard counters for a tenant
    pub async fn get_dashboard_counts(&self, tenant_id: i64) -> AppResult<DashboardCounts> {
        let counts = self
            .dispatcher
            .fetch_optional(
                &Command::procedure(names::MISC_GET_DASHBOARD_COUNTS),
                &ParamsBuilder::for_tenant(tenant_id).build(),
            )
            .await?;

        Ok(counts.unwrap_or_default())
    }
}

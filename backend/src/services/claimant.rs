//! Claimant service

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
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

const SAVE_CLAIMANT: EnvelopeContract = EnvelopeContract::code_and_message().with_id("claimant_id");

/// Claimant search criteria
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimantSearch {
    /// Tenant scope
    pub tenant_id: i64,
    /// Exact claimant id
    pub claimant_id: Option<i64>,
    /// Claimants of this customer
    pub customer_id: Option<i64>,
    /// First name prefix
    pub first_name: Option<String>,
    /// Last name prefix
    pub last_name: Option<String>,
    /// Exact email
    pub email: Option<String>,
    /// Two-letter state code
    pub state_code: Option<String>,
    /// Active flag
    pub is_active: Option<bool>,
    /// Requested page
    #[serde(flatten)]
    pub pagination: Pagination,
}

impl ToParams for ClaimantSearch {
    fn to_params(&self, defaults: &PaginationDefaults) -> QueryParams {
        ParamsBuilder::for_tenant(self.tenant_id)
            .add_id("claimant_id", self.claimant_id)
            .add_id("customer_id", self.customer_id)
            .add_prefix("first_name", self.first_name.as_deref())
            .add_prefix("last_name", self.last_name.as_deref())
            .add_text("email", self.email.as_deref())
            .add_text("state_code", self.state_code.as_deref())
            .add_opt("is_active", self.is_active)
            .add_pagination(&self.pagination, defaults)
            .build()
    }
}

/// Claimant as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimantResponse {
    /// Claimant id
    pub claimant_id: i64,
    /// Owning customer
    pub customer_id: Option<i64>,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address
    pub email: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Date of birth (`YYYY-MM-DD`)
    pub date_of_birth: Option<String>,
    /// Two-letter state code
    pub state_code: Option<String>,
    /// Whether the claimant is active
    #[serde(deserialize_with = "bool_from_int")]
    pub is_active: bool,
    /// Creation time
    pub created_at: String,
    /// Last update time
    pub updated_at: String,
    #[serde(default, skip_serializing)]
    total_count: i64,
}

impl PageRow for ClaimantResponse {
    fn total_count(&self) -> i64 {
        self.total_count
    }
}

/// Insert (no id) or update (with id) a claimant
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveClaimantRequest {
    /// Tenant scope
    pub tenant_id: i64,
    /// Existing claimant to update; `None` creates a new one
    pub claimant_id: Option<i64>,
    /// Owning customer
    pub customer_id: Option<i64>,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address
    pub email: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Date of birth
    pub date_of_birth: Option<NaiveDate>,
    /// Two-letter state code
    pub state_code: Option<String>,
    /// Active flag
    pub is_active: Option<bool>,
}

/// Claimant records
#[derive(Clone)]
pub struct ClaimantService {
    dispatcher: QueryDispatcher,
    defaults: PaginationDefaults,
}

impl ClaimantService {
    /// Create the service
    pub fn new(dispatcher: QueryDispatcher, defaults: PaginationDefaults) -> Self {
        Self {
            dispatcher,
            defaults,
        }
    }

    /// Search claimants; first and last name match by prefix
    pub async fn search_claimants(&self, search: &ClaimantSearch) -> AppResult<Page<ClaimantResponse>> {
        let (page, limit) = search.pagination.resolve(&self.defaults);
        self.dispatcher
            .fetch_page(
                names::CLAIMANT_SEARCH,
                names::CLAIMANT_COUNT,
                &search.to_params(&self.defaults),
                page,
                limit,
            )
            .await
    }

    /// Get one claimant
    pub async fn get_claimant(
        &self,
        tenant_id: i64,
        claimant_id: i64,
    ) -> AppResult<Option<ClaimantResponse>> {
        let params = ParamsBuilder::for_tenant(tenant_id)
            .add("claimant_id", require_id("claimant_id", claimant_id)?)
            .build();

        self.dispatcher
            .fetch_optional(&Command::procedure(names::CLAIMANT_GET), &params)
            .await
    }

    /// Create or update a claimant
    pub async fn save_claimant(&self, request: &SaveClaimantRequest) -> AppResult<OutputEnvelope> {
        let first_name = require_text("first_name", &request.first_name)?;
        let last_name = require_text("last_name", &request.last_name)?;

        let params = ParamsBuilder::for_tenant(request.tenant_id)
            .add_id("claimant_id", request.claimant_id)
            .add_id("customer_id", request.customer_id)
            .add("first_name", first_name)
            .add("last_name", last_name)
            .add_text("email", request.email.as_deref())
            .add_text("phone", request.phone.as_deref())
            .add_opt("date_of_birth", request.date_of_birth)
            .add_text("state_code", request.state_code.as_deref())
            .add_opt("is_active", request.is_active)
            .build();

        let envelope = self
            .dispatcher
            .execute_procedure(names::CLAIMANT_SAVE, params, SAVE_CLAIMANT)
            .await?;

        info!(
            tenant_id = request.tenant_id,
            claimant_id = ?envelope.id,
            message = ?envelope.message,
            "Claimant saved"
        );
        Ok(envelope)
    }
}

//! Claims service
//!
//! Claim search, creation and status changes. Claims listed for a customer
//! use a text query whose WHERE clause is assembled from the request.

use crate::data::command::Command;
use crate::data::params::QueryParams;
use crate::data::procedures::names;
use crate::error::AppResult;
use crate::query::enrich::enrich_with_customer;
use crate::query::{
    CustomerEnriched, EnvelopeContract, OutputEnvelope, Page, PageRow, Pagination,
    PaginationDefaults, ParamsBuilder, QueryDispatcher, ToParams,
};
use crate::services::require_id;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

const CREATE_CLAIM: EnvelopeContract = EnvelopeContract::code_and_message().with_id("claim_id");

const UPDATE_STATUS: EnvelopeContract = EnvelopeContract::code_and_message().with_status("status");

const CUSTOMER_CLAIMS_SQL: &str = "SELECT c.claim_id, c.customer_id, c.claimant_id, \
     cl.first_name || ' ' || cl.last_name AS claimant_name, \
     c.claim_number, c.status_id, s.status_name, c.description, c.amount, \
     c.incident_date, c.created_at, c.updated_at \
     FROM claims c \
     JOIN claim_statuses s ON s.status_id = c.status_id \
     LEFT JOIN claimants cl ON cl.claimant_id = c.claimant_id \
     WHERE c.tenant_id = @tenant_id AND c.customer_id = @customer_id";

/// Claim search criteria
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimSearch {
    /// Tenant scope
    pub tenant_id: i64,
    /// Exact claim id
    pub claim_id: Option<i64>,
    /// Claims of this customer
    pub customer_id: Option<i64>,
    /// Claims filed by this claimant
    pub claimant_id: Option<i64>,
    /// Claims in this status
    pub status_id: Option<i64>,
    /// Claim number prefix
    pub claim_number: Option<String>,
    /// Incidents on or after this date
    pub from_date: Option<NaiveDate>,
    /// Incidents on or before this date
    pub to_date: Option<NaiveDate>,
    /// Requested page
    #[serde(flatten)]
    pub pagination: Pagination,
}

impl ToParams for ClaimSearch {
    fn to_params(&self, defaults: &PaginationDefaults) -> QueryParams {
        ParamsBuilder::for_tenant(self.tenant_id)
            .add_id("claim_id", self.claim_id)
            .add_id("customer_id", self.customer_id)
            .add_id("claimant_id", self.claimant_id)
            .add_id("status_id", self.status_id)
            .add_prefix("claim_number", self.claim_number.as_deref())
            .add_opt("from_date", self.from_date)
            .add_opt("to_date", self.to_date)
            .add_pagination(&self.pagination, defaults)
            .build()
    }
}

/// Claim as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResponse {
    /// Claim id
    pub claim_id: i64,
    /// Owning customer
    pub customer_id: i64,
    /// Claimant who filed the claim
    pub claimant_id: Option<i64>,
    /// Claimant full name
    pub claimant_name: Option<String>,
    /// Tenant-unique claim number
    pub claim_number: String,
    /// Status id
    pub status_id: i64,
    /// Status name
    pub status_name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Claimed amount
    pub amount: f64,
    /// Date of the incident
    pub incident_date: Option<String>,
    /// Creation time
    pub created_at: String,
    /// Last update time
    pub updated_at: String,
    /// Customer name (enriched on customer listings)
    #[serde(default)]
    pub customer_name: String,
    /// Customer company (enriched on customer listings)
    #[serde(default)]
    pub company_name: String,
    #[serde(default, skip_serializing)]
    total_count: i64,
}

impl CustomerEnriched for ClaimResponse {
    fn set_customer(&mut self, customer_name: &str, company_name: &str) {
        self.customer_name = customer_name.to_string();
        self.company_name = company_name.to_string();
    }
}

impl PageRow for ClaimResponse {
    fn total_count(&self) -> i64 {
        self.total_count
    }
}

/// Request to file a claim
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateClaimRequest {
    /// Tenant scope
    pub tenant_id: i64,
    /// Owning customer
    pub customer_id: i64,
    /// Claimant filing the claim
    pub claimant_id: Option<i64>,
    /// Claim number; generated when absent
    pub claim_number: Option<String>,
    /// Initial status (procedure defaults to Open)
    pub status_id: Option<i64>,
    /// Free-text description
    pub description: Option<String>,
    /// Claimed amount
    pub amount: Option<f64>,
    /// Date of the incident
    pub incident_date: Option<NaiveDate>,
}

/// Request to move a claim to another status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClaimStatusRequest {
    /// Tenant scope
    pub tenant_id: i64,
    /// Claim to update
    pub claim_id: i64,
    /// New status
    pub status_id: i64,
}

/// Claims
#[derive(Clone)]
pub struct ClaimsService {
    dispatcher: QueryDispatcher,
    defaults: PaginationDefaults,
}

impl ClaimsService {
    /// Create the service
    pub fn new(dispatcher: QueryDispatcher, defaults: PaginationDefaults) -> Self {
        Self {
            dispatcher,
            defaults,
        }
    }

    /// Paged claim search
    pub async fn search_claims(&self, search: &ClaimSearch) -> AppResult<Page<ClaimResponse>> {
        let (page, limit) = search.pagination.resolve(&self.defaults);
        self.dispatcher
            .fetch_page(
                names::CLAIMS_SEARCH,
                names::CLAIMS_COUNT,
                &search.to_params(&self.defaults),
                page,
                limit,
            )
            .await
    }

    /// A customer's claims: one claim when `claim_id` is given, all of them otherwise
    ///
    /// Rows are enriched with the customer's name and company.
    pub async fn get_customer_claims(
        &self,
        tenant_id: i64,
        customer_id: i64,
        claim_id: Option<i64>,
    ) -> AppResult<Vec<ClaimResponse>> {
        let customer_id = require_id("customer_id", customer_id)?;
        let (command, params) = customer_claims_query(tenant_id, customer_id, claim_id);

        let mut claims: Vec<ClaimResponse> = self.dispatcher.fetch_all(&command, &params).await?;
        enrich_with_customer(&self.dispatcher, tenant_id, customer_id, &mut claims).await?;

        Ok(claims)
    }

    /// File a claim
    pub async fn create_claim(&self, request: &CreateClaimRequest) -> AppResult<OutputEnvelope> {
        let customer_id = require_id("customer_id", request.customer_id)?;
        let claim_number = match request.claim_number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => number.to_string(),
            _ => generate_claim_number(),
        };

        let params = ParamsBuilder::for_tenant(request.tenant_id)
            .add("customer_id", customer_id)
            .add_id("claimant_id", request.claimant_id)
            .add("claim_number", claim_number.as_str())
            .add_id("status_id", request.status_id)
            .add_text("description", request.description.as_deref())
            .add_opt("amount", request.amount)
            .add_opt("incident_date", request.incident_date)
            .build();

        let envelope = self
            .dispatcher
            .execute_procedure(names::CLAIMS_CREATE, params, CREATE_CLAIM)
            .await?;

        info!(
            tenant_id = request.tenant_id,
            customer_id,
            claim_number = %claim_number,
            claim_id = ?envelope.id,
            "Claim create requested"
        );
        Ok(envelope)
    }

    /// Move a claim to another status
    pub async fn update_claim_status(
        &self,
        request: &UpdateClaimStatusRequest,
    ) -> AppResult<OutputEnvelope> {
        let params = ParamsBuilder::for_tenant(request.tenant_id)
            .add("claim_id", require_id("claim_id", request.claim_id)?)
            .add("status_id", require_id("status_id", request.status_id)?)
            .build();

        self.dispatcher
            .execute_procedure(names::CLAIMS_UPDATE_STATUS, params, UPDATE_STATUS)
            .await
    }
}

/// Text query for a customer's claims, narrowed to one claim when an id is present
fn customer_claims_query(
    tenant_id: i64,
    customer_id: i64,
    claim_id: Option<i64>,
) -> (Command, QueryParams) {
    let mut sql = String::from(CUSTOMER_CLAIMS_SQL);
    let mut builder = ParamsBuilder::for_tenant(tenant_id).add("customer_id", customer_id);

    if let Some(id) = claim_id.filter(|id| *id > 0) {
        sql.push_str(" AND c.claim_id = @claim_id");
        builder = builder.add("claim_id", id);
    }
    sql.push_str(" ORDER BY c.claim_id");

    (Command::text(sql), builder.build())
}

/// `CLM-` followed by eight uppercase hex digits
fn generate_claim_number() -> String {
    let id = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("CLM-{}", &id[..8])
}

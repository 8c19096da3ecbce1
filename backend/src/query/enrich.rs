//! Customer enrichment
//!
//! Attaches customer name and company to primary rows using one secondary
//! lookup per call, however many rows there are.

use crate::data::command::Command;
use crate::data::procedures::names;
use crate::error::AppResult;
use crate::query::builder::ParamsBuilder;
use crate::query::dispatch::QueryDispatcher;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Customer fields attached to enriched rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Customer id
    #[serde(default)]
    pub customer_id: i64,
    /// Customer display name
    pub customer_name: String,
    /// Company the customer belongs to
    pub company_name: String,
}

impl CustomerInfo {
    /// Create customer info
    pub fn new(customer_id: i64, customer_name: &str, company_name: &str) -> Self {
        Self {
            customer_id,
            customer_name: customer_name.to_string(),
            company_name: company_name.to_string(),
        }
    }
}

/// Rows that can carry customer fields
pub trait CustomerEnriched {
    /// Set the customer name and company on this row
    fn set_customer(&mut self, customer_name: &str, company_name: &str);
}

/// Attach `info` to every row; a miss attaches empty strings
pub fn attach_customer_info<R: CustomerEnriched>(rows: &mut [R], info: Option<&CustomerInfo>) {
    let (name, company) = info
        .map(|c| (c.customer_name.as_str(), c.company_name.as_str()))
        .unwrap_or(("", ""));
    for row in rows.iter_mut() {
        row.set_customer(name, company);
    }
}

/// Look up the customer once and attach it to every row
///
/// No lookup is issued for an empty row set. Lookup failures propagate.
pub async fn enrich_with_customer<R: CustomerEnriched>(
    dispatcher: &QueryDispatcher,
    tenant_id: i64,
    customer_id: i64,
    rows: &mut [R],
) -> AppResult<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let params = ParamsBuilder::for_tenant(tenant_id)
        .add("customer_id", customer_id)
        .build();
    let info: Option<CustomerInfo> = dispatcher
        .fetch_optional(&Command::procedure(names::MISC_GET_CUSTOMER_INFO), &params)
        .await?;

    if info.is_none() {
        warn!(
            tenant_id,
            customer_id,
            rows = rows.len(),
            "Customer lookup missed, enriching with blanks"
        );
    }

    attach_customer_info(rows, info.as_ref());
    Ok(())
}

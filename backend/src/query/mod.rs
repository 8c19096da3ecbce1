//! Query layer
//!
//! Turns request view-models into parameter sets, dispatches them through the
//! data-access abstraction, and maps what comes back: typed rows, output
//! envelopes, and customer enrichment.

pub mod builder;
pub mod dispatch;
pub mod enrich;
pub mod output;
pub mod pagination;

pub use builder::{ParamsBuilder, ToParams};
pub use dispatch::QueryDispatcher;
pub use enrich::{attach_customer_info, CustomerEnriched, CustomerInfo};
pub use output::{EnvelopeContract, OutputEnvelope};
pub use pagination::{Page, PageRow, Pagination, PaginationDefaults};

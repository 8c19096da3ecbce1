//! Service layer for business logic
//!
//! Each service accepts a view-model, builds query parameters, dispatches
//! them through the data-access abstraction and maps the results.

pub mod chat;
pub mod claimant;
pub mod claims;
pub mod email;
pub mod misc;

pub use chat::ChatService;
pub use claimant::ClaimantService;
pub use claims::ClaimsService;
pub use email::EmailService;
pub use misc::MiscService;

use crate::data::DataAccess;
use crate::error::AppError;
use crate::query::{PaginationDefaults, QueryDispatcher};
use std::sync::Arc;

/// All services sharing one data-access implementation
#[derive(Clone)]
pub struct Services {
    /// Chat rooms and messages
    pub chat: ChatService,
    /// Claimant records
    pub claimant: ClaimantService,
    /// Claims
    pub claims: ClaimsService,
    /// Outbound email queue and templates
    pub email: EmailService,
    /// Lookups, customers and dashboard counters
    pub misc: MiscService,
}

impl Services {
    /// Build every service over the same data access
    pub fn new(data: Arc<dyn DataAccess>, defaults: PaginationDefaults) -> Self {
        let dispatcher = QueryDispatcher::new(data);
        Self {
            chat: ChatService::new(dispatcher.clone(), defaults),
            claimant: ClaimantService::new(dispatcher.clone(), defaults),
            claims: ClaimsService::new(dispatcher.clone(), defaults),
            email: EmailService::new(dispatcher.clone(), defaults),
            misc: MiscService::new(dispatcher),
        }
    }
}

/// Reject a missing or non-positive id
pub(crate) fn require_id(field: &str, id: i64) -> Result<i64, AppError> {
    if id <= 0 {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(id)
}

/// Reject blank text, returning it trimmed
pub(crate) fn require_text<'a>(field: &str, text: &'a str) -> Result<&'a str, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} cannot be empty", field)));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id() {
        assert_eq!(require_id("room_id", 3).unwrap(), 3);
        assert!(matches!(require_id("room_id", 0), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("body", "  hi ").unwrap(), "hi");
        let err = require_text("body", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: body cannot be empty");
    }
}

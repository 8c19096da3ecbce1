//! Claims Service Library
//!
//! Parameterized query building and result mapping for the chat, claimant,
//! claims, email and lookup services of a multi-tenant claims system.
//! The startup binary is in `src/main.rs`.

pub mod config;
/// Data-access abstraction and its SQLite and scripted implementations
pub mod data;
pub mod error;
pub mod query;
pub mod services;

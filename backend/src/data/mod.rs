//! Data access module
//!
//! Defines the data-access abstraction the services talk to, the parameter and
//! row types that cross it, and two implementations: a SQLite-backed one with
//! an emulated stored-procedure catalog, and a scripted one for tests.

pub mod access;
pub mod command;
pub mod params;
pub mod procedures;
pub mod record;
pub mod scripted;
pub mod sqlite;

pub use access::{DataAccess, OutputValues, WriteResult};
pub use command::{Command, CommandKind};
pub use params::{Direction, ParamValue, QueryParams};
pub use procedures::{Procedure, ProcedureCatalog};
pub use record::Record;
pub use scripted::{RecordedCall, ScriptedDataAccess};
pub use sqlite::SqliteDataAccess;

//! Command identifiers
//!
//! A command is either a stored-procedure name or a literal SQL text with
//! named `@placeholders`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the data-access layer interprets a command identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Identifier names a precompiled stored procedure
    StoredProcedure,
    /// Identifier is literal query text
    Text,
}

impl CommandKind {
    /// Convert the kind to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::StoredProcedure => "stored_procedure",
            CommandKind::Text => "text",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command identifier paired with its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Procedure name or query text
    pub identifier: String,
    /// How to interpret the identifier
    pub kind: CommandKind,
}

impl Command {
    /// Stored procedure command
    pub fn procedure(name: impl Into<String>) -> Self {
        Self {
            identifier: name.into(),
            kind: CommandKind::StoredProcedure,
        }
    }

    /// Literal text command
    pub fn text(sql: impl Into<String>) -> Self {
        Self {
            identifier: sql.into(),
            kind: CommandKind::Text,
        }
    }

    /// Short label for logs (text commands are truncated)
    pub fn label(&self) -> String {
        match self.kind {
            CommandKind::StoredProcedure => self.identifier.clone(),
            CommandKind::Text => {
                let flat = self.identifier.split_whitespace().collect::<Vec<_>>().join(" ");
                if flat.chars().count() > 60 {
                    format!("{}...", flat.chars().take(57).collect::<String>())
                } else {
                    flat
                }
            }
        }
    }
}

//! Backend selector.
//!
//! Every operation names the store that should serve it. The transport layer
//! decides how a request encodes that choice; past that boundary only this
//! enum travels.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Which record store serves a call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Schemaless document collection (object-id identifiers).
    Document,
    /// Fixed-column table (UUID identifiers).
    Relational,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Document, Backend::Relational];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Document => "document",
            Backend::Relational => "relational",
        }
    }

    /// Resolve a boolean-style selector: absent, blank or `false` picks the
    /// document store, `true` the relational store. Case and surrounding
    /// whitespace are ignored.
    pub fn from_flag(flag: Option<&str>) -> DomainResult<Self> {
        let flag = flag.map(str::trim).unwrap_or_default();
        match flag.to_ascii_lowercase().as_str() {
            "" | "false" => Ok(Backend::Document),
            "true" => Ok(Backend::Relational),
            _ => Err(DomainError::invalid_backend(format!(
                "flag must be 'true' or 'false', got '{flag}'"
            ))),
        }
    }
}

impl core::fmt::Display for Backend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

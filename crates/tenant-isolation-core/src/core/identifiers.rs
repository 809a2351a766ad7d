// crates/tenant-isolation-core/src/core/identifiers.rs
// ============================================================================
// Module: Tenant Isolation Identifiers
// Description: Validated tenant identifiers and resource classification enums.
// Purpose: Provide strongly typed IDs that are safe inside platform names.
// Dependencies: rand, serde, thiserror
// ============================================================================

//! ## Overview
//! Tenant identifiers end up inside network names, container names, labels,
//! SQL literals and cache keys. They are validated once at construction so
//! every downstream consumer can embed them without quoting.
//!
//! ## Invariants
//! - A [`TenantId`] is 1..=40 chars of `[a-z0-9-]` and starts alphanumeric.
//! - [`ServiceRole`] and [`ResourceKind`] labels are stable for reports.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum length of a tenant identifier.
pub const MAX_TENANT_ID_LENGTH: usize = 40;

// ============================================================================
// SECTION: Tenant Identifier
// ============================================================================

/// Identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier was empty.
    #[error("tenant id must not be empty")]
    Empty,
    /// Identifier exceeded [`MAX_TENANT_ID_LENGTH`].
    #[error("tenant id exceeds {MAX_TENANT_ID_LENGTH} characters: {0}")]
    TooLong(String),
    /// Identifier contained a character outside `[a-z0-9-]`.
    #[error("tenant id contains invalid character '{character}': {id}")]
    InvalidCharacter {
        /// Offending identifier.
        id: String,
        /// First invalid character.
        character: char,
    },
    /// Identifier did not start with an alphanumeric character.
    #[error("tenant id must start with a lowercase letter or digit: {0}")]
    InvalidStart(String),
}

/// Opaque tenant identifier, validated for embedding in platform names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Validates and wraps a caller-supplied tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the identifier is empty, too long, or
    /// contains characters outside `[a-z0-9-]`.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        let Some(first) = id.chars().next() else {
            return Err(IdentifierError::Empty);
        };
        if id.len() > MAX_TENANT_ID_LENGTH {
            return Err(IdentifierError::TooLong(id));
        }
        if let Some(character) =
            id.chars().find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == '-'))
        {
            return Err(IdentifierError::InvalidCharacter {
                id,
                character,
            });
        }
        if first == '-' {
            return Err(IdentifierError::InvalidStart(id));
        }
        Ok(Self(id))
    }

    /// Generates an ephemeral test tenant identifier for the given index.
    #[must_use]
    pub fn generate(index: usize) -> Self {
        let suffix: u32 = rand::thread_rng().r#gen();
        Self(format!("tenant-{index}-{suffix:08x}"))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for TenantId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Service role of a per-tenant container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRole {
    /// Tenant database (`PostgreSQL`).
    Database,
    /// Tenant cache (Redis).
    Cache,
    /// Tenant application workload.
    Application,
}

impl ServiceRole {
    /// All roles in provisioning order.
    pub const ALL: [Self; 3] = [Self::Database, Self::Cache, Self::Application];

    /// Returns a stable label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Application => "application",
        }
    }

    /// Parses a role label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == label)
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of platform resource owned by a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Virtual network.
    Network,
    /// Service container.
    Container,
    /// Named volume. Never logged; only the recovery sweep removes volumes.
    Volume,
}

impl ResourceKind {
    /// Returns a stable label for the resource kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Container => "container",
            Self::Volume => "volume",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

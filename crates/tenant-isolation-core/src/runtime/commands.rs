// crates/tenant-isolation-core/src/runtime/commands.rs
// ============================================================================
// Module: In-Container Commands
// Description: Builders for readiness, reachability, and storage commands.
// Purpose: Keep every command the validator executes in one auditable place.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Readiness polling and the isolation probes act on tenant services only by
//! executing commands inside containers. The builders here define those
//! commands; both the Docker adapter and the in-memory simulator see exactly
//! these argument vectors.
//!
//! ## Invariants
//! - Values interpolated into SQL are restricted to `[a-z0-9_-]` by
//!   [`crate::core::TenantId`] validation and hex suffixes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::core::TenantCredentials;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Table holding data-isolation markers.
pub const MARKER_TABLE: &str = "isolation_markers";

/// Mount point for the database volume.
pub const DATABASE_DATA_PATH: &str = "/var/lib/postgresql/data";

/// Mount point for the cache volume.
pub const CACHE_DATA_PATH: &str = "/data";

// ============================================================================
// SECTION: Service Commands
// ============================================================================

/// Cache server command enforcing password authentication.
#[must_use]
pub fn cache_server_command(password: &str) -> Vec<String> {
    args(&["redis-server", "--requirepass", password, "--appendonly", "yes"])
}

/// Database readiness check.
#[must_use]
pub fn database_ready_command(credentials: &TenantCredentials) -> Vec<String> {
    args(&["pg_isready", "-U", &credentials.database_user, "-d", &credentials.database_name])
}

/// Cache readiness check; a ready cache answers `PONG`.
#[must_use]
pub fn cache_ping_command(credentials: &TenantCredentials) -> Vec<String> {
    cache_cli(credentials, &["PING"])
}

// ============================================================================
// SECTION: Probe Commands
// ============================================================================

/// TCP connect attempt; exit code 0 means the target accepted the connection.
#[must_use]
pub fn tcp_connect_command(host: &str, port: u16, timeout: Duration) -> Vec<String> {
    let seconds = timeout.as_secs().max(1).to_string();
    let port = port.to_string();
    args(&["nc", "-z", "-w", &seconds, host, &port])
}

/// Upserts a marker row into the tenant database.
#[must_use]
pub fn database_write_command(
    credentials: &TenantCredentials,
    key: &str,
    value: &str,
) -> Vec<String> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {MARKER_TABLE} (marker_key TEXT PRIMARY KEY, marker_value \
         TEXT NOT NULL); INSERT INTO {MARKER_TABLE} (marker_key, marker_value) VALUES ('{key}', \
         '{value}') ON CONFLICT (marker_key) DO UPDATE SET marker_value = EXCLUDED.marker_value;"
    );
    database_cli(credentials, &sql)
}

/// Reads a marker row back from the tenant database.
#[must_use]
pub fn database_read_command(credentials: &TenantCredentials, key: &str) -> Vec<String> {
    let sql = format!("SELECT marker_value FROM {MARKER_TABLE} WHERE marker_key = '{key}';");
    database_cli(credentials, &sql)
}

/// Stores a marker key in the tenant cache.
#[must_use]
pub fn cache_set_command(credentials: &TenantCredentials, key: &str, value: &str) -> Vec<String> {
    cache_cli(credentials, &["SET", key, value])
}

/// Reads a marker key from the tenant cache.
#[must_use]
pub fn cache_get_command(credentials: &TenantCredentials, key: &str) -> Vec<String> {
    cache_cli(credentials, &["GET", key])
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a `psql` invocation that fails on the first SQL error.
fn database_cli(credentials: &TenantCredentials, sql: &str) -> Vec<String> {
    args(&[
        "psql",
        "-U",
        &credentials.database_user,
        "-d",
        &credentials.database_name,
        "-v",
        "ON_ERROR_STOP=1",
        "-tAc",
        sql,
    ])
}

/// Builds an authenticated `redis-cli` invocation.
fn cache_cli(credentials: &TenantCredentials, command: &[&str]) -> Vec<String> {
    let mut argv = args(&["redis-cli", "-a", &credentials.cache_password, "--no-auth-warning"]);
    argv.extend(command.iter().map(|part| (*part).to_string()));
    argv
}

/// Converts borrowed arguments into an owned argument vector.
fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}

// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for Docker system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement so a typo in a
//! CI variable fails the run instead of silently falling back to defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Upper bound for a single Docker-backed scenario when no override is set.
pub const DEFAULT_SYSTEM_TEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Largest tenant count a system test may request.
const MAX_SYSTEM_TEST_TENANTS: usize = 8;

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Optional Docker binary override.
    DockerBinary,
    /// Optional tenant count override (1 through 8).
    Tenants,
    /// Optional timeout override in seconds (positive integer).
    TimeoutSeconds,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DockerBinary => "TENANT_ISOLATION_SYSTEM_TEST_DOCKER",
            Self::Tenants => "TENANT_ISOLATION_SYSTEM_TEST_TENANTS",
            Self::TimeoutSeconds => "TENANT_ISOLATION_SYSTEM_TEST_TIMEOUT_SEC",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Optional Docker binary override.
    pub docker_binary: Option<PathBuf>,
    /// Optional tenant count override.
    pub tenants: Option<usize>,
    /// Optional timeout override.
    pub timeout: Option<Duration>,
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, a zero timeout or tenant count).
    pub fn load() -> Result<Self, String> {
        let docker_binary =
            read_env_nonempty(SystemTestEnv::DockerBinary.as_str())?.map(PathBuf::from);
        let tenants = read_env_nonempty(SystemTestEnv::Tenants.as_str())?
            .map(|value| parse_tenants(SystemTestEnv::Tenants.as_str(), &value))
            .transpose()?;
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        Ok(Self {
            docker_binary,
            tenants,
            timeout,
        })
    }

    /// Returns the configured timeout or [`DEFAULT_SYSTEM_TEST_TIMEOUT`].
    #[must_use]
    pub fn timeout_or_default(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_SYSTEM_TEST_TIMEOUT)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a tenant count in `1..=8`.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or out of range.
fn parse_tenants(name: &str, raw: &str) -> Result<usize, String> {
    let count: usize = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer tenant count"))?;
    if count == 0 || count > MAX_SYSTEM_TEST_TENANTS {
        return Err(format!("{name} must be between 1 and {MAX_SYSTEM_TEST_TENANTS}"));
    }
    Ok(count)
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

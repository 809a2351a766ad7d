// crates/tenant-isolation-core/src/core/settings.rs
// ============================================================================
// Module: Validator Settings
// Description: Runtime settings consumed by provisioning, probes, and cleanup.
// Purpose: Provide typed, validated knobs with production defaults.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Settings are plain data. The config crate parses and validates operator
//! input, then converts it into [`ValidatorSettings`]; tests build settings
//! directly and shrink timings as needed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::core::identifiers::ServiceRole;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bytes per mebibyte.
pub const MIB: u64 = 1024 * 1024;
/// Default readiness attempts before a service is declared failed.
pub const DEFAULT_READINESS_ATTEMPTS: u32 = 30;
/// Default readiness poll interval.
pub const DEFAULT_READINESS_INTERVAL: Duration = Duration::from_secs(2);
/// Default graceful stop timeout before the platform force-kills.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);
/// Default connect timeout for reachability probes.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Default database port.
pub const DEFAULT_DATABASE_PORT: u16 = 5432;
/// Default cache port.
pub const DEFAULT_CACHE_PORT: u16 = 6379;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Container image and limits for one service role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Container image reference.
    pub image: String,
    /// Hard memory ceiling in bytes.
    pub memory_bytes: u64,
    /// CPU set restriction (for example `0` or `0-1`).
    pub cpuset: Option<String>,
}

/// Per-role service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProfiles {
    /// Database service.
    pub database: ServiceSettings,
    /// Cache service.
    pub cache: ServiceSettings,
    /// Application service.
    pub application: ServiceSettings,
    /// Command run by the application container (image default when empty).
    pub application_command: Vec<String>,
}

impl ServiceProfiles {
    /// Returns settings for a role.
    #[must_use]
    pub const fn for_role(&self, role: ServiceRole) -> &ServiceSettings {
        match role {
            ServiceRole::Database => &self.database,
            ServiceRole::Cache => &self.cache,
            ServiceRole::Application => &self.application,
        }
    }
}

impl Default for ServiceProfiles {
    fn default() -> Self {
        Self {
            database: ServiceSettings {
                image: "postgres:15-alpine".to_string(),
                memory_bytes: 512 * MIB,
                cpuset: Some("0".to_string()),
            },
            cache: ServiceSettings {
                image: "redis:7-alpine".to_string(),
                memory_bytes: 256 * MIB,
                cpuset: Some("0".to_string()),
            },
            application: ServiceSettings {
                image: "alpine:3.20".to_string(),
                memory_bytes: 1024 * MIB,
                cpuset: Some("0".to_string()),
            },
            application_command: vec![
                "sh".to_string(),
                "-c".to_string(),
                "trap 'exit 0' TERM INT; while true; do sleep 1; done".to_string(),
            ],
        }
    }
}

/// Bounded polling policy for readiness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Maximum number of polls.
    pub attempts: u32,
    /// Delay after each unsuccessful poll.
    pub interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_READINESS_ATTEMPTS,
            interval: DEFAULT_READINESS_INTERVAL,
        }
    }
}

/// Probe tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Connect timeout for reachability attempts.
    pub connect_timeout: Duration,
    /// Database listen port.
    pub database_port: u16,
    /// Cache listen port.
    pub cache_port: u16,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            database_port: DEFAULT_DATABASE_PORT,
            cache_port: DEFAULT_CACHE_PORT,
        }
    }
}

/// Settings for a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSettings {
    /// Service images and limits.
    pub services: ServiceProfiles,
    /// Readiness polling.
    pub readiness: ReadinessPolicy,
    /// Probe tuning.
    pub probes: ProbeSettings,
    /// Graceful stop timeout used during cleanup.
    pub stop_timeout: Duration,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            services: ServiceProfiles::default(),
            readiness: ReadinessPolicy::default(),
            probes: ProbeSettings::default(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

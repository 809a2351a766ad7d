// crates/tenant-isolation-config/src/config.rs
// ============================================================================
// Module: Tenant Isolation Configuration
// Description: Configuration loading and validation for the validator.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: tenant-isolation-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path is resolved from the explicit argument, then
//! `TENANT_ISOLATION_CONFIG`, then `tenant-isolation.toml` in the working
//! directory. Only the last source may be absent; the built-in defaults apply
//! then. Every section is optional and defaults to the production profile.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tenant_isolation_core::MIB;
use tenant_isolation_core::ProbeSettings;
use tenant_isolation_core::ReadinessPolicy;
use tenant_isolation_core::ServiceProfiles;
use tenant_isolation_core::ServiceSettings;
use tenant_isolation_core::ValidatorSettings;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "tenant-isolation.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TENANT_ISOLATION_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default tenant count per run.
pub(crate) const DEFAULT_TENANTS: usize = 2;
/// Maximum tenants per run.
pub(crate) const MAX_TENANTS: usize = 32;
/// Maximum image reference length.
pub(crate) const MAX_IMAGE_REFERENCE_LENGTH: usize = 255;
/// Maximum application command arguments.
pub(crate) const MAX_COMMAND_ARGS: usize = 64;
/// Smallest memory ceiling Docker accepts.
pub(crate) const MIN_MEMORY_MIB: u64 = 6;
/// Largest memory ceiling accepted per container.
pub(crate) const MAX_MEMORY_MIB: u64 = 64 * 1024;
/// Maximum cpuset expression length.
pub(crate) const MAX_CPUSET_LENGTH: usize = 64;
/// Maximum readiness attempts.
pub(crate) const MAX_READINESS_ATTEMPTS: u32 = 600;
/// Maximum readiness poll interval.
pub(crate) const MAX_READINESS_INTERVAL_MS: u64 = 60_000;
/// Maximum reachability connect timeout.
pub(crate) const MAX_CONNECT_TIMEOUT_SECS: u64 = 60;
/// Maximum graceful stop timeout.
pub(crate) const MAX_STOP_TIMEOUT_SECS: u64 = 300;

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// Root of `tenant-isolation.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IsolationConfig {
    /// Run shape.
    #[serde(default)]
    pub run: RunConfig,
    /// Service images.
    #[serde(default)]
    pub images: ImagesConfig,
    /// Per-role resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Readiness polling.
    #[serde(default)]
    pub readiness: ReadinessConfig,
    /// Probe tuning.
    #[serde(default)]
    pub probes: ProbesConfig,
    /// Teardown tuning.
    #[serde(default)]
    pub cleanup: CleanupConfig,
    /// Docker client settings.
    #[serde(default)]
    pub docker: DockerConfig,
}

impl IsolationConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var(CONFIG_ENV_VAR).ok();
        let Some(resolved) = resolve_path(path, env_path)? else {
            return Ok(Self::default());
        };
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates TOML content.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration against hard limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.validate()?;
        self.images.validate()?;
        self.limits.validate()?;
        self.readiness.validate()?;
        self.probes.validate()?;
        self.cleanup.validate()?;
        self.docker.validate()
    }

    /// Converts into runtime settings.
    #[must_use]
    pub fn to_settings(&self) -> ValidatorSettings {
        let defaults = ServiceProfiles::default();
        ValidatorSettings {
            services: ServiceProfiles {
                database: self.limits.database.service(&self.images.database),
                cache: self.limits.cache.service(&self.images.cache),
                application: self.limits.application.service(&self.images.application),
                application_command: self
                    .images
                    .application_command
                    .clone()
                    .unwrap_or(defaults.application_command),
            },
            readiness: ReadinessPolicy {
                attempts: self.readiness.attempts,
                interval: Duration::from_millis(self.readiness.interval_ms),
            },
            probes: ProbeSettings {
                connect_timeout: Duration::from_secs(self.probes.connect_timeout_secs),
                database_port: self.probes.database_port,
                cache_port: self.probes.cache_port,
            },
            stop_timeout: Duration::from_secs(self.cleanup.stop_timeout_secs),
        }
    }
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// `[run]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Tenants provisioned per run.
    #[serde(default = "default_tenants")]
    pub tenants: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tenants: default_tenants(),
        }
    }
}

impl RunConfig {
    /// Validates the run shape.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.tenants == 0 || self.tenants > MAX_TENANTS {
            return Err(ConfigError::Invalid(format!(
                "run.tenants must be between 1 and {MAX_TENANTS}"
            )));
        }
        Ok(())
    }
}

/// `[images]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImagesConfig {
    /// Database image.
    #[serde(default = "default_database_image")]
    pub database: String,
    /// Cache image.
    #[serde(default = "default_cache_image")]
    pub cache: String,
    /// Application image.
    #[serde(default = "default_application_image")]
    pub application: String,
    /// Application command override; the built-in idle loop when absent.
    #[serde(default)]
    pub application_command: Option<Vec<String>>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            database: default_database_image(),
            cache: default_cache_image(),
            application: default_application_image(),
            application_command: None,
        }
    }
}

impl ImagesConfig {
    /// Validates image references and the command override.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_image("images.database", &self.database)?;
        validate_image("images.cache", &self.cache)?;
        validate_image("images.application", &self.application)?;
        if let Some(command) = &self.application_command {
            if command.is_empty() {
                return Err(ConfigError::Invalid(
                    "images.application_command must be non-empty when set".to_string(),
                ));
            }
            if command.len() > MAX_COMMAND_ARGS {
                return Err(ConfigError::Invalid(
                    "images.application_command has too many arguments".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// `[limits.<role>]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleLimits {
    /// Hard memory ceiling in MiB.
    pub memory_mib: u64,
    /// CPU set restriction; unrestricted when absent.
    #[serde(default)]
    pub cpuset: Option<String>,
}

impl RoleLimits {
    /// Validates limits for the named role.
    fn validate(&self, role: &str) -> Result<(), ConfigError> {
        if !(MIN_MEMORY_MIB..=MAX_MEMORY_MIB).contains(&self.memory_mib) {
            return Err(ConfigError::Invalid(format!(
                "limits.{role}.memory_mib must be between {MIN_MEMORY_MIB} and {MAX_MEMORY_MIB}"
            )));
        }
        if let Some(cpuset) = &self.cpuset {
            validate_cpuset(role, cpuset)?;
        }
        Ok(())
    }

    /// Builds service settings for `image`.
    fn service(&self, image: &str) -> ServiceSettings {
        ServiceSettings {
            image: image.to_string(),
            memory_bytes: self.memory_mib * MIB,
            cpuset: self.cpuset.clone(),
        }
    }

    /// Limits taken from a built-in service profile.
    fn from_profile(profile: &ServiceSettings) -> Self {
        Self {
            memory_mib: profile.memory_bytes / MIB,
            cpuset: profile.cpuset.clone(),
        }
    }
}

/// `[limits]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LimitsConfig {
    /// Database limits.
    #[serde(default = "default_database_limits")]
    pub database: RoleLimits,
    /// Cache limits.
    #[serde(default = "default_cache_limits")]
    pub cache: RoleLimits,
    /// Application limits.
    #[serde(default = "default_application_limits")]
    pub application: RoleLimits,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            database: default_database_limits(),
            cache: default_cache_limits(),
            application: default_application_limits(),
        }
    }
}

impl LimitsConfig {
    /// Validates every role.
    fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate("database")?;
        self.cache.validate("cache")?;
        self.application.validate("application")
    }
}

/// `[readiness]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadinessConfig {
    /// Maximum readiness polls per service.
    #[serde(default = "default_readiness_attempts")]
    pub attempts: u32,
    /// Delay between polls in milliseconds.
    #[serde(default = "default_readiness_interval_ms")]
    pub interval_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            attempts: default_readiness_attempts(),
            interval_ms: default_readiness_interval_ms(),
        }
    }
}

impl ReadinessConfig {
    /// Validates polling bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.attempts == 0 || self.attempts > MAX_READINESS_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "readiness.attempts must be between 1 and {MAX_READINESS_ATTEMPTS}"
            )));
        }
        if self.interval_ms == 0 || self.interval_ms > MAX_READINESS_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "readiness.interval_ms must be between 1 and {MAX_READINESS_INTERVAL_MS}"
            )));
        }
        Ok(())
    }
}

/// `[probes]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbesConfig {
    /// Reachability connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Database port probed for reachability.
    #[serde(default = "default_database_port")]
    pub database_port: u16,
    /// Cache port probed for reachability.
    #[serde(default = "default_cache_port")]
    pub cache_port: u16,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            database_port: default_database_port(),
            cache_port: default_cache_port(),
        }
    }
}

impl ProbesConfig {
    /// Validates probe tuning.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > MAX_CONNECT_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "probes.connect_timeout_secs must be between 1 and {MAX_CONNECT_TIMEOUT_SECS}"
            )));
        }
        if self.database_port == 0 || self.cache_port == 0 {
            return Err(ConfigError::Invalid("probe ports must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// `[cleanup]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CleanupConfig {
    /// Graceful stop timeout in seconds before force removal.
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            stop_timeout_secs: default_stop_timeout_secs(),
        }
    }
}

impl CleanupConfig {
    /// Validates the stop timeout.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.stop_timeout_secs > MAX_STOP_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "cleanup.stop_timeout_secs must be at most {MAX_STOP_TIMEOUT_SECS}"
            )));
        }
        Ok(())
    }
}

/// `[docker]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DockerConfig {
    /// Docker CLI binary (resolved through `PATH` when relative).
    #[serde(default = "default_docker_binary")]
    pub binary: PathBuf,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            binary: default_docker_binary(),
        }
    }
}

impl DockerConfig {
    /// Validates the binary path.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("docker.binary", &self.binary.to_string_lossy())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default tenant count.
const fn default_tenants() -> usize {
    DEFAULT_TENANTS
}

/// Default database image.
fn default_database_image() -> String {
    ServiceProfiles::default().database.image
}

/// Default cache image.
fn default_cache_image() -> String {
    ServiceProfiles::default().cache.image
}

/// Default application image.
fn default_application_image() -> String {
    ServiceProfiles::default().application.image
}

/// Default database limits.
fn default_database_limits() -> RoleLimits {
    RoleLimits::from_profile(&ServiceProfiles::default().database)
}

/// Default cache limits.
fn default_cache_limits() -> RoleLimits {
    RoleLimits::from_profile(&ServiceProfiles::default().cache)
}

/// Default application limits.
fn default_application_limits() -> RoleLimits {
    RoleLimits::from_profile(&ServiceProfiles::default().application)
}

/// Default readiness attempts.
fn default_readiness_attempts() -> u32 {
    ReadinessPolicy::default().attempts
}

/// Default readiness interval in milliseconds.
fn default_readiness_interval_ms() -> u64 {
    duration_millis(ReadinessPolicy::default().interval)
}

/// Default connect timeout in seconds.
fn default_connect_timeout_secs() -> u64 {
    ProbeSettings::default().connect_timeout.as_secs()
}

/// Default database port.
fn default_database_port() -> u16 {
    ProbeSettings::default().database_port
}

/// Default cache port.
fn default_cache_port() -> u16 {
    ProbeSettings::default().cache_port
}

/// Default stop timeout in seconds.
fn default_stop_timeout_secs() -> u64 {
    ValidatorSettings::default().stop_timeout.as_secs()
}

/// Default Docker binary.
fn default_docker_binary() -> PathBuf {
    PathBuf::from("docker")
}

/// Whole milliseconds of `duration`, saturating.
fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the argument, the environment, or the default
/// file. Returns `None` when only the default applies and it does not exist.
fn resolve_path(
    path: Option<&Path>,
    env_path: Option<String>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path-valued field.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an image reference.
fn validate_image(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_IMAGE_REFERENCE_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Invalid(format!("{field} must not contain whitespace")));
    }
    Ok(())
}

/// Validates a cpuset list such as `0`, `0-3` or `0,2`.
fn validate_cpuset(role: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Invalid(format!("limits.{role}.cpuset is not a valid cpu list"));
    if value.is_empty() || value.len() > MAX_CPUSET_LENGTH {
        return Err(invalid());
    }
    for range in value.split(',') {
        let (start, end) = range.split_once('-').unwrap_or((range, range));
        let start: u32 = start.parse().map_err(|_| invalid())?;
        let end: u32 = end.parse().map_err(|_| invalid())?;
        if start > end {
            return Err(invalid());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;

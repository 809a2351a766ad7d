// crates/tenant-isolation-core/src/interfaces/mod.rs
// ============================================================================
// Module: Container Platform Interface
// Description: Backend-agnostic seam over the container/orchestration platform.
// Purpose: Inject the platform client into provisioning, probes, and cleanup.
// Dependencies: async-trait, thiserror, crate::core
// ============================================================================

//! ## Overview
//! Every effect against the container platform goes through
//! [`ContainerPlatform`]. The runtime receives an `Arc<dyn ContainerPlatform>`
//! at construction, so tests substitute the in-memory simulator and the CLI
//! wires in the Docker adapter.
//!
//! ## Invariants
//! - Implementations must apply every label in a spec verbatim.
//! - `exec` reports non-zero exits as data, not as errors.
//! - Removal calls are idempotent from the caller's point of view only when
//!   `force` is set; otherwise missing resources surface as errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::ContainerHandle;
use crate::core::NetworkHandle;

// ============================================================================
// SECTION: Specs
// ============================================================================

/// Request to create an isolated bridge network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSpec {
    /// Network name.
    pub name: String,
    /// Labels applied to the network.
    pub labels: BTreeMap<String, String>,
}

/// Named volume mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    /// Volume name (created on first use).
    pub name: String,
    /// Mount path inside the container.
    pub target: String,
    /// Labels applied when the platform creates the volume.
    pub labels: BTreeMap<String, String>,
}

/// Security flags for a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityOptions {
    /// Forbid privilege escalation inside the container.
    pub no_new_privileges: bool,
    /// Mount the root filesystem read-only.
    pub read_only_root: bool,
    /// Writable tmpfs mounts (used with a read-only root).
    pub tmpfs: Vec<String>,
    /// Run in privileged mode. Never set by the provisioner.
    pub privileged: bool,
}

/// Request to create and start a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name, also used as its hostname.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Name of the only network the container joins.
    pub network: String,
    /// Environment variables.
    pub env: BTreeMap<String, String>,
    /// Labels applied to the container.
    pub labels: BTreeMap<String, String>,
    /// Command override (image default when empty).
    pub command: Vec<String>,
    /// Hard memory ceiling in bytes.
    pub memory_bytes: u64,
    /// CPU set restriction.
    pub cpuset: Option<String>,
    /// Optional persistent volume.
    pub volume: Option<VolumeMount>,
    /// Security flags.
    pub security: SecurityOptions,
}

// ============================================================================
// SECTION: Observations
// ============================================================================

/// Lifecycle state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// Created but not started.
    Created,
    /// Running.
    Running,
    /// Restarting after a crash.
    Restarting,
    /// Exited.
    Exited,
    /// Any other state.
    Other,
}

/// Output of an in-container command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Process exit code.
    pub exit_code: i64,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl ExecOutput {
    /// Returns true for a zero exit code.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Platform-reported configuration of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerInspection {
    /// Container name.
    pub name: String,
    /// Configured memory ceiling in bytes (0 means unlimited).
    pub memory_bytes: u64,
    /// Configured CPU set (`None` when unrestricted).
    pub cpuset: Option<String>,
    /// Names of attached networks.
    pub networks: Vec<String>,
    /// Privileged mode flag.
    pub privileged: bool,
    /// Read-only root filesystem flag.
    pub read_only_root: bool,
    /// Raw security options (for example `no-new-privileges:true`).
    pub security_opts: Vec<String>,
    /// Configured user (`None` when the image default applies).
    pub user: Option<String>,
}

impl ContainerInspection {
    /// Returns true when privilege escalation is forbidden.
    #[must_use]
    pub fn has_no_new_privileges(&self) -> bool {
        self.security_opts
            .iter()
            .any(|opt| opt == "no-new-privileges" || opt == "no-new-privileges:true")
    }
}

/// Resources discovered by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledResources {
    /// Matching containers.
    pub containers: Vec<ContainerHandle>,
    /// Matching networks.
    pub networks: Vec<NetworkHandle>,
    /// Matching volume names.
    pub volumes: Vec<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Container platform errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Platform could not be reached.
    #[error("container platform unavailable: {0}")]
    Unavailable(String),
    /// A platform call failed.
    #[error("{operation} failed: {message}")]
    Call {
        /// Operation label.
        operation: &'static str,
        /// Platform-reported failure.
        message: String,
    },
    /// Referenced resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// Platform output could not be interpreted.
    #[error("malformed platform output: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Platform Trait
// ============================================================================

/// Container/orchestration platform operations used by the validator.
#[async_trait]
pub trait ContainerPlatform: Send + Sync {
    /// Creates an isolated bridge network.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when creation fails.
    async fn create_network(&self, spec: &NetworkSpec) -> Result<NetworkHandle, PlatformError>;

    /// Creates and starts a container.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when creation or start fails.
    async fn create_container(&self, spec: &ContainerSpec)
    -> Result<ContainerHandle, PlatformError>;

    /// Reloads the container lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the container cannot be inspected.
    async fn container_state(
        &self,
        container: &ContainerHandle,
    ) -> Result<ContainerState, PlatformError>;

    /// Executes a command inside a running container.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the command cannot be started.
    async fn exec(
        &self,
        container: &ContainerHandle,
        command: &[String],
    ) -> Result<ExecOutput, PlatformError>;

    /// Returns the platform-reported container configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the container cannot be inspected.
    async fn inspect_container(
        &self,
        container: &ContainerHandle,
    ) -> Result<ContainerInspection, PlatformError>;

    /// Stops a container, force-killing after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the stop call fails.
    async fn stop_container(
        &self,
        container: &ContainerHandle,
        timeout: Duration,
    ) -> Result<(), PlatformError>;

    /// Removes a container.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when removal fails.
    async fn remove_container(
        &self,
        container: &ContainerHandle,
        force: bool,
    ) -> Result<(), PlatformError>;

    /// Removes a network.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when removal fails.
    async fn remove_network(&self, network: &NetworkHandle) -> Result<(), PlatformError>;

    /// Removes a named volume.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when removal fails.
    async fn remove_volume(&self, name: &str) -> Result<(), PlatformError>;

    /// Lists containers, networks, and volumes carrying `key=value`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when any listing call fails.
    async fn list_labeled(&self, key: &str, value: &str)
    -> Result<LabeledResources, PlatformError>;
}

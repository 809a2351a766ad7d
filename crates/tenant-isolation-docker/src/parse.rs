// crates/tenant-isolation-docker/src/parse.rs
// ============================================================================
// Module: Docker Output Parsing
// Description: Interprets `docker` CLI output.
// Purpose: Convert inspect JSON and listing rows into platform observations.
// Dependencies: serde, serde_json, tenant-isolation-core
// ============================================================================

//! ## Overview
//! Docker reports container configuration as a JSON array from
//! `docker container inspect`. Only the fields the probes need are decoded;
//! everything else is ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use tenant_isolation_core::ContainerHandle;
use tenant_isolation_core::ContainerInspection;
use tenant_isolation_core::ContainerState;
use tenant_isolation_core::NetworkHandle;
use tenant_isolation_core::PlatformError;

// ============================================================================
// SECTION: Inspect Payload
// ============================================================================

/// Subset of `docker container inspect` output.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectPayload {
    /// Container name with a leading `/`.
    name: String,
    /// Container configuration.
    #[serde(default)]
    config: InspectConfig,
    /// Host configuration.
    #[serde(default)]
    host_config: InspectHostConfig,
    /// Network settings.
    #[serde(default)]
    network_settings: InspectNetworkSettings,
}

/// `Config` block.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectConfig {
    /// Configured user; empty means image default.
    #[serde(default)]
    user: Option<String>,
}

/// `HostConfig` block.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectHostConfig {
    /// Memory ceiling in bytes; 0 means unlimited.
    #[serde(default)]
    memory: u64,
    /// CPU set; empty means unrestricted.
    #[serde(default)]
    cpuset_cpus: Option<String>,
    /// Privileged flag.
    #[serde(default)]
    privileged: bool,
    /// Read-only root flag.
    #[serde(default)]
    readonly_rootfs: bool,
    /// Security options; `null` when unset.
    #[serde(default)]
    security_opt: Option<Vec<String>>,
}

/// `NetworkSettings` block.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectNetworkSettings {
    /// Attached networks keyed by name.
    #[serde(default)]
    networks: BTreeMap<String, serde_json::Value>,
}

// ============================================================================
// SECTION: Parsers
// ============================================================================

/// Parses `docker container inspect` output for a single container.
///
/// # Errors
///
/// Returns [`PlatformError::Malformed`] when the payload is not a one-element
/// inspect array.
pub fn inspection(json: &str) -> Result<ContainerInspection, PlatformError> {
    let payloads: Vec<InspectPayload> = serde_json::from_str(json)
        .map_err(|err| PlatformError::Malformed(format!("container inspect: {err}")))?;
    let [payload] = <[InspectPayload; 1]>::try_from(payloads).map_err(|payloads| {
        PlatformError::Malformed(format!("expected one container, got {}", payloads.len()))
    })?;
    Ok(ContainerInspection {
        name: payload.name.trim_start_matches('/').to_string(),
        memory_bytes: payload.host_config.memory,
        cpuset: non_empty(payload.host_config.cpuset_cpus),
        networks: payload.network_settings.networks.into_keys().collect(),
        privileged: payload.host_config.privileged,
        read_only_root: payload.host_config.readonly_rootfs,
        security_opts: payload.host_config.security_opt.unwrap_or_default(),
        user: non_empty(payload.config.user),
    })
}

/// Parses `{{.State.Status}}` output.
#[must_use]
pub fn state(status: &str) -> ContainerState {
    match status.trim() {
        "created" => ContainerState::Created,
        "running" => ContainerState::Running,
        "restarting" => ContainerState::Restarting,
        "exited" | "dead" => ContainerState::Exited,
        _ => ContainerState::Other,
    }
}

/// Parses `id\tname` container rows.
#[must_use]
pub fn container_rows(output: &str) -> Vec<ContainerHandle> {
    id_name_rows(output)
        .map(|(id, name)| ContainerHandle {
            id,
            name,
        })
        .collect()
}

/// Parses `id\tname` network rows.
#[must_use]
pub fn network_rows(output: &str) -> Vec<NetworkHandle> {
    id_name_rows(output)
        .map(|(id, name)| NetworkHandle {
            id,
            name,
        })
        .collect()
}

/// Parses one-name-per-line rows.
#[must_use]
pub fn name_rows(output: &str) -> Vec<String> {
    output.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect()
}

/// Returns true when stderr reports a missing object.
#[must_use]
pub fn is_not_found(stderr: &str) -> bool {
    stderr.contains("No such") || stderr.contains("not found")
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Splits tab-separated `id\tname` rows, skipping malformed lines.
fn id_name_rows(output: &str) -> impl Iterator<Item = (String, String)> + '_ {
    output.lines().filter_map(|line| {
        let (id, name) = line.trim().split_once('\t')?;
        Some((id.to_string(), name.to_string()))
    })
}

/// Maps empty strings to `None`.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

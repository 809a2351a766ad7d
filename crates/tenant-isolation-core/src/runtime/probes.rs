// crates/tenant-isolation-core/src/runtime/probes.rs
// ============================================================================
// Module: Isolation Probes
// Description: Network, data, resource-limit, and security-posture probes.
// Purpose: Turn platform observations into per-category probe verdicts.
// Dependencies: rand, crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Each probe is a read-only diagnostic over an immutable, ordered tenant
//! slice and returns a [`ProbeResult`] built through a [`ProbeRecorder`].
//! Probes hold only the injected platform handle and probe settings, so they
//! can run in any order or concurrently.
//!
//! ## Invariants
//! - Platform errors inside a probe become issues of that probe only.
//! - The network probe is `Skipped` (never `Passed` or `Failed`) with fewer
//!   than two tenants.
//! - The data probe keeps checking remaining tenants after a failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;

use crate::audit::AuditEventKind;
use crate::audit::IsolationAuditEvent;
use crate::audit::IsolationAuditSink;
use crate::core::ContainerHandle;
use crate::core::MIB;
use crate::core::ProbeCategory;
use crate::core::ProbeRecorder;
use crate::core::ProbeResult;
use crate::core::ProbeSettings;
use crate::core::ServiceRole;
use crate::core::TenantResourceSet;
use crate::interfaces::ContainerPlatform;
use crate::interfaces::ExecOutput;
use crate::interfaces::PlatformError;
use crate::runtime::commands;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exit codes reported when a command is not executable or not found.
const TOOL_UNAVAILABLE_EXIT_CODES: [i64; 2] = [126, 127];

/// Skip reason for the network probe.
const NETWORK_SKIP_REASON: &str = "network isolation requires at least two tenants";

// ============================================================================
// SECTION: Probes
// ============================================================================

/// Isolation probes over a provisioned tenant set.
pub struct IsolationProbes {
    /// Injected platform client.
    platform: Arc<dyn ContainerPlatform>,
    /// Ports and connect timeout.
    settings: ProbeSettings,
    /// Audit sink for probe verdicts.
    audit: Arc<dyn IsolationAuditSink>,
}

impl IsolationProbes {
    /// Creates the probe set.
    #[must_use]
    pub fn new(
        platform: Arc<dyn ContainerPlatform>,
        settings: ProbeSettings,
        audit: Arc<dyn IsolationAuditSink>,
    ) -> Self {
        Self {
            platform,
            settings,
            audit,
        }
    }

    /// Runs every probe category in order.
    pub async fn run_all(
        &self,
        tenants: &[TenantResourceSet],
    ) -> BTreeMap<ProbeCategory, ProbeResult> {
        let mut results = BTreeMap::new();
        for category in ProbeCategory::ALL {
            let result = match category {
                ProbeCategory::NetworkIsolation => self.check_network_isolation(tenants).await,
                ProbeCategory::DataIsolation => self.check_data_isolation(tenants).await,
                ProbeCategory::ResourceLimits => self.check_resource_limits(tenants).await,
                ProbeCategory::ContainerSecurity => self.check_container_security(tenants).await,
            };
            self.audit.record(&IsolationAuditEvent::new(AuditEventKind::ProbeCompleted).detail(
                format!(
                    "{category}: {} ({} tests, {} issues)",
                    result.status,
                    result.tests.len(),
                    result.issues.len()
                ),
            ));
            results.insert(category, result);
        }
        results
    }

    // ------------------------------------------------------------------------
    // Network isolation
    // ------------------------------------------------------------------------

    /// Attempts cross-tenant connections between the first two tenants.
    ///
    /// A successful connection is the failure condition. An intra-tenant
    /// control connection is made first so that refusals can be trusted.
    pub async fn check_network_isolation(&self, tenants: &[TenantResourceSet]) -> ProbeResult {
        let [first, second, ..] = tenants else {
            return ProbeResult::skipped(NETWORK_SKIP_REASON);
        };
        let mut recorder = ProbeRecorder::new();
        let db_port = self.settings.database_port;
        let cache_port = self.settings.cache_port;

        self.check_reachable(&mut recorder, first, first, ServiceRole::Database, db_port).await;
        self.check_unreachable(&mut recorder, first, second, ServiceRole::Database, db_port).await;
        self.check_unreachable(&mut recorder, second, first, ServiceRole::Cache, cache_port).await;

        recorder.finish()
    }

    /// Control check: a tenant reaches its own service.
    async fn check_reachable(
        &self,
        recorder: &mut ProbeRecorder,
        from: &TenantResourceSet,
        to: &TenantResourceSet,
        role: ServiceRole,
        port: u16,
    ) {
        let Some((source, target)) = connection_endpoints(recorder, from, to, role) else {
            return;
        };
        let label = format!("{} -> {} {role}", from.tenant_id, to.tenant_id);
        match self.connect(source, &target.name, port).await {
            Ok(output) if output.success() => {
                recorder.pass(format!("{label}: reachable within tenant (control)"));
            }
            Ok(output) => recorder.issue(format!(
                "{label}: control connection failed with exit code {}; cross-tenant results are \
                 inconclusive",
                output.exit_code
            )),
            Err(err) => recorder.issue(format!("{label}: control connection errored: {err}")),
        }
    }

    /// Adversarial check: a tenant must not reach another tenant's service.
    async fn check_unreachable(
        &self,
        recorder: &mut ProbeRecorder,
        from: &TenantResourceSet,
        to: &TenantResourceSet,
        role: ServiceRole,
        port: u16,
    ) {
        let Some((source, target)) = connection_endpoints(recorder, from, to, role) else {
            return;
        };
        let label = format!("{} -> {} {role}", from.tenant_id, to.tenant_id);
        match self.connect(source, &target.name, port).await {
            Ok(output) if output.success() => recorder.issue(format!(
                "{label}: cross-tenant connection to {}:{port} succeeded",
                target.name
            )),
            Ok(output) if TOOL_UNAVAILABLE_EXIT_CODES.contains(&output.exit_code) => {
                recorder.issue(format!(
                    "{label}: connection tool unavailable (exit code {})",
                    output.exit_code
                ));
            }
            Ok(output) => recorder.pass(format!(
                "{label}: connection to {}:{port} blocked (exit code {})",
                target.name, output.exit_code
            )),
            Err(err) => recorder.issue(format!("{label}: connection attempt errored: {err}")),
        }
    }

    /// Runs a TCP connect attempt from inside `source`.
    async fn connect(
        &self,
        source: &ContainerHandle,
        host: &str,
        port: u16,
    ) -> Result<ExecOutput, PlatformError> {
        let command = commands::tcp_connect_command(host, port, self.settings.connect_timeout);
        self.platform.exec(source, &command).await
    }

    // ------------------------------------------------------------------------
    // Data isolation
    // ------------------------------------------------------------------------

    /// Writes and reads back a tenant-identifying marker in every tenant's
    /// database and cache.
    pub async fn check_data_isolation(&self, tenants: &[TenantResourceSet]) -> ProbeResult {
        let mut recorder = ProbeRecorder::new();
        for tenant in tenants {
            let marker = Marker::for_tenant(tenant);
            match tenant.container(ServiceRole::Database) {
                Some(database) => self.check_database_marker(&mut recorder, tenant, database, &marker).await,
                None => recorder.issue(missing_container(tenant, ServiceRole::Database)),
            }
            match tenant.container(ServiceRole::Cache) {
                Some(cache) => self.check_cache_marker(&mut recorder, tenant, cache, &marker).await,
                None => recorder.issue(missing_container(tenant, ServiceRole::Cache)),
            }
        }
        recorder.finish()
    }

    /// Upserts the marker row and reads it back with the tenant's credentials.
    async fn check_database_marker(
        &self,
        recorder: &mut ProbeRecorder,
        tenant: &TenantResourceSet,
        database: &ContainerHandle,
        marker: &Marker,
    ) {
        let credentials = &tenant.credentials;
        let write = commands::database_write_command(credentials, &marker.key, &marker.value);
        let read = commands::database_read_command(credentials, &marker.key);
        let outcome = self.write_then_read(database, &write, &read).await;
        record_marker_outcome(recorder, tenant, ServiceRole::Database, marker, outcome);
    }

    /// Sets the marker key and reads it back with the tenant's password.
    async fn check_cache_marker(
        &self,
        recorder: &mut ProbeRecorder,
        tenant: &TenantResourceSet,
        cache: &ContainerHandle,
        marker: &Marker,
    ) {
        let credentials = &tenant.credentials;
        let write = commands::cache_set_command(credentials, &marker.key, &marker.value);
        let read = commands::cache_get_command(credentials, &marker.key);
        let outcome = self.write_then_read(cache, &write, &read).await;
        record_marker_outcome(recorder, tenant, ServiceRole::Cache, marker, outcome);
    }

    /// Executes a write then a read, returning the trimmed read output.
    async fn write_then_read(
        &self,
        container: &ContainerHandle,
        write: &[String],
        read: &[String],
    ) -> MarkerOutcome {
        match self.platform.exec(container, write).await {
            Ok(output) if output.success() => {}
            Ok(output) => return MarkerOutcome::WriteFailed(describe_exit(&output)),
            Err(err) => return MarkerOutcome::WriteFailed(err.to_string()),
        }
        match self.platform.exec(container, read).await {
            Ok(output) if output.success() => MarkerOutcome::Read(output.stdout.trim().to_string()),
            Ok(output) => MarkerOutcome::ReadFailed(describe_exit(&output)),
            Err(err) => MarkerOutcome::ReadFailed(err.to_string()),
        }
    }

    // ------------------------------------------------------------------------
    // Resource limits
    // ------------------------------------------------------------------------

    /// Checks memory ceilings, CPU sets, and network attachment per container.
    pub async fn check_resource_limits(&self, tenants: &[TenantResourceSet]) -> ProbeResult {
        let mut recorder = ProbeRecorder::new();
        for tenant in tenants {
            let expected_network = &tenant.network.name;
            for (role, container) in &tenant.containers {
                let inspection = match self.platform.inspect_container(container).await {
                    Ok(inspection) => inspection,
                    Err(err) => {
                        recorder.issue(format!(
                            "{} ({role}, tenant {}): inspect failed: {err}",
                            container.name, tenant.tenant_id
                        ));
                        continue;
                    }
                };
                if inspection.memory_bytes > 0 {
                    recorder.pass(format!(
                        "{}: memory ceiling {} MiB",
                        container.name,
                        inspection.memory_bytes / MIB
                    ));
                } else {
                    recorder.issue(format!("{}: no memory ceiling configured", container.name));
                }
                if let Some(cpuset) = inspection.cpuset.as_deref().filter(|set| !set.is_empty()) {
                    recorder.pass(format!("{}: cpu set {cpuset}", container.name));
                }
                if matches!(inspection.networks.as_slice(), [only] if only == expected_network) {
                    recorder.pass(format!(
                        "{}: attached only to {expected_network}",
                        container.name
                    ));
                } else {
                    recorder.issue(format!(
                        "{} (tenant {}) attached to [{}], expected only {expected_network}",
                        container.name,
                        tenant.tenant_id,
                        inspection.networks.join(", ")
                    ));
                }
            }
        }
        recorder.finish()
    }

    // ------------------------------------------------------------------------
    // Container security
    // ------------------------------------------------------------------------

    /// Checks privilege posture per container.
    pub async fn check_container_security(&self, tenants: &[TenantResourceSet]) -> ProbeResult {
        let mut recorder = ProbeRecorder::new();
        for tenant in tenants {
            for (role, container) in &tenant.containers {
                let inspection = match self.platform.inspect_container(container).await {
                    Ok(inspection) => inspection,
                    Err(err) => {
                        recorder.issue(format!(
                            "{} ({role}, tenant {}): inspect failed: {err}",
                            container.name, tenant.tenant_id
                        ));
                        continue;
                    }
                };
                match inspection.user.as_deref().filter(|user| !user.is_empty()) {
                    Some(user) => recorder.pass(format!("{}: runs as user {user}", container.name)),
                    None => recorder.pass(format!("{}: runs as image default user", container.name)),
                }
                if inspection.has_no_new_privileges() {
                    recorder.pass(format!("{}: no-new-privileges set", container.name));
                }
                if *role == ServiceRole::Application {
                    if inspection.read_only_root {
                        recorder.pass(format!("{}: read-only root filesystem", container.name));
                    } else {
                        recorder.issue(format!(
                            "{} (tenant {}): application root filesystem is writable",
                            container.name, tenant.tenant_id
                        ));
                    }
                }
                if inspection.privileged {
                    recorder.issue(format!(
                        "{} (tenant {}): running in privileged mode",
                        container.name, tenant.tenant_id
                    ));
                } else {
                    recorder.pass(format!("{}: not privileged", container.name));
                }
            }
        }
        recorder.finish()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Marker written by the data probe.
struct Marker {
    /// Row key / cache key.
    key: String,
    /// Expected value.
    value: String,
}

impl Marker {
    /// Builds a randomly suffixed, tenant-identifying marker.
    fn for_tenant(tenant: &TenantResourceSet) -> Self {
        let suffix: u32 = rand::thread_rng().r#gen();
        let slug = tenant.tenant_id.as_str().replace('-', "_");
        Self {
            key: format!("isolation_{slug}_{suffix:08x}"),
            value: format!("marker-{}-{suffix:08x}", tenant.tenant_id),
        }
    }
}

/// Outcome of a write-then-read round trip.
enum MarkerOutcome {
    /// Write failed with the given description.
    WriteFailed(String),
    /// Read failed with the given description.
    ReadFailed(String),
    /// Read returned the given (trimmed) value.
    Read(String),
}

/// Records the marker round trip as evidence.
fn record_marker_outcome(
    recorder: &mut ProbeRecorder,
    tenant: &TenantResourceSet,
    role: ServiceRole,
    marker: &Marker,
    outcome: MarkerOutcome,
) {
    let tenant_id = &tenant.tenant_id;
    match outcome {
        MarkerOutcome::Read(value) if value == marker.value => {
            recorder.pass(format!("tenant {tenant_id} {role}: marker {} round-tripped", marker.key));
        }
        MarkerOutcome::Read(value) => recorder.issue(format!(
            "tenant {tenant_id} {role}: marker {} read back '{value}', expected '{}'",
            marker.key, marker.value
        )),
        MarkerOutcome::WriteFailed(reason) => {
            recorder.issue(format!("tenant {tenant_id} {role}: marker write failed: {reason}"));
        }
        MarkerOutcome::ReadFailed(reason) => {
            recorder.issue(format!("tenant {tenant_id} {role}: marker read failed: {reason}"));
        }
    }
}

/// Resolves the source application and target service containers.
fn connection_endpoints<'a>(
    recorder: &mut ProbeRecorder,
    from: &'a TenantResourceSet,
    to: &'a TenantResourceSet,
    role: ServiceRole,
) -> Option<(&'a ContainerHandle, &'a ContainerHandle)> {
    let Some(source) = from.container(ServiceRole::Application) else {
        recorder.issue(missing_container(from, ServiceRole::Application));
        return None;
    };
    let Some(target) = to.container(role) else {
        recorder.issue(missing_container(to, role));
        return None;
    };
    Some((source, target))
}

/// Issue text for a tenant missing a provisioned role.
fn missing_container(tenant: &TenantResourceSet, role: ServiceRole) -> String {
    format!("tenant {} has no {role} container", tenant.tenant_id)
}

/// Summarizes a failed command.
fn describe_exit(output: &ExecOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        format!("exit code {}", output.exit_code)
    } else {
        format!("exit code {}: {stderr}", output.exit_code)
    }
}

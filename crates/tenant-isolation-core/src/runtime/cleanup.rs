// crates/tenant-isolation-core/src/runtime/cleanup.rs
// ============================================================================
// Module: Cleanup Coordinator
// Description: Log-driven teardown and label-driven recovery sweep.
// Purpose: Reclaim every resource a run created, whatever else failed.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! Two explicit teardown paths with different consistency models:
//! - [`CleanupCoordinator::cleanup`] drains the in-memory
//!   [`CreatedResourceLog`] in reverse creation order, starting with any
//!   in-flight creation. Volumes are retained for post-mortem inspection.
//! - [`CleanupCoordinator::sweep_labeled`] discovers resources by the
//!   isolation marker label and force-removes them, volumes included. It is
//!   the only path that survives a crashed run.
//!
//! ## Invariants
//! - A failure to remove one resource never prevents attempts on the rest.
//! - Log-driven cleanup never returns an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::audit::AuditEventKind;
use crate::audit::IsolationAuditEvent;
use crate::audit::IsolationAuditSink;
use crate::core::ContainerHandle;
use crate::core::CreatedResourceLog;
use crate::core::ISOLATION_LABEL;
use crate::core::ISOLATION_LABEL_VALUE;
use crate::core::NetworkHandle;
use crate::core::ResourceHandle;
use crate::core::ResourceKind;
use crate::interfaces::ContainerPlatform;
use crate::interfaces::PlatformError;

// ============================================================================
// SECTION: Reports
// ============================================================================

/// A resource that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource name.
    pub name: String,
    /// Platform error text.
    pub error: String,
}

/// Outcome of a teardown pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Removed resources in removal order.
    pub removed: Vec<(ResourceKind, String)>,
    /// Resources that could not be removed.
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    /// Returns true when every attempted removal succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// SECTION: Coordinator
// ============================================================================

/// Tears down resources created by validation runs.
pub struct CleanupCoordinator {
    /// Injected platform client.
    platform: Arc<dyn ContainerPlatform>,
    /// Graceful stop timeout before the platform force-kills.
    stop_timeout: Duration,
    /// Audit sink for removal outcomes.
    audit: Arc<dyn IsolationAuditSink>,
}

impl CleanupCoordinator {
    /// Creates a coordinator.
    #[must_use]
    pub fn new(
        platform: Arc<dyn ContainerPlatform>,
        stop_timeout: Duration,
        audit: Arc<dyn IsolationAuditSink>,
    ) -> Self {
        Self {
            platform,
            stop_timeout,
            audit,
        }
    }

    /// Drains `log` in reverse creation order, removing every entry.
    ///
    /// An in-flight entry goes first, since it is the newest; if the platform
    /// never created it, it is skipped without a failure.
    pub async fn cleanup(&self, log: &mut CreatedResourceLog) -> CleanupReport {
        let mut report = CleanupReport::default();
        if let Some(pending) = log.take_pending() {
            self.remove_unconfirmed(&pending, &mut report).await;
        }
        for entry in log.drain_for_teardown() {
            match entry {
                ResourceHandle::Container(container) => {
                    self.remove_container(&container, &mut report).await;
                }
                ResourceHandle::Network(network) => {
                    self.remove_network(&network, &mut report).await;
                }
            }
        }
        report
    }

    /// Removes every resource carrying the isolation marker label.
    ///
    /// Containers go first, then networks, then volumes.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] only when discovery fails; individual
    /// removal failures are recorded in the report.
    pub async fn sweep_labeled(&self) -> Result<CleanupReport, PlatformError> {
        let found = self.platform.list_labeled(ISOLATION_LABEL, ISOLATION_LABEL_VALUE).await?;
        let mut report = CleanupReport::default();
        for container in &found.containers {
            self.remove_container(container, &mut report).await;
        }
        for network in &found.networks {
            self.remove_network(network, &mut report).await;
        }
        for volume in &found.volumes {
            let result = self.platform.remove_volume(volume).await;
            self.settle(ResourceKind::Volume, volume, result, &mut report);
        }
        self.audit.record(&IsolationAuditEvent::new(AuditEventKind::SweepCompleted).detail(
            format!("removed {}, failed {}", report.removed.len(), report.failures.len()),
        ));
        Ok(report)
    }

    /// Stops then force-removes a container. A failed stop is only audited.
    async fn remove_container(&self, container: &ContainerHandle, report: &mut CleanupReport) {
        if let Err(err) = self.platform.stop_container(container, self.stop_timeout).await {
            self.audit.record(
                &IsolationAuditEvent::new(AuditEventKind::ResourceRemovalFailed)
                    .resource(ResourceKind::Container, container.name.clone())
                    .detail(format!("stop failed, forcing removal: {err}")),
            );
        }
        let result = self.platform.remove_container(container, true).await;
        self.settle(ResourceKind::Container, &container.name, result, report);
    }

    /// Force-removes a resource known only by name. `NotFound` means the
    /// creation never landed.
    async fn remove_unconfirmed(&self, entry: &ResourceHandle, report: &mut CleanupReport) {
        let result = match entry {
            ResourceHandle::Container(container) => {
                self.platform.remove_container(container, true).await
            }
            ResourceHandle::Network(network) => self.platform.remove_network(network).await,
        };
        if matches!(result, Err(PlatformError::NotFound(_))) {
            return;
        }
        self.settle(entry.kind(), entry.name(), result, report);
    }

    /// Removes a network.
    async fn remove_network(&self, network: &NetworkHandle, report: &mut CleanupReport) {
        let result = self.platform.remove_network(network).await;
        self.settle(ResourceKind::Network, &network.name, result, report);
    }

    /// Records and audits one removal outcome.
    fn settle(
        &self,
        kind: ResourceKind,
        name: &str,
        result: Result<(), PlatformError>,
        report: &mut CleanupReport,
    ) {
        match result {
            Ok(()) => {
                self.audit.record(
                    &IsolationAuditEvent::new(AuditEventKind::ResourceRemoved).resource(kind, name),
                );
                report.removed.push((kind, name.to_string()));
            }
            Err(err) => {
                let error = err.to_string();
                self.audit.record(
                    &IsolationAuditEvent::new(AuditEventKind::ResourceRemovalFailed)
                        .resource(kind, name)
                        .detail(error.clone()),
                );
                report.failures.push(CleanupFailure {
                    kind,
                    name: name.to_string(),
                    error,
                });
            }
        }
    }
}

// crates/tenant-isolation-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Validation Orchestrator
// Description: End-to-end validation run state machine.
// Purpose: Provision tenants, probe them, aggregate, and always clean up.
// Dependencies: thiserror, tokio, crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! A run walks `Init -> Provisioning -> Probing -> Aggregating -> Cleanup ->
//! Done`. Failures in provisioning or probing (including an external
//! interrupt) move the run to `Error`, which still routes through `Cleanup`.
//!
//! ## Invariants
//! - Cleanup runs exactly once per run, on every path.
//! - A report is always produced; orchestration failures surface as
//!   [`ValidationStatus::Error`] with the error text in `summary.issues`.
//! - The creation log is owned here and only borrowed by provisioning.
//!
//! [`ValidationStatus::Error`]: crate::core::ValidationStatus::Error

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::audit::AuditEventKind;
use crate::audit::IsolationAuditEvent;
use crate::audit::IsolationAuditSink;
use crate::core::CreatedResourceLog;
use crate::core::ProbeCategory;
use crate::core::ProbeResult;
use crate::core::TenantId;
use crate::core::ValidationReport;
use crate::core::ValidatorSettings;
use crate::interfaces::ContainerPlatform;
use crate::runtime::cleanup::CleanupCoordinator;
use crate::runtime::cleanup::CleanupReport;
use crate::runtime::probes::IsolationProbes;
use crate::runtime::provisioner::ProvisioningError;
use crate::runtime::provisioner::ResourceProvisioner;

// ============================================================================
// SECTION: Phases
// ============================================================================

/// Lifecycle phase of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Run created.
    Init,
    /// Creating tenant resources.
    Provisioning,
    /// Running isolation probes.
    Probing,
    /// Building the report.
    Aggregating,
    /// Tearing down created resources.
    Cleanup,
    /// Run finished.
    Done,
    /// Provisioning or probing failed.
    Error,
}

impl RunPhase {
    /// Returns a stable label for the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Provisioning => "provisioning",
            Self::Probing => "probing",
            Self::Aggregating => "aggregating",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered record of visited phases.
struct PhaseTrail {
    /// Phases in visiting order.
    phases: Vec<RunPhase>,
    /// Audit sink for transitions.
    audit: Arc<dyn IsolationAuditSink>,
}

impl PhaseTrail {
    /// Starts a trail in [`RunPhase::Init`].
    fn new(audit: Arc<dyn IsolationAuditSink>) -> Self {
        let mut trail = Self {
            phases: Vec::new(),
            audit,
        };
        trail.enter(RunPhase::Init);
        trail
    }

    /// Moves to `phase`.
    fn enter(&mut self, phase: RunPhase) {
        self.phases.push(phase);
        self.audit
            .record(&IsolationAuditEvent::new(AuditEventKind::PhaseChanged).detail(phase.as_str()));
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Orchestration-level failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// No tenants were requested.
    #[error("tenant count must be at least 1")]
    NoTenants,
    /// Tenant provisioning failed.
    #[error("provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),
    /// The run was interrupted before probing finished.
    #[error("validation interrupted before completion")]
    Interrupted,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Everything a validation run produced.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    /// Aggregated report.
    pub report: ValidationReport,
    /// Teardown outcome.
    pub cleanup: CleanupReport,
    /// Phases visited, in order.
    pub phases: Vec<RunPhase>,
}

/// Drives provisioning, probing, aggregation, and cleanup.
pub struct ValidationOrchestrator {
    /// Tenant provisioning.
    provisioner: ResourceProvisioner,
    /// Isolation probes.
    probes: IsolationProbes,
    /// Log-driven teardown.
    cleanup: CleanupCoordinator,
    /// Audit sink for run lifecycle.
    audit: Arc<dyn IsolationAuditSink>,
}

impl ValidationOrchestrator {
    /// Wires runtime components around one platform client.
    #[must_use]
    pub fn new(
        platform: Arc<dyn ContainerPlatform>,
        settings: ValidatorSettings,
        audit: Arc<dyn IsolationAuditSink>,
    ) -> Self {
        let probes =
            IsolationProbes::new(Arc::clone(&platform), settings.probes, Arc::clone(&audit));
        let cleanup = CleanupCoordinator::new(
            Arc::clone(&platform),
            settings.stop_timeout,
            Arc::clone(&audit),
        );
        let provisioner = ResourceProvisioner::new(platform, settings, Arc::clone(&audit));
        Self {
            provisioner,
            probes,
            cleanup,
            audit,
        }
    }

    /// Runs a validation over `tenant_count` generated tenants.
    pub async fn run_validation(&self, tenant_count: usize) -> ValidationReport {
        self.run_validation_until(tenant_count, std::future::pending()).await.report
    }

    /// Runs a validation that is abandoned when `shutdown` completes.
    ///
    /// An interrupt drops the in-flight provisioning or probing work and
    /// still tears down everything recorded so far.
    pub async fn run_validation_until(
        &self,
        tenant_count: usize,
        shutdown: impl Future<Output = ()>,
    ) -> ValidationRun {
        let mut trail = PhaseTrail::new(Arc::clone(&self.audit));
        let mut log = CreatedResourceLog::new();

        let outcome = tokio::select! {
            result = self.provision_and_probe(tenant_count, &mut log, &mut trail) => result,
            () = shutdown => Err(RunError::Interrupted),
        };

        let report = match outcome {
            Ok(checks) => {
                trail.enter(RunPhase::Aggregating);
                ValidationReport::aggregate(tenant_count, checks, Vec::new())
            }
            Err(err) => {
                trail.enter(RunPhase::Error);
                ValidationReport::aggregate(tenant_count, BTreeMap::new(), vec![err.to_string()])
            }
        };

        trail.enter(RunPhase::Cleanup);
        let cleanup = self.cleanup.cleanup(&mut log).await;
        trail.enter(RunPhase::Done);

        self.audit.record(&IsolationAuditEvent::new(AuditEventKind::RunCompleted).detail(format!(
            "{} ({} removed, {} removal failures)",
            report.validation_status,
            cleanup.removed.len(),
            cleanup.failures.len()
        )));

        ValidationRun {
            report,
            cleanup,
            phases: trail.phases,
        }
    }

    /// Provisions every tenant sequentially, then runs the probes.
    async fn provision_and_probe(
        &self,
        tenant_count: usize,
        log: &mut CreatedResourceLog,
        trail: &mut PhaseTrail,
    ) -> Result<BTreeMap<ProbeCategory, ProbeResult>, RunError> {
        if tenant_count == 0 {
            return Err(RunError::NoTenants);
        }
        trail.enter(RunPhase::Provisioning);
        let mut tenants = Vec::with_capacity(tenant_count);
        for index in 1..=tenant_count {
            let tenant = self.provisioner.create_tenant(TenantId::generate(index), log).await?;
            tenants.push(tenant);
        }
        trail.enter(RunPhase::Probing);
        Ok(self.probes.run_all(&tenants).await)
    }
}

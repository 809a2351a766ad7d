// crates/tenant-isolation-core/tests/orchestrator.rs
// ============================================================================
// Module: Orchestrator Tests
// Description: End-to-end validation runs against the in-memory platform.
// Purpose: Verify verdicts, phase transitions, and unconditional cleanup.
// ============================================================================

//! End-to-end orchestrator tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use tenant_isolation_core::AuditEventKind;
use tenant_isolation_core::InMemoryPlatform;
use tenant_isolation_core::PlatformFault;
use tenant_isolation_core::ProbeCategory;
use tenant_isolation_core::ProbeStatus;
use tenant_isolation_core::RecordingAuditSink;
use tenant_isolation_core::RunPhase;
use tenant_isolation_core::ServiceRole;
use tenant_isolation_core::ValidationOrchestrator;
use tenant_isolation_core::ValidationStatus;
use tenant_isolation_core::ValidatorSettings;

fn orchestrator(
    platform: &Arc<InMemoryPlatform>,
    audit: &Arc<RecordingAuditSink>,
) -> ValidationOrchestrator {
    ValidationOrchestrator::new(platform.clone(), ValidatorSettings::default(), audit.clone())
}

fn assert_nothing_left_but_volumes(platform: &InMemoryPlatform) {
    assert!(platform.container_names().is_empty(), "containers left: {:?}", platform.container_names());
    assert!(platform.network_names().is_empty(), "networks left: {:?}", platform.network_names());
}

#[tokio::test]
async fn healthy_two_tenant_run_passes_and_cleans_up() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());

    let report = orchestrator(&platform, &audit).run_validation(2).await;

    assert_eq!(report.validation_status, ValidationStatus::Passed, "{:?}", report.summary.issues);
    assert_eq!(report.total_tenants, 2);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.passed, 4);
    assert_eq!(report.isolation_checks.len(), 4);
    for category in ProbeCategory::ALL {
        assert_eq!(report.isolation_checks[&category].status, ProbeStatus::Passed);
    }
    assert_nothing_left_but_volumes(&platform);
    assert_eq!(platform.volume_names().len(), 4);
    assert_eq!(audit.events_of(AuditEventKind::RunCompleted).len(), 1);
}

#[tokio::test]
async fn healthy_run_visits_every_phase_in_order() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());

    let run = orchestrator(&platform, &audit).run_validation_until(2, std::future::pending()).await;

    assert_eq!(run.phases, vec![
        RunPhase::Init,
        RunPhase::Provisioning,
        RunPhase::Probing,
        RunPhase::Aggregating,
        RunPhase::Cleanup,
        RunPhase::Done,
    ]);
    assert!(run.cleanup.is_clean());
    assert_eq!(run.cleanup.removed.len(), 8);
    assert_eq!(audit.events_of(AuditEventKind::PhaseChanged).len(), 6);
}

#[tokio::test]
async fn single_tenant_run_fails_because_network_probe_is_skipped() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());

    let report = orchestrator(&platform, &audit).run_validation(1).await;

    assert_eq!(report.validation_status, ValidationStatus::Failed);
    assert_eq!(report.summary.skipped, 1);
    assert_eq!(report.summary.passed, 3);
    assert!(report.summary.issues.is_empty());
    assert_nothing_left_but_volumes(&platform);
}

#[tokio::test]
async fn zero_tenants_is_an_orchestration_error() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());

    let run = orchestrator(&platform, &audit).run_validation_until(0, std::future::pending()).await;

    assert_eq!(run.report.validation_status, ValidationStatus::Error);
    assert!(run.report.summary.issues[0].contains("at least 1"));
    assert_eq!(run.phases, vec![RunPhase::Init, RunPhase::Error, RunPhase::Cleanup, RunPhase::Done]);
    assert!(platform.created_resources().is_empty());
}

#[tokio::test]
async fn probe_failure_yields_failed_status() {
    let platform =
        Arc::new(InMemoryPlatform::with_faults([PlatformFault::Privileged(ServiceRole::Cache)]));
    let audit = Arc::new(RecordingAuditSink::new());

    let report = orchestrator(&platform, &audit).run_validation(2).await;

    assert_eq!(report.validation_status, ValidationStatus::Failed);
    assert_eq!(report.summary.failed, 1);
    assert!(report.summary.issues.iter().all(|issue| issue.starts_with("container_security: ")));
    assert_nothing_left_but_volumes(&platform);
}

#[tokio::test]
async fn provisioning_failure_reports_error_and_cleans_partial_tenant() {
    let platform = Arc::new(InMemoryPlatform::with_faults([PlatformFault::FailCreate(
        ServiceRole::Application,
    )]));
    let audit = Arc::new(RecordingAuditSink::new());

    let run = orchestrator(&platform, &audit).run_validation_until(2, std::future::pending()).await;

    assert_eq!(run.report.validation_status, ValidationStatus::Error);
    assert!(run.report.isolation_checks.is_empty());
    assert!(run.report.summary.issues[0].contains("failed to create"));
    assert!(run.phases.contains(&RunPhase::Error));
    assert_eq!(run.phases.last(), Some(&RunPhase::Done));
    let mut expected = platform.created_resources();
    expected.reverse();
    assert_eq!(expected.len(), 3);
    assert_eq!(platform.removed_resources(), expected);
    assert_nothing_left_but_volumes(&platform);
}

#[tokio::test(start_paused = true)]
async fn readiness_exhaustion_still_cleans_up() {
    let platform =
        Arc::new(InMemoryPlatform::with_faults([PlatformFault::NeverReady(ServiceRole::Cache)]));
    let audit = Arc::new(RecordingAuditSink::new());

    let report = orchestrator(&platform, &audit).run_validation(2).await;

    assert_eq!(report.validation_status, ValidationStatus::Error);
    assert!(report.summary.issues[0].contains("failed to start after 30 attempts"));
    assert_nothing_left_but_volumes(&platform);
}

#[tokio::test(start_paused = true)]
async fn interrupt_during_provisioning_cleans_up_created_resources() {
    let platform =
        Arc::new(InMemoryPlatform::with_faults([PlatformFault::NeverReady(ServiceRole::Database)]));
    let audit = Arc::new(RecordingAuditSink::new());

    let run = orchestrator(&platform, &audit)
        .run_validation_until(2, tokio::time::sleep(Duration::from_secs(5)))
        .await;

    assert_eq!(run.report.validation_status, ValidationStatus::Error);
    assert!(run.report.summary.issues[0].contains("interrupted"));
    assert_eq!(run.phases, vec![
        RunPhase::Init,
        RunPhase::Provisioning,
        RunPhase::Error,
        RunPhase::Cleanup,
        RunPhase::Done,
    ]);
    assert_eq!(run.cleanup.removed.len(), 2);
    assert_nothing_left_but_volumes(&platform);
}

#[tokio::test(start_paused = true)]
async fn interrupt_during_container_create_removes_the_unlogged_container() {
    let platform = Arc::new(InMemoryPlatform::with_faults([PlatformFault::StallAfterCreate(
        ServiceRole::Database,
    )]));
    let audit = Arc::new(RecordingAuditSink::new());

    let run = orchestrator(&platform, &audit)
        .run_validation_until(2, tokio::time::sleep(Duration::from_secs(1)))
        .await;

    assert_eq!(run.report.validation_status, ValidationStatus::Error);
    assert!(run.report.summary.issues[0].contains("interrupted"));
    let mut expected = platform.created_resources();
    expected.reverse();
    assert_eq!(expected.len(), 2);
    assert_eq!(run.cleanup.removed, expected);
    assert!(run.cleanup.is_clean(), "failures: {:?}", run.cleanup.failures);
    assert_nothing_left_but_volumes(&platform);
}

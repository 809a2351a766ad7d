// system-tests/tests/suites/docker_validation.rs
// ============================================================================
// Module: Docker Validation Tests
// Description: End-to-end validation runs against a live Docker engine.
// Purpose: Prove hardened tenants pass every probe and leave nothing behind.
// Dependencies: system-tests helpers, tenant-isolation-core, tenant-isolation-docker
// ============================================================================

//! End-to-end isolation runs, recovery sweeps, and interrupts on Docker.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tenant_isolation_core::AuditEventKind;
use tenant_isolation_core::CleanupCoordinator;
use tenant_isolation_core::ContainerPlatform;
use tenant_isolation_core::CreatedResourceLog;
use tenant_isolation_core::NoopAuditSink;
use tenant_isolation_core::ProbeCategory;
use tenant_isolation_core::ProbeStatus;
use tenant_isolation_core::RecordingAuditSink;
use tenant_isolation_core::ResourceKind;
use tenant_isolation_core::ResourceProvisioner;
use tenant_isolation_core::RunPhase;
use tenant_isolation_core::TenantId;
use tenant_isolation_core::ValidationOrchestrator;
use tenant_isolation_core::ValidationReport;
use tenant_isolation_core::ValidationStatus;

use crate::helpers::infra::DockerFixture;

/// Delay before the interrupt fires, well inside the first tenant's readiness wait.
const INTERRUPT_AFTER: Duration = Duration::from_secs(1);

#[tokio::test(flavor = "multi_thread")]
async fn hardened_tenants_pass_every_probe() -> Result<(), Box<dyn std::error::Error>> {
    let Some(fixture) = DockerFixture::connect().await? else {
        return Ok(());
    };
    println!("docker engine {}", fixture.engine_version);
    let platform: Arc<dyn ContainerPlatform> = fixture.docker.clone();
    let audit = Arc::new(RecordingAuditSink::new());
    let orchestrator =
        ValidationOrchestrator::new(platform, fixture.settings.clone(), audit.clone());

    let run = tokio::time::timeout(
        fixture.timeout,
        orchestrator.run_validation_until(fixture.tenants, std::future::pending()),
    )
    .await?;

    assert_eq!(
        run.report.validation_status,
        ValidationStatus::Passed,
        "issues: {:?}",
        run.report.summary.issues
    );
    for category in ProbeCategory::ALL {
        assert_eq!(run.report.isolation_checks[&category].status, ProbeStatus::Passed);
    }
    assert_eq!(run.report.total_tenants, fixture.tenants);
    assert_eq!(run.phases.last(), Some(&RunPhase::Done));
    assert!(run.cleanup.is_clean(), "cleanup failures: {:?}", run.cleanup.failures);
    assert_eq!(run.cleanup.removed.len(), fixture.tenants * 4);
    assert_eq!(audit.events_of(AuditEventKind::RunCompleted).len(), 1);

    let artifacts = TempDir::new()?;
    let report_path = artifacts.path().join("report.json");
    fs::write(&report_path, serde_json::to_vec_pretty(&run.report)?)?;
    let parsed: ValidationReport = serde_json::from_slice(&fs::read(&report_path)?)?;
    assert_eq!(parsed, run.report);

    let leftover = fixture.labeled().await?;
    assert!(leftover.containers.is_empty(), "leftover containers: {:?}", leftover.containers);
    assert!(leftover.networks.is_empty(), "leftover networks: {:?}", leftover.networks);

    let swept = CleanupCoordinator::new(
        fixture.docker.clone(),
        fixture.settings.stop_timeout,
        Arc::new(NoopAuditSink),
    )
    .sweep_labeled()
    .await?;
    assert!(swept.is_clean());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn sweep_removes_abandoned_tenant() -> Result<(), Box<dyn std::error::Error>> {
    let Some(fixture) = DockerFixture::connect().await? else {
        return Ok(());
    };
    let provisioner = ResourceProvisioner::new(
        fixture.docker.clone(),
        fixture.settings.clone(),
        Arc::new(NoopAuditSink),
    );
    let mut log = CreatedResourceLog::new();
    let tenant = TenantId::generate(0);
    tokio::time::timeout(fixture.timeout, provisioner.create_tenant(tenant.clone(), &mut log))
        .await??;
    assert_eq!(log.len(), 4);

    // The log is dropped without cleanup, as after a crash.
    drop(log);
    let abandoned = fixture.labeled().await?;
    assert_eq!(abandoned.containers.len(), 3);
    assert_eq!(abandoned.networks.len(), 1);
    assert_eq!(abandoned.volumes.len(), 2);

    let swept = CleanupCoordinator::new(
        fixture.docker.clone(),
        fixture.settings.stop_timeout,
        Arc::new(NoopAuditSink),
    )
    .sweep_labeled()
    .await?;
    assert!(swept.is_clean(), "sweep failures: {:?}", swept.failures);
    let volumes = swept.removed.iter().filter(|(kind, _)| *kind == ResourceKind::Volume).count();
    assert_eq!(volumes, 2);
    assert!(swept.removed.iter().any(|(_, name)| name.contains(tenant.as_str())));

    let remaining = fixture.labeled().await?;
    assert!(remaining.containers.is_empty());
    assert!(remaining.networks.is_empty());
    assert!(remaining.volumes.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn interrupt_during_provisioning_still_cleans_up() -> Result<(), Box<dyn std::error::Error>>
{
    let Some(fixture) = DockerFixture::connect().await? else {
        return Ok(());
    };
    let orchestrator = ValidationOrchestrator::new(
        fixture.docker.clone(),
        fixture.settings.clone(),
        Arc::new(NoopAuditSink),
    );

    let run = tokio::time::timeout(
        fixture.timeout,
        orchestrator.run_validation_until(fixture.tenants, tokio::time::sleep(INTERRUPT_AFTER)),
    )
    .await?;

    assert_eq!(run.report.validation_status, ValidationStatus::Error);
    assert!(run.report.summary.issues.iter().any(|issue| issue.contains("interrupted")));
    assert!(run.phases.contains(&RunPhase::Error));
    assert_eq!(run.phases.last(), Some(&RunPhase::Done));
    assert!(run.cleanup.is_clean(), "cleanup failures: {:?}", run.cleanup.failures);

    let leftover = fixture.labeled().await?;
    assert!(leftover.containers.is_empty(), "leftover containers: {:?}", leftover.containers);
    assert!(leftover.networks.is_empty(), "leftover networks: {:?}", leftover.networks);

    let swept = CleanupCoordinator::new(
        fixture.docker.clone(),
        fixture.settings.stop_timeout,
        Arc::new(NoopAuditSink),
    )
    .sweep_labeled()
    .await?;
    assert!(swept.removed.iter().all(|(kind, _)| *kind == ResourceKind::Volume));
    Ok(())
}

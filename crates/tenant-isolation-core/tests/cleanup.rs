// crates/tenant-isolation-core/tests/cleanup.rs
// ============================================================================
// Module: Cleanup Tests
// Description: Log-driven teardown and label-driven recovery sweep.
// Purpose: Verify reverse ordering, failure tolerance, and crash recovery.
// ============================================================================

//! Cleanup coordinator tests against the in-memory platform.

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
use tenant_isolation_core::CleanupCoordinator;
use tenant_isolation_core::CreatedResourceLog;
use tenant_isolation_core::InMemoryPlatform;
use tenant_isolation_core::NoopAuditSink;
use tenant_isolation_core::PlatformFault;
use tenant_isolation_core::RecordingAuditSink;
use tenant_isolation_core::ResourceKind;
use tenant_isolation_core::ResourceProvisioner;
use tenant_isolation_core::ServiceRole;
use tenant_isolation_core::TenantId;
use tenant_isolation_core::ValidatorSettings;

/// Provisions `ids` and returns the populated creation log.
async fn provision(platform: &Arc<InMemoryPlatform>, ids: &[&str]) -> CreatedResourceLog {
    let provisioner = ResourceProvisioner::new(
        platform.clone(),
        ValidatorSettings::default(),
        Arc::new(NoopAuditSink),
    );
    let mut log = CreatedResourceLog::new();
    for id in ids {
        provisioner.create_tenant(TenantId::new(*id).unwrap(), &mut log).await.unwrap();
    }
    log
}

fn coordinator(
    platform: &Arc<InMemoryPlatform>,
    audit: &Arc<RecordingAuditSink>,
) -> CleanupCoordinator {
    CleanupCoordinator::new(platform.clone(), Duration::from_secs(10), audit.clone())
}

#[tokio::test]
async fn cleanup_removes_in_reverse_creation_order() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());
    let mut log = provision(&platform, &["alpha", "beta"]).await;

    let report = coordinator(&platform, &audit).cleanup(&mut log).await;

    let mut expected = platform.created_resources();
    expected.reverse();
    assert_eq!(platform.removed_resources(), expected);
    assert_eq!(report.removed, expected);
    assert!(report.is_clean());
    assert!(log.is_empty());
    assert!(platform.container_names().is_empty());
    assert!(platform.network_names().is_empty());
}

#[tokio::test]
async fn cleanup_retains_volumes() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());
    let mut log = provision(&platform, &["alpha"]).await;

    coordinator(&platform, &audit).cleanup(&mut log).await;

    assert_eq!(platform.volume_names().len(), 2);
}

#[tokio::test]
async fn cleanup_continues_past_removal_failures() {
    let platform =
        Arc::new(InMemoryPlatform::with_faults([PlatformFault::FailRemove(ServiceRole::Cache)]));
    let audit = Arc::new(RecordingAuditSink::new());
    let mut log = provision(&platform, &["alpha", "beta"]).await;

    let report = coordinator(&platform, &audit).cleanup(&mut log).await;

    let failed: Vec<(ResourceKind, &str)> =
        report.failures.iter().map(|failure| (failure.kind, failure.name.as_str())).collect();
    assert_eq!(failed, vec![
        (ResourceKind::Container, "iso-beta-cache"),
        (ResourceKind::Network, "iso-beta-net"),
        (ResourceKind::Container, "iso-alpha-cache"),
        (ResourceKind::Network, "iso-alpha-net"),
    ]);
    assert_eq!(report.removed.len(), 4);
    assert_eq!(platform.removed_resources().len(), 8);
    assert_eq!(platform.container_names(), vec![
        "iso-alpha-cache".to_string(),
        "iso-beta-cache".to_string()
    ]);
    assert_eq!(audit.events_of(AuditEventKind::ResourceRemovalFailed).len(), 4);
}

#[tokio::test]
async fn cleanup_removes_in_flight_container_first() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());
    let mut log = provision(&platform, &["alpha"]).await;
    drop(provision(&platform, &["beta"]).await);
    // beta's database exists on the platform but only its name is logged.
    log.begin_container("iso-beta-database");

    let report = coordinator(&platform, &audit).cleanup(&mut log).await;

    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(report.removed[0], (ResourceKind::Container, "iso-beta-database".to_string()));
    assert_eq!(report.removed.len(), 5);
    assert!(log.is_empty());
    assert!(!platform.container_names().contains(&"iso-beta-database".to_string()));
}

#[tokio::test]
async fn cleanup_skips_in_flight_entry_the_platform_never_created() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());
    let mut log = provision(&platform, &["alpha"]).await;
    log.begin_network("iso-ghost-net");

    let report = coordinator(&platform, &audit).cleanup(&mut log).await;

    assert!(report.is_clean());
    assert_eq!(report.removed.len(), 4);
    assert!(report.removed.iter().all(|(_, name)| name != "iso-ghost-net"));
    assert!(audit.events_of(AuditEventKind::ResourceRemovalFailed).is_empty());
}

#[tokio::test]
async fn sweep_recovers_everything_after_a_crashed_run() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());
    drop(provision(&platform, &["alpha", "beta"]).await);

    let report = coordinator(&platform, &audit).sweep_labeled().await.unwrap();

    assert!(report.is_clean());
    let kinds: Vec<ResourceKind> = report.removed.iter().map(|(kind, _)| *kind).collect();
    let mut expected = vec![ResourceKind::Container; 6];
    expected.extend([ResourceKind::Network; 2]);
    expected.extend([ResourceKind::Volume; 4]);
    assert_eq!(kinds, expected);
    assert!(platform.container_names().is_empty());
    assert!(platform.network_names().is_empty());
    assert!(platform.volume_names().is_empty());
    assert_eq!(audit.events_of(AuditEventKind::SweepCompleted).len(), 1);
}

#[tokio::test]
async fn sweep_on_clean_platform_is_a_no_op() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());

    let report = coordinator(&platform, &audit).sweep_labeled().await.unwrap();

    assert!(report.removed.is_empty());
    assert!(report.is_clean());
}

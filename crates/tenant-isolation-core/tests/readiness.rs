// crates/tenant-isolation-core/tests/readiness.rs
// ============================================================================
// Module: Readiness Tests
// Description: Bounded readiness polling under a paused clock.
// Purpose: Verify the attempt budget and interval are honored exactly.
// ============================================================================

//! Readiness polling tests using tokio's paused clock.

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
use tenant_isolation_core::ContainerHandle;
use tenant_isolation_core::ContainerPlatform;
use tenant_isolation_core::ContainerSpec;
use tenant_isolation_core::InMemoryPlatform;
use tenant_isolation_core::NetworkSpec;
use tenant_isolation_core::PlatformCall;
use tenant_isolation_core::PlatformFault;
use tenant_isolation_core::ProvisioningError;
use tenant_isolation_core::ReadinessCheck;
use tenant_isolation_core::ReadinessPolicy;
use tenant_isolation_core::ReadinessProber;
use tenant_isolation_core::RecordingAuditSink;
use tenant_isolation_core::SecurityOptions;
use tenant_isolation_core::ServiceRole;
use tenant_isolation_core::TenantCredentials;
use tenant_isolation_core::TenantId;
use tenant_isolation_core::tenant_labels;
use tokio::time::Instant;

const POLICY: ReadinessPolicy = ReadinessPolicy {
    attempts: 5,
    interval: Duration::from_secs(2),
};

/// Creates a bare database container and returns it with its credentials.
async fn database(platform: &InMemoryPlatform) -> (TenantId, ContainerHandle, TenantCredentials) {
    let tenant_id = TenantId::new("acme").unwrap();
    let credentials = TenantCredentials::generate(&tenant_id);
    platform
        .create_network(&NetworkSpec {
            name: "iso-acme-net".to_string(),
            labels: tenant_labels(&tenant_id, "network"),
        })
        .await
        .unwrap();
    let container = platform
        .create_container(&ContainerSpec {
            name: "iso-acme-database".to_string(),
            image: "postgres:15-alpine".to_string(),
            network: "iso-acme-net".to_string(),
            env: [
                ("POSTGRES_DB".to_string(), credentials.database_name.clone()),
                ("POSTGRES_USER".to_string(), credentials.database_user.clone()),
            ]
            .into(),
            labels: tenant_labels(&tenant_id, ServiceRole::Database.as_str()),
            command: Vec::new(),
            memory_bytes: 1,
            cpuset: None,
            volume: None,
            security: SecurityOptions::default(),
        })
        .await
        .unwrap();
    (tenant_id, container, credentials)
}

fn readiness_execs(platform: &InMemoryPlatform) -> usize {
    platform
        .calls()
        .iter()
        .filter(|call| matches!(call, PlatformCall::Exec { program, .. } if program == "pg_isready"))
        .count()
}

#[tokio::test(start_paused = true)]
async fn never_ready_fails_after_exactly_attempts_times_interval() {
    let platform =
        Arc::new(InMemoryPlatform::with_faults([PlatformFault::NeverReady(ServiceRole::Database)]));
    let audit = Arc::new(RecordingAuditSink::new());
    let (tenant_id, container, credentials) = database(&platform).await;
    let prober = ReadinessProber::new(platform.clone(), POLICY, audit.clone());

    let started = Instant::now();
    let err = prober
        .wait_for_database_ready(&container, &tenant_id, &credentials)
        .await
        .expect_err("database never becomes ready");

    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert_eq!(readiness_execs(&platform), 5);
    assert!(err.to_string().contains("failed to start after 5 attempts"));
    assert!(matches!(
        err,
        ProvisioningError::NotReady { role: ServiceRole::Database, attempts: 5, .. }
    ));
    assert_eq!(audit.events_of(AuditEventKind::ServiceNotReady).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn container_not_yet_running_is_retried() {
    let platform = Arc::new(InMemoryPlatform::with_faults([PlatformFault::NotRunningPolls(3)]));
    let audit = Arc::new(RecordingAuditSink::new());
    let (tenant_id, container, credentials) = database(&platform).await;
    let prober = ReadinessProber::new(platform.clone(), POLICY, audit.clone());

    let started = Instant::now();
    prober.wait_for_database_ready(&container, &tenant_id, &credentials).await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(6));
    assert_eq!(readiness_execs(&platform), 1);
    let ready = audit.events_of(AuditEventKind::ServiceReady);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].detail.as_deref(), Some("ready after 4 attempt(s)"));
}

#[tokio::test(start_paused = true)]
async fn ready_service_returns_without_sleeping() {
    let platform = Arc::new(InMemoryPlatform::new());
    let audit = Arc::new(RecordingAuditSink::new());
    let (tenant_id, container, _) = database(&platform).await;
    let prober = ReadinessProber::new(platform.clone(), POLICY, audit);

    let started = Instant::now();
    prober
        .wait_for_ready(&container, &tenant_id, &ReadinessCheck::running(ServiceRole::Database))
        .await
        .unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
}

// crates/tenant-isolation-core/src/runtime/readiness.rs
// ============================================================================
// Module: Readiness Prober
// Description: Bounded polling until a freshly created service accepts work.
// Purpose: Gate provisioning on live services instead of fixed sleeps.
// Dependencies: tokio, crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! A readiness wait polls the container state and, once running, executes an
//! in-container check. Transient noise (container still starting, check binary
//! not yet available, platform hiccups) is retried; only exhausting the
//! attempt budget is fatal.
//!
//! ## Invariants
//! - At most `attempts` polls are made.
//! - A sleep of `interval` follows every unsuccessful poll, so an exhausted
//!   wait takes exactly `attempts x interval`.
//! - A successful poll returns immediately without sleeping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::audit::AuditEventKind;
use crate::audit::IsolationAuditEvent;
use crate::audit::IsolationAuditSink;
use crate::core::ContainerHandle;
use crate::core::ReadinessPolicy;
use crate::core::ResourceKind;
use crate::core::ServiceRole;
use crate::core::TenantCredentials;
use crate::core::TenantId;
use crate::interfaces::ContainerPlatform;
use crate::interfaces::ContainerState;
use crate::runtime::commands;
use crate::runtime::provisioner::ProvisioningError;

// ============================================================================
// SECTION: Readiness Check
// ============================================================================

/// What "ready" means for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessCheck {
    /// Service being waited on.
    pub role: ServiceRole,
    /// In-container command; `None` means running is enough.
    pub command: Option<Vec<String>>,
    /// Required stdout (trimmed) in addition to a zero exit code.
    pub expect_stdout: Option<String>,
}

impl ReadinessCheck {
    /// Database accepts connections (`pg_isready`).
    #[must_use]
    pub fn database(credentials: &TenantCredentials) -> Self {
        Self {
            role: ServiceRole::Database,
            command: Some(commands::database_ready_command(credentials)),
            expect_stdout: None,
        }
    }

    /// Cache answers an authenticated `PING`.
    #[must_use]
    pub fn cache(credentials: &TenantCredentials) -> Self {
        Self {
            role: ServiceRole::Cache,
            command: Some(commands::cache_ping_command(credentials)),
            expect_stdout: Some("PONG".to_string()),
        }
    }

    /// Container reports running.
    #[must_use]
    pub const fn running(role: ServiceRole) -> Self {
        Self {
            role,
            command: None,
            expect_stdout: None,
        }
    }
}

// ============================================================================
// SECTION: Prober
// ============================================================================

/// Polls services until ready or the attempt budget is spent.
pub struct ReadinessProber {
    /// Injected platform client.
    platform: Arc<dyn ContainerPlatform>,
    /// Attempt budget and poll interval.
    policy: ReadinessPolicy,
    /// Audit sink for readiness outcomes.
    audit: Arc<dyn IsolationAuditSink>,
}

impl ReadinessProber {
    /// Creates a prober.
    #[must_use]
    pub fn new(
        platform: Arc<dyn ContainerPlatform>,
        policy: ReadinessPolicy,
        audit: Arc<dyn IsolationAuditSink>,
    ) -> Self {
        Self {
            platform,
            policy,
            audit,
        }
    }

    /// Waits until the tenant database accepts connections.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::NotReady`] when the attempt budget is spent.
    pub async fn wait_for_database_ready(
        &self,
        container: &ContainerHandle,
        tenant_id: &TenantId,
        credentials: &TenantCredentials,
    ) -> Result<(), ProvisioningError> {
        self.wait_for_ready(container, tenant_id, &ReadinessCheck::database(credentials)).await
    }

    /// Waits until `check` succeeds against `container`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::NotReady`] when the attempt budget is spent.
    pub async fn wait_for_ready(
        &self,
        container: &ContainerHandle,
        tenant_id: &TenantId,
        check: &ReadinessCheck,
    ) -> Result<(), ProvisioningError> {
        for attempt in 1..=self.policy.attempts {
            if self.poll_once(container, check).await {
                self.audit.record(
                    &IsolationAuditEvent::new(AuditEventKind::ServiceReady)
                        .tenant(tenant_id)
                        .resource(ResourceKind::Container, container.name.clone())
                        .detail(format!("ready after {attempt} attempt(s)")),
                );
                return Ok(());
            }
            tokio::time::sleep(self.policy.interval).await;
        }
        self.audit.record(
            &IsolationAuditEvent::new(AuditEventKind::ServiceNotReady)
                .tenant(tenant_id)
                .resource(ResourceKind::Container, container.name.clone())
                .detail(format!("not ready after {} attempts", self.policy.attempts)),
        );
        Err(ProvisioningError::NotReady {
            tenant_id: tenant_id.clone(),
            role: check.role,
            container: container.name.clone(),
            attempts: self.policy.attempts,
        })
    }

    /// Runs one poll. Every failure mode reads as "not yet ready".
    async fn poll_once(&self, container: &ContainerHandle, check: &ReadinessCheck) -> bool {
        match self.platform.container_state(container).await {
            Ok(ContainerState::Running) => {}
            Ok(_) | Err(_) => return false,
        }
        let Some(command) = &check.command else {
            return true;
        };
        match self.platform.exec(container, command).await {
            Ok(output) if output.success() => check
                .expect_stdout
                .as_deref()
                .is_none_or(|expected| output.stdout.trim() == expected),
            Ok(_) | Err(_) => false,
        }
    }
}

// crates/tenant-isolation-core/src/runtime/provisioner.rs
// ============================================================================
// Module: Resource Provisioner
// Description: Creates the isolated network and service containers of a tenant.
// Purpose: Be the only component that creates platform networks and containers.
// Dependencies: thiserror, crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Provisioning a tenant creates, in order: the tenant bridge network, the
//! database container (then waits for it to accept connections), the cache
//! container (then waits for an authenticated `PING`), and the application
//! container (then waits for it to run).
//!
//! ## Invariants
//! - Each resource is appended to the [`CreatedResourceLog`] immediately
//!   after the platform reports it created, before any later step can fail.
//! - A failed provisioning attempt leaves its partial entries in the log for
//!   the caller's cleanup.
//! - Every container joins only the tenant network and carries the tenant and
//!   isolation labels; volumes inherit the same labels.
//! - Services reach each other by hostname, never by IP.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::audit::AuditEventKind;
use crate::audit::IsolationAuditEvent;
use crate::audit::IsolationAuditSink;
use crate::core::ContainerHandle;
use crate::core::CreatedResourceLog;
use crate::core::ResourceKind;
use crate::core::ServiceRole;
use crate::core::TenantCredentials;
use crate::core::TenantId;
use crate::core::TenantResourceSet;
use crate::core::ValidatorSettings;
use crate::core::container_name;
use crate::core::network_name;
use crate::core::tenant_labels;
use crate::core::volume_name;
use crate::interfaces::ContainerPlatform;
use crate::interfaces::ContainerSpec;
use crate::interfaces::NetworkSpec;
use crate::interfaces::PlatformError;
use crate::interfaces::SecurityOptions;
use crate::interfaces::VolumeMount;
use crate::runtime::commands;
use crate::runtime::readiness::ReadinessCheck;
use crate::runtime::readiness::ReadinessProber;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tenant provisioning failures.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// A resource creation call failed.
    #[error("failed to create {resource} for tenant {tenant_id}: {source}")]
    Create {
        /// Tenant being provisioned.
        tenant_id: TenantId,
        /// Name of the resource that could not be created.
        resource: String,
        /// Underlying platform failure.
        #[source]
        source: PlatformError,
    },
    /// A service did not become ready within the attempt budget.
    #[error("{role} container {container} for tenant {tenant_id} failed to start after {attempts} attempts")]
    NotReady {
        /// Tenant being provisioned.
        tenant_id: TenantId,
        /// Service role that never became ready.
        role: ServiceRole,
        /// Container name.
        container: String,
        /// Attempts made.
        attempts: u32,
    },
}

// ============================================================================
// SECTION: Provisioner
// ============================================================================

/// Creates isolated per-tenant resource sets.
pub struct ResourceProvisioner {
    /// Injected platform client.
    platform: Arc<dyn ContainerPlatform>,
    /// Images, limits, and probe ports.
    settings: ValidatorSettings,
    /// Readiness waits between creation steps.
    readiness: ReadinessProber,
    /// Audit sink for lifecycle events.
    audit: Arc<dyn IsolationAuditSink>,
}

impl ResourceProvisioner {
    /// Creates a provisioner.
    #[must_use]
    pub fn new(
        platform: Arc<dyn ContainerPlatform>,
        settings: ValidatorSettings,
        audit: Arc<dyn IsolationAuditSink>,
    ) -> Self {
        let readiness =
            ReadinessProber::new(Arc::clone(&platform), settings.readiness, Arc::clone(&audit));
        Self {
            platform,
            settings,
            readiness,
            audit,
        }
    }

    /// Provisions one tenant, recording every created resource in `log`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError`] when any creation step or readiness wait
    /// fails. Resources created before the failure remain in `log`.
    pub async fn create_tenant(
        &self,
        tenant_id: TenantId,
        log: &mut CreatedResourceLog,
    ) -> Result<TenantResourceSet, ProvisioningError> {
        let result = self.provision(&tenant_id, log).await;
        if let Err(err) = &result {
            self.audit.record(
                &IsolationAuditEvent::new(AuditEventKind::ProvisioningFailed)
                    .tenant(&tenant_id)
                    .detail(err.to_string()),
            );
        }
        result
    }

    /// Runs the ordered provisioning steps.
    async fn provision(
        &self,
        tenant_id: &TenantId,
        log: &mut CreatedResourceLog,
    ) -> Result<TenantResourceSet, ProvisioningError> {
        let credentials = TenantCredentials::generate(tenant_id);
        let network_spec = NetworkSpec {
            name: network_name(tenant_id),
            labels: tenant_labels(tenant_id, ResourceKind::Network.as_str()),
        };
        log.begin_network(network_spec.name.clone());
        let network = self.platform.create_network(&network_spec).await.map_err(|source| {
            log.abandon_pending();
            ProvisioningError::Create {
                tenant_id: tenant_id.clone(),
                resource: network_spec.name.clone(),
                source,
            }
        })?;
        log.record_network(network.clone());
        self.record_created(tenant_id, ResourceKind::Network, &network.name);

        let mut containers = BTreeMap::new();

        let database = self
            .create_container(log, self.database_spec(tenant_id, &network.name, &credentials))
            .await?;
        self.readiness.wait_for_database_ready(&database, tenant_id, &credentials).await?;
        containers.insert(ServiceRole::Database, database);

        let cache =
            self.create_container(log, self.cache_spec(tenant_id, &network.name, &credentials)).await?;
        self.readiness.wait_for_ready(&cache, tenant_id, &ReadinessCheck::cache(&credentials)).await?;
        containers.insert(ServiceRole::Cache, cache);

        let application =
            self.create_container(log, self.application_spec(tenant_id, &network.name)).await?;
        self.readiness
            .wait_for_ready(
                &application,
                tenant_id,
                &ReadinessCheck::running(ServiceRole::Application),
            )
            .await?;
        containers.insert(ServiceRole::Application, application);

        Ok(TenantResourceSet {
            tenant_id: tenant_id.clone(),
            network,
            containers,
            credentials,
        })
    }

    /// Creates a container and logs it before returning.
    ///
    /// The name is logged as in flight first; if this future is dropped
    /// mid-call, cleanup still removes whatever the platform created.
    async fn create_container(
        &self,
        log: &mut CreatedResourceLog,
        spec: TenantContainerSpec,
    ) -> Result<ContainerHandle, ProvisioningError> {
        log.begin_container(spec.spec.name.clone());
        let handle = self.platform.create_container(&spec.spec).await.map_err(|source| {
            log.abandon_pending();
            ProvisioningError::Create {
                tenant_id: spec.tenant_id.clone(),
                resource: spec.spec.name.clone(),
                source,
            }
        })?;
        log.record_container(handle.clone());
        self.record_created(&spec.tenant_id, ResourceKind::Container, &handle.name);
        Ok(handle)
    }

    /// Emits a resource-created audit event.
    fn record_created(&self, tenant_id: &TenantId, kind: ResourceKind, name: &str) {
        self.audit.record(
            &IsolationAuditEvent::new(AuditEventKind::ResourceCreated)
                .tenant(tenant_id)
                .resource(kind, name),
        );
    }

    // ------------------------------------------------------------------------
    // Container specs
    // ------------------------------------------------------------------------

    /// Database container: tenant-scoped credentials and persistent volume.
    fn database_spec(
        &self,
        tenant_id: &TenantId,
        network: &str,
        credentials: &TenantCredentials,
    ) -> TenantContainerSpec {
        let env = BTreeMap::from([
            ("POSTGRES_DB".to_string(), credentials.database_name.clone()),
            ("POSTGRES_USER".to_string(), credentials.database_user.clone()),
            ("POSTGRES_PASSWORD".to_string(), credentials.database_password.clone()),
        ]);
        self.base_spec(tenant_id, ServiceRole::Database, network, env, Vec::new())
            .with_volume(commands::DATABASE_DATA_PATH)
    }

    /// Cache container: password-protected with append-only persistence.
    fn cache_spec(
        &self,
        tenant_id: &TenantId,
        network: &str,
        credentials: &TenantCredentials,
    ) -> TenantContainerSpec {
        let command = commands::cache_server_command(&credentials.cache_password);
        self.base_spec(tenant_id, ServiceRole::Cache, network, BTreeMap::new(), command)
            .with_volume(commands::CACHE_DATA_PATH)
    }

    /// Application container: read-only root, peers addressed by hostname.
    fn application_spec(&self, tenant_id: &TenantId, network: &str) -> TenantContainerSpec {
        let ports = &self.settings.probes;
        let env = BTreeMap::from([
            ("TENANT_ID".to_string(), tenant_id.to_string()),
            ("DATABASE_HOST".to_string(), container_name(tenant_id, ServiceRole::Database)),
            ("DATABASE_PORT".to_string(), ports.database_port.to_string()),
            ("CACHE_HOST".to_string(), container_name(tenant_id, ServiceRole::Cache)),
            ("CACHE_PORT".to_string(), ports.cache_port.to_string()),
        ]);
        let command = self.settings.services.application_command.clone();
        let mut spec =
            self.base_spec(tenant_id, ServiceRole::Application, network, env, command);
        spec.spec.security.read_only_root = true;
        spec.spec.security.tmpfs = vec!["/tmp".to_string()];
        spec
    }

    /// Shared spec: single network, labels, limits, `no-new-privileges`.
    fn base_spec(
        &self,
        tenant_id: &TenantId,
        role: ServiceRole,
        network: &str,
        env: BTreeMap<String, String>,
        command: Vec<String>,
    ) -> TenantContainerSpec {
        let service = self.settings.services.for_role(role);
        TenantContainerSpec {
            tenant_id: tenant_id.clone(),
            role,
            spec: ContainerSpec {
                name: container_name(tenant_id, role),
                image: service.image.clone(),
                network: network.to_string(),
                env,
                labels: tenant_labels(tenant_id, role.as_str()),
                command,
                memory_bytes: service.memory_bytes,
                cpuset: service.cpuset.clone(),
                volume: None,
                security: SecurityOptions {
                    no_new_privileges: true,
                    ..SecurityOptions::default()
                },
            },
        }
    }
}

/// Container spec paired with its owning tenant.
struct TenantContainerSpec {
    /// Owning tenant.
    tenant_id: TenantId,
    /// Service role.
    role: ServiceRole,
    /// Platform request.
    spec: ContainerSpec,
}

impl TenantContainerSpec {
    /// Attaches the tenant-scoped persistent volume for this role.
    fn with_volume(mut self, target: &str) -> Self {
        self.spec.volume = Some(VolumeMount {
            name: volume_name(&self.tenant_id, self.role),
            target: target.to_string(),
            labels: tenant_labels(&self.tenant_id, self.role.as_str()),
        });
        self
    }
}

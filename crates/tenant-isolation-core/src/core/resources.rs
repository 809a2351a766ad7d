// crates/tenant-isolation-core/src/core/resources.rs
// ============================================================================
// Module: Tenant Resources
// Description: Handles, per-tenant resource sets, and the creation log.
// Purpose: Track exactly which platform resources a validation run owns.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! A [`TenantResourceSet`] describes one provisioned tenant. The
//! [`CreatedResourceLog`] is the single source of truth for normal teardown:
//! entries are appended in creation order and drained in reverse.
//!
//! ## Invariants
//! - Every network or container created during a run has exactly one log entry.
//! - The log is append-only until cleanup drains it.
//! - Label keys are a hard contract with the recovery sweep.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ResourceKind;
use crate::core::identifiers::ServiceRole;
use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Label carrying the owning tenant identifier.
pub const TENANT_LABEL: &str = "tenant-isolation.tenant-id";
/// Marker label used by the recovery sweep to discover resources.
pub const ISOLATION_LABEL: &str = "tenant-isolation.enabled";
/// Value of [`ISOLATION_LABEL`] on every created resource.
pub const ISOLATION_LABEL_VALUE: &str = "true";
/// Label carrying the resource role (`network` or a [`ServiceRole`]).
pub const ROLE_LABEL: &str = "tenant-isolation.role";

/// Builds the label set attached to every resource of a tenant.
#[must_use]
pub fn tenant_labels(tenant_id: &TenantId, role: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (TENANT_LABEL.to_string(), tenant_id.to_string()),
        (ISOLATION_LABEL.to_string(), ISOLATION_LABEL_VALUE.to_string()),
        (ROLE_LABEL.to_string(), role.to_string()),
    ])
}

// ============================================================================
// SECTION: Handles
// ============================================================================

/// Platform handle for a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHandle {
    /// Platform-assigned identifier.
    pub id: String,
    /// Network name.
    pub name: String,
}

/// Platform handle for a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHandle {
    /// Platform-assigned identifier.
    pub id: String,
    /// Container name, also its hostname on the tenant network.
    pub name: String,
}

// ============================================================================
// SECTION: Naming
// ============================================================================

/// Returns the tenant-scoped network name.
#[must_use]
pub fn network_name(tenant_id: &TenantId) -> String {
    format!("iso-{tenant_id}-net")
}

/// Returns the container name (and hostname) for a tenant service.
#[must_use]
pub fn container_name(tenant_id: &TenantId, role: ServiceRole) -> String {
    format!("iso-{tenant_id}-{role}")
}

/// Returns the persistent volume name for a tenant service.
#[must_use]
pub fn volume_name(tenant_id: &TenantId, role: ServiceRole) -> String {
    format!("iso-{tenant_id}-{role}-data")
}

// ============================================================================
// SECTION: Tenant Resource Set
// ============================================================================

/// Generated credentials for one tenant's storage services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCredentials {
    /// Database name.
    pub database_name: String,
    /// Database user.
    pub database_user: String,
    /// Database password.
    pub database_password: String,
    /// Cache password.
    pub cache_password: String,
}

impl TenantCredentials {
    /// Generates tenant-scoped credentials with random passwords.
    #[must_use]
    pub fn generate(tenant_id: &TenantId) -> Self {
        let slug = tenant_id.as_str().replace('-', "_");
        Self {
            database_name: format!("db_{slug}"),
            database_user: format!("user_{slug}"),
            database_password: random_secret(),
            cache_password: random_secret(),
        }
    }
}

/// Generates an alphanumeric secret.
fn random_secret() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(24).map(char::from).collect()
}

/// One provisioned test tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantResourceSet {
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Isolated tenant network.
    pub network: NetworkHandle,
    /// Service containers keyed by role.
    pub containers: BTreeMap<ServiceRole, ContainerHandle>,
    /// Storage credentials used by the data probe.
    pub credentials: TenantCredentials,
}

impl TenantResourceSet {
    /// Returns the container for a role when provisioned.
    #[must_use]
    pub fn container(&self, role: ServiceRole) -> Option<&ContainerHandle> {
        self.containers.get(&role)
    }
}

// ============================================================================
// SECTION: Creation Log
// ============================================================================

/// Handle recorded in the creation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceHandle {
    /// Created network.
    Network(NetworkHandle),
    /// Created container.
    Container(ContainerHandle),
}

impl ResourceHandle {
    /// Returns the resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Network(_) => ResourceKind::Network,
            Self::Container(_) => ResourceKind::Container,
        }
    }

    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Network(handle) => &handle.name,
            Self::Container(handle) => &handle.name,
        }
    }
}

/// Ordered record of resources created during one run.
///
/// A resource whose creation call is still in flight is held as the pending
/// entry, keyed by its deterministic name, so that an interrupted creation can
/// still be torn down.
#[derive(Debug, Default)]
pub struct CreatedResourceLog {
    /// Entries in creation order.
    entries: Vec<ResourceHandle>,
    /// Resource whose creation has been requested but not confirmed.
    pending: Option<ResourceHandle>,
}

impl CreatedResourceLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a network creation as in flight.
    pub fn begin_network(&mut self, name: impl Into<String>) {
        self.pending = Some(ResourceHandle::Network(NetworkHandle {
            id: String::new(),
            name: name.into(),
        }));
    }

    /// Marks a container creation as in flight.
    pub fn begin_container(&mut self, name: impl Into<String>) {
        self.pending = Some(ResourceHandle::Container(ContainerHandle {
            id: String::new(),
            name: name.into(),
        }));
    }

    /// Drops the in-flight entry after the platform rejected the creation.
    pub fn abandon_pending(&mut self) {
        self.pending = None;
    }

    /// Returns the in-flight entry, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&ResourceHandle> {
        self.pending.as_ref()
    }

    /// Takes the in-flight entry, if any.
    pub fn take_pending(&mut self) -> Option<ResourceHandle> {
        self.pending.take()
    }

    /// Records a created network and clears the in-flight entry.
    pub fn record_network(&mut self, handle: NetworkHandle) {
        self.pending = None;
        self.entries.push(ResourceHandle::Network(handle));
    }

    /// Records a created container and clears the in-flight entry.
    pub fn record_container(&mut self, handle: ContainerHandle) {
        self.pending = None;
        self.entries.push(ResourceHandle::Container(handle));
    }

    /// Returns entries in creation order.
    #[must_use]
    pub fn entries(&self) -> &[ResourceHandle] {
        &self.entries
    }

    /// Returns the number of recorded resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is recorded or in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.pending.is_none()
    }

    /// Removes all entries, returning them in teardown (reverse) order.
    pub fn drain_for_teardown(&mut self) -> Vec<ResourceHandle> {
        let mut entries = std::mem::take(&mut self.entries);
        entries.reverse();
        entries
    }
}

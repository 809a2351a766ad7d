// crates/tenant-isolation-core/src/audit.rs
// ============================================================================
// Module: Isolation Audit Logging
// Description: Structured audit events for validation runs.
// Purpose: Emit JSON-lines lifecycle logs without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every lifecycle step of a validation run (phase changes, resource creation
//! and teardown, readiness exhaustion, probe verdicts, sweep results) is
//! emitted as one [`IsolationAuditEvent`]. Sinks serialize events as JSON lines
//! so operators can route them into whatever pipeline they use.
//!
//! Audit events never carry credentials.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::ResourceKind;
use crate::core::TenantId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Audit event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    /// Orchestrator entered a new phase.
    PhaseChanged,
    /// A network or container was created.
    ResourceCreated,
    /// A network, container, or volume was removed.
    ResourceRemoved,
    /// A removal attempt failed and was skipped.
    ResourceRemovalFailed,
    /// A service became ready.
    ServiceReady,
    /// A service exhausted its readiness attempts.
    ServiceNotReady,
    /// Tenant provisioning failed.
    ProvisioningFailed,
    /// A probe category finished.
    ProbeCompleted,
    /// A validation run finished.
    RunCompleted,
    /// Label-driven recovery sweep finished.
    SweepCompleted,
}

/// Validation audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct IsolationAuditEvent {
    /// Event classification.
    pub event: AuditEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Tenant identifier when the event is tenant-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Resource kind when the event concerns a resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_kind: Option<ResourceKind>,
    /// Resource name when the event concerns a resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Free-form detail (phase label, verdict, error text).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IsolationAuditEvent {
    /// Creates a new event with a consistent timestamp.
    #[must_use]
    pub fn new(event: AuditEventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            tenant_id: None,
            resource_kind: None,
            resource: None,
            detail: None,
        }
    }

    /// Attaches the owning tenant.
    #[must_use]
    pub fn tenant(mut self, tenant_id: &TenantId) -> Self {
        self.tenant_id = Some(tenant_id.to_string());
        self
    }

    /// Attaches the affected resource.
    #[must_use]
    pub fn resource(mut self, kind: ResourceKind, name: impl Into<String>) -> Self {
        self.resource_kind = Some(kind);
        self.resource = Some(name.into());
        self
    }

    /// Attaches free-form detail.
    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for validation events.
pub trait IsolationAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &IsolationAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl IsolationAuditSink for StderrAuditSink {
    fn record(&self, event: &IsolationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl IsolationAuditSink for FileAuditSink {
    fn record(&self, event: &IsolationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl IsolationAuditSink for NoopAuditSink {
    fn record(&self, _event: &IsolationAuditEvent) {}
}

/// Audit sink that keeps events in memory for inspection.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Recorded events in emission order.
    events: Mutex<Vec<IsolationAuditEvent>>,
}

impl RecordingAuditSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<IsolationAuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns recorded events of one kind.
    #[must_use]
    pub fn events_of(&self, kind: AuditEventKind) -> Vec<IsolationAuditEvent> {
        self.events().into_iter().filter(|event| event.event == kind).collect()
    }
}

impl IsolationAuditSink for RecordingAuditSink {
    fn record(&self, event: &IsolationAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

// crates/tenant-isolation-core/src/lib.rs
// ============================================================================
// Module: Tenant Isolation Core
// Description: Multi-tenant isolation validation harness.
// Purpose: Provision per-tenant resource sets, probe isolation, and clean up.
// Dependencies: async-trait, rand, serde, serde_json, thiserror, time, tokio
// ============================================================================

//! ## Overview
//! A validation run provisions N ephemeral tenants (an isolated bridge network
//! plus database, cache, and application containers each), runs adversarial
//! isolation probes against them, aggregates a [`ValidationReport`], and tears
//! everything down again. All platform effects go through the
//! [`ContainerPlatform`] trait so the same runtime drives Docker in production
//! and [`InMemoryPlatform`] in tests.
//! Invariants:
//! - Every created network and container is recorded in a
//!   [`CreatedResourceLog`] and carries the isolation marker label.
//! - Cleanup runs on every path, including interrupts.
//! - A probe result is failed iff it carries issues.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditEventKind;
pub use audit::FileAuditSink;
pub use audit::IsolationAuditEvent;
pub use audit::IsolationAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RecordingAuditSink;
pub use audit::StderrAuditSink;
pub use crate::core::*;
pub use crate::interfaces::*;
pub use crate::runtime::*;

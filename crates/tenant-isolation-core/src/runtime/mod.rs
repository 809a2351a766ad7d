// crates/tenant-isolation-core/src/runtime/mod.rs
// ============================================================================
// Module: Tenant Isolation Runtime
// Description: Provisioning, readiness, probes, cleanup, and orchestration.
// Purpose: Drive validation runs against an injected container platform.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime components receive an `Arc<dyn ContainerPlatform>` at construction
//! and never hold global state. The orchestrator composes them into a single
//! sequential run; the in-memory platform backs the test suites.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cleanup;
pub mod commands;
pub mod memory;
pub mod orchestrator;
pub mod probes;
pub mod provisioner;
pub mod readiness;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cleanup::CleanupCoordinator;
pub use cleanup::CleanupFailure;
pub use cleanup::CleanupReport;
pub use memory::InMemoryPlatform;
pub use memory::PlatformCall;
pub use memory::PlatformFault;
pub use orchestrator::RunError;
pub use orchestrator::RunPhase;
pub use orchestrator::ValidationOrchestrator;
pub use orchestrator::ValidationRun;
pub use probes::IsolationProbes;
pub use provisioner::ProvisioningError;
pub use provisioner::ResourceProvisioner;
pub use readiness::ReadinessCheck;
pub use readiness::ReadinessProber;

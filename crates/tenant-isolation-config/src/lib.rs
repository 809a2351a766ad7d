// crates/tenant-isolation-config/src/lib.rs
// ============================================================================
// Module: Tenant Isolation Config Library
// Description: Operator configuration model and validation.
// Purpose: Single source of truth for tenant-isolation.toml semantics.
// Dependencies: tenant-isolation-core, serde, toml
// ============================================================================

//! ## Overview
//! `tenant-isolation-config` parses `tenant-isolation.toml`, validates it
//! against hard limits, and converts it into the runtime
//! [`tenant_isolation_core::ValidatorSettings`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;

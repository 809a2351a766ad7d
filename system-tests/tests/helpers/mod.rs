// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for tenant isolation system-tests.
// Purpose: Provide Docker fixtures and run serialization.
// Dependencies: system-tests, tenant-isolation-core, tenant-isolation-docker
// ============================================================================

//! ## Overview
//! Shared helpers for tenant isolation system-tests.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod infra;

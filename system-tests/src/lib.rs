// system-tests/src/lib.rs
// ============================================================================
// Module: Tenant Isolation System Tests Library
// Description: Shared configuration for Docker-backed system tests.
// Purpose: Provide common utilities for the system-test binaries.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the Docker-backed
//! system-tests in `system-tests/tests`. The tests only build with the
//! `system-tests` feature and need a reachable Docker engine.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// crates/tenant-isolation-cli/src/lib.rs
// ============================================================================
// Module: Tenant Isolation CLI Library
// Description: Shared helpers for the tenant isolation command-line interface.
// Purpose: Provide reusable components (i18n) for the CLI binary and tests.
// Dependencies: Standard library.
// ============================================================================

//! ## Overview
//! Houses the internationalized message catalog. The binary entry point
//! (`src/main.rs`) imports these helpers so all user-facing output stays
//! consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Internationalization helpers and message catalog.
pub mod i18n;

// crates/tenant-isolation-cli/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Exercises the translation catalog and placeholder substitution.
// Purpose: Ensure CLI user-facing strings route through stable i18n helpers.
// Dependencies: tenant-isolation-cli i18n module and the `t!` macro.
// ============================================================================

//! ## Overview
//! Validates the CLI i18n catalog behavior:
//! - Translation falls back to keys on misses.
//! - Console summary, skip, cleanup, and pre-flight lines render exactly as
//!   operators read them.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use tenant_isolation_cli::i18n::MessageArg;
use tenant_isolation_cli::i18n::translate;
use tenant_isolation_cli::t;

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Confirms catalog entries resolve and replace placeholders.
#[test]
fn translate_substitutes_placeholders() {
    let args = vec![MessageArg::new("path", "/tmp/report.json")];
    let result = translate("report.written", args);
    assert_eq!(result, "Report written to /tmp/report.json");
}

/// Confirms missing keys fall back to the key string.
#[test]
fn translate_falls_back_to_key() {
    let result = translate("missing.key", vec![MessageArg::new("path", "/tmp/x")]);
    assert_eq!(result, "missing.key");
}

/// Confirms the summary counts line formats every count.
#[test]
fn t_macro_formats_check_counts() {
    let rendered = t!("validate.counts", passed = 3, failed = 1, skipped = 0, total = 4);
    assert_eq!(rendered, "Checks: 3 passed, 1 failed, 0 skipped of 4");
}

/// Confirms a skipped probe line carries its reason.
#[test]
fn skipped_check_line_includes_reason() {
    let rendered = t!(
        "validate.check_skipped",
        category = "network_isolation",
        status = "skipped",
        reason = "network isolation requires at least two tenants"
    );
    assert_eq!(
        rendered,
        "  network_isolation: skipped (network isolation requires at least two tenants)"
    );
}

/// Confirms cleanup failures name the resource and the platform error.
#[test]
fn cleanup_failure_line_names_resource_and_error() {
    let rendered =
        t!("cleanup.failure", kind = "network", name = "iso-acme-net", error = "has active endpoints");
    assert_eq!(rendered, "  ! network iso-acme-net: has active endpoints");
    let summary = t!("cleanup.summary", removed = 7, failures = 1);
    assert_eq!(summary, "Cleanup: 7 resource(s) removed, 1 failure(s)");
}

/// Confirms the pre-flight line reports the engine and the binary used.
#[test]
fn docker_connected_line_names_binary() {
    let rendered = t!("docker.connected", version = "27.1.1", binary = "/usr/bin/docker");
    assert_eq!(rendered, "Docker engine 27.1.1 reachable via /usr/bin/docker.");
}

/// Confirms unknown placeholders are left untouched.
#[test]
fn unknown_arguments_do_not_alter_template() {
    let rendered = t!("cleanup.sweep_start", label = "tenant-isolation.enabled=true", extra = "x");
    assert_eq!(rendered, "Removing every resource labeled tenant-isolation.enabled=true...");
}

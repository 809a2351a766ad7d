// crates/tenant-isolation-config/src/config/tests.rs
// ============================================================================
// Module: Config Helper Tests
// Description: Unit tests for path resolution and cpuset parsing.
// Purpose: Pin resolution precedence without touching process environment.
// Dependencies: tempfile
// ============================================================================

//! ## Overview
//! Path resolution takes the environment value as an argument so precedence
//! can be checked without mutating process state.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use super::MAX_TOTAL_PATH_LENGTH;
use super::resolve_path;
use super::validate_cpuset;
use super::validate_path_string;

// ============================================================================
// SECTION: Resolution Tests
// ============================================================================

#[test]
fn explicit_path_wins_over_environment() {
    let resolved =
        resolve_path(Some(Path::new("explicit.toml")), Some("env.toml".to_string())).unwrap();
    assert_eq!(resolved, Some(PathBuf::from("explicit.toml")));
}

#[test]
fn environment_path_used_without_argument() {
    let resolved = resolve_path(None, Some("env.toml".to_string())).unwrap();
    assert_eq!(resolved, Some(PathBuf::from("env.toml")));
}

#[test]
fn environment_path_length_is_bounded() {
    let long = "a".repeat(MAX_TOTAL_PATH_LENGTH + 1);
    let err = resolve_path(None, Some(long)).unwrap_err();
    assert!(err.to_string().contains("config path exceeds max length"));
}

// ============================================================================
// SECTION: Field Helper Tests
// ============================================================================

#[test]
fn cpuset_accepts_lists_and_ranges() {
    for value in ["0", "0-3", "0,2", "0-1,4-5"] {
        validate_cpuset("database", value).unwrap();
    }
}

#[test]
fn cpuset_rejects_malformed_lists() {
    for value in ["", "a", "3-1", "0,", "0--1", "0 1"] {
        let err = validate_cpuset("cache", value).unwrap_err();
        assert!(err.to_string().contains("limits.cache.cpuset"), "accepted {value}");
    }
}

#[test]
fn path_string_rejects_blank_values() {
    assert!(validate_path_string("docker.binary", "  ").is_err());
    validate_path_string("docker.binary", "/usr/bin/docker").unwrap();
}

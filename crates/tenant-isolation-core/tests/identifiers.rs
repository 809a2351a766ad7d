// crates/tenant-isolation-core/tests/identifiers.rs
// ============================================================================
// Module: Identifier Tests
// Description: Tenant id validation, naming, and credentials.
// Purpose: Guard the values that flow into platform names and logs.
// ============================================================================

//! Identifier, naming, and credential tests.

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

use tenant_isolation_core::IdentifierError;
use tenant_isolation_core::ServiceRole;
use tenant_isolation_core::TenantCredentials;
use tenant_isolation_core::TenantId;
use tenant_isolation_core::container_name;
use tenant_isolation_core::network_name;
use tenant_isolation_core::volume_name;

#[test]
fn tenant_id_rejects_unsafe_values() {
    assert_eq!(TenantId::new(""), Err(IdentifierError::Empty));
    assert!(matches!(TenantId::new("-lead"), Err(IdentifierError::InvalidStart(_))));
    assert!(matches!(
        TenantId::new("acme'; DROP"),
        Err(IdentifierError::InvalidCharacter { character: '\'', .. })
    ));
    assert!(matches!(TenantId::new("Acme"), Err(IdentifierError::InvalidCharacter { .. })));
    assert!(matches!(TenantId::new("a".repeat(41)), Err(IdentifierError::TooLong(_))));
    assert!(TenantId::new("a".repeat(40)).is_ok());
}

#[test]
fn tenant_id_deserialization_validates() {
    let parsed: TenantId = serde_json::from_str("\"tenant-7\"").unwrap();
    assert_eq!(parsed.as_str(), "tenant-7");
    assert!(serde_json::from_str::<TenantId>("\"Bad Id\"").is_err());
}

#[test]
fn generated_ids_are_valid_and_distinct() {
    let first = TenantId::generate(1);
    let second = TenantId::generate(1);
    assert!(first.as_str().starts_with("tenant-1-"));
    assert_eq!(first.as_str().len(), "tenant-1-".len() + 8);
    assert!(TenantId::new(first.as_str()).is_ok());
    assert_ne!(first, second);
}

#[test]
fn resource_names_are_tenant_scoped() {
    let tenant_id = TenantId::new("acme").unwrap();
    assert_eq!(network_name(&tenant_id), "iso-acme-net");
    assert_eq!(container_name(&tenant_id, ServiceRole::Cache), "iso-acme-cache");
    assert_eq!(volume_name(&tenant_id, ServiceRole::Database), "iso-acme-database-data");
}

#[test]
fn credentials_are_tenant_scoped_and_random() {
    let tenant_id = TenantId::new("acme-west").unwrap();
    let first = TenantCredentials::generate(&tenant_id);
    let second = TenantCredentials::generate(&tenant_id);
    assert_eq!(first.database_name, "db_acme_west");
    assert_eq!(first.database_user, "user_acme_west");
    assert_eq!(first.database_password.len(), 24);
    assert!(first.cache_password.chars().all(|ch| ch.is_ascii_alphanumeric()));
    assert_ne!(first.database_password, second.database_password);
}

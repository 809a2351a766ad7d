// system-tests/src/config/env_tests.rs
// ============================================================================
// Module: System Test Env Unit Tests
// Description: Unit coverage for strict environment parsing in system-tests.
// Purpose: Ensure configuration parsing fails closed on invalid inputs.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Unit coverage for strict environment parsing in system-tests.
//! Invariants:
//! - Environment parsing rejects invalid or empty values.
//! - Tests restore environment state after each run.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

use super::DEFAULT_SYSTEM_TEST_TIMEOUT;
use super::SystemTestConfig;
use super::SystemTestEnv;

/// Process environment mutation, serialized by [`env_lock`].
mod env_mut {
    #![allow(unsafe_code, reason = "Tests mutate process env vars in a controlled scope.")]

    /// Sets an environment variable for the current process.
    pub fn set_var(key: &str, value: &str) {
        // SAFETY: Tests serialize environment mutation via a global lock.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    /// Removes an environment variable from the current process.
    pub fn remove_var(key: &str) {
        // SAFETY: Tests serialize environment mutation via a global lock.
        unsafe {
            std::env::remove_var(key);
        }
    }
}

/// Serializes tests that touch the process environment.
fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().expect("env lock poisoned")
}

/// Restores captured environment values on drop.
struct EnvGuard {
    /// Variable names with their values at capture time.
    entries: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    /// Captures and clears the named variables.
    fn new(names: &[&'static str]) -> Self {
        let entries = names.iter().map(|name| (*name, std::env::var(*name).ok())).collect();
        for name in names {
            env_mut::remove_var(name);
        }
        Self {
            entries,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in self.entries.drain(..) {
            match value {
                Some(value) => env_mut::set_var(name, &value),
                None => env_mut::remove_var(name),
            }
        }
    }
}

/// Every variable read by [`SystemTestConfig::load`].
fn env_names() -> [&'static str; 3] {
    [
        SystemTestEnv::DockerBinary.as_str(),
        SystemTestEnv::Tenants.as_str(),
        SystemTestEnv::TimeoutSeconds.as_str(),
    ]
}

#[test]
fn unset_environment_loads_defaults() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    let config = SystemTestConfig::load().expect("config should load");
    assert_eq!(config, SystemTestConfig::default());
    assert_eq!(config.timeout_or_default(), DEFAULT_SYSTEM_TEST_TIMEOUT);
}

#[test]
fn timeout_rejects_invalid_values() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(SystemTestEnv::TimeoutSeconds.as_str(), "0");
    assert!(SystemTestConfig::load().is_err());

    env_mut::set_var(SystemTestEnv::TimeoutSeconds.as_str(), "not-a-number");
    assert!(SystemTestConfig::load().is_err());
}

#[test]
fn timeout_accepts_positive_values() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(SystemTestEnv::TimeoutSeconds.as_str(), "5");
    let config = SystemTestConfig::load().expect("config should load");
    assert_eq!(config.timeout_or_default(), Duration::from_secs(5));
}

#[test]
fn tenants_must_be_in_range() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(SystemTestEnv::Tenants.as_str(), "3");
    assert_eq!(SystemTestConfig::load().unwrap().tenants, Some(3));

    env_mut::set_var(SystemTestEnv::Tenants.as_str(), "0");
    assert!(SystemTestConfig::load().is_err());

    env_mut::set_var(SystemTestEnv::Tenants.as_str(), "9");
    assert!(SystemTestConfig::load().is_err());
}

#[test]
fn docker_binary_override_and_empty_values() {
    let _lock = env_lock();
    let _guard = EnvGuard::new(&env_names());

    env_mut::set_var(SystemTestEnv::DockerBinary.as_str(), "/usr/local/bin/podman");
    let config = SystemTestConfig::load().unwrap();
    assert_eq!(config.docker_binary, Some(PathBuf::from("/usr/local/bin/podman")));

    env_mut::set_var(SystemTestEnv::DockerBinary.as_str(), "   ");
    assert!(SystemTestConfig::load().is_err());
}

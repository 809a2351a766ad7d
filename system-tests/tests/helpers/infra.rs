// system-tests/tests/helpers/infra.rs
// ============================================================================
// Module: System Test Infrastructure
// Description: Docker engine fixture for isolation system-tests.
// Purpose: Connect to the engine once per scenario and serialize scenarios.
// Dependencies: system-tests, tenant-isolation-config, tenant-isolation-docker, tokio
// ============================================================================

//! ## Overview
//! Scenarios share one engine and one label namespace, so a sweep in one
//! scenario would tear down another scenario's tenants. [`DockerFixture`]
//! holds a process-wide lock for the lifetime of each scenario.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use system_tests::config::SystemTestConfig;
use tenant_isolation_config::IsolationConfig;
use tenant_isolation_core::ContainerPlatform;
use tenant_isolation_core::ISOLATION_LABEL;
use tenant_isolation_core::ISOLATION_LABEL_VALUE;
use tenant_isolation_core::LabeledResources;
use tenant_isolation_core::ValidatorSettings;
use tenant_isolation_docker::DockerCli;
use tokio::sync::Mutex;
use tokio::sync::MutexGuard;

/// Tenants per scenario when no override is configured.
const DEFAULT_TENANTS: usize = 2;

/// Engine connection plus the scenario lock.
pub struct DockerFixture {
    /// Connected Docker client.
    pub docker: Arc<DockerCli>,
    /// Engine version reported by `docker info`.
    pub engine_version: String,
    /// Validator settings built from the default configuration.
    pub settings: ValidatorSettings,
    /// Tenant count for full runs.
    pub tenants: usize,
    /// Per-scenario timeout.
    pub timeout: Duration,
    /// Held until the scenario finishes.
    _guard: MutexGuard<'static, ()>,
}

impl DockerFixture {
    /// Connects to the engine, or returns `Ok(None)` when none is reachable.
    pub async fn connect() -> Result<Option<Self>, String> {
        let env = SystemTestConfig::load()?;
        let guard = scenario_lock().lock().await;
        let config = IsolationConfig::default();
        let binary = env.docker_binary.clone().unwrap_or_else(|| config.docker.binary.clone());
        let docker = DockerCli::new(binary);
        let engine_version = match docker.ensure_available().await {
            Ok(version) => version,
            Err(err) => {
                eprintln!("skipping: docker unavailable: {err}");
                return Ok(None);
            }
        };
        Ok(Some(Self {
            docker: Arc::new(docker),
            engine_version,
            settings: config.to_settings(),
            tenants: env.tenants.unwrap_or(DEFAULT_TENANTS),
            timeout: env.timeout_or_default(),
            _guard: guard,
        }))
    }

    /// Lists every resource carrying the isolation marker label.
    pub async fn labeled(&self) -> Result<LabeledResources, String> {
        self.docker
            .list_labeled(ISOLATION_LABEL, ISOLATION_LABEL_VALUE)
            .await
            .map_err(|err| format!("list labeled resources: {err}"))
    }
}

/// Process-wide scenario lock.
fn scenario_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

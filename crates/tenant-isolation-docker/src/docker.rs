// crates/tenant-isolation-docker/src/docker.rs
// ============================================================================
// Module: Docker CLI Platform
// Description: `ContainerPlatform` backed by the `docker` binary.
// Purpose: Execute platform operations against a local Docker engine.
// Dependencies: async-trait, tokio, tenant-isolation-core
// ============================================================================

//! ## Overview
//! Every operation spawns one `docker` process with an argument vector from
//! [`crate::args`]. Child processes are killed when their future is dropped,
//! so an interrupted run does not leave stray CLI invocations behind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tenant_isolation_core::ContainerHandle;
use tenant_isolation_core::ContainerInspection;
use tenant_isolation_core::ContainerPlatform;
use tenant_isolation_core::ContainerSpec;
use tenant_isolation_core::ContainerState;
use tenant_isolation_core::ExecOutput;
use tenant_isolation_core::LabeledResources;
use tenant_isolation_core::NetworkHandle;
use tenant_isolation_core::NetworkSpec;
use tenant_isolation_core::PlatformError;
use tokio::process::Command;

use crate::args;
use crate::args::ListTarget;
use crate::parse;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default Docker binary, resolved through `PATH`.
pub const DEFAULT_DOCKER_BINARY: &str = "docker";

/// Prefix of daemon-side failures reported by `docker exec`.
const DAEMON_ERROR_PREFIX: &str = "Error response from daemon";

// ============================================================================
// SECTION: Client
// ============================================================================

/// Captured output of one `docker` invocation.
struct Invocation {
    /// Exit code; `-1` when terminated by a signal.
    exit_code: i64,
    /// Captured stdout.
    stdout: String,
    /// Captured stderr.
    stderr: String,
}

/// Docker CLI platform client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    /// Path to the `docker` binary.
    binary: PathBuf,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_BINARY)
    }
}

impl DockerCli {
    /// Creates a client for the given binary.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns the configured binary.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Verifies the engine is reachable (`docker info`).
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unavailable`] when the binary is missing or
    /// the daemon does not answer.
    pub async fn ensure_available(&self) -> Result<String, PlatformError> {
        let output = self.invoke(&args::info()).await?;
        if output.exit_code != 0 {
            return Err(PlatformError::Unavailable(output.stderr.trim().to_string()));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Spawns `docker` with `argv` and captures its output.
    async fn invoke(&self, argv: &[String]) -> Result<Invocation, PlatformError> {
        let output = Command::new(&self.binary)
            .args(argv)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                PlatformError::Unavailable(format!("{}: {err}", self.binary.display()))
            })?;
        Ok(Invocation {
            exit_code: output.status.code().map_or(-1, i64::from),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Runs a command that must succeed, returning trimmed stdout.
    async fn run(&self, operation: &'static str, argv: &[String]) -> Result<String, PlatformError> {
        let output = self.invoke(argv).await?;
        if output.exit_code == 0 {
            return Ok(output.stdout.trim().to_string());
        }
        let message = output.stderr.trim().to_string();
        if parse::is_not_found(&message) {
            return Err(PlatformError::NotFound(message));
        }
        Err(PlatformError::Call {
            operation,
            message,
        })
    }
}

#[async_trait]
impl ContainerPlatform for DockerCli {
    async fn create_network(&self, spec: &NetworkSpec) -> Result<NetworkHandle, PlatformError> {
        let id = self.run("network create", &args::network_create(spec)).await?;
        Ok(NetworkHandle {
            id,
            name: spec.name.clone(),
        })
    }

    async fn create_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<ContainerHandle, PlatformError> {
        match self.run("container run", &args::container_run(spec)).await {
            Ok(id) => Ok(ContainerHandle {
                id,
                name: spec.name.clone(),
            }),
            Err(err) => {
                // `docker run` can fail after the container exists; it is not logged.
                let _ = self.invoke(&args::container_remove(&spec.name, true)).await;
                Err(err)
            }
        }
    }

    async fn container_state(
        &self,
        container: &ContainerHandle,
    ) -> Result<ContainerState, PlatformError> {
        let status = self.run("container inspect", &args::container_state(&container.name)).await?;
        Ok(parse::state(&status))
    }

    async fn exec(
        &self,
        container: &ContainerHandle,
        command: &[String],
    ) -> Result<ExecOutput, PlatformError> {
        let output = self.invoke(&args::exec(&container.name, command)).await?;
        if output.exit_code != 0 && output.stderr.trim_start().starts_with(DAEMON_ERROR_PREFIX) {
            return Err(PlatformError::Call {
                operation: "exec",
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(ExecOutput {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn inspect_container(
        &self,
        container: &ContainerHandle,
    ) -> Result<ContainerInspection, PlatformError> {
        let json = self.run("container inspect", &args::container_inspect(&container.name)).await?;
        parse::inspection(&json)
    }

    async fn stop_container(
        &self,
        container: &ContainerHandle,
        timeout: Duration,
    ) -> Result<(), PlatformError> {
        self.run("container stop", &args::container_stop(&container.name, timeout)).await?;
        Ok(())
    }

    async fn remove_container(
        &self,
        container: &ContainerHandle,
        force: bool,
    ) -> Result<(), PlatformError> {
        self.run("container remove", &args::container_remove(&container.name, force)).await?;
        Ok(())
    }

    async fn remove_network(&self, network: &NetworkHandle) -> Result<(), PlatformError> {
        self.run("network remove", &args::network_remove(&network.name)).await?;
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> Result<(), PlatformError> {
        self.run("volume remove", &args::volume_remove(name)).await?;
        Ok(())
    }

    async fn list_labeled(
        &self,
        key: &str,
        value: &str,
    ) -> Result<LabeledResources, PlatformError> {
        let containers =
            self.run("container list", &args::list_labeled(ListTarget::Containers, key, value)).await?;
        let networks =
            self.run("network list", &args::list_labeled(ListTarget::Networks, key, value)).await?;
        let volumes =
            self.run("volume list", &args::list_labeled(ListTarget::Volumes, key, value)).await?;
        Ok(LabeledResources {
            containers: parse::container_rows(&containers),
            networks: parse::network_rows(&networks),
            volumes: parse::name_rows(&volumes),
        })
    }
}

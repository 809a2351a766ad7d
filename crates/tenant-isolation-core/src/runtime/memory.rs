// crates/tenant-isolation-core/src/runtime/memory.rs
// ============================================================================
// Module: In-Memory Container Platform
// Description: Deterministic platform simulator with fault injection.
// Purpose: Exercise provisioning, probes, and cleanup without a container engine.
// Dependencies: async-trait, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryPlatform`] keeps networks, containers, and volumes in a mutex
//! guarded map and interprets the in-container commands the validator issues
//! (`pg_isready`, `psql`, `redis-cli`, `nc`). Faults injected through
//! [`PlatformFault`] make individual behaviors misbehave so failure paths can
//! be tested deterministically.
//!
//! Every call is recorded in order; tests compare creation and removal
//! sequences through [`InMemoryPlatform::created_resources`] and
//! [`InMemoryPlatform::removed_resources`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::ContainerHandle;
use crate::core::NetworkHandle;
use crate::core::ROLE_LABEL;
use crate::core::ResourceKind;
use crate::core::ServiceRole;
use crate::interfaces::ContainerInspection;
use crate::interfaces::ContainerPlatform;
use crate::interfaces::ContainerSpec;
use crate::interfaces::ContainerState;
use crate::interfaces::ExecOutput;
use crate::interfaces::LabeledResources;
use crate::interfaces::NetworkSpec;
use crate::interfaces::PlatformError;

// ============================================================================
// SECTION: Faults and Calls
// ============================================================================

/// Injectable misbehavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformFault {
    /// Network creation fails.
    FailNetworkCreate,
    /// Container creation fails for a role.
    FailCreate(ServiceRole),
    /// Every container reports `Created` for its first N state queries.
    NotRunningPolls(u32),
    /// Readiness commands for a role never succeed.
    NeverReady(ServiceRole),
    /// Containers on different networks can reach each other.
    CrossTenantReachable,
    /// Inspection reports privileged mode for a role.
    Privileged(ServiceRole),
    /// Inspection reports an extra `bridge` network for a role.
    ExtraNetwork(ServiceRole),
    /// Inspection reports no memory ceiling for a role.
    MissingMemoryLimit(ServiceRole),
    /// Storage reads return a value that differs from what was written.
    CorruptReads,
    /// Container removal fails for a role.
    FailRemove(ServiceRole),
    /// Every inspect call fails.
    FailInspect,
    /// Container creation for a role completes, then the call never returns.
    StallAfterCreate(ServiceRole),
    /// Inspection reports a writable root filesystem for a role.
    WritableRoot(ServiceRole),
    /// Inspection reports no CPU set for a role.
    NoCpuset(ServiceRole),
    /// Inspection omits `no-new-privileges` for a role.
    DropNoNewPrivileges(ServiceRole),
}

/// Recorded platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    /// `create_network`.
    CreateNetwork(String),
    /// `create_container`.
    CreateContainer(String),
    /// `container_state`.
    State(String),
    /// `exec` with the program name.
    Exec {
        /// Target container.
        container: String,
        /// First argument of the command.
        program: String,
    },
    /// `inspect_container`.
    Inspect(String),
    /// `stop_container`.
    Stop(String),
    /// `remove_container`.
    RemoveContainer(String),
    /// `remove_network`.
    RemoveNetwork(String),
    /// `remove_volume`.
    RemoveVolume(String),
    /// `list_labeled`.
    ListLabeled,
}

// ============================================================================
// SECTION: Simulated State
// ============================================================================

/// Simulated network.
#[derive(Debug, Clone)]
struct SimNetwork {
    /// Platform identifier.
    id: String,
    /// Labels.
    labels: BTreeMap<String, String>,
}

/// Simulated container.
#[derive(Debug, Clone)]
struct SimContainer {
    /// Platform identifier.
    id: String,
    /// Creation request.
    spec: ContainerSpec,
    /// State queries answered so far.
    state_polls: u32,
    /// Stopped by the caller.
    stopped: bool,
    /// Database rows (`marker_key -> marker_value`).
    rows: BTreeMap<String, String>,
    /// Cache keys.
    keys: BTreeMap<String, String>,
}

impl SimContainer {
    /// Returns the role label of the container.
    fn role(&self) -> Option<ServiceRole> {
        self.spec.labels.get(ROLE_LABEL).map(String::as_str).and_then(ServiceRole::from_label)
    }

    /// Returns true when the container is running.
    fn running(&self) -> bool {
        !self.stopped
    }

    /// Returns the password passed to `--requirepass`.
    fn cache_password(&self) -> Option<&str> {
        let position = self.spec.command.iter().position(|arg| arg == "--requirepass")?;
        self.spec.command.get(position + 1).map(String::as_str)
    }
}

/// Simulated platform state.
#[derive(Debug, Default)]
struct SimState {
    /// Networks by name.
    networks: BTreeMap<String, SimNetwork>,
    /// Containers by name.
    containers: BTreeMap<String, SimContainer>,
    /// Volume labels by volume name.
    volumes: BTreeMap<String, BTreeMap<String, String>>,
    /// Recorded calls in order.
    calls: Vec<PlatformCall>,
    /// Active faults.
    faults: Vec<PlatformFault>,
    /// Identifier counter.
    next_id: u64,
}

impl SimState {
    /// Returns true when `fault` is active.
    fn has(&self, fault: &PlatformFault) -> bool {
        self.faults.contains(fault)
    }

    /// Returns true when a role-scoped fault is active for `container`.
    fn has_for(&self, container: &SimContainer, fault: fn(ServiceRole) -> PlatformFault) -> bool {
        container.role().is_some_and(|role| self.has(&fault(role)))
    }

    /// Allocates a platform identifier.
    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:012x}", self.next_id)
    }

    /// Looks up a container by name.
    fn container(&self, name: &str) -> Result<&SimContainer, PlatformError> {
        self.containers.get(name).ok_or_else(|| PlatformError::NotFound(name.to_string()))
    }

    /// Looks up a container by name for mutation.
    fn container_mut(&mut self, name: &str) -> Result<&mut SimContainer, PlatformError> {
        self.containers.get_mut(name).ok_or_else(|| PlatformError::NotFound(name.to_string()))
    }
}

// ============================================================================
// SECTION: Platform
// ============================================================================

/// In-memory container platform for tests.
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    /// Guarded simulator state.
    state: Mutex<SimState>,
}

impl InMemoryPlatform {
    /// Creates a healthy platform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a platform with the given faults active.
    #[must_use]
    pub fn with_faults(faults: impl IntoIterator<Item = PlatformFault>) -> Self {
        Self {
            state: Mutex::new(SimState {
                faults: faults.into_iter().collect(),
                ..SimState::default()
            }),
        }
    }

    /// Returns every recorded call in order.
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().map(|state| state.calls.clone()).unwrap_or_default()
    }

    /// Returns successfully created networks and containers in creation order.
    #[must_use]
    pub fn created_resources(&self) -> Vec<(ResourceKind, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::CreateNetwork(name) => Some((ResourceKind::Network, name)),
                PlatformCall::CreateContainer(name) => Some((ResourceKind::Container, name)),
                _ => None,
            })
            .collect()
    }

    /// Returns removal calls for networks and containers in call order.
    #[must_use]
    pub fn removed_resources(&self) -> Vec<(ResourceKind, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::RemoveNetwork(name) => Some((ResourceKind::Network, name)),
                PlatformCall::RemoveContainer(name) => Some((ResourceKind::Container, name)),
                _ => None,
            })
            .collect()
    }

    /// Returns live container names.
    #[must_use]
    pub fn container_names(&self) -> Vec<String> {
        self.state.lock().map(|state| state.containers.keys().cloned().collect()).unwrap_or_default()
    }

    /// Returns live network names.
    #[must_use]
    pub fn network_names(&self) -> Vec<String> {
        self.state.lock().map(|state| state.networks.keys().cloned().collect()).unwrap_or_default()
    }

    /// Returns live volume names.
    #[must_use]
    pub fn volume_names(&self) -> Vec<String> {
        self.state.lock().map(|state| state.volumes.keys().cloned().collect()).unwrap_or_default()
    }

    /// Returns the creation request of a live container.
    #[must_use]
    pub fn container_spec(&self, name: &str) -> Option<ContainerSpec> {
        self.state.lock().ok()?.containers.get(name).map(|container| container.spec.clone())
    }

    /// Creates a container synchronously; the flag asks the caller to stall.
    fn insert_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<(ContainerHandle, bool), PlatformError> {
        let mut state = self.state()?;
        let role = spec.labels.get(ROLE_LABEL).map(String::as_str).and_then(ServiceRole::from_label);
        if role.is_some_and(|role| state.has(&PlatformFault::FailCreate(role))) {
            return Err(call_error("container create", "injected failure"));
        }
        if state.containers.contains_key(&spec.name) {
            return Err(call_error("container create", format!("{} already in use", spec.name)));
        }
        if !state.networks.contains_key(&spec.network) {
            return Err(PlatformError::NotFound(spec.network.clone()));
        }
        if let Some(volume) = &spec.volume {
            state.volumes.entry(volume.name.clone()).or_insert_with(|| volume.labels.clone());
        }
        let id = state.allocate_id("ctr");
        state.containers.insert(spec.name.clone(), SimContainer {
            id: id.clone(),
            spec: spec.clone(),
            state_polls: 0,
            stopped: false,
            rows: BTreeMap::new(),
            keys: BTreeMap::new(),
        });
        state.calls.push(PlatformCall::CreateContainer(spec.name.clone()));
        let stall = role.is_some_and(|role| state.has(&PlatformFault::StallAfterCreate(role)));
        Ok((
            ContainerHandle {
                id,
                name: spec.name.clone(),
            },
            stall,
        ))
    }

    /// Locks the simulator state.
    fn state(&self) -> Result<MutexGuard<'_, SimState>, PlatformError> {
        self.state
            .lock()
            .map_err(|_| PlatformError::Unavailable("simulator state poisoned".to_string()))
    }
}

#[async_trait]
impl ContainerPlatform for InMemoryPlatform {
    async fn create_network(&self, spec: &NetworkSpec) -> Result<NetworkHandle, PlatformError> {
        let mut state = self.state()?;
        if state.has(&PlatformFault::FailNetworkCreate) {
            return Err(call_error("network create", "injected failure"));
        }
        if state.networks.contains_key(&spec.name) {
            return Err(call_error("network create", format!("{} already exists", spec.name)));
        }
        let id = state.allocate_id("net");
        state.networks.insert(spec.name.clone(), SimNetwork {
            id: id.clone(),
            labels: spec.labels.clone(),
        });
        state.calls.push(PlatformCall::CreateNetwork(spec.name.clone()));
        Ok(NetworkHandle {
            id,
            name: spec.name.clone(),
        })
    }

    async fn create_container(
        &self,
        spec: &ContainerSpec,
    ) -> Result<ContainerHandle, PlatformError> {
        let (handle, stall) = self.insert_container(spec)?;
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(handle)
    }

    async fn container_state(
        &self,
        container: &ContainerHandle,
    ) -> Result<ContainerState, PlatformError> {
        let mut state = self.state()?;
        state.calls.push(PlatformCall::State(container.name.clone()));
        let not_running_polls = state
            .faults
            .iter()
            .find_map(|fault| match fault {
                PlatformFault::NotRunningPolls(polls) => Some(*polls),
                _ => None,
            })
            .unwrap_or(0);
        let sim = state.container_mut(&container.name)?;
        sim.state_polls += 1;
        Ok(if sim.stopped {
            ContainerState::Exited
        } else if sim.state_polls <= not_running_polls {
            ContainerState::Created
        } else {
            ContainerState::Running
        })
    }

    async fn exec(
        &self,
        container: &ContainerHandle,
        command: &[String],
    ) -> Result<ExecOutput, PlatformError> {
        let mut state = self.state()?;
        let program = command.first().cloned().unwrap_or_default();
        state.calls.push(PlatformCall::Exec {
            container: container.name.clone(),
            program: program.clone(),
        });
        if !state.container(&container.name)?.running() {
            return Err(call_error("exec", format!("{} is not running", container.name)));
        }
        let args = command.get(1..).unwrap_or_default();
        Ok(match program.as_str() {
            "pg_isready" => exec_pg_isready(&state, &container.name)?,
            "psql" => exec_psql(&mut state, &container.name, args)?,
            "redis-cli" => exec_redis_cli(&mut state, &container.name, args)?,
            "nc" => exec_nc(&state, &container.name, args)?,
            _ => exec_output(127, "", format!("{program}: not found")),
        })
    }

    async fn inspect_container(
        &self,
        container: &ContainerHandle,
    ) -> Result<ContainerInspection, PlatformError> {
        let mut state = self.state()?;
        state.calls.push(PlatformCall::Inspect(container.name.clone()));
        if state.has(&PlatformFault::FailInspect) {
            return Err(call_error("inspect", "injected failure"));
        }
        let sim = state.container(&container.name)?;
        let spec = &sim.spec;
        let mut networks = vec![spec.network.clone()];
        if state.has_for(sim, PlatformFault::ExtraNetwork) {
            networks.push("bridge".to_string());
        }
        let memory_bytes =
            if state.has_for(sim, PlatformFault::MissingMemoryLimit) { 0 } else { spec.memory_bytes };
        let security_opts = if spec.security.no_new_privileges
            && !state.has_for(sim, PlatformFault::DropNoNewPrivileges)
        {
            vec!["no-new-privileges:true".to_string()]
        } else {
            Vec::new()
        };
        Ok(ContainerInspection {
            name: spec.name.clone(),
            memory_bytes,
            cpuset: if state.has_for(sim, PlatformFault::NoCpuset) {
                None
            } else {
                spec.cpuset.clone()
            },
            networks,
            privileged: spec.security.privileged || state.has_for(sim, PlatformFault::Privileged),
            read_only_root: spec.security.read_only_root
                && !state.has_for(sim, PlatformFault::WritableRoot),
            security_opts,
            user: None,
        })
    }

    async fn stop_container(
        &self,
        container: &ContainerHandle,
        _timeout: Duration,
    ) -> Result<(), PlatformError> {
        let mut state = self.state()?;
        state.calls.push(PlatformCall::Stop(container.name.clone()));
        state.container_mut(&container.name)?.stopped = true;
        Ok(())
    }

    async fn remove_container(
        &self,
        container: &ContainerHandle,
        force: bool,
    ) -> Result<(), PlatformError> {
        let mut state = self.state()?;
        state.calls.push(PlatformCall::RemoveContainer(container.name.clone()));
        let sim = state.container(&container.name)?;
        if state.has_for(sim, PlatformFault::FailRemove) {
            return Err(call_error("container remove", "injected failure"));
        }
        if sim.running() && !force {
            return Err(call_error("container remove", format!("{} is running", container.name)));
        }
        state.containers.remove(&container.name);
        Ok(())
    }

    async fn remove_network(&self, network: &NetworkHandle) -> Result<(), PlatformError> {
        let mut state = self.state()?;
        state.calls.push(PlatformCall::RemoveNetwork(network.name.clone()));
        if !state.networks.contains_key(&network.name) {
            return Err(PlatformError::NotFound(network.name.clone()));
        }
        if state.containers.values().any(|sim| sim.spec.network == network.name) {
            return Err(call_error(
                "network remove",
                format!("{} has active endpoints", network.name),
            ));
        }
        state.networks.remove(&network.name);
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> Result<(), PlatformError> {
        let mut state = self.state()?;
        state.calls.push(PlatformCall::RemoveVolume(name.to_string()));
        if !state.volumes.contains_key(name) {
            return Err(PlatformError::NotFound(name.to_string()));
        }
        let in_use = state
            .containers
            .values()
            .any(|sim| sim.spec.volume.as_ref().is_some_and(|volume| volume.name == name));
        if in_use {
            return Err(call_error("volume remove", format!("{name} is in use")));
        }
        state.volumes.remove(name);
        Ok(())
    }

    async fn list_labeled(
        &self,
        key: &str,
        value: &str,
    ) -> Result<LabeledResources, PlatformError> {
        let mut state = self.state()?;
        state.calls.push(PlatformCall::ListLabeled);
        let matches =
            |labels: &BTreeMap<String, String>| labels.get(key).is_some_and(|found| found == value);
        Ok(LabeledResources {
            containers: state
                .containers
                .iter()
                .filter(|(_, sim)| matches(&sim.spec.labels))
                .map(|(name, sim)| ContainerHandle {
                    id: sim.id.clone(),
                    name: name.clone(),
                })
                .collect(),
            networks: state
                .networks
                .iter()
                .filter(|(_, sim)| matches(&sim.labels))
                .map(|(name, sim)| NetworkHandle {
                    id: sim.id.clone(),
                    name: name.clone(),
                })
                .collect(),
            volumes: state
                .volumes
                .iter()
                .filter(|(_, labels)| matches(labels))
                .map(|(name, _)| name.clone())
                .collect(),
        })
    }
}

// ============================================================================
// SECTION: Command Interpretation
// ============================================================================

/// `pg_isready`: ready unless the database role is faulted.
fn exec_pg_isready(state: &SimState, name: &str) -> Result<ExecOutput, PlatformError> {
    let sim = state.container(name)?;
    if state.has_for(sim, PlatformFault::NeverReady) {
        return Ok(exec_output(2, "", "no response"));
    }
    Ok(exec_output(0, "accepting connections", ""))
}

/// `psql -U <user> -d <db> -v ON_ERROR_STOP=1 -tAc <sql>` against marker rows.
fn exec_psql(state: &mut SimState, name: &str, args: &[String]) -> Result<ExecOutput, PlatformError> {
    let corrupt = state.has(&PlatformFault::CorruptReads);
    let sim = state.container_mut(name)?;
    let user = flag_value(args, "-U");
    let database = flag_value(args, "-d");
    if user != sim.spec.env.get("POSTGRES_USER").map(String::as_str)
        || database != sim.spec.env.get("POSTGRES_DB").map(String::as_str)
    {
        return Ok(exec_output(2, "", "FATAL: password authentication failed"));
    }
    let Some(sql) = flag_value(args, "-tAc") else {
        return Ok(exec_output(1, "", "no command"));
    };
    if let Some(values) = between(sql, "VALUES ('", "')") {
        let Some((key, value)) = values.split_once("', '") else {
            return Ok(exec_output(1, "", "ERROR: syntax error"));
        };
        sim.rows.insert(key.to_string(), value.to_string());
        return Ok(exec_output(0, "INSERT 0 1", ""));
    }
    if let Some(key) = between(sql, "marker_key = '", "'") {
        let value = sim.rows.get(key).cloned().unwrap_or_default();
        let value = if corrupt { format!("{value}-corrupted") } else { value };
        return Ok(exec_output(0, value, ""));
    }
    Ok(exec_output(1, "", "ERROR: unsupported statement"))
}

/// `redis-cli -a <pw> --no-auth-warning <command...>` against cache keys.
fn exec_redis_cli(
    state: &mut SimState,
    name: &str,
    args: &[String],
) -> Result<ExecOutput, PlatformError> {
    let corrupt = state.has(&PlatformFault::CorruptReads);
    let never_ready = state.has_for(state.container(name)?, PlatformFault::NeverReady);
    let sim = state.container_mut(name)?;
    if never_ready {
        return Ok(exec_output(1, "", "Could not connect to Redis"));
    }
    if flag_value(args, "-a") != sim.cache_password() {
        return Ok(exec_output(0, "NOAUTH Authentication required.", ""));
    }
    let command: Vec<&str> =
        args.iter().skip_while(|arg| *arg != "--no-auth-warning").skip(1).map(String::as_str).collect();
    Ok(match command.as_slice() {
        ["PING"] => exec_output(0, "PONG", ""),
        ["SET", key, value] => {
            sim.keys.insert((*key).to_string(), (*value).to_string());
            exec_output(0, "OK", "")
        }
        ["GET", key] => {
            let value = sim.keys.get(*key).cloned().unwrap_or_default();
            exec_output(0, if corrupt { format!("{value}-corrupted") } else { value }, "")
        }
        _ => exec_output(1, "", "ERR unknown command"),
    })
}

/// `nc -z -w <secs> <host> <port>`: connects when both share a network.
fn exec_nc(state: &SimState, name: &str, args: &[String]) -> Result<ExecOutput, PlatformError> {
    let source = state.container(name)?;
    let Some(host) = args.iter().rev().nth(1) else {
        return Ok(exec_output(1, "", "usage: nc"));
    };
    let reachable = state.containers.get(host).is_some_and(|target| {
        target.running()
            && (target.spec.network == source.spec.network
                || state.has(&PlatformFault::CrossTenantReachable))
    });
    Ok(if reachable { exec_output(0, "", "") } else { exec_output(1, "", format!("nc: {host}: timed out")) })
}

/// Returns the argument following `flag`.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let position = args.iter().position(|arg| arg == flag)?;
    args.get(position + 1).map(String::as_str)
}

/// Returns the text between the first `start` and the following `end`.
fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let (_, rest) = text.split_once(start)?;
    let (inner, _) = rest.split_once(end)?;
    Some(inner)
}

/// Builds an exec result.
fn exec_output(exit_code: i64, stdout: impl Into<String>, stderr: impl Into<String>) -> ExecOutput {
    ExecOutput {
        exit_code,
        stdout: stdout.into(),
        stderr: stderr.into(),
    }
}

/// Builds a call failure.
fn call_error(operation: &'static str, message: impl Into<String>) -> PlatformError {
    PlatformError::Call {
        operation,
        message: message.into(),
    }
}

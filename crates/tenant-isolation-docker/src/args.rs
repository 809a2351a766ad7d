// crates/tenant-isolation-docker/src/args.rs
// ============================================================================
// Module: Docker Argument Builders
// Description: Pure builders for `docker` argument vectors.
// Purpose: Keep the mapping from platform specs to CLI flags testable.
// Dependencies: tenant-isolation-core
// ============================================================================

//! ## Overview
//! Each builder maps one platform operation onto the argument vector passed to
//! the `docker` binary (without the binary itself).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use tenant_isolation_core::ContainerSpec;
use tenant_isolation_core::NetworkSpec;
use tenant_isolation_core::VolumeMount;

// ============================================================================
// SECTION: Listing
// ============================================================================

/// Object families listed by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    /// `docker ps --all`.
    Containers,
    /// `docker network ls`.
    Networks,
    /// `docker volume ls`.
    Volumes,
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// `docker network create --driver bridge --label k=v <name>`.
#[must_use]
pub fn network_create(spec: &NetworkSpec) -> Vec<String> {
    let mut argv = strings(&["network", "create", "--driver", "bridge"]);
    push_labels(&mut argv, "--label", &spec.labels);
    argv.push(spec.name.clone());
    argv
}

/// `docker run --detach ...` for a fully specified container.
#[must_use]
pub fn container_run(spec: &ContainerSpec) -> Vec<String> {
    let mut argv = strings(&["run", "--detach"]);
    argv.extend(["--name".to_string(), spec.name.clone()]);
    argv.extend(["--hostname".to_string(), spec.name.clone()]);
    argv.extend(["--network".to_string(), spec.network.clone()]);
    argv.extend(["--memory".to_string(), spec.memory_bytes.to_string()]);
    if let Some(cpuset) = &spec.cpuset {
        argv.extend(["--cpuset-cpus".to_string(), cpuset.clone()]);
    }
    if spec.security.no_new_privileges {
        argv.extend(["--security-opt".to_string(), "no-new-privileges:true".to_string()]);
    }
    if spec.security.read_only_root {
        argv.push("--read-only".to_string());
    }
    for path in &spec.security.tmpfs {
        argv.extend(["--tmpfs".to_string(), path.clone()]);
    }
    if spec.security.privileged {
        argv.push("--privileged".to_string());
    }
    push_labels(&mut argv, "--label", &spec.labels);
    push_labels(&mut argv, "--env", &spec.env);
    if let Some(volume) = &spec.volume {
        argv.extend(["--mount".to_string(), volume_mount(volume)]);
    }
    argv.push(spec.image.clone());
    argv.extend(spec.command.iter().cloned());
    argv
}

/// `--mount` value for a labeled named volume.
#[must_use]
pub fn volume_mount(volume: &VolumeMount) -> String {
    let mut parts =
        vec!["type=volume".to_string(), format!("source={}", volume.name), format!(
            "target={}",
            volume.target
        )];
    parts.extend(volume.labels.iter().map(|(key, value)| format!("volume-label={key}={value}")));
    parts.join(",")
}

/// `docker container inspect --format {{.State.Status}} <name>`.
#[must_use]
pub fn container_state(name: &str) -> Vec<String> {
    strings(&["container", "inspect", "--format", "{{.State.Status}}", name])
}

/// `docker container inspect <name>`.
#[must_use]
pub fn container_inspect(name: &str) -> Vec<String> {
    strings(&["container", "inspect", name])
}

/// `docker exec <name> <command...>`.
#[must_use]
pub fn exec(name: &str, command: &[String]) -> Vec<String> {
    let mut argv = strings(&["exec", name]);
    argv.extend(command.iter().cloned());
    argv
}

/// `docker stop --time <secs> <name>`.
#[must_use]
pub fn container_stop(name: &str, timeout: Duration) -> Vec<String> {
    let seconds = timeout.as_secs().to_string();
    strings(&["stop", "--time", &seconds, name])
}

/// `docker rm [--force] <name>`.
#[must_use]
pub fn container_remove(name: &str, force: bool) -> Vec<String> {
    if force { strings(&["rm", "--force", name]) } else { strings(&["rm", name]) }
}

/// `docker network rm <name>`.
#[must_use]
pub fn network_remove(name: &str) -> Vec<String> {
    strings(&["network", "rm", name])
}

/// `docker volume rm <name>`.
#[must_use]
pub fn volume_remove(name: &str) -> Vec<String> {
    strings(&["volume", "rm", name])
}

/// Label-filtered listing with tab-separated `id\tname` (or `name`) rows.
#[must_use]
pub fn list_labeled(target: ListTarget, key: &str, value: &str) -> Vec<String> {
    let filter = format!("label={key}={value}");
    match target {
        ListTarget::Containers => {
            strings(&["ps", "--all", "--filter", &filter, "--format", "{{.ID}}\t{{.Names}}"])
        }
        ListTarget::Networks => strings(&[
            "network",
            "ls",
            "--filter",
            &filter,
            "--format",
            "{{.ID}}\t{{.Name}}",
        ]),
        ListTarget::Volumes => {
            strings(&["volume", "ls", "--filter", &filter, "--format", "{{.Name}}"])
        }
    }
}

/// `docker info --format {{.ServerVersion}}`.
#[must_use]
pub fn info() -> Vec<String> {
    strings(&["info", "--format", "{{.ServerVersion}}"])
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Appends `flag key=value` pairs.
fn push_labels(argv: &mut Vec<String>, flag: &str, pairs: &BTreeMap<String, String>) {
    for (key, value) in pairs {
        argv.push(flag.to_string());
        argv.push(format!("{key}={value}"));
    }
}

/// Converts borrowed arguments into an owned vector.
fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}

// crates/tenant-isolation-docker/src/lib.rs
// ============================================================================
// Module: Tenant Isolation Docker Adapter
// Description: Docker CLI implementation of the container platform interface.
// Purpose: Run validation against a local Docker engine.
// Dependencies: tenant-isolation-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! [`DockerCli`] implements `ContainerPlatform` by invoking the `docker`
//! binary. Argument vectors are built by pure functions in [`args`] and
//! engine output is interpreted by [`parse`], so both are unit tested without
//! a running engine.
//! Invariants:
//! - Container and network names are passed as discrete arguments, never
//!   through a shell.
//! - `docker exec` exit codes are returned as data; only daemon errors are
//!   platform errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod args;
pub mod docker;
pub mod parse;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use docker::DEFAULT_DOCKER_BINARY;
pub use docker::DockerCli;

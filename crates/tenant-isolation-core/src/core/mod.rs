// crates/tenant-isolation-core/src/core/mod.rs
// ============================================================================
// Module: Tenant Isolation Core Types
// Description: Identifiers, resource model, settings, and report types.
// Purpose: Group the data model shared by every runtime component.
// Dependencies: crate::core::*
// ============================================================================

//! ## Overview
//! Core types carry no platform behavior. Runtime components operate on these
//! types through the [`crate::interfaces::ContainerPlatform`] seam.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identifiers;
pub mod report;
pub mod resources;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::*;
pub use report::*;
pub use resources::*;
pub use settings::*;

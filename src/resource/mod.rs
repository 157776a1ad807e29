//! Resource definitions
//!
//! This module provides a data-driven description of the Terraform resources
//! assets are converted into. Schemas and asset resolution tables are loaded
//! from JSON files at compile time, so supporting a new resource type is
//! mostly a matter of editing JSON.
//!
//! # Architecture
//!
//! - [`shape`] - Field shapes and per-resource schemas
//! - [`registry`] - Loads and caches the embedded definitions per service domain
//!
//! # Resource Definitions
//!
//! Definitions live under `src/resources/`:
//! - `compute.json` - Compute Engine (instances, forwarding rules, backend services, health checks)
//! - `resourcemanager.json` - Projects

mod registry;
mod shape;

pub use registry::*;
pub use shape::{ResourceSchema, Schema, Shape};

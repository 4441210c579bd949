//! Engine data structures: meshes, textures, lights, instances and targets.
//!
//! This module contains the core data types for scene representation:
//!
//! - `geometry` contains procedural meshes and vertex layouts
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data
//! - `light` holds point lights and their curve animation
//! - `targets` holds the offscreen G-buffer and HDR attachments

pub mod geometry;
pub mod instance;
pub mod light;
pub mod targets;
pub mod texture;

//! kiln
//!
//! A small wgpu rendering playground built as a sequence of increasingly
//! involved techniques: plain triangle drawing, instanced forward shading,
//! stencil shadow volumes, GPU compute flocking, and finally deferred shading
//! with light volumes. The crate exposes the engine pieces (context, camera,
//! event loop, pipelines) plus one ready-made scene per technique; the
//! binaries under `demos/` wire a scene into the event loop.
//!
//! High-level modules
//! - `camera`: camera types, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/surface
//! - `data_structures`: engine data models (meshes, instances, lights, textures)
//! - `flow`: high level flow control (scenes / update loops)
//! - `pipelines`: render and compute pipeline definitions with their WGSL
//! - `scenes`: the technique showcases built from the pieces above
//! - `shadow`: CPU-side silhouette extraction for stencil shadow volumes
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod scenes;
pub mod shadow;

// Re-exports commonly used types for convenience in downstream code.
pub use winit::dpi::PhysicalPosition;
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu::*;

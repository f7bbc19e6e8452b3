//! render_wgpu: wgpu backend for the temporal AA stage
//!
//! Implements `taa_core::GpuBackend` on wgpu textures: pooled scratch targets,
//! texture copies, a format-converting blit, and the WGSL resolve program.
//! `gfx::device::headless` opens a device without a surface.

pub mod gfx;
pub use gfx::backend::{GpuTexture, ResolveMaterial, WgpuBackend};

//! gfx: wgpu side of the temporal stage
//!
//! Files
//! - backend.rs: `WgpuBackend` (allocation pool, copies, resolve pass recording)
//! - pool.rs: flush-aged, bounded pool of released render targets
//! - pipeline.rs: bind group layouts, blit/resolve pipelines, WGSL composition
//! - types.rs: POD uniforms shared with WGSL and `PixelFormat` mapping
//! - device.rs: headless adapter/device selection
//! - fullscreen.wgsl / blit.wgsl / resolve.wgsl: shader sources

pub mod backend;
pub mod device;
pub mod pipeline;
pub mod pool;
pub mod types;

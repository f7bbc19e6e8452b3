// Root app shell: frame harness plus re-exports for the workspace crates.
pub mod harness;
pub mod pattern;

pub use render_wgpu as gpu;
pub use taa_core as taa;

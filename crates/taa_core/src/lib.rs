//! taa_core: temporal anti-aliasing reprojection core
//!
//! Renderer-agnostic logic for a TAA stage:
//! - `halton`: per-frame sub-pixel jitter offsets (base 2/3, period 16)
//! - `projection`: camera intrinsics and the off-axis (jittered) perspective
//! - `camera`: the camera slots the stage mutates (projection, aux buffer bits)
//! - `gpu`: the backend seam (buffer allocation, blits, resolve material lookup)
//! - `history`: single history buffer with lazy reallocation
//! - `resolve`: per-frame blend of source + history with passthrough fallback
//! - `lifecycle`: activation state machine and the jitter/restore bracket
//! - `cpu`: software backend used by tests and the harness
//! - `config`: TOML tuning with env overrides

pub mod camera;
pub mod config;
pub mod cpu;
pub mod error;
pub mod gpu;
pub mod halton;
pub mod history;
pub mod lifecycle;
pub mod projection;
pub mod resolve;

pub use camera::{AuxBuffers, Camera};
pub use error::TaaError;
pub use gpu::{BlendPolicy, BufferDesc, GpuBackend, PixelFormat, ResolveBindings};
pub use halton::HaltonJitter;
pub use history::HistoryBuffer;
pub use lifecycle::{Activation, FramePhase, TemporalAa};
pub use projection::CameraIntrinsics;
pub use resolve::{PassthroughReason, ReprojectionStage, ResolveOutcome};

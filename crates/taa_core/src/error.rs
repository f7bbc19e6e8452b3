//! Errors surfaced by the temporal core and its backends.

use thiserror::Error;

use crate::gpu::BufferDesc;
use crate::lifecycle::Activation;

#[derive(Debug, Error)]
pub enum TaaError {
    #[error("resolve material unavailable: {0}")]
    UnsupportedPlatform(String),
    #[error("failed to allocate {desc:?}: {reason}")]
    Allocation { desc: BufferDesc, reason: String },
    #[error("buffer descriptors differ: {src:?} vs {dst:?}")]
    DescMismatch { src: BufferDesc, dst: BufferDesc },
    #[error("buffer handle is not owned by this backend")]
    UnknownBuffer,
    #[error("`{op}` is not valid in state {state:?}")]
    InvalidTransition {
        state: Activation,
        op: &'static str,
    },
}

//! Reprojection blend stage.
//!
//! Per frame: source + history go through the resolve material into a scratch
//! buffer, which then becomes both the new history and the output. Any failure
//! degrades to a plain copy of the source so a frame is always produced.

use glam::Vec2;

use crate::error::TaaError;
use crate::gpu::{
    BlendPolicy, GpuBackend, RESOLVE_MATERIAL, RESOLVE_PASS, ResolveBindings, with_temporary,
};
use crate::history::HistoryBuffer;
use crate::projection::jitter_uv;

pub const TEMPORARY_LABEL: &str = "taa.temporary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughReason {
    /// No resolve material on this backend.
    Unsupported,
    /// Stage is not active.
    Inactive,
    /// Resolve requested without a jittered draw in this frame.
    NotJittered,
    /// The resolve pass or one of its copies failed.
    ResolveFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved,
    Passthrough(PassthroughReason),
    /// Even the passthrough copy failed; destination content is undefined.
    Dropped,
}

enum MaterialSlot<M> {
    Unresolved,
    Ready(M),
    Unsupported,
}

pub struct ReprojectionStage<G: GpuBackend> {
    material: MaterialSlot<G::Material>,
    pub policy: BlendPolicy,
}

impl<G: GpuBackend> Default for ReprojectionStage<G> {
    fn default() -> Self {
        Self::new(BlendPolicy::default())
    }
}

impl<G: GpuBackend> ReprojectionStage<G> {
    pub fn new(policy: BlendPolicy) -> Self {
        Self {
            material: MaterialSlot::Unresolved,
            policy,
        }
    }

    /// Resolve material, looked up on first use. A failed lookup is cached too.
    fn material(&mut self, gpu: &mut G) -> Option<&G::Material> {
        if let MaterialSlot::Unresolved = self.material {
            self.material = match gpu.find_material(RESOLVE_MATERIAL) {
                Some(m) => MaterialSlot::Ready(m),
                None => {
                    log::warn!("taa: `{RESOLVE_MATERIAL}` unavailable, frames pass through");
                    MaterialSlot::Unsupported
                }
            };
        }
        match &self.material {
            MaterialSlot::Ready(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_supported(&mut self, gpu: &mut G) -> bool {
        self.material(gpu).is_some()
    }

    /// Blend `source` with `history` into `destination` and update `history`.
    ///
    /// `jitter_px` is the offset the source was rendered with.
    pub fn resolve(
        &mut self,
        gpu: &mut G,
        history: &mut HistoryBuffer<G>,
        source: &G::Buffer,
        motion: Option<&G::Buffer>,
        destination: &G::Buffer,
        jitter_px: Vec2,
    ) -> ResolveOutcome {
        let policy = self.policy;
        let Some(material) = self.material(gpu) else {
            return passthrough(gpu, source, destination, PassthroughReason::Unsupported);
        };
        match blend(
            gpu,
            material,
            policy,
            history,
            source,
            motion,
            destination,
            jitter_px,
        ) {
            Ok(()) => ResolveOutcome::Resolved,
            Err(e) => {
                log::warn!("taa resolve failed, passing frame through: {e}");
                // History may be half-written; reseed from the next source.
                history.release(gpu);
                passthrough(gpu, source, destination, PassthroughReason::ResolveFailed)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn blend<G: GpuBackend>(
    gpu: &mut G,
    material: &G::Material,
    policy: BlendPolicy,
    history: &mut HistoryBuffer<G>,
    source: &G::Buffer,
    motion: Option<&G::Buffer>,
    destination: &G::Buffer,
    jitter_px: Vec2,
) -> Result<(), TaaError> {
    let desc = gpu.describe(source)?;
    let jitter_uv = jitter_uv(jitter_px, desc.width, desc.height);
    let hist = history.ensure(gpu, source)?;
    with_temporary(gpu, desc, TEMPORARY_LABEL, |gpu, tmp| {
        let bindings = ResolveBindings {
            history: hist,
            motion,
            jitter_uv,
            policy,
        };
        gpu.blit_with(source, tmp, material, &bindings, RESOLVE_PASS)?;
        gpu.blit(tmp, hist)?;
        gpu.blit(tmp, destination)
    })
}

/// Copy the source straight to the destination.
pub fn passthrough<G: GpuBackend>(
    gpu: &mut G,
    source: &G::Buffer,
    destination: &G::Buffer,
    reason: PassthroughReason,
) -> ResolveOutcome {
    match gpu.blit(source, destination) {
        Ok(()) => ResolveOutcome::Passthrough(reason),
        Err(e) => {
            log::error!("taa passthrough copy failed: {e}");
            ResolveOutcome::Dropped
        }
    }
}

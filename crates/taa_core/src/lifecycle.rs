//! Lifecycle controller: activation, the per-frame jitter bracket, and drain.
//!
//! States: `Inactive` <-> `Active(phase)`, where a frame walks
//! `Idle -> Jittered -> Resolved -> Idle`. Deactivation is only applied at a
//! frame boundary; a request made mid-frame is deferred to `end_frame`.

use glam::{Mat4, Vec2};

use crate::camera::{AuxBuffers, Camera};
use crate::config::TaaCfg;
use crate::error::TaaError;
use crate::gpu::{BlendPolicy, GpuBackend};
use crate::halton::HaltonJitter;
use crate::history::HistoryBuffer;
use crate::projection::jittered_projection;
use crate::resolve::{PassthroughReason, ReprojectionStage, ResolveOutcome, passthrough};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Jittered,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Inactive,
    Active(FramePhase),
}

pub struct TemporalAa<G: GpuBackend> {
    state: Activation,
    jitter: HaltonJitter,
    current_offset: Vec2,
    saved_projection: Option<Mat4>,
    history: HistoryBuffer<G>,
    stage: ReprojectionStage<G>,
    pending_deactivate: bool,
}

impl<G: GpuBackend> Default for TemporalAa<G> {
    fn default() -> Self {
        Self::new(BlendPolicy::default())
    }
}

impl<G: GpuBackend> TemporalAa<G> {
    pub fn new(policy: BlendPolicy) -> Self {
        Self::with_jitter(policy, HaltonJitter::new())
    }

    pub fn with_jitter(policy: BlendPolicy, jitter: HaltonJitter) -> Self {
        Self {
            state: Activation::Inactive,
            jitter,
            current_offset: Vec2::ZERO,
            saved_projection: None,
            history: HistoryBuffer::new(),
            stage: ReprojectionStage::new(policy),
            pending_deactivate: false,
        }
    }

    pub fn from_cfg(cfg: &TaaCfg) -> Self {
        Self::with_jitter(cfg.blend_policy(), HaltonJitter::with_period(cfg.sample_period()))
    }

    pub fn state(&self) -> Activation {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, Activation::Active(_))
    }

    pub fn phase(&self) -> Option<FramePhase> {
        match self.state {
            Activation::Active(p) => Some(p),
            Activation::Inactive => None,
        }
    }

    /// Offset applied to the current (or last) frame, in pixels.
    pub fn jitter_offset(&self) -> Vec2 {
        self.current_offset
    }

    pub fn sample_index(&self) -> u32 {
        self.jitter.sample_index()
    }

    pub fn history(&self) -> &HistoryBuffer<G> {
        &self.history
    }

    pub fn policy(&self) -> BlendPolicy {
        self.stage.policy
    }

    pub fn set_policy(&mut self, policy: BlendPolicy) {
        self.stage.policy = policy;
    }

    /// Enable depth and motion-vector generation on the camera.
    pub fn on_activate(&mut self, camera: &mut Camera) {
        camera.aux_buffers |= AuxBuffers::DEPTH | AuxBuffers::MOTION_VECTORS;
        self.pending_deactivate = false;
        if self.state == Activation::Inactive {
            log::info!("taa: active");
            self.state = Activation::Active(FramePhase::Idle);
        }
    }

    /// Release history and stop motion vectors; deferred to `end_frame`
    /// when a frame is in flight.
    pub fn on_deactivate(&mut self, camera: &mut Camera, gpu: &mut G) {
        match self.state {
            Activation::Inactive => {}
            Activation::Active(FramePhase::Idle) => self.drain(camera, gpu),
            Activation::Active(phase) => {
                log::debug!("taa: deactivate requested in {phase:?}, deferring to frame end");
                self.pending_deactivate = true;
            }
        }
    }

    fn drain(&mut self, camera: &mut Camera, gpu: &mut G) {
        self.history.release(gpu);
        // Depth may be consumed by other stages; only our bit is cleared.
        camera.aux_buffers.remove(AuxBuffers::MOTION_VECTORS);
        self.pending_deactivate = false;
        self.state = Activation::Inactive;
        log::info!("taa: inactive");
    }

    /// Advance the jitter and install the jittered projection on `camera`,
    /// re-enabling depth and motion-vector generation.
    ///
    /// Returns `Ok(None)` while inactive (camera untouched).
    pub fn begin_frame(&mut self, camera: &mut Camera) -> Result<Option<Vec2>, TaaError> {
        match self.state {
            Activation::Inactive => Ok(None),
            Activation::Active(FramePhase::Idle) => {
                // Another stage may have cleared these since the last frame.
                camera.aux_buffers |= AuxBuffers::DEPTH | AuxBuffers::MOTION_VECTORS;
                let offset = self.jitter.next_offset();
                let original = camera.projection();
                camera.set_non_jittered_projection(original);
                camera.set_projection(jittered_projection(camera.intrinsics(), offset));
                self.saved_projection = Some(original);
                self.current_offset = offset;
                self.state = Activation::Active(FramePhase::Jittered);
                Ok(Some(offset))
            }
            state => Err(TaaError::InvalidTransition {
                state,
                op: "begin_frame",
            }),
        }
    }

    /// Resolve the jittered draw in `source` into `destination`.
    pub fn resolve(
        &mut self,
        gpu: &mut G,
        source: &G::Buffer,
        motion: Option<&G::Buffer>,
        destination: &G::Buffer,
    ) -> ResolveOutcome {
        match self.state {
            Activation::Active(FramePhase::Jittered) => {
                let outcome = self.stage.resolve(
                    gpu,
                    &mut self.history,
                    source,
                    motion,
                    destination,
                    self.current_offset,
                );
                self.state = Activation::Active(FramePhase::Resolved);
                outcome
            }
            Activation::Inactive => {
                passthrough(gpu, source, destination, PassthroughReason::Inactive)
            }
            Activation::Active(_) => {
                log::warn!("taa: resolve without a jittered draw this frame");
                passthrough(gpu, source, destination, PassthroughReason::NotJittered)
            }
        }
    }

    /// Restore the un-jittered projection and close the frame.
    pub fn end_frame(&mut self, camera: &mut Camera, gpu: &mut G) {
        if let Some(original) = self.saved_projection.take() {
            camera.set_projection(original);
        }
        if let Activation::Active(_) = self.state {
            self.state = Activation::Active(FramePhase::Idle);
        }
        if self.pending_deactivate {
            self.drain(camera, gpu);
        }
    }

    /// One bracketed frame: jitter, draw, resolve, restore.
    ///
    /// The projection is restored even when `draw` fails; resolve only runs
    /// after a successful draw.
    pub fn frame<E>(
        &mut self,
        camera: &mut Camera,
        gpu: &mut G,
        source: &G::Buffer,
        motion: Option<&G::Buffer>,
        destination: &G::Buffer,
        draw: impl FnOnce(&Camera, &mut G) -> Result<(), E>,
    ) -> Result<ResolveOutcome, E>
    where
        E: From<TaaError>,
    {
        if let Err(e) = self.begin_frame(camera) {
            return Err(e.into());
        }
        let drawn = draw(camera, gpu);
        let out = match drawn {
            Ok(()) => Ok(self.resolve(gpu, source, motion, destination)),
            Err(e) => Err(e),
        };
        self.end_frame(camera, gpu);
        out
    }

    /// Forget accumulated history (camera cut); the next resolve reseeds it.
    pub fn reset_history(&mut self, gpu: &mut G) {
        self.history.release(gpu);
    }
}

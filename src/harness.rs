//! Frame driver shared by the binary and the integration tests.
//!
//! Each frame draws the analytic pattern through the camera's current
//! projection, resolves it, and scores the result against a supersampled
//! reference rendered with the un-jittered projection.

use anyhow::{Context, Result};
use glam::Vec4;
use log::{debug, info};

use taa_core::config::TaaCfg;
use taa_core::cpu::CpuBackend;
use taa_core::history::HISTORY_LABEL;
use taa_core::resolve::TEMPORARY_LABEL;
use taa_core::{
    BufferDesc, Camera, CameraIntrinsics, GpuBackend, PassthroughReason, PixelFormat,
    ResolveOutcome, TemporalAa,
};

use crate::pattern::{Pattern, mean_abs_error};

const SOURCE_LABEL: &str = "frame.source";
const OUTPUT_LABEL: &str = "frame.output";
const STAGING_LABEL: &str = "frame.staging";
const REFERENCE_GRID: u32 = 8;

#[derive(Debug, Clone, Copy)]
pub struct HarnessOpts {
    pub frames: u32,
    pub width: u32,
    pub height: u32,
    /// Flip activation every N frames; 0 keeps the starting state.
    pub toggle_every: u32,
}

impl Default for HarnessOpts {
    fn default() -> Self {
        Self {
            frames: 32,
            width: 160,
            height: 90,
            toggle_every: 0,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RunReport {
    pub resolved: u32,
    pub passthrough: u32,
    pub dropped: u32,
    /// Edge error per frame against the supersampled reference.
    pub errors: Vec<f32>,
    /// Buffers still live after the final deactivate.
    pub leaked: usize,
}

impl RunReport {
    fn record(&mut self, outcome: ResolveOutcome) {
        match outcome {
            ResolveOutcome::Resolved => self.resolved += 1,
            ResolveOutcome::Passthrough(_) => self.passthrough += 1,
            ResolveOutcome::Dropped => self.dropped += 1,
        }
    }

    pub fn first_error(&self) -> Option<f32> {
        self.errors.first().copied()
    }

    pub fn final_error(&self) -> Option<f32> {
        self.errors.last().copied()
    }
}

fn intrinsics(opts: &HarnessOpts) -> CameraIntrinsics {
    CameraIntrinsics::for_target(60.0, 0.3, 1000.0, opts.width, opts.height)
}

fn toggle<G: GpuBackend>(taa: &mut TemporalAa<G>, camera: &mut Camera, gpu: &mut G) {
    if taa.is_active() {
        taa.on_deactivate(camera, gpu);
    } else {
        taa.on_activate(camera);
    }
}

fn due_toggle(opts: &HarnessOpts, frame: u32) -> bool {
    opts.toggle_every > 0 && frame > 0 && frame % opts.toggle_every == 0
}

/// Run on the reference backend and score every frame.
pub fn run_cpu(opts: &HarnessOpts, cfg: &TaaCfg) -> Result<RunReport> {
    let mut gpu = CpuBackend::new();
    let desc = BufferDesc::new(opts.width, opts.height, PixelFormat::Rgba16Float);
    let source = gpu.allocate(desc, SOURCE_LABEL)?;
    let output = gpu.allocate(desc, OUTPUT_LABEL)?;

    let mut camera = Camera::new(intrinsics(opts));
    let mut taa = TemporalAa::from_cfg(cfg);
    if cfg.start_active() {
        taa.on_activate(&mut camera);
    }
    let pattern = Pattern::default();
    let reference = pattern.reference(camera.projection(), opts.width, opts.height, REFERENCE_GRID);

    let mut report = RunReport::default();
    for frame in 0..opts.frames {
        if due_toggle(opts, frame) {
            toggle(&mut taa, &mut camera, &mut gpu);
        }
        let outcome = taa.frame(&mut camera, &mut gpu, &source, None, &output, |cam, g| {
            let texels = pattern.render(cam.projection(), opts.width, opts.height);
            g.upload(&source, &texels).map_err(anyhow::Error::from)
        })?;
        report.record(outcome);
        let err = gpu
            .read(&output)
            .map(|texels| mean_abs_error(texels, &reference))
            .context("output buffer missing")?;
        report.errors.push(err);
        debug!(
            "frame {frame}: {outcome:?} jitter={:?} err={err:.5}",
            taa.jitter_offset()
        );
    }

    taa.on_deactivate(&mut camera, &mut gpu);
    gpu.release(source);
    gpu.release(output);
    report.leaked = gpu.live_total();
    if let (Some(first), Some(last)) = (report.first_error(), report.final_error()) {
        info!(
            "cpu: {} frames, resolved={} passthrough={} dropped={}, edge error {first:.5} -> {last:.5}",
            opts.frames, report.resolved, report.passthrough, report.dropped
        );
    }
    Ok(report)
}

/// Run against a headless wgpu device and score the read-back output.
///
/// The pattern is uploaded as `Rgba32Float` into a staging texture and blitted
/// into an `Rgba16Float` source, which every downlevel adapter can render to;
/// the output is `Rgba8Unorm` so it can be read back.
pub fn run_gpu(opts: &HarnessOpts, cfg: &TaaCfg) -> Result<RunReport> {
    let mut gpu = pollster::block_on(render_wgpu::gfx::device::headless_backend())?;
    let source_format = [PixelFormat::Rgba16Float, PixelFormat::Rgba8Unorm]
        .into_iter()
        .find(|&f| gpu.is_renderable(f))
        .context("no renderable source format on this adapter")?;
    let staging = match source_format {
        PixelFormat::Rgba8Unorm => None,
        _ => Some(gpu.allocate(
            BufferDesc::new(opts.width, opts.height, PixelFormat::Rgba32Float),
            STAGING_LABEL,
        )?),
    };
    let source = gpu.allocate(
        BufferDesc::new(opts.width, opts.height, source_format),
        SOURCE_LABEL,
    )?;
    let output = gpu.allocate(
        BufferDesc::new(opts.width, opts.height, PixelFormat::Rgba8Unorm),
        OUTPUT_LABEL,
    )?;

    let mut camera = Camera::new(intrinsics(opts));
    let mut taa = TemporalAa::from_cfg(cfg);
    if cfg.start_active() {
        taa.on_activate(&mut camera);
    }
    let pattern = Pattern::default();
    let reference = pattern.reference(camera.projection(), opts.width, opts.height, REFERENCE_GRID);

    let mut report = RunReport::default();
    for frame in 0..opts.frames {
        if due_toggle(opts, frame) {
            toggle(&mut taa, &mut camera, &mut gpu);
        }
        let outcome = taa.frame(&mut camera, &mut gpu, &source, None, &output, |cam, g| {
            let texels: Vec<Vec4> = pattern.render(cam.projection(), opts.width, opts.height);
            match &staging {
                Some(staging) => {
                    g.upload(staging, &texels)?;
                    g.blit(staging, &source)?;
                }
                None => g.upload(&source, &texels)?,
            }
            Ok::<_, anyhow::Error>(())
        })?;
        if let ResolveOutcome::Passthrough(PassthroughReason::Unsupported) = outcome {
            log::warn!("gpu: resolve unsupported on this device, frames pass through");
        }
        report.record(outcome);
        let err = mean_abs_error(&gpu.read_back(&output)?, &reference);
        report.errors.push(err);
        debug!("frame {frame}: {outcome:?} err={err:.5} pooled={}", gpu.pooled());
    }

    taa.on_deactivate(&mut camera, &mut gpu);
    if let Some(staging) = staging {
        gpu.release(staging);
    }
    gpu.release(source);
    gpu.release(output);
    gpu.trim();
    report.leaked = gpu.live_count(HISTORY_LABEL) + gpu.live_count(TEMPORARY_LABEL);
    if let (Some(first), Some(last)) = (report.first_error(), report.final_error()) {
        info!(
            "gpu: {} frames, resolved={} passthrough={} dropped={}, edge error {first:.5} -> {last:.5}",
            opts.frames, report.resolved, report.passthrough, report.dropped
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_schedule_skips_frame_zero() {
        let opts = HarnessOpts {
            toggle_every: 4,
            ..HarnessOpts::default()
        };
        assert!(!due_toggle(&opts, 0));
        assert!(due_toggle(&opts, 4));
        assert!(!due_toggle(&opts, 5));
        let off = HarnessOpts::default();
        assert!(!due_toggle(&off, 4));
    }
}

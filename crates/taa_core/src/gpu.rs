//! Backend seam: buffer allocation, full-buffer blits and the resolve material.
//!
//! The temporal stage is written against [`GpuBackend`] so the same history and
//! lifecycle logic drives the wgpu renderer and the CPU backend used in tests.

use glam::Vec2;

use crate::error::TaaError;

/// Name the resolve material is looked up by.
pub const RESOLVE_MATERIAL: &str = "temporal_resolve";
/// Pass index of the resolve program within the material.
pub const RESOLVE_PASS: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8Unorm,
    Bgra8Unorm,
    Rgba16Float,
    Rgba32Float,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Rgba8Unorm | PixelFormat::Bgra8Unorm => 4,
            PixelFormat::Rgba16Float => 8,
            PixelFormat::Rgba32Float => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl BufferDesc {
    pub const fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// History blend tuning shared by the CPU resolve and the WGSL shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendPolicy {
    /// Weight of the clamped history in the output (0 = current only).
    pub history_weight: f32,
    /// Variance clip width in standard deviations.
    pub clamp_gamma: f32,
}

impl Default for BlendPolicy {
    fn default() -> Self {
        Self {
            history_weight: 0.9,
            clamp_gamma: 1.25,
        }
    }
}

/// Inputs bound to the resolve material for one pass.
pub struct ResolveBindings<'a, B> {
    pub history: &'a B,
    /// Per-pixel screen motion in UV units (current minus previous).
    pub motion: Option<&'a B>,
    pub jitter_uv: Vec2,
    pub policy: BlendPolicy,
}

pub trait GpuBackend {
    type Buffer;
    type Material;

    /// Allocate a color buffer; `label` attributes it for accounting and debugging.
    fn allocate(&mut self, desc: BufferDesc, label: &'static str) -> Result<Self::Buffer, TaaError>;

    /// Return a buffer obtained from `allocate`.
    fn release(&mut self, buffer: Self::Buffer);

    /// Descriptor of a live buffer; `UnknownBuffer` for handles this backend does not own.
    fn describe(&self, buffer: &Self::Buffer) -> Result<BufferDesc, TaaError>;

    /// Full-buffer copy of `src` into `dst`.
    fn blit(&mut self, src: &Self::Buffer, dst: &Self::Buffer) -> Result<(), TaaError>;

    /// Copy `src` into `dst` through `material`'s program `pass`.
    fn blit_with(
        &mut self,
        src: &Self::Buffer,
        dst: &Self::Buffer,
        material: &Self::Material,
        bindings: &ResolveBindings<'_, Self::Buffer>,
        pass: u32,
    ) -> Result<(), TaaError>;

    /// Look a material up by name; `None` when missing or unsupported here.
    fn find_material(&mut self, name: &str) -> Option<Self::Material>;

    /// Buffers currently allocated under `label` and not yet released.
    fn live_count(&self, label: &str) -> usize;
}

/// Check the buffers bound to one resolve pass against each other.
///
/// History must match the source exactly; motion vectors and the destination
/// only need the same extent.
pub fn check_resolve_inputs(
    source: BufferDesc,
    history: BufferDesc,
    motion: Option<BufferDesc>,
    destination: BufferDesc,
) -> Result<(), TaaError> {
    if history != source {
        return Err(TaaError::DescMismatch {
            src: source,
            dst: history,
        });
    }
    let extent = (source.width, source.height);
    for other in motion.into_iter().chain(Some(destination)) {
        if (other.width, other.height) != extent {
            return Err(TaaError::DescMismatch {
                src: source,
                dst: other,
            });
        }
    }
    Ok(())
}

/// Allocate a scratch buffer, run `f`, and release the buffer whatever `f` returns.
pub fn with_temporary<G, R>(
    gpu: &mut G,
    desc: BufferDesc,
    label: &'static str,
    f: impl FnOnce(&mut G, &G::Buffer) -> Result<R, TaaError>,
) -> Result<R, TaaError>
where
    G: GpuBackend + ?Sized,
{
    let tmp = gpu.allocate(desc, label)?;
    let out = f(gpu, &tmp);
    gpu.release(tmp);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(w: u32, h: u32, format: PixelFormat) -> BufferDesc {
        BufferDesc::new(w, h, format)
    }

    #[test]
    fn resolve_inputs_accept_matching_extents() {
        let src = desc(64, 32, PixelFormat::Rgba16Float);
        let motion = desc(64, 32, PixelFormat::Rgba32Float);
        let dst = desc(64, 32, PixelFormat::Rgba8Unorm);
        assert!(check_resolve_inputs(src, src, Some(motion), dst).is_ok());
        assert!(check_resolve_inputs(src, src, None, dst).is_ok());
    }

    #[test]
    fn resolve_inputs_reject_undersized_motion() {
        let src = desc(64, 32, PixelFormat::Rgba16Float);
        let motion = desc(32, 16, PixelFormat::Rgba16Float);
        let err = check_resolve_inputs(src, src, Some(motion), src).unwrap_err();
        assert!(matches!(err, TaaError::DescMismatch { dst, .. } if dst == motion));
    }

    #[test]
    fn resolve_inputs_reject_history_in_another_format() {
        let src = desc(8, 8, PixelFormat::Rgba16Float);
        let hist = desc(8, 8, PixelFormat::Rgba8Unorm);
        assert!(check_resolve_inputs(src, hist, None, src).is_err());
        let dst = desc(9, 8, PixelFormat::Rgba16Float);
        assert!(check_resolve_inputs(src, src, None, dst).is_err());
    }
}

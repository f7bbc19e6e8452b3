//! POD uniform structs shared with WGSL and format mapping.

use bytemuck::{Pod, Zeroable};
use taa_core::{BlendPolicy, PixelFormat};

/// Mirrors `ResolveUniforms` in resolve.wgsl (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable, PartialEq)]
pub struct ResolveUniforms {
    pub jitter_uv: [f32; 2],
    pub texel_size: [f32; 2],
    pub history_weight: f32,
    pub clamp_gamma: f32,
    pub has_motion: u32,
    pub _pad: u32,
}

impl ResolveUniforms {
    pub fn new(
        jitter_uv: glam::Vec2,
        width: u32,
        height: u32,
        policy: BlendPolicy,
        has_motion: bool,
    ) -> Self {
        Self {
            jitter_uv: jitter_uv.to_array(),
            texel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            history_weight: policy.history_weight,
            clamp_gamma: policy.clamp_gamma,
            has_motion: has_motion as u32,
            _pad: 0,
        }
    }
}

pub fn texture_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        PixelFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        PixelFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        PixelFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
    }
}

/// Inverse of [`texture_format`]; `None` for formats the stage cannot target.
pub fn pixel_format(format: wgpu::TextureFormat) -> Option<PixelFormat> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Some(PixelFormat::Rgba8Unorm),
        wgpu::TextureFormat::Bgra8Unorm => Some(PixelFormat::Bgra8Unorm),
        wgpu::TextureFormat::Rgba16Float => Some(PixelFormat::Rgba16Float),
        wgpu::TextureFormat::Rgba32Float => Some(PixelFormat::Rgba32Float),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<ResolveUniforms>(), 32);
        assert_eq!(std::mem::size_of::<ResolveUniforms>() % 16, 0);
    }

    #[test]
    fn formats_round_trip() {
        for f in [
            PixelFormat::Rgba8Unorm,
            PixelFormat::Bgra8Unorm,
            PixelFormat::Rgba16Float,
            PixelFormat::Rgba32Float,
        ] {
            assert_eq!(pixel_format(texture_format(f)), Some(f));
        }
        assert_eq!(pixel_format(wgpu::TextureFormat::Depth32Float), None);
    }
}

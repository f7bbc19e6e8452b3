//! Pipeline creation helpers and shader loading for the temporal stage.
//!
//! Two fullscreen programs share `fullscreen.wgsl`:
//! - blit: texel copy between equally sized targets of different formats
//! - resolve: history clip + blend (`resolve.wgsl`)
//!
//! WGSL is embedded with `include_str!` and composed at pipeline creation.

use wgpu::{
    BindGroupLayout, ColorTargetState, FragmentState, PipelineLayoutDescriptor, RenderPipeline,
    ShaderModule, ShaderSource, VertexState,
};

use crate::gfx::types::ResolveUniforms;

fn unfilterable_texture(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            // textureLoad only; lets Rgba32Float bind without FLOAT32_FILTERABLE.
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
        },
        count: None,
    }
}

pub fn resolve_source() -> String {
    [include_str!("fullscreen.wgsl"), include_str!("resolve.wgsl")].join("\n\n")
}

pub fn blit_source() -> String {
    [include_str!("fullscreen.wgsl"), include_str!("blit.wgsl")].join("\n\n")
}

pub fn create_resolve_shader(device: &wgpu::Device) -> ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("taa-resolve-shader"),
        source: ShaderSource::Wgsl(std::borrow::Cow::Owned(resolve_source())),
    })
}

pub fn create_blit_shader(device: &wgpu::Device) -> ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("taa-blit-shader"),
        source: ShaderSource::Wgsl(std::borrow::Cow::Owned(blit_source())),
    })
}

pub fn create_blit_bgl(device: &wgpu::Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("taa-blit-bgl"),
        entries: &[unfilterable_texture(0)],
    })
}

// 0 source, 1 history, 2 motion vectors, 3 uniforms
pub fn create_resolve_bgl(device: &wgpu::Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("taa-resolve-bgl"),
        entries: &[
            unfilterable_texture(0),
            unfilterable_texture(1),
            unfilterable_texture(2),
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ResolveUniforms>() as u64,
                    ),
                },
                count: None,
            },
        ],
    })
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &ShaderModule,
    fs_entry: &str,
    bgl: &BindGroupLayout,
    color_format: wgpu::TextureFormat,
) -> RenderPipeline {
    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bgl],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            targets: &[Some(ColorTargetState {
                format: color_format,
                // No blending: Rgba32Float targets are not blendable.
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub fn create_blit_pipeline(
    device: &wgpu::Device,
    shader: &ShaderModule,
    bgl: &BindGroupLayout,
    color_format: wgpu::TextureFormat,
) -> RenderPipeline {
    create_fullscreen_pipeline(device, "taa-blit-pipeline", shader, "fs_blit", bgl, color_format)
}

pub fn create_resolve_pipeline(
    device: &wgpu::Device,
    shader: &ShaderModule,
    bgl: &BindGroupLayout,
    color_format: wgpu::TextureFormat,
) -> RenderPipeline {
    create_fullscreen_pipeline(
        device,
        "taa-resolve-pipeline",
        shader,
        "fs_resolve",
        bgl,
        color_format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composed_sources_carry_entry_points() {
        let r = resolve_source();
        assert!(r.contains("fn vs_fullscreen"));
        assert!(r.contains("fn fs_resolve"));
        let b = blit_source();
        assert!(b.contains("fn vs_fullscreen"));
        assert!(b.contains("fn fs_blit"));
    }
}

//! wgpu implementation of the temporal stage's backend seam.
//!
//! All copies and resolves are recorded into one command encoder that
//! `flush()` submits. Released textures go back to a [`TexturePool`] that ages
//! out entries per flush; textures leaving the pool are destroyed only after a
//! submit so nothing still referenced by recorded commands goes away.
//!
//! Device-side failures (unsupported format usages, rejected pipelines) are
//! caught with error scopes and returned as `TaaError`, so the stage can fall
//! back to passthrough instead of presenting an invalid target.

use std::collections::{HashMap, HashSet};

use anyhow::Context;
use glam::Vec4;
use taa_core::gpu::{RESOLVE_MATERIAL, check_resolve_inputs};
use taa_core::{BufferDesc, GpuBackend, PixelFormat, ResolveBindings, TaaError};
use wgpu::util::DeviceExt;

use crate::gfx::pipeline;
use crate::gfx::pool::TexturePool;
use crate::gfx::types::{ResolveUniforms, pixel_format, texture_format};

/// A color texture plus its default view.
#[derive(Debug)]
pub struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    desc: BufferDesc,
    id: u64,
    label: &'static str,
    /// Allocated through the backend (pooled on release) vs. wrapped from the renderer.
    owned: bool,
}

impl GpuTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn desc(&self) -> BufferDesc {
        self.desc
    }

    fn has(&self, usage: wgpu::TextureUsages) -> bool {
        self.texture.usage().contains(usage)
    }
}

/// Compiled resolve program; pipelines per target format live in the backend.
#[derive(Debug, Clone)]
pub struct ResolveMaterial {
    name: String,
    shader: wgpu::ShaderModule,
}

impl ResolveMaterial {
    pub fn name(&self) -> &str {
        &self.name
    }
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    encoder: Option<wgpu::CommandEncoder>,
    pool: TexturePool<GpuTexture>,
    /// Left the pool since the last submit; destroyed after the next one.
    retired: Vec<GpuTexture>,
    live: HashMap<&'static str, usize>,
    next_id: u64,
    /// Usages each format supports on this adapter.
    format_usages: HashMap<wgpu::TextureFormat, wgpu::TextureUsages>,
    blit_shader: wgpu::ShaderModule,
    blit_bgl: wgpu::BindGroupLayout,
    resolve_bgl: wgpu::BindGroupLayout,
    blit_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    resolve_pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    /// Target formats whose pipelines the device rejected.
    rejected_targets: HashSet<wgpu::TextureFormat>,
    no_motion: wgpu::TextureView,
}

const USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING)
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

/// What every stage texture needs even when the format cannot be rendered to.
const REQUIRED_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::TEXTURE_BINDING
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

const FORMATS: [PixelFormat; 4] = [
    PixelFormat::Rgba8Unorm,
    PixelFormat::Bgra8Unorm,
    PixelFormat::Rgba16Float,
    PixelFormat::Rgba32Float,
];

/// Common resolve targets; `find_material` validates the first renderable one.
const MATERIAL_TARGETS: [PixelFormat; 2] = [PixelFormat::Rgba16Float, PixelFormat::Rgba8Unorm];

fn unsupported(what: impl std::fmt::Display) -> TaaError {
    TaaError::UnsupportedPlatform(what.to_string())
}

impl WgpuBackend {
    pub fn new(adapter: &wgpu::Adapter, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let format_usages = FORMATS
            .iter()
            .map(|&f| {
                let tf = texture_format(f);
                (tf, adapter.get_texture_format_features(tf).allowed_usages)
            })
            .collect();
        Self::with_format_usages(device, queue, format_usages)
    }

    /// Build with explicit per-format usages (e.g. when the adapter is not at hand).
    pub fn with_format_usages(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format_usages: HashMap<wgpu::TextureFormat, wgpu::TextureUsages>,
    ) -> Self {
        let blit_shader = pipeline::create_blit_shader(&device);
        let blit_bgl = pipeline::create_blit_bgl(&device);
        let resolve_bgl = pipeline::create_resolve_bgl(&device);
        // Bound when the renderer supplies no motion vectors; never read then.
        let no_motion = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("taa-no-motion"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba16Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());
        for (format, usages) in &format_usages {
            if !usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
                log::info!("taa: {format:?} is not renderable on this adapter");
            }
        }
        Self {
            device,
            queue,
            encoder: None,
            pool: TexturePool::default(),
            retired: Vec::new(),
            live: HashMap::new(),
            next_id: 1,
            format_usages,
            blit_shader,
            blit_bgl,
            resolve_bgl,
            blit_pipelines: HashMap::new(),
            resolve_pipelines: HashMap::new(),
            rejected_targets: HashSet::new(),
            no_motion,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn usages_for(&self, format: wgpu::TextureFormat) -> wgpu::TextureUsages {
        self.format_usages.get(&format).copied().unwrap_or(USAGE)
    }

    /// Whether stage textures of `format` can be render targets here.
    pub fn is_renderable(&self, format: PixelFormat) -> bool {
        let tf = texture_format(format);
        self.usages_for(tf).contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
            && !self.rejected_targets.contains(&tf)
    }

    fn adopt(
        &mut self,
        texture: wgpu::Texture,
        label: &'static str,
        needs: wgpu::TextureUsages,
    ) -> Result<GpuTexture, TaaError> {
        let size = texture.size();
        let format = pixel_format(texture.format())
            .ok_or_else(|| unsupported(format!("texture format {:?}", texture.format())))?;
        if !texture.usage().contains(needs) {
            return Err(unsupported(format!(
                "`{label}` has usage {:?}, needs {needs:?}",
                texture.usage()
            )));
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = self.next_id;
        self.next_id += 1;
        Ok(GpuTexture {
            texture,
            view,
            desc: BufferDesc::new(size.width, size.height, format),
            id,
            label,
            owned: false,
        })
    }

    /// Wrap a renderer-owned texture the stage reads (scene color, motion vectors).
    pub fn wrap(
        &mut self,
        texture: wgpu::Texture,
        label: &'static str,
    ) -> Result<GpuTexture, TaaError> {
        self.adopt(texture, label, wgpu::TextureUsages::TEXTURE_BINDING)
    }

    /// Wrap a renderer-owned texture the stage only writes (swapchain frame).
    pub fn wrap_target(
        &mut self,
        texture: wgpu::Texture,
        label: &'static str,
    ) -> Result<GpuTexture, TaaError> {
        self.adopt(texture, label, wgpu::TextureUsages::RENDER_ATTACHMENT)
    }

    /// Upload texels into an `Rgba32Float`, `Rgba8Unorm` or `Bgra8Unorm` texture.
    pub fn upload(&self, target: &GpuTexture, texels: &[Vec4]) -> Result<(), TaaError> {
        let d = target.desc;
        if texels.len() != (d.width * d.height) as usize
            || !target.has(wgpu::TextureUsages::COPY_DST)
        {
            return Err(TaaError::Allocation {
                desc: d,
                reason: format!("upload of {} texels", texels.len()),
            });
        }
        let bytes: Vec<u8> = match d.format {
            PixelFormat::Rgba32Float => {
                let raw: Vec<[f32; 4]> = texels.iter().map(|v| v.to_array()).collect();
                bytemuck::cast_slice(&raw).to_vec()
            }
            PixelFormat::Rgba8Unorm => texels.iter().flat_map(|v| unorm8(*v)).collect(),
            PixelFormat::Bgra8Unorm => texels
                .iter()
                .flat_map(|v| {
                    let [r, g, b, a] = unorm8(*v);
                    [b, g, r, a]
                })
                .collect(),
            PixelFormat::Rgba16Float => {
                return Err(unsupported(
                    "host upload into Rgba16Float; upload Rgba32Float and blit",
                ));
            }
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(d.width * d.format.bytes_per_pixel()),
                rows_per_image: Some(d.height),
            },
            wgpu::Extent3d {
                width: d.width,
                height: d.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Flush pending work and read a texture back (`Rgba32Float` and 8-bit formats).
    pub fn read_back(&mut self, source: &GpuTexture) -> anyhow::Result<Vec<Vec4>> {
        let d = source.desc;
        anyhow::ensure!(
            d.format != PixelFormat::Rgba16Float,
            "read back of Rgba16Float is not supported"
        );
        anyhow::ensure!(
            source.has(wgpu::TextureUsages::COPY_SRC),
            "`{}` is not COPY_SRC",
            source.label
        );
        let bpp = d.format.bytes_per_pixel();
        let row = d.width * bpp;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = row.div_ceil(align) * align;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("taa-readback"),
            size: padded as u64 * d.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        self.encoder().copy_texture_to_buffer(
            source.texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(d.height),
                },
            },
            wgpu::Extent3d {
                width: d.width,
                height: d.height,
                depth_or_array_layers: 1,
            },
        );
        self.flush();

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| anyhow::anyhow!("device poll: {e:?}"))?;
        rx.recv().context("map callback dropped")?.context("map readback buffer")?;

        let data = slice.get_mapped_range();
        let mut out = Vec::with_capacity((d.width * d.height) as usize);
        for y in 0..d.height as usize {
            let line = &data[y * padded as usize..][..row as usize];
            for px in line.chunks_exact(bpp as usize) {
                out.push(match d.format {
                    PixelFormat::Rgba32Float => {
                        Vec4::from_array(bytemuck::pod_read_unaligned::<[f32; 4]>(px))
                    }
                    PixelFormat::Bgra8Unorm => {
                        Vec4::new(px[2] as f32, px[1] as f32, px[0] as f32, px[3] as f32) / 255.0
                    }
                    _ => Vec4::new(px[0] as f32, px[1] as f32, px[2] as f32, px[3] as f32) / 255.0,
                });
            }
        }
        drop(data);
        staging.unmap();
        Ok(out)
    }

    /// Submit everything recorded since the last flush and age the pool.
    pub fn flush(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(Some(encoder.finish()));
        }
        for t in self.retired.drain(..) {
            t.texture.destroy();
        }
        let expired = self.pool.tick();
        if !expired.is_empty() {
            log::debug!("taa: {} pooled textures expired", expired.len());
        }
        // Released before this submit at the latest; safe to destroy now.
        for t in expired {
            t.texture.destroy();
        }
    }

    /// Destroy every pooled texture. Flushes first.
    pub fn trim(&mut self) {
        self.flush();
        let drained = self.pool.drain();
        if !drained.is_empty() {
            log::debug!("taa: trimmed {} pooled textures", drained.len());
        }
        for t in drained {
            t.texture.destroy();
        }
    }

    pub fn pooled(&self) -> usize {
        self.pool.len()
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("taa-encoder"),
            })
        })
    }

    /// Run `f` inside a validation scope and turn a captured error into `TaaError`.
    fn validated<R>(
        &self,
        what: &str,
        f: impl FnOnce(&wgpu::Device) -> R,
    ) -> Result<R, TaaError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let out = f(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(unsupported(format!("{what}: {err}"))),
            None => Ok(out),
        }
    }

    fn create_texture(
        &self,
        desc: BufferDesc,
        label: &'static str,
        usage: wgpu::TextureUsages,
    ) -> Result<wgpu::Texture, TaaError> {
        self.validated("create texture", |device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: texture_format(desc.format),
                usage,
                view_formats: &[],
            })
        })
    }

    fn ensure_resolve_pipeline(
        &mut self,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
    ) -> Result<(), TaaError> {
        if self.resolve_pipelines.contains_key(&format) {
            return Ok(());
        }
        if self.rejected_targets.contains(&format) {
            return Err(unsupported(format!("resolve into {format:?}")));
        }
        let bgl = &self.resolve_bgl;
        let built = self.validated("resolve pipeline", |d| {
            pipeline::create_resolve_pipeline(d, shader, bgl, format)
        });
        match built {
            Ok(p) => {
                self.resolve_pipelines.insert(format, p);
                Ok(())
            }
            Err(e) => {
                log::warn!("taa: {e}");
                self.rejected_targets.insert(format);
                Err(e)
            }
        }
    }

    fn ensure_blit_pipeline(&mut self, format: wgpu::TextureFormat) -> Result<(), TaaError> {
        if self.blit_pipelines.contains_key(&format) {
            return Ok(());
        }
        let (shader, bgl) = (&self.blit_shader, &self.blit_bgl);
        let p = self.validated("blit pipeline", |d| {
            pipeline::create_blit_pipeline(d, shader, bgl, format)
        })?;
        self.blit_pipelines.insert(format, p);
        Ok(())
    }

    fn fullscreen_pass(
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        rp.set_pipeline(pipeline);
        rp.set_bind_group(0, bind_group, &[]);
        rp.draw(0..3, 0..1);
    }

    fn copy_same_desc(&mut self, src: &GpuTexture, dst: &GpuTexture) {
        let extent = wgpu::Extent3d {
            width: src.desc.width,
            height: src.desc.height,
            depth_or_array_layers: 1,
        };
        self.encoder().copy_texture_to_texture(
            src.texture.as_image_copy(),
            dst.texture.as_image_copy(),
            extent,
        );
    }

    fn blit_convert(&mut self, src: &GpuTexture, dst: &GpuTexture) -> Result<(), TaaError> {
        if !src.has(wgpu::TextureUsages::TEXTURE_BINDING)
            || !dst.has(wgpu::TextureUsages::RENDER_ATTACHMENT)
        {
            return Err(unsupported(format!(
                "blit `{}` {:?} -> `{}` {:?}",
                src.label, src.desc.format, dst.label, dst.desc.format
            )));
        }
        let format = dst.texture.format();
        self.ensure_blit_pipeline(format)?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("taa-blit-bg"),
            layout: &self.blit_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&src.view),
            }],
        });
        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("taa-encoder"),
            })
        });
        Self::fullscreen_pass(
            encoder,
            "taa-blit",
            &dst.view,
            &self.blit_pipelines[&format],
            &bind_group,
        );
        Ok(())
    }
}

fn unorm8(v: Vec4) -> [u8; 4] {
    (v.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round().to_array().map(|c| c as u8)
}

impl GpuBackend for WgpuBackend {
    type Buffer = GpuTexture;
    type Material = ResolveMaterial;

    fn allocate(&mut self, desc: BufferDesc, label: &'static str) -> Result<GpuTexture, TaaError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(TaaError::Allocation {
                desc,
                reason: "zero extent".into(),
            });
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width > max || desc.height > max {
            return Err(TaaError::Allocation {
                desc,
                reason: format!("exceeds max texture dimension {max}"),
            });
        }
        let mut tex = match self.pool.take(desc) {
            Some(t) => t,
            None => {
                let format = texture_format(desc.format);
                let allowed = self.usages_for(format);
                if !allowed.contains(REQUIRED_USAGE) {
                    return Err(TaaError::Allocation {
                        desc,
                        reason: format!("format supports only {allowed:?}"),
                    });
                }
                // Non-renderable formats still work as copy sources and history.
                let texture = self
                    .create_texture(desc, label, USAGE & allowed)
                    .map_err(|e| TaaError::Allocation {
                        desc,
                        reason: e.to_string(),
                    })?;
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                GpuTexture {
                    texture,
                    view,
                    desc,
                    id: 0,
                    label,
                    owned: true,
                }
            }
        };
        tex.id = self.next_id;
        tex.label = label;
        self.next_id += 1;
        *self.live.entry(label).or_insert(0) += 1;
        Ok(tex)
    }

    fn release(&mut self, buffer: GpuTexture) {
        if !buffer.owned {
            log::warn!("taa: release of wrapped texture `{}` ignored", buffer.label);
            return;
        }
        if let Some(n) = self.live.get_mut(buffer.label) {
            *n = n.saturating_sub(1);
        }
        if let Some(evicted) = self.pool.put(buffer.desc, buffer) {
            self.retired.push(evicted);
        }
    }

    fn describe(&self, buffer: &GpuTexture) -> Result<BufferDesc, TaaError> {
        Ok(buffer.desc)
    }

    fn blit(&mut self, src: &GpuTexture, dst: &GpuTexture) -> Result<(), TaaError> {
        if src.id == dst.id {
            return Ok(());
        }
        if (src.desc.width, src.desc.height) != (dst.desc.width, dst.desc.height) {
            return Err(TaaError::DescMismatch {
                src: src.desc,
                dst: dst.desc,
            });
        }
        let copyable =
            src.has(wgpu::TextureUsages::COPY_SRC) && dst.has(wgpu::TextureUsages::COPY_DST);
        if src.desc.format == dst.desc.format && copyable {
            self.copy_same_desc(src, dst);
            Ok(())
        } else {
            self.blit_convert(src, dst)
        }
    }

    fn blit_with(
        &mut self,
        src: &GpuTexture,
        dst: &GpuTexture,
        material: &ResolveMaterial,
        bindings: &ResolveBindings<'_, GpuTexture>,
        pass: u32,
    ) -> Result<(), TaaError> {
        if material.name != RESOLVE_MATERIAL || pass != 0 {
            return Err(unsupported(format!("{} pass {pass}", material.name)));
        }
        let history = bindings.history;
        check_resolve_inputs(
            src.desc,
            history.desc,
            bindings.motion.map(|m| m.desc),
            dst.desc,
        )?;
        let sampled = [Some(src), Some(history), bindings.motion];
        let unsampleable = sampled
            .into_iter()
            .flatten()
            .find(|t| !t.has(wgpu::TextureUsages::TEXTURE_BINDING));
        if let Some(t) = unsampleable {
            return Err(unsupported(format!("`{}` cannot be sampled", t.label)));
        }
        if !dst.has(wgpu::TextureUsages::RENDER_ATTACHMENT) {
            return Err(unsupported(format!(
                "`{}` ({:?}) cannot be rendered to",
                dst.label, dst.desc.format
            )));
        }
        let format = dst.texture.format();
        self.ensure_resolve_pipeline(&material.shader, format)?;

        let uniforms = ResolveUniforms::new(
            bindings.jitter_uv,
            src.desc.width,
            src.desc.height,
            bindings.policy,
            bindings.motion.is_some(),
        );
        // Fresh buffer per pass: queue writes would all land before the shared submit.
        let ubo = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("taa-resolve-ubo"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let motion_view = bindings.motion.map(|m| &m.view).unwrap_or(&self.no_motion);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("taa-resolve-bg"),
            layout: &self.resolve_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&src.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&history.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(motion_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: ubo.as_entire_binding(),
                },
            ],
        });
        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("taa-encoder"),
            })
        });
        Self::fullscreen_pass(
            encoder,
            "taa-resolve",
            &dst.view,
            &self.resolve_pipelines[&format],
            &bind_group,
        );
        Ok(())
    }

    /// Compile the resolve shader and build its pipeline for the first
    /// renderable common target; `None` if the device rejects either.
    fn find_material(&mut self, name: &str) -> Option<ResolveMaterial> {
        if name != RESOLVE_MATERIAL {
            return None;
        }
        let shader = match self.validated("resolve shader", pipeline::create_resolve_shader) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("taa: {e}");
                return None;
            }
        };
        let Some(target) = MATERIAL_TARGETS.into_iter().find(|&f| self.is_renderable(f)) else {
            log::warn!("taa: no renderable resolve target format on this adapter");
            return None;
        };
        self.ensure_resolve_pipeline(&shader, texture_format(target)).ok()?;
        Some(ResolveMaterial {
            name: name.to_string(),
            shader,
        })
    }

    fn live_count(&self, label: &str) -> usize {
        self.live.get(label).copied().unwrap_or(0)
    }
}

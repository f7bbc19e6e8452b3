//! Software backend: RGBA f32 buffers in host memory.
//!
//! Mirrors the WGSL resolve in `render_wgpu` so the blend can be tested without
//! a device, and keeps per-label allocation accounting (live and peak counts).

use std::collections::HashMap;

use glam::{Vec2, Vec4};

use crate::error::TaaError;
use crate::gpu::{
    BlendPolicy, BufferDesc, GpuBackend, PixelFormat, RESOLVE_MATERIAL, ResolveBindings,
    check_resolve_inputs,
};

/// Handle to a buffer owned by a [`CpuBackend`]. Not `Clone`: one owner per allocation.
#[derive(Debug, PartialEq, Eq)]
pub struct CpuBuffer {
    id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuMaterial {
    name: String,
}

impl CpuMaterial {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct Texels {
    desc: BufferDesc,
    label: &'static str,
    data: Vec<Vec4>,
}

#[derive(Debug)]
pub struct CpuBackend {
    next_id: u64,
    buffers: HashMap<u64, Texels>,
    live: HashMap<&'static str, usize>,
    peak: HashMap<&'static str, usize>,
    resolve_supported: bool,
    failing_resolves: u32,
    material_lookups: u32,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            buffers: HashMap::new(),
            live: HashMap::new(),
            peak: HashMap::new(),
            resolve_supported: true,
            failing_resolves: 0,
            material_lookups: 0,
        }
    }

    /// Backend on which the resolve material cannot be found.
    pub fn without_resolve() -> Self {
        Self {
            resolve_supported: false,
            ..Self::new()
        }
    }

    /// Make the next `n` resolve passes fail.
    pub fn fail_resolves(&mut self, n: u32) {
        self.failing_resolves = n;
    }

    pub fn material_lookups(&self) -> u32 {
        self.material_lookups
    }

    /// Highest simultaneous live count seen for `label`.
    pub fn peak_count(&self, label: &str) -> usize {
        self.peak.get(label).copied().unwrap_or(0)
    }

    pub fn live_total(&self) -> usize {
        self.buffers.len()
    }

    /// Allocate and fill a buffer in one step.
    pub fn create_with(
        &mut self,
        desc: BufferDesc,
        label: &'static str,
        texels: &[Vec4],
    ) -> Result<CpuBuffer, TaaError> {
        let buf = self.allocate(desc, label)?;
        self.upload(&buf, texels)?;
        Ok(buf)
    }

    pub fn upload(&mut self, buffer: &CpuBuffer, texels: &[Vec4]) -> Result<(), TaaError> {
        let t = self.buffers.get_mut(&buffer.id).ok_or(TaaError::UnknownBuffer)?;
        if texels.len() != t.data.len() {
            return Err(TaaError::Allocation {
                desc: t.desc,
                reason: format!("upload of {} texels into {}", texels.len(), t.data.len()),
            });
        }
        let format = t.desc.format;
        for (dst, src) in t.data.iter_mut().zip(texels) {
            *dst = store(format, *src);
        }
        Ok(())
    }

    pub fn read(&self, buffer: &CpuBuffer) -> Option<&[Vec4]> {
        self.buffers.get(&buffer.id).map(|t| t.data.as_slice())
    }

    fn texels(&self, buffer: &CpuBuffer) -> Result<&Texels, TaaError> {
        self.buffers.get(&buffer.id).ok_or(TaaError::UnknownBuffer)
    }
}

impl GpuBackend for CpuBackend {
    type Buffer = CpuBuffer;
    type Material = CpuMaterial;

    fn allocate(&mut self, desc: BufferDesc, label: &'static str) -> Result<CpuBuffer, TaaError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(TaaError::Allocation {
                desc,
                reason: "zero extent".into(),
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        let len = desc.width as usize * desc.height as usize;
        self.buffers.insert(
            id,
            Texels {
                desc,
                label,
                data: vec![Vec4::ZERO; len],
            },
        );
        let live = self.live.entry(label).or_insert(0);
        *live += 1;
        let peak = self.peak.entry(label).or_insert(0);
        *peak = (*peak).max(*live);
        Ok(CpuBuffer { id })
    }

    fn release(&mut self, buffer: CpuBuffer) {
        match self.buffers.remove(&buffer.id) {
            Some(t) => {
                if let Some(n) = self.live.get_mut(t.label) {
                    *n = n.saturating_sub(1);
                }
            }
            None => log::warn!("cpu backend: release of unknown buffer {}", buffer.id),
        }
    }

    fn describe(&self, buffer: &CpuBuffer) -> Result<BufferDesc, TaaError> {
        self.texels(buffer).map(|t| t.desc)
    }

    fn blit(&mut self, src: &CpuBuffer, dst: &CpuBuffer) -> Result<(), TaaError> {
        if src.id == dst.id {
            return Ok(());
        }
        let s = self.texels(src)?;
        let src_desc = s.desc;
        let data = s.data.clone();
        let d = self.buffers.get_mut(&dst.id).ok_or(TaaError::UnknownBuffer)?;
        if (src_desc.width, src_desc.height) != (d.desc.width, d.desc.height) {
            return Err(TaaError::DescMismatch {
                src: src_desc,
                dst: d.desc,
            });
        }
        if src_desc.format == d.desc.format {
            d.data = data;
        } else {
            let format = d.desc.format;
            d.data = data.into_iter().map(|v| store(format, v)).collect();
        }
        Ok(())
    }

    fn blit_with(
        &mut self,
        src: &CpuBuffer,
        dst: &CpuBuffer,
        material: &CpuMaterial,
        bindings: &ResolveBindings<'_, CpuBuffer>,
        pass: u32,
    ) -> Result<(), TaaError> {
        if material.name != RESOLVE_MATERIAL || pass != 0 {
            return Err(TaaError::UnsupportedPlatform(format!(
                "{} pass {pass}",
                material.name
            )));
        }
        if self.failing_resolves > 0 {
            self.failing_resolves -= 1;
            return Err(TaaError::UnsupportedPlatform("injected resolve failure".into()));
        }
        let out = {
            let s = self.texels(src)?;
            let h = self.texels(bindings.history)?;
            let m = bindings.motion.map(|m| self.texels(m)).transpose()?;
            let d = self.texels(dst)?;
            check_resolve_inputs(s.desc, h.desc, m.map(|m| m.desc), d.desc)?;
            resolve_texels(
                &s.data,
                &h.data,
                m.map(|m| m.data.as_slice()),
                s.desc.width,
                s.desc.height,
                bindings.jitter_uv,
                bindings.policy,
            )
        };
        let d = self.buffers.get_mut(&dst.id).ok_or(TaaError::UnknownBuffer)?;
        let format = d.desc.format;
        d.data = out.into_iter().map(|v| store(format, v)).collect();
        Ok(())
    }

    fn find_material(&mut self, name: &str) -> Option<CpuMaterial> {
        self.material_lookups += 1;
        (self.resolve_supported && name == RESOLVE_MATERIAL).then(|| CpuMaterial {
            name: name.to_string(),
        })
    }

    fn live_count(&self, label: &str) -> usize {
        self.live.get(label).copied().unwrap_or(0)
    }
}

/// Quantize a texel to what `format` can hold.
fn store(format: PixelFormat, v: Vec4) -> Vec4 {
    match format {
        PixelFormat::Rgba8Unorm | PixelFormat::Bgra8Unorm => {
            (v.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round() / 255.0
        }
        PixelFormat::Rgba16Float | PixelFormat::Rgba32Float => v,
    }
}

/// Variance clip range `mean ± k·sigma`.
pub fn clamp_range(mean: f32, variance: f32, k: f32) -> (f32, f32) {
    let sigma = variance.max(0.0).sqrt();
    (mean - k * sigma, mean + k * sigma)
}

fn fetch(data: &[Vec4], w: u32, h: u32, x: i32, y: i32) -> Vec4 {
    let x = x.clamp(0, w as i32 - 1) as usize;
    let y = y.clamp(0, h as i32 - 1) as usize;
    data[y * w as usize + x]
}

/// Bilinear sample with clamp-to-edge; `uv` has +Y down, texel centers at +0.5.
pub fn sample_bilinear(data: &[Vec4], w: u32, h: u32, uv: Vec2) -> Vec4 {
    let p = uv * Vec2::new(w as f32, h as f32) - 0.5;
    let base = p.floor();
    let f = p - base;
    let (x0, y0) = (base.x as i32, base.y as i32);
    let a = fetch(data, w, h, x0, y0);
    let b = fetch(data, w, h, x0 + 1, y0);
    let c = fetch(data, w, h, x0, y0 + 1);
    let d = fetch(data, w, h, x0 + 1, y0 + 1);
    a.lerp(b, f.x).lerp(c.lerp(d, f.x), f.y)
}

/// Where the un-jittered value for `uv` sits in a frame rendered with `jitter_uv`.
///
/// Jitter shifts content by -x and +y in UV space (projection Y is up, UV Y is down).
pub fn unjitter_uv(uv: Vec2, jitter_uv: Vec2) -> Vec2 {
    uv + Vec2::new(-jitter_uv.x, jitter_uv.y)
}

/// CPU resolve: neighborhood-clipped history blended over the un-jittered current frame.
pub fn resolve_texels(
    source: &[Vec4],
    history: &[Vec4],
    motion: Option<&[Vec4]>,
    w: u32,
    h: u32,
    jitter_uv: Vec2,
    policy: BlendPolicy,
) -> Vec<Vec4> {
    let size = Vec2::new(w as f32, h as f32);
    let mut out = Vec::with_capacity(source.len());
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let uv = (Vec2::new(x as f32, y as f32) + 0.5) / size;
            let current = sample_bilinear(source, w, h, unjitter_uv(uv, jitter_uv));

            let mut sum = Vec4::ZERO;
            let mut sum_sq = Vec4::ZERO;
            let mut lo = Vec4::splat(f32::INFINITY);
            let mut hi = Vec4::splat(f32::NEG_INFINITY);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let c = fetch(source, w, h, x + dx, y + dy);
                    sum += c;
                    sum_sq += c * c;
                    lo = lo.min(c);
                    hi = hi.max(c);
                }
            }
            let mean = sum / 9.0;
            let variance = sum_sq / 9.0 - mean * mean;

            let prev_uv = match motion {
                Some(m) => {
                    let v = m[y as usize * w as usize + x as usize];
                    uv - Vec2::new(v.x, v.y)
                }
                None => uv,
            };
            let on_screen = (0.0..=1.0).contains(&prev_uv.x) && (0.0..=1.0).contains(&prev_uv.y);
            let resolved = if on_screen {
                let prev = sample_bilinear(history, w, h, prev_uv);
                let mut clipped = Vec4::ZERO;
                for i in 0..4 {
                    let (a, b) = clamp_range(mean[i], variance[i], policy.clamp_gamma);
                    let (a, b) = (a.max(lo[i]), b.min(hi[i]));
                    clipped[i] = prev[i].clamp(a.min(b), b.max(a));
                }
                current.lerp(clipped, policy.history_weight)
            } else {
                current
            };
            out.push(resolved);
        }
    }
    out
}

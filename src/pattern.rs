//! Analytic test pattern: one flat triangle in view space.
//!
//! `render` point-samples pixel centers through whatever projection the camera
//! currently holds (so jitter shows up as aliasing that moves), and `reference`
//! box-filters the un-jittered coverage with a supersample grid.

use glam::{Mat4, Vec2, Vec3, Vec4};

const INSIDE: Vec4 = Vec4::new(1.0, 0.85, 0.4, 1.0);
const OUTSIDE: Vec4 = Vec4::new(0.0, 0.05, 0.1, 1.0);

#[derive(Debug, Clone)]
pub struct Pattern {
    /// Triangle corners in view space (camera at origin looking down -Z).
    pub corners: [Vec3; 3],
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            corners: [
                Vec3::new(-1.3, -0.9, -4.0),
                Vec3::new(1.55, -0.35, -4.0),
                Vec3::new(-0.15, 1.1, -4.0),
            ],
        }
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

impl Pattern {
    fn ndc_corners(&self, projection: Mat4) -> [Vec2; 3] {
        self.corners.map(|c| {
            let clip = projection * c.extend(1.0);
            Vec2::new(clip.x, clip.y) / clip.w
        })
    }

    fn inside(tri: &[Vec2; 3], p: Vec2) -> bool {
        let e0 = edge(tri[0], tri[1], p);
        let e1 = edge(tri[1], tri[2], p);
        let e2 = edge(tri[2], tri[0], p);
        (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0)
    }

    /// Pixel position (row 0 at the top) to NDC.
    fn pixel_to_ndc(p: Vec2, width: u32, height: u32) -> Vec2 {
        Vec2::new(
            p.x / width as f32 * 2.0 - 1.0,
            1.0 - p.y / height as f32 * 2.0,
        )
    }

    /// One sample per pixel center.
    pub fn render(&self, projection: Mat4, width: u32, height: u32) -> Vec<Vec4> {
        let tri = self.ndc_corners(projection);
        let mut out = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let ndc = Self::pixel_to_ndc(center, width, height);
                out.push(if Self::inside(&tri, ndc) { INSIDE } else { OUTSIDE });
            }
        }
        out
    }

    /// Box-filtered coverage with `grid` x `grid` samples per pixel.
    pub fn reference(&self, projection: Mat4, width: u32, height: u32, grid: u32) -> Vec<Vec4> {
        let tri = self.ndc_corners(projection);
        let grid = grid.max(1);
        let step = 1.0 / grid as f32;
        let mut out = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let mut hits = 0u32;
                for sy in 0..grid {
                    for sx in 0..grid {
                        let p = Vec2::new(
                            x as f32 + (sx as f32 + 0.5) * step,
                            y as f32 + (sy as f32 + 0.5) * step,
                        );
                        if Self::inside(&tri, Self::pixel_to_ndc(p, width, height)) {
                            hits += 1;
                        }
                    }
                }
                let coverage = hits as f32 / (grid * grid) as f32;
                out.push(OUTSIDE.lerp(INSIDE, coverage));
            }
        }
        out
    }
}

/// Mean absolute difference over RGB.
pub fn mean_abs_error(a: &[Vec4], b: &[Vec4]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return f32::NAN;
    }
    let total: f32 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x.truncate() - y.truncate()).abs().element_sum() / 3.0)
        .sum();
    total / a.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proj(w: u32, h: u32) -> Mat4 {
        Mat4::perspective_rh_gl(60f32.to_radians(), w as f32 / h as f32, 0.3, 1000.0)
    }

    #[test]
    fn pattern_has_both_regions() {
        let img = Pattern::default().render(proj(64, 36), 64, 36);
        assert!(img.contains(&INSIDE));
        assert!(img.contains(&OUTSIDE));
    }

    #[test]
    fn single_sample_reference_equals_render() {
        let p = Pattern::default();
        let a = p.render(proj(32, 18), 32, 18);
        let b = p.reference(proj(32, 18), 32, 18, 1);
        assert_eq!(mean_abs_error(&a, &b), 0.0);
    }

    #[test]
    fn mismatched_lengths_are_nan() {
        assert!(mean_abs_error(&[Vec4::ZERO], &[]).is_nan());
    }
}

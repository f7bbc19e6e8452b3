//! Camera slots touched by the temporal stage.
//!
//! The camera exposes its intrinsics, the projection used for the next draw,
//! a cached non-jittered projection (consumed by motion-vector generation), and
//! the auxiliary buffer modes the renderer should produce.

use std::ops::{BitOr, BitOrAssign};

use glam::Mat4;

use crate::projection::CameraIntrinsics;

/// Auxiliary render-target modes requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AuxBuffers(u8);

impl AuxBuffers {
    pub const NONE: Self = Self(0);
    pub const DEPTH: Self = Self(1 << 0);
    pub const MOTION_VECTORS: Self = Self(1 << 1);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for AuxBuffers {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AuxBuffers {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    intrinsics: CameraIntrinsics,
    projection: Mat4,
    non_jittered_projection: Mat4,
    pub aux_buffers: AuxBuffers,
}

impl Camera {
    pub fn new(intrinsics: CameraIntrinsics) -> Self {
        let projection = intrinsics.projection();
        Self {
            intrinsics,
            projection,
            non_jittered_projection: projection,
            aux_buffers: AuxBuffers::NONE,
        }
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Replace intrinsics (resize, fov change) and rebuild both projections.
    pub fn set_intrinsics(&mut self, intrinsics: CameraIntrinsics) {
        self.intrinsics = intrinsics;
        self.reset_projection();
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn set_projection(&mut self, m: Mat4) {
        self.projection = m;
    }

    pub fn non_jittered_projection(&self) -> Mat4 {
        self.non_jittered_projection
    }

    pub fn set_non_jittered_projection(&mut self, m: Mat4) {
        self.non_jittered_projection = m;
    }

    /// Drop any custom projection and return to the symmetric one.
    pub fn reset_projection(&mut self) {
        self.projection = self.intrinsics.projection();
        self.non_jittered_projection = self.projection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aux_bits_insert_remove() {
        let mut m = AuxBuffers::DEPTH | AuxBuffers::MOTION_VECTORS;
        assert!(m.contains(AuxBuffers::DEPTH));
        m.remove(AuxBuffers::MOTION_VECTORS);
        assert!(m.contains(AuxBuffers::DEPTH));
        assert!(!m.contains(AuxBuffers::MOTION_VECTORS));
        m.remove(AuxBuffers::DEPTH);
        assert!(m.is_empty());
    }

    #[test]
    fn reset_restores_symmetric_projection() {
        let i = CameraIntrinsics::for_target(60.0, 0.3, 1000.0, 640, 480);
        let mut cam = Camera::new(i);
        cam.set_projection(Mat4::IDENTITY);
        cam.reset_projection();
        assert_eq!(cam.projection(), i.projection());
        assert_eq!(cam.non_jittered_projection(), i.projection());
    }
}

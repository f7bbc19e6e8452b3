//! Camera intrinsics and the jittered (off-axis) perspective projection.
//!
//! Matrices are column-major glam `Mat4` in OpenGL clip convention (right-handed
//! view space looking down -Z, clip z in [-w, w]), matching
//! `Mat4::perspective_rh_gl`.

use glam::{Mat4, Vec2, Vec4};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl CameraIntrinsics {
    /// Intrinsics for a target size; aspect follows the pixel extent.
    pub fn for_target(fov_y_degrees: f32, near: f32, far: f32, width: u32, height: u32) -> Self {
        Self {
            fov_y_degrees,
            aspect: width as f32 / height.max(1) as f32,
            near,
            far,
            pixel_width: width,
            pixel_height: height,
        }
    }

    pub fn fov_y_radians(&self) -> f32 {
        self.fov_y_degrees.to_radians()
    }

    /// Symmetric (non-jittered) perspective for these intrinsics.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians(), self.aspect, self.near, self.far)
    }
}

/// General off-axis frustum matrix from near-plane edges.
pub fn off_axis(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let x_axis = Vec4::new(2.0 * near / (right - left), 0.0, 0.0, 0.0);
    let y_axis = Vec4::new(0.0, 2.0 * near / (top - bottom), 0.0, 0.0);
    let z_axis = Vec4::new(
        (right + left) / (right - left),
        (top + bottom) / (top - bottom),
        -(far + near) / (far - near),
        -1.0,
    );
    let w_axis = Vec4::new(0.0, 0.0, -(2.0 * far * near) / (far - near), 0.0);
    Mat4::from_cols(x_axis, y_axis, z_axis, w_axis)
}

/// Perspective whose frustum is shifted by `offset_px` pixels.
///
/// The offset is converted to near-plane units per axis before the frustum
/// edges are computed; at `Vec2::ZERO` the result equals
/// [`CameraIntrinsics::projection`].
pub fn jittered_projection(intrinsics: &CameraIntrinsics, offset_px: Vec2) -> Mat4 {
    let v = (0.5 * intrinsics.fov_y_radians()).tan();
    let h = v * intrinsics.aspect;

    let ox = offset_px.x * h / (0.5 * intrinsics.pixel_width as f32);
    let oy = offset_px.y * v / (0.5 * intrinsics.pixel_height as f32);

    let n = intrinsics.near;
    let left = (ox - h) * n;
    let right = (ox + h) * n;
    let top = (oy + v) * n;
    let bottom = (oy - v) * n;

    off_axis(left, right, bottom, top, n, intrinsics.far)
}

/// Pixel offset to UV units for a target of `width` x `height`.
pub fn jitter_uv(offset_px: Vec2, width: u32, height: u32) -> Vec2 {
    offset_px / Vec2::new(width.max(1) as f32, height.max(1) as f32)
}

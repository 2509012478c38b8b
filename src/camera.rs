//! The synthetic pinhole camera.
//!
//! World points go through viewing space (`Mv`), the depth preserving
//! perspective transform (`Mp`), normalization of the near plane cross-section
//! (`T1`, `S1`), and the viewport mapping (`T2`, `S2`, `W2`) before a
//! perspective divide turns them into pixel coordinates.
//!
//! Everything is computed once in [`Camera::new`]; a camera is never mutated
//! afterwards, so it can be shared freely between threads.

use std::f64::consts::PI;

use log::{debug, trace};

use crate::error::CameraError;
use crate::space::*;

pub const DEFAULT_DIVIDE_EPSILON: f64 = 1e-10;

/// `|up × N|` below this means `up` is parallel to the view direction.
const PARALLEL_TOLERANCE: f64 = 1e-9;

/// Camera pose, frustum and output window.
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct CameraConfig {
    /// Approximate up direction; only its component orthogonal to the view direction matters.
    pub up: Vec3,
    pub eye: Vec3,
    pub target: Vec3,
    pub near_plane: f64,
    pub far_plane: f64,
    /// Full field of view angle, in degrees.
    pub fov_degrees: f64,
    pub window_width: f64,
    pub window_height: f64,
    /// Perspective divides fail when `|w|` is at or below this.
    pub divide_epsilon: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            up: Vec3::UP,
            eye: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            near_plane: 10.0,
            far_plane: 50.0,
            fov_degrees: 90.0,
            window_width: 512.0,
            window_height: 512.0,
            divide_epsilon: DEFAULT_DIVIDE_EPSILON,
        }
    }
}

impl CameraConfig {
    fn validate_frustum(&self) -> Result<(), CameraError> {
        let fail = |msg: String| -> Result<(), CameraError> { Err(CameraError::InvalidFrustum(msg)) };
        if !(self.near_plane.is_finite() && self.near_plane > 0.0) {
            return fail(format!("near plane must be positive, got {}", self.near_plane));
        }
        if !(self.far_plane.is_finite() && self.far_plane > self.near_plane) {
            return fail(format!(
                "far plane must lie beyond the near plane ({}), got {}",
                self.near_plane, self.far_plane
            ));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return fail(format!("field of view must be in (0, 180) degrees, got {}", self.fov_degrees));
        }
        if !(self.window_width.is_finite() && self.window_width > 0.0
            && self.window_height.is_finite() && self.window_height > 0.0)
        {
            return fail(format!(
                "window must have a positive size, got {}x{}",
                self.window_width, self.window_height
            ));
        }
        if !(self.divide_epsilon.is_finite() && self.divide_epsilon >= 0.0) {
            return fail(format!("divide epsilon must be finite and non-negative, got {}", self.divide_epsilon));
        }
        Ok(())
    }
}

/// Right-handed orthonormal camera frame.
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct CameraBasis {
    pub u: Vec3,
    pub v: Vec3,
    /// Points from the target back towards the eye; the camera looks down `-N`.
    pub n: Vec3,
}

impl CameraBasis {
    /// `N = normalize(eye - target)`, `U = normalize(up × N)`, `V = N × U`.
    pub fn new(eye: Vec3, target: Vec3, up: Vec3) -> Result<CameraBasis, CameraError> {
        if !(eye.is_finite() && target.is_finite() && up.is_finite()) {
            return Err(CameraError::InvalidPose("eye, target and up must be finite".to_owned()));
        }
        let n = (eye - target).try_unit().ok_or_else(|| {
            CameraError::InvalidPose(format!("eye and target coincide at {:?}", eye))
        })?;
        let up = up.try_unit().ok_or_else(|| {
            CameraError::InvalidPose("up vector has zero length".to_owned())
        })?;
        let right = up.cross(n);
        if right.magn() <= PARALLEL_TOLERANCE {
            return Err(CameraError::InvalidPose(format!(
                "up vector {:?} is parallel to the view direction {:?}", up, n
            )));
        }
        let u = right.unit();
        // n and u are unit length and orthogonal already
        let v = n.cross(u);
        Ok(CameraBasis { u, v, n })
    }
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct FrustumBounds {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl FrustumBounds {
    pub fn at_near_plane(near_plane: f64, fov_degrees: f64, aspect: f64) -> FrustumBounds {
        let top = near_plane * (PI / 180.0 * fov_degrees / 2.0).tan();
        let right = aspect * top;
        FrustumBounds { left: -right, right, bottom: -top, top }
    }
}

/// Every matrix of the pipeline, in the order they are applied.
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct TransformMatrices {
    pub mv: Mat4,
    pub mp: Mat4,
    pub t1: Mat4,
    pub s1: Mat4,
    pub t2: Mat4,
    pub s2: Mat4,
    pub w2: Mat4,
    /// `W2·S2·T2·S1·T1·Mp`, viewing to image.
    pub c: Mat4,
    /// `C·Mv`, world to image.
    pub m: Mat4,
}

/// Rotation rows `U`, `V`, `N`, with the eye translated to the origin.
#[rustfmt::skip]
pub fn view_matrix(basis: &CameraBasis, eye: Vec3) -> Mat4 {
    let CameraBasis { u, v, n } = *basis;
    Mat4::from_rows([
        [u.x, u.y, u.z, -eye.dot(u)],
        [v.x, v.y, v.z, -eye.dot(v)],
        [n.x, n.y, n.z, -eye.dot(n)],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Depth preserving perspective: the near plane lands on depth -1 and the far
/// plane on +1 after the divide, and `w' = -z`.
#[rustfmt::skip]
pub fn perspective_matrix(near_plane: f64, far_plane: f64) -> Mat4 {
    let depth = far_plane - near_plane;
    Mat4::from_rows([
        [near_plane, 0.0,        0.0,                                0.0],
        [0.0,        near_plane, 0.0,                                0.0],
        [0.0,        0.0,        -(near_plane + far_plane) / depth,  -2.0 * far_plane * near_plane / depth],
        [0.0,        0.0,        -1.0,                               0.0],
    ])
}

/// `T1`: centers the near plane box on the origin. Identity for a symmetric frustum.
pub fn normalization_translation(bounds: &FrustumBounds) -> Mat4 {
    Mat4::translation(
        -(bounds.right + bounds.left) / 2.0,
        -(bounds.top + bounds.bottom) / 2.0,
        0.0,
    )
}

/// `S1`: scales the centered box to `[-1,1]²`.
pub fn normalization_scale(bounds: &FrustumBounds) -> Mat4 {
    Mat4::scale(
        2.0 / (bounds.right - bounds.left),
        2.0 / (bounds.top - bounds.bottom),
        1.0,
    )
}

/// `T2`: `[-1,1]²` to `[0,2]²`.
pub fn viewport_translation() -> Mat4 {
    Mat4::translation(1.0, 1.0, 0.0)
}

/// `S2`: `[0,2]²` to `[0,width]×[0,height]`.
pub fn viewport_scale(width: f64, height: f64) -> Mat4 {
    Mat4::scale(width / 2.0, height / 2.0, 1.0)
}

/// `W2`: flips y so raster row 0 is the top of the image.
pub fn raster_flip(height: f64) -> Mat4 {
    Mat4::translation(0.0, height, 0.0) * Mat4::scale(1.0, -1.0, 1.0)
}

/// Divides `x`, `y`, `z` by `w`. The result has `w` exactly 1.
pub fn perspective_divide(p: Vec4, epsilon: f64) -> Result<Vec4, CameraError> {
    if !p.w.is_finite() || p.w.abs() <= epsilon {
        trace!("refusing perspective divide of {:?}", p);
        return Err(CameraError::DegenerateProjection { w: p.w });
    }
    Ok(Vec4::new(p.x / p.w, p.y / p.w, p.z / p.w, 1.0))
}

#[derive(Clone,Debug)]
pub struct Camera {
    config: CameraConfig,
    aspect: f64,
    np_height: f64,
    np_width: f64,
    bounds: FrustumBounds,
    basis: CameraBasis,
    transforms: TransformMatrices,
}

impl Camera {
    /// Validates `config` and builds the whole transform chain.
    pub fn new(config: CameraConfig) -> Result<Camera, CameraError> {
        config.validate_frustum()?;
        let basis = CameraBasis::new(config.eye, config.target, config.up)?;
        let config = CameraConfig { up: config.up.unit(), ..config };

        let aspect = config.window_width / config.window_height;
        let np_height = config.near_plane * (PI / 180.0 * config.fov_degrees / 2.0);
        let np_width = np_height * aspect;
        let bounds = FrustumBounds::at_near_plane(config.near_plane, config.fov_degrees, aspect);

        let mv = view_matrix(&basis, config.eye);
        let mp = perspective_matrix(config.near_plane, config.far_plane);
        let t1 = normalization_translation(&bounds);
        let s1 = normalization_scale(&bounds);
        let t2 = viewport_translation();
        let s2 = viewport_scale(config.window_width, config.window_height);
        let w2 = raster_flip(config.window_height);
        let c = w2 * s2 * t2 * s1 * t1 * mp;
        let m = c * mv;

        debug!(
            "camera at {:?} looking at {:?}: U = {:?}, V = {:?}, N = {:?}",
            config.eye, config.target, basis.u, basis.v, basis.n
        );

        Ok(Camera {
            config,
            aspect,
            np_height,
            np_width,
            bounds,
            basis,
            transforms: TransformMatrices { mv, mp, t1, s1, t2, s2, w2, c, m },
        })
    }

    pub fn world_to_viewing(&self, p: Vec4) -> Vec4 {
        self.transforms.mv * p
    }

    pub fn world_to_image(&self, p: Vec4) -> Vec4 {
        self.transforms.m * p
    }

    pub fn world_to_pixel(&self, p: Vec4) -> Result<Vec4, CameraError> {
        self.image_to_pixel(self.world_to_image(p))
    }

    pub fn viewing_to_image(&self, p: Vec4) -> Vec4 {
        self.transforms.c * p
    }

    pub fn viewing_to_pixel(&self, p: Vec4) -> Result<Vec4, CameraError> {
        self.image_to_pixel(self.viewing_to_image(p))
    }

    pub fn image_to_pixel(&self, p: Vec4) -> Result<Vec4, CameraError> {
        perspective_divide(p, self.config.divide_epsilon)
    }

    pub fn config(&self) -> &CameraConfig { &self.config }
    /// The normalized up vector.
    pub fn up(&self) -> Vec3 { self.config.up }
    pub fn eye(&self) -> Vec3 { self.config.eye }
    pub fn target(&self) -> Vec3 { self.config.target }
    pub fn basis(&self) -> &CameraBasis { &self.basis }
    pub fn u(&self) -> Vec3 { self.basis.u }
    pub fn v(&self) -> Vec3 { self.basis.v }
    pub fn n(&self) -> Vec3 { self.basis.n }
    pub fn transforms(&self) -> &TransformMatrices { &self.transforms }
    pub fn mv(&self) -> Mat4 { self.transforms.mv }
    pub fn c(&self) -> Mat4 { self.transforms.c }
    pub fn m(&self) -> Mat4 { self.transforms.m }
    pub fn near_plane(&self) -> f64 { self.config.near_plane }
    pub fn far_plane(&self) -> f64 { self.config.far_plane }
    pub fn fov_degrees(&self) -> f64 { self.config.fov_degrees }
    pub fn aspect(&self) -> f64 { self.aspect }
    pub fn width(&self) -> f64 { self.config.window_width }
    pub fn height(&self) -> f64 { self.config.window_height }
    /// `near · fov/2` in radians. Note this is not `near · tan(fov/2)`; see
    /// [`Camera::near_plane_bounds`] for the actual cross-section.
    pub fn np_height(&self) -> f64 { self.np_height }
    pub fn np_width(&self) -> f64 { self.np_width }
    /// The box normalized by `T1` and `S1`.
    pub fn near_plane_bounds(&self) -> &FrustumBounds { &self.bounds }
    pub fn epsilon(&self) -> f64 { self.config.divide_epsilon }
}

use std::f64::consts::PI;
use std::fmt::Debug;

use crate::error::SceneError;
use crate::space::*;

/// Most samples taken along one parameter axis.
pub const MAX_STEPS: usize = 1 << 20;

/// A surface given by a closed-form `(u, v) -> point` in object space.
pub trait Parametric: Debug + Send + Sync {
    fn point(&self, u: f64, v: f64) -> Vec4;
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Plane { pub width: f64, pub height: f64 }
impl Parametric for Plane {
    fn point(&self, u: f64, v: f64) -> Vec4 {
        Vec4::point(Vec3::new(self.width * u, self.height * v, 0.0))
    }
}

/// A disk in the xy plane; `u` is the fraction of the radius.
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Circle { pub radius: f64 }
impl Parametric for Circle {
    fn point(&self, u: f64, v: f64) -> Vec4 {
        let r = self.radius * u;
        Vec4::point(Vec3::new(r * v.cos(), r * v.sin(), 0.0))
    }
}

/// Apex at `z = height`, base of `radius` at `z = 0`.
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Cone { pub height: f64, pub radius: f64 }
impl Parametric for Cone {
    fn point(&self, u: f64, v: f64) -> Vec4 {
        let r = self.radius * (1.0 - u);
        Vec4::point(Vec3::new(r * v.sin(), r * v.cos(), self.height * u))
    }
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Cylinder { pub height: f64, pub radius: f64 }
impl Parametric for Cylinder {
    fn point(&self, u: f64, v: f64) -> Vec4 {
        Vec4::point(Vec3::new(self.radius * v.sin(), self.radius * v.cos(), self.height * u))
    }
}

/// A shape placed in the world, with its own sampling grid.
#[derive(Debug)]
pub struct ParametricObject {
    pub shape: Box<dyn Parametric>,
    /// Object to world.
    pub transform: Mat4,
    pub color: Color,
    pub u_range: (f64,f64),
    pub v_range: (f64,f64),
    /// Sampling steps along `u` and `v`.
    pub uv_delta: (f64,f64),
}

impl ParametricObject {
    pub fn new(shape: Box<dyn Parametric>, transform: Mat4, color: Color) -> ParametricObject {
        ParametricObject {
            shape,
            transform,
            color,
            u_range: (0.0, 1.0),
            v_range: (0.0, 1.0),
            uv_delta: (0.1, 0.1),
        }
    }
    pub fn plane(width: f64, height: f64) -> ParametricObject {
        ParametricObject::new(Box::new(Plane { width, height }), Mat4::IDENTITY, Color::new(255,255,0))
    }
    pub fn circle(radius: f64) -> ParametricObject {
        ParametricObject {
            v_range: (0.0, 2.0 * PI),
            uv_delta: (PI / 18.0, PI / 18.0),
            ..ParametricObject::new(Box::new(Circle { radius }), Mat4::IDENTITY, Color::new(0,255,255))
        }
    }
    pub fn cone(height: f64, radius: f64) -> ParametricObject {
        ParametricObject {
            v_range: (0.0, 2.0 * PI),
            uv_delta: (PI / 18.0, PI / 18.0),
            ..ParametricObject::new(Box::new(Cone { height, radius }), Mat4::IDENTITY, Color::new(0,0,255))
        }
    }
    pub fn cylinder(height: f64, radius: f64) -> ParametricObject {
        ParametricObject {
            v_range: (0.0, 2.0 * PI),
            uv_delta: (PI / 18.0, PI / 18.0),
            ..ParametricObject::new(Box::new(Cylinder { height, radius }), Mat4::IDENTITY, Color::new(255,0,255))
        }
    }

    pub fn with_transform(self, transform: Mat4) -> ParametricObject {
        ParametricObject { transform, ..self }
    }
    pub fn with_color(self, color: Color) -> ParametricObject {
        ParametricObject { color, ..self }
    }
    pub fn with_sampling(self, u_range: (f64,f64), v_range: (f64,f64), uv_delta: (f64,f64)) -> ParametricObject {
        ParametricObject { u_range, v_range, uv_delta, ..self }
    }

    pub fn world_point(&self, u: f64, v: f64) -> Vec4 {
        self.transform * self.shape.point(u, v)
    }

    /// World points on the `(u, v)` grid: one row per `u` step, one column per
    /// `v` step. Both range ends are included.
    pub fn sample(&self) -> Result<Vec<Vec<Vec4>>, SceneError> {
        let us = steps(self.u_range, self.uv_delta.0)?;
        let vs = steps(self.v_range, self.uv_delta.1)?;
        Ok(us.iter()
            .map(|&u| vs.iter().map(|&v| self.world_point(u, v)).collect())
            .collect())
    }
}

fn steps(range: (f64,f64), delta: f64) -> Result<Vec<f64>, SceneError> {
    let (start, end) = range;
    if !(delta.is_finite() && delta > 0.0) {
        return Err(SceneError::InvalidSampling(format!("step must be positive, got {}", delta)));
    }
    if !(start.is_finite() && end.is_finite() && start <= end) {
        return Err(SceneError::InvalidSampling(format!("bad parameter range {:?}", range)));
    }
    // the last step snaps to `end` instead of overshooting it
    let count = ((end - start) / delta - 1e-9).ceil().max(0.0);
    if !(count.is_finite() && count < MAX_STEPS as f64) {
        return Err(SceneError::InvalidSampling(format!(
            "step {} over {:?} needs more than {} samples", delta, range, MAX_STEPS
        )));
    }
    let count = count as usize;
    let mut out: Vec<f64> = (0..count).map(|i| start + delta * i as f64).collect();
    out.push(end);
    Ok(out)
}

pub struct Scene {
    pub objects: Vec<ParametricObject>,
    pub background: Color,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn shapes_follow_their_formulas() {
        assert_eq!(Plane { width: 4.0, height: 2.0 }.point(0.5, 0.5), Vec4::new(2.0, 1.0, 0.0, 1.0));
        let c = Circle { radius: 2.0 }.point(1.0, PI / 2.0);
        assert_abs_diff_eq!(c.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.y, 2.0, epsilon = 1e-12);
        let apex = Cone { height: 3.0, radius: 1.0 }.point(1.0, 0.7);
        assert_abs_diff_eq!(apex.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(apex.z, 3.0, epsilon = 1e-12);
        let side = Cylinder { height: 3.0, radius: 2.0 }.point(0.5, 0.0);
        assert_eq!(side, Vec4::new(0.0, 2.0, 1.5, 1.0));
    }

    #[test]
    fn world_point_applies_own_transform() {
        let a = ParametricObject::plane(1.0, 1.0).with_transform(Mat4::translation(0.0, 0.0, 5.0));
        let b = ParametricObject::plane(1.0, 1.0);
        assert_eq!(a.world_point(1.0, 1.0), Vec4::new(1.0, 1.0, 5.0, 1.0));
        // the default transform is not shared with other objects
        assert_eq!(b.transform, Mat4::IDENTITY);
        assert_eq!(b.world_point(1.0, 1.0), Vec4::new(1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn sampling_includes_both_ends() {
        let grid = ParametricObject::plane(10.0, 10.0).sample().unwrap();
        assert_eq!(grid.len(), 11);
        assert!(grid.iter().all(|row| row.len() == 11));
        assert_eq!(grid[0][0], Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(grid[10][10], Vec4::new(10.0, 10.0, 0.0, 1.0));

        let ring = ParametricObject::circle(1.0).sample().unwrap();
        assert_eq!(ring[0].len(), 37);
    }

    #[test]
    fn uneven_steps_stop_at_the_range_end() {
        let s = steps((0.0, 1.0), 0.3).unwrap();
        assert_eq!(s.len(), 5);
        assert_eq!(*s.last().unwrap(), 1.0);
        assert_eq!(steps((2.0, 2.0), 0.5).unwrap(), vec![2.0]);
    }

    #[test]
    fn tiny_steps_are_rejected() {
        let obj = ParametricObject::plane(1.0, 1.0).with_sampling((0.0, 1.0), (0.0, 1.0), (1e-300, 0.1));
        assert!(matches!(obj.sample(), Err(SceneError::InvalidSampling(_))));
        let wide = ParametricObject::plane(1.0, 1.0).with_sampling((-f64::MAX, f64::MAX), (0.0, 1.0), (1.0, 0.1));
        assert!(wide.sample().is_err());
        // right at the cap still samples
        let s = steps((0.0, 1.0), 1.0 / (MAX_STEPS - 1) as f64).unwrap();
        assert_eq!(s.len(), MAX_STEPS);
    }

    #[test]
    fn zero_step_is_rejected() {
        let obj = ParametricObject::cylinder(1.0, 1.0).with_sampling((0.0, 1.0), (0.0, 2.0 * PI), (0.0, 0.0));
        assert!(matches!(obj.sample(), Err(SceneError::InvalidSampling(_))));
        let obj = ParametricObject::cone(1.0, 1.0).with_sampling((1.0, 0.0), (0.0, 1.0), (0.1, 0.1));
        assert!(obj.sample().is_err());
    }
}

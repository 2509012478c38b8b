use std::ops::Mul;
use std::ops::Add;
use std::ops::Sub;
use std::ops::Neg;
use std::ops::Div;
use std::ops::Index;

pub const DEGENERATE_LENGTH: f64 = 1e-12;

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}
impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {x:0.0,y:0.0,z:0.0};
    pub const ONE: Vec3 = Vec3 {x:1.0,y:1.0,z:1.0};
    pub const RIGHT: Vec3 = Vec3 {x:1.0,y:0.0,z:0.0};
    pub const UP: Vec3 = Vec3 {x:0.0,y:1.0,z:0.0};
    pub const FORWARD: Vec3 = Vec3 {x:0.0,y:0.0,z:1.0};

    pub const fn new(x: f64, y: f64, z: f64) -> Vec3 {
        Vec3{ x, y, z }
    }
    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x +
        self.y * other.y +
        self.z * other.z
    }
    /// Right-handed cross product.
    pub fn cross(self, other: Vec3) -> Vec3 {
        let x = self.y * other.z - self.z * other.y;
        let y = self.z * other.x - self.x * other.z;
        let z = self.x * other.y - self.y * other.x;
        Vec3::new(x,y,z)
    }
    pub fn magn(&self) -> f64 {
        self.dot(*self).sqrt()
    }
    pub fn unit(self) -> Vec3 {
        self/self.magn()
    }
    /// Like [`Vec3::unit`], but gives `None` instead of NaNs for a zero-length vector.
    pub fn try_unit(self) -> Option<Vec3> {
        let magn = self.magn();
        if magn.is_finite() && magn > DEGENERATE_LENGTH {
            Some(self/magn)
        } else {
            None
        }
    }
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}
impl Index<usize> for Vec3 {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of range")
        }
    }
}
impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, other: f64) -> Vec3 {
        Vec3::new(self.x * other, self.y * other, self.z * other)
    }
}
impl Div<f64> for Vec3 {
    type Output = Vec3;
    fn div(self, other: f64) -> Vec3 {
        let factor = 1.0 / other;
        self * factor
    }
}
impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}
impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}
impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// A homogeneous 4x1 column `(x, y, z, w)`.
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}
impl Vec4 {
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Vec4 {
        Vec4{ x, y, z, w }
    }
    pub const fn point(v: Vec3) -> Vec4 {
        Vec4::new(v.x, v.y, v.z, 1.0)
    }
    pub const fn direction(v: Vec3) -> Vec4 {
        Vec4::new(v.x, v.y, v.z, 0.0)
    }
    pub fn xyz(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
    pub fn dot(self, other: Vec4) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }
}
impl Index<usize> for Vec4 {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            3 => &self.w,
            _ => panic!("Vec4 index out of range")
        }
    }
}
impl From<Vec3> for Vec4 {
    fn from(other: Vec3) -> Self {
        Vec4::point(other)
    }
}
impl Mul<f64> for Vec4 {
    type Output = Vec4;
    fn mul(self, other: f64) -> Vec4 {
        Vec4::new(self.x * other, self.y * other, self.z * other, self.w * other)
    }
}
impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, other: Vec4) -> Vec4 {
        Vec4::new(self.x + other.x, self.y + other.y, self.z + other.z, self.w + other.w)
    }
}
impl Sub for Vec4 {
    type Output = Vec4;
    fn sub(self, other: Vec4) -> Vec4 {
        Vec4::new(self.x - other.x, self.y - other.y, self.z - other.z, self.w - other.w)
    }
}

/// Row-major 4x4 matrix. Applied to column vectors, so `a * b` applies `b` first.
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Mat4 {
    pub rows: [[f64;4];4],
}
impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 { rows: [
        [1.0,0.0,0.0,0.0],
        [0.0,1.0,0.0,0.0],
        [0.0,0.0,1.0,0.0],
        [0.0,0.0,0.0,1.0],
    ]};

    pub const fn from_rows(rows: [[f64;4];4]) -> Mat4 {
        Mat4 { rows }
    }
    #[rustfmt::skip]
    pub const fn translation(x: f64, y: f64, z: f64) -> Mat4 {
        Mat4::from_rows([
            [1.0,0.0,0.0,x],
            [0.0,1.0,0.0,y],
            [0.0,0.0,1.0,z],
            [0.0,0.0,0.0,1.0],
        ])
    }
    #[rustfmt::skip]
    pub const fn scale(x: f64, y: f64, z: f64) -> Mat4 {
        Mat4::from_rows([
            [x,  0.0,0.0,0.0],
            [0.0,y,  0.0,0.0],
            [0.0,0.0,z,  0.0],
            [0.0,0.0,0.0,1.0],
        ])
    }
    #[rustfmt::skip]
    pub fn rotation_x(angle_rad: f64) -> Mat4 {
        let (s, c) = angle_rad.sin_cos();
        Mat4::from_rows([
            [1.0,0.0,0.0,0.0],
            [0.0,c,  -s, 0.0],
            [0.0,s,  c,  0.0],
            [0.0,0.0,0.0,1.0],
        ])
    }
    #[rustfmt::skip]
    pub fn rotation_y(angle_rad: f64) -> Mat4 {
        let (s, c) = angle_rad.sin_cos();
        Mat4::from_rows([
            [c,  0.0,s,  0.0],
            [0.0,1.0,0.0,0.0],
            [-s, 0.0,c,  0.0],
            [0.0,0.0,0.0,1.0],
        ])
    }
    pub fn row(&self, i: usize) -> Vec4 {
        let r = self.rows[i];
        Vec4::new(r[0], r[1], r[2], r[3])
    }
    pub fn col(&self, j: usize) -> Vec4 {
        Vec4::new(self.rows[0][j], self.rows[1][j], self.rows[2][j], self.rows[3][j])
    }
    pub fn transpose(&self) -> Mat4 {
        let mut rows = [[0.0;4];4];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = self.rows[j][i];
            }
        }
        Mat4 { rows }
    }
    fn zip_with(self, other: Mat4, f: impl Fn(f64, f64) -> f64) -> Mat4 {
        let mut rows = self.rows;
        for (row, other_row) in rows.iter_mut().zip(other.rows.iter()) {
            for (value, other_value) in row.iter_mut().zip(other_row.iter()) {
                *value = f(*value, *other_value);
            }
        }
        Mat4 { rows }
    }
}
impl Default for Mat4 {
    fn default() -> Self {
        Mat4::IDENTITY
    }
}
impl Index<(usize,usize)> for Mat4 {
    type Output = f64;
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.rows[i][j]
    }
}
impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, other: Vec4) -> Vec4 {
        Vec4::new(
            self.row(0).dot(other),
            self.row(1).dot(other),
            self.row(2).dot(other),
            self.row(3).dot(other),
        )
    }
}
impl Mul<Mat4> for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut rows = [[0.0;4];4];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = self.row(i).dot(other.col(j));
            }
        }
        Mat4 { rows }
    }
}
impl Mul<f64> for Mat4 {
    type Output = Mat4;
    fn mul(self, other: f64) -> Mat4 {
        let mut rows = self.rows;
        for value in rows.iter_mut().flatten() {
            *value *= other;
        }
        Mat4 { rows }
    }
}
impl Add for Mat4 {
    type Output = Mat4;
    fn add(self, other: Mat4) -> Mat4 {
        self.zip_with(other, |a, b| a + b)
    }
}
impl Sub for Mat4 {
    type Output = Mat4;
    fn sub(self, other: Mat4) -> Mat4 {
        self.zip_with(other, |a, b| a - b)
    }
}


#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}
impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const fn new(r: u8, g: u8, b: u8) -> Color
    { Color{ r, g, b } }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cross_is_right_handed() {
        assert_eq!(Vec3::RIGHT.cross(Vec3::UP), Vec3::FORWARD);
        assert_eq!(Vec3::UP.cross(Vec3::FORWARD), Vec3::RIGHT);
        assert_eq!(Vec3::FORWARD.cross(Vec3::RIGHT), Vec3::UP);
    }

    #[test]
    fn try_unit_rejects_zero() {
        assert_eq!(Vec3::ZERO.try_unit(), None);
        let u = Vec3::new(3.0,0.0,4.0).try_unit().unwrap();
        assert_abs_diff_eq!(u.magn(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(u.x, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn matrix_product_applies_right_operand_first() {
        let t = Mat4::translation(1.0, 0.0, 0.0);
        let s = Mat4::scale(2.0, 2.0, 2.0);
        let p = Vec4::point(Vec3::new(1.0, 1.0, 1.0));
        // scale then translate
        assert_eq!((t * s) * p, Vec4::new(3.0, 2.0, 2.0, 1.0));
        // translate then scale
        assert_eq!((s * t) * p, Vec4::new(4.0, 2.0, 2.0, 1.0));
        assert_eq!(t * (s * p), (t * s) * p);
    }

    #[test]
    fn directions_ignore_translation() {
        let t = Mat4::translation(5.0, 6.0, 7.0);
        let d = Vec4::direction(Vec3::UP);
        assert_eq!(t * d, d);
    }

    #[test]
    fn transpose_and_arithmetic() {
        let t = Mat4::translation(1.0, 2.0, 3.0);
        let tt = t.transpose();
        assert_eq!(tt[(3, 0)], 1.0);
        assert_eq!(tt[(3, 2)], 3.0);
        assert_eq!(tt.transpose(), t);
        assert_eq!(Mat4::IDENTITY * t, t);
        assert_eq!((t + t) - t, t);
        assert_eq!((t * 2.0)[(0, 3)], 2.0);
        assert_eq!((t * 2.0)[(3, 3)], 2.0);
    }

    #[test]
    fn rotations_turn_axes() {
        let half_turn = std::f64::consts::FRAC_PI_2;
        let z = Vec4::point(Vec3::FORWARD);
        let up = Mat4::rotation_x(-half_turn) * z;
        assert_abs_diff_eq!(up.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(up.z, 0.0, epsilon = 1e-12);
        let right = Mat4::rotation_y(half_turn) * z;
        assert_abs_diff_eq!(right.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(right.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn xyz_drops_w() {
        let p = Vec4::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(p.xyz(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p[3], 4.0);
        assert_eq!(Vec4::from(Vec3::ONE).w, 1.0);
    }
}

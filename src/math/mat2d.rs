use super::Vec2;
use bytemuck::{Pod, Zeroable};

/// A 2D affine matrix stored as the top two rows of a 3x3 homogeneous
/// matrix:
///
/// ```text
/// | a  b  tx |
/// | c  d  ty |
/// | 0  0  1  |
/// ```
///
/// `Mat2D::mul(self, rhs)` implements "apply right-operand first, then
/// left-operand": `(a.mul(b)).apply(v) == a.apply(b.apply(v))`.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Mat2D {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Mat2D {
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: 0.0, ty: 0.0 };

    #[must_use]
    pub const fn translation(t: Vec2) -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: t.x, ty: t.y }
    }

    #[must_use]
    pub fn rotation_degrees(degrees: f32) -> Self {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        Self { a: cos, b: -sin, c: sin, d: cos, tx: 0.0, ty: 0.0 }
    }

    #[must_use]
    pub const fn scale(s: Vec2) -> Self {
        Self { a: s.x, b: 0.0, c: 0.0, d: s.y, tx: 0.0, ty: 0.0 }
    }

    /// Concatenates `self` with `rhs`, applying `rhs` first.
    #[must_use]
    pub fn mul(self, rhs: Self) -> Self {
        Self {
            a: self.a * rhs.a + self.b * rhs.c,
            b: self.a * rhs.b + self.b * rhs.d,
            c: self.c * rhs.a + self.d * rhs.c,
            d: self.c * rhs.b + self.d * rhs.d,
            tx: self.a * rhs.tx + self.b * rhs.ty + self.tx,
            ty: self.c * rhs.tx + self.d * rhs.ty + self.ty,
        }
    }

    /// Maps a point through the full affine transform (translation included).
    #[must_use]
    pub fn apply_point(self, v: Vec2) -> Vec2 {
        Vec2::new(self.a * v.x + self.b * v.y + self.tx, self.c * v.x + self.d * v.y + self.ty)
    }

    /// Maps a displacement through the linear part only (no translation).
    #[must_use]
    pub fn apply_vector(self, v: Vec2) -> Vec2 {
        Vec2::new(self.a * v.x + self.b * v.y, self.c * v.x + self.d * v.y)
    }

    /// Builds a standard AE/Lottie per-layer local transform:
    /// `T(position) · R(rotationDeg) · S(scale/100) · T(-anchor)`.
    #[must_use]
    pub fn layer_local(position: Vec2, rotation_degrees: f32, scale_percent: Vec2, anchor: Vec2) -> Self {
        let t = Self::translation(position);
        let r = Self::rotation_degrees(rotation_degrees);
        let s = Self::scale(Vec2::new(scale_percent.x / 100.0, scale_percent.y / 100.0));
        let anchor_inv = Self::translation(Vec2::new(-anchor.x, -anchor.y));
        t.mul(r).mul(s).mul(anchor_inv)
    }

    /// The mapping from viewport pixel coordinates (origin top-left, Y
    /// down) to clip-space NDC (origin center, Y up). Affine, so it is
    /// representable as a [`Mat2D`] even though the shader-side MVP is a
    /// 4x4 matrix.
    #[must_use]
    pub fn viewport_to_ndc(pixel_size: (u32, u32)) -> Self {
        let w = pixel_size.0 as f32;
        let h = pixel_size.1 as f32;
        Self { a: 2.0 / w, b: 0.0, c: 0.0, d: -2.0 / h, tx: -1.0, ty: 1.0 }
    }

    /// Expands to a column-major 4x4 matrix (z/w passthrough) for upload
    /// as a shader `mat4x4<f32>` MVP uniform.
    #[must_use]
    pub fn to_mat4_cols(self) -> [f32; 16] {
        [
            self.a, self.c, 0.0, 0.0,
            self.b, self.d, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            self.tx, self.ty, 0.0, 1.0,
        ]
    }

    #[must_use]
    pub fn determinant(self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverts the matrix. Returns `None` for a singular (zero-area)
    /// transform.
    #[must_use]
    pub fn inverse(self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < f32::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let a = self.d * inv_det;
        let b = -self.b * inv_det;
        let c = -self.c * inv_det;
        let d = self.a * inv_det;
        let tx = -(a * self.tx + b * self.ty);
        let ty = -(c * self.tx + d * self.ty);
        Some(Self { a, b, c, d, tx, ty })
    }
}

impl Default for Mat2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

//! 2D affine transforms over logical pixels.
//!
//! An entity's geometry lives entirely in one of these: six active
//! coefficients applied to a fixed set of intrinsic corner points. The
//! coefficients are what gets persisted, so the layout here is stable.

/// An arbitrary affine transform. Units of output are logical pixels.
/// 0,0 is the canvas top left, +X right, +Y down.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    PartialOrd,
    bytemuck::Pod,
    bytemuck::Zeroable,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(C)]
pub struct Matrix {
    /// Column-major matrix elements.
    pub elements: [[f32; 2]; 3],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        elements: [[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]],
    };

    #[must_use]
    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            elements: [[1.0, 0.0], [0.0, 1.0], [dx, dy]],
        }
    }
    #[must_use]
    pub fn uniform_scale(scale: f32) -> Self {
        Self {
            elements: [[scale, 0.0], [0.0, scale], [0.0, 0.0]],
        }
    }
    /// Scale about a pivot point, which stays fixed.
    #[must_use]
    pub fn scale_about(sx: f32, sy: f32, [px, py]: [f32; 2]) -> Self {
        Self {
            elements: [[sx, 0.0], [0.0, sy], [px - sx * px, py - sy * py]],
        }
    }
    /// Rotation about a pivot, in degrees *CW* from positive X (+Y is down).
    #[must_use]
    pub fn rotation_about(degrees: f32, [px, py]: [f32; 2]) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            elements: [
                [cos, sin],
                [-sin, cos],
                [px - cos * px + sin * py, py - sin * px - cos * py],
            ],
        }
    }

    #[must_use]
    pub fn map_point(&self, [x, y]: [f32; 2]) -> [f32; 2] {
        let m = &self.elements;
        [
            m[0][0] * x + m[1][0] * y + m[2][0],
            m[0][1] * x + m[1][1] * y + m[2][1],
        ]
    }
    /// Map the four corner points of a quad.
    #[must_use]
    pub fn map_quad(&self, points: &[[f32; 2]; 4]) -> [[f32; 2]; 4] {
        points.map(|p| self.map_point(p))
    }
}

impl From<[[f32; 2]; 3]> for Matrix {
    fn from(elements: [[f32; 2]; 3]) -> Self {
        Self { elements }
    }
}
impl From<Matrix> for [[f32; 2]; 3] {
    fn from(value: Matrix) -> Self {
        value.elements
    }
}

impl std::ops::Mul for Matrix {
    type Output = Self;
    /// Composition: `(a * b)` maps a point through `b` first, then `a`.
    fn mul(self, rhs: Self) -> Self {
        let a = &self.elements;
        let linear = |[x, y]: [f32; 2]| -> [f32; 2] {
            [a[0][0] * x + a[1][0] * y, a[0][1] * x + a[1][1] * y]
        };
        Self {
            elements: [
                linear(rhs.elements[0]),
                linear(rhs.elements[1]),
                // Translation column goes through the full affine map.
                self.map_point(rhs.elements[2]),
            ],
        }
    }
}

/// Whether `point` lies inside the triangle `a`,`b`,`c` (inclusive of edges).
#[must_use]
pub fn point_in_triangle(point: [f32; 2], a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> bool {
    // Cross product of (q - p) and (r - p). The point is inside iff it sits on
    // the same side of all three edges.
    fn cross(p: [f32; 2], q: [f32; 2], r: [f32; 2]) -> f32 {
        (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
    }
    let d1 = cross(a, b, point);
    let d2 = cross(b, c, point);
    let d3 = cross(c, a, point);

    let any_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let any_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(any_negative && any_positive)
}

#[cfg(test)]
mod test {
    use super::{point_in_triangle, Matrix};

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-4 && (a[1] - b[1]).abs() < 1e-4
    }

    #[test]
    fn identity_maps_nothing() {
        let p = [12.5, -3.0];
        assert_eq!(Matrix::default().map_point(p), p);
    }

    #[test]
    fn rotation_is_clockwise_y_down() {
        let m = Matrix::rotation_about(90.0, [0.0, 0.0]);
        assert!(close(m.map_point([1.0, 0.0]), [0.0, 1.0]));
        assert!(close(m.map_point([0.0, 1.0]), [-1.0, 0.0]));
    }

    #[test]
    fn pivot_stays_fixed() {
        let pivot = [3.0, 7.0];
        assert!(close(
            Matrix::rotation_about(123.0, pivot).map_point(pivot),
            pivot
        ));
        assert!(close(
            Matrix::scale_about(2.0, 0.5, pivot).map_point(pivot),
            pivot
        ));
    }

    #[test]
    fn composition_order() {
        // (T * S)(p) scales first, translates second.
        let m = Matrix::translation(10.0, 20.0) * Matrix::uniform_scale(2.0);
        assert!(close(m.map_point([1.0, 1.0]), [12.0, 22.0]));

        // The other way around translates inside the scaled space.
        let m = Matrix::uniform_scale(2.0) * Matrix::translation(10.0, 20.0);
        assert!(close(m.map_point([1.0, 1.0]), [22.0, 42.0]));
    }

    #[test]
    fn quad_corners() {
        let m = Matrix::translation(5.0, 0.0);
        let quad = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [0.0, 1.0]];
        assert_eq!(
            m.map_quad(&quad),
            [[5.0, 0.0], [7.0, 0.0], [7.0, 1.0], [5.0, 1.0]]
        );
    }

    #[test]
    fn triangle_containment() {
        let (a, b, c) = ([0.0, 0.0], [4.0, 0.0], [0.0, 4.0]);
        assert!(point_in_triangle([1.0, 1.0], a, b, c));
        // Edges count as inside.
        assert!(point_in_triangle([2.0, 0.0], a, b, c));
        assert!(!point_in_triangle([3.0, 3.0], a, b, c));
        assert!(!point_in_triangle([-0.1, 0.0], a, b, c));
    }
}

use crate::{EulerRot, Mat3, Mat4, Quat, Vec3};

/// Determinant magnitude below which a linear block is treated as singular.
pub const SINGULAR_EPSILON: f32 = 1e-6;

/// Rigid transform with uniform or non-uniform scale (Euler XYZ).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians (XYZ order).
    pub rotation_euler: Vec3,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn from_trs(translation: Vec3, rotation_euler: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation_euler,
            scale,
        }
    }

    /// Pure uniform scale, typically used to bring an authored model into
    /// working units.
    #[inline]
    pub fn uniform_scale(factor: f32) -> Self {
        Self {
            scale: Vec3::splat(factor),
            ..Self::identity()
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Build matrix = T * R * S (column-major Mat4 per glam).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        let q = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation_euler.x,
            self.rotation_euler.y,
            self.rotation_euler.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, q, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Inverse-transpose of the upper 3x3 block of `model`.
///
/// Normals transformed by this matrix stay perpendicular to their surface
/// under non-uniform scale and shear. A singular block (e.g. zero scale on
/// one axis) has no inverse; the plain upper 3x3 is returned instead so the
/// result never contains NaN/Inf.
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    let linear = Mat3::from_mat4(*model);
    if linear.determinant().abs() < SINGULAR_EPSILON {
        linear
    } else {
        linear.inverse().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn normal_matrix_of_rotation_is_rotation() {
        let m = Transform::from_trs(Vec3::ZERO, vec3(0.3, 1.1, -0.4), Vec3::ONE).matrix();
        let n = normal_matrix(&m);
        assert!(n.abs_diff_eq(Mat3::from_mat4(m), 1e-5));
    }

    #[test]
    fn normal_matrix_ignores_translation() {
        let m = Transform::from_translation(vec3(5.0, -3.0, 9.0)).matrix();
        assert_eq!(normal_matrix(&m), Mat3::IDENTITY);
    }

    #[test]
    fn normal_matrix_inverts_non_uniform_scale() {
        let m = Transform::from_trs(Vec3::ZERO, Vec3::ZERO, vec3(2.0, 1.0, 4.0)).matrix();
        let n = normal_matrix(&m);
        assert!(n.abs_diff_eq(Mat3::from_diagonal(vec3(0.5, 1.0, 0.25)), 1e-6));
    }

    #[test]
    fn singular_block_falls_back_to_linear_part() {
        let m = Transform::from_trs(Vec3::ZERO, Vec3::ZERO, vec3(1.0, 0.0, 1.0)).matrix();
        let n = normal_matrix(&m);
        assert!(n.to_cols_array().iter().all(|f| f.is_finite()));
        assert_eq!(n, Mat3::from_mat4(m));
    }
}

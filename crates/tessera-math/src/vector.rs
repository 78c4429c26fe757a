use glam::DVec3;

use crate::Axis;

/// Helpers on `DVec3` used by movement code.
pub trait VecExt {
    /// Squared length of the XZ projection.
    fn horizontal_distance_sqr(self) -> f64;
    /// Length of the XZ projection.
    fn horizontal_distance(self) -> f64;
    /// Copy with one component replaced.
    fn with_axis(self, axis: Axis, value: f64) -> DVec3;
    /// Component-wise multiply by `(fx, fy, fz)`.
    fn scale3(self, fx: f64, fy: f64, fz: f64) -> DVec3;
}

impl VecExt for DVec3 {
    fn horizontal_distance_sqr(self) -> f64 {
        self.x * self.x + self.z * self.z
    }

    fn horizontal_distance(self) -> f64 {
        self.horizontal_distance_sqr().sqrt()
    }

    fn with_axis(self, axis: Axis, value: f64) -> DVec3 {
        match axis {
            Axis::X => DVec3::new(value, self.y, self.z),
            Axis::Y => DVec3::new(self.x, value, self.z),
            Axis::Z => DVec3::new(self.x, self.y, value),
        }
    }

    fn scale3(self, fx: f64, fy: f64, fz: f64) -> DVec3 {
        DVec3::new(self.x * fx, self.y * fy, self.z * fz)
    }
}

/// Unit look vector for a pitch/yaw pair in degrees.
///
/// Yaw 0 looks toward +Z, yaw 90 toward -X; positive pitch looks down.
pub fn view_vector(pitch: f32, yaw: f32) -> DVec3 {
    let pitch = (pitch as f64).to_radians();
    let yaw = -(yaw as f64).to_radians();
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    let (sin_pitch, cos_pitch) = pitch.sin_cos();
    DVec3::new(sin_yaw * cos_pitch, -sin_pitch, cos_yaw * cos_pitch)
}

/// Wrap an angle into `[-180, 180)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_distance_ignores_y() {
        let v = DVec3::new(3.0, 100.0, 4.0);
        assert_eq!(v.horizontal_distance(), 5.0);
    }

    #[test]
    fn test_view_vector_cardinals() {
        let south = view_vector(0.0, 0.0);
        assert!((south - DVec3::Z).length() < 1e-9);
        let west = view_vector(0.0, 90.0);
        assert!((west + DVec3::X).length() < 1e-9);
        let down = view_vector(90.0, 0.0);
        assert!((down + DVec3::Y).length() < 1e-9);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(45.0), 45.0);
    }
}

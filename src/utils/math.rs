// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Matrix4, Rotation3, Translation3, Vector3};

/// Quantize a value to an integer at a fixed number of decimal places.
///
/// Used for hashable keys; `-0.0` and `0.0` land in the same bucket.
pub fn quantize(value: f64, decimals: u32) -> i64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() as i64
}

/// Rotation matrix for Euler angles (radians) applied in XYZ order.
///
/// Matches the common scene-graph convention `R = Rx * Ry * Rz`.
pub fn euler_xyz_to_rotation(angles: &Vector3<f64>) -> Rotation3<f64> {
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), angles.x);
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), angles.y);
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), angles.z);
    rx * ry * rz
}

/// Recover XYZ-order Euler angles from a rotation matrix
pub fn rotation_to_euler_xyz(rotation: &Rotation3<f64>) -> Vector3<f64> {
    let m = rotation.matrix();
    let m11 = m[(0, 0)];
    let m12 = m[(0, 1)];
    let m13 = m[(0, 2)];
    let m22 = m[(1, 1)];
    let m23 = m[(1, 2)];
    let m32 = m[(2, 1)];
    let m33 = m[(2, 2)];

    let y = m13.clamp(-1.0, 1.0).asin();
    if m13.abs() < 0.999_999_9 {
        Vector3::new((-m23).atan2(m33), y, (-m12).atan2(m11))
    } else {
        // Gimbal lock: fold everything into x
        Vector3::new(m32.atan2(m22), y, 0.0)
    }
}

/// Translation followed by an XYZ Euler rotation, as a homogeneous matrix
pub fn placement_matrix(position: &Vector3<f64>, rotation: &Vector3<f64>) -> Matrix4<f64> {
    Translation3::from(*position).to_homogeneous() * euler_xyz_to_rotation(rotation).to_homogeneous()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(1.234_56, 4), 12346);
        assert_eq!(quantize(-0.000_01, 4), 0);
        assert_eq!(quantize(0.000_01, 4), quantize(-0.000_01, 4));
    }

    #[test]
    fn test_euler_round_trip() {
        for angles in [
            Vector3::new(PI, 0.0, 0.0),
            Vector3::new(0.0, 0.0, FRAC_PI_2),
            Vector3::new(-FRAC_PI_2, 0.0, 0.0),
            Vector3::new(0.3, -0.2, 1.1),
        ] {
            let rotation = euler_xyz_to_rotation(&angles);
            let recovered = rotation_to_euler_xyz(&rotation);
            let again = euler_xyz_to_rotation(&recovered);
            assert!((rotation.matrix() - again.matrix()).norm() < 1e-9);
        }
    }

    #[test]
    fn test_quarter_turn_about_z_maps_y_to_negative_x() {
        let rotation = euler_xyz_to_rotation(&Vector3::new(0.0, 0.0, FRAC_PI_2));
        let v = rotation * Vector3::y();
        assert!((v - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
    }
}

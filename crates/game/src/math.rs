//! Planar angle helpers. Yaw is measured in degrees clockwise from +Z, so
//! yaw 0 faces +Z and yaw 90 faces +X.

use glam::Vec3;

pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

pub fn yaw_from_direction(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z).to_degrees().rem_euclid(360.0)
}

pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    let r = yaw.to_radians();
    Vec3::new(r.sin(), 0.0, r.cos())
}

/// Shortest signed difference `target - current`, in [-180, 180].
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

pub fn move_towards_angle(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = delta_angle(current, target);
    if delta.abs() <= max_delta {
        return target;
    }
    current + max_delta * delta.signum()
}

/// Unsigned angle between two vectors in degrees. Zero-length input
/// yields 0.
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let (a, b) = (a.normalize_or_zero(), b.normalize_or_zero());
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return 0.0;
    }
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}

pub fn reflect(v: Vec3, normal: Vec3) -> Vec3 {
    v - 2.0 * v.dot(normal) * normal
}

pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    v - v.dot(normal) * normal
}

use glam::{Quat, Vec3};
use rand::Rng;

/// Sample a launch velocity: each axis uniform in a fixed range
/// (`[-1, 1)` for x/z, `[-0.5, 1.5)` for y so launches lean upward),
/// normalized and scaled to `speed`.
pub fn launch_velocity<R: Rng + ?Sized>(rng: &mut R, speed: f32) -> Vec3 {
    let dir = Vec3::new(
        rng.gen::<f32>() * 2.0 - 1.0,
        rng.gen::<f32>() * 2.0 - 0.5,
        rng.gen::<f32>() * 2.0 - 1.0,
    );
    dir.normalize_or_zero() * speed
}

/// Three independent channels, each uniform in 0..=255.
pub fn random_rgb<R: Rng + ?Sized>(rng: &mut R) -> [u8; 3] {
    [rng.gen(), rng.gen(), rng.gen()]
}

/// Point on a horizontal circle of `radius` around `center` at `angle` radians.
pub fn ring_point(center: Vec3, radius: f32, angle: f32) -> Vec3 {
    Vec3::new(
        center.x + radius * angle.cos(),
        center.y,
        center.z + radius * angle.sin(),
    )
}

/// Sample a rising logarithmic spiral (`r = radius * e^(0.15 t)`).
///
/// Returns `segments + 1` points climbing `height` units above
/// `origin.y + start_y` over `turns` revolutions.
pub fn spiral_points(
    turns: f32,
    height: f32,
    radius: f32,
    segments: u32,
    start_y: f32,
    origin: Vec3,
) -> Vec<Vec3> {
    let segments = segments.max(1);
    let mut points = Vec::with_capacity(segments as usize + 1);
    for i in 0..=segments {
        let frac = i as f32 / segments as f32;
        let t = frac * std::f32::consts::TAU * turns;
        let r = radius * (0.15 * t).exp();
        points.push(Vec3::new(
            r * t.cos() + origin.x,
            start_y + height * frac + origin.y,
            r * t.sin() + origin.z,
        ));
    }
    points
}

/// Advance an orientation by angular velocity `omega` (rad/s) over `dt`.
pub fn integrate_rotation(rotation: Quat, omega: Vec3, dt: f32) -> Quat {
    let angle = omega.length() * dt;
    if angle <= f32::EPSILON {
        return rotation;
    }
    (Quat::from_axis_angle(omega.normalize(), angle) * rotation).normalize()
}

/// Per-step damping factor, `(1 - damping)^dt`, clamped to `[0, 1]`.
pub fn damping_factor(damping: f32, dt: f32) -> f32 {
    (1.0 - damping.clamp(0.0, 1.0)).powf(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::f32::consts::PI;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    // ── launch_velocity ──

    #[test]
    fn test_launch_velocity_has_requested_speed() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..200 {
            let v = launch_velocity(&mut rng, 4.0);
            assert!((v.length() - 4.0).abs() < 1e-4, "speed was {}", v.length());
        }
    }

    #[test]
    fn test_launch_velocity_biased_upward() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mean_y: f32 = (0..2000)
            .map(|_| launch_velocity(&mut rng, 1.0).y)
            .sum::<f32>()
            / 2000.0;
        assert!(mean_y > 0.1, "mean y should lean upward, got {mean_y}");
    }

    #[test]
    fn test_launch_velocity_zero_speed() {
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(launch_velocity(&mut rng, 0.0), Vec3::ZERO);
    }

    // ── ring_point ──

    #[test]
    fn test_ring_point_quarter_turn() {
        let p = ring_point(Vec3::new(0.0, 6.0, 0.0), 2.0, PI / 2.0);
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.y, 6.0));
        assert!(approx_eq(p.z, 2.0));
    }

    #[test]
    fn test_ring_point_keeps_radius() {
        let center = Vec3::new(1.0, 0.0, -3.0);
        for i in 0..16 {
            let p = ring_point(center, 3.0, i as f32 * 0.4);
            let d = Vec3::new(p.x - center.x, 0.0, p.z - center.z).length();
            assert!(approx_eq(d, 3.0));
        }
    }

    // ── spiral_points ──

    #[test]
    fn test_spiral_point_count_and_height() {
        let pts = spiral_points(6.0, 12.0, 2.0, 300, 0.0, Vec3::new(0.0, 100.0, -5.0));
        assert_eq!(pts.len(), 301);
        assert!(approx_eq(pts[0].y, 100.0));
        assert!((pts[300].y - 112.0).abs() < 1e-3);
    }

    #[test]
    fn test_spiral_radius_grows() {
        let pts = spiral_points(2.0, 4.0, 1.0, 100, 0.0, Vec3::ZERO);
        let r_start = Vec3::new(pts[0].x, 0.0, pts[0].z).length();
        let r_end = Vec3::new(pts[100].x, 0.0, pts[100].z).length();
        assert!(approx_eq(r_start, 1.0));
        assert!(r_end > r_start);
    }

    #[test]
    fn test_spiral_zero_segments_clamped() {
        assert_eq!(spiral_points(1.0, 1.0, 1.0, 0, 0.0, Vec3::ZERO).len(), 2);
    }

    // ── integrate_rotation ──

    #[test]
    fn test_integrate_rotation_zero_omega() {
        let q = Quat::from_rotation_y(0.3);
        assert_eq!(integrate_rotation(q, Vec3::ZERO, 0.1), q);
    }

    #[test]
    fn test_integrate_rotation_half_turn() {
        let q = integrate_rotation(Quat::IDENTITY, Vec3::new(0.0, PI, 0.0), 1.0);
        let expected = Quat::from_rotation_y(PI);
        assert!(q.dot(expected).abs() > 1.0 - 1e-4);
    }

    // ── damping_factor ──

    #[test]
    fn test_damping_factor_range() {
        assert!(approx_eq(damping_factor(0.0, 0.5), 1.0));
        assert!(approx_eq(damping_factor(1.0, 0.5), 0.0));
        let f = damping_factor(0.4, 1.0 / 60.0);
        assert!(f > 0.99 && f < 1.0);
    }
}

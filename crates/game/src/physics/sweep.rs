use glam::Vec3;

/// First contact of a swept sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    pub distance: f32,
    /// Surface normal of the obstacle, pointing back toward the sphere.
    pub normal: Vec3,
}

/// Static-obstacle oracle used by movement, projectiles and the pushable
/// object. A sphere that already overlaps an obstacle reports a hit at
/// distance 0.
pub trait SweepQuery {
    fn sweep_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<SweepHit>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Solid half-space `{ p : (p - point) . normal <= 0 }`.
    #[derive(Debug, Clone, Copy)]
    pub struct HalfSpace {
        pub point: Vec3,
        pub normal: Vec3,
    }

    impl HalfSpace {
        pub fn new(point: Vec3, normal: Vec3) -> Self {
            Self {
                point,
                normal: normal.normalize(),
            }
        }

        /// How far a sphere at `center` reaches into the solid.
        pub fn penetration(&self, center: Vec3, radius: f32) -> f32 {
            radius - (center - self.point).dot(self.normal)
        }
    }

    /// Exact analytic oracle over a handful of half-spaces.
    #[derive(Debug, Clone, Default)]
    pub struct Walls(pub Vec<HalfSpace>);

    impl SweepQuery for Walls {
        fn sweep_sphere(
            &self,
            origin: Vec3,
            radius: f32,
            direction: Vec3,
            max_distance: f32,
        ) -> Option<SweepHit> {
            let dir = direction.normalize_or_zero();
            self.0
                .iter()
                .filter_map(|wall| {
                    let gap = -wall.penetration(origin, radius);
                    if gap < 0.0 {
                        return Some(SweepHit {
                            distance: 0.0,
                            normal: wall.normal,
                        });
                    }
                    let approach = -dir.dot(wall.normal);
                    if approach <= 0.0 {
                        return None;
                    }
                    let t = gap / approach;
                    (t <= max_distance).then_some(SweepHit {
                        distance: t,
                        normal: wall.normal,
                    })
                })
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
        }
    }

    #[test]
    fn wall_oracle_reports_first_contact() {
        let walls = Walls(vec![HalfSpace::new(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X)]);
        let hit = walls
            .sweep_sphere(Vec3::ZERO, 0.5, Vec3::X, 10.0)
            .unwrap();
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::NEG_X);

        assert!(walls.sweep_sphere(Vec3::ZERO, 0.5, Vec3::X, 4.0).is_none());
        assert!(walls.sweep_sphere(Vec3::ZERO, 0.5, Vec3::Z, 100.0).is_none());
    }
}

use glam::Vec3;

use crate::math::{forward_from_yaw, planar, yaw_from_direction};
use crate::player::try_push;
use crate::simulation::Projectile;

use super::{EncounterContext, Progress};

/// Within this planar distance the boss deals contact damage.
pub const BOSS_CONTACT_RANGE: f32 = 2.0;
/// Player projectiles closer than this hit the boss.
pub const BOSS_HIT_RADIUS: f32 = 3.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Boss {
    pub health: i32,
    pub max_health: i32,
    pub move_speed: f32,
    pub shoot_interval: f32,
    pub shoot_timer: f32,
    pub projectile_count: u32,
    pub defeated: bool,
}

impl Boss {
    pub fn new(max_health: i32, move_speed: f32, shoot_interval: f32, projectile_count: u32) -> Self {
        Self {
            health: max_health,
            max_health,
            move_speed,
            shoot_interval,
            shoot_timer: 0.0,
            projectile_count,
            defeated: false,
        }
    }

    /// Health never drops below zero; the kill is noticed on the next update.
    pub fn take_damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }

    pub(super) fn update(
        &mut self,
        position: &mut Vec3,
        yaw: &mut f32,
        ctx: &mut EncounterContext<'_>,
    ) -> Progress {
        if self.health <= 0 {
            return Progress::Completed;
        }

        let target = ctx
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_alive())
            .map(|(i, p)| (i, planar(p.position - *position).length()))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((index, distance)) = target {
            let direction = planar(ctx.players[index].position - *position).normalize_or_zero();
            *position += direction * self.move_speed * ctx.dt;
            if direction != Vec3::ZERO {
                *yaw = yaw_from_direction(direction);
            }

            if distance < BOSS_CONTACT_RANGE {
                let knockback = if direction == Vec3::ZERO {
                    forward_from_yaw(*yaw)
                } else {
                    direction
                };
                let victim = &mut ctx.players[index];
                victim.apply_damage(ctx.balance.boss_contact_damage);
                victim.position =
                    try_push(victim.position, knockback * ctx.balance.boss_knockback, ctx.obstacles);
            }
        }

        self.shoot_timer -= ctx.dt;
        if self.shoot_timer <= 0.0 {
            self.shoot_timer = self.shoot_interval;
            self.fire_volley(*position, ctx);
        }

        Progress::Ongoing
    }

    fn fire_volley(&self, position: Vec3, ctx: &mut EncounterContext<'_>) {
        let count = self.projectile_count.max(1);
        let step = 360.0 / count as f32;
        let origin = position + Vec3::Y;
        for i in 0..count {
            let angle = (i as f32 * step).to_radians();
            let direction = Vec3::new(angle.cos(), 0.0, angle.sin());
            ctx.boss_projectiles.push(Projectile::boss(
                origin,
                direction,
                ctx.balance.boss_projectile_damage,
            ));
        }
        log::debug!("boss fired a volley of {}", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::testing::{Harness, player_at};

    const DT: f32 = 1.0 / 60.0;

    fn boss() -> Boss {
        Boss::new(500, 3.0, 2.0, 12)
    }

    #[test]
    fn chases_nearest_living_player() {
        let mut far = player_at(0, Vec3::new(0.0, 0.0, 20.0));
        let mut near = player_at(1, Vec3::new(8.0, 0.0, 0.0));
        near.dead = true;
        near.health = 0;
        far.aim = far.position;

        let mut harness = Harness::new(vec![far, near]);
        let mut boss = boss();
        let mut position = Vec3::ZERO;
        let mut yaw = 90.0;
        boss.update(&mut position, &mut yaw, &mut harness.ctx(DT));

        assert!((position.z - 3.0 * DT).abs() < 1e-5);
        assert!(position.x.abs() < 1e-6);
        assert!(yaw.abs() < 1e-3);
    }

    #[test]
    fn first_update_fires_radial_volley() {
        let mut harness = Harness::new(vec![player_at(0, Vec3::new(0.0, 0.0, 10.0))]);
        let mut boss = boss();
        let (mut position, mut yaw) = (Vec3::ZERO, 0.0);
        boss.update(&mut position, &mut yaw, &mut harness.ctx(DT));

        assert_eq!(harness.boss_projectiles.len(), 12);
        assert!(harness.boss_projectiles[0].direction.abs_diff_eq(Vec3::X, 1e-5));
        assert!(harness.boss_projectiles[3].direction.abs_diff_eq(Vec3::Z, 1e-5));
        assert!((harness.boss_projectiles[0].position.y - 1.0).abs() < 1e-6);
        assert!((boss.shoot_timer - 2.0).abs() < 1e-6);

        boss.update(&mut position, &mut yaw, &mut harness.ctx(DT));
        assert_eq!(harness.boss_projectiles.len(), 12);
    }

    #[test]
    fn contact_damages_and_knocks_back() {
        let mut harness = Harness::new(vec![player_at(0, Vec3::new(0.0, 0.0, 1.5))]);
        let mut boss = boss();
        boss.shoot_timer = 10.0;
        let (mut position, mut yaw) = (Vec3::ZERO, 0.0);
        boss.update(&mut position, &mut yaw, &mut harness.ctx(DT));

        let player = &harness.players[0];
        assert_eq!(player.health, player.stats.max_health - 30);
        assert!((player.position.z - 6.5).abs() < 1e-4);
    }

    #[test]
    fn overkill_clamps_and_completes_next_update() {
        let mut harness = Harness::new(vec![player_at(0, Vec3::new(0.0, 0.0, 10.0))]);
        let mut boss = boss();
        boss.take_damage(490);
        boss.take_damage(33);
        assert_eq!(boss.health, 0);

        let (mut position, mut yaw) = (Vec3::ZERO, 0.0);
        assert_eq!(
            boss.update(&mut position, &mut yaw, &mut harness.ctx(DT)),
            Progress::Completed
        );
        assert_eq!(position, Vec3::ZERO);
    }
}

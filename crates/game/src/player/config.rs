use serde::{Deserialize, Serialize};

/// Every gameplay tuning number in one place. Missing fields in a RON file
/// fall back to these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub move_speed: f32,
    pub player_radius: f32,

    pub melee_base_damage: i32,
    pub melee_damage_per_level: i32,
    pub melee_cooldown: f32,
    pub melee_radius: f32,
    pub melee_angle: f32,

    pub ranged_damage: i32,
    pub ranged_base_cooldown: f32,
    pub ranged_cooldown_per_level: f32,
    pub projectile_speed: f32,

    pub base_health: i32,
    pub health_per_level: i32,

    pub heal_base_amount: i32,
    pub heal_per_level: i32,
    pub heal_cooldown: f32,
    pub heal_range: f32,

    pub boss_health: i32,
    pub boss_move_speed: f32,
    pub boss_contact_damage: i32,
    pub boss_knockback: f32,
    pub boss_projectile_damage: i32,
    pub boss_projectile_speed: f32,
    pub boss_shoot_interval: f32,
    pub boss_projectile_count: u32,

    pub object_push_force: f32,
    pub object_radius: f32,
    pub poison_interval: f32,

    pub sequence_show_interval: f32,
    pub sequence_base_length: usize,
    pub sequence_fail_damage: i32,
    pub sequence_round_delay: f32,

    pub beam_tracking_speed: f32,
    pub plate_charge_speed: f32,
    pub beam_length: f32,
    pub beam_width_angle: f32,
    pub beam_damage: i32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            player_radius: 0.8,

            melee_base_damage: 20,
            melee_damage_per_level: 10,
            melee_cooldown: 0.8,
            melee_radius: 2.5,
            melee_angle: 90.0,

            ranged_damage: 15,
            ranged_base_cooldown: 1.0,
            ranged_cooldown_per_level: 0.2,
            projectile_speed: 12.0,

            base_health: 100,
            health_per_level: 25,

            heal_base_amount: 30,
            heal_per_level: 15,
            heal_cooldown: 10.0,
            heal_range: 4.0,

            boss_health: 500,
            boss_move_speed: 3.0,
            boss_contact_damage: 30,
            boss_knockback: 5.0,
            boss_projectile_damage: 15,
            boss_projectile_speed: 8.0,
            boss_shoot_interval: 2.0,
            boss_projectile_count: 12,

            object_push_force: 2.0,
            object_radius: 1.0,
            poison_interval: 1.0,

            sequence_show_interval: 1.0,
            sequence_base_length: 3,
            sequence_fail_damage: 20,
            sequence_round_delay: 2.0,

            beam_tracking_speed: 15.0,
            plate_charge_speed: 15.0,
            beam_length: 20.0,
            beam_width_angle: 10.0,
            beam_damage: 1,
        }
    }
}

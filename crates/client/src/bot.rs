use glam::Vec3;

use vanguard::lobby::{LoadoutTrack, LobbyAction};
use vanguard::net::{EncounterState, PlayerState};
use vanguard::{ClientPhase, ClientSession, SnapshotView};

use crate::input::InputState;

/// Closer than this to the objective the bot stops walking and swings.
const MELEE_DISTANCE: f32 = 3.0;
/// Teammates under this share of their health get healed.
const HEAL_THRESHOLD: f32 = 0.5;
const READY_RETRY: f32 = 1.0;
const REPORT_INTERVAL: f32 = 1.0;

/// Scripted participant: configures its loadout, readies up and then walks
/// at whatever encounter is active.
pub struct Bot {
    upgrades: Vec<LoadoutTrack>,
    configured: bool,
    ready_timer: f32,
    report_timer: f32,
}

impl Bot {
    pub fn new(upgrades: Vec<LoadoutTrack>) -> Self {
        Self {
            upgrades,
            configured: false,
            ready_timer: 0.0,
            report_timer: 0.0,
        }
    }

    /// Drives the client for one tick, before the session itself ticks.
    pub fn update(&mut self, client: &mut ClientSession, dt: f32) {
        match client.phase() {
            ClientPhase::Lobby(_) => self.lobby(client, dt),
            ClientPhase::InMatch { view, .. } => {
                let input = plan(view);
                self.report(view, dt);
                client.set_input(input.to_command());
            }
            _ => {}
        }
    }

    fn lobby(&mut self, client: &mut ClientSession, dt: f32) {
        let Some(entry) = client.local_entry() else {
            return;
        };
        let ready = entry.ready;

        if !self.configured {
            for track in &self.upgrades {
                client.lobby_action(LobbyAction::Upgrade(*track));
            }
            self.configured = true;
        }

        self.ready_timer -= dt;
        if !ready && self.ready_timer <= 0.0 {
            client.lobby_action(LobbyAction::ToggleReady);
            self.ready_timer = READY_RETRY;
        }
    }

    fn report(&mut self, view: &SnapshotView, dt: f32) {
        self.report_timer -= dt;
        if self.report_timer > 0.0 {
            return;
        }
        self.report_timer = REPORT_INTERVAL;

        let Some(state) = view.latest() else {
            return;
        };
        let health = view
            .local_player()
            .map(|p| format!("{}/{}", p.health, p.max_health))
            .unwrap_or_else(|| "-".to_string());
        let encounter = state
            .encounter
            .as_ref()
            .map(|e| format!("#{} kind {}", e.id, e.detail.kind_tag()))
            .unwrap_or_else(|| "none".to_string());
        log::info!(
            "hp {}  players {}  projectiles {}/{}  encounter {}",
            health,
            state.players.len(),
            state.projectiles.len(),
            state.boss_projectiles.len(),
            encounter
        );
    }
}

/// Input for the current snapshot: heal a hurt teammate, otherwise close
/// in on the active encounter and attack it.
pub fn plan(view: &SnapshotView) -> InputState {
    let Some(me) = view.local_player() else {
        return InputState::default();
    };
    if me.dead {
        return InputState::default();
    }
    let position = Vec3::new(me.x, 0.0, me.z);

    if let Some(target) = hurt_teammate(view, me) {
        return InputState {
            aim: Vec3::new(target.x, 0.0, target.z),
            move_direction: towards(position, Vec3::new(target.x, 0.0, target.z)),
            heal_target: Some(target.slot),
            ..Default::default()
        };
    }

    let Some(encounter) = view.active_encounter().filter(|e| !e.completed) else {
        return InputState {
            aim: position + Vec3::Z,
            move_direction: Vec3::Z,
            ..Default::default()
        };
    };

    let objective = objective_position(encounter);
    let distance = (objective - position).length();
    InputState {
        aim: objective,
        move_direction: if distance > MELEE_DISTANCE {
            towards(position, objective)
        } else {
            Vec3::ZERO
        },
        melee: distance <= MELEE_DISTANCE,
        ranged: distance > MELEE_DISTANCE,
        heal_target: None,
    }
}

fn hurt_teammate<'a>(view: &'a SnapshotView, me: &PlayerState) -> Option<&'a PlayerState> {
    if me.heal_cooldown > 0.0 {
        return None;
    }
    view.latest()?
        .players
        .iter()
        .filter(|p| p.slot != me.slot && p.max_health > 0)
        .filter(|p| (p.health as f32) < p.max_health as f32 * HEAL_THRESHOLD)
        .min_by_key(|p| p.health)
}

fn objective_position(encounter: &EncounterState) -> Vec3 {
    Vec3::new(encounter.x, 0.0, encounter.z)
}

fn towards(from: Vec3, to: Vec3) -> Vec3 {
    (to - from).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use vanguard::net::{EncounterDetail, GameState};
    use vanguard::snapshot::CooldownLimits;

    use super::*;

    fn player(slot: i32, x: f32, z: f32, health: i32) -> PlayerState {
        PlayerState {
            slot,
            x,
            z,
            rotation_y: 0.0,
            health,
            max_health: 100,
            dead: health == 0,
            melee_cooldown: 0.0,
            ranged_cooldown: 0.0,
            heal_cooldown: 0.0,
        }
    }

    fn view(players: Vec<PlayerState>, boss_at: Option<(f32, f32)>) -> SnapshotView {
        let mut view = SnapshotView::new(Some(0), CooldownLimits::default());
        view.apply(GameState {
            players,
            projectiles: Vec::new(),
            encounter: boss_at.map(|(x, z)| EncounterState {
                id: 0,
                completed: false,
                x,
                z,
                rotation_y: 0.0,
                detail: EncounterDetail::Boss {
                    health: 500,
                    max_health: 500,
                },
            }),
            boss_projectiles: Vec::new(),
        });
        view
    }

    #[test]
    fn far_boss_is_approached_and_shot() {
        let input = plan(&view(vec![player(0, 0.0, 0.0, 100)], Some((0.0, 10.0))));
        assert!(input.move_direction.abs_diff_eq(Vec3::Z, 1e-5));
        assert!(input.ranged);
        assert!(!input.melee);
    }

    #[test]
    fn near_boss_is_hit_in_melee() {
        let input = plan(&view(vec![player(0, 0.0, 0.0, 100)], Some((2.0, 0.0))));
        assert_eq!(input.move_direction, Vec3::ZERO);
        assert!(input.melee);
        assert_eq!(input.aim, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn hurt_teammate_gets_healed_first() {
        let players = vec![player(0, 0.0, 0.0, 100), player(1, 2.0, 0.0, 30)];
        let input = plan(&view(players, Some((0.0, 10.0))));
        assert_eq!(input.heal_target, Some(1));
    }

    #[test]
    fn dead_bot_does_nothing() {
        let input = plan(&view(vec![player(0, 0.0, 0.0, 0)], Some((0.0, 10.0))));
        assert_eq!(input.to_command().action, vanguard::InputCommand::ACTION_NONE);
        assert_eq!(input.move_direction, Vec3::ZERO);
    }
}

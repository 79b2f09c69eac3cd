use crate::lobby::{Loadout, LoadoutTrack};
use crate::net::{EncounterState, GameState, PlayerState, RosterEntry};
use crate::player::BalanceConfig;

/// Full cooldown durations for one player, used to normalise the timers a
/// snapshot carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CooldownLimits {
    pub melee: f32,
    pub ranged: f32,
    pub heal: f32,
}

impl CooldownLimits {
    pub fn for_loadout(loadout: &Loadout, balance: &BalanceConfig) -> Self {
        let ranged_level = f32::from(loadout.level(LoadoutTrack::Ranged));
        Self {
            melee: balance.melee_cooldown,
            ranged: balance.ranged_base_cooldown - ranged_level * balance.ranged_cooldown_per_level,
            heal: balance.heal_cooldown,
        }
    }

    pub fn for_roster_entry(entry: &RosterEntry, balance: &BalanceConfig) -> Self {
        Self::for_loadout(&Loadout::from_wire(entry.loadout), balance)
    }
}

impl Default for CooldownLimits {
    fn default() -> Self {
        Self::for_loadout(&Loadout::default(), &BalanceConfig::default())
    }
}

/// Remaining share of each cooldown, 0 = ready, 1 = just used.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CooldownFractions {
    pub melee: f32,
    pub ranged: f32,
    pub heal: f32,
}

/// Client-side holder of the latest authoritative snapshot.
#[derive(Debug, Default)]
pub struct SnapshotView {
    latest: Option<GameState>,
    local_slot: Option<i32>,
    limits: CooldownLimits,
    applied: u64,
}

impl SnapshotView {
    pub fn new(local_slot: Option<i32>, limits: CooldownLimits) -> Self {
        Self {
            latest: None,
            local_slot,
            limits,
            applied: 0,
        }
    }

    /// Snapshots are full state; the newest simply replaces the previous one.
    pub fn apply(&mut self, state: GameState) {
        self.latest = Some(state);
        self.applied += 1;
    }

    pub fn latest(&self) -> Option<&GameState> {
        self.latest.as_ref()
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn local_slot(&self) -> Option<i32> {
        self.local_slot
    }

    pub fn player(&self, slot: i32) -> Option<&PlayerState> {
        self.latest.as_ref()?.players.iter().find(|p| p.slot == slot)
    }

    pub fn local_player(&self) -> Option<&PlayerState> {
        self.player(self.local_slot?)
    }

    pub fn active_encounter(&self) -> Option<&EncounterState> {
        self.latest.as_ref()?.encounter.as_ref()
    }

    pub fn cooldown_fractions(&self) -> Option<CooldownFractions> {
        let player = self.local_player()?;
        let fraction = |remaining: f32, total: f32| {
            if total <= 0.0 {
                0.0
            } else {
                (remaining / total).clamp(0.0, 1.0)
            }
        };
        Some(CooldownFractions {
            melee: fraction(player.melee_cooldown, self.limits.melee),
            ranged: fraction(player.ranged_cooldown, self.limits.ranged),
            heal: fraction(player.heal_cooldown, self.limits.heal),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::EncounterDetail;

    fn player(slot: i32, ranged_cooldown: f32) -> PlayerState {
        PlayerState {
            slot,
            x: slot as f32,
            z: 0.0,
            rotation_y: 0.0,
            health: 100,
            max_health: 100,
            dead: false,
            melee_cooldown: 0.4,
            ranged_cooldown,
            heal_cooldown: 0.0,
        }
    }

    fn state() -> GameState {
        GameState {
            players: vec![player(0, 0.0), player(2, 0.3)],
            projectiles: Vec::new(),
            encounter: Some(EncounterState {
                id: 1,
                completed: false,
                x: 0.0,
                z: 47.0,
                rotation_y: 0.0,
                detail: EncounterDetail::ObjectPuzzle,
            }),
            boss_projectiles: Vec::new(),
        }
    }

    #[test]
    fn local_player_is_found_by_slot() {
        let mut view = SnapshotView::new(Some(2), CooldownLimits::default());
        assert!(view.local_player().is_none());

        view.apply(state());
        assert_eq!(view.local_player().map(|p| p.x), Some(2.0));
        assert_eq!(view.active_encounter().map(|e| e.id), Some(1));
        assert_eq!(view.applied(), 1);
    }

    #[test]
    fn cooldowns_are_normalised_against_the_loadout() {
        let balance = BalanceConfig::default();
        let mut loadout = Loadout::default();
        loadout.upgrade(LoadoutTrack::Ranged);
        loadout.upgrade(LoadoutTrack::Ranged);
        let limits = CooldownLimits::for_loadout(&loadout, &balance);
        assert!((limits.ranged - 0.6).abs() < 1e-6);

        let mut view = SnapshotView::new(Some(2), limits);
        view.apply(state());
        let fractions = view.cooldown_fractions().unwrap();
        assert!((fractions.melee - 0.5).abs() < 1e-6);
        assert!((fractions.ranged - 0.5).abs() < 1e-5);
        assert_eq!(fractions.heal, 0.0);
    }

    #[test]
    fn spectator_has_no_local_entry() {
        let mut view = SnapshotView::new(None, CooldownLimits::default());
        view.apply(state());
        assert!(view.cooldown_fractions().is_none());
    }
}

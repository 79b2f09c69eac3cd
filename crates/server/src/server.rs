use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use vanguard::lobby::MAX_PLAYERS;
use vanguard::{
    FixedTimestep, GameEvent, HostPhase, HostSession, InputCommand, LobbyAction, NetworkStats,
    PeerId,
};

use crate::config::ServerConfig;

pub struct GameServer {
    session: HostSession,
    timestep: FixedTimestep,
    tick: u64,
    last_tick_time: Instant,
    start_time: Instant,
    running: Arc<AtomicBool>,
    auto_ready: bool,
}

impl GameServer {
    pub fn new(config: ServerConfig) -> io::Result<Self> {
        let mut session = HostSession::bind(config.bind_addr.as_str(), config.host)?;
        if let Some(sim) = config.packet_loss {
            log::info!("simulating {:.1}% outbound loss", sim.loss_percent);
            session.set_loss_simulation(sim);
        }

        Ok(Self {
            session,
            timestep: FixedTimestep::new(config.tick_rate),
            tick: 0,
            last_tick_time: Instant::now(),
            start_time: Instant::now(),
            running: Arc::new(AtomicBool::new(true)),
            auto_ready: config.auto_ready,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.session.local_addr()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.session.drain_events()
    }

    pub fn run(&mut self) {
        while self.running.load(Ordering::SeqCst) && !self.session.is_finished() {
            self.tick_once();
            for event in self.session.drain_events() {
                log::info!("{}", event);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        self.shutdown();
    }

    pub fn tick_once(&mut self) {
        let now = Instant::now();
        self.timestep
            .accumulate((now - self.last_tick_time).as_secs_f32());
        self.last_tick_time = now;

        while self.timestep.consume_tick() {
            self.tick += 1;
            self.ready_up_if_requested();
            self.session.tick(self.timestep.dt());
        }
    }

    /// The host's own player has no input source here, so auto-ready
    /// toggles it once when everyone else is ready.
    fn ready_up_if_requested(&mut self) {
        if !self.auto_ready {
            return;
        }
        let Some(lobby) = self.session.lobby() else {
            return;
        };
        let registry = lobby.registry();
        let host_ready = registry.get(&PeerId::Local).is_some_and(|s| s.ready);
        let others_ready = registry
            .iter()
            .filter(|s| !s.peer.is_local())
            .all(|s| s.ready);
        if !host_ready && registry.len() > 1 && others_ready {
            self.session.local_action(LobbyAction::ToggleReady);
        }
    }

    pub fn local_action(&mut self, action: LobbyAction) -> bool {
        self.session.local_action(action)
    }

    /// Moves the host to the next free slot, wrapping around.
    pub fn cycle_local_slot(&mut self) -> bool {
        let Some(registry) = self.session.lobby().map(|l| l.registry()) else {
            return false;
        };
        let Some(current) = registry.get(&PeerId::Local).map(|s| s.slot) else {
            return false;
        };
        let next = (1..MAX_PLAYERS as u8)
            .map(|offset| (current + offset) % MAX_PLAYERS as u8)
            .find(|&slot| !registry.is_slot_taken(slot));
        match next {
            Some(slot) => self.session.local_action(LobbyAction::ChangeSlot(slot)),
            None => false,
        }
    }

    pub fn local_input(&mut self, input: &InputCommand) -> bool {
        self.session.local_input(input)
    }

    /// Tells every participant the host is going away and flushes the
    /// notices before the socket closes.
    pub fn shutdown(&mut self) {
        self.session.leave();
        let deadline = Instant::now() + Duration::from_millis(500);
        while !self.session.is_finished() && Instant::now() < deadline {
            self.session.tick(self.timestep.dt());
            std::thread::sleep(Duration::from_millis(10));
        }
        self.session.shutdown();
    }

    pub fn stats(&self) -> ServerStats {
        let (players, encounter) = match self.session.phase() {
            HostPhase::Lobby(lobby) => (
                lobby
                    .registry()
                    .iter()
                    .map(|s| PlayerRow {
                        slot: s.slot,
                        name: s.name.clone(),
                        identity: s.peer.to_string(),
                        status: if s.ready { "ready" } else { "not ready" }.to_string(),
                        loadout: Some(s.loadout.to_wire()),
                    })
                    .collect(),
                None,
            ),
            HostPhase::Match(state) => (
                state
                    .players()
                    .iter()
                    .map(|p| PlayerRow {
                        slot: p.slot,
                        name: p.name.clone(),
                        identity: p.peer.to_string(),
                        status: if p.dead {
                            "dead".to_string()
                        } else {
                            format!("{}/{} hp", p.health, p.stats.max_health)
                        },
                        loadout: None,
                    })
                    .collect(),
                state.active_encounter().map(|e| {
                    format!(
                        "#{} {} ({} boss projectiles)",
                        e.id,
                        e.kind.name(),
                        state.boss_projectiles().len()
                    )
                }),
            ),
            HostPhase::Ended => (Vec::new(), None),
        };

        ServerStats {
            tick: self.tick,
            uptime_secs: self.start_time.elapsed().as_secs(),
            phase: self.session.phase().name(),
            players,
            encounter,
            network_stats: self.session.stats().clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerRow {
    pub slot: u8,
    pub name: String,
    pub identity: String,
    pub status: String,
    pub loadout: Option<[i32; 4]>,
}

#[derive(Debug, Clone)]
pub struct ServerStats {
    pub tick: u64,
    pub uptime_secs: u64,
    pub phase: &'static str,
    pub players: Vec<PlayerRow>,
    pub encounter: Option<String>,
    pub network_stats: NetworkStats,
}

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Instant;

use crate::event::{EventQueue, GameEvent};
use crate::lobby::{JoinOutcome, LobbyAction, LobbyHost};
use crate::map::LevelConfig;
use crate::net::{
    InputCommand, NetworkEndpoint, NetworkStats, Packet, PacketLossSimulation, PeerId,
    RepeatedSend,
};
use crate::player::BalanceConfig;
use crate::simulation::{MatchOutcome, MatchState};

/// Datagrams handled per tick; the rest wait for the next one.
pub const INBOX_BATCH: usize = 100;

pub const START_REPEATS: u32 = 5;
pub const START_REPEAT_INTERVAL: f32 = 0.05;
pub const END_REPEATS: u32 = 5;
pub const END_REPEAT_INTERVAL: f32 = 0.1;
pub const LEAVE_REPEATS: u32 = 3;
pub const LEAVE_REPEAT_INTERVAL: f32 = 0.05;

#[derive(Debug, Clone)]
pub struct HostSettings {
    pub name: String,
    pub level: LevelConfig,
    pub balance: BalanceConfig,
    pub seed: u64,
}

impl HostSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: LevelConfig::default(),
            balance: BalanceConfig::default(),
            seed: 0,
        }
    }
}

pub enum HostPhase {
    Lobby(LobbyHost),
    Match(MatchState),
    Ended,
}

impl HostPhase {
    pub fn name(&self) -> &'static str {
        match self {
            HostPhase::Lobby(_) => "lobby",
            HostPhase::Match(_) => "match",
            HostPhase::Ended => "ended",
        }
    }
}

/// Authority side of a session: owns the socket, the lobby and later the
/// match, and everything that has to be broadcast.
pub struct HostSession {
    endpoint: NetworkEndpoint,
    phase: HostPhase,
    outbox: Vec<RepeatedSend>,
    events: EventQueue,
    settings: HostSettings,
}

impl HostSession {
    pub fn bind<A: ToSocketAddrs>(addr: A, settings: HostSettings) -> io::Result<Self> {
        let endpoint = NetworkEndpoint::bind(addr)?;
        let lobby = LobbyHost::new(&settings.name, Instant::now());
        log::info!(
            "hosting on {} as {}",
            endpoint.local_addr(),
            settings.name
        );

        let mut events = EventQueue::default();
        events.push(GameEvent::PlayerJoined {
            name: settings.name.clone(),
            slot: 0,
        });

        Ok(Self {
            endpoint,
            phase: HostPhase::Lobby(lobby),
            outbox: Vec::new(),
            events,
            settings,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn stats(&self) -> &NetworkStats {
        self.endpoint.stats()
    }

    pub fn set_loss_simulation(&mut self, sim: PacketLossSimulation) {
        self.endpoint.set_loss_simulation(sim);
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    pub fn phase(&self) -> &HostPhase {
        &self.phase
    }

    pub fn lobby(&self) -> Option<&LobbyHost> {
        match &self.phase {
            HostPhase::Lobby(lobby) => Some(lobby),
            _ => None,
        }
    }

    pub fn match_state(&self) -> Option<&MatchState> {
        match &self.phase {
            HostPhase::Match(state) => Some(state),
            _ => None,
        }
    }

    /// Ended, with every redundant send delivered.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, HostPhase::Ended) && self.outbox.is_empty()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain().collect()
    }

    /// Lobby intent of the host's own player. Returns false outside the
    /// lobby or when the request was refused.
    pub fn local_action(&mut self, action: LobbyAction) -> bool {
        let now = Instant::now();
        match &mut self.phase {
            HostPhase::Lobby(lobby) => {
                apply_lobby_action(lobby, &mut self.events, PeerId::Local, action, now)
            }
            _ => false,
        }
    }

    pub fn local_input(&mut self, input: &InputCommand) -> bool {
        match &mut self.phase {
            HostPhase::Match(state) => state.apply_input(&PeerId::Local, input, Instant::now()),
            _ => false,
        }
    }

    /// Host walks away: every remote participant is told the session is
    /// closing.
    pub fn leave(&mut self) {
        let targets = match &self.phase {
            HostPhase::Lobby(lobby) => lobby.remote_addrs(),
            HostPhase::Match(state) => remote_players(state),
            HostPhase::Ended => return,
        };
        log::info!("host leaving, notifying {} peers", targets.len());
        self.outbox.push(RepeatedSend::new(
            Packet::ServerShutdown { reason: None },
            targets,
            LEAVE_REPEATS,
            LEAVE_REPEAT_INTERVAL,
        ));
        self.phase = HostPhase::Ended;
    }

    pub fn tick(&mut self, dt: f32) {
        let now = Instant::now();
        let inbound = self.receive();

        match self.phase {
            HostPhase::Lobby(_) => self.tick_lobby(inbound, dt, now),
            HostPhase::Match(_) => self.tick_match(inbound, dt, now),
            HostPhase::Ended => {}
        }

        self.pump_outbox(dt);
    }

    /// Stops the receive thread. Pending redundant sends are dropped.
    pub fn shutdown(&mut self) {
        self.outbox.clear();
        self.endpoint.shutdown();
    }

    fn receive(&mut self) -> Vec<(Packet, SocketAddr)> {
        let mut packets = Vec::new();
        for datagram in self.endpoint.drain(INBOX_BATCH) {
            match Packet::decode(&datagram.bytes) {
                Ok(packet) => packets.push((packet, datagram.from)),
                Err(e) => {
                    self.endpoint.record_malformed();
                    log::debug!("dropping datagram from {}: {}", datagram.from, e);
                }
            }
        }
        packets
    }

    fn tick_lobby(&mut self, inbound: Vec<(Packet, SocketAddr)>, dt: f32, now: Instant) {
        let HostPhase::Lobby(lobby) = &mut self.phase else {
            return;
        };

        for (packet, from) in inbound {
            let peer = PeerId::Remote(from);
            match packet {
                Packet::Join { name } => {
                    if let JoinOutcome::Joined { slot } = lobby.handle_join(peer, &name, now) {
                        self.events.push(GameEvent::PlayerJoined { name, slot });
                    }
                }
                Packet::Input { action, value } => match LobbyAction::from_wire(action, value) {
                    Some(action) => {
                        apply_lobby_action(lobby, &mut self.events, peer, action, now);
                    }
                    None => {
                        lobby.touch(&peer, now);
                    }
                },
                Packet::ServerShutdown { .. } => {
                    if let Some(session) = lobby.leave(&peer) {
                        log::info!("{} left the lobby", session.name);
                        self.events.push(GameEvent::PlayerLeft {
                            name: session.name,
                            slot: session.slot,
                        });
                    }
                }
                _ => {
                    lobby.touch(&peer, now);
                }
            }
        }

        let tick = lobby.tick(dt, now);
        for session in tick.evicted {
            self.events.push(GameEvent::PlayerEvicted {
                name: session.name,
                slot: session.slot,
            });
        }
        if let Some(roster) = &tick.roster {
            let targets = lobby.remote_addrs();
            self.endpoint.send_to_all(roster, &targets);
        }
        if tick.start {
            self.start_match();
        }
    }

    fn start_match(&mut self) {
        let HostPhase::Lobby(lobby) = std::mem::replace(&mut self.phase, HostPhase::Ended) else {
            return;
        };
        let targets = lobby.remote_addrs();
        let roster = lobby.into_roster();

        let mut state = MatchState::with_level_geometry(
            roster,
            &self.settings.level,
            self.settings.balance.clone(),
            self.settings.seed,
        );
        self.events.extend(state.drain_events());

        self.endpoint.send_to_all(&Packet::MatchStart, &targets);
        self.outbox.push(RepeatedSend::new(
            Packet::StartGame,
            targets,
            START_REPEATS,
            START_REPEAT_INTERVAL,
        ));
        self.phase = HostPhase::Match(state);
    }

    fn tick_match(&mut self, inbound: Vec<(Packet, SocketAddr)>, dt: f32, now: Instant) {
        let HostPhase::Match(state) = &mut self.phase else {
            return;
        };

        for (packet, from) in inbound {
            let peer = PeerId::Remote(from);
            match packet {
                Packet::GameInput(input) => {
                    state.apply_input(&peer, &input, now);
                }
                Packet::ClientSceneLoaded => {
                    if state.touch(&peer, now) {
                        self.endpoint.send_to(&Packet::MatchStart, from);
                    }
                }
                Packet::ServerShutdown { .. } => {
                    state.remove_player(&peer);
                }
                _ => {
                    state.touch(&peer, now);
                }
            }
        }

        let outcome = state.tick(dt, now);
        self.events.extend(state.drain_events());

        let targets = remote_players(state);
        self.endpoint
            .send_to_all(&Packet::GameState(state.snapshot()), &targets);

        if let Some(outcome) = outcome {
            self.end_match(outcome, targets);
        }
    }

    fn end_match(&mut self, outcome: MatchOutcome, targets: Vec<SocketAddr>) {
        self.outbox.push(RepeatedSend::new(
            Packet::ServerShutdown {
                reason: Some(outcome.reason().to_string()),
            },
            targets,
            END_REPEATS,
            END_REPEAT_INTERVAL,
        ));
        self.phase = HostPhase::Ended;
    }

    fn pump_outbox(&mut self, dt: f32) {
        for send in &mut self.outbox {
            send.pump(&mut self.endpoint, dt);
        }
        self.outbox.retain(|send| !send.is_finished());
    }
}

fn apply_lobby_action(
    lobby: &mut LobbyHost,
    events: &mut EventQueue,
    peer: PeerId,
    action: LobbyAction,
    now: Instant,
) -> bool {
    let applied = lobby.handle_action(&peer, action, now);
    if let (true, LobbyAction::ChangeSlot(slot)) = (applied, action) {
        if let Some(session) = lobby.registry().get(&peer) {
            events.push(GameEvent::SlotChanged {
                name: session.name.clone(),
                slot,
            });
        }
    }
    applied
}

fn remote_players(state: &MatchState) -> Vec<SocketAddr> {
    state.players().iter().filter_map(|p| p.peer.addr()).collect()
}

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::lobby::{LobbyAction, LobbyView};
use crate::net::{
    GameState, InputCommand, NetworkEndpoint, NetworkStats, Packet, PacketLossSimulation,
    RepeatedSend, RosterEntry,
};
use crate::player::BalanceConfig;
use crate::snapshot::{CooldownLimits, SnapshotView};

use super::host::INBOX_BATCH;

pub const JOIN_RESEND_INTERVAL: f32 = 0.2;
pub const CONNECT_TIMEOUT: f32 = 2.0;
pub const SCENE_LOADED_INTERVAL: f32 = 0.5;
pub const MATCH_TIMEOUT: f32 = 5.0;

const LEAVE_REPEATS: u32 = 3;
const LEAVE_REPEAT_INTERVAL: f32 = 0.05;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// No reply to the join handshake.
    ServerNotResponding,
    Timeout,
    HostClosed(Option<String>),
    Left,
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServerNotResponding => f.write_str("server not responding"),
            Self::Timeout => f.write_str("connection timed out"),
            Self::HostClosed(Some(reason)) => write!(f, "host closed the session: {reason}"),
            Self::HostClosed(None) => f.write_str("host closed the session"),
            Self::Left => f.write_str("left the session"),
        }
    }
}

#[derive(Debug)]
pub enum ClientPhase {
    Connecting { elapsed: f32, resend: f32 },
    Lobby(LobbyView),
    LoadingMatch { resend: f32, silence: f32 },
    InMatch { view: SnapshotView, silence: f32 },
    Disconnected(DisconnectReason),
}

impl ClientPhase {
    pub fn name(&self) -> &'static str {
        match self {
            ClientPhase::Connecting { .. } => "connecting",
            ClientPhase::Lobby(_) => "lobby",
            ClientPhase::LoadingMatch { .. } => "loading",
            ClientPhase::InMatch { .. } => "match",
            ClientPhase::Disconnected(_) => "disconnected",
        }
    }
}

/// Participant side of a session. Everything runs off `tick`; nothing
/// blocks on the socket.
pub struct ClientSession {
    endpoint: Option<NetworkEndpoint>,
    server: SocketAddr,
    name: String,
    balance: BalanceConfig,
    phase: ClientPhase,
    roster: Vec<RosterEntry>,
    input: InputCommand,
    outbox: Vec<RepeatedSend>,
}

impl ClientSession {
    pub fn connect<A: ToSocketAddrs>(
        server: A,
        name: impl Into<String>,
        balance: BalanceConfig,
    ) -> io::Result<Self> {
        let endpoint = NetworkEndpoint::connect(server)?;
        let server = endpoint
            .remote_addr()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no server address"))?;
        let name = name.into();
        log::info!("connecting to {} as {}", server, name);

        Ok(Self {
            endpoint: Some(endpoint),
            server,
            name,
            balance,
            phase: ClientPhase::Connecting {
                elapsed: 0.0,
                resend: 0.0,
            },
            roster: Vec::new(),
            input: InputCommand::default(),
            outbox: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.endpoint.as_ref().map(NetworkEndpoint::local_addr)
    }

    pub fn stats(&self) -> Option<&NetworkStats> {
        self.endpoint.as_ref().map(NetworkEndpoint::stats)
    }

    pub fn set_loss_simulation(&mut self, sim: PacketLossSimulation) {
        if let Some(endpoint) = &mut self.endpoint {
            endpoint.set_loss_simulation(sim);
        }
    }

    pub fn phase(&self) -> &ClientPhase {
        &self.phase
    }

    pub fn disconnect_reason(&self) -> Option<&DisconnectReason> {
        match &self.phase {
            ClientPhase::Disconnected(reason) => Some(reason),
            _ => None,
        }
    }

    /// The live lobby roster, or the one frozen when the match started.
    pub fn roster(&self) -> &[RosterEntry] {
        match &self.phase {
            ClientPhase::Lobby(view) => view.roster(),
            _ => &self.roster,
        }
    }

    pub fn local_entry(&self) -> Option<&RosterEntry> {
        self.roster().iter().find(|e| e.name == self.name)
    }

    pub fn snapshot(&self) -> Option<&SnapshotView> {
        match &self.phase {
            ClientPhase::InMatch { view, .. } => Some(view),
            _ => None,
        }
    }

    /// Sends a lobby intent. Ignored outside the lobby.
    pub fn lobby_action(&mut self, action: LobbyAction) {
        if let (ClientPhase::Lobby(_), Some(endpoint)) = (&self.phase, &mut self.endpoint) {
            endpoint.send(&action.to_packet());
        }
    }

    /// Input for the next match tick. The action fires once.
    pub fn set_input(&mut self, input: InputCommand) {
        self.input = input;
    }

    pub fn leave(&mut self) {
        if matches!(self.phase, ClientPhase::Disconnected(_)) {
            return;
        }
        self.outbox.push(RepeatedSend::new(
            Packet::ServerShutdown { reason: None },
            vec![self.server],
            LEAVE_REPEATS,
            LEAVE_REPEAT_INTERVAL,
        ));
        self.disconnect(DisconnectReason::Left);
    }

    /// Disconnected, with the leave notices sent.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, ClientPhase::Disconnected(_)) && self.outbox.is_empty()
    }

    pub fn tick(&mut self, dt: f32) {
        for packet in self.receive() {
            self.handle_packet(packet);
        }
        self.advance_timers(dt);
        self.pump_outbox(dt);
    }

    fn receive(&mut self) -> Vec<Packet> {
        let Some(endpoint) = &mut self.endpoint else {
            return Vec::new();
        };
        let mut packets = Vec::new();
        for datagram in endpoint.drain(INBOX_BATCH) {
            if datagram.from != self.server {
                continue;
            }
            match Packet::decode(&datagram.bytes) {
                Ok(packet) => packets.push(packet),
                Err(e) => {
                    endpoint.record_malformed();
                    log::debug!("dropping datagram from {}: {}", datagram.from, e);
                }
            }
        }
        packets
    }

    fn handle_packet(&mut self, packet: Packet) {
        if let ClientPhase::Connecting { .. } = self.phase {
            log::info!("{} reached the lobby", self.name);
            self.phase = ClientPhase::Lobby(LobbyView::new());
        }

        if let Packet::ServerShutdown { reason } = packet {
            if !matches!(self.phase, ClientPhase::Disconnected(_)) {
                self.disconnect(DisconnectReason::HostClosed(reason));
            }
            return;
        }

        match &mut self.phase {
            ClientPhase::Lobby(view) => match packet {
                Packet::LobbyState { roster } => view.apply_roster(roster),
                Packet::StartGame | Packet::GameState(_) => self.begin_loading(),
                _ => {}
            },
            ClientPhase::LoadingMatch { .. } => match packet {
                Packet::MatchStart => self.enter_match(None),
                Packet::GameState(state) => self.enter_match(Some(state)),
                _ => {}
            },
            ClientPhase::InMatch { view, silence } => {
                if let Packet::GameState(state) = packet {
                    view.apply(state);
                    *silence = 0.0;
                }
            }
            ClientPhase::Connecting { .. } | ClientPhase::Disconnected(_) => {}
        }
    }

    fn begin_loading(&mut self) {
        let ClientPhase::Lobby(view) = std::mem::replace(
            &mut self.phase,
            ClientPhase::LoadingMatch {
                resend: 0.0,
                silence: 0.0,
            },
        ) else {
            return;
        };
        self.roster = view.into_roster();
        log::info!("match starting with {} players", self.roster.len());
    }

    fn enter_match(&mut self, first: Option<GameState>) {
        let local = self.roster.iter().find(|e| e.name == self.name);
        let limits = local
            .map(|entry| CooldownLimits::for_roster_entry(entry, &self.balance))
            .unwrap_or_default();
        let mut view = SnapshotView::new(local.map(|e| e.slot), limits);
        if let Some(state) = first {
            view.apply(state);
        }
        self.phase = ClientPhase::InMatch { view, silence: 0.0 };
    }

    fn advance_timers(&mut self, dt: f32) {
        let Some(endpoint) = &mut self.endpoint else {
            return;
        };

        let timed_out = match &mut self.phase {
            ClientPhase::Connecting { elapsed, resend } => {
                *elapsed += dt;
                if *elapsed >= CONNECT_TIMEOUT {
                    Some(DisconnectReason::ServerNotResponding)
                } else {
                    *resend -= dt;
                    if *resend <= 0.0 {
                        *resend = JOIN_RESEND_INTERVAL;
                        endpoint.send(&Packet::Join {
                            name: self.name.clone(),
                        });
                    }
                    None
                }
            }
            ClientPhase::Lobby(view) => {
                if let Some(keep_alive) = view.tick(dt) {
                    endpoint.send(&keep_alive);
                }
                view.is_timed_out().then_some(DisconnectReason::Timeout)
            }
            ClientPhase::LoadingMatch { resend, silence } => {
                *silence += dt;
                *resend -= dt;
                if *resend <= 0.0 {
                    *resend = SCENE_LOADED_INTERVAL;
                    endpoint.send(&Packet::ClientSceneLoaded);
                }
                (*silence >= MATCH_TIMEOUT).then_some(DisconnectReason::Timeout)
            }
            ClientPhase::InMatch { silence, .. } => {
                endpoint.send(&Packet::GameInput(self.input));
                self.input.action = InputCommand::ACTION_NONE;
                *silence += dt;
                (*silence >= MATCH_TIMEOUT).then_some(DisconnectReason::Timeout)
            }
            ClientPhase::Disconnected(_) => None,
        };

        if let Some(reason) = timed_out {
            self.disconnect(reason);
        }
    }

    fn disconnect(&mut self, reason: DisconnectReason) {
        match &reason {
            DisconnectReason::Left => log::info!("{} left {}", self.name, self.server),
            DisconnectReason::HostClosed(_) => log::info!("{}", reason),
            _ => log::warn!("{}: {}", self.server, reason),
        }
        self.phase = ClientPhase::Disconnected(reason);
        if self.outbox.is_empty() {
            self.close();
        }
    }

    fn close(&mut self) {
        if let Some(mut endpoint) = self.endpoint.take() {
            endpoint.shutdown();
        }
    }

    fn pump_outbox(&mut self, dt: f32) {
        let Some(endpoint) = &mut self.endpoint else {
            self.outbox.clear();
            return;
        };
        for send in &mut self.outbox {
            send.pump(endpoint, dt);
        }
        self.outbox.retain(|send| !send.is_finished());
        if self.outbox.is_empty() && matches!(self.phase, ClientPhase::Disconnected(_)) {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn silent_server() -> NetworkEndpoint {
        NetworkEndpoint::bind("127.0.0.1:0").unwrap()
    }

    fn client_for(server: &NetworkEndpoint) -> ClientSession {
        ClientSession::connect(server.local_addr(), "guest", BalanceConfig::default()).unwrap()
    }

    fn drain_packets(server: &mut NetworkEndpoint) -> Vec<(Packet, SocketAddr)> {
        thread::sleep(Duration::from_millis(50));
        server
            .drain(100)
            .into_iter()
            .filter_map(|d| Packet::decode(&d.bytes).ok().map(|p| (p, d.from)))
            .collect()
    }

    /// Ticks `client` until `done` holds or a bounded number of polls pass.
    fn tick_until(client: &mut ClientSession, mut done: impl FnMut(&ClientSession) -> bool) -> bool {
        for _ in 0..500 {
            client.tick(DT);
            if done(client) {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn unanswered_join_gives_up_after_two_seconds() {
        let mut server = silent_server();
        let mut client = client_for(&server);

        for _ in 0..119 {
            client.tick(DT);
        }
        assert!(matches!(client.phase(), ClientPhase::Connecting { .. }));

        client.tick(DT);
        client.tick(DT);
        assert_eq!(
            client.disconnect_reason(),
            Some(&DisconnectReason::ServerNotResponding)
        );
        assert!(client.local_addr().is_none());

        let joins = drain_packets(&mut server)
            .into_iter()
            .filter(|(p, _)| matches!(p, Packet::Join { .. }))
            .count();
        assert!((9..=11).contains(&joins), "got {joins}");
    }

    #[test]
    fn any_reply_completes_the_handshake() {
        let mut server = silent_server();
        let mut client = client_for(&server);
        client.tick(DT);

        let (_, from) = drain_packets(&mut server).pop().unwrap();
        server.send_to(
            &Packet::LobbyState {
                roster: vec![RosterEntry {
                    name: "guest".to_string(),
                    slot: 2,
                    ready: false,
                    identity: from.to_string(),
                    loadout: [0, 1, 0, 0],
                }],
            },
            from,
        );

        assert!(tick_until(&mut client, |c| matches!(c.phase(), ClientPhase::Lobby(_))));
        assert_eq!(client.local_entry().map(|e| e.slot), Some(2));
    }

    #[test]
    fn start_then_match_start_enters_match() {
        let mut server = silent_server();
        let mut client = client_for(&server);
        client.tick(DT);
        let (_, from) = drain_packets(&mut server).pop().unwrap();

        server.send_to(&Packet::StartGame, from);
        assert!(tick_until(&mut client, |c| {
            matches!(c.phase(), ClientPhase::LoadingMatch { .. })
        }));
        let loaded = drain_packets(&mut server)
            .into_iter()
            .any(|(p, _)| p == Packet::ClientSceneLoaded);
        assert!(loaded);

        server.send_to(&Packet::MatchStart, from);
        assert!(tick_until(&mut client, |c| c.snapshot().is_some()));

        server.send_to(&Packet::GameState(GameState::default()), from);
        assert!(tick_until(&mut client, |c| {
            c.snapshot().is_some_and(|view| view.applied() == 1)
        }));
    }

    #[test]
    fn shutdown_reason_is_reported() {
        let mut server = silent_server();
        let mut client = client_for(&server);
        client.tick(DT);
        let (_, from) = drain_packets(&mut server).pop().unwrap();

        server.send_to(
            &Packet::ServerShutdown {
                reason: Some("VICTORY".to_string()),
            },
            from,
        );
        assert!(tick_until(&mut client, |c| c.disconnect_reason().is_some()));
        assert_eq!(
            client.disconnect_reason(),
            Some(&DisconnectReason::HostClosed(Some("VICTORY".to_string())))
        );
        assert!(client.is_finished());
    }

    #[test]
    fn leaving_sends_three_notices() {
        let mut server = silent_server();
        let mut client = client_for(&server);
        client.tick(DT);
        drain_packets(&mut server);

        client.leave();
        for _ in 0..10 {
            client.tick(DT);
        }
        assert!(client.is_finished());

        let notices = drain_packets(&mut server)
            .into_iter()
            .filter(|(p, _)| *p == Packet::ServerShutdown { reason: None })
            .count();
        assert_eq!(notices, 3);
    }
}

use super::codec::{PacketError, WireReader, WireWriter};

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_TICK_RATE: u32 = 60;
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

const TAG_JOIN: u8 = 1;
const TAG_LOBBY_STATE: u8 = 2;
const TAG_INPUT: u8 = 3;
const TAG_START_GAME: u8 = 4;
const TAG_SERVER_SHUTDOWN: u8 = 5;
const TAG_CLIENT_SCENE_LOADED: u8 = 6;
const TAG_MATCH_START: u8 = 7;
const TAG_GAME_INPUT: u8 = 8;
const TAG_GAME_STATE: u8 = 9;

/// One roster line as broadcast by the lobby.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub name: String,
    pub slot: i32,
    pub ready: bool,
    pub identity: String,
    pub loadout: [i32; 4],
}

/// Already-resolved player intent for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputCommand {
    pub move_x: f32,
    pub move_z: f32,
    pub look_x: f32,
    pub look_z: f32,
    pub action: u8,
    pub target_slot: i32,
}

impl InputCommand {
    pub const ACTION_NONE: u8 = 0;
    pub const ACTION_MELEE: u8 = 1;
    pub const ACTION_RANGED: u8 = 2;
    pub const ACTION_HEAL: u8 = 3;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub slot: i32,
    pub x: f32,
    pub z: f32,
    pub rotation_y: f32,
    pub health: i32,
    pub max_health: i32,
    pub dead: bool,
    pub melee_cooldown: f32,
    pub ranged_cooldown: f32,
    pub heal_cooldown: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateState {
    pub progress: f32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncounterDetail {
    Boss {
        health: i32,
        max_health: i32,
    },
    ObjectPuzzle,
    SequencePuzzle {
        phase: i32,
        streak: i32,
        timer: f32,
        reveal_index: i32,
    },
    TrackingPuzzle {
        beam_angles: Vec<f32>,
        plates: Vec<PlateState>,
    },
}

impl EncounterDetail {
    pub fn kind_tag(&self) -> i32 {
        match self {
            EncounterDetail::Boss { .. } => 0,
            EncounterDetail::ObjectPuzzle => 1,
            EncounterDetail::SequencePuzzle { .. } => 2,
            EncounterDetail::TrackingPuzzle { .. } => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncounterState {
    pub id: i32,
    pub completed: bool,
    pub x: f32,
    pub z: f32,
    pub rotation_y: f32,
    pub detail: EncounterDetail,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameState {
    pub players: Vec<PlayerState>,
    pub projectiles: Vec<[f32; 2]>,
    pub encounter: Option<EncounterState>,
    pub boss_projectiles: Vec<[f32; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Join { name: String },
    LobbyState { roster: Vec<RosterEntry> },
    Input { action: u8, value: i32 },
    StartGame,
    ServerShutdown { reason: Option<String> },
    ClientSceneLoaded,
    MatchStart,
    GameInput(InputCommand),
    GameState(GameState),
}

impl Packet {
    pub fn tag(&self) -> u8 {
        match self {
            Packet::Join { .. } => TAG_JOIN,
            Packet::LobbyState { .. } => TAG_LOBBY_STATE,
            Packet::Input { .. } => TAG_INPUT,
            Packet::StartGame => TAG_START_GAME,
            Packet::ServerShutdown { .. } => TAG_SERVER_SHUTDOWN,
            Packet::ClientSceneLoaded => TAG_CLIENT_SCENE_LOADED,
            Packet::MatchStart => TAG_MATCH_START,
            Packet::GameInput(_) => TAG_GAME_INPUT,
            Packet::GameState(_) => TAG_GAME_STATE,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = WireWriter::with_capacity(64);
        w.write_u8(self.tag());

        match self {
            Packet::Join { name } => w.write_str(name),
            Packet::LobbyState { roster } => {
                w.write_count(roster.len());
                for entry in roster {
                    w.write_str(&entry.name);
                    w.write_i32(entry.slot);
                    w.write_bool(entry.ready);
                    w.write_str(&entry.identity);
                    for level in entry.loadout {
                        w.write_i32(level);
                    }
                }
            }
            Packet::Input { action, value } => {
                w.write_u8(*action);
                w.write_i32(*value);
            }
            Packet::ServerShutdown { reason } => {
                if let Some(reason) = reason {
                    w.write_str(reason);
                }
            }
            Packet::StartGame | Packet::ClientSceneLoaded | Packet::MatchStart => {}
            Packet::GameInput(input) => {
                w.write_f32(input.move_x);
                w.write_f32(input.move_z);
                w.write_f32(input.look_x);
                w.write_f32(input.look_z);
                w.write_u8(input.action);
                w.write_i32(input.target_slot);
            }
            Packet::GameState(state) => write_game_state(&mut w, state),
        }

        w.into_bytes()
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        let (&tag, _) = data.split_first().ok_or(PacketError::Empty)?;
        let mut r = WireReader::new(&data[1..]);

        let packet = match tag {
            TAG_JOIN => Packet::Join {
                name: r.read_str()?,
            },
            TAG_LOBBY_STATE => {
                // name(1) + slot(4) + ready(1) + identity(1) + levels(16)
                let count = r.read_count(23)?;
                let mut roster = Vec::with_capacity(count);
                for _ in 0..count {
                    let name = r.read_str()?;
                    let slot = r.read_i32()?;
                    let ready = r.read_bool()?;
                    let identity = r.read_str()?;
                    let mut loadout = [0i32; 4];
                    for level in &mut loadout {
                        *level = r.read_i32()?;
                    }
                    roster.push(RosterEntry {
                        name,
                        slot,
                        ready,
                        identity,
                        loadout,
                    });
                }
                Packet::LobbyState { roster }
            }
            TAG_INPUT => Packet::Input {
                action: r.read_u8()?,
                value: r.read_i32()?,
            },
            TAG_START_GAME => Packet::StartGame,
            TAG_SERVER_SHUTDOWN => {
                let reason = if r.remaining() > 0 {
                    Some(r.read_str()?)
                } else {
                    None
                };
                Packet::ServerShutdown { reason }
            }
            TAG_CLIENT_SCENE_LOADED => Packet::ClientSceneLoaded,
            TAG_MATCH_START => Packet::MatchStart,
            TAG_GAME_INPUT => Packet::GameInput(InputCommand {
                move_x: r.read_f32()?,
                move_z: r.read_f32()?,
                look_x: r.read_f32()?,
                look_z: r.read_f32()?,
                action: r.read_u8()?,
                target_slot: r.read_i32()?,
            }),
            TAG_GAME_STATE => Packet::GameState(read_game_state(&mut r)?),
            other => return Err(PacketError::UnknownTag(other)),
        };

        Ok(packet)
    }
}

fn write_positions(w: &mut WireWriter, positions: &[[f32; 2]]) {
    w.write_count(positions.len());
    for [x, z] in positions {
        w.write_f32(*x);
        w.write_f32(*z);
    }
}

fn read_positions(r: &mut WireReader<'_>) -> Result<Vec<[f32; 2]>, PacketError> {
    let count = r.read_count(8)?;
    let mut positions = Vec::with_capacity(count);
    for _ in 0..count {
        positions.push([r.read_f32()?, r.read_f32()?]);
    }
    Ok(positions)
}

fn write_game_state(w: &mut WireWriter, state: &GameState) {
    w.write_count(state.players.len());
    for p in &state.players {
        w.write_i32(p.slot);
        w.write_f32(p.x);
        w.write_f32(p.z);
        w.write_f32(p.rotation_y);
        w.write_i32(p.health);
        w.write_i32(p.max_health);
        w.write_bool(p.dead);
        w.write_f32(p.melee_cooldown);
        w.write_f32(p.ranged_cooldown);
        w.write_f32(p.heal_cooldown);
    }

    write_positions(w, &state.projectiles);

    match &state.encounter {
        None => w.write_i32(-1),
        Some(enc) => {
            w.write_i32(enc.id);
            w.write_i32(enc.detail.kind_tag());
            w.write_bool(enc.completed);
            w.write_f32(enc.x);
            w.write_f32(enc.z);
            w.write_f32(enc.rotation_y);

            match &enc.detail {
                EncounterDetail::Boss { health, max_health } => {
                    w.write_i32(*health);
                    w.write_i32(*max_health);
                }
                EncounterDetail::ObjectPuzzle => {}
                EncounterDetail::SequencePuzzle {
                    phase,
                    streak,
                    timer,
                    reveal_index,
                } => {
                    w.write_i32(*phase);
                    w.write_i32(*streak);
                    w.write_f32(*timer);
                    w.write_i32(*reveal_index);
                }
                EncounterDetail::TrackingPuzzle {
                    beam_angles,
                    plates,
                } => {
                    w.write_count(beam_angles.len());
                    for angle in beam_angles {
                        w.write_f32(*angle);
                    }
                    w.write_count(plates.len());
                    for plate in plates {
                        w.write_f32(plate.progress);
                        w.write_bool(plate.active);
                    }
                }
            }
        }
    }

    write_positions(w, &state.boss_projectiles);
}

fn read_game_state(r: &mut WireReader<'_>) -> Result<GameState, PacketError> {
    let count = r.read_count(37)?;
    let mut players = Vec::with_capacity(count);
    for _ in 0..count {
        players.push(PlayerState {
            slot: r.read_i32()?,
            x: r.read_f32()?,
            z: r.read_f32()?,
            rotation_y: r.read_f32()?,
            health: r.read_i32()?,
            max_health: r.read_i32()?,
            dead: r.read_bool()?,
            melee_cooldown: r.read_f32()?,
            ranged_cooldown: r.read_f32()?,
            heal_cooldown: r.read_f32()?,
        });
    }

    let projectiles = read_positions(r)?;

    let id = r.read_i32()?;
    let encounter = if id == -1 {
        None
    } else {
        let kind = r.read_i32()?;
        let completed = r.read_bool()?;
        let x = r.read_f32()?;
        let z = r.read_f32()?;
        let rotation_y = r.read_f32()?;
        let detail = match kind {
            0 => EncounterDetail::Boss {
                health: r.read_i32()?,
                max_health: r.read_i32()?,
            },
            1 => EncounterDetail::ObjectPuzzle,
            2 => EncounterDetail::SequencePuzzle {
                phase: r.read_i32()?,
                streak: r.read_i32()?,
                timer: r.read_f32()?,
                reveal_index: r.read_i32()?,
            },
            3 => {
                let beams = r.read_count(4)?;
                let mut beam_angles = Vec::with_capacity(beams);
                for _ in 0..beams {
                    beam_angles.push(r.read_f32()?);
                }
                let plate_count = r.read_count(5)?;
                let mut plates = Vec::with_capacity(plate_count);
                for _ in 0..plate_count {
                    plates.push(PlateState {
                        progress: r.read_f32()?,
                        active: r.read_bool()?,
                    });
                }
                EncounterDetail::TrackingPuzzle {
                    beam_angles,
                    plates,
                }
            }
            other => return Err(PacketError::UnknownEncounterKind(other)),
        };
        Some(EncounterState {
            id,
            completed,
            x,
            z,
            rotation_y,
            detail,
        })
    };

    let boss_projectiles = read_positions(r)?;

    Ok(GameState {
        players,
        projectiles,
        encounter,
        boss_projectiles,
    })
}

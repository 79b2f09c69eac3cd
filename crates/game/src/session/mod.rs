//! Session drivers: the host (authority) and client sides of one game,
//! each advanced by an explicit `tick(dt)`.

mod client;
mod host;

pub use client::{
    CONNECT_TIMEOUT, ClientPhase, ClientSession, DisconnectReason, JOIN_RESEND_INTERVAL,
    MATCH_TIMEOUT, SCENE_LOADED_INTERVAL,
};
pub use host::{
    END_REPEAT_INTERVAL, END_REPEATS, HostPhase, HostSession, HostSettings, INBOX_BATCH,
    LEAVE_REPEAT_INTERVAL, LEAVE_REPEATS, START_REPEAT_INTERVAL, START_REPEATS,
};

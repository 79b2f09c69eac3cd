use std::net::SocketAddr;

use super::endpoint::NetworkEndpoint;
use super::protocol::Packet;

/// Fires a fixed number of times with a fixed delay, driven by tick time.
///
/// The first firing happens on the first `advance` call.
#[derive(Debug, Clone)]
pub struct Repeater {
    remaining: u32,
    interval: f32,
    timer: f32,
}

impl Repeater {
    pub fn new(times: u32, interval: f32) -> Self {
        Self {
            remaining: times,
            interval: interval.max(0.0),
            timer: 0.0,
        }
    }

    /// Returns how many firings fell due during `dt`.
    pub fn advance(&mut self, dt: f32) -> u32 {
        let mut fired = 0;
        self.timer -= dt;
        while self.remaining > 0 && self.timer <= 0.0 {
            self.remaining -= 1;
            fired += 1;
            if self.interval <= 0.0 {
                continue;
            }
            self.timer += self.interval;
        }
        fired
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

/// A one-shot control message sent redundantly to a fixed set of peers.
#[derive(Debug, Clone)]
pub struct RepeatedSend {
    packet: Packet,
    targets: Vec<SocketAddr>,
    repeater: Repeater,
}

impl RepeatedSend {
    pub fn new(packet: Packet, targets: Vec<SocketAddr>, times: u32, interval: f32) -> Self {
        Self {
            packet,
            targets,
            repeater: Repeater::new(times, interval),
        }
    }

    pub fn pump(&mut self, endpoint: &mut NetworkEndpoint, dt: f32) {
        for _ in 0..self.repeater.advance(dt) {
            endpoint.send_to_all(&self.packet, &self.targets);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.repeater.is_finished() || self.targets.is_empty()
    }
}

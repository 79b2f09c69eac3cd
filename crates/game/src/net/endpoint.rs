use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::protocol::{MAX_DATAGRAM_SIZE, Packet};
use super::stats::{NetworkStats, PacketLossSimulation};

const RECEIVE_POLL: Duration = Duration::from_millis(20);
/// Datagrams held between ticks before new arrivals are dropped.
pub const INBOX_CAPACITY: usize = 1024;

/// Raw datagram handed from the receive thread to the tick.
#[derive(Debug, Clone)]
pub struct Datagram {
    pub bytes: Vec<u8>,
    pub from: SocketAddr,
}

/// UDP socket with a background receive thread.
///
/// The thread only moves bytes into a bounded mpsc inbox; everything else
/// happens on the thread that calls [`NetworkEndpoint::drain`]. Arrivals
/// that find the inbox full are dropped and counted.
pub struct NetworkEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    remote_addr: Option<SocketAddr>,
    inbox: Receiver<Datagram>,
    overflow: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    receiver: Option<JoinHandle<()>>,
    stats: NetworkStats,
    loss_simulation: PacketLossSimulation,
}

impl NetworkEndpoint {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        Self::bind_with_capacity(addr, INBOX_CAPACITY)
    }

    pub fn bind_with_capacity<A: ToSocketAddrs>(addr: A, capacity: usize) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        let local_addr = socket.local_addr()?;

        let recv_socket = socket.try_clone()?;
        recv_socket.set_read_timeout(Some(RECEIVE_POLL))?;

        let running = Arc::new(AtomicBool::new(true));
        let overflow = Arc::new(AtomicU64::new(0));
        let (tx, inbox) = mpsc::sync_channel(capacity.max(1));

        let flag = Arc::clone(&running);
        let dropped = Arc::clone(&overflow);
        let receiver = thread::Builder::new()
            .name(format!("udp-recv-{}", local_addr.port()))
            .spawn(move || receive_loop(recv_socket, tx, flag, dropped))?;

        Ok(Self {
            socket,
            local_addr,
            remote_addr: None,
            inbox,
            overflow,
            running,
            receiver: Some(receiver),
            stats: NetworkStats::default(),
            loss_simulation: PacketLossSimulation::default(),
        })
    }

    /// Binds an ephemeral port and remembers `server` as the default peer.
    pub fn connect<A: ToSocketAddrs>(server: A) -> io::Result<Self> {
        let remote = server
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no server address"))?;
        let bind_addr: SocketAddr = if remote.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let mut endpoint = Self::bind(bind_addr)?;
        endpoint.remote_addr = Some(remote);
        Ok(endpoint)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn set_loss_simulation(&mut self, sim: PacketLossSimulation) {
        self.loss_simulation = sim;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Best-effort send. Failures are counted and logged, never returned.
    pub fn send_to(&mut self, packet: &Packet, addr: SocketAddr) {
        let bytes = packet.encode();
        self.send_bytes(&bytes, addr);
    }

    pub fn send(&mut self, packet: &Packet) {
        if let Some(addr) = self.remote_addr {
            self.send_to(packet, addr);
        }
    }

    /// Encodes once and sends to every address in `peers`.
    pub fn send_to_all<'a, I>(&mut self, packet: &Packet, peers: I)
    where
        I: IntoIterator<Item = &'a SocketAddr>,
    {
        let bytes = packet.encode();
        for addr in peers {
            self.send_bytes(&bytes, *addr);
        }
    }

    fn send_bytes(&mut self, bytes: &[u8], addr: SocketAddr) {
        if self.loss_simulation.should_drop() {
            self.stats.simulated_drops += 1;
            return;
        }

        match self.socket.send_to(bytes, addr) {
            Ok(sent) => {
                self.stats.packets_sent += 1;
                self.stats.bytes_sent += sent as u64;
            }
            Err(e) => {
                self.stats.send_failures += 1;
                log::debug!("send to {} failed: {}", addr, e);
            }
        }
    }

    /// Takes at most `max` queued datagrams.
    pub fn drain(&mut self, max: usize) -> Vec<Datagram> {
        self.stats.inbox_overflow = self.overflow.load(Ordering::Relaxed);
        let mut out = Vec::new();
        while out.len() < max {
            match self.inbox.try_recv() {
                Ok(datagram) => {
                    self.stats.packets_received += 1;
                    self.stats.bytes_received += datagram.bytes.len() as u64;
                    out.push(datagram);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Counts a datagram the caller could not decode.
    pub fn record_malformed(&mut self) {
        self.stats.malformed += 1;
    }

    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.receiver.take() {
            if handle.join().is_err() {
                log::error!("receive thread for {} panicked", self.local_addr);
            }
        }
    }
}

impl Drop for NetworkEndpoint {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn receive_loop(
    socket: UdpSocket,
    tx: SyncSender<Datagram>,
    running: Arc<AtomicBool>,
    overflow: Arc<AtomicU64>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    while running.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((size, from)) => {
                let datagram = Datagram {
                    bytes: buf[..size].to_vec(),
                    from,
                };
                match tx.try_send(datagram) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        overflow.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::Interrupted
                ) => {}
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                log::debug!("ignoring connection reset on receive path");
            }
            Err(e) => {
                log::error!("receive loop stopped: {}", e);
                break;
            }
        }
    }

    running.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn drain_until(endpoint: &mut NetworkEndpoint, want: usize) -> Vec<Datagram> {
        let start = Instant::now();
        let mut got = Vec::new();
        while got.len() < want && start.elapsed() < Duration::from_secs(2) {
            got.extend(endpoint.drain(100));
            thread::sleep(Duration::from_millis(2));
        }
        got
    }

    #[test]
    fn loopback_delivery_through_inbox() {
        let mut server = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        let mut client = NetworkEndpoint::connect(server.local_addr()).unwrap();

        client.send(&Packet::Join {
            name: "alice".to_string(),
        });

        let got = drain_until(&mut server, 1);
        assert_eq!(got.len(), 1);
        assert_eq!(
            Packet::decode(&got[0].bytes).unwrap(),
            Packet::Join {
                name: "alice".to_string()
            }
        );
        assert_eq!(server.stats().packets_received, 1);
        assert_eq!(client.stats().packets_sent, 1);
    }

    #[test]
    fn drain_is_bounded() {
        let mut server = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        let mut client = NetworkEndpoint::connect(server.local_addr()).unwrap();

        for _ in 0..5 {
            client.send(&Packet::StartGame);
        }

        thread::sleep(Duration::from_millis(200));
        assert_eq!(server.drain(2).len(), 2);
        assert_eq!(drain_until(&mut server, 3).len(), 3);
    }

    #[test]
    fn full_inbox_drops_and_counts_new_arrivals() {
        let mut server = NetworkEndpoint::bind_with_capacity("127.0.0.1:0", 4).unwrap();
        let mut client = NetworkEndpoint::connect(server.local_addr()).unwrap();

        for _ in 0..20 {
            client.send(&Packet::StartGame);
        }

        thread::sleep(Duration::from_millis(300));
        assert_eq!(server.drain(100).len(), 4);
        assert_eq!(server.stats().inbox_overflow, 16);
        assert_eq!(server.stats().packets_received, 4);
    }

    #[test]
    fn simulated_loss_drops_outbound() {
        let server = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        let mut client = NetworkEndpoint::connect(server.local_addr()).unwrap();
        client.set_loss_simulation(PacketLossSimulation::with_loss(100.0));

        client.send(&Packet::MatchStart);

        assert_eq!(client.stats().simulated_drops, 1);
        assert_eq!(client.stats().packets_sent, 0);
    }

    #[test]
    fn shutdown_stops_receiver() {
        let mut server = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        assert!(server.is_running());
        server.shutdown();
        assert!(!server.is_running());
    }
}

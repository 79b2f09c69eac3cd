use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

pub const HOST_IDENTITY: &str = "Host";

/// Who a message or session belongs to. The host's own player never goes
/// through the socket, so it gets a sentinel identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerId {
    Local,
    Remote(SocketAddr),
}

impl PeerId {
    pub fn is_local(&self) -> bool {
        matches!(self, PeerId::Local)
    }

    pub fn addr(&self) -> Option<SocketAddr> {
        match self {
            PeerId::Local => None,
            PeerId::Remote(addr) => Some(*addr),
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerId::Local => f.write_str(HOST_IDENTITY),
            PeerId::Remote(addr) => write!(f, "{addr}"),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid peer identity {0:?}")]
pub struct PeerIdError(String);

impl FromStr for PeerId {
    type Err = PeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == HOST_IDENTITY {
            return Ok(PeerId::Local);
        }
        s.parse()
            .map(PeerId::Remote)
            .map_err(|_| PeerIdError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_strings() {
        let addr: SocketAddr = "192.168.1.20:50000".parse().unwrap();
        assert_eq!(PeerId::Local.to_string(), "Host");
        assert_eq!(PeerId::Remote(addr).to_string(), "192.168.1.20:50000");
        assert_eq!("Host".parse::<PeerId>().unwrap(), PeerId::Local);
        assert_eq!(
            "192.168.1.20:50000".parse::<PeerId>().unwrap(),
            PeerId::Remote(addr)
        );
        assert!("nonsense".parse::<PeerId>().is_err());
    }
}

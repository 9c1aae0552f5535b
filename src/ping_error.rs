use std::{error::Error, fmt, io};

pub type PingResult<T> = std::result::Result<T, PingError>;

/// Conditions that make a ping transaction impossible to continue.
///
/// A missed reply is never an error: it is the `PingReceive::Timeout`
/// outcome. A malformed inbound packet is an error only at the codec
/// boundary; the receive loop filters it as "not our reply".
#[derive(Debug)]
pub enum PingError {
    /// Raw socket creation denied by the operating system.
    Permission { source: io::Error },
    /// Transport-level failure while sending or receiving.
    Socket { source: io::Error },
    /// A received buffer too short or inconsistent to hold an echo message.
    MalformedPacket { message: String },
}

impl fmt::Display for PingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            PingError::Permission { source } => {
                write!(f, "raw socket requires elevated privilege: {source}")
            }
            PingError::Socket { source } => write!(f, "socket error: {source}"),
            PingError::MalformedPacket { message } => write!(f, "malformed packet: {message}"),
        }
    }
}

impl Error for PingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PingError::Permission { source } | PingError::Socket { source } => Some(source),
            PingError::MalformedPacket { .. } => None,
        }
    }
}

impl From<io::Error> for PingError {
    fn from(error: io::Error) -> PingError {
        if error.kind() == io::ErrorKind::PermissionDenied {
            PingError::Permission { source: error }
        } else {
            PingError::Socket { source: error }
        }
    }
}

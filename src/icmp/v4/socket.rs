use crate::PingError;
use socket2::{Domain, Protocol, Type};
use std::io;
use std::net::IpAddr;
use std::time::Duration;

pub(crate) trait TSocket: Send + Sync {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    /// Blocks for at most `timeout` waiting for one inbound datagram. Expiry
    /// surfaces as `WouldBlock` or `TimedOut`, depending on the platform.
    /// `timeout` must be non-zero; the caller checks its budget first.
    fn recv_within(&self, buf: &mut [u8], timeout: Duration) -> io::Result<(usize, IpAddr)>;
}

/// A raw ICMPv4 socket. Creating one needs CAP_NET_RAW (or root); the
/// operating system's refusal surfaces as `PingError::Permission`.
pub(crate) struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    pub(crate) fn new() -> Result<RawSocket, PingError> {
        tracing::trace!("creating raw ICMPv4 socket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
            .map_err(PingError::from)?;
        Ok(RawSocket { socket })
    }
}

impl TSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_within(&self, buf: &mut [u8], timeout: Duration) -> io::Result<(usize, IpAddr)> {
        self.socket.set_read_timeout(Some(timeout))?;

        // Socket2 gives a safety guaranty which allows us to do an unsafe cast
        // from `&mut [u8]` to `&mut [std::mem::MaybeUninit<u8>]`. In fact, even
        // if we used MaybeUninit here we would need unsafe somewhere to copy
        // the data out of MaybeUninit.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        //
        // On a RAW socket we get a whole IP packet.
        let (n_bytes, socket_addr) = self.socket.recv_from(unsafe {
            &mut *(std::ptr::addr_of_mut!(*buf) as *mut [std::mem::MaybeUninit<u8>])
        })?;
        let ip = socket_addr
            .as_socket_ipv4()
            .map(|addr| IpAddr::V4(*addr.ip()))
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "sender address is not IPv4"))?;
        Ok((n_bytes, ip))
    }
}

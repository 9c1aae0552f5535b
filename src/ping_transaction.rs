use crate::icmp::v4::packet::{
    build_echo_request, parse_echo_reply, ECHO_REPLY_TYPE, ECHO_SEQUENCE,
};
use crate::icmp::v4::TSocket;
use crate::Identifier;
use crate::PingError;
use crate::PingReceive;
use crate::PingReceiveData;
use crate::PingResult;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

// Large enough for a maximal IPv4 header (60 bytes) plus the echo message.
const RECV_BUFFER_SIZE: usize = 256;

/// One ping transaction: exclusively owns its socket from creation to drop,
/// sends exactly one Echo Request and awaits exactly one correlated reply.
pub(crate) struct PingTransaction<S> {
    socket: S,
    identifier: Identifier,
}

impl<S> PingTransaction<S>
where
    S: TSocket,
{
    pub(crate) fn new(socket: S, identifier: Identifier) -> Self {
        PingTransaction { socket, identifier }
    }

    /// Sends one Echo Request carrying the current clock reading as payload.
    pub(crate) fn send_echo_request(&self, address: Ipv4Addr) -> PingResult<()> {
        let timestamp = unix_time_seconds();
        let packet = build_echo_request(self.identifier, ECHO_SEQUENCE, timestamp);
        // Raw ICMP transport ignores the port; zero is the placeholder.
        let addr: socket2::SockAddr = SocketAddr::new(IpAddr::V4(address), 0).into();
        self.socket.send_to(&packet, &addr)?;
        tracing::trace!(identifier = %self.identifier, %address, "echo request sent");
        Ok(())
    }

    /// Waits for the Echo Reply matching this transaction's identifier.
    ///
    /// The wait is bounded by a monotonic deadline rather than a
    /// hand-decremented countdown, so repeated wakeups cannot accumulate
    /// drift. Unrelated inbound traffic (foreign identifiers, non-reply
    /// types, malformed datagrams) is discarded and the wait continues on
    /// the remaining budget. A non-positive budget resolves to `Timeout`
    /// without touching the socket.
    pub(crate) fn receive_echo_reply(&self, timeout: Duration) -> PingResult<PingReceive> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(PingReceive::Timeout);
            }

            let mut buf = [0u8; RECV_BUFFER_SIZE];
            let (n_bytes, ip_addr) = match self.socket.recv_within(&mut buf, remaining) {
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    return Ok(PingReceive::Timeout);
                }
                Err(e) => return Err(PingError::Socket { source: e }),
                Ok(ok) => ok,
            };
            let receive_timestamp = unix_time_seconds();

            let reply = match parse_echo_reply(&buf[..n_bytes]) {
                Err(PingError::MalformedPacket { message }) => {
                    tracing::trace!(reason = %message, "discarding malformed datagram");
                    continue;
                }
                Err(e) => return Err(e),
                Ok(reply) => reply,
            };
            if reply.header.icmp_type != ECHO_REPLY_TYPE
                || reply.header.identifier != self.identifier.into()
            {
                tracing::trace!(
                    icmp_type = reply.header.icmp_type,
                    identifier = %Identifier(reply.header.identifier),
                    "discarding packet that is not our reply"
                );
                continue;
            }

            // Both timestamps come from this process's clock within one
            // transaction; a negative difference clamps to zero.
            let elapsed = receive_timestamp - reply.timestamp;
            let round_trip_time = Duration::try_from_secs_f64(elapsed).unwrap_or(Duration::ZERO);
            tracing::trace!(identifier = %self.identifier, ?round_trip_time, "echo reply received");
            return Ok(PingReceive::Data(PingReceiveData {
                ip_addr,
                identifier: self.identifier,
                sequence_number: reply.header.sequence_number,
                round_trip_time,
            }));
        }
    }
}

fn unix_time_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock set before the unix epoch")
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp::v4::checksum::checksum;
    use crate::icmp::v4::packet::tests::{echo_reply_datagram, ipv4_datagram};
    use crate::icmp::v4::packet::{EchoHeader, ECHO_REQUEST_TYPE, PACKET_SIZE};
    use crate::icmp::v4::socket_tests::{OnSend, SocketMock};
    use more_asserts as ma;

    const LOCALHOST: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

    #[test]
    fn send_transmits_one_well_formed_request() {
        let socket = SocketMock::new_default();
        let transaction = PingTransaction::new(socket.clone(), Identifier(0x1234));

        transaction.send_echo_request(LOCALHOST).unwrap();

        socket
            .should_send_number_of_messages(1)
            .should_send_to_address(&IpAddr::V4(LOCALHOST));
        let sent = socket.sent_packets().pop().unwrap();
        assert_eq!(PACKET_SIZE, sent.len());
        // checksum over the full packet verifies to zero
        assert_eq!(0, checksum(&sent));
        let header = EchoHeader::unpack(&sent).unwrap();
        assert_eq!(ECHO_REQUEST_TYPE, header.icmp_type);
        assert_eq!(0x1234, header.identifier);
        assert_eq!(ECHO_SEQUENCE, header.sequence_number);
    }

    #[test]
    fn when_socket_send_fails_then_send_returns_socket_error() {
        let socket = SocketMock::new(OnSend::ReturnErr, vec![]);
        let transaction = PingTransaction::new(socket, Identifier::random());

        let result = transaction.send_echo_request(LOCALHOST);

        assert!(matches!(result, Err(PingError::Socket { .. })));
    }

    #[test]
    fn zero_timeout_resolves_immediately_without_reading() {
        // A matching reply is queued, but a spent budget must win.
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![echo_reply_datagram(0x1234, unix_time_seconds())],
        );
        let transaction = PingTransaction::new(socket, Identifier(0x1234));

        let start = Instant::now();
        let received = transaction.receive_echo_reply(Duration::ZERO).unwrap();

        assert_eq!(PingReceive::Timeout, received);
        ma::assert_lt!(start.elapsed(), Duration::from_millis(50));
    }

    #[test]
    fn silent_peer_times_out_after_the_full_budget() {
        let socket = SocketMock::new_default();
        let transaction = PingTransaction::new(socket, Identifier::random());

        let timeout = Duration::from_millis(100);
        let start = Instant::now();
        let received = transaction.receive_echo_reply(timeout).unwrap();

        assert_eq!(PingReceive::Timeout, received);
        ma::assert_ge!(start.elapsed(), timeout);
        ma::assert_lt!(start.elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn foreign_identifiers_are_discarded_until_ours_arrives() {
        let timestamp = unix_time_seconds() - 0.05;
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![
                echo_reply_datagram(0x0001, timestamp),
                echo_reply_datagram(0x0002, timestamp),
                echo_reply_datagram(0x04D2, timestamp),
            ],
        );
        let transaction = PingTransaction::new(socket, Identifier(0x04D2));

        let received = transaction.receive_echo_reply(Duration::from_secs(1)).unwrap();

        let PingReceive::Data(data) = received else {
            panic!("expected a matched reply, got a timeout");
        };
        assert_eq!(Identifier(0x04D2), data.identifier);
        assert_eq!(ECHO_SEQUENCE, data.sequence_number);
        // the embedded timestamp simulated a reply 50ms in flight
        ma::assert_ge!(data.round_trip_time, Duration::from_millis(40));
        ma::assert_lt!(data.round_trip_time, Duration::from_millis(500));
    }

    #[test]
    fn own_looped_back_request_is_not_taken_for_a_reply() {
        // On loopback the raw socket sees the outgoing Echo Request, same
        // identifier, type 8. Only the type-0 reply may match.
        let timestamp = unix_time_seconds();
        let request = build_echo_request(Identifier(0xABCD), ECHO_SEQUENCE, timestamp);
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![ipv4_datagram(&request, &[]), echo_reply_datagram(0xABCD, timestamp)],
        );
        let transaction = PingTransaction::new(socket, Identifier(0xABCD));

        let received = transaction.receive_echo_reply(Duration::from_secs(1)).unwrap();

        assert!(matches!(received, PingReceive::Data(_)));
    }

    #[test]
    fn malformed_datagram_is_discarded_and_the_wait_continues() {
        let truncated_icmp = [ECHO_REPLY_TYPE, 0, 0, 0];
        let socket = SocketMock::new(
            OnSend::ReturnDefault,
            vec![
                ipv4_datagram(&truncated_icmp, &[]),
                echo_reply_datagram(0x0042, unix_time_seconds()),
            ],
        );
        let transaction = PingTransaction::new(socket, Identifier(0x0042));

        let received = transaction.receive_echo_reply(Duration::from_secs(1)).unwrap();

        assert!(matches!(received, PingReceive::Data(_)));
    }

    #[test]
    fn hard_read_error_propagates_as_socket_error() {
        // A datagram larger than the receive buffer makes the mock fail the
        // read with a non-timeout error.
        let oversized = vec![0u8; RECV_BUFFER_SIZE + 1];
        let socket = SocketMock::new(OnSend::ReturnDefault, vec![oversized]);
        let transaction = PingTransaction::new(socket, Identifier::random());

        let result = transaction.receive_echo_reply(Duration::from_secs(1));

        assert!(matches!(result, Err(PingError::Socket { .. })));
    }
}

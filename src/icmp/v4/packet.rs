use super::checksum::checksum;
use crate::Identifier;
use crate::PingError;
use pnet_packet::ipv4::Ipv4Packet;

pub(crate) const ECHO_REQUEST_TYPE: u8 = 8;
pub(crate) const ECHO_REPLY_TYPE: u8 = 0;
pub(crate) const ECHO_CODE: u8 = 0;
// ICMP echo sequence numbers start from 1; this crate sends one request per
// transaction, so the sequence never advances.
pub(crate) const ECHO_SEQUENCE: u16 = 1;

pub(crate) const HEADER_SIZE: usize = 8;
pub(crate) const PAYLOAD_SIZE: usize = 8;
pub(crate) const PACKET_SIZE: usize = HEADER_SIZE + PAYLOAD_SIZE;

const MIN_IPV4_HEADER_SIZE: usize = 20;

/// The fixed 8-byte ICMP echo header. All multi-byte fields are network
/// byte order on the wire.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct EchoHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence_number: u16,
}

impl EchoHeader {
    pub(crate) fn pack(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0] = self.icmp_type;
        bytes[1] = self.code;
        bytes[2..4].copy_from_slice(&self.checksum.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.identifier.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.sequence_number.to_be_bytes());
        bytes
    }

    pub(crate) fn unpack(bytes: &[u8]) -> Result<EchoHeader, PingError> {
        if bytes.len() < HEADER_SIZE {
            return Err(PingError::MalformedPacket {
                message: format!("ICMP header needs {HEADER_SIZE} bytes, got {}", bytes.len()),
            });
        }
        Ok(EchoHeader {
            icmp_type: bytes[0],
            code: bytes[1],
            checksum: u16::from_be_bytes([bytes[2], bytes[3]]),
            identifier: u16::from_be_bytes([bytes[4], bytes[5]]),
            sequence_number: u16::from_be_bytes([bytes[6], bytes[7]]),
        })
    }
}

/// The payload is an IEEE-754 double holding the send time in seconds since
/// the Unix epoch. Big-endian is its canonical byte order.
pub(crate) fn pack_timestamp(seconds: f64) -> [u8; PAYLOAD_SIZE] {
    seconds.to_be_bytes()
}

pub(crate) fn unpack_timestamp(bytes: &[u8]) -> Result<f64, PingError> {
    let bytes: [u8; PAYLOAD_SIZE] = bytes
        .get(..PAYLOAD_SIZE)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| PingError::MalformedPacket {
            message: format!("timestamp payload needs {PAYLOAD_SIZE} bytes, got {}", bytes.len()),
        })?;
    Ok(f64::from_be_bytes(bytes))
}

/// Builds one complete Echo Request: header with zeroed checksum, timestamp
/// payload, checksum over both, header repacked with the real checksum.
pub(crate) fn build_echo_request(
    identifier: Identifier,
    sequence_number: u16,
    timestamp: f64,
) -> [u8; PACKET_SIZE] {
    let mut header = EchoHeader {
        icmp_type: ECHO_REQUEST_TYPE,
        code: ECHO_CODE,
        checksum: 0,
        identifier: identifier.into(),
        sequence_number,
    };
    let payload = pack_timestamp(timestamp);

    let mut packet = [0u8; PACKET_SIZE];
    packet[..HEADER_SIZE].copy_from_slice(&header.pack());
    packet[HEADER_SIZE..].copy_from_slice(&payload);

    header.checksum = checksum(&packet);
    packet[..HEADER_SIZE].copy_from_slice(&header.pack());
    packet
}

/// An ICMP echo message extracted from a received IPv4 datagram.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct EchoReply {
    pub header: EchoHeader,
    pub timestamp: f64,
}

/// Extracts the ICMP echo message from a raw-socket datagram (IP header
/// included). The ICMP offset is computed from the IPv4 header-length field,
/// not assumed to be 20: datagrams carrying IP options still parse, and a
/// nonsensical length field is flagged instead of misparsed.
pub(crate) fn parse_echo_reply(datagram: &[u8]) -> Result<EchoReply, PingError> {
    let ip_packet = Ipv4Packet::new(datagram).ok_or_else(|| PingError::MalformedPacket {
        message: format!("datagram of {} bytes is shorter than an IPv4 header", datagram.len()),
    })?;
    let icmp_offset = usize::from(ip_packet.get_header_length()) * 4;
    if icmp_offset < MIN_IPV4_HEADER_SIZE {
        return Err(PingError::MalformedPacket {
            message: format!("IPv4 header length field implies {icmp_offset} bytes"),
        });
    }
    if datagram.len() < icmp_offset + PACKET_SIZE {
        return Err(PingError::MalformedPacket {
            message: format!(
                "datagram of {} bytes cannot hold an echo message at offset {icmp_offset}",
                datagram.len()
            ),
        });
    }

    let icmp_bytes = &datagram[icmp_offset..];
    let header = EchoHeader::unpack(icmp_bytes)?;
    let timestamp = unpack_timestamp(&icmp_bytes[HEADER_SIZE..])?;
    Ok(EchoReply { header, timestamp })
}

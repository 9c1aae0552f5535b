use crate::Identifier;
use std::net::IpAddr;
use std::time::Duration;

/// Outcome of one ping transaction. A timeout is a first-class result,
/// never an error.
#[derive(Debug, PartialEq, Eq)]
pub enum PingReceive {
    Data(PingReceiveData),
    Timeout,
}

#[derive(Debug, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct PingReceiveData {
    pub ip_addr: IpAddr,
    pub identifier: Identifier,
    pub sequence_number: u16,
    pub round_trip_time: Duration,
}

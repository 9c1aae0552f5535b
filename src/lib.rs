#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

//! A one-shot ICMP "ping": one Echo Request over a raw IPv4 socket, one
//! deadline-bounded wait for the correlated Echo Reply, a round-trip time
//! or a timeout as the outcome.
//!
//! ```no_run
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//!
//! let outcome = ping_one::run_one_ping(Ipv4Addr::new(127, 0, 0, 1), Duration::from_secs(1))?;
//! match outcome {
//!     ping_one::PingReceive::Data(data) => println!("{:?}", data.round_trip_time),
//!     ping_one::PingReceive::Timeout => println!("request timed out"),
//! }
//! # Ok::<(), ping_one::PingError>(())
//! ```

pub use identifier::Identifier;
pub use ping_error::{PingError, PingResult};
pub use ping_receive::{PingReceive, PingReceiveData};

use icmp::v4::RawSocket;
use ping_transaction::PingTransaction;

use std::net::Ipv4Addr;
use std::time::Duration;

mod icmp;
mod identifier;
mod ping_error;
mod ping_receive;
mod ping_transaction;

/// Runs one complete ping transaction against a pre-resolved address with a
/// fresh random identifier.
///
/// Opens one raw ICMP socket, sends one Echo Request and waits at most
/// `timeout` for the matching Echo Reply. The socket is released on every
/// exit path. `PingReceive::Timeout` is a regular outcome; an `Err` means
/// the transaction itself was impossible (no raw-socket privilege, transport
/// failure).
pub fn run_one_ping(address: Ipv4Addr, timeout: Duration) -> PingResult<PingReceive> {
    run_one_ping_with_identifier(address, timeout, Identifier::random())
}

/// Same as [`run_one_ping`] with a caller-supplied correlation identifier.
pub fn run_one_ping_with_identifier(
    address: Ipv4Addr,
    timeout: Duration,
    identifier: Identifier,
) -> PingResult<PingReceive> {
    let socket = RawSocket::new()?;
    let transaction = PingTransaction::new(socket, identifier);
    transaction.send_echo_request(address)?;
    transaction.receive_echo_reply(timeout)
    // transaction (and socket) dropped here on success, timeout and error alike
}

pub(crate) mod checksum;
pub(crate) mod packet;

mod socket;
pub(crate) use socket::RawSocket;
pub(crate) use socket::TSocket;

#[cfg(test)]
pub(crate) use socket::tests as socket_tests;

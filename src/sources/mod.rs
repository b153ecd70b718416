//! Datagram source implementations.

pub mod multicast;
pub mod replay;

pub use multicast::MulticastSource;
pub use replay::{DatagramLogWriter, LogReplaySource};

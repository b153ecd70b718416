//! Datagram source trait for telemetry transports.

use std::net::SocketAddr;

use crate::Result;

/// Multicast group family a datagram arrived on.
///
/// The receive side demultiplexes by source group first; the per-family
/// decoder then validates the header constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryChannel {
    /// The platform-status group.
    PlatformStatus,
    /// The surface-contact group.
    SurfaceContacts,
}

impl TelemetryChannel {
    /// One-byte tag used by the datagram log format.
    pub(crate) fn to_tag(self) -> u8 {
        match self {
            TelemetryChannel::PlatformStatus => 0,
            TelemetryChannel::SurfaceContacts => 1,
        }
    }

    /// Inverse of [`TelemetryChannel::to_tag`].
    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(TelemetryChannel::PlatformStatus),
            1 => Some(TelemetryChannel::SurfaceContacts),
            _ => None,
        }
    }
}

/// One received datagram, tagged with its channel of origin.
#[derive(Debug, Clone)]
pub struct Datagram {
    pub channel: TelemetryChannel,
    pub payload: Vec<u8>,
    /// Sender address, when the transport knows it (replay does not).
    pub source: Option<SocketAddr>,
}

/// Trait for telemetry datagram sources.
///
/// Sources abstract over the live multicast sockets and log replay, and
/// handle their own timing internally. Datagrams are delivered whole, in
/// receive order, with no reassembly: one UDP datagram is one
/// information-unit.
#[async_trait::async_trait]
pub trait DatagramSource: Send + 'static {
    /// Get the next datagram.
    ///
    /// Returns:
    /// - `Ok(Some(datagram))` - next datagram available
    /// - `Ok(None)` - stream ended (normal termination; live sources never end)
    /// - `Err(e)` - transport error
    async fn next_datagram(&mut self) -> Result<Option<Datagram>>;

    /// Human-readable description of the source for logs.
    fn describe(&self) -> String;
}

//! Unicast command link to the vessel control endpoint.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::SystemTime;

use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::config::{LinkConfig, VesselTable};
use crate::protocol::scale::day_relative_timestamp;
use crate::protocol::{RouteCommand, SpeedHeadingCommand, Waypoint};
use crate::{LinkError, Result};

/// Outbound command session.
///
/// Owns the one piece of mutable session state the protocol has: the
/// rolling 8-bit sequence number. `&mut self` on the send methods is what
/// serializes sequence allocation: share a link between tasks and you
/// must share the `&mut` too. The number is stamped into each packet and
/// advanced only after a successful send, so a failed send retries under
/// the same sequence (matching the shore-console behavior this link
/// reproduces).
///
/// Sends are fire-and-forget: there is no acknowledgement in the protocol
/// and a lost datagram is lost silently, per UDP semantics.
pub struct CommandLink {
    socket: UdpSocket,
    destination: SocketAddr,
    vessels: VesselTable,
    seq: u8,
}

impl CommandLink {
    /// Open a command link to the configured destination.
    pub async fn connect(config: &LinkConfig) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(|e| LinkError::socket_error("command socket bind", e))?;
        let destination = config.command.destination;
        socket
            .connect(destination)
            .await
            .map_err(|e| LinkError::socket_error(format!("connect {destination}"), e))?;

        info!("Command link ready, destination {destination}");
        Ok(Self { socket, destination, vessels: config.vessels.clone(), seq: 0 })
    }

    /// The sequence number the next packet will carry.
    pub fn sequence(&self) -> u8 {
        self.seq
    }

    /// The configured destination endpoint.
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Send a speed/heading command to one vessel.
    ///
    /// Returns the sequence number the packet carried. Heading is
    /// expected pre-normalized to [0, 360); negative speed means reverse.
    pub async fn send_speed_heading(
        &mut self,
        vessel: u8,
        speed_knots: f64,
        heading_deg: f64,
    ) -> Result<u8> {
        let command = SpeedHeadingCommand { vessel, speed_knots, heading_deg };
        let packet = command.encode(self.seq, &self.vessels, self.timestamp());
        self.send(&packet).await
    }

    /// Send a route command to one vessel.
    ///
    /// Fails with [`LinkError::InvalidWaypointCount`] before anything is
    /// sent when the waypoint count lies outside [2, 255]; the sequence
    /// number does not advance in that case.
    pub async fn send_route(&mut self, vessel: u8, waypoints: Vec<Waypoint>) -> Result<u8> {
        let command = RouteCommand { vessel, waypoints };
        let packet = command.encode(self.seq, &self.vessels, self.timestamp())?;
        self.send(&packet).await
    }

    fn timestamp(&self) -> u32 {
        day_relative_timestamp(SystemTime::now())
    }

    async fn send(&mut self, packet: &[u8]) -> Result<u8> {
        self.socket
            .send(packet)
            .await
            .map_err(|e| LinkError::socket_error(format!("send to {}", self.destination), e))?;

        // Advance only after the datagram left: a failed send retries
        // under the same sequence number.
        let sent = self.seq;
        self.seq = self.seq.wrapping_add(1);
        debug!("Sent {} command bytes to {} (seq {})", packet.len(), self.destination, sent);
        Ok(sent)
    }
}

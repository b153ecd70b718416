//! Live dual-group multicast source.
//!
//! Joins the platform-status and surface-contact groups on one shared
//! port, one socket per group so datagrams stay tagged with their group
//! of origin. Sockets are built with `socket2` so both can bind the
//! shared port with address reuse, then handed to tokio for async
//! receive.
//!
//! Packet loss is accepted silently (UDP semantics, no ack field in the
//! protocol); anything beyond the kernel receive buffer is dropped by
//! the transport, never queued here.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket as StdUdpSocket};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::config::TelemetryConfig;
use crate::source::{Datagram, DatagramSource, TelemetryChannel};
use crate::{LinkError, Result};

/// Largest well-formed telemetry datagram: a full 255-target contact
/// batch. Anything longer is truncated by the read and rejected by the
/// decoder's length checks.
const RECV_BUFFER_LEN: usize = 17 + 26 * 255;

struct GroupSocket {
    channel: TelemetryChannel,
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl GroupSocket {
    fn join(channel: TelemetryChannel, group: Ipv4Addr, port: u16, interface: Ipv4Addr) -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| LinkError::socket_error("multicast socket create", e))?;
        // Both group sockets share one port, so address reuse must be set
        // before bind.
        socket
            .set_reuse_address(true)
            .map_err(|e| LinkError::socket_error("set reuse address", e))?;
        socket
            .bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into())
            .map_err(|e| LinkError::socket_error(format!("bind port {port}"), e))?;
        socket
            .join_multicast_v4(&group, &interface)
            .map_err(|e| LinkError::socket_error(format!("join group {group}"), e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| LinkError::socket_error("set nonblocking", e))?;

        let socket = UdpSocket::from_std(StdUdpSocket::from(socket))
            .map_err(|e| LinkError::socket_error("tokio socket registration", e))?;

        debug!("Joined {} on port {}", group, port);
        Ok(Self { channel, socket, buf: vec![0u8; RECV_BUFFER_LEN] })
    }

    async fn recv(&mut self) -> Result<Datagram> {
        let (len, addr) = self
            .socket
            .recv_from(&mut self.buf)
            .await
            .map_err(|e| LinkError::socket_error("multicast recv", e))?;
        Ok(Datagram { channel: self.channel, payload: self.buf[..len].to_vec(), source: Some(addr) })
    }
}

/// Datagram source reading both telemetry multicast groups.
pub struct MulticastSource {
    status: GroupSocket,
    contacts: GroupSocket,
    description: String,
}

impl MulticastSource {
    /// Join both groups from the telemetry configuration.
    pub fn join(config: &TelemetryConfig) -> Result<Self> {
        let status = GroupSocket::join(
            TelemetryChannel::PlatformStatus,
            config.status_group,
            config.port,
            config.interface,
        )?;
        let contacts = GroupSocket::join(
            TelemetryChannel::SurfaceContacts,
            config.contact_group,
            config.port,
            config.interface,
        )?;

        let description = format!(
            "multicast {}+{} port {}",
            config.status_group, config.contact_group, config.port
        );
        info!("Listening on {description}");
        Ok(Self { status, contacts, description })
    }
}

#[async_trait::async_trait]
impl DatagramSource for MulticastSource {
    async fn next_datagram(&mut self) -> Result<Option<Datagram>> {
        // Whichever group delivers first wins; the loser's future is
        // dropped before it takes anything off its socket.
        let datagram = tokio::select! {
            result = self.status.recv() => result?,
            result = self.contacts.recv() => result?,
        };
        Ok(Some(datagram))
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

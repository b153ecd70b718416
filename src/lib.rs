//! Type-safe Rust library for shore-to-vessel command and telemetry.
//!
//! Shorelink implements the binary wire protocol of a shore-to-vessel
//! link for unmanned surface vessels: outbound motion and route commands
//! over unicast UDP, inbound platform-status and surface-contact
//! telemetry over two multicast groups.
//!
//! # Features
//!
//! - **Exact wire codec**: deterministic big-endian layouts with all
//!   fixed-point unit conversions (geo, angular, tenths, day-relative
//!   timestamps)
//! - **Pure core**: encoders and decoders do no I/O and carry no state;
//!   each datagram decodes independently
//! - **Isolated receive loop**: a malformed datagram is dropped and
//!   logged, never kills the loop
//! - **Replay**: record a live session to a datagram log and play it
//!   back through the same decode path
//!
//! # Quick Start
//!
//! ## Receiving telemetry
//!
//! ```rust,no_run
//! use shorelink::{LinkConfig, Shorelink};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> shorelink::Result<()> {
//!     let config = LinkConfig::default();
//!     let connection = Shorelink::receive(&config).await?;
//!
//!     let mut statuses = connection.status_updates();
//!     while let Some(status) = statuses.next().await {
//!         println!("{}: {:.1} kn, {:.1} deg", status.header.sender, status.speed_knots,
//!             status.heading_deg);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Sending commands
//!
//! ```rust,no_run
//! use shorelink::{LinkConfig, Shorelink, Waypoint};
//!
//! #[tokio::main]
//! async fn main() -> shorelink::Result<()> {
//!     let config = LinkConfig::default();
//!     let mut link = Shorelink::command(&config).await?;
//!
//!     link.send_speed_heading(3, 10.5, 45.0).await?;
//!     link.send_route(3, vec![
//!         Waypoint { longitude_deg: 120.0, latitude_deg: 30.0, speed_knots: 12.0 },
//!         Waypoint { longitude_deg: 120.2, latitude_deg: 30.1, speed_knots: 12.0 },
//!     ]).await?;
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod protocol;

// Stream-based telemetry architecture
pub mod commander;
pub mod connection;
pub mod driver;
pub mod source;
pub mod sources;

// Core exports
pub use config::{CommandConfig, LinkConfig, TelemetryConfig, VesselEntry, VesselTable};
pub use error::{LinkError, Result};
pub use protocol::{
    ContactBatch, DecodedRoute, DecodedSpeedHeading, DecodedWaypoint, PlatformStatus,
    RouteCommand, SpeedHeadingCommand, SurfaceContact, TargetClass, UnitCode, UnitHeader, Waypoint,
};

// Transport exports
pub use commander::CommandLink;
pub use connection::TelemetryConnection;
pub use source::{Datagram, DatagramSource, TelemetryChannel};
pub use sources::{DatagramLogWriter, LogReplaySource, MulticastSource};

/// Unified entry point for shorelink sessions.
///
/// This factory provides a consistent API for the three ways of using the
/// link: live telemetry receive, datagram-log replay, and the outbound
/// command session.
///
/// # Examples
///
/// ## Live telemetry
/// ```rust,no_run
/// use shorelink::{LinkConfig, Shorelink};
///
/// #[tokio::main]
/// async fn main() -> shorelink::Result<()> {
///     let connection = Shorelink::receive(&LinkConfig::default()).await?;
///     // Use connection...
///     Ok(())
/// }
/// ```
///
/// ## Log replay
/// ```rust,no_run
/// use shorelink::Shorelink;
///
/// #[tokio::main]
/// async fn main() -> shorelink::Result<()> {
///     let connection = Shorelink::replay("sortie-01.dlog").await?;
///     // Behaves like live telemetry, paced from the log...
///     Ok(())
/// }
/// ```
pub struct Shorelink;

impl Shorelink {
    /// Join the telemetry multicast groups and start receiving.
    ///
    /// # Errors
    ///
    /// Returns an error if either group socket cannot be created, bound
    /// or joined.
    pub async fn receive(config: &LinkConfig) -> Result<TelemetryConnection> {
        TelemetryConnection::join(&config.telemetry).await
    }

    /// Replay a recorded datagram log through the live decode path.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file does not exist or is not
    /// readable.
    pub async fn replay<P: AsRef<std::path::Path>>(path: P) -> Result<TelemetryConnection> {
        TelemetryConnection::replay(path).await
    }

    /// Open the outbound command link.
    ///
    /// # Errors
    ///
    /// Returns an error if the local socket cannot be bound or connected
    /// to the configured destination.
    pub async fn command(config: &LinkConfig) -> Result<CommandLink> {
        CommandLink::connect(config).await
    }
}

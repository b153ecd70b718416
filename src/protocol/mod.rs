//! Wire protocol for the shore-to-vessel link.
//!
//! This module is the single source of truth for the on-wire format: the
//! identifier constants, the 16-byte information-unit header shared by
//! every packet family, and the per-family codecs.
//!
//! ## Packet Families
//!
//! | Packet | Unit type | Secondary | Param | Length |
//! |---|---|---|---|---|
//! | Speed/heading command | 0x01 | 0x0340 | 0x07 | 28 B |
//! | Route command | 0x01 | 0x0340 | 0x01 | 38 + 15N B |
//! | Platform status | 0x03 | 0x0340 | none | 44 B |
//! | Surface contacts | 0x03 | 0x0E20 | none | 17 + 26M B |
//!
//! All multi-byte integers are big-endian. Every encoder writes the actual
//! encoded length into the header length field; the status decoder checks
//! the declared length against the fixed packet size.
//!
//! The codecs are pure: no I/O, no shared state, safe to call from any
//! number of tasks. The one piece of session state is the rolling 8-bit
//! sequence number, owned by the caller (see
//! [`CommandLink`](crate::commander::CommandLink)).

pub mod command;
pub mod scale;
pub mod telemetry;

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::{LinkError, Result};

pub use command::{
    DecodedRoute, DecodedSpeedHeading, DecodedWaypoint, RouteCommand, SpeedHeadingCommand, Waypoint,
};
pub use telemetry::{ContactBatch, PlatformStatus, SurfaceContact, TargetClass};

/// Unit-type byte for outbound command information-units.
pub const UNIT_TYPE_COMMAND: u8 = 0x01;
/// Unit-type byte for inbound telemetry information-units.
pub const UNIT_TYPE_TELEMETRY: u8 = 0x03;

/// Secondary identifier shared by motion commands and platform status.
pub const SECONDARY_MOTION: u16 = 0x0340;
/// Secondary identifier of the surface-contact batch.
pub const SECONDARY_CONTACTS: u16 = 0x0E20;

/// Parameter-extension tag selecting the speed/heading command variant.
pub const PARAM_SPEED_HEADING: u8 = 0x07;
/// Parameter-extension tag selecting the route command variant.
pub const PARAM_ROUTE: u8 = 0x01;

/// Data-source tag: shore control console.
pub const DATA_SOURCE_SHORE: u8 = 0x01;
/// Data-source tag: unmanned platform.
pub const DATA_SOURCE_VESSEL: u8 = 0x00;

/// Default unicast port for outbound commands (25000).
pub const COMMAND_PORT: u16 = 0x6198;
/// Default shared multicast port for inbound telemetry (26760).
pub const TELEMETRY_PORT: u16 = 0x6688;

/// 16-bit identifier of a shore node or vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitCode(pub u16);

impl UnitCode {
    /// Unit code of the shore control station.
    pub const SHORE_STATION: UnitCode = UnitCode(0x0701);
}

impl std::fmt::Display for UnitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Common header present in every information-unit.
///
/// The one authoritative encoder/decoder for the header layout; every
/// packet family builds on it, so there is exactly one place the field
/// order and widths are written down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitHeader {
    /// Rolling 8-bit sequence number, owned by the sending session.
    pub seq: u8,
    /// Unit-type byte distinguishing command (0x01) and telemetry (0x03).
    pub unit_type: u8,
    /// Declared total length of the information-unit in bytes.
    pub length: u16,
    /// Day-relative timestamp, 0.1 ms units since UTC day start.
    pub timestamp: u32,
    /// Sending node unit code.
    pub sender: UnitCode,
    /// Secondary information-unit identifier.
    pub secondary: u16,
    /// Receiving node unit code.
    pub receiver: UnitCode,
    /// Data-source tag (0x01 shore console, 0x00 unmanned platform).
    pub data_source: u8,
    /// Parameter-extension tag selecting the variant that follows.
    pub param: u8,
}

impl UnitHeader {
    /// Encoded header size in bytes.
    pub const LEN: usize = 16;

    /// Encode the header into the first [`UnitHeader::LEN`] bytes of `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`UnitHeader::LEN`]. Callers size
    /// their packet buffers from the declared length before encoding.
    pub fn encode_into(&self, buf: &mut [u8]) {
        buf[0] = self.seq;
        buf[1] = self.unit_type;
        BigEndian::write_u16(&mut buf[2..4], self.length);
        BigEndian::write_u32(&mut buf[4..8], self.timestamp);
        BigEndian::write_u16(&mut buf[8..10], self.sender.0);
        BigEndian::write_u16(&mut buf[10..12], self.secondary);
        BigEndian::write_u16(&mut buf[12..14], self.receiver.0);
        buf[14] = self.data_source;
        buf[15] = self.param;
    }

    /// Decode a header from the start of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::LEN {
            return Err(LinkError::TruncatedPacket { required: Self::LEN, actual: buf.len() });
        }

        Ok(Self {
            seq: buf[0],
            unit_type: buf[1],
            length: BigEndian::read_u16(&buf[2..4]),
            timestamp: BigEndian::read_u32(&buf[4..8]),
            sender: UnitCode(BigEndian::read_u16(&buf[8..10])),
            secondary: BigEndian::read_u16(&buf[10..12]),
            receiver: UnitCode(BigEndian::read_u16(&buf[12..14])),
            data_source: buf[14],
            param: buf[15],
        })
    }
}

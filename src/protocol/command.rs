//! Outbound command information-units.
//!
//! Two command variants share the 16-byte unit header: the fixed 28-byte
//! speed/heading command and the variable-length multi-waypoint route
//! command. Encoding is pure: the caller supplies the sequence number and
//! the day-relative timestamp, and the vessel table resolves addressing.
//!
//! Decoders for both variants are provided for the vessel-side of the
//! link and for round-trip verification; they recover engineering units
//! through the same scale conversions the encoders apply.
//!
//! Numeric behavior follows the wire format: speeds outside ±3276.7 kn
//! wrap in two's complement and headings are masked to 16 bits, neither
//! is an error. The single structural validation is the route waypoint
//! count, which must lie in [2, 255] and fails construction otherwise.

use byteorder::{BigEndian, ByteOrder};

use crate::config::VesselTable;
use crate::protocol::scale::{decode_geo, decode_tenths, encode_geo, encode_tenths};
use crate::protocol::{
    DATA_SOURCE_SHORE, PARAM_ROUTE, PARAM_SPEED_HEADING, SECONDARY_MOTION, UNIT_TYPE_COMMAND,
    UnitCode, UnitHeader,
};
use crate::{LinkError, Result};

/// Route-type byte: sequential waypoint transit.
pub const ROUTE_TYPE_TRANSIT: u8 = 0x00;

/// One route waypoint in engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    /// Transit speed toward this waypoint, 0.1 kn precision on the wire.
    pub speed_knots: f64,
}

/// Speed/heading command to one vessel.
///
/// Headings are expected pre-normalized to [0, 360); out-of-range values
/// wrap at the bit level, not the value level. Negative speed means
/// reverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedHeadingCommand {
    /// Operator-facing vessel index, resolved through the vessel table.
    pub vessel: u8,
    pub speed_knots: f64,
    pub heading_deg: f64,
}

/// Speed/heading command recovered from wire bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedSpeedHeading {
    pub header: UnitHeader,
    pub speed_knots: f64,
    pub heading_deg: f64,
    /// Executing-platform code from the command trailer.
    pub platform: UnitCode,
}

impl SpeedHeadingCommand {
    /// Encoded packet size in bytes.
    pub const LEN: usize = 28;

    /// Encode into the fixed 28-byte wire layout.
    pub fn encode(&self, seq: u8, table: &VesselTable, timestamp: u32) -> [u8; Self::LEN] {
        let receiver = table.unit_code(self.vessel);
        let header = UnitHeader {
            seq,
            unit_type: UNIT_TYPE_COMMAND,
            length: Self::LEN as u16,
            timestamp,
            sender: UnitCode::SHORE_STATION,
            secondary: SECONDARY_MOTION,
            receiver,
            data_source: DATA_SOURCE_SHORE,
            param: PARAM_SPEED_HEADING,
        };

        let mut buf = [0u8; Self::LEN];
        header.encode_into(&mut buf);
        BigEndian::write_i16(&mut buf[16..18], encode_tenths(self.speed_knots));
        BigEndian::write_u16(&mut buf[18..20], encode_tenths(self.heading_deg) as u16);
        // 20..26: command generation time and command serial, unused on this variant
        BigEndian::write_u16(&mut buf[26..28], receiver.0);
        buf
    }

    /// Decode a speed/heading command from wire bytes.
    pub fn decode(buf: &[u8]) -> Result<DecodedSpeedHeading> {
        if buf.len() < Self::LEN {
            return Err(LinkError::TruncatedPacket { required: Self::LEN, actual: buf.len() });
        }

        let header = UnitHeader::decode(buf)?;
        if header.unit_type != UNIT_TYPE_COMMAND {
            return Err(LinkError::UnexpectedUnitType {
                expected: UNIT_TYPE_COMMAND,
                found: header.unit_type,
            });
        }
        if header.param != PARAM_SPEED_HEADING {
            return Err(LinkError::UnexpectedSubtype {
                expected: PARAM_SPEED_HEADING as u16,
                found: header.param as u16,
            });
        }

        Ok(DecodedSpeedHeading {
            header,
            speed_knots: BigEndian::read_i16(&buf[16..18]) as f64 / 10.0,
            heading_deg: decode_tenths(BigEndian::read_u16(&buf[18..20])),
            platform: UnitCode(BigEndian::read_u16(&buf[26..28])),
        })
    }
}

/// Multi-waypoint route command to one vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCommand {
    /// Operator-facing vessel index, resolved through the vessel table.
    pub vessel: u8,
    /// Ordered transit waypoints; the count must lie in [2, 255].
    pub waypoints: Vec<Waypoint>,
}

/// One waypoint record recovered from wire bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedWaypoint {
    /// 1-based position of the record within the route.
    pub index: u8,
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub speed_knots: f64,
}

/// Route command recovered from wire bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRoute {
    pub header: UnitHeader,
    pub route_type: u8,
    pub platform: UnitCode,
    pub waypoints: Vec<DecodedWaypoint>,
}

impl RouteCommand {
    /// Fixed bytes of a route packet: 36-byte header block + 2-byte trailer.
    pub const BASE_LEN: usize = 38;
    /// Encoded size of one waypoint record.
    pub const WAYPOINT_LEN: usize = 15;
    /// Offset of the first waypoint record.
    const WAYPOINTS_AT: usize = 36;

    /// Total encoded length of a route carrying `count` waypoints.
    pub fn encoded_len(count: usize) -> usize {
        Self::BASE_LEN + Self::WAYPOINT_LEN * count
    }

    /// Encode into the 38 + 15N wire layout.
    ///
    /// Fails with [`LinkError::InvalidWaypointCount`] when the waypoint
    /// count is outside [2, 255]; the count is never clamped. Geographic
    /// range is not validated here: out-of-range coordinates wrap in the
    /// geo fixed-point conversion, and bounds enforcement belongs to the
    /// operator-facing layer.
    pub fn encode(&self, seq: u8, table: &VesselTable, timestamp: u32) -> Result<Vec<u8>> {
        let count = self.waypoints.len();
        if !(2..=255).contains(&count) {
            return Err(LinkError::InvalidWaypointCount { count });
        }

        let total = Self::encoded_len(count);
        let receiver = table.unit_code(self.vessel);
        let header = UnitHeader {
            seq,
            unit_type: UNIT_TYPE_COMMAND,
            length: total as u16,
            timestamp,
            sender: UnitCode::SHORE_STATION,
            secondary: SECONDARY_MOTION,
            receiver,
            data_source: DATA_SOURCE_SHORE,
            param: PARAM_ROUTE,
        };

        let mut buf = vec![0u8; total];
        header.encode_into(&mut buf);
        buf[16] = count as u8;
        buf[17] = ROUTE_TYPE_TRANSIT;
        // 18..24: command generation time and command serial, unused
        BigEndian::write_u16(&mut buf[24..26], receiver.0);
        // 26..36: reserved

        let mut offset = Self::WAYPOINTS_AT;
        for (i, waypoint) in self.waypoints.iter().enumerate() {
            buf[offset] = (i + 1) as u8;
            BigEndian::write_i32(&mut buf[offset + 1..offset + 5], encode_geo(waypoint.longitude_deg));
            BigEndian::write_i32(&mut buf[offset + 5..offset + 9], encode_geo(waypoint.latitude_deg));
            BigEndian::write_i16(&mut buf[offset + 9..offset + 11], encode_tenths(waypoint.speed_knots));
            // offset+11..offset+15: per-waypoint reserved trailer
            offset += Self::WAYPOINT_LEN;
        }
        // 2-byte packet trailer stays zero

        // Post-condition: offset arithmetic must land exactly on the
        // declared length, catching codec drift against the header field.
        assert_eq!(offset + 2, total, "route encoding drifted from declared length");
        Ok(buf)
    }

    /// Decode a route command from wire bytes.
    pub fn decode(buf: &[u8]) -> Result<DecodedRoute> {
        if buf.len() < Self::BASE_LEN {
            return Err(LinkError::TruncatedPacket { required: Self::BASE_LEN, actual: buf.len() });
        }

        let header = UnitHeader::decode(buf)?;
        if header.unit_type != UNIT_TYPE_COMMAND {
            return Err(LinkError::UnexpectedUnitType {
                expected: UNIT_TYPE_COMMAND,
                found: header.unit_type,
            });
        }
        if header.param != PARAM_ROUTE {
            return Err(LinkError::UnexpectedSubtype {
                expected: PARAM_ROUTE as u16,
                found: header.param as u16,
            });
        }

        let count = buf[16] as usize;
        let required = Self::encoded_len(count);
        if buf.len() < required {
            return Err(LinkError::TruncatedPacket { required, actual: buf.len() });
        }

        let mut waypoints = Vec::with_capacity(count);
        for i in 0..count {
            let at = Self::WAYPOINTS_AT + i * Self::WAYPOINT_LEN;
            waypoints.push(DecodedWaypoint {
                index: buf[at],
                longitude_deg: decode_geo(BigEndian::read_i32(&buf[at + 1..at + 5])),
                latitude_deg: decode_geo(BigEndian::read_i32(&buf[at + 5..at + 9])),
                speed_knots: BigEndian::read_i16(&buf[at + 9..at + 11]) as f64 / 10.0,
            });
        }

        Ok(DecodedRoute {
            header,
            route_type: buf[17],
            platform: UnitCode(BigEndian::read_u16(&buf[24..26])),
            waypoints,
        })
    }
}

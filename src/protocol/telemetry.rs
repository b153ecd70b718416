//! Inbound telemetry information-units.
//!
//! Two packet families arrive on distinct multicast groups: the fixed
//! 44-byte platform status and the variable-length surface-contact batch
//! (17 + 26M bytes). Decoding is stateless and all-or-nothing: each
//! datagram is one independent snapshot, validated before any field is
//! converted, and a validation failure never yields a partial record.
//!
//! Both families also encode (the vessel side of the link), which is what
//! the round-trip tests and the replay tooling build their fixtures with.
//! Encoders always write the actual encoded length into the header's
//! declared-length field, whatever the input header carries.
//!
//! Watch the two angular scale families: platform heading/course/gimbal/
//! body angle and contact bearing are 2¹⁵-scale values, while contact
//! heading is a plain tenth-degree value.

use byteorder::{BigEndian, ByteOrder};

use crate::protocol::scale::{
    decode_angle15, decode_geo, decode_tenths, encode_angle15, encode_geo, encode_tenths,
};
use crate::protocol::{SECONDARY_CONTACTS, UNIT_TYPE_TELEMETRY, UnitHeader};
use crate::{LinkError, Result};

/// Decoded platform-status record in engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformStatus {
    pub header: UnitHeader,
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    /// Altitude (positive) or depth (negative), metres.
    pub altitude_m: i16,
    pub speed_knots: f64,
    pub heading_deg: f64,
    pub course_deg: f64,
    /// Course rate, raw wire units (scale vendor-defined).
    pub course_rate: i16,
    pub operating_mode: u8,
    /// True when the report comes from a simulated platform.
    pub simulated: bool,
    pub gimbal_deg: f64,
    pub ammunition: u8,
    /// Remaining fuel or battery, percent.
    pub energy_pct: u8,
    pub body_angle_deg: f64,
    pub reserved: i16,
}

impl PlatformStatus {
    /// Fixed packet size in bytes.
    pub const LEN: usize = 44;

    /// Decode a platform-status packet.
    ///
    /// Checked in order: buffer length, unit-type byte, declared length.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::LEN {
            return Err(LinkError::TruncatedPacket { required: Self::LEN, actual: buf.len() });
        }

        let header = UnitHeader::decode(buf)?;
        if header.unit_type != UNIT_TYPE_TELEMETRY {
            return Err(LinkError::UnexpectedUnitType {
                expected: UNIT_TYPE_TELEMETRY,
                found: header.unit_type,
            });
        }
        if header.length as usize != Self::LEN {
            return Err(LinkError::decode_error(
                "platform status",
                format!("declared length {} does not match fixed length {}", header.length, Self::LEN),
            ));
        }

        Ok(Self {
            header,
            longitude_deg: decode_geo(BigEndian::read_i32(&buf[16..20])),
            latitude_deg: decode_geo(BigEndian::read_i32(&buf[20..24])),
            altitude_m: BigEndian::read_i16(&buf[24..26]),
            speed_knots: BigEndian::read_i16(&buf[26..28]) as f64 / 10.0,
            heading_deg: decode_angle15(BigEndian::read_u16(&buf[28..30])),
            course_deg: decode_angle15(BigEndian::read_u16(&buf[30..32])),
            course_rate: BigEndian::read_i16(&buf[32..34]),
            operating_mode: buf[34],
            simulated: buf[35] != 0,
            gimbal_deg: decode_angle15(BigEndian::read_u16(&buf[36..38])),
            ammunition: buf[38],
            energy_pct: buf[39],
            body_angle_deg: decode_angle15(BigEndian::read_u16(&buf[40..42])),
            reserved: BigEndian::read_i16(&buf[42..44]),
        })
    }

    /// Encode into the fixed 44-byte wire layout.
    ///
    /// The header's declared-length field is written as 44 regardless of
    /// the value carried in `self.header`.
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        let header = UnitHeader { length: Self::LEN as u16, ..self.header };
        header.encode_into(&mut buf);

        BigEndian::write_i32(&mut buf[16..20], encode_geo(self.longitude_deg));
        BigEndian::write_i32(&mut buf[20..24], encode_geo(self.latitude_deg));
        BigEndian::write_i16(&mut buf[24..26], self.altitude_m);
        BigEndian::write_i16(&mut buf[26..28], encode_tenths(self.speed_knots));
        BigEndian::write_u16(&mut buf[28..30], encode_angle15(self.heading_deg));
        BigEndian::write_u16(&mut buf[30..32], encode_angle15(self.course_deg));
        BigEndian::write_i16(&mut buf[32..34], self.course_rate);
        buf[34] = self.operating_mode;
        buf[35] = self.simulated as u8;
        BigEndian::write_u16(&mut buf[36..38], encode_angle15(self.gimbal_deg));
        buf[38] = self.ammunition;
        buf[39] = self.energy_pct;
        BigEndian::write_u16(&mut buf[40..42], encode_angle15(self.body_angle_deg));
        BigEndian::write_i16(&mut buf[42..44], self.reserved);
        buf
    }
}

/// Classification code of a surface contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetClass {
    Unknown,
    Ship,
    SmallCraft,
    Buoy,
    /// Any code outside the known set, carried verbatim.
    Other(u16),
}

impl TargetClass {
    /// Map a wire code onto the classification.
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => TargetClass::Unknown,
            1 => TargetClass::Ship,
            2 => TargetClass::SmallCraft,
            3 => TargetClass::Buoy,
            other => TargetClass::Other(other),
        }
    }

    /// The wire code of this classification.
    pub fn code(self) -> u16 {
        match self {
            TargetClass::Unknown => 0,
            TargetClass::Ship => 1,
            TargetClass::SmallCraft => 2,
            TargetClass::Buoy => 3,
            TargetClass::Other(code) => code,
        }
    }
}

/// One surface contact in engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceContact {
    /// Track/batch identifier assigned by the reporting platform.
    pub target_id: u16,
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    /// Bearing from the reporting platform, 2¹⁵ angular scale.
    pub bearing_deg: f64,
    pub range_m: u32,
    pub speed_knots: f64,
    /// Contact heading, tenth-degree scale, NOT the 2¹⁵ angular scale.
    pub heading_deg: f64,
    pub class: TargetClass,
    /// Vendor-defined feature bitmask, carried verbatim.
    pub features: u32,
}

impl SurfaceContact {
    /// Encoded size of one contact record.
    pub const LEN: usize = 26;

    fn decode_record(buf: &[u8]) -> Self {
        Self {
            target_id: BigEndian::read_u16(&buf[0..2]),
            longitude_deg: decode_geo(BigEndian::read_i32(&buf[2..6])),
            latitude_deg: decode_geo(BigEndian::read_i32(&buf[6..10])),
            bearing_deg: decode_angle15(BigEndian::read_u16(&buf[10..12])),
            range_m: BigEndian::read_u32(&buf[12..16]),
            speed_knots: decode_tenths(BigEndian::read_u16(&buf[16..18])),
            heading_deg: decode_tenths(BigEndian::read_u16(&buf[18..20])),
            class: TargetClass::from_code(BigEndian::read_u16(&buf[20..22])),
            features: BigEndian::read_u32(&buf[22..26]),
        }
    }

    fn encode_record(&self, buf: &mut [u8]) {
        BigEndian::write_u16(&mut buf[0..2], self.target_id);
        BigEndian::write_i32(&mut buf[2..6], encode_geo(self.longitude_deg));
        BigEndian::write_i32(&mut buf[6..10], encode_geo(self.latitude_deg));
        BigEndian::write_u16(&mut buf[10..12], encode_angle15(self.bearing_deg));
        BigEndian::write_u32(&mut buf[12..16], self.range_m);
        BigEndian::write_u16(&mut buf[16..18], encode_tenths(self.speed_knots) as u16);
        BigEndian::write_u16(&mut buf[18..20], encode_tenths(self.heading_deg) as u16);
        BigEndian::write_u16(&mut buf[20..22], self.class.code());
        BigEndian::write_u32(&mut buf[22..26], self.features);
    }
}

/// Decoded surface-contact batch: one datagram, one snapshot.
///
/// Contacts preserve wire order. An empty batch (count 0) is a valid
/// result, distinct from a decode failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactBatch {
    pub header: UnitHeader,
    pub contacts: Vec<SurfaceContact>,
}

impl ContactBatch {
    /// Bytes before the first contact record: unit header + count byte.
    pub const HEADER_LEN: usize = 17;

    /// Total encoded length of a batch carrying `count` contacts.
    pub fn encoded_len(count: usize) -> usize {
        Self::HEADER_LEN + SurfaceContact::LEN * count
    }

    /// Decode a surface-contact batch.
    ///
    /// Checked in order: minimum length, unit-type byte, secondary
    /// identifier, then the count-derived total length.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::HEADER_LEN {
            return Err(LinkError::TruncatedPacket {
                required: Self::HEADER_LEN,
                actual: buf.len(),
            });
        }

        let header = UnitHeader::decode(buf)?;
        if header.unit_type != UNIT_TYPE_TELEMETRY {
            return Err(LinkError::UnexpectedUnitType {
                expected: UNIT_TYPE_TELEMETRY,
                found: header.unit_type,
            });
        }
        if header.secondary != SECONDARY_CONTACTS {
            return Err(LinkError::UnexpectedSubtype {
                expected: SECONDARY_CONTACTS,
                found: header.secondary,
            });
        }

        let count = buf[16] as usize;
        let required = Self::encoded_len(count);
        if buf.len() < required {
            return Err(LinkError::TruncatedPacket { required, actual: buf.len() });
        }

        let contacts = (0..count)
            .map(|i| {
                let at = Self::HEADER_LEN + i * SurfaceContact::LEN;
                SurfaceContact::decode_record(&buf[at..at + SurfaceContact::LEN])
            })
            .collect();

        Ok(Self { header, contacts })
    }

    /// Encode into the 17 + 26M wire layout.
    ///
    /// Fails when the batch carries more than 255 contacts: the count
    /// field is a single byte and the batch is never truncated to fit.
    /// The declared-length field is written from the actual encoded size.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let count = self.contacts.len();
        if count > 255 {
            return Err(LinkError::decode_error(
                "contact batch",
                format!("target count {count} exceeds the one-byte count field"),
            ));
        }

        let total = Self::encoded_len(count);
        let mut buf = vec![0u8; total];
        let header = UnitHeader { length: total as u16, ..self.header };
        header.encode_into(&mut buf);
        buf[16] = count as u8;

        for (i, contact) in self.contacts.iter().enumerate() {
            let at = Self::HEADER_LEN + i * SurfaceContact::LEN;
            contact.encode_record(&mut buf[at..at + SurfaceContact::LEN]);
        }
        Ok(buf)
    }
}

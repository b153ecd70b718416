//! Link configuration and vessel addressing.
//!
//! Addressing is configuration, not global state: the vessel table is
//! loaded once (YAML or [`Default`]) and injected into encoder calls.
//! Defaults reproduce the interface-control constants: command unicast to
//! port 25000 (0x6198), telemetry on two IPv4 multicast groups sharing
//! port 26760 (0x6688).
//!
//! ```rust
//! use shorelink::config::LinkConfig;
//!
//! let config = LinkConfig::default();
//! assert_eq!(config.vessels.unit_code(3).0, 0x5003);
//! // Out-of-table indices fall back to the first entry, never an error
//! assert_eq!(config.vessels.unit_code(99).0, 0x5001);
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::protocol::{COMMAND_PORT, TELEMETRY_PORT, UnitCode};
use crate::{LinkError, Result};

/// One vessel-table row binding a small operator-facing index to a unit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesselEntry {
    /// Operator-facing vessel index (1-based).
    pub index: u8,
    /// Protocol unit code of the vessel.
    pub code: UnitCode,
}

/// Immutable mapping from vessel index to unit code.
///
/// Lookup never fails: an index outside the table resolves to the FIRST
/// table entry's code. The table is non-empty by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselTable {
    entries: Vec<VesselEntry>,
}

impl VesselTable {
    /// Build a table from explicit entries.
    ///
    /// Fails with [`LinkError::Config`] on an empty table: the fallback
    /// rule needs a first entry to point at.
    pub fn new(entries: Vec<VesselEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(LinkError::config_error("vessel table must not be empty"));
        }
        Ok(Self { entries })
    }

    /// Resolve a vessel index to its unit code.
    ///
    /// Unknown indices resolve to the first table entry's code.
    pub fn unit_code(&self, index: u8) -> UnitCode {
        self.entries
            .iter()
            .find(|entry| entry.index == index)
            .map(|entry| entry.code)
            .unwrap_or(self.entries[0].code)
    }

    /// All table entries in declaration order.
    pub fn entries(&self) -> &[VesselEntry] {
        &self.entries
    }
}

impl Default for VesselTable {
    fn default() -> Self {
        Self {
            entries: (1..=5)
                .map(|index| VesselEntry { index, code: UnitCode(0x5000 + index as u16) })
                .collect(),
        }
    }
}

/// Outbound command transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Unicast destination of the vessel control endpoint.
    pub destination: SocketAddr,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self { destination: SocketAddr::from(([192, 168, 2, 2], COMMAND_PORT)) }
    }
}

/// Inbound telemetry transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Multicast group carrying platform-status packets.
    pub status_group: Ipv4Addr,
    /// Multicast group carrying surface-contact packets.
    pub contact_group: Ipv4Addr,
    /// Shared UDP port for both groups.
    pub port: u16,
    /// Local interface to join on; unspecified joins on the default route.
    #[serde(default = "unspecified")]
    pub interface: Ipv4Addr,
}

fn unspecified() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            status_group: Ipv4Addr::new(226, 100, 100, 101),
            contact_group: Ipv4Addr::new(226, 100, 100, 102),
            port: TELEMETRY_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
        }
    }
}

/// Complete link configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LinkConfig {
    /// Outbound command transport.
    pub command: CommandConfig,
    /// Inbound telemetry transport.
    pub telemetry: TelemetryConfig,
    /// Vessel addressing table.
    pub vessels: VesselTable,
}

impl LinkConfig {
    /// Parse a configuration from YAML text and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: LinkConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| LinkError::config_error(format!("YAML parse failed: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            LinkError::config_error(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Validate structural invariants the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.vessels.entries.is_empty() {
            return Err(LinkError::config_error("vessel table must not be empty"));
        }
        if !self.telemetry.status_group.is_multicast() {
            return Err(LinkError::config_error(format!(
                "status group {} is not a multicast address",
                self.telemetry.status_group
            )));
        }
        if !self.telemetry.contact_group.is_multicast() {
            return Err(LinkError::config_error(format!(
                "contact group {} is not a multicast address",
                self.telemetry.contact_group
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_maps_all_five_vessels() {
        let table = VesselTable::default();
        for index in 1..=5u8 {
            assert_eq!(table.unit_code(index), UnitCode(0x5000 + index as u16));
        }
    }

    #[test]
    fn unknown_index_falls_back_to_first_entry() {
        let table = VesselTable::default();
        assert_eq!(table.unit_code(0), UnitCode(0x5001));
        assert_eq!(table.unit_code(6), UnitCode(0x5001));
        assert_eq!(table.unit_code(255), UnitCode(0x5001));

        // The fallback is the first entry, not the lowest index
        let table = VesselTable::new(vec![
            VesselEntry { index: 9, code: UnitCode(0x5109) },
            VesselEntry { index: 1, code: UnitCode(0x5101) },
        ])
        .unwrap();
        assert_eq!(table.unit_code(42), UnitCode(0x5109));
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = VesselTable::new(Vec::new()).unwrap_err();
        assert!(matches!(err, LinkError::Config { .. }));
    }

    #[test]
    fn default_config_matches_icd_constants() {
        let config = LinkConfig::default();
        assert_eq!(config.command.destination.port(), 0x6198);
        assert_eq!(config.telemetry.port, 0x6688);
        assert_eq!(config.telemetry.status_group, Ipv4Addr::new(226, 100, 100, 101));
        assert_eq!(config.telemetry.contact_group, Ipv4Addr::new(226, 100, 100, 102));
        config.validate().expect("defaults must validate");
    }

    #[test]
    fn yaml_round_trip() {
        let config = LinkConfig::default();
        let yaml = serde_yaml_ng::to_string(&config).expect("serialize");
        let parsed = LinkConfig::from_yaml_str(&yaml).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn yaml_overrides_destination() {
        let yaml = r#"
command:
  destination: "10.1.0.7:4000"
"#;
        let config = LinkConfig::from_yaml_str(yaml).expect("parse");
        assert_eq!(config.command.destination, SocketAddr::from(([10, 1, 0, 7], 4000)));
        // Unspecified sections keep their defaults
        assert_eq!(config.telemetry.port, 0x6688);
        assert_eq!(config.vessels, VesselTable::default());
    }

    #[test]
    fn non_multicast_group_is_rejected() {
        let yaml = r#"
telemetry:
  status_group: "192.168.1.1"
  contact_group: "226.100.100.102"
  port: 26760
"#;
        let err = LinkConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, LinkError::Config { .. }));
    }
}

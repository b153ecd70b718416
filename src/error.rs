//! Error types for link and codec operations.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context so transport and presentation layers can pattern-match on the
//! failure kind instead of string-matching messages.
//!
//! ## Error Categories
//!
//! - **Codec Errors**: `InvalidWaypointCount`, `TruncatedPacket`,
//!   `UnexpectedUnitType`, `UnexpectedSubtype`, `Decode`. Produced by the
//!   protocol encoders/decoders. These are all-or-nothing: a failed decode
//!   never yields a partial record.
//! - **Transport Errors**: `Socket`, `Log`. Produced by the datagram
//!   sources and the command link.
//! - **Configuration Errors**: `Config`. Produced when loading or
//!   validating a [`LinkConfig`](crate::config::LinkConfig).
//!
//! ## Recovery
//!
//! [`LinkError::is_retryable`] classifies errors for receive loops: socket
//! errors are worth retrying, codec errors are a property of the datagram
//! and never are. A malformed datagram is dropped and logged, and is never
//! allowed to terminate the receive loop.
//!
//! ```rust
//! use shorelink::LinkError;
//!
//! let error = LinkError::TruncatedPacket { required: 44, actual: 12 };
//! assert!(!error.is_retryable());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for link and codec operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    /// Route construction rejected: waypoint count outside [2, 255].
    ///
    /// This is a construction-time error. The encoder never clamps the
    /// count or truncates the waypoint list.
    #[error("invalid waypoint count {count}: a route carries 2..=255 waypoints")]
    InvalidWaypointCount { count: usize },

    /// Buffer shorter than a fixed or length-derived threshold.
    #[error("truncated packet: need {required} bytes, got {actual}")]
    TruncatedPacket { required: usize, actual: usize },

    /// Header unit-type byte does not match the expected packet family.
    ///
    /// Signals that a different packet family arrived on this channel,
    /// not that the datagram is corrupt.
    #[error("unexpected unit type {found:#04x}, expected {expected:#04x}")]
    UnexpectedUnitType { expected: u8, found: u8 },

    /// Header secondary identifier does not match the expected variant.
    #[error("unexpected secondary identifier {found:#06x}, expected {expected:#06x}")]
    UnexpectedSubtype { expected: u16, found: u16 },

    /// Any other decode failure (arithmetic/format), with the original cause.
    #[error("decode error in {context}: {details}")]
    Decode { context: String, details: String },

    /// Socket operation failed.
    #[error("socket error during {operation}")]
    Socket {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Datagram log file error.
    #[error("datagram log error: {path}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid or unloadable configuration.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl LinkError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Codec errors are a property of the datagram and are never
    /// retryable; transport errors may be transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            LinkError::Socket { .. } => true,
            LinkError::InvalidWaypointCount { .. } => false,
            LinkError::TruncatedPacket { .. } => false,
            LinkError::UnexpectedUnitType { .. } => false,
            LinkError::UnexpectedSubtype { .. } => false,
            LinkError::Decode { .. } => false,
            LinkError::Log { .. } => false,
            LinkError::Config { .. } => false,
        }
    }

    /// Helper constructor for generic decode errors.
    pub fn decode_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        LinkError::Decode { context: context.into(), details: details.into() }
    }

    /// Helper constructor for socket errors with operation context.
    pub fn socket_error(operation: impl Into<String>, source: std::io::Error) -> Self {
        LinkError::Socket { operation: operation.into(), source }
    }

    /// Helper constructor for datagram log errors with path context.
    pub fn log_error(path: PathBuf, source: std::io::Error) -> Self {
        LinkError::Log { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(reason: impl Into<String>) -> Self {
        LinkError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Socket { operation: "socket I/O".to_string(), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_contain_their_context(
                required in 0usize..4096,
                actual in 0usize..4096,
                expected_type in 0u8..=255,
                found_type in 0u8..=255,
                context in "\\w+",
                details in "[a-z ]*"
            ) {
                let truncated = LinkError::TruncatedPacket { required, actual };
                let msg = truncated.to_string();
                prop_assert!(msg.contains(&required.to_string()));
                prop_assert!(msg.contains(&actual.to_string()));

                let unit = LinkError::UnexpectedUnitType {
                    expected: expected_type,
                    found: found_type,
                };
                let msg = unit.to_string();
                let found_hex = format!("{:#04x}", found_type);
                let expected_hex = format!("{:#04x}", expected_type);
                prop_assert!(msg.contains(&found_hex));
                prop_assert!(msg.contains(&expected_hex));

                let decode = LinkError::decode_error(context.clone(), details.clone());
                let msg = decode.to_string();
                prop_assert!(msg.contains(&context));
                prop_assert!(msg.contains(&details));
            }

            #[test]
            fn codec_errors_are_never_retryable(count in 0usize..10_000) {
                let invalid_count = LinkError::InvalidWaypointCount { count };
                prop_assert!(!invalid_count.is_retryable());
                let truncated = LinkError::TruncatedPacket { required: count, actual: 0 };
                prop_assert!(!truncated.is_retryable());
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        // Compile-time check: LinkError must be Send + Sync + 'static
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<LinkError>();

        let error = LinkError::decode_error("contact record", "bad field");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retryable_classification() {
        let socket = LinkError::socket_error(
            "recv",
            std::io::Error::new(std::io::ErrorKind::WouldBlock, "test"),
        );
        assert!(socket.is_retryable());

        assert!(!LinkError::UnexpectedSubtype { expected: 0x0E20, found: 0x0340 }.is_retryable());
        assert!(!LinkError::config_error("empty vessel table").is_retryable());
    }

    #[test]
    fn from_io_error_maps_to_socket() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: LinkError = io_err.into();
        assert!(matches!(err, LinkError::Socket { .. }));
    }
}

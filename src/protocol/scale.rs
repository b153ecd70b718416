//! Fixed-point scale conversions between wire encodings and engineering units.
//!
//! The wire format carries three distinct scale families. Callers must not
//! conflate them:
//!
//! - **Geo fixed-point**: degrees × 2³¹/180 in a signed 32-bit field
//!   (longitude/latitude everywhere).
//! - **Angular fixed-point**: degrees × 2¹⁵/180 in a 16-bit field
//!   (platform heading/course/gimbal/body angle, contact bearing).
//! - **Tenths**: value × 10 in a 16-bit field (speeds in 0.1 kn, contact
//!   heading in 0.1°).
//!
//! All functions are pure and total. Inputs outside the documented domain
//! truncate or wrap exactly like the fixed-width wire field they feed;
//! mirroring two's-complement arithmetic is wire-faithful behavior here,
//! not an error. The one structural validation in the protocol (route
//! waypoint count) lives with the route encoder, not in this module.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of 0.1 ms ticks in one day. Day-relative timestamps lie in
/// `[0, DAY_TICKS)`.
pub const DAY_TICKS: u32 = 864_000_000;

const GEO_SCALE: f64 = (1u64 << 31) as f64 / 180.0;
const ANGLE15_SCALE: f64 = (1u32 << 15) as f64 / 180.0;

/// Encode degrees into the signed 32-bit geo fixed-point format.
///
/// `round(degrees / 180 × 2³¹)`, wrapping at the 32-bit boundary. The
/// useful domain is [-180, 180); +180.0 wraps to the same raw value as
/// -180.0, as the wire field does.
pub fn encode_geo(degrees: f64) -> i32 {
    (degrees * GEO_SCALE).round() as i64 as i32
}

/// Decode the signed 32-bit geo fixed-point format into degrees.
///
/// Inverse of [`encode_geo`] to within one fixed-point step (180/2³¹ °).
pub fn decode_geo(raw: i32) -> f64 {
    raw as f64 / GEO_SCALE
}

/// Encode degrees into the 16-bit angular fixed-point format (scale 2¹⁵).
///
/// Domain [0, 360); 360.0 wraps to 0 at the bit level.
pub fn encode_angle15(degrees: f64) -> u16 {
    (degrees * ANGLE15_SCALE).round() as i64 as u16
}

/// Decode the 16-bit angular fixed-point format into degrees in [0, 360).
pub fn decode_angle15(raw: u16) -> f64 {
    raw as f64 / ANGLE15_SCALE
}

/// Decode a tenth-scaled 16-bit field into its engineering value.
///
/// Used for contact heading (0.1°) and all 0.1 kn speed fields. This is
/// the ×10 family, distinct from the 2¹⁵ angular scale above.
pub fn decode_tenths(raw: u16) -> f64 {
    raw as f64 / 10.0
}

/// Encode a value into a tenth-scaled signed 16-bit field.
///
/// Truncates toward zero after scaling; values outside ±3276.7 wrap in
/// two's complement, which is accepted wire behavior.
pub fn encode_tenths(value: f64) -> i16 {
    (value * 10.0) as i64 as i16
}

/// Day-relative timestamp: 0.1 ms ticks elapsed since the UTC day start.
///
/// Always in `[0, DAY_TICKS)`; rolls over to 0 at midnight with no
/// negative values. Truncates toward zero. Times before the Unix epoch
/// saturate to the epoch (and so to tick 0).
pub fn day_relative_timestamp(now: SystemTime) -> u32 {
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
    let secs_today = since_epoch.as_secs() % 86_400;
    secs_today as u32 * 10_000 + since_epoch.subsec_micros() / 100
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const GEO_STEP: f64 = 180.0 / (1u64 << 31) as f64;
    const ANGLE15_STEP: f64 = 180.0 / (1u32 << 15) as f64;

    #[test]
    fn geo_known_values() {
        assert_eq!(encode_geo(0.0), 0);
        assert_eq!(encode_geo(90.0), 1 << 30);
        assert_eq!(encode_geo(-90.0), -(1 << 30));
        // +180 wraps to the i32 minimum, same raw value as -180
        assert_eq!(encode_geo(180.0), i32::MIN);
        assert_eq!(encode_geo(-180.0), i32::MIN);
    }

    #[test]
    fn angle15_known_values() {
        assert_eq!(encode_angle15(0.0), 0);
        assert_eq!(encode_angle15(90.0), 1 << 14);
        assert_eq!(encode_angle15(180.0), 1 << 15);
        // 360 wraps to 0 at the bit level
        assert_eq!(encode_angle15(360.0), 0);
    }

    #[test]
    fn tenths_known_values() {
        assert_eq!(encode_tenths(10.5), 105);
        assert_eq!(encode_tenths(-3.2), -32);
        assert_eq!(decode_tenths(450), 45.0);
        // 0.1 kn precision truncates toward zero
        assert_eq!(encode_tenths(0.19), 1);
        assert_eq!(encode_tenths(-0.19), -1);
    }

    #[test]
    fn timestamp_epoch_and_rollover() {
        assert_eq!(day_relative_timestamp(UNIX_EPOCH), 0);

        // One tick before midnight, then midnight itself
        let last = UNIX_EPOCH + Duration::new(86_399, 999_900_000);
        assert_eq!(day_relative_timestamp(last), DAY_TICKS - 1);
        let midnight = UNIX_EPOCH + Duration::from_secs(86_400);
        assert_eq!(day_relative_timestamp(midnight), 0);

        // Pre-epoch times saturate to tick 0 rather than going negative
        let before = UNIX_EPOCH - Duration::from_secs(5);
        assert_eq!(day_relative_timestamp(before), 0);
    }

    #[test]
    fn timestamp_tenth_millisecond_precision() {
        let t = UNIX_EPOCH + Duration::new(12 * 3600, 123_400_000);
        assert_eq!(day_relative_timestamp(t), 12 * 3600 * 10_000 + 1234);
    }

    proptest! {
        #[test]
        fn geo_round_trip_within_one_step(degrees in -180.0f64..180.0) {
            let decoded = decode_geo(encode_geo(degrees));
            prop_assert!(
                (decoded - degrees).abs() <= GEO_STEP,
                "{} -> {} drifted more than one step",
                degrees,
                decoded
            );
        }

        #[test]
        fn angle15_round_trip_within_one_step(degrees in 0.0f64..360.0) {
            let decoded = decode_angle15(encode_angle15(degrees));
            // 360-epsilon rounds up to the wrap point, which reads back as 0
            let distance = (decoded - degrees).abs().min((decoded + 360.0 - degrees).abs());
            prop_assert!(
                distance <= ANGLE15_STEP,
                "{} -> {} drifted more than one step",
                degrees,
                decoded
            );
        }

        #[test]
        fn timestamp_always_in_day_range(secs in 0u64..4_000_000_000, nanos in 0u32..1_000_000_000) {
            let t = UNIX_EPOCH + Duration::new(secs, nanos);
            let ticks = day_relative_timestamp(t);
            prop_assert!(ticks < DAY_TICKS);
        }

        #[test]
        fn timestamp_monotone_within_a_day(
            base in 0u64..3_000_000_000u64,
            a in 0u64..86_400_000u64,
            b in 0u64..86_400_000u64,
        ) {
            // Clamp both instants into the same UTC day, then order them
            let day_start = base - base % 86_400;
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let t0 = UNIX_EPOCH + Duration::from_secs(day_start) + Duration::from_millis(early);
            let t1 = UNIX_EPOCH + Duration::from_secs(day_start) + Duration::from_millis(late);
            prop_assert!(day_relative_timestamp(t0) <= day_relative_timestamp(t1));
        }
    }
}

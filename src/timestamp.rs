//! UUIDv1 time-field codec and timestamp conversions.
//!
//! RFC 4122 stores the 60-bit timestamp of a version 1 UUID out of order: the least significant
//! 32 bits come first (`time_low`), followed by the middle 16 bits (`time_mid`) and the most
//! significant 12 bits sharing a 16-bit word with the version nibble (`time_hi_and_version`).
//!
//! ```text
//!  tick (60 bits):   0000 hhhh hhhh hhhh  mmmm mmmm mmmm mmmm  llll .... .... llll (32 bits)
//!  time field:       llll .... .... llll (32 bits)  mmmm mmmm mmmm mmmm  0001 hhhh hhhh hhhh
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of 100-nanosecond intervals between the UUID epoch (1582-10-15T00:00:00Z) and the Unix
/// epoch (1970-01-01T00:00:00Z).
pub const GREGORIAN_OFFSET: u64 = 0x01b2_1dd2_1381_4000;

/// Number of 100-nanosecond ticks in one millisecond.
pub const TICKS_PER_MS: u64 = 10_000;

/// Largest value representable in the 60-bit time field.
pub const MAX_TICK: u64 = (1 << 60) - 1;

/// Largest Unix timestamp in milliseconds whose every tick fits in the 60-bit time field
/// (year 5236).
pub const MAX_UNIX_TS_MS: u64 = (MAX_TICK - GREGORIAN_OFFSET - (TICKS_PER_MS - 1)) / TICKS_PER_MS;

/// Error converting a timestamp into a UUIDv1 tick.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, thiserror::Error)]
pub enum TimestampError {
    /// The timestamp precedes the Unix epoch.
    #[error("timestamp precedes the Unix epoch")]
    BeforeUnixEpoch,

    /// The timestamp does not fit in the 60-bit UUID time field.
    #[error("timestamp {unix_ts_ms} ms is beyond the range of the UUID time field")]
    OutOfRange {
        /// The rejected Unix timestamp in milliseconds.
        unix_ts_ms: u64,
    },
}

/// Scrambles a 60-bit tick count into the 64-bit `time_low | time_mid | time_hi_and_version`
/// layout, setting the version nibble to `0001`.
///
/// Bits above the 60th are ignored.
///
/// # Examples
///
/// ```rust
/// use timeuuid1::timestamp::encode_time_field;
///
/// assert_eq!(encode_time_field(0x0123_4567_89ab_cde), 0x789a_bcde_3456_1012);
/// ```
pub const fn encode_time_field(tick: u64) -> u64 {
    (tick << 32) | ((tick & 0x0000_ffff_0000_0000) >> 16) | ((tick >> 48) & 0x0fff) | 0x1000
}

/// Restores the 60-bit tick count from a scrambled time field, discarding the version nibble.
///
/// # Examples
///
/// ```rust
/// use timeuuid1::timestamp::decode_time_field;
///
/// assert_eq!(decode_time_field(0x789a_bcde_3456_1012), 0x0123_4567_89ab_cde);
/// ```
pub const fn decode_time_field(time_field: u64) -> u64 {
    (time_field >> 32) | ((time_field & 0x0000_0000_ffff_0000) << 16) | ((time_field & 0x0fff) << 48)
}

/// Converts a Unix timestamp in milliseconds into the first tick of that millisecond.
pub const fn ticks_from_unix_ts_ms(unix_ts_ms: u64) -> Result<u64, TimestampError> {
    if unix_ts_ms > MAX_UNIX_TS_MS {
        return Err(TimestampError::OutOfRange { unix_ts_ms });
    }
    Ok(unix_ts_ms * TICKS_PER_MS + GREGORIAN_OFFSET)
}

/// Converts a tick count back into a Unix timestamp in milliseconds, truncating the
/// sub-millisecond remainder.
///
/// Ticks preceding the Unix epoch saturate to zero.
pub const fn unix_ts_ms_from_ticks(tick: u64) -> u64 {
    tick.saturating_sub(GREGORIAN_OFFSET) / TICKS_PER_MS
}

/// Converts a [`SystemTime`] into a Unix timestamp in milliseconds.
pub fn unix_ts_ms_from_system_time(time: SystemTime) -> Result<u64, TimestampError> {
    let since_epoch = time
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TimestampError::BeforeUnixEpoch)?;
    u64::try_from(since_epoch.as_millis())
        .map_err(|_| TimestampError::OutOfRange {
            unix_ts_ms: u64::MAX,
        })
        .and_then(|unix_ts_ms| ticks_from_unix_ts_ms(unix_ts_ms).map(|_| unix_ts_ms))
}

/// Converts a Unix timestamp in milliseconds into a [`SystemTime`].
pub fn system_time_from_unix_ts_ms(unix_ts_ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(unix_ts_ms)
}

/// Returns the current Unix timestamp in milliseconds.
///
/// # Panics
///
/// Panics if the system clock reports a time before the Unix epoch.
pub(crate) fn now_unix_ts_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock may have gone backwards")
        .as_millis() as u64
}

#[cfg(feature = "chrono")]
#[cfg_attr(docsrs, doc(cfg(feature = "chrono")))]
mod chrono_support {
    use super::{ticks_from_unix_ts_ms, TimestampError};

    /// Converts a [`chrono::DateTime`] into a Unix timestamp in milliseconds.
    pub fn unix_ts_ms_from_datetime<Tz: chrono::TimeZone>(
        datetime: &chrono::DateTime<Tz>,
    ) -> Result<u64, TimestampError> {
        let unix_ts_ms =
            u64::try_from(datetime.timestamp_millis()).map_err(|_| TimestampError::BeforeUnixEpoch)?;
        ticks_from_unix_ts_ms(unix_ts_ms).map(|_| unix_ts_ms)
    }

    /// Converts a Unix timestamp in milliseconds into a UTC [`chrono::DateTime`].
    pub fn datetime_from_unix_ts_ms(unix_ts_ms: u64) -> Option<chrono::DateTime<chrono::Utc>> {
        i64::try_from(unix_ts_ms)
            .ok()
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
    }
}

#[cfg(feature = "chrono")]
pub use chrono_support::{datetime_from_unix_ts_ms, unix_ts_ms_from_datetime};

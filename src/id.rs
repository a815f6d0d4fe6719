use std::{fmt, ops, str, time::SystemTime};

use crate::clock_seq::{ClockSeqAndNode, Node};
use crate::timestamp::{self, TimestampError};

/// Represents a Universally Unique IDentifier.
///
/// The derived ordering compares the big-endian bytes, which for version 1 UUIDs starts with
/// `time_low` and therefore does not follow creation time. Use [`Uuid::ticks`] to sort by time.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Uuid([u8; 16]);

/// The variant field of a UUID, determined by its most significant bits.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variant {
    /// `0xx`: reserved for NCS backward compatibility.
    Var0,
    /// `10x`: the RFC 4122 layout.
    Var10,
    /// `110`: reserved for Microsoft backward compatibility.
    Var110,
    /// `111`: reserved for future definition.
    Var111,
}

impl Uuid {
    /// Nil UUID (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max UUID (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates a UUIDv1 from a 60-bit tick count and the clock sequence and node half.
    ///
    /// Bits of `tick` above the 60th are ignored.
    pub const fn from_fields_v1(tick: u64, clock_seq_and_node: ClockSeqAndNode) -> Self {
        let time_field = timestamp::encode_time_field(tick);
        Self::from_u64_pair(time_field, clock_seq_and_node.as_u64())
    }

    /// Builds the UUIDv1 for `unix_ts_ms` at the first tick of that millisecond, without
    /// consulting any generator.
    ///
    /// The result is **not unique**: the same arguments always yield the same UUID. Use it to
    /// compute range bounds or to look up a row key, never to mint a new key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use timeuuid1::{ClockSeqAndNode, Node, Uuid};
    ///
    /// let csn = ClockSeqAndNode::new(Node::from_bytes([1, 2, 3, 4, 5, 6]), 42);
    /// let uuid = Uuid::from_unix_ts_ms(1_700_000_000_123, csn)?;
    /// assert_eq!(uuid.to_string(), "04c284b0-833b-11ee-802a-010203040506");
    /// assert_eq!(uuid.to_unix_ts_ms(), 1_700_000_000_123);
    /// # Ok::<(), timeuuid1::TimestampError>(())
    /// ```
    pub const fn from_unix_ts_ms(
        unix_ts_ms: u64,
        clock_seq_and_node: ClockSeqAndNode,
    ) -> Result<Self, TimestampError> {
        match timestamp::ticks_from_unix_ts_ms(unix_ts_ms) {
            Ok(tick) => Ok(Self::from_fields_v1(tick, clock_seq_and_node)),
            Err(err) => Err(err),
        }
    }

    /// Builds the UUIDv1 for a [`SystemTime`] without consulting any generator.
    ///
    /// Not unique; see [`Uuid::from_unix_ts_ms`].
    pub fn from_system_time(
        time: SystemTime,
        clock_seq_and_node: ClockSeqAndNode,
    ) -> Result<Self, TimestampError> {
        Self::from_unix_ts_ms(
            timestamp::unix_ts_ms_from_system_time(time)?,
            clock_seq_and_node,
        )
    }

    const fn from_u64_pair(hi: u64, lo: u64) -> Self {
        Self((((hi as u128) << 64) | lo as u128).to_be_bytes())
    }

    /// Returns the most significant 64 bits: the scrambled `time_low | time_mid |
    /// time_hi_and_version` field.
    pub const fn time_field(&self) -> u64 {
        (u128::from_be_bytes(self.0) >> 64) as u64
    }

    /// Returns the 60-bit timestamp as 100-nanosecond ticks since 1582-10-15.
    pub const fn ticks(&self) -> u64 {
        timestamp::decode_time_field(self.time_field())
    }

    /// Returns the timestamp as milliseconds since the Unix epoch, discarding the
    /// sub-millisecond part.
    pub const fn to_unix_ts_ms(&self) -> u64 {
        timestamp::unix_ts_ms_from_ticks(self.ticks())
    }

    /// Returns the timestamp as a [`SystemTime`] at millisecond precision.
    pub fn to_system_time(&self) -> SystemTime {
        timestamp::system_time_from_unix_ts_ms(self.to_unix_ts_ms())
    }

    /// Returns the least significant 64 bits: variant, clock sequence and node.
    pub const fn clock_seq_and_node(&self) -> ClockSeqAndNode {
        ClockSeqAndNode::from_u64(u128::from_be_bytes(self.0) as u64)
    }

    /// Returns the 14-bit clock sequence.
    pub const fn clock_seq(&self) -> u16 {
        self.clock_seq_and_node().clock_seq()
    }

    /// Returns the 48-bit node.
    pub const fn node(&self) -> Node {
        self.clock_seq_and_node().node()
    }

    /// Reports the variant field value of the UUID.
    pub const fn variant(&self) -> Variant {
        match self.0[8] >> 5 {
            0b000..=0b011 => Variant::Var0,
            0b100..=0b101 => Variant::Var10,
            0b110 => Variant::Var110,
            _ => Variant::Var111,
        }
    }

    /// Returns the version field value of the UUID, or `None` if the variant is not
    /// [`Variant::Var10`].
    pub const fn version(&self) -> Option<u8> {
        match self.variant() {
            Variant::Var10 => Some(self.0[6] >> 4),
            _ => None,
        }
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// structure that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use timeuuid1::Uuid;
    ///
    /// let x = "04c284b0-833b-11ee-802a-010203040506".parse::<Uuid>()?;
    /// let y = x.encode();
    /// assert_eq!(&y as &str, "04c284b0-833b-11ee-802a-010203040506");
    /// assert_eq!(format!("{}", y), "04c284b0-833b-11ee-802a-010203040506");
    /// # Ok::<(), timeuuid1::ParseError>(())
    /// ```
    pub fn encode(&self) -> impl ops::Deref<Target = str> + fmt::Display {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut buffer = [0u8; 36];
        let mut pos = 0;
        for (i, e) in self.0.iter().enumerate() {
            buffer[pos] = DIGITS[(e >> 4) as usize];
            buffer[pos + 1] = DIGITS[(e & 15) as usize];
            pos += 2;
            if i == 3 || i == 5 || i == 7 || i == 9 {
                buffer[pos] = b'-';
                pos += 1;
            }
        }
        debug_assert!(buffer.is_ascii());
        UuidStr(buffer)
    }
}

impl fmt::Display for Uuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for Uuid {
    type Err = ParseError;

    /// Creates an object from the 8-4-4-4-12 hexadecimal string representation.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        const ERR: ParseError = ParseError {};
        let mut dst = [0u8; 16];
        let mut iter = src.chars();
        for (i, e) in dst.iter_mut().enumerate() {
            let hi = iter.next().ok_or(ERR)?.to_digit(16).ok_or(ERR)? as u8;
            let lo = iter.next().ok_or(ERR)?.to_digit(16).ok_or(ERR)? as u8;
            *e = (hi << 4) | lo;
            if (i == 3 || i == 5 || i == 7 || i == 9) && iter.next().ok_or(ERR)? != '-' {
                return Err(ERR);
            }
        }
        if iter.next().is_none() {
            Ok(Self(dst))
        } else {
            Err(ERR)
        }
    }
}

impl From<Uuid> for [u8; 16] {
    fn from(src: Uuid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Uuid> for u128 {
    fn from(src: Uuid) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for Uuid {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

impl From<Uuid> for String {
    fn from(src: Uuid) -> Self {
        src.to_string()
    }
}

impl TryFrom<String> for Uuid {
    type Error = ParseError;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        src.parse()
    }
}

/// Concrete return type of [`Uuid::encode()`] containing the stack-allocated 8-4-4-4-12 string
/// representation.
struct UuidStr([u8; 36]);

impl ops::Deref for UuidStr {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        debug_assert!(self.0.is_ascii());
        // SAFETY: the buffer only ever holds ASCII hex digits and hyphens
        unsafe { str::from_utf8_unchecked(&self.0) }
    }
}

impl fmt::Display for UuidStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self)
    }
}

/// Error parsing an invalid string representation of UUID.
#[derive(Clone, Eq, PartialEq, Hash, Debug, thiserror::Error)]
#[error("invalid string representation")]
pub struct ParseError {}

#[cfg(feature = "uuid")]
#[cfg_attr(docsrs, doc(cfg(feature = "uuid")))]
mod uuid_support {
    use super::Uuid;

    impl From<Uuid> for uuid::Uuid {
        fn from(src: Uuid) -> Self {
            uuid::Uuid::from_bytes(src.0)
        }
    }

    impl From<uuid::Uuid> for Uuid {
        fn from(src: uuid::Uuid) -> Self {
            Self(src.into_bytes())
        }
    }
}

#[cfg(feature = "chrono")]
#[cfg_attr(docsrs, doc(cfg(feature = "chrono")))]
mod chrono_support {
    use super::Uuid;
    use crate::clock_seq::ClockSeqAndNode;
    use crate::timestamp::{self, TimestampError};

    impl Uuid {
        /// Builds the UUIDv1 for a [`chrono::DateTime`] without consulting any generator.
        ///
        /// Not unique; see [`Uuid::from_unix_ts_ms`].
        pub fn from_datetime<Tz: chrono::TimeZone>(
            datetime: &chrono::DateTime<Tz>,
            clock_seq_and_node: ClockSeqAndNode,
        ) -> Result<Self, TimestampError> {
            Self::from_unix_ts_ms(
                timestamp::unix_ts_ms_from_datetime(datetime)?,
                clock_seq_and_node,
            )
        }

        /// Returns the timestamp as a UTC [`chrono::DateTime`] at millisecond precision.
        pub fn to_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
            timestamp::datetime_from_unix_ts_ms(self.to_unix_ts_ms())
        }
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Uuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Uuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Uuid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = Uuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a UUID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            <[u8; 16]>::try_from(value)
                .map(Self::Value::from)
                .map_err(de::Error::custom)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::{Uuid, Variant};
    use crate::clock_seq::{ClockSeqAndNode, Node};
    use crate::timestamp::{TimestampError, MAX_UNIX_TS_MS};

    /// Returns a collection of prepared cases
    fn prepare_cases() -> &'static [((u64, u64), &'static str)] {
        const MAX_UINT60: u64 = (1 << 60) - 1;

        &[
            ((0, 0), "00000000-0000-1000-8000-000000000000"),
            ((MAX_UINT60, 0), "ffffffff-ffff-1fff-8000-000000000000"),
            ((0, u64::MAX), "00000000-0000-1000-bfff-ffffffffffff"),
            (
                (MAX_UINT60, u64::MAX),
                "ffffffff-ffff-1fff-bfff-ffffffffffff",
            ),
            (
                (0x0123_4567_89ab_cde, 0x802a_0102_0304_0506),
                "789abcde-3456-1012-802a-010203040506",
            ),
            (
                (0x01ee_833b_04c2_84b0, 0x9d5b_3c7e_a1f2_0e44),
                "04c284b0-833b-11ee-9d5b-3c7ea1f20e44",
            ),
        ]
    }

    /// Encodes and decodes prepared cases correctly
    #[test]
    fn encodes_and_decodes_prepared_cases_correctly() {
        for ((tick, csn), text) in prepare_cases() {
            let from_fields = Uuid::from_fields_v1(*tick, ClockSeqAndNode::from_u64(*csn));
            assert_eq!(Ok(from_fields), text.parse());
            assert_eq!(Ok(from_fields), text.to_uppercase().parse());
            assert_eq!(&from_fields.encode() as &str, *text);
            assert_eq!(&from_fields.to_string(), text);
            assert_eq!(from_fields.ticks(), *tick);
            assert_eq!(from_fields.variant(), Variant::Var10);
            assert_eq!(from_fields.version(), Some(1));
            #[cfg(feature = "uuid")]
            assert_eq!(&uuid::Uuid::from(from_fields).to_string(), text);
        }
    }

    /// Exposes clock sequence and node
    #[test]
    fn exposes_clock_sequence_and_node() {
        let node = Node::from_bytes([0x3c, 0x7e, 0xa1, 0xf2, 0x0e, 0x44]);
        let e = Uuid::from_fields_v1(0x01ee_833b_04c2_84b0, ClockSeqAndNode::new(node, 0x1d5b));
        assert_eq!(e.to_string(), "04c284b0-833b-11ee-9d5b-3c7ea1f20e44");
        assert_eq!(e.clock_seq(), 0x1d5b);
        assert_eq!(e.node(), node);
        assert_eq!(e.time_field(), 0x04c2_84b0_833b_11ee);
        assert_eq!(e.clock_seq_and_node().as_u64(), 0x9d5b_3c7e_a1f2_0e44);
    }

    /// Converts timestamps without allocation
    #[test]
    fn converts_timestamps_without_allocation() {
        let csn = ClockSeqAndNode::new(Node::from_bytes([1, 2, 3, 4, 5, 6]), 42);
        for ts in [0, 1, 1_000, 1_700_000_000_123, MAX_UNIX_TS_MS] {
            let first = Uuid::from_unix_ts_ms(ts, csn).unwrap();
            let second = Uuid::from_unix_ts_ms(ts, csn).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.to_unix_ts_ms(), ts);
            assert_eq!(
                Uuid::from_system_time(first.to_system_time(), csn),
                Ok(first)
            );
        }

        assert_eq!(
            Uuid::from_unix_ts_ms(MAX_UNIX_TS_MS + 1, csn),
            Err(TimestampError::OutOfRange {
                unix_ts_ms: MAX_UNIX_TS_MS + 1
            })
        );
    }

    /// Reports variant and version of foreign UUIDs
    #[test]
    fn reports_variant_and_version_of_foreign_uuids() {
        let cases = [
            ("00000000-0000-0000-0000-000000000000", Variant::Var0, None),
            ("2ca4b2ce-6c13-40d4-bccf-37d222820f6f", Variant::Var10, Some(4)),
            ("01809424-3e59-7c05-9219-566f82fff672", Variant::Var10, Some(7)),
            ("00000000-0000-1000-c000-000000000000", Variant::Var110, None),
            ("ffffffff-ffff-ffff-ffff-ffffffffffff", Variant::Var111, None),
        ];

        for (text, variant, version) in cases {
            let e = text.parse::<Uuid>().unwrap();
            assert_eq!(e.variant(), variant, "{text}");
            assert_eq!(e.version(), version, "{text}");
        }
    }

    /// Returns error to invalid string representation
    #[test]
    fn returns_error_to_invalid_string_representation() {
        let cases = [
            "",
            " 04c284b0-833b-11ee-802a-010203040506",
            "04c284b0-833b-11ee-802a-010203040506 ",
            " 04c284b0-833b-11ee-802a-010203040506 ",
            "+04c284b0-833b-11ee-802a-010203040506",
            "-04c284b0-833b-11ee-802a-010203040506",
            "+4c284b0-833b-11ee-802a-010203040506",
            "-4c284b0-833b-11ee-802a-010203040506",
            "04c284b0833b11ee802a010203040506",
            "04c284b0-833b11ee-802a-010203040506",
            "{04c284b0-833b-11ee-802a-010203040506}",
            "04c284b0-833b-11 e-802a-010203040506",
            "04c284g0-833b-11ee-802a-010203040506",
            "04c284b0-833b-11ee-802a_010203040506",
        ];

        for e in cases {
            assert!(e.parse::<Uuid>().is_err(), "{e}");
        }
    }

    /// Returns Nil and Max UUIDs
    #[test]
    fn returns_nil_and_max_uuids() {
        assert_eq!(
            &Uuid::NIL.encode() as &str,
            "00000000-0000-0000-0000-000000000000"
        );

        assert_eq!(
            &Uuid::MAX.encode() as &str,
            "ffffffff-ffff-ffff-ffff-ffffffffffff"
        );
    }

    /// Has symmetric converters
    #[test]
    fn has_symmetric_converters() {
        for ((tick, csn), _) in prepare_cases() {
            let e = Uuid::from_fields_v1(*tick, ClockSeqAndNode::from_u64(*csn));
            assert_eq!(Uuid::from(<[u8; 16]>::from(e)), e);
            assert_eq!(Uuid::from(u128::from(e)), e);
            assert_eq!(e.encode().parse(), Ok(e));
            assert_eq!(e.encode().to_uppercase().parse(), Ok(e));
            assert_eq!(Uuid::try_from(e.to_string()), Ok(e));
            assert_eq!(Uuid::try_from(e.to_string().to_uppercase()), Ok(e));
            #[cfg(feature = "uuid")]
            assert_eq!(Uuid::from(<uuid::Uuid>::from(e)), e);
            #[cfg(feature = "uuid")]
            assert_eq!(uuid::Uuid::from(e).get_version_num(), 1);
        }
    }

    /// Builds and reads back identifiers from chrono date-times
    #[cfg(feature = "chrono")]
    #[test]
    fn converts_chrono_datetime() {
        let csn = ClockSeqAndNode::new(Node::from_bytes([1, 2, 3, 4, 5, 6]), 42);
        let dt = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(1_700_000_000_123).unwrap();
        let e = Uuid::from_datetime(&dt, csn).unwrap();
        assert_eq!(e.to_string(), "04c284b0-833b-11ee-802a-010203040506");
        assert_eq!(e.to_datetime(), Some(dt));
    }
}

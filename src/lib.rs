//! A lock-free generator of time-ordered UUID version 1 identifiers
//!
//! ```rust
//! use timeuuid1::uuid1;
//!
//! let uuid = uuid1();
//! println!("{}", uuid); // e.g., "04c284b0-833b-11ee-9d5b-3d7ea1f20e44"
//! println!("{}", uuid.to_unix_ts_ms()); // e.g., 1700000000123
//! ```
//!
//! The identifiers are meant as row keys in time-series stores: every call yields a distinct
//! 100-nanosecond tick even when thousands of calls share the same millisecond, and the
//! millisecond timestamp can always be recovered from the UUID.
//!
//! See [RFC 4122](https://www.rfc-editor.org/rfc/rfc4122#section-4.2).
//!
//! # Field and bit layout
//!
//! This implementation produces identifiers with the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           time_low                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           time_mid            |  ver  |        time_hi        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|         clock_seq         |             node              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             node                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 60-bit timestamp counts 100-nanosecond intervals since 1582-10-15T00:00:00Z and is split
//!   into `time_low` (least significant 32 bits), `time_mid` (next 16 bits) and `time_hi` (most
//!   significant 12 bits).
//! - The 4-bit `ver` field is set at `0001`.
//! - The 2-bit `var` field is set at `10`.
//! - The 14-bit `clock_seq` field is randomly initialized and rotated by the generator whenever a
//!   tick alone cannot make the identifier unique.
//! - The 48-bit `node` field is fixed per generator and distinguishes processes.
//!
//! Timestamps are given in milliseconds, so each millisecond offers 10,000 ticks. The generator
//! hands them out in turn; once a millisecond is used up it rotates the clock sequence and hands
//! the ticks out again, and a caller asking for a millisecond that precedes the latest one issued
//! receives a fresh clock sequence. See [`TimeUuidGenerator`] for the exact rules and the
//! uniqueness bound.
//!
//! # Crate features
//!
//! - `global_gen` (default): the process-wide generator behind [`uuid1()`].
//! - `serde`: `Serialize` and `Deserialize` for [`Uuid`].
//! - `uuid`: conversions from and to `uuid::Uuid`.
//! - `chrono`: conversions from and to `chrono::DateTime`.
//! - `testing`: exposes [`TimeUuidGenerator::reset_for_testing`].

#![cfg_attr(docsrs, feature(doc_cfg))]

mod id;
pub use id::{ParseError, Uuid, Variant};

mod clock_seq;
pub use clock_seq::{ClockSeqAndNode, Node};

pub mod timestamp;
pub use timestamp::TimestampError;

mod generator;
pub use generator::{GeneratorStats, TimeUuidGenerator};

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{global, uuid1, uuid1_at};

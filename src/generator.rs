//! UUIDv1 generator and the lock-free unique timestamp allocator behind it.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed, Ordering::SeqCst};
use std::time::SystemTime;

use crate::clock_seq::{ClockSeqAndNode, Node};
use crate::timestamp::{self, TimestampError, TICKS_PER_MS};
use crate::Uuid;

/// Represents a UUIDv1 generator that hands out a unique 100-nanosecond tick for every request,
/// even when many requests carry the same millisecond timestamp.
///
/// The generator is `Sync` and lock-free: share one instance per process by reference or through
/// an [`Arc`](std::sync::Arc) and call it from any number of threads. Internally it keeps the
/// latest millisecond handed out and a packed cursor holding that millisecond's next free tick
/// together with the clock sequence in use, both updated only through atomic compare-and-swap.
///
/// # Examples
///
/// ```rust
/// use std::thread;
/// use timeuuid1::{Node, TimeUuidGenerator};
///
/// let g = TimeUuidGenerator::new(Node::from_bytes([0x01, 0x23, 0x45, 0x67, 0x89, 0xab]), 0);
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = &g;
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.generate(), i);
///             }
///         });
///     }
/// });
/// ```
///
/// # Allocation rules
///
/// Each request for Unix timestamp `ts` is compared against the latest millisecond issued so far:
///
/// | Requested millisecond | Returned tick                   | Clock sequence      |
/// | --------------------- | ------------------------------- | ------------------- |
/// | later                 | first tick of `ts`              | current             |
/// | same, tick available  | next unused tick within `ts`    | current             |
/// | same, 10,000 used up  | first tick of `ts`              | rotated, then current |
/// | earlier               | first tick of `ts`              | rotated             |
///
/// After an overflow the rotated clock sequence becomes current and the remaining ticks of the
/// millisecond are handed out again under it.
///
/// The millisecond of the issued ticks never decreases for calls that do not overlap in time and
/// carry non-decreasing timestamps; within one millisecond the tick restarts from the first one
/// whenever the clock sequence rotates. Calls racing within the same millisecond receive distinct
/// pairs, but not necessarily in the order the calls started.
///
/// # Uniqueness bound
///
/// A millisecond holds 10,000 ticks and the clock sequence has 16,384 values, so the generator
/// guarantees uniqueness for roughly 10,000 × 16,384 (about 1.64 × 10^8) identifiers requested
/// with the same millisecond timestamp. Requests for earlier milliseconds consume one rotation
/// each, and callers that lose a race to rotate an exhausted millisecond discard the rotation they
/// drew. After 16,384 rotations in total the clock sequence wraps around and reuses values;
/// uniqueness then becomes probabilistic. Each wrap is counted in
/// [`GeneratorStats::clock_seq_wraps`] and logged at the `warn` level.
#[derive(Debug)]
pub struct TimeUuidGenerator {
    latest_ms: AtomicU64,
    cursor: AtomicU64,
    node: Node,
    clock_seq_seed: u16,

    allocations: AtomicU64,
    rotations: AtomicU64,
    overflows: AtomicU64,
    clock_seq_wraps: AtomicU64,
}

/// Snapshot of the counters kept by a [`TimeUuidGenerator`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct GeneratorStats {
    /// Number of successful allocations.
    pub allocations: u64,
    /// Number of clock sequence rotations.
    pub rotations: u64,
    /// Number of requests that found all 10,000 ticks of their millisecond used up under the
    /// current clock sequence.
    pub overflows: u64,
    /// Number of times the clock sequence cycled through all 16,384 values.
    pub clock_seq_wraps: u64,
}

/// Allocation cursor packed into one word: the low 36 bits of the latest millisecond, the clock
/// sequence in use and the offset of the next free tick within the millisecond.
///
/// The millisecond is truncated; [`TimeUuidGenerator::allocate`] reads the cursor before the full
/// latest millisecond so that a cursor left over from an older millisecond is either advanced or
/// replaced, never used for a later one.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct Cursor(u64);

impl Cursor {
    const OFFSET_BITS: u32 = 14;
    const MS_SHIFT: u32 = Self::OFFSET_BITS + 14;
    const MS_MASK: u64 = (1 << 36) - 1;
    const OFFSET_MASK: u64 = (1 << Self::OFFSET_BITS) - 1;

    const fn new(unix_ts_ms: u64, clock_seq: u16, offset: u64) -> Self {
        Self(
            (unix_ts_ms & Self::MS_MASK) << Self::MS_SHIFT
                | ((clock_seq & ClockSeqAndNode::CLOCK_SEQ_MASK) as u64) << Self::OFFSET_BITS
                | offset,
        )
    }

    const fn is_for(self, unix_ts_ms: u64) -> bool {
        self.0 >> Self::MS_SHIFT == unix_ts_ms & Self::MS_MASK
    }

    const fn clock_seq(self) -> u16 {
        (self.0 >> Self::OFFSET_BITS) as u16 & ClockSeqAndNode::CLOCK_SEQ_MASK
    }

    const fn offset(self) -> u64 {
        self.0 & Self::OFFSET_MASK
    }

    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl TimeUuidGenerator {
    /// Creates a generator with a fixed node and an initial clock sequence.
    ///
    /// RFC 4122 requires `clock_seq` to be initialized to a random value; see
    /// [`TimeUuidGenerator::with_rng`] for a constructor that does so.
    pub const fn new(node: Node, clock_seq: u16) -> Self {
        Self {
            latest_ms: AtomicU64::new(0),
            cursor: AtomicU64::new(Cursor::new(0, clock_seq, 0).0),
            node,
            clock_seq_seed: clock_seq,
            allocations: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            overflows: AtomicU64::new(0),
            clock_seq_wraps: AtomicU64::new(0),
        }
    }

    /// Creates a generator with a random multicast node and a random initial clock sequence drawn
    /// from `rng`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use timeuuid1::TimeUuidGenerator;
    ///
    /// let g = TimeUuidGenerator::with_rng(&mut rand::thread_rng());
    /// println!("{}", g.generate());
    /// ```
    pub fn with_rng<R: rand::RngCore + ?Sized>(rng: &mut R) -> Self {
        let node = Node::random(rng);
        let clock_seq = rng.next_u32() as u16 & ClockSeqAndNode::CLOCK_SEQ_MASK;
        log::debug!("new generator with node {node} and clock sequence {clock_seq:#06x}");
        Self::new(node, clock_seq)
    }

    /// Returns the node stamped on every UUID this generator produces.
    pub const fn node(&self) -> Node {
        self.node
    }

    /// Returns the clock sequence and node currently in use.
    pub fn clock_seq_and_node(&self) -> ClockSeqAndNode {
        let cursor = Cursor(self.cursor.load(SeqCst));
        ClockSeqAndNode::new(self.node, cursor.clock_seq())
    }

    /// Returns a snapshot of the generator counters.
    pub fn stats(&self) -> GeneratorStats {
        GeneratorStats {
            allocations: self.allocations.load(Relaxed),
            rotations: self.rotations.load(Relaxed),
            overflows: self.overflows.load(Relaxed),
            clock_seq_wraps: self.clock_seq_wraps.load(Relaxed),
        }
    }

    /// Allocates a tick for the millisecond `unix_ts_ms` that no earlier successful call returned
    /// together with the same clock sequence and node.
    ///
    /// See the [`TimeUuidGenerator`] type documentation for the rules.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::OutOfRange`] if the millisecond does not fit in the 60-bit UUID
    /// time field. The generator state is left untouched.
    pub fn allocate(&self, unix_ts_ms: u64) -> Result<(u64, ClockSeqAndNode), TimestampError> {
        let candidate = timestamp::ticks_from_unix_ts_ms(unix_ts_ms)?;
        self.allocations.fetch_add(1, Relaxed);

        loop {
            // the cursor must be read before the latest millisecond it is checked against
            let cursor = Cursor(self.cursor.load(SeqCst));
            let latest = self.latest_ms.load(SeqCst);
            match unix_ts_ms.cmp(&latest) {
                Ordering::Greater => {
                    self.latest_ms.fetch_max(unix_ts_ms, SeqCst);
                }
                Ordering::Equal if !cursor.is_for(unix_ts_ms) => {
                    let fresh = Cursor::new(unix_ts_ms, cursor.clock_seq(), 1);
                    if self.swap_cursor(cursor, fresh) {
                        return Ok((candidate, self.with_node(cursor.clock_seq())));
                    }
                }
                Ordering::Equal if cursor.offset() < TICKS_PER_MS => {
                    if self.swap_cursor(cursor, cursor.next()) {
                        let tick = candidate + cursor.offset();
                        return Ok((tick, self.with_node(cursor.clock_seq())));
                    }
                }
                Ordering::Equal => {
                    // every tick of this millisecond is taken under the current clock sequence
                    self.overflows.fetch_add(1, Relaxed);
                    let rotated = self.rotate();
                    let restarted = Cursor::new(unix_ts_ms, rotated.clock_seq(), 1);
                    let installed = self
                        .cursor
                        .compare_exchange(cursor.0, restarted.0, SeqCst, SeqCst)
                        .is_ok();
                    log::trace!(
                        "tick overflow at {unix_ts_ms} ms; rotated clock sequence to {:#06x} \
                         (installed: {installed})",
                        rotated.clock_seq()
                    );
                    return Ok((candidate, rotated));
                }
                Ordering::Less => {
                    let rotated = self.rotate();
                    log::trace!(
                        "timestamp {unix_ts_ms} ms precedes latest {latest} ms; drew clock sequence {:#06x}",
                        rotated.clock_seq()
                    );
                    return Ok((candidate, rotated));
                }
            }
        }
    }

    fn swap_cursor(&self, current: Cursor, new: Cursor) -> bool {
        self.cursor
            .compare_exchange_weak(current.0, new.0, SeqCst, SeqCst)
            .is_ok()
    }

    fn with_node(&self, clock_seq: u16) -> ClockSeqAndNode {
        ClockSeqAndNode::new(self.node, clock_seq)
    }

    /// Draws the next clock sequence.
    ///
    /// The caller owns the returned value: no other call draws the same clock sequence until the
    /// counter wraps.
    fn rotate(&self) -> ClockSeqAndNode {
        let n = self.rotations.fetch_add(1, Relaxed) + 1;
        if n % ClockSeqAndNode::CLOCK_SEQ_COUNT == 0 {
            let wraps = self.clock_seq_wraps.fetch_add(1, Relaxed) + 1;
            log::warn!(
                "clock sequence wrapped around after {n} rotations ({wraps} wraps); \
                 UUID uniqueness is probabilistic from now on"
            );
        }
        self.with_node(self.clock_seq_seed.wrapping_add(n as u16))
    }

    /// Generates a new UUIDv1 object from the current system time.
    ///
    /// # Panics
    ///
    /// Panics if the system clock reports a time before the Unix epoch.
    pub fn generate(&self) -> Uuid {
        self.generate_core(timestamp::now_unix_ts_ms())
            .expect("system clock out of range")
    }

    /// Generates a new UUIDv1 object from the `unix_ts_ms` passed.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::OutOfRange`] if `unix_ts_ms` does not fit in the UUID time field.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use timeuuid1::{Node, TimeUuidGenerator};
    ///
    /// let g = TimeUuidGenerator::new(Node::from_bytes([1, 2, 3, 4, 5, 6]), 42);
    /// let first = g.generate_core(1_700_000_000_123)?;
    /// let second = g.generate_core(1_700_000_000_123)?;
    /// assert_eq!(first.to_string(), "04c284b0-833b-11ee-802a-010203040506");
    /// assert_eq!(second.to_string(), "04c284b1-833b-11ee-802a-010203040506");
    /// assert_eq!(second.to_unix_ts_ms(), 1_700_000_000_123);
    /// # Ok::<(), timeuuid1::TimestampError>(())
    /// ```
    pub fn generate_core(&self, unix_ts_ms: u64) -> Result<Uuid, TimestampError> {
        let (tick, clock_seq_and_node) = self.allocate(unix_ts_ms)?;
        Ok(Uuid::from_fields_v1(tick, clock_seq_and_node))
    }

    /// Generates a new UUIDv1 object from a [`SystemTime`].
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] if `time` precedes the Unix epoch or is beyond the range of the
    /// UUID time field.
    pub fn generate_at(&self, time: SystemTime) -> Result<Uuid, TimestampError> {
        self.generate_core(timestamp::unix_ts_ms_from_system_time(time)?)
    }

    /// Generates a new UUIDv1 object from a [`chrono::DateTime`].
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] if `datetime` precedes the Unix epoch or is beyond the range of
    /// the UUID time field.
    #[cfg(feature = "chrono")]
    #[cfg_attr(docsrs, doc(cfg(feature = "chrono")))]
    pub fn generate_at_datetime<Tz: chrono::TimeZone>(
        &self,
        datetime: &chrono::DateTime<Tz>,
    ) -> Result<Uuid, TimestampError> {
        self.generate_core(timestamp::unix_ts_ms_from_datetime(datetime)?)
    }

    /// Returns the UUIDv1 for `unix_ts_ms` with the current clock sequence and node, without
    /// allocating a tick.
    ///
    /// The result is **not unique**; it equals what [`TimeUuidGenerator::generate_core`] would
    /// return for the first request of that millisecond. Use it to compute range bounds.
    pub fn to_uuid(&self, unix_ts_ms: u64) -> Result<Uuid, TimestampError> {
        Uuid::from_unix_ts_ms(unix_ts_ms, self.clock_seq_and_node())
    }

    /// Forgets every tick issued so far and restores the initial clock sequence.
    ///
    /// **Produces duplicate UUIDs** when timestamps seen before the reset are requested again.
    /// Must not race with allocations. Only compiled for this crate's tests or with the `testing`
    /// feature; never call it from production code.
    #[cfg(any(test, feature = "testing"))]
    #[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
    pub fn reset_for_testing(&self) {
        log::warn!("resetting UUID generator state; duplicates may follow");
        self.latest_ms.store(0, SeqCst);
        self.cursor
            .store(Cursor::new(0, self.clock_seq_seed, 0).0, SeqCst);
    }
}

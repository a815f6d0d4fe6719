//! Default generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync;

use crate::timestamp::TimestampError;
use crate::{TimeUuidGenerator, Uuid};

/// Returns the process-wide default generator, creating one if none exists.
///
/// The default generator has a random multicast node and a random initial clock sequence, both
/// drawn from the operating system's random number generator. Prefer constructing a
/// [`TimeUuidGenerator`] explicitly when the node has to be controlled.
pub fn global() -> &'static TimeUuidGenerator {
    static G: sync::OnceLock<TimeUuidGenerator> = sync::OnceLock::new();
    G.get_or_init(|| TimeUuidGenerator::with_rng(&mut rand::rngs::OsRng))
}

/// Generates a UUIDv1 object from the current system time.
///
/// This function employs the process-wide default generator and guarantees that UUIDs
/// generated by all threads of the process are unique.
///
/// # Examples
///
/// ```rust
/// let uuid = timeuuid1::uuid1();
/// println!("{}", uuid); // e.g., "04c284b0-833b-11ee-9d5b-3d7ea1f20e44"
/// println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
///
/// let uuid_string: String = timeuuid1::uuid1().to_string();
/// ```
pub fn uuid1() -> Uuid {
    global().generate()
}

/// Generates a UUIDv1 object from the `unix_ts_ms` passed, using the process-wide default
/// generator.
///
/// # Examples
///
/// ```rust
/// let uuid = timeuuid1::uuid1_at(1_700_000_000_123)?;
/// assert_eq!(uuid.to_unix_ts_ms(), 1_700_000_000_123);
/// # Ok::<(), timeuuid1::TimestampError>(())
/// ```
pub fn uuid1_at(unix_ts_ms: u64) -> Result<Uuid, TimestampError> {
    global().generate_core(unix_ts_ms)
}

#[cfg(test)]
mod tests {
    use super::{global, uuid1, uuid1_at};
    use crate::Variant;

    const N_SAMPLES: usize = 100_000;
    thread_local!(static SAMPLES: Vec<String> = (0..N_SAMPLES).map(|_| uuid1().into()).collect());

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        let pattern = r"^[0-9a-f]{8}-[0-9a-f]{4}-1[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";
        let re = regex::Regex::new(pattern).unwrap();
        SAMPLES.with(|samples| {
            for e in samples {
                assert!(re.is_match(e));
            }
        });
    }

    /// Generates 100k identifiers without collision
    #[test]
    fn generates_100k_identifiers_without_collision() {
        use std::collections::HashSet;
        SAMPLES.with(|samples| {
            let s: HashSet<&String> = samples.iter().collect();
            assert_eq!(s.len(), N_SAMPLES);
        });
    }

    /// Stamps the same multicast node on every identifier
    #[test]
    fn stamps_the_same_multicast_node_on_every_identifier() {
        let node = global().node();
        assert_eq!(node.to_bytes()[0] & 0x01, 0x01);
        for _ in 0..1_000 {
            let e = uuid1();
            assert_eq!(e.node(), node);
            assert_eq!(e.variant(), Variant::Var10);
            assert_eq!(e.version(), Some(1));
        }
    }

    /// Encodes the requested timestamp
    #[test]
    fn encodes_the_requested_timestamp() {
        for ts in [1, 1_000, 1_700_000_000_123] {
            assert_eq!(uuid1_at(ts).unwrap().to_unix_ts_ms(), ts);
        }
        assert!(uuid1_at(u64::MAX).is_err());
    }
}

//! Clock sequence and node half of a UUIDv1.

use std::fmt;

/// The 48-bit node identifier that distinguishes UUIDs minted by different processes.
///
/// Conventionally derived from a MAC address; [`Node::random`] produces a random node with the
/// multicast bit set as RFC 4122 section 4.5 suggests, which cannot collide with a real IEEE 802
/// address.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Node(u64);

impl Node {
    /// Creates a node from its six bytes in network order.
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(
            (bytes[0] as u64) << 40
                | (bytes[1] as u64) << 32
                | (bytes[2] as u64) << 24
                | (bytes[3] as u64) << 16
                | (bytes[4] as u64) << 8
                | bytes[5] as u64,
        )
    }

    /// Creates a node from the low 48 bits of `value`, ignoring the rest.
    pub const fn from_u64(value: u64) -> Self {
        Self(value & ClockSeqAndNode::NODE_MASK)
    }

    /// Creates a random node with the multicast bit set.
    pub fn random<R: rand::RngCore + ?Sized>(rng: &mut R) -> Self {
        Self::from_u64(rng.next_u64() | (1 << 40))
    }

    /// Returns the node as an integer in `0..(1 << 48)`.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the six bytes of the node in network order.
    pub const fn to_bytes(self) -> [u8; 6] {
        let b = self.0.to_be_bytes();
        [b[2], b[3], b[4], b[5], b[6], b[7]]
    }
}

impl From<[u8; 6]> for Node {
    fn from(src: [u8; 6]) -> Self {
        Self::from_bytes(src)
    }
}

impl fmt::Display for Node {
    /// Returns the node as a colon-separated hexadecimal string, e.g. `01:23:45:67:89:ab`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.to_bytes();
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// The least significant 64 bits of a UUIDv1: variant, 14-bit clock sequence and 48-bit node.
///
/// ```text
///  63 62 61                          48 47                                             0
/// +-----+------------------------------+------------------------------------------------+
/// | 1 0 |        clock sequence        |                      node                      |
/// +-----+------------------------------+------------------------------------------------+
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ClockSeqAndNode(u64);

impl ClockSeqAndNode {
    /// Bit pattern of the RFC 4122 variant (`10`).
    pub const VARIANT_BITS: u64 = 0x8000_0000_0000_0000;

    /// Mask of the 14-bit clock sequence before shifting.
    pub const CLOCK_SEQ_MASK: u16 = 0x3fff;

    /// Number of distinct clock sequence values.
    pub const CLOCK_SEQ_COUNT: u64 = 1 << 14;

    const NODE_MASK: u64 = 0x0000_ffff_ffff_ffff;

    /// Creates a value from a node and a clock sequence, the latter truncated to 14 bits.
    pub const fn new(node: Node, clock_seq: u16) -> Self {
        Self(Self::VARIANT_BITS | ((clock_seq & Self::CLOCK_SEQ_MASK) as u64) << 48 | node.0)
    }

    /// Reinterprets the low 64 bits of a UUID, forcing the variant bits to `10`.
    pub const fn from_u64(value: u64) -> Self {
        Self(Self::VARIANT_BITS | (value & !(0b11 << 62)))
    }

    /// Returns the packed 64-bit value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the 14-bit clock sequence.
    pub const fn clock_seq(self) -> u16 {
        (self.0 >> 48) as u16 & Self::CLOCK_SEQ_MASK
    }

    /// Returns the node.
    pub const fn node(self) -> Node {
        Node(self.0 & Self::NODE_MASK)
    }

    /// Returns a copy with the clock sequence replaced and the node kept.
    pub const fn with_clock_seq(self, clock_seq: u16) -> Self {
        Self::new(self.node(), clock_seq)
    }
}

impl From<ClockSeqAndNode> for u64 {
    fn from(src: ClockSeqAndNode) -> Self {
        src.0
    }
}

#[cfg(test)]
mod tests {
    use super::{ClockSeqAndNode, Node};

    /// Packs variant, clock sequence and node
    #[test]
    fn packs_variant_clock_sequence_and_node() {
        let node = Node::from_bytes([0x01, 0x23, 0x45, 0x67, 0x89, 0xab]);
        assert_eq!(node.as_u64(), 0x0123_4567_89ab);
        assert_eq!(node.to_string(), "01:23:45:67:89:ab");

        let csn = ClockSeqAndNode::new(node, 0x2a);
        assert_eq!(csn.as_u64(), 0x802a_0123_4567_89ab);
        assert_eq!(csn.clock_seq(), 0x2a);
        assert_eq!(csn.node(), node);

        let csn = ClockSeqAndNode::new(node, 0xffff);
        assert_eq!(csn.as_u64(), 0xbfff_0123_4567_89ab);
        assert_eq!(csn.clock_seq(), 0x3fff);
        assert_eq!(csn.with_clock_seq(0x4001).as_u64(), 0x8001_0123_4567_89ab);
    }

    /// Forces variant bits when reinterpreting raw values
    #[test]
    fn forces_variant_bits_when_reinterpreting_raw_values() {
        assert_eq!(ClockSeqAndNode::from_u64(0).as_u64(), 0x8000_0000_0000_0000);
        assert_eq!(
            ClockSeqAndNode::from_u64(u64::MAX).as_u64(),
            0xbfff_ffff_ffff_ffff
        );
        assert_eq!(Node::from_u64(u64::MAX).as_u64(), 0xffff_ffff_ffff);
    }

    /// Sets multicast bit on random nodes
    #[test]
    fn sets_multicast_bit_on_random_nodes() {
        let mut rng = rand::thread_rng();
        for _ in 0..1_000 {
            let node = Node::random(&mut rng);
            assert!(node.as_u64() < 1 << 48);
            assert_eq!(node.to_bytes()[0] & 0x01, 0x01);
            assert_eq!(Node::from(node.to_bytes()), node);
        }
    }
}

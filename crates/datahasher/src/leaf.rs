//! Leaf hash primitives.
//!
//! A [`LeafHasher`] is the only place where bytes are actually hashed. The
//! traversal calls it at the base cases (the raw bytes of primitives and
//! strings) and, through [`LeafHasher::mix`], to fold child fingerprints into
//! their parent.

use std::hash::Hasher as _;

/// A fast, seed-stable, non-cryptographic 64-bit hash function over byte
/// sequences.
///
/// Implementations must be deterministic across runs and machines: the same
/// bytes hashed by the same configured instance always produce the same
/// output. No randomness may be drawn at construction time.
pub trait LeafHasher: Send + Sync {
    /// Hashes a byte sequence into a 64-bit digest.
    fn hash(&self, bytes: &[u8]) -> u64;

    /// Combines an accumulator with the next child fingerprint.
    ///
    /// The result depends on the order of the arguments, so folding a list of
    /// fingerprints with this function is order-sensitive. The default
    /// implementation hashes the two little-endian words as one 16-byte
    /// block.
    fn mix(&self, acc: u64, next: u64) -> u64 {
        let mut block = [0u8; 16];
        block[..8].copy_from_slice(&acc.to_le_bytes());
        block[8..].copy_from_slice(&next.to_le_bytes());
        self.hash(&block)
    }
}

static_assertions::assert_obj_safe!(LeafHasher);

/// The default leaf primitive: `XXH64` with a fixed seed.
///
/// With the default seed of `0`, hashing a string through the structural
/// hasher is byte-for-byte identical to calling `xxh64(bytes, 0)` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Xxh64 {
    seed: u64,
}

impl Xxh64 {
    /// Creates an `XXH64` leaf hasher with the given seed.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self { Self { seed } }

    /// Returns the seed this hasher was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 { self.seed }
}

impl LeafHasher for Xxh64 {
    fn hash(&self, bytes: &[u8]) -> u64 {
        xxhash_rust::xxh64::xxh64(bytes, self.seed)
    }
}

/// A keyed `SipHash-1-3` leaf primitive.
///
/// Slower than [`Xxh64`] but useful when fingerprints of attacker-supplied
/// data end up as keys in hash tables and the key can be kept private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sip64 {
    k0: u64,
    k1: u64,
}

impl Sip64 {
    /// Creates a `SipHash-1-3` leaf hasher with the given 128-bit key.
    #[must_use]
    pub const fn with_keys(k0: u64, k1: u64) -> Self { Self { k0, k1 } }
}

impl LeafHasher for Sip64 {
    fn hash(&self, bytes: &[u8]) -> u64 {
        let mut hasher =
            siphasher::sip::SipHasher13::new_with_keys(self.k0, self.k1);
        hasher.write(bytes);
        hasher.finish()
    }
}

impl<L: LeafHasher + ?Sized> LeafHasher for &L {
    fn hash(&self, bytes: &[u8]) -> u64 { (**self).hash(bytes) }

    fn mix(&self, acc: u64, next: u64) -> u64 { (**self).mix(acc, next) }
}

impl<L: LeafHasher + ?Sized> LeafHasher for Box<L> {
    fn hash(&self, bytes: &[u8]) -> u64 { (**self).hash(bytes) }

    fn mix(&self, acc: u64, next: u64) -> u64 { (**self).mix(acc, next) }
}

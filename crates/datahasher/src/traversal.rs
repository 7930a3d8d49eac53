//! The per-call traversal context and the combinators built on it.
//!
//! A [`Traversal`] is created for every top-level fingerprint computation and
//! dropped when it returns. [`StructuralHash`] implementations describe their
//! shape by calling exactly one of its entry points:
//!
//! | shape | entry point |
//! |-------|-------------|
//! | primitive leaf | [`Traversal::bytes`], [`Traversal::primitive`] |
//! | nil pointer | [`Traversal::nil`] |
//! | shared pointer | [`Traversal::shared`] |
//! | struct / tuple | [`Traversal::structure`] |
//! | enum variant | [`Traversal::variant`] |
//! | ordered sequence | [`Traversal::sequence`] |
//! | unordered mapping | [`Traversal::mapping`] |
//! | unordered set | [`Traversal::set`] |
//! | opaque kind | [`Traversal::opaque`] |
//!
//! Transparent wrappers (references, boxes, `Option::Some`) simply forward to
//! the wrapped value.

use fxhash::FxHashSet;

use crate::{Error, StructuralHash, config::OpaquePolicy, leaf::LeafHasher};

/// Fixed fingerprints and accumulator seeds.
///
/// The seeds keep shapes apart: an empty struct, an empty sequence, an empty
/// map and an empty set all fingerprint differently, and none of them
/// collides with a leaf by construction.
pub mod sentinel {
    /// Fingerprint of an absent value (`None`, a dead `Weak`).
    pub const NIL: u64 = 0x6e69_6c5f_6e69_6c5f;

    /// Contribution of an opaque kind.
    pub const OPAQUE: u64 = 0x6f70_6171_7565_5f5f;

    /// Contribution of a shared pointer that closes a cycle.
    pub const CYCLE: u64 = 0x6379_636c_655f_5f5f;

    /// Contribution of a branch cut off by the depth bound.
    pub const DEPTH_EXCEEDED: u64 = 0x6465_7074_685f_5f5f;

    /// Contribution of an interior-mutable cell that could not be read.
    pub const UNAVAILABLE: u64 = 0x6865_6c64_5f5f_5f5f;

    pub(crate) const STRUCT: u64 = 0x9e37_79b9_7f4a_7c15;
    pub(crate) const VARIANT: u64 = 0xbf58_476d_1ce4_e5b9;
    pub(crate) const SEQUENCE: u64 = 0x94d0_49bb_1331_11eb;
    pub(crate) const MAPPING: u64 = 0xd6e8_feb8_6659_fd93;
    pub(crate) const PAIR: u64 = 0xa076_1d64_78bd_642f;
    pub(crate) const SET: u64 = 0xe703_7ed1_a0b4_28db;
    pub(crate) const ELEMENT: u64 = 0x8ebc_6af0_9c88_c6e3;
}

/// State of a single fingerprint computation.
///
/// Holds the leaf primitive, the nesting depth, the identities of the shared
/// pointers currently being descended through, and the first error observed.
/// Nothing outlives the call.
pub struct Traversal<'h> {
    leaf: &'h dyn LeafHasher,
    max_depth: usize,
    opaque_policy: OpaquePolicy,
    depth: usize,
    ancestors: FxHashSet<usize>,
    held: FxHashSet<usize>,
    error: Option<Error>,
}

impl std::fmt::Debug for Traversal<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traversal")
            .field("max_depth", &self.max_depth)
            .field("opaque_policy", &self.opaque_policy)
            .field("depth", &self.depth)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<'h> Traversal<'h> {
    pub(crate) fn new(
        leaf: &'h dyn LeafHasher,
        max_depth: usize,
        opaque_policy: OpaquePolicy,
    ) -> Self {
        Self {
            leaf,
            max_depth,
            opaque_policy,
            depth: 0,
            ancestors: FxHashSet::default(),
            held: FxHashSet::default(),
            error: None,
        }
    }

    /// Returns the current nesting depth.
    #[must_use]
    pub const fn depth(&self) -> usize { self.depth }

    /// Returns the first error recorded so far, if any.
    #[must_use]
    pub const fn error(&self) -> Option<Error> { self.error }

    pub(crate) fn into_result(self, fingerprint: u64) -> Result<u64, Error> {
        self.error.map_or(Ok(fingerprint), Err)
    }

    /// Records an error. Only the first one is kept.
    pub fn record(&mut self, error: Error) {
        tracing::debug!(%error, depth = self.depth, "structural hash degraded");

        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Hashes raw bytes with the leaf primitive.
    ///
    /// Nothing is prepended, so `bytes(b"abc")` is exactly the leaf
    /// primitive's digest of `b"abc"`.
    pub fn bytes(&mut self, bytes: &[u8]) -> u64 { self.leaf.hash(bytes) }

    /// Hashes the canonical byte representation of a fixed-width primitive.
    pub fn primitive<const N: usize>(&mut self, bytes: [u8; N]) -> u64 {
        self.leaf.hash(&bytes)
    }

    /// Fingerprint of an absent value.
    #[must_use]
    pub const fn nil(&self) -> u64 { sentinel::NIL }

    /// Contribution of a value whose kind has no structural representation.
    pub fn opaque(&mut self, kind: &'static str) -> u64 {
        if self.opaque_policy == OpaquePolicy::Reject {
            self.record(Error::Unsupported { kind });
        }

        sentinel::OPAQUE
    }

    /// Contribution of an interior-mutable cell that could not be read.
    pub fn unavailable(&mut self, kind: &'static str) -> u64 {
        self.record(Error::Unavailable { kind });
        sentinel::UNAVAILABLE
    }

    /// Fingerprints a component one level deeper, enforcing the depth bound.
    pub fn nested<T: StructuralHash + ?Sized>(&mut self, value: &T) -> u64 {
        if self.depth >= self.max_depth {
            self.record(Error::DepthExceeded { max_depth: self.max_depth });
            return sentinel::DEPTH_EXCEEDED;
        }

        self.depth += 1;
        let fingerprint = value.structural_hash(self);
        self.depth -= 1;

        fingerprint
    }

    /// Fingerprints the pointee of a shared pointer.
    ///
    /// The pointee's address is used only to detect re-entry: if the same
    /// pointee is already being traversed further up, the pointer closes a
    /// cycle and contributes [`sentinel::CYCLE`]. Siblings sharing a pointee
    /// are traversed normally.
    pub fn shared<T: StructuralHash + ?Sized>(&mut self, value: &T) -> u64 {
        let identity = std::ptr::from_ref(value).cast::<()>().addr();

        if !self.ancestors.insert(identity) {
            self.record(Error::Cycle { depth: self.depth });
            return sentinel::CYCLE;
        }

        let fingerprint = value.structural_hash(self);
        self.ancestors.remove(&identity);

        fingerprint
    }

    /// Fingerprints the contents of a lock through `read`, which is expected
    /// to block until the lock can be acquired.
    ///
    /// Locks are tracked by address while they are held so a traversal never
    /// tries to acquire the same lock twice: reaching it again from inside
    /// closes a cycle and contributes [`sentinel::CYCLE`].
    pub fn locked<L, F>(&mut self, lock: &L, read: F) -> u64
    where
        L: ?Sized,
        F: FnOnce(&mut Self) -> u64,
    {
        let identity = std::ptr::from_ref(lock).cast::<()>().addr();

        if !self.held.insert(identity) {
            self.record(Error::Cycle { depth: self.depth });
            return sentinel::CYCLE;
        }

        let fingerprint = read(self);
        self.held.remove(&identity);

        fingerprint
    }

    /// Starts an order-sensitive accumulator over struct fields.
    pub fn structure(&mut self) -> Fields<'_, 'h> {
        Fields { acc: sentinel::STRUCT, count: 0, state: self }
    }

    /// Starts an order-sensitive accumulator over the fields of the enum
    /// variant at `index`.
    pub fn variant(&mut self, index: u32) -> Fields<'_, 'h> {
        let discriminant = self.primitive(index.to_le_bytes());
        let acc = self.leaf.mix(sentinel::VARIANT, discriminant);

        Fields { acc, count: 0, state: self }
    }

    /// Starts an order-sensitive accumulator over sequence elements.
    pub fn sequence(&mut self) -> Sequence<'_, 'h> {
        Sequence { acc: sentinel::SEQUENCE, len: 0, state: self }
    }

    /// Starts an order-independent accumulator over map entries.
    pub fn mapping(&mut self) -> Mapping<'_, 'h> {
        Mapping { sum: 0, len: 0, state: self }
    }

    /// Starts an order-independent accumulator over set elements.
    pub fn set(&mut self) -> Set<'_, 'h> { Set { sum: 0, len: 0, state: self } }

    /// Fingerprints every item of an iterator as an ordered sequence.
    pub fn ordered<I>(&mut self, items: I) -> u64
    where
        I: IntoIterator,
        I::Item: StructuralHash,
    {
        let mut sequence = self.sequence();
        for item in items {
            sequence.element(&item);
        }
        sequence.finish()
    }

    /// Fingerprints every `(key, value)` pair of an iterator as a mapping.
    pub fn entries<I, K, V>(&mut self, entries: I) -> u64
    where
        I: IntoIterator<Item = (K, V)>,
        K: StructuralHash,
        V: StructuralHash,
    {
        let mut mapping = self.mapping();
        for (key, value) in entries {
            mapping.entry(&key, &value);
        }
        mapping.finish()
    }

    /// Fingerprints every item of an iterator as an unordered set.
    pub fn unordered<I>(&mut self, items: I) -> u64
    where
        I: IntoIterator,
        I::Item: StructuralHash,
    {
        let mut set = self.set();
        for item in items {
            set.element(&item);
        }
        set.finish()
    }

    fn mix(&self, acc: u64, next: u64) -> u64 { self.leaf.mix(acc, next) }
}

/// Order-sensitive accumulator over the fields of a struct or enum variant.
///
/// Obtained from [`Traversal::structure`] or [`Traversal::variant`].
#[derive(Debug)]
#[must_use = "the accumulator does nothing until `finish` is called"]
pub struct Fields<'a, 'h> {
    state: &'a mut Traversal<'h>,
    acc: u64,
    count: u64,
}

impl Fields<'_, '_> {
    /// Folds the next field into the accumulator.
    pub fn field<T: StructuralHash + ?Sized>(
        &mut self,
        value: &T,
    ) -> &mut Self {
        let fingerprint = self.state.nested(value);
        self.acc = self.state.mix(self.acc, fingerprint);
        self.count += 1;
        self
    }

    /// Promotes the fields of `value` into this accumulator, as if they were
    /// declared in place.
    pub fn flatten<T: StructuralHash + ?Sized>(
        &mut self,
        value: &T,
    ) -> &mut Self {
        value.promote_fields(self);
        self
    }

    /// Finishes the accumulator, folding in the field count.
    #[must_use]
    pub fn finish(self) -> u64 { self.state.mix(self.acc, self.count) }
}

/// Order-sensitive accumulator over sequence elements.
///
/// Obtained from [`Traversal::sequence`].
#[derive(Debug)]
#[must_use = "the accumulator does nothing until `finish` is called"]
pub struct Sequence<'a, 'h> {
    state: &'a mut Traversal<'h>,
    acc: u64,
    len: u64,
}

impl Sequence<'_, '_> {
    /// Folds the next element into the accumulator.
    pub fn element<T: StructuralHash + ?Sized>(
        &mut self,
        value: &T,
    ) -> &mut Self {
        let fingerprint = self.state.nested(value);
        self.acc = self.state.mix(self.acc, fingerprint);
        self.len += 1;
        self
    }

    /// Finishes the accumulator, folding in the length.
    #[must_use]
    pub fn finish(self) -> u64 { self.state.mix(self.acc, self.len) }
}

/// Order-independent accumulator over map entries.
///
/// Each entry is reduced to a pair fingerprint; pair fingerprints are summed
/// with wrapping addition, which is commutative and associative.
#[derive(Debug)]
#[must_use = "the accumulator does nothing until `finish` is called"]
pub struct Mapping<'a, 'h> {
    state: &'a mut Traversal<'h>,
    sum: u64,
    len: u64,
}

impl Mapping<'_, '_> {
    /// Adds an entry.
    pub fn entry<K, V>(&mut self, key: &K, value: &V) -> &mut Self
    where
        K: StructuralHash + ?Sized,
        V: StructuralHash + ?Sized,
    {
        let key = self.state.nested(key);
        let value = self.state.nested(value);
        let pair = self.state.mix(self.state.mix(sentinel::PAIR, key), value);

        self.sum = self.sum.wrapping_add(pair);
        self.len += 1;
        self
    }

    /// Finishes the accumulator, folding in the entry count.
    #[must_use]
    pub fn finish(self) -> u64 {
        let acc = self.state.mix(sentinel::MAPPING, self.sum);
        self.state.mix(acc, self.len)
    }
}

/// Order-independent accumulator over set elements.
#[derive(Debug)]
#[must_use = "the accumulator does nothing until `finish` is called"]
pub struct Set<'a, 'h> {
    state: &'a mut Traversal<'h>,
    sum: u64,
    len: u64,
}

impl Set<'_, '_> {
    /// Adds an element.
    pub fn element<T: StructuralHash + ?Sized>(
        &mut self,
        value: &T,
    ) -> &mut Self {
        let fingerprint = self.state.nested(value);
        let spread = self.state.mix(sentinel::ELEMENT, fingerprint);

        self.sum = self.sum.wrapping_add(spread);
        self.len += 1;
        self
    }

    /// Finishes the accumulator, folding in the element count.
    #[must_use]
    pub fn finish(self) -> u64 {
        let acc = self.state.mix(sentinel::SET, self.sum);
        self.state.mix(acc, self.len)
    }
}

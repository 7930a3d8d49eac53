//! # datahasher
//!
//! Deterministic 64-bit structural fingerprints for arbitrary Rust values.
//!
//! Two values that hold "the same data" produce the same fingerprint no
//! matter how that data is laid out in memory: by value, behind a reference,
//! boxed, reference counted, freshly built or cloned. Values that differ in
//! any leaf produce different fingerprints with overwhelming probability.
//! Fingerprints are stable across runs and machines.
//!
//! The main components of this library are:
//!
//! - [`StructuralHash`]: describes a value's shape to the traversal. Derive
//!   it with `#[derive(StructuralHash)]`.
//! - [`Fingerprint`]: the override capability. A type that implements it and
//!   derives with `#[structural_hash(custom)]` supplies its own fingerprint.
//! - [`compute_hash`] / [`try_compute_hash`]: the entry points.
//! - [`Fingerprinter`]: a reusable handle with an injected leaf primitive and
//!   a [`Config`](config::Config).
//!
//! ## Example
//!
//! ```
//! use datahasher::{StructuralHash, compute_hash};
//!
//! #[derive(Clone, StructuralHash)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let george = Person { name: "George".to_owned(), age: 37 };
//! let boxed = Box::new(george.clone());
//!
//! assert_eq!(compute_hash(&george), compute_hash(&boxed));
//! assert_eq!(
//!     compute_hash("hello world!"),
//!     xxhash_rust::xxh64::xxh64(b"hello world!", 0),
//! );
//! ```
//!
//! ## Field Attributes
//!
//! - `#[structural_hash(skip)]`: the field does not contribute.
//! - `#[structural_hash(flatten)]`: the field's own fields are promoted into
//!   the enclosing struct at this position, as with an embedded struct.
//!
//! Private fields are included like any other: the derive runs with the
//! defining module's visibility. Opt out with `skip`.

use std::marker::PhantomData;

extern crate self as datahasher;

pub use datahasher_derive::StructuralHash;

pub mod config;
pub mod leaf;

mod error;
mod impls;
mod traversal;

pub use error::Error;
pub use traversal::{Fields, Mapping, Sequence, Set, Traversal, sentinel};

use crate::config::{Config, DefaultConfig, StrictConfig};

/// A trait for types that can be fingerprinted structurally.
///
/// An implementation describes the value's shape by calling one of the
/// [`Traversal`] entry points (or by forwarding to a wrapped value) and
/// returns the resulting fingerprint.
///
/// ## Example
///
/// ```
/// use datahasher::{StructuralHash, Traversal, compute_hash};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl StructuralHash for Point {
///     fn structural_hash(&self, state: &mut Traversal<'_>) -> u64 {
///         let mut fields = state.structure();
///         fields.field(&self.x).field(&self.y);
///         fields.finish()
///     }
/// }
///
/// assert_ne!(
///     compute_hash(&Point { x: 1, y: 2 }),
///     compute_hash(&Point { x: 2, y: 1 }),
/// );
/// ```
pub trait StructuralHash {
    /// Computes this value's fingerprint within `state`.
    fn structural_hash(&self, state: &mut Traversal<'_>) -> u64;

    /// Contributes this value to an enclosing struct that embeds it.
    ///
    /// Structs promote each of their fields; every other shape contributes
    /// itself as a single field.
    fn promote_fields(&self, fields: &mut Fields<'_, '_>) {
        fields.field(self);
    }

    /// Computes the fingerprint of a contiguous sequence of values.
    ///
    /// Slices, arrays and vectors go through here. The default is an ordered
    /// sequence of the element fingerprints; `u8` overrides it to hash the
    /// whole run as one byte leaf.
    fn structural_hash_slice(items: &[Self], state: &mut Traversal<'_>) -> u64
    where
        Self: Sized,
    {
        state.ordered(items)
    }

    /// Computes the fingerprint of a non-contiguous sequence of values, such
    /// as the elements of a `VecDeque` or `LinkedList`.
    ///
    /// Must agree with [`structural_hash_slice`](Self::structural_hash_slice)
    /// on the same elements.
    fn structural_hash_iter<'a, I>(items: I, state: &mut Traversal<'_>) -> u64
    where
        Self: Sized + 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        state.ordered(items)
    }
}

/// The override capability: a type-level fingerprint that replaces
/// structural traversal.
///
/// Implementing this trait alone has no effect; derive [`StructuralHash`]
/// with `#[structural_hash(custom)]` to make the traversal use it. The
/// returned value is used verbatim and none of the type's fields are
/// visited.
///
/// ```
/// use datahasher::{Fingerprint, StructuralHash, compute_hash};
///
/// #[derive(StructuralHash)]
/// #[structural_hash(custom)]
/// struct Versioned {
///     version: u64,
///     payload: Vec<u8>,
/// }
///
/// impl Fingerprint for Versioned {
///     fn fingerprint(&self) -> u64 { self.version }
/// }
///
/// let value = Versioned { version: 7, payload: vec![1, 2, 3] };
/// assert_eq!(compute_hash(&value), 7);
/// ```
pub trait Fingerprint {
    /// Returns this value's fingerprint.
    fn fingerprint(&self) -> u64;
}

/// Wraps a value that must not be traversed.
///
/// The wrapped value contributes the opaque constant under
/// [`OpaquePolicy::Constant`](config::OpaquePolicy::Constant) and is reported
/// under [`OpaquePolicy::Reject`](config::OpaquePolicy::Reject).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Opaque<T>(pub T);

/// Treats any `AsRef<[u8]>` container as a single byte leaf.
///
/// `compute_hash(&Bytes(b"abc"))` equals the leaf primitive's digest of
/// `b"abc"`, which is also the fingerprint of the string `"abc"` and of the
/// byte slice `b"abc"`. Useful for byte containers that do not implement
/// [`StructuralHash`] themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bytes<T>(pub T);

/// A reusable fingerprint computer.
///
/// Holds the leaf primitive selected by the [`Config`]. Cheap to share:
/// every call builds its own [`Traversal`], so a single instance can be used
/// from many threads at once.
pub struct Fingerprinter<C: Config = DefaultConfig> {
    leaf: C::LeafHasher,
    _config: PhantomData<fn() -> C>,
}

impl<C: Config> std::fmt::Debug for Fingerprinter<C>
where
    C::LeafHasher: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fingerprinter").field("leaf", &self.leaf).finish()
    }
}

impl<C: Config> Clone for Fingerprinter<C>
where
    C::LeafHasher: Clone,
{
    fn clone(&self) -> Self { Self::with_leaf_hasher(self.leaf.clone()) }
}

static_assertions::assert_impl_all!(Fingerprinter: Send, Sync);
static_assertions::assert_impl_all!(Fingerprinter<StrictConfig>: Send, Sync);

impl<C: Config> Default for Fingerprinter<C> {
    fn default() -> Self { Self::new() }
}

impl<C: Config> Fingerprinter<C> {
    /// Creates a fingerprinter with the default leaf primitive of `C`.
    #[must_use]
    pub fn new() -> Self { Self::with_leaf_hasher(C::LeafHasher::default()) }

    /// Creates a fingerprinter with an explicitly configured leaf primitive,
    /// e.g. a seeded [`Xxh64`](leaf::Xxh64).
    #[must_use]
    pub const fn with_leaf_hasher(leaf: C::LeafHasher) -> Self {
        Self { leaf, _config: PhantomData }
    }

    /// Returns the leaf primitive.
    #[must_use]
    pub const fn leaf_hasher(&self) -> &C::LeafHasher { &self.leaf }

    /// Computes the fingerprint of `value`.
    ///
    /// Never fails: conditions that [`try_compute`](Self::try_compute) would
    /// report are replaced by fixed [`sentinel`] contributions at the
    /// position where they occur. In particular, everything below
    /// [`Config::max_depth`] is cut off, so values differing only beneath
    /// that depth fingerprint the same.
    pub fn compute<T: StructuralHash + ?Sized>(&self, value: &T) -> u64 {
        let mut state = self.traversal();
        let fingerprint = value.structural_hash(&mut state);

        tracing::trace!(
            fingerprint,
            degraded = state.error().is_some(),
            "computed structural hash"
        );

        fingerprint
    }

    /// Computes the fingerprint of `value`, reporting the first condition
    /// that prevented a faithful traversal.
    ///
    /// # Errors
    ///
    /// See [`Error`] for the conditions reported.
    pub fn try_compute<T: StructuralHash + ?Sized>(
        &self,
        value: &T,
    ) -> Result<u64, Error> {
        let mut state = self.traversal();
        let fingerprint = value.structural_hash(&mut state);

        state.into_result(fingerprint)
    }

    fn traversal(&self) -> Traversal<'_> {
        Traversal::new(&self.leaf, C::max_depth(), C::opaque_policy())
    }
}

/// Computes the fingerprint of `value` with the [`DefaultConfig`].
///
/// Total: never fails and never panics. For strings and byte slices the
/// result is exactly `xxh64(bytes, 0)`.
///
/// Values are traversed at most
/// [`DEFAULT_MAX_DEPTH`](config::DEFAULT_MAX_DEPTH) levels deep. Anything
/// below that contributes [`sentinel::DEPTH_EXCEEDED`] instead of its
/// contents, so two values that differ only beneath the bound share a
/// fingerprint. Use [`try_compute_hash`] to detect this, or a
/// [`Fingerprinter`] with a [`Config`] raising
/// [`max_depth`](Config::max_depth).
pub fn compute_hash<T: StructuralHash + ?Sized>(value: &T) -> u64 {
    Fingerprinter::<DefaultConfig>::new().compute(value)
}

/// Computes the fingerprint of `value` with the [`StrictConfig`].
///
/// # Errors
///
/// Returns the first opaque kind, cycle, depth overflow or unreadable cell
/// encountered. See [`Error`].
pub fn try_compute_hash<T: StructuralHash + ?Sized>(
    value: &T,
) -> Result<u64, Error> {
    Fingerprinter::<StrictConfig>::new().try_compute(value)
}

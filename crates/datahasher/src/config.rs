//! Configuration of a structural traversal.
//!
//! The [`Config`] trait selects the leaf primitive and the policies that
//! decide how the traversal treats the inputs it cannot faithfully describe.
//! [`DefaultConfig`] is what [`compute_hash`](crate::compute_hash) uses;
//! [`StrictConfig`] backs [`try_compute_hash`](crate::try_compute_hash).
//!
//! # Custom Configurations
//!
//! ```
//! use datahasher::{
//!     Fingerprinter,
//!     config::{Config, OpaquePolicy},
//!     leaf::Sip64,
//! };
//!
//! #[derive(Debug, Clone, Copy, Default)]
//! struct KeyedConfig;
//!
//! impl Config for KeyedConfig {
//!     type LeafHasher = Sip64;
//!
//!     fn max_depth() -> usize { 64 }
//!
//!     fn opaque_policy() -> OpaquePolicy { OpaquePolicy::Reject }
//! }
//!
//! let fingerprinter =
//!     Fingerprinter::<KeyedConfig>::with_leaf_hasher(Sip64::with_keys(1, 2));
//! assert!(fingerprinter.try_compute(&vec![1u8, 2, 3]).is_ok());
//! ```

use crate::leaf::{LeafHasher, Xxh64};

/// Default bound on nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How values of opaque kinds (function pointers, raw pointers, channel
/// ends, [`Opaque`](crate::Opaque)) are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum OpaquePolicy {
    /// Contribute a fixed constant. Two values differing only in opaque
    /// components fingerprint identically.
    #[default]
    Constant,

    /// Record [`Error::Unsupported`](crate::Error::Unsupported). The constant
    /// is still used so the traversal can complete.
    Reject,
}

/// Configuration trait for a structural traversal.
///
/// # Required Associated Types
///
/// ## `LeafHasher`
///
/// The byte-level hash primitive. Its `Default` value is used by
/// [`Fingerprinter::new`](crate::Fingerprinter::new); a seeded or keyed
/// instance can be injected with
/// [`Fingerprinter::with_leaf_hasher`](crate::Fingerprinter::with_leaf_hasher).
///
/// # Provided Methods
///
/// - [`max_depth`](Config::max_depth): nesting bound, guards against
///   unbounded recursion on pathological or cyclic inputs.
/// - [`opaque_policy`](Config::opaque_policy): see [`OpaquePolicy`].
pub trait Config: 'static + Send + Sync {
    /// The leaf primitive.
    type LeafHasher: LeafHasher + Default;

    /// Maximum nesting depth before the traversal gives up on a branch.
    #[must_use]
    fn max_depth() -> usize { DEFAULT_MAX_DEPTH }

    /// Treatment of opaque kinds.
    #[must_use]
    fn opaque_policy() -> OpaquePolicy { OpaquePolicy::Constant }
}

/// `XXH64` with seed `0`, opaque kinds degrade to a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DefaultConfig;

impl Config for DefaultConfig {
    type LeafHasher = Xxh64;
}

/// `XXH64` with seed `0`, opaque kinds are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StrictConfig;

impl Config for StrictConfig {
    type LeafHasher = Xxh64;

    fn opaque_policy() -> OpaquePolicy { OpaquePolicy::Reject }
}

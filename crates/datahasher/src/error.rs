//! Errors reported by a strict traversal.

/// A condition that prevented a value from being fingerprinted faithfully.
///
/// The total entry points ([`compute_hash`](crate::compute_hash) and
/// [`Fingerprinter::compute`](crate::Fingerprinter::compute)) never surface
/// these; they substitute a fixed sentinel at the offending position and keep
/// going. The fallible entry points return the first one encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// A value of a kind without a structural representation (function
    /// pointer, raw pointer, channel end, ...) was reached while the
    /// configuration rejects opaque kinds.
    #[error("value of kind `{kind}` has no structural representation")]
    Unsupported {
        /// Name of the offending kind.
        kind: &'static str,
    },

    /// A shared pointer was reached again while its own pointee was still
    /// being traversed.
    #[error("cyclic reference detected at depth {depth}")]
    Cycle {
        /// Nesting depth at which the cycle closed.
        depth: usize,
    },

    /// The value nests deeper than the configured bound.
    #[error("traversal exceeded the maximum depth of {max_depth}")]
    DepthExceeded {
        /// The configured bound.
        max_depth: usize,
    },

    /// An interior-mutable cell was exclusively held and could not be read
    /// without blocking.
    #[error("`{kind}` is exclusively held and cannot be read")]
    Unavailable {
        /// Name of the cell type.
        kind: &'static str,
    },
}

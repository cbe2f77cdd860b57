//! Shared types for the matching engine: forest labels, tolerance
//! configuration, and the public error enum.

use thiserror::Error;

/// Alternating-forest label, reset at the start of every grow phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Label {
    Unlabeled,
    Odd,
    Even,
}

/// Engine configuration (numeric tolerance).
///
/// All slack/dual comparisons go through the one `eps` so that
/// blocked/unblocked decisions stay mutually consistent.
#[derive(Clone, Copy, Debug)]
pub struct MatchCfg {
    pub eps: f64,
}

impl Default for MatchCfg {
    fn default() -> Self {
        Self { eps: 1e-6 }
    }
}

impl MatchCfg {
    /// Epsilon-tolerant strict comparison: `a > b` beyond drift.
    #[inline]
    pub(crate) fn greater(&self, a: f64, b: f64) -> bool {
        a - b > self.eps
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, MatchingError>;

/// Errors the matching engine can report to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingError {
    /// The graph admits no perfect matching. Raised before any cost-based
    /// work begins; the engine is left in a freshly cleared state.
    #[error("the graph does not have a perfect matching")]
    Infeasible,
}

//! Minimum-cost perfect matching on general graphs.
//!
//! Implements Edmonds' blossom algorithm with primal-dual updates:
//! alternating-forest growth, blossom contraction/expansion, augmenting-path
//! application, and a dual-cost update driving the loop to optimality.
//!
//! The crate is split along the collaborator seams:
//! - [`graph`]: immutable graph storage consumed by the engine.
//! - [`heap`]: min-priority queue used only by the heuristic warm-start.
//! - [`matching`]: the engine itself with its two entry points,
//!   [`matching::Matching::solve_maximum_matching`] and
//!   [`matching::Matching::solve_minimum_cost_perfect_matching`].

pub mod graph;
pub mod heap;
pub mod matching;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::graph::Graph;
    pub use crate::matching::{MatchCfg, Matching, MatchingError};
}

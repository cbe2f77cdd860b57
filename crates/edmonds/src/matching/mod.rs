//! Edmonds' blossom algorithm with primal-dual updates.
//!
//! Purpose
//! - Maximum-cardinality matching: one alternating-forest growth to
//!   exhaustion ([`Matching::solve_maximum_matching`]).
//! - Minimum-cost perfect matching: feasibility check, then repeated
//!   {heuristic warm-start, forest growth, dual update, reset} rounds on the
//!   slack-induced tight subgraph until the compressed matching is perfect
//!   ([`Matching::solve_minimum_cost_perfect_matching`]).
//!
//! Design
//! - One `Matching` struct owns every per-vertex/blossom array (sized `2n`,
//!   the upper half being recyclable blossom slots) so each solve is a plain
//!   sequence of `&mut self` steps; no shared globals, no interior mutability.
//! - Numeric comparisons run through the single tolerance in [`MatchCfg`].

mod engine;
mod types;

pub use engine::Matching;
pub use types::{MatchCfg, MatchingError, Result};

#[cfg(test)]
mod tests;

//! Centralized limits for the tyarg inference core.
//!
//! # Categories
//!
//! - **Recursion Depths**: bounds on recursive descent through alias chains
//! - **Operation Counts**: bounds on the work done by one merge
//!
//! Solver recursion presets are built from these values in
//! `tyarg_solver::recursion::RecursionProfile`.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum number of alias links followed by one recursive merge descent.
///
/// A chain is bounded by the session's target set, so this only trips for
/// pathological sessions with thousands of type parameters.
pub const MAX_ALIAS_CHAIN_DEPTH: u32 = 512;

// =============================================================================
// Operation Count Limits
// =============================================================================

/// Maximum number of alias links visited while merging one target.
pub const MAX_MERGE_ITERATIONS: u32 = 100_000;

//! Recursion guard for cycle detection and depth limiting in alias-chain
//! descents.
//!
//! # Design
//!
//! Merging two inference results walks alias chains recursively
//! (`T1 -> T2 -> T3 = String`). Chains are bounded by the target set but may
//! be cyclic (`T1 -> T2 -> T1`). `RecursionGuard` combines three safety
//! mechanisms for such walks:
//! 1. **Cycle detection** via a visiting set (`FxHashSet<K>`)
//! 2. **Depth limiting** to prevent stack overflow
//! 3. **Iteration bounding** to cap the total work of one walk
//!
//! # Profiles
//!
//! [`RecursionProfile`] names the limit presets so call sites carry no magic
//! numbers:
//!
//! ```ignore
//! let guard = RecursionGuard::with_profile(RecursionProfile::AliasChain);
//! ```
//!
//! # Safety
//!
//! - **Debug leak detection**: In debug builds, dropping a guard with active entries
//!   triggers a panic, catching forgotten `leave()` calls.
//! - **Debug double-leave detection**: In debug builds, leaving a key that isn't in
//!   the visiting set triggers a panic.

use rustc_hash::FxHashSet;
use std::hash::Hash;
use tyarg_common::limits;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Alias-chain descent while merging inference results.
    ///
    /// depth = `MAX_ALIAS_CHAIN_DEPTH`, iterations = `MAX_MERGE_ITERATIONS`
    AliasChain,

    /// Custom limits for one-off or test scenarios.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    /// Maximum recursion depth for this profile.
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::AliasChain => limits::MAX_ALIAS_CHAIN_DEPTH,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    /// Maximum iteration count for this profile.
    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::AliasChain => limits::MAX_MERGE_ITERATIONS,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed with the computation.
    Entered,
    /// This key is already being visited.
    Cycle,
    /// Maximum recursion depth exceeded.
    DepthExceeded,
    /// Maximum iteration count exceeded.
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    /// Returns `true` if any limit was exceeded (depth or iterations).
    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Tracks recursion state for cycle detection, depth limiting,
/// and iteration bounding.
///
/// # Usage
///
/// ```ignore
/// match guard.enter(target) {
///     RecursionResult::Entered => {
///         let resolved = descend(pointee);
///         guard.leave(target);
///         resolved
///     }
///     RecursionResult::Cycle => None,
///     RecursionResult::DepthExceeded
///     | RecursionResult::IterationExceeded => None,
/// }
/// ```
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    /// Create a guard with explicit limits.
    ///
    /// Prefer [`with_profile`](Self::with_profile) for standard use cases.
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a recursive computation for `key`.
    ///
    /// On [`RecursionResult::Entered`] the caller **must** call
    /// [`leave`](Self::leave) with the same key when done.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        if self.visiting.contains(&key) {
            return RecursionResult::Cycle;
        }

        self.visiting.insert(key);
        self.depth += 1;
        RecursionResult::Entered
    }

    /// Leave a recursive computation for `key`.
    ///
    /// # Debug panics
    ///
    /// In debug builds, panics if `key` is not in the visiting set.
    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);

        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );

        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.visiting.contains(key)
    }

    /// Current recursion depth (number of active entries on the stack).
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Total enter attempts so far (successful or not).
    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Returns `true` if any limit was previously exceeded.
    ///
    /// Sticky until [`reset()`](Self::reset) is called.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    /// Reset all state while preserving configured limits.
    pub fn reset(&mut self) {
        self.visiting.clear();
        self.depth = 0;
        self.iterations = 0;
        self.exceeded = false;
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.visiting.is_empty() {
            panic!(
                "RecursionGuard dropped with {} active entries still in the visiting set",
                self.visiting.len(),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_chain_profile_uses_central_limits() {
        let p = RecursionProfile::AliasChain;
        assert_eq!(p.max_depth(), limits::MAX_ALIAS_CHAIN_DEPTH);
        assert_eq!(p.max_iterations(), limits::MAX_MERGE_ITERATIONS);
    }

    #[test]
    fn custom_profile_limits() {
        let p = RecursionProfile::Custom {
            max_depth: 7,
            max_iterations: 42,
        };
        assert_eq!(p.max_depth(), 7);
        assert_eq!(p.max_iterations(), 42);
    }

    #[test]
    fn enter_leave_tracks_depth() {
        let mut guard = RecursionGuard::new(10, 100);
        assert_eq!(guard.enter(1u32), RecursionResult::Entered);
        assert_eq!(guard.enter(2u32), RecursionResult::Entered);
        assert_eq!(guard.depth(), 2);
        assert!(guard.is_visiting(&1));

        guard.leave(2);
        guard.leave(1);
        assert_eq!(guard.depth(), 0);
        assert!(!guard.is_visiting(&1));
        // leave does not decrement iterations
        assert_eq!(guard.iterations(), 2);
    }

    #[test]
    fn cycle_detected_on_same_key() {
        let mut guard = RecursionGuard::new(10, 100);
        assert!(guard.enter(1u32).is_entered());
        let result = guard.enter(1u32);
        assert!(result.is_cycle());
        assert!(!result.is_exceeded());
        assert!(!guard.is_exceeded());
        assert_eq!(guard.depth(), 1);
        guard.leave(1);
    }

    #[test]
    fn depth_exceeded_is_sticky() {
        let mut guard = RecursionGuard::new(1, 100);
        assert!(guard.enter(1u32).is_entered());
        assert_eq!(guard.enter(2u32), RecursionResult::DepthExceeded);
        guard.leave(1);
        assert!(guard.is_exceeded());

        guard.reset();
        assert!(!guard.is_exceeded());
        assert_eq!(guard.iterations(), 0);
    }

    #[test]
    fn iteration_budget_exhausted() {
        let mut guard = RecursionGuard::new(10, 2);
        assert!(guard.enter(1u32).is_entered());
        guard.leave(1);
        assert!(guard.enter(1u32).is_entered());
        guard.leave(1);
        assert_eq!(guard.enter(1u32), RecursionResult::IterationExceeded);
        assert!(guard.is_exceeded());
    }
}

//! Insertion-ordered maps and sets keyed with `FxHasher`.
//!
//! Inference results and constraint records are iterated while building
//! answers, so their iteration order must be deterministic. `IndexMap` keeps
//! insertion order; the Fx hasher keeps small integer keys cheap.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

/// `IndexMap` using `FxHasher`. Construct with `FxIndexMap::default()`.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// `IndexSet` using `FxHasher`. Construct with `FxIndexSet::default()`.
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

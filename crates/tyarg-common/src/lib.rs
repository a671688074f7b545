//! Common types and utilities for the tyarg inference core.
//!
//! This crate provides foundational types used across all tyarg crates:
//! - Qualifiers and qualifier sets (`Qualifier`, `QualifierSet`)
//! - The qualifier hierarchy collaborator (`QualifierHierarchy`) and a
//!   chain-ordered implementation (`QualifierLattice`)
//! - Insertion-ordered hash collections (`FxIndexMap`, `FxIndexSet`)
//! - Centralized limits

// Ordered collections with the Fx hasher
pub mod collections;
pub use collections::{FxIndexMap, FxIndexSet};

// Qualifiers, qualifier sets and hierarchy providers
pub mod qualifier;
pub use qualifier::{
    HierarchyId, LatticeError, Qualifier, QualifierHierarchy, QualifierLattice, QualifierSet,
};

// Centralized limits and thresholds
pub mod limits;

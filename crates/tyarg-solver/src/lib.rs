//! Qualified Type-Argument Inference
//!
//! This crate infers the type arguments of a generic invocation from the
//! equality, subtype and supertype relations gathered by an upstream
//! constraint generator. It is organised around two components:
//!
//! - **Constraint store** (`ConstraintMap`): per-target records of
//!   relations against other targets, concrete types and bare qualifiers
//! - **Result resolver** (`InferenceResult`): target to inferred value
//!   mapping with alias-chain resolution and result merging
//!
//! Solving strategies (`InferenceStrategy`) read a constraint map and produce
//! partial results; `TypeArgumentInference` runs them in fallback order and
//! merges what they find.
//!
//! Concrete types are opaque to this crate beyond the `QualifiedType` trait.
//! `SimpleType` and `NominalOracle` provide a small nominal type model for
//! drivers and tests that have no type system of their own.
mod constraints;
mod driver;
pub mod recursion;
mod result;
mod strategy;
mod target;
pub mod types;

pub use constraints::{
    ConstraintMap, Equalities, Relations, Subtypes, Supertypes, TargetConstraints,
};
pub use driver::{InferenceOutcome, TypeArgumentInference};
pub use result::{InferenceResult, InferredValue};
pub use strategy::{EqualitiesStrategy, InferenceStrategy, SubtypesStrategy, SupertypesStrategy};
pub use target::{TargetId, TargetSet};
pub use types::{NominalError, NominalOracle, QualifiedType, SimpleKind, SimpleType, TypeOracle};

//! Constraint store for one inference session.
//!
//! `ConstraintMap` holds, for every target of the session, the simplified
//! relations discovered by the constraint generator. It is edited on the fly
//! while constraints are discovered and while strategies run.
//!
//! ## Record shape
//!
//! Each target owns a [`TargetConstraints`] record with three categories:
//!
//! | Category | Meaning of `target REL operand` |
//! |----------|---------------------------------|
//! | `equalities` | `target == operand` |
//! | `subtypes` | `target <: operand` |
//! | `supertypes` | `target :> operand` |
//!
//! and each category relates the target to three kinds of operands:
//!
//! | Operand | Key | Value |
//! |---------|-----|-------|
//! | other target | `TargetId` | hierarchy tops the relation holds in |
//! | concrete type | `Ty` | hierarchy tops the relation holds in |
//! | bare qualifier | hierarchy top | qualifier (equality) or bound set |
//!
//! Nothing here resolves an answer: every mutator is pure accumulation and
//! may be called repeatedly and in any order.
//!
//! ## Branching
//!
//! Cloning a `ConstraintMap` is shallow: records are shared behind `Arc`.
//! Mutators go through `Arc::make_mut`, so a branch that writes to a shared
//! record gets its own copy and never disturbs its siblings.

use crate::target::{TargetId, TargetSet};
use crate::types::QualifiedType;
use std::sync::Arc;
use tracing::trace;
use tyarg_common::{FxIndexMap, Qualifier, QualifierHierarchy, QualifierSet};

// =============================================================================
// Relations - one constraint category
// =============================================================================

/// Relations of one category (equality, subtype or supertype).
///
/// `P` is what a bare-qualifier relation stores per hierarchy top: a single
/// qualifier for equalities, a set of bounds for subtype/supertype relations.
#[derive(Clone, Debug)]
pub struct Relations<Ty, P> {
    /// Related targets, with the hierarchy tops the relation holds in.
    pub targets: FxIndexMap<TargetId, QualifierSet>,
    /// Related concrete types, with the hierarchy tops the relation holds in.
    pub types: FxIndexMap<Ty, QualifierSet>,
    /// Bare qualifier relations keyed by hierarchy top.
    pub primaries: FxIndexMap<Qualifier, P>,
}

/// `target == operand` relations; first qualifier per hierarchy wins.
pub type Equalities<Ty> = Relations<Ty, Qualifier>;
/// `target <: operand` relations; qualifier upper bounds accumulate.
pub type Subtypes<Ty> = Relations<Ty, QualifierSet>;
/// `target :> operand` relations; qualifier lower bounds accumulate.
pub type Supertypes<Ty> = Relations<Ty, QualifierSet>;

impl<Ty, P> Default for Relations<Ty, P> {
    fn default() -> Self {
        Self {
            targets: FxIndexMap::default(),
            types: FxIndexMap::default(),
            primaries: FxIndexMap::default(),
        }
    }
}

// `IndexMap` equality needs hashable keys, which a derive cannot express.
impl<Ty: QualifiedType, P: PartialEq> PartialEq for Relations<Ty, P> {
    fn eq(&self, other: &Self) -> bool {
        self.targets == other.targets
            && self.types == other.types
            && self.primaries == other.primaries
    }
}

impl<Ty: QualifiedType, P: Eq> Eq for Relations<Ty, P> {}

impl<Ty: QualifiedType, P> Relations<Ty, P> {
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.types.is_empty() && self.primaries.is_empty()
    }

    fn add_target(&mut self, other: TargetId, hierarchies: &QualifierSet) {
        self.targets.entry(other).or_default().union_with(hierarchies);
    }

    fn add_type(&mut self, ty: Ty, hierarchies: &QualifierSet) {
        self.types.entry(ty).or_default().union_with(hierarchies);
    }
}

impl<Ty: QualifiedType> Relations<Ty, Qualifier> {
    fn add_primary_equalities(&mut self, hierarchy: &dyn QualifierHierarchy, annos: &QualifierSet) {
        for anno in annos {
            self.primaries.entry(hierarchy.top_of(anno)).or_insert(anno);
        }
    }

    /// The equal qualifiers, one per hierarchy.
    pub fn primary_set(&self) -> QualifierSet {
        self.primaries.values().copied().collect()
    }
}

impl<Ty: QualifiedType> Relations<Ty, QualifierSet> {
    fn add_primary_bounds(&mut self, hierarchy: &dyn QualifierHierarchy, annos: &QualifierSet) {
        for anno in annos {
            self.primaries
                .entry(hierarchy.top_of(anno))
                .or_default()
                .insert(anno);
        }
    }
}

// =============================================================================
// TargetConstraints - per-target record
// =============================================================================

/// Equality, subtype and supertype constraints of one target.
#[derive(Clone, Debug)]
pub struct TargetConstraints<Ty> {
    pub target: TargetId,
    pub equalities: Equalities<Ty>,
    pub subtypes: Subtypes<Ty>,
    pub supertypes: Supertypes<Ty>,
}

impl<Ty: QualifiedType> PartialEq for TargetConstraints<Ty> {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
            && self.equalities == other.equalities
            && self.subtypes == other.subtypes
            && self.supertypes == other.supertypes
    }
}

impl<Ty: QualifiedType> Eq for TargetConstraints<Ty> {}

impl<Ty: QualifiedType> TargetConstraints<Ty> {
    pub fn new(target: TargetId) -> Self {
        Self {
            target,
            equalities: Relations::default(),
            subtypes: Relations::default(),
            supertypes: Relations::default(),
        }
    }

    /// Whether no constraint of any category was recorded.
    pub fn is_empty(&self) -> bool {
        self.equalities.is_empty() && self.subtypes.is_empty() && self.supertypes.is_empty()
    }
}

// =============================================================================
// ConstraintMap
// =============================================================================

/// Constraints for every target of one inference session.
///
/// The target set is fixed at construction. Accessing or mutating a target
/// outside that set is a programming error and panics.
#[derive(Clone, Debug)]
pub struct ConstraintMap<Ty> {
    records: FxIndexMap<TargetId, Arc<TargetConstraints<Ty>>>,
}

#[cold]
#[track_caller]
fn unknown_target(target: TargetId) -> ! {
    panic!("target {target} is not part of this constraint map")
}

impl<Ty: QualifiedType> ConstraintMap<Ty> {
    /// Create a map with an empty record for every target.
    pub fn new(targets: impl IntoIterator<Item = TargetId>) -> Self {
        let records = targets
            .into_iter()
            .map(|target| (target, Arc::new(TargetConstraints::new(target))))
            .collect();
        Self { records }
    }

    /// The equality, subtype and supertype constraints of `target`.
    #[track_caller]
    pub fn constraints(&self, target: TargetId) -> &TargetConstraints<Ty> {
        match self.records.get(&target) {
            Some(record) => &**record,
            None => unknown_target(target),
        }
    }

    /// Like [`constraints`](Self::constraints), `None` for unknown targets.
    pub fn try_constraints(&self, target: TargetId) -> Option<&TargetConstraints<Ty>> {
        self.records.get(&target).map(|record| &**record)
    }

    /// Every target passed at construction, whether or not it has constraints.
    pub fn targets(&self) -> impl ExactSizeIterator<Item = TargetId> + '_ {
        self.records.keys().copied()
    }

    pub fn target_set(&self) -> TargetSet {
        self.targets().collect()
    }

    pub fn contains_target(&self, target: TargetId) -> bool {
        self.records.contains_key(&target)
    }

    /// Whether `target`'s record is shared with `other` (not yet copied on write).
    pub fn shares_record_with(&self, other: &ConstraintMap<Ty>, target: TargetId) -> bool {
        match (self.records.get(&target), other.records.get(&target)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    #[track_caller]
    fn record_mut(&mut self, target: TargetId) -> &mut TargetConstraints<Ty> {
        match self.records.get_mut(&target) {
            Some(record) => Arc::make_mut(record),
            None => unknown_target(target),
        }
    }

    // -------------------------------------------------------------------------
    // Equalities
    // -------------------------------------------------------------------------

    /// Record `target == equivalent` in the given hierarchies.
    #[track_caller]
    pub fn add_target_equality(
        &mut self,
        target: TargetId,
        equivalent: TargetId,
        hierarchies: &QualifierSet,
    ) {
        trace!(param = %target, equivalent = %equivalent, ?hierarchies, "add_target_equality");
        self.record_mut(target)
            .equalities
            .add_target(equivalent, hierarchies);
    }

    /// Record `target == ty` in the given hierarchies.
    #[track_caller]
    pub fn add_type_equality(&mut self, target: TargetId, ty: Ty, hierarchies: &QualifierSet) {
        trace!(param = %target, ty = ?ty, ?hierarchies, "add_type_equality");
        self.record_mut(target).equalities.add_type(ty, hierarchies);
    }

    /// Record that `target`'s primary qualifiers equal `annos`.
    ///
    /// The first qualifier recorded for a hierarchy wins.
    #[track_caller]
    pub fn add_primary_equalities(
        &mut self,
        target: TargetId,
        hierarchy: &dyn QualifierHierarchy,
        annos: &QualifierSet,
    ) {
        trace!(param = %target, ?annos, "add_primary_equalities");
        self.record_mut(target)
            .equalities
            .add_primary_equalities(hierarchy, annos);
    }

    // -------------------------------------------------------------------------
    // Subtypes
    // -------------------------------------------------------------------------

    /// Record `target <: supertype` in the given hierarchies.
    #[track_caller]
    pub fn add_target_subtype(
        &mut self,
        target: TargetId,
        supertype: TargetId,
        hierarchies: &QualifierSet,
    ) {
        trace!(param = %target, supertype = %supertype, ?hierarchies, "add_target_subtype");
        self.record_mut(target)
            .subtypes
            .add_target(supertype, hierarchies);
    }

    /// Record `target <: supertype` in the given hierarchies.
    #[track_caller]
    pub fn add_type_subtype(&mut self, target: TargetId, supertype: Ty, hierarchies: &QualifierSet) {
        trace!(param = %target, supertype = ?supertype, ?hierarchies, "add_type_subtype");
        self.record_mut(target)
            .subtypes
            .add_type(supertype, hierarchies);
    }

    /// Record that `target`'s primary qualifiers are subtypes of `annos`.
    #[track_caller]
    pub fn add_primary_subtypes(
        &mut self,
        target: TargetId,
        hierarchy: &dyn QualifierHierarchy,
        annos: &QualifierSet,
    ) {
        trace!(param = %target, ?annos, "add_primary_subtypes");
        self.record_mut(target)
            .subtypes
            .add_primary_bounds(hierarchy, annos);
    }

    // -------------------------------------------------------------------------
    // Supertypes
    // -------------------------------------------------------------------------

    /// Record `target :> subtype` in the given hierarchies.
    #[track_caller]
    pub fn add_target_supertype(
        &mut self,
        target: TargetId,
        subtype: TargetId,
        hierarchies: &QualifierSet,
    ) {
        trace!(param = %target, subtype = %subtype, ?hierarchies, "add_target_supertype");
        self.record_mut(target)
            .supertypes
            .add_target(subtype, hierarchies);
    }

    /// Record `target :> subtype` in the given hierarchies.
    #[track_caller]
    pub fn add_type_supertype(&mut self, target: TargetId, subtype: Ty, hierarchies: &QualifierSet) {
        trace!(param = %target, subtype = ?subtype, ?hierarchies, "add_type_supertype");
        self.record_mut(target)
            .supertypes
            .add_type(subtype, hierarchies);
    }

    /// Record that `target`'s primary qualifiers are supertypes of `annos`.
    #[track_caller]
    pub fn add_primary_supertypes(
        &mut self,
        target: TargetId,
        hierarchy: &dyn QualifierHierarchy,
        annos: &QualifierSet,
    ) {
        trace!(param = %target, ?annos, "add_primary_supertypes");
        self.record_mut(target)
            .supertypes
            .add_primary_bounds(hierarchy, annos);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[path = "../tests/constraints_tests.rs"]
mod tests;

//! Solving strategies.
//!
//! A strategy reads a (branched) constraint map and answers as many targets
//! as it can. The driver runs strategies in fallback order and merges each
//! partial answer into what earlier strategies established.
//!
//! | Strategy | Reads | Answer |
//! |----------|-------|--------|
//! | `EqualitiesStrategy` | `equalities` | first equal type, else alias to an equal target |
//! | `SupertypesStrategy` | `supertypes` (lower bounds) | least upper bound |
//! | `SubtypesStrategy` | `subtypes` (upper bounds) | greatest lower bound |
//!
//! Strategies may write to the map they are given: types already known for
//! related targets are folded into the target's own record before solving.
//! The driver hands every strategy its own branch, so such writes never reach
//! the baseline.

use crate::constraints::{ConstraintMap, Relations, TargetConstraints};
use crate::result::InferenceResult;
use crate::target::TargetId;
use crate::types::{QualifiedType, TypeOracle};
use smallvec::SmallVec;
use tracing::{debug, trace};
use tyarg_common::{Qualifier, QualifierHierarchy, QualifierSet};

/// One way of turning constraints into inferred values.
pub trait InferenceStrategy<Ty: QualifiedType> {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Infer what can be inferred from `constraints`.
    ///
    /// `established` holds what earlier strategies already answered. Targets
    /// with a concrete non-null answer there are skipped.
    fn solve(
        &self,
        constraints: &mut ConstraintMap<Ty>,
        established: &InferenceResult<Ty>,
    ) -> InferenceResult<Ty>;
}

/// Whether `target` already has an answer no later strategy may replace.
fn is_settled<Ty: QualifiedType>(established: &InferenceResult<Ty>, target: TargetId) -> bool {
    established
        .inferred_type(target)
        .is_some_and(|ty| !ty.is_null_type())
}

/// The concrete type known for `target`, preferring this pass's answer.
fn known_type<'a, Ty: QualifiedType>(
    result: &'a InferenceResult<Ty>,
    established: &'a InferenceResult<Ty>,
    target: TargetId,
) -> Option<&'a Ty> {
    result
        .inferred_type(target)
        .or_else(|| established.inferred_type(target))
}

// =============================================================================
// EqualitiesStrategy
// =============================================================================

/// Infers a target from the types and targets it must equal.
///
/// A target equal to a concrete type becomes a deep copy of the first such
/// type with the target's primary equalities applied. A target only equal to
/// other targets is aliased to the first of them, so that a later answer for
/// the pointee completes it through chain resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct EqualitiesStrategy;

impl<Ty: QualifiedType> InferenceStrategy<Ty> for EqualitiesStrategy {
    fn name(&self) -> &'static str {
        "equalities"
    }

    fn solve(
        &self,
        constraints: &mut ConstraintMap<Ty>,
        established: &InferenceResult<Ty>,
    ) -> InferenceResult<Ty> {
        let targets: Vec<TargetId> = constraints.targets().collect();
        let mut result = InferenceResult::new();

        // Answers flow along target equalities, so iterate to a fixed point.
        let mut progressed = true;
        while progressed {
            progressed = false;
            for &target in &targets {
                if is_settled(established, target) || result.inferred_type(target).is_some() {
                    continue;
                }

                let seeds: SmallVec<[(Ty, QualifierSet); 2]> = constraints
                    .constraints(target)
                    .equalities
                    .targets
                    .iter()
                    .filter_map(|(other, hierarchies)| {
                        known_type(&result, established, *other)
                            .map(|ty| (ty.clone(), hierarchies.clone()))
                    })
                    .collect();
                for (ty, hierarchies) in seeds {
                    constraints.add_type_equality(target, ty, &hierarchies);
                }

                let equalities = &constraints.constraints(target).equalities;
                let Some(first) = equalities.types.keys().next() else {
                    continue;
                };
                let ty = first.copy_with_qualifiers(&equalities.primary_set());
                debug!(strategy = "equalities", param = %target, ty = ?ty, "inferred equal type");
                result.insert_type(target, ty);
                progressed = true;
            }
        }

        for &target in &targets {
            if is_settled(established, target) || result.contains(target) {
                continue;
            }
            let equalities = &constraints.constraints(target).equalities;
            let equivalent = equalities
                .targets
                .keys()
                .copied()
                .find(|other| *other != target && constraints.contains_target(*other));
            if let Some(equivalent) = equivalent {
                trace!(param = %target, equivalent = %equivalent, "aliased to equal target");
                result.insert_alias(target, equivalent, equalities.primary_set());
            }
        }

        result.resolve_chained_targets();
        result
    }
}

// =============================================================================
// Bound-based strategies
// =============================================================================

/// Which side of a target its type bounds lie on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bound {
    /// `target :> ty`; answers are joins.
    Lower,
    /// `target <: ty`; answers are meets.
    Upper,
}

impl Bound {
    fn label(self) -> &'static str {
        match self {
            Self::Lower => "supertypes",
            Self::Upper => "subtypes",
        }
    }

    fn relations<Ty>(self, record: &TargetConstraints<Ty>) -> &Relations<Ty, QualifierSet> {
        match self {
            Self::Lower => &record.supertypes,
            Self::Upper => &record.subtypes,
        }
    }

    fn add_type<Ty: QualifiedType>(
        self,
        constraints: &mut ConstraintMap<Ty>,
        target: TargetId,
        ty: Ty,
        hierarchies: &QualifierSet,
    ) {
        match self {
            Self::Lower => constraints.add_type_supertype(target, ty, hierarchies),
            Self::Upper => constraints.add_type_subtype(target, ty, hierarchies),
        }
    }

    fn combine_types<Ty>(self, oracle: &dyn TypeOracle<Ty>, a: &Ty, b: &Ty) -> Option<Ty> {
        match self {
            Self::Lower => oracle.least_upper_bound(a, b),
            Self::Upper => oracle.greatest_lower_bound(a, b),
        }
    }

    fn combine_qualifiers(
        self,
        hierarchy: &dyn QualifierHierarchy,
        a: Qualifier,
        b: Qualifier,
    ) -> Option<Qualifier> {
        match self {
            Self::Lower => hierarchy.least_upper_bound(a, b),
            Self::Upper => hierarchy.greatest_lower_bound(a, b),
        }
    }
}

/// Fold every bound of one hierarchy into `current`.
fn fold_qualifier_bounds(
    bound: Bound,
    hierarchy: &dyn QualifierHierarchy,
    current: Option<Qualifier>,
    bounds: &QualifierSet,
) -> Option<Qualifier> {
    bounds.iter().try_fold(current, |acc, next| match acc {
        None => Some(Some(next)),
        Some(acc) => bound.combine_qualifiers(hierarchy, acc, next).map(Some),
    })?
}

/// Whether every other target `target` is bounded by already has a type.
fn related_targets_known<Ty: QualifiedType>(
    bound: Bound,
    constraints: &ConstraintMap<Ty>,
    established: &InferenceResult<Ty>,
    result: &InferenceResult<Ty>,
    target: TargetId,
) -> bool {
    bound
        .relations(constraints.constraints(target))
        .targets
        .keys()
        .all(|&other| {
            other == target
                || !constraints.contains_target(other)
                || known_type(result, established, other).is_some()
        })
}

/// Fold the known types of related targets into `target`'s bounds and
/// combine them. `None` when there is no bound or no common bound yet.
fn solve_target_bounds<Ty: QualifiedType>(
    bound: Bound,
    oracle: &dyn TypeOracle<Ty>,
    hierarchy: &dyn QualifierHierarchy,
    constraints: &mut ConstraintMap<Ty>,
    established: &InferenceResult<Ty>,
    result: &InferenceResult<Ty>,
    target: TargetId,
) -> Option<Ty> {
    let related: SmallVec<[(Ty, QualifierSet); 2]> = bound
        .relations(constraints.constraints(target))
        .targets
        .iter()
        .filter_map(|(other, hierarchies)| {
            known_type(result, established, *other).map(|ty| (ty.clone(), hierarchies.clone()))
        })
        .collect();
    for (ty, hierarchies) in related {
        bound.add_type(constraints, target, ty, &hierarchies);
    }

    let relations = bound.relations(constraints.constraints(target));
    let mut types = relations.types.keys();
    let first = types.next()?;
    let combined = types.try_fold(first.deep_copy(), |acc, ty| {
        bound.combine_types(oracle, &acc, ty)
    });
    let Some(mut combined) = combined else {
        trace!(strategy = bound.label(), param = %target, "type bounds have no common bound");
        return None;
    };

    let mut replacements = QualifierSet::new();
    for (top, bounds) in &relations.primaries {
        let current = combined.primary_qualifiers().in_hierarchy(top.hierarchy);
        match fold_qualifier_bounds(bound, hierarchy, current, bounds) {
            Some(qualifier) => {
                replacements.insert(qualifier);
            }
            None => {
                trace!(param = %target, ?top, "qualifier bounds have no common bound");
            }
        }
    }
    combined.replace_qualifiers(&replacements);
    Some(combined)
}

fn solve_bounds<Ty: QualifiedType>(
    bound: Bound,
    oracle: &dyn TypeOracle<Ty>,
    hierarchy: &dyn QualifierHierarchy,
    constraints: &mut ConstraintMap<Ty>,
    established: &InferenceResult<Ty>,
) -> InferenceResult<Ty> {
    let targets: Vec<TargetId> = constraints.targets().collect();
    let mut result = InferenceResult::new();

    // An answer becomes a bound of the targets related to it, so a target is
    // solved once every related target has an answer. When nothing is ready,
    // the first target that can be solved from what is known goes next; this
    // breaks cycles and skips related targets that have no bounds at all.
    let mut relaxed = false;
    loop {
        let mut progressed = false;
        for &target in &targets {
            if is_settled(established, target) || result.contains(target) {
                continue;
            }
            if !relaxed && !related_targets_known(bound, constraints, established, &result, target)
            {
                continue;
            }
            if let Some(ty) =
                solve_target_bounds(bound, oracle, hierarchy, constraints, established, &result, target)
            {
                debug!(strategy = bound.label(), param = %target, ty = ?ty, "inferred from bounds");
                result.insert_type(target, ty);
                progressed = true;
                if relaxed {
                    break;
                }
            }
        }

        if progressed {
            relaxed = false;
        } else if relaxed {
            break;
        } else {
            relaxed = true;
        }
    }

    result
}

/// Infers a target that must be a supertype of some types as their least
/// upper bound. Qualifier lower bounds are joined per hierarchy.
pub struct SupertypesStrategy<'a, Ty> {
    oracle: &'a dyn TypeOracle<Ty>,
    hierarchy: &'a dyn QualifierHierarchy,
}

impl<'a, Ty> SupertypesStrategy<'a, Ty> {
    pub fn new(oracle: &'a dyn TypeOracle<Ty>, hierarchy: &'a dyn QualifierHierarchy) -> Self {
        Self { oracle, hierarchy }
    }
}

impl<Ty: QualifiedType> InferenceStrategy<Ty> for SupertypesStrategy<'_, Ty> {
    fn name(&self) -> &'static str {
        Bound::Lower.label()
    }

    fn solve(
        &self,
        constraints: &mut ConstraintMap<Ty>,
        established: &InferenceResult<Ty>,
    ) -> InferenceResult<Ty> {
        solve_bounds(Bound::Lower, self.oracle, self.hierarchy, constraints, established)
    }
}

/// Infers a target that must be a subtype of some types as their greatest
/// lower bound. Qualifier upper bounds are met per hierarchy.
pub struct SubtypesStrategy<'a, Ty> {
    oracle: &'a dyn TypeOracle<Ty>,
    hierarchy: &'a dyn QualifierHierarchy,
}

impl<'a, Ty> SubtypesStrategy<'a, Ty> {
    pub fn new(oracle: &'a dyn TypeOracle<Ty>, hierarchy: &'a dyn QualifierHierarchy) -> Self {
        Self { oracle, hierarchy }
    }
}

impl<Ty: QualifiedType> InferenceStrategy<Ty> for SubtypesStrategy<'_, Ty> {
    fn name(&self) -> &'static str {
        Bound::Upper.label()
    }

    fn solve(
        &self,
        constraints: &mut ConstraintMap<Ty>,
        established: &InferenceResult<Ty>,
    ) -> InferenceResult<Ty> {
        solve_bounds(Bound::Upper, self.oracle, self.hierarchy, constraints, established)
    }
}

#[cfg(test)]
#[path = "../tests/strategy_tests.rs"]
mod tests;

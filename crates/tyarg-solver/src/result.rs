//! Inference results: target to inferred value, alias-chain resolution and
//! merging of results from independent solving passes.
//!
//! A solving pass records one of two answers per target:
//!
//! - `InferredValue::Type(ty)`: the target's argument is `ty`.
//! - `InferredValue::Target { target, additional_qualifiers }`: the target is
//!   known to equal another target that has no answer yet.
//!
//! `resolve_chained_targets` collapses aliases whose pointee became concrete
//! (`T1 = T2, T2 = T3, T3 = String` becomes `T1 = T2 = T3 = String`).
//! `merge_subordinate` combines two results, keeping the receiver's answers
//! and filling its gaps from the subordinate.

use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::target::{TargetId, TargetSet};
use crate::types::QualifiedType;
use tracing::{debug, trace};
use tyarg_common::{FxIndexMap, QualifierSet};

/// The current answer for one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferredValue<Ty> {
    /// The target was resolved to a concrete type.
    Type(Ty),
    /// The target equals `target`, which is not resolved yet. Once it is,
    /// `additional_qualifiers` are applied to a copy of its type.
    Target {
        target: TargetId,
        additional_qualifiers: QualifierSet,
    },
}

impl<Ty> InferredValue<Ty> {
    pub fn alias(target: TargetId, additional_qualifiers: QualifierSet) -> Self {
        Self::Target {
            target,
            additional_qualifiers,
        }
    }

    pub fn as_type(&self) -> Option<&Ty> {
        match self {
            Self::Type(ty) => Some(ty),
            Self::Target { .. } => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Self::Type(_))
    }
}

/// Inferred values for the targets of one session, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferenceResult<Ty> {
    values: FxIndexMap<TargetId, InferredValue<Ty>>,
}

impl<Ty> Default for InferenceResult<Ty> {
    fn default() -> Self {
        Self {
            values: FxIndexMap::default(),
        }
    }
}

impl<Ty: QualifiedType> InferenceResult<Ty> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, target: TargetId) -> Option<&InferredValue<Ty>> {
        self.values.get(&target)
    }

    pub fn contains(&self, target: TargetId) -> bool {
        self.values.contains_key(&target)
    }

    /// The concrete type inferred for `target`, if any.
    pub fn inferred_type(&self, target: TargetId) -> Option<&Ty> {
        self.get(target).and_then(InferredValue::as_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetId, &InferredValue<Ty>)> {
        self.values.iter().map(|(target, value)| (*target, value))
    }

    /// Set the value of `target`, returning the previous one.
    pub fn insert(
        &mut self,
        target: TargetId,
        value: InferredValue<Ty>,
    ) -> Option<InferredValue<Ty>> {
        self.values.insert(target, value)
    }

    pub fn insert_type(&mut self, target: TargetId, ty: Ty) -> Option<InferredValue<Ty>> {
        self.insert(target, InferredValue::Type(ty))
    }

    pub fn insert_alias(
        &mut self,
        target: TargetId,
        equivalent: TargetId,
        additional_qualifiers: QualifierSet,
    ) -> Option<InferredValue<Ty>> {
        self.insert(target, InferredValue::alias(equivalent, additional_qualifiers))
    }

    /// The members of `all_targets` that still lack an answer, in input order.
    ///
    /// With `inferred_types_only`, only a concrete type counts as an answer;
    /// otherwise an alias counts too.
    pub fn remaining_targets(
        &self,
        all_targets: impl IntoIterator<Item = TargetId>,
        inferred_types_only: bool,
    ) -> TargetSet {
        all_targets
            .into_iter()
            .filter(|target| match self.values.get(target) {
                None => true,
                Some(value) => inferred_types_only && !value.is_type(),
            })
            .collect()
    }

    /// Whether every target has a concrete answer other than the null type.
    ///
    /// The null type is never a valid type argument, so a target resolved to
    /// it still needs another strategy.
    pub fn is_complete(&self, targets: impl IntoIterator<Item = TargetId>) -> bool {
        targets
            .into_iter()
            .all(|target| match self.values.get(&target) {
                Some(InferredValue::Type(ty)) => !ty.is_null_type(),
                Some(InferredValue::Target { .. }) | None => false,
            })
    }

    /// Propagate concrete answers along alias chains until nothing changes.
    ///
    /// An alias whose pointee is concrete becomes a deep copy of the pointee's
    /// type with the alias's additional qualifiers applied. Every productive
    /// pass turns at least one alias into a type, so the loop runs at most
    /// `len() + 1` times. Aliases that never reach a concrete type are left
    /// in place; running this again after convergence changes nothing.
    pub fn resolve_chained_targets(&mut self) {
        let mut grew = true;
        while grew {
            grew = false;
            for index in 0..self.values.len() {
                let resolved = match self.values.get_index(index) {
                    Some((
                        _,
                        InferredValue::Target {
                            target: pointee,
                            additional_qualifiers,
                        },
                    )) => match self.values.get(pointee) {
                        Some(InferredValue::Type(ty)) => {
                            ty.copy_with_qualifiers(additional_qualifiers)
                        }
                        _ => continue,
                    },
                    _ => continue,
                };

                if let Some((target, value)) = self.values.get_index_mut(index) {
                    trace!(param = %target, "resolved chained target");
                    *value = InferredValue::Type(resolved);
                    grew = true;
                }
            }
        }
    }

    /// The concrete answers as a plain map. Aliases carry no usable answer
    /// on their own and are dropped.
    pub fn to_type_map(&self) -> FxIndexMap<TargetId, Ty> {
        self.values
            .iter()
            .filter_map(|(target, value)| value.as_type().map(|ty| (*target, ty.clone())))
            .collect()
    }

    /// Merge `subordinate` into this result.
    ///
    /// Targets this result already knows are resolved through
    /// [`merge_target`](Self::merge_target); targets only the subordinate
    /// knows are copied verbatim. Chain resolution runs afterwards so the new
    /// values can complete existing aliases.
    pub fn merge_subordinate(&mut self, subordinate: &InferenceResult<Ty>) {
        let previous: Vec<TargetId> = self.values.keys().copied().collect();
        let mut guard = RecursionGuard::with_profile(RecursionProfile::AliasChain);

        for target in previous {
            self.merge_target(target, subordinate, &mut guard);
            if guard.is_exceeded() {
                debug!(param = %target, "alias chain too deep during merge");
            }
            guard.reset();
        }

        let mut copied = 0usize;
        for (target, value) in subordinate.iter() {
            if !self.values.contains_key(&target) {
                self.values.insert(target, value.clone());
                copied += 1;
            }
        }

        debug!(
            merged = self.values.len() - copied,
            copied, "merged subordinate inference result"
        );
        self.resolve_chained_targets();
    }

    /// Resolve `target` against `subordinate`, keeping only answers that lead
    /// to a concrete type. Returns the concrete type `target` ends up with
    /// when it was reached through the receiver's own alias chain.
    ///
    /// - Concrete receiver value: returned unchanged, the receiver wins.
    /// - Alias with no concrete pointee: replaced by the subordinate's
    ///   concrete value for `target`, if any, and `None` is returned so
    ///   nothing propagates further up the chain.
    /// - Alias whose pointee resolves to the null type: the subordinate's type
    ///   for `target` is used instead, carrying the null type's qualifiers.
    /// - Otherwise the pointee's type is installed.
    ///
    /// A cycle of aliases, or a chain deeper than the guard allows, counts as
    /// having no concrete pointee.
    fn merge_target(
        &mut self,
        target: TargetId,
        subordinate: &InferenceResult<Ty>,
        guard: &mut RecursionGuard<TargetId>,
    ) -> Option<Ty> {
        let pointee = match self.values.get(&target)? {
            InferredValue::Type(ty) => return Some(ty.clone()),
            InferredValue::Target { target: pointee, .. } => *pointee,
        };

        let resolved = match guard.enter(target) {
            RecursionResult::Entered => {
                let resolved = self.merge_target(pointee, subordinate, guard);
                guard.leave(target);
                resolved
            }
            RecursionResult::Cycle => {
                trace!(param = %target, "alias cycle during merge");
                None
            }
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => None,
        };

        let sub_type = subordinate.inferred_type(target);
        match resolved {
            None => {
                if let Some(ty) = sub_type {
                    self.values.insert(target, InferredValue::Type(ty.clone()));
                }
                None
            }
            Some(mut ty) => {
                if ty.is_null_type() {
                    if let Some(substitute) = sub_type {
                        ty = substitute.copy_with_qualifiers(ty.primary_qualifiers());
                    }
                }
                self.values.insert(target, InferredValue::Type(ty.clone()));
                Some(ty)
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/result_tests.rs"]
mod tests;

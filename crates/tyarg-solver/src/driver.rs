//! Fallback-ordered inference over one session.

use crate::constraints::ConstraintMap;
use crate::result::InferenceResult;
use crate::strategy::InferenceStrategy;
use crate::target::{TargetId, TargetSet};
use crate::types::QualifiedType;
use tracing::{debug, trace};
use tyarg_common::FxIndexMap;

/// Outcome of running [`TypeArgumentInference::infer`].
#[derive(Clone, Debug)]
pub struct InferenceOutcome<Ty> {
    /// Accumulated result of every strategy that ran.
    pub result: InferenceResult<Ty>,
    /// Whether every target ended with a concrete non-null type.
    pub complete: bool,
    /// Names of the strategies that ran, in order.
    pub strategies_run: Vec<&'static str>,
    /// Targets still lacking a concrete non-null type, in target order.
    pub remaining: TargetSet,
}

impl<Ty: QualifiedType> InferenceOutcome<Ty> {
    /// Concrete answers only.
    pub fn type_map(&self) -> FxIndexMap<TargetId, Ty> {
        self.result.to_type_map()
    }
}

/// Inference session: a fixed target set and its baseline constraints.
///
/// Each strategy solves against its own branch of the baseline. Its result is
/// merged as a subordinate into the accumulated result, so answers found by
/// earlier strategies take precedence.
pub struct TypeArgumentInference<Ty> {
    targets: TargetSet,
    baseline: ConstraintMap<Ty>,
}

impl<Ty: QualifiedType> TypeArgumentInference<Ty> {
    pub fn new(baseline: ConstraintMap<Ty>) -> Self {
        Self {
            targets: baseline.target_set(),
            baseline,
        }
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn baseline(&self) -> &ConstraintMap<Ty> {
        &self.baseline
    }

    /// Run `strategies` in order until every target is answered.
    pub fn infer(&self, strategies: &[&dyn InferenceStrategy<Ty>]) -> InferenceOutcome<Ty> {
        let mut result = InferenceResult::new();
        let mut strategies_run = Vec::with_capacity(strategies.len());

        for strategy in strategies {
            if result.is_complete(self.targets.iter().copied()) {
                break;
            }

            let mut branch = self.baseline.clone();
            let found = strategy.solve(&mut branch, &result);
            trace!(
                strategy = strategy.name(),
                answered = found.len(),
                "strategy finished"
            );
            result.merge_subordinate(&found);
            strategies_run.push(strategy.name());
        }

        // A target answered with the null type still counts as remaining.
        let remaining: TargetSet = self
            .targets
            .iter()
            .copied()
            .filter(|target| !result.is_complete([*target]))
            .collect();
        let complete = remaining.is_empty();
        debug!(
            targets = self.targets.len(),
            remaining = remaining.len(),
            complete,
            strategies = ?strategies_run,
            "type argument inference finished"
        );

        InferenceOutcome {
            result,
            complete,
            strategies_run,
            remaining,
        }
    }
}

#[cfg(test)]
#[path = "../tests/driver_tests.rs"]
mod tests;

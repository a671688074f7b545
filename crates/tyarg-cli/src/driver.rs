//! Scenario resolution and the inference run behind the `tyarg` binary.

use anyhow::{Context, Result, anyhow, bail};
use rustc_hash::FxHashMap;
use tracing::{debug, info};
use tyarg_common::{QualifierLattice, QualifierSet};
use tyarg_solver::{
    ConstraintMap, EqualitiesStrategy, InferenceStrategy, NominalOracle, SimpleType,
    SubtypesStrategy, SupertypesStrategy, TargetId, TypeArgumentInference,
};

use crate::args::StrategyKind;
use crate::reporter::InferenceReport;
use crate::scenario::{ConstraintSpec, NULL_TYPE_NAME, Operand, Relation, Scenario, TypeSpec};

/// Target names of a scenario, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TargetNames {
    names: Vec<String>,
    ids: FxHashMap<String, TargetId>,
}

impl TargetNames {
    pub fn new(names: &[String]) -> Result<Self> {
        let mut targets = Self::default();
        for name in names {
            let id = u32::try_from(targets.names.len())
                .map(TargetId)
                .map_err(|_| anyhow!("too many targets"))?;
            if targets.ids.insert(name.clone(), id).is_some() {
                bail!("target '{name}' is declared twice");
            }
            targets.names.push(name.clone());
        }
        Ok(targets)
    }

    pub fn id(&self, name: &str) -> Result<TargetId> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown target '{name}'"))
    }

    pub fn name(&self, target: TargetId) -> &str {
        self.names
            .get(target.0 as usize)
            .map_or("<unknown>", String::as_str)
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = TargetId> + '_ {
        (0..self.names.len()).map(|index| TargetId(index as u32))
    }
}

pub fn build_lattice(scenario: &Scenario) -> Result<QualifierLattice> {
    let mut lattice = QualifierLattice::new();
    for (index, names) in scenario.qualifiers.iter().enumerate() {
        lattice
            .add_hierarchy(names.iter().cloned())
            .with_context(|| format!("invalid qualifier hierarchy #{index}"))?;
    }
    Ok(lattice)
}

pub fn build_oracle<'a>(
    scenario: &Scenario,
    lattice: &'a QualifierLattice,
) -> Result<NominalOracle<&'a QualifierLattice>> {
    let mut oracle = NominalOracle::new(lattice);
    for decl in &scenario.types {
        if decl.name == NULL_TYPE_NAME {
            bail!("'{NULL_TYPE_NAME}' is reserved for the null type");
        }
        oracle.declare(decl.name.as_str(), decl.extends.as_deref())?;
    }
    Ok(oracle)
}

fn resolve_qualifiers(names: &[String], lattice: &QualifierLattice) -> Result<QualifierSet> {
    let mut set = QualifierSet::new();
    for name in names {
        let qualifier = lattice
            .lookup(name)
            .ok_or_else(|| anyhow!("unknown qualifier '{name}'"))?;
        if set.in_hierarchy(qualifier.hierarchy).is_some() {
            bail!("qualifier '{name}' conflicts with another qualifier of its hierarchy");
        }
        set.insert(qualifier);
    }
    Ok(set)
}

/// Hierarchy tops a target or type relation holds in.
fn resolve_hierarchies(
    names: Option<&[String]>,
    lattice: &QualifierLattice,
) -> Result<QualifierSet> {
    let Some(names) = names else {
        return Ok(lattice.tops());
    };
    let mut tops = QualifierSet::new();
    for name in names {
        let qualifier = lattice
            .lookup(name)
            .ok_or_else(|| anyhow!("unknown qualifier hierarchy '{name}'"))?;
        if !qualifier.is_top() {
            bail!("'{name}' is not the top of its qualifier hierarchy");
        }
        tops.insert(qualifier);
    }
    Ok(tops)
}

pub fn resolve_type(
    spec: &TypeSpec,
    lattice: &QualifierLattice,
    oracle: &NominalOracle<&QualifierLattice>,
) -> Result<SimpleType> {
    let qualifiers = resolve_qualifiers(&spec.qualifiers, lattice)
        .with_context(|| format!("in type '{}'", spec.name))?;

    if spec.name == NULL_TYPE_NAME {
        if !spec.args.is_empty() {
            bail!("the null type takes no type arguments");
        }
        return Ok(SimpleType::null().with_qualifiers(qualifiers));
    }
    if !oracle.is_declared(&spec.name) {
        bail!("unknown type '{}'", spec.name);
    }

    let args = spec
        .args
        .iter()
        .map(|arg| resolve_type(arg, lattice, oracle))
        .collect::<Result<Vec<_>>>()?;
    Ok(SimpleType::declared(spec.name.as_str())
        .with_args(args)
        .with_qualifiers(qualifiers))
}

fn add_constraint(
    map: &mut ConstraintMap<SimpleType>,
    spec: &ConstraintSpec,
    targets: &TargetNames,
    lattice: &QualifierLattice,
    oracle: &NominalOracle<&QualifierLattice>,
) -> Result<()> {
    let target = targets.id(&spec.target)?;
    let operand = spec.operand()?;
    if spec.hierarchies.is_some() && matches!(operand, Operand::Qualifiers(_)) {
        bail!("hierarchies only apply to target and type relations");
    }
    let hierarchies = resolve_hierarchies(spec.hierarchies.as_deref(), lattice)?;

    match (spec.relation, operand) {
        (Relation::Equal, Operand::Target(other)) => {
            map.add_target_equality(target, targets.id(other)?, &hierarchies)
        }
        (Relation::Subtype, Operand::Target(other)) => {
            map.add_target_subtype(target, targets.id(other)?, &hierarchies)
        }
        (Relation::Supertype, Operand::Target(other)) => {
            map.add_target_supertype(target, targets.id(other)?, &hierarchies)
        }
        (relation, Operand::Type(ty)) => {
            let ty = resolve_type(ty, lattice, oracle)?;
            match relation {
                Relation::Equal => map.add_type_equality(target, ty, &hierarchies),
                Relation::Subtype => map.add_type_subtype(target, ty, &hierarchies),
                Relation::Supertype => map.add_type_supertype(target, ty, &hierarchies),
            }
        }
        (relation, Operand::Qualifiers(names)) => {
            let annos = resolve_qualifiers(names, lattice)?;
            match relation {
                Relation::Equal => map.add_primary_equalities(target, lattice, &annos),
                Relation::Subtype => map.add_primary_subtypes(target, lattice, &annos),
                Relation::Supertype => map.add_primary_supertypes(target, lattice, &annos),
            }
        }
    }
    Ok(())
}

pub fn build_constraints(
    scenario: &Scenario,
    targets: &TargetNames,
    lattice: &QualifierLattice,
    oracle: &NominalOracle<&QualifierLattice>,
) -> Result<ConstraintMap<SimpleType>> {
    let mut map = ConstraintMap::new(targets.ids());
    for (index, spec) in scenario.constraints.iter().enumerate() {
        add_constraint(&mut map, spec, targets, lattice, oracle)
            .with_context(|| format!("invalid constraint #{index}"))?;
    }
    Ok(map)
}

/// Resolve `scenario`, run `strategies` in order and report the outcome.
pub fn run(scenario: &Scenario, strategies: &[StrategyKind]) -> Result<InferenceReport> {
    let lattice = build_lattice(scenario)?;
    let oracle = build_oracle(scenario, &lattice)?;
    let targets = TargetNames::new(&scenario.targets)?;
    let baseline = build_constraints(scenario, &targets, &lattice, &oracle)?;
    debug!(
        hierarchies = lattice.hierarchy_count(),
        targets = targets.ids().len(),
        constraints = scenario.constraints.len(),
        "scenario resolved"
    );

    let equalities = EqualitiesStrategy;
    let supertypes: SupertypesStrategy<'_, SimpleType> = SupertypesStrategy::new(&oracle, &lattice);
    let subtypes: SubtypesStrategy<'_, SimpleType> = SubtypesStrategy::new(&oracle, &lattice);
    let ordered: Vec<&dyn InferenceStrategy<SimpleType>> = strategies
        .iter()
        .map(|kind| -> &dyn InferenceStrategy<SimpleType> {
            match kind {
                StrategyKind::Equalities => &equalities,
                StrategyKind::Supertypes => &supertypes,
                StrategyKind::Subtypes => &subtypes,
            }
        })
        .collect();

    let outcome = TypeArgumentInference::new(baseline).infer(&ordered);
    info!(
        complete = outcome.complete,
        remaining = outcome.remaining.len(),
        "inference finished"
    );
    Ok(InferenceReport::new(&outcome, &targets, &lattice))
}

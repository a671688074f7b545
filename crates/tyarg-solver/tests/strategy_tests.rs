use super::*;
use crate::result::InferredValue;
use crate::types::{NominalOracle, SimpleType};
use tyarg_common::QualifierLattice;

const T: TargetId = TargetId(0);
const U: TargetId = TargetId(1);
const V: TargetId = TargetId(2);

struct Fixture {
    lattice: QualifierLattice,
    nullable: Qualifier,
    non_null: Qualifier,
    untainted: Qualifier,
}

impl Fixture {
    fn new() -> Self {
        let mut lattice = QualifierLattice::new();
        lattice
            .add_hierarchy(["Nullable", "NonNull"])
            .expect("nullness registers");
        lattice
            .add_hierarchy(["Tainted", "Untainted"])
            .expect("taint registers");
        Self {
            nullable: lattice.lookup("Nullable").expect("declared"),
            non_null: lattice.lookup("NonNull").expect("declared"),
            untainted: lattice.lookup("Untainted").expect("declared"),
            lattice,
        }
    }

    fn oracle(&self) -> NominalOracle<&QualifierLattice> {
        let mut oracle = NominalOracle::new(&self.lattice);
        for (name, parent) in [
            ("Object", None),
            ("Number", Some("Object")),
            ("Integer", Some("Number")),
            ("Double", Some("Number")),
            ("String", Some("Object")),
            ("List", None),
        ] {
            oracle.declare(name, parent).expect("declaration order is valid");
        }
        oracle
    }

    fn tops(&self) -> QualifierSet {
        self.lattice.tops()
    }
}

fn named(name: &str) -> SimpleType {
    SimpleType::declared(name)
}

fn create_test_map() -> ConstraintMap<SimpleType> {
    ConstraintMap::new([T, U, V])
}

fn solve_equalities(
    map: &mut ConstraintMap<SimpleType>,
    established: &InferenceResult<SimpleType>,
) -> InferenceResult<SimpleType> {
    EqualitiesStrategy.solve(map, established)
}

// =============================================================================
// EqualitiesStrategy
// =============================================================================

#[test]
fn test_equalities_picks_first_type_with_primary_equalities() {
    let fx = Fixture::new();
    let mut map = create_test_map();
    map.add_type_equality(T, named("String").with_qualifier(fx.nullable), &fx.tops());
    map.add_type_equality(T, named("Integer"), &fx.tops());
    map.add_primary_equalities(T, &fx.lattice, &QualifierSet::single(fx.non_null));

    let result = solve_equalities(&mut map, &InferenceResult::new());

    let ty = result.inferred_type(T).expect("T inferred");
    assert_eq!(ty.name(), Some("String"));
    assert_eq!(ty.qualifiers, QualifierSet::single(fx.non_null));
    assert!(!result.contains(U));
}

#[test]
fn test_equalities_propagate_across_equal_targets() {
    let fx = Fixture::new();
    let mut map = create_test_map();
    // T == U is recorded before U's answer is known.
    map.add_target_equality(T, U, &fx.tops());
    map.add_type_equality(U, named("String"), &fx.tops());

    let result = solve_equalities(&mut map, &InferenceResult::new());

    assert_eq!(result.inferred_type(T), Some(&named("String")));
    assert_eq!(result.inferred_type(U), Some(&named("String")));
    assert!(!result.contains(V));
}

#[test]
fn test_equalities_alias_unanswered_equal_target() {
    let fx = Fixture::new();
    let mut map = create_test_map();
    map.add_target_equality(T, T, &fx.tops());
    map.add_target_equality(T, U, &fx.tops());
    map.add_primary_equalities(T, &fx.lattice, &QualifierSet::single(fx.untainted));

    let result = solve_equalities(&mut map, &InferenceResult::new());

    assert_eq!(
        result.get(T),
        Some(&InferredValue::alias(U, QualifierSet::single(fx.untainted)))
    );
    assert_eq!(result.remaining_targets([T, U], false).len(), 1);
}

#[test]
fn test_equalities_use_established_types_of_equal_targets() {
    let fx = Fixture::new();
    let mut map = create_test_map();
    map.add_target_equality(T, U, &fx.tops());
    map.add_primary_equalities(T, &fx.lattice, &QualifierSet::single(fx.nullable));

    let mut established = InferenceResult::new();
    established.insert_type(U, named("Integer").with_qualifier(fx.non_null));

    let result = solve_equalities(&mut map, &established);

    assert_eq!(
        result.inferred_type(T),
        Some(&named("Integer").with_qualifier(fx.nullable))
    );
    // Settled targets are not answered again.
    assert!(!result.contains(U));
    // The established type was folded into T's record.
    assert_eq!(map.constraints(T).equalities.types.len(), 1);
}

#[test]
fn test_equalities_retry_established_null_type() {
    let fx = Fixture::new();
    let mut map = create_test_map();
    map.add_type_equality(T, named("String"), &fx.tops());

    let mut established = InferenceResult::new();
    established.insert_type(T, SimpleType::null());

    let result = solve_equalities(&mut map, &established);
    assert_eq!(result.inferred_type(T), Some(&named("String")));
}

#[test]
fn test_strategy_writes_stay_on_branch() {
    let fx = Fixture::new();
    let mut baseline = create_test_map();
    baseline.add_target_equality(T, U, &fx.tops());

    let mut established = InferenceResult::new();
    established.insert_type(U, named("String"));

    let mut branch = baseline.clone();
    let result = solve_equalities(&mut branch, &established);

    assert!(result.inferred_type(T).is_some());
    assert!(baseline.constraints(T).equalities.types.is_empty());
    assert!(!branch.shares_record_with(&baseline, T));
    assert!(branch.shares_record_with(&baseline, V));
}

// =============================================================================
// SupertypesStrategy
// =============================================================================

#[test]
fn test_supertypes_join_lower_bounds() {
    let fx = Fixture::new();
    let oracle = fx.oracle();
    let strategy: SupertypesStrategy<'_, SimpleType> = SupertypesStrategy::new(&oracle, &fx.lattice);
    let mut map = create_test_map();
    map.add_type_supertype(T, named("Integer").with_qualifier(fx.non_null), &fx.tops());
    map.add_type_supertype(T, named("Double").with_qualifier(fx.non_null), &fx.tops());
    map.add_primary_supertypes(T, &fx.lattice, &QualifierSet::single(fx.nullable));

    let result = strategy.solve(&mut map, &InferenceResult::new());

    let ty = result.inferred_type(T).expect("T inferred");
    assert_eq!(ty.name(), Some("Number"));
    assert_eq!(ty.qualifiers, QualifierSet::single(fx.nullable));
    assert_eq!(strategy.name(), "supertypes");
}

#[test]
fn test_supertypes_include_established_related_targets() {
    let fx = Fixture::new();
    let oracle = fx.oracle();
    let strategy: SupertypesStrategy<'_, SimpleType> = SupertypesStrategy::new(&oracle, &fx.lattice);
    let mut map = create_test_map();
    map.add_type_supertype(T, named("Integer"), &fx.tops());
    map.add_target_supertype(T, U, &fx.tops());

    let mut established = InferenceResult::new();
    established.insert_type(U, named("String"));

    let result = strategy.solve(&mut map, &established);

    assert_eq!(result.inferred_type(T).and_then(SimpleType::name), Some("Object"));
}

#[test]
fn test_supertypes_without_common_bound_leave_target_open() {
    let fx = Fixture::new();
    let oracle = fx.oracle();
    let strategy: SupertypesStrategy<'_, SimpleType> = SupertypesStrategy::new(&oracle, &fx.lattice);
    let mut map = create_test_map();
    map.add_type_supertype(T, named("List"), &fx.tops());
    map.add_type_supertype(T, named("Integer"), &fx.tops());
    map.add_type_supertype(U, named("Integer"), &fx.tops());

    let result = strategy.solve(&mut map, &InferenceResult::new());

    assert!(!result.contains(T));
    assert_eq!(result.inferred_type(U), Some(&named("Integer")));
}

#[test]
fn test_supertypes_answer_flows_to_earlier_declared_targets() {
    let fx = Fixture::new();
    let oracle = fx.oracle();
    let strategy: SupertypesStrategy<'_, SimpleType> = SupertypesStrategy::new(&oracle, &fx.lattice);
    let mut map = create_test_map();
    map.add_target_supertype(T, U, &fx.tops());
    map.add_target_supertype(U, V, &fx.tops());
    map.add_type_supertype(V, named("String"), &fx.tops());

    let result = strategy.solve(&mut map, &InferenceResult::new());

    assert_eq!(result.inferred_type(V), Some(&named("String")));
    assert_eq!(result.inferred_type(U), Some(&named("String")));
    assert_eq!(result.inferred_type(T), Some(&named("String")));
}

#[test]
fn test_supertypes_break_target_cycles() {
    let fx = Fixture::new();
    let oracle = fx.oracle();
    let strategy: SupertypesStrategy<'_, SimpleType> = SupertypesStrategy::new(&oracle, &fx.lattice);
    let mut map = create_test_map();
    map.add_target_supertype(T, U, &fx.tops());
    map.add_target_supertype(U, T, &fx.tops());
    map.add_type_supertype(T, named("Integer"), &fx.tops());
    map.add_type_supertype(U, named("Double"), &fx.tops());

    let result = strategy.solve(&mut map, &InferenceResult::new());

    assert_eq!(result.inferred_type(T), Some(&named("Integer")));
    assert_eq!(result.inferred_type(U), Some(&named("Number")));
    assert!(!result.contains(V));
}

// =============================================================================
// SubtypesStrategy
// =============================================================================

#[test]
fn test_subtypes_meet_upper_bounds() {
    let fx = Fixture::new();
    let oracle = fx.oracle();
    let strategy: SubtypesStrategy<'_, SimpleType> = SubtypesStrategy::new(&oracle, &fx.lattice);
    let mut map = create_test_map();
    map.add_type_subtype(T, named("Number").with_qualifier(fx.nullable), &fx.tops());
    map.add_type_subtype(T, named("Integer").with_qualifier(fx.nullable), &fx.tops());
    map.add_primary_subtypes(T, &fx.lattice, &QualifierSet::single(fx.non_null));

    let result = strategy.solve(&mut map, &InferenceResult::new());

    let ty = result.inferred_type(T).expect("T inferred");
    assert_eq!(ty.name(), Some("Integer"));
    assert_eq!(ty.qualifiers, QualifierSet::single(fx.non_null));
    assert_eq!(strategy.name(), "subtypes");
}

#[test]
fn test_subtypes_skip_settled_targets() {
    let fx = Fixture::new();
    let oracle = fx.oracle();
    let strategy: SubtypesStrategy<'_, SimpleType> = SubtypesStrategy::new(&oracle, &fx.lattice);
    let mut map = create_test_map();
    map.add_type_subtype(T, named("Number"), &fx.tops());

    let mut established = InferenceResult::new();
    established.insert_type(T, named("Integer"));

    let result = strategy.solve(&mut map, &established);
    assert!(result.is_empty());
}

#[test]
fn test_subtypes_answer_flows_to_earlier_declared_targets() {
    let fx = Fixture::new();
    let oracle = fx.oracle();
    let strategy: SubtypesStrategy<'_, SimpleType> = SubtypesStrategy::new(&oracle, &fx.lattice);
    let mut map = create_test_map();
    map.add_type_subtype(T, named("Number"), &fx.tops());
    map.add_target_subtype(T, U, &fx.tops());
    map.add_type_subtype(U, named("Integer"), &fx.tops());

    let result = strategy.solve(&mut map, &InferenceResult::new());

    assert_eq!(result.inferred_type(U), Some(&named("Integer")));
    assert_eq!(result.inferred_type(T), Some(&named("Integer")));
}

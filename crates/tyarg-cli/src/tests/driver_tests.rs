use super::args::StrategyKind;
use super::driver::{
    TargetNames, build_constraints, build_lattice, build_oracle, resolve_type, run,
};
use super::reporter::TargetValue;
use super::scenario::{Scenario, TypeSpec, parse_scenario};
use tyarg_solver::{QualifiedType, SimpleType, TargetId};

fn scenario(source: &str) -> Scenario {
    parse_scenario(source).expect("test scenario should parse")
}

const HIERARCHY: &str = r#"
  "qualifiers": [["Nullable", "NonNull"], ["Tainted", "Untainted"]],
  "types": [
    { "name": "Object" },
    { "name": "Number", "extends": "Object" },
    { "name": "Integer", "extends": "Number" },
    { "name": "Double", "extends": "Number" },
    { "name": "String", "extends": "Object" },
    { "name": "List" }
  ]"#;

fn with_hierarchy(rest: &str) -> Scenario {
    scenario(&format!("{{ {HIERARCHY}, {rest} }}"))
}

fn type_spec(name: &str, qualifiers: &[&str]) -> TypeSpec {
    TypeSpec {
        name: name.to_string(),
        args: Vec::new(),
        qualifiers: qualifiers.iter().map(|q| q.to_string()).collect(),
    }
}

#[test]
fn target_names_are_unique_and_ordered() {
    let names = TargetNames::new(&["T".to_string(), "U".to_string()]).expect("unique names");
    assert_eq!(names.id("U").expect("declared"), TargetId(1));
    assert_eq!(names.name(TargetId(0)), "T");
    assert_eq!(names.ids().collect::<Vec<_>>(), vec![TargetId(0), TargetId(1)]);
    assert!(names.id("V").is_err());

    let err = TargetNames::new(&["T".to_string(), "T".to_string()]).expect_err("duplicate");
    assert!(err.to_string().contains("declared twice"));
}

#[test]
fn resolves_nested_qualified_types() {
    let scenario = with_hierarchy(r#""targets": []"#);
    let lattice = build_lattice(&scenario).expect("lattice");
    let oracle = build_oracle(&scenario, &lattice).expect("oracle");

    let mut list = type_spec("List", &["NonNull"]);
    list.args.push(type_spec("String", &["Nullable", "Untainted"]));
    let ty = resolve_type(&list, &lattice, &oracle).expect("type resolves");

    let non_null = lattice.lookup("NonNull").expect("declared");
    let nullable = lattice.lookup("Nullable").expect("declared");
    let untainted = lattice.lookup("Untainted").expect("declared");
    assert_eq!(
        ty,
        SimpleType::declared("List")
            .with_args(vec![
                SimpleType::declared("String")
                    .with_qualifier(nullable)
                    .with_qualifier(untainted)
            ])
            .with_qualifier(non_null)
    );

    let null = resolve_type(&type_spec("null", &["Nullable"]), &lattice, &oracle).expect("null");
    assert!(null.is_null_type());
}

#[test]
fn rejects_invalid_type_uses() {
    let scenario = with_hierarchy(r#""targets": []"#);
    let lattice = build_lattice(&scenario).expect("lattice");
    let oracle = build_oracle(&scenario, &lattice).expect("oracle");

    let unknown = resolve_type(&type_spec("Map", &[]), &lattice, &oracle).expect_err("unknown");
    assert!(unknown.to_string().contains("unknown type 'Map'"));

    let clash = resolve_type(&type_spec("String", &["Nullable", "NonNull"]), &lattice, &oracle)
        .expect_err("two nullness qualifiers");
    assert!(format!("{clash:#}").contains("conflicts"));

    let mut null_with_args = type_spec("null", &[]);
    null_with_args.args.push(type_spec("String", &[]));
    assert!(resolve_type(&null_with_args, &lattice, &oracle).is_err());
}

#[test]
fn rejects_invalid_declarations() {
    let duplicate_qualifier = scenario(r#"{ "qualifiers": [["A", "B"], ["B"]], "targets": [] }"#);
    let err = build_lattice(&duplicate_qualifier).expect_err("duplicate qualifier");
    assert!(format!("{err:#}").contains("declared twice"));

    let forward = scenario(
        r#"{ "types": [{ "name": "Integer", "extends": "Number" }], "targets": [] }"#,
    );
    let lattice = build_lattice(&forward).expect("empty lattice");
    assert!(build_oracle(&forward, &lattice).is_err());

    let reserved = scenario(r#"{ "types": [{ "name": "null" }], "targets": [] }"#);
    assert!(build_oracle(&reserved, &lattice).is_err());
}

#[test]
fn builds_constraints_with_default_and_explicit_hierarchies() {
    let scenario = with_hierarchy(
        r#""targets": ["T", "U"],
        "constraints": [
          { "relation": "equal", "target": "T", "otherTarget": "U" },
          { "relation": "subtype", "target": "U", "type": { "name": "Number" },
            "hierarchies": ["Tainted"] },
          { "relation": "supertype", "target": "T", "qualifiers": ["NonNull"] }
        ]"#,
    );
    let lattice = build_lattice(&scenario).expect("lattice");
    let oracle = build_oracle(&scenario, &lattice).expect("oracle");
    let targets = TargetNames::new(&scenario.targets).expect("targets");
    let map = build_constraints(&scenario, &targets, &lattice, &oracle).expect("constraints");

    let t = map.constraints(TargetId(0));
    assert_eq!(t.equalities.targets[&TargetId(1)], lattice.tops());
    let nullable = lattice.lookup("Nullable").expect("declared");
    assert!(t.supertypes.primaries[&nullable].contains(lattice.lookup("NonNull").expect("declared")));

    let u = map.constraints(TargetId(1));
    let tainted = lattice.lookup("Tainted").expect("declared");
    assert_eq!(
        u.subtypes.types[&SimpleType::declared("Number")].iter().collect::<Vec<_>>(),
        vec![tainted]
    );
}

#[test]
fn rejects_invalid_constraints() {
    let cases = [
        (r#"{ "relation": "equal", "target": "X", "otherTarget": "T" }"#, "unknown target 'X'"),
        (r#"{ "relation": "equal", "target": "T", "otherTarget": "Y" }"#, "unknown target 'Y'"),
        (
            r#"{ "relation": "equal", "target": "T", "otherTarget": "T", "hierarchies": ["NonNull"] }"#,
            "is not the top",
        ),
        (
            r#"{ "relation": "equal", "target": "T", "qualifiers": ["NonNull"], "hierarchies": ["Nullable"] }"#,
            "only apply to target and type relations",
        ),
        (r#"{ "relation": "subtype", "target": "T", "qualifiers": ["Bogus"] }"#, "unknown qualifier"),
    ];

    for (constraint, expected) in cases {
        let scenario = with_hierarchy(&format!(r#""targets": ["T"], "constraints": [{constraint}]"#));
        let lattice = build_lattice(&scenario).expect("lattice");
        let oracle = build_oracle(&scenario, &lattice).expect("oracle");
        let targets = TargetNames::new(&scenario.targets).expect("targets");

        let err = build_constraints(&scenario, &targets, &lattice, &oracle)
            .expect_err("constraint should be rejected");
        let message = format!("{err:#}");
        assert!(message.contains("invalid constraint #0"), "{message}");
        assert!(message.contains(expected), "{message}");
    }
}

#[test]
fn run_infers_through_all_strategies() {
    let scenario = with_hierarchy(
        r#""targets": ["T", "U", "V"],
        "constraints": [
          { "relation": "equal", "target": "T", "type": { "name": "String", "qualifiers": ["NonNull"] } },
          { "relation": "supertype", "target": "U", "type": { "name": "Integer" } },
          { "relation": "supertype", "target": "U", "type": { "name": "Double" } },
          { "relation": "subtype", "target": "V", "type": { "name": "Integer", "qualifiers": ["Nullable"] } },
          { "relation": "subtype", "target": "V", "qualifiers": ["NonNull"] }
        ]"#,
    );

    let report = run(&scenario, &StrategyKind::ALL).expect("run succeeds");

    assert!(report.complete);
    assert!(report.unresolved.is_empty());
    assert_eq!(report.strategies_run, vec!["equalities", "supertypes", "subtypes"]);
    let values: Vec<_> = report.entries.iter().map(|entry| entry.value.clone()).collect();
    assert_eq!(
        values,
        vec![
            TargetValue::Type("@NonNull String".to_string()),
            TargetValue::Type("Number".to_string()),
            TargetValue::Type("@NonNull Integer".to_string()),
        ]
    );
}

#[test]
fn run_respects_strategy_selection() {
    let scenario = with_hierarchy(
        r#""targets": ["T"],
        "constraints": [
          { "relation": "supertype", "target": "T", "type": { "name": "Integer" } }
        ]"#,
    );

    let report = run(&scenario, &[StrategyKind::Equalities]).expect("run succeeds");

    assert!(!report.complete);
    assert_eq!(report.unresolved, vec!["T"]);
    assert_eq!(report.entries[0].value, TargetValue::Unresolved);
}

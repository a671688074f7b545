use anyhow::Result;
use serde_json::{Map, Value, json};
use std::fmt::Write as _;
use std::io::Write;
use tyarg_common::{QualifierLattice, QualifierSet};
use tyarg_solver::{InferenceOutcome, InferredValue, SimpleKind, SimpleType};

use crate::args::OutputFormat;
use crate::driver::TargetNames;

/// What a report says about one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetValue {
    /// Rendered inferred type.
    Type(String),
    /// Equal to another target that was never resolved.
    Alias {
        target: String,
        qualifiers: Vec<String>,
    },
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub target: String,
    pub value: TargetValue,
}

/// Rendered outcome of one inference run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceReport {
    pub entries: Vec<TargetEntry>,
    pub unresolved: Vec<String>,
    pub strategies_run: Vec<&'static str>,
    pub complete: bool,
}

fn qualifier_names(qualifiers: &QualifierSet, lattice: &QualifierLattice) -> Vec<String> {
    qualifiers
        .iter()
        .map(|q| {
            lattice
                .name(q)
                .map_or_else(|| format!("{q:?}"), str::to_string)
        })
        .collect()
}

/// Render `ty` as `@Q1 @Q2 Name<Arg, ...>`.
pub fn render_type(ty: &SimpleType, lattice: &QualifierLattice) -> String {
    let mut out = String::new();
    for name in qualifier_names(&ty.qualifiers, lattice) {
        let _ = write!(out, "@{name} ");
    }
    match &ty.kind {
        SimpleKind::Null => out.push_str("null"),
        SimpleKind::Declared { name, args } => {
            out.push_str(name);
            if !args.is_empty() {
                out.push('<');
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&render_type(arg, lattice));
                }
                out.push('>');
            }
        }
    }
    out
}

impl InferenceReport {
    pub fn new(
        outcome: &InferenceOutcome<SimpleType>,
        targets: &TargetNames,
        lattice: &QualifierLattice,
    ) -> Self {
        let entries = targets
            .ids()
            .map(|target| {
                let value = match outcome.result.get(target) {
                    Some(InferredValue::Type(ty)) => TargetValue::Type(render_type(ty, lattice)),
                    Some(InferredValue::Target {
                        target: pointee,
                        additional_qualifiers,
                    }) => TargetValue::Alias {
                        target: targets.name(*pointee).to_string(),
                        qualifiers: qualifier_names(additional_qualifiers, lattice),
                    },
                    None => TargetValue::Unresolved,
                };
                TargetEntry {
                    target: targets.name(target).to_string(),
                    value,
                }
            })
            .collect();

        Self {
            entries,
            unresolved: outcome
                .remaining
                .iter()
                .map(|target| targets.name(*target).to_string())
                .collect(),
            strategies_run: outcome.strategies_run.clone(),
            complete: outcome.complete,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = match &entry.value {
                TargetValue::Type(ty) => writeln!(out, "{} = {ty}", entry.target),
                TargetValue::Alias { target, qualifiers } => {
                    let prefix: String = qualifiers.iter().map(|q| format!("@{q} ")).collect();
                    writeln!(out, "{} -> {prefix}{target}", entry.target)
                }
                TargetValue::Unresolved => writeln!(out, "{} = ?", entry.target),
            };
        }
        let _ = writeln!(out, "strategies: {}", self.strategies_run.join(", "));
        if !self.unresolved.is_empty() {
            let _ = writeln!(out, "unresolved: {}", self.unresolved.join(", "));
        }
        out
    }

    pub fn to_json(&self) -> Value {
        let mut targets = Map::new();
        for entry in &self.entries {
            let value = match &entry.value {
                TargetValue::Type(ty) => json!(ty),
                TargetValue::Alias { target, qualifiers } => {
                    json!({ "alias": target, "qualifiers": qualifiers })
                }
                TargetValue::Unresolved => Value::Null,
            };
            targets.insert(entry.target.clone(), value);
        }

        json!({
            "complete": self.complete,
            "strategies": self.strategies_run,
            "targets": targets,
            "unresolved": self.unresolved,
        })
    }
}

/// Write `report` to `out` in `format`.
pub fn write_report(out: &mut dyn Write, report: &InferenceReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => out.write_all(report.render_text().as_bytes())?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report.to_json())?;
            writeln!(out)?;
        }
    }
    Ok(())
}

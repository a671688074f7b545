//! Scenario files: the JSON description of one inference session.
//!
//! ```json
//! {
//!   "qualifiers": [["Nullable", "NonNull"]],
//!   "types": [{ "name": "Object" }, { "name": "String", "extends": "Object" }],
//!   "targets": ["T", "U"],
//!   "constraints": [
//!     { "relation": "equal", "target": "T", "otherTarget": "U" },
//!     { "relation": "supertype", "target": "U",
//!       "type": { "name": "String", "qualifiers": ["NonNull"] } },
//!     { "relation": "subtype", "target": "T", "qualifiers": ["Nullable"] }
//!   ]
//! }
//! ```
//!
//! Qualifier hierarchies are listed top to bottom. Types must be declared
//! after the type they extend. The type name `null` denotes the null type.
//! Each constraint relates its target to exactly one operand: another target,
//! a type, or bare qualifiers. `hierarchies` (hierarchy top names) restricts
//! target and type relations and defaults to every hierarchy.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

/// Reserved type name of the null type.
pub const NULL_TYPE_NAME: &str = "null";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    /// Qualifier hierarchies, each ordered top to bottom.
    #[serde(default)]
    pub qualifiers: Vec<Vec<String>>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    pub targets: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
}

/// A nominal type declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
}

/// A type use: a declared name applied to arguments, with qualifiers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeSpec {
    pub name: String,
    #[serde(default)]
    pub args: Vec<TypeSpec>,
    #[serde(default)]
    pub qualifiers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// `target == operand`
    Equal,
    /// `target <: operand`
    Subtype,
    /// `target :> operand`
    Supertype,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConstraintSpec {
    pub relation: Relation,
    pub target: String,
    #[serde(default)]
    pub other_target: Option<String>,
    #[serde(default, rename = "type")]
    pub ty: Option<TypeSpec>,
    #[serde(default)]
    pub qualifiers: Option<Vec<String>>,
    #[serde(default)]
    pub hierarchies: Option<Vec<String>>,
}

/// The operand a constraint relates its target to.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Target(&'a str),
    Type(&'a TypeSpec),
    Qualifiers(&'a [String]),
}

impl ConstraintSpec {
    /// The single operand of this constraint.
    pub fn operand(&self) -> Result<Operand<'_>> {
        match (&self.other_target, &self.ty, &self.qualifiers) {
            (Some(other), None, None) => Ok(Operand::Target(other)),
            (None, Some(ty), None) => Ok(Operand::Type(ty)),
            (None, None, Some(qualifiers)) => Ok(Operand::Qualifiers(qualifiers)),
            _ => bail!(
                "constraint on '{}' needs exactly one of otherTarget, type or qualifiers",
                self.target
            ),
        }
    }
}

pub fn parse_scenario(source: &str) -> Result<Scenario> {
    serde_json::from_str(source).context("failed to parse scenario JSON")
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario: {}", path.display()))?;
    parse_scenario(&source).with_context(|| format!("invalid scenario: {}", path.display()))
}

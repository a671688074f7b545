use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the tyarg binary.
#[derive(Parser, Debug)]
#[command(
    name = "tyarg",
    version,
    about = "Infer qualified type arguments from a constraint scenario"
)]
pub struct CliArgs {
    /// Path to the scenario JSON file.
    pub scenario: PathBuf,

    /// Strategies to run, in fallback order.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = StrategyKind::ALL
    )]
    pub strategies: Vec<StrategyKind>,

    /// Output format of the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// A built-in solving strategy.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StrategyKind {
    /// Equal types and targets.
    Equalities,
    /// Least upper bound of lower bounds.
    Supertypes,
    /// Greatest lower bound of upper bounds.
    Subtypes,
}

impl StrategyKind {
    /// Default fallback order.
    pub const ALL: [StrategyKind; 3] = [Self::Equalities, Self::Supertypes, Self::Subtypes];
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// One `Target = type` line per target.
    Text,
    /// A single JSON object.
    Json,
}

use anyhow::Result;
use clap::Parser;
use std::io::Write;

use tyarg_cli::args::CliArgs;
use tyarg_cli::{driver, reporter, scenario, tracing_config};

/// Exit status when some target is left without a concrete type.
const EXIT_INCOMPLETE: i32 = 1;

fn main() -> Result<()> {
    // Initialize tracing if TYARG_LOG or RUST_LOG is set.
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    let scenario = scenario::load_scenario(&args.scenario)?;
    let report = driver::run(&scenario, &args.strategies)?;

    let mut stdout = std::io::stdout().lock();
    reporter::write_report(&mut stdout, &report, args.format)?;
    stdout.flush()?;

    if !report.complete {
        std::process::exit(EXIT_INCOMPLETE);
    }
    Ok(())
}

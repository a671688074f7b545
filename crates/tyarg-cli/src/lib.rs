//! Command-line support for the `tyarg` binary.
//!
//! A run loads a JSON scenario (qualifier hierarchies, nominal types, targets
//! and constraints), feeds it through the inference core and reports the
//! inferred type arguments.

pub mod args;
pub mod driver;
pub mod reporter;
pub mod scenario;
pub mod tracing_config;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod driver_tests;
#[cfg(test)]
#[path = "tests/reporter_tests.rs"]
mod reporter_tests;
#[cfg(test)]
#[path = "tests/scenario_tests.rs"]
mod scenario_tests;

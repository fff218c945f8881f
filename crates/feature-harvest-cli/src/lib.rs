//! Feature Harvest command line: argument parsing, run wiring and progress output.

pub mod args;
pub mod render;
pub mod run;

pub use args::{Cli, Commands, HarvestArgs};
pub use run::{run_harvest, RunPlan};

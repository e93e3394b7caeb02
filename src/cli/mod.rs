//! Command Line Interface (CLI) layer for CANOPYDIFF.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`): load the configuration, apply
//! flag overrides, run the change workflow and either print the export
//! request (`--dry-run`) or write it locally.
//!
//! If you are embedding CANOPYDIFF into another application, prefer using
//! the high-level `canopydiff::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;

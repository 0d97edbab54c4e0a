//! CLI command groups. Each exposes a clap `*Cli`, a `run_*_cli` entry point
//! and a `schema()` descriptor.

pub mod cache;
pub mod comment;
pub mod package;

//! Feedpack: local-first feedback packages resolved by page URL.
//!
//! A *feedback package* is a named collection of page annotations. Each
//! package lives in its own isolated SQLite store holding exactly one
//! package record and a timestamp-keyed comment collection. A package is
//! active for every URL that starts with its root URL.
//!
//! # Architecture
//!
//! - [`crate::core::store`]: one store, its package and its comments
//! - [`crate::core::catalog`]: discovery of stores by the `<namespace>-<id>` naming convention
//! - [`crate::core::resolver`]: which store's package is active for a URL
//! - [`crate::core::cache`]: single-slot memo of the last resolution
//! - [`crate::core::workspace`]: the consumer surface tying them together
//!
//! # Examples
//!
//! ```bash
//! # Create a package active under https://example.com/app1
//! feedpack package create --title site1 --name "App one" --root-url https://example.com/app1
//!
//! # Which package is active for this page?
//! feedpack resolve https://example.com/app1/page
//!
//! # Record a comment against it
//! feedpack comment add --store site1 --page-url https://example.com/app1/page --feedback "Typo"
//! ```

pub mod commands;
pub mod core;

use crate::commands::{cache, comment, package};
use crate::core::{config, error, logging, time::command_envelope, workspace::Workspace};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "feedpack",
    version = env!("CARGO_PKG_VERSION"),
    about = "Local-first feedback packages resolved by page URL"
)]
struct Cli {
    /// Home directory holding config.toml and the data directory.
    #[clap(long, global = true)]
    home: Option<PathBuf>,
    /// Log level or filter directive (overridden by FEEDPACK_LOG).
    #[clap(long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether a persistence engine is available.
    Supported,
    /// Resolve the feedback package active for a URL.
    Resolve {
        url: String,
        /// List every matching store instead of the active one.
        #[clap(long)]
        all: bool,
    },
    /// Manage feedback packages.
    Package(package::PackageCli),
    /// Manage comments of a package.
    Comment(comment::CommentCli),
    /// Inspect or clear the resolution cache.
    Cache(cache::CacheCli),
    /// Print the command schema of every command group.
    Schema,
    /// Print the binary version.
    Version,
}

fn resolve(ws: &Workspace, url: &str, all: bool) -> Result<(), error::FeedpackError> {
    if all {
        let matches = ws.search_by_url(url)?;
        println!(
            "{}",
            command_envelope(
                "resolve",
                "ok",
                serde_json::json!({ "url": url, "count": matches.len(), "matches": matches }),
            )
        );
        return Ok(());
    }

    let active = ws.active_package_for_url(url)?;
    let status = if active.is_some() { "ok" } else { "none" };
    let cached = active.as_ref().map(|a| a.cached).unwrap_or(false);
    println!(
        "{}",
        command_envelope(
            "resolve",
            status,
            serde_json::json!({ "url": url, "active": active, "cached": cached }),
        )
    );
    Ok(())
}

pub fn run() -> Result<(), error::FeedpackError> {
    let cli = Cli::parse();

    if let Command::Version = cli.command {
        println!("v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if let Command::Schema = cli.command {
        println!(
            "{}",
            serde_json::json!({
                "name": "feedpack",
                "version": env!("CARGO_PKG_VERSION"),
                "subsystems": [package::schema(), comment::schema(), cache::schema()]
            })
        );
        return Ok(());
    }

    let home = config::resolve_home(cli.home.as_deref())?;
    let config = config::load_config(&home)?;
    logging::init_tracing(cli.log_level.as_deref().unwrap_or(&config.log.level));
    tracing::debug!(home = %home.display(), data_dir = %config.data_dir().display(), "configuration loaded");

    let ws = Workspace::from_config(&config);

    match cli.command {
        Command::Supported => {
            println!(
                "{}",
                command_envelope(
                    "supported",
                    "ok",
                    serde_json::json!({
                        "supported": ws.is_supported(),
                        "data_dir": config.data_dir(),
                    }),
                )
            );
            Ok(())
        }
        Command::Resolve { url, all } => resolve(&ws, &url, all),
        Command::Package(cli) => package::run_package_cli(&ws, cli),
        Command::Comment(cli) => comment::run_comment_cli(&ws, cli),
        Command::Cache(cli) => cache::run_cache_cli(&ws, cli),
        Command::Schema | Command::Version => Ok(()),
    }
}

use crate::core::error;
use crate::core::time::command_envelope;
use crate::core::workspace::Workspace;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "cache", about = "Inspect or reset the resolution cache.")]
pub struct CacheCli {
    #[clap(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show the cached resolution if it covers the given URL.
    Show {
        #[clap(long)]
        url: String,
    },
    /// Drop the cached resolution.
    Clear,
}

pub fn run_cache_cli(ws: &Workspace, cli: CacheCli) -> Result<(), error::FeedpackError> {
    match cli.command {
        CacheCommand::Show { url } => {
            let entry = ws.cache().get(&url);
            let status = if entry.is_some() { "hit" } else { "miss" };
            println!(
                "{}",
                command_envelope("cache.show", status, serde_json::json!({ "url": url, "entry": entry }))
            );
        }
        CacheCommand::Clear => {
            ws.cache().clear()?;
            println!("{}", command_envelope("cache.clear", "ok", serde_json::json!({})));
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "cache",
        "version": "0.1.0",
        "description": "Single-slot memo of the last URL resolution",
        "commands": [
            { "name": "show", "parameters": ["url"] },
            { "name": "clear" }
        ],
        "storage": ["_<namespace>_resolution_cache.db"]
    })
}

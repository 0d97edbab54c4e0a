use crate::core::error;
use crate::core::store::{Package, PackageWrite};
use crate::core::time::command_envelope;
use crate::core::workspace::Workspace;
use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Parser, Debug)]
#[clap(name = "package", about = "Create, inspect and update feedback packages.")]
pub struct PackageCli {
    #[clap(subcommand)]
    pub command: PackageCommand,
}

#[derive(Subcommand, Debug)]
pub enum PackageCommand {
    /// Create a store and seed its package.
    Create {
        /// Store title; sanitized into the store id. Generated when omitted.
        #[clap(long)]
        title: Option<String>,
        /// Package id. Generated when omitted.
        #[clap(long)]
        id: Option<String>,
        #[clap(long, default_value = "")]
        name: String,
        #[clap(long, default_value = "")]
        version: String,
        #[clap(long, default_value = "")]
        author: String,
        /// URL prefix under which the package is active.
        #[clap(long)]
        root_url: Option<String>,
    },
    /// Show the package of a store.
    Show {
        #[clap(long)]
        store: String,
    },
    /// Update fields of a store's package.
    Update {
        #[clap(long)]
        store: String,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        version: Option<String>,
        #[clap(long)]
        author: Option<String>,
        #[clap(long)]
        root_url: Option<String>,
    },
    /// List all packages.
    List {
        /// Output format: 'json' or 'text'.
        #[clap(long, default_value = "json")]
        format: String,
    },
    /// Delete a store and everything in it.
    Delete {
        #[clap(long)]
        store: String,
    },
}

fn create_package(
    ws: &Workspace,
    title: Option<String>,
    package: Package,
) -> Result<(), error::FeedpackError> {
    let mut store = ws.store(title.as_deref(), None);
    store.open()?;
    let outcome = store.add_package(package);
    store.close();

    let (status, package) = match outcome? {
        PackageWrite::Added(package) => ("ok", Some(package)),
        PackageWrite::AlreadyPresent => ("already_present", None),
    };
    println!(
        "{}",
        command_envelope(
            "package.create",
            status,
            serde_json::json!({ "store_id": store.id(), "package": package }),
        )
    );
    Ok(())
}

fn show_package(ws: &Workspace, store_id: &str) -> Result<(), error::FeedpackError> {
    let mut store = ws.open_store(store_id)?;
    let package = store.get_package();
    store.close();
    let package = package?;
    let status = if package.is_some() { "ok" } else { "not_found" };
    println!(
        "{}",
        command_envelope(
            "package.show",
            status,
            serde_json::json!({ "store_id": store_id, "package": package }),
        )
    );
    Ok(())
}

fn update_package(
    ws: &Workspace,
    store_id: &str,
    name: Option<String>,
    version: Option<String>,
    author: Option<String>,
    root_url: Option<String>,
) -> Result<(), error::FeedpackError> {
    let mut store = ws.open_store(store_id)?;
    let current = store.get_package();
    let result = match current {
        Ok(Some(mut package)) => {
            if let Some(n) = name {
                package.name = n;
            }
            if let Some(v) = version {
                package.version = v;
            }
            if let Some(a) = author {
                package.author = a;
            }
            if let Some(r) = root_url {
                package.root_url = Some(r);
            }
            store.update_package(&package)
        }
        Ok(None) => Err(error::FeedpackError::NotFound(format!(
            "package in store '{}'",
            store_id
        ))),
        Err(e) => Err(e),
    };
    store.close();

    let package = result?;
    println!(
        "{}",
        command_envelope(
            "package.update",
            "ok",
            serde_json::json!({ "store_id": store_id, "package": package }),
        )
    );
    Ok(())
}

fn list_packages(ws: &Workspace, format: &str) -> Result<(), error::FeedpackError> {
    let packages = ws.list_packages()?;
    if format == "text" {
        if packages.is_empty() {
            println!("No feedback packages found.");
            return Ok(());
        }
        for entry in &packages {
            println!(
                "{} {} {} {}",
                entry.store_id.as_str().bright_cyan().bold(),
                entry.package.name.as_str().bright_white(),
                entry.package.version.as_str().dimmed(),
                entry.package.root().unwrap_or("(no root URL)").bright_yellow()
            );
        }
        return Ok(());
    }
    println!(
        "{}",
        command_envelope(
            "package.list",
            "ok",
            serde_json::json!({ "count": packages.len(), "packages": packages }),
        )
    );
    Ok(())
}

fn delete_package(ws: &Workspace, store_id: &str) -> Result<(), error::FeedpackError> {
    let deleted = ws.delete_store(store_id)?;
    let status = if deleted { "ok" } else { "not_found" };
    println!(
        "{}",
        command_envelope("package.delete", status, serde_json::json!({ "store_id": store_id }))
    );
    Ok(())
}

pub fn run_package_cli(ws: &Workspace, cli: PackageCli) -> Result<(), error::FeedpackError> {
    match cli.command {
        PackageCommand::Create {
            title,
            id,
            name,
            version,
            author,
            root_url,
        } => create_package(
            ws,
            title,
            Package {
                id: id.unwrap_or_default(),
                name,
                version,
                author,
                root_url,
            },
        ),
        PackageCommand::Show { store } => show_package(ws, &store),
        PackageCommand::Update {
            store,
            name,
            version,
            author,
            root_url,
        } => update_package(ws, &store, name, version, author, root_url),
        PackageCommand::List { format } => list_packages(ws, &format),
        PackageCommand::Delete { store } => delete_package(ws, &store),
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "package",
        "version": "0.1.0",
        "description": "One feedback package per store, active under its root URL",
        "commands": [
            { "name": "create", "parameters": ["title", "id", "name", "version", "author", "root_url"] },
            { "name": "show", "parameters": ["store"] },
            { "name": "update", "parameters": ["store", "name", "version", "author", "root_url"] },
            { "name": "list", "parameters": ["format"] },
            { "name": "delete", "parameters": ["store"] }
        ],
        "storage": ["<namespace>-<store_id>.db"]
    })
}

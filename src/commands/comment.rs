use crate::core::error;
use crate::core::store::{Comment, Store};
use crate::core::time::{self, command_envelope};
use crate::core::workspace::Workspace;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "comment", about = "Read and write the comments of a feedback package.")]
pub struct CommentCli {
    #[clap(subcommand)]
    pub command: CommentCommand,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    /// Add a comment. The timestamp defaults to now (epoch milliseconds).
    Add {
        #[clap(long)]
        store: String,
        #[clap(long)]
        timestamp: Option<i64>,
        #[clap(long, default_value = "")]
        xpath: String,
        #[clap(long, default_value = "")]
        element_text: String,
        #[clap(long, default_value = "")]
        page_url: String,
        #[clap(long, default_value = "")]
        document_title: String,
        #[clap(long)]
        feedback: String,
    },
    /// Retrieve a comment by timestamp.
    Get {
        #[clap(long)]
        store: String,
        #[clap(long)]
        timestamp: i64,
    },
    /// Update fields of an existing comment.
    Update {
        #[clap(long)]
        store: String,
        #[clap(long)]
        timestamp: i64,
        #[clap(long)]
        xpath: Option<String>,
        #[clap(long)]
        element_text: Option<String>,
        #[clap(long)]
        page_url: Option<String>,
        #[clap(long)]
        document_title: Option<String>,
        #[clap(long)]
        feedback: Option<String>,
    },
    /// Delete a comment by timestamp.
    Delete {
        #[clap(long)]
        store: String,
        #[clap(long)]
        timestamp: i64,
    },
    /// List comments in creation order.
    List {
        #[clap(long)]
        store: String,
        /// Only comments captured on this page.
        #[clap(long)]
        page_url: Option<String>,
    },
}

/// Run `f` against an opened store and close it afterwards.
fn with_store<F, R>(ws: &Workspace, store_id: &str, f: F) -> Result<R, error::FeedpackError>
where
    F: FnOnce(&Store) -> Result<R, error::FeedpackError>,
{
    let mut store = ws.open_store(store_id)?;
    let result = f(&store);
    store.close();
    result
}

fn print_status(cmd: &str, status: &str, store_id: &str, extra: serde_json::Value) {
    let mut payload = serde_json::json!({ "store_id": store_id });
    if let (Some(obj), Some(extra_obj)) = (payload.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            obj.insert(k.clone(), v.clone());
        }
    }
    println!("{}", command_envelope(cmd, status, payload));
}

fn update_comment(
    ws: &Workspace,
    store_id: &str,
    timestamp: i64,
    patch: CommentPatch,
) -> Result<(), error::FeedpackError> {
    let updated = with_store(ws, store_id, |store| {
        let Some(mut comment) = store.get_comment(timestamp)? else {
            return Ok(None);
        };
        patch.apply(&mut comment);
        if store.update_comment(&comment)? {
            Ok(Some(comment))
        } else {
            Ok(None)
        }
    })?;
    let status = if updated.is_some() { "ok" } else { "not_found" };
    print_status(
        "comment.update",
        status,
        store_id,
        serde_json::json!({ "timestamp": timestamp, "comment": updated }),
    );
    Ok(())
}

struct CommentPatch {
    xpath: Option<String>,
    element_text: Option<String>,
    page_url: Option<String>,
    document_title: Option<String>,
    feedback: Option<String>,
}

impl CommentPatch {
    fn apply(self, comment: &mut Comment) {
        if let Some(x) = self.xpath {
            comment.xpath = x;
        }
        if let Some(t) = self.element_text {
            comment.element_text = t;
        }
        if let Some(u) = self.page_url {
            comment.page_url = u;
        }
        if let Some(d) = self.document_title {
            comment.document_title = d;
        }
        if let Some(f) = self.feedback {
            comment.feedback = f;
        }
    }
}

pub fn run_comment_cli(ws: &Workspace, cli: CommentCli) -> Result<(), error::FeedpackError> {
    match cli.command {
        CommentCommand::Add {
            store,
            timestamp,
            xpath,
            element_text,
            page_url,
            document_title,
            feedback,
        } => {
            let comment = Comment {
                timestamp: timestamp.unwrap_or_else(time::now_millis),
                xpath,
                element_text,
                page_url,
                document_title,
                feedback,
            };
            with_store(ws, &store, |s| s.add_comment(&comment))?;
            print_status(
                "comment.add",
                "ok",
                &store,
                serde_json::json!({ "timestamp": comment.timestamp }),
            );
            Ok(())
        }
        CommentCommand::Get { store, timestamp } => {
            let comment = with_store(ws, &store, |s| s.get_comment(timestamp))?;
            let status = if comment.is_some() { "ok" } else { "not_found" };
            print_status(
                "comment.get",
                status,
                &store,
                serde_json::json!({ "timestamp": timestamp, "comment": comment }),
            );
            Ok(())
        }
        CommentCommand::Update {
            store,
            timestamp,
            xpath,
            element_text,
            page_url,
            document_title,
            feedback,
        } => update_comment(
            ws,
            &store,
            timestamp,
            CommentPatch {
                xpath,
                element_text,
                page_url,
                document_title,
                feedback,
            },
        ),
        CommentCommand::Delete { store, timestamp } => {
            let deleted = with_store(ws, &store, |s| s.delete_comment(timestamp))?;
            let status = if deleted { "ok" } else { "not_found" };
            print_status(
                "comment.delete",
                status,
                &store,
                serde_json::json!({ "timestamp": timestamp }),
            );
            Ok(())
        }
        CommentCommand::List { store, page_url } => {
            let comments = with_store(ws, &store, |s| match &page_url {
                Some(url) => s.comments_for_page(url),
                None => s.get_all_comments(),
            })?;
            print_status(
                "comment.list",
                "ok",
                &store,
                serde_json::json!({ "count": comments.len(), "comments": comments }),
            );
            Ok(())
        }
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "comment",
        "version": "0.1.0",
        "description": "Timestamp-keyed feedback comments inside a package store",
        "commands": [
            { "name": "add", "parameters": ["store", "timestamp", "xpath", "element_text", "page_url", "document_title", "feedback"] },
            { "name": "get", "parameters": ["store", "timestamp"] },
            { "name": "update", "parameters": ["store", "timestamp"] },
            { "name": "delete", "parameters": ["store", "timestamp"] },
            { "name": "list", "parameters": ["store", "page_url"] }
        ],
        "storage": ["<namespace>-<store_id>.db"]
    })
}

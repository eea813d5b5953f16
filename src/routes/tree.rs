//! Tree browsing endpoints.
//!
//! - GET /{repo}/tree                    Root of the default branch
//! - GET /{repo}/tree/{ref}              Root at a branch, tag or hash
//! - GET /{repo}/tree/{ref}/{*path}      Directory listing or file content
//!
//! File content is returned as text; binary blobs only carry metadata.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::git::refs::{resolve_default_branch, resolve_revision};
use crate::git::repository::find_commit;
use crate::git::tree;
use crate::models::{TreeNode, TreeResponse};
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/{repo}/tree", get(get_default_tree))
        .route("/{repo}/tree/{ref}", get(get_tree_root))
        .route("/{repo}/tree/{ref}/{*path}", get(get_tree_path))
        .with_state(state)
}

async fn get_default_tree(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TreeResponse>> {
    Ok(Json(resolve_tree(&state, &slug, None, "")?))
}

async fn get_tree_root(
    State(state): State<AppState>,
    Path((slug, reference)): Path<(String, String)>,
) -> Result<Json<TreeResponse>> {
    Ok(Json(resolve_tree(&state, &slug, Some(reference), "")?))
}

async fn get_tree_path(
    State(state): State<AppState>,
    Path((slug, reference, path)): Path<(String, String, String)>,
) -> Result<Json<TreeResponse>> {
    Ok(Json(resolve_tree(&state, &slug, Some(reference), &path)?))
}

fn resolve_tree(state: &AppState, slug: &str, reference: Option<String>, path: &str) -> Result<TreeResponse> {
    let handle = state.registry.find(slug)?;
    let (revision, default_head) = match reference {
        Some(reference) => (reference, None),
        None => {
            let (branch, head) = resolve_default_branch(&handle)?;
            (branch, Some(head))
        }
    };

    handle.with_repo(|repo| {
        let id = match default_head {
            Some(id) => id,
            None => resolve_revision(repo, &revision)?,
        };
        let commit = find_commit(repo, id)?;
        let repository = handle.slug().to_string();

        let response = match tree::resolve(repo, &commit, path)? {
            TreeNode::Directory { path, parent, entries } => TreeResponse::Directory {
                repository,
                revision,
                path,
                parent,
                entries,
            },
            TreeNode::File { metadata, parent, content } => {
                let content = if metadata.is_binary {
                    None
                } else {
                    Some(String::from_utf8_lossy(&content).to_string())
                };
                TreeResponse::File {
                    repository,
                    revision,
                    parent,
                    metadata,
                    content,
                }
            }
        };

        Ok(response)
    })
}

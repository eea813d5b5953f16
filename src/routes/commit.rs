//! Commit endpoints.
//!
//! - GET /{repo}/commit/{hash}
//!   Summary, file changes, diffstat and unified diff. A root commit is
//!   reported with `initial: true` and no diff.
//!
//! - GET /{repo}/patch/{hash}
//!   The commit as a `git format-patch` style email, as plain text. A root
//!   commit has no patch and answers 404.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::git::diff::{diff_commit, render_patch_email};
use crate::git::refs::resolve_revision;
use crate::git::repository::{commit_summary, find_commit};
use crate::models::CommitResponse;
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/{repo}/commit/{hash}", get(get_commit))
        .route("/{repo}/patch/{hash}", get(get_patch))
        .with_state(state)
}

async fn get_commit(
    State(state): State<AppState>,
    Path((slug, hash)): Path<(String, String)>,
) -> Result<Json<CommitResponse>> {
    let handle = state.registry.find(&slug)?;

    let response = handle.with_repo(|repo| {
        let commit = find_commit(repo, resolve_revision(repo, &hash)?)?;
        let summary = commit_summary(&commit);

        let (initial, changes, stats, diff) = match diff_commit(repo, &commit) {
            Ok(diff) => (false, diff.changes(), Some(diff.stats()?), Some(diff.render_unified()?)),
            Err(AppError::NoParent(_)) => (true, Vec::new(), None, None),
            Err(e) => return Err(e),
        };

        Ok(CommitResponse {
            repository: handle.slug().to_string(),
            commit: summary,
            initial,
            changes,
            stats,
            diff,
        })
    })?;

    Ok(Json(response))
}

async fn get_patch(State(state): State<AppState>, Path((slug, hash)): Path<(String, String)>) -> Result<Response> {
    let handle = state.registry.find(&slug)?;

    let email = handle.with_repo(|repo| {
        let commit = find_commit(repo, resolve_revision(repo, &hash)?)?;
        render_patch_email(repo, &commit)
    })?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], email).into_response())
}

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::Result;
use crate::git::refs::{list_branches, list_tags, resolve_default_branch};
use crate::git::repository::{commit_summary, find_commit};
use crate::git::tree::find_readme;
use crate::models::{RefsResponse, RepositoryOverview};
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/{repo}", get(get_overview))
        .route("/{repo}/refs", get(get_refs))
        .with_state(state)
}

async fn get_overview(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RepositoryOverview>> {
    let handle = state.registry.find(&slug)?;
    let (default_branch, head) = resolve_default_branch(&handle)?;

    let overview = handle.with_repo(|repo| {
        let commit = find_commit(repo, head)?;
        Ok(RepositoryOverview {
            slug: handle.slug().to_string(),
            default_branch,
            head: commit_summary(&commit),
            readme: find_readme(repo, &commit)?,
            branches: list_branches(repo)?,
            tags: list_tags(repo)?,
        })
    })?;

    Ok(Json(overview))
}

async fn get_refs(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<RefsResponse>> {
    let handle = state.registry.find(&slug)?;

    let refs = handle.with_repo(|repo| {
        Ok(RefsResponse {
            repository: handle.slug().to_string(),
            branches: list_branches(repo)?,
            tags: list_tags(repo)?,
        })
    })?;

    Ok(Json(refs))
}

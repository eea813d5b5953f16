use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::encode_segment;
use crate::error::Result;
use crate::git::history::{self, PAGE_SIZE};
use crate::git::refs::{resolve_default_branch, resolve_revision};
use crate::models::LogResponse;
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/{repo}/log", get(redirect_to_default_branch))
        .route("/{repo}/log/{ref}", get(get_log))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct LogQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    PAGE_SIZE
}

async fn redirect_to_default_branch(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Redirect> {
    let handle = state.registry.find(&slug)?;
    let (branch, _) = resolve_default_branch(&handle)?;

    Ok(Redirect::temporary(&format!(
        "/{}/log/{}",
        encode_segment(handle.slug()),
        encode_segment(&branch)
    )))
}

async fn get_log(
    State(state): State<AppState>,
    Path((slug, reference)): Path<(String, String)>,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogResponse>> {
    let handle = state.registry.find(&slug)?;

    let response = handle.with_repo(|repo| {
        let start = resolve_revision(repo, &reference)?;
        let mut commits = history::log(repo, start, query.limit)?;
        let page = commits.by_ref().collect::<Result<Vec<_>>>()?;

        Ok(LogResponse {
            repository: handle.slug().to_string(),
            revision: reference.clone(),
            commits: page,
            truncated: commits.truncated(),
        })
    })?;

    Ok(Json(response))
}

//! Repository index and administration endpoints.
//!
//! - GET /
//!   Site title, description and every repository under the root, by slug.
//!
//! - POST /api/v1/repositories { name: string }
//!   Initialises a bare repository under the root and registers it.
//!
//! - POST /api/v1/repositories/reload
//!   Rescans the root and swaps the index in one step.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::git::refs::{default_branch_name, list_branches};
use crate::git::RepositoryHandle;
use crate::models::{CreateRepositoryRequest, IndexResponse, ReloadResponse, RepositorySummary};
use crate::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_index))
        .route("/api/v1/repositories", post(create_repository))
        .route("/api/v1/repositories/reload", post(reload_repositories))
        .with_state(state)
}

async fn get_index(State(state): State<AppState>) -> Json<IndexResponse> {
    let repositories = state.registry.list().iter().map(|h| summarize(h)).collect();

    Json(IndexResponse {
        title: state.config.title.clone(),
        description: state.config.description.clone(),
        repositories,
    })
}

fn summarize(handle: &RepositoryHandle) -> RepositorySummary {
    // An empty or damaged repository is still listed, just without a branch.
    let default_branch = handle
        .with_repo(|repo| {
            let branches = list_branches(repo)?;
            Ok(default_branch_name(&branches).map(str::to_string))
        })
        .unwrap_or(None);

    RepositorySummary {
        slug: handle.slug().to_string(),
        path: handle.path().to_string_lossy().to_string(),
        is_bare: handle.is_bare(),
        default_branch,
    }
}

async fn create_repository(
    State(state): State<AppState>,
    Json(request): Json<CreateRepositoryRequest>,
) -> Result<(StatusCode, Json<RepositorySummary>)> {
    let handle = state.registry.create(&request.name)?;
    Ok((StatusCode::CREATED, Json(summarize(&handle))))
}

async fn reload_repositories(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    let repositories = state.registry.reload()?;
    Ok(Json(ReloadResponse { repositories }))
}

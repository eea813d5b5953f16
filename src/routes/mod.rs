//! HTTP route handlers - maps URLs to repository queries and git services.
//!
//! Each submodule defines routes for a feature area:
//! - `repositories`: Index, creation and reload (GET /, /api/v1/repositories)
//! - `repository`: Overview and refs of one repository
//! - `log`: Commit history from a reference
//! - `tree`: Directory listing and file content
//! - `commit`: Commit view and raw patch
//! - `git`: Smart HTTP endpoints used by `git clone`, `fetch` and `push`

pub mod commit;
pub mod git;
pub mod log;
pub mod repositories;
pub mod repository;
pub mod tree;

use axum::Router;

use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(repositories::routes(state.clone()))
        .merge(repository::routes(state.clone()))
        .merge(log::routes(state.clone()))
        .merge(tree::routes(state.clone()))
        .merge(commit::routes(state.clone()))
        .merge(git::routes(state))
}

/// Escape a value for use as one URL path segment. Branch names may
/// contain `/`, which would otherwise split the segment.
pub(crate) fn encode_segment(value: &str) -> String {
    value.replace('%', "%25").replace('/', "%2F")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("main"), "main");
        assert_eq!(encode_segment("feature/login"), "feature%2Flogin");
        assert_eq!(encode_segment("100%"), "100%25");
    }
}

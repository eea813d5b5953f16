//! Repository and reference DTOs.
//!
//! - `Reference`: Branch or tag with its target commit
//! - `RepositorySummary`: One row of the index page
//! - `IndexResponse`: Site metadata plus every repository
//! - `RepositoryOverview`: Default branch, head commit, README and refs
//! - `RefsResponse`: Branch and tag listing

use serde::{Deserialize, Serialize};

use super::{CommitSummary, Readme};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reference {
    /// Fully-qualified name, e.g. `refs/heads/main`
    pub name: String,
    pub short_name: String,
    /// Commit id the reference peels to
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub slug: String,
    pub path: String,
    pub is_bare: bool,
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub title: String,
    pub description: String,
    pub repositories: Vec<RepositorySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryOverview {
    pub slug: String,
    pub default_branch: String,
    pub head: CommitSummary,
    pub readme: Option<Readme>,
    pub branches: Vec<Reference>,
    pub tags: Vec<Reference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefsResponse {
    pub repository: String,
    pub branches: Vec<Reference>,
    pub tags: Vec<Reference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRepositoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub repositories: usize,
}

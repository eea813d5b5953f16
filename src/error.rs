//! Application error types and HTTP response mapping.
//!
//! Every core operation returns `AppError`. The axum `IntoResponse` impl
//! turns it into a status code plus a JSON `{"error": ...}` body; server
//! errors are logged on the way out.
//!
//! Error mappings:
//! - `RepoNotFound`, `RevisionNotFound`, `PathNotFound`, `CommitNotFound`,
//!   `NoBranches` → 404
//! - `NoParent` → 404 (kept apart from lookup misses so callers can render
//!   an "initial commit" instead)
//! - `InvalidPath`, `InvalidName`, `UnknownService` → 400
//! - `AlreadyExists` → 409
//! - `Git`, `Io`, `RootUnreadable`, `Spawn`, `ProcessExit`, `Cancelled`,
//!   `Config`, `Internal` → 500

use std::path::PathBuf;
use std::process::ExitStatus;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read repository root {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    #[error("No branches found in {0}")]
    NoBranches(String),

    #[error("Commit {0} has no parent")]
    NoParent(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid repository name: {0}")]
    InvalidName(String),

    #[error("Repository already exists: {0}")]
    AlreadyExists(String),

    #[error("Unknown git service: {0}")]
    UnknownService(String),

    #[error("Failed to spawn `{program} {service}`: {source}")]
    Spawn {
        program: String,
        service: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {service} exited with {status}: {stderr}")]
    ProcessExit {
        service: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("git {0} was cancelled")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RepoNotFound(_)
            | AppError::RevisionNotFound(_)
            | AppError::PathNotFound(_)
            | AppError::CommitNotFound(_)
            | AppError::NoBranches(_)
            | AppError::NoParent(_) => StatusCode::NOT_FOUND,
            AppError::InvalidPath(_) | AppError::InvalidName(_) | AppError::UnknownService(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::Git(_)
            | AppError::Io(_)
            | AppError::RootUnreadable { .. }
            | AppError::Spawn { .. }
            | AppError::ProcessExit { .. }
            | AppError::Cancelled(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

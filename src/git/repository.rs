use git2::Repository;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{CommitSummary, Signature};

/// A repository found under the registry root.
///
/// The slug is the directory name. Handles are immutable once built; a
/// reload replaces them wholesale instead of mutating them.
pub struct RepositoryHandle {
    slug: String,
    path: PathBuf,
    repo: Mutex<Repository>,
}

impl RepositoryHandle {
    /// Open `path` as a repository without searching parent directories.
    pub fn open<P: AsRef<Path>>(slug: impl Into<String>, path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let repo = Repository::open(&path)?;

        Ok(Self {
            slug: slug.into(),
            path,
            repo: Mutex::new(repo),
        })
    }

    pub fn from_repository(slug: impl Into<String>, path: PathBuf, repo: Repository) -> Self {
        Self {
            slug: slug.into(),
            path,
            repo: Mutex::new(repo),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_repo<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T>,
    {
        // A closure that panicked earlier leaves the repository usable.
        let repo = match self.repo.lock() {
            Ok(repo) => repo,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&repo)
    }

    pub fn is_bare(&self) -> bool {
        self.with_repo(|repo| Ok(repo.is_bare())).unwrap_or(false)
    }
}

impl std::fmt::Debug for RepositoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryHandle")
            .field("slug", &self.slug)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

pub fn find_commit<'r>(repo: &'r Repository, id: git2::Oid) -> Result<git2::Commit<'r>> {
    repo.find_commit(id).map_err(|_| AppError::CommitNotFound(id.to_string()))
}

pub fn commit_summary(commit: &git2::Commit) -> CommitSummary {
    let id = commit.id().to_string();
    let message = String::from_utf8_lossy(commit.message_bytes()).to_string();
    let subject = message.split('\n').next().unwrap_or("").trim_end_matches('\r').to_string();
    let timestamp = commit.committer().when().seconds();

    CommitSummary {
        short_id: id.chars().take(8).collect(),
        id,
        author: signature(&commit.author()),
        committer: signature(&commit.committer()),
        timestamp,
        relative_time: format_relative_time(timestamp),
        subject,
        message,
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
    }
}

fn signature(sig: &git2::Signature) -> Signature {
    Signature {
        name: String::from_utf8_lossy(sig.name_bytes()).to_string(),
        email: String::from_utf8_lossy(sig.email_bytes()).to_string(),
        timestamp: sig.when().seconds(),
        offset_minutes: sig.when().offset_minutes(),
    }
}

/// Coarse age buckets, largest first. Months are 30 days and years 365.
const AGE_UNITS: [(i64, &str); 5] = [
    (365 * 86_400, "year"),
    (30 * 86_400, "month"),
    (86_400, "day"),
    (3_600, "hour"),
    (60, "minute"),
];

/// "3 days ago" style age of `timestamp` relative to now.
pub fn format_relative_time(timestamp: i64) -> String {
    let age = chrono::Utc::now().timestamp() - timestamp;

    AGE_UNITS
        .iter()
        .find(|(seconds, _)| age >= *seconds)
        .map(|&(seconds, unit)| {
            let count = age / seconds;
            let plural = if count == 1 { "" } else { "s" };
            format!("{} {}{} ago", count, unit, plural)
        })
        .unwrap_or_else(|| "just now".to_string())
}

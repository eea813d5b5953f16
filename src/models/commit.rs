use serde::{Deserialize, Serialize};

use super::{Change, DiffStats};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Offset from UTC in minutes
    pub offset_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    pub id: String,
    /// First 8 hex characters of `id`
    pub short_id: String,
    pub author: Signature,
    pub committer: Signature,
    /// Committer time, the key history is ordered by
    pub timestamp: i64,
    pub relative_time: String,
    /// Message text up to the first line break
    pub subject: String,
    pub message: String,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogResponse {
    pub repository: String,
    pub revision: String,
    pub commits: Vec<CommitSummary>,
    /// True when the page size cut the walk short
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResponse {
    pub repository: String,
    pub commit: CommitSummary,
    /// Root commit: no parent, so no changes or diff
    pub initial: bool,
    pub changes: Vec<Change>,
    pub stats: Option<DiffStats>,
    pub diff: Option<String>,
}

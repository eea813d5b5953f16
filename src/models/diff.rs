//! Diff-related DTOs.
//!
//! - `Change`: One file-level delta between a commit and its first parent
//! - `ChangeKind`: Added, deleted, modified or renamed
//! - `DiffStats`: Totals plus per-file insertion/deletion counts
//!
//! Used by: the commit view and the patch-email renderer

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Change {
    pub path: String,
    /// Source path of a rename
    pub old_path: Option<String>,
    pub kind: ChangeKind,
    pub old_id: String,
    pub new_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    Renamed,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub files: Vec<FileStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileStat {
    pub path: String,
    pub insertions: usize,
    pub deletions: usize,
}

//! Data transfer objects (DTOs) for API responses.
//!
//! These structs are serialized to JSON for whatever renders the views.
//! - `repository`: Reference, RepositorySummary, RepositoryOverview, RefsResponse
//! - `commit`: CommitSummary, Signature, LogResponse, CommitResponse
//! - `tree`: TreeEntry, EntryMode, TreeNode, FileMetadata, TreeResponse, Readme
//! - `diff`: Change, ChangeKind, DiffStats, FileStat

pub mod commit;
pub mod diff;
pub mod repository;
pub mod tree;

pub use commit::*;
pub use diff::*;
pub use repository::*;
pub use tree::*;

//! Tree-related DTOs.
//!
//! - `TreeEntry`: Single entry of a tree object, in stored order
//! - `EntryMode`: File/executable/directory/symlink/submodule
//! - `TreeNode`: What a path inside a commit resolves to
//! - `FileMetadata`: Blob facts shown next to file content
//! - `TreeResponse`: Serialized shape of the tree view
//! - `Readme`: README located at the root of a commit

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    /// Full path from the repository root
    pub path: String,
    pub mode: EntryMode,
    /// Blob, subtree or submodule commit id
    pub id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryMode {
    File,
    Executable,
    Directory,
    Symlink,
    Submodule,
}

impl EntryMode {
    pub fn from_filemode(mode: i32) -> Option<Self> {
        match mode {
            0o100644 | 0o100664 => Some(EntryMode::File),
            0o100755 => Some(EntryMode::Executable),
            0o040000 => Some(EntryMode::Directory),
            0o120000 => Some(EntryMode::Symlink),
            0o160000 => Some(EntryMode::Submodule),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub path: String,
    pub mode: EntryMode,
    pub id: String,
    pub size: u64,
    pub is_binary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Directory {
        path: String,
        /// `path` minus its last segment; the root is its own parent
        parent: String,
        entries: Vec<TreeEntry>,
    },
    File {
        metadata: FileMetadata,
        parent: String,
        content: Vec<u8>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeResponse {
    Directory {
        repository: String,
        revision: String,
        path: String,
        parent: String,
        entries: Vec<TreeEntry>,
    },
    File {
        repository: String,
        revision: String,
        parent: String,
        metadata: FileMetadata,
        /// Lossy UTF-8 text, absent for binary blobs
        content: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Readme {
    pub name: String,
    pub content: String,
}

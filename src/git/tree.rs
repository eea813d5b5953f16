use git2::{ObjectType, Repository};
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{EntryMode, FileMetadata, Readme, TreeEntry, TreeNode};

/// README candidates, most preferred first.
pub const README_CANDIDATES: [&str; 6] = [
    "README",
    "README.md",
    "README.markdown",
    "readme",
    "readme.md",
    "readme.markdown",
];

/// Entries of the commit's root tree, in the order the tree stores them.
pub fn list_root(commit: &git2::Commit) -> Result<Vec<TreeEntry>> {
    let tree = commit.tree()?;
    Ok(list_tree(&tree, ""))
}

fn list_tree(tree: &git2::Tree, base_path: &str) -> Vec<TreeEntry> {
    let mut entries = Vec::new();

    for entry in tree.iter() {
        let Some(mode) = EntryMode::from_filemode(entry.filemode()) else {
            continue;
        };
        let name = String::from_utf8_lossy(entry.name_bytes()).to_string();
        let path = if base_path.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", base_path, name)
        };

        entries.push(TreeEntry {
            name,
            path,
            mode,
            id: entry.id().to_string(),
        });
    }

    entries
}

/// `path` with its last segment removed. The root is its own parent.
pub fn parent_path(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((parent, _)) => parent.to_string(),
        None => String::new(),
    }
}

fn normalize(path: &str) -> Result<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(AppError::InvalidPath(path.to_string()));
    }
    Ok(segments.join("/"))
}

/// Resolve `path` inside the commit's tree to a directory listing or to
/// file content. Every call walks from the root tree; nothing is cached.
pub fn resolve(repo: &Repository, commit: &git2::Commit, path: &str) -> Result<TreeNode> {
    let path = normalize(path)?;
    let root = commit.tree()?;

    if path.is_empty() {
        return Ok(TreeNode::Directory {
            path: String::new(),
            parent: String::new(),
            entries: list_tree(&root, ""),
        });
    }

    let entry = root
        .get_path(Path::new(&path))
        .map_err(|_| AppError::PathNotFound(path.clone()))?;
    let parent = parent_path(&path);
    let mode = EntryMode::from_filemode(entry.filemode())
        .ok_or_else(|| AppError::PathNotFound(path.clone()))?;

    match entry.kind() {
        Some(ObjectType::Tree) => {
            let object = entry.to_object(repo)?;
            let subtree = object
                .as_tree()
                .ok_or_else(|| AppError::Internal(format!("{} is not a tree", path)))?;

            Ok(TreeNode::Directory {
                entries: list_tree(subtree, &path),
                path,
                parent,
            })
        }
        Some(ObjectType::Blob) => {
            let blob = repo.find_blob(entry.id())?;
            let name = String::from_utf8_lossy(entry.name_bytes()).to_string();

            Ok(TreeNode::File {
                metadata: FileMetadata {
                    name,
                    path,
                    mode,
                    id: entry.id().to_string(),
                    size: blob.size() as u64,
                    is_binary: blob.is_binary(),
                },
                parent,
                content: blob.content().to_vec(),
            })
        }
        _ => Err(AppError::InvalidPath(format!("{} is a submodule", path))),
    }
}

/// First README at the root of the commit, per `README_CANDIDATES`.
pub fn find_readme(repo: &Repository, commit: &git2::Commit) -> Result<Option<Readme>> {
    let tree = commit.tree()?;

    for candidate in README_CANDIDATES {
        let Some(entry) = tree.get_name(candidate) else {
            continue;
        };
        if entry.kind() != Some(ObjectType::Blob) {
            continue;
        }
        let blob = repo.find_blob(entry.id())?;
        return Ok(Some(Readme {
            name: candidate.to_string(),
            content: String::from_utf8_lossy(blob.content()).to_string(),
        }));
    }

    Ok(None)
}

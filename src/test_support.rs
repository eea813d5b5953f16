//! Fixtures for unit tests: throwaway bare repositories built with git2.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use git2::{Index, IndexEntry, IndexTime, Oid, Repository, Signature, Time};
use tempfile::TempDir;

use crate::error::Result;

pub struct TestRepo {
    _temp: Option<TempDir>,
    path: PathBuf,
    pub repo: Repository,
    clock: Cell<i64>,
}

impl TestRepo {
    /// Fresh bare repository in its own temporary directory.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fixture.git");
        let mut fixture = Self::init(&path);
        fixture._temp = Some(temp);
        fixture
    }

    /// Bare repository at `path`; the caller owns the directory.
    pub fn init(path: &Path) -> Self {
        let repo = Repository::init_bare(path).unwrap();
        Self {
            _temp: None,
            path: path.to_path_buf(),
            repo,
            clock: Cell::new(1_600_000_000),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_repo<T>(&self, f: impl FnOnce(&Repository) -> Result<T>) -> T {
        f(&self.repo).unwrap()
    }

    /// Commit `files` on top of `branch`, creating the branch if needed.
    pub fn commit(&self, branch: &str, files: &[(&str, &str)], message: &str) -> Oid {
        self.commit_changes(branch, files, &[], message)
    }

    pub fn commit_changes(
        &self,
        branch: &str,
        writes: &[(&str, &str)],
        removes: &[&str],
        message: &str,
    ) -> Oid {
        let refname = format!("refs/heads/{}", branch);
        let parent = self
            .repo
            .find_reference(&refname)
            .ok()
            .and_then(|r| r.peel_to_commit().ok());

        let mut index = Index::new().unwrap();
        if let Some(parent) = &parent {
            index.read_tree(&parent.tree().unwrap()).unwrap();
        }
        for (path, content) in writes {
            let id = self.repo.blob(content.as_bytes()).unwrap();
            index.add(&index_entry(path, id, content.len())).unwrap();
        }
        for path in removes {
            index.remove(Path::new(path), 0).unwrap();
        }
        let tree_id = index.write_tree_to(&self.repo).unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let sig = self.next_signature();
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some(&refname), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    /// `count` commits that only touch a counter file.
    pub fn commit_many(&self, branch: &str, count: usize) -> Oid {
        let mut last = Oid::zero();
        for i in 0..count {
            let content = format!("{}\n", i);
            last = self.commit(branch, &[("counter.txt", &content)], &format!("Commit {}", i));
        }
        last
    }

    pub fn tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(target, None).unwrap();
        self.repo.tag_lightweight(name, &object, false).unwrap();
    }

    pub fn annotated_tag(&self, name: &str, target: Oid, message: &str) {
        let object = self.repo.find_object(target, None).unwrap();
        let sig = self.next_signature();
        self.repo.tag(name, &object, &sig, message, false).unwrap();
    }

    fn next_signature(&self) -> Signature<'static> {
        let now = self.clock.get() + 60;
        self.clock.set(now);
        Signature::new("Test Author", "author@example.com", &Time::new(now, 60)).unwrap()
    }
}

fn index_entry(path: &str, id: Oid, size: usize) -> IndexEntry {
    IndexEntry {
        ctime: IndexTime::new(0, 0),
        mtime: IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode: 0o100644,
        uid: 0,
        gid: 0,
        file_size: size as u32,
        id,
        flags: (path.len() & 0xfff) as u16,
        flags_extended: 0,
        path: path.as_bytes().to_vec(),
    }
}

/// Whether a `git` executable is on PATH; subprocess tests bail out without one.
pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

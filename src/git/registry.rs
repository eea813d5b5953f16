//! Repository registry: slug → handle index over a root directory.
//!
//! The index is an immutable snapshot behind an `Arc`. Loads build a new
//! snapshot off to the side and install it with a single swap, so readers
//! see either the old index or the new one, never a half-built map.
//! Handles already handed out stay valid after a swap.
//!
//! Writers (`reload`, `add`, `create`) take a separate writer lock for the
//! whole read-modify-install cycle, so a rescan cannot drop a repository
//! that was added while it was scanning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use git2::Repository;

use crate::error::{AppError, Result};
use crate::git::repository::RepositoryHandle;

/// One immutable generation of the index.
#[derive(Debug, Default)]
pub struct RepoIndex {
    repos: HashMap<String, Arc<RepositoryHandle>>,
}

impl RepoIndex {
    /// Enumerate the immediate subdirectories of `root` and keep the ones
    /// that open as git repositories. Only an unreadable root is an error.
    pub fn scan(root: &Path) -> Result<Self> {
        let read_dir = std::fs::read_dir(root).map_err(|source| AppError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        })?;

        let mut repos = HashMap::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry in {}: {}", root.display(), e);
                    continue;
                }
            };

            let Some(slug) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            match RepositoryHandle::open(slug.clone(), entry.path()) {
                Ok(handle) => {
                    repos.insert(slug, Arc::new(handle));
                }
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", entry.path().display(), e);
                }
            }
        }

        Ok(Self { repos })
    }

    pub fn get(&self, slug: &str) -> Option<Arc<RepositoryHandle>> {
        self.repos.get(slug).cloned()
    }

    /// All handles, sorted by slug.
    pub fn list(&self) -> Vec<Arc<RepositoryHandle>> {
        let mut handles: Vec<_> = self.repos.values().cloned().collect();
        handles.sort_by(|a, b| a.slug().cmp(b.slug()));
        handles
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    fn with(&self, handle: Arc<RepositoryHandle>) -> Self {
        let mut repos = self.repos.clone();
        repos.insert(handle.slug().to_string(), handle);
        Self { repos }
    }
}

#[derive(Debug)]
pub struct Registry {
    root: PathBuf,
    current: RwLock<Arc<RepoIndex>>,
    writer: Mutex<()>,
}

pub type SharedRegistry = Arc<Registry>;

impl Registry {
    /// Registry over `root` with an empty index; call `reload` to scan.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            current: RwLock::new(Arc::new(RepoIndex::default())),
            writer: Mutex::new(()),
        }
    }

    /// Scan `root` and build a registry over it.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let registry = Self::new(root);
        registry.reload()?;
        Ok(registry)
    }

    /// Rescan the root and swap the new index in. On failure the previous
    /// index stays installed.
    pub fn reload(&self) -> Result<usize> {
        let _writer = self.lock_writer();
        let index = RepoIndex::scan(&self.root)?;
        let count = index.len();
        tracing::info!("Loaded {} repositories from {}", count, self.root.display());
        self.install(Arc::new(index));
        Ok(count)
    }

    /// Snapshot of the index as of now.
    pub fn current(&self) -> Arc<RepoIndex> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn lookup(&self, slug: &str) -> Option<Arc<RepositoryHandle>> {
        self.current().get(slug)
    }

    /// Like `lookup`, for callers that want a `RepoNotFound` error.
    pub fn find(&self, slug: &str) -> Result<Arc<RepositoryHandle>> {
        self.lookup(slug).ok_or_else(|| AppError::RepoNotFound(slug.to_string()))
    }

    pub fn list(&self) -> Vec<Arc<RepositoryHandle>> {
        self.current().list()
    }

    /// Insert a single handle without rescanning.
    pub fn add(&self, handle: RepositoryHandle) -> Arc<RepositoryHandle> {
        let _writer = self.lock_writer();
        self.insert(handle)
    }

    /// Initialise a bare repository at `<root>/<name>` and register it.
    pub fn create(&self, name: &str) -> Result<Arc<RepositoryHandle>> {
        validate_name(name)?;

        let _writer = self.lock_writer();
        let path = self.root.join(name);
        if path.exists() {
            return Err(AppError::AlreadyExists(name.to_string()));
        }

        let repo = Repository::init_bare(&path)?;
        tracing::info!("Created bare repository {}", path.display());
        Ok(self.insert(RepositoryHandle::from_repository(name, path, repo)))
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Copy-on-write insert. Callers hold the writer lock.
    fn insert(&self, handle: RepositoryHandle) -> Arc<RepositoryHandle> {
        let handle = Arc::new(handle);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = guard.with(handle.clone());
        *guard = Arc::new(next);
        handle
    }

    fn install(&self, index: Arc<RepoIndex>) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = index;
    }
}

/// A repository name must be a single, visible path segment.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AppError::InvalidName("name is empty".to_string()));
    }
    if name.starts_with('.') {
        return Err(AppError::InvalidName(format!("{} is hidden", name)));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(AppError::InvalidName(format!("{} is not a single path segment", name)));
    }
    Ok(())
}

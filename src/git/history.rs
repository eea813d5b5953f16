//! Bounded commit history.
//!
//! `log` returns a lazy, single-pass iterator over commits reachable from a
//! start commit, newest committer time first. The walk ends at the root of
//! history or after `PAGE_SIZE` commits, whichever comes first. There is no
//! continuation token: callers wanting older commits start a new walk from
//! a different commit.

use git2::{Oid, Repository, Revwalk, Sort};

use crate::error::Result;
use crate::git::repository::{commit_summary, find_commit};
use crate::models::CommitSummary;

/// Hard cap on commits returned by one walk.
pub const PAGE_SIZE: usize = 500;

pub struct History<'repo> {
    repo: &'repo Repository,
    walk: Revwalk<'repo>,
    remaining: usize,
    truncated: Option<bool>,
}

/// Walk history from `start`, yielding at most `limit` commits. `limit` is
/// clamped to `PAGE_SIZE`.
pub fn log(repo: &Repository, start: Oid, limit: usize) -> Result<History<'_>> {
    find_commit(repo, start)?;

    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TIME)?;
    walk.push(start)?;

    Ok(History {
        repo,
        walk,
        remaining: limit.min(PAGE_SIZE),
        truncated: None,
    })
}

impl Iterator for History<'_> {
    type Item = Result<CommitSummary>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            if self.truncated.is_none() {
                self.truncated = Some(matches!(self.walk.next(), Some(Ok(_))));
            }
            return None;
        }

        let oid = match self.walk.next() {
            Some(Ok(oid)) => oid,
            Some(Err(e)) => {
                self.remaining = 0;
                self.truncated = Some(false);
                return Some(Err(e.into()));
            }
            None => {
                self.remaining = 0;
                self.truncated = Some(false);
                return None;
            }
        };
        self.remaining -= 1;

        Some(find_commit(self.repo, oid).map(|commit| commit_summary(&commit)))
    }
}

impl History<'_> {
    /// True when the cap cut the walk short while older commits remained.
    /// Only settled once the iterator has returned `None`.
    pub fn truncated(&self) -> bool {
        self.truncated.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::test_support::TestRepo;

    #[test]
    fn test_returns_exactly_the_reachable_history() {
        let fixture = TestRepo::new();
        let head = fixture.commit_many("main", 7);

        let commits: Vec<_> = fixture.with_repo(|repo| log(repo, head, PAGE_SIZE)?.collect());
        assert_eq!(commits.len(), 7);
        assert_eq!(commits[0].id, head.to_string());
        assert_eq!(commits[0].subject, "Commit 6");
        assert_eq!(commits[6].subject, "Commit 0");
        assert!(commits[6].parents.is_empty());
    }

    #[test]
    fn test_newest_committer_time_first() {
        let fixture = TestRepo::new();
        let head = fixture.commit_many("main", 5);

        let commits: Vec<_> = fixture.with_repo(|repo| log(repo, head, PAGE_SIZE)?.collect());
        assert!(commits.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_page_size_is_a_hard_cap() {
        let fixture = TestRepo::new();
        let head = fixture.commit_many("main", PAGE_SIZE + 5);

        fixture.with_repo(|repo| {
            let mut history = log(repo, head, usize::MAX)?;
            let commits: Vec<_> = history.by_ref().collect::<Result<_>>()?;
            assert_eq!(commits.len(), PAGE_SIZE);
            assert!(history.truncated());
            assert!(history.next().is_none());
            Ok(())
        });
    }

    #[test]
    fn test_smaller_limit_is_honoured() {
        let fixture = TestRepo::new();
        let head = fixture.commit_many("main", 10);

        let commits: Vec<_> = fixture.with_repo(|repo| log(repo, head, 3)?.collect());
        assert_eq!(commits.len(), 3);
    }

    #[test]
    fn test_exact_page_is_not_truncated() {
        let fixture = TestRepo::new();
        let head = fixture.commit_many("main", 4);

        fixture.with_repo(|repo| {
            let mut history = log(repo, head, 4)?;
            assert_eq!(history.by_ref().count(), 4);
            assert!(!history.truncated());

            let mut short = log(repo, head, 2)?;
            assert_eq!(short.by_ref().count(), 2);
            assert!(short.truncated());
            Ok(())
        });
    }

    #[test]
    fn test_unknown_start_is_not_found() {
        let fixture = TestRepo::new();
        fixture.commit_many("main", 1);

        fixture.with_repo(|repo| {
            let missing = Oid::from_str("1111111111111111111111111111111111111111")?;
            assert!(matches!(log(repo, missing, PAGE_SIZE), Err(AppError::CommitNotFound(_))));
            Ok(())
        });
    }
}

use git2::{BranchType, Oid, Repository};

use crate::error::{AppError, Result};
use crate::git::repository::RepositoryHandle;
use crate::models::Reference;

/// Local branches, sorted by fully-qualified name.
pub fn list_branches(repo: &Repository) -> Result<Vec<Reference>> {
    let mut refs = Vec::new();

    for branch in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = branch?;
        let reference = branch.get();
        if let Some(r) = to_reference(reference) {
            refs.push(r);
        }
    }

    refs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(refs)
}

/// Tags, sorted by fully-qualified name. Annotated tags report the commit
/// they point at.
pub fn list_tags(repo: &Repository) -> Result<Vec<Reference>> {
    let mut refs = Vec::new();

    for reference in repo.references_glob("refs/tags/*")? {
        let reference = reference?;
        if let Some(r) = to_reference(&reference) {
            refs.push(r);
        }
    }

    refs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(refs)
}

fn to_reference(reference: &git2::Reference) -> Option<Reference> {
    let name = reference.name()?.to_string();
    let short_name = reference.shorthand().unwrap_or(&name).to_string();
    let target = match reference.peel_to_commit() {
        Ok(commit) => commit.id(),
        Err(_) => reference.target()?,
    };

    Some(Reference {
        name,
        short_name,
        target: target.to_string(),
    })
}

/// Pick the branch shown when a URL names no reference: `main`, then
/// `master`, then the first branch by name.
pub fn default_branch_name(branches: &[Reference]) -> Option<&str> {
    for preferred in ["main", "master"] {
        if let Some(branch) = branches.iter().find(|b| b.short_name == preferred) {
            return Some(&branch.short_name);
        }
    }
    branches.first().map(|b| b.short_name.as_str())
}

pub fn resolve_default_branch(handle: &RepositoryHandle) -> Result<(String, Oid)> {
    handle.with_repo(|repo| {
        let branches = list_branches(repo)?;
        let name = default_branch_name(&branches)
            .ok_or_else(|| AppError::NoBranches(handle.slug().to_string()))?
            .to_string();
        let id = resolve_revision(repo, &name)?;
        Ok((name, id))
    })
}

/// Resolve a branch name, tag name or (abbreviated) hash to a commit id.
pub fn resolve_revision(repo: &Repository, text: &str) -> Result<Oid> {
    let not_found = || AppError::RevisionNotFound(text.to_string());
    if text.is_empty() || text.starts_with('-') {
        return Err(not_found());
    }

    let object = repo.revparse_single(text).map_err(|_| not_found())?;
    let commit = object.peel_to_commit().map_err(|_| not_found())?;
    Ok(commit.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRepo;

    fn handle(fixture: &TestRepo) -> RepositoryHandle {
        RepositoryHandle::open("fixture", fixture.path()).unwrap()
    }

    #[test]
    fn test_main_wins_over_master() {
        let fixture = TestRepo::new();
        fixture.commit("master", &[("a", "1\n")], "on master");
        let main = fixture.commit("main", &[("a", "2\n")], "on main");
        fixture.commit("alpha", &[("a", "3\n")], "on alpha");

        let (name, id) = resolve_default_branch(&handle(&fixture)).unwrap();
        assert_eq!(name, "main");
        assert_eq!(id, main);
    }

    #[test]
    fn test_master_when_no_main() {
        let fixture = TestRepo::new();
        fixture.commit("aaa", &[("a", "1\n")], "first");
        let master = fixture.commit("master", &[("a", "2\n")], "second");

        let (name, id) = resolve_default_branch(&handle(&fixture)).unwrap();
        assert_eq!(name, "master");
        assert_eq!(id, master);
    }

    #[test]
    fn test_lexicographically_first_otherwise() {
        let fixture = TestRepo::new();
        fixture.commit("zebra", &[("a", "1\n")], "z");
        let develop = fixture.commit("develop", &[("a", "2\n")], "d");
        fixture.commit("feature", &[("a", "3\n")], "f");

        let (name, id) = resolve_default_branch(&handle(&fixture)).unwrap();
        assert_eq!(name, "develop");
        assert_eq!(id, develop);
    }

    #[test]
    fn test_no_branches_fails() {
        let fixture = TestRepo::new();
        let err = resolve_default_branch(&handle(&fixture)).unwrap_err();
        assert!(matches!(err, AppError::NoBranches(_)));
    }

    #[test]
    fn test_resolve_branch_tag_and_hash_prefix() {
        let fixture = TestRepo::new();
        let first = fixture.commit("main", &[("a", "1\n")], "first");
        let second = fixture.commit("main", &[("a", "2\n")], "second");
        fixture.tag("v1.0", first);
        fixture.annotated_tag("v2.0", second, "Release 2");

        fixture.with_repo(|repo| {
            assert_eq!(resolve_revision(repo, "main")?, second);
            assert_eq!(resolve_revision(repo, "v1.0")?, first);
            assert_eq!(resolve_revision(repo, "v2.0")?, second);
            assert_eq!(resolve_revision(repo, &first.to_string())?, first);
            assert_eq!(resolve_revision(repo, &first.to_string()[..10])?, first);
            Ok(())
        });
    }

    #[test]
    fn test_unknown_revision_is_not_found() {
        let fixture = TestRepo::new();
        fixture.commit("main", &[("a", "1\n")], "first");

        fixture.with_repo(|repo| {
            for text in ["nope", "", "deadbeefdeadbeef", "--all"] {
                assert!(matches!(
                    resolve_revision(repo, text),
                    Err(AppError::RevisionNotFound(_))
                ));
            }
            Ok(())
        });
    }

    #[test]
    fn test_branches_and_tags_are_sorted_and_peeled() {
        let fixture = TestRepo::new();
        let id = fixture.commit("main", &[("a", "1\n")], "first");
        fixture.commit("feature/x", &[("b", "1\n")], "feature");
        fixture.annotated_tag("v2", id, "annotated");
        fixture.tag("v1", id);

        fixture.with_repo(|repo| {
            let branches = list_branches(repo)?;
            let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
            assert_eq!(names, vec!["refs/heads/feature/x", "refs/heads/main"]);
            assert_eq!(branches[0].short_name, "feature/x");

            let tags = list_tags(repo)?;
            let short: Vec<_> = tags.iter().map(|t| t.short_name.as_str()).collect();
            assert_eq!(short, vec!["v1", "v2"]);
            assert!(tags.iter().all(|t| t.target == id.to_string()));
            Ok(())
        });
    }
}

//! Commit diffs against the first parent.
//!
//! - `diff_commit`: tree delta between a commit and parent 0, renames detected
//! - `CommitDiff::changes`: file-level `Change` list in tree traversal order
//! - `CommitDiff::render_unified`: per-file unified diffs separated by blank lines
//! - `CommitDiff::stats`: totals plus per-file insertions/deletions
//! - `render_patch_email`: single-patch email in `git format-patch` layout
//!
//! A root commit has nothing to diff against; every entry point reports it
//! as `AppError::NoParent` and leaves the reaction to the caller.

use chrono::{FixedOffset, TimeZone};
use git2::{Delta, Diff, DiffFindOptions, DiffFormat, DiffOptions, DiffStatsFormat, Patch, Repository};

use crate::error::{AppError, Result};
use crate::models::{Change, ChangeKind, DiffStats, FileStat};

/// Unchanged lines shown around each hunk.
pub const CONTEXT_LINES: u32 = 3;

/// Placed between file diffs in the unified view.
const FILE_SEPARATOR: &str = "\n\n\n\n";

/// Fixed date on the `From <hash>` line, as `git format-patch` writes it.
const MBOX_PLACEHOLDER_DATE: &str = "Mon Sep 17 00:00:00 2001";

const STATS_WIDTH: usize = 72;

pub struct CommitDiff<'repo> {
    diff: Diff<'repo>,
}

/// Diff `commit` against its first parent.
pub fn diff_commit<'repo>(repo: &'repo Repository, commit: &git2::Commit<'_>) -> Result<CommitDiff<'repo>> {
    if commit.parent_count() == 0 {
        return Err(AppError::NoParent(commit.id().to_string()));
    }

    let parent_tree = commit.parent(0)?.tree()?;
    let tree = commit.tree()?;

    let mut opts = DiffOptions::new();
    opts.context_lines(CONTEXT_LINES);

    let mut diff = repo.diff_tree_to_tree(Some(&parent_tree), Some(&tree), Some(&mut opts))?;

    let mut find = DiffFindOptions::new();
    find.renames(true);
    diff.find_similar(Some(&mut find))?;

    Ok(CommitDiff { diff })
}

impl<'repo> CommitDiff<'repo> {
    pub fn changes(&self) -> Vec<Change> {
        self.diff
            .deltas()
            .filter_map(|delta| {
                let kind = match delta.status() {
                    Delta::Added => ChangeKind::Added,
                    Delta::Deleted => ChangeKind::Deleted,
                    Delta::Renamed => ChangeKind::Renamed,
                    Delta::Modified | Delta::Typechange | Delta::Copied => ChangeKind::Modified,
                    _ => return None,
                };

                let old_path = delta.old_file().path().map(|p| p.to_string_lossy().to_string());
                let new_path = delta.new_file().path().map(|p| p.to_string_lossy().to_string());
                let path = match kind {
                    ChangeKind::Deleted => old_path.clone(),
                    _ => new_path.or_else(|| old_path.clone()),
                }
                .unwrap_or_default();

                Some(Change {
                    path,
                    old_path: if kind == ChangeKind::Renamed { old_path } else { None },
                    kind,
                    old_id: delta.old_file().id().to_string(),
                    new_id: delta.new_file().id().to_string(),
                })
            })
            .collect()
    }

    /// One unified diff per file, joined by a double blank line.
    pub fn render_unified(&self) -> Result<String> {
        let mut files = Vec::new();

        for idx in 0..self.diff.deltas().len() {
            if let Some(mut patch) = Patch::from_diff(&self.diff, idx)? {
                let buf = patch.to_buf()?;
                files.push(String::from_utf8_lossy(&buf).trim_end_matches('\n').to_string());
            }
        }

        let mut out = files.join(FILE_SEPARATOR);
        if !out.is_empty() {
            out.push('\n');
        }
        Ok(out)
    }

    /// The whole diff as one contiguous patch, as `git diff` prints it.
    pub fn render_patch(&self) -> Result<String> {
        let mut buf: Vec<u8> = Vec::new();

        self.diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                '+' | '-' | ' ' => buf.push(line.origin() as u8),
                _ => {}
            }
            buf.extend_from_slice(line.content());
            true
        })?;

        Ok(String::from_utf8_lossy(&buf).to_string())
    }

    pub fn stats(&self) -> Result<DiffStats> {
        let mut stats = DiffStats::default();

        for idx in 0..self.diff.deltas().len() {
            let Some(patch) = Patch::from_diff(&self.diff, idx)? else {
                continue;
            };
            let (_, insertions, deletions) = patch.line_stats()?;
            let delta = patch.delta();
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();

            stats.files_changed += 1;
            stats.insertions += insertions;
            stats.deletions += deletions;
            stats.files.push(FileStat {
                path,
                insertions,
                deletions,
            });
        }

        Ok(stats)
    }

    /// `git diff --stat` style summary.
    pub fn render_stats(&self) -> Result<String> {
        let stats = self.diff.stats()?;
        let buf = stats.to_buf(DiffStatsFormat::FULL | DiffStatsFormat::INCLUDE_SUMMARY, STATS_WIDTH)?;
        Ok(String::from_utf8_lossy(&buf).to_string())
    }
}

/// Render `commit` as a single-patch email: mbox `From` line, author,
/// RFC 2822 date, `[PATCH]` subject, diffstat and the patch itself.
pub fn render_patch_email(repo: &Repository, commit: &git2::Commit) -> Result<String> {
    let diff = diff_commit(repo, commit)?;
    let author = commit.author();

    let message = String::from_utf8_lossy(commit.message_bytes()).to_string();
    let (subject, body) = match message.split_once('\n') {
        Some((subject, body)) => (subject.trim_end(), body.trim()),
        None => (message.trim_end(), ""),
    };

    let mut email = String::new();
    email.push_str(&format!("From {} {}\n", commit.id(), MBOX_PLACEHOLDER_DATE));
    email.push_str(&format!(
        "From: {} <{}>\n",
        String::from_utf8_lossy(author.name_bytes()),
        String::from_utf8_lossy(author.email_bytes())
    ));
    email.push_str(&format!("Date: {}\n", rfc2822_date(&author.when())?));
    email.push_str(&format!("Subject: [PATCH] {}\n", subject));
    if !body.is_empty() {
        email.push('\n');
        email.push_str(body);
        email.push('\n');
    }
    email.push_str("---\n");
    email.push_str(&diff.render_stats()?);
    email.push('\n');
    email.push_str(&diff.render_patch()?);

    Ok(email)
}

fn rfc2822_date(time: &git2::Time) -> Result<String> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
        .ok_or_else(|| AppError::Internal(format!("Invalid UTC offset: {} minutes", time.offset_minutes())))?;
    let date = offset
        .timestamp_opt(time.seconds(), 0)
        .single()
        .ok_or_else(|| AppError::Internal(format!("Invalid timestamp: {}", time.seconds())))?;
    Ok(date.to_rfc2822())
}

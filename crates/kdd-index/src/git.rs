//! Git-diff-driven change detection for incremental indexing. Shells out to
//! the `git` binary (no libgit2 dependency in the example corpus) and filters
//! paths with `globset` rather than hand-rolled `**` matching.

use std::path::Path;
use std::process::Command;

use globset::{Glob, GlobSet, GlobSetBuilder};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

fn run_git(repo: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git").current_dir(repo).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn is_git_repo(repo: &Path) -> bool {
    run_git(repo, &["rev-parse", "--git-dir"]).is_some()
}

pub fn get_current_commit(repo: &Path) -> Option<String> {
    run_git(repo, &["rev-parse", "HEAD"])
}

/// Build a [`GlobSet`] from `**`-capable patterns; callers pass the same
/// pattern list to every match check.
pub fn build_glob_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap())
}

fn matches_any(glob_set: &GlobSet, filepath: &str) -> bool {
    glob_set.is_match(filepath)
}

/// Files added/modified/deleted since `since_commit`, filtered to `patterns`.
pub fn get_diff(repo: &Path, since_commit: &str, patterns: &[String]) -> DiffResult {
    let glob_set = build_glob_set(patterns);
    let Some(output) = run_git(repo, &["diff", "--name-status", since_commit, "HEAD"]) else {
        return DiffResult::default();
    };

    let mut result = DiffResult::default();
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((status, filepath)) = line.split_once('\t') else { continue };
        let (status, filepath) = (status.trim(), filepath.trim());

        if !patterns.is_empty() && !matches_any(&glob_set, filepath) {
            continue;
        }

        if status.starts_with('A') {
            result.added.push(filepath.to_string());
        } else if status.starts_with('M') || status.starts_with('R') {
            result.modified.push(filepath.to_string());
        } else if status.starts_with('D') {
            result.deleted.push(filepath.to_string());
        }
    }
    result
}

/// Every tracked file in `repo`, optionally filtered by `patterns`. Falls back
/// to a `.gitignore`-respecting directory walk when `repo` isn't a git working
/// tree (e.g. a spec bundle checked out without history).
pub fn scan_files(repo: &Path, patterns: &[String]) -> Vec<String> {
    let glob_set = build_glob_set(patterns);

    if let Some(output) = run_git(repo, &["ls-files"]) {
        let mut files: Vec<String> = output
            .lines()
            .filter(|f| !f.trim().is_empty())
            .filter(|f| patterns.is_empty() || matches_any(&glob_set, f))
            .map(str::to_string)
            .collect();
        files.sort();
        return files;
    }

    let mut files: Vec<String> = ignore::WalkBuilder::new(repo)
        .hidden(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter_map(|entry| entry.path().strip_prefix(repo).ok().map(|p| p.to_string_lossy().to_string()))
        .filter(|f| patterns.is_empty() || matches_any(&glob_set, f))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_set_matches_recursive_markdown_pattern() {
        let patterns = vec!["**/*.md".to_string()];
        let glob_set = build_glob_set(&patterns);
        assert!(matches_any(&glob_set, "specs/01-domain/entities/Order.md"));
        assert!(!matches_any(&glob_set, "specs/01-domain/entities/Order.txt"));
    }
}

//! Current branch lookup from local git state.
//!
//! Failing to resolve a branch is an expected path: no repository, a detached
//! HEAD or an unreadable file all yield `None`, which [`resolve_branch`]
//! collapses to [`DEFAULT_BRANCH`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

pub const DEFAULT_BRANCH: &str = "main";

const HEADS_PREFIX: &str = "refs/heads/";

/// Walks up from `start` to the first directory containing a `.git` entry.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Resolves the git directory of a repository root, following the `gitdir:`
/// file used by worktrees and submodules.
fn git_dir(root: &Path) -> Option<PathBuf> {
    let dot_git = root.join(".git");
    if dot_git.is_dir() {
        return Some(dot_git);
    }
    let contents = fs::read_to_string(&dot_git).ok()?;
    let target = contents.trim().strip_prefix("gitdir:")?.trim();
    let target = Path::new(target);
    Some(if target.is_absolute() {
        target.to_path_buf()
    } else {
        root.join(target)
    })
}

/// Short name of the branch checked out in the repository at `root`.
pub fn current_branch(root: &Path) -> Option<String> {
    let head_path = git_dir(root)?.join("HEAD");
    let head = match fs::read_to_string(&head_path) {
        Ok(head) => head,
        Err(e) => {
            debug!(path = %head_path.display(), error = ?e, "Cannot read HEAD");
            return None;
        }
    };
    let reference = head.trim().strip_prefix("ref:")?.trim();
    let branch = reference.strip_prefix(HEADS_PREFIX)?;
    if branch.is_empty() {
        return None;
    }
    Some(branch.to_string())
}

/// Branch checked out in the repository containing `start`, or `"main"`.
pub fn resolve_branch(start: &Path) -> String {
    let branch = find_git_root(start).and_then(|root| current_branch(&root));
    match branch {
        Some(branch) => {
            debug!(branch = %branch, "Resolved git branch");
            branch
        }
        None => {
            debug!(start = %start.display(), "No git branch found, using default");
            DEFAULT_BRANCH.to_string()
        }
    }
}

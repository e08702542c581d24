pub mod notes;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::exec::{self, CommandRunner};

#[derive(Debug, Error)]
pub enum WorktreeError {
    /// The PR, its head branch, or the matching remote could not be
    /// resolved via the gh CLI.
    #[error("failed to resolve PR: {0}")]
    Resolution(String),

    /// The existing worktree has uncommitted changes. Safety-critical:
    /// this always prevents the re-checkout path from running.
    #[error("worktree at {0} has uncommitted changes; commit or discard them before re-running")]
    DirtyWorktree(PathBuf),

    /// Any underlying git, filesystem, or disk failure.
    #[error("git operation failed: {0}")]
    Git(String),
}

/// Outcome of a successful preparation. Computed once, printed, not
/// retained.
#[derive(Debug, Clone)]
pub struct WorktreeResult {
    /// Absolute path of the checkout under `<repo>/git-worktrees/`
    pub path: PathBuf,
    /// The PR's head branch name
    pub branch: String,
    /// Whether a pre-existing clean worktree was updated in place
    pub reused: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrRefs {
    head_ref_name: String,
    head_ref_oid: String,
}

#[derive(Debug, Deserialize)]
struct RepoView {
    owner: OwnerView,
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwnerView {
    login: String,
}

/// Prepare an isolated review checkout for a PR.
///
/// Resolves the head branch via `gh`, then either reuses an existing
/// clean worktree (fetch + fast-forward only; a diverged branch is
/// refused rather than reset) or creates a fresh one from
/// `refs/pull/<n>/head`, and finally scaffolds the review-notes
/// template. The dirty-worktree check runs immediately before the first
/// mutating command, never from a cached earlier result.
#[instrument(skip(runner), fields(repo = %repo_path.display(), pr = pr_number))]
pub async fn prepare(
    runner: &dyn CommandRunner,
    repo_path: &Path,
    pr_number: u64,
) -> Result<WorktreeResult, WorktreeError> {
    let repo_path = repo_path
        .canonicalize()
        .map_err(|e| WorktreeError::Git(format!("repository path {}: {e}", repo_path.display())))?;
    git_ok(runner, &repo_path, &["rev-parse", "--git-dir"])
        .await
        .map_err(|_| {
            WorktreeError::Git(format!("{} is not a git repository", repo_path.display()))
        })?;

    let refs = resolve_pr(runner, &repo_path, pr_number).await?;
    let branch = refs.head_ref_name;
    validate_branch_name(&branch)?;
    debug!(branch = %branch, oid = %refs.head_ref_oid, "resolved PR head");

    let remote = resolve_remote(runner, &repo_path).await?;
    debug!(remote = %remote, "resolved base remote");

    let worktree_path = repo_path.join("git-worktrees").join(&branch);
    let notes_dir = repo_path.join("review-notes").join(&branch);

    let reused = if worktree_path.exists() {
        info!(path = %worktree_path.display(), "worktree already exists, reusing");
        if is_dirty(runner, &worktree_path).await? {
            return Err(WorktreeError::DirtyWorktree(worktree_path));
        }
        let pull_ref = format!("pull/{pr_number}/head");
        git_ok(runner, &worktree_path, &["fetch", &remote, &pull_ref]).await?;
        git_ok(runner, &worktree_path, &["merge", "--ff-only", "FETCH_HEAD"])
            .await
            .map_err(|err| match err {
                WorktreeError::Git(detail) => WorktreeError::Git(format!(
                    "existing checkout at {} cannot be fast-forwarded to {pull_ref} \
                     (branch diverged?); remove the worktree to start over: {detail}",
                    worktree_path.display()
                )),
                other => other,
            })?;
        true
    } else {
        if let Some(parent) = worktree_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                WorktreeError::Git(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        // GitHub publishes every PR head under refs/pull/, which covers
        // fork PRs too; the forced refspec keeps a stale local branch
        // from blocking the fetch.
        let refspec = format!("+refs/pull/{pr_number}/head:refs/heads/{branch}");
        git_ok(runner, &repo_path, &["fetch", &remote, &refspec]).await?;
        let short_oid = refs.head_ref_oid.get(..8).unwrap_or(&refs.head_ref_oid);
        info!(branch = %branch, "created local branch at {short_oid}");

        let worktree_str = worktree_path.to_string_lossy().to_string();
        git_ok(runner, &repo_path, &["worktree", "add", &worktree_str, &branch]).await?;
        false
    };

    let created = notes::ensure_template(&notes_dir, pr_number, &branch, &worktree_path)
        .map_err(|e| WorktreeError::Git(format!("failed to write review notes: {e}")))?;
    if created {
        info!(path = %notes_dir.join("README.md").display(), "created review notes template");
    }

    Ok(WorktreeResult {
        path: worktree_path,
        branch,
        reused,
    })
}

/// Resolve the PR's head branch and commit via the gh CLI.
async fn resolve_pr(
    runner: &dyn CommandRunner,
    repo: &Path,
    pr_number: u64,
) -> Result<PrRefs, WorktreeError> {
    let number = pr_number.to_string();
    gh_json(
        runner,
        repo,
        &["pr", "view", &number, "--json", "headRefName,headRefOid"],
    )
    .await
}

/// Find the remote that points at the PR's base repository, by matching
/// `gh repo view` against the configured remote URLs (SSH or HTTPS).
async fn resolve_remote(
    runner: &dyn CommandRunner,
    repo: &Path,
) -> Result<String, WorktreeError> {
    let view: RepoView = gh_json(runner, repo, &["repo", "view", "--json", "owner,name"]).await?;

    let listing = git_ok(runner, repo, &["remote", "-v"])
        .await
        .map_err(|e| WorktreeError::Resolution(format!("failed to list remotes: {e}")))?;
    for line in listing.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        if remote_matches(url, &view.owner.login, &view.name) {
            return Ok(name.to_string());
        }
    }
    Err(WorktreeError::Resolution(format!(
        "no git remote found for {}/{}",
        view.owner.login, view.name
    )))
}

fn remote_matches(url: &str, owner: &str, name: &str) -> bool {
    let url = url.trim_end_matches(".git");
    let repo = format!("{owner}/{name}");
    url.ends_with(&format!("/{repo}")) || url.ends_with(&format!(":{repo}"))
}

/// Branch names become filesystem paths under the repository; refuse
/// names that would escape it.
fn validate_branch_name(branch: &str) -> Result<(), WorktreeError> {
    if branch.is_empty() {
        return Err(WorktreeError::Resolution(
            "PR head branch name is empty".to_string(),
        ));
    }
    if branch.starts_with('/') || branch.split('/').any(|segment| segment == "..") {
        return Err(WorktreeError::Resolution(format!(
            "refusing unsafe branch name `{branch}`"
        )));
    }
    Ok(())
}

/// Uncommitted changes in the worktree: modified, staged, or untracked.
async fn is_dirty(runner: &dyn CommandRunner, worktree: &Path) -> Result<bool, WorktreeError> {
    let status = git_ok(runner, worktree, &["status", "--porcelain"]).await?;
    Ok(!status.is_empty())
}

/// Run git in `repo`, returning trimmed stdout on success and the
/// command's stderr as a `Git` error otherwise.
async fn git_ok(
    runner: &dyn CommandRunner,
    repo: &Path,
    args: &[&str],
) -> Result<String, WorktreeError> {
    let output = runner
        .run("git", args, Some(repo))
        .await
        .map_err(|e| WorktreeError::Git(format!("failed to run git: {e}")))?;
    if !output.status.success() {
        return Err(WorktreeError::Git(format!(
            "`git {}` failed: {}",
            args.join(" "),
            exec::stderr_str(&output)
        )));
    }
    Ok(exec::stdout_str(&output))
}

async fn gh_json<T: serde::de::DeserializeOwned>(
    runner: &dyn CommandRunner,
    repo: &Path,
    args: &[&str],
) -> Result<T, WorktreeError> {
    let output = runner
        .run("gh", args, Some(repo))
        .await
        .map_err(|e| WorktreeError::Resolution(format!("failed to run gh: {e}")))?;
    if !output.status.success() {
        return Err(WorktreeError::Resolution(format!(
            "`gh {}` failed: {}",
            args.join(" "),
            exec::stderr_str(&output)
        )));
    }
    serde_json::from_str(&String::from_utf8_lossy(&output.stdout))
        .map_err(|e| WorktreeError::Resolution(format!("failed to parse gh output: {e}")))
}

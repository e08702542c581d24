use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pr_review::exec::SystemRunner;
use pr_review::worktree::{self, WorktreeError};

/// Prepare an isolated git worktree for reviewing a PR.
///
/// Checks the PR's head branch out under `<repo>/git-worktrees/<branch>`
/// (reusing a clean existing checkout) and scaffolds a review-notes
/// template under `<repo>/review-notes/<branch>`. Prints the worktree
/// path — and only the path — to stdout.
#[derive(Parser, Debug)]
#[command(name = "prepare-worktree", version, about)]
struct Cli {
    /// Path to the local git repository the PR targets
    repo_path: PathBuf,

    /// Pull request number
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pr_number: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match worktree::prepare(&SystemRunner, &cli.repo_path, cli.pr_number).await {
        Ok(result) => println!("{}", result.path.display()),
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            std::process::exit(exit_code(&err));
        }
    }
}

fn exit_code(err: &WorktreeError) -> i32 {
    match err {
        WorktreeError::Resolution(_) => 2,
        WorktreeError::DirtyWorktree(_) => 3,
        WorktreeError::Git(_) => 4,
    }
}

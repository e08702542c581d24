use clap::Parser;
use colored::Colorize;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pr_review::config::Config;
use pr_review::exec::SystemRunner;
use pr_review::github::{self, GithubError, HttpTransport};
use pr_review::{report, summary};

/// Summarize a GitHub Pull Request — metadata, changed files, the
/// discussion timeline, and unresolved review threads — as Markdown on
/// stdout.
#[derive(Parser, Debug)]
#[command(name = "summarize-pr", version, about)]
struct Cli {
    /// Repository owner (user or organization)
    owner: String,

    /// Repository name
    repo: String,

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
    if cli.owner.trim().is_empty() || cli.repo.trim().is_empty() {
        eprintln!("{} owner and repo must be non-empty", "error:".red().bold());
        std::process::exit(1);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            std::process::exit(1);
        }
    };

    // The report is all-or-nothing: stdout sees either the complete
    // rendered document or nothing at all.
    match run(&cli, &config).await {
        Ok(markdown) => print!("{markdown}"),
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            std::process::exit(exit_code(&err));
        }
    }
}

async fn run(cli: &Cli, config: &Config) -> Result<String, GithubError> {
    let token = github::resolve_token(config, &SystemRunner).await?;
    let transport = HttpTransport::new(token, Duration::from_secs(config.github.timeout_secs))?;

    info!("fetching pull request from the GitHub GraphQL API");
    let data =
        github::fetch_pull_request(&transport, &cli.owner, &cli.repo, cli.pr_number).await?;

    let summary = summary::build(data);
    info!(
        files = summary.files.len(),
        events = summary.timeline.len(),
        unresolved = summary.unresolved.len(),
        "rendering report"
    );
    Ok(report::render(&summary))
}

/// Distinct exit codes per failure kind so a caller can tell a
/// permanent failure from a retryable one.
fn exit_code(err: &GithubError) -> i32 {
    match err {
        GithubError::Auth(_) => 2,
        GithubError::NotFound(_) => 3,
        GithubError::Transient(_) => 4,
    }
}

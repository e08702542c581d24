pub mod query;

pub use query::PullRequestData;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::exec::{self, CommandRunner};

pub const GRAPHQL_URL: &str = "https://api.github.com/graphql";

#[derive(Debug, Error)]
pub enum GithubError {
    /// Missing or rejected credentials.
    #[error("GitHub authentication failed: {0} (run `gh auth login` or set GITHUB_TOKEN)")]
    Auth(String),

    /// The repository or pull request does not exist, or the token
    /// cannot see it.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network-level or otherwise retryable failure. The tool never
    /// retries; callers may.
    #[error("transient GitHub API failure: {0}")]
    Transient(String),
}

/// One GraphQL round trip. Production uses [`HttpTransport`]; tests feed
/// canned response documents through a mock.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, GithubError>;
}

/// reqwest-backed transport against the GitHub GraphQL endpoint, with a
/// hard request timeout so a hung connection surfaces as `Transient`.
pub struct HttpTransport {
    client: reqwest::Client,
    token: String,
}

impl HttpTransport {
    pub fn new(token: String, timeout: Duration) -> Result<Self, GithubError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GithubError::Transient(format!("failed to build HTTP client: {e}")))?;
        Ok(HttpTransport { client, token })
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, GithubError> {
        let response = self
            .client
            .post(GRAPHQL_URL)
            .header("User-Agent", "pr-review")
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(GithubError::Auth(format!("GitHub API returned HTTP {status}")));
        }
        if !status.is_success() {
            return Err(GithubError::Transient(format!(
                "GitHub API returned HTTP {status}"
            )));
        }
        response.json::<Value>().await.map_err(request_error)
    }
}

fn request_error(err: reqwest::Error) -> GithubError {
    if err.is_timeout() {
        GithubError::Transient(format!("request timed out: {err}"))
    } else {
        GithubError::Transient(format!("network error: {err}"))
    }
}

/// Resolve the API token: config file / env vars first, then the gh CLI's
/// stored credentials.
pub async fn resolve_token(
    config: &Config,
    runner: &dyn CommandRunner,
) -> Result<String, GithubError> {
    if let Some(token) = config.github_token() {
        return Ok(token);
    }

    debug!("no token in config or environment, trying `gh auth token`");
    if let Ok(output) = runner.run("gh", &["auth", "token"], None).await {
        if output.status.success() {
            let token = exec::stdout_str(&output);
            if !token.is_empty() {
                return Ok(token);
            }
        }
    }

    Err(GithubError::Auth(
        "no token found in config, GITHUB_TOKEN, GH_TOKEN, or `gh auth token`".to_string(),
    ))
}

/// Fetch the complete pull request, paginating each collection (files,
/// comments, reviews, review threads) to exhaustion. Collections are
/// paginated independently: each continuation re-issues the query with
/// only that collection's cursor set, exactly once per page.
#[instrument(skip(transport), fields(owner = %owner, repo = %repo, pr = number))]
pub async fn fetch_pull_request(
    transport: &dyn GraphqlTransport,
    owner: &str,
    repo: &str,
    number: u64,
) -> Result<PullRequestData, GithubError> {
    let mut pr = parse_pull_request(
        transport
            .execute(query::PR_QUERY, variables(owner, repo, number, None))
            .await?,
    )?;

    while pr.files.page_info.has_next_page {
        let cursor = take_cursor(&pr.files.page_info)?;
        let page = parse_pull_request(
            transport
                .execute(
                    query::PR_QUERY,
                    variables(owner, repo, number, Some(("filesCursor", &cursor))),
                )
                .await?,
        )?;
        pr.files.nodes.extend(page.files.nodes);
        pr.files.page_info = page.files.page_info;
    }

    while pr.comments.page_info.has_next_page {
        let cursor = take_cursor(&pr.comments.page_info)?;
        let page = parse_pull_request(
            transport
                .execute(
                    query::PR_QUERY,
                    variables(owner, repo, number, Some(("commentsCursor", &cursor))),
                )
                .await?,
        )?;
        pr.comments.nodes.extend(page.comments.nodes);
        pr.comments.page_info = page.comments.page_info;
    }

    while pr.reviews.page_info.has_next_page {
        let cursor = take_cursor(&pr.reviews.page_info)?;
        let page = parse_pull_request(
            transport
                .execute(
                    query::PR_QUERY,
                    variables(owner, repo, number, Some(("reviewsCursor", &cursor))),
                )
                .await?,
        )?;
        pr.reviews.nodes.extend(page.reviews.nodes);
        pr.reviews.page_info = page.reviews.page_info;
    }

    while pr.review_threads.page_info.has_next_page {
        let cursor = take_cursor(&pr.review_threads.page_info)?;
        let page = parse_pull_request(
            transport
                .execute(
                    query::PR_QUERY,
                    variables(owner, repo, number, Some(("threadsCursor", &cursor))),
                )
                .await?,
        )?;
        pr.review_threads.nodes.extend(page.review_threads.nodes);
        pr.review_threads.page_info = page.review_threads.page_info;
    }

    // Comments within a single thread are capped at the first 100; the
    // API offers no cursor into a nested thread from this query.
    for thread in &pr.review_threads.nodes {
        if thread.comments.page_info.has_next_page {
            warn!("a review thread has more than 100 comments; older comments are truncated");
        }
    }

    debug!(
        files = pr.files.nodes.len(),
        comments = pr.comments.nodes.len(),
        reviews = pr.reviews.nodes.len(),
        threads = pr.review_threads.nodes.len(),
        "fetched pull request"
    );
    Ok(pr)
}

fn variables(owner: &str, repo: &str, number: u64, cursor: Option<(&str, &str)>) -> Value {
    let mut vars = json!({
        "owner": owner,
        "repo": repo,
        "number": number,
        "filesCursor": null,
        "commentsCursor": null,
        "reviewsCursor": null,
        "threadsCursor": null,
    });
    if let Some((name, value)) = cursor {
        vars[name] = json!(value);
    }
    vars
}

fn take_cursor(page_info: &query::PageInfo) -> Result<String, GithubError> {
    page_info
        .end_cursor
        .clone()
        .ok_or_else(|| GithubError::Transient("pagination cursor missing from response".to_string()))
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<EnvelopeData>,
    errors: Option<Vec<GraphqlErrorNode>>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    pull_request: Option<PullRequestData>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorNode {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Map a raw GraphQL response document into typed PR data. Untyped data
/// never crosses this boundary: anything unexpected becomes `NotFound`
/// or `Transient`.
fn parse_pull_request(response: Value) -> Result<PullRequestData, GithubError> {
    let envelope: Envelope = serde_json::from_value(response)
        .map_err(|e| GithubError::Transient(format!("unexpected GraphQL response shape: {e}")))?;

    if let Some(errors) = envelope.errors {
        if !errors.is_empty() {
            return Err(classify_errors(errors));
        }
    }

    envelope
        .data
        .and_then(|data| data.repository)
        .and_then(|repo| repo.pull_request)
        .ok_or_else(|| GithubError::NotFound("repository or pull request not found".to_string()))
}

fn classify_errors(errors: Vec<GraphqlErrorNode>) -> GithubError {
    for error in &errors {
        match error.kind.as_deref() {
            Some("NOT_FOUND") => return GithubError::NotFound(error.message.clone()),
            Some("INSUFFICIENT_SCOPES") | Some("FORBIDDEN") => {
                return GithubError::Auth(error.message.clone())
            }
            _ => {}
        }
    }
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    GithubError::Transient(format!("GraphQL errors: {}", messages.join("; ")))
}

/// Everything the report needs about one pull request. Built once per
/// invocation at the API boundary, immutable afterwards.
#[derive(Debug, Clone)]
pub struct PullRequestSummary {
    /// PR number (e.g., 42)
    pub number: u64,
    /// PR title
    pub title: String,
    /// Web URL of the PR
    pub url: String,
    /// Author's login; `ghost` when the account was deleted
    pub author: String,
    /// OPEN, CLOSED, or MERGED
    pub state: String,
    /// Branch the PR merges into
    pub base_ref: String,
    /// Branch the PR comes from
    pub head_ref: String,
    /// Total lines added
    pub additions: u64,
    /// Total lines deleted
    pub deletions: u64,
    /// Total files changed (as reported by the API, not the file list length)
    pub changed_files: u64,
    /// PR description body, possibly empty
    pub body: String,
    /// Changed files in API order
    pub files: Vec<ChangedFile>,
    /// General comments and submitted reviews, oldest first
    pub timeline: Vec<TimelineEvent>,
    /// Review threads not yet marked resolved, in API order
    pub unresolved: Vec<UnresolvedThread>,
}

impl PullRequestSummary {
    /// Count of plain issue comments in the timeline (reviews excluded).
    pub fn general_comment_count(&self) -> usize {
        self.timeline
            .iter()
            .filter(|event| matches!(event.kind, EventKind::Comment))
            .count()
    }
}

/// A single file within the PR.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub path: String,
    pub additions: u64,
    pub deletions: u64,
}

/// One entry in the chronological discussion.
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    pub author: String,
    /// ISO-8601 timestamp; lexicographic order is chronological order.
    pub timestamp: String,
    pub body: String,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub enum EventKind {
    /// Plain issue comment on the PR.
    Comment,
    /// Submitted review; carries the review state (APPROVED, ...).
    Review { state: String },
}

/// A review thread whose resolution flag is false.
#[derive(Debug, Clone)]
pub struct UnresolvedThread {
    /// File the thread is anchored to, if any
    pub path: Option<String>,
    /// Commented line in the file, if still mapped
    pub line: Option<u64>,
    /// Whether the code under discussion has since changed
    pub is_outdated: bool,
    /// Every comment in the thread, oldest first
    pub comments: Vec<ThreadComment>,
}

#[derive(Debug, Clone)]
pub struct ThreadComment {
    pub author: String,
    pub timestamp: String,
    pub body: String,
    /// Unified-diff excerpt around the commented line; present on the
    /// first comment of a thread.
    pub diff_hunk: Option<String>,
}

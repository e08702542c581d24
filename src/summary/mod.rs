pub mod types;

pub use types::{
    ChangedFile, EventKind, PullRequestSummary, ThreadComment, TimelineEvent, UnresolvedThread,
};

use crate::github::query::{Actor, PullRequestData};

/// Login shown when the API returns a null actor (deleted account).
const GHOST_LOGIN: &str = "ghost";

fn login(actor: Option<Actor>) -> String {
    actor.map(|a| a.login).unwrap_or_else(|| GHOST_LOGIN.to_string())
}

/// Shape raw GraphQL data into the report's view of the PR: merge
/// general comments and submitted reviews into one chronological
/// timeline, and keep only the review threads still marked unresolved.
pub fn build(pr: PullRequestData) -> PullRequestSummary {
    let files = pr
        .files
        .nodes
        .into_iter()
        .map(|file| ChangedFile {
            path: file.path,
            additions: file.additions,
            deletions: file.deletions,
        })
        .collect();

    let mut timeline: Vec<TimelineEvent> = Vec::new();
    for comment in pr.comments.nodes {
        timeline.push(TimelineEvent {
            author: login(comment.author),
            timestamp: comment.created_at,
            body: comment.body,
            kind: EventKind::Comment,
        });
    }
    for review in pr.reviews.nodes {
        // Reviews without a body (or never submitted) carry nothing the
        // timeline can show; their inline comments surface via threads.
        let Some(submitted_at) = review.submitted_at else {
            continue;
        };
        if review.body.is_empty() {
            continue;
        }
        timeline.push(TimelineEvent {
            author: login(review.author),
            timestamp: submitted_at,
            body: review.body,
            kind: EventKind::Review {
                state: review.state,
            },
        });
    }
    // ISO-8601 timestamps sort lexicographically; the sort is stable,
    // so events sharing a timestamp keep comments-before-reviews order.
    timeline.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let unresolved = pr
        .review_threads
        .nodes
        .into_iter()
        .filter(|thread| !thread.is_resolved)
        .map(|thread| {
            // Location comes from the thread's first comment.
            let path = thread.comments.nodes.first().and_then(|c| c.path.clone());
            let line = thread.comments.nodes.first().and_then(|c| c.line);
            let comments = thread
                .comments
                .nodes
                .into_iter()
                .map(|comment| ThreadComment {
                    author: login(comment.author),
                    timestamp: comment.created_at,
                    body: comment.body,
                    diff_hunk: comment.diff_hunk,
                })
                .collect();
            UnresolvedThread {
                path,
                line,
                is_outdated: thread.is_outdated,
                comments,
            }
        })
        .collect();

    PullRequestSummary {
        number: pr.number,
        title: pr.title,
        url: pr.url,
        author: login(pr.author),
        state: pr.state,
        base_ref: pr.base_ref_name,
        head_ref: pr.head_ref_name,
        additions: pr.additions,
        deletions: pr.deletions,
        changed_files: pr.changed_files,
        body: pr.body,
        files,
        timeline,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::query::{
        CommentNode, FileNode, PageInfo, Paged, PullRequestData, ReviewNode, ThreadCommentNode,
        ThreadNode,
    };

    fn empty_page<T>() -> Paged<T> {
        Paged {
            page_info: PageInfo {
                has_next_page: false,
                end_cursor: None,
            },
            nodes: vec![],
        }
    }

    fn page<T>(nodes: Vec<T>) -> Paged<T> {
        Paged {
            page_info: PageInfo {
                has_next_page: false,
                end_cursor: None,
            },
            nodes,
        }
    }

    fn actor(name: &str) -> Option<Actor> {
        Some(Actor {
            login: name.to_string(),
        })
    }

    fn sample_pr() -> PullRequestData {
        PullRequestData {
            title: "Add OAuth2 login flow".to_string(),
            number: 42,
            url: "https://github.com/org/repo/pull/42".to_string(),
            author: actor("alice"),
            base_ref_name: "main".to_string(),
            head_ref_name: "feature/login".to_string(),
            state: "OPEN".to_string(),
            additions: 320,
            deletions: 45,
            changed_files: 7,
            body: "Implements the login flow.".to_string(),
            files: empty_page::<FileNode>(),
            comments: empty_page::<CommentNode>(),
            reviews: empty_page::<ReviewNode>(),
            review_threads: empty_page::<ThreadNode>(),
        }
    }

    fn thread(resolved: bool, path: &str, line: u64) -> ThreadNode {
        ThreadNode {
            is_resolved: resolved,
            is_outdated: false,
            comments: page(vec![ThreadCommentNode {
                author: actor("bob"),
                body: "is this safe?".to_string(),
                diff_hunk: Some("@@ -1,2 +1,2 @@\n-a\n+b".to_string()),
                path: Some(path.to_string()),
                line: Some(line),
                created_at: "2024-05-01T12:00:00Z".to_string(),
            }]),
        }
    }

    #[test]
    fn test_timeline_is_sorted_chronologically() {
        let mut pr = sample_pr();
        pr.comments = page(vec![
            CommentNode {
                author: actor("carol"),
                body: "second".to_string(),
                created_at: "2024-05-02T00:00:00Z".to_string(),
            },
            CommentNode {
                author: actor("carol"),
                body: "first".to_string(),
                created_at: "2024-05-01T00:00:00Z".to_string(),
            },
        ]);
        pr.reviews = page(vec![ReviewNode {
            author: actor("dave"),
            state: "APPROVED".to_string(),
            body: "third".to_string(),
            submitted_at: Some("2024-05-03T00:00:00Z".to_string()),
        }]);

        let summary = build(pr);
        let bodies: Vec<&str> = summary.timeline.iter().map(|e| e.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_body_less_and_pending_reviews_are_dropped() {
        let mut pr = sample_pr();
        pr.reviews = page(vec![
            ReviewNode {
                author: actor("dave"),
                state: "COMMENTED".to_string(),
                body: String::new(),
                submitted_at: Some("2024-05-01T00:00:00Z".to_string()),
            },
            ReviewNode {
                author: actor("erin"),
                state: "PENDING".to_string(),
                body: "draft".to_string(),
                submitted_at: None,
            },
        ]);
        let summary = build(pr);
        assert!(summary.timeline.is_empty());
    }

    #[test]
    fn test_unresolved_count_matches_resolution_flags() {
        let mut pr = sample_pr();
        pr.review_threads = page(vec![
            thread(true, "src/a.rs", 1),
            thread(false, "src/b.rs", 2),
            thread(false, "src/c.rs", 3),
        ]);
        let summary = build(pr);
        assert_eq!(summary.unresolved.len(), 2);
        assert_eq!(summary.unresolved[0].path.as_deref(), Some("src/b.rs"));
        assert_eq!(summary.unresolved[1].line, Some(3));
    }

    #[test]
    fn test_deleted_author_renders_as_ghost() {
        let mut pr = sample_pr();
        pr.author = None;
        pr.comments = page(vec![CommentNode {
            author: None,
            body: "orphaned".to_string(),
            created_at: "2024-05-01T00:00:00Z".to_string(),
        }]);
        let summary = build(pr);
        assert_eq!(summary.author, "ghost");
        assert_eq!(summary.timeline[0].author, "ghost");
    }
}

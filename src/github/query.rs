use serde::Deserialize;

/// Single query for everything the report needs: PR metadata, the
/// changed-file list, general comments, submitted reviews, and review
/// threads with their resolution status. Each collection takes its own
/// cursor so one document serves both the initial fetch and every
/// pagination continuation.
pub const PR_QUERY: &str = r#"
query($owner: String!, $repo: String!, $number: Int!, $filesCursor: String, $commentsCursor: String, $reviewsCursor: String, $threadsCursor: String) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $number) {
      title
      number
      url
      author {
        login
      }
      baseRefName
      headRefName
      state
      additions
      deletions
      changedFiles
      body
      files(first: 100, after: $filesCursor) {
        pageInfo {
          hasNextPage
          endCursor
        }
        nodes {
          path
          additions
          deletions
        }
      }
      comments(first: 100, after: $commentsCursor) {
        pageInfo {
          hasNextPage
          endCursor
        }
        nodes {
          author {
            login
          }
          body
          createdAt
        }
      }
      reviews(first: 100, after: $reviewsCursor) {
        pageInfo {
          hasNextPage
          endCursor
        }
        nodes {
          author {
            login
          }
          state
          body
          submittedAt
        }
      }
      reviewThreads(first: 100, after: $threadsCursor) {
        pageInfo {
          hasNextPage
          endCursor
        }
        nodes {
          isResolved
          isOutdated
          comments(first: 100) {
            pageInfo {
              hasNextPage
              endCursor
            }
            nodes {
              author {
                login
              }
              body
              diffHunk
              path
              line
              createdAt
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One page-aware collection (`pageInfo` + `nodes`) as GitHub returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub page_info: PageInfo,
    pub nodes: Vec<T>,
}

/// Comment/review author. Null in the API when the account was deleted.
#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestData {
    pub title: String,
    pub number: u64,
    pub url: String,
    pub author: Option<Actor>,
    pub base_ref_name: String,
    pub head_ref_name: String,
    pub state: String,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    #[serde(default)]
    pub body: String,
    pub files: Paged<FileNode>,
    pub comments: Paged<CommentNode>,
    pub reviews: Paged<ReviewNode>,
    pub review_threads: Paged<ThreadNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub author: Option<Actor>,
    pub body: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewNode {
    pub author: Option<Actor>,
    pub state: String,
    #[serde(default)]
    pub body: String,
    /// Null while a review is still pending.
    pub submitted_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadNode {
    pub is_resolved: bool,
    pub is_outdated: bool,
    pub comments: Paged<ThreadCommentNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadCommentNode {
    pub author: Option<Actor>,
    pub body: String,
    #[serde(default)]
    pub diff_hunk: Option<String>,
    pub path: Option<String>,
    pub line: Option<u64>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_paged_collection() {
        let json = r#"{
            "pageInfo": { "hasNextPage": true, "endCursor": "abc" },
            "nodes": [ { "path": "src/lib.rs", "additions": 3, "deletions": 1 } ]
        }"#;
        let paged: Paged<FileNode> = serde_json::from_str(json).unwrap();
        assert!(paged.page_info.has_next_page);
        assert_eq!(paged.page_info.end_cursor.as_deref(), Some("abc"));
        assert_eq!(paged.nodes.len(), 1);
        assert_eq!(paged.nodes[0].path, "src/lib.rs");
    }

    #[test]
    fn test_deserialize_thread_comment_with_null_author() {
        let json = r#"{
            "author": null,
            "body": "looks wrong",
            "diffHunk": "@@ -1,2 +1,2 @@\n-a\n+b",
            "path": "src/main.rs",
            "line": 7,
            "createdAt": "2024-05-01T12:00:00Z"
        }"#;
        let comment: ThreadCommentNode = serde_json::from_str(json).unwrap();
        assert!(comment.author.is_none());
        assert_eq!(comment.line, Some(7));
    }

    #[test]
    fn test_deserialize_pending_review_without_timestamp() {
        let json = r#"{
            "author": { "login": "alice" },
            "state": "PENDING",
            "body": "",
            "submittedAt": null
        }"#;
        let review: ReviewNode = serde_json::from_str(json).unwrap();
        assert!(review.submitted_at.is_none());
        assert_eq!(review.state, "PENDING");
    }
}

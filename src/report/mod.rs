use crate::summary::{EventKind, PullRequestSummary};

/// Context lines kept on each side of the commented line when trimming
/// a thread's diff hunk.
pub const DIFF_CONTEXT_LINES: usize = 3;

/// Render the summary as a Markdown report. Pure string assembly over an
/// immutable summary, so rendering the same summary twice is
/// byte-identical.
pub fn render(summary: &PullRequestSummary) -> String {
    let mut md = String::new();

    md.push_str(&format!("# PR #{}: {}\n\n", summary.number, summary.title));
    md.push_str(&format!("**URL**: {}\n\n", summary.url));
    md.push_str(&format!("**Author**: @{}\n\n", summary.author));
    md.push_str(&format!("**Status**: {}\n\n", summary.state));
    md.push_str(&format!(
        "**Branch**: `{}` → `{}`\n\n",
        summary.head_ref, summary.base_ref
    ));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- **Files changed**: {}\n", summary.changed_files));
    md.push_str(&format!("- **Additions**: +{}\n", summary.additions));
    md.push_str(&format!("- **Deletions**: -{}\n", summary.deletions));
    md.push_str(&format!(
        "- **General comments**: {}\n",
        summary.general_comment_count()
    ));
    md.push_str(&format!(
        "- **Unresolved review comments**: {}\n\n",
        summary.unresolved.len()
    ));

    if !summary.body.is_empty() {
        md.push_str("## Description\n\n");
        md.push_str(&summary.body);
        md.push_str("\n\n");
    }

    md.push_str("## Files Changed\n\n");
    if summary.files.is_empty() {
        md.push_str("*No file changes found*\n\n");
    } else {
        for file in &summary.files {
            md.push_str(&format!(
                "- `{}` (+{} -{})\n",
                file.path, file.additions, file.deletions
            ));
        }
        md.push('\n');
    }

    if !summary.timeline.is_empty() {
        md.push_str("## Discussion & Reviews\n\n");
        for event in &summary.timeline {
            match &event.kind {
                EventKind::Comment => {
                    md.push_str(&format!("**@{}** ({}):\n\n", event.author, event.timestamp));
                }
                EventKind::Review { state } => {
                    md.push_str(&format!(
                        "**@{}** ({}) - {}:\n\n",
                        event.author,
                        event.timestamp,
                        review_state_label(state)
                    ));
                }
            }
            md.push_str(&event.body);
            md.push_str("\n\n---\n\n");
        }
    }

    md.push_str("## Unresolved Review Comments\n\n");
    if summary.unresolved.is_empty() {
        md.push_str("*No unresolved comments*\n");
    } else {
        for (i, thread) in summary.unresolved.iter().enumerate() {
            let opener = thread
                .comments
                .first()
                .map(|c| c.author.as_str())
                .unwrap_or("ghost");
            md.push_str(&format!("### {}. Comment by @{}\n\n", i + 1, opener));

            if let Some(path) = &thread.path {
                match thread.line {
                    Some(line) => {
                        md.push_str(&format!("**Location**: `{path}` (line {line})\n\n"))
                    }
                    None => md.push_str(&format!("**Location**: `{path}`\n\n")),
                }
            }
            md.push_str(&format!(
                "**Status**: {}\n\n",
                if thread.is_outdated { "Outdated" } else { "Current" }
            ));

            for (idx, comment) in thread.comments.iter().enumerate() {
                md.push_str(&format!(
                    "**@{}** ({}):\n\n",
                    comment.author, comment.timestamp
                ));
                if idx == 0 {
                    if let Some(hunk) = &comment.diff_hunk {
                        md.push_str("**Code context:**\n\n");
                        md.push_str("```diff\n");
                        md.push_str(&trim_diff_hunk(hunk, DIFF_CONTEXT_LINES));
                        md.push_str("\n```\n\n");
                    }
                }
                md.push_str(&comment.body);
                md.push_str("\n\n---\n\n");
            }
        }
    }

    md
}

/// GitHub's diffHunk ends at the commented line, so trimming keeps the
/// hunk header plus the last `2 * context + 1` lines. Elided lines are
/// marked with `...`.
fn trim_diff_hunk(hunk: &str, context: usize) -> String {
    let mut lines = hunk.lines();
    let first = lines.next();
    let (header, body): (Option<&str>, Vec<&str>) = match first {
        Some(line) if line.starts_with("@@") => (Some(line), lines.collect()),
        Some(line) => (None, std::iter::once(line).chain(lines).collect()),
        None => (None, Vec::new()),
    };

    let keep = 2 * context + 1;
    let mut out: Vec<&str> = Vec::new();
    if let Some(header) = header {
        out.push(header);
    }
    if body.len() > keep {
        out.push("...");
        out.extend(&body[body.len() - keep..]);
    } else {
        out.extend(&body);
    }
    out.join("\n")
}

fn review_state_label(state: &str) -> &str {
    match state {
        "APPROVED" => "✅ APPROVED",
        "CHANGES_REQUESTED" => "🔴 CHANGES REQUESTED",
        "COMMENTED" => "💬 COMMENTED",
        "DISMISSED" => "❌ DISMISSED",
        "PENDING" => "⏳ PENDING",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{ChangedFile, ThreadComment, TimelineEvent, UnresolvedThread};

    fn sample_summary() -> PullRequestSummary {
        PullRequestSummary {
            number: 42,
            title: "Add OAuth2 login flow".to_string(),
            url: "https://github.com/org/repo/pull/42".to_string(),
            author: "alice".to_string(),
            state: "OPEN".to_string(),
            base_ref: "main".to_string(),
            head_ref: "feature/login".to_string(),
            additions: 320,
            deletions: 45,
            changed_files: 7,
            body: "Implements the login flow.".to_string(),
            files: vec![ChangedFile {
                path: "src/auth.rs".to_string(),
                additions: 300,
                deletions: 40,
            }],
            timeline: vec![
                TimelineEvent {
                    author: "carol".to_string(),
                    timestamp: "2024-05-01T00:00:00Z".to_string(),
                    body: "Looks promising".to_string(),
                    kind: EventKind::Comment,
                },
                TimelineEvent {
                    author: "dave".to_string(),
                    timestamp: "2024-05-02T00:00:00Z".to_string(),
                    body: "Ship it".to_string(),
                    kind: EventKind::Review {
                        state: "APPROVED".to_string(),
                    },
                },
            ],
            unresolved: vec![UnresolvedThread {
                path: Some("src/auth.rs".to_string()),
                line: Some(57),
                is_outdated: false,
                comments: vec![ThreadComment {
                    author: "bob".to_string(),
                    timestamp: "2024-05-01T12:00:00Z".to_string(),
                    body: "is this constant-time?".to_string(),
                    diff_hunk: Some("@@ -50,8 +50,8 @@\n context\n-old\n+new".to_string()),
                }],
            }],
        }
    }

    #[test]
    fn test_render_contains_all_sections() {
        let md = render(&sample_summary());
        assert!(md.contains("# PR #42: Add OAuth2 login flow"));
        assert!(md.contains("**Branch**: `feature/login` → `main`"));
        assert!(md.contains("## Summary"));
        assert!(md.contains("## Description"));
        assert!(md.contains("## Files Changed"));
        assert!(md.contains("- `src/auth.rs` (+300 -40)"));
        assert!(md.contains("## Discussion & Reviews"));
        assert!(md.contains("✅ APPROVED"));
        assert!(md.contains("## Unresolved Review Comments"));
        assert!(md.contains("### 1. Comment by @bob"));
        assert!(md.contains("**Location**: `src/auth.rs` (line 57)"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let summary = sample_summary();
        assert_eq!(render(&summary), render(&summary));
    }

    #[test]
    fn test_unresolved_count_line_matches_thread_count() {
        let summary = sample_summary();
        let md = render(&summary);
        assert!(md.contains(&format!(
            "- **Unresolved review comments**: {}",
            summary.unresolved.len()
        )));
    }

    #[test]
    fn test_render_empty_sections() {
        let mut summary = sample_summary();
        summary.body = String::new();
        summary.files.clear();
        summary.timeline.clear();
        summary.unresolved.clear();
        let md = render(&summary);
        assert!(!md.contains("## Description"));
        assert!(md.contains("*No file changes found*"));
        assert!(!md.contains("## Discussion & Reviews"));
        assert!(md.contains("*No unresolved comments*"));
    }

    #[test]
    fn test_trim_diff_hunk_keeps_short_hunks_whole() {
        let hunk = "@@ -1,3 +1,3 @@\n a\n-b\n+c";
        assert_eq!(trim_diff_hunk(hunk, 3), hunk);
    }

    #[test]
    fn test_trim_diff_hunk_elides_long_hunks() {
        let body: Vec<String> = (1..=20).map(|i| format!(" line{i}")).collect();
        let hunk = format!("@@ -1,20 +1,20 @@\n{}", body.join("\n"));
        let trimmed = trim_diff_hunk(&hunk, 3);
        let lines: Vec<&str> = trimmed.lines().collect();
        // header + marker + 7 kept lines
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "@@ -1,20 +1,20 @@");
        assert_eq!(lines[1], "...");
        assert_eq!(lines[2], " line14");
        assert_eq!(lines[8], " line20");
    }
}

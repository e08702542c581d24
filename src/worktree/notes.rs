use std::fs;
use std::io;
use std::path::Path;

/// The fixed review-notes scaffold. Checklists are filled in by the
/// reviewer; the tooling never edits this file after creation.
pub fn render_template(pr_number: u64, branch: &str, worktree_path: &Path) -> String {
    format!(
        "# PR #{pr_number} Review Notes

## PR Information
- **Branch**: `{branch}`
- **Worktree**: `{worktree}`

## Review Progress

### 1. PR Summary Analysis
- [ ] Reviewed PR description and metadata
- [ ] Reviewed file changes
- [ ] Reviewed discussion timeline
- [ ] Identified unresolved comments

**Notes:**


### 2. Context Gathering
- [ ] Identified related files and dependencies
- [ ] Reviewed test coverage
- [ ] Checked documentation updates
- [ ] Reviewed architecture alignment

**Notes:**


### 3. Code Review
- [ ] Reviewed all changed files
- [ ] Checked for correctness and logic issues
- [ ] Verified error handling
- [ ] Assessed performance implications
- [ ] Checked security concerns

**Notes:**


### 4. Unresolved Comments


### 5. New Issues Found


### 6. Final Recommendation

**Status**: [ ] Approve [ ] Request Changes [ ] Comment

**Summary:**


**Action Items:**

",
        worktree = worktree_path.display(),
    )
}

/// Create `<notes_dir>/README.md` from the template unless one already
/// exists. In-progress notes are never overwritten. Returns whether a
/// file was created.
pub fn ensure_template(
    notes_dir: &Path,
    pr_number: u64,
    branch: &str,
    worktree_path: &Path,
) -> io::Result<bool> {
    fs::create_dir_all(notes_dir)?;
    let readme_path = notes_dir.join("README.md");
    if readme_path.exists() {
        return Ok(false);
    }
    fs::write(&readme_path, render_template(pr_number, branch, worktree_path))?;
    Ok(true)
}

//! Status command implementation.
use anyhow::Result;

use crate::config::CommandOptions;
use crate::git::RepoStatus;
use crate::logging::Logger;

/// Report how the repository compares with its remote.
///
/// # Errors
///
/// Returns an error if the repository is not initialized or has no remote.
pub fn run(log: &Logger) -> Result<()> {
    let lnk = super::open(&CommandOptions::default())?;
    let status = lnk.status()?;
    log.stage(&format!("Repository {}", lnk.layout().repo_root().display()));
    for line in summarize(&status) {
        log.info(&line);
    }
    Ok(())
}

fn summarize(status: &RepoStatus) -> Vec<String> {
    let mut lines = Vec::new();
    let branch = status.branch.as_deref().unwrap_or("(detached)");
    lines.push(format!("branch {branch}, remote {}", status.remote_url));
    if status.is_up_to_date() {
        lines.push("up to date".to_string());
        return lines;
    }
    if status.ahead > 0 {
        lines.push(format!("{} commit(s) ahead, run `lnk push`", status.ahead));
    }
    if status.behind > 0 {
        lines.push(format!("{} commit(s) behind, run `lnk pull`", status.behind));
    }
    if status.dirty {
        lines.push("uncommitted changes".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_status_is_one_line_after_header() {
        let status = RepoStatus {
            remote_url: "git@example.com:me/dots.git".into(),
            branch: Some("main".into()),
            ..RepoStatus::default()
        };
        assert_eq!(
            summarize(&status),
            vec!["branch main, remote git@example.com:me/dots.git", "up to date"]
        );
    }

    #[test]
    fn diverged_and_dirty() {
        let status = RepoStatus {
            ahead: 2,
            behind: 1,
            dirty: true,
            remote_url: "/srv/dots.git".into(),
            branch: None,
        };
        insta::assert_debug_snapshot!(summarize(&status), @r#"
        [
            "branch (detached), remote /srv/dots.git",
            "2 commit(s) ahead, run `lnk push`",
            "1 commit(s) behind, run `lnk pull`",
            "uncommitted changes",
        ]
        "#);
    }
}

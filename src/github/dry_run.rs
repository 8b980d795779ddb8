use std::cell::Cell;
use std::io::Write;

use anyhow::Result;

use super::{CheckRunUpdate, GitHubApi, IssueComment};

/// Prints the calls a real run would make instead of sending them.
///
/// Comment listings are always empty, so every planned body shows up as a
/// create. Created comments and checks get sequential synthetic ids.
#[derive(Default)]
pub struct DryRunApi {
    next_id: Cell<u64>,
}

impl DryRunApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn print(&self, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        match writeln!(stdout, "{text}") {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl GitHubApi for DryRunApi {
    fn list_comments(&self, pull_request: u64) -> Result<Vec<IssueComment>> {
        tracing::debug!(pull_request, "dry-run: listing comments returns nothing");
        Ok(Vec::new())
    }

    fn create_comment(&self, pull_request: u64, body: &str) -> Result<u64> {
        let id = self.next_id();
        self.print(&format!(
            "--- create comment #{id} on pull request {pull_request} ({} chars)\n{body}",
            body.len()
        ))?;
        Ok(id)
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        self.print(&format!(
            "--- update comment #{comment_id} ({} chars)\n{body}",
            body.len()
        ))
    }

    fn delete_comment(&self, comment_id: u64) -> Result<()> {
        self.print(&format!("--- delete comment #{comment_id}"))
    }

    fn create_check(&self, name: &str, head_sha: &str, title: &str) -> Result<u64> {
        let id = self.next_id();
        self.print(&format!(
            "--- create check #{id} `{name}` on {head_sha}: {title}"
        ))?;
        Ok(id)
    }

    fn update_check(&self, check_id: u64, update: &CheckRunUpdate) -> Result<()> {
        let json = serde_json::to_string_pretty(update)?;
        self.print(&format!("--- update check #{check_id}\n{json}"))
    }
}

//! The GitHub REST surface the reporter depends on.
//!
//! Everything above this module talks to [`GitHubApi`]; the blocking HTTP
//! client and the dry-run printer are the two implementations shipped.

pub mod client;
pub mod context;
pub mod dry_run;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use client::RestClient;
pub use context::PullRequestContext;
pub use dry_run::DryRunApi;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationLevel {
    Warning,
    Failure,
}

/// One entry of a check run's `output.annotations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckAnnotation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub annotation_level: AnnotationLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutput {
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<CheckAnnotation>,
}

/// Body of `PATCH /repos/{owner}/{repo}/check-runs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRunUpdate {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<CheckConclusion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub output: CheckOutput,
}

pub trait GitHubApi {
    fn list_comments(&self, pull_request: u64) -> Result<Vec<IssueComment>>;
    fn create_comment(&self, pull_request: u64, body: &str) -> Result<u64>;
    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()>;
    fn delete_comment(&self, comment_id: u64) -> Result<()>;

    /// Creates an in-progress check run on `head_sha` and returns its id.
    fn create_check(&self, name: &str, head_sha: &str, title: &str) -> Result<u64>;
    fn update_check(&self, check_id: u64, update: &CheckRunUpdate) -> Result<()>;
}

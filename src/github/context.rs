use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::exit;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// The pull request a workflow run is reporting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    pub api_url: String,
    pub pull_request_number: u64,
    pub head_sha: String,
}

#[derive(Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequestPayload>,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    number: u64,
    #[serde(default)]
    head: Option<HeadPayload>,
}

#[derive(Deserialize)]
struct HeadPayload {
    sha: String,
}

impl PullRequestContext {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let repository = var("GITHUB_REPOSITORY")
            .ok_or_else(|| exit::invalid_args("GITHUB_REPOSITORY is not set"))?;
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
            .ok_or_else(|| {
                exit::invalid_args(format!(
                    "GITHUB_REPOSITORY must look like owner/repo, got `{repository}`"
                ))
            })?;

        // Any event whose payload carries a pull request is accepted.
        let pull_request = match var("GITHUB_EVENT_PATH") {
            Some(path) => read_event(Path::new(&path))
                .map_err(exit::invalid_args_err)?
                .pull_request,
            None => None,
        };
        let Some(pull_request) = pull_request else {
            let event_name = var("GITHUB_EVENT_NAME").unwrap_or_else(|| "<unset>".to_string());
            return Err(exit::invalid_args(format!(
                "knip-reporter currently only supports 'pull_request' events, current event: {event_name}"
            )));
        };

        let head_sha = match pull_request.head.map(|h| h.sha) {
            Some(sha) if !sha.is_empty() => sha,
            _ => {
                let sha = var("GITHUB_SHA").ok_or_else(|| {
                    exit::invalid_args("pull request head sha is missing and GITHUB_SHA is not set")
                })?;
                tracing::warn!(sha = %sha, "pull request head sha missing, falling back to GITHUB_SHA");
                sha
            }
        };

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            pull_request_number: pull_request.number,
            head_sha,
        })
    }

    /// Placeholder used by `run --dry-run` outside of a workflow.
    pub fn offline() -> Self {
        Self {
            owner: "local".to_string(),
            repo: "local".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            pull_request_number: 0,
            head_sha: "0000000000000000000000000000000000000000".to_string(),
        }
    }
}

fn read_event(path: &Path) -> Result<EventPayload> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse event payload: {}", path.display()))
}

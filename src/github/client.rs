use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;

use super::{CheckRunUpdate, GitHubApi, IssueComment, PullRequestContext};
use crate::exit;

const PAGE_SIZE: usize = 100;
const API_VERSION: &str = "2022-11-28";

/// Blocking GitHub REST client scoped to one repository.
pub struct RestClient {
    http: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

#[derive(Deserialize)]
struct Created {
    id: u64,
}

impl RestClient {
    pub fn new(ctx: &PullRequestContext, token: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("knip-reporter/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")
            .map_err(exit::api_err)?;
        Ok(Self {
            http,
            api_url: ctx.api_url.trim_end_matches('/').to_string(),
            owner: ctx.owner.clone(),
            repo: ctx.repo.clone(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, self.owner, self.repo, path)
    }

    fn send(&self, op: &str, request: RequestBuilder, expected: StatusCode) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .with_context(|| format!("Failed to {op}"))
            .map_err(exit::api_err)?;

        let status = response.status();
        if status != expected {
            let body = response.text().unwrap_or_default();
            tracing::debug!(op, status = status.as_u16(), body = %body, "unexpected GitHub response");
            return Err(exit::api(format!(
                "Failed to {op}, expected {} but received {}",
                expected.as_u16(),
                status.as_u16()
            )));
        }
        Ok(response)
    }

    fn created_id(op: &str, response: Response) -> Result<u64> {
        let created: Created = response
            .json()
            .with_context(|| format!("Failed to {op}: unreadable response body"))
            .map_err(exit::api_err)?;
        Ok(created.id)
    }
}

impl GitHubApi for RestClient {
    fn list_comments(&self, pull_request: u64) -> Result<Vec<IssueComment>> {
        let url = self.url(&format!("/issues/{pull_request}/comments"));
        let mut comments = Vec::new();
        let mut page = 1usize;
        loop {
            let request = self.http.get(&url).query(&[
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ]);
            let batch: Vec<IssueComment> = self
                .send("list comments", request, StatusCode::OK)?
                .json()
                .context("Failed to list comments: unreadable response body")
                .map_err(exit::api_err)?;
            let len = batch.len();
            comments.extend(batch);
            if len < PAGE_SIZE {
                break;
            }
            page += 1;
        }
        tracing::debug!(pull_request, count = comments.len(), "listed comments");
        Ok(comments)
    }

    fn create_comment(&self, pull_request: u64, body: &str) -> Result<u64> {
        let request = self
            .http
            .post(self.url(&format!("/issues/{pull_request}/comments")))
            .json(&json!({ "body": body }));
        let response = self.send("create comment", request, StatusCode::CREATED)?;
        Self::created_id("create comment", response)
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let request = self
            .http
            .patch(self.url(&format!("/issues/comments/{comment_id}")))
            .json(&json!({ "body": body }));
        self.send("update comment", request, StatusCode::OK)?;
        Ok(())
    }

    fn delete_comment(&self, comment_id: u64) -> Result<()> {
        let request = self
            .http
            .delete(self.url(&format!("/issues/comments/{comment_id}")));
        self.send("delete comment", request, StatusCode::NO_CONTENT)?;
        Ok(())
    }

    fn create_check(&self, name: &str, head_sha: &str, title: &str) -> Result<u64> {
        let request = self.http.post(self.url("/check-runs")).json(&json!({
            "name": name,
            "head_sha": head_sha,
            "status": "in_progress",
            "output": { "title": title, "summary": "" },
        }));
        let response = self.send("create check", request, StatusCode::CREATED)?;
        Self::created_id("create check", response)
    }

    fn update_check(&self, check_id: u64, update: &CheckRunUpdate) -> Result<()> {
        let request = self
            .http
            .patch(self.url(&format!("/check-runs/{check_id}")))
            .json(update);
        self.send("update check", request, StatusCode::OK)?;
        Ok(())
    }
}

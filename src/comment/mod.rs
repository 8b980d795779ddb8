//! Packing rendered sections into pull request comments and keeping the
//! posted comments in sync with them.

use anyhow::{Result, anyhow};

use crate::core::MAX_COMMENT_LENGTH;
use crate::github::GitHubApi;

const SECTION_DELIMITER: &str = "\n\n";

pub fn normalize_comment_id(comment_id: &str) -> String {
    comment_id
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

/// Hidden marker that opens the `n`-th comment of a thread.
pub fn comment_marker(comment_id: &str, n: usize) -> String {
    format!("<!-- {}-{n} -->", normalize_comment_id(comment_id))
}

/// Sections shorter than this fit into an empty comment of the thread,
/// whatever its number.
pub fn section_budget(comment_id: &str) -> usize {
    MAX_COMMENT_LENGTH
        .saturating_sub(comment_marker(comment_id, usize::MAX).len() + SECTION_DELIMITER.len())
}

/// Greedily packs `sections` into comment bodies, each starting with its marker.
pub fn prepare(comment_id: &str, sections: &[String]) -> Vec<String> {
    let mut bodies = Vec::new();
    let mut current = vec![comment_marker(comment_id, 0)];
    let mut length = current[0].len();

    let mut idx = 0;
    while idx < sections.len() {
        let section = &sections[idx];
        let next = length + section.len() + SECTION_DELIMITER.len();
        if next < MAX_COMMENT_LENGTH {
            current.push(section.clone());
            length = next;
            idx += 1;
            continue;
        }

        if current[0].len() + section.len() + SECTION_DELIMITER.len() >= MAX_COMMENT_LENGTH {
            // Does not fit even into an empty comment.
            let header = section.lines().next().unwrap_or_default();
            tracing::warn!("Section \"{header}\" contents too long to post ({})", section.len());
            tracing::warn!("Skipping this section, please see output below:");
            tracing::warn!("{section}");
            idx += 1;
            continue;
        }

        bodies.push(current.join(SECTION_DELIMITER));
        current = vec![comment_marker(comment_id, bodies.len())];
        length = current[0].len();
    }

    if current.len() > 1 {
        bodies.push(current.join(SECTION_DELIMITER));
    }
    tracing::debug!(sections = sections.len(), comments = bodies.len(), "prepared comments");
    bodies
}

/// The REST calls needed to turn the existing comments into the desired ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentPlan {
    pub updates: Vec<(u64, String)>,
    pub creates: Vec<String>,
    pub deletions: Vec<u64>,
}

pub fn reconcile(existing: &[u64], desired: Vec<String>) -> CommentPlan {
    let mut plan = CommentPlan::default();
    let mut existing = existing.iter().copied();
    for body in desired {
        match existing.next() {
            Some(id) => plan.updates.push((id, body)),
            None => plan.creates.push(body),
        }
    }
    plan.deletions = existing.collect();
    plan
}

/// Ids of the comments on `pull_request` that belong to this comment thread,
/// in listing order.
pub fn find_comment_ids(api: &dyn GitHubApi, pull_request: u64, comment_id: &str) -> Result<Vec<u64>> {
    let needle = normalize_comment_id(comment_id);
    let ids: Vec<u64> = api
        .list_comments(pull_request)?
        .into_iter()
        .filter(|c| c.body.as_deref().is_some_and(|body| body.contains(&needle)))
        .map(|c| c.id)
        .collect();
    if ids.is_empty() {
        tracing::debug!("No existing comment IDs found");
    } else {
        tracing::debug!(?ids, "Existing comment IDs found");
    }
    Ok(ids)
}

/// Runs `plan` against the API: updates, then creates, then deletions.
///
/// Deletions keep going after a failure; the failures are reported together
/// once every deletion has been attempted.
pub fn apply(api: &dyn GitHubApi, pull_request: u64, plan: &CommentPlan) -> Result<()> {
    for (id, body) in &plan.updates {
        api.update_comment(*id, body)?;
        tracing::debug!(comment = id, "updated comment");
    }
    for body in &plan.creates {
        let id = api.create_comment(pull_request, body)?;
        tracing::debug!(comment = id, "created comment");
    }

    let mut failed = Vec::new();
    for id in &plan.deletions {
        tracing::info!("    - Delete comment {id}");
        match api.delete_comment(*id) {
            Ok(()) => tracing::info!("    ✔ Delete comment {id}"),
            Err(err) => {
                tracing::warn!("Failed to delete comment {id}: {err:#}");
                failed.push(*id);
            }
        }
    }
    if !failed.is_empty() {
        let ids: Vec<String> = failed.iter().map(u64::to_string).collect();
        return Err(crate::exit::api_err(anyhow!(
            "Failed to delete {} extraneous comment(s): {}",
            failed.len(),
            ids.join(", ")
        )));
    }
    Ok(())
}

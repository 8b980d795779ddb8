//! Check-run lifecycle: create, push annotations in batches, resolve.

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::{Annotation, AnnotationKind, AnnotationsCount, CHECK_ANNOTATIONS_UPDATE_LIMIT};
use crate::github::{
    AnnotationLevel, CheckAnnotation, CheckConclusion, CheckOutput, CheckRunUpdate, CheckStatus,
    GitHubApi, PullRequestContext,
};
use crate::render::table::compact_table;

pub const CHECK_NAME: &str = "knip-reporter-annotations-check";
pub const CHECK_TITLE: &str = "Knip reporter analysis";

pub fn create_check(api: &dyn GitHubApi, ctx: &PullRequestContext) -> Result<u64> {
    let id = api.create_check(CHECK_NAME, &ctx.head_sha, CHECK_TITLE)?;
    tracing::debug!(check = id, "check created");
    Ok(id)
}

/// Quotes each name and joins them as an English list.
pub fn join_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
    match quoted.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

pub fn annotation_message(annotation: &Annotation) -> String {
    let id = &annotation.identifier;
    match &annotation.kind {
        AnnotationKind::Export | AnnotationKind::Type => {
            format!("'{id}' is an unused {}", annotation.kind.label())
        }
        AnnotationKind::Class | AnnotationKind::Enum => {
            format!("'{id}' is an unused {} member", annotation.kind.label())
        }
        AnnotationKind::Duplicate {
            duplicate_identifiers,
        } => {
            if duplicate_identifiers.is_empty() {
                format!("'{id}' is a duplicate")
            } else {
                format!("'{id}' is a duplicate of {}", join_names(duplicate_identifiers))
            }
        }
    }
}

fn check_annotation(annotation: &Annotation, level: AnnotationLevel) -> CheckAnnotation {
    // Columns are counted in UTF-16 code units.
    let width = u32::try_from(annotation.identifier.encode_utf16().count()).unwrap_or(u32::MAX);
    CheckAnnotation {
        path: annotation.path.clone(),
        start_line: annotation.start_line,
        end_line: annotation.start_line,
        start_column: annotation.start_column,
        end_column: annotation.start_column.saturating_add(width),
        annotation_level: level,
        message: annotation_message(annotation),
    }
}

pub fn summary_table(count: &AnnotationsCount) -> String {
    let rows = [
        ("Exports", count.exports),
        ("Types", count.types),
        ("Duplicates", count.duplicates),
        ("Class Members", count.class_members),
        ("Enum Members", count.enum_members),
    ]
    .into_iter()
    .map(|(name, n)| vec![name.to_string(), n.to_string()])
    .collect::<Vec<_>>();
    compact_table(&["Type", "Found"], &rows)
}

/// Pushes `annotations` onto the check in batches the Checks API accepts.
pub fn publish(
    api: &dyn GitHubApi,
    check_id: u64,
    annotations: &[Annotation],
    ignore_results: bool,
) -> Result<AnnotationsCount> {
    let level = if ignore_results {
        AnnotationLevel::Warning
    } else {
        AnnotationLevel::Failure
    };
    let mut count = AnnotationsCount::default();

    tracing::debug!(check = check_id, total = annotations.len(), "pushing annotations");
    for (batch, chunk) in annotations.chunks(CHECK_ANNOTATIONS_UPDATE_LIMIT).enumerate() {
        let payload: Vec<CheckAnnotation> = chunk
            .iter()
            .map(|annotation| {
                count.record(&annotation.kind);
                check_annotation(annotation, level)
            })
            .collect();
        let update = CheckRunUpdate {
            status: CheckStatus::InProgress,
            conclusion: None,
            completed_at: None,
            output: CheckOutput {
                title: CHECK_TITLE.to_string(),
                summary: summary_table(&count),
                annotations: payload,
            },
        };
        api.update_check(check_id, &update)
            .with_context(|| format!("Failed to push annotation batch {batch}"))?;
    }
    Ok(count)
}

pub fn resolve(
    api: &dyn GitHubApi,
    check_id: u64,
    conclusion: CheckConclusion,
    count: &AnnotationsCount,
) -> Result<()> {
    tracing::debug!(check = check_id, ?conclusion, "resolving check");
    let completed_at = OffsetDateTime::now_utc().format(&Rfc3339).ok();
    let update = CheckRunUpdate {
        status: CheckStatus::Completed,
        conclusion: Some(conclusion),
        completed_at,
        output: CheckOutput {
            title: CHECK_TITLE.to_string(),
            summary: summary_table(count),
            annotations: Vec::new(),
        },
    };
    api.update_check(check_id, &update)
}

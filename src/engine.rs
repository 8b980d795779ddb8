//! Pipeline wiring: run knip, render, sync comments, publish annotations.

use std::io::Read;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::check;
use crate::comment;
use crate::config::ActionConfig;
use crate::core::{AnnotationsCount, ParsedReport};
use crate::exit;
use crate::github::{CheckConclusion, GitHubApi, PullRequestContext};
use crate::logs::time_step;
use crate::platform;
use crate::render::{self, RenderedReport};
use crate::report;

/// Where knip's output comes from.
#[derive(Debug, Clone)]
pub enum ReportSource {
    /// Run the configured package.json script.
    Knip,
    /// Saved output; `-` reads stdin.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: ParsedReport,
    pub rendered: RenderedReport,
}

impl Analysis {
    pub fn has_findings(&self) -> bool {
        !self.rendered.sections.is_empty() || !self.rendered.annotations.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub comments: usize,
    pub annotations: AnnotationsCount,
    pub conclusion: CheckConclusion,
    pub has_findings: bool,
}

pub fn read_output(cfg: &ActionConfig, source: &ReportSource) -> Result<String> {
    match source {
        ReportSource::Knip => platform::run_knip(
            &cfg.working_directory,
            &cfg.command_script_name,
            Duration::from_secs(cfg.timeout_secs),
        ),
        ReportSource::File(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read knip output from stdin")
                .map_err(exit::invalid_args_err)?;
            Ok(buf)
        }
        ReportSource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read knip output: {}", path.display()))
            .map_err(exit::invalid_args_err),
    }
}

/// Parses raw knip output and renders it into sections that fit the comments
/// of `comment_id`.
pub fn analyze(output: &str, comment_id: &str, annotations: bool, verbose: bool) -> Result<Analysis> {
    let json = report::extract_json_payload(output).map_err(exit::analysis_err)?;
    let parsed = report::parse(json).map_err(exit::analysis_err)?;
    let budget = comment::section_budget(comment_id);
    let rendered = render::render(&parsed, annotations, verbose, budget);
    tracing::debug!(
        findings = parsed.finding_count(),
        sections = rendered.sections.len(),
        annotations = rendered.annotations.len(),
        "rendered report"
    );
    Ok(Analysis {
        report: parsed,
        rendered,
    })
}

pub fn conclusion(analysis: &Analysis, ignore_results: bool) -> CheckConclusion {
    if !ignore_results && analysis.has_findings() {
        CheckConclusion::Failure
    } else {
        CheckConclusion::Success
    }
}

/// Runs the whole action against `api`.
///
/// When annotations are enabled the check run is created first and is
/// resolved as a failure if a later stage errors.
pub fn run(
    cfg: &ActionConfig,
    api: &dyn GitHubApi,
    ctx: &PullRequestContext,
    source: &ReportSource,
) -> Result<RunOutcome> {
    let started = Instant::now();
    tracing::info!("- knip-reporter action");

    let check_id = if cfg.annotations {
        Some(time_step("Create check ID", || check::create_check(api, ctx))?)
    } else {
        None
    };

    let result = report_and_publish(cfg, api, ctx, source, check_id);
    if let (Err(_), Some(id)) = (&result, check_id) {
        if let Err(resolve_err) =
            check::resolve(api, id, CheckConclusion::Failure, &AnnotationsCount::default())
        {
            tracing::warn!("Failed to resolve check {id} after error: {resolve_err:#}");
        }
    }
    let outcome = result?;

    tracing::info!("✔ knip-reporter action ({}ms)", started.elapsed().as_millis());
    Ok(outcome)
}

fn report_and_publish(
    cfg: &ActionConfig,
    api: &dyn GitHubApi,
    ctx: &PullRequestContext,
    source: &ReportSource,
    check_id: Option<u64>,
) -> Result<RunOutcome> {
    let output = time_step("Run knip", || read_output(cfg, source))?;
    let analysis = time_step("Parse and render report", || {
        analyze(&output, &cfg.comment_id, cfg.annotations, cfg.verbose)
    })?;

    let bodies = time_step("Prepend ID to comment body", || {
        Ok(comment::prepare(&cfg.comment_id, &analysis.rendered.sections))
    })?;
    let pull_request = ctx.pull_request_number;
    let existing = time_step("Find existing comment IDs", || {
        comment::find_comment_ids(api, pull_request, &cfg.comment_id)
    })?;
    let comments = bodies.len();
    let plan = comment::reconcile(&existing, bodies);
    time_step("Create or update comment", || {
        comment::apply(api, pull_request, &plan)
    })?;

    let conclusion = conclusion(&analysis, cfg.ignore_results);
    let mut annotations = AnnotationsCount::default();
    if let Some(id) = check_id {
        annotations = time_step("Update check annotations", || {
            check::publish(api, id, &analysis.rendered.annotations, cfg.ignore_results)
        })?;
        time_step("Resolve check", || {
            check::resolve(api, id, conclusion, &annotations)
        })?;
    }

    Ok(RunOutcome {
        comments,
        annotations,
        conclusion,
        has_findings: analysis.has_findings(),
    })
}

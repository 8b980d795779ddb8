use std::io::{self, Write};

use anyhow::Error;

use crate::engine::RunOutcome;
use crate::github::CheckConclusion;

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let top = err.to_string();
    let mut causes = err
        .chain()
        .skip(1)
        .map(|cause| cause.to_string())
        .filter(|cause| *cause != top)
        .peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(
        stderr,
        "  - rerun with `--verbose` or `RUST_LOG=debug` for details"
    );
    let _ = writeln!(
        stderr,
        "  - see `knip-reporter --help` for commands and options"
    );
}

/// Prints packed comment bodies separated by rules, as `render` shows them.
pub fn print_comments(bodies: &[String]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    if bodies.is_empty() {
        writeln!(stdout, "knip reported no findings; no comments would be posted.")?;
        return Ok(());
    }
    for (idx, body) in bodies.iter().enumerate() {
        if idx > 0 {
            writeln!(stdout)?;
        }
        writeln!(
            stdout,
            "----- comment {} of {} ({} chars) -----",
            idx + 1,
            bodies.len(),
            body.len()
        )?;
        writeln!(stdout, "{body}")?;
    }
    Ok(())
}

pub fn print_outcome(outcome: &RunOutcome) {
    let conclusion = match outcome.conclusion {
        CheckConclusion::Success => "success",
        CheckConclusion::Failure => "failure",
    };
    tracing::info!(
        "Posted {} comment(s), {} annotation(s), conclusion: {conclusion}",
        outcome.comments,
        outcome.annotations.total()
    );
}

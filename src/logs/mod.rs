//! Logging setup.
//!
//! Locally events go to stderr in the default `tracing-subscriber` format.
//! Inside GitHub Actions they are written to stdout as workflow commands so
//! warnings and errors surface in the run summary.

use std::fmt;
use std::io::IsTerminal;
use std::time::Instant;

use anyhow::Result;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let result = if running_in_actions() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stdout)
            .with_env_filter(filter)
            .event_format(ActionsFormat)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(false)
            .without_time()
            .try_init()
    };
    // A subscriber is already installed when init runs twice in one process.
    let _ = result;
}

pub fn running_in_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Renders events as `::warning::`, `::error::` and `::debug::` workflow commands.
struct ActionsFormat;

impl<S, N> FormatEvent<S, N> for ActionsFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = String::new();
        ctx.field_format()
            .format_fields(format::Writer::new(&mut message), event)?;

        match workflow_command(*event.metadata().level()) {
            Some(command) => writeln!(writer, "::{command}::{}", escape_data(&message)),
            None => writeln!(writer, "{message}"),
        }
    }
}

fn workflow_command(level: Level) -> Option<&'static str> {
    match level {
        Level::ERROR => Some("error"),
        Level::WARN => Some("warning"),
        Level::INFO => None,
        Level::DEBUG | Level::TRACE => Some("debug"),
    }
}

/// Workflow command data must be single-line.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Runs `f` between `  - {name}` and `  ✔ {name} ({ms}ms)` log lines.
pub fn time_step<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    tracing::info!("  - {name}");
    let started = Instant::now();
    let out = f()?;
    tracing::info!("  ✔ {name} ({}ms)", started.elapsed().as_millis());
    Ok(out)
}

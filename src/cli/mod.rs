use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::config::{self, ActionConfig, Overrides};
use crate::engine::{self, ReportSource};
use crate::exit;
use crate::github::{DryRunApi, GitHubApi, PullRequestContext, RestClient};

const DEFAULT_COMMENT_ID: &str = "knip-reporter";

#[derive(Debug, Parser)]
#[command(
    name = "knip-reporter",
    version,
    about = "Run knip and report its findings on a GitHub pull request as comments and check annotations"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Print the planned comments and check updates instead of calling GitHub.
    #[arg(long, global = true)]
    pub dry_run: bool,
    /// Read knip output from a file (`-` for stdin) instead of running knip.
    #[arg(long, global = true, value_name = "FILE")]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub flags: ConfigFlags,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Args)]
pub struct ConfigFlags {
    #[arg(long, global = true)]
    pub comment_id: Option<String>,
    #[arg(long, global = true)]
    pub command_script_name: Option<String>,
    #[arg(long, global = true)]
    pub ignore_results: bool,
    #[arg(long, global = true)]
    pub no_annotations: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    /// Seconds before the knip process is killed.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
    #[arg(long, global = true, value_name = "DIR")]
    pub working_directory: Option<PathBuf>,
}

impl ConfigFlags {
    fn overrides(&self) -> Overrides {
        Overrides {
            comment_id: self.comment_id.clone(),
            command_script_name: self.command_script_name.clone(),
            ignore_results: self.ignore_results,
            no_annotations: self.no_annotations,
            verbose: self.verbose,
            timeout_secs: self.timeout,
            working_directory: self.working_directory.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run knip and publish the report (default).
    Run,
    /// Render saved knip output without talking to GitHub.
    Render(RenderArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// knip `--reporter json` output; `-` reads stdin.
    #[arg(default_value = "-")]
    pub input: PathBuf,
    /// Print `{sections, annotations}` as JSON instead of comment bodies.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let loaded = config::load(
        cli.config.as_deref(),
        |key| std::env::var(key).ok(),
        &cli.flags.overrides(),
    );
    crate::logs::init(loaded.as_ref().is_ok_and(|cfg| cfg.verbose));

    let result = loaded.and_then(|cfg| dispatch(&cli, &cfg));
    if let Err(err) = &result {
        tracing::error!("Failed: {err:#}");
    }
    result
}

fn dispatch(cli: &Cli, cfg: &ActionConfig) -> Result<()> {
    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Run => run_action(cli, cfg)?,
        Commands::Render(args) => render(args, cfg)?,
        Commands::Config(args) => {
            if args.show {
                let masked = config::masked(cfg);
                if args.json {
                    write_json(&masked)?;
                } else {
                    print!("{}", toml::to_string_pretty(&masked)?);
                }
            } else {
                eprintln!("config: use `knip-reporter config --show`");
            }
        }
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = std::io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "knip-reporter", &mut out);
        }
    }

    Ok(())
}

fn run_action(cli: &Cli, cfg: &ActionConfig) -> Result<()> {
    config::validate(cfg, cli.dry_run)?;
    tracing::info!("{}", config_summary(cfg));

    let source = match &cli.report {
        Some(path) => ReportSource::File(path.clone()),
        None => ReportSource::Knip,
    };

    let (api, ctx): (Box<dyn GitHubApi>, PullRequestContext) = if cli.dry_run {
        let ctx = PullRequestContext::from_env().unwrap_or_else(|err| {
            tracing::debug!("no pull request context, using placeholder: {err:#}");
            PullRequestContext::offline()
        });
        (Box::new(DryRunApi::new()), ctx)
    } else {
        let ctx = PullRequestContext::from_env()?;
        (Box::new(RestClient::new(&ctx, &cfg.token)?), ctx)
    };

    let outcome = engine::run(cfg, api.as_ref(), &ctx, &source)?;
    crate::ui::print_outcome(&outcome);

    if outcome.has_findings && !cfg.ignore_results {
        return Err(exit::findings(
            "knip has resulted in findings, please see the report for more details",
        ));
    }
    Ok(())
}

fn render(args: &RenderArgs, cfg: &ActionConfig) -> Result<()> {
    let output = engine::read_output(cfg, &ReportSource::File(args.input.clone()))?;
    let comment_id = if cfg.comment_id.trim().is_empty() {
        DEFAULT_COMMENT_ID
    } else {
        cfg.comment_id.as_str()
    };
    let analysis = engine::analyze(&output, comment_id, cfg.annotations, cfg.verbose)?;
    if args.json {
        return write_json(&analysis.rendered);
    }

    let bodies = crate::comment::prepare(comment_id, &analysis.rendered.sections);
    match crate::ui::print_comments(&bodies) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn config_summary(cfg: &ActionConfig) -> String {
    format!(
        "knip-reporter config: command_script_name={} comment_id={} ignore_results={} annotations={} verbose={} timeout={}s working_directory={}",
        cfg.command_script_name,
        cfg.comment_id,
        cfg.ignore_results,
        cfg.annotations,
        cfg.verbose,
        cfg.timeout_secs,
        cfg.working_directory.display()
    )
}

fn write_json<T: serde::Serialize>(value: &T) -> Result<()> {
    use std::io::Write;

    let buf = serde_json::to_vec_pretty(value)?;

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        "powershell" => Ok(clap_complete::Shell::PowerShell),
        "elvish" => Ok(clap_complete::Shell::Elvish),
        other => Err(exit::invalid_args(format!(
            "unsupported shell: {other} (expected bash|zsh|fish|powershell|elvish)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["knip-reporter", "--dry-run", "--comment-id", "x"])
            .expect("parse");
        assert!(cli.command.is_none());
        assert!(cli.dry_run);
        assert_eq!(cli.flags.comment_id.as_deref(), Some("x"));
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "knip-reporter",
            "render",
            "out.txt",
            "--json",
            "--no-annotations",
            "--timeout",
            "5",
        ])
        .expect("parse");
        let overrides = cli.flags.overrides();
        assert!(overrides.no_annotations);
        assert_eq!(overrides.timeout_secs, Some(5));
        match cli.command {
            Some(Commands::Render(args)) => {
                assert!(args.json);
                assert_eq!(args.input, PathBuf::from("out.txt"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_shells_are_argument_errors() {
        let err = parse_shell("nope").unwrap_err();
        assert_eq!(exit::exit_code(&err), 2);
        assert_eq!(parse_shell(" Zsh ").expect("zsh"), clap_complete::Shell::Zsh);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}

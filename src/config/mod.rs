use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::exit;

pub const CONFIG_PATH_ENV: &str = "KNIP_REPORTER_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionConfig {
    pub token: String,
    pub command_script_name: String,
    pub comment_id: String,
    pub ignore_results: bool,
    pub annotations: bool,
    pub verbose: bool,
    pub timeout_secs: u64,
    pub working_directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            command_script_name: "knip".to_string(),
            comment_id: String::new(),
            ignore_results: false,
            annotations: true,
            verbose: false,
            timeout_secs: 600,
            working_directory: PathBuf::from("."),
            config_path: None,
        }
    }
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub comment_id: Option<String>,
    pub command_script_name: Option<String>,
    pub ignore_results: bool,
    pub no_annotations: bool,
    pub verbose: bool,
    pub timeout_secs: Option<u64>,
    pub working_directory: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    action: Option<RawActionConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawActionConfig {
    token: Option<String>,
    command_script_name: Option<String>,
    comment_id: Option<String>,
    ignore_results: Option<bool>,
    annotations: Option<bool>,
    verbose: Option<bool>,
    timeout_secs: Option<u64>,
    working_directory: Option<PathBuf>,
}

/// Builds the effective config: defaults, TOML file, `INPUT_*` variables, flags.
pub fn load(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    overrides: &Overrides,
) -> Result<ActionConfig> {
    let mut cfg = ActionConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .or_else(|| non_empty(&env, CONFIG_PATH_ENV).map(PathBuf::from));
    if let Some(path) = path {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))
            .map_err(exit::invalid_args_err)?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("Failed to parse config file (TOML): {}", path.display()))
            .map_err(exit::invalid_args_err)?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg, &env).map_err(exit::invalid_args_err)?;
    apply_overrides(&mut cfg, overrides);

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut ActionConfig, raw: RawConfig) {
    let Some(action) = raw.action else {
        return;
    };
    if let Some(token) = action.token {
        cfg.token = token;
    }
    if let Some(name) = action.command_script_name {
        cfg.command_script_name = name;
    }
    if let Some(comment_id) = action.comment_id {
        cfg.comment_id = comment_id;
    }
    if let Some(ignore_results) = action.ignore_results {
        cfg.ignore_results = ignore_results;
    }
    if let Some(annotations) = action.annotations {
        cfg.annotations = annotations;
    }
    if let Some(verbose) = action.verbose {
        cfg.verbose = verbose;
    }
    if let Some(timeout_secs) = action.timeout_secs {
        cfg.timeout_secs = timeout_secs;
    }
    if let Some(dir) = action.working_directory {
        cfg.working_directory = dir;
    }
}

fn non_empty(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn apply_env_overrides(cfg: &mut ActionConfig, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(v) = non_empty(env, "INPUT_TOKEN").or_else(|| non_empty(env, "GITHUB_TOKEN")) {
        cfg.token = v;
    }
    if let Some(v) = non_empty(env, "INPUT_COMMAND_SCRIPT_NAME") {
        cfg.command_script_name = v;
    }
    if let Some(v) = non_empty(env, "INPUT_COMMENT_ID") {
        cfg.comment_id = v;
    }
    if let Some(v) = non_empty(env, "INPUT_IGNORE_RESULTS") {
        cfg.ignore_results = parse_bool(&v).context("INPUT_IGNORE_RESULTS")?;
    }
    if let Some(v) = non_empty(env, "INPUT_ANNOTATIONS") {
        cfg.annotations = parse_bool(&v).context("INPUT_ANNOTATIONS")?;
    }
    if let Some(v) = non_empty(env, "INPUT_VERBOSE") {
        cfg.verbose = parse_bool(&v).context("INPUT_VERBOSE")?;
    }
    if let Some(v) = non_empty(env, "INPUT_TIMEOUT") {
        cfg.timeout_secs = v.parse::<u64>().context("INPUT_TIMEOUT")?;
    }
    if let Some(v) = non_empty(env, "INPUT_WORKING_DIRECTORY") {
        cfg.working_directory = PathBuf::from(v);
    }
    Ok(())
}

fn apply_overrides(cfg: &mut ActionConfig, overrides: &Overrides) {
    if let Some(comment_id) = &overrides.comment_id {
        cfg.comment_id = comment_id.clone();
    }
    if let Some(name) = &overrides.command_script_name {
        cfg.command_script_name = name.clone();
    }
    if overrides.ignore_results {
        cfg.ignore_results = true;
    }
    if overrides.no_annotations {
        cfg.annotations = false;
    }
    if overrides.verbose {
        cfg.verbose = true;
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
        cfg.timeout_secs = timeout_secs;
    }
    if let Some(dir) = &overrides.working_directory {
        cfg.working_directory = dir.clone();
    }
}

/// Rejects configs that cannot drive a run.
pub fn validate(cfg: &ActionConfig, dry_run: bool) -> Result<()> {
    if cfg.comment_id.trim().is_empty() {
        return Err(exit::invalid_args(
            "comment_id is required (INPUT_COMMENT_ID or --comment-id)",
        ));
    }
    if !dry_run && cfg.token.trim().is_empty() {
        return Err(exit::invalid_args(
            "token is required (INPUT_TOKEN or GITHUB_TOKEN)",
        ));
    }
    if cfg.command_script_name.trim().is_empty() {
        return Err(exit::invalid_args("command_script_name must not be empty"));
    }
    if cfg.timeout_secs == 0 {
        return Err(exit::invalid_args("timeout must be greater than 0"));
    }
    Ok(())
}

/// Copy of `cfg` that is safe to print.
pub fn masked(cfg: &ActionConfig) -> ActionConfig {
    let mut out = cfg.clone();
    if !out.token.is_empty() {
        out.token = "###".to_string();
    }
    out
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn temp_config(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "knip-reporter-config-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("config.toml");
        std::fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let cfg = load(None, lookup(&[]), &Overrides::default()).expect("load");
        assert_eq!(cfg, ActionConfig::default());
        assert_eq!(cfg.command_script_name, "knip");
        assert!(cfg.annotations);
        assert_eq!(cfg.timeout_secs, 600);
    }

    #[test]
    fn env_overrides_file_and_flags_override_env() {
        let path = temp_config(
            "precedence",
            "[action]\ncomment_id = \"from-file\"\nverbose = true\ntimeout_secs = 30\n",
        );
        let env = lookup(&[
            ("INPUT_COMMENT_ID", "from-env"),
            ("INPUT_TIMEOUT", "45"),
            ("INPUT_ANNOTATIONS", "false"),
            ("INPUT_VERBOSE", ""),
        ]);
        let overrides = Overrides {
            timeout_secs: Some(90),
            ..Overrides::default()
        };

        let cfg = load(Some(&path), env, &overrides).expect("load");
        assert_eq!(cfg.comment_id, "from-env");
        assert!(cfg.verbose);
        assert!(!cfg.annotations);
        assert_eq!(cfg.timeout_secs, 90);
        assert_eq!(cfg.config_path, Some(path.display().to_string()));
    }

    #[test]
    fn config_path_can_come_from_the_environment() {
        let path = temp_config("env-path", "[action]\ncommand_script_name = \"lint:knip\"\n");
        let path_str = path.display().to_string();
        let cfg = load(
            None,
            lookup(&[(CONFIG_PATH_ENV, path_str.as_str())]),
            &Overrides::default(),
        )
        .expect("load");
        assert_eq!(cfg.command_script_name, "lint:knip");
    }

    #[test]
    fn token_falls_back_to_github_token() {
        let cfg = load(None, lookup(&[("GITHUB_TOKEN", "gh")]), &Overrides::default())
            .expect("load");
        assert_eq!(cfg.token, "gh");

        let cfg = load(
            None,
            lookup(&[("GITHUB_TOKEN", "gh"), ("INPUT_TOKEN", "input")]),
            &Overrides::default(),
        )
        .expect("load");
        assert_eq!(cfg.token, "input");
    }

    #[test]
    fn ignore_results_reads_its_own_input() {
        let cfg = load(
            None,
            lookup(&[("INPUT_COMMENT_ID", "knip"), ("INPUT_IGNORE_RESULTS", "yes")]),
            &Overrides::default(),
        )
        .expect("load");
        assert!(cfg.ignore_results);
        assert_eq!(cfg.comment_id, "knip");
    }

    #[test]
    fn invalid_values_are_argument_errors() {
        let err = load(None, lookup(&[("INPUT_VERBOSE", "maybe")]), &Overrides::default())
            .unwrap_err();
        assert_eq!(exit::exit_code(&err), 2);

        let path = temp_config("unknown", "[action]\ncolour = true\n");
        let err = load(Some(&path), lookup(&[]), &Overrides::default()).unwrap_err();
        assert_eq!(exit::exit_code(&err), 2);
    }

    #[test]
    fn validate_requires_comment_id_and_token() {
        let mut cfg = ActionConfig::default();
        assert!(validate(&cfg, true).is_err());

        cfg.comment_id = "knip-reporter".to_string();
        assert!(validate(&cfg, true).is_ok());
        assert!(validate(&cfg, false).is_err());

        cfg.token = "secret".to_string();
        assert!(validate(&cfg, false).is_ok());
    }

    #[test]
    fn masked_hides_the_token() {
        let cfg = ActionConfig {
            token: "secret".to_string(),
            ..ActionConfig::default()
        };
        assert_eq!(masked(&cfg).token, "###");
        assert_eq!(masked(&ActionConfig::default()).token, "");
    }
}

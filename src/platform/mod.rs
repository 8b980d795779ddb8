use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use wait_timeout::ChildExt;

use crate::exit;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `cmd` in `cwd`, killing it once `timeout` elapses.
///
/// Both pipes are drained on their own threads while waiting, so a child
/// writing more than a pipe buffer of output cannot stall.
pub fn run_command(cmd: &str, args: &[String], cwd: &Path, timeout: Duration) -> Result<CommandOutput> {
    let mut child = Command::new(cmd)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start process: {cmd}"))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match child
        .wait_timeout(timeout)
        .with_context(|| format!("Failed to wait for process: {cmd}"))?
    {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!("Timed out after {timeout:?}: {cmd}"));
        }
    };

    Ok(CommandOutput {
        exit_code: status.code().unwrap_or(-1),
        stdout: join(stdout),
        stderr: join(stderr),
    })
}

fn drain(mut pipe: impl Read + Send + 'static) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: Option<thread::JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    pub const fn binary(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Bun => "bun",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "npm" => Some(PackageManager::Npm),
            "pnpm" => Some(PackageManager::Pnpm),
            "yarn" => Some(PackageManager::Yarn),
            "bun" => Some(PackageManager::Bun),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    package_manager: Option<String>,
}

/// Picks the package manager from `package.json#packageManager`, then lockfiles.
pub fn detect_package_manager(dir: &Path) -> PackageManager {
    if let Some(pm) = declared_package_manager(dir) {
        return pm;
    }
    let lockfiles = [
        ("bun.lockb", PackageManager::Bun),
        ("bun.lock", PackageManager::Bun),
        ("pnpm-lock.yaml", PackageManager::Pnpm),
        ("yarn.lock", PackageManager::Yarn),
    ];
    lockfiles
        .into_iter()
        .find(|(file, _)| dir.join(file).is_file())
        .map(|(_, pm)| pm)
        .unwrap_or(PackageManager::Npm)
}

fn declared_package_manager(dir: &Path) -> Option<PackageManager> {
    let raw = std::fs::read_to_string(dir.join("package.json")).ok()?;
    let manifest: PackageJson = match serde_json::from_str(&raw) {
        Ok(manifest) => manifest,
        Err(err) => {
            tracing::debug!("ignoring unreadable package.json: {err}");
            return None;
        }
    };
    // "pnpm@9.1.0+sha256.abc" -> "pnpm"
    let declared = manifest.package_manager?;
    let name = declared.split('@').next().unwrap_or_default().trim();
    let pm = PackageManager::from_name(name);
    if pm.is_none() {
        tracing::warn!("unknown packageManager `{declared}` in package.json, detecting from lockfiles");
    }
    pm
}

/// `(program, args)` that runs `script` with knip's JSON reporter.
pub fn build_knip_command(pm: PackageManager, script: &str) -> (String, Vec<String>) {
    let mut args = vec!["run".to_string(), script.to_string()];
    if pm == PackageManager::Npm {
        args.push("--".to_string());
    }
    args.push("--reporter".to_string());
    args.push("json".to_string());
    (pm.binary().to_string(), args)
}

/// Runs knip through the project's package manager and returns its stdout.
///
/// knip exits non-zero whenever it has findings, so the exit status is only
/// logged.
pub fn run_knip(dir: &Path, script: &str, timeout: Duration) -> Result<String> {
    let pm = detect_package_manager(dir);
    let (program, args) = build_knip_command(pm, script);
    tracing::info!("Running: {program} {}", args.join(" "));

    let output = run_command(&program, &args, dir, timeout).map_err(exit::external_cmd_err)?;
    tracing::debug!(exit_code = output.exit_code, "knip finished");
    if !output.stderr.trim().is_empty() {
        tracing::warn!("knip stderr:\n{}", output.stderr.trim_end());
    }
    Ok(output.stdout)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI configuration: a `<home>/setting.json` settings file, layered under
//! a narrow set of environment-variable overrides, resolved into the fixed
//! paths the rest of the process reads from.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory: set DEESPEC_STATE_DIR or HOME")]
    NoStateDir,
    #[error("read setting.json: {0}")]
    Read(#[source] std::io::Error),
    #[error("parse setting.json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk `setting.json` shape. Every field is optional so a missing file,
/// or one written before a key existed, loads as all-defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    home: Option<String>,
    agent_bin: Option<String>,
    timeout_sec: Option<u64>,
    disable_recovery: bool,
    strict_fsync: bool,
    test_mode: bool,
    label_config: LabelConfig,
    /// Keys a prior revision read that this one no longer does. Present so
    /// loading an old file doesn't silently drop a setting its author
    /// still expects to matter.
    #[serde(flatten)]
    deprecated: std::collections::HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LabelConfig {
    template_dirs: Vec<String>,
    import: ImportConfig,
    validation: ValidationConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ImportConfig {
    max_line_count: Option<u64>,
    exclude_patterns: Vec<String>,
    auto_prefix_from_dir: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ValidationConfig {
    auto_sync_on_mismatch: bool,
    warn_on_large_files: bool,
}

const KNOWN_SETTING_KEYS: &[&str] = &[
    "home",
    "agent_bin",
    "timeout_sec",
    "disable_recovery",
    "strict_fsync",
    "test_mode",
    "label_config",
];

impl RawSettings {
    /// Loads `<home>/setting.json`, or defaults if it doesn't exist.
    fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Read(e)),
        };
        let settings: Self = serde_json::from_slice(&bytes)?;
        for key in settings.deprecated.keys() {
            if !KNOWN_SETTING_KEYS.contains(&key.as_str()) {
                warn!(key, path = %path.display(), "setting.json has an unrecognized key; ignoring");
            }
        }
        Ok(settings)
    }
}

/// Runtime configuration for one coordinator process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/deespec).
    pub state_dir: PathBuf,
    /// Path to the SQL lock store.
    pub lock_db_path: PathBuf,
    /// Path to the append-only journal.
    pub journal_path: PathBuf,
    /// Directory holding one durable state-store record per item.
    pub item_states_dir: PathBuf,
    /// Directory holding one durable execution record per item.
    pub executions_dir: PathBuf,
    /// Directory containing one prompt template file per step.
    pub prompts_dir: PathBuf,
    /// Executable invoked for each agent step.
    pub agent_command: String,
    /// Arguments passed to `agent_command`, with the prompt appended last.
    pub agent_args: Vec<String>,
    /// How long the coordinator waits between dispatch passes.
    pub poll_interval_secs: u64,
    /// How long a single agent invocation may run before timing out.
    pub agent_timeout_secs: u64,
    /// Skip the crash-recovery pass on startup (`setting.json: disable_recovery`).
    pub disable_recovery: bool,
    /// Fsync the journal's parent directory on every append, not just the
    /// file itself (`setting.json: strict_fsync`).
    pub strict_fsync: bool,
    /// Disable real journal/state side effects for harness runs
    /// (`setting.json: test_mode`).
    pub test_mode: bool,
    /// Extra template search roots from `setting.json: label_config.template_dirs`,
    /// consulted by the prompt builder ahead of `prompts_dir`.
    pub extra_template_dirs: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let env_state_dir = env_state_dir()?;
        let settings = RawSettings::load(&env_state_dir.join("setting.json"))?;
        let state_dir = settings
            .home
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or(env_state_dir);

        Ok(Self {
            lock_db_path: state_dir.join("locks.sqlite3"),
            journal_path: state_dir.join("journal.ndjson"),
            item_states_dir: state_dir.join("states"),
            executions_dir: state_dir.join("executions"),
            prompts_dir: std::env::var("DEESPEC_PROMPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| state_dir.join("prompts")),
            agent_command: std::env::var("DEESPEC_AGENT_COMMAND")
                .ok()
                .or(settings.agent_bin.clone())
                .unwrap_or_else(|| "claude".to_string()),
            agent_args: std::env::var("DEESPEC_AGENT_ARGS")
                .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            poll_interval_secs: std::env::var("DEESPEC_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            agent_timeout_secs: std::env::var("DEESPEC_AGENT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(settings.timeout_sec)
                .unwrap_or(60),
            disable_recovery: settings.disable_recovery,
            strict_fsync: settings.strict_fsync,
            test_mode: settings.test_mode,
            extra_template_dirs: settings.label_config.template_dirs.clone(),
            state_dir,
        })
    }
}

fn env_state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("DEESPEC_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("deespec"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/deespec"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// src/config/model.rs

use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use crate::types::CommandPrecedence;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [settings]
/// precedence = "inline"
/// summary_length = 80
///
/// [[hooks]]
/// name = "build"
/// workdir = "/srv/app"
/// command = "make build"
///
/// [[hooks]]
/// name = "deploy"
/// inline = "cat > /tmp/payload"
/// ```
///
/// Keys are also accepted capitalized (`[[Hooks]]`, `Name`, ...), which is
/// what older hook files use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour from `[settings]`.
    #[serde(default, alias = "Settings")]
    pub settings: SettingsSection,

    /// All hooks from `[[hooks]]`, in file order.
    #[serde(default, alias = "Hooks")]
    pub hooks: Vec<HookConfig>,
}

/// Validated configuration. Only constructed through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: SettingsSection,
    pub hooks: Vec<HookConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(settings: SettingsSection, hooks: Vec<HookConfig>) -> Self {
        Self { settings, hooks }
    }
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsSection {
    /// Which of `inline` / `command` wins when a hook sets both.
    #[serde(default, alias = "Precedence")]
    pub precedence: CommandPrecedence,

    /// Shell used for `inline` scripts.
    #[serde(default = "default_shell", alias = "Shell")]
    pub shell: String,

    /// Keep a prefix of each command's output for the outcome log line.
    #[serde(default = "default_capture_output", alias = "CaptureOutput")]
    pub capture_output: bool,

    /// Maximum number of characters of command / output shown in logs.
    #[serde(default = "default_summary_length", alias = "SummaryLength")]
    pub summary_length: usize,

    /// Optional cap on simultaneously running child processes.
    ///
    /// Unset means unbounded: every request spawns immediately.
    #[serde(default, alias = "MaxConcurrent")]
    pub max_concurrent: Option<usize>,
}

pub fn default_shell() -> String {
    if cfg!(windows) {
        "cmd".to_string()
    } else {
        "sh".to_string()
    }
}

fn default_capture_output() -> bool {
    true
}

fn default_summary_length() -> usize {
    80
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            precedence: CommandPrecedence::default(),
            shell: default_shell(),
            capture_output: default_capture_output(),
            summary_length: default_summary_length(),
            max_concurrent: None,
        }
    }
}

/// One `[[hooks]]` entry.
///
/// Empty strings are treated the same as a missing key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookConfig {
    /// Route segment: the hook is served at `POST /<name>`.
    #[serde(alias = "Name")]
    pub name: String,

    #[serde(default, alias = "Workdir", deserialize_with = "non_empty")]
    pub workdir: Option<String>,

    /// Whitespace-separated program and arguments; no shell expansion.
    #[serde(default, alias = "Command", deserialize_with = "non_empty")]
    pub command: Option<String>,

    /// Script body run through the configured shell.
    #[serde(default, alias = "Inline", deserialize_with = "non_empty")]
    pub inline: Option<String>,
}

impl HookConfig {
    pub fn workdir_path(&self) -> Option<PathBuf> {
        self.workdir.as_ref().map(PathBuf::from)
    }
}

fn non_empty<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

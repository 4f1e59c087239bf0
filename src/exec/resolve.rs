// src/exec/resolve.rs

//! Turning a hook definition into an argument vector.

use std::fmt;

use crate::config::SettingsSection;
use crate::hooks::HookDefinition;
use crate::types::CommandPrecedence;

/// A non-empty argument vector: `argv[0]` is the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    argv: Vec<String>,
}

impl CommandLine {
    /// Returns `None` for an empty vector.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// What a hook resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `[shell, "-c", script]`
    Inline(CommandLine),
    /// Whitespace-split tokens of `command`.
    External(CommandLine),
    /// Neither field set: the route answers without running anything.
    NoOp,
}

impl Resolution {
    pub fn command_line(&self) -> Option<&CommandLine> {
        match self {
            Resolution::Inline(cmd) | Resolution::External(cmd) => Some(cmd),
            Resolution::NoOp => None,
        }
    }
}

/// Builds argument vectors for hooks.
///
/// Never fails: a command that does not exist is only detected when the
/// process is spawned.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    shell: String,
    precedence: CommandPrecedence,
}

impl CommandResolver {
    pub fn new(shell: impl Into<String>, precedence: CommandPrecedence) -> Self {
        Self {
            shell: shell.into(),
            precedence,
        }
    }

    pub fn from_settings(settings: &SettingsSection) -> Self {
        Self::new(settings.shell.clone(), settings.precedence)
    }

    pub fn resolve(&self, hook: &HookDefinition) -> Resolution {
        let inline = hook.inline().map(|script| self.inline(script));
        let external = hook.command().and_then(external);

        let first = match self.precedence {
            CommandPrecedence::Inline => inline.or(external),
            CommandPrecedence::Command => external.or(inline),
        };
        first.unwrap_or(Resolution::NoOp)
    }

    fn inline(&self, script: &str) -> Resolution {
        let flag = if cfg!(windows) { "/C" } else { "-c" };
        Resolution::Inline(CommandLine {
            argv: vec![self.shell.clone(), flag.to_string(), script.to_string()],
        })
    }
}

impl Default for CommandResolver {
    fn default() -> Self {
        Self::from_settings(&SettingsSection::default())
    }
}

fn external(command: &str) -> Option<Resolution> {
    CommandLine::new(tokenize(command)).map(Resolution::External)
}

/// Split a command line on runs of whitespace. No quoting or escaping.
pub fn tokenize(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

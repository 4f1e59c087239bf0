#![allow(dead_code)]

use hookrun::config::{ConfigFile, HookConfig, RawConfigFile, SettingsSection};
use hookrun::types::CommandPrecedence;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                settings: SettingsSection::default(),
                hooks: Vec::new(),
            },
        }
    }

    pub fn with_hook(mut self, hook: HookConfig) -> Self {
        self.config.hooks.push(hook);
        self
    }

    pub fn precedence(mut self, precedence: CommandPrecedence) -> Self {
        self.config.settings.precedence = precedence;
        self
    }

    pub fn summary_length(mut self, len: usize) -> Self {
        self.config.settings.summary_length = len;
        self
    }

    pub fn capture_output(mut self, val: bool) -> Self {
        self.config.settings.capture_output = val;
        self
    }

    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.config.settings.max_concurrent = Some(n);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `HookConfig`.
pub struct HookConfigBuilder {
    hook: HookConfig,
}

impl HookConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            hook: HookConfig {
                name: name.to_string(),
                workdir: None,
                command: None,
                inline: None,
            },
        }
    }

    pub fn command(mut self, command: &str) -> Self {
        self.hook.command = Some(command.to_string());
        self
    }

    pub fn inline(mut self, script: &str) -> Self {
        self.hook.inline = Some(script.to_string());
        self
    }

    pub fn workdir(mut self, dir: &str) -> Self {
        self.hook.workdir = Some(dir.to_string());
        self
    }

    pub fn build(self) -> HookConfig {
        self.hook
    }
}

#![allow(dead_code)]

use std::collections::BTreeMap;

use procguard::config::{ConfigFile, RawConfigFile, RawRunSection};
use procguard::errors::Result;
use procguard::types::StdioMode;

/// `sh -c <script>` as a token list.
pub fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                run: RawRunSection::default(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.config.run.name = Some(name.to_string());
        self
    }

    pub fn cwd(mut self, cwd: &str) -> Self {
        self.config.run.cwd = Some(cwd.into());
        self
    }

    pub fn stream_output(mut self, val: bool) -> Self {
        self.config.run.stream_output = Some(val);
        self
    }

    pub fn stdout(mut self, sink: &str) -> Self {
        self.config.run.stdout = Some(sink.to_string());
        self
    }

    pub fn stderr(mut self, sink: &str) -> Self {
        self.config.run.stderr = Some(sink.to_string());
        self
    }

    pub fn stdin(mut self, mode: StdioMode) -> Self {
        self.config.run.stdin = Some(mode);
        self
    }

    pub fn grace_period(mut self, val: &str) -> Self {
        self.config.run.grace_period = Some(val.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config
            .run
            .env
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.config.run.env.extend(env);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

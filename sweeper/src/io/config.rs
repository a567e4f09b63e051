//! Sweeper configuration stored in `stack-sweeper.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "stack-sweeper.toml";

/// Sweeper configuration (TOML).
///
/// Everything here is optional; selection criteria come from the command
/// line, this file only tunes how the provider is driven.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweeperConfig {
    /// Seconds between status polls while waiting for a delete.
    pub poll_interval_secs: u64,

    pub aws: AwsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AwsConfig {
    /// Command prefix used to reach the provider (e.g. `["aws"]`).
    pub command: Vec<String>,

    /// Per-invocation wall-clock budget in seconds.
    pub command_timeout_secs: u64,

    /// Discard provider stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            command: vec!["aws".to_string()],
            command_timeout_secs: 5 * 60,
            output_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            aws: AwsConfig::default(),
        }
    }
}

impl SweeperConfig {
    pub fn validate(&self) -> Result<()> {
        if self.aws.command.is_empty() || self.aws.command[0].trim().is_empty() {
            return Err(anyhow!("aws.command must be a non-empty array"));
        }
        if self.aws.command_timeout_secs == 0 {
            return Err(anyhow!("aws.command_timeout_secs must be > 0"));
        }
        if self.aws.output_limit_bytes == 0 {
            return Err(anyhow!("aws.output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl AwsConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SweeperConfig::default()`.
pub fn load_config(path: &Path) -> Result<SweeperConfig> {
    if !path.exists() {
        return Ok(SweeperConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SweeperConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
///
/// The binary only reads its config; this seeds config files for tests.
#[cfg(any(test, feature = "test-support"))]
pub fn write_config(path: &Path, cfg: &SweeperConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

#[cfg(any(test, feature = "test-support"))]
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, SweeperConfig::default());
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.aws.command, vec!["aws"]);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("stack-sweeper.toml");
        let cfg = SweeperConfig {
            poll_interval_secs: 0,
            aws: AwsConfig {
                command: ["aws-vault", "exec", "dev", "--", "aws"]
                    .map(String::from)
                    .to_vec(),
                ..AwsConfig::default()
            },
        };
        write_config(&path, &cfg).expect("write");
        assert!(!path.with_extension("toml.tmp").exists());
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("stack-sweeper.toml");
        fs::write(&path, "[aws]\ncommand_timeout_secs = 30\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.poll_interval_secs, 5);
        assert_eq!(cfg.aws.command_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.aws.command, vec!["aws"]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("stack-sweeper.toml");
        fs::write(&path, "[aws]\ncommand = []\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("aws.command must be a non-empty array"));

        let zero_timeout = SweeperConfig {
            aws: AwsConfig {
                command_timeout_secs: 0,
                ..AwsConfig::default()
            },
            ..SweeperConfig::default()
        };
        assert!(write_config(&path, &zero_timeout).is_err());
    }

    #[test]
    fn malformed_toml_reports_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("stack-sweeper.toml");
        fs::write(&path, "poll_interval_secs = \"soon\"\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }
}

//! Policy configuration.
//!
//! A config file is a list of `key=value` lines; blank lines and `#`
//! comments are ignored:
//!
//! ```text
//! version=1
//! creation=file-size
//! cleaning.max_points=5
//! hybrid.mode=all
//! hybrid.max_size=1048576
//! hybrid.max_age_secs=86400
//! ```
//!
//! At most one `cleaning.*` key may be given. `hybrid.*` limits and
//! `rebase.threshold` are alternative hybrid policies and exclude each other.

use crate::backup::Backup;
use crate::error::{Error, Result};
use crate::policy::{
    AgeLimit, CombinedLimits, CountLimit, FileSizeCreation, HybridMode, Limit, LimitCleaning,
    RebaseOnThreshold, SizeLimit,
};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Creation policies that can be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreationKind {
    /// [`FileSizeCreation`]
    FileSize,
}

impl CreationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationKind::FileSize => "file-size",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "file-size" => Ok(CreationKind::FileSize),
            _ => Err(Error::invalid_config(format!(
                "Unknown creation policy: {}",
                s
            ))),
        }
    }
}

/// A single configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSpec {
    MaxPoints(usize),
    MaxSize(u64),
    MaxAgeSecs(u64),
}

impl LimitSpec {
    /// Parse `max_points`, `max_size` or `max_age_secs` with its value.
    fn parse(name: &str, value: &str) -> Result<Self> {
        match name {
            "max_points" => Ok(LimitSpec::MaxPoints(parse_number(name, value)?)),
            "max_size" => Ok(LimitSpec::MaxSize(parse_number(name, value)?)),
            "max_age_secs" => Ok(LimitSpec::MaxAgeSecs(parse_number(name, value)?)),
            _ => Err(Error::invalid_config(format!("Unknown limit: {}", name))),
        }
    }

    /// Build the described limit.
    pub fn build(&self) -> Box<dyn Limit> {
        match *self {
            LimitSpec::MaxPoints(max_points) => Box::new(CountLimit::new(max_points)),
            LimitSpec::MaxSize(max_size) => Box::new(SizeLimit::new(max_size)),
            LimitSpec::MaxAgeSecs(secs) => {
                let max_age = i64::try_from(secs)
                    .ok()
                    .and_then(TimeDelta::try_seconds)
                    .unwrap_or(TimeDelta::MAX);
                Box::new(AgeLimit::new(max_age))
            }
        }
    }
}

/// Limits combined into a [`CombinedLimits`] hybrid policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridSpec {
    pub mode: HybridMode,
    pub limits: Vec<LimitSpec>,
}

/// Policies to install on a backup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub creation: Option<CreationKind>,
    pub cleaning: Option<LimitSpec>,
    pub hybrid: Option<HybridSpec>,
    pub rebase_threshold: Option<u64>,
}

impl BackupConfig {
    /// Read and parse a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse config file content.
    pub fn parse(content: &str) -> Result<Self> {
        let mut version = None;
        let mut config = BackupConfig::default();
        let mut hybrid_mode = None;
        let mut hybrid_limits = Vec::new();

        for line in content.lines() {
            let line = line.split_once('#').map_or(line, |(before, _)| before).trim();
            if line.is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| Error::invalid_config(format!("Expected key=value: {}", line)))?;
            let (key, value) = (key.trim(), value.trim());

            match key.split_once('.') {
                None if key == "version" => version = Some(value),
                None if key == "creation" => config.creation = Some(CreationKind::parse(value)?),
                Some(("cleaning", limit)) => {
                    if config.cleaning.is_some() {
                        return Err(Error::invalid_config(
                            "Only one cleaning limit may be configured",
                        ));
                    }
                    config.cleaning = Some(LimitSpec::parse(limit, value)?);
                }
                Some(("hybrid", "mode")) => hybrid_mode = Some(HybridMode::parse(value)?),
                Some(("hybrid", limit)) => hybrid_limits.push(LimitSpec::parse(limit, value)?),
                Some(("rebase", "threshold")) => {
                    config.rebase_threshold = Some(parse_number(key, value)?)
                }
                _ => return Err(Error::invalid_config(format!("Unknown key: {}", key))),
            }
        }

        // Validate version
        if version != Some("1") {
            return Err(Error::invalid_config(format!(
                "Unsupported config version: {:?}",
                version
            )));
        }

        if !hybrid_limits.is_empty() {
            config.hybrid = Some(HybridSpec {
                mode: hybrid_mode.unwrap_or_default(),
                limits: hybrid_limits,
            });
        } else if hybrid_mode.is_some() {
            return Err(Error::invalid_config(
                "hybrid.mode requires at least one hybrid limit",
            ));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configured policies can be installed together.
    pub fn validate(&self) -> Result<()> {
        if self.hybrid.is_some() && self.rebase_threshold.is_some() {
            return Err(Error::invalid_config(
                "hybrid limits and rebase.threshold are mutually exclusive",
            ));
        }
        if self.rebase_threshold.is_some() && self.creation.is_none() {
            return Err(Error::invalid_config(
                "rebase.threshold requires a creation policy",
            ));
        }
        Ok(())
    }

    /// Install the configured policies on a backup.
    ///
    /// The cleaning policy is installed last, and like any newly set cleaning
    /// policy it is evaluated once right away.
    pub fn apply(&self, backup: &mut Backup) -> Result<()> {
        self.validate()?;

        if let Some(CreationKind::FileSize) = self.creation {
            backup.set_creation_policy(FileSizeCreation);
        }

        if let Some(hybrid) = &self.hybrid {
            let policy = hybrid
                .limits
                .iter()
                .fold(CombinedLimits::new(hybrid.mode), |policy, spec| {
                    policy.with_boxed(spec.build())
                });
            backup.set_hybrid_policy(policy);
        } else if let Some(threshold) = self.rebase_threshold {
            backup.set_hybrid_policy(RebaseOnThreshold::new(threshold));
        }

        if let Some(spec) = &self.cleaning {
            backup.set_cleaning_policy(LimitCleaning::from_boxed(spec.build()))?;
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::invalid_config(format!("Invalid number for {}: {}", key, value)))
}

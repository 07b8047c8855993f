use crate::error::{ConfigError, Result as SentinelResult, SentinelError};
use crate::scanners::ScannerKind;
use crate::validation::{
    validate_days, validate_percentage, validate_positive, validate_region, validate_threshold,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run configuration, loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Region to scan
    pub region: String,
    /// Ask the AWS Price List API before the default price tables
    pub prefer_online_pricing: bool,
    /// Concurrent metric fetches per scanner
    pub concurrency: usize,
    pub retry: RetryConfig,
    pub ec2: Ec2Settings,
    pub ebs: EbsSettings,
    pub rds: RdsSettings,
    pub s3: S3Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per provider call for throttled requests
    pub max_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ec2Settings {
    pub enabled: bool,
    pub days: u32,
    /// Average CPU percent at or below which an instance is idle
    pub cpu_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EbsSettings {
    pub enabled: bool,
    pub days: u32,
    /// Total read + write operations at or below which a volume is low I/O
    pub io_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RdsSettings {
    pub enabled: bool,
    pub days: u32,
    pub cpu_threshold: f64,
    /// Average connections at or below which an instance is idle
    pub connections_threshold: f64,
    /// Manual snapshots older than this are flagged
    pub snapshot_max_age_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Settings {
    pub enabled: bool,
    pub days: u32,
    /// Total requests at or below which a bucket is unused
    pub request_threshold: u64,
    /// Storage class used to price bucket contents
    pub storage_class: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            prefer_online_pricing: true,
            concurrency: 8,
            retry: RetryConfig::default(),
            ec2: Ec2Settings::default(),
            ebs: EbsSettings::default(),
            rds: RdsSettings::default(),
            s3: S3Settings::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl Default for Ec2Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            days: 14,
            cpu_threshold: 5.0,
        }
    }
}

impl Default for EbsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            days: 14,
            io_threshold: 100.0,
        }
    }
}

impl Default for RdsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            days: 14,
            cpu_threshold: 5.0,
            connections_threshold: 1.0,
            snapshot_max_age_days: 90,
        }
    }
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            days: 30,
            request_threshold: 10,
            storage_class: "STANDARD".to_string(),
        }
    }
}

impl Ec2Settings {
    pub fn validate(&self) -> SentinelResult<()> {
        validate_days("ec2.days", self.days)?;
        validate_percentage("ec2.cpu_threshold", self.cpu_threshold)
    }
}

impl EbsSettings {
    pub fn validate(&self) -> SentinelResult<()> {
        validate_days("ebs.days", self.days)?;
        validate_threshold("ebs.io_threshold", self.io_threshold)
    }
}

impl RdsSettings {
    pub fn validate(&self) -> SentinelResult<()> {
        validate_days("rds.days", self.days)?;
        validate_percentage("rds.cpu_threshold", self.cpu_threshold)?;
        validate_threshold("rds.connections_threshold", self.connections_threshold)?;
        if self.snapshot_max_age_days < 0 {
            return Err(crate::error::SentinelError::Validation {
                field: "rds.snapshot_max_age_days".to_string(),
                reason: format!(
                    "Snapshot age cannot be negative, got: {}",
                    self.snapshot_max_age_days
                ),
            });
        }
        Ok(())
    }
}

impl S3Settings {
    pub fn validate(&self) -> SentinelResult<()> {
        validate_days("s3.days", self.days)
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .cost-sentinel.toml in current dir, then ~/.config/cost-sentinel/config.toml
            let local = PathBuf::from(".cost-sentinel.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("cost-sentinel").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(".cost-sentinel.toml"))
            }
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            let config = toml::from_str::<Config>(&content)
                .map_err(|e| SentinelError::Config(ConfigError::ParseError(e.to_string())))
                .with_context(|| {
                    let mut err = format!("Failed to parse config: {}", config_path.display());
                    err.push_str("\n  Common issues:");
                    err.push_str("\n    - Invalid TOML syntax");
                    err.push_str("\n    - Incorrect value types (days must be an integer)");
                    err.push_str("\n  Tip: Run 'cost-sentinel init' to create a new config file");
                    err
                })?;
            config
                .validate()
                .map_err(|e| match e {
                    SentinelError::Validation { field, reason } => {
                        SentinelError::Config(ConfigError::invalid(field, reason))
                    }
                    other => other,
                })
                .with_context(|| format!("Invalid config: {}", config_path.display()))?;
            Ok(config)
        } else if path.is_some() {
            Err(SentinelError::Config(ConfigError::NotFound(
                config_path.display().to_string(),
            ))
            .into())
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Check every setting; the first invalid one is reported
    pub fn validate(&self) -> SentinelResult<()> {
        validate_region(&self.region)?;
        validate_positive("concurrency", self.concurrency)?;
        validate_positive("retry.max_attempts", self.retry.max_attempts as usize)?;
        self.ec2.validate()?;
        self.ebs.validate()?;
        self.rds.validate()?;
        self.s3.validate()?;
        Ok(())
    }

    /// Override the lookback window of every scanner
    pub fn set_days(&mut self, days: u32) {
        self.ec2.days = days;
        self.ebs.days = days;
        self.rds.days = days;
        self.s3.days = days;
    }

    /// Enable only the given scanners
    pub fn select_scanners(&mut self, kinds: &[ScannerKind]) {
        self.ec2.enabled = kinds.contains(&ScannerKind::Ec2);
        self.ebs.enabled = kinds.contains(&ScannerKind::Ebs);
        self.rds.enabled = kinds.contains(&ScannerKind::Rds);
        self.s3.enabled = kinds.contains(&ScannerKind::S3);
    }

    /// Enabled scanners in run order
    pub fn enabled_scanners(&self) -> Vec<ScannerKind> {
        let mut kinds = Vec::new();
        if self.ec2.enabled {
            kinds.push(ScannerKind::Ec2);
        }
        if self.ebs.enabled {
            kinds.push(ScannerKind::Ebs);
        }
        if self.rds.enabled {
            kinds.push(ScannerKind::Rds);
        }
        if self.s3.enabled {
            kinds.push(ScannerKind::S3);
        }
        kinds
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    let config = Config::default();
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::{codes, exit_code_for_anyhow};
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.ec2.days, 14);
        assert_eq!(config.ec2.cpu_threshold, 5.0);
        assert_eq!(config.ebs.io_threshold, 100.0);
        assert_eq!(config.rds.connections_threshold, 1.0);
        assert_eq!(config.rds.snapshot_max_age_days, 90);
        assert_eq!(config.s3.days, 30);
        assert_eq!(config.s3.request_threshold, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let mut config = Config::default();
        config.region = "eu-west-1".to_string();
        config.rds.snapshot_max_age_days = 30;
        assert!(config.save(&config_path).is_ok());
        assert!(config_path.exists());

        let loaded = Config::load(Some(&config_path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        std::fs::write(
            &config_path,
            "region = \"ap-south-1\"\n\n[ec2]\ncpu_threshold = 10.0\n",
        )
        .unwrap();

        let config = Config::load(Some(&config_path)).unwrap();
        assert_eq!(config.region, "ap-south-1");
        assert_eq!(config.ec2.cpu_threshold, 10.0);
        assert_eq!(config.ec2.days, 14);
        assert!(config.ec2.enabled);
        assert_eq!(config.rds, RdsSettings::default());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let fake_path = temp_dir.path().join("nonexistent.toml");

        let err = Config::load(Some(&fake_path)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SentinelError>(),
            Some(SentinelError::Config(ConfigError::NotFound(_)))
        ));
        assert_eq!(exit_code_for_anyhow(&err), codes::CONFIG_ERROR);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "invalid toml content {").unwrap();

        let err = Config::load(Some(&config_path)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SentinelError>(),
            Some(SentinelError::Config(ConfigError::ParseError(_)))
        ));
        assert_eq!(exit_code_for_anyhow(&err), codes::CONFIG_ERROR);
    }

    #[test]
    fn test_config_load_rejects_invalid_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad_threshold.toml");
        std::fs::write(&config_path, "[ebs]\nio_threshold = -1.0\n").unwrap();

        let err = Config::load(Some(&config_path)).unwrap_err();
        match err.downcast_ref::<SentinelError>() {
            Some(SentinelError::Config(ConfigError::InvalidValue { field, .. })) => {
                assert_eq!(field, "ebs.io_threshold");
            }
            other => panic!("expected invalid config value, got {:?}", other),
        }
        assert_eq!(exit_code_for_anyhow(&err), codes::CONFIG_ERROR);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.region = "mars-1".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ebs.io_threshold = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rds.snapshot_max_age_days = -5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.set_days(7);
        assert_eq!(config.ebs.days, 7);
        assert_eq!(config.s3.days, 7);

        config.select_scanners(&[ScannerKind::Ebs, ScannerKind::S3]);
        assert_eq!(
            config.enabled_scanners(),
            vec![ScannerKind::Ebs, ScannerKind::S3]
        );
    }

    #[test]
    fn test_init_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("init_test.toml");

        assert!(init_config(&config_path).is_ok());
        let config = Config::load(Some(&config_path)).unwrap();
        assert_eq!(config, Config::default());
    }
}

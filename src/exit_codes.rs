//! Process exit codes
//!
//! - `0` = Success
//! - `1` = User error (invalid flag or threshold)
//! - `2` = System error (AWS API failure, I/O error)
//! - `3` = Configuration error (invalid or unparseable config)

use crate::error::SentinelError;

pub mod codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 1;
    pub const SYSTEM_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
}

/// Map a `SentinelError` to an exit code
pub fn exit_code_for_error(error: &SentinelError) -> i32 {
    use SentinelError::*;
    match error {
        Config(_) => codes::CONFIG_ERROR,
        Validation { .. } => codes::USER_ERROR,
        CloudProvider { .. } | Aws(_) | Io(_) | Retryable { .. } => codes::SYSTEM_ERROR,
        Json(_) | Toml(_) => codes::SYSTEM_ERROR,
    }
}

/// Exit code for an error surfaced through `anyhow`
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<SentinelError>() {
        Some(e) => exit_code_for_error(e),
        None => codes::SYSTEM_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_exit_codes() {
        let config = SentinelError::Config(ConfigError::invalid("region", "bad"));
        assert_eq!(exit_code_for_error(&config), codes::CONFIG_ERROR);

        let validation = SentinelError::Validation {
            field: "days".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(exit_code_for_error(&validation), codes::USER_ERROR);

        let aws = SentinelError::Aws("AccessDenied".to_string());
        assert_eq!(exit_code_for_error(&aws), codes::SYSTEM_ERROR);
    }

    #[test]
    fn test_exit_code_through_anyhow() {
        let err = anyhow::Error::new(SentinelError::Validation {
            field: "days".to_string(),
            reason: "too large".to_string(),
        });
        assert_eq!(exit_code_for_anyhow(&err), codes::USER_ERROR);
        let not_found = anyhow::Error::new(SentinelError::Config(ConfigError::NotFound(
            "sentinel.toml".to_string(),
        )))
        .context("Failed to load config");
        assert_eq!(exit_code_for_anyhow(&not_found), codes::CONFIG_ERROR);
        assert_eq!(
            exit_code_for_anyhow(&anyhow::anyhow!("something else")),
            codes::SYSTEM_ERROR
        );
        assert_ne!(codes::SUCCESS, codes::SYSTEM_ERROR);
    }
}

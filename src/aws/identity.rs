use super::sdk_error;
use crate::error::{Result, SentinelError};
use aws_config::SdkConfig;

/// Account id of the current credentials
pub async fn caller_account_id(sdk_config: &SdkConfig) -> Result<String> {
    let client = aws_sdk_sts::Client::new(sdk_config);
    let identity = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| sdk_error("sts:GetCallerIdentity", e))?;
    identity
        .account()
        .map(str::to_string)
        .ok_or_else(|| SentinelError::Aws("sts:GetCallerIdentity returned no account".to_string()))
}

//! Principal identity resolution.
//!
//! The analysis needs two views of the same principal: the ARN (for the
//! policy simulator) and the IAM user name (for the policy store). The
//! ARN comes from the session's caller identity unless overridden on the
//! command line; the user name is extracted from it.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use aws_sdk_sts::error::DisplayErrorContext;

/// The IAM user whose permissions are being analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalIdentity {
    pub arn: String,
    pub user_name: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0}")]
    Api(String),

    #[error("Caller identity response carried no ARN")]
    MissingArn,

    #[error("Not an IAM user ARN: {0} (only user principals can be analyzed)")]
    NotAUser(String),
}

impl PrincipalIdentity {
    /// Builds an identity from an IAM user ARN such as
    /// `arn:aws:iam::123456789012:user/path/Alice`.
    pub fn from_arn(arn: &str) -> Result<Self, IdentityError> {
        static USER_ARN: OnceLock<Regex> = OnceLock::new();

        let re = USER_ARN.get_or_init(|| {
            Regex::new(r"^arn:[^:]+:iam::\d{12}:user(?:/.+)?/([^/]+)$").expect("valid pattern")
        });

        let captures = re
            .captures(arn)
            .ok_or_else(|| IdentityError::NotAUser(arn.to_string()))?;

        Ok(Self {
            arn: arn.to_string(),
            user_name: captures[1].to_string(),
        })
    }

    /// Resolves the session's caller identity via STS.
    pub async fn resolve_caller(config: &aws_config::SdkConfig) -> Result<Self, IdentityError> {
        let client = aws_sdk_sts::Client::new(config);

        let output = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| IdentityError::Api(format!("{}", DisplayErrorContext(e))))?;

        let arn = output.arn().ok_or(IdentityError::MissingArn)?;
        log::debug!("Caller identity: {}", arn);

        Self::from_arn(arn)
    }
}

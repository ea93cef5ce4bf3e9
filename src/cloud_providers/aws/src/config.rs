use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use config::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Where AWS credentials come from. The pricing lookups and the savings table
/// may use different regions but always share this source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AwsCredentials {
    Profile(String),
    RoleArn(String),
    #[default]
    Env,
}

impl fmt::Display for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwsCredentials::Profile(profile) => write!(f, "profile:{}", profile),
            AwsCredentials::RoleArn(role) => write!(f, "role_arn:{}", role),
            AwsCredentials::Env => write!(f, "env"),
        }
    }
}

// Lets the config loader use the enum as a default value.
impl From<AwsCredentials> for ValueKind {
    fn from(value: AwsCredentials) -> Self {
        let single = |key: &str, val: String| {
            let mut table = HashMap::new();
            table.insert(key.to_string(), Value::new(None, ValueKind::String(val)));
            ValueKind::Table(table)
        };

        match value {
            AwsCredentials::Profile(profile) => single("profile", profile),
            AwsCredentials::RoleArn(role) => single("role_arn", role),
            AwsCredentials::Env => ValueKind::String("env".to_string()),
        }
    }
}

/// Bounds every SDK operation, retries included, by `timeout`.
pub fn operation_timeout_config(timeout: Duration) -> TimeoutConfig {
    TimeoutConfig::builder().operation_timeout(timeout).build()
}

/// Loads an SDK config for `region` from the given credential source and
/// checks that credentials can actually be produced.
pub async fn load_sdk_config(
    credentials: AwsCredentials,
    region: impl Into<String>,
    timeout: Duration,
) -> Option<SdkConfig> {
    let loader = aws_config::defaults(BehaviorVersion::latest())
        .timeout_config(operation_timeout_config(timeout));
    let loader = match credentials {
        AwsCredentials::Profile(profile) => {
            tracing::debug!(%profile, "Loading AWS config from profile");
            loader.profile_name(profile)
        }
        AwsCredentials::RoleArn(arn) => {
            tracing::debug!(%arn, "Assuming role for AWS config");
            let provider = aws_config::sts::AssumeRoleProvider::builder(&arn)
                .session_name("volprice-session")
                .build()
                .await;

            match provider.provide_credentials().await {
                Ok(creds) => loader.credentials_provider(creds),
                Err(err) => {
                    tracing::warn!(%arn, ?err, "Failed to assume role");
                    return None;
                }
            }
        }
        AwsCredentials::Env => {
            tracing::debug!("Loading AWS config from the environment");
            loader
        }
    };

    let config = loader.region(Region::new(region.into())).load().await;
    let provider = config.credentials_provider()?;

    match provider.provide_credentials().await {
        Ok(_) => Some(config),
        Err(err) => {
            tracing::warn!(?err, "No usable AWS credentials");
            None
        }
    }
}

/// Tries the configured source first and falls back to the environment.
pub async fn resolve_sdk_config(
    credentials: AwsCredentials,
    region: &str,
    timeout: Duration,
) -> Option<SdkConfig> {
    if credentials != AwsCredentials::Env {
        let source = credentials.to_string();
        if let Some(conf) = load_sdk_config(credentials, region, timeout).await {
            tracing::info!(%source, region, "Resolved AWS credentials");
            return Some(conf);
        }
        tracing::warn!(%source, "Falling back to environment credentials");
    }

    let conf = load_sdk_config(AwsCredentials::Env, region, timeout).await;
    if conf.is_none() {
        tracing::warn!(region, "Could not resolve AWS credentials");
    }
    conf
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as RConfig, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use volprice_aws::config::AwsCredentials;
use volprice_common::constants::{
    DEFAULT_LISTINGS_TABLE, DEFAULT_OFFERS_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SAVINGS_MAX_ATTEMPTS, DEFAULT_SAVINGS_TABLE, DEFAULT_SERVICE_CODE, PRICING_API_REGION,
};

pub const ENV_PREFIX: &str = "VOLPRICE";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub offers_base_url: String,
    pub service_code: String,
    pub pricing_api_region: String,
    pub request_timeout_secs: u64,
    pub retry_attempts: usize,

    pub aws_credentials: AwsCredentials,

    pub savings_table: String,
    pub savings_max_attempts: u32,

    pub listings_table: String,
    pub listings_region: String,

    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the optional TOML file, then `VOLPRICE_*` variables.
    pub fn load_config(path: Option<&str>) -> Result<Config> {
        let mut builder = RConfig::builder()
            .set_default("offers_base_url", DEFAULT_OFFERS_BASE_URL)?
            .set_default("service_code", DEFAULT_SERVICE_CODE)?
            .set_default("pricing_api_region", PRICING_API_REGION)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?
            .set_default("retry_attempts", 0)?
            .set_default("aws_credentials", AwsCredentials::Env)?
            .set_default("savings_table", DEFAULT_SAVINGS_TABLE)?
            .set_default("savings_max_attempts", DEFAULT_SAVINGS_MAX_ATTEMPTS)?
            .set_default("listings_table", DEFAULT_LISTINGS_TABLE)?
            .set_default("listings_region", PRICING_API_REGION)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        if let Some(path) = path {
            builder = builder.add_source(File::new(path, FileFormat::Toml).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        builder
            .build()
            .with_context(|| match path {
                Some(path) => format!("failed to load config from {path}"),
                None => "failed to load config".to_string(),
            })?
            .try_deserialize()
            .context("failed to parse config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_defaults() {
        let config = ConfigLoader::load_config(None).unwrap();

        assert_eq!(config.offers_base_url, DEFAULT_OFFERS_BASE_URL);
        assert_eq!(config.service_code, "AmazonEC2");
        assert_eq!(config.pricing_api_region, "us-east-1");
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.retry_attempts, 0);
        assert_eq!(config.aws_credentials, AwsCredentials::Env);
        assert_eq!(config.savings_table, "VolumesSavingsTracker");
        assert_eq!(config.savings_max_attempts, 5);
        assert_eq!(config.listings_table, "VolumePricing");
        assert_eq!(config.listings_region, "us-east-1");
        assert_eq!(config.log_level, "info");
        assert!(config.log_file.is_none());
    }

    #[test]
    #[serial]
    fn test_toml_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
offers_base_url = "http://127.0.0.1:9000"
retry_attempts = 3
savings_table = "SavingsTest"
listings_region = "us-gov-west-1"
log_file = "/tmp/volprice.log"

[aws_credentials]
profile = "pricing"
"#
        )
        .unwrap();

        let config = ConfigLoader::load_config(file.path().to_str()).unwrap();

        assert_eq!(config.offers_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.savings_table, "SavingsTest");
        assert_eq!(config.listings_region, "us-gov-west-1");
        assert_eq!(config.listings_table, "VolumePricing");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/volprice.log")));
        assert_eq!(
            config.aws_credentials,
            AwsCredentials::Profile("pricing".into())
        );
        assert_eq!(config.service_code, "AmazonEC2");
    }

    #[test]
    #[serial]
    fn test_missing_file_is_an_error() {
        assert!(ConfigLoader::load_config(Some("/nonexistent/volprice.toml")).is_err());
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "savings_max_attempts = 2").unwrap();

        std::env::set_var("VOLPRICE_SAVINGS_MAX_ATTEMPTS", "9");
        let config = ConfigLoader::load_config(file.path().to_str());
        std::env::remove_var("VOLPRICE_SAVINGS_MAX_ATTEMPTS");

        assert_eq!(config.unwrap().savings_max_attempts, 9);
    }
}

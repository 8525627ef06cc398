use std::env;
use std::time::Duration;

use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::campaign_client::{CampaignClient, CampaignCredentials};
use crate::submission::RetryPolicy;

#[derive(Debug, serde::Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub campaign: CampaignSettings,
}

#[derive(Debug, serde::Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

/// Upstream campaign provider settings. The credentials are only ever
/// supplied through the environment (`APP_CAMPAIGN__CLIENT_ID` and friends);
/// their absence is a per-request error, never a startup failure.
#[derive(Debug, serde::Deserialize)]
pub struct CampaignSettings {
    pub token_url: String,
    pub subscribe_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub list_key: Option<SecretString>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_retries: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub backoff_milliseconds: u64,
}

impl CampaignSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.backoff_milliseconds),
        }
    }

    pub fn client(&self) -> CampaignClient {
        let token_url = self
            .token_url
            .as_str()
            .try_into()
            .expect("Failed to parse the token url");
        let subscribe_url = self
            .subscribe_url
            .as_str()
            .try_into()
            .expect("Failed to parse the subscribe url");
        let credentials = CampaignCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: self.refresh_token.clone(),
            list_key: self.list_key.clone(),
        };
        CampaignClient::new(token_url, subscribe_url, credentials, self.timeout())
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use `local` or `production`."
            )),
        }
    }
}

/// Layered configuration: `configuration/base.yaml`, then the
/// environment-specific file, then `APP_`-prefixed environment variables
/// (`APP_CAMPAIGN__LIST_KEY=...` maps to `Settings.campaign.list_key`).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let configuration_directory = env::current_dir()
        .expect("Failed to determine the current directory")
        .join("configuration");

    let environment: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");
    let environment_file = format!("{}.yaml", environment.as_str());

    config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_file),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

use std::{
    ops::{Deref, DerefMut},
    time::Duration,
};

use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::domain::CaptureEmail;

/// Client for the upstream campaign provider: the OAuth token endpoint and
/// the bulk-subscribe endpoint, both form-encoded.
pub struct CampaignClient {
    http_client: Client,
    token_url: Url,
    subscribe_url: Url,
    credentials: CampaignCredentials,
}

pub struct Url(reqwest::Url);

impl Deref for Url {
    type Target = reqwest::Url;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Url {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl TryFrom<&str> for Url {
    type Error = String;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match reqwest::Url::parse(value) {
            Ok(url) => Ok(Self(url)),
            Err(e) => Err(format!("Failed to parse the url: {}", e)),
        }
    }
}

/// Campaign credentials, environment-supplied. Any of them may be absent;
/// that is only an error at submission time, per request.
#[derive(Debug, Default)]
pub struct CampaignCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub list_key: Option<SecretString>,
}

impl CampaignCredentials {
    fn client_id(&self) -> Result<&str, CampaignError> {
        self.client_id
            .as_deref()
            .ok_or(CampaignError::MissingCredential("client_id"))
    }

    fn client_secret(&self) -> Result<&SecretString, CampaignError> {
        self.client_secret
            .as_ref()
            .ok_or(CampaignError::MissingCredential("client_secret"))
    }

    fn refresh_token(&self) -> Result<&SecretString, CampaignError> {
        self.refresh_token
            .as_ref()
            .ok_or(CampaignError::MissingCredential("refresh_token"))
    }

    fn list_key(&self) -> Result<&SecretString, CampaignError> {
        self.list_key
            .as_ref()
            .ok_or(CampaignError::MissingCredential("list_key"))
    }
}

/// A short-lived access token. Created on demand for one submission and
/// dropped with it; never cached across submissions.
pub struct OAuthSession {
    access_token: SecretString,
    obtained_at: DateTime<Utc>,
}

impl OAuthSession {
    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CampaignError {
    #[error("missing campaign credential: {0}")]
    MissingCredential(&'static str),
    #[error("token endpoint rejected the refresh request: {0}")]
    TokenRejected(String),
    #[error("failed to reach the campaign provider")]
    Transport(#[from] reqwest::Error),
    #[error("subscribe call failed with HTTP {0}")]
    SubscribeStatus(hyper::StatusCode),
    #[error("provider rejected the subscription: code {code}: {message}")]
    ProviderCode { code: String, message: String },
    #[error("provider response was not valid JSON")]
    MalformedResponse(#[source] reqwest::Error),
}

impl CampaignError {
    /// Only transport-level faults are worth retrying. Application errors,
    /// auth failures and missing configuration never are.
    pub fn is_transient(&self) -> bool {
        match self {
            CampaignError::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl CampaignClient {
    pub fn new(
        token_url: Url,
        subscribe_url: Url,
        credentials: CampaignCredentials,
        time_out: Duration,
    ) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(time_out)
                .build()
                .expect("Failed to build the campaign client"),
            token_url,
            subscribe_url,
            credentials,
        }
    }

    /// Exchange the configured refresh token for a fresh access token.
    ///
    /// # Errors
    ///
    /// Fails without touching the network if any credential is absent; this
    /// is a configuration fault, not a transient one.
    #[instrument(name = "Refresh Zoho access token", skip(self))]
    pub async fn acquire_token(&self) -> Result<OAuthSession, CampaignError> {
        let client_id = self.credentials.client_id()?;
        let client_secret = self.credentials.client_secret()?;
        let refresh_token = self.credentials.refresh_token()?;

        let url = self.token_url.join("token").unwrap();
        let response = self
            .http_client
            .post(url)
            .form(&[
                ("refresh_token", refresh_token.expose_secret()),
                ("client_id", client_id),
                ("client_secret", client_secret.expose_secret()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CampaignError::TokenRejected(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(CampaignError::MalformedResponse)?;

        match (body.access_token, body.error) {
            (Some(access_token), _) => {
                let session = OAuthSession {
                    access_token: SecretString::new(access_token.into_boxed_str()),
                    obtained_at: Utc::now(),
                };
                tracing::debug!(obtained_at = %session.obtained_at, "access token refreshed");
                Ok(session)
            }
            (None, Some(error)) => Err(CampaignError::TokenRejected(error)),
            (None, None) => Err(CampaignError::TokenRejected(
                "response carried no access_token".into(),
            )),
        }
    }

    /// Add one address to the configured mailing list.
    ///
    /// # Errors
    ///
    /// This call will time out once the client's timeout has elapsed.
    #[instrument(name = "Bulk subscribe with Zoho Campaigns", skip(self, session), fields(subscriber_email = %email))]
    pub async fn bulk_subscribe(
        &self,
        session: &OAuthSession,
        email: &CaptureEmail,
    ) -> Result<(), CampaignError> {
        use hyper::header::AUTHORIZATION;

        let list_key = self.credentials.list_key()?;
        let url = self.subscribe_url.join("json/listsubscribe").unwrap();

        let response = self
            .http_client
            .post(url)
            .header(
                AUTHORIZATION,
                format!("Zoho-oauthtoken {}", session.access_token.expose_secret()),
            )
            .form(&[
                ("resfmt", "JSON"),
                ("listkey", list_key.expose_secret()),
                ("emailids", email.as_ref()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CampaignError::SubscribeStatus(status));
        }

        let body: SubscribeResponse = response
            .json()
            .await
            .map_err(CampaignError::MalformedResponse)?;

        if body.is_success() {
            Ok(())
        } else {
            Err(CampaignError::ProviderCode {
                code: body.code_string(),
                message: body.message.unwrap_or_default(),
            })
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct SubscribeResponse {
    code: Option<serde_json::Value>,
    message: Option<String>,
}

impl SubscribeResponse {
    // Zoho reports `code` as the string "0" on success; tolerate a bare
    // number as well.
    fn is_success(&self) -> bool {
        match &self.code {
            Some(serde_json::Value::String(code)) => code == "0",
            Some(serde_json::Value::Number(code)) => code.as_i64() == Some(0),
            _ => false,
        }
    }

    fn code_string(&self) -> String {
        self.code
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "absent".into())
    }
}

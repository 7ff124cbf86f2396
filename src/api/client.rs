//! Tesla owner API client
//!
//! Thin wrapper over reqwest: builds vehicle URLs, attaches the bearer token,
//! and turns empty or non-JSON bodies into fatal errors. Token exchanges go
//! through [`ConnectionRetry`].

use super::retry::ConnectionRetry;
use super::types::{TokenErrorResponse, TokenResponse};
use crate::config::ApiConfig;
use crate::error::{AuthError, Error, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Maximum length of a response body quoted in an error message
const MAX_ERROR_BODY_LENGTH: usize = 500;

const REFRESH_SCOPE: &str = "openid email offline_access";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// OAuth grant sent to the token endpoint
pub enum Grant<'a> {
    Password { email: &'a str, password: &'a str },
    RefreshToken(&'a str),
}

impl Grant<'_> {
    fn form(&self, client_id: &str, client_secret: Option<&str>) -> Vec<(&'static str, String)> {
        let mut form = vec![("client_id", client_id.to_string())];
        match self {
            Grant::Password { email, password } => {
                form.push(("grant_type", "password".to_string()));
                if let Some(secret) = client_secret {
                    form.push(("client_secret", secret.to_string()));
                }
                form.push(("email", email.to_string()));
                form.push(("password", password.to_string()));
            }
            Grant::RefreshToken(token) => {
                form.push(("grant_type", "refresh_token".to_string()));
                form.push(("refresh_token", token.to_string()));
                form.push(("scope", REFRESH_SCOPE.to_string()));
            }
        }
        form
    }

    fn kind(&self) -> &'static str {
        match self {
            Grant::Password { .. } => "password",
            Grant::RefreshToken(_) => "refresh_token",
        }
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    token_url: Url,
    client_id: String,
    client_secret: Option<String>,
    retry: ConnectionRetry,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL '{}': {}", config.base_url, e)))?;
        let token_url = Url::parse(&config.token_url)
            .map_err(|e| Error::Config(format!("invalid token URL '{}': {}", config.token_url, e)))?;

        let client = Client::builder().user_agent(&config.user_agent).build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            token_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            retry: config.retry,
        })
    }

    /// Build the full URL for a path below the vehicles collection
    pub fn vehicles_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Execute an authenticated request and parse the JSON body.
    ///
    /// The body is returned regardless of HTTP status; the owner API reports
    /// failures through an `error` field that callers inspect.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        token: &str,
        form: &[(String, String)],
    ) -> Result<Value> {
        let url = self.vehicles_url(path);
        debug!("Sending {} Request: {}; Data: {:?}", method, url, form);

        let request = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url).form(form),
        };
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Err(Error::EmptyResponse { url });
        }

        let json: Value = serde_json::from_str(&body).map_err(|_| {
            Error::InvalidResponse(format!("HTTP {} from {}: {}", status, url, truncate_body(&body)))
        })?;
        debug!(
            "Response from {}: {}",
            url,
            serde_json::to_string_pretty(&json).unwrap_or_default()
        );
        Ok(json)
    }

    /// Exchange a grant for a new token pair.
    ///
    /// Connection failures are retried; a refusal from the server is not.
    pub async fn exchange_token(&self, grant: &Grant<'_>) -> Result<TokenResponse> {
        let form = grant.form(&self.client_id, self.client_secret.as_deref());
        debug!("Requesting token with {} grant from {}", grant.kind(), self.token_url);

        let response = self
            .retry
            .run(|| self.client.post(self.token_url.clone()).form(&form).send())
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|_| {
                AuthError::Rejected(format!("unexpected token response: {}", truncate_body(&body))).into()
            });
        }

        let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => err.message(),
            Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
            Err(_) => format!("HTTP {}: {}", status, truncate_body(&body)),
        };
        Err(AuthError::Rejected(message).into())
    }
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

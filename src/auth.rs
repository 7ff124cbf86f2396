//! Bearer token lifecycle
//!
//! Tokens come from, in order: the stored access token while it is fresh,
//! a refresh-token exchange, or a password grant. Every newly minted pair is
//! written to the credential store before it is used.

use crate::api::Grant;
use crate::error::{AuthError, Result};
use crate::session::Session;
use crate::store::now_truncated;
use chrono::{Datelike, Duration, NaiveDateTime};
use keyring::Entry;
use std::env;
use tracing::{debug, info, warn};

const SERVICE_NAME: &str = "teslactl";
const PASSWORD_ENV: &str = "TESLA_PASSWORD";

/// Hosts without a battery-backed RTC (fake-hwclock) can boot with a date
/// years in the past. Before this year the token age cannot be judged, so a
/// stored token is used as-is; a later run with a corrected clock will
/// refresh it if needed.
pub const CLOCK_SANITY_YEAR: i32 = 2019;

/// Settings that drive token acquisition for one invocation
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub email: Option<String>,
    /// Password from the config file, if any
    pub config_password: Option<String>,
    /// Refresh token supplied on the command line or environment
    pub refresh_token: Option<String>,
    /// Rotate the access token even if it is still fresh
    pub force_refresh: bool,
    pub lifetime: Duration,
    pub use_keychain: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            email: None,
            config_password: None,
            refresh_token: None,
            force_refresh: false,
            lifetime: Duration::days(30),
            use_keychain: true,
        }
    }
}

/// Whether a stored access token may be used without refreshing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Expired,
    /// Host clock reads before [`CLOCK_SANITY_YEAR`]
    ClockUnreliable,
}

/// Judge a token issued at `issued_at` against `now`.
///
/// Tokens without an issue time predate timestamp tracking and are assumed
/// fresh; `--force-refresh` rotates them.
pub fn freshness(issued_at: Option<NaiveDateTime>, now: NaiveDateTime, lifetime: Duration) -> Freshness {
    if now.year() < CLOCK_SANITY_YEAR {
        return Freshness::ClockUnreliable;
    }
    match issued_at {
        Some(issued_at) if now - issued_at >= lifetime => Freshness::Expired,
        _ => Freshness::Fresh,
    }
}

/// Return a usable bearer token, minting and persisting a new one if needed
pub async fn get_token(session: &mut Session) -> Result<String> {
    let credential = session.store.credential();

    if !session.auth.force_refresh && !credential.access_token.is_empty() {
        match freshness(credential.issued_at, now_truncated(), session.auth.lifetime) {
            Freshness::Fresh => return Ok(credential.access_token.clone()),
            Freshness::ClockUnreliable => {
                warn!(
                    "System clock reads before {}; using stored access token without checking its age",
                    CLOCK_SANITY_YEAR
                );
                return Ok(credential.access_token.clone());
            }
            Freshness::Expired => info!("Stored access token has expired"),
        }
    }

    let stored_refresh = Some(credential.refresh_token.clone()).filter(|t| !t.is_empty());
    let refresh_token = stored_refresh.or_else(|| session.auth.refresh_token.clone().filter(|t| !t.is_empty()));

    let tokens = if let Some(refresh_token) = refresh_token {
        info!("Refreshing api token");
        session
            .client
            .exchange_token(&Grant::RefreshToken(&refresh_token))
            .await?
    } else if let Some((email, password)) = password_credentials(&session.auth) {
        info!("Requesting api token with account credentials");
        session
            .client
            .exchange_token(&Grant::Password {
                email: &email,
                password: &password.password,
            })
            .await?
    } else {
        return Err(AuthError::NoCredentials.into());
    };

    let mut credential = session.store.credential().clone();
    credential.rotate(tokens.access_token, tokens.refresh_token);
    session.store.save(credential)?;
    session.auth.force_refresh = false;
    debug!("Stored new token pair in {}", session.store.path().display());

    Ok(session.store.credential().access_token.clone())
}

/// Password source information for debugging
#[derive(Debug, Clone, PartialEq)]
pub enum PasswordSource {
    Environment,
    ConfigFile,
    Keychain,
}

impl std::fmt::Display for PasswordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordSource::Environment => write!(f, "environment variable ({})", PASSWORD_ENV),
            PasswordSource::ConfigFile => write!(f, "config file"),
            PasswordSource::Keychain => write!(f, "system keychain"),
        }
    }
}

/// Result of password retrieval with source information
pub struct PasswordResult {
    pub password: String,
    pub source: PasswordSource,
}

fn password_credentials(settings: &AuthSettings) -> Option<(String, PasswordResult)> {
    let email = settings.email.clone().filter(|e| !e.is_empty())?;
    let password = get_password_with_source(&email, settings)?;
    debug!("Using password from {}", password.source);
    Some((email, password))
}

/// Get the account password from environment variable, config file, or keychain
pub fn get_password_with_source(email: &str, settings: &AuthSettings) -> Option<PasswordResult> {
    // 1. First check environment variable
    if let Ok(password) = env::var(PASSWORD_ENV) {
        if !password.is_empty() {
            return Some(PasswordResult {
                password,
                source: PasswordSource::Environment,
            });
        }
    }

    // 2. Then check config file
    if let Some(password) = settings.config_password.clone().filter(|p| !p.is_empty()) {
        return Some(PasswordResult {
            password,
            source: PasswordSource::ConfigFile,
        });
    }

    // 3. Finally check keychain (unless disabled)
    if settings.use_keychain {
        match get_password_from_keychain(email) {
            Ok(password) => {
                return Some(PasswordResult {
                    password,
                    source: PasswordSource::Keychain,
                })
            }
            Err(e) => debug!("Keychain lookup failed ({})", e),
        }
    }

    None
}

/// Get password for `email` from the system keychain
pub fn get_password_from_keychain(email: &str) -> std::result::Result<String, keyring::Error> {
    Entry::new(SERVICE_NAME, email)?.get_password()
}

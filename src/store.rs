//! Durable credential record
//!
//! The record lives in a small JSON file that is read once at startup and
//! rewritten whenever a token is minted or the vehicle identity changes.

use crate::error::Result;
use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Format used for every timestamp written to the state file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Tokens and vehicle identity persisted between invocations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub access_token: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub refresh_token: String,
    /// Server-assigned `id_s`, used in every vehicle URL
    #[serde(default, rename = "id", with = "opaque_id")]
    pub internal_id: Option<String>,
    #[serde(default, with = "opaque_id")]
    pub vehicle_id: Option<String>,
    #[serde(
        default,
        rename = "token_created_at",
        with = "timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub issued_at: Option<NaiveDateTime>,
    /// Keys this tool does not know about, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credential {
    /// Replace both tokens at once and stamp the issue time
    pub fn rotate(&mut self, access_token: String, refresh_token: Option<String>) {
        self.access_token = access_token;
        if let Some(refresh_token) = refresh_token {
            self.refresh_token = refresh_token;
        }
        self.issued_at = Some(now_truncated());
    }
}

/// Current UTC time with sub-second precision dropped, matching what the
/// state file can represent
pub fn now_truncated() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Owns the credential record and its backing file
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    credential: Credential,
}

impl CredentialStore {
    /// Load the record at `path`.
    ///
    /// A missing file is created with default contents. A file that cannot
    /// be parsed is logged and replaced by defaults in memory; it is only
    /// overwritten on the next save.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let credential = match fs::read(&path) {
            Ok(content) => {
                debug!(path = %path.display(), "loading state file");
                match serde_json::from_slice(&content) {
                    Ok(credential) => credential,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "state file is malformed, using defaults");
                        Credential::default()
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "state file didn't exist, writing defaults");
                let credential = Credential::default();
                write_atomic(&path, &credential)?;
                credential
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, credential })
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the record and persist it immediately
    pub fn save(&mut self, credential: Credential) -> Result<()> {
        write_atomic(&self.path, &credential)?;
        self.credential = credential;
        Ok(())
    }
}

fn write_atomic(path: &Path, credential: &Credential) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(credential)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    debug!(path = %path.display(), "writing state file");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Tokens cleared by hand are sometimes written as `null`
fn null_as_empty<'de, D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids come back from the server as numbers or strings depending on the
/// endpoint; `0`, `""` and `null` all mean "not resolved yet".
mod opaque_id {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(id: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.serialize_str(id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(from_value(&Value::deserialize(deserializer)?))
    }

    pub fn from_value(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_u64() != Some(0) => Some(n.to_string()),
            _ => None,
        }
    }
}

pub use opaque_id::from_value as opaque_id_from_value;

/// Only strings in [`TIMESTAMP_FORMAT`] become timestamps; anything else is
/// treated as absent.
mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(ts: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok(),
            _ => None,
        })
    }
}

//! Per-invocation session state
//!
//! A `Session` is built once per process run and passed by `&mut` through the
//! token, resolution, wake and dispatch layers. It owns the credential store;
//! nothing else keeps a copy of the credential across a save.

use crate::api::ApiClient;
use crate::auth::AuthSettings;
use crate::store::CredentialStore;

/// Optional VIN/display-name override that forces re-resolution
#[derive(Debug, Clone, Default)]
pub struct VehicleSelector {
    pub vin: Option<String>,
    pub name: Option<String>,
}

impl VehicleSelector {
    /// Empty strings (e.g. an exported but blank `TESLA_VIN`) count as absent
    pub fn new(vin: Option<String>, name: Option<String>) -> Self {
        Self {
            vin: vin.filter(|v| !v.is_empty()),
            name: name.filter(|n| !n.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vin.is_none() && self.name.is_none()
    }
}

impl std::fmt::Display for VehicleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.vin, &self.name) {
            (Some(vin), Some(name)) => write!(f, "VIN {} / name {}", vin, name),
            (Some(vin), None) => write!(f, "VIN {}", vin),
            (None, Some(name)) => write!(f, "name {}", name),
            (None, None) => write!(f, "(none)"),
        }
    }
}

pub struct Session {
    pub store: CredentialStore,
    pub client: ApiClient,
    pub auth: AuthSettings,
    pub selector: VehicleSelector,
}

impl Session {
    pub fn new(store: CredentialStore, client: ApiClient, auth: AuthSettings, selector: VehicleSelector) -> Self {
        Self {
            store,
            client,
            auth,
            selector,
        }
    }
}

//! Shared fixtures for tests that talk to a mock owner API

use crate::api::retry::ConnectionRetry;
use crate::api::ApiClient;
use crate::auth::AuthSettings;
use crate::config::ApiConfig;
use crate::session::{Session, VehicleSelector};
use crate::store::{now_truncated, Credential, CredentialStore};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const VEHICLES_PATH: &str = "/api/1/vehicles";
pub const INTERNAL_ID: &str = "12345678901234567";
pub const VEHICLE_ID: &str = "1234567890";

/// API settings pointing at `server`, without retry delays
pub fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: format!("{}{}", server.uri(), VEHICLES_PATH),
        token_url: format!("{}/oauth2/v3/token", server.uri()),
        user_agent: "teslactl-test".to_string(),
        retry: ConnectionRetry::with_config(4, Duration::ZERO),
        ..ApiConfig::default()
    }
}

/// A session with `credential` stored in a fresh temp dir, talking to a new
/// mock server. Keep the `TempDir` alive for the duration of the test.
pub async fn session_with(credential: Credential) -> (Session, MockServer, TempDir) {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut store = CredentialStore::load(dir.path().join("tesla_api.json")).unwrap();
    store.save(credential).unwrap();

    let client = ApiClient::new(&api_config(&server)).unwrap();
    let auth = AuthSettings {
        use_keychain: false,
        ..AuthSettings::default()
    };

    let session = Session::new(store, client, auth, VehicleSelector::default());
    (session, server, dir)
}

/// Credential with a fresh token and an already-resolved vehicle
pub fn resolved_credential() -> Credential {
    Credential {
        access_token: "at-1".to_string(),
        refresh_token: "rt-1".to_string(),
        internal_id: Some(INTERNAL_ID.to_string()),
        vehicle_id: Some(VEHICLE_ID.to_string()),
        issued_at: Some(now_truncated()),
        ..Credential::default()
    }
}

/// Token endpoint answering a refresh of `refresh_token` with a new pair
pub fn token_mock(refresh_token: &str, new_access: &str, new_refresh: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/oauth2/v3/token"))
        .and(body_string_contains(format!("refresh_token={}", refresh_token)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": new_access,
            "refresh_token": new_refresh,
            "expires_in": 28800
        })))
}

pub fn vehicle_json(id_s: &str, vehicle_id: u64, vin: &str, name: &str, state: &str) -> Value {
    json!({
        "id": id_s.parse::<u64>().unwrap_or(0),
        "id_s": id_s,
        "vehicle_id": vehicle_id,
        "vin": vin,
        "display_name": name,
        "state": state
    })
}

/// List-vehicles endpoint returning `vehicles`
pub fn list_mock(vehicles: Vec<Value>) -> Mock {
    let count = vehicles.len();
    Mock::given(method("GET"))
        .and(path(VEHICLES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": vehicles,
            "count": count
        })))
}

/// Wake endpoint reporting `state` for the test vehicle
pub fn wake_mock(state: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path(format!("{}/{}/wake_up", VEHICLES_PATH, INTERNAL_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": { "id_s": INTERNAL_ID, "state": state }
        })))
}

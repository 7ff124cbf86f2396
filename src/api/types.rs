use crate::store::opaque_id_from_value;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Vehicle entry returned by the list-vehicles endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Vehicle {
    /// String form of the internal id, used in vehicle URLs
    pub id_s: String,
    #[serde(deserialize_with = "string_or_number")]
    pub vehicle_id: String,
    pub vin: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl Vehicle {
    pub fn online_state(&self) -> OnlineState {
        OnlineState::from_state(self.state.as_deref())
    }
}

/// Envelope around list-vehicles results
#[derive(Debug, Deserialize)]
pub struct VehicleList {
    pub response: Vec<Vehicle>,
}

/// Identity of the selected vehicle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleIdentity {
    pub vin: String,
    pub display_name: Option<String>,
    pub internal_id: String,
    pub vehicle_id: String,
}

impl From<&Vehicle> for VehicleIdentity {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            vin: vehicle.vin.clone(),
            display_name: vehicle.display_name.clone(),
            internal_id: vehicle.id_s.clone(),
            vehicle_id: vehicle.vehicle_id.clone(),
        }
    }
}

/// Reachability of a vehicle as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnlineState {
    Asleep,
    Online,
    Unknown,
}

impl OnlineState {
    pub fn from_state(state: Option<&str>) -> Self {
        match state {
            Some("online") => OnlineState::Online,
            Some("asleep") => OnlineState::Asleep,
            _ => OnlineState::Unknown,
        }
    }
}

impl std::fmt::Display for OnlineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnlineState::Asleep => write!(f, "asleep"),
            OnlineState::Online => write!(f, "online"),
            OnlineState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Body of the wake_up command. `response` is null when the token is bad.
#[derive(Debug, Deserialize)]
pub struct WakeResponse {
    #[serde(default)]
    pub response: Option<WakeState>,
}

#[derive(Debug, Deserialize)]
pub struct WakeState {
    #[serde(default)]
    pub state: Option<String>,
}

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Error body of the token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

impl TokenErrorResponse {
    pub fn message(self) -> String {
        match self.error_description {
            Some(description) => format!("{}: {}", self.error, description),
            None => self.error,
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    opaque_id_from_value(&value).ok_or_else(|| serde::de::Error::custom("expected a non-empty id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vehicle_list_parsing() {
        let list: VehicleList = serde_json::from_value(json!({
            "response": [{
                "id": 12345678901234567u64,
                "id_s": "12345678901234567",
                "vehicle_id": 1234567890,
                "vin": "5YJ3E1EA7KF000001",
                "display_name": "Red Car",
                "state": "asleep"
            }],
            "count": 1
        }))
        .unwrap();

        let vehicle = &list.response[0];
        assert_eq!(vehicle.vehicle_id, "1234567890");
        assert_eq!(vehicle.online_state(), OnlineState::Asleep);

        let identity = VehicleIdentity::from(vehicle);
        assert_eq!(identity.internal_id, "12345678901234567");
        assert_eq!(identity.display_name.as_deref(), Some("Red Car"));
    }

    #[test]
    fn test_online_state_mapping() {
        assert_eq!(OnlineState::from_state(Some("online")), OnlineState::Online);
        assert_eq!(OnlineState::from_state(Some("offline")), OnlineState::Unknown);
        assert_eq!(OnlineState::from_state(None), OnlineState::Unknown);
        assert_eq!(OnlineState::Asleep.to_string(), "asleep");
    }

    #[test]
    fn test_wake_response_with_null_body() {
        let wake: WakeResponse = serde_json::from_value(json!({ "response": null })).unwrap();
        assert!(wake.response.is_none());
    }

    #[test]
    fn test_token_response_ignores_lifetime_fields() {
        let tokens: TokenResponse = serde_json::from_value(json!({
            "access_token": "at-2",
            "expires_in": 28800,
            "token_type": "Bearer"
        }))
        .unwrap();
        assert_eq!(tokens.access_token, "at-2");
        assert_eq!(tokens.refresh_token, None);
    }

    #[test]
    fn test_token_error_message() {
        let err: TokenErrorResponse = serde_json::from_value(json!({
            "error": "invalid_grant",
            "error_description": "refresh_token is invalid"
        }))
        .unwrap();
        assert_eq!(err.message(), "invalid_grant: refresh_token is invalid");
    }
}

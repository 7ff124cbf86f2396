//! Map a VIN or display name to the vehicle's internal id

use crate::api::{HttpMethod, Vehicle, VehicleIdentity, VehicleList};
use crate::auth;
use crate::commands::check_server_error;
use crate::error::{Error, ResolutionError, Result};
use crate::session::{Session, VehicleSelector};
use tracing::{debug, info};

/// Return the internal id of the selected vehicle.
///
/// A cached id is returned without any request unless the session carries a
/// VIN/name override. Otherwise the account's vehicles are listed, the match
/// is stored in the credential record, and its internal id returned.
pub async fn resolve(session: &mut Session) -> Result<String> {
    if session.selector.is_empty() {
        let credential = session.store.credential();
        if let (Some(internal_id), Some(_)) = (&credential.internal_id, &credential.vehicle_id) {
            debug!("Using cached vehicle ID {}", internal_id);
            return Ok(internal_id.clone());
        }
    }

    let vehicles = list_vehicles(session).await?;
    let identity = VehicleIdentity::from(select_vehicle(&vehicles, &session.selector)?);
    info!(
        "Retrieved Vehicle ID {} (VIN {}, name {}) from Tesla API",
        identity.internal_id,
        identity.vin,
        identity.display_name.as_deref().unwrap_or("-")
    );

    let mut credential = session.store.credential().clone();
    if credential.internal_id.as_deref() != Some(identity.internal_id.as_str())
        || credential.vehicle_id.as_deref() != Some(identity.vehicle_id.as_str())
    {
        credential.internal_id = Some(identity.internal_id.clone());
        credential.vehicle_id = Some(identity.vehicle_id.clone());
        session.store.save(credential)?;
    }

    Ok(identity.internal_id)
}

/// Fetch every vehicle on the account. Does not wake anything.
pub async fn list_vehicles(session: &mut Session) -> Result<Vec<Vehicle>> {
    let token = auth::get_token(session).await?;
    let body = session.client.send(HttpMethod::Get, "", &token, &[]).await?;
    let body = check_server_error(body)?;
    let list: VehicleList = serde_json::from_value(body)
        .map_err(|e| Error::InvalidResponse(format!("unexpected vehicle list: {}", e)))?;
    Ok(list.response)
}

/// Pick the vehicle matching `selector`.
///
/// VIN matches win over display-name matches. Without a selector the account
/// must hold exactly one vehicle.
pub fn select_vehicle<'a>(vehicles: &'a [Vehicle], selector: &VehicleSelector) -> Result<&'a Vehicle> {
    if selector.is_empty() {
        return match vehicles {
            [] => Err(ResolutionError::NoVehicles.into()),
            [only] => Ok(only),
            _ => Err(ResolutionError::AmbiguousVehicle(vehicles.len()).into()),
        };
    }

    let by_vin = selector
        .vin
        .as_deref()
        .and_then(|vin| vehicles.iter().find(|v| v.vin == vin));
    let by_name = || {
        selector
            .name
            .as_deref()
            .and_then(|name| vehicles.iter().find(|v| v.display_name.as_deref() == Some(name)))
    };

    by_vin
        .or_else(by_name)
        .ok_or_else(|| ResolutionError::UnknownVehicle(selector.to_string()).into())
}

//! Operation dispatch
//!
//! `invoke` walks the preconditions an operation declares in the registry
//! (vehicle id, online state), sends its request, and shapes the result.

pub mod args;
pub mod registry;

pub use args::Arguments;
pub use registry::{Operation, Output};

use crate::api::{OnlineState, VehicleList};
use crate::auth;
use crate::error::{DispatchError, Error, ResolutionError, Result};
use crate::resolver;
use crate::session::Session;
use crate::wake::{self, WakePolicy};
use serde_json::Value;
use tracing::{debug, info};

/// Run the operation called `name` with `args`.
///
/// Unknown names and bad arguments fail before any request is made.
pub async fn invoke(session: &mut Session, name: &str, args: &Arguments, policy: &WakePolicy) -> Result<Value> {
    let op = registry::lookup(name).ok_or_else(|| DispatchError::UnknownOperation(name.to_string()))?;
    let form = build_form(op, args)?;
    info!("Calling {}({})...", op.name, args);

    let internal_id = if op.requires_vehicle_id {
        Some(resolver::resolve(session).await?)
    } else {
        None
    };

    if let (true, Some(id)) = (op.requires_online, internal_id.as_deref()) {
        let outcome = wake::ensure_online(session, id, policy).await?;
        debug!("Vehicle online after {} wake attempt(s)", outcome.attempts);
    }

    let body = execute(session, op, internal_id.as_deref(), &form).await?;

    if op.output == Output::ToggleSentry {
        let enabled = bool_at(&body, "/response/sentry_mode")?;
        let next = if enabled { "disable_sentry_mode" } else { "enable_sentry_mode" };
        let next = registry::lookup(next).ok_or_else(|| DispatchError::UnknownOperation(next.to_string()))?;
        let form = build_form(next, &Arguments::default())?;
        let body = execute(session, next, internal_id.as_deref(), &form).await?;
        return render(next.output, body, session);
    }

    render(op.output, body, session)
}

/// Check caller arguments against the operation and build the form body
fn build_form(op: &Operation, args: &Arguments) -> Result<Vec<(String, String)>> {
    if let Some(extra) = args.keys().find(|key| !op.params.iter().any(|p| p == key)) {
        return Err(DispatchError::UnexpectedArgument {
            operation: op.name,
            argument: extra.to_string(),
        }
        .into());
    }

    let mut form = Vec::with_capacity(op.params.len() + op.body.len());
    for &param in op.params {
        let value = args.get(param).ok_or(DispatchError::MissingArgument {
            operation: op.name,
            argument: param,
        })?;
        form.push((param.to_string(), value.to_string()));
    }
    form.extend(op.body.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    Ok(form)
}

async fn execute(
    session: &mut Session,
    op: &Operation,
    internal_id: Option<&str>,
    form: &[(String, String)],
) -> Result<Value> {
    let path = match internal_id {
        Some(id) => op.path.replace("{id}", &urlencoding::encode(id)),
        None => op.path.to_string(),
    };
    let token = auth::get_token(session).await?;
    let body = session.client.send(op.method, &path, &token, form).await?;
    check_server_error(body)
}

/// Fail with the server's message if the body carries a non-null `error`
pub fn check_server_error(body: Value) -> Result<Value> {
    match body.get("error") {
        None | Some(Value::Null) => Ok(body),
        Some(Value::String(error)) => {
            let message = match body.get("error_description").and_then(Value::as_str) {
                Some(description) if !description.is_empty() => format!("{}: {}", error, description),
                _ => error.clone(),
            };
            Err(DispatchError::Server(message).into())
        }
        Some(_) => Err(DispatchError::Server(body.to_string()).into()),
    }
}

fn render(output: Output, body: Value, session: &Session) -> Result<Value> {
    match output {
        Output::Body | Output::ToggleSentry => Ok(body),
        Output::Field(pointer) => field(&body, pointer).cloned(),
        Output::Integer(pointer) => {
            let value = field(&body, pointer)?;
            value
                .as_f64()
                .map(|n| Value::from(n.trunc() as i64))
                .ok_or_else(|| Error::InvalidResponse(format!("{} is not a number: {}", pointer, value)))
        }
        Output::SentryMessage { enabled } => {
            let ok = bool_at(&body, "/response/result")?;
            let message = match (enabled, ok) {
                (true, true) => "Success: Sentry Mode Enabled",
                (true, false) => "Failed to Enable Sentry Mode",
                (false, true) => "Success: Sentry Mode Disabled",
                (false, false) => "Failed to Disable Sentry Mode",
            };
            Ok(Value::from(message))
        }
        Output::VehicleState | Output::VehicleOnline => {
            let list: VehicleList = serde_json::from_value(body)
                .map_err(|e| Error::InvalidResponse(format!("unexpected vehicle list: {}", e)))?;
            let credential = session.store.credential();
            let wanted = credential.vehicle_id.as_deref().unwrap_or_default();
            let vehicle = list
                .response
                .iter()
                .find(|v| v.vehicle_id == wanted)
                .ok_or_else(|| ResolutionError::UnknownVehicle(format!("vehicle_id {}", wanted)))?;

            Ok(match output {
                Output::VehicleOnline => Value::Bool(vehicle.online_state() == OnlineState::Online),
                _ => vehicle.state.clone().map(Value::from).unwrap_or(Value::Null),
            })
        }
    }
}

fn field<'a>(body: &'a Value, pointer: &str) -> Result<&'a Value> {
    body.pointer(pointer)
        .ok_or_else(|| Error::InvalidResponse(format!("response has no {}", pointer)))
}

fn bool_at(body: &Value, pointer: &str) -> Result<bool> {
    let value = field(body, pointer)?;
    value
        .as_bool()
        .ok_or_else(|| Error::InvalidResponse(format!("{} is not a boolean: {}", pointer, value)))
}

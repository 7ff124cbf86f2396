//! Static table of every operation the CLI can invoke

use crate::api::HttpMethod;

/// How to turn a response body into the operation's result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// The full response body
    Body,
    /// A single value, addressed by JSON pointer
    Field(&'static str),
    /// A numeric value truncated to an integer
    Integer(&'static str),
    /// `response.result` rendered as a sentry-mode message
    SentryMessage { enabled: bool },
    /// Read `response.sentry_mode`, then run the opposite sentry command
    ToggleSentry,
    /// State string of the session's vehicle in the vehicle list
    VehicleState,
    /// Whether the session's vehicle is online, from the vehicle list
    VehicleOnline,
}

/// Typed descriptor of one remote operation
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path below the vehicles collection; `{id}` is the internal id
    pub path: &'static str,
    pub requires_vehicle_id: bool,
    pub requires_online: bool,
    /// Fixed form fields sent with the request
    pub body: &'static [(&'static str, &'static str)],
    /// Caller-supplied arguments, all required
    pub params: &'static [&'static str],
    pub output: Output,
    pub about: &'static str,
}

const fn list(name: &'static str, output: Output, about: &'static str) -> Operation {
    Operation {
        name,
        method: HttpMethod::Get,
        path: "",
        requires_vehicle_id: !matches!(output, Output::Body),
        requires_online: false,
        body: &[],
        params: &[],
        output,
        about,
    }
}

const fn get(name: &'static str, path: &'static str, output: Output, about: &'static str) -> Operation {
    Operation {
        name,
        method: HttpMethod::Get,
        path,
        requires_vehicle_id: true,
        requires_online: true,
        body: &[],
        params: &[],
        output,
        about,
    }
}

const fn command(
    name: &'static str,
    path: &'static str,
    body: &'static [(&'static str, &'static str)],
    params: &'static [&'static str],
    output: Output,
    about: &'static str,
) -> Operation {
    Operation {
        name,
        method: HttpMethod::Post,
        path,
        requires_vehicle_id: true,
        requires_online: true,
        body,
        params,
        output,
        about,
    }
}

const VEHICLE_STATE: &str = "{id}/data_request/vehicle_state";
const SET_SENTRY_MODE: &str = "{id}/command/set_sentry_mode";
const RESULT: Output = Output::Field("/response/result");

pub static OPERATIONS: &[Operation] = &[
    list("list_vehicles", Output::Body, "List vehicles on the account (does not wake them)"),
    list(
        "get_vehicle_online_state",
        Output::VehicleState,
        "Report the vehicle's state without waking it",
    ),
    list("is_vehicle_online", Output::VehicleOnline, "Check whether the vehicle is online without waking it"),
    get("wake_up_vehicle", "{id}", Output::Field("/response/state"), "Wake the vehicle and report its state"),
    get("get_vehicle_summary", "{id}", Output::Body, "Vehicle summary"),
    get("get_vehicle_data", "{id}/vehicle_data", Output::Body, "All vehicle data"),
    get("get_vehicle_legacy_data", "{id}/data", Output::Body, "All vehicle data (legacy endpoint)"),
    get("get_service_data", "{id}/service_data", Output::Body, "Service data"),
    get("get_nearby_charging", "{id}/nearby_charging_sites", Output::Body, "Nearby charging sites"),
    get("get_charge_state", "{id}/data_request/charge_state", Output::Body, "Charge state"),
    get("get_climate_state", "{id}/data_request/climate_state", Output::Body, "Climate state"),
    get("get_drive_state", "{id}/data_request/drive_state", Output::Body, "Drive state"),
    get("get_gui_settings", "{id}/data_request/gui_settings", Output::Body, "GUI settings"),
    get("get_vehicle_state", VEHICLE_STATE, Output::Body, "Vehicle state"),
    get("get_odometer", VEHICLE_STATE, Output::Integer("/response/odometer"), "Odometer reading"),
    get("is_car_locked", VEHICLE_STATE, Output::Field("/response/locked"), "Whether the car is locked"),
    get(
        "is_sentry_mode_enabled",
        VEHICLE_STATE,
        Output::Field("/response/sentry_mode"),
        "Whether Sentry Mode is on",
    ),
    command(
        "set_charge_limit",
        "{id}/command/set_charge_limit",
        &[],
        &["percent"],
        Output::Body,
        "Set the charge limit (percent:<n>)",
    ),
    command(
        "actuate_trunk",
        "{id}/command/actuate_trunk",
        &[("which_trunk", "rear")],
        &[],
        RESULT,
        "Open or close the rear trunk",
    ),
    command(
        "actuate_frunk",
        "{id}/command/actuate_trunk",
        &[("which_trunk", "front")],
        &[],
        RESULT,
        "Open the front trunk",
    ),
    command("flash_lights", "{id}/command/flash_lights", &[], &[], RESULT, "Flash the headlights"),
    command("set_sentry_mode", SET_SENTRY_MODE, &[], &["on"], RESULT, "Set Sentry Mode (on:true|false)"),
    command(
        "enable_sentry_mode",
        SET_SENTRY_MODE,
        &[("on", "true")],
        &[],
        Output::SentryMessage { enabled: true },
        "Enable Sentry Mode",
    ),
    command(
        "disable_sentry_mode",
        SET_SENTRY_MODE,
        &[("on", "false")],
        &[],
        Output::SentryMessage { enabled: false },
        "Disable Sentry Mode",
    ),
    get("toggle_sentry_mode", VEHICLE_STATE, Output::ToggleSentry, "Flip Sentry Mode"),
];

/// Look up an operation by name
pub fn lookup(name: &str) -> Option<&'static Operation> {
    OPERATIONS.iter().find(|op| op.name == name)
}

/// Operations sorted by name, for help output
pub fn sorted() -> Vec<&'static Operation> {
    let mut ops: Vec<_> = OPERATIONS.iter().collect();
    ops.sort_by_key(|op| op.name);
    ops
}

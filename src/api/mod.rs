pub mod client;
pub mod retry;
pub mod types;

pub use client::{ApiClient, Grant, HttpMethod};
pub use types::{OnlineState, Vehicle, VehicleIdentity, VehicleList, WakeResponse};

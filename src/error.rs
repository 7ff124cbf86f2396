use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the session layer can surface. All of them are fatal for a
/// one-shot invocation; transient connection failures are retried before
/// they get here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection failed after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Vehicle (ID:{id}) did not come online after {attempts} wake attempts")]
    DeviceUnreachable { id: String, attempts: u32 },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Tesla REST Service failed to return a response for {url}, access token may have expired")]
    EmptyResponse { url: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        1
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unable to perform Tesla API functions: no credentials or token")]
    NoCredentials,

    #[error("Token exchange rejected: {0}")]
    Rejected(String),

    #[error("Tesla REST Service returned an invalid wake response ({0}); the access token may be invalid")]
    InvalidWakeResponse(String),
}

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Unable to retrieve vehicle ID: unknown name or VIN '{0}'")]
    UnknownVehicle(String),

    #[error("Account has {0} vehicles; select one with --vin or --name")]
    AmbiguousVehicle(usize),

    #[error("Account has no vehicles")]
    NoVehicles,
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown operation '{0}' (run with --list to see available operations)")]
    UnknownOperation(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Operation '{operation}' requires argument '{argument}'")]
    MissingArgument {
        operation: &'static str,
        argument: &'static str,
    },

    #[error("Operation '{operation}' does not accept argument '{argument}'")]
    UnexpectedArgument {
        operation: &'static str,
        argument: String,
    },

    #[error("Tesla REST Service returned an error: {0}")]
    Server(String),
}

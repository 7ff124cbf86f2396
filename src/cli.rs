use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "teslactl")]
#[command(author, version, about = "Tesla owner API CLI - wake, query and command a vehicle")]
pub struct Cli {
    /// Operation to run (see --list)
    #[arg(required_unless_present = "list")]
    pub operation: Option<String>,

    /// Operation arguments as comma-separated key:value pairs (e.g. percent:80)
    #[arg(short, long)]
    pub arguments: Option<String>,

    /// Print debug output
    #[arg(long)]
    pub debug: bool,

    /// VIN of the car
    #[arg(long, env = "TESLA_VIN")]
    pub vin: Option<String>,

    /// Display name of the car
    #[arg(long, env = "TESLA_NAME")]
    pub name: Option<String>,

    /// Refresh token used when none is stored yet
    #[arg(long, env = "TESLA_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Rotate the access token even if it is still fresh
    #[arg(long)]
    pub force_refresh: bool,

    /// Account email for password login
    #[arg(long, env = "TESLA_EMAIL")]
    pub email: Option<String>,

    /// Path of the credential state file
    #[arg(long, env = "TESLA_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Path of the config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Never read the password from the system keychain
    #[arg(long)]
    pub no_keychain: bool,

    /// List available operations and exit
    #[arg(long)]
    pub list: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

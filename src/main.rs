mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod error;
mod output;
mod resolver;
mod session;
mod store;
mod wake;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use api::ApiClient;
use auth::AuthSettings;
use clap::Parser;
use cli::Cli;
use commands::{registry, Arguments};
use config::Config;
use session::{Session, VehicleSelector};
use std::process::ExitCode;
use store::CredentialStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.debug);
    output::init(!cli.no_color);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            let code = e.downcast_ref::<error::Error>().map_or(1, error::Error::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list {
        output::print_operations(&registry::sorted());
        return Ok(());
    }

    let operation = cli.operation.as_deref().context("No operation given")?;
    let args = Arguments::parse(cli.arguments.as_deref().unwrap_or_default())?;

    let config = Config::load(cli.config.as_deref())?;
    let state_path = config
        .state_path(cli.state_file.clone())
        .context("Could not determine state file location; pass --state-file")?;
    let store = CredentialStore::load(&state_path)
        .with_context(|| format!("Failed to load {}", state_path.display()))?;

    let client = ApiClient::new(&config.api)?;
    let auth = AuthSettings {
        email: cli.email.clone().or_else(|| config.email.clone()),
        config_password: config.password.clone(),
        refresh_token: cli.refresh_token.clone(),
        force_refresh: cli.force_refresh,
        lifetime: config.token.lifetime(),
        use_keychain: !cli.no_keychain,
    };
    let selector = VehicleSelector::new(cli.vin.clone(), cli.name.clone());
    let mut session = Session::new(store, client, auth, selector);

    info!("Using state file {}", state_path.display());
    let result = commands::invoke(&mut session, operation, &args, &config.wake.policy()).await?;
    output::print_result(&result)?;
    Ok(())
}

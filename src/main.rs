//! OAuth Relay - stateless OAuth2 authorization-code relay for Twitch

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use oauth_relay::{
    app::RelayServer,
    cli::{Cli, Command},
    config::Config,
    oauth::Denylist,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Some(Command::CheckConfig) => run_check_config(&cli),
        Some(Command::Serve) | None => run_server(cli).await,
    }
}

/// Load configuration with CLI overrides applied
fn load_config(cli: &Cli) -> Option<Config> {
    match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host.clone_from(host);
            }
            Some(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            None
        }
    }
}

/// Report configuration problems without serving
fn run_check_config(cli: &Cli) -> ExitCode {
    let Some(config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };

    let mut ok = true;

    let missing = config.provider.missing_fields();
    if missing.is_empty() {
        println!("✅ Provider credentials present");
    } else {
        println!("❌ Missing provider credentials: {}", missing.join(", "));
        ok = false;
    }

    match Denylist::from_config(&config.denylist) {
        Ok(denylist) => println!("✅ Denylist: {} token(s)", denylist.len()),
        Err(e) => {
            println!("❌ {e}");
            ok = false;
        }
    }

    println!("   Provider:  {}", config.provider.id_host);
    println!("   Callback:  {}", config.provider.callback_path);
    if let Ok(creds) = config.provider.credentials() {
        println!(
            "   Redirect:  {}",
            creds.callback_uri(&config.provider.callback_path)
        );
    }
    println!(
        "   Listen:    {}:{}",
        config.server.host, config.server.port
    );

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Run the relay server
async fn run_server(cli: Cli) -> ExitCode {
    let Some(config) = load_config(&cli) else {
        return ExitCode::FAILURE;
    };

    if cli.require_credentials {
        if let Err(e) = config.provider.credentials() {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        provider = %config.provider.id_host,
        "Starting OAuth relay"
    );

    let server = match RelayServer::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create relay: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Relay error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Relay shutdown complete");
    ExitCode::SUCCESS
}

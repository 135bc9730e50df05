//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// OAuth2 authorization-code relay for Twitch
#[derive(Parser, Debug)]
#[command(name = "oauth-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "OAUTH_RELAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "OAUTH_RELAY_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "OAUTH_RELAY_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "OAUTH_RELAY_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "OAUTH_RELAY_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Refuse to start when provider credentials are incomplete
    #[arg(long, env = "OAUTH_RELAY_REQUIRE_CREDENTIALS", global = true)]
    pub require_credentials: bool,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the relay server (default)
    Serve,

    /// Load configuration and report problems without serving
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_mode() {
        let cli = Cli::try_parse_from(["oauth-relay"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.log_level, "info");
        assert!(!cli.require_credentials);
    }

    #[test]
    fn parses_overrides_and_subcommand() {
        let cli = Cli::try_parse_from([
            "oauth-relay",
            "--port",
            "9000",
            "--host",
            "127.0.0.1",
            "check-config",
            "--config",
            "relay.yaml",
            "--require-credentials",
        ])
        .unwrap();
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.config, Some(PathBuf::from("relay.yaml")));
        assert!(cli.require_credentials);
        assert_eq!(cli.command, Some(Command::CheckConfig));
    }
}

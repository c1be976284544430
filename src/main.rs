use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use shutter_gateway::handler::InvocationContext;
use shutter_gateway::{Config, Daemon};

/// Shutter gateway - voice control for motorized roller shutters
#[derive(Parser)]
#[command(name = "shutter-gateway", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Print the discovery response for the current backend inventory
    Discover {
        /// Bearer token to discover with; the configured token when omitted
        #[arg(short, long, env = "SHUTTER_DISCOVERY_TOKEN")]
        token: Option<String>,
    },
    /// Obtain the setup code for a user
    Token {
        /// Voice-assistant user id
        #[arg(short, long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,shutter_gateway=info",
        1 => "info,shutter_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.api_server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    let daemon = Daemon::new(config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!("starting shutter gateway");
            daemon.run().await?;
        }
        Command::Discover { token } => {
            let mut event = json!({
                "directive": {
                    "header": {
                        "namespace": "Alexa.Discovery",
                        "name": "Discover",
                        "payloadVersion": "3",
                        "messageId": uuid::Uuid::new_v4().to_string()
                    },
                    "payload": {}
                }
            });
            if let Some(token) = token {
                event["directive"]["payload"]["scope"] = json!({ "type": "BearerToken", "token": token });
            }

            let response = daemon
                .handler()
                .handle(event, InvocationContext::default())
                .await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Token { user } => {
            let code = daemon.tokens().obtain_token(&user).await?;
            println!("{code}");
        }
    }

    Ok(())
}

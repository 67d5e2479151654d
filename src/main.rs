use std::path::PathBuf;
use std::sync::Arc;

use {
    clap::{Parser, Subcommand},
    tracing::{error, info},
    tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter},
};

use msgateway::{server, ConnectorRegistry, GatewayConfig};

#[derive(Parser)]
#[command(name = "msgateway", about = "Unified messaging gateway for WhatsApp and Slack")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML config file (defaults to ./gateway.toml when present).
    #[arg(long, global = true, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway (default).
    Serve,
    /// Print the effective configuration with secrets redacted.
    PrintConfig,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn run_server(config: GatewayConfig) -> anyhow::Result<()> {
    let registry = Arc::new(ConnectorRegistry::from_config(&config));

    if config.server.auto_initialize {
        let registry = registry.clone();
        tokio::spawn(async move {
            match registry.initialize_all().await {
                Ok(()) => info!("all platforms initialized"),
                Err(e) => error!(error = %e, "platform initialization failed"),
            }
        });
    }

    let served = server::serve(&config, registry.clone(), shutdown_signal()).await;

    info!("destroying connectors");
    registry.destroy_all().await;
    served?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = GatewayConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!(version = msgateway::VERSION, "msgateway starting");
            run_server(config).await
        },
        Commands::PrintConfig => {
            print!("{}", config.redacted().to_toml()?);
            Ok(())
        },
    }
}

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use parley_config::{ParleyConfig, discover_and_load, set_config_dir};

#[derive(Parser)]
#[command(name = "parley", about = "Parley — real-time chat backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Directory to look for parley.{toml,yaml,yml,json} in.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP + WebSocket server.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the effective configuration.
    Config,
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
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> ParleyConfig {
    if let Some(dir) = &cli.config_dir {
        set_config_dir(dir.clone());
    }
    discover_and_load()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "parley starting");

    match &cli.command {
        Commands::Serve { bind, port } => {
            let mut config = load_config(&cli);
            if let Some(bind) = bind {
                config.server.bind = bind.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            parley_gateway::server::serve(config).await
        },
        Commands::Config => {
            let config = load_config(&cli);
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from(["parley", "serve", "--bind", "0.0.0.0", "--port", "9000"])
            .unwrap();
        match &cli.command {
            Commands::Serve { bind, port } => {
                assert_eq!(bind.as_deref(), Some("0.0.0.0"));
                assert_eq!(*port, Some(9000));
            },
            Commands::Config => panic!("expected serve"),
        }
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn config_dir_is_global() {
        let cli = Cli::try_parse_from(["parley", "config", "--config-dir", "/tmp/parley"]).unwrap();
        assert!(matches!(cli.command, Commands::Config));
        assert_eq!(cli.config_dir.as_deref(), Some(Path::new("/tmp/parley")));
    }
}

//! torchat server binary
//!
//! Usage: torchat-server [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>  Path to configuration file
//!   -g, --generate       Print a configuration template
//!   -h, --help           Print help information

use std::env;

use anyhow::Context;

use torchat::{ChatServer, LineInput, Role, ServerConfig, TerminalConsole};

/// Secret used when no configuration file is given.
const FALLBACK_SECRET: &str = "secret123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the chat on stdout stays readable (RUST_LOG=debug for more)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        tracing::warn!("No configuration file given, using the built-in password");
        return run_server(ServerConfig::new(FALLBACK_SECRET)).await;
    }

    match args[1].as_str() {
        "-h" | "--help" => {
            print_usage();
        }
        "-g" | "--generate" => {
            generate_config()?;
        }
        "-c" | "--config" => {
            let path = args.get(2).context("--config requires a file path")?;
            run_server(load_config(path)?).await?;
        }
        _ => {
            print_usage();
            anyhow::bail!("unknown option: {}", args[1]);
        }
    }

    Ok(())
}

fn print_usage() {
    println!(
        r#"torchat server - password-protected chat behind a Tor hidden service

USAGE:
    torchat-server [OPTIONS]

OPTIONS:
    -c, --config <FILE>  Path to configuration file
    -g, --generate       Print a configuration template
    -h, --help           Print help information

Without a configuration file the server listens on 127.0.0.1:1234 with the
password "{}".

EXAMPLES:
    Generate a configuration and edit the secret:
        torchat-server --generate > server.toml

    Run the server:
        torchat-server --config server.toml

    Point the hidden service at it (torrc):
        HiddenServicePort 1234 127.0.0.1:1234
"#,
        FALLBACK_SECRET
    );
}

fn generate_config() -> anyhow::Result<()> {
    let config = ServerConfig::new(FALLBACK_SECRET);

    println!("# torchat server configuration");
    println!("# Generated: {}", chrono::Utc::now());
    println!("# Change the secret before exposing the hidden service.");
    println!();
    println!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

fn load_config(path: &str) -> anyhow::Result<ServerConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path))?;
    let config: ServerConfig = toml::from_str(&content)?;
    Ok(config)
}

async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting torchat server on {}:{}",
        config.listen_addr,
        config.listen_port
    );
    tracing::info!("Authentication attempts per client: {}", config.max_auth_attempts);

    let server = ChatServer::new(config)?;
    let mut input = LineInput::stdin(server.config().max_line_len);
    let mut console = TerminalConsole::new(Role::Server);
    console.banner();

    server.run(&mut input, &mut console).await?;
    tracing::info!("Final metrics: {}", server.metrics().snapshot());

    println!("Server shut down.");
    Ok(())
}

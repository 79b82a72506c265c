//! torchat client binary
//!
//! Usage: torchat-client [OPTIONS] <ONION_ADDRESS> <PORT>
//!
//! Options:
//!   -c, --config <FILE>  Path to configuration file
//!   -h, --help           Print help information

use std::env;

use anyhow::Context;

use torchat::{ChatClient, ClientConfig, LineInput, Role, TerminalConsole};

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

    let args: Vec<String> = env::args().skip(1).collect();

    let mut config_path = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            "-c" | "--config" => {
                let path = iter.next().context("--config requires a file path")?;
                config_path = Some(path.clone());
            }
            _ => positional.push(arg.clone()),
        }
    }

    if positional.len() != 2 {
        print_usage();
        anyhow::bail!("expected <ONION_ADDRESS> and <PORT>");
    }

    let port: u16 = positional[1]
        .parse()
        .with_context(|| format!("invalid port {:?}", positional[1]))?;

    let mut config = match config_path {
        Some(path) => load_config(&path)?,
        None => ClientConfig::default(),
    };
    config.target_host = positional[0].clone();
    config.target_port = port;

    let client = ChatClient::new(config)?;
    let mut input = LineInput::stdin(client.config().max_line_len);
    let mut console = TerminalConsole::new(Role::Client);
    console.banner();

    let end = client
        .run(&mut input, &mut console)
        .await
        .context("chat session failed")?;
    tracing::info!("Session ended: {:?}", end);

    println!("Goodbye!");
    Ok(())
}

fn print_usage() {
    println!(
        r#"torchat client - chat with a torchat server through Tor

USAGE:
    torchat-client [OPTIONS] <ONION_ADDRESS> <PORT>

OPTIONS:
    -c, --config <FILE>  Path to configuration file
    -h, --help           Print help information

CONFIGURATION FILE FORMAT (JSON, every field optional):
    {{
        "proxy_addr": "127.0.0.1",
        "proxy_port": 9050,
        "max_auth_attempts": 3,
        "max_line_len": 4096
    }}

EXAMPLES:
    Connect through the default Tor proxy:
        torchat-client abcdefghijklmnop.onion 1234

    Use Tor Browser's proxy port:
        torchat-client --config client.json abcdefghijklmnop.onion 1234
"#
    );
}

fn load_config(path: &str) -> anyhow::Result<ClientConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path))?;
    let config: ClientConfig = serde_json::from_str(&content)?;
    Ok(config)
}

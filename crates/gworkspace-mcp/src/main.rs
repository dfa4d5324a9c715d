mod initialize;
mod protocol;
mod server;
mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gworkspace::common::{create_http_client_with_timeout, paths, HttpClient};
use gworkspace::{CredentialProvider, Dispatcher, ToolRegistry, WorkspaceConfig, WorkspaceContext};

use server::McpServer;

#[derive(Parser, Debug)]
#[command(name = "gworkspace-mcp", version, about = "Google Workspace tools over MCP (stdio)")]
struct Cli {
    /// Server home directory (config.json, credentials/)
    #[arg(long, global = true, env = "GWORKSPACE_MCP_HOME")]
    home: Option<PathBuf>,

    /// Directory holding client_secret.json and the encrypted token
    #[arg(long, global = true, env = "GWORKSPACE_CREDENTIALS_DIR")]
    credentials_dir: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server (default)
    Serve {
        #[arg(long, default_value = "stdio")]
        transport: String,
    },
    /// Manage the stored Google credential
    Auth {
        #[command(subcommand)]
        action: AuthCommand,
    },
    /// Print the tool catalogue as JSON
    Tools,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Run the browser consent flow and store a new credential
    Login,
    /// Report whether a usable credential exists (never prompts)
    Status,
    /// Revoke and delete the stored credential
    Revoke,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        None => serve(&cli.home, &cli.credentials_dir, "stdio").await,
        Some(Command::Serve { ref transport }) => {
            serve(&cli.home, &cli.credentials_dir, transport).await
        }
        Some(Command::Auth { ref action }) => auth(&cli.home, &cli.credentials_dir, action).await,
        Some(Command::Tools) => {
            let registry = ToolRegistry::new();
            println!("{}", serde_json::to_string_pretty(registry.list())?);
            Ok(())
        }
    }
}

/// stdout carries the protocol, so logs go to stderr.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_settings(
    home: &Option<PathBuf>,
    credentials_dir: &Option<PathBuf>,
) -> anyhow::Result<(PathBuf, WorkspaceConfig)> {
    let home = match home {
        Some(dir) => dir.clone(),
        None => paths::default_home_dir().map_err(anyhow::Error::msg)?,
    };
    let mut config = WorkspaceConfig::load(&home)?;
    if let Some(dir) = credentials_dir {
        config.credentials_dir = Some(dir.clone());
    }
    Ok((home, config))
}

fn credential_provider(
    home: &Option<PathBuf>,
    credentials_dir: &Option<PathBuf>,
) -> anyhow::Result<(Arc<CredentialProvider>, HttpClient)> {
    let (home, config) = load_settings(home, credentials_dir)?;
    let http = create_http_client_with_timeout(config.http_timeout_secs).map_err(anyhow::Error::msg)?;
    let provider = CredentialProvider::from_config(&config, &home, http.clone())?;
    Ok((Arc::new(provider), http))
}

async fn serve(
    home: &Option<PathBuf>,
    credentials_dir: &Option<PathBuf>,
    transport: &str,
) -> anyhow::Result<()> {
    if transport != "stdio" {
        anyhow::bail!("only stdio transport is supported");
    }

    let (provider, http) = credential_provider(home, credentials_dir)?;
    provider
        .acquire()
        .await
        .context("Could not obtain Google credentials")?;
    info!("Google credentials ready");

    let ctx = WorkspaceContext::new(http, provider);
    let server = McpServer::new(Dispatcher::new(Arc::new(ctx)));
    server.run_stdio().await?;
    Ok(())
}

async fn auth(
    home: &Option<PathBuf>,
    credentials_dir: &Option<PathBuf>,
    action: &AuthCommand,
) -> anyhow::Result<()> {
    let (provider, _) = credential_provider(home, credentials_dir)?;
    match action {
        AuthCommand::Login => {
            let record = provider.login().await.context("Authorization failed")?;
            println!("Authorized. Access token valid until {}", record.expiry);
        }
        AuthCommand::Status => {
            let status = provider.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        AuthCommand::Revoke => {
            provider.revoke().await.context("Revocation failed")?;
            println!("Stored credential removed");
        }
    }
    Ok(())
}

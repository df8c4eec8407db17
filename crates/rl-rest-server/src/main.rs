// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! RepoLens REST API server binary

use clap::Parser;
use rl_logging::CliLoggingArgs;
use rl_rest_server::{Server, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Settings given on the command line or in the environment override the
/// config file, which overrides the built-in defaults.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind address for the server
    #[arg(short, long, env = "BIND_ADDR")]
    bind: Option<SocketAddr>,

    /// Database path (SQLite), or `:memory:`
    #[arg(short, long, env = "DATABASE_PATH")]
    database: Option<String>,

    /// Also allow local dev origins for CORS
    #[arg(long)]
    cors: bool,

    /// TOML configuration file to load
    #[arg(long, env = "RL_CONFIG")]
    config: Option<PathBuf>,

    /// Browser app origin
    #[arg(long, env = "FRONTEND_URL")]
    frontend_url: Option<String>,

    /// Public URL of this server
    #[arg(long, env = "BACKEND_URL")]
    backend_url: Option<String>,

    #[arg(long, env = "GITHUB_CLIENT_ID")]
    github_client_id: Option<String>,

    #[arg(long, env = "GITHUB_CLIENT_SECRET", hide_env_values = true)]
    github_client_secret: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,

    /// Send cookies without the Secure flag (plain-HTTP local dev)
    #[arg(long)]
    insecure_cookies: bool,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_toml_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(database) = self.database {
            config.database_path = database;
        }
        if self.cors {
            config.enable_cors = true;
        }
        if let Some(url) = self.frontend_url {
            config.frontend_url = url;
        }
        if let Some(url) = self.backend_url {
            config.backend_url = url;
        }
        if let Some(id) = self.github_client_id {
            config.github.client_id = id;
        }
        if let Some(secret) = self.github_client_secret {
            config.github.client_secret = secret;
        }
        if let Some(key) = self.anthropic_api_key {
            config.llm.api_key = key;
        }
        if self.insecure_cookies {
            config.session.cookie_secure = false;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is normal outside local development
    dotenvy::dotenv().ok();

    let args = Args::parse();
    args.logging.init("rl-rest-server")?;

    tracing::info!("Starting RepoLens REST API server");

    let config = args.into_config()?;
    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}

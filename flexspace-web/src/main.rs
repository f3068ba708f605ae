//! FlexSpace Web Server
//!
//! REST back end for coworking room bookings.

use anyhow::Context;
use clap::Parser;
use flexspace_core::FlexSpaceConfig;
use flexspace_web::init_logging;
use flexspace_web::server::FlexSpaceServerBuilder;
use std::path::PathBuf;
use tracing::info;

/// FlexSpace Web Server - room catalog, bookings and accounts
#[derive(Parser)]
#[command(name = "flexspace-web")]
#[command(about = "REST API for FlexSpace room booking")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to (overrides config and FLEXSPACE_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on (overrides config and FLEXSPACE_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite URL; in-memory storage when unset everywhere
    #[arg(long)]
    database_url: Option<String>,

    /// Directory for uploaded room photos
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut FlexSpaceConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.url = Some(url);
        }
        if let Some(dir) = self.upload_dir {
            config.server.upload_dir = dir;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = FlexSpaceConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply(&mut config);

    init_logging(&config.logging)?;
    info!("Starting FlexSpace Web Server initialization");

    let server = FlexSpaceServerBuilder::new()
        .config(config)
        .build()
        .await
        .context("Failed to build server")?;

    server.start().await.context("Server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["flexspace-web"]);
        assert!(args.config.is_none());
        assert!(args.port.is_none());

        let args = Args::parse_from([
            "flexspace-web",
            "--host",
            "0.0.0.0",
            "--port",
            "3000",
            "--database-url",
            "sqlite://flexspace.db",
        ]);
        let mut config = FlexSpaceConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.address(), "0.0.0.0:3000");
        assert_eq!(
            config.database.url.as_deref(),
            Some("sqlite://flexspace.db")
        );
    }
}

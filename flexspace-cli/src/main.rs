//! FlexSpace CLI - operator commands
//!
//! Writes configuration files and manages accounts directly in the configured database.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use flexspace_applications::{StorageBackend, UserService};
use flexspace_core::{
    init_logging, validation::page_request, FlexSpaceConfig, LoggingConfig, PageRequest,
    UserFilter, UserRole,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "flexspace")]
#[command(about = "Operator commands for a FlexSpace deployment")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with default values
    InitConfig {
        /// Where to write the TOML file
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Create an admin account, or report that the email is taken
    CreateAdmin {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Print every user
    ListUsers {
        /// Only users with this role (User or Admin)
        #[arg(long)]
        role: Option<UserRole>,

        /// Case-insensitive match on name or email
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging_config = LoggingConfig::quiet();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    dotenvy::dotenv().ok();

    match cli.command {
        Commands::InitConfig { path, force } => init_config(&path, force),
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => {
            let users = open_users(cli.config.as_deref()).await?;
            create_admin(&users, &name, &email, &password).await
        }
        Commands::ListUsers { role, search } => {
            let users = open_users(cli.config.as_deref()).await?;
            for line in list_users(&users, UserFilter { search, role }).await? {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        );
    }
    FlexSpaceConfig::default()
        .save_to_file(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn open_users(config_path: Option<&Path>) -> anyhow::Result<UserService> {
    let config = FlexSpaceConfig::load(config_path).context("Failed to load configuration")?;
    let Some(url) = config.database.url.as_deref() else {
        bail!("No database configured; set DATABASE_URL or [database].url");
    };

    info!("Opening database {}", url);
    let storage = StorageBackend::from_url(Some(url))
        .await
        .context("Failed to open database")?;
    Ok(UserService::new(storage.users))
}

async fn create_admin(
    users: &UserService,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    if users.ensure_admin(name, email, password).await? {
        println!("Created admin {}", email);
    } else {
        println!("{} is already registered, nothing changed", email);
    }
    Ok(())
}

/// One formatted line per matching user, across all pages
async fn list_users(users: &UserService, filter: UserFilter) -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut page = 1;
    loop {
        let request: PageRequest = page_request(Some(page), Some(PageRequest::MAX_LIMIT))?;
        let result = users.list_users(&filter, request).await?;
        let fetched = result.data.len();
        lines.extend(result.data.into_iter().map(|user| {
            format!(
                "{:>5}  {:<6}  {:<32}  {}",
                user.id,
                user.role.as_str(),
                user.email,
                user.name
            )
        }));
        if fetched < request.limit as usize || lines.len() as u64 >= result.total {
            break;
        }
        page += 1;
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_users() -> UserService {
        UserService::new(StorageBackend::memory().users)
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "flexspace",
            "create-admin",
            "--name",
            "Root",
            "--email",
            "root@flexspace.com",
            "--password",
            "supersecret",
        ]);
        assert!(matches!(cli.command, Commands::CreateAdmin { .. }));

        let cli = Cli::parse_from(["flexspace", "list-users", "--role", "Admin"]);
        match cli.command {
            Commands::ListUsers { role, .. } => assert_eq!(role, Some(UserRole::Admin)),
            _ => panic!("expected list-users"),
        }
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flexspace.toml");

        init_config(&path, false).unwrap();
        assert!(FlexSpaceConfig::from_file(&path).is_ok());
        assert!(init_config(&path, false).is_err());
        assert!(init_config(&path, true).is_ok());
    }

    #[tokio::test]
    async fn test_create_admin_is_idempotent() {
        let users = memory_users();

        create_admin(&users, "Root", "root@flexspace.com", "supersecret")
            .await
            .unwrap();
        create_admin(&users, "Root", "root@flexspace.com", "supersecret")
            .await
            .unwrap();

        let lines = list_users(&users, UserFilter::default()).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Admin"));
        assert!(lines[0].contains("root@flexspace.com"));
    }

    #[tokio::test]
    async fn test_list_users_walks_every_page() {
        let users = memory_users();
        for i in 0..101 {
            users
                .create_user(
                    "Member",
                    &format!("member{}@flexspace.com", i),
                    "password1",
                    UserRole::User,
                )
                .await
                .unwrap();
        }

        let lines = list_users(&users, UserFilter::default()).await.unwrap();
        assert_eq!(lines.len(), 101);
    }
}

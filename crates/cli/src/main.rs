//! Mizan CLI - terminal client for the DigitalJamath backend
//!
//! # Configuration
//!
//! Sources, highest priority first:
//!
//! 1. CLI arguments
//! 2. Environment variables (`MIZAN_*`)
//! 3. Defaults (same-origin API, platform data dir for tokens)
//!
//! # Environment Variables
//!
//! - `MIZAN_API_URL`: API origin override
//! - `MIZAN_PAGE_ORIGIN`: URL the client pretends to be served from
//! - `MIZAN_TOKEN_FILE`: token file path
//! - `MIZAN_PASSWORD`: password for `login`
//! - `MIZAN_LOG_FORMAT`: `json` (default) or `pretty`

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use mizan_auth::{AccessLevel, Credentials, explain};
use mizan_client::types::{Announcement, Receipt, Survey, Transaction};
use mizan_client::{
    ApiClient, ClientConfig, ListResource, ListView, PageLocation, PermissionSession,
};

/// Mizan CLI - DigitalJamath dashboard and portal from the terminal
#[derive(Parser, Debug)]
#[command(name = "mizan")]
#[command(version, about, long_about = None)]
struct Args {
    /// API origin override (also: MIZAN_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Page location used for origin and tenant resolution (also: MIZAN_PAGE_ORIGIN)
    #[arg(long, global = true, value_name = "URL")]
    origin: Option<String>,

    /// Token file path (also: MIZAN_TOKEN_FILE)
    #[arg(long, global = true, value_name = "PATH")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved API origin (and tenant, if any)
    ApiUrl,

    /// Exchange credentials for tokens
    Login {
        #[arg(long)]
        username: String,

        #[arg(long, env = "MIZAN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget stored tokens
    Logout,

    /// Trade the refresh token for a new access token
    RefreshToken,

    /// Show the current profile and permission map
    Whoami {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Explain whether the current user passes a capability check
    Check {
        /// Module name, e.g. finance
        module: String,

        /// Required level: read, write or admin
        #[arg(long, default_value = "read")]
        level: AccessLevel,
    },

    /// Render a dashboard or portal list
    List {
        #[arg(value_enum)]
        resource: Resource,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Resource {
    Transactions,
    Surveys,
    Staff,
    Receipts,
    Announcements,
}

fn resolve_config(args: &Args) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("invalid MIZAN_* environment")?;

    if let Some(api_url) = &args.api_url {
        config = config.with_api_url(api_url.clone());
    }
    if let Some(origin) = &args.origin {
        let location = PageLocation::parse(origin).context("invalid --origin")?;
        config = config.with_page_location(location);
    }
    if let Some(path) = &args.token_file {
        config = config.with_token_file(path.clone());
    }
    Ok(config)
}

fn build_client(config: &ClientConfig) -> Result<ApiClient> {
    let store = config.token_store().context("failed to open token store")?;
    let origin = config.api_origin();
    if origin.is_empty() {
        tracing::warn!("no API origin resolved; set MIZAN_API_URL or --api-url");
    }
    Ok(ApiClient::new(origin, Arc::new(store)))
}

async fn show<R: ListResource>(client: &ApiClient) -> String {
    let mut view = ListView::<R>::new();
    if R::MODULE.is_some() {
        let session = PermissionSession::initialize(client.clone()).await;
        view.load_gated(&session, client).await;
    } else {
        view.load(client).await;
    }
    view.render()
}

async fn run(command: Command, config: ClientConfig) -> Result<ExitCode> {
    match command {
        Command::ApiUrl => {
            println!("{}", config.api_origin());
            if let Some(tenant) = config.tenant() {
                println!("tenant: {tenant}");
            }
        }

        Command::Login { username, password } => {
            let client = build_client(&config)?;
            client
                .login(&Credentials::new(username, password))
                .await
                .context("login failed")?;
            println!("Signed in.");
        }

        Command::Logout => {
            build_client(&config)?.logout()?;
            println!("Signed out.");
        }

        Command::RefreshToken => {
            build_client(&config)?
                .refresh_access_token()
                .await
                .context("token refresh failed")?;
            println!("Access token refreshed.");
        }

        Command::Whoami { json } => {
            let session = PermissionSession::initialize(build_client(&config)?).await;
            let Some(profile) = session.profile() else {
                eprintln!("Not signed in, or the profile could not be loaded.");
                return Ok(ExitCode::FAILURE);
            };

            if json {
                let body = serde_json::json!({
                    "profile": profile,
                    "role": session.role().map(|r| r.name.as_str()),
                    "permissions": session.permissions(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{} (id {})", profile.display_name(), profile.id);
                if session.is_superuser() {
                    println!("superuser: full access");
                } else if let Some(role) = session.role() {
                    println!("role: {}", role.name);
                }
                if session.permissions().is_empty() {
                    println!("no module access");
                }
                for (module, level) in session.permissions().iter() {
                    println!("  {module:<14} {level}");
                }
            }
        }

        Command::Check { module, level } => {
            let session = PermissionSession::initialize(build_client(&config)?).await;
            let explanation = explain(session.permissions(), &module, level);
            println!("{}", explanation.reason);
            if !explanation.granted {
                return Ok(ExitCode::FAILURE);
            }
        }

        Command::List { resource } => {
            let client = build_client(&config)?;
            let rendered = match resource {
                Resource::Transactions => show::<Transaction>(&client).await,
                Resource::Surveys => show::<Survey>(&client).await,
                Resource::Staff => show::<mizan_auth::StaffEntry>(&client).await,
                Resource::Receipts => show::<Receipt>(&client).await,
                Resource::Announcements => show::<Announcement>(&client).await,
            };
            print!("{rendered}");
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    mizan_observability::init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    run(args.command, config).await
}

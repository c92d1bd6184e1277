//! tokenguard server binary.
//!
//! Serves `/token/{guid}` and `/token/refresh`, or enrolls a principal with
//! the `enroll` subcommand.

pub use self::error::{Error, Result};
mod error;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokenguard_api::AppState;
use tokenguard_api::config::ApiConfig;
use tokenguard_core::config::DEFAULT_HASH_COST;
use tokenguard_core::store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use tokenguard_core::{TokenConfig, TokenManager};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,tokenguard_api=debug,tokenguard_core=debug";

/// CLI arguments; every setting also reads from the environment.
#[derive(Parser, Debug)]
#[command(name = "tokenguard_server", about = "Issue and rotate origin-bound credentials")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind_addr: String,

    /// PostgreSQL connection URL. Required unless `--in-memory` is set.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// HMAC signing secret for access and refresh tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Access token lifetime (Go duration syntax, e.g. `15m`).
    #[arg(long, env = "ACCESS_TTL", default_value = "15m")]
    access_ttl: String,

    /// Refresh token lifetime (Go duration syntax, e.g. `168h`).
    #[arg(long, env = "REFRESH_TTL", default_value = "168h")]
    refresh_ttl: String,

    /// bcrypt cost for stored refresh-token hashes.
    #[arg(long, env = "REFRESH_HASH_COST", default_value_t = DEFAULT_HASH_COST)]
    hash_cost: u32,

    /// `Domain` attribute for credential cookies.
    #[arg(long, env = "COOKIE_DOMAIN")]
    cookie_domain: Option<String>,

    /// Mark credential cookies `Secure`.
    #[arg(long, env = "SECURE_COOKIES")]
    secure_cookies: bool,

    /// Take the caller origin from `X-Forwarded-For`.
    #[arg(long, env = "TRUST_FORWARDED_FOR")]
    trust_forwarded_for: bool,

    /// Keep principals in process memory instead of PostgreSQL.
    #[arg(long)]
    in_memory: bool,

    /// Enroll `GUID:EMAIL` into the in-memory store at startup. Repeatable.
    #[arg(
        long = "seed",
        value_name = "GUID:EMAIL",
        value_parser = parse_seed,
        requires = "in_memory"
    )]
    seeds: Vec<Seed>,

    /// Do not run embedded migrations on startup.
    #[arg(long)]
    skip_migrations: bool,
}

/// A principal enrolled at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Seed {
    guid: String,
    email: String,
}

fn parse_seed(value: &str) -> std::result::Result<Seed, String> {
    match value.split_once(':') {
        Some((guid, email)) if !guid.is_empty() && !email.is_empty() => Ok(Seed {
            guid: guid.to_string(),
            email: email.to_string(),
        }),
        _ => Err(format!("expected GUID:EMAIL, got {value:?}")),
    }
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run the HTTP service (default).
    Serve,
    /// Enroll a principal and print its GUID as JSON.
    Enroll {
        /// Contact email for security notifications.
        #[arg(long)]
        email: String,
        /// Principal GUID. A random UUID when omitted.
        #[arg(long)]
        guid: Option<String>,
        /// Origin bound into the enrollment credential.
        #[arg(long, default_value = "127.0.0.1")]
        origin: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays clean for `enroll` output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let token_config = TokenConfig::new(
        args.jwt_secret.clone().unwrap_or_default(),
        &args.access_ttl,
        &args.refresh_ttl,
    )?
    .with_hash_cost(args.hash_cost)?;

    info!(
        access_ttl = %token_config.access_ttl,
        refresh_ttl = %token_config.refresh_ttl,
        hash_cost = token_config.hash_cost,
        "token configuration loaded"
    );

    match args.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => {
            let api_config = ApiConfig {
                bind_addr: args.bind_addr.clone(),
                cookie_domain: args.cookie_domain.clone(),
                secure_cookies: args.secure_cookies,
                trust_forwarded_for: args.trust_forwarded_for,
            };
            if args.in_memory {
                warn!("in-memory store: principals are lost on restart");
                let manager = TokenManager::new(&token_config, MemoryCredentialStore::new());
                seed(&manager, &args.seeds).await?;
                serve(manager, api_config).await
            } else {
                let pool = connect(&args).await?;
                let manager = TokenManager::new(&token_config, PgCredentialStore::new(pool));
                serve(manager, api_config).await
            }
        }
        Command::Enroll {
            email,
            guid,
            origin,
        } => {
            if args.in_memory {
                return Err(Error::Custom(
                    "enroll needs a database; drop --in-memory".into(),
                ));
            }
            let pool = connect(&args).await?;
            let manager = TokenManager::new(&token_config, PgCredentialStore::new(pool));

            let guid = guid.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            manager.enroll(&guid, &email, &origin).await?;
            println!("{}", serde_json::json!({ "guid": guid }));
            Ok(())
        }
    }
}

/// Origin bound into the discarded enrollment pair of a seeded principal.
const SEED_ORIGIN: &str = "127.0.0.1";

/// Enroll startup principals. Their first pair is discarded; clients obtain
/// credentials through `GET /token/{guid}`.
async fn seed<S: CredentialStore>(manager: &TokenManager<S>, seeds: &[Seed]) -> Result<()> {
    for Seed { guid, email } in seeds {
        manager.enroll(guid, email, SEED_ORIGIN).await?;
    }
    if !seeds.is_empty() {
        info!(count = seeds.len(), "seeded principals");
    }
    Ok(())
}

/// Open the connection pool and apply migrations.
async fn connect(args: &Args) -> Result<PgPool> {
    let url = args.database_url.as_deref().ok_or_else(|| {
        Error::Custom("DATABASE_URL is required unless --in-memory is set".into())
    })?;

    info!(max_connections = args.max_connections, "configuring connection pool");
    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await?;

    if args.skip_migrations {
        info!("skipping database migrations");
    } else {
        info!("running database migrations");
        tokenguard_api::migrate(&pool).await?;
    }
    Ok(pool)
}

async fn serve<S: CredentialStore>(manager: TokenManager<S>, config: ApiConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let app = tokenguard_api::router(AppState::new(manager, config));

    info!(addr = %local_addr, "token service listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("token service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

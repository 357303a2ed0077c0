//! Staffing portal server and maintenance commands.

use std::fs::File;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staffing_portal::alerts::spawn_scheduler;
use staffing_portal::api::{create_router, hash_password, AppState, TokenSigner, MIN_PASSWORD_LENGTH};
use staffing_portal::config::ConfigLoader;
use staffing_portal::db::{self, users::NewUser};
use staffing_portal::import::import_candidates;
use staffing_portal::models::Role;

/// Command-line arguments for staffing-portal
#[derive(Parser, Debug)]
#[command(name = "staffing-portal")]
#[command(about = "Recruiter pipeline and attendance portal")]
#[command(version)]
struct Cli {
    /// Database URL
    #[arg(long, default_value = "sqlite://portal.db?mode=rwc", env = "DATABASE_URL", global = true)]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API and the alert scheduler
    Serve(ServeArgs),
    /// Import candidates from a CSV file
    ImportCandidates {
        /// Path to the CSV file
        path: PathBuf,
        /// Email of the user the import is attributed to
        #[arg(long)]
        actor_email: Option<String>,
    },
    /// Create a user account
    CreateUser {
        /// Login email
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        full_name: String,
        /// Password
        #[arg(long, env = "PORTAL_NEW_USER_PASSWORD")]
        password: String,
        /// Create an admin instead of a recruiter
        #[arg(long)]
        admin: bool,
        /// Daily application target override
        #[arg(long)]
        daily_quota: Option<u32>,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "4000", env = "PORTAL_PORT")]
    port: u16,

    /// Directory holding portal.yaml, holidays.yaml, alerts.yaml and policies/
    #[arg(long, default_value = "./config/portal", env = "PORTAL_CONFIG_DIR")]
    config_dir: PathBuf,

    /// Secret used to sign bearer tokens
    #[arg(long, env = "PORTAL_AUTH_SECRET")]
    auth_secret: String,

    /// Token lifetime in hours (1 to 720)
    #[arg(
        long,
        default_value = "12",
        env = "PORTAL_TOKEN_TTL_HOURS",
        value_parser = clap::value_parser!(i64).range(1..=720)
    )]
    token_ttl_hours: i64,

    /// Email of the admin seeded into an empty database
    #[arg(long, env = "PORTAL_ADMIN_EMAIL")]
    admin_email: Option<String>,

    /// Password of the seeded admin
    #[arg(long, env = "PORTAL_ADMIN_PASSWORD")]
    admin_password: Option<String>,

    /// Do not start the alert scheduler
    #[arg(long)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staffing_portal=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let pool = db::connect(&cli.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", cli.database_url))?;

    match cli.command {
        Command::Serve(args) => serve(pool, args).await,
        Command::ImportCandidates { path, actor_email } => {
            let actor_id = match actor_email {
                Some(email) => Some(
                    db::users::find_by_email(&pool, &email)
                        .await?
                        .with_context(|| format!("No user with email {}", email))?
                        .user
                        .id,
                ),
                None => None,
            };
            let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
            let report = import_candidates(&pool, file, actor_id)
                .await
                .context("Import failed")?;
            for skipped in &report.skipped {
                warn!(line = skipped.line, reason = %skipped.reason, "Row skipped");
            }
            info!(
                inserted = report.inserted,
                updated = report.updated,
                skipped = report.skipped.len(),
                "Import finished"
            );
            Ok(())
        }
        Command::CreateUser {
            email,
            full_name,
            password,
            admin,
            daily_quota,
        } => {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                bail!("Password must be at least {} characters", MIN_PASSWORD_LENGTH);
            }
            let user = db::users::insert(
                &pool,
                &NewUser {
                    email,
                    full_name,
                    role: if admin { Role::Admin } else { Role::Recruiter },
                    password_hash: hash_password(&password)?,
                    daily_quota,
                },
            )
            .await
            .context("Failed to create user")?;
            info!(user_id = user.id, email = %user.email, role = %user.role, "User created");
            Ok(())
        }
    }
}

async fn serve(pool: sqlx::SqlitePool, args: ServeArgs) -> Result<()> {
    let config = ConfigLoader::load(&args.config_dir)
        .with_context(|| format!("Failed to load configuration from {}", args.config_dir.display()))?;
    info!(
        portal = %config.portal().name,
        policies = config.config().policies().len(),
        holidays = config.config().holidays().len(),
        "Configuration loaded"
    );

    seed_admin(&pool, args.admin_email.as_deref(), args.admin_password.as_deref()).await?;

    if args.auth_secret.len() < 16 {
        bail!("PORTAL_AUTH_SECRET must be at least 16 characters");
    }
    let tokens = TokenSigner::new(args.auth_secret, chrono::Duration::hours(args.token_ttl_hours));

    let scheduler = if args.no_scheduler {
        info!("Alert scheduler disabled");
        Vec::new()
    } else {
        spawn_scheduler(pool.clone(), Arc::new(config.clone()))
    };

    let app = create_router(AppState::new(pool, config, tokens));
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    for task in scheduler {
        task.abort();
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Creates the first admin when the users table is empty.
async fn seed_admin(pool: &sqlx::SqlitePool, email: Option<&str>, password: Option<&str>) -> Result<()> {
    if db::users::count(pool).await? > 0 {
        return Ok(());
    }
    let (Some(email), Some(password)) = (email, password) else {
        warn!("No users exist; set PORTAL_ADMIN_EMAIL and PORTAL_ADMIN_PASSWORD to seed an admin");
        return Ok(());
    };
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        bail!("Admin password must be at least {} characters", MIN_PASSWORD_LENGTH);
    }
    let admin = db::users::insert(
        pool,
        &NewUser {
            email: email.to_string(),
            full_name: "Administrator".to_string(),
            role: Role::Admin,
            password_hash: hash_password(password)?,
            daily_quota: None,
        },
    )
    .await
    .context("Failed to seed admin")?;
    info!(user_id = admin.id, email = %admin.email, "Seeded admin account");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve_args(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["staffing-portal", "serve", "--auth-secret", "0123456789abcdef"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn test_token_ttl_defaults_to_twelve_hours() {
        let cli = serve_args(&[]).unwrap();
        match cli.command {
            Command::Serve(args) => assert_eq!(args.token_ttl_hours, 12),
            other => panic!("Expected serve, got {:?}", other),
        }
    }

    #[test]
    fn test_token_ttl_out_of_range_is_rejected() {
        for value in ["0", "-3", "721", "9223372036854775807"] {
            assert!(
                serve_args(&["--token-ttl-hours", value]).is_err(),
                "accepted {value}"
            );
        }
        assert!(serve_args(&["--token-ttl-hours", "720"]).is_ok());
    }
}

//! WasteHub Server: pickup task lifecycle and real-time synchronization.
//!
//! Main entry point that loads configuration, initializes logging, and
//! either serves the API or mints a development token.

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use wastehub_auth::JwtEncoder;
use wastehub_core::config::AppConfig;
use wastehub_core::config::logging::LogFormat;
use wastehub_core::error::AppError;
use wastehub_core::types::UserId;
use wastehub_entity::user::UserRole;

/// WasteHub task lifecycle and real-time engine
#[derive(Debug, Parser)]
#[command(name = "wastehub-server", version, about, long_about = None)]
struct Cli {
    /// Configuration overlay to load from `config/<env>.toml`
    #[arg(short, long, env = "WASTEHUB_ENV", default_value = "development")]
    env: String,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the HTTP and WebSocket server
    Serve,
    /// Print a signed session token for local testing
    Token(TokenArgs),
}

/// Arguments of `token`
#[derive(Debug, Args)]
struct TokenArgs {
    /// Subject user id (random when omitted)
    #[arg(long)]
    user_id: Option<UserId>,
    /// Role claim: admin, collector, or resident
    #[arg(long, default_value = "resident")]
    role: UserRole,
    /// Display name claim
    #[arg(long, default_value = "Dev User")]
    name: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            init_logging(&config);
            run(config).await
        }
        Commands::Token(args) => print_token(&config, args),
    };

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        environment = %config.environment,
        "Starting WasteHub v{}",
        env!("CARGO_PKG_VERSION")
    );

    // ── Step 1: Stores, services, realtime engine ────────────────
    let state = wastehub_api::build_state(config).await?;
    tracing::info!("Application state initialized");

    // ── Step 2: Serve until shutdown ─────────────────────────────
    wastehub_api::run_server(state).await?;

    tracing::info!("WasteHub server stopped");
    Ok(())
}

/// Mint a token with the configured secret and print it with its subject.
fn print_token(config: &AppConfig, args: TokenArgs) -> Result<(), AppError> {
    let user_id = args.user_id.unwrap_or_default();
    let token = JwtEncoder::new(&config.auth).issue(user_id, args.role, &args.name)?;
    println!("user_id: {user_id}");
    println!("role:    {}", args.role);
    println!("token:   {token}");
    Ok(())
}

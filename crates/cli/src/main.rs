mod config_commands;
mod key_commands;

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    krypta_config::KryptaConfig,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "krypta", about = "krypta: end-to-end encryption key management")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of `krypta.{toml,yaml,json}`).
    #[arg(long, global = true, env = "KRYPTA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session locally.
    Login {
        /// Login name (defaults to `auth.username`).
        #[arg(short, long)]
        username: Option<String>,
        /// Keep the login key on disk so later runs start unlocked.
        #[arg(long)]
        stay_logged_in: bool,
    },
    /// Show the encryption state of the current session.
    Status,
    /// Generate a key pair and backup code and activate encryption.
    Init {
        /// Confirm that the backup code has been saved.
        #[arg(long)]
        backup_code_saved: bool,
        /// Confirm that lost secrets mean unreadable data.
        #[arg(long)]
        understand: bool,
    },
    /// Unlock the private key after a password reset.
    Unlock {
        /// Login name, used when the session must log in again.
        #[arg(short, long)]
        username: Option<String>,
        /// Use the backup code instead of the previous password.
        #[arg(long)]
        backup_code: bool,
    },
    /// Change the login password (re-encrypts the private key).
    ChangePassword {
        /// Login name, used when the session must log in again.
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Delete all key material. Encrypted data becomes unreadable.
    Reset {
        /// Required: confirm the reset.
        #[arg(long)]
        yes: bool,
    },
    /// Encrypt a value for the current user and print the sealed JSON.
    Seal {
        value: String,
    },
    /// Decrypt sealed JSON produced by `seal`.
    Open {
        sealed: String,
        /// Login name, used when the session must log in again.
        #[arg(short, long)]
        username: Option<String>,
    },
    /// End the session.
    Logout,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Load the explicit config file, or discover one.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<KryptaConfig> {
    match explicit {
        Some(path) => krypta_config::load_config(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(krypta_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "krypta starting");

    let explicit = cli.config.as_deref();
    let ctx = || load_config(explicit).and_then(key_commands::CommandContext::new);

    match cli.command {
        Commands::Config { action } => config_commands::handle_config(action, explicit),
        Commands::Login {
            username,
            stay_logged_in,
        } => key_commands::login(&ctx()?, username, stay_logged_in).await,
        Commands::Status => key_commands::status(&ctx()?).await,
        Commands::Init {
            backup_code_saved,
            understand,
        } => key_commands::init(&ctx()?, backup_code_saved, understand).await,
        Commands::Unlock {
            username,
            backup_code,
        } => key_commands::unlock(&ctx()?, username, backup_code).await,
        Commands::ChangePassword { username } => {
            key_commands::change_password(&ctx()?, username).await
        },
        Commands::Reset { yes } => key_commands::reset(&ctx()?, yes).await,
        Commands::Seal { value } => key_commands::seal(&ctx()?, &value).await,
        Commands::Open { sealed, username } => {
            key_commands::open(&ctx()?, username, &sealed).await
        },
        Commands::Logout => key_commands::logout(&ctx()?).await,
    }
}

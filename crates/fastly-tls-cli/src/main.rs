//! fastly-tls - manage Fastly TLS subscriptions for a domain

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fastly_tls_api::{ClientConfig, FastlyClient};
use fastly_tls_cli::config::ConfigManager;
use fastly_tls_core::{LifecycleController, Operation, Report};

/// Add, inspect and remove Fastly managed TLS for a domain
#[derive(Parser, Debug)]
#[command(name = "fastly-tls")]
#[command(about = "Manage Fastly TLS subscriptions for a domain", long_about = None)]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nCommit: ", env!("FASTLY_TLS_GIT_HASH"),
    "\nBuilt: ", env!("FASTLY_TLS_BUILD_TIME")
))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override Fastly API URI
    #[arg(short = 'u', long, global = true, env = "FASTLY_API_URI")]
    api_uri: Option<String>,

    /// Override the FASTLY_API_KEY config var
    #[arg(short = 'k', long, global = true, env = "FASTLY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds (transport default when unset)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add Fastly TLS to DOMAIN
    #[command(long_about = r#"
DOMAIN will be added to a Fastly SAN TLS certificate issued by Let's Encrypt.

Requirements:
 - The Fastly service must have DOMAIN configured in the active version
 - The pricing plan must include TLS domain(s)
 - Wildcard domains are not allowed

EXAMPLES:
  fastly-tls create www.example.org
    "#)]
    Create {
        /// The domain to configure TLS for
        domain: String,
    },
    /// Check the status of the TLS subscription for DOMAIN
    Verify {
        /// The domain to check
        domain: String,
    },
    /// Remove Fastly TLS from DOMAIN
    Delete {
        /// The domain to remove TLS from
        domain: String,
    },
    /// List TLS subscriptions on the account
    List,
    /// Show DNS guidance for one TLS subscription
    Show {
        /// Subscription id
        subscription_id: String,
    },
    /// Manage stored configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Store the default Fastly API key
    SetApiKey {
        /// Fastly API key
        api_key: String,
    },
    /// Print the stored Fastly API key
    GetApiKey,
    /// Remove the stored Fastly API key
    ClearApiKey,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fastly plugin execution error - {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manager = ConfigManager::new()?;

    let (operation, target) = match cli.command {
        Commands::Config { command } => return handle_config_command(&manager, command),
        Commands::Create { domain } => (Command::Lifecycle(Operation::Create), domain),
        Commands::Verify { domain } => (Command::Lifecycle(Operation::Verify), domain),
        Commands::Delete { domain } => (Command::Lifecycle(Operation::Delete), domain),
        Commands::List => (Command::List, String::new()),
        Commands::Show { subscription_id } => (Command::Show, subscription_id),
    };

    let stored = manager.load_for(cli.api_key.as_deref())?;
    let api_key = stored.resolve_api_key(cli.api_key.as_deref())?;
    let base_uri = stored.resolve_api_uri(cli.api_uri.as_deref());
    debug!(base_uri = %base_uri, "Resolved Fastly API configuration");

    let mut client_config = ClientConfig::new(api_key).with_base_uri(base_uri);
    if let Some(secs) = cli.timeout {
        client_config = client_config.with_timeout(Duration::from_secs(secs));
    }
    let client = FastlyClient::new(client_config).context("Failed to create Fastly API client")?;
    let controller = LifecycleController::new(client);

    let report: Report = match operation {
        Command::Lifecycle(operation) => controller.run(operation, &target).await?,
        Command::List => controller.list().await?,
        Command::Show => controller.show(&target).await?,
    };

    print!("{}", report);
    Ok(())
}

/// Commands that talk to the Fastly API
enum Command {
    Lifecycle(Operation),
    List,
    Show,
}

fn handle_config_command(manager: &ConfigManager, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::SetApiKey { api_key } => {
            manager.set_api_key(api_key)?;
            println!("API key saved to {}", manager.path().display());
            Ok(())
        }
        ConfigCommands::GetApiKey => {
            match manager.get_api_key()? {
                Some(api_key) => println!("{}", api_key),
                None => {
                    println!("No API key configured");
                    println!();
                    println!("Set one with:");
                    println!("   fastly-tls config set-api-key <KEY>");
                }
            }
            Ok(())
        }
        ConfigCommands::ClearApiKey => {
            manager.clear_api_key()?;
            println!("API key cleared");
            Ok(())
        }
    }
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

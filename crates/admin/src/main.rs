//! Userbridge operator CLI
//!
//! Validates, diagnoses and configures integration instances against the
//! host database.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use userbridge_admin::cli;
use userbridge_admin::config::Config;
use userbridge_admin::context::AdminContext;
use userbridge_admin::db;
use userbridge_admin::remote::HttpRemoteApi;
use userbridge_admin::source_db::PgDatabaseFactory;
use userbridge_admin::store::PgConfigStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List integration instances.
    List,

    /// Create an unconfigured instance of a plugin.
    Register { instance: String, plugin: String },

    /// Validate an instance and record the result as its status.
    Check { instance: String },

    /// Log advisory diagnostics for an instance.
    Debug {
        instance: String,

        /// Host name admin requests are served under (default: SERVER_NAME).
        #[arg(long)]
        server_name: Option<String>,
    },

    /// Save params given as KEY=VALUE.
    Save {
        instance: String,

        #[arg(required = true)]
        params: Vec<String>,

        /// Merge over the stored params instead of replacing them.
        #[arg(long)]
        wizard: bool,
    },

    /// Set the status code of an instance.
    Status { instance: String, status: i16 },

    /// Create or update the instance table.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    let pool = db::create_pool(&config).await?;
    let ctx = || build_context(&config, pool.clone());

    match args.command {
        Command::List => cli::cmd_list(&ctx()).await,
        Command::Register { instance, plugin } => {
            cli::cmd_register(&ctx(), &instance, &plugin).await
        }
        Command::Check { instance } => cli::cmd_check(&ctx(), &instance).await,
        Command::Debug {
            instance,
            server_name,
        } => {
            let server_name = server_name.unwrap_or_else(|| config.server_name.clone());
            cli::cmd_debug(&ctx(), &instance, &server_name).await
        }
        Command::Save {
            instance,
            params,
            wizard,
        } => cli::cmd_save(&ctx(), &instance, &params, wizard).await,
        Command::Status { instance, status } => cli::cmd_status(&ctx(), &instance, status).await,
        Command::Migrate => {
            db::run_migrations(&pool).await?;
            info!("migrations applied");
            Ok(())
        }
    }
}

/// Wire the production collaborators into an admin context.
fn build_context(config: &Config, pool: PgPool) -> AdminContext {
    let remote = HttpRemoteApi::new(Duration::from_secs(config.api_timeout_secs))
        .with_endpoints(&config.api_endpoints);

    AdminContext::new(
        Arc::new(PgConfigStore::new(pool)),
        Arc::new(PgDatabaseFactory::default()),
        Arc::new(remote),
    )
    .with_plugins_dir(config.plugins_dir.clone())
    .with_host_instance(config.host_instance.clone())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

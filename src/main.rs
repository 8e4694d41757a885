use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use todolist::config::{Config, StoreBackend};
use todolist::logging::init_tracing;
use todolist::server::TodoServer;
use todolist::store::{open_store, SqliteItemStore};

#[derive(Parser, Debug)]
#[command(name = "todolist", version, about = "Server-rendered to-do list")]
struct Cli {
    /// Path to the config file (default: ~/.config/todolist/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the bind address (host:port)
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Override the SQLite database path
    #[arg(long, value_name = "PATH", conflicts_with = "memory")]
    database: Option<String>,

    /// Keep items in memory instead of SQLite
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending schema migrations and exit
    Migrate,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(&config),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().with_context(|| {
            format!("loading config from {}", Config::config_path().display())
        })?,
    };

    if let Some(bind) = &cli.bind {
        config.server.bind_addr = bind.clone();
    }
    if let Some(database) = &cli.database {
        config.database.backend = StoreBackend::Sqlite;
        config.database.path = database.clone();
    }
    if cli.memory {
        config.database.backend = StoreBackend::Memory;
    }

    config.validate().context("invalid command-line overrides")?;
    Ok(config)
}

async fn serve(config: Config) -> Result<()> {
    let store = open_store(&config.database)
        .with_context(|| format!("opening database {}", config.database.path))?;

    let mut server = TodoServer::new(&config, store)?;
    let addr = server.try_bind().await?;
    tracing::info!("Listening on http://{}", addr);

    server.run().await?;
    Ok(())
}

fn migrate(config: &Config) -> Result<()> {
    if config.database.backend == StoreBackend::Memory {
        anyhow::bail!("nothing to migrate for the in-memory store");
    }

    let report = SqliteItemStore::migrate(&config.database.path)
        .with_context(|| format!("migrating {}", config.database.path))?;
    println!(
        "Applied {} migration(s); {} is at schema version {}",
        report.applied, config.database.path, report.schema_version
    );
    Ok(())
}

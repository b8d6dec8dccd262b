//! Multi-table poker server.
//!
//! Spawns table actors managed by a `TableManager` and serves them over
//! HTTP.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Error};
use pico_args::Arguments;
use poker_table::{TableConfig, TableManager};
use pt_server::{api, config::ServerConfig, logging};

const HELP: &str = "\
Run a multi-table poker server

USAGE:
  pt_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --tables     N           Number of tables to create  [default: env INITIAL_TABLES or 1]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                 Server bind address (e.g., 0.0.0.0:8080)
  MAX_TABLES                  Most tables open at once [default: 100]
  INITIAL_TABLES              Tables created on startup
  TABLE_MAX_PLAYERS           Seats per table [default: 10]
  TABLE_SMALL_BLIND           Small blind [default: 25]
  TABLE_BIG_BLIND             Big blind [default: 50]
  TABLE_ACTION_TIMEOUT_SECS   Seconds to act before timing out [default: 30]
  TABLE_AUTO_ADVANCE          Deal streets and settle without explicit calls [default: false]
  TABLE_SEED                  Fixed shuffle seed, for reproducible tables
  RUST_LOG                    Log filter [default: info]
";

struct Args {
    bind: Option<SocketAddr>,
    num_tables: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        num_tables: pargs.opt_value_from_str("--tables")?,
    };
    let remaining = pargs.finish();

    logging::init();
    if !remaining.is_empty() {
        tracing::warn!("Ignoring unknown arguments: {remaining:?}");
    }

    let config = ServerConfig::from_env(args.bind, args.num_tables)?;
    config.validate()?;
    tracing::info!("Starting poker server at {}", config.bind);

    let table_manager = Arc::new(TableManager::new(config.max_tables));

    tracing::info!("Creating {} initial table(s)...", config.num_tables);
    for i in 0..config.num_tables {
        let table_config = TableConfig {
            name: format!("Table {}", i + 1),
            ..config.table_defaults.clone()
        };

        match table_manager.create_table(table_config).await {
            Ok(table_id) => {
                tracing::info!("Created table {} with ID {}", i + 1, table_id);
            }
            Err(e) => {
                tracing::error!("Failed to create table {}: {}", i + 1, e);
            }
        }
    }

    for table in table_manager.list_tables().await {
        tracing::info!(
            "  - {} (ID: {}) - {}/{} players, blinds: {}/{}",
            table.name,
            table.id,
            table.player_count,
            table.max_players,
            table.small_blind,
            table.big_blind
        );
    }

    let api_state = api::AppState {
        table_manager,
        table_defaults: config.table_defaults.clone(),
    };
    let app = api::create_router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {err}");
        std::future::pending::<()>().await;
    }
}

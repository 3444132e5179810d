//! Toodoo API server binary.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use toodoo_core::notify::{LogNotifier, Notifier, SmtpNotifier};
use toodoo_core::store::{MemoryStore, PgStore, Store};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "toodoo_api_server", about = "Toodoo API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3100")]
    bind: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/toodoo"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep all data in process memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    in_memory: bool,

    /// Base URL of the web client, used in invitation links.
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:4200")]
    frontend_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,toodoo_api=debug,toodoo_core=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = toodoo_api::config::ApiConfig::from_env();
    config.bind_addr = args.bind;
    config.pg_connection_url = args.database_url;
    config.frontend_url = args.frontend_url;

    info!(bind = %config.bind_addr, in_memory = args.in_memory, "starting toodoo_api_server");

    let store: Arc<dyn Store> = if args.in_memory {
        warn!("in-memory store: data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        info!(max_connections = args.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&config.pg_connection_url)
            .await?;

        info!("running database migrations");
        toodoo_api::migrate(&pool).await?;
        Arc::new(PgStore::new(pool))
    };

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, port = smtp.port, "delivering mail over SMTP");
            Arc::new(SmtpNotifier::new(smtp, config.frontend_url.clone())?)
        }
        None => {
            info!("SMTP_HOST not set, mail will only be logged");
            Arc::new(LogNotifier::new(config.frontend_url.clone()))
        }
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let app = toodoo_api::router(toodoo_api::AppState {
        store,
        notifier,
        config,
    });

    info!(addr = %local_addr, "REST API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}

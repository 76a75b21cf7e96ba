mod body;
mod clock;
mod config;
mod content;
mod error;
mod handlers;
mod middleware;
mod models;
mod state;
mod stores;
#[cfg(test)]
mod test_utils;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::http;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    clock::SystemClock,
    config::Config,
    content::Reaper,
    middleware::rate_limit::spawn_prune_task,
    state::AppState,
    stores::{InMemoryRateLimiter, LocalFileStore, MIGRATOR, SqliteContentStore, Stores},
};

#[derive(Parser)]
#[command(name = "api")]
#[command(about = "Vanish API server")]
struct Args {
    /// Run database migrations and exit
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = envy::prefixed("VANISH_").from_env::<Config>()?;

    // Initialize Sentry for error tracking (must be done early, guard must stay alive)
    let _sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(config.env.clone().into()),
                ..Default::default()
            },
        ))
    });

    // Set up tracing: JSON in production, human-readable otherwise
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }

    let database = stores::connect_sqlite(&config.database_url, 5).await?;

    tracing::info!("Running database migrations...");
    MIGRATOR.run(&database).await?;
    tracing::info!("Migrations complete");
    if args.migrate {
        return Ok(());
    }

    let files = LocalFileStore::new(&config.upload_dir);
    files.init().await?;

    let stores = Stores {
        contents: Arc::new(SqliteContentStore::new(database.clone())),
        files: Arc::new(files),
        rate_limiter: Arc::new(InMemoryRateLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )),
    };

    let state = AppState {
        config: config.clone(),
        stores: stores.clone(),
        clock: Arc::new(SystemClock),
    };

    // Background tasks, stopped after the server has drained
    let shutdown = CancellationToken::new();
    let reaper = Reaper::new(stores.contents.clone(), stores.files.clone(), state.clock.clone())
        .spawn(
            Duration::from_secs(config.reap_interval_secs),
            shutdown.clone(),
        );
    let pruner = spawn_prune_task(
        stores.rate_limiter.clone(),
        Duration::from_secs(config.rate_limit_window_secs),
        shutdown.clone(),
    );

    // Request ID header name
    let x_request_id = http::HeaderName::from_static("x-request-id");

    let cors = if config.is_production() {
        CorsLayer::new()
    } else {
        CorsLayer::permissive()
    };

    let app = handlers::router(state)
        // Request ID: generate UUID, include in logs, return in response
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &http::Request<axum::body::Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            },
        ))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(handlers::body_limit(&config)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    shutdown.cancel();
    let _ = tokio::join!(reaper, pruner);
    database.close().await;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

//! API server entry point.

use std::sync::Arc;

use async_trait::async_trait;
use domain::dispatch::HandlerError;
use domain::{EventDispatcher, InMemoryVehicleRepository, VehicleEvent, VehicleEventHandler};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vehicle_store::PgVehicleRepository;

use api::config::Config;

/// Logs every committed domain event and bumps the event counter.
struct EventTelemetry;

#[async_trait]
impl VehicleEventHandler for EventTelemetry {
    fn name(&self) -> &'static str {
        "event-telemetry"
    }

    async fn handle(&self, event: &VehicleEvent) -> Result<(), HandlerError> {
        metrics::counter!("fleet_events_total", "event" => event.event_type()).increment(1);
        tracing::info!(event = event.event_type(), "domain event committed");
        Ok(())
    }
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve(app: axum::Router, addr: &str) {
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.log_level.clone())
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick a repository backend and build the application
    let dispatcher = EventDispatcher::new().on_any(Arc::new(EventTelemetry));
    let app = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to Postgres");
            let repository = PgVehicleRepository::with_dispatcher(pool, dispatcher);
            repository
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using Postgres repository");
            api::create_app(api::create_state(repository), metrics_handle)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory repository");
            let repository = InMemoryVehicleRepository::with_dispatcher(dispatcher);
            api::create_app(api::create_state(repository), metrics_handle)
        }
    };

    // 4. Start server
    serve(app, &config.addr()).await;
}

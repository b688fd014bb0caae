//! Console telemetry simulator.
//!
//! Seeds a small fleet and feeds it randomized GPS pings on a fixed
//! tick, exercising the location-update path end to end. Runs against
//! Postgres when `DATABASE_URL` is set, otherwise in memory.
//!
//! Environment:
//! - `FLEET_SIZE` — vehicles to seed (default: 10)
//! - `TICK_MS` — milliseconds between ping rounds (default: 1000)
//! - `DATABASE_URL` — optional Postgres connection string

use rand::Rng;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use domain::{
    InMemoryVehicleRepository, Location, Vehicle, VehicleRepository, VehicleStatus,
};
use vehicle_store::PgVehicleRepository;

// Seed fleet spreads out around central Amsterdam.
const CENTER_LAT: f64 = 52.3702;
const CENTER_LON: f64 = 4.8952;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Clamped coordinate jitter so pings never leave the valid range.
fn jitter(latitude: f64, longitude: f64) -> (f64, f64) {
    let mut rng = rand::thread_rng();
    let lat = (latitude + rng.gen_range(-0.002..=0.002)).clamp(-90.0, 90.0);
    let lon = (longitude + rng.gen_range(-0.002..=0.002)).clamp(-180.0, 180.0);
    (lat, lon)
}

async fn seed_fleet<R: VehicleRepository>(repository: &R, size: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(size);
    for n in 0..size {
        let id = format!("sim-car-{n:03}");
        let (lat, lon) = jitter(CENTER_LAT, CENTER_LON);
        let location = Location::new(lat, lon).expect("jitter stays in range");
        let mut vehicle =
            Vehicle::new(id.clone(), location, VehicleStatus::Available).expect("valid seed id");
        repository
            .save(&mut vehicle)
            .await
            .expect("failed to seed fleet");
        ids.push(id);
    }
    ids
}

async fn ping_round<R: VehicleRepository>(repository: &R, ids: &[String]) {
    for id in ids {
        let found = repository
            .get_by_id(&id.as_str().into())
            .await
            .expect("failed to load vehicle");
        let Some(mut vehicle) = found else {
            tracing::warn!(vehicle_id = %id, "vehicle disappeared, skipping ping");
            continue;
        };

        let (lat, lon) = jitter(vehicle.location().latitude(), vehicle.location().longitude());
        let location = Location::new(lat, lon).expect("jitter stays in range");
        vehicle.update_location(location);
        repository
            .save(&mut vehicle)
            .await
            .expect("failed to save ping");

        tracing::debug!(vehicle_id = %id, latitude = lat, longitude = lon, "ping");
    }
}

async fn run<R: VehicleRepository>(repository: R, fleet_size: usize, tick_ms: u64) {
    let ids = seed_fleet(&repository, fleet_size).await;
    tracing::info!(fleet_size, tick_ms, "fleet seeded, starting pings");

    let mut interval = tokio::time::interval(std::time::Duration::from_millis(tick_ms));
    let mut rounds: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                ping_round(&repository, &ids).await;
                rounds += 1;
                if rounds % 10 == 0 {
                    tracing::info!(rounds, "simulation running");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(rounds, "stopping simulator");
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let fleet_size: usize = env_or("FLEET_SIZE", 10);
    let tick_ms: u64 = env_or("TICK_MS", 1000);

    match std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()) {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await
                .expect("failed to connect to Postgres");
            let repository = PgVehicleRepository::new(pool);
            repository
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("simulating against Postgres");
            run(repository, fleet_size, tick_ms).await;
        }
        None => {
            tracing::info!("DATABASE_URL not set, simulating in memory");
            run(InMemoryVehicleRepository::new(), fleet_size, tick_ms).await;
        }
    }
}

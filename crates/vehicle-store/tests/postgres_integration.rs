//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p vehicle-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use domain::{
    Location, UserId, Vehicle, VehicleId, VehicleRepository, VehicleStatus,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use vehicle_store::PgVehicleRepository;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema setup
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../migrations/001_create_vehicles_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh repository with its own pool and a cleared table
async fn get_test_repo() -> PgVehicleRepository {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE vehicles")
        .execute(&pool)
        .await
        .unwrap();

    PgVehicleRepository::new(pool)
}

fn make_vehicle(id: &str, lat: f64, lon: f64, status: VehicleStatus) -> Vehicle {
    Vehicle::new(id, Location::new(lat, lon).unwrap(), status).unwrap()
}

#[tokio::test]
async fn save_and_reload_round_trips() {
    let repo = get_test_repo().await;

    let mut vehicle = make_vehicle("car-1", 52.3676, 4.9041, VehicleStatus::Available);
    repo.save(&mut vehicle).await.unwrap();

    let loaded = repo
        .get_by_id(&VehicleId::new("car-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.id().as_str(), "car-1");
    assert_eq!(loaded.status(), VehicleStatus::Available);
    assert_eq!(loaded.location().latitude(), 52.3676);
    assert_eq!(loaded.location().longitude(), 4.9041);
}

#[tokio::test]
async fn get_by_id_absent_returns_none() {
    let repo = get_test_repo().await;
    let result = repo.get_by_id(&VehicleId::new("ghost")).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn status_patch_preserves_externally_written_fields() {
    let repo = get_test_repo().await;

    let mut vehicle = make_vehicle("car-1", 52.37, 4.90, VehicleStatus::Available);
    repo.save(&mut vehicle).await.unwrap();

    // A telemetry producer moves the vehicle and writes its own fields.
    sqlx::query(
        "UPDATE vehicles SET latitude = $1, longitude = $2, telemetry = $3 WHERE id = 'car-1'",
    )
    .bind(48.85)
    .bind(2.35)
    .bind(serde_json::json!({"battery": 77}))
    .execute(repo.pool())
    .await
    .unwrap();

    // Our copy still has the stale coordinates; only status changed.
    vehicle.update_status(VehicleStatus::Maintenance).unwrap();
    repo.save(&mut vehicle).await.unwrap();

    let loaded = repo
        .get_by_id(&VehicleId::new("car-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.status(), VehicleStatus::Maintenance);
    assert_eq!(loaded.location().latitude(), 48.85);
    assert_eq!(loaded.location().longitude(), 2.35);

    let telemetry: serde_json::Value =
        sqlx::query_scalar("SELECT telemetry FROM vehicles WHERE id = 'car-1'")
            .fetch_one(repo.pool())
            .await
            .unwrap();
    assert_eq!(telemetry, serde_json::json!({"battery": 77}));
}

#[tokio::test]
async fn status_patch_falls_back_to_upsert_for_missing_row() {
    let repo = get_test_repo().await;

    let mut vehicle = make_vehicle("car-new", 10.0, 20.0, VehicleStatus::Available);
    vehicle.update_status(VehicleStatus::OutOfService).unwrap();

    repo.save(&mut vehicle).await.unwrap();

    let loaded = repo
        .get_by_id(&VehicleId::new("car-new"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.status(), VehicleStatus::OutOfService);
    assert_eq!(loaded.location().latitude(), 10.0);
}

#[tokio::test]
async fn full_save_leaves_passenger_columns_alone() {
    let repo = get_test_repo().await;

    let mut vehicle = make_vehicle("car-1", 10.0, 10.0, VehicleStatus::Available);
    repo.save(&mut vehicle).await.unwrap();

    sqlx::query("UPDATE vehicles SET user_id = 'alice', telemetry = '{\"odo\": 9}' WHERE id = 'car-1'")
        .execute(repo.pool())
        .await
        .unwrap();

    vehicle.update_location(Location::new(11.0, 11.0).unwrap());
    repo.save(&mut vehicle).await.unwrap();

    let (user_id, telemetry): (Option<String>, serde_json::Value) =
        sqlx::query_as("SELECT user_id, telemetry FROM vehicles WHERE id = 'car-1'")
            .fetch_one(repo.pool())
            .await
            .unwrap();
    assert_eq!(user_id.as_deref(), Some("alice"));
    assert_eq!(telemetry, serde_json::json!({"odo": 9}));

    let loaded = repo
        .get_by_id(&VehicleId::new("car-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.location().latitude(), 11.0);
}

#[tokio::test]
async fn get_by_user_id_filters_on_association() {
    let repo = get_test_repo().await;

    let mut rented = make_vehicle("car-1", 1.0, 1.0, VehicleStatus::Rented);
    let mut free = make_vehicle("car-2", 2.0, 2.0, VehicleStatus::Available);
    repo.save(&mut rented).await.unwrap();
    repo.save(&mut free).await.unwrap();

    sqlx::query("UPDATE vehicles SET user_id = 'alice' WHERE id = 'car-1'")
        .execute(repo.pool())
        .await
        .unwrap();

    let vehicles = repo.get_by_user_id(&UserId::new("alice")).await.unwrap();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].id().as_str(), "car-1");

    let vehicles = repo.get_by_user_id(&UserId::new("bob")).await.unwrap();
    assert!(vehicles.is_empty());
}

#[tokio::test]
async fn get_nearby_uses_great_circle_distance() {
    let repo = get_test_repo().await;

    // Amsterdam and Paris, ~430 km apart.
    let mut ams = make_vehicle("ams", 52.3676, 4.9041, VehicleStatus::Available);
    let mut par = make_vehicle("par", 48.8566, 2.3522, VehicleStatus::Available);
    repo.save(&mut ams).await.unwrap();
    repo.save(&mut par).await.unwrap();

    let center = Location::new(52.35, 4.91).unwrap();

    let found = repo.get_nearby(center, 50.0).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id().as_str(), "ams");

    let found = repo.get_nearby(center, 500.0).await.unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn get_nearby_includes_vehicle_at_center() {
    let repo = get_test_repo().await;

    let mut vehicle = make_vehicle("car-1", 52.37, 4.90, VehicleStatus::Available);
    repo.save(&mut vehicle).await.unwrap();

    let center = Location::new(52.37, 4.90).unwrap();
    let found = repo.get_nearby(center, 0.001).await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn corrupt_status_surfaces_as_corrupt_document() {
    let repo = get_test_repo().await;

    let mut vehicle = make_vehicle("car-1", 1.0, 1.0, VehicleStatus::Available);
    repo.save(&mut vehicle).await.unwrap();

    sqlx::query("UPDATE vehicles SET status = 'Exploded' WHERE id = 'car-1'")
        .execute(repo.pool())
        .await
        .unwrap();

    let err = repo.get_by_id(&VehicleId::new("car-1")).await.unwrap_err();
    assert!(matches!(
        err,
        domain::RepositoryError::CorruptDocument { .. }
    ));
}

use std::sync::Arc;

use async_trait::async_trait;
use common::{UserId, VehicleId};
use domain::{
    EventDispatcher, Location, RepositoryError, Vehicle, VehicleEvent, VehicleRepository,
    VehicleStatus,
};
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQL vehicle repository.
#[derive(Clone)]
pub struct PgVehicleRepository {
    pool: PgPool,
    dispatcher: Arc<EventDispatcher>,
}

impl PgVehicleRepository {
    /// Creates a repository with no event handlers.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            dispatcher: Arc::new(EventDispatcher::new()),
        }
    }

    /// Creates a repository with the given dispatcher.
    pub fn with_dispatcher(pool: PgPool, dispatcher: EventDispatcher) -> Self {
        Self {
            pool,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    fn row_to_vehicle(row: &PgRow) -> Result<Vehicle, RepositoryError> {
        let id: String = row.try_get("id").map_err(RepositoryError::backend)?;
        let latitude: f64 = row.try_get("latitude").map_err(RepositoryError::backend)?;
        let longitude: f64 = row.try_get("longitude").map_err(RepositoryError::backend)?;
        let status: String = row.try_get("status").map_err(RepositoryError::backend)?;

        let corrupt = |reason: String| RepositoryError::CorruptDocument {
            vehicle_id: id.clone(),
            reason,
        };

        let status = VehicleStatus::parse(&status).map_err(|e| corrupt(e.to_string()))?;
        let location = Location::new(latitude, longitude).map_err(|e| corrupt(e.to_string()))?;
        Vehicle::new(id.as_str(), location, status).map_err(|e| corrupt(e.to_string()))
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn get_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, latitude, longitude, status FROM vehicles WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        row.as_ref().map(Self::row_to_vehicle).transpose()
    }

    async fn get_by_user_id(&self, user_id: &UserId) -> Result<Vec<Vehicle>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, latitude, longitude, status FROM vehicles WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        rows.iter().map(Self::row_to_vehicle).collect()
    }

    async fn get_nearby(
        &self,
        center: Location,
        radius_km: f64,
    ) -> Result<Vec<Vehicle>, RepositoryError> {
        // Haversine in SQL; the acos argument is clamped against
        // floating-point drift at identical coordinates.
        let rows = sqlx::query(
            r#"
            SELECT id, latitude, longitude, status
            FROM vehicles
            WHERE 6371.0 * acos(least(1.0, greatest(-1.0,
                      cos(radians($1)) * cos(radians(latitude))
                        * cos(radians(longitude) - radians($2))
                      + sin(radians($1)) * sin(radians(latitude))
                  ))) <= $3
            "#,
        )
        .bind(center.latitude())
        .bind(center.longitude())
        .bind(radius_km)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        rows.iter().map(Self::row_to_vehicle).collect()
    }

    async fn save(&self, vehicle: &mut Vehicle) -> Result<(), RepositoryError> {
        let status_only = !vehicle.pending_events().is_empty()
            && vehicle
                .pending_events()
                .iter()
                .all(|e| matches!(e, VehicleEvent::StatusChanged(_)));

        if status_only {
            // Narrow patch: leave latitude/longitude and the passenger
            // columns exactly as stored.
            let result = sqlx::query(
                "UPDATE vehicles SET status = $2, updated_at = now() WHERE id = $1",
            )
            .bind(vehicle.id().as_str())
            .bind(vehicle.status().as_str())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

            if result.rows_affected() == 0 {
                self.upsert(vehicle).await?;
            }
        } else {
            self.upsert(vehicle).await?;
        }

        let events = vehicle.drain_events();
        tracing::debug!(
            vehicle_id = %vehicle.id(),
            event_count = events.len(),
            "vehicle saved, dispatching events"
        );
        self.dispatcher.dispatch_all(&events).await;
        Ok(())
    }
}

impl PgVehicleRepository {
    // Upsert the aggregate-owned columns only; user_id and telemetry
    // keep whatever external producers last wrote.
    async fn upsert(&self, vehicle: &Vehicle) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, latitude, longitude, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                status = EXCLUDED.status,
                updated_at = now()
            "#,
        )
        .bind(vehicle.id().as_str())
        .bind(vehicle.location().latitude())
        .bind(vehicle.location().longitude())
        .bind(vehicle.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;
        Ok(())
    }
}

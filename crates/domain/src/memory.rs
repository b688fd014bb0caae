//! In-memory vehicle repository.
//!
//! Reference implementation of the repository port: a document map
//! behind an `RwLock`, linear-scan haversine for the proximity query.
//! Used by tests, the simulator, and the API when no database is
//! configured.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{UserId, VehicleId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::dispatch::EventDispatcher;
use crate::geo::Location;
use crate::repository::{RepositoryError, VehicleRepository};
use crate::vehicle::{Vehicle, VehicleEvent, VehicleStatus};

/// The stored shape of a vehicle.
///
/// `user_id` and `telemetry` are passenger fields: written by external
/// producers, never read or validated by the core. Saves must leave
/// them intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleDocument {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub telemetry: serde_json::Value,
}

impl VehicleDocument {
    /// Creates a document from aggregate state, with empty passenger fields.
    pub fn from_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id().as_str().to_string(),
            latitude: vehicle.location().latitude(),
            longitude: vehicle.location().longitude(),
            status: vehicle.status().as_str().to_string(),
            user_id: None,
            telemetry: serde_json::Value::Null,
        }
    }

    fn to_vehicle(&self) -> Result<Vehicle, RepositoryError> {
        let corrupt = |reason: String| RepositoryError::CorruptDocument {
            vehicle_id: self.id.clone(),
            reason,
        };

        let status = VehicleStatus::parse(&self.status).map_err(|e| corrupt(e.to_string()))?;
        let location =
            Location::new(self.latitude, self.longitude).map_err(|e| corrupt(e.to_string()))?;
        Vehicle::new(self.id.as_str(), location, status).map_err(|e| corrupt(e.to_string()))
    }
}

/// In-memory repository implementation.
#[derive(Clone, Default)]
pub struct InMemoryVehicleRepository {
    docs: Arc<RwLock<HashMap<String, VehicleDocument>>>,
    dispatcher: Arc<EventDispatcher>,
}

impl InMemoryVehicleRepository {
    /// Creates an empty repository with no event handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty repository with the given dispatcher.
    pub fn with_dispatcher(dispatcher: EventDispatcher) -> Self {
        Self {
            docs: Arc::new(RwLock::new(HashMap::new())),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Inserts a raw document, replacing any existing one with the same id.
    pub async fn seed(&self, document: VehicleDocument) {
        self.docs
            .write()
            .await
            .insert(document.id.clone(), document);
    }

    /// Returns a copy of the stored document for a vehicle, if any.
    pub async fn document(&self, id: &str) -> Option<VehicleDocument> {
        self.docs.read().await.get(id).cloned()
    }

    /// Returns the number of stored vehicles.
    pub async fn vehicle_count(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Removes all stored vehicles.
    pub async fn clear(&self) {
        self.docs.write().await.clear();
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn get_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        let docs = self.docs.read().await;
        docs.get(id.as_str()).map(|d| d.to_vehicle()).transpose()
    }

    async fn get_by_user_id(&self, user_id: &UserId) -> Result<Vec<Vehicle>, RepositoryError> {
        let docs = self.docs.read().await;
        let mut vehicles = Vec::new();
        for doc in docs.values() {
            if doc.user_id.as_deref() == Some(user_id.as_str()) {
                vehicles.push(doc.to_vehicle()?);
            }
        }
        Ok(vehicles)
    }

    async fn get_nearby(
        &self,
        center: Location,
        radius_km: f64,
    ) -> Result<Vec<Vehicle>, RepositoryError> {
        let docs = self.docs.read().await;
        let mut vehicles = Vec::new();
        for doc in docs.values() {
            let vehicle = doc.to_vehicle()?;
            if center.distance_km(&vehicle.location()) <= radius_km {
                vehicles.push(vehicle);
            }
        }
        Ok(vehicles)
    }

    async fn save(&self, vehicle: &mut Vehicle) -> Result<(), RepositoryError> {
        let status_only = !vehicle.pending_events().is_empty()
            && vehicle
                .pending_events()
                .iter()
                .all(|e| matches!(e, VehicleEvent::StatusChanged(_)));

        {
            let mut docs = self.docs.write().await;
            match docs.get_mut(vehicle.id().as_str()) {
                // Narrow patch: only the status field belongs to this
                // write, everything else stays as stored.
                Some(doc) if status_only => {
                    doc.status = vehicle.status().as_str().to_string();
                }
                Some(doc) => {
                    doc.latitude = vehicle.location().latitude();
                    doc.longitude = vehicle.location().longitude();
                    doc.status = vehicle.status().as_str().to_string();
                }
                None => {
                    let doc = VehicleDocument::from_vehicle(vehicle);
                    docs.insert(doc.id.clone(), doc);
                }
            }
        }

        // Write committed; drain and fan out exactly once.
        let events = vehicle.drain_events();
        self.dispatcher.dispatch_all(&events).await;
        Ok(())
    }
}

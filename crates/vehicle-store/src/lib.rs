//! PostgreSQL-backed implementation of the fleet repository port.
//!
//! Stores each vehicle as a single row ("document") keyed by id, with
//! opaque passenger columns (`user_id`, `telemetry`) owned by external
//! producers. Implements the same save protocol as the in-memory
//! reference: write, then dispatch drained domain events, then done.

mod postgres;

pub use postgres::PgVehicleRepository;

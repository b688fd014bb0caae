//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::InMemoryVehicleRepository;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

use api::routes::vehicles::AppState;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, Arc<AppState<InMemoryVehicleRepository>>) {
    let repository = InMemoryVehicleRepository::new();
    let state = api::create_state(repository);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn register_vehicle(app: &axum::Router, id: &str, lat: f64, lon: f64) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/vehicles",
            serde_json::json!({ "id": id, "latitude": lat, "longitude": lon }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_vehicle() {
    let (app, state) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/vehicles",
            serde_json::json!({ "id": "car-1", "latitude": 52.37, "longitude": 4.89 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = response_json(response).await;
    assert_eq!(json["id"], "car-1");
    assert_eq!(json["status"], "Available");
    assert_eq!(state.repository.vehicle_count().await, 1);
}

#[tokio::test]
async fn test_register_rejects_out_of_range_latitude() {
    let (app, _) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/vehicles",
            serde_json::json!({ "id": "car-1", "latitude": 95.0, "longitude": 4.89 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "InvalidLatitude");
}

#[tokio::test]
async fn test_nearby_returns_only_vehicles_in_radius() {
    let (app, _) = setup();

    // Amsterdam center and Paris; 50 km catches only the first.
    register_vehicle(&app, "car-ams", 52.3702, 4.8952).await;
    register_vehicle(&app, "car-par", 48.8566, 2.3522).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/vehicles/nearby?latitude=52.37&longitude=4.89&radius_km=50")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["car-ams"]);
}

#[tokio::test]
async fn test_nearby_rejects_non_positive_radius() {
    let (app, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/vehicles/nearby?latitude=52.37&longitude=4.89&radius_km=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "InvalidRadius");
}

#[tokio::test]
async fn test_rent_and_list_user_vehicles() {
    let (app, _) = setup();
    register_vehicle(&app, "car-1", 52.37, 4.89).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/vehicles/car-1/rent",
            serde_json::json!({ "user_id": "alice" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/alice/vehicles")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json[0]["id"], "car-1");
    assert_eq!(json[0]["status"], "Rented");
}

#[tokio::test]
async fn test_rent_missing_vehicle_is_404() {
    let (app, _) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/vehicles/ghost/rent",
            serde_json::json!({ "user_id": "alice" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "NotFound");
}

#[tokio::test]
async fn test_rent_unavailable_vehicle_is_400() {
    let (app, _) = setup();
    register_vehicle(&app, "car-1", 52.37, 4.89).await;

    let rent = |user: &str| {
        json_request(
            "POST",
            "/vehicles/car-1/rent",
            serde_json::json!({ "user_id": user }),
        )
    };
    let response = app.clone().oneshot(rent("alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(rent("bob")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "NotAvailable");
}

#[tokio::test]
async fn test_return_flow() {
    let (app, _) = setup();
    register_vehicle(&app, "car-1", 52.37, 4.89).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/vehicles/car-1/rent",
            serde_json::json!({ "user_id": "alice" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/vehicles/car-1/return",
            serde_json::json!({ "user_id": "alice" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Returning twice trips the not-rented guard.
    let response = app
        .oneshot(json_request(
            "POST",
            "/vehicles/car-1/return",
            serde_json::json!({ "user_id": "alice" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "NotRented");
}

fn status_request(id: &str, expected: &str, new: &str, role: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri(format!("/vehicles/{id}/status"))
        .header("content-type", "application/json");
    if let Some(role) = role {
        builder = builder.header("x-fleet-role", role);
    }
    builder
        .body(Body::from(
            serde_json::to_string(&serde_json::json!({
                "expected_status": expected,
                "new_status": new,
            }))
            .unwrap(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_technician_can_move_vehicle_to_maintenance() {
    let (app, _) = setup();
    register_vehicle(&app, "car-1", 52.37, 4.89).await;

    let response = app
        .oneshot(status_request(
            "car-1",
            "Available",
            "Maintenance",
            Some("technician"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_update_status_without_role_is_403() {
    let (app, _) = setup();
    register_vehicle(&app, "car-1", 52.37, 4.89).await;

    let response = app
        .oneshot(status_request("car-1", "Available", "Maintenance", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "InvalidRole");
}

#[tokio::test]
async fn test_user_cannot_move_vehicle_to_maintenance() {
    let (app, _) = setup();
    register_vehicle(&app, "car-1", 52.37, 4.89).await;

    let response = app
        .oneshot(status_request(
            "car-1",
            "Available",
            "Maintenance",
            Some("user"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "UnauthorizedTransition");
}

#[tokio::test]
async fn test_unrecognized_role_header_is_400() {
    let (app, _) = setup();
    register_vehicle(&app, "car-1", 52.37, 4.89).await;

    let response = app
        .oneshot(status_request(
            "car-1",
            "Available",
            "Maintenance",
            Some("janitor"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stale_expected_status_is_409() {
    let (app, _) = setup();
    register_vehicle(&app, "car-1", 52.37, 4.89).await;

    let response = app
        .clone()
        .oneshot(status_request(
            "car-1",
            "Available",
            "Maintenance",
            Some("technician"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Second writer still believes the vehicle is Available.
    let response = app
        .oneshot(status_request(
            "car-1",
            "Available",
            "OutOfService",
            Some("technician"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "ConcurrencyConflict");
}

#[tokio::test]
async fn test_transition_to_unknown_is_rejected() {
    let (app, _) = setup();
    register_vehicle(&app, "car-1", 52.37, 4.89).await;

    let response = app
        .oneshot(status_request(
            "car-1",
            "Available",
            "Unknown",
            Some("technician"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = response_json(response).await;
    assert_eq!(json["error"]["code"], "UnauthorizedTransition");
}

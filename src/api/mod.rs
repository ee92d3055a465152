// REST API with Axum
//
// Thin transport over the registry: parse, call one operation, map the
// result to a status. The registry and its persist step sit behind one
// mutex, so concurrent requests are serialized into a single writer.

use crate::registry::ObjectRegistry;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    registry: Arc<Mutex<ObjectRegistry>>,
}

impl AppState {
    pub fn new(registry: ObjectRegistry) -> Self {
        AppState {
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    /// Exclusive access to the registry. A panic in another request does not
    /// leave the registry half-written (every mutation flushes whole), so a
    /// poisoned lock is recovered.
    pub fn registry(&self) -> MutexGuard<'_, ObjectRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::NotFound { .. } | crate::Error::UnknownKind(_) => ApiError::NotFound,
            crate::Error::MalformedInput(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"}))).into_response()
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Internal(message) => {
                tracing::error!("Request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": message})),
                )
                    .into_response()
            }
        }
    }
}

// ============================================================================
// Router
// ============================================================================

/// End of every request: resync the registry from the store
async fn close_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let outcome = state.registry().close_session();
    tracing::debug!("Session closed: {:?}", outcome);
    response
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/status", get(routes::status))
        .route("/stats", get(routes::stats))
        // States
        .route("/states", get(routes::list_states).post(routes::create_state))
        .route(
            "/states/:state_id",
            get(routes::get_state)
                .put(routes::update_state)
                .delete(routes::delete_state),
        )
        // Cities
        .route(
            "/states/:state_id/cities",
            get(routes::list_cities_of_state).post(routes::create_city),
        )
        .route(
            "/cities/:city_id",
            get(routes::get_city)
                .put(routes::update_city)
                .delete(routes::delete_city),
        )
        // Amenities
        .route(
            "/amenities",
            get(routes::list_amenities).post(routes::create_amenity),
        )
        .route(
            "/amenities/:amenity_id",
            get(routes::get_amenity)
                .put(routes::update_amenity)
                .delete(routes::delete_amenity),
        )
        // Users
        .route("/users", get(routes::list_users).post(routes::create_user))
        .route(
            "/users/:user_id",
            get(routes::get_user)
                .put(routes::update_user)
                .delete(routes::delete_user),
        )
        // Places
        .route(
            "/cities/:city_id/places",
            get(routes::list_places_of_city).post(routes::create_place),
        )
        .route(
            "/places/:place_id",
            get(routes::get_place)
                .put(routes::update_place)
                .delete(routes::delete_place),
        )
        .route("/places_search", post(routes::search_places))
        // Reviews
        .route(
            "/places/:place_id/reviews",
            get(routes::list_reviews_of_place).post(routes::create_review),
        )
        .route(
            "/reviews/:review_id",
            get(routes::get_review)
                .put(routes::update_review)
                .delete(routes::delete_review),
        )
        // Place ↔ Amenity
        .route(
            "/places/:place_id/amenities",
            get(routes::list_amenities_of_place),
        )
        .route(
            "/places/:place_id/amenities/:amenity_id",
            post(routes::link_amenity).delete(routes::unlink_amenity),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .fallback(routes::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), close_session))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        backend: MemoryBackend,
    }

    impl TestApp {
        fn new() -> Self {
            let backend = MemoryBackend::new();
            let registry = ObjectRegistry::open(backend.clone());
            TestApp {
                router: router(AppState::new(registry)),
                backend,
            }
        }

        async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
            let body = match body {
                Some(value) => Body::from(value.to_string()),
                None => Body::empty(),
            };
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, bytes.to_vec())
        }

        async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let (status, bytes) = self.send(method, uri, body).await;
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }

        async fn create(&self, uri: &str, body: Value) -> String {
            let (status, value) = self.json(Method::POST, uri, Some(body)).await;
            assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", uri, value);
            value["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_status_and_unknown_route() {
        let app = TestApp::new();

        let (status, body) = app.json(Method::GET, "/api/v1/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "OK"}));

        let (status, body) = app.json(Method::GET, "/api/v1/nowhere", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not found"}));
    }

    #[tokio::test]
    async fn test_state_crud() {
        let app = TestApp::new();

        let id = app.create("/api/v1/states", json!({"name": "Oregon"})).await;
        assert!(app.backend.contents().is_some());

        let (status, body) = app.json(Method::GET, &format!("/api/v1/states/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Oregon");
        assert_eq!(body["__class__"], "State");

        let (status, body) = app
            .json(
                Method::PUT,
                &format!("/api/v1/states/{}", id),
                Some(json!({"name": "Nevada", "id": "hijack"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Nevada");
        assert_eq!(body["id"], json!(id));

        let (status, body) = app.json(Method::GET, "/api/v1/states", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = app
            .json(Method::DELETE, &format!("/api/v1/states/{}", id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (status, _) = app.json(Method::GET, &format!("/api/v1/states/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_bodies() {
        let app = TestApp::new();

        let (status, body) = app.send(Method::POST, "/api/v1/states", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Not a JSON".to_vec());

        let (status, body) = app
            .send(Method::POST, "/api/v1/states", Some(json!({"title": "x"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Missing name".to_vec());

        let (status, body) = app
            .send(Method::POST, "/api/v1/users", Some(json!({"email": "a@example.com"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, b"Missing password".to_vec());
    }

    #[tokio::test]
    async fn test_empty_object_is_not_json() {
        let app = TestApp::new();
        let id = app.create("/api/v1/states", json!({"name": "Oregon"})).await;

        for (method, uri) in [
            (Method::POST, "/api/v1/states".to_string()),
            (Method::PUT, format!("/api/v1/states/{}", id)),
            (Method::POST, "/api/v1/places_search".to_string()),
        ] {
            let (status, body) = app.send(method, &uri, Some(json!({}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body, b"Not a JSON".to_vec());
        }
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found_before_body() {
        let app = TestApp::new();

        let (status, body) = app.json(Method::PUT, "/api/v1/cities/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not found"}));

        let (status, _) = app
            .json(Method::PUT, "/api/v1/users/nope", Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_user_password_not_rendered() {
        let app = TestApp::new();
        let id = app
            .create(
                "/api/v1/users",
                json!({"email": "a@example.com", "password": "secret"}),
            )
            .await;

        let (_, body) = app.json(Method::GET, &format!("/api/v1/users/{}", id), None).await;
        assert_eq!(body["email"], "a@example.com");
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn test_nested_resources_and_search() {
        let app = TestApp::new();

        let oregon = app.create("/api/v1/states", json!({"name": "Oregon"})).await;
        let portland = app
            .create(
                &format!("/api/v1/states/{}/cities", oregon),
                json!({"name": "Portland"}),
            )
            .await;
        let user = app
            .create(
                "/api/v1/users",
                json!({"email": "a@example.com", "password": "pwd"}),
            )
            .await;
        let loft = app
            .create(
                &format!("/api/v1/cities/{}/places", portland),
                json!({"user_id": user, "name": "Loft"}),
            )
            .await;
        let wifi = app.create("/api/v1/amenities", json!({"name": "Wifi"})).await;

        // Unknown parent
        let (status, _) = app
            .json(
                Method::POST,
                "/api/v1/cities/nope/places",
                Some(json!({"user_id": user, "name": "Loft"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, cities) = app
            .json(Method::GET, &format!("/api/v1/states/{}/cities", oregon), None)
            .await;
        assert_eq!(cities.as_array().unwrap().len(), 1);

        // Link amenity: 201 then 200
        let link = format!("/api/v1/places/{}/amenities/{}", loft, wifi);
        let (status, _) = app.json(Method::POST, &link, None).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = app.json(Method::POST, &link, None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, amenities) = app
            .json(Method::GET, &format!("/api/v1/places/{}/amenities", loft), None)
            .await;
        assert_eq!(amenities[0]["id"], json!(wifi));

        // Review
        let review = app
            .create(
                &format!("/api/v1/places/{}/reviews", loft),
                json!({"user_id": user, "text": "Lovely"}),
            )
            .await;
        let (_, reviews) = app
            .json(Method::GET, &format!("/api/v1/places/{}/reviews", loft), None)
            .await;
        assert_eq!(reviews[0]["id"], json!(review));

        // Search
        let (status, found) = app
            .json(Method::POST, "/api/v1/places_search", Some(json!({"states": []})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (_, found) = app
            .json(
                Method::POST,
                "/api/v1/places_search",
                Some(json!({"states": [oregon], "amenities": [wifi]})),
            )
            .await;
        assert_eq!(found[0]["id"], json!(loft));

        let (_, found) = app
            .json(
                Method::POST,
                "/api/v1/places_search",
                Some(json!({"amenities": ["sauna"]})),
            )
            .await;
        assert!(found.as_array().unwrap().is_empty());

        // Unlink, then unlink again
        let (status, _) = app.json(Method::DELETE, &link, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.json(Method::DELETE, &link, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, stats) = app.json(Method::GET, "/api/v1/stats", None).await;
        assert_eq!(
            stats,
            json!({
                "amenities": 1,
                "cities": 1,
                "places": 1,
                "reviews": 1,
                "states": 1,
                "users": 1
            })
        );
    }

    #[tokio::test]
    async fn test_place_update_keeps_references() {
        let app = TestApp::new();
        let oregon = app.create("/api/v1/states", json!({"name": "Oregon"})).await;
        let portland = app
            .create(
                &format!("/api/v1/states/{}/cities", oregon),
                json!({"name": "Portland"}),
            )
            .await;
        let user = app
            .create(
                "/api/v1/users",
                json!({"email": "a@example.com", "password": "pwd"}),
            )
            .await;
        let loft = app
            .create(
                &format!("/api/v1/cities/{}/places", portland),
                json!({"user_id": user, "name": "Loft"}),
            )
            .await;

        let (status, body) = app
            .json(
                Method::PUT,
                &format!("/api/v1/places/{}", loft),
                Some(json!({"max_guest": 6, "city_id": "elsewhere"})),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["max_guest"], 6);
        assert_eq!(body["city_id"], json!(portland));

        let (status, body) = app
            .send(
                Method::PUT,
                &format!("/api/v1/places/{}", loft),
                Some(json!({"max_guest": "many"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8(body).unwrap().contains("max_guest"));
    }
}

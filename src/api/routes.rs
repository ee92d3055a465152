// HTTP handlers. Each one locks the registry, calls one core operation and
// renders the result; no rules live here.

use super::{ApiError, AppState};
use crate::entities::{Entity, Kind, Payload};
use crate::resolver::{Resolver, SearchFilter};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Helpers
// ============================================================================

/// Request body as a non-empty JSON object, or "Not a JSON"
fn json_object(body: &[u8]) -> ApiResult<Payload> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(ApiError::BadRequest("Not a JSON".to_string())),
    }
}

fn render(entity: &Entity) -> ApiResult<Value> {
    Ok(entity.to_public_json()?)
}

fn render_all(entities: &[Entity]) -> ApiResult<Json<Vec<Value>>> {
    let rendered = entities.iter().map(render).collect::<ApiResult<Vec<_>>>()?;
    Ok(Json(rendered))
}

fn list_kind(state: &AppState, kind: Kind) -> ApiResult<Json<Vec<Value>>> {
    let registry = state.registry();
    let mut entities: Vec<Entity> = registry.iter(Some(kind)).cloned().collect();
    entities.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())));
    render_all(&entities)
}

fn get_one(state: &AppState, kind: Kind, id: &str) -> ApiResult<Json<Value>> {
    let registry = state.registry();
    Ok(Json(render(registry.fetch(kind, id)?)?))
}

fn delete_one(state: &AppState, kind: Kind, id: &str) -> ApiResult<Json<Value>> {
    state.registry().remove(kind, id)?;
    Ok(Json(json!({})))
}

/// Unknown id is a 404 before the body is looked at.
fn update_one(state: &AppState, kind: Kind, id: &str, body: &[u8]) -> ApiResult<Json<Value>> {
    let mut registry = state.registry();
    registry.fetch(kind, id)?;
    let payload = json_object(body)?;
    let entity = registry.update(kind, id, &payload)?;
    Ok(Json(render(&entity)?))
}

fn created(entity: &Entity) -> ApiResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, Json(render(entity)?)))
}

fn create_top_level(state: &AppState, kind: Kind, body: &[u8]) -> ApiResult<(StatusCode, Json<Value>)> {
    let payload = json_object(body)?;
    let entity = state.registry().create(kind, &payload)?;
    created(&entity)
}

// ============================================================================
// Index
// ============================================================================

/// GET /status
pub async fn status() -> impl IntoResponse {
    Json(json!({"status": "OK"}))
}

/// GET /stats - count per collection
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry().stats())
}

/// Anything unrouted
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

// ============================================================================
// States
// ============================================================================

pub async fn list_states(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    list_kind(&state, Kind::State)
}

pub async fn get_state(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_one(&state, Kind::State, &id)
}

pub async fn create_state(State(state): State<AppState>, body: Bytes) -> ApiResult<(StatusCode, Json<Value>)> {
    create_top_level(&state, Kind::State, &body)
}

pub async fn update_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_one(&state, Kind::State, &id, &body)
}

pub async fn delete_state(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_one(&state, Kind::State, &id)
}

// ============================================================================
// Cities
// ============================================================================

/// GET /states/:state_id/cities
pub async fn list_cities_of_state(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let registry = state.registry();
    let cities = Resolver::new(&registry)
        .cities_of_state(&state_id)
        .ok_or(ApiError::NotFound)?;
    render_all(&cities)
}

/// POST /states/:state_id/cities
pub async fn create_city(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let payload = json_object(&body)?;
    let city = state.registry().create_city(&state_id, &payload)?;
    created(&city)
}

pub async fn get_city(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_one(&state, Kind::City, &id)
}

pub async fn update_city(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_one(&state, Kind::City, &id, &body)
}

pub async fn delete_city(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_one(&state, Kind::City, &id)
}

// ============================================================================
// Amenities
// ============================================================================

pub async fn list_amenities(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    list_kind(&state, Kind::Amenity)
}

pub async fn get_amenity(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_one(&state, Kind::Amenity, &id)
}

pub async fn create_amenity(State(state): State<AppState>, body: Bytes) -> ApiResult<(StatusCode, Json<Value>)> {
    create_top_level(&state, Kind::Amenity, &body)
}

pub async fn update_amenity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_one(&state, Kind::Amenity, &id, &body)
}

pub async fn delete_amenity(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_one(&state, Kind::Amenity, &id)
}

// ============================================================================
// Users
// ============================================================================

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    list_kind(&state, Kind::User)
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_one(&state, Kind::User, &id)
}

pub async fn create_user(State(state): State<AppState>, body: Bytes) -> ApiResult<(StatusCode, Json<Value>)> {
    create_top_level(&state, Kind::User, &body)
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_one(&state, Kind::User, &id, &body)
}

pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_one(&state, Kind::User, &id)
}

// ============================================================================
// Places
// ============================================================================

/// GET /cities/:city_id/places
pub async fn list_places_of_city(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let registry = state.registry();
    let places = Resolver::new(&registry)
        .places_of_city(&city_id)
        .ok_or(ApiError::NotFound)?;
    render_all(&places)
}

/// POST /cities/:city_id/places
pub async fn create_place(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let payload = json_object(&body)?;
    let place = state.registry().create_place(&city_id, &payload)?;
    created(&place)
}

pub async fn get_place(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_one(&state, Kind::Place, &id)
}

pub async fn update_place(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_one(&state, Kind::Place, &id, &body)
}

pub async fn delete_place(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_one(&state, Kind::Place, &id)
}

/// POST /places_search
pub async fn search_places(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Vec<Value>>> {
    let payload = json_object(&body)?;
    let filter: SearchFilter = serde_json::from_value(Value::Object(payload))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let registry = state.registry();
    let places = Resolver::new(&registry).search_places(&filter);
    render_all(&places)
}

// ============================================================================
// Reviews
// ============================================================================

/// GET /places/:place_id/reviews
pub async fn list_reviews_of_place(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let registry = state.registry();
    let reviews = Resolver::new(&registry)
        .reviews_of_place(&place_id)
        .ok_or(ApiError::NotFound)?;
    render_all(&reviews)
}

/// POST /places/:place_id/reviews
pub async fn create_review(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let payload = json_object(&body)?;
    let review = state.registry().create_review(&place_id, &payload)?;
    created(&review)
}

pub async fn get_review(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    get_one(&state, Kind::Review, &id)
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    update_one(&state, Kind::Review, &id, &body)
}

pub async fn delete_review(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    delete_one(&state, Kind::Review, &id)
}

// ============================================================================
// Place ↔ Amenity links
// ============================================================================

/// GET /places/:place_id/amenities
pub async fn list_amenities_of_place(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let registry = state.registry();
    let amenities = Resolver::new(&registry)
        .amenities_of(&place_id)
        .ok_or(ApiError::NotFound)?;
    render_all(&amenities)
}

/// POST /places/:place_id/amenities/:amenity_id - 201 when newly linked,
/// 200 when it already was
pub async fn link_amenity(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let (amenity, linked) = state.registry().link_amenity(&place_id, &amenity_id)?;
    let status = if linked { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(render(&amenity)?)))
}

/// DELETE /places/:place_id/amenities/:amenity_id
pub async fn unlink_amenity(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    state.registry().unlink_amenity(&place_id, &amenity_id)?;
    Ok(Json(json!({})))
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::rides::{
        CreateRideRequest, MyRideList, RideList, RideSearchQuery, RideWithDriver,
        UpdateRideStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Ride,
    response::ApiResponse,
    services::ride_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_ride))
        .route("/all", get(all_rides))
        .route("/search", get(search_rides))
        .route("/myrides", get(my_rides))
        .route("/status/{id}", patch(update_ride_status))
        .route("/{id}", delete(delete_ride))
}

#[utoipa::path(
    post,
    path = "/api/ride/create",
    request_body = CreateRideRequest,
    responses(
        (status = 201, description = "Ride created", body = ApiResponse<RideWithDriver>),
        (status = 400, description = "Invalid date/time or seats"),
        (status = 403, description = "Only drivers can create rides")
    ),
    security(("bearer_auth" = [])),
    tag = "Rides"
)]
pub async fn create_ride(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRideRequest>,
) -> AppResult<Json<ApiResponse<RideWithDriver>>> {
    let resp = ride_service::create_ride(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ride/all",
    responses(
        (status = 200, description = "All bookable rides", body = ApiResponse<RideList>)
    ),
    tag = "Rides"
)]
pub async fn all_rides(State(state): State<AppState>) -> AppResult<Json<ApiResponse<RideList>>> {
    let resp = ride_service::list_available(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ride/search",
    params(
        ("source" = Option<String>, Query, description = "Origin substring"),
        ("destination" = Option<String>, Query, description = "Destination substring")
    ),
    responses(
        (status = 200, description = "Matching rides", body = ApiResponse<RideList>),
        (status = 400, description = "Missing source or destination"),
        (status = 404, description = "No rides found")
    ),
    tag = "Rides"
)]
pub async fn search_rides(
    State(state): State<AppState>,
    Query(query): Query<RideSearchQuery>,
) -> AppResult<Json<ApiResponse<RideList>>> {
    let resp = ride_service::search_rides(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/ride/myrides",
    responses(
        (status = 200, description = "Rides published by the current driver", body = ApiResponse<MyRideList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Rides"
)]
pub async fn my_rides(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MyRideList>>> {
    let resp = ride_service::my_rides(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/ride/status/{id}",
    params(("id" = Uuid, Path, description = "Ride ID")),
    request_body = UpdateRideStatusRequest,
    responses(
        (status = 200, description = "Ride status updated", body = ApiResponse<Ride>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Ride not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Rides"
)]
pub async fn update_ride_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRideStatusRequest>,
) -> AppResult<Json<ApiResponse<Ride>>> {
    let resp = ride_service::update_ride_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/ride/{id}",
    params(("id" = Uuid, Path, description = "Ride ID")),
    responses(
        (status = 200, description = "Ride deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Ride not found"),
        (status = 409, description = "Ride has bookings")
    ),
    security(("bearer_auth" = [])),
    tag = "Rides"
)]
pub async fn delete_ride(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = ride_service::delete_ride(&state, &user, id).await?;
    Ok(Json(resp))
}

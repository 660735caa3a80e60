use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::vehicles::{AddVehicleRequest, UpdateVehicleRequest, VehicleList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Vehicle,
    response::ApiResponse,
    services::vehicle_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_vehicle))
        .route("/my-vehicles", get(my_vehicles))
        .route("/{id}", put(update_vehicle).delete(delete_vehicle))
}

#[utoipa::path(
    post,
    path = "/api/vehicle/add",
    request_body = AddVehicleRequest,
    responses(
        (status = 201, description = "Vehicle added", body = ApiResponse<Vehicle>),
        (status = 403, description = "Not a driver"),
        (status = 409, description = "License plate already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
pub async fn add_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddVehicleRequest>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let resp = vehicle_service::add_vehicle(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vehicle/my-vehicles",
    responses(
        (status = 200, description = "Vehicles for the current driver", body = ApiResponse<VehicleList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
pub async fn my_vehicles(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<VehicleList>>> {
    let resp = vehicle_service::list_my_vehicles(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/vehicle/{id}",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = ApiResponse<Vehicle>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Vehicle not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVehicleRequest>,
) -> AppResult<Json<ApiResponse<Vehicle>>> {
    let resp = vehicle_service::update_vehicle(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/vehicle/{id}",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Vehicle not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = vehicle_service::delete_vehicle(&state, &user, id).await?;
    Ok(Json(resp))
}

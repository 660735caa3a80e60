use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::reviews::{AddReviewRequest, DriverReviews},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    services::review_service,
    state::AppState,
};

// Mounted alongside the booking routes: reviews hang off bookings.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/review/{id}", post(add_review))
        .route("/driver-reviews/{driver_id}", get(driver_reviews))
}

#[utoipa::path(
    post,
    path = "/api/booking/review/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = AddReviewRequest,
    responses(
        (status = 201, description = "Review added", body = ApiResponse<Review>),
        (status = 400, description = "Rating out of range"),
        (status = 403, description = "Not the passenger of record"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Not completed yet, or already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn add_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::add_review(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/booking/driver-reviews/{driver_id}",
    params(("driver_id" = Uuid, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Reviews and aggregate rating for a driver", body = ApiResponse<DriverReviews>)
    ),
    tag = "Reviews"
)]
pub async fn driver_reviews(
    State(state): State<AppState>,
    Path(driver_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DriverReviews>>> {
    let resp = review_service::driver_reviews(&state, driver_id).await?;
    Ok(Json(resp))
}

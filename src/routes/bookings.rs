use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::bookings::{
        BookRideRequest, BookingDetail, BookingList, BookingWithPassenger,
        UpdateBookingStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/book", post(book_ride))
        .route("/my-bookings", get(my_bookings))
        .route("/status/{id}", patch(update_booking_status))
        .route("/cancel/{id}", delete(cancel_booking))
}

#[utoipa::path(
    post,
    path = "/api/booking/book",
    request_body = BookRideRequest,
    responses(
        (status = 201, description = "Seat reserved", body = ApiResponse<BookingDetail>),
        (status = 400, description = "Ride ID is required"),
        (status = 404, description = "Ride not found"),
        (status = 409, description = "Sold out, own ride, or already booked")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn book_ride(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BookRideRequest>,
) -> AppResult<Json<ApiResponse<BookingDetail>>> {
    let resp = booking_service::book_ride(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/booking/my-bookings",
    responses(
        (status = 200, description = "Bookings for the current passenger", body = ApiResponse<BookingList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn my_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::my_bookings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/booking/status/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingStatusRequest,
    responses(
        (status = 200, description = "Booking status updated", body = ApiResponse<BookingWithPassenger>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Only the ride driver can update"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> AppResult<Json<ApiResponse<BookingWithPassenger>>> {
    let resp = booking_service::update_booking_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/booking/cancel/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled"),
        (status = 403, description = "Not the passenger of record"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking already completed")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = booking_service::cancel_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

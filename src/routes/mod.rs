use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod bookings;
pub mod doc;
pub mod health;
pub mod reviews;
pub mod rides;
pub mod users;
pub mod vehicles;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/user", users::router())
        .nest("/vehicle", vehicles::router())
        .nest("/ride", rides::router())
        .nest("/booking", bookings::router().merge(reviews::router()))
}

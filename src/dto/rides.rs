use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::bookings::PassengerSummary;
use crate::models::{Review, Ride, Vehicle};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRideRequest {
    pub origin: String,
    pub destination: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Wall-clock time, `HH:MM`.
    pub time: String,
    pub price: f64,
    pub seats_available: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRideStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RideSearchQuery {
    pub source: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DriverSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub vehicles: Vec<Vehicle>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RideWithDriver {
    pub ride: Ride,
    pub driver: DriverSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RideList {
    pub items: Vec<RideWithDriver>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingForDriver {
    pub id: Uuid,
    pub status: String,
    pub passenger: PassengerSummary,
    pub review: Option<Review>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RideWithBookings {
    pub ride: Ride,
    pub bookings: Vec<BookingForDriver>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyRideList {
    pub items: Vec<RideWithBookings>,
}

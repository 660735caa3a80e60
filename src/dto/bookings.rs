use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::rides::DriverSummary;
use crate::models::{Booking, Review, Ride};

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookRideRequest {
    pub ride_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PassengerSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetail {
    pub booking: Booking,
    pub ride: Ride,
    pub driver: DriverSummary,
    pub review: Option<Review>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<BookingDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingWithPassenger {
    pub booking: Booking,
    pub passenger: PassengerSummary,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::bookings::PassengerSummary;
use crate::models::Review;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RideSummary {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewDetail {
    pub review: Review,
    pub passenger: PassengerSummary,
    pub ride: RideSummary,
}

/// Star-count histogram, keyed the way clients expect: "5" down to "1".
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct RatingDistribution {
    #[serde(rename = "5")]
    pub five: i64,
    #[serde(rename = "4")]
    pub four: i64,
    #[serde(rename = "3")]
    pub three: i64,
    #[serde(rename = "2")]
    pub two: i64,
    #[serde(rename = "1")]
    pub one: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DriverReviews {
    pub driver_id: Uuid,
    pub total_reviews: i64,
    pub average_rating: f64,
    pub rating_distribution: RatingDistribution,
    pub reviews: Vec<ReviewDetail>,
}

pub mod auth_service;
pub mod booking_service;
pub mod review_service;
pub mod ride_service;
pub mod user_service;
pub mod vehicle_service;

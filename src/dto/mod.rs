pub mod auth;
pub mod bookings;
pub mod reviews;
pub mod rides;
pub mod users;
pub mod vehicles;

use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        bookings::{
            BookRideRequest, BookingDetail, BookingList, BookingWithPassenger, PassengerSummary,
            UpdateBookingStatusRequest,
        },
        reviews::{AddReviewRequest, DriverReviews, RatingDistribution, ReviewDetail, RideSummary},
        rides::{
            BookingForDriver, CreateRideRequest, DriverSummary, MyRideList, RideList,
            RideWithBookings, RideWithDriver, UpdateRideStatusRequest,
        },
        users::{UpdateProfileRequest, UserPublic},
        vehicles::{AddVehicleRequest, UpdateVehicleRequest, VehicleList},
    },
    models::{Booking, BookingStatus, Review, Ride, RideStatus, Vehicle},
    response::{ApiResponse, Meta},
    routes::{auth, bookings, health, reviews, rides, users, vehicles},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::profile,
        users::update_profile,
        vehicles::add_vehicle,
        vehicles::my_vehicles,
        vehicles::update_vehicle,
        vehicles::delete_vehicle,
        rides::create_ride,
        rides::all_rides,
        rides::search_rides,
        rides::my_rides,
        rides::update_ride_status,
        rides::delete_ride,
        bookings::book_ride,
        bookings::my_bookings,
        bookings::update_booking_status,
        bookings::cancel_booking,
        reviews::add_review,
        reviews::driver_reviews
    ),
    components(
        schemas(
            UserPublic,
            Vehicle,
            Ride,
            Booking,
            Review,
            RideStatus,
            BookingStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            AddVehicleRequest,
            UpdateVehicleRequest,
            VehicleList,
            CreateRideRequest,
            UpdateRideStatusRequest,
            DriverSummary,
            RideWithDriver,
            RideList,
            BookingForDriver,
            RideWithBookings,
            MyRideList,
            BookRideRequest,
            UpdateBookingStatusRequest,
            PassengerSummary,
            BookingDetail,
            BookingList,
            BookingWithPassenger,
            AddReviewRequest,
            RatingDistribution,
            RideSummary,
            ReviewDetail,
            DriverReviews,
            Meta,
            ApiResponse<Ride>,
            ApiResponse<RideList>,
            ApiResponse<BookingDetail>,
            ApiResponse<BookingList>,
            ApiResponse<DriverReviews>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "User", description = "Profile endpoints"),
        (name = "Vehicles", description = "Driver vehicle registry"),
        (name = "Rides", description = "Ride publishing and discovery"),
        (name = "Bookings", description = "Seat reservation lifecycle"),
        (name = "Reviews", description = "Post-trip reviews and driver reputation"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

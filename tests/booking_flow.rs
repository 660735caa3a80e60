use axum_rideshare_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::bookings::{BookRideRequest, BookingDetail, UpdateBookingStatusRequest},
    dto::reviews::AddReviewRequest,
    dto::rides::{CreateRideRequest, RideSearchQuery, UpdateRideStatusRequest},
    entity::{Bookings, Rides, users::ActiveModel as UserActive},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{booking_service, review_service, ride_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

// Integration flows for the booking lifecycle. They need a real Postgres;
// set TEST_DATABASE_URL or DATABASE_URL to run them. All seeded rows use
// fresh UUID-based identifiers so tests can run concurrently.

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    Ok(Some(AppState { pool, orm }))
}

async fn create_user(state: &AppState, name: &str, is_driver: bool) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(format!("{name}-{}@example.com", Uuid::new_v4())),
        password_hash: Set("dummy".into()),
        phone: Set(Some("0800000000".into())),
        is_driver: Set(is_driver),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser { user_id: user.id })
}

async fn create_ride(
    state: &AppState,
    driver: &AuthUser,
    origin: &str,
    destination: &str,
    seats: i32,
) -> anyhow::Result<Uuid> {
    let resp = ride_service::create_ride(
        state,
        driver,
        CreateRideRequest {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: "2026-09-10".into(),
            time: "08:00".into(),
            price: 150000.0,
            seats_available: seats,
        },
    )
    .await?;
    Ok(resp.data.unwrap().ride.id)
}

async fn seats_left(state: &AppState, ride_id: Uuid) -> anyhow::Result<i32> {
    let ride = Rides::find_by_id(ride_id)
        .one(&state.orm)
        .await?
        .expect("ride exists");
    Ok(ride.seats_available)
}

async fn book(
    state: &AppState,
    user: &AuthUser,
    ride_id: Uuid,
) -> AppResult<ApiResponse<BookingDetail>> {
    booking_service::book_ride(
        state,
        user,
        BookRideRequest {
            ride_id: Some(ride_id),
        },
    )
    .await
}

#[tokio::test]
async fn seat_inventory_reserve_cancel_rebook() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let driver = create_user(&state, "driver", true).await?;
    let alice = create_user(&state, "alice", false).await?;
    let bob = create_user(&state, "bob", false).await?;
    let ride_id = create_ride(&state, &driver, "Jakarta", "Bandung", 1).await?;

    // Alice takes the last seat.
    let booking = book(&state, &alice, ride_id).await?.data.unwrap();
    assert_eq!(booking.booking.status, "PENDING");
    assert_eq!(booking.ride.seats_available, 0);
    assert_eq!(seats_left(&state, ride_id).await?, 0);

    // Bob finds the ride sold out.
    let err = book(&state, &bob, ride_id).await.unwrap_err();
    assert!(matches!(err, AppError::SoldOut), "got {err:?}");

    // Alice cancels, the seat returns, the booking row is gone.
    booking_service::cancel_booking(&state, &alice, booking.booking.id).await?;
    assert_eq!(seats_left(&state, ride_id).await?, 1);
    assert!(
        Bookings::find_by_id(booking.booking.id)
            .one(&state.orm)
            .await?
            .is_none()
    );

    // Now Bob can book.
    book(&state, &bob, ride_id).await?;
    assert_eq!(seats_left(&state, ride_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn duplicate_and_own_ride_bookings_conflict() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let driver = create_user(&state, "driver", true).await?;
    let alice = create_user(&state, "alice", false).await?;
    let ride_id = create_ride(&state, &driver, "Jakarta", "Semarang", 3).await?;

    let err = book(&state, &driver, ride_id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    book(&state, &alice, ride_id).await?;
    let err = book(&state, &alice, ride_id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
    assert_eq!(seats_left(&state, ride_id).await?, 2);

    // Missing ride id and unknown ride are reported distinctly.
    let err = booking_service::book_ride(&state, &alice, BookRideRequest { ride_id: None })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    let err = book(&state, &alice, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound), "got {err:?}");

    Ok(())
}

#[tokio::test]
async fn concurrent_reservations_sell_exactly_one_seat() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let driver = create_user(&state, "driver", true).await?;
    let alice = create_user(&state, "alice", false).await?;
    let bob = create_user(&state, "bob", false).await?;
    let ride_id = create_ride(&state, &driver, "Malang", "Surabaya", 1).await?;

    let (a, b) = tokio::join!(book(&state, &alice, ride_id), book(&state, &bob, ride_id));

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one reservation must win");
    let loser = if a.is_err() {
        a.unwrap_err()
    } else {
        b.unwrap_err()
    };
    assert!(matches!(loser, AppError::SoldOut), "got {loser:?}");
    assert_eq!(seats_left(&state, ride_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn ride_completion_cascades_and_unlocks_reviews() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let driver = create_user(&state, "driver", true).await?;
    let alice = create_user(&state, "alice", false).await?;
    let bob = create_user(&state, "bob", false).await?;
    let ride_id = create_ride(&state, &driver, "Bogor", "Bandung", 3).await?;

    let alice_booking = book(&state, &alice, ride_id).await?.data.unwrap().booking;
    let bob_booking = book(&state, &bob, ride_id).await?.data.unwrap().booking;

    // Reviews are locked while the booking is not completed.
    let err = review_service::add_review(
        &state,
        &alice,
        alice_booking.id,
        AddReviewRequest {
            rating: 5,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "got {err:?}");

    // Driver confirms Alice; Bob stays pending.
    booking_service::update_booking_status(
        &state,
        &driver,
        alice_booking.id,
        UpdateBookingStatusRequest {
            status: "CONFIRMED".into(),
        },
    )
    .await?;

    // Only the ride driver may touch booking status.
    let err = booking_service::update_booking_status(
        &state,
        &bob,
        alice_booking.id,
        UpdateBookingStatusRequest {
            status: "CONFIRMED".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden), "got {err:?}");

    // Unknown status values are rejected up front.
    let err = booking_service::update_booking_status(
        &state,
        &driver,
        alice_booking.id,
        UpdateBookingStatusRequest {
            status: "SHIPPED".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    // Completing the ride completes confirmed bookings only.
    ride_service::update_ride_status(
        &state,
        &driver,
        ride_id,
        UpdateRideStatusRequest {
            status: "COMPLETED".into(),
        },
    )
    .await?;

    let alice_row = Bookings::find_by_id(alice_booking.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(alice_row.status, "COMPLETED");
    let bob_row = Bookings::find_by_id(bob_booking.id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(bob_row.status, "PENDING");

    // Completed bookings cannot be cancelled.
    let err = booking_service::cancel_booking(&state, &alice, alice_booking.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "got {err:?}");

    // Rating bounds.
    for bad in [0, 6, -1] {
        let err = review_service::add_review(
            &state,
            &alice,
            alice_booking.id,
            AddReviewRequest {
                rating: bad,
                comment: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    }

    // Only the passenger of record may review.
    let err = review_service::add_review(
        &state,
        &bob,
        alice_booking.id,
        AddReviewRequest {
            rating: 4,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden), "got {err:?}");

    // First review lands, the second conflicts.
    review_service::add_review(
        &state,
        &alice,
        alice_booking.id,
        AddReviewRequest {
            rating: 5,
            comment: Some("Smooth trip".into()),
        },
    )
    .await?;
    let err = review_service::add_review(
        &state,
        &alice,
        alice_booking.id,
        AddReviewRequest {
            rating: 4,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    // The read-side aggregation reflects the single review.
    let reviews = review_service::driver_reviews(&state, driver.user_id)
        .await?
        .data
        .unwrap();
    assert_eq!(reviews.total_reviews, 1);
    assert_eq!(reviews.average_rating, 5.0);
    assert_eq!(reviews.rating_distribution.five, 1);
    assert_eq!(reviews.reviews[0].review.rating, 5);

    Ok(())
}

#[tokio::test]
async fn bookings_rejected_once_ride_leaves_scheduled() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let driver = create_user(&state, "driver", true).await?;
    let alice = create_user(&state, "alice", false).await?;

    // Seats remain, but a cancelled ride is not bookable by id either.
    for status in ["CANCELLED", "IN_PROGRESS"] {
        let ride_id = create_ride(&state, &driver, "Padang", "Medan", 2).await?;
        ride_service::update_ride_status(
            &state,
            &driver,
            ride_id,
            UpdateRideStatusRequest {
                status: status.into(),
            },
        )
        .await?;

        let err = book(&state, &alice, ride_id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)), "got {err:?}");
        assert_eq!(seats_left(&state, ride_id).await?, 2);
    }

    Ok(())
}

#[tokio::test]
async fn ride_deletion_blocked_by_bookings() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let driver = create_user(&state, "driver", true).await?;
    let alice = create_user(&state, "alice", false).await?;
    let ride_id = create_ride(&state, &driver, "Solo", "Klaten", 2).await?;

    let booking = book(&state, &alice, ride_id).await?.data.unwrap().booking;

    let err = ride_service::delete_ride(&state, &driver, ride_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    // Only the owning driver may delete at all.
    let err = ride_service::delete_ride(&state, &alice, ride_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden), "got {err:?}");

    booking_service::cancel_booking(&state, &alice, booking.id).await?;
    ride_service::delete_ride(&state, &driver, ride_id).await?;
    assert!(Rides::find_by_id(ride_id).one(&state.orm).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn non_drivers_cannot_publish_rides() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let passenger = create_user(&state, "alice", false).await?;
    let err = create_ride(&state, &passenger, "Depok", "Bekasi", 2)
        .await
        .unwrap_err();
    let err = err.downcast::<AppError>()?;
    assert!(matches!(err, AppError::Forbidden), "got {err:?}");

    // Malformed departure date is a validation failure, not a server fault.
    let driver = create_user(&state, "driver", true).await?;
    let err = ride_service::create_ride(
        &state,
        &driver,
        CreateRideRequest {
            origin: "Depok".into(),
            destination: "Bekasi".into(),
            date: "tomorrow".into(),
            time: "08:00".into(),
            price: 50000.0,
            seats_available: 2,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    Ok(())
}

#[tokio::test]
async fn ride_search_matches_case_insensitive_substrings() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let driver = create_user(&state, "driver", true).await?;
    let tag = Uuid::new_v4().simple().to_string();
    let origin = format!("Origin-{tag}");
    let destination = format!("Dest-{tag}");
    create_ride(&state, &driver, &origin, &destination, 2).await?;

    // Substring, wrong case.
    let found = ride_service::search_rides(
        &state,
        RideSearchQuery {
            source: Some(format!("origin-{tag}")),
            destination: Some(format!("DEST-{tag}")),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].ride.origin, origin);

    // No match surfaces as the "no rides" condition.
    let err = ride_service::search_rides(
        &state,
        RideSearchQuery {
            source: Some(format!("nowhere-{tag}")),
            destination: Some(format!("DEST-{tag}")),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound), "got {err:?}");

    // Both parameters are required.
    let err = ride_service::search_rides(
        &state,
        RideSearchQuery {
            source: None,
            destination: Some(destination),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    Ok(())
}

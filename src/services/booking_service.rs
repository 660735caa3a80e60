use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::{
        BookRideRequest, BookingDetail, BookingList, BookingWithPassenger, PassengerSummary,
        UpdateBookingStatusRequest,
    },
    dto::rides::DriverSummary,
    entity::{
        Users,
        bookings::{
            ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings,
            Model as BookingModel,
        },
        rides::{Column as RideCol, Entity as Rides},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Booking, BookingStatus, Review, Ride, RideStatus},
    response::{ApiResponse, Meta},
    services::ride_service::{ride_from_entity, vehicles_by_driver},
    state::AppState,
};

/// Reserve a seat. The availability check, the duplicate-booking check, the
/// booking insert and the seat decrement all run inside one transaction with
/// the ride row locked, so two overlapping requests against the last seat
/// serialize into one success and one `SoldOut`.
pub async fn book_ride(
    state: &AppState,
    user: &AuthUser,
    payload: BookRideRequest,
) -> AppResult<ApiResponse<BookingDetail>> {
    let ride_id = payload
        .ride_id
        .ok_or_else(|| AppError::BadRequest("Ride ID is required".into()))?;

    let txn = state.orm.begin().await?;

    let ride = Rides::find_by_id(ride_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let ride = match ride {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    if ride.status != RideStatus::Scheduled.as_str() {
        return Err(AppError::InvalidState("Ride is not open for booking".into()));
    }

    if ride.seats_available <= 0 {
        return Err(AppError::SoldOut);
    }

    if ride.driver_id == user.user_id {
        return Err(AppError::Conflict("You cannot book your own ride".into()));
    }

    let existing = Bookings::find()
        .filter(BookingCol::RideId.eq(ride_id))
        .filter(BookingCol::PassengerId.eq(user.user_id))
        .filter(BookingCol::Status.ne(BookingStatus::Cancelled.as_str()))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("You already booked this ride".into()));
    }

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        ride_id: Set(ride_id),
        passenger_id: Set(user.user_id),
        status: Set(BookingStatus::Pending.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    Rides::update_many()
        .col_expr(
            RideCol::SeatsAvailable,
            Expr::col(RideCol::SeatsAvailable).sub(1),
        )
        .filter(RideCol::Id.eq(ride_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_create",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking.id, "ride_id": ride_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let driver_id = ride.driver_id;
    // The booking is committed at this point; a missing driver row would be a
    // broken foreign key, not a bad request.
    let driver = Users::find_by_id(driver_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("driver {driver_id} missing for ride {ride_id}"))
        })?;
    let mut vehicles = vehicles_by_driver(&state.pool, &[driver_id]).await?;

    let mut ride = ride_from_entity(ride);
    ride.seats_available -= 1;

    let data = BookingDetail {
        booking: booking_from_entity(booking),
        ride,
        driver: DriverSummary {
            id: driver.id,
            name: driver.name,
            phone: driver.phone,
            vehicles: vehicles.remove(&driver_id).unwrap_or_default(),
        },
        review: None,
    };

    Ok(ApiResponse::success(
        "Ride booked successfully",
        data,
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct BookingDetailRow {
    booking_id: Uuid,
    booking_status: String,
    booked_at: DateTime<Utc>,
    ride_id: Uuid,
    driver_id: Uuid,
    origin: String,
    destination: String,
    date: DateTime<Utc>,
    price: f64,
    seats_available: i32,
    ride_status: String,
    ride_created_at: DateTime<Utc>,
    driver_name: String,
    driver_phone: Option<String>,
    review_id: Option<Uuid>,
    rating: Option<i32>,
    comment: Option<String>,
    review_created_at: Option<DateTime<Utc>>,
}

pub async fn my_bookings(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<BookingList>> {
    let rows = sqlx::query_as::<_, BookingDetailRow>(
        r#"
        SELECT b.id AS booking_id, b.status AS booking_status, b.created_at AS booked_at,
               r.id AS ride_id, r.driver_id, r.origin, r.destination, r.date, r.price,
               r.seats_available, r.status AS ride_status, r.created_at AS ride_created_at,
               u.name AS driver_name, u.phone AS driver_phone,
               rv.id AS review_id, rv.rating, rv.comment, rv.created_at AS review_created_at
        FROM bookings b
        JOIN rides r ON r.id = b.ride_id
        JOIN users u ON u.id = r.driver_id
        LEFT JOIN reviews rv ON rv.booking_id = b.id
        WHERE b.passenger_id = $1
        ORDER BY b.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let driver_ids: Vec<Uuid> = rows.iter().map(|r| r.driver_id).collect();
    let vehicles = vehicles_by_driver(&state.pool, &driver_ids).await?;

    let items = rows
        .into_iter()
        .map(|row| {
            let review = match (row.review_id, row.rating, row.review_created_at) {
                (Some(id), Some(rating), Some(created_at)) => Some(Review {
                    id,
                    booking_id: row.booking_id,
                    rating,
                    comment: row.comment,
                    created_at,
                }),
                _ => None,
            };
            BookingDetail {
                booking: Booking {
                    id: row.booking_id,
                    ride_id: row.ride_id,
                    passenger_id: user.user_id,
                    status: row.booking_status,
                    created_at: row.booked_at,
                },
                ride: Ride {
                    id: row.ride_id,
                    driver_id: row.driver_id,
                    origin: row.origin,
                    destination: row.destination,
                    date: row.date,
                    price: row.price,
                    seats_available: row.seats_available,
                    status: row.ride_status,
                    created_at: row.ride_created_at,
                },
                driver: DriverSummary {
                    id: row.driver_id,
                    name: row.driver_name,
                    phone: row.driver_phone,
                    vehicles: vehicles.get(&row.driver_id).cloned().unwrap_or_default(),
                },
                review,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "Your bookings fetched",
        BookingList { items },
        Some(Meta::empty()),
    ))
}

/// Cancel a booking: the row delete and the seat release share one
/// transaction. Completed bookings stay booked.
pub async fn cancel_booking(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let booking = Bookings::find_by_id(booking_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let booking = match booking {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };
    if booking.passenger_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    if booking.status == BookingStatus::Completed.as_str() {
        return Err(AppError::InvalidState(
            "Cannot cancel completed bookings".into(),
        ));
    }

    let ride_id = booking.ride_id;
    booking.delete(&txn).await?;

    Rides::update_many()
        .col_expr(
            RideCol::SeatsAvailable,
            Expr::col(RideCol::SeatsAvailable).add(1),
        )
        .filter(RideCol::Id.eq(ride_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_cancel",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking_id, "ride_id": ride_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Booking cancelled successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Driver-side status overwrite. Any enum member is accepted from any prior
/// state; seats are only released through an explicit cancel.
pub async fn update_booking_status(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
    payload: UpdateBookingStatusRequest,
) -> AppResult<ApiResponse<BookingWithPassenger>> {
    let status = BookingStatus::parse(&payload.status).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Invalid status. Must be one of: {}",
            BookingStatus::valid_values()
        ))
    })?;

    let booking = Bookings::find_by_id(booking_id).one(&state.orm).await?;
    let booking = match booking {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };

    let ride = Rides::find_by_id(booking.ride_id).one(&state.orm).await?;
    let ride = match ride {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    if ride.driver_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let mut active: BookingActive = booking.into();
    active.status = Set(status.as_str().to_string());
    let booking = active.update(&state.orm).await?;

    let passenger = Users::find_by_id(booking.passenger_id)
        .one(&state.orm)
        .await?;
    let passenger = match passenger {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_status_update",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking.id, "status": booking.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let data = BookingWithPassenger {
        booking: booking_from_entity(booking),
        passenger: PassengerSummary {
            id: passenger.id,
            name: passenger.name,
            phone: passenger.phone,
        },
    };

    Ok(ApiResponse::success(
        format!("Booking status updated to {}", status.as_str()),
        data,
        Some(Meta::empty()),
    ))
}

pub(crate) fn booking_from_entity(model: BookingModel) -> Booking {
    Booking {
        id: model.id,
        ride_id: model.ride_id,
        passenger_id: model.passenger_id,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::bookings::PassengerSummary,
    dto::rides::{
        BookingForDriver, CreateRideRequest, DriverSummary, MyRideList, RideList, RideSearchQuery,
        RideWithBookings, RideWithDriver, UpdateRideStatusRequest,
    },
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        rides::{ActiveModel as RideActive, Entity as Rides, Model as RideModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{BookingStatus, Review, Ride, RideStatus, Vehicle},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_ride(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRideRequest,
) -> AppResult<ApiResponse<RideWithDriver>> {
    let driver = crate::entity::Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?;
    let driver = match driver {
        Some(d) if d.is_driver => d,
        _ => return Err(AppError::Forbidden),
    };

    let date = combine_date_time(&payload.date, &payload.time)?;

    if payload.seats_available < 0 {
        return Err(AppError::BadRequest(
            "seats_available cannot be negative".into(),
        ));
    }

    let ride = RideActive {
        id: Set(Uuid::new_v4()),
        driver_id: Set(user.user_id),
        origin: Set(payload.origin),
        destination: Set(payload.destination),
        date: Set(date.into()),
        price: Set(payload.price),
        seats_available: Set(payload.seats_available),
        status: Set(RideStatus::Scheduled.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ride_create",
        Some("rides"),
        Some(serde_json::json!({ "ride_id": ride.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let vehicles = vehicles_by_driver(&state.pool, &[user.user_id]).await?;
    let data = RideWithDriver {
        ride: ride_from_entity(ride),
        driver: DriverSummary {
            id: driver.id,
            name: driver.name,
            phone: driver.phone,
            vehicles: vehicles.into_values().next().unwrap_or_default(),
        },
    };

    Ok(ApiResponse::success(
        "Ride created successfully",
        data,
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct RideDriverRow {
    id: Uuid,
    driver_id: Uuid,
    origin: String,
    destination: String,
    date: DateTime<Utc>,
    price: f64,
    seats_available: i32,
    status: String,
    created_at: DateTime<Utc>,
    driver_name: String,
    driver_phone: Option<String>,
}

pub async fn list_available(state: &AppState) -> AppResult<ApiResponse<RideList>> {
    let rows = sqlx::query_as::<_, RideDriverRow>(
        r#"
        SELECT r.id, r.driver_id, r.origin, r.destination, r.date, r.price,
               r.seats_available, r.status, r.created_at,
               u.name AS driver_name, u.phone AS driver_phone
        FROM rides r
        JOIN users u ON u.id = r.driver_id
        WHERE r.status = 'SCHEDULED' AND r.seats_available > 0
        ORDER BY r.date ASC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let items = assemble_rides(&state.pool, rows).await?;
    Ok(ApiResponse::success(
        "Rides fetched",
        RideList { items },
        Some(Meta::empty()),
    ))
}

pub async fn search_rides(
    state: &AppState,
    query: RideSearchQuery,
) -> AppResult<ApiResponse<RideList>> {
    let source = query
        .source
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Source and destination are required".into()))?;
    let destination = query
        .destination
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Source and destination are required".into()))?;

    let rows = sqlx::query_as::<_, RideDriverRow>(
        r#"
        SELECT r.id, r.driver_id, r.origin, r.destination, r.date, r.price,
               r.seats_available, r.status, r.created_at,
               u.name AS driver_name, u.phone AS driver_phone
        FROM rides r
        JOIN users u ON u.id = r.driver_id
        WHERE r.status = 'SCHEDULED'
          AND r.seats_available > 0
          AND r.origin ILIKE '%' || $1 || '%'
          AND r.destination ILIKE '%' || $2 || '%'
        ORDER BY r.date ASC
        "#,
    )
    .bind(source)
    .bind(destination)
    .fetch_all(&state.pool)
    .await?;

    // Empty result is user-visible "no rides", not a server fault.
    if rows.is_empty() {
        return Err(AppError::NotFound);
    }

    let items = assemble_rides(&state.pool, rows).await?;
    Ok(ApiResponse::success(
        "Rides found",
        RideList { items },
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct DriverBookingRow {
    booking_id: Uuid,
    ride_id: Uuid,
    status: String,
    passenger_id: Uuid,
    passenger_name: String,
    passenger_phone: Option<String>,
    review_id: Option<Uuid>,
    rating: Option<i32>,
    comment: Option<String>,
    review_created_at: Option<DateTime<Utc>>,
}

pub async fn my_rides(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MyRideList>> {
    let rides = sqlx::query_as::<_, Ride>(
        "SELECT * FROM rides WHERE driver_id = $1 ORDER BY date ASC",
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let ride_ids: Vec<Uuid> = rides.iter().map(|r| r.id).collect();
    let rows = sqlx::query_as::<_, DriverBookingRow>(
        r#"
        SELECT b.id AS booking_id, b.ride_id, b.status,
               p.id AS passenger_id, p.name AS passenger_name, p.phone AS passenger_phone,
               rv.id AS review_id, rv.rating, rv.comment, rv.created_at AS review_created_at
        FROM bookings b
        JOIN users p ON p.id = b.passenger_id
        LEFT JOIN reviews rv ON rv.booking_id = b.id
        WHERE b.ride_id = ANY($1)
        ORDER BY b.created_at DESC
        "#,
    )
    .bind(&ride_ids)
    .fetch_all(&state.pool)
    .await?;

    let mut by_ride: HashMap<Uuid, Vec<BookingForDriver>> = HashMap::new();
    for row in rows {
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
        by_ride.entry(row.ride_id).or_default().push(BookingForDriver {
            id: row.booking_id,
            status: row.status,
            passenger: PassengerSummary {
                id: row.passenger_id,
                name: row.passenger_name,
                phone: row.passenger_phone,
            },
            review,
        });
    }

    let items = rides
        .into_iter()
        .map(|ride| {
            let bookings = by_ride.remove(&ride.id).unwrap_or_default();
            RideWithBookings { ride, bookings }
        })
        .collect();

    Ok(ApiResponse::success(
        "Rides fetched",
        MyRideList { items },
        Some(Meta::empty()),
    ))
}

pub async fn update_ride_status(
    state: &AppState,
    user: &AuthUser,
    ride_id: Uuid,
    payload: UpdateRideStatusRequest,
) -> AppResult<ApiResponse<Ride>> {
    let status = RideStatus::parse(&payload.status).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Invalid status. Must be one of: {}",
            RideStatus::valid_values()
        ))
    })?;

    let txn = state.orm.begin().await?;

    let ride = Rides::find_by_id(ride_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let ride = match ride {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    if ride.driver_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let mut active: RideActive = ride.into();
    active.status = Set(status.as_str().to_string());
    let ride = active.update(&txn).await?;

    // Completing a ride completes its confirmed bookings in the same
    // transaction. Pending bookings are left as they are.
    if status == RideStatus::Completed {
        Bookings::update_many()
            .col_expr(
                BookingCol::Status,
                Expr::value(BookingStatus::Completed.as_str()),
            )
            .filter(BookingCol::RideId.eq(ride_id))
            .filter(BookingCol::Status.eq(BookingStatus::Confirmed.as_str()))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ride_status_update",
        Some("rides"),
        Some(serde_json::json!({ "ride_id": ride.id, "status": ride.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Ride status updated",
        ride_from_entity(ride),
        Some(Meta::empty()),
    ))
}

pub async fn delete_ride(
    state: &AppState,
    user: &AuthUser,
    ride_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let ride = Rides::find_by_id(ride_id).one(&state.orm).await?;
    let ride = match ride {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    if ride.driver_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let bookings = Bookings::find()
        .filter(BookingCol::RideId.eq(ride_id))
        .count(&state.orm)
        .await?;
    if bookings > 0 {
        return Err(AppError::Conflict(
            "Cannot delete ride with existing bookings. Cancel the ride instead.".into(),
        ));
    }

    ride.delete(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "ride_delete",
        Some("rides"),
        Some(serde_json::json!({ "ride_id": ride_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Ride deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Combine a `YYYY-MM-DD` date and `HH:MM` time into one UTC instant.
fn combine_date_time(date: &str, time: &str) -> Result<DateTime<Utc>, AppError> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date, expected YYYY-MM-DD".into()))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::BadRequest("Invalid time, expected HH:MM".into()))?;
    Ok(NaiveDateTime::new(date, time).and_utc())
}

async fn assemble_rides(
    pool: &DbPool,
    rows: Vec<RideDriverRow>,
) -> AppResult<Vec<RideWithDriver>> {
    let driver_ids: Vec<Uuid> = rows.iter().map(|r| r.driver_id).collect();
    let mut vehicles = vehicles_by_driver(pool, &driver_ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| RideWithDriver {
            driver: DriverSummary {
                id: row.driver_id,
                name: row.driver_name,
                phone: row.driver_phone,
                vehicles: vehicles.get(&row.driver_id).cloned().unwrap_or_default(),
            },
            ride: Ride {
                id: row.id,
                driver_id: row.driver_id,
                origin: row.origin,
                destination: row.destination,
                date: row.date,
                price: row.price,
                seats_available: row.seats_available,
                status: row.status,
                created_at: row.created_at,
            },
        })
        .collect())
}

pub(crate) async fn vehicles_by_driver(
    pool: &DbPool,
    driver_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Vehicle>>> {
    let vehicles = sqlx::query_as::<_, Vehicle>(
        "SELECT * FROM vehicles WHERE driver_id = ANY($1) ORDER BY created_at DESC",
    )
    .bind(driver_ids)
    .fetch_all(pool)
    .await?;

    let mut by_driver: HashMap<Uuid, Vec<Vehicle>> = HashMap::new();
    for vehicle in vehicles {
        by_driver.entry(vehicle.driver_id).or_default().push(vehicle);
    }
    Ok(by_driver)
}

pub(crate) fn ride_from_entity(model: RideModel) -> Ride {
    Ride {
        id: model.id,
        driver_id: model.driver_id,
        origin: model.origin,
        destination: model.destination,
        date: model.date.with_timezone(&Utc),
        price: model.price,
        seats_available: model.seats_available,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_date_and_time_into_utc_instant() {
        let dt = combine_date_time("2026-03-14", "09:30").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-14T09:30:00+00:00");
    }

    #[test]
    fn rejects_malformed_date_or_time() {
        assert!(combine_date_time("14-03-2026", "09:30").is_err());
        assert!(combine_date_time("2026-03-14", "9h30").is_err());
        assert!(combine_date_time("", "").is_err());
    }
}

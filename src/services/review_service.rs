use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::PassengerSummary,
    dto::reviews::{
        AddReviewRequest, DriverReviews, RatingDistribution, ReviewDetail, RideSummary,
    },
    entity::{
        Bookings,
        reviews::{
            ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews,
            Model as ReviewModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{BookingStatus, Review},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// A review unlocks only once the booking is COMPLETED, and each booking
/// takes at most one. The unique index on `reviews.booking_id` backs the
/// read-side check against racing submissions.
pub async fn add_review(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
    payload: AddReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".into(),
        ));
    }

    let booking = Bookings::find_by_id(booking_id).one(&state.orm).await?;
    let booking = match booking {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };
    if booking.passenger_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    if booking.status != BookingStatus::Completed.as_str() {
        return Err(AppError::InvalidState(
            "Can only review completed rides".into(),
        ));
    }

    let existing = Reviews::find()
        .filter(ReviewCol::BookingId.eq(booking_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("You already reviewed this ride".into()));
    }

    let insert = ReviewActive {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await;

    let review = match insert {
        Ok(r) => r,
        Err(err) => {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return Err(AppError::Conflict("You already reviewed this ride".into()));
            }
            return Err(err.into());
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_create",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id, "booking_id": booking_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Review added successfully",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct DriverReviewRow {
    review_id: Uuid,
    booking_id: Uuid,
    rating: i32,
    comment: Option<String>,
    review_created_at: DateTime<Utc>,
    passenger_id: Uuid,
    passenger_name: String,
    passenger_phone: Option<String>,
    ride_id: Uuid,
    origin: String,
    destination: String,
    date: DateTime<Utc>,
}

/// Aggregate reputation is a pure read-side projection, recomputed per
/// request. Nothing denormalized is stored.
pub async fn driver_reviews(
    state: &AppState,
    driver_id: Uuid,
) -> AppResult<ApiResponse<DriverReviews>> {
    let rows = sqlx::query_as::<_, DriverReviewRow>(
        r#"
        SELECT rv.id AS review_id, rv.booking_id, rv.rating, rv.comment,
               rv.created_at AS review_created_at,
               p.id AS passenger_id, p.name AS passenger_name, p.phone AS passenger_phone,
               r.id AS ride_id, r.origin, r.destination, r.date
        FROM reviews rv
        JOIN bookings b ON b.id = rv.booking_id
        JOIN rides r ON r.id = b.ride_id
        JOIN users p ON p.id = b.passenger_id
        WHERE r.driver_id = $1
        ORDER BY rv.created_at DESC
        "#,
    )
    .bind(driver_id)
    .fetch_all(&state.pool)
    .await?;

    let ratings: Vec<i32> = rows.iter().map(|r| r.rating).collect();
    let (average_rating, rating_distribution) = rating_stats(&ratings);

    let reviews = rows
        .into_iter()
        .map(|row| ReviewDetail {
            review: Review {
                id: row.review_id,
                booking_id: row.booking_id,
                rating: row.rating,
                comment: row.comment,
                created_at: row.review_created_at,
            },
            passenger: PassengerSummary {
                id: row.passenger_id,
                name: row.passenger_name,
                phone: row.passenger_phone,
            },
            ride: RideSummary {
                id: row.ride_id,
                origin: row.origin,
                destination: row.destination,
                date: row.date,
            },
        })
        .collect::<Vec<_>>();

    let data = DriverReviews {
        driver_id,
        total_reviews: reviews.len() as i64,
        average_rating,
        rating_distribution,
        reviews,
    };

    Ok(ApiResponse::success(
        "Driver reviews fetched",
        data,
        Some(Meta::empty()),
    ))
}

/// Mean rounded to one decimal (0 when empty) plus a star histogram.
fn rating_stats(ratings: &[i32]) -> (f64, RatingDistribution) {
    let mut distribution = RatingDistribution {
        five: 0,
        four: 0,
        three: 0,
        two: 0,
        one: 0,
    };
    for rating in ratings {
        match rating {
            5 => distribution.five += 1,
            4 => distribution.four += 1,
            3 => distribution.three += 1,
            2 => distribution.two += 1,
            1 => distribution.one += 1,
            _ => {}
        }
    }

    let average = if ratings.is_empty() {
        0.0
    } else {
        let sum: i32 = ratings.iter().sum();
        let mean = sum as f64 / ratings.len() as f64;
        (mean * 10.0).round() / 10.0
    };

    (average, distribution)
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        booking_id: model.booking_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_for_mixed_ratings() {
        let (mean, histogram) = rating_stats(&[5, 5, 4, 3]);
        assert_eq!(mean, 4.3);
        assert_eq!(
            histogram,
            RatingDistribution {
                five: 2,
                four: 1,
                three: 1,
                two: 0,
                one: 0,
            }
        );
    }

    #[test]
    fn stats_for_no_ratings_is_zero() {
        let (mean, histogram) = rating_stats(&[]);
        assert_eq!(mean, 0.0);
        assert_eq!(histogram.five + histogram.four + histogram.three + histogram.two + histogram.one, 0);
    }

    #[test]
    fn mean_rounds_to_one_decimal() {
        let (mean, _) = rating_stats(&[5, 4]);
        assert_eq!(mean, 4.5);
        let (mean, _) = rating_stats(&[5, 5, 4]);
        assert_eq!(mean, 4.7);
    }
}

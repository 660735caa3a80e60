use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::vehicles::{AddVehicleRequest, UpdateVehicleRequest, VehicleList},
    entity::{
        Users,
        vehicles::{
            ActiveModel as VehicleActive, Column as VehicleCol, Entity as Vehicles,
            Model as VehicleModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Vehicle,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn add_vehicle(
    state: &AppState,
    user: &AuthUser,
    payload: AddVehicleRequest,
) -> AppResult<ApiResponse<Vehicle>> {
    let driver = Users::find_by_id(user.user_id).one(&state.orm).await?;
    let driver = match driver {
        Some(d) => d,
        None => return Err(AppError::NotFound),
    };
    if !driver.is_driver {
        return Err(AppError::Forbidden);
    }

    let existing = Vehicles::find()
        .filter(VehicleCol::LicensePlate.eq(payload.license_plate.as_str()))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "License plate already registered".into(),
        ));
    }

    let vehicle = VehicleActive {
        id: Set(Uuid::new_v4()),
        driver_id: Set(user.user_id),
        make: Set(payload.make),
        model: Set(payload.model),
        year: Set(payload.year),
        color: Set(payload.color),
        license_plate: Set(payload.license_plate),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "vehicle_add",
        Some("vehicles"),
        Some(serde_json::json!({ "vehicle_id": vehicle.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Vehicle added",
        vehicle_from_entity(vehicle),
        Some(Meta::empty()),
    ))
}

pub async fn list_my_vehicles(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<VehicleList>> {
    let items = Vehicles::find()
        .filter(VehicleCol::DriverId.eq(user.user_id))
        .order_by_desc(VehicleCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(vehicle_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Vehicles fetched",
        VehicleList { items },
        Some(Meta::empty()),
    ))
}

pub async fn update_vehicle(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateVehicleRequest,
) -> AppResult<ApiResponse<Vehicle>> {
    let vehicle = Vehicles::find_by_id(id).one(&state.orm).await?;
    let vehicle = match vehicle {
        Some(v) => v,
        None => return Err(AppError::NotFound),
    };
    if vehicle.driver_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let mut active: VehicleActive = vehicle.into();
    if let Some(make) = payload.make {
        active.make = Set(make);
    }
    if let Some(model) = payload.model {
        active.model = Set(model);
    }
    if let Some(year) = payload.year {
        active.year = Set(year);
    }
    if let Some(color) = payload.color {
        active.color = Set(color);
    }
    if let Some(plate) = payload.license_plate {
        active.license_plate = Set(plate);
    }
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Vehicle updated",
        vehicle_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_vehicle(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let vehicle = Vehicles::find_by_id(id).one(&state.orm).await?;
    let vehicle = match vehicle {
        Some(v) => v,
        None => return Err(AppError::NotFound),
    };
    if vehicle.driver_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    vehicle.delete(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "vehicle_delete",
        Some("vehicles"),
        Some(serde_json::json!({ "vehicle_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Vehicle deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn vehicle_from_entity(model: VehicleModel) -> Vehicle {
    Vehicle {
        id: model.id,
        driver_id: model.driver_id,
        make: model.make,
        model: model.model,
        year: model.year,
        color: model.color,
        license_plate: model.license_plate,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

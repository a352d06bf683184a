use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    common::{app_error::AppError, app_state::AppState, validation::require_fields},
    models::{CreateRestaurantTableEntity, RestaurantTableEntity},
    store::StoreError,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TableReq {
    pub table_number: Option<i32>,
    pub seats: Option<i32>,
    pub is_occupied: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OccupiedReq {
    pub is_occupied: Option<bool>,
}

fn duplicate_number(table_number: i32) -> impl FnOnce(StoreError) -> AppError {
    move |err| match err {
        StoreError::Conflict(_) => {
            AppError::Conflict(format!("Table number {table_number} already exists"))
        }
        other => other.into(),
    }
}

fn check_seats(seats: i32) -> Result<(), AppError> {
    if seats <= 0 {
        return Err(AppError::validation("Seats must be greater than 0"));
    }
    Ok(())
}

pub async fn create_table(
    state: &AppState,
    req: TableReq,
) -> Result<RestaurantTableEntity, AppError> {
    require_fields(&[("table_number", &req.table_number), ("seats", &req.seats)])?;
    let table = CreateRestaurantTableEntity {
        table_number: req.table_number.unwrap_or_default(),
        seats: req.seats.unwrap_or_default(),
        is_occupied: req.is_occupied.unwrap_or(false),
    };
    check_seats(table.seats)?;

    let number = table.table_number;
    state
        .store
        .tables
        .create(table)
        .await
        .map_err(duplicate_number(number))
}

pub async fn list_tables(state: &AppState) -> Result<Vec<RestaurantTableEntity>, AppError> {
    Ok(state.store.tables.list().await?)
}

pub async fn get_table(state: &AppState, id: i32) -> Result<RestaurantTableEntity, AppError> {
    state
        .store
        .tables
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found("Table not found"))
}

/// Overwrites number, seats and occupancy. All three must be present.
pub async fn update_table(
    state: &AppState,
    id: i32,
    req: TableReq,
) -> Result<RestaurantTableEntity, AppError> {
    require_fields(&[
        ("table_number", &req.table_number),
        ("seats", &req.seats),
        ("is_occupied", &req.is_occupied),
    ])?;
    let table = CreateRestaurantTableEntity {
        table_number: req.table_number.unwrap_or_default(),
        seats: req.seats.unwrap_or_default(),
        is_occupied: req.is_occupied.unwrap_or_default(),
    };
    check_seats(table.seats)?;

    let number = table.table_number;
    state
        .store
        .tables
        .update(id, table)
        .await
        .map_err(duplicate_number(number))?
        .ok_or_else(|| AppError::not_found("Table not found"))
}

pub async fn set_occupied(
    state: &AppState,
    id: i32,
    req: OccupiedReq,
) -> Result<RestaurantTableEntity, AppError> {
    require_fields(&[("is_occupied", &req.is_occupied)])?;

    state
        .store
        .tables
        .set_occupied(id, req.is_occupied.unwrap_or_default())
        .await?
        .ok_or_else(|| AppError::not_found("Table not found"))
}

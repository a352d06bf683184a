use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    common::{app_error::AppError, app_state::AppState, validation::require_fields},
    domain::money,
    models::{CreateMenuItemEntity, MenuFilter, MenuItemEntity},
};

const DEFAULT_ITEM_TYPE: &str = "food";

#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuItemReq {
    pub name: Option<String>,
    #[schema(value_type = Option<String>, example = "120.00")]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub availability: Option<bool>,
    pub image_url: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn validate(req: MenuItemReq) -> Result<CreateMenuItemEntity, AppError> {
    require_fields(&[("name", &req.name), ("price", &req.price)])?;

    // Checked after rounding so sub-cent prices cannot become 0.00.
    let price = money::normalize(req.price.unwrap_or_default());
    if price <= Decimal::ZERO {
        return Err(AppError::validation("Price must be greater than 0"));
    }
    if price > money::MAX_AMOUNT {
        return Err(AppError::validation(format!(
            "Price must not exceed {}",
            money::MAX_AMOUNT
        )));
    }

    Ok(CreateMenuItemEntity {
        name: req.name.unwrap_or_default(),
        price,
        description: non_empty(req.description),
        category: non_empty(req.category),
        item_type: non_empty(req.item_type).unwrap_or_else(|| DEFAULT_ITEM_TYPE.to_string()),
        availability: req.availability.unwrap_or(true),
        image_url: non_empty(req.image_url),
    })
}

pub async fn create_item(state: &AppState, req: MenuItemReq) -> Result<MenuItemEntity, AppError> {
    let item = state.store.menu.create(validate(req)?).await?;
    info!("Menu item #{} created at {}", item.id, item.price);
    Ok(item)
}

pub async fn list_items(
    state: &AppState,
    filter: MenuFilter,
) -> Result<Vec<MenuItemEntity>, AppError> {
    let filter = MenuFilter {
        category: non_empty(filter.category),
        item_type: non_empty(filter.item_type),
    };
    Ok(state.store.menu.list(&filter).await?)
}

pub async fn get_item(state: &AppState, id: i32) -> Result<MenuItemEntity, AppError> {
    state
        .store
        .menu
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found("Menu item not found"))
}

/// Full overwrite. The stored image is kept when the request carries none.
pub async fn update_item(
    state: &AppState,
    id: i32,
    req: MenuItemReq,
) -> Result<MenuItemEntity, AppError> {
    let mut item = validate(req)?;
    let existing = get_item(state, id).await?;
    if item.image_url.is_none() {
        item.image_url = existing.image_url;
    }

    state
        .store
        .menu
        .update(id, item)
        .await?
        .ok_or_else(|| AppError::not_found("Menu item not found"))
}

pub async fn delete_item(state: &AppState, id: i32) -> Result<(), AppError> {
    if !state.store.menu.delete(id).await? {
        return Err(AppError::not_found("Menu item not found"));
    }
    info!("Menu item #{} deleted", id);
    Ok(())
}

use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{OrderStatus, PaymentStatus};

// Users

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserEntity {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    /// Argon2 PHC string, never serialized.
    #[serde(skip)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(treat_none_as_null = true)]
pub struct CreateUserEntity {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub password: String,
}

// Menu

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::menu_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MenuItemEntity {
    pub id: i32,
    pub name: String,
    #[schema(value_type = String, example = "120.00")]
    pub price: Decimal,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    pub availability: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::menu_items)]
#[diesel(treat_none_as_null = true)]
pub struct CreateMenuItemEntity {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub category: Option<String>,
    pub item_type: String,
    pub availability: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MenuFilter {
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
}

// Tables

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::restaurant_tables)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RestaurantTableEntity {
    pub id: i32,
    pub table_number: i32,
    pub seats: i32,
    pub is_occupied: bool,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::restaurant_tables)]
pub struct CreateRestaurantTableEntity {
    pub table_number: i32,
    pub seats: i32,
    pub is_occupied: bool,
}

// Carts

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartEntity {
    pub id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::carts)]
pub struct CreateCartEntity {
    pub user_id: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::cart_items)]
pub struct CreateCartItemEntity {
    pub cart_id: i32,
    pub item_id: i32,
    pub quantity: i32,
}

/// A cart line joined with the current catalog row.
#[derive(Queryable, Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct CartLineView {
    pub id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub name: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    pub availability: bool,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct CartView {
    pub cart_id: i32,
    pub items: Vec<CartLineView>,
    /// Sum of quantity × current price, two decimals.
    pub total: String,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub user_id: i32,
    pub table_id: Option<i32>,
    #[schema(value_type = String, example = "450.00")]
    pub total_amount: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub user_id: i32,
    pub table_id: Option<i32>,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: i32,
    pub order_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub item_id: i32,
    pub quantity: i32,
    pub price: Decimal,
}

/// A line requested on the POS path, before prices are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub struct RequestedLine {
    pub item_id: i32,
    pub quantity: i32,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: OrderEntity,
    pub user_name: String,
}

/// An order line with the catalog fields joined for display.
#[derive(Queryable, Serialize, Debug, Clone, ToSchema)]
pub struct OrderLineView {
    pub id: i32,
    pub item_id: i32,
    pub quantity: i32,
    /// Price frozen at order time.
    #[schema(value_type = String)]
    pub price: Decimal,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: OrderEntity,
    pub user_name: String,
    pub user_email: String,
    pub items: Vec<OrderLineView>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user_id: Option<i32>,
}

// Payments

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentEntity {
    pub id: i32,
    pub order_id: i32,
    #[schema(value_type = String, example = "450.00")]
    pub amount: Decimal,
    pub method: String,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreatePaymentEntity {
    pub order_id: i32,
    pub amount: Decimal,
    pub method: String,
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct PaymentSummary {
    #[serde(flatten)]
    pub payment: PaymentEntity,
    pub user_id: i32,
    #[schema(value_type = String)]
    pub order_total: Decimal,
    pub user_name: String,
}

// Chats

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::chats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatEntity {
    pub id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::chats)]
pub struct CreateChatEntity {
    pub user_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageEntity {
    pub id: i32,
    pub chat_id: i32,
    pub sender_id: i32,
    pub message_text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::messages)]
pub struct CreateMessageEntity {
    pub chat_id: i32,
    pub sender_id: i32,
    pub message_text: String,
}

#[derive(Queryable, Serialize, Debug, Clone, ToSchema)]
pub struct MessageView {
    pub id: i32,
    pub chat_id: i32,
    pub sender_id: i32,
    pub message_text: String,
    pub timestamp: DateTime<Utc>,
    pub sender_name: String,
    pub sender_role: String,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    pub chat_id: i32,
    pub user_id: i32,
    pub messages: Vec<MessageView>,
}

#[derive(Queryable, Serialize, Debug, Clone, ToSchema)]
pub struct ChatUser {
    pub id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub email: String,
}

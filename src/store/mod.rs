//! Persistence seams. Each aggregate gets one async trait; [`Store`] bundles
//! the implementations that back a running service.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    common::db::DbPool,
    domain::{DuplicatePaymentPolicy, OrderStatus, PaymentStatus},
    models::{
        CartLineView, ChatEntity, ChatUser, CreateMenuItemEntity, CreateRestaurantTableEntity,
        CreateUserEntity, MenuFilter, MenuItemEntity, MessageEntity, MessageView, OrderDetails,
        OrderEntity, OrderFilter, OrderSummary, PaymentEntity, PaymentSummary, RequestedLine,
        RestaurantTableEntity, UserEntity,
    },
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Checkout found no lines in the cart. Nothing was written.
    #[error("cart is empty")]
    EmptyCart,

    /// A requested menu item is missing or switched off. Nothing was written.
    #[error("menu item {0} not found or not available")]
    ItemUnavailable(i32),

    /// Merging would push the line for this item past the quantity limit.
    #[error("quantity limit reached for menu item {0}")]
    QuantityLimit(i32),

    /// The order total does not fit the money column. Nothing was written.
    #[error("order total out of range")]
    TotalOutOfRange,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            other => StoreError::Other(other.into()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: CreateUserEntity) -> StoreResult<UserEntity>;
    /// Newest first.
    async fn list(&self) -> StoreResult<Vec<UserEntity>>;
    async fn find(&self, id: i32) -> StoreResult<Option<UserEntity>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserEntity>>;
    /// First user holding `role`.
    async fn find_by_role(&self, role: &str) -> StoreResult<Option<UserEntity>>;
    async fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> StoreResult<bool>;
    async fn update(&self, id: i32, user: CreateUserEntity) -> StoreResult<Option<UserEntity>>;
    async fn delete(&self, id: i32) -> StoreResult<bool>;
}

#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn create(&self, item: CreateMenuItemEntity) -> StoreResult<MenuItemEntity>;
    /// Newest first.
    async fn list(&self, filter: &MenuFilter) -> StoreResult<Vec<MenuItemEntity>>;
    async fn find(&self, id: i32) -> StoreResult<Option<MenuItemEntity>>;
    /// Overwrites every column.
    async fn update(
        &self,
        id: i32,
        item: CreateMenuItemEntity,
    ) -> StoreResult<Option<MenuItemEntity>>;
    async fn delete(&self, id: i32) -> StoreResult<bool>;
}

#[async_trait]
pub trait TableRepository: Send + Sync {
    async fn create(&self, table: CreateRestaurantTableEntity)
    -> StoreResult<RestaurantTableEntity>;
    /// Ordered by table number.
    async fn list(&self) -> StoreResult<Vec<RestaurantTableEntity>>;
    async fn find(&self, id: i32) -> StoreResult<Option<RestaurantTableEntity>>;
    async fn update(
        &self,
        id: i32,
        table: CreateRestaurantTableEntity,
    ) -> StoreResult<Option<RestaurantTableEntity>>;
    async fn set_occupied(
        &self,
        id: i32,
        is_occupied: bool,
    ) -> StoreResult<Option<RestaurantTableEntity>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Returns the user's cart id, creating the cart on first use.
    async fn get_or_create(&self, user_id: i32) -> StoreResult<i32>;
    /// Inserts the line or adds `quantity` to the existing one, atomically.
    async fn add_item(&self, cart_id: i32, item_id: i32, quantity: i32) -> StoreResult<()>;
    /// No-op when the line does not exist.
    async fn set_quantity(&self, cart_id: i32, item_id: i32, quantity: i32) -> StoreResult<()>;
    /// No-op when the line does not exist.
    async fn remove_item(&self, cart_id: i32, item_id: i32) -> StoreResult<()>;
    async fn clear(&self, cart_id: i32) -> StoreResult<()>;
    /// Lines in insertion order joined with current catalog data.
    async fn lines(&self, cart_id: i32) -> StoreResult<Vec<CartLineView>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Turns the user's cart into a `pending` order and empties the cart, or
    /// writes nothing at all.
    async fn create_from_cart(
        &self,
        user_id: i32,
        table_id: i32,
        payment_method: &str,
    ) -> StoreResult<OrderEntity>;
    /// Builds a `pending` order straight from `lines` at current prices, or
    /// writes nothing at all.
    async fn create_direct(
        &self,
        user_id: i32,
        lines: &[RequestedLine],
        payment_method: &str,
    ) -> StoreResult<OrderEntity>;
    /// Newest first.
    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderSummary>>;
    /// Orders not yet delivered or cancelled, newest first.
    async fn list_active(&self) -> StoreResult<Vec<OrderSummary>>;
    async fn find(&self, id: i32) -> StoreResult<Option<OrderEntity>>;
    async fn details(&self, id: i32) -> StoreResult<Option<OrderDetails>>;
    /// Compare-and-set: the write only happens while the order still holds
    /// `expected`. `None` means the order was missing or had moved on.
    async fn set_status(
        &self,
        id: i32,
        expected: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<Option<OrderEntity>>;
}

#[derive(Debug, Clone)]
pub struct RecordPayment {
    pub order_id: i32,
    pub amount: Decimal,
    pub method: String,
    pub transaction_id: Option<String>,
    /// Status for a freshly inserted row.
    pub new_status: PaymentStatus,
    /// Status written over an existing row.
    pub existing_status: PaymentStatus,
    pub policy: DuplicatePaymentPolicy,
}

#[derive(Debug, Clone)]
pub enum RecordedPayment {
    Created(PaymentEntity),
    Superseded(PaymentEntity),
}

impl RecordedPayment {
    pub fn into_payment(self) -> PaymentEntity {
        match self {
            RecordedPayment::Created(p) | RecordedPayment::Superseded(p) => p,
        }
    }
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Inserts a payment, or applies `policy` when the order already has one.
    async fn record(&self, payment: RecordPayment) -> StoreResult<RecordedPayment>;
    /// Newest first, joined with the order and its user.
    async fn list(&self) -> StoreResult<Vec<PaymentSummary>>;
    async fn list_for_order(&self, order_id: i32) -> StoreResult<Vec<PaymentEntity>>;
    async fn find(&self, id: i32) -> StoreResult<Option<PaymentEntity>>;
    async fn update_status(
        &self,
        id: i32,
        status: PaymentStatus,
    ) -> StoreResult<Option<PaymentEntity>>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn get_or_create(&self, user_id: i32) -> StoreResult<ChatEntity>;
    /// Ordered by name.
    async fn users_with_chats(&self) -> StoreResult<Vec<ChatUser>>;
    async fn add_message(
        &self,
        chat_id: i32,
        sender_id: i32,
        text: &str,
    ) -> StoreResult<MessageEntity>;
    /// Oldest first, with the sender's name and role.
    async fn messages(&self, chat_id: i32) -> StoreResult<Vec<MessageView>>;
}

/// The repositories a running service talks to.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub menu: Arc<dyn MenuRepository>,
    pub tables: Arc<dyn TableRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub chats: Arc<dyn ChatRepository>,
}

impl Store {
    pub fn postgres(pool: DbPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self::from_backend(store)
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(memory::MemoryStore::default()))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserRepository
            + MenuRepository
            + TableRepository
            + CartRepository
            + OrderRepository
            + PaymentRepository
            + ChatRepository
            + 'static,
    {
        Self {
            users: backend.clone(),
            menu: backend.clone(),
            tables: backend.clone(),
            carts: backend.clone(),
            orders: backend.clone(),
            payments: backend.clone(),
            chats: backend,
        }
    }
}

//! Process-local store used by tests and `STORAGE=memory`.
//!
//! One `RwLock` guards every table, so each trait call is atomic the same way
//! a single statement or transaction is on Postgres. Unique and foreign key
//! constraints from the migrations are mirrored where the service relies on
//! them.

use std::collections::BTreeMap;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    domain::{self, DuplicatePaymentPolicy, MAX_LINE_QUANTITY, OrderStatus, PaymentStatus},
    models::{
        CartEntity, CartLineView, ChatEntity, ChatUser, CreateMenuItemEntity,
        CreateRestaurantTableEntity, CreateUserEntity, MenuFilter, MenuItemEntity, MessageEntity,
        MessageView, OrderDetails, OrderEntity, OrderFilter, OrderItemEntity, OrderLineView,
        OrderSummary, PaymentEntity, PaymentSummary, RequestedLine, RestaurantTableEntity,
        UserEntity,
    },
    store::{
        CartRepository, ChatRepository, MenuRepository, OrderRepository, PaymentRepository,
        RecordPayment, RecordedPayment, StoreError, StoreResult, TableRepository,
        UserRepository,
    },
};

#[derive(Debug, Clone, Copy)]
struct CartItemRow {
    cart_id: i32,
    item_id: i32,
    quantity: i32,
}

#[derive(Debug, Default)]
struct Sequences {
    users: i32,
    menu: i32,
    tables: i32,
    carts: i32,
    cart_items: i32,
    orders: i32,
    order_items: i32,
    payments: i32,
    chats: i32,
    messages: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, UserEntity>,
    menu: BTreeMap<i32, MenuItemEntity>,
    tables: BTreeMap<i32, RestaurantTableEntity>,
    carts: BTreeMap<i32, CartEntity>,
    cart_items: BTreeMap<i32, CartItemRow>,
    orders: BTreeMap<i32, OrderEntity>,
    order_items: BTreeMap<i32, OrderItemEntity>,
    payments: BTreeMap<i32, PaymentEntity>,
    chats: BTreeMap<i32, ChatEntity>,
    messages: BTreeMap<i32, MessageEntity>,
    seq: Sequences,
}

impl Tables {
    fn summary(&self, order: &OrderEntity) -> Option<OrderSummary> {
        let user = self.users.get(&order.user_id)?;
        Some(OrderSummary {
            order: order.clone(),
            user_name: user.name.clone(),
        })
    }

    /// Inserts an order with its lines at the given prices.
    fn insert_order(
        &mut self,
        user_id: i32,
        table_id: Option<i32>,
        payment_method: &str,
        lines: Vec<(i32, i32, rust_decimal::Decimal)>,
    ) -> StoreResult<OrderEntity> {
        if !self.users.contains_key(&user_id) {
            return Err(StoreError::Conflict(format!("user {user_id} does not exist")));
        }
        if let Some(table_id) = table_id {
            if !self.tables.contains_key(&table_id) {
                return Err(StoreError::Conflict(format!(
                    "table {table_id} does not exist"
                )));
            }
        }

        let total_amount = domain::sum_lines(lines.iter().map(|(_, qty, price)| (price, *qty)));
        if !domain::money::in_range(total_amount) {
            return Err(StoreError::TotalOutOfRange);
        }
        let now = Utc::now();
        let order = OrderEntity {
            id: next(&mut self.seq.orders),
            user_id,
            table_id,
            total_amount,
            payment_method: payment_method.to_string(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(order.id, order.clone());

        for (item_id, quantity, price) in lines {
            let id = next(&mut self.seq.order_items);
            self.order_items.insert(
                id,
                OrderItemEntity {
                    id,
                    order_id: order.id,
                    item_id,
                    quantity,
                    price,
                },
            );
        }

        Ok(order)
    }
}

fn newest_first(a: &OrderEntity, b: &OrderEntity) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: CreateUserEntity) -> StoreResult<UserEntity> {
        let mut db = self.inner.write().await;
        if db.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let entity = UserEntity {
            id: next(&mut db.seq.users),
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            password: user.password,
            created_at: Utc::now(),
        };
        db.users.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn list(&self) -> StoreResult<Vec<UserEntity>> {
        let db = self.inner.read().await;
        let mut users: Vec<UserEntity> = db.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn find(&self, id: i32) -> StoreResult<Option<UserEntity>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserEntity>> {
        let db = self.inner.read().await;
        Ok(db.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_role(&self, role: &str) -> StoreResult<Option<UserEntity>> {
        let db = self.inner.read().await;
        Ok(db.users.values().find(|u| u.role == role).cloned())
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> StoreResult<bool> {
        let db = self.inner.read().await;
        Ok(db
            .users
            .values()
            .any(|u| u.email == email && Some(u.id) != exclude_id))
    }

    async fn update(&self, id: i32, user: CreateUserEntity) -> StoreResult<Option<UserEntity>> {
        let mut db = self.inner.write().await;
        if db.users.values().any(|u| u.email == user.email && u.id != id) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let Some(entity) = db.users.get_mut(&id) else {
            return Ok(None);
        };
        entity.name = user.name;
        entity.email = user.email;
        entity.phone = user.phone;
        entity.role = user.role;
        entity.password = user.password;
        Ok(Some(entity.clone()))
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        if !db.users.contains_key(&id) {
            return Ok(false);
        }
        let referenced = db.orders.values().any(|o| o.user_id == id)
            || db.messages.values().any(|m| m.sender_id == id);
        if referenced {
            return Err(StoreError::Conflict(format!(
                "user {id} is still referenced by orders or messages"
            )));
        }

        let cart_ids: Vec<i32> = db
            .carts
            .values()
            .filter(|c| c.user_id == id)
            .map(|c| c.id)
            .collect();
        db.cart_items.retain(|_, row| !cart_ids.contains(&row.cart_id));
        db.carts.retain(|_, c| c.user_id != id);
        db.chats.retain(|_, c| c.user_id != id);
        db.users.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl MenuRepository for MemoryStore {
    async fn create(&self, item: CreateMenuItemEntity) -> StoreResult<MenuItemEntity> {
        let mut db = self.inner.write().await;
        let entity = MenuItemEntity {
            id: next(&mut db.seq.menu),
            name: item.name,
            price: domain::money::normalize(item.price),
            description: item.description,
            category: item.category,
            item_type: item.item_type,
            availability: item.availability,
            image_url: item.image_url,
            created_at: Utc::now(),
        };
        db.menu.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn list(&self, filter: &MenuFilter) -> StoreResult<Vec<MenuItemEntity>> {
        let db = self.inner.read().await;
        let mut items: Vec<MenuItemEntity> = db
            .menu
            .values()
            .filter(|m| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|c| m.category.as_ref() == Some(c))
            })
            .filter(|m| filter.item_type.as_ref().is_none_or(|t| &m.item_type == t))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn find(&self, id: i32) -> StoreResult<Option<MenuItemEntity>> {
        Ok(self.inner.read().await.menu.get(&id).cloned())
    }

    async fn update(
        &self,
        id: i32,
        item: CreateMenuItemEntity,
    ) -> StoreResult<Option<MenuItemEntity>> {
        let mut db = self.inner.write().await;
        let Some(entity) = db.menu.get_mut(&id) else {
            return Ok(None);
        };
        entity.name = item.name;
        entity.price = domain::money::normalize(item.price);
        entity.description = item.description;
        entity.category = item.category;
        entity.item_type = item.item_type;
        entity.availability = item.availability;
        entity.image_url = item.image_url;
        Ok(Some(entity.clone()))
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        if !db.menu.contains_key(&id) {
            return Ok(false);
        }
        if db.order_items.values().any(|line| line.item_id == id) {
            return Err(StoreError::Conflict(format!(
                "menu item {id} is referenced by existing orders"
            )));
        }
        db.cart_items.retain(|_, row| row.item_id != id);
        db.menu.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl TableRepository for MemoryStore {
    async fn create(
        &self,
        table: CreateRestaurantTableEntity,
    ) -> StoreResult<RestaurantTableEntity> {
        let mut db = self.inner.write().await;
        if db
            .tables
            .values()
            .any(|t| t.table_number == table.table_number)
        {
            return Err(StoreError::Conflict(
                "restaurant_tables_table_number_key".into(),
            ));
        }
        let entity = RestaurantTableEntity {
            id: next(&mut db.seq.tables),
            table_number: table.table_number,
            seats: table.seats,
            is_occupied: table.is_occupied,
        };
        db.tables.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn list(&self) -> StoreResult<Vec<RestaurantTableEntity>> {
        let db = self.inner.read().await;
        let mut tables: Vec<RestaurantTableEntity> = db.tables.values().cloned().collect();
        tables.sort_by_key(|t| t.table_number);
        Ok(tables)
    }

    async fn find(&self, id: i32) -> StoreResult<Option<RestaurantTableEntity>> {
        Ok(self.inner.read().await.tables.get(&id).cloned())
    }

    async fn update(
        &self,
        id: i32,
        table: CreateRestaurantTableEntity,
    ) -> StoreResult<Option<RestaurantTableEntity>> {
        let mut db = self.inner.write().await;
        if db
            .tables
            .values()
            .any(|t| t.table_number == table.table_number && t.id != id)
        {
            return Err(StoreError::Conflict(
                "restaurant_tables_table_number_key".into(),
            ));
        }
        let Some(entity) = db.tables.get_mut(&id) else {
            return Ok(None);
        };
        entity.table_number = table.table_number;
        entity.seats = table.seats;
        entity.is_occupied = table.is_occupied;
        Ok(Some(entity.clone()))
    }

    async fn set_occupied(
        &self,
        id: i32,
        is_occupied: bool,
    ) -> StoreResult<Option<RestaurantTableEntity>> {
        let mut db = self.inner.write().await;
        Ok(db.tables.get_mut(&id).map(|t| {
            t.is_occupied = is_occupied;
            t.clone()
        }))
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn get_or_create(&self, user_id: i32) -> StoreResult<i32> {
        let mut db = self.inner.write().await;
        if let Some(cart) = db.carts.values().find(|c| c.user_id == user_id) {
            return Ok(cart.id);
        }
        let cart = CartEntity {
            id: next(&mut db.seq.carts),
            user_id,
            created_at: Utc::now(),
        };
        let id = cart.id;
        db.carts.insert(id, cart);
        Ok(id)
    }

    async fn add_item(&self, cart_id: i32, item_id: i32, quantity: i32) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if let Some(row) = db
            .cart_items
            .values_mut()
            .find(|row| row.cart_id == cart_id && row.item_id == item_id)
        {
            row.quantity = row
                .quantity
                .checked_add(quantity)
                .filter(|merged| *merged <= MAX_LINE_QUANTITY)
                .ok_or(StoreError::QuantityLimit(item_id))?;
            return Ok(());
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(StoreError::QuantityLimit(item_id));
        }
        let id = next(&mut db.seq.cart_items);
        db.cart_items.insert(
            id,
            CartItemRow {
                cart_id,
                item_id,
                quantity,
            },
        );
        Ok(())
    }

    async fn set_quantity(&self, cart_id: i32, item_id: i32, quantity: i32) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if let Some(row) = db
            .cart_items
            .values_mut()
            .find(|row| row.cart_id == cart_id && row.item_id == item_id)
        {
            row.quantity = quantity;
        }
        Ok(())
    }

    async fn remove_item(&self, cart_id: i32, item_id: i32) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        db.cart_items
            .retain(|_, row| !(row.cart_id == cart_id && row.item_id == item_id));
        Ok(())
    }

    async fn clear(&self, cart_id: i32) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        db.cart_items.retain(|_, row| row.cart_id != cart_id);
        Ok(())
    }

    async fn lines(&self, cart_id: i32) -> StoreResult<Vec<CartLineView>> {
        let db = self.inner.read().await;
        let lines = db
            .cart_items
            .iter()
            .filter(|(_, row)| row.cart_id == cart_id)
            .filter_map(|(id, row)| {
                let item = db.menu.get(&row.item_id)?;
                Some(CartLineView {
                    id: *id,
                    item_id: row.item_id,
                    quantity: row.quantity,
                    name: item.name.clone(),
                    price: item.price,
                    description: item.description.clone(),
                    category: item.category.clone(),
                    item_type: item.item_type.clone(),
                    availability: item.availability,
                })
            })
            .collect();
        Ok(lines)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create_from_cart(
        &self,
        user_id: i32,
        table_id: i32,
        payment_method: &str,
    ) -> StoreResult<OrderEntity> {
        let mut db = self.inner.write().await;
        let cart_id = db
            .carts
            .values()
            .find(|c| c.user_id == user_id)
            .map(|c| c.id)
            .ok_or(StoreError::EmptyCart)?;

        let lines: Vec<(i32, i32, rust_decimal::Decimal)> = db
            .cart_items
            .values()
            .filter(|row| row.cart_id == cart_id)
            .filter_map(|row| {
                db.menu
                    .get(&row.item_id)
                    .map(|item| (row.item_id, row.quantity, item.price))
            })
            .collect();
        if lines.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let order = db.insert_order(user_id, Some(table_id), payment_method, lines)?;
        db.cart_items.retain(|_, row| row.cart_id != cart_id);
        Ok(order)
    }

    async fn create_direct(
        &self,
        user_id: i32,
        lines: &[RequestedLine],
        payment_method: &str,
    ) -> StoreResult<OrderEntity> {
        let mut db = self.inner.write().await;
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            match db.menu.get(&line.item_id) {
                Some(item) if item.availability => {
                    priced.push((line.item_id, line.quantity, item.price))
                }
                _ => return Err(StoreError::ItemUnavailable(line.item_id)),
            }
        }
        db.insert_order(user_id, None, payment_method, priced)
    }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderSummary>> {
        let db = self.inner.read().await;
        let mut orders: Vec<&OrderEntity> = db
            .orders
            .values()
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .filter(|o| filter.user_id.is_none_or(|u| o.user_id == u))
            .collect();
        orders.sort_by(|a, b| newest_first(a, b));
        Ok(orders.into_iter().filter_map(|o| db.summary(o)).collect())
    }

    async fn list_active(&self) -> StoreResult<Vec<OrderSummary>> {
        let db = self.inner.read().await;
        let mut orders: Vec<&OrderEntity> =
            db.orders.values().filter(|o| o.status.is_active()).collect();
        orders.sort_by(|a, b| newest_first(a, b));
        Ok(orders.into_iter().filter_map(|o| db.summary(o)).collect())
    }

    async fn find(&self, id: i32) -> StoreResult<Option<OrderEntity>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn details(&self, id: i32) -> StoreResult<Option<OrderDetails>> {
        let db = self.inner.read().await;
        let Some(order) = db.orders.get(&id) else {
            return Ok(None);
        };
        let user = db
            .users
            .get(&order.user_id)
            .ok_or_else(|| anyhow!("order {id} references missing user {}", order.user_id))?;

        let items = db
            .order_items
            .values()
            .filter(|line| line.order_id == id)
            .filter_map(|line| {
                let item = db.menu.get(&line.item_id)?;
                Some(OrderLineView {
                    id: line.id,
                    item_id: line.item_id,
                    quantity: line.quantity,
                    price: line.price,
                    name: item.name.clone(),
                    description: item.description.clone(),
                    category: item.category.clone(),
                    item_type: item.item_type.clone(),
                })
            })
            .collect();

        Ok(Some(OrderDetails {
            order: order.clone(),
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            items,
        }))
    }

    async fn set_status(
        &self,
        id: i32,
        expected: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<Option<OrderEntity>> {
        let mut db = self.inner.write().await;
        let Some(order) = db.orders.get_mut(&id) else {
            return Ok(None);
        };
        if order.status != expected {
            return Ok(None);
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn record(&self, payment: RecordPayment) -> StoreResult<RecordedPayment> {
        let mut db = self.inner.write().await;
        if !db.orders.contains_key(&payment.order_id) {
            return Err(StoreError::Conflict(format!(
                "order {} does not exist",
                payment.order_id
            )));
        }

        let latest = db
            .payments
            .values()
            .filter(|p| p.order_id == payment.order_id)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .map(|p| p.id);

        if let Some(existing_id) = latest {
            if payment.policy == DuplicatePaymentPolicy::Reject {
                return Err(StoreError::Conflict(
                    "Payment already exists for this order".into(),
                ));
            }
            let existing = db
                .payments
                .get_mut(&existing_id)
                .ok_or_else(|| anyhow!("payment {existing_id} vanished"))?;
            existing.status = payment.existing_status;
            existing.method = payment.method;
            if payment.transaction_id.is_some() {
                existing.transaction_id = payment.transaction_id;
            }
            return Ok(RecordedPayment::Superseded(existing.clone()));
        }

        let entity = PaymentEntity {
            id: next(&mut db.seq.payments),
            order_id: payment.order_id,
            amount: domain::money::normalize(payment.amount),
            method: payment.method,
            transaction_id: payment.transaction_id,
            status: payment.new_status,
            created_at: Utc::now(),
        };
        db.payments.insert(entity.id, entity.clone());
        Ok(RecordedPayment::Created(entity))
    }

    async fn list(&self) -> StoreResult<Vec<PaymentSummary>> {
        let db = self.inner.read().await;
        let mut payments: Vec<PaymentSummary> = db
            .payments
            .values()
            .filter_map(|p| {
                let order = db.orders.get(&p.order_id)?;
                let user = db.users.get(&order.user_id)?;
                Some(PaymentSummary {
                    payment: p.clone(),
                    user_id: order.user_id,
                    order_total: order.total_amount,
                    user_name: user.name.clone(),
                })
            })
            .collect();
        payments.sort_by(|a, b| {
            b.payment
                .created_at
                .cmp(&a.payment.created_at)
                .then(b.payment.id.cmp(&a.payment.id))
        });
        Ok(payments)
    }

    async fn list_for_order(&self, order_id: i32) -> StoreResult<Vec<PaymentEntity>> {
        let db = self.inner.read().await;
        let mut payments: Vec<PaymentEntity> = db
            .payments
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(payments)
    }

    async fn find(&self, id: i32) -> StoreResult<Option<PaymentEntity>> {
        Ok(self.inner.read().await.payments.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: i32,
        status: PaymentStatus,
    ) -> StoreResult<Option<PaymentEntity>> {
        let mut db = self.inner.write().await;
        Ok(db.payments.get_mut(&id).map(|p| {
            p.status = status;
            p.clone()
        }))
    }
}

#[async_trait]
impl ChatRepository for MemoryStore {
    async fn get_or_create(&self, user_id: i32) -> StoreResult<ChatEntity> {
        let mut db = self.inner.write().await;
        if let Some(chat) = db.chats.values().find(|c| c.user_id == user_id) {
            return Ok(chat.clone());
        }
        if !db.users.contains_key(&user_id) {
            return Err(StoreError::Conflict(format!("user {user_id} does not exist")));
        }
        let chat = ChatEntity {
            id: next(&mut db.seq.chats),
            user_id,
            created_at: Utc::now(),
        };
        db.chats.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn users_with_chats(&self) -> StoreResult<Vec<ChatUser>> {
        let db = self.inner.read().await;
        let mut users: Vec<ChatUser> = db
            .chats
            .values()
            .filter_map(|c| db.users.get(&c.user_id))
            .map(|u| ChatUser {
                id: u.id,
                name: u.name.clone(),
                phone: u.phone.clone(),
                email: u.email.clone(),
            })
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn add_message(
        &self,
        chat_id: i32,
        sender_id: i32,
        text: &str,
    ) -> StoreResult<MessageEntity> {
        let mut db = self.inner.write().await;
        if !db.users.contains_key(&sender_id) {
            return Err(StoreError::Conflict(format!(
                "sender {sender_id} does not exist"
            )));
        }
        let message = MessageEntity {
            id: next(&mut db.seq.messages),
            chat_id,
            sender_id,
            message_text: text.to_string(),
            timestamp: Utc::now(),
        };
        db.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn messages(&self, chat_id: i32) -> StoreResult<Vec<MessageView>> {
        let db = self.inner.read().await;
        let mut messages: Vec<MessageView> = db
            .messages
            .values()
            .filter(|m| m.chat_id == chat_id)
            .filter_map(|m| {
                let sender = db.users.get(&m.sender_id)?;
                Some(MessageView {
                    id: m.id,
                    chat_id: m.chat_id,
                    sender_id: m.sender_id,
                    message_text: m.message_text.clone(),
                    timestamp: m.timestamp,
                    sender_name: sender.name.clone(),
                    sender_role: sender.role.clone(),
                })
            })
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    async fn seed(store: &MemoryStore) -> (i32, i32, i32) {
        let user = UserRepository::create(
            store,
            CreateUserEntity {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                phone: None,
                role: "customer".into(),
                password: "x".into(),
            },
        )
        .await
        .unwrap();
        let item = MenuRepository::create(
            store,
            CreateMenuItemEntity {
                name: "Paneer Tikka".into(),
                price: dec("100"),
                description: None,
                category: Some("starters".into()),
                item_type: "food".into(),
                availability: true,
                image_url: None,
            },
        )
        .await
        .unwrap();
        let table = TableRepository::create(
            store,
            CreateRestaurantTableEntity {
                table_number: 1,
                seats: 4,
                is_occupied: false,
            },
        )
        .await
        .unwrap();
        (user.id, item.id, table.id)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_merge_into_one_line() {
        let store = Arc::new(MemoryStore::default());
        let (user_id, item_id, _) = seed(&store).await;
        let cart_id = CartRepository::get_or_create(store.as_ref(), user_id)
            .await
            .unwrap();

        let handles: Vec<_> = (1..=20)
            .map(|qty| {
                let store = store.clone();
                tokio::spawn(async move {
                    CartRepository::add_item(store.as_ref(), cart_id, item_id, qty).await
                })
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        let lines = CartRepository::lines(store.as_ref(), cart_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, (1..=20).sum::<i32>());
    }

    #[tokio::test]
    async fn merge_stops_at_the_line_limit_without_overflowing() {
        let store = MemoryStore::default();
        let (user_id, item_id, _) = seed(&store).await;
        let cart_id = CartRepository::get_or_create(&store, user_id).await.unwrap();

        let err = CartRepository::add_item(&store, cart_id, item_id, i32::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::QuantityLimit(id) if id == item_id));

        CartRepository::add_item(&store, cart_id, item_id, MAX_LINE_QUANTITY)
            .await
            .unwrap();
        for extra in [1, i32::MAX] {
            let err = CartRepository::add_item(&store, cart_id, item_id, extra)
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::QuantityLimit(_)));
        }

        let lines = CartRepository::lines(&store, cart_id).await.unwrap();
        assert_eq!(lines[0].quantity, MAX_LINE_QUANTITY);
    }

    #[tokio::test]
    async fn checkout_beyond_the_money_column_writes_nothing() {
        let store = MemoryStore::default();
        let (user_id, _, table_id) = seed(&store).await;
        let pricey = MenuRepository::create(
            &store,
            CreateMenuItemEntity {
                name: "Banquet".into(),
                price: dec("99999999.99"),
                description: None,
                category: None,
                item_type: "food".into(),
                availability: true,
                image_url: None,
            },
        )
        .await
        .unwrap();
        let cart_id = CartRepository::get_or_create(&store, user_id).await.unwrap();
        CartRepository::add_item(&store, cart_id, pricey.id, 2).await.unwrap();

        let err = store
            .create_from_cart(user_id, table_id, "cash")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TotalOutOfRange));
        assert!(OrderRepository::list(&store, &OrderFilter::default()).await.unwrap().is_empty());
        assert_eq!(CartRepository::lines(&store, cart_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn checkout_freezes_prices_and_empties_cart() {
        let store = MemoryStore::default();
        let (user_id, item_id, table_id) = seed(&store).await;
        let cart_id = CartRepository::get_or_create(&store, user_id).await.unwrap();
        CartRepository::add_item(&store, cart_id, item_id, 2).await.unwrap();

        let order = store
            .create_from_cart(user_id, table_id, "cash")
            .await
            .unwrap();
        assert_eq!(order.total_amount, dec("200.00"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(CartRepository::lines(&store, cart_id).await.unwrap().is_empty());

        let mut repriced = MenuRepository::find(&store, item_id).await.unwrap().unwrap();
        repriced.price = dec("150");
        MenuRepository::update(
            &store,
            item_id,
            CreateMenuItemEntity {
                name: repriced.name,
                price: repriced.price,
                description: None,
                category: None,
                item_type: "food".into(),
                availability: true,
                image_url: None,
            },
        )
        .await
        .unwrap();

        let details = store.details(order.id).await.unwrap().unwrap();
        assert_eq!(details.order.total_amount, dec("200.00"));
        assert_eq!(details.items[0].price, dec("100"));
    }

    #[tokio::test]
    async fn empty_cart_writes_nothing() {
        let store = MemoryStore::default();
        let (user_id, _, table_id) = seed(&store).await;
        CartRepository::get_or_create(&store, user_id).await.unwrap();

        let err = store
            .create_from_cart(user_id, table_id, "cash")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyCart));
        assert!(
            OrderRepository::list(&store, &OrderFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn direct_order_is_all_or_nothing() {
        let store = MemoryStore::default();
        let (user_id, item_id, _) = seed(&store).await;
        let lines = [
            RequestedLine { item_id, quantity: 1 },
            RequestedLine { item_id: 99, quantity: 3 },
        ];

        let err = store.create_direct(user_id, &lines, "cash").await.unwrap_err();
        assert!(matches!(err, StoreError::ItemUnavailable(99)));
        assert!(store.inner.read().await.orders.is_empty());
        assert!(store.inner.read().await.order_items.is_empty());
    }

    #[tokio::test]
    async fn set_status_compares_before_writing() {
        let store = MemoryStore::default();
        let (user_id, item_id, _) = seed(&store).await;
        let order = store
            .create_direct(user_id, &[RequestedLine { item_id, quantity: 1 }], "cash")
            .await
            .unwrap();

        let moved = store
            .set_status(order.id, OrderStatus::Accepted, OrderStatus::Ready)
            .await
            .unwrap();
        assert!(moved.is_none());

        let moved = store
            .set_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn second_payment_supersedes_or_conflicts() {
        let store = MemoryStore::default();
        let (user_id, item_id, _) = seed(&store).await;
        let order = store
            .create_direct(user_id, &[RequestedLine { item_id, quantity: 1 }], "cash")
            .await
            .unwrap();
        let request = |policy, txn: Option<&str>| RecordPayment {
            order_id: order.id,
            amount: dec("100.00"),
            method: "card".into(),
            transaction_id: txn.map(str::to_string),
            new_status: PaymentStatus::Pending,
            existing_status: PaymentStatus::Completed,
            policy,
        };

        let first = store
            .record(request(DuplicatePaymentPolicy::Supersede, Some("t-1")))
            .await
            .unwrap();
        let RecordedPayment::Created(first) = first else {
            panic!("expected a new payment");
        };

        let second = store
            .record(request(DuplicatePaymentPolicy::Supersede, None))
            .await
            .unwrap();
        let RecordedPayment::Superseded(payment) = second else {
            panic!("expected the existing payment to be updated");
        };
        assert_eq!(payment.id, first.id);
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.transaction_id.as_deref(), Some("t-1"));
        assert_eq!(store.list_for_order(order.id).await.unwrap().len(), 1);

        let err = store
            .record(request(DuplicatePaymentPolicy::Reject, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_a_user_with_orders_conflicts() {
        let store = MemoryStore::default();
        let (user_id, item_id, _) = seed(&store).await;
        store
            .create_direct(user_id, &[RequestedLine { item_id, quantity: 1 }], "cash")
            .await
            .unwrap();

        let err = UserRepository::delete(&store, user_id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}

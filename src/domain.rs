//! Order and payment lifecycle rules.
//!
//! Statuses are stored as lowercase text. The transition table for orders
//! lives in [`TransitionPolicy`]; which table is active is chosen by
//! configuration.

use std::{fmt, io::Write, str::FromStr};

use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    serialize::{self, IsNull, Output, ToSql},
    sql_types::Text,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Ready,
    Delivered,
    Paid,
    Cancelled,
}

impl OrderStatus {
    /// Statuses that may be requested through the status endpoint.
    pub const UPDATABLE: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_updatable(&self) -> bool {
        Self::UPDATABLE.contains(self)
    }

    /// Orders still in flight on the POS screen.
    pub fn is_active(&self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    /// Next step of the kitchen flow.
    fn kitchen_successor(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Accepted),
            OrderStatus::Accepted => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivered),
            _ => None,
        }
    }

    pub fn updatable_list() -> String {
        Self::UPDATABLE
            .iter()
            .map(OrderStatus::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "delivered" => Ok(OrderStatus::Delivered),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "order status",
                value: other.to_string(),
            }),
        }
    }
}

impl ToSql<Text, Pg> for OrderStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for OrderStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(value.parse()?)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(UnknownVariant {
                kind: "payment status",
                value: other.to_string(),
            }),
        }
    }
}

impl ToSql<Text, Pg> for PaymentStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for PaymentStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(value.parse()?)
    }
}

/// Which order status changes the status endpoint accepts.
///
/// `Lenient` accepts any move between updatable statuses, which is how the
/// restaurant floor has always used the admin screen. `ForwardOnly` follows
/// the kitchen flow `pending → accepted → preparing → ready → delivered`,
/// lets `paid` be recorded from any live status and treats a repeated status
/// as a no-op. `cancelled` is terminal under both tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    #[default]
    Lenient,
    ForwardOnly,
}

impl TransitionPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        if from.is_terminal() || !to.is_updatable() {
            return false;
        }
        match self {
            TransitionPolicy::Lenient => true,
            TransitionPolicy::ForwardOnly => {
                from == to || to == OrderStatus::Paid || from.kitchen_successor() == Some(to)
            }
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lenient" => Ok(TransitionPolicy::Lenient),
            "forward_only" => Ok(TransitionPolicy::ForwardOnly),
            other => Err(UnknownVariant {
                kind: "transition policy",
                value: other.to_string(),
            }),
        }
    }
}

/// What happens when a payment is recorded for an order that already has one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePaymentPolicy {
    /// Update the most recent payment row in place.
    #[default]
    Supersede,
    /// Refuse with a conflict.
    Reject,
}

impl FromStr for DuplicatePaymentPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supersede" => Ok(DuplicatePaymentPolicy::Supersede),
            "reject" => Ok(DuplicatePaymentPolicy::Reject),
            other => Err(UnknownVariant {
                kind: "duplicate payment policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Largest quantity a single cart or order line may hold.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// Money helpers. Amounts are kept at two decimal places.
pub mod money {
    use rust_decimal::{Decimal, RoundingStrategy};

    /// Largest amount a `NUMERIC(10, 2)` column holds.
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

    /// Whether `amount` is storable as a price or total.
    pub fn in_range(amount: Decimal) -> bool {
        normalize(amount) <= MAX_AMOUNT
    }

    pub fn normalize(amount: Decimal) -> Decimal {
        let mut amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(2);
        amount
    }

    pub fn line_total(price: Decimal, quantity: i32) -> Decimal {
        price * Decimal::from(quantity)
    }

    pub fn format(amount: Decimal) -> String {
        normalize(amount).to_string()
    }
}

pub fn sum_lines<'a>(lines: impl IntoIterator<Item = (&'a Decimal, i32)>) -> Decimal {
    money::normalize(
        lines
            .into_iter()
            .map(|(price, quantity)| money::line_total(*price, quantity))
            .sum(),
    )
}

use anyhow::Context;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};
use rust_decimal::Decimal;

use super::PgStore;
use crate::{
    domain::{DuplicatePaymentPolicy, PaymentStatus, money},
    models::{CreatePaymentEntity, PaymentEntity, PaymentSummary},
    schema::{orders, payments, users},
    store::{PaymentRepository, RecordPayment, RecordedPayment, StoreError, StoreResult},
};

#[async_trait]
impl PaymentRepository for PgStore {
    async fn record(&self, payment: RecordPayment) -> StoreResult<RecordedPayment> {
        let conn = &mut self.conn().await?;

        conn.transaction::<_, StoreError, _>(move |conn| {
            async move {
                // Locking the order serializes concurrent payments for it.
                let order_id: Option<i32> = orders::table
                    .find(payment.order_id)
                    .select(orders::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if order_id.is_none() {
                    return Err(StoreError::Conflict(format!(
                        "order {} does not exist",
                        payment.order_id
                    )));
                }

                let latest: Option<PaymentEntity> = payments::table
                    .filter(payments::order_id.eq(payment.order_id))
                    .order((payments::created_at.desc(), payments::id.desc()))
                    .select(PaymentEntity::as_select())
                    .first(conn)
                    .await
                    .optional()
                    .context("Failed to get existing payment")?;

                match latest {
                    Some(_) if payment.policy == DuplicatePaymentPolicy::Reject => Err(
                        StoreError::Conflict("Payment already exists for this order".into()),
                    ),
                    Some(existing) => {
                        let transaction_id = payment.transaction_id.or(existing.transaction_id);
                        let updated = diesel::update(payments::table.find(existing.id))
                            .set((
                                payments::status.eq(payment.existing_status),
                                payments::method.eq(payment.method),
                                payments::transaction_id.eq(transaction_id),
                            ))
                            .returning(PaymentEntity::as_returning())
                            .get_result(conn)
                            .await
                            .context("Failed to update payment")?;
                        Ok(RecordedPayment::Superseded(updated))
                    }
                    None => {
                        let created = diesel::insert_into(payments::table)
                            .values(CreatePaymentEntity {
                                order_id: payment.order_id,
                                amount: money::normalize(payment.amount),
                                method: payment.method,
                                transaction_id: payment.transaction_id,
                                status: payment.new_status,
                            })
                            .returning(PaymentEntity::as_returning())
                            .get_result(conn)
                            .await
                            .context("Failed to create payment")?;
                        Ok(RecordedPayment::Created(created))
                    }
                }
            }
            .scope_boxed()
        })
        .await
    }

    async fn list(&self) -> StoreResult<Vec<PaymentSummary>> {
        let conn = &mut self.conn().await?;

        let rows: Vec<(PaymentEntity, i32, Decimal, String)> = payments::table
            .inner_join(orders::table.inner_join(users::table))
            .select((
                PaymentEntity::as_select(),
                orders::user_id,
                orders::total_amount,
                users::name,
            ))
            .order((payments::created_at.desc(), payments::id.desc()))
            .load(conn)
            .await
            .context("Failed to get payments")?;

        Ok(rows
            .into_iter()
            .map(|(payment, user_id, order_total, user_name)| PaymentSummary {
                payment,
                user_id,
                order_total,
                user_name,
            })
            .collect())
    }

    async fn list_for_order(&self, order_id: i32) -> StoreResult<Vec<PaymentEntity>> {
        let conn = &mut self.conn().await?;

        let payments = payments::table
            .filter(payments::order_id.eq(order_id))
            .order((payments::created_at.desc(), payments::id.desc()))
            .select(PaymentEntity::as_select())
            .load(conn)
            .await
            .context("Failed to get payments for order")?;

        Ok(payments)
    }

    async fn find(&self, id: i32) -> StoreResult<Option<PaymentEntity>> {
        let conn = &mut self.conn().await?;

        let payment = payments::table
            .find(id)
            .select(PaymentEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get payment")?;

        Ok(payment)
    }

    async fn update_status(
        &self,
        id: i32,
        status: PaymentStatus,
    ) -> StoreResult<Option<PaymentEntity>> {
        let conn = &mut self.conn().await?;

        let payment = diesel::update(payments::table.find(id))
            .set(payments::status.eq(status))
            .returning(PaymentEntity::as_returning())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to update payment status")?;

        Ok(payment)
    }
}

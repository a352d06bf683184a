use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    common::{app_error::AppError, app_state::AppState, validation::require_fields},
    domain::PaymentStatus,
    models::{PaymentEntity, PaymentSummary},
    services::orders::find_order,
    store::{RecordPayment, RecordedPayment},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentReq {
    pub order_id: Option<i32>,
    #[schema(value_type = Option<String>, example = "450.00")]
    pub amount: Option<Decimal>,
    pub method: Option<String>,
    pub transaction_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusReq {
    pub status: Option<String>,
}

fn invalid_status() -> AppError {
    let valid: Vec<&str> = PaymentStatus::ALL.iter().map(PaymentStatus::as_str).collect();
    AppError::validation(format!("Invalid status. Valid statuses: {}", valid.join(", ")))
}

/// Records a payment for an order. The amount has to equal the order total
/// exactly; scale is ignored, so `450` matches `450.00`.
pub async fn create_payment(
    state: &AppState,
    req: CreatePaymentReq,
) -> Result<PaymentEntity, AppError> {
    require_fields(&[
        ("order_id", &req.order_id),
        ("amount", &req.amount),
        ("method", &req.method),
    ])?;
    let order_id = req.order_id.unwrap_or_default();
    let amount = req.amount.unwrap_or_default();

    let status = req
        .status
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<PaymentStatus>().map_err(|_| invalid_status()))
        .transpose()?;

    let order = find_order(state, order_id).await?;
    if amount != order.total_amount {
        return Err(AppError::validation("Payment amount must match order total"));
    }

    let recorded = state
        .store
        .payments
        .record(RecordPayment {
            order_id,
            amount,
            method: req.method.unwrap_or_default(),
            transaction_id: req.transaction_id.filter(|t| !t.is_empty()),
            new_status: status.unwrap_or(PaymentStatus::Pending),
            existing_status: status.unwrap_or(PaymentStatus::Completed),
            policy: state.policies.duplicate_payments,
        })
        .await?;

    match &recorded {
        RecordedPayment::Created(p) => {
            info!("Payment #{} recorded for order #{}", p.id, order_id)
        }
        RecordedPayment::Superseded(p) => {
            info!("Payment #{} for order #{} updated to {}", p.id, order_id, p.status)
        }
    }

    Ok(recorded.into_payment())
}

pub async fn list_payments(state: &AppState) -> Result<Vec<PaymentSummary>, AppError> {
    Ok(state.store.payments.list().await?)
}

pub async fn get_payment(state: &AppState, id: i32) -> Result<PaymentEntity, AppError> {
    state
        .store
        .payments
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment not found"))
}

pub async fn payments_for_order(
    state: &AppState,
    order_id: i32,
) -> Result<Vec<PaymentEntity>, AppError> {
    find_order(state, order_id).await?;
    Ok(state.store.payments.list_for_order(order_id).await?)
}

pub async fn update_status(
    state: &AppState,
    id: i32,
    req: UpdatePaymentStatusReq,
) -> Result<PaymentEntity, AppError> {
    let status = req
        .status
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("status is required"))?;
    let status: PaymentStatus = status.parse().map_err(|_| invalid_status())?;

    let payment = state
        .store
        .payments
        .update_status(id, status)
        .await?
        .ok_or_else(|| AppError::not_found("Payment not found"))?;

    info!("Payment #{} is now {}", id, status);
    Ok(payment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::config::OrderPolicies,
        domain::DuplicatePaymentPolicy,
        models::{CreateMenuItemEntity, CreateUserEntity, RequestedLine},
    };

    async fn order_worth_450(state: &AppState) -> i32 {
        let user = state
            .store
            .users
            .create(CreateUserEntity {
                name: "Dev".into(),
                email: "dev@example.com".into(),
                phone: None,
                role: "customer".into(),
                password: "x".into(),
            })
            .await
            .unwrap();
        let item = state
            .store
            .menu
            .create(CreateMenuItemEntity {
                name: "Thali".into(),
                price: Decimal::from(150),
                description: None,
                category: None,
                item_type: "food".into(),
                availability: true,
                image_url: None,
            })
            .await
            .unwrap();
        state
            .store
            .orders
            .create_direct(
                user.id,
                &[RequestedLine {
                    item_id: item.id,
                    quantity: 3,
                }],
                "card",
            )
            .await
            .unwrap()
            .id
    }

    fn pay(order_id: i32, amount: &str) -> CreatePaymentReq {
        CreatePaymentReq {
            order_id: Some(order_id),
            amount: Some(amount.parse().unwrap()),
            method: Some("card".into()),
            transaction_id: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn amount_must_match_exactly() {
        let state = AppState::in_memory();
        let order_id = order_worth_450(&state).await;

        let err = create_payment(&state, pay(order_id, "449.99")).await.unwrap_err();
        assert_eq!(err.to_string(), "Payment amount must match order total");
        assert!(state.store.payments.list_for_order(order_id).await.unwrap().is_empty());

        let payment = create_payment(&state, pay(order_id, "450")).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn second_payment_updates_the_first() {
        let state = AppState::in_memory();
        let order_id = order_worth_450(&state).await;

        let first = create_payment(&state, pay(order_id, "450.00")).await.unwrap();
        let second = create_payment(&state, pay(order_id, "450.00")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, PaymentStatus::Completed);
        assert_eq!(payments_for_order(&state, order_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reject_policy_refuses_a_second_payment() {
        let state = AppState::in_memory().with_policies(OrderPolicies {
            duplicate_payments: DuplicatePaymentPolicy::Reject,
            ..Default::default()
        });
        let order_id = order_worth_450(&state).await;

        create_payment(&state, pay(order_id, "450.00")).await.unwrap();
        let err = create_payment(&state, pay(order_id, "450.00")).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT_ERROR");
    }

    #[tokio::test]
    async fn status_updates_are_validated() {
        let state = AppState::in_memory();
        let order_id = order_worth_450(&state).await;
        let payment = create_payment(&state, pay(order_id, "450.00")).await.unwrap();

        let err = update_status(
            &state,
            payment.id,
            UpdatePaymentStatusReq {
                status: Some("settled".into()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid status. Valid statuses: pending, completed, failed, refunded"
        );

        let err = update_status(
            &state,
            999,
            UpdatePaymentStatusReq {
                status: Some("refunded".into()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Payment not found");

        let refunded = update_status(
            &state,
            payment.id,
            UpdatePaymentStatusReq {
                status: Some("refunded".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);
    }
}

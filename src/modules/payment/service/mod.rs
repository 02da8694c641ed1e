pub mod provider;

use super::repository;
use crate::modules::order::{
    self,
    repository::{Order, PaymentStatus},
};
use crate::modules::user::repository::User;
use crate::types::Context;
use std::sync::Arc;

pub enum Error {
    AlreadyPaid,
    UnexpectedError,
}

pub struct InitializeCheckoutPayload {
    pub order: Order,
    pub payer: User,
}

pub async fn initialize_checkout_for_order(
    ctx: Arc<Context>,
    payload: InitializeCheckoutPayload,
) -> Result<provider::CheckoutSession, Error> {
    if payload.order.payment_status == PaymentStatus::Paid {
        return Err(Error::AlreadyPaid);
    }

    provider::create_checkout_session(
        ctx,
        provider::CreateCheckoutSessionPayload {
            order: payload.order,
            payer_email: payload.payer.email,
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)
}

pub enum ReconcileOutcome {
    Completed,
    NotCompleted,
}

/// What a paid session turns into. `None` means the session gives us nothing
/// safe to record: not paid yet, no transaction id, or no order reference.
struct PaymentRecordPlan {
    transaction_id: String,
    session_id: String,
    order_id: String,
    email: String,
    amount: i64,
}

fn reconciliation_plan(session: &provider::RetrievedSession) -> Option<PaymentRecordPlan> {
    if session.payment_status != "paid" {
        return None;
    }

    let transaction_id = session.payment_intent.as_ref().filter(|id| !id.is_empty())?;
    let order_id = session.metadata.get("order_id").filter(|id| !id.is_empty())?;

    Some(PaymentRecordPlan {
        transaction_id: transaction_id.clone(),
        session_id: session.id.clone(),
        order_id: order_id.clone(),
        email: session
            .customer_details
            .as_ref()
            .and_then(|details| details.email.clone())
            .unwrap_or_default(),
        amount: session.amount_total.unwrap_or_default(),
    })
}

/// Checkout reconciliation: retrieve the session from the provider, record the
/// payment once and mark the order paid. Every failure mode that is not a
/// genuine fault degrades to `NotCompleted`; replays land on the unique
/// transaction-id index and are treated as already done.
pub async fn reconcile_checkout(
    ctx: Arc<Context>,
    session_id: String,
) -> Result<ReconcileOutcome, Error> {
    let session = match provider::retrieve_checkout_session(ctx.clone(), session_id.clone()).await
    {
        Ok(session) => session,
        Err(provider::Error::SessionNotFound) => {
            tracing::warn!("Checkout session {} not found at provider", session_id);
            return Ok(ReconcileOutcome::NotCompleted);
        }
        Err(_) => return Err(Error::UnexpectedError),
    };

    let plan = match reconciliation_plan(&session) {
        Some(plan) => plan,
        None => return Ok(ReconcileOutcome::NotCompleted),
    };

    match repository::create(
        &ctx.db_conn,
        repository::CreatePaymentPayload {
            transaction_id: plan.transaction_id.clone(),
            session_id: plan.session_id,
            order_id: plan.order_id.clone(),
            email: plan.email,
            amount: plan.amount,
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    {
        repository::InsertOutcome::Recorded(_) => {
            tracing::info!("Recorded payment {}", plan.transaction_id);
        }
        repository::InsertOutcome::AlreadyRecorded => {
            tracing::info!(
                "Payment {} already recorded, replayed callback ignored",
                plan.transaction_id
            );
        }
    }

    match order::repository::mark_as_paid(&ctx.db_conn, plan.order_id.clone())
        .await
        .map_err(|_| Error::UnexpectedError)?
    {
        Some(_) => (),
        None => {
            // The payment stands even if the order vanished; surface it loudly.
            tracing::error!(
                "Recorded payment {} but order {} does not exist",
                plan.transaction_id,
                plan.order_id
            );
        }
    }

    Ok(ReconcileOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn paid_session() -> provider::RetrievedSession {
        provider::RetrievedSession {
            id: "cs_test_123".to_string(),
            payment_status: "paid".to_string(),
            payment_intent: Some("pi_456".to_string()),
            amount_total: Some(4200),
            metadata: HashMap::from([("order_id".to_string(), "01J0ABCDEF".to_string())]),
            customer_details: Some(provider::CustomerDetails {
                email: Some("buyer@example.com".to_string()),
            }),
        }
    }

    #[test]
    fn paid_session_yields_a_record_plan() {
        let plan = reconciliation_plan(&paid_session()).expect("paid session should be recorded");
        assert_eq!(plan.transaction_id, "pi_456");
        assert_eq!(plan.order_id, "01J0ABCDEF");
        assert_eq!(plan.amount, 4200);
        assert_eq!(plan.email, "buyer@example.com");
    }

    #[test]
    fn unpaid_session_is_not_recorded() {
        let mut session = paid_session();
        session.payment_status = "unpaid".to_string();
        assert!(reconciliation_plan(&session).is_none());
    }

    #[test]
    fn session_without_transaction_id_is_not_recorded() {
        let mut session = paid_session();
        session.payment_intent = None;
        assert!(reconciliation_plan(&session).is_none());
    }

    #[test]
    fn session_without_order_reference_is_not_recorded() {
        let mut session = paid_session();
        session.metadata.clear();
        assert!(reconciliation_plan(&session).is_none());
    }
}

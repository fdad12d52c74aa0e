//! Glue between the order flow in the engine and the Paystack gateway.
//!
//! The engine owns the order and payment state, and knows nothing about Paystack. [`PaymentFlowApi`] calls the
//! gateway and reports the results back to the engine. The gateway can tell us about a payment in two ways: the
//! shopper's browser returns and we ask Paystack to verify the transaction, or Paystack calls our webhook. Both paths
//! end in [`OrderFlowApi::confirm_payment`], which guarantees that an order is only marked as paid once.
use std::fmt::Display;

use log::*;
use paystack_tools::{InitializeRequest, InitializedTransaction, PaymentGateway, TransactionStatus, WebhookEvent};
use serde::{Deserialize, Serialize};
use shop_engine::{
    db_types::{FullOrder, Order, OrderStatusType, PaymentStatus},
    order_objects::CheckoutRequest,
    traits::{CheckoutError, OrderFlowDatabase},
    OrderFlowApi,
};

use crate::errors::ServerError;

/// The response to `POST /checkout`.
///
/// The order is kept even if the gateway could not be reached. In that case `payment` is `None`, `message` carries the
/// reason, and the shopper can retry with `POST /orders/{id}/payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order: FullOrder,
    pub payment: Option<InitializedTransaction>,
    pub message: String,
}

/// The payment state of an order after a verification round trip with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentState {
    pub order_id: i64,
    pub reference: String,
    pub payment_status: PaymentStatus,
    pub gateway_status: TransactionStatus,
    /// True only for the call that moved the order to `Completed`.
    pub newly_confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Confirmed(i64),
    AlreadyConfirmed(String),
    Ignored(String),
    Rejected(String),
}

impl Display for WebhookOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed(id) => write!(f, "Payment for order #{id} confirmed"),
            Self::AlreadyConfirmed(reference) => write!(f, "Payment {reference} was already confirmed"),
            Self::Ignored(reason) => write!(f, "Event ignored. {reason}"),
            Self::Rejected(reason) => write!(f, "Event could not be processed. {reason}"),
        }
    }
}

pub struct PaymentFlowApi<B, G> {
    orders: OrderFlowApi<B>,
    gateway: G,
    currency: String,
    callback_url: Option<String>,
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(orders: OrderFlowApi<B>, gateway: G, currency: &str, callback_url: Option<String>) -> Self {
        Self { orders, gateway, currency: currency.to_uppercase(), callback_url }
    }

    pub fn orders(&self) -> &OrderFlowApi<B> {
        &self.orders
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    /// Places the order and opens a payment transaction for it.
    pub async fn checkout(
        &self,
        request: CheckoutRequest,
        callback_url: Option<String>,
    ) -> Result<CheckoutResult, ServerError> {
        let mut order = self.orders.checkout(request).await?;
        match self.start_transaction(&order.order, callback_url).await {
            Ok((updated, payment)) => {
                order.order = updated;
                let message = "Order placed. Complete your payment at the authorization URL.".to_string();
                Ok(CheckoutResult { order, payment: Some(payment), message })
            },
            Err(e) => {
                warn!("💳️ Order #{} was placed, but the payment could not be initialized. {e}", order.order.id);
                Ok(CheckoutResult { order, payment: None, message: e.to_string() })
            },
        }
    }

    /// Opens a new payment transaction for an existing, unpaid order. The new reference becomes the order's current
    /// one, but payments made against earlier references are still credited. Cancelled orders cannot be paid for.
    pub async fn initialize_payment(
        &self,
        order_id: i64,
        callback_url: Option<String>,
    ) -> Result<InitializedTransaction, ServerError> {
        let order = self
            .orders
            .order_by_id(order_id)
            .await?
            .ok_or_else(|| ServerError::NoRecordFound(format!("Order #{order_id} does not exist")))?;
        if order.order.is_paid() {
            return Err(CheckoutError::AlreadyPaid(order_id).into());
        }
        if order.order.status == OrderStatusType::Cancelled {
            return Err(CheckoutError::OrderCancelled(order_id).into());
        }
        let (_, payment) = self.start_transaction(&order.order, callback_url).await?;
        Ok(payment)
    }

    async fn start_transaction(
        &self,
        order: &Order,
        callback_url: Option<String>,
    ) -> Result<(Order, InitializedTransaction), ServerError> {
        let callback_url = callback_url.or_else(|| self.callback_url.clone());
        let request = InitializeRequest::new(&order.customer_email, order.total_price, &self.currency, order.id)
            .with_callback_url(callback_url);
        let payment = self.gateway.initialize_payment(request).await?;
        debug!("💳️ Paystack transaction {} opened for order #{}", payment.reference, order.id);
        let updated = self.orders.record_payment_reference(order.id, &payment.reference, &payment.access_code).await?;
        Ok((updated, payment))
    }

    /// Asks the gateway for the state of the transaction and brings the order in line with it.
    pub async fn verify_payment(&self, reference: &str) -> Result<PaymentState, ServerError> {
        // Unknown references never reach the gateway
        let order = self
            .orders
            .order_by_reference(reference)
            .await?
            .ok_or_else(|| CheckoutError::PaymentReferenceNotFound(reference.to_string()))?;
        let tx = self.gateway.verify_payment(reference).await?;
        debug!("💳️ Paystack reports transaction {reference} as {}", tx.status);
        let mut newly_confirmed = false;
        if tx.status == TransactionStatus::Success {
            self.check_currency(tx.currency.as_deref())?;
            newly_confirmed = self.orders.confirm_payment(reference, tx.amount).await?.is_some();
        } else if tx.status.is_final_failure() {
            self.orders.fail_payment(reference).await?;
        }
        let payment_status = self
            .orders
            .order_by_reference(reference)
            .await?
            .map(|o| o.payment_status)
            .unwrap_or(order.payment_status);
        Ok(PaymentState {
            order_id: order.id,
            reference: reference.to_string(),
            payment_status,
            gateway_status: tx.status,
            newly_confirmed,
        })
    }

    /// Processes a webhook delivery whose signature has already been checked.
    ///
    /// This never fails. Paystack keeps retrying deliveries that are not acknowledged, and retrying will not fix a
    /// payload we cannot use, so problems are logged and reported in the outcome.
    pub async fn handle_webhook(&self, event: WebhookEvent) -> WebhookOutcome {
        if !event.is_charge_success() {
            debug!("💳️ Ignoring '{}' webhook event", event.event);
            return WebhookOutcome::Ignored(format!("'{}' events are not handled", event.event));
        }
        let tx = match event.transaction() {
            Ok(tx) => tx,
            Err(e) => {
                error!("💳️ A charge.success webhook carried an unreadable transaction. {e}");
                return WebhookOutcome::Rejected(e.to_string());
            },
        };
        if tx.status != TransactionStatus::Success {
            warn!("💳️ A charge.success webhook for {} reported the status '{}'", tx.reference, tx.status);
            return WebhookOutcome::Ignored(format!("Transaction status is {}", tx.status));
        }
        if let Err(e) = self.check_currency(tx.currency.as_deref()) {
            error!("💳️ Webhook for {} rejected. {e}", tx.reference);
            return WebhookOutcome::Rejected(e.to_string());
        }
        match self.orders.confirm_payment(&tx.reference, tx.amount).await {
            Ok(Some(order)) => {
                info!("💳️ Webhook confirmed payment {} for order #{}", tx.reference, order.id);
                WebhookOutcome::Confirmed(order.id)
            },
            Ok(None) => WebhookOutcome::AlreadyConfirmed(tx.reference),
            Err(e) => {
                error!("💳️ Could not confirm payment {} from the webhook. {e}", tx.reference);
                WebhookOutcome::Rejected(e.to_string())
            },
        }
    }

    fn check_currency(&self, currency: Option<&str>) -> Result<(), ServerError> {
        match currency {
            Some(c) if !c.eq_ignore_ascii_case(&self.currency) => Err(ServerError::Conflict(format!(
                "The payment was made in {c}, but the store charges in {}",
                self.currency
            ))),
            _ => Ok(()),
        }
    }
}

use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{CustomerDetails, FullOrder, Order, OrderStatusType, Pesewas, MAX_NAME_LENGTH, MAX_PHONE_LENGTH},
    events::{EventProducers, OrderCreatedEvent, OrderPaidEvent, OrderStatusChangedEvent},
    order_objects::{CheckoutRequest, HousekeepingResult},
    traits::{CartManagement, CheckoutError, OrderFlowDatabase},
};

/// `OrderFlowApi` is the primary API for handling the order and payment flows: checkout, and payment reconciliation
/// in response to payment gateway confirmations.
///
/// It knows nothing about any particular payment gateway. The integration layer talks to the gateway, and reports
/// back through [`Self::record_payment_reference`], [`Self::confirm_payment`] and [`Self::fail_payment`].
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase
{
    pub fn db(&self) -> &B {
        &self.db
    }

    /// Converts a cart into an order.
    ///
    /// The conversion is atomic. Item prices are copied from the products at this moment, so later catalog price
    /// changes never affect the order. The cart is deleted. On success, an `OrderCreated` event is published.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<FullOrder, CheckoutError> {
        let request = validate_checkout_request(request)?;
        let cart_id = request.cart_id.clone();
        let order = self.db.checkout(request).await?;
        info!(
            "🔄️📦️ Cart {cart_id} became order #{} for {} at branch {}",
            order.order.id, order.order.total_price, order.order.branch_id
        );
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    pub async fn order_by_id(&self, order_id: i64) -> Result<Option<FullOrder>, CheckoutError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, CheckoutError> {
        self.db.fetch_order_by_reference(reference).await
    }

    /// Stores the reference of a freshly initialized gateway transaction on the order. It becomes the order's current
    /// reference, and earlier references keep pointing at the order. Fails if the order has been paid for or cancelled.
    pub async fn record_payment_reference(
        &self,
        order_id: i64,
        reference: &str,
        access_code: &str,
    ) -> Result<Order, CheckoutError> {
        let order = self.db.set_payment_reference(order_id, reference, access_code).await?;
        debug!("🔄️💳️ Order #{order_id} is now awaiting payment {reference}");
        Ok(order)
    }

    /// Marks the payment with the given reference as completed.
    ///
    /// This is idempotent. The gateway typically tells us about a payment twice (the shopper's verify call and the
    /// webhook), and both may arrive at the same time. Exactly one call receives `Some(order)` and publishes the
    /// `OrderPaid` event. Every other call receives `None`.
    ///
    /// A full payment that arrives after housekeeping cancelled the order reopens it.
    pub async fn confirm_payment(&self, reference: &str, amount_paid: Pesewas) -> Result<Option<Order>, CheckoutError> {
        trace!("🔄️💳️ Confirming payment {reference} of {amount_paid}");
        let Some(order) = self.db.mark_payment_completed(reference, amount_paid).await? else {
            debug!("🔄️💳️ Payment {reference} had already been confirmed");
            return Ok(None);
        };
        info!("🔄️💳️ Order #{} has been paid ({reference})", order.id);
        if !self.producers.order_paid_producer.is_empty() {
            match self.db.fetch_order(order.id).await {
                Ok(Some(full_order)) => self.call_order_paid_hook(full_order).await,
                Ok(None) => error!("🔄️💳️ Order #{} vanished straight after being paid for", order.id),
                Err(e) => error!("🔄️💳️ Could not fetch order #{} for the order paid hook. {e}", order.id),
            }
        }
        Ok(Some(order))
    }

    async fn call_order_paid_hook(&self, order: FullOrder) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️💳️ Notifying order paid hook subscribers");
            emitter.publish_event(OrderPaidEvent::new(order.clone())).await;
        }
    }

    /// Marks a pending payment as failed. A completed payment is never downgraded. Returns true if the status changed.
    pub async fn fail_payment(&self, reference: &str) -> Result<bool, CheckoutError> {
        let updated = self.db.mark_payment_failed(reference).await?;
        match &updated {
            Some(order) => info!("🔄️💳️ Payment {reference} for order #{} failed", order.id),
            None => debug!("🔄️💳️ Payment {reference} is not pending. Ignoring the failure report"),
        }
        Ok(updated.is_some())
    }

    /// Cancels orders that have been waiting for payment for longer than `age`.
    pub async fn cancel_unpaid_orders(&self, age: Duration) -> Result<Vec<Order>, CheckoutError> {
        let cancelled = self.db.cancel_unpaid_orders(age).await?;
        for order in &cancelled {
            for emitter in &self.producers.status_changed_producer {
                let event = OrderStatusChangedEvent::new(OrderStatusType::Pending, order.clone());
                emitter.publish_event(event).await;
            }
        }
        Ok(cancelled)
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase + CartManagement
{
    /// Deletes abandoned carts and cancels stale unpaid orders.
    pub async fn housekeeping(
        &self,
        cart_age: Duration,
        order_age: Duration,
    ) -> Result<HousekeepingResult, CheckoutError> {
        let carts_purged = self
            .db
            .purge_abandoned_carts(cart_age)
            .await
            .map_err(|e| CheckoutError::DatabaseError(e.to_string()))?;
        let cancelled = self.cancel_unpaid_orders(order_age).await?;
        Ok(HousekeepingResult { carts_purged, orders_cancelled: cancelled.len() as u64 })
    }
}

fn check_field(field: &str, value: &str, max_len: usize) -> Result<(), CheckoutError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(CheckoutError::ValidationError(format!("{field} is required")));
    }
    if len > max_len {
        return Err(CheckoutError::ValidationError(format!("{field} is limited to {max_len} characters")));
    }
    Ok(())
}

fn validate_customer(customer: &CustomerDetails) -> Result<(), CheckoutError> {
    check_field("first_name", &customer.first_name, MAX_NAME_LENGTH)?;
    if customer.last_name.chars().count() > MAX_NAME_LENGTH {
        return Err(CheckoutError::ValidationError(format!("last_name is limited to {MAX_NAME_LENGTH} characters")));
    }
    check_field("phone", &customer.phone, MAX_PHONE_LENGTH)?;
    let email = customer.email.trim();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(CheckoutError::ValidationError(format!("'{email}' is not a valid email address"))),
    }
}

fn validate_checkout_request(mut request: CheckoutRequest) -> Result<CheckoutRequest, CheckoutError> {
    validate_customer(&request.customer)?;
    check_field("recipient_name", &request.recipient_name, MAX_NAME_LENGTH)?;
    check_field("recipient_number", &request.recipient_number, MAX_PHONE_LENGTH)?;
    if request.recipient_address.trim().is_empty() {
        return Err(CheckoutError::ValidationError("recipient_address is required".into()));
    }
    request.recipient_name = request.recipient_name.trim().to_string();
    request.recipient_number = request.recipient_number.trim().to_string();
    request.recipient_address = request.recipient_address.trim().to_string();
    request.customer.email = request.customer.email.trim().to_string();
    Ok(request)
}

//! Customer notifications.
//!
//! The engine publishes `OrderPaid` and `OrderStatusChanged` events. The handlers created here turn those into emails
//! and hand them to a [`Mailer`]. Each event is handled on its own task, so a slow or failing mail transport never
//! holds up the request that caused the event. Failures are logged and dropped.
use std::sync::Arc;

use futures::future::BoxFuture;
use log::*;
use shop_engine::events::{EventHandlers, EventHooks};

mod email;
mod mailer;

pub use email::{order_confirmation_email, status_update_email, EmailMessage};
pub use mailer::{LogMailer, MailError, Mailer};

pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub store_name: String,
    pub mail_from: String,
}

pub fn create_notification_handlers(mailer: Arc<dyn Mailer>, config: NotificationConfig) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let config = Arc::new(config);
    // --- On OrderPaid Handler ---
    let (paid_mailer, paid_config) = (Arc::clone(&mailer), Arc::clone(&config));
    hooks.on_order_paid(move |ev| {
        let message = order_confirmation_email(&paid_config.store_name, &paid_config.mail_from, &ev.order);
        deliver(Arc::clone(&paid_mailer), message)
    });
    // --- On OrderStatusChanged Handler ---
    hooks.on_status_changed(move |ev| {
        let new_status = ev.new_status();
        if !new_status.notifies_customer() {
            trace!("📧️ Order #{} moved to {new_status}. No email required.", ev.order.id);
            return no_op();
        }
        match status_update_email(&config.store_name, &config.mail_from, &ev.order) {
            Some(message) => deliver(Arc::clone(&mailer), message),
            None => no_op(),
        }
    });
    EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks)
}

fn deliver(mailer: Arc<dyn Mailer>, message: EmailMessage) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let subject = message.subject.clone();
        match mailer.send(message).await {
            Ok(()) => debug!("📧️ Sent '{subject}'"),
            Err(e) => error!("📧️ Could not send '{subject}'. {e}"),
        }
    })
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}

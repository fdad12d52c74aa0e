use chrono::Duration;
use log::*;
use shop_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

pub const HOUSEKEEPING_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Starts the housekeeping worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute, carts that have not been touched for `cart_age` are deleted, and orders that have been waiting for
/// payment for longer than `unpaid_order_age` are cancelled.
pub fn start_housekeeping_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    cart_age: Duration,
    unpaid_order_age: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(HOUSEKEEPING_INTERVAL);
        let api = OrderFlowApi::new(db, producers);
        info!(
            "🕰️ Housekeeping worker started. Carts expire after {} hrs, unpaid orders after {} hrs",
            cart_age.num_hours(),
            unpaid_order_age.num_hours()
        );
        loop {
            timer.tick().await;
            trace!("🕰️ Running housekeeping job");
            match api.housekeeping(cart_age, unpaid_order_age).await {
                Ok(result) if result.carts_purged == 0 && result.orders_cancelled == 0 => {
                    trace!("🕰️ Nothing to clean up");
                },
                Ok(result) => {
                    info!(
                        "🕰️ Housekeeping deleted {} abandoned carts and cancelled {} unpaid orders",
                        result.carts_purged, result.orders_cancelled
                    );
                },
                Err(e) => {
                    error!("🕰️ Error running housekeeping job: {e}");
                },
            }
        }
    })
}

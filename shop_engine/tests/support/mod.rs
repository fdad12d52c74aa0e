#![allow(dead_code)]
use log::*;
use shop_engine::{
    db_types::{Branch, CustomerDetails, FullOrder, NewProduct, Pesewas, Product},
    order_objects::CheckoutRequest,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{AdminManagement, CartManagement, CatalogManagement, OrderFlowDatabase},
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to drop database {url}: {e}");
    }
}

pub struct Seed {
    pub accra: Branch,
    pub kumasi: Branch,
    pub closed: Branch,
    /// Kente cloth (GH₵120.00), beads (GH₵15.50) and a discontinued drum.
    pub products: Vec<Product>,
}

pub async fn seed(db: &SqliteDatabase) -> Seed {
    let accra = db.insert_branch("Accra", true).await.expect("Failed to insert branch");
    let kumasi = db.insert_branch("Kumasi", true).await.expect("Failed to insert branch");
    let closed = db.insert_branch("Takoradi", false).await.expect("Failed to insert branch");
    let textiles = db.insert_collection("Textiles").await.expect("Failed to insert collection");
    let crafts = db.insert_collection("Crafts").await.expect("Failed to insert collection");
    let kente = NewProduct::new("Kente cloth", Pesewas::from(12_000), textiles.id).with_description("Hand woven");
    let beads = NewProduct::new("Glass beads", Pesewas::from(1_550), crafts.id).with_description("Krobo beads");
    let mut drum = NewProduct::new("Talking drum", Pesewas::from(45_000), crafts.id);
    drum.is_available = false;
    let mut products = Vec::new();
    for p in [kente, beads, drum] {
        products.push(db.insert_product(p).await.expect("Failed to insert product"));
    }
    Seed { accra, kumasi, closed, products }
}

pub fn customer(email: &str) -> CustomerDetails {
    CustomerDetails {
        first_name: "Ama".into(),
        last_name: "Mensah".into(),
        email: email.into(),
        phone: "0241234567".into(),
        birth_date: None,
    }
}

pub fn checkout_request(cart_id: &str, branch_id: i64, email: &str) -> CheckoutRequest {
    CheckoutRequest {
        cart_id: cart_id.to_string(),
        branch_id,
        customer: customer(email),
        recipient_name: "Kofi Mensah".into(),
        recipient_number: "0209876543".into(),
        recipient_address: "12 Ring Road, Accra".into(),
    }
}

/// Fills a new cart with `(product_id, quantity)` pairs and checks it out.
pub async fn place_order(db: &SqliteDatabase, branch_id: i64, lines: &[(i64, i64)]) -> FullOrder {
    let cart = db.create_cart().await.expect("Failed to create cart");
    for (product_id, quantity) in lines {
        db.add_cart_item(&cart.id, *product_id, *quantity).await.expect("Failed to add cart item");
    }
    db.checkout(checkout_request(&cart.id, branch_id, "ama@example.com")).await.expect("Checkout failed")
}

/// Places an order and attaches a payment reference to it.
pub async fn place_order_awaiting_payment(db: &SqliteDatabase, branch_id: i64, reference: &str) -> FullOrder {
    let order = place_order(db, branch_id, &[(1, 2)]).await;
    db.set_payment_reference(order.order.id, reference, "access_code").await.expect("Failed to set reference");
    order
}

/// Places an order and completes its payment.
pub async fn place_paid_order(db: &SqliteDatabase, branch_id: i64, reference: &str) -> FullOrder {
    let order = place_order_awaiting_payment(db, branch_id, reference).await;
    db.mark_payment_completed(reference, order.order.total_price)
        .await
        .expect("Failed to complete payment")
        .expect("Payment was already completed");
    order
}

pub async fn backdate_orders(db: &SqliteDatabase, hours: i64) {
    sqlx::query("UPDATE orders SET created_at = datetime('now', $1)")
        .bind(format!("-{hours} hours"))
        .execute(db.pool())
        .await
        .expect("Failed to backdate orders");
}

pub async fn backdate_carts(db: &SqliteDatabase, hours: i64) {
    sqlx::query("UPDATE carts SET updated_at = datetime('now', $1)")
        .bind(format!("-{hours} hours"))
        .execute(db.pool())
        .await
        .expect("Failed to backdate carts");
}


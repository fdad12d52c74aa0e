use actix_web::{
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use chrono::{Duration, Utc};
use log::*;
use paystack_tools::{calculate_signature, PAYSTACK_SIGNATURE_HEADER};
use serde::Serialize;
use shop_common::Secret;
use shop_engine::{
    db_types::{AdminUser, Branch, CustomerDetails, FullOrder, NewAdminUser, NewProduct, Pesewas, Product, Role},
    events::EventProducers,
    order_objects::CheckoutRequest,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{AdminManagement, AuthManagement, CartManagement, CatalogManagement, OrderFlowDatabase},
    AdminApi,
    AuthApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use super::mocks::MockGateway;
use crate::{
    auth::{hash_password, JwtClaims, TokenIssuer},
    config::AuthConfig,
    integrations::paystack::PaymentFlowApi,
    server::configure_routes,
};

/// The Paystack secret used to sign webhooks in tests. DO NOT re-use it anywhere.
pub const WEBHOOK_SECRET: &str = "sk_test_0f9c2d6e8b7a4c1d3e5f";

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::from("925842e11914fdd0c9a2ab8a38dac9de57b3e392372cde1661b1a84b1d8e430e"),
        jwt_expiry: Duration::hours(1),
    }
}

pub fn issue_token(claims: JwtClaims) -> String {
    TokenIssuer::new(&get_auth_config()).sign(&claims).expect("Failed to sign token")
}

pub fn staff_claims(branch_id: Option<i64>) -> JwtClaims {
    JwtClaims {
        sub: 2,
        username: "kwame".into(),
        roles: vec![Role::Staff],
        branch_id,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    }
}

pub fn superuser_claims() -> JwtClaims {
    JwtClaims {
        sub: 1,
        username: "admin".into(),
        roles: vec![Role::Staff, Role::Superuser],
        branch_id: None,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    }
}

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
    /// GH₵120.00
    pub kente: Product,
    /// GH₵15.50
    pub beads: Product,
    /// Unavailable
    pub drum: Product,
}

pub async fn seed(db: &SqliteDatabase) -> Seed {
    let accra = db.insert_branch("Accra", true).await.expect("Failed to insert branch");
    let kumasi = db.insert_branch("Kumasi", true).await.expect("Failed to insert branch");
    let closed = db.insert_branch("Takoradi", false).await.expect("Failed to insert branch");
    let textiles = db.insert_collection("Textiles").await.expect("Failed to insert collection");
    let crafts = db.insert_collection("Crafts").await.expect("Failed to insert collection");
    let kente = NewProduct::new("Kente cloth", Pesewas::from(12_000), textiles.id).with_description("Hand woven");
    let kente = db.insert_product(kente).await.expect("Failed to insert product");
    let beads = NewProduct::new("Glass beads", Pesewas::from(1_550), crafts.id).with_description("Krobo beads");
    let beads = db.insert_product(beads).await.expect("Failed to insert product");
    let mut drum = NewProduct::new("Talking drum", Pesewas::from(45_000), crafts.id);
    drum.is_available = false;
    let drum = db.insert_product(drum).await.expect("Failed to insert product");
    Seed { accra, kumasi, closed, kente, beads, drum }
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

pub fn checkout_request(cart_id: &str, branch_id: i64) -> CheckoutRequest {
    CheckoutRequest {
        cart_id: cart_id.to_string(),
        branch_id,
        customer: customer("ama@example.com"),
        recipient_name: "Kofi Mensah".into(),
        recipient_number: "0209876543".into(),
        recipient_address: "12 Ring Road, Accra".into(),
    }
}

/// Fills a new cart with `(product_id, quantity)` pairs and returns a checkout request for it.
pub async fn fill_cart(db: &SqliteDatabase, branch_id: i64, lines: &[(i64, i64)]) -> CheckoutRequest {
    let cart = db.create_cart().await.expect("Failed to create cart");
    for (product_id, quantity) in lines {
        db.add_cart_item(&cart.id, *product_id, *quantity).await.expect("Failed to add cart item");
    }
    checkout_request(&cart.id, branch_id)
}

/// Places an order and pays for it in full, bypassing the gateway.
pub async fn place_paid_order(db: &SqliteDatabase, branch_id: i64, reference: &str) -> FullOrder {
    let order = db.checkout(fill_cart(db, branch_id, &[(1, 1)]).await).await.expect("Checkout failed");
    db.set_payment_reference(order.order.id, reference, "access_code").await.expect("Failed to set reference");
    db.mark_payment_completed(reference, order.order.total_price)
        .await
        .expect("Failed to complete payment")
        .expect("Payment was already completed");
    order
}

pub async fn create_user(
    db: &SqliteDatabase,
    username: &str,
    password: &str,
    is_superuser: bool,
    branch_id: Option<i64>,
) -> AdminUser {
    let password_hash = hash_password(password).expect("Failed to hash password");
    let user = NewAdminUser {
        username: username.into(),
        email: format!("{username}@example.com"),
        password_hash,
        is_superuser,
        ..Default::default()
    };
    let user = db.insert_user(user).await.expect("Failed to insert user");
    match branch_id {
        Some(branch_id) => db.assign_branch(user.id, branch_id).await.expect("Failed to assign branch"),
        None => user,
    }
}

/// A freshly seeded database, and the means to send requests to a server instance running against it.
pub struct TestServer {
    pub db: SqliteDatabase,
    pub seed: Seed,
    payments: web::Data<PaymentFlowApi<SqliteDatabase, MockGateway>>,
}

impl TestServer {
    pub async fn new(gateway: MockGateway) -> Self {
        let db = setup().await;
        let seed = seed(&db).await;
        let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
        let payments = PaymentFlowApi::new(orders, gateway, "GHS", Some("https://shop.example.com/paid".into()));
        Self { db, seed, payments: web::Data::new(payments) }
    }

    pub async fn finish(self) {
        tear_down(self.db).await;
    }

    /// Sends the request, and returns the status code and body of the response. Requests rejected by middleware
    /// report the error message as the body.
    pub async fn call(&self, req: TestRequest) -> (StatusCode, String) {
        let issuer = TokenIssuer::new(&get_auth_config());
        let hmac_key = Secret::from(WEBHOOK_SECRET);
        let app = App::new()
            .app_data(web::Data::new(CatalogApi::new(self.db.clone())))
            .app_data(web::Data::new(CartApi::new(self.db.clone())))
            .app_data(web::Data::new(AdminApi::new(self.db.clone(), EventProducers::default())))
            .app_data(web::Data::new(AuthApi::new(self.db.clone())))
            .app_data(self.payments.clone())
            .app_data(web::Data::new(issuer.clone()))
            .configure(|cfg| configure_routes::<MockGateway>(cfg, &issuer, &hmac_key, true));
        let service = test::init_service(app).await;
        debug!("Making request");
        match test::try_call_service(&service, req.to_request()).await {
            Ok(res) => {
                let status = res.status();
                let body = test::read_body(res).await;
                (status, String::from_utf8_lossy(&body).into_owned())
            },
            Err(e) => (e.as_response_error().status_code(), e.to_string()),
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, String) {
        self.call(authorize(TestRequest::get().uri(path), token)).await
    }

    pub async fn send<T: Serialize>(&self, req: TestRequest, token: Option<&str>, body: &T) -> (StatusCode, String) {
        self.call(authorize(req, token).set_json(body)).await
    }

    /// Posts `payload` to the webhook endpoint, signed with [`WEBHOOK_SECRET`].
    pub async fn signed_webhook(&self, payload: &str) -> (StatusCode, String) {
        let signature = calculate_signature(&Secret::from(WEBHOOK_SECRET), payload.as_bytes());
        let req = TestRequest::post()
            .uri("/paystack/webhook")
            .insert_header(ContentType::json())
            .insert_header((PAYSTACK_SIGNATURE_HEADER, signature))
            .set_payload(payload.to_string());
        self.call(req).await
    }
}

pub fn authorize(req: TestRequest, token: Option<&str>) -> TestRequest {
    match token {
        Some(token) => req.insert_header(("Authorization", format!("Bearer {token}"))),
        None => req,
    }
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("Response was not valid JSON")
}

use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use paystack_tools::{PaymentGateway, PaystackApi};
use shop_common::Secret;
use shop_engine::{
    db_types::NewAdminUser,
    events::EventProducers,
    AdminApi,
    AuthApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::{hash_password, TokenIssuer},
    config::{BootstrapAdmin, ServerConfig},
    errors::ServerError,
    housekeeping_worker::start_housekeeping_worker,
    integrations::paystack::PaymentFlowApi,
    middleware::{HmacMiddlewareFactory, JwtMiddlewareFactory},
    notifications::{create_notification_handlers, LogMailer, Mailer, NotificationConfig},
    routes::{
        health,
        AddCartItemRoute,
        AddProductImageRoute,
        AssignBranchRoute,
        BranchesRoute,
        CartRoute,
        CheckTokenRoute,
        CheckoutRoute,
        CollectionByIdRoute,
        CollectionsRoute,
        CreateBranchRoute,
        CreateCartRoute,
        CreateCollectionRoute,
        CreateProductRoute,
        CreateUserRoute,
        CustomersRoute,
        DeleteCartRoute,
        DeleteOrderRoute,
        InitializePaymentRoute,
        LoginRoute,
        OrderByIdRoute,
        OrdersRoute,
        PaystackWebhookRoute,
        ProductByIdRoute,
        ProductImagesRoute,
        ProductsRoute,
        RemoveCartItemRoute,
        UpdateBranchRoute,
        UpdateCartItemRoute,
        UpdateOrderRoute,
        UpdateOrderStatusRoute,
        UpdateProductRoute,
        VerifyPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_superuser(&db, admin).await?;
    }
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
    let notifications =
        NotificationConfig { store_name: config.store_name.clone(), mail_from: config.mail_from.clone() };
    let handlers = create_notification_handlers(mailer, notifications);
    let producers = handlers.producers();
    handlers.start_handlers();
    // The worker runs for the lifetime of the process
    let _worker = start_housekeeping_worker(
        db.clone(),
        producers.clone(),
        config.abandoned_cart_timeout,
        config.unpaid_order_timeout,
    );
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Creates the configured superuser if no user with that name exists yet. Existing users are left alone.
pub async fn bootstrap_superuser(db: &SqliteDatabase, admin: &BootstrapAdmin) -> Result<(), ServerError> {
    let api = AuthApi::new(db.clone());
    if api.user_by_username(&admin.username).await?.is_some() {
        debug!("🔐️ Bootstrap user {} already exists", admin.username);
        return Ok(());
    }
    let password_hash = hash_password(admin.password.reveal())?;
    let user = NewAdminUser {
        username: admin.username.clone(),
        email: admin.email.clone(),
        password_hash,
        is_superuser: true,
        ..Default::default()
    };
    let user = api.create_user(user).await?;
    warn!(
        "🔐️ Created superuser {}. Remove the SHOP_BOOTSTRAP_ADMIN_* variables once you have logged in.",
        user.username
    );
    Ok(())
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let gateway = PaystackApi::new(config.paystack.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if !config.paystack.hmac_checks {
        warn!("🚨️ Paystack webhook signature checks are DISABLED. Never run like this in production.");
    } else if config.paystack.secret_key.is_empty() {
        warn!("🚨️ No Paystack secret key is configured. Every webhook delivery will be rejected.");
    }
    let issuer = TokenIssuer::new(&config.auth);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let payments_api = PaymentFlowApi::new(
            orders_api,
            gateway.clone(),
            &config.paystack.currency,
            config.paystack.callback_url.clone(),
        );
        let hmac_key = config.paystack.secret_key.clone();
        let hmac_checks = config.paystack.hmac_checks;
        let issuer = issuer.clone();
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("shop::access_log"))
            .app_data(web::Data::new(CatalogApi::new(db.clone())))
            .app_data(web::Data::new(CartApi::new(db.clone())))
            .app_data(web::Data::new(AdminApi::new(db.clone(), producers.clone())))
            .app_data(web::Data::new(AuthApi::new(db.clone())))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(issuer.clone()))
            .configure(|cfg| configure_routes::<PaystackApi>(cfg, &issuer, &hmac_key, hmac_checks))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route. The payment gateway is a type parameter so that the endpoint tests can use a mock.
pub fn configure_routes<G>(
    cfg: &mut web::ServiceConfig,
    issuer: &TokenIssuer,
    hmac_key: &Secret<String>,
    hmac_checks: bool,
) where
    G: PaymentGateway + 'static,
{
    // Routes that require authentication
    let api_scope = web::scope("/api")
        .wrap(JwtMiddlewareFactory::new(issuer.clone()))
        .service(OrdersRoute::<SqliteDatabase>::new())
        .service(OrderByIdRoute::<SqliteDatabase>::new())
        .service(UpdateOrderRoute::<SqliteDatabase>::new())
        .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
        .service(DeleteOrderRoute::<SqliteDatabase>::new())
        .service(BranchesRoute::<SqliteDatabase>::new())
        .service(CreateBranchRoute::<SqliteDatabase>::new())
        .service(UpdateBranchRoute::<SqliteDatabase>::new())
        .service(CreateUserRoute::<SqliteDatabase>::new())
        .service(AssignBranchRoute::<SqliteDatabase>::new())
        .service(CustomersRoute::<SqliteDatabase>::new())
        .service(CreateCollectionRoute::<SqliteDatabase>::new())
        .service(CreateProductRoute::<SqliteDatabase>::new())
        .service(UpdateProductRoute::<SqliteDatabase>::new())
        .service(AddProductImageRoute::<SqliteDatabase>::new())
        .service(ProductImagesRoute::<SqliteDatabase>::new())
        .service(CheckTokenRoute::new());
    // Paystack webhooks must carry a valid signature
    let paystack_scope = web::scope("/paystack")
        .wrap(HmacMiddlewareFactory::new(hmac_key.clone(), hmac_checks))
        .service(PaystackWebhookRoute::<SqliteDatabase, G>::new());
    cfg.service(api_scope)
        .service(paystack_scope)
        .service(health)
        .service(LoginRoute::<SqliteDatabase>::new())
        .service(ProductsRoute::<SqliteDatabase>::new())
        .service(ProductByIdRoute::<SqliteDatabase>::new())
        .service(CollectionsRoute::<SqliteDatabase>::new())
        .service(CollectionByIdRoute::<SqliteDatabase>::new())
        .service(CreateCartRoute::<SqliteDatabase>::new())
        .service(CartRoute::<SqliteDatabase>::new())
        .service(DeleteCartRoute::<SqliteDatabase>::new())
        .service(AddCartItemRoute::<SqliteDatabase>::new())
        .service(UpdateCartItemRoute::<SqliteDatabase>::new())
        .service(RemoveCartItemRoute::<SqliteDatabase>::new())
        .service(CheckoutRoute::<SqliteDatabase, G>::new())
        .service(InitializePaymentRoute::<SqliteDatabase, G>::new())
        .service(VerifyPaymentRoute::<SqliteDatabase, G>::new());
}

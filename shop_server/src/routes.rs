//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! The storefront routes (catalog, carts, checkout and payments) are public. Everything under `/api` is for staff and
//! requires a bearer token (see [`crate::auth`]); the ACL on each route is declared in its `route!` definition.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! gateway calls) must be expressed as futures or asynchronous functions.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use paystack_tools::{PaymentGateway, WebhookEvent};
use shop_engine::{
    db_types::{NewAdminUser, NewProduct, NewProductImage, ProductUpdate, Role},
    order_objects::{OrderUpdate, Pagination},
    traits::{AdminManagement, AuthManagement, CartManagement, CatalogManagement, OrderFlowDatabase},
    AdminApi,
    AuthApi,
    CartApi,
    CatalogApi,
};

use crate::{
    auth::{hash_password, verify_password, JwtClaims, TokenIssuer},
    data_objects::{
        AssignBranchParams,
        BranchQueryParams,
        BranchUpdateParams,
        CartItemParams,
        CheckoutParams,
        CustomerQueryParams,
        InitializePaymentParams,
        JsonResponse,
        LoginRequest,
        LoginResponse,
        NewBranchParams,
        NewCollectionParams,
        NewUserRequest,
        OrderQueryParams,
        ProductQueryParams,
        QuantityParams,
        StatusUpdateParams,
    },
    errors::{AuthError, ServerError},
    integrations::paystack::PaymentFlowApi,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:ty),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(login => Post "/auth/login" impl AuthManagement);
/// Staff log in with their username and password, and receive a bearer token for the `/api` routes.
///
/// Unknown users and wrong passwords produce the same response.
pub async fn login<A: AuthManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<A>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { username, password } = body.into_inner();
    trace!("💻️ Received login request for {username}");
    let user = api.user_by_username(username.trim()).await?.ok_or_else(|| {
        debug!("💻️ Login attempt for unknown user {username}");
        AuthError::InvalidCredentials
    })?;
    if !verify_password(&user.password_hash, &password)? {
        info!("💻️ Failed login attempt for {username}");
        return Err(AuthError::InvalidCredentials.into());
    }
    let access_token = signer.issue_token(&user)?;
    debug!("💻️ Issued access token for {username}");
    Ok(HttpResponse::Ok().json(LoginResponse::bearer(access_token, user)))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(products => Get "/products" impl CatalogManagement);
/// Lists products. Supports `collection`, `min_price`, `max_price`, `is_available`, `search`, `ordering` (`price` or
/// `-price`), `page` and `page_size` query parameters.
pub async fn products<B: CatalogManagement>(
    query: web::Query<ProductQueryParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, pagination) = query.into_inner().into_query()?;
    debug!("💻️ GET products. {filter:?}");
    let page = api.list_products(filter, pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(product_by_id => Get "/products/{id}" impl CatalogManagement);
pub async fn product_by_id<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET product {id}");
    let product = api.product_by_id(id).await?.ok_or_else(|| no_record("Product", id))?;
    Ok(HttpResponse::Ok().json(product))
}

route!(collections => Get "/collections" impl CatalogManagement);
pub async fn collections<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET collections");
    let collections = api.list_collections().await?;
    Ok(HttpResponse::Ok().json(collections))
}

route!(collection_by_id => Get "/collections/{id}" impl CatalogManagement);
pub async fn collection_by_id<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET collection {id}");
    let collection = api.collection_by_id(id).await?.ok_or_else(|| no_record("Collection", id))?;
    Ok(HttpResponse::Ok().json(collection))
}

//----------------------------------------------   Carts  ----------------------------------------------------
route!(create_cart => Post "/carts" impl CartManagement);
pub async fn create_cart<B: CartManagement>(api: web::Data<CartApi<B>>) -> Result<HttpResponse, ServerError> {
    let cart = api.create_cart().await?;
    debug!("💻️ Created cart {}", cart.id);
    Ok(HttpResponse::Created().json(cart))
}

route!(cart => Get "/carts/{id}" impl CartManagement);
/// Fetches the cart contents. Prices are the current catalog prices; they are only fixed at checkout.
pub async fn cart<B: CartManagement>(
    path: web::Path<String>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cart_id = path.into_inner();
    debug!("💻️ GET cart {cart_id}");
    let cart = api.cart(&cart_id).await?.ok_or_else(|| no_record("Cart", &cart_id))?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(delete_cart => Delete "/carts/{id}" impl CartManagement);
pub async fn delete_cart<B: CartManagement>(
    path: web::Path<String>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cart_id = path.into_inner();
    debug!("💻️ DELETE cart {cart_id}");
    api.delete_cart(&cart_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

route!(add_cart_item => Post "/carts/{id}/items" impl CartManagement);
/// Adds a product to the cart. If the product is already in the cart, the quantities are added together.
pub async fn add_cart_item<B: CartManagement>(
    path: web::Path<String>,
    body: web::Json<CartItemParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cart_id = path.into_inner();
    let CartItemParams { product_id, quantity } = body.into_inner();
    debug!("💻️ POST {quantity} x product {product_id} to cart {cart_id}");
    let item = api.add_item(&cart_id, product_id, quantity).await?;
    Ok(HttpResponse::Created().json(item))
}

route!(update_cart_item => Patch "/carts/{id}/items/{item_id}" impl CartManagement);
pub async fn update_cart_item<B: CartManagement>(
    path: web::Path<(String, i64)>,
    body: web::Json<QuantityParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (cart_id, item_id) = path.into_inner();
    let quantity = body.into_inner().quantity;
    debug!("💻️ PATCH cart {cart_id} item {item_id} to quantity {quantity}");
    let item = api.update_item(&cart_id, item_id, quantity).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(remove_cart_item => Delete "/carts/{id}/items/{item_id}" impl CartManagement);
pub async fn remove_cart_item<B: CartManagement>(
    path: web::Path<(String, i64)>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (cart_id, item_id) = path.into_inner();
    debug!("💻️ DELETE cart {cart_id} item {item_id}");
    api.remove_item(&cart_id, item_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

//----------------------------------------------   Checkout & Payments  ----------------------------------------------
route!(checkout => Post "/checkout" impl OrderFlowDatabase, PaymentGateway);
/// Converts a cart into an order and opens a Paystack transaction for it.
///
/// The order is created even if Paystack cannot be reached. The response then has `payment: null` and the shopper
/// can retry with `POST /orders/{id}/payment`.
pub async fn checkout<B: OrderFlowDatabase, G: PaymentGateway>(
    body: web::Json<CheckoutParams>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let CheckoutParams { request, callback_url } = body.into_inner();
    debug!("💻️ POST checkout for cart {}", request.cart_id);
    let result = api.checkout(request, callback_url).await?;
    Ok(HttpResponse::Created().json(result))
}

route!(initialize_payment => Post "/orders/{id}/payment" impl OrderFlowDatabase, PaymentGateway);
/// Opens a new Paystack transaction for an unpaid order that has not been cancelled. Earlier references stay valid.
pub async fn initialize_payment<B: OrderFlowDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    body: Option<web::Json<InitializePaymentParams>>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let callback_url = body.and_then(|b| b.into_inner().callback_url);
    debug!("💻️ POST payment for order #{order_id}");
    let payment = api.initialize_payment(order_id, callback_url).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(verify_payment => Get "/payments/verify/{reference}" impl OrderFlowDatabase, PaymentGateway);
pub async fn verify_payment<B: OrderFlowDatabase, G: PaymentGateway>(
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let reference = path.into_inner();
    debug!("💻️ GET verify payment {reference}");
    let state = api.verify_payment(&reference).await?;
    Ok(HttpResponse::Ok().json(state))
}

route!(paystack_webhook => Post "/webhook" impl OrderFlowDatabase, PaymentGateway);
/// Receives Paystack event notifications.
///
/// The signature has been checked by the HMAC middleware before this handler runs. From here on, every delivery is
/// acknowledged with a 200 so that Paystack stops retrying, even if the event could not be used.
pub async fn paystack_webhook<B: OrderFlowDatabase, G: PaymentGateway>(
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> HttpResponse {
    trace!("💻️ Received Paystack webhook");
    let event = match serde_json::from_slice::<WebhookEvent>(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("💻️ Could not deserialize Paystack webhook payload. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Could not deserialize the event payload"));
        },
    };
    let outcome = api.handle_webhook(event).await;
    debug!("💻️ Paystack webhook processed. {outcome}");
    HttpResponse::Ok().json(JsonResponse::success(outcome))
}

//----------------------------------------------   Admin: Orders  ----------------------------------------------------
route!(orders => Get "/orders" impl AdminManagement where requires [Role::Staff]);
/// Lists the orders the caller may see, newest first. Unless `payment_status` is given, only paid orders are listed.
pub async fn orders<B: AdminManagement>(
    claims: JwtClaims,
    query: web::Query<OrderQueryParams>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, pagination) = query.into_inner().into_query();
    debug!("💻️ GET orders for {}. {filter}", claims.username);
    let page = api.search_orders(claims.scope(), filter, pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(order_by_id => Get "/orders/{id}" impl AdminManagement where requires [Role::Staff]);
/// Orders on other branches are reported as not found.
pub async fn order_by_id<B: AdminManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for {}", claims.username);
    let order = api.order_by_id(claims.scope(), order_id).await?.ok_or_else(|| no_record("Order", order_id))?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order => Patch "/orders/{id}" impl AdminManagement where requires [Role::Staff]);
pub async fn update_order<B: AdminManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<OrderUpdate>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ PATCH order #{order_id} by {}", claims.username);
    let order = api.update_order(claims.scope(), order_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Patch "/orders/{id}/status" impl AdminManagement where requires [Role::Staff]);
pub async fn update_order_status<B: AdminManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateParams>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    info!("💻️ {} is moving order #{order_id} to {status}", claims.username);
    let order = api.modify_status(claims.scope(), order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(delete_order => Delete "/orders/{id}" impl AdminManagement where requires [Role::Superuser]);
pub async fn delete_order<B: AdminManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ {} is deleting order #{order_id}", claims.username);
    api.delete_order(claims.scope(), order_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order #{order_id} deleted"))))
}

//----------------------------------------------   Admin: Branches  --------------------------------------------------
route!(branches => Get "/branches" impl AdminManagement where requires [Role::Staff]);
pub async fn branches<B: AdminManagement>(
    query: web::Query<BranchQueryParams>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET branches");
    let branches = api.list_branches(query.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(branches))
}

route!(create_branch => Post "/branches" impl AdminManagement where requires [Role::Superuser]);
pub async fn create_branch<B: AdminManagement>(
    body: web::Json<NewBranchParams>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let NewBranchParams { name, is_active } = body.into_inner();
    debug!("💻️ POST branch {name}");
    let branch = api.create_branch(&name, is_active).await?;
    Ok(HttpResponse::Created().json(branch))
}

route!(update_branch => Patch "/branches/{id}" impl AdminManagement where requires [Role::Superuser]);
pub async fn update_branch<B: AdminManagement>(
    path: web::Path<i64>,
    body: web::Json<BranchUpdateParams>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let branch_id = path.into_inner();
    debug!("💻️ PATCH branch {branch_id}");
    let branch = api.set_branch_active(branch_id, body.into_inner().is_active).await?;
    Ok(HttpResponse::Ok().json(branch))
}

//----------------------------------------------   Admin: Staff & Customers  -----------------------------------------
route!(create_user => Post "/users" impl AuthManagement where requires [Role::Superuser]);
/// Creates a staff (or superuser) account. If `branch_id` is given, the user is linked to that branch.
pub async fn create_user<A: AuthManagement>(
    body: web::Json<NewUserRequest>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST user {}", req.username);
    let password_hash = hash_password(&req.password)?;
    let new_user = NewAdminUser {
        username: req.username,
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        password_hash,
        is_superuser: req.is_superuser,
    };
    let mut user = api.create_user(new_user).await?;
    if let Some(branch_id) = req.branch_id {
        user = api.assign_branch(user.id, branch_id).await?;
    }
    Ok(HttpResponse::Created().json(user))
}

route!(assign_branch => Put "/users/{id}/branch" impl AuthManagement where requires [Role::Superuser]);
pub async fn assign_branch<A: AuthManagement>(
    path: web::Path<i64>,
    body: web::Json<AssignBranchParams>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let branch_id = body.into_inner().branch_id;
    debug!("💻️ PUT user {user_id} to branch {branch_id}");
    let user = api.assign_branch(user_id, branch_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(customers => Get "/customers" impl AdminManagement where requires [Role::Staff]);
pub async fn customers<B: AdminManagement>(
    query: web::Query<CustomerQueryParams>,
    api: web::Data<AdminApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CustomerQueryParams { search, page, page_size } = query.into_inner();
    debug!("💻️ GET customers");
    let page = api.list_customers(search, Pagination::new(page, page_size)).await?;
    Ok(HttpResponse::Ok().json(page))
}

//----------------------------------------------   Admin: Catalog  ---------------------------------------------------
route!(create_collection => Post "/collections" impl CatalogManagement where requires [Role::Staff]);
pub async fn create_collection<B: CatalogManagement>(
    body: web::Json<NewCollectionParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let name = body.into_inner().name;
    debug!("💻️ POST collection {name}");
    let collection = api.create_collection(&name).await?;
    Ok(HttpResponse::Created().json(collection))
}

route!(create_product => Post "/products" impl CatalogManagement where requires [Role::Staff]);
pub async fn create_product<B: CatalogManagement>(
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = body.into_inner();
    debug!("💻️ POST product {}", product.name);
    let product = api.create_product(product).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(update_product => Patch "/products/{id}" impl CatalogManagement where requires [Role::Staff]);
/// Price changes only affect carts and future orders. Existing orders keep the price they were placed at.
pub async fn update_product<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH product {id}");
    let product = api.update_product(id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(add_product_image => Post "/products/{id}/images" impl CatalogManagement where requires [Role::Staff]);
pub async fn add_product_image<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<NewProductImage>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST image for product {id}");
    let image = api.add_product_image(id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(image))
}

route!(product_images => Get "/products/{id}/images" impl CatalogManagement where requires [Role::Staff]);
pub async fn product_images<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET images for product {id}");
    let images = api.product_images(id).await?;
    Ok(HttpResponse::Ok().json(images))
}

//----------------------------------------------  Check Token  ----------------------------------------------------
route!(check_token => Get "/check_token" requires [Role::Staff]);
pub async fn check_token(claims: JwtClaims) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET check_token for {}", claims.username);
    Ok(HttpResponse::Ok().body("Token is valid."))
}

fn no_record<T: std::fmt::Display>(what: &str, id: T) -> ServerError {
    ServerError::NoRecordFound(format!("{what} {id} does not exist"))
}

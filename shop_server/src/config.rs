use std::env;

use chrono::Duration;
use log::*;
use paystack_tools::PaystackConfig;
use shop_common::Secret;

const DEFAULT_SHOP_HOST: &str = "127.0.0.1";
const DEFAULT_SHOP_PORT: u16 = 8360;
const DEFAULT_STORE_NAME: &str = "Our Store";
const DEFAULT_MAIL_FROM: &str = "orders@localhost";
const DEFAULT_JWT_EXPIRY: Duration = Duration::hours(24);
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::hours(48);
const DEFAULT_ABANDONED_CART_TIMEOUT: Duration = Duration::hours(168);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub paystack: PaystackConfig,
    /// Used in customer emails, e.g. "Your {store_name} Order #12 is Confirmed!"
    pub store_name: String,
    pub mail_from: String,
    /// The time before an unpaid order is cancelled by the housekeeping worker.
    pub unpaid_order_timeout: Duration,
    /// Carts that have not been touched for this long are deleted by the housekeeping worker.
    pub abandoned_cart_timeout: Duration,
    /// If set, this superuser is created on startup if it does not exist yet.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SHOP_HOST.to_string(),
            port: DEFAULT_SHOP_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            paystack: PaystackConfig::default(),
            store_name: DEFAULT_STORE_NAME.to_string(),
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
            abandoned_cart_timeout: DEFAULT_ABANDONED_CART_TIMEOUT,
            bootstrap_admin: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SHOP_HOST").ok().unwrap_or_else(|| DEFAULT_SHOP_HOST.into());
        let port = env::var("SHOP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SHOP_PORT. {e} Using the default, {DEFAULT_SHOP_PORT}, instead."
                    );
                    DEFAULT_SHOP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SHOP_PORT);
        let database_url = env::var("SHOP_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SHOP_DATABASE_URL is not set. Please set it to the URL for the store database.");
            String::default()
        });
        let auth = AuthConfig::from_env_or_default();
        let paystack = PaystackConfig::new_from_env_or_default();
        let store_name = env::var("SHOP_STORE_NAME").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
            info!("🪛️ SHOP_STORE_NAME is not set. Using '{DEFAULT_STORE_NAME}'.");
            DEFAULT_STORE_NAME.to_string()
        });
        let mail_from = env::var("SHOP_MAIL_FROM").ok().unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());
        let unpaid_order_timeout = hours_from_env("SHOP_UNPAID_ORDER_TIMEOUT", DEFAULT_UNPAID_ORDER_TIMEOUT);
        let abandoned_cart_timeout = hours_from_env("SHOP_ABANDONED_CART_TIMEOUT", DEFAULT_ABANDONED_CART_TIMEOUT);
        let bootstrap_admin = BootstrapAdmin::from_env();
        Self {
            host,
            port,
            database_url,
            auth,
            paystack,
            store_name,
            mail_from,
            unpaid_order_timeout,
            abandoned_cart_timeout,
            bootstrap_admin,
        }
    }
}

fn hours_from_env(name: &str, default: Duration) -> Duration {
    env::var(name)
        .map_err(|_| info!("🪛️ {name} is not set. Using the default value of {} hrs.", default.num_hours()))
        .and_then(|s| {
            s.parse::<i64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for {name}. {e}"))
                .and_then(|h| {
                    if h > 0 {
                        Ok(Duration::hours(h))
                    } else {
                        warn!("🪛️ {name} must be a positive number of hours.");
                        Err(())
                    }
                })
        })
        .ok()
        .unwrap_or(default)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    pub jwt_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since every access token will be invalidated when the server restarts. 🚨️🚨️🚨️"
        );
        let random = (0..4).map(|_| random_hex_segment()).collect::<Vec<_>>().join("");
        Self { jwt_secret: Secret::new(random), jwt_expiry: DEFAULT_JWT_EXPIRY }
    }
}

fn random_hex_segment() -> String {
    use rand_core::RngCore;
    format!("{:016x}", rand_core::OsRng.next_u64())
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let jwt_expiry = hours_from_env("SHOP_JWT_EXPIRY_HOURS", DEFAULT_JWT_EXPIRY);
        match env::var("SHOP_JWT_SECRET").ok().filter(|s| !s.is_empty()) {
            Some(secret) => {
                if secret.len() < 32 {
                    warn!("🪛️ SHOP_JWT_SECRET is shorter than 32 characters. Consider using a longer secret.");
                }
                Self { jwt_secret: Secret::new(secret), jwt_expiry }
            },
            None => Self { jwt_expiry, ..Self::default() },
        }
    }
}

//-------------------------------------------------  BootstrapAdmin  ---------------------------------------------------
#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: Secret<String>,
    pub email: String,
}

impl BootstrapAdmin {
    pub fn from_env() -> Option<Self> {
        let username = env::var("SHOP_BOOTSTRAP_ADMIN_USERNAME").ok().filter(|s| !s.trim().is_empty())?;
        let Some(password) = env::var("SHOP_BOOTSTRAP_ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()) else {
            warn!("🪛️ SHOP_BOOTSTRAP_ADMIN_USERNAME is set, but SHOP_BOOTSTRAP_ADMIN_PASSWORD is not. Ignoring both.");
            return None;
        };
        let email = env::var("SHOP_BOOTSTRAP_ADMIN_EMAIL").unwrap_or_default();
        Some(Self { username: username.trim().to_string(), password: Secret::new(password), email })
    }
}

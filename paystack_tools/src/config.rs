use log::*;
use shop_common::{helpers::env_flag, Secret, STORE_CURRENCY_CODE};

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    /// The secret key authenticates API calls and also signs webhook payloads.
    pub secret_key: Secret<String>,
    pub currency: String,
    pub callback_url: Option<String>,
    pub timeout_secs: u64,
    /// When false, webhook signatures are not checked. Only ever disable this for local testing.
    pub hmac_checks: bool,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(),
            secret_key: Secret::default(),
            currency: STORE_CURRENCY_CODE.to_string(),
            callback_url: None,
            timeout_secs: 10,
            hmac_checks: true,
        }
    }
}

impl PaystackConfig {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var("SHOP_PAYSTACK_BASE_URL").unwrap_or_else(|_| {
            info!("🪛️ SHOP_PAYSTACK_BASE_URL not set, using {DEFAULT_PAYSTACK_BASE_URL}");
            DEFAULT_PAYSTACK_BASE_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("SHOP_PAYSTACK_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SHOP_PAYSTACK_SECRET_KEY not set. Payment initialization and webhooks will not work.");
            String::default()
        }));
        let currency = std::env::var("SHOP_PAYSTACK_CURRENCY").unwrap_or(defaults.currency);
        let callback_url = std::env::var("SHOP_PAYSTACK_CALLBACK_URL").ok().filter(|s| !s.trim().is_empty());
        let timeout_secs = std::env::var("SHOP_PAYSTACK_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid SHOP_PAYSTACK_TIMEOUT '{s}': {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(defaults.timeout_secs);
        let hmac_checks = env_flag("SHOP_PAYSTACK_HMAC_CHECKS", true);
        if !hmac_checks {
            warn!("🪛️ Paystack webhook signature checks are DISABLED. Do not run like this in production.");
        }
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { base_url, secret_key, currency, callback_url, timeout_secs, hmac_checks }
    }
}

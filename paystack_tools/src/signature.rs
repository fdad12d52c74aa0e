//! Webhook authentication.
//!
//! Paystack signs each webhook delivery with an HMAC-SHA512 of the raw request body, keyed with the account's secret
//! key, and sends the hex digest in the `X-Paystack-Signature` header.
use hmac::{Hmac, Mac};
use sha2::Sha512;
use shop_common::Secret;

pub const PAYSTACK_SIGNATURE_HEADER: &str = "X-Paystack-Signature";

type HmacSha512 = Hmac<Sha512>;

/// Calculates the lowercase hex signature Paystack would send for `payload`.
pub fn calculate_signature(secret: &Secret<String>, payload: &[u8]) -> String {
    let mut mac = new_mac(secret);
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` against the payload in constant time. Malformed hex is simply a mismatch.
pub fn verify_webhook_signature(secret: &Secret<String>, payload: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let mut mac = new_mac(secret);
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

fn new_mac(secret: &Secret<String>) -> HmacSha512 {
    // HMAC accepts keys of any length, so this cannot fail
    HmacSha512::new_from_slice(secret.reveal().as_bytes()).unwrap_or_else(|_| unreachable!())
}

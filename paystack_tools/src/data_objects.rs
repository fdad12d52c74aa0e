use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shop_common::Pesewas;

/// The envelope Paystack wraps every API response in.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PaystackResponse<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub display_name: String,
    pub variable_name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub order_id: i64,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl PaymentMetadata {
    pub fn for_order(order_id: i64) -> Self {
        let field = CustomField {
            display_name: "Order ID".to_string(),
            variable_name: "order_id".to_string(),
            value: Value::from(order_id),
        };
        Self { order_id, custom_fields: vec![field] }
    }
}

/// The body of `POST /transaction/initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    /// Paystack quotes amounts in the currency's minor unit.
    pub amount: Pesewas,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub metadata: PaymentMetadata,
}

impl InitializeRequest {
    pub fn new(email: impl Into<String>, amount: Pesewas, currency: impl Into<String>, order_id: i64) -> Self {
        Self {
            email: email.into(),
            amount,
            currency: currency.into(),
            callback_url: None,
            metadata: PaymentMetadata::for_order(order_id),
        }
    }

    pub fn with_callback_url(mut self, url: Option<String>) -> Self {
        self.callback_url = url;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// The state of a transaction as reported by Paystack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Abandoned,
    Reversed,
    Ongoing,
    Pending,
    Processing,
    Queued,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// True for the states after which Paystack will never report success for the transaction.
    pub fn is_final_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Abandoned | Self::Reversed)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
            Self::Reversed => "reversed",
            Self::Ongoing => "ongoing",
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Queued => "queued",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Transaction details, as returned by `GET /transaction/verify/{reference}` and carried in webhook events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedTransaction {
    pub status: TransactionStatus,
    pub reference: String,
    pub amount: Pesewas,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    /// Paystack echoes back whatever metadata was sent. This is sometimes an empty string, so it is kept loose.
    #[serde(default)]
    pub metadata: Value,
}

impl VerifiedTransaction {
    pub fn order_id(&self) -> Option<i64> {
        let id = &self.metadata["order_id"];
        id.as_i64().or_else(|| id.as_str().and_then(|s| s.parse().ok()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WebhookEvent {
    pub const CHARGE_SUCCESS: &'static str = "charge.success";

    pub fn is_charge_success(&self) -> bool {
        self.event == Self::CHARGE_SUCCESS
    }

    /// Interprets the payload as transaction details. Only meaningful for `charge.*` events.
    pub fn transaction(&self) -> Result<VerifiedTransaction, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

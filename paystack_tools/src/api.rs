use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::PaystackConfig,
    data_objects::PaystackResponse,
    InitializeRequest,
    InitializedTransaction,
    PaymentGateway,
    PaystackApiError,
    VerifiedTransaction,
};

#[derive(Clone)]
pub struct PaystackApi {
    config: PaystackConfig,
    client: Arc<Client>,
}

impl PaystackApi {
    pub fn new(config: PaystackConfig) -> Result<Self, PaystackApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaystackApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Sends a request and unwraps Paystack's `{status, message, data}` envelope. A `false` status, or a missing
    /// `data` field, is reported as [`PaystackApiError::Rejected`] with Paystack's message.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, PaystackApiError> {
        let url = self.url(path);
        trace!("💳️ Sending Paystack request: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let envelope = match serde_json::from_str::<PaystackResponse<T>>(&text) {
            Ok(e) => e,
            Err(_) if !status.is_success() => {
                return Err(PaystackApiError::QueryError { status: status.as_u16(), message: text });
            },
            Err(e) => return Err(PaystackApiError::JsonError(e.to_string())),
        };
        trace!("💳️ Paystack replied {status}: {}", envelope.message);
        if !status.is_success() || !envelope.status {
            let message = if envelope.message.is_empty() { status.to_string() } else { envelope.message };
            return Err(PaystackApiError::Rejected(message));
        }
        envelope.data.ok_or(PaystackApiError::Rejected(envelope.message))
    }
}

impl PaymentGateway for PaystackApi {
    async fn initialize_payment(&self, request: InitializeRequest) -> Result<InitializedTransaction, PaystackApiError> {
        let order_id = request.metadata.order_id;
        debug!("💳️ Initializing payment of {} for order #{order_id}", request.amount);
        let result = self
            .rest_query::<InitializedTransaction, _>(Method::POST, "/transaction/initialize", Some(request))
            .await?;
        info!("💳️ Payment initialized for order #{order_id}. Reference: {}", result.reference);
        Ok(result)
    }

    async fn verify_payment(&self, reference: &str) -> Result<VerifiedTransaction, PaystackApiError> {
        debug!("💳️ Verifying payment {reference}");
        let path = format!("/transaction/verify/{reference}");
        let result = self.rest_query::<VerifiedTransaction, ()>(Method::GET, &path, None).await?;
        info!("💳️ Payment {reference} has status '{}'", result.status);
        Ok(result)
    }
}

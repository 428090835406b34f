pub mod config;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::models::PaymentConfig;
use crate::payments::config::{CheckoutRequest, CheckoutResponse};

pub const PAYMENT_SERVICE_HOST_ENV: &str = "PAYMENT_SERVICE_HOST";

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Закрытый перечень исходов неуспешного платежа. Любая ошибка SDK или
/// транспорта нормализуется в Indeterminate на этой границе.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    Declined(String),
    Indeterminate(String),
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentError::Declined(e) => write!(f, "Payment declined: {}", e),
            PaymentError::Indeterminate(e) => write!(f, "Payment outcome unknown: {}", e),
        }
    }
}

impl std::error::Error for PaymentError {}

/// Успешный платёж: шлюз уже надёжно зафиксировал списание у себя.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub booking_id: String,
    pub amount: f64,
    pub currency: String,
    pub reference: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Запускает внешний checkout и ждет его завершения. Вызов может висеть
    /// "человеческое" время, пока плательщик проходит оплату.
    async fn charge(&self, request: CheckoutRequest) -> Result<PaymentReceipt, PaymentError>;
}

pub struct HttpPaymentProvider {
    client: Client,
    config: PaymentConfig,
}

impl HttpPaymentProvider {
    pub fn new(config: PaymentConfig) -> Self {
        // Без общего таймаута: checkout ограничен только терпением плательщика.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        HttpPaymentProvider { client, config }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn charge(&self, request: CheckoutRequest) -> Result<PaymentReceipt, PaymentError> {
        log::info!(
            "🔄 Starting checkout for booking {}: {} {}",
            request.booking_id,
            request.amount,
            request.currency
        );

        let response = self
            .client
            .post(format!("{}/checkout", self.config.service_host))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .body(serde_json::to_vec(&request).map_err(|e| {
                PaymentError::Indeterminate(format!("request serialization: {}", e))
            })?)
            .send()
            .await
            .map_err(|e| PaymentError::Indeterminate(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Indeterminate(format!(
                "gateway returned HTTP {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::Indeterminate(e.to_string()))?;
        let checkout = serde_json::from_str::<CheckoutResponse>(&text)
            .map_err(|e| PaymentError::Indeterminate(format!("bad gateway response: {}", e)))?;

        outcome_from_response(&request, checkout)
    }
}

fn outcome_from_response(
    request: &CheckoutRequest,
    response: CheckoutResponse,
) -> Result<PaymentReceipt, PaymentError> {
    match response.status.as_str() {
        "succeeded" => {
            log::info!("✅ Checkout succeeded for booking {}", request.booking_id);
            Ok(PaymentReceipt {
                booking_id: request.booking_id.clone(),
                amount: request.amount,
                currency: request.currency.clone(),
                reference: response
                    .reference
                    .unwrap_or_else(|| request.booking_id.clone()),
            })
        }
        "declined" => Err(PaymentError::Declined(
            response
                .decline_reason
                .unwrap_or_else(|| "declined by gateway".to_string()),
        )),
        other => Err(PaymentError::Indeterminate(format!(
            "unexpected gateway status: {}",
            other
        ))),
    }
}

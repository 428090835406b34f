use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Id бронирования, он же idempotency key на стороне шлюза.
    pub booking_id: String,
    pub amount: f64,
    pub currency: String,
    pub payer_contact: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_reason: Option<String>,
}

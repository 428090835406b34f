use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub service_host: String,
    pub currency: String,
}

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

/// Статус бронирования. Из confirmed/cancelled обратных переходов нет.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    NotRequired,
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::NotRequired => "not_required",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "not_required" => PaymentStatus::NotRequired,
            "paid" => PaymentStatus::Paid,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

/// Откуда взялась запись: из основной БД или из локального резервного журнала.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingOrigin {
    Durable,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub mentor_id: String,
    pub requester_id: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub topic: String,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub origin: BookingOrigin,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Для записей основного хранилища confirmed допустим только при
    /// not_required или paid. Резервные записи ждут ручной сверки и могут
    /// быть confirmed с неоплаченным платежом.
    pub fn is_consistent(&self) -> bool {
        if self.origin == BookingOrigin::Fallback {
            return true;
        }
        if self.status == BookingStatus::Confirmed {
            matches!(
                self.payment_status,
                PaymentStatus::NotRequired | PaymentStatus::Paid
            )
        } else {
            true
        }
    }
}

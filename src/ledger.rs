use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Booking, BookingOrigin};

/// Локальный резервный журнал бронирований. Используется, когда основное
/// хранилище недоступно, и точкой поглощения платёжных сбоев. Записи живут
/// в процессе до конца сеанса и помечены origin=fallback для последующей
/// ручной сверки.
#[derive(Clone, Default)]
pub struct FallbackLedger {
    entries: Arc<RwLock<Vec<Booking>>>,
}

impl FallbackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Всегда успешна. Возвращает локально выданный id.
    pub async fn record(&self, mut booking: Booking) -> String {
        if booking.id.is_empty() {
            booking.id = format!("local-{}", Uuid::new_v4());
        }
        booking.origin = BookingOrigin::Fallback;

        log::warn!(
            "📒 Booking {} recorded in local fallback ledger (mentor {})",
            booking.id,
            booking.mentor_id
        );

        let id = booking.id.clone();
        let mut entries = self.entries.write().await;
        entries.push(booking);
        id
    }

    pub async fn snapshot(&self) -> Vec<Booking> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, PaymentStatus};
    use chrono::Utc;

    fn sample_booking() -> Booking {
        Booking {
            id: String::new(),
            mentor_id: "career-coach".to_string(),
            requester_id: None,
            starts_at: Utc::now(),
            duration_minutes: 30,
            topic: "резюме".to_string(),
            notes: None,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::NotRequired,
            origin: BookingOrigin::Durable,
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn record_assigns_local_id_and_fallback_origin() {
        let ledger = FallbackLedger::new();
        let id = ledger.record(sample_booking()).await;

        assert!(id.starts_with("local-"));

        let entries = ledger.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].origin, BookingOrigin::Fallback);
    }

    #[tokio::test]
    async fn record_keeps_existing_id() {
        let ledger = FallbackLedger::new();
        let mut booking = sample_booking();
        booking.id = "b-42".to_string();

        let id = ledger.record(booking).await;
        assert_eq!(id, "b-42");
        assert_eq!(ledger.len().await, 1);
    }
}

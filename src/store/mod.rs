use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::database::Database;
use crate::models::{Booking, BookingOrigin, BookingStatus, PaymentStatus};

/// Закрытый перечень отказов основного хранилища.
/// SchemaMissing и Unreachable означают одно и то же для вызывающего:
/// хранилище фактически недоступно, бронирование уходит на локальный путь.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    SchemaMissing,
    Unreachable(String),
    Rejected(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::SchemaMissing => write!(f, "Booking schema is missing"),
            StoreError::Unreachable(e) => write!(f, "Booking store unreachable: {}", e),
            StoreError::Rejected(e) => write!(f, "Booking rejected: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    /// Хранилище недоступно (в отличие от отклонённой записи).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::SchemaMissing | StoreError::Unreachable(_))
    }
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Создает pending-запись и возвращает выданный хранилищем id.
    /// Id в переданном бронировании игнорируется.
    async fn create_pending(&self, booking: &Booking) -> Result<String, StoreError>;

    /// status=confirmed, payment_status=paid.
    async fn mark_paid(&self, id: &str) -> Result<(), StoreError>;

    /// status=confirmed без изменения payment_status (бесплатный путь).
    async fn mark_confirmed(&self, id: &str) -> Result<(), StoreError>;

    /// status=pending, payment_status=failed.
    async fn mark_failed(&self, id: &str) -> Result<(), StoreError>;

    /// Чтение для личного кабинета.
    async fn list_for_requester(&self, requester_id: &str) -> Result<Vec<Booking>, StoreError>;

    /// Снимает просроченные неоплаченные брони (истёк срок на оплату).
    async fn expire_stale_holds(&self) -> Result<u64, StoreError>;
}

pub struct PgBookingStore {
    db: Database,
}

impl PgBookingStore {
    pub fn new(db: Database) -> Self {
        PgBookingStore { db }
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // undefined_table: схема не развернута
            Some("42P01") => StoreError::SchemaMissing,
            // unique_violation: слот уже занят
            Some("23505") => StoreError::Rejected("time slot already taken".to_string()),
            _ => StoreError::Unreachable(e.to_string()),
        },
        sqlx::Error::RowNotFound => StoreError::Rejected("booking not found".to_string()),
        _ => StoreError::Unreachable(e.to_string()),
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn create_pending(&self, booking: &Booking) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO bookings
            (id, mentor_id, requester_id, starts_at, duration_minutes, topic, notes,
             status, payment_status, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, NOW(), $9)
            "#,
        )
        .bind(&id)
        .bind(&booking.mentor_id)
        .bind(&booking.requester_id)
        .bind(booking.starts_at)
        .bind(booking.duration_minutes)
        .bind(&booking.topic)
        .bind(&booking.notes)
        .bind(booking.payment_status.as_str())
        .bind(booking.expires_at)
        .execute(&self.db.pool)
        .await
        .map_err(map_sqlx_error)?;

        log::info!("📝 Pending booking {} created for mentor {}", id, booking.mentor_id);
        Ok(id)
    }

    async fn mark_paid(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE bookings
             SET status = 'confirmed', payment_status = 'paid',
                 expires_at = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rejected("booking not found".to_string()));
        }
        Ok(())
    }

    async fn mark_confirmed(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE bookings
             SET status = 'confirmed', expires_at = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rejected("booking not found".to_string()));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE bookings
             SET status = 'pending', payment_status = 'failed',
                 expires_at = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.db.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rejected("booking not found".to_string()));
        }
        Ok(())
    }

    async fn list_for_requester(&self, requester_id: &str) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, mentor_id, requester_id, starts_at, duration_minutes, topic, notes,
                    status, payment_status, created_at, expires_at
             FROM bookings
             WHERE requester_id = $1
             ORDER BY starts_at ASC",
        )
        .bind(requester_id)
        .fetch_all(&self.db.pool)
        .await
        .map_err(map_sqlx_error)?;

        let bookings = rows
            .iter()
            .map(|row| {
                let status: String = row.get("status");
                let payment_status: String = row.get("payment_status");
                Booking {
                    id: row.get("id"),
                    mentor_id: row.get("mentor_id"),
                    requester_id: row.get("requester_id"),
                    starts_at: row.get("starts_at"),
                    duration_minutes: row.get("duration_minutes"),
                    topic: row.get("topic"),
                    notes: row.get("notes"),
                    status: BookingStatus::from_str(&status),
                    payment_status: PaymentStatus::from_str(&payment_status),
                    origin: BookingOrigin::Durable,
                    created_at: row.get("created_at"),
                    expires_at: row.get("expires_at"),
                }
            })
            .collect();

        Ok(bookings)
    }

    async fn expire_stale_holds(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE bookings
             SET status = 'cancelled', updated_at = NOW()
             WHERE status = 'pending' AND payment_status = 'pending'
               AND expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(Utc::now())
        .execute(&self.db.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_unreachable() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(map_sqlx_error(err).is_unavailable());
    }

    #[test]
    fn missing_row_maps_to_rejected() {
        let mapped = map_sqlx_error(sqlx::Error::RowNotFound);
        assert_eq!(mapped, StoreError::Rejected("booking not found".to_string()));
        assert!(!mapped.is_unavailable());
    }

    #[test]
    fn schema_missing_counts_as_unavailable() {
        assert!(StoreError::SchemaMissing.is_unavailable());
        assert!(!StoreError::Rejected("slot taken".to_string()).is_unavailable());
    }
}

use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use chrono::NaiveTime;
use sqlx::Row;

use crate::database::Database;

/// Недельное расписание: название дня недели -> упорядоченный список времён начала.
pub type WeeklyAvailability = HashMap<String, Vec<NaiveTime>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorProfile {
    pub id: String,
    pub name: String,
    pub title: String,
    pub hourly_rate: f64,
    pub availability: WeeklyAvailability,
}

impl MentorProfile {
    /// Нулевая ставка означает бесплатный (near-peer) тариф.
    pub fn is_free(&self) -> bool {
        self.hourly_rate == 0.0
    }

    pub fn session_price(&self, duration_minutes: i32) -> f64 {
        self.hourly_rate * duration_minutes as f64 / 60.0
    }

    pub async fn get_all_active(db: &Database) -> Vec<Self> {
        match sqlx::query(
            "SELECT id, name, title, hourly_rate, availability
             FROM mentors
             WHERE is_active = true
             ORDER BY hourly_rate DESC",
        )
        .fetch_all(&db.pool)
        .await
        {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| Self::from_row(row).ok())
                .collect(),
            Err(e) => {
                log::error!("Error fetching mentors from database: {}", e);
                // Fallback to a default mentor if DB fails
                vec![Self::default_mentor()]
            }
        }
    }

    pub async fn find_by_id(db: &Database, id: &str) -> Option<Self> {
        match sqlx::query(
            "SELECT id, name, title, hourly_rate, availability
             FROM mentors
             WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .fetch_optional(&db.pool)
        .await
        {
            Ok(Some(row)) => Self::from_row(&row).ok(),
            Ok(None) => {
                log::warn!("Mentor with id {} not found in database", id);
                None
            }
            Err(e) => {
                log::error!("Error fetching mentor from database: {}", e);
                None
            }
        }
    }

    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, serde_json::Error> {
        let availability_json: serde_json::Value = row.get("availability");
        Ok(MentorProfile {
            id: row.get("id"),
            name: row.get("name"),
            title: row.get("title"),
            hourly_rate: row.get("hourly_rate"),
            availability: serde_json::from_value(availability_json)?,
        })
    }

    pub fn default_mentor() -> Self {
        let mut availability = WeeklyAvailability::new();
        availability.insert(
            "Monday".to_string(),
            vec![
                NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
                NaiveTime::from_hms_opt(11, 0, 0).unwrap_or_default(),
            ],
        );
        MentorProfile {
            id: "near-peer".to_string(),
            name: "Анна".to_string(),
            title: "Студентка-наставник".to_string(),
            hourly_rate: 0.0,
            availability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_free() {
        let mentor = MentorProfile::default_mentor();
        assert!(mentor.is_free());

        let paid = MentorProfile {
            hourly_rate: 40.0,
            ..mentor
        };
        assert!(!paid.is_free());
        assert_eq!(paid.session_price(30), 20.0);
    }

    #[test]
    fn availability_deserializes_from_json() {
        let raw = r#"{"Monday": ["10:00:00", "11:30:00"], "Friday": ["09:00:00"]}"#;
        let availability: WeeklyAvailability = serde_json::from_str(raw).unwrap();
        assert_eq!(availability["Monday"].len(), 2);
        assert_eq!(
            availability["Friday"][0],
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
    }
}

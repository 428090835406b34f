use serde::{Serialize, Deserialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Черновик бронирования на время одного прохода мастера.
/// Живет только в памяти, уничтожается на любом терминальном переходе.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingDraft {
    pub mentor_id: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub topic: String,
    pub notes: Option<String>,
}

impl BookingDraft {
    pub fn new(mentor_id: &str) -> Self {
        BookingDraft {
            mentor_id: mentor_id.to_string(),
            ..Default::default()
        }
    }

    /// Дата + время одним timestamp, если оба выбраны.
    pub fn resolved_start(&self) -> Option<DateTime<Utc>> {
        let date = self.date?;
        let time = self.time?;
        Some(date.and_time(time).and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_start_needs_both_parts() {
        let mut draft = BookingDraft::new("m-1");
        assert!(draft.resolved_start().is_none());

        draft.date = NaiveDate::from_ymd_opt(2026, 9, 7);
        assert!(draft.resolved_start().is_none());

        draft.time = NaiveTime::from_hms_opt(10, 0, 0);
        let start = draft.resolved_start().unwrap();
        assert_eq!(start.to_rfc3339(), "2026-09-07T10:00:00+00:00");
    }
}

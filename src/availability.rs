use chrono::{Datelike, NaiveDate, NaiveTime, Utc, Weekday};

use crate::models::MentorProfile;

pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Доступные времена начала сессии у наставника на конкретную дату.
/// Прошедшие даты и дни без расписания дают пустой список, не ошибку.
pub fn slots_for(mentor: &MentorProfile, date: NaiveDate) -> Vec<NaiveTime> {
    slots_for_at(mentor, date, Utc::now().date_naive())
}

pub(crate) fn slots_for_at(
    mentor: &MentorProfile,
    date: NaiveDate,
    today: NaiveDate,
) -> Vec<NaiveTime> {
    if date < today {
        return Vec::new();
    }

    mentor
        .availability
        .get(weekday_key(date.weekday()))
        .cloned()
        .unwrap_or_default()
}

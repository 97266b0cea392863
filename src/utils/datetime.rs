use chrono::{DateTime, SecondsFormat, Utc};

/// Storage form of a timestamp. Second precision with a `Z` suffix, so
/// comparing two stored values as strings compares them as instants.
pub fn to_db(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn from_db(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Day-first date as shown to users, e.g. `07/03/2025`.
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y").to_string()
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y %H:%M UTC").to_string()
}

/// Whole days remaining until `end`, never negative.
pub fn days_left(end: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
    (*end - *now).num_days().max(0)
}

/// Suffix used for backup file names.
pub fn file_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d_%H%M%S").to_string()
}

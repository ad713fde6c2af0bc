//! Calendar-day relative timestamps ("Today, 14:05", "Gestern, 23:50 Uhr").
//!
//! Buckets are anchored to local midnight, not to elapsed hours: 23:50
//! yesterday and 00:10 today are twenty minutes apart but fall into
//! different buckets.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc, Weekday};

use crate::models::Locale;

fn weekday_name(weekday: Weekday, locale: Locale) -> &'static str {
    match locale {
        Locale::De => match weekday {
            Weekday::Mon => "Montag",
            Weekday::Tue => "Dienstag",
            Weekday::Wed => "Mittwoch",
            Weekday::Thu => "Donnerstag",
            Weekday::Fri => "Freitag",
            Weekday::Sat => "Samstag",
            Weekday::Sun => "Sonntag",
        },
        Locale::En => match weekday {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        },
    }
}

/// Whole calendar days from `timestamp`'s local date to `now`'s local date.
/// Negative when `timestamp` lies on a later day.
pub fn calendar_days_between<Tz: TimeZone>(
    timestamp: &DateTime<Utc>,
    now: &DateTime<Utc>,
    tz: &Tz,
) -> i64 {
    let then = timestamp.with_timezone(tz).date_naive();
    let today = now.with_timezone(tz).date_naive();
    (today - then).num_days()
}

pub fn format_relative<Tz: TimeZone>(
    timestamp: &DateTime<Utc>,
    now: &DateTime<Utc>,
    tz: &Tz,
    locale: Locale,
) -> String {
    let local = timestamp.with_timezone(tz);
    let time = format!("{:02}:{:02}", local.hour(), local.minute());
    let days = calendar_days_between(timestamp, now, tz);

    let day_label = match days {
        0 => match locale {
            Locale::De => "Heute".to_string(),
            Locale::En => "Today".to_string(),
        },
        1 => match locale {
            Locale::De => "Gestern".to_string(),
            Locale::En => "Yesterday".to_string(),
        },
        2..=6 => weekday_name(local.weekday(), locale).to_string(),
        _ => format!("{:02}.{:02}.{:04}", local.day(), local.month(), local.year()),
    };

    match locale {
        Locale::De => format!("{}, {} Uhr", day_label, time),
        Locale::En => format!("{}, {}", day_label, time),
    }
}

/// `format_relative` against the system clock and time zone.
pub fn format_relative_now(timestamp: &DateTime<Utc>, locale: Locale) -> String {
    format_relative(timestamp, &Utc::now(), &Local, locale)
}

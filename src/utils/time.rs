use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// This is the standard way of converting a date to a string in workbeam.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar day a moment falls into, seen from the given timezone.
///
/// Every date key in the crate is derived through this function so that day
/// bucketing cannot drift between UTC and local interpretations. The cli
/// always passes [chrono::Local].
pub fn day_key<Tz: TimeZone>(moment: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    moment.with_timezone(tz).date_naive()
}

/// Formats whole seconds as a zero padded `HH:MM:SS` timer readout.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

/// Formats fractional hours the short way: 1.5 becomes "1h30", 2.0 becomes
/// "2h". Minutes are rounded, so 1.999 rolls over to "2h" instead of "1h60".
pub fn format_hours(hours: f64) -> String {
    let whole = hours.floor() as i64;
    let minutes = ((hours - whole as f64) * 60.).round() as i64;
    if minutes == 60 {
        format!("{}h", whole + 1)
    } else if minutes == 0 {
        format!("{whole}h")
    } else {
        format!("{whole}h{minutes:02}")
    }
}

/// The `n` calendar days ending at `today`, oldest first.
pub fn last_n_days(today: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (0..i64::from(n))
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

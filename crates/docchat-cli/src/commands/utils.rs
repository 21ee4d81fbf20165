use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// Render a document's `last_modified` value as a local date.
///
/// Accepts RFC 3339, naive ISO timestamps and epoch seconds or milliseconds.
/// Anything else is shown as sent.
pub fn format_last_modified(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return "N/A".to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return format_date(dt.with_timezone(&Local));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%Y-%m-%d").to_string();
    }

    if let Ok(number) = raw.parse::<f64>()
        && number.is_finite()
    {
        // Epoch seconds unless the value only makes sense as milliseconds.
        let millis = if number.abs() >= 1e11 {
            number as i64
        } else {
            (number * 1000.0) as i64
        };
        if let Some(dt) = Local.timestamp_millis_opt(millis).single() {
            return format_date(dt);
        }
    }

    raw.to_string()
}

fn format_date(datetime: DateTime<Local>) -> String {
    datetime.format("%Y-%m-%d").to_string()
}

use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use quickdial_core::CallType;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Local date or date-time to epoch milliseconds.
pub fn parse_local_timestamp_millis(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("timestamp cannot be empty"));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("invalid date"))?;
        return local_to_utc_millis(naive);
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return local_to_utc_millis(dt);
        }
    }

    Err(anyhow!(
        "invalid datetime format: expected YYYY-MM-DD or YYYY-MM-DD HH:MM"
    ))
}

pub fn parse_call_type(raw: &str) -> Result<CallType> {
    CallType::parse(raw).ok_or_else(|| {
        let expected: Vec<&str> = CallType::all().iter().map(|kind| kind.as_str()).collect();
        anyhow!("invalid call type: expected {}", expected.join("|"))
    })
}

fn local_to_utc_millis(naive: NaiveDateTime) -> Result<i64> {
    let local = Local
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| anyhow!("ambiguous local time: {}", naive))?;
    Ok(local.with_timezone(&Utc).timestamp_millis())
}

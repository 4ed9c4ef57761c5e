//! Current-hour lookup over a snapshot's parallel hourly arrays.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::{
    domain::{CurrentReading, HourlyReading, WeatherSnapshot, HOURLY_TEMPERATURE, HOURLY_TIME},
    Error, Result,
};

/// Format `now` truncated to the hour, the way Open-Meteo keys hourly entries.
pub fn hour_key(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:00").to_string()
}

/// Find the entry whose timestamp equals `key` and reduce the snapshot to it.
///
/// Linear scan, first match wins. A missing or ill-typed array is a decode
/// error, not a panic; no match is `Error::NotFound`.
pub fn current_hour_reading(snapshot: &WeatherSnapshot, key: &str) -> Result<CurrentReading> {
    let times = hourly_array(snapshot, HOURLY_TIME)?;
    let temps = hourly_array(snapshot, HOURLY_TEMPERATURE)?;

    let mut index = None;
    for (i, t) in times.iter().enumerate() {
        let Some(t) = t.as_str() else {
            return Err(Error::Decode(format!(
                "hourly.{HOURLY_TIME}[{i}] is not a string"
            )));
        };
        if t == key {
            index = Some(i);
            break;
        }
    }

    let Some(i) = index else {
        return Err(Error::NotFound(format!("no hourly entry for {key}")));
    };

    let temperature = temps.get(i).and_then(Value::as_f64).ok_or_else(|| {
        Error::Decode(format!(
            "hourly.{HOURLY_TEMPERATURE}[{i}] is missing or not a number"
        ))
    })?;

    Ok(CurrentReading {
        elevation: snapshot.elevation,
        hourly: HourlyReading {
            time: key.to_string(),
            temperature,
        },
    })
}

fn hourly_array<'a>(snapshot: &'a WeatherSnapshot, field: &str) -> Result<&'a Vec<Value>> {
    snapshot
        .hourly
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Decode(format!("hourly.{field} is missing or not an array")))
}

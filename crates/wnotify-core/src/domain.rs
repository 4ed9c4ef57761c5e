use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name of the hourly timestamp array in a forecast response.
pub const HOURLY_TIME: &str = "time";

/// Field name of the hourly temperature array in a forecast response.
pub const HOURLY_TEMPERATURE: &str = "temperature_2m";

/// A latitude/longitude pair in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::new(28.44, 77.88)
    }
}

/// One decoded forecast response.
///
/// `hourly` holds parallel arrays keyed by field name (`time`, `temperature_2m`, ...),
/// indexed by hour. Any other top-level fields in the response are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub elevation: f64,
    pub hourly: Map<String, Value>,
}

impl WeatherSnapshot {
    /// Number of entries in the hourly time series (0 when absent or ill-typed).
    pub fn hourly_len(&self) -> usize {
        self.hourly
            .get(HOURLY_TIME)
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// One-line, human-readable description used by the notification channels.
    pub fn summary(&self) -> String {
        let first = self
            .hourly
            .get(HOURLY_TEMPERATURE)
            .and_then(Value::as_array)
            .and_then(|temps| temps.first())
            .and_then(Value::as_f64);

        match first {
            Some(t) => format!(
                "elevation {}m, {} hourly readings, first {t}°C",
                self.elevation,
                self.hourly_len()
            ),
            None => format!(
                "elevation {}m, {} hourly readings",
                self.elevation,
                self.hourly_len()
            ),
        }
    }
}

/// The hourly entry matched for the current hour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourlyReading {
    pub time: String,
    pub temperature: f64,
}

/// Reduced snapshot returned by `GET /weather`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentReading {
    pub elevation: f64,
    pub hourly: HourlyReading,
}

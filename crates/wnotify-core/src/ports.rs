use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use crate::{
    domain::{Coordinates, WeatherSnapshot},
    Result,
};

/// Hexagonal port for the weather backend.
///
/// `OpenMeteoClient` is the production implementation; tests drive the poller
/// and the HTTP handler with in-memory fakes.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch the forecast for `at`.
    ///
    /// Transport failures map to `Error::Fetch`, malformed bodies to `Error::Decode`.
    async fn fetch(&self, at: Coordinates) -> Result<WeatherSnapshot>;
}

/// Wall-clock source, injectable so the current-hour lookup is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a single instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

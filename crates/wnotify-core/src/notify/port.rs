use async_trait::async_trait;

use crate::{domain::WeatherSnapshot, Result};

/// Cross-channel notification port.
///
/// The poller only sees this trait, so a new channel (SMS gateway, SMTP, chat)
/// plugs in without touching the dispatch loop. Transport failures must come
/// back as `Error::Delivery`; they never abort the poller.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Short label used in logs and tick reports, e.g. `sms:+15550100`.
    fn channel(&self) -> String;

    async fn deliver(&self, snapshot: &WeatherSnapshot) -> Result<()>;
}

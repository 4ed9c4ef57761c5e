use async_trait::async_trait;

use crate::{domain::WeatherSnapshot, notify::port::Sender, Result};

/// Placeholder SMS channel: logs what would be sent to `number`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmsSender {
    number: String,
}

impl SmsSender {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
        }
    }
}

#[async_trait]
impl Sender for SmsSender {
    fn channel(&self) -> String {
        format!("sms:{}", self.number)
    }

    async fn deliver(&self, snapshot: &WeatherSnapshot) -> Result<()> {
        tracing::info!(number = %self.number, "sending weather by sms: {}", snapshot.summary());
        Ok(())
    }
}

/// Placeholder email channel: logs what would be sent to `address`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailSender {
    address: String,
}

impl EmailSender {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl Sender for EmailSender {
    fn channel(&self) -> String {
        format!("email:{}", self.address)
    }

    async fn deliver(&self, snapshot: &WeatherSnapshot) -> Result<()> {
        tracing::info!(address = %self.address, "sending weather by email: {}", snapshot.summary());
        Ok(())
    }
}

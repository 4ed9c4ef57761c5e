use std::time::Duration;

use async_trait::async_trait;

use crate::{
    domain::WeatherSnapshot, notify::port::Sender, weather::http_client, Error, Result,
};

/// Delivers each snapshot as a JSON `POST` to a fixed URL.
#[derive(Clone, Debug)]
pub struct WebhookSender {
    url: String,
    http: reqwest::Client,
}

impl WebhookSender {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            http: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl Sender for WebhookSender {
    fn channel(&self) -> String {
        format!("webhook:{}", self.url)
    }

    async fn deliver(&self, snapshot: &WeatherSnapshot) -> Result<()> {
        let resp = self
            .http
            .post(&self.url)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| Error::delivery(self.channel(), e))?;

        if !resp.status().is_success() {
            return Err(Error::delivery(
                self.channel(),
                format!("endpoint returned {}", resp.status()),
            ));
        }

        tracing::debug!(url = %self.url, "webhook delivered");
        Ok(())
    }
}

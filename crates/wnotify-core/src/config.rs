use std::{
    env, fs,
    net::SocketAddr,
    path::Path,
    sync::Arc,
    time::Duration,
};

use crate::{
    domain::Coordinates,
    errors::Error,
    notify::{EmailSender, Sender, SmsSender, WebhookSender},
    poller::PollerConfig,
    weather::DEFAULT_ENDPOINT,
    Result,
};

/// Which flows the binary runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    Poll,
    Serve,
    Both,
}

impl RunMode {
    pub fn polls(self) -> bool {
        matches!(self, Self::Poll | Self::Both)
    }

    pub fn serves(self) -> bool {
        matches!(self, Self::Serve | Self::Both)
    }

    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "poll" => Ok(Self::Poll),
            "serve" => Ok(Self::Serve),
            "both" => Ok(Self::Both),
            other => Err(Error::Config(format!(
                "WNOTIFY_MODE must be poll, serve or both (got {other:?})"
            ))),
        }
    }
}

/// Typed configuration, read from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub mode: RunMode,

    // Weather API
    pub weather_endpoint: String,
    pub location: Coordinates,
    pub fetch_timeout: Duration,

    // Poller
    pub poll_interval: Duration,
    pub poll_duration: Option<Duration>,

    // Notification destinations
    pub sms_numbers: Vec<String>,
    pub email_addresses: Vec<String>,
    pub webhook_url: Option<String>,

    // HTTP server
    pub http_bind_addr: SocketAddr,
}

impl Config {
    /// Load from the process environment, after applying `.env` if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let mode = match get("WNOTIFY_MODE") {
            Some(raw) => RunMode::parse(&raw)?,
            None => RunMode::Poll,
        };

        let weather_endpoint =
            get("WEATHER_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let defaults = Coordinates::default();
        let location = Coordinates::new(
            parse_or("WEATHER_LATITUDE", get("WEATHER_LATITUDE"), defaults.latitude)?,
            parse_or("WEATHER_LONGITUDE", get("WEATHER_LONGITUDE"), defaults.longitude)?,
        );
        if !location.is_valid() {
            return Err(Error::Config(format!(
                "coordinates out of range: latitude {}, longitude {}",
                location.latitude, location.longitude
            )));
        }
        let fetch_timeout = Duration::from_millis(parse_or(
            "FETCH_TIMEOUT_MS",
            get("FETCH_TIMEOUT_MS"),
            10_000u64,
        )?);
        if fetch_timeout.is_zero() {
            return Err(Error::Config("FETCH_TIMEOUT_MS must be > 0".to_string()));
        }

        let poll_interval = Duration::from_millis(parse_or(
            "POLL_INTERVAL_MS",
            get("POLL_INTERVAL_MS"),
            2_000u64,
        )?);
        if poll_interval.is_zero() {
            return Err(Error::Config("POLL_INTERVAL_MS must be > 0".to_string()));
        }
        let poll_duration = match get("POLL_DURATION_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_value("POLL_DURATION_SECS", &raw)?)),
            None => None,
        };

        let sms_numbers = parse_csv(get("SMS_NUMBERS"));
        let email_addresses = parse_csv(get("EMAIL_ADDRESSES"));
        let webhook_url = get("NOTIFY_WEBHOOK_URL");

        let http_bind_addr = parse_or(
            "HTTP_BIND_ADDR",
            get("HTTP_BIND_ADDR"),
            SocketAddr::from(([127, 0, 0, 1], 3000)),
        )?;

        let cfg = Self {
            mode,
            weather_endpoint,
            location,
            fetch_timeout,
            poll_interval,
            poll_duration,
            sms_numbers,
            email_addresses,
            webhook_url,
            http_bind_addr,
        };

        if cfg.mode.polls() && cfg.channel_count() == 0 {
            return Err(Error::Config(
                "poll mode needs at least one of SMS_NUMBERS, EMAIL_ADDRESSES, NOTIFY_WEBHOOK_URL"
                    .to_string(),
            ));
        }

        Ok(cfg)
    }

    pub fn channel_count(&self) -> usize {
        self.sms_numbers.len() + self.email_addresses.len() + usize::from(self.webhook_url.is_some())
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: self.poll_interval,
            location: self.location,
        }
    }

    /// Instantiate the configured senders: SMS first, then email, then webhook.
    pub fn build_senders(&self) -> Result<Vec<Arc<dyn Sender>>> {
        let mut senders: Vec<Arc<dyn Sender>> = Vec::with_capacity(self.channel_count());
        for number in &self.sms_numbers {
            senders.push(Arc::new(SmsSender::new(number.clone())));
        }
        for address in &self.email_addresses {
            senders.push(Arc::new(EmailSender::new(address.clone())));
        }
        if let Some(url) = &self.webhook_url {
            senders.push(Arc::new(WebhookSender::new(url.clone(), self.fetch_timeout)?));
        }
        Ok(senders)
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| Error::Config(format!("{key}: invalid value {raw:?}: {e}")))
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

//! Periodic weather poller.
//!
//! Lifecycle: `Created -> Running -> Stopped`. `Stopped` is terminal: the
//! cancellation token is never reset, so a stopped poller cannot be restarted.
//! Fetch and delivery failures are logged per tick and never end the loop.

use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{Coordinates, WeatherSnapshot},
    notify::Sender,
    ports::WeatherSource,
    Error, Result,
};

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub location: Coordinates,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            location: Coordinates::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    Created,
    Running,
    Stopped,
}

impl PollerState {
    fn from_u8(v: u8) -> Self {
        match v {
            CREATED => Self::Created,
            RUNNING => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// Outcome of dispatching one snapshot to every sender.
#[derive(Debug, Default)]
pub struct TickReport {
    pub delivered: usize,
    /// `(channel, error)` for each sender that failed, in dispatch order.
    pub failures: Vec<(String, Error)>,
    /// Set when `stop()` cut the tick short; remaining senders were skipped.
    pub cancelled: bool,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Poller {
    cfg: PollerConfig,
    source: Arc<dyn WeatherSource>,
    senders: Vec<Arc<dyn Sender>>,
    cancel: CancellationToken,
    state: AtomicU8,
}

impl Poller {
    pub fn new(
        cfg: PollerConfig,
        source: Arc<dyn WeatherSource>,
        senders: Vec<Arc<dyn Sender>>,
    ) -> Result<Self> {
        if cfg.interval.is_zero() {
            return Err(Error::Config("poll interval must be > 0".to_string()));
        }
        Ok(Self {
            cfg,
            source,
            senders,
            cancel: CancellationToken::new(),
            state: AtomicU8::new(CREATED),
        })
    }

    pub fn state(&self) -> PollerState {
        PollerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Run the tick loop until `stop()` is called.
    ///
    /// The first tick fires one full interval after start. Returns immediately
    /// if the poller was already stopped; errors if it is already running.
    pub async fn start(&self) -> Result<()> {
        if let Err(prev) =
            self.state
                .compare_exchange(CREATED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
        {
            return match PollerState::from_u8(prev) {
                PollerState::Running => {
                    Err(Error::Lifecycle("poller is already running".to_string()))
                }
                _ => Ok(()),
            };
        }

        let period = self.cfg.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_ms = period.as_millis() as u64,
            senders = self.senders.len(),
            "poller started"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(report) if !report.is_clean() => {
                            tracing::warn!(
                                delivered = report.delivered,
                                failed = report.failures.len(),
                                "tick finished with delivery failures"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, "weather fetch failed, waiting for next tick");
                        }
                    }
                }
            }
        }

        self.state.store(STOPPED, Ordering::SeqCst);
        tracing::info!("poller stopped");
        Ok(())
    }

    /// Run `start()` on a background task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let poller = Arc::clone(self);
        tokio::spawn(async move { poller.start().await })
    }

    /// Signal the loop to exit. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
        // A poller that never ran goes straight to Stopped.
        let _ = self
            .state
            .compare_exchange(CREATED, STOPPED, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// One tick: fetch the configured location, then fan out to every sender.
    ///
    /// A `stop()` during the fetch abandons it and delivers nothing.
    pub async fn poll_once(&self) -> Result<TickReport> {
        let snapshot = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Ok(TickReport {
                    cancelled: true,
                    ..TickReport::default()
                });
            }
            res = self.source.fetch(self.cfg.location) => res?,
        };
        Ok(self.dispatch(&snapshot).await)
    }

    /// Deliver `snapshot` to every sender in registration order.
    ///
    /// A failing sender is logged and recorded; later senders still run.
    /// After `stop()` no further sender is invoked and an in-flight delivery is dropped.
    pub async fn dispatch(&self, snapshot: &WeatherSnapshot) -> TickReport {
        let mut report = TickReport::default();
        for sender in &self.senders {
            let channel = sender.channel();
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                res = sender.deliver(snapshot) => Some(res),
            };
            let Some(outcome) = outcome else {
                tracing::debug!(%channel, "stopped before delivery");
                report.cancelled = true;
                break;
            };
            match outcome {
                Ok(()) => {
                    tracing::debug!(%channel, "delivered");
                    report.delivered += 1;
                }
                Err(e) => {
                    tracing::warn!(%channel, error = %e, "delivery failed");
                    report.failures.push((channel, e));
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Map;
    use std::sync::{atomic::AtomicUsize, Mutex};

    struct FakeSource {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl FakeSource {
        fn ok() -> Arc<Self> {
            Self::failing_first(0)
        }

        fn failing_first(n: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_first: n,
            })
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn fetch(&self, _at: Coordinates) -> Result<WeatherSnapshot> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                return Err(Error::Fetch("connection refused".to_string()));
            }
            Ok(WeatherSnapshot {
                elevation: 216.0,
                hourly: Map::new(),
            })
        }
    }

    struct SlowSource {
        delay: Duration,
    }

    #[async_trait]
    impl WeatherSource for SlowSource {
        async fn fetch(&self, _at: Coordinates) -> Result<WeatherSnapshot> {
            tokio::time::sleep(self.delay).await;
            Ok(WeatherSnapshot {
                elevation: 216.0,
                hourly: Map::new(),
            })
        }
    }

    struct RecordingSender {
        name: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Sender for RecordingSender {
        fn channel(&self) -> String {
            self.name.to_string()
        }

        async fn deliver(&self, _snapshot: &WeatherSnapshot) -> Result<()> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(Error::delivery(self.name, "gateway unreachable"));
            }
            Ok(())
        }
    }

    fn sender(
        name: &'static str,
        fail: bool,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn Sender> {
        Arc::new(RecordingSender {
            name,
            fail,
            log: Arc::clone(log),
        })
    }

    fn poller(source: Arc<FakeSource>, senders: Vec<Arc<dyn Sender>>) -> Arc<Poller> {
        Arc::new(Poller::new(PollerConfig::default(), source, senders).unwrap())
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cfg = PollerConfig {
            interval: Duration::ZERO,
            ..PollerConfig::default()
        };
        assert!(matches!(
            Poller::new(cfg, FakeSource::ok(), Vec::new()),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_start_never_ticks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = poller(FakeSource::ok(), vec![sender("a", false, &log)]);

        p.stop();
        assert_eq!(p.state(), PollerState::Stopped);
        p.start().await.unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(p.state(), PollerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_tick_delivers_nothing() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = poller(FakeSource::ok(), vec![sender("a", false, &log)]);

        let handle = p.spawn();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(p.state(), PollerState::Running);
        p.stop();
        handle.await.unwrap().unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(p.state(), PollerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = poller(FakeSource::ok(), vec![sender("a", false, &log)]);

        let handle = p.spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;
        p.stop();
        p.stop();
        handle.await.unwrap().unwrap();
        p.stop();
        assert_eq!(p.state(), PollerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = poller(FakeSource::ok(), vec![sender("a", false, &log)]);

        let handle = p.spawn();
        tokio::time::sleep(Duration::from_millis(6_500)).await;
        p.stop();
        handle.await.unwrap().unwrap();

        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_while_running_is_rejected() {
        let p = poller(FakeSource::ok(), Vec::new());

        let handle = p.spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let err = p.start().await.unwrap_err();
        assert!(matches!(err, Error::Lifecycle(_)));

        p.stop();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_does_not_end_the_loop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let source = FakeSource::failing_first(1);
        let p = poller(source.clone(), vec![sender("a", false, &log)]);

        let handle = p.spawn();
        tokio::time::sleep(Duration::from_millis(4_500)).await;
        p.stop();
        handle.await.unwrap().unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_fetch_skips_delivery() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = Arc::new(
            Poller::new(
                PollerConfig::default(),
                Arc::new(SlowSource {
                    delay: Duration::from_secs(1),
                }),
                vec![sender("a", false, &log)],
            )
            .unwrap(),
        );

        let handle = p.spawn();
        // First tick at 2s; its fetch is still running at 2.5s.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        p.stop();
        handle.await.unwrap().unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(p.state(), PollerState::Stopped);
    }

    #[tokio::test]
    async fn stopped_poller_dispatches_to_nobody() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = poller(
            FakeSource::ok(),
            vec![sender("a", false, &log), sender("b", false, &log)],
        );
        let snapshot = WeatherSnapshot {
            elevation: 1.0,
            hourly: Map::new(),
        };

        p.stop();
        let report = p.dispatch(&snapshot).await;

        assert!(report.cancelled);
        assert_eq!(report.delivered, 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_sender_does_not_block_later_senders() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = poller(
            FakeSource::ok(),
            vec![
                sender("a", true, &log),
                sender("b", false, &log),
                sender("c", false, &log),
            ],
        );

        let report = p.poll_once().await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.cancelled);
        assert_eq!(report.failures[0].0, "a");
        assert!(matches!(report.failures[0].1, Error::Delivery { .. }));
    }

    #[tokio::test]
    async fn poll_once_surfaces_fetch_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let p = poller(FakeSource::failing_first(1), vec![sender("a", false, &log)]);

        assert!(matches!(p.poll_once().await, Err(Error::Fetch(_))));
        assert!(log.lock().unwrap().is_empty());
    }
}

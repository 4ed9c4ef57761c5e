use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use wnotify_core::{
    config::Config,
    poller::Poller,
    ports::{SystemClock, WeatherSource},
    weather::OpenMeteoClient,
};
use wnotify_http::AppState;

type Task = JoinHandle<wnotify_core::Result<()>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wnotify_core::logging::init("wnotify")?;

    let cfg = Config::load()?;
    tracing::info!(
        mode = ?cfg.mode,
        endpoint = %cfg.weather_endpoint,
        latitude = cfg.location.latitude,
        longitude = cfg.location.longitude,
        "wnotify starting"
    );

    let source: Arc<dyn WeatherSource> = Arc::new(OpenMeteoClient::new(
        cfg.weather_endpoint.clone(),
        cfg.fetch_timeout,
    )?);

    let shutdown = CancellationToken::new();
    watch_ctrl_c(shutdown.clone());

    let mut tasks: Vec<Task> = Vec::new();

    if cfg.mode.polls() {
        let senders = cfg.build_senders()?;
        tracing::info!(senders = senders.len(), "notification channels ready");
        let poller = Arc::new(Poller::new(cfg.poller_config(), source.clone(), senders)?);
        stop_poller_on(poller.clone(), shutdown.clone(), cfg.poll_duration);
        tasks.push(poller.spawn());
    }

    if cfg.mode.serves() {
        let listener = TcpListener::bind(cfg.http_bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", cfg.http_bind_addr))?;
        let state = AppState {
            source: source.clone(),
            clock: Arc::new(SystemClock),
            location: cfg.location,
        };
        tasks.push(tokio::spawn(wnotify_http::serve(
            listener,
            state,
            shutdown.clone(),
        )));
    }

    for task in tasks {
        task.await??;
    }

    tracing::info!("wnotify exited");
    Ok(())
}

fn watch_ctrl_c(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupt received, shutting down");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "cannot listen for ctrl-c"),
        }
    });
}

/// Stop the poller on shutdown, or once `limit` has elapsed when one is set.
fn stop_poller_on(poller: Arc<Poller>, shutdown: CancellationToken, limit: Option<Duration>) {
    tokio::spawn(async move {
        match limit {
            Some(limit) => {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = tokio::time::sleep(limit) => {
                        tracing::info!(secs = limit.as_secs(), "poll duration elapsed");
                    }
                }
            }
            None => shutdown.cancelled().await,
        }
        poller.stop();
    });
}

use tracing_subscriber::{fmt, EnvFilter};

use crate::Result;

/// Initialize tracing for the service.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init(service_name: &str) -> Result<()> {
    // Default: info everywhere.
    // Can be overridden with `RUST_LOG`.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,wnotify=info,wnotify_core=info,wnotify_http=info,{service_name}=info"
        ))
    });

    if let Err(e) = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
    {
        // A subscriber is already installed (tests, embedding); keep it.
        tracing::debug!(error = %e, "tracing subscriber already set");
    }

    Ok(())
}

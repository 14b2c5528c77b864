//! Request observation hook for the API client.
//!
//! The client never prints on its own; every request outcome is handed to a
//! [`RequestObserver`]. Binaries install [`TracingObserver`], the dashboard
//! forwards events into its console, tests use [`NoopObserver`] or a closure.

use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestEvent {
    Started {
        url: String,
    },
    Completed {
        url: String,
        status: u16,
        items: Option<usize>,
        elapsed: Duration,
    },
    Failed {
        url: String,
        status: Option<u16>,
        message: String,
    },
    PageFetched {
        path: String,
        offset: usize,
        items: usize,
    },
}

pub trait RequestObserver: Send + Sync {
    fn observe(&self, event: &RequestEvent);
}

impl<F> RequestObserver for F
where
    F: Fn(&RequestEvent) + Send + Sync,
{
    fn observe(&self, event: &RequestEvent) {
        self(event)
    }
}

pub type SharedObserver = Arc<dyn RequestObserver>;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn observe(&self, _event: &RequestEvent) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn observe(&self, event: &RequestEvent) {
        match event {
            RequestEvent::Started { url } => tracing::debug!(%url, "api request"),
            RequestEvent::Completed {
                url,
                status,
                items,
                elapsed,
            } => tracing::info!(
                %url,
                status,
                items = items.unwrap_or_default(),
                elapsed_ms = elapsed.as_millis() as u64,
                "api response"
            ),
            RequestEvent::Failed {
                url,
                status,
                message,
            } => tracing::warn!(%url, status = status.unwrap_or_default(), %message, "api error"),
            RequestEvent::PageFetched {
                path,
                offset,
                items,
            } => tracing::debug!(%path, offset, items, "page fetched"),
        }
    }
}

pub fn noop() -> SharedObserver {
    Arc::new(NoopObserver)
}

pub fn tracing_observer() -> SharedObserver {
    Arc::new(TracingObserver)
}

/// Install the tracing subscriber used by every binary.
/// `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

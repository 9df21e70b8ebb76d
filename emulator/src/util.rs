use std::any::Any;

use tracing_forest::ForestLayer;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Keeps the `tracing-profile` layer alive. The profile is flushed when the
/// guard is dropped, so bind it for the lifetime of `main`.
#[must_use = "dropping the guard ends profiling"]
pub struct LoggerGuard(Option<Box<dyn Any>>);

/// Initializes the global tracing subscriber.
///
/// The default `Level` is `INFO`. It can be overridden with `RUST_LOG`.
/// Calling it again once a subscriber is installed is a no-op.
pub fn init_logger() -> LoggerGuard {
    if cfg!(feature = "tracing-profile") || cfg!(feature = "perfetto") {
        use tracing_profile::init_tracing;
        LoggerGuard(
            init_tracing()
                .ok()
                .map(|guard| Box::new(guard) as Box<dyn Any>),
        )
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(ForestLayer::default())
            .try_init();
        LoggerGuard(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_twice() {
        let first = init_logger();
        let second = init_logger();
        tracing::info!("logger installed");
        // A second call installs nothing and holds nothing.
        assert!(second.0.is_none());
        drop(first);
    }
}

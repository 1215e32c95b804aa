//! UI-side collaborators: transient notifications and navigation.
//!
//! Both are fire-and-forget. Services call them after a store write settles
//! and never wait on or fail because of them.

use std::sync::Arc;
use std::time::Duration;

use crate::store::SharedStore;

/// How long confirmation messages stay visible.
pub const NOTIFY_DURATION: Duration = Duration::from_millis(2000);

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, duration: Duration);
}

pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
    fn go_back(&self);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, duration: Duration) {
        tracing::info!(duration_ms = duration.as_millis() as u64, "{}", message);
    }
}

/// Records navigation requests in the log without acting on them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn go_to(&self, path: &str) {
        tracing::debug!(path, "navigate");
    }

    fn go_back(&self) {
        tracing::debug!("navigate back");
    }
}

/// Everything a service needs, passed explicitly instead of reached for
/// globally.
#[derive(Clone)]
pub struct DiaryContext {
    pub store: SharedStore,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

impl DiaryContext {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            notifier: Arc::new(TracingNotifier),
            navigator: Arc::new(TracingNavigator),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub(crate) fn notify(&self, message: &str) {
        self.notifier.notify(message, NOTIFY_DURATION);
    }
}

//! Named publish/subscribe registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::event::payload::Arg;
use crate::observability::metrics;

/// Error a listener may return. It is logged and otherwise ignored.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

pub type ListenerResult = Result<(), ListenerError>;

type Listener = Box<dyn Fn(&[Arg]) -> ListenerResult + Send + Sync>;

/// Outcome of one `publish` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Listeners that returned `Ok`.
    pub delivered: usize,
    /// Listeners that returned `Err` or panicked.
    pub failed: usize,
}

/// Process-local event bus.
///
/// Listeners run synchronously on the publishing thread, in the order they
/// were registered.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<String, Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `event`.
    pub fn subscribe<F>(&mut self, event: impl AsRef<str>, listener: F)
    where
        F: Fn(&[Arg]) -> ListenerResult + Send + Sync + 'static,
    {
        self.listeners
            .entry(event.as_ref().to_string())
            .or_default()
            .push(Box::new(listener));
    }

    /// Invoke every listener registered for `event` with `args`.
    ///
    /// Publishing a name nobody subscribed to is a no-op.
    pub fn publish(&self, event: impl AsRef<str>, args: &[Arg]) -> PublishReport {
        let event = event.as_ref();
        let mut report = PublishReport::default();

        let Some(listeners) = self.listeners.get(event) else {
            return report;
        };

        metrics::record_event(event);

        for (index, listener) in listeners.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener(args))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    metrics::record_listener_failure(event);
                    tracing::error!(event, listener = index, error = %e, "Event listener failed");
                }
                Err(panic) => {
                    report.failed += 1;
                    metrics::record_listener_failure(event);
                    tracing::error!(
                        event,
                        listener = index,
                        panic = %panic_message(&*panic),
                        "Event listener panicked"
                    );
                }
            }
        }

        report
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: impl AsRef<str>) -> usize {
        self.listeners.get(event.as_ref()).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.values().all(Vec::is_empty)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .listeners
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

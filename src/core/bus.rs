//! Multicast dispatch of log events
//!
//! Listeners form an ordered set keyed by identity: registering the same
//! listener twice keeps a single entry. Dispatch walks a snapshot of the set
//! taken under the lock, so listeners may log, register or unregister from
//! inside a handler. Each listener runs inside its own panic boundary.

use crate::core::level::LogLevel;
use crate::core::logger::{panic_message, ErrorReport, Fallback};
use crate::core::template::format_template;
use crate::error::EasyLogError;
use std::fmt::{self, Display};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

/// Receiver of dispatched events
pub trait Listener: Send + Sync {
    fn on_message(&self, level: LogLevel, text: &str);

    fn on_exception(&self, report: &ErrorReport<'_>, stacktrace_level: Option<LogLevel>);

    fn name(&self) -> &str {
        "listener"
    }
}

fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

pub struct EventBus {
    listeners: Mutex<Vec<Arc<dyn Listener>>>,
    fallback: Fallback,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .snapshot()
            .iter()
            .map(|l| l.name().to_string())
            .collect();
        f.debug_struct("EventBus")
            .field("listeners", &names)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_fallback(Fallback::new())
    }

    /// Bus reporting listener panics and template errors to `fallback`
    pub fn with_fallback(fallback: Fallback) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            fallback,
        }
    }

    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    /// Add `listener` unless it is already registered. Returns whether it was
    /// added.
    pub fn register(&self, listener: Arc<dyn Listener>) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        tracing::debug!("listener {} registered", listener.name());
        listeners.push(listener);
        true
    }

    /// Remove `listener` if present. Returns whether it was removed.
    pub fn unregister(&self, listener: &Arc<dyn Listener>) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        let removed = listeners.len() != before;
        if removed {
            tracing::debug!("listener {} unregistered", listener.name());
        }
        removed
    }

    pub fn contains(&self, listener: &Arc<dyn Listener>) -> bool {
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.iter().any(|l| same_listener(l, listener))
    }

    pub fn len(&self) -> usize {
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<dyn Listener>> {
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.clone()
    }

    fn deliver<F>(&self, listener: &Arc<dyn Listener>, f: F)
    where
        F: FnOnce(&dyn Listener),
    {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))) {
            let error = EasyLogError::builder(format!(
                "listener {} panicked: {}",
                listener.name(),
                panic_message(&*payload)
            ));
            tracing::warn!("{}", error);
            self.fallback.report(&error);
        }
    }

    /// Deliver `text` at `level` to every listener in registration order.
    pub fn dispatch_message(&self, level: LogLevel, text: &str) {
        for listener in self.snapshot() {
            self.deliver(&listener, |l| l.on_message(level, text));
        }
    }

    /// Deliver an error to every listener in registration order.
    pub fn dispatch_exception(&self, report: &ErrorReport<'_>, stacktrace_level: Option<LogLevel>) {
        for listener in self.snapshot() {
            self.deliver(&listener, |l| l.on_exception(report, stacktrace_level));
        }
    }

    /// Substitute `args` into `template` and dispatch the result. A malformed
    /// template skips the dispatch and is reported to the fallback logger.
    pub fn dispatch_formatted(&self, level: LogLevel, template: &str, args: &[&dyn Display]) {
        match format_template(template, args) {
            Ok(text) => self.dispatch_message(level, &text),
            Err(e) => {
                tracing::debug!("dispatch skipped: {}", e);
                self.fallback.report(&e);
            }
        }
    }
}

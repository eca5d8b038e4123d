//! Callback-based publish/subscribe
//!
//! A plain map from event name to a set of listeners. Set membership is by
//! pointer identity of the listener's `Arc`, so registering the same
//! listener twice keeps a single entry and it fires once per emit.
//!
//! Listeners run on the emitting task after the table lock is released,
//! which lets a listener call `on`/`off` (or anything else on the manager)
//! without deadlocking.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Event listener
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Wrap a closure as a [`Listener`]
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Event subscription table
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event`
    ///
    /// Returns `false` when this exact listener was already registered.
    pub fn on(&self, event: &str, listener: Listener) -> bool {
        let mut table = self.listeners.write();
        let entry = table.entry(event.to_string()).or_default();

        if entry.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }

        entry.push(listener);
        true
    }

    /// Remove one listener, or every listener of `event` when `listener` is `None`
    pub fn off(&self, event: &str, listener: Option<&Listener>) {
        let mut table = self.listeners.write();

        match listener {
            Some(target) => {
                if let Some(entry) = table.get_mut(event) {
                    entry.retain(|l| !same_listener(l, target));
                    if entry.is_empty() {
                        table.remove(event);
                    }
                }
            }
            None => {
                table.remove(event);
            }
        }
    }

    /// Invoke every listener of `event` with `payload`
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        let snapshot: Vec<Listener> = match self.listeners.read().get(event) {
            Some(entry) => entry.clone(),
            None => return 0,
        };

        for listener in &snapshot {
            listener(payload);
        }

        snapshot.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Listener, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let l = listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (l, hits)
    }

    #[test]
    fn duplicate_registration_fires_once() {
        let bus = EventBus::new();
        let (l, hits) = counting();

        assert!(bus.on("tick", Arc::clone(&l)));
        assert!(!bus.on("tick", Arc::clone(&l)));

        assert_eq!(bus.emit("tick", &json!({})), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn off_without_listener_clears_event() {
        let bus = EventBus::new();
        let (a, hits_a) = counting();
        let (b, hits_b) = counting();
        bus.on("tick", a);
        bus.on("tick", b);

        bus.off("tick", None);

        assert_eq!(bus.listener_count("tick"), 0);
        assert_eq!(bus.emit("tick", &json!(1)), 0);
        assert_eq!(hits_a.load(Ordering::SeqCst), 0);
        assert_eq!(hits_b.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn off_with_listener_removes_only_that_one() {
        let bus = EventBus::new();
        let (a, hits_a) = counting();
        let (b, hits_b) = counting();
        bus.on("tick", Arc::clone(&a));
        bus.on("tick", b);

        bus.off("tick", Some(&a));
        bus.emit("tick", &json!(null));

        assert_eq!(hits_a.load(Ordering::SeqCst), 0);
        assert_eq!(hits_b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_unsubscribe_itself() {
        let bus = Arc::new(EventBus::new());
        let bus_ref = Arc::clone(&bus);
        bus.on(
            "once",
            listener(move |_| {
                bus_ref.off("once", None);
            }),
        );

        assert_eq!(bus.emit("once", &json!(null)), 1);
        assert_eq!(bus.emit("once", &json!(null)), 0);
    }
}

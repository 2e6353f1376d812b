//! Listener registry and event dispatch
//!
//! Listeners are stored behind an `RwLock` and dispatched from a snapshot, so
//! a callback may add or remove listeners (itself included) mid-dispatch.
//! A removed listener is never invoked again, even if it is still part of the
//! snapshot being walked.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, error, info};

use crate::filter::{self, Filter};
use crate::streaming::{Event, StreamControl};

/// Listener callback
pub type Callback = Box<dyn Fn(&Event) + Send + Sync>;

/// Identity of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

struct Listener {
    callback: Callback,
    filter: Option<Filter>,
    removed: AtomicBool,
}

/// Result of [`ListenerRegistry::insert`]
#[derive(Debug)]
pub struct Registration {
    pub disposer: Disposer,
    /// The registry was empty before this listener
    pub first: bool,
}

/// Counts from one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Listeners whose filter matched
    pub matched: usize,
    /// Matched listeners that panicked
    pub failed: usize,
}

/// The set of listeners attached to one stream
///
/// Adding a listener marks the stream active; removing the last one stops it.
pub struct ListenerRegistry {
    listeners: RwLock<BTreeMap<ListenerId, Arc<Listener>>>,
    next_id: AtomicU64,
    control: StreamControl,
}

impl ListenerRegistry {
    pub fn new(control: StreamControl) -> Arc<Self> {
        Arc::new(Self {
            listeners: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            control,
        })
    }

    /// The run/stop flag this registry drives
    pub fn control(&self) -> &StreamControl {
        &self.control
    }

    /// Register a listener
    pub fn insert(self: &Arc<Self>, callback: Callback, filter: Option<Filter>) -> Registration {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let listener = Arc::new(Listener {
            callback,
            filter,
            removed: AtomicBool::new(false),
        });

        let first = {
            let mut listeners = self.listeners.write();
            let first = listeners.is_empty();
            listeners.insert(id, listener);
            self.control.activate();
            first
        };
        debug!(listener = id.0, first, "Listener added");

        Registration {
            disposer: Disposer {
                registry: Arc::downgrade(self),
                id,
            },
            first,
        }
    }

    /// Remove a listener; false if it was already gone
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(listener) = listeners.remove(&id) else {
            return false;
        };
        listener.removed.store(true, Ordering::Release);
        debug!(listener = id.0, "Listener removed");

        if listeners.is_empty() {
            info!("Shutting down stream as there are no more listeners");
            self.control.stop();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Invoke every listener whose filter matches `event`
    ///
    /// A panicking callback is logged and counted; the remaining listeners
    /// still run.
    pub fn dispatch(&self, event: &Event) -> DispatchOutcome {
        let snapshot: Vec<(ListenerId, Arc<Listener>)> = self
            .listeners
            .read()
            .iter()
            .map(|(id, listener)| (*id, listener.clone()))
            .collect();

        let mut outcome = DispatchOutcome::default();
        for (id, listener) in snapshot {
            if listener.removed.load(Ordering::Acquire) {
                continue;
            }
            if !filter::matches(listener.filter.as_ref(), event) {
                continue;
            }

            outcome.matched += 1;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| (listener.callback)(event))) {
                outcome.failed += 1;
                error!(
                    listener = id.0,
                    "Uncaught error in listener: {}",
                    panic_message(panic.as_ref())
                );
            }
        }
        outcome
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .field("active", &self.control.state())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Removes one listener when disposed
///
/// Dropping a disposer does not remove the listener.
#[must_use = "dropping a Disposer leaves the listener registered forever"]
#[derive(Debug, Clone)]
pub struct Disposer {
    registry: Weak<ListenerRegistry>,
    id: ListenerId,
}

impl Disposer {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener; false if it was already removed
    pub fn dispose(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::ActiveState;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;

    fn event(value: Value) -> Event {
        Event::from_value(value).unwrap()
    }

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            count,
            Box::new(move |_: &Event| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_filtered_dispatch() {
        let registry = ListenerRegistry::new(StreamControl::new());
        let (all, cb_all) = counter();
        let (battery, cb_battery) = counter();

        let _a = registry.insert(cb_all, None);
        let _b = registry.insert(
            cb_battery,
            Filter::from_value(json!({"data": {"BatteryLevel": null}})),
        );

        registry.dispatch(&event(json!({"vin": "X", "data": {"BatteryLevel": 1}})));
        let outcome = registry.dispatch(&event(json!({"vin": "X", "state": "online"})));

        assert_eq!(outcome, DispatchOutcome { matched: 1, failed: 0 });
        assert_eq!(all.load(Ordering::SeqCst), 2);
        assert_eq!(battery.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_and_last_listener_drive_control() {
        let registry = ListenerRegistry::new(StreamControl::new());
        assert_eq!(registry.control().state(), ActiveState::Unset);

        let (_, cb1) = counter();
        let (_, cb2) = counter();
        let first = registry.insert(cb1, None);
        let second = registry.insert(cb2, None);
        assert!(first.first);
        assert!(!second.first);
        assert!(registry.control().is_active());

        assert!(first.disposer.dispose());
        assert!(registry.control().is_active());
        assert!(!first.disposer.dispose());

        assert!(second.disposer.dispose());
        assert!(registry.control().is_stopped());
        assert!(registry.is_empty());

        let (_, cb3) = counter();
        let again = registry.insert(cb3, None);
        assert!(again.first);
        assert!(registry.control().is_active());
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let registry = ListenerRegistry::new(StreamControl::new());
        let (count, cb) = counter();

        let _bad = registry.insert(Box::new(|_: &Event| panic!("listener exploded")), None);
        let _good = registry.insert(cb, None);

        let outcome = registry.dispatch(&event(json!({"n": 1})));
        assert_eq!(outcome, DispatchOutcome { matched: 2, failed: 1 });
        assert_eq!(count.load(Ordering::SeqCst), 1);

        registry.dispatch(&event(json!({"n": 2})));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reentrant_removal() {
        let registry = ListenerRegistry::new(StreamControl::new());
        let slots: Arc<Mutex<Vec<Disposer>>> = Arc::new(Mutex::new(Vec::new()));

        // First listener removes itself and the second one
        let s = slots.clone();
        let first_count = Arc::new(AtomicUsize::new(0));
        let fc = first_count.clone();
        let first = registry.insert(
            Box::new(move |_: &Event| {
                fc.fetch_add(1, Ordering::SeqCst);
                for disposer in s.lock().drain(..2) {
                    disposer.dispose();
                }
            }),
            None,
        );
        let (second_count, cb2) = counter();
        let second = registry.insert(cb2, None);
        let (third_count, cb3) = counter();
        let _third = registry.insert(cb3, None);
        slots.lock().extend([first.disposer, second.disposer]);

        let outcome = registry.dispatch(&event(json!({"n": 1})));
        assert_eq!(outcome.matched, 2);
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 0);
        assert_eq!(third_count.load(Ordering::SeqCst), 1);

        registry.dispatch(&event(json!({"n": 2})));
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(third_count.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_disposer_outlives_registry() {
        let registry = ListenerRegistry::new(StreamControl::new());
        let (_, cb) = counter();
        let registration = registry.insert(cb, None);
        drop(registry);
        assert!(!registration.disposer.dispose());
    }
}

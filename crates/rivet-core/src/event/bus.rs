use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, trace};

use super::executor::{Executor, Synchronous};
use crate::error::BoxError;

type Handler<E> = Arc<dyn Fn(&E) -> Result<(), BoxError> + Send + Sync>;
type ErasedHandler = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), BoxError> + Send + Sync>;

// =============================================================================
// Listener
// =============================================================================

/// A cloneable handle to an event callback.
///
/// Clones share identity: unsubscribing any clone removes a registration
/// made with any other clone.
pub struct Listener<E> {
    handler: Handler<E>,
}

impl<E> Listener<E> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(f),
        }
    }

    /// Invokes the callback directly, bypassing any bus.
    pub fn call(&self, event: &E) -> Result<(), BoxError> {
        (self.handler)(event)
    }

    /// Returns `true` if both handles refer to the same callback.
    pub fn same_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.handler) as *const () as usize
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<E> std::fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("event", &std::any::type_name::<E>())
            .field("id", &self.id())
            .finish()
    }
}

// =============================================================================
// EventBus
// =============================================================================

#[derive(Clone)]
struct Subscription {
    id: usize,
    event: &'static str,
    handler: ErasedHandler,
}

impl Subscription {
    fn new<E: Send + Sync + 'static>(listener: Listener<E>) -> Self {
        let id = listener.id();
        let handler: ErasedHandler = Arc::new(move |event: &(dyn Any + Send + Sync)| {
            match event.downcast_ref::<E>() {
                Some(event) => listener.call(event),
                None => Ok(()),
            }
        });
        Self {
            id,
            event: std::any::type_name::<E>(),
            handler,
        }
    }

    fn deliver(&self, event: &(dyn Any + Send + Sync)) {
        match catch_unwind(AssertUnwindSafe(|| (self.handler)(event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(event = self.event, error = %e, "Event listener failed");
            }
            Err(payload) => {
                error!(
                    event = self.event,
                    panic = panic_message(payload.as_ref()),
                    "Event listener panicked"
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

/// Routes published events to listeners registered for the event's type.
///
/// # Example
///
/// ```rust,ignore
/// struct PluginStarted { id: String }
///
/// let bus = EventBus::new();
/// let listener = bus.on(|e: &PluginStarted| {
///     println!("started {}", e.id);
///     Ok(())
/// });
/// bus.publish(PluginStarted { id: "greeter".into() });
/// bus.unsubscribe(&listener);
/// ```
pub struct EventBus {
    subscriptions: RwLock<HashMap<TypeId, Vec<Subscription>>>,
    executor: Arc<dyn Executor>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// A bus that delivers on the publishing thread.
    pub fn new() -> Self {
        Self::with_executor(Arc::new(Synchronous))
    }

    /// A bus that hands every delivery to `executor`.
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            executor,
        }
    }

    /// Registers `listener` for events of exactly type `E`.
    ///
    /// Subscribing the same listener twice registers it twice.
    pub fn subscribe<E: Send + Sync + 'static>(&self, listener: Listener<E>) {
        trace!(event = std::any::type_name::<E>(), "Subscribed listener");
        self.subscriptions
            .write()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Subscription::new(listener));
    }

    /// Subscribes a closure and returns its handle for later unsubscription.
    pub fn on<E, F>(&self, f: F) -> Listener<E>
    where
        E: Send + Sync + 'static,
        F: Fn(&E) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let listener = Listener::new(f);
        self.subscribe(listener.clone());
        listener
    }

    /// Removes one registration of `listener`. Returns `false` if it was not
    /// subscribed.
    pub fn unsubscribe<E: Send + Sync + 'static>(&self, listener: &Listener<E>) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let key = TypeId::of::<E>();
        let Some(list) = subscriptions.get_mut(&key) else {
            return false;
        };
        let Some(pos) = list.iter().position(|s| s.id == listener.id()) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            subscriptions.remove(&key);
        }
        true
    }

    /// Delivers `event` to every listener subscribed for `E`.
    ///
    /// The listener list is captured before delivery starts, so listeners
    /// added or removed meanwhile only affect later publishes.
    pub fn publish<E: Send + Sync + 'static>(&self, event: E) {
        let snapshot = match self.subscriptions.read().get(&TypeId::of::<E>()) {
            Some(list) => list.clone(),
            None => {
                trace!(event = std::any::type_name::<E>(), "No listeners for event");
                return;
            }
        };

        let event = Arc::new(event);
        for subscription in snapshot {
            let event = Arc::clone(&event);
            self.executor
                .execute(Box::new(move || subscription.deliver(&*event)));
        }
    }

    /// Number of registrations for `E`.
    pub fn listener_count<E: 'static>(&self) -> usize {
        self.subscriptions
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Drops every subscription for every event type.
    pub fn clear(&self) {
        self.subscriptions.write().clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscriptions = self.subscriptions.read();
        f.debug_struct("EventBus")
            .field("event_types", &subscriptions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TokioExecutor;
    use parking_lot::Mutex;
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(u32);

    struct Pong;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (Arc::clone(&log), log)
    }

    #[test]
    fn test_delivers_in_subscription_order() {
        let bus = EventBus::new();
        let (log, seen) = recorder();
        for name in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            bus.on(move |p: &Ping| {
                log.lock().push(format!("{name}{}", p.0));
                Ok(())
            });
        }

        bus.publish(Ping(1));
        assert_eq!(*seen.lock(), ["a1", "b1", "c1"]);
    }

    #[test]
    fn test_dispatch_is_by_exact_type() {
        let bus = EventBus::new();
        let (log, seen) = recorder();
        bus.on(move |_: &Pong| {
            log.lock().push("pong".into());
            Ok(())
        });

        bus.publish(Ping(1));
        bus.publish(7_u64);
        assert!(seen.lock().is_empty());

        bus.publish(Pong);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_publish_without_listeners_is_noop() {
        EventBus::new().publish(Ping(0));
    }

    #[test]
    fn test_failing_listener_does_not_stop_others() {
        let bus = EventBus::new();
        let (log, seen) = recorder();
        bus.on(|_: &Ping| Err("boom".into()));
        bus.on(move |_: &Ping| {
            log.lock().push("second".into());
            Ok(())
        });

        bus.publish(Ping(1));
        assert_eq!(*seen.lock(), ["second"]);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = EventBus::new();
        let (log, seen) = recorder();
        bus.on(|_: &Ping| -> Result<(), BoxError> { panic!("listener bug") });
        bus.on(move |_: &Ping| {
            log.lock().push("survivor".into());
            Ok(())
        });

        bus.publish(Ping(1));
        assert_eq!(*seen.lock(), ["survivor"]);
    }

    #[test]
    fn test_unsubscribe_removes_one_registration() {
        let bus = EventBus::new();
        let (log, seen) = recorder();
        let listener = Listener::new(move |_: &Ping| {
            log.lock().push("hit".into());
            Ok(())
        });
        bus.subscribe(listener.clone());
        bus.subscribe(listener.clone());
        assert_eq!(bus.listener_count::<Ping>(), 2);

        assert!(bus.unsubscribe(&listener));
        bus.publish(Ping(1));
        assert_eq!(seen.lock().len(), 1);

        assert!(bus.unsubscribe(&listener));
        assert!(!bus.unsubscribe(&listener));
        assert_eq!(bus.listener_count::<Ping>(), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_listener() {
        let bus = EventBus::new();
        bus.on(|_: &Ping| Ok(()));
        let stranger = Listener::new(|_: &Ping| Ok(()));
        assert!(!bus.unsubscribe(&stranger));
        assert_eq!(bus.listener_count::<Ping>(), 1);
    }

    #[test]
    fn test_subscribe_during_delivery_affects_next_publish_only() {
        let bus = Arc::new(EventBus::new());
        let (log, seen) = recorder();
        let inner = Arc::clone(&bus);
        bus.on(move |_: &Ping| {
            let log = Arc::clone(&log);
            inner.on(move |_: &Ping| {
                log.lock().push("late".into());
                Ok(())
            });
            Ok(())
        });

        bus.publish(Ping(1));
        assert!(seen.lock().is_empty());
        assert_eq!(bus.listener_count::<Ping>(), 2);

        bus.publish(Ping(2));
        assert_eq!(*seen.lock(), ["late"]);
    }

    #[test]
    fn test_listener_identity() {
        let a = Listener::new(|_: &Ping| Ok(()));
        let b = Listener::new(|_: &Ping| Ok(()));
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_executor_publish_returns_before_delivery() {
        let bus = EventBus::with_executor(Arc::new(TokioExecutor::current().unwrap()));
        let (go_tx, go_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<u32>();
        let go_rx = Mutex::new(go_rx);
        let done_tx = Mutex::new(done_tx);
        bus.on(move |p: &Ping| {
            go_rx.lock().recv()?;
            done_tx.lock().send(p.0)?;
            Ok(())
        });

        // Would deadlock if delivery ran on this thread.
        bus.publish(Ping(7));
        go_tx.send(()).unwrap();

        let got = tokio::task::spawn_blocking(move || done_rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_executor_isolates_failing_and_panicking_listeners() {
        let bus = EventBus::with_executor(Arc::new(TokioExecutor::current().unwrap()));
        let (done_tx, done_rx) = mpsc::channel::<u32>();
        let done_tx = Mutex::new(done_tx);
        bus.on(|_: &Ping| Err("boom".into()));
        bus.on(|_: &Ping| -> Result<(), BoxError> { panic!("listener bug") });
        bus.on(move |p: &Ping| {
            done_tx.lock().send(p.0)?;
            Ok(())
        });

        bus.publish(Ping(3));
        bus.publish(Ping(4));

        let mut got = tokio::task::spawn_blocking(move || {
            (0..2)
                .map(|_| done_rx.recv_timeout(Duration::from_secs(5)).unwrap())
                .collect::<Vec<_>>()
        })
        .await
        .unwrap();
        got.sort();
        assert_eq!(got, [3, 4]);
    }
}

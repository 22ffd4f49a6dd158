//! Typed publish/subscribe bus.
//!
//! One channel per payload type, shared: repeated `get_event` calls for
//! the same type hand back the same channel. Delivery is synchronous and
//! in subscription order on the publisher's thread, except for
//! subscribers that asked to run on the UI context, which are posted to
//! the `UiDispatcher` fire-and-forget. A panicking subscriber never
//! blocks delivery to the ones after it; the failure lands in the
//! `PublishOutcome`.

use std::any::{Any, TypeId};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::dispatcher::UiDispatcher;

pub type SubscriptionToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadAffinity {
    /// Run inline on whichever thread publishes.
    Publisher,
    /// Marshal onto the UI-affine context; publish does not wait.
    Ui,
}

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;
type Filter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

struct Subscription<T> {
    token: SubscriptionToken,
    affinity: ThreadAffinity,
    filter: Option<Filter<T>>,
    handler: Handler<T>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            affinity: self.affinity,
            filter: self.filter.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

#[derive(Debug)]
pub struct SubscriberFailure {
    pub token: SubscriptionToken,
    pub reason: String,
}

/// What a publish call observed: inline deliveries, fire-and-forget
/// marshals, and isolated subscriber failures.
#[derive(Debug, Default)]
pub struct PublishOutcome {
    pub delivered: usize,
    pub marshaled: usize,
    pub failures: Vec<SubscriberFailure>,
}

impl PublishOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct PubSubEvent<T> {
    subscriptions: Mutex<Vec<Subscription<T>>>,
    next_token: AtomicU64,
    dispatcher: Arc<Mutex<Option<UiDispatcher>>>,
}

impl<T: Clone + Send + 'static> PubSubEvent<T> {
    fn new(dispatcher: Arc<Mutex<Option<UiDispatcher>>>) -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
            dispatcher,
        }
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionToken {
        self.push(ThreadAffinity::Publisher, None, Arc::new(handler))
    }

    pub fn subscribe_filtered(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        self.push(
            ThreadAffinity::Publisher,
            Some(Arc::new(filter)),
            Arc::new(handler),
        )
    }

    pub fn subscribe_on_ui(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionToken {
        self.push(ThreadAffinity::Ui, None, Arc::new(handler))
    }

    /// Removes exactly the matching subscription. Publishing afterwards
    /// never invokes the removed handler.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subs = lock(&self.subscriptions);
        let before = subs.len();
        subs.retain(|sub| sub.token != token);
        subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscriptions).len()
    }

    pub fn publish(&self, payload: &T) -> PublishOutcome {
        // Snapshot so handlers may subscribe/unsubscribe reentrantly.
        let snapshot: Vec<Subscription<T>> = lock(&self.subscriptions).clone();
        let mut outcome = PublishOutcome::default();

        for sub in snapshot {
            if let Some(filter) = &sub.filter {
                if !filter(payload) {
                    continue;
                }
            }

            match sub.affinity {
                ThreadAffinity::Publisher => {
                    let handler = Arc::clone(&sub.handler);
                    match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                        Ok(()) => outcome.delivered += 1,
                        Err(panic) => {
                            let reason = panic_reason(panic);
                            warn!(token = sub.token, reason = %reason, "subscriber panicked during publish");
                            outcome.failures.push(SubscriberFailure {
                                token: sub.token,
                                reason,
                            });
                        }
                    }
                }
                ThreadAffinity::Ui => {
                    let dispatcher = lock(&self.dispatcher).clone();
                    match dispatcher {
                        Some(dispatcher) => {
                            let handler = Arc::clone(&sub.handler);
                            let payload = payload.clone();
                            if dispatcher.post(move || handler(&payload)) {
                                outcome.marshaled += 1;
                            } else {
                                outcome.failures.push(SubscriberFailure {
                                    token: sub.token,
                                    reason: "ui task pump is gone".to_string(),
                                });
                            }
                        }
                        None => {
                            outcome.failures.push(SubscriberFailure {
                                token: sub.token,
                                reason: "no ui dispatcher attached".to_string(),
                            });
                        }
                    }
                }
            }
        }

        outcome
    }

    fn push(
        &self,
        affinity: ThreadAffinity,
        filter: Option<Filter<T>>,
        handler: Handler<T>,
    ) -> SubscriptionToken {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        lock(&self.subscriptions).push(Subscription {
            token,
            affinity,
            filter,
            handler,
        });
        debug!(token, ?affinity, "subscription added");
        token
    }
}

pub struct EventAggregator {
    channels: Mutex<FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    dispatcher: Arc<Mutex<Option<UiDispatcher>>>,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(FxHashMap::default()),
            dispatcher: Arc::new(Mutex::new(None)),
        }
    }

    /// Hands UI-affinity subscribers somewhere to run. Without this,
    /// publishes to such subscribers report failures instead of silently
    /// dropping them.
    pub fn attach_ui_dispatcher(&self, dispatcher: UiDispatcher) {
        *lock(&self.dispatcher) = Some(dispatcher);
    }

    /// The singleton channel for payload type `T`.
    pub fn get_event<T: Clone + Send + 'static>(&self) -> Arc<PubSubEvent<T>> {
        let mut channels = lock(&self.channels);
        if let Some(existing) = channels.get(&TypeId::of::<T>()) {
            if let Ok(event) = Arc::clone(existing).downcast::<PubSubEvent<T>>() {
                return event;
            }
        }

        let event = Arc::new(PubSubEvent::<T>::new(Arc::clone(&self.dispatcher)));
        channels.insert(
            TypeId::of::<T>(),
            Arc::clone(&event) as Arc<dyn Any + Send + Sync>,
        );
        event
    }
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<'a, V>(mutex: &'a Mutex<V>) -> std::sync::MutexGuard<'a, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_reason(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "subscriber panicked".to_string()
    }
}

//! Property-change notification primitives.
//!
//! `ChangeNotifier` is the object-level change source every stateful
//! engine object builds on; `Property<T>` is a shared slot that reports
//! through one. A set that does not change the value never notifies,
//! which keeps binding chains loop-free.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type ListenerId = u64;

type Listener = Rc<dyn Fn(&str)>;

pub struct ChangeNotifier {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<ListenerId>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&str) + 'static) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Notifies every listener that `property` changed. The listener list
    /// is snapshotted first so a listener may subscribe or unsubscribe
    /// without poisoning the iteration.
    pub fn notify(&self, property: &str) {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener(property);
        }
    }

    /// Writes `value` into `slot` and notifies only when the value
    /// actually differs. Returns whether a change occurred.
    pub fn set_property<T: PartialEq>(&self, slot: &mut T, value: T, property: &str) -> bool {
        if *slot == value {
            return false;
        }
        *slot = value;
        self.notify(property);
        true
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

struct PropertyInner<T> {
    name: &'static str,
    value: RefCell<T>,
    notifier: Rc<ChangeNotifier>,
}

/// A named value slot reporting changes through its owner's notifier.
/// Clones share the same slot.
pub struct Property<T> {
    inner: Rc<PropertyInner<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq> Property<T> {
    pub fn new(notifier: &Rc<ChangeNotifier>, name: &'static str, initial: T) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                name,
                value: RefCell::new(initial),
                notifier: Rc::clone(notifier),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn notifier(&self) -> &Rc<ChangeNotifier> {
        &self.inner.notifier
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Equality-gated set. Listeners run after the borrow is released so
    /// they may read the property back.
    pub fn set(&self, value: T) -> bool {
        {
            let mut slot = self.inner.value.borrow_mut();
            if *slot == value {
                return false;
            }
            *slot = value;
        }
        self.inner.notifier.notify(self.inner.name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_set_property_unchanged_never_notifies() {
        let notifier = ChangeNotifier::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        notifier.subscribe(move |_| seen.set(seen.get() + 1));

        let mut value = 5;
        assert!(!notifier.set_property(&mut value, 5, "value"));
        assert_eq!(count.get(), 0);
        assert_eq!(value, 5);
    }

    #[test]
    fn test_set_property_changed_notifies_once() {
        let notifier = ChangeNotifier::new();
        let names = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&names);
        notifier.subscribe(move |name| seen.borrow_mut().push(name.to_string()));

        let mut value = 5;
        assert!(notifier.set_property(&mut value, 7, "value"));
        assert_eq!(value, 7);
        assert_eq!(*names.borrow(), vec!["value".to_string()]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier = ChangeNotifier::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let id = notifier.subscribe(move |_| seen.set(seen.get() + 1));

        notifier.notify("a");
        assert!(notifier.unsubscribe(id));
        notifier.notify("a");
        assert_eq!(count.get(), 1);
        assert!(!notifier.unsubscribe(id));
    }

    #[test]
    fn test_property_shares_value_across_clones() {
        let notifier = Rc::new(ChangeNotifier::new());
        let prop = Property::new(&notifier, "title", String::from("a"));
        let alias = prop.clone();

        assert!(prop.set(String::from("b")));
        assert_eq!(alias.get(), "b");
        assert!(!alias.set(String::from("b")));
    }

    #[test]
    fn test_property_set_notifies_with_name() {
        let notifier = Rc::new(ChangeNotifier::new());
        let prop = Property::new(&notifier, "enabled", false);
        let names = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&names);
        notifier.subscribe(move |name| seen.borrow_mut().push(name.to_string()));

        prop.set(true);
        prop.set(true);
        prop.set(false);
        assert_eq!(*names.borrow(), vec!["enabled", "enabled"]);
    }

    #[test]
    fn test_listener_can_read_property_during_notification() {
        let notifier = Rc::new(ChangeNotifier::new());
        let prop = Property::new(&notifier, "count", 0);
        let observed = Rc::new(Cell::new(-1));

        let reader = prop.clone();
        let sink = Rc::clone(&observed);
        notifier.subscribe(move |_| sink.set(reader.get()));

        prop.set(42);
        assert_eq!(observed.get(), 42);
    }
}

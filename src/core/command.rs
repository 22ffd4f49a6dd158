//! Delegate commands: executable actions with observable enablement.
//!
//! A `DelegateCommand` pairs an execute delegate with a can-execute
//! predicate. Enablement changes are observable, and can be driven from
//! property-change notifications so the UI re-queries exactly when the
//! backing state moves.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::notify::{ChangeNotifier, ListenerId, Property};

/// Shared enablement-change source. Held by the command and captured by
/// the notifier listeners it installs.
struct EnablementSource {
    listeners: RefCell<Vec<(u64, Rc<dyn Fn()>)>>,
    next_id: Cell<u64>,
}

impl EnablementSource {
    fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    fn subscribe(&self, f: impl Fn() + 'static) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(f)));
        id
    }

    fn unsubscribe(&self, id: u64) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }

    fn raise(&self) {
        let snapshot: Vec<Rc<dyn Fn()>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for f in snapshot {
            f();
        }
    }
}

struct Observation {
    notifier: Rc<ChangeNotifier>,
    property: String,
    listener: ListenerId,
}

pub struct DelegateCommand<P = ()> {
    on_execute: Box<dyn Fn(&P)>,
    on_can_execute: Box<dyn Fn(&P) -> bool>,
    enablement: Rc<EnablementSource>,
    // observe_can_execute binding; short-circuits the predicate
    bound: RefCell<Option<Property<bool>>>,
    observations: RefCell<Vec<Observation>>,
}

impl<P> DelegateCommand<P> {
    /// A command that is always executable.
    pub fn new(execute: impl Fn(&P) + 'static) -> Self {
        Self::with_can_execute(execute, |_| true)
    }

    pub fn with_can_execute(
        execute: impl Fn(&P) + 'static,
        can_execute: impl Fn(&P) -> bool + 'static,
    ) -> Self {
        Self {
            on_execute: Box::new(execute),
            on_can_execute: Box::new(can_execute),
            enablement: Rc::new(EnablementSource::new()),
            bound: RefCell::new(None),
            observations: RefCell::new(Vec::new()),
        }
    }

    pub fn can_execute(&self, parameter: &P) -> bool {
        if let Some(bound) = self.bound.borrow().as_ref() {
            return bound.get();
        }
        (self.on_can_execute)(parameter)
    }

    /// Runs the execute delegate only while enabled. Executing a disabled
    /// command is a no-op, not an error.
    pub fn execute(&self, parameter: &P) {
        if !self.can_execute(parameter) {
            return;
        }
        (self.on_execute)(parameter);
    }

    pub fn on_can_execute_changed(&self, f: impl Fn() + 'static) -> u64 {
        self.enablement.subscribe(f)
    }

    pub fn remove_can_execute_listener(&self, id: u64) {
        self.enablement.unsubscribe(id);
    }

    /// Safe to call redundantly; simply re-raises the change event.
    pub fn raise_can_execute_changed(&self) {
        self.enablement.raise();
    }

    /// Re-raises the enablement change whenever `property` on `notifier`
    /// changes. Observing the same property twice installs one listener,
    /// so each change event raises at most once.
    pub fn observe_property(&self, notifier: &Rc<ChangeNotifier>, property: &str) {
        let already = self
            .observations
            .borrow()
            .iter()
            .any(|obs| Rc::ptr_eq(&obs.notifier, notifier) && obs.property == property);
        if already {
            return;
        }

        let source = Rc::clone(&self.enablement);
        let name = property.to_string();
        let listener = notifier.subscribe(move |changed| {
            if changed == name {
                source.raise();
            }
        });
        self.observations.borrow_mut().push(Observation {
            notifier: Rc::clone(notifier),
            property: property.to_string(),
            listener,
        });
    }

    /// Binds enablement directly to a boolean property. The custom
    /// can-execute predicate is bypassed while bound.
    pub fn observe_can_execute(&self, property: &Property<bool>) {
        self.observe_property(property.notifier(), property.name());
        *self.bound.borrow_mut() = Some(property.clone());
    }
}

impl DelegateCommand<()> {
    pub fn run(&self) {
        self.execute(&());
    }

    pub fn is_enabled(&self) -> bool {
        self.can_execute(&())
    }
}

impl<P> Drop for DelegateCommand<P> {
    fn drop(&mut self) {
        // The command owns its observations; tear them down so the
        // notifier never calls into a dead command.
        for obs in self.observations.borrow().iter() {
            obs.notifier.unsubscribe(obs.listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_while_disabled_is_noop() {
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        let cmd =
            DelegateCommand::with_can_execute(move |_: &()| sink.set(sink.get() + 1), |_| false);

        cmd.run();
        assert_eq!(hits.get(), 0);
        assert!(!cmd.is_enabled());
    }

    #[test]
    fn test_execute_runs_while_enabled() {
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        let cmd = DelegateCommand::new(move |_: &()| sink.set(sink.get() + 1));

        cmd.run();
        cmd.run();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_parameterized_can_execute() {
        let cmd: DelegateCommand<i32> = DelegateCommand::with_can_execute(|_| {}, |n: &i32| *n > 0);
        assert!(cmd.can_execute(&1));
        assert!(!cmd.can_execute(&0));
    }

    #[test]
    fn test_observed_toggle_raises_once_per_change() {
        let notifier = Rc::new(ChangeNotifier::new());
        let busy = Property::new(&notifier, "busy", false);

        let cmd = DelegateCommand::new(|_: &()| {});
        cmd.observe_property(&notifier, "busy");

        let raised = Rc::new(Cell::new(0));
        let sink = Rc::clone(&raised);
        cmd.on_can_execute_changed(move || sink.set(sink.get() + 1));

        busy.set(true);
        busy.set(false);
        assert_eq!(raised.get(), 2);

        // Unchanged set does not notify and so does not raise.
        busy.set(false);
        assert_eq!(raised.get(), 2);
    }

    #[test]
    fn test_observe_same_property_twice_installs_one_listener() {
        let notifier = Rc::new(ChangeNotifier::new());
        let busy = Property::new(&notifier, "busy", false);

        let cmd = DelegateCommand::new(|_: &()| {});
        cmd.observe_property(&notifier, "busy");
        cmd.observe_property(&notifier, "busy");

        let raised = Rc::new(Cell::new(0));
        let sink = Rc::clone(&raised);
        cmd.on_can_execute_changed(move || sink.set(sink.get() + 1));

        busy.set(true);
        assert_eq!(raised.get(), 1);
    }

    #[test]
    fn test_other_property_change_does_not_raise() {
        let notifier = Rc::new(ChangeNotifier::new());
        let cmd = DelegateCommand::new(|_: &()| {});
        cmd.observe_property(&notifier, "busy");

        let raised = Rc::new(Cell::new(0));
        let sink = Rc::clone(&raised);
        cmd.on_can_execute_changed(move || sink.set(sink.get() + 1));

        notifier.notify("title");
        assert_eq!(raised.get(), 0);
    }

    #[test]
    fn test_observe_can_execute_binds_enablement() {
        let notifier = Rc::new(ChangeNotifier::new());
        let enabled = Property::new(&notifier, "enabled", false);

        // Custom predicate says yes; the bound property overrides it.
        let cmd = DelegateCommand::with_can_execute(|_: &()| {}, |_| true);
        cmd.observe_can_execute(&enabled);
        assert!(!cmd.is_enabled());

        enabled.set(true);
        assert!(cmd.is_enabled());
    }

    #[test]
    fn test_raise_can_execute_changed_is_redundantly_callable() {
        let cmd = DelegateCommand::new(|_: &()| {});
        cmd.raise_can_execute_changed();

        let raised = Rc::new(Cell::new(0));
        let sink = Rc::clone(&raised);
        let id = cmd.on_can_execute_changed(move || sink.set(sink.get() + 1));

        cmd.raise_can_execute_changed();
        cmd.raise_can_execute_changed();
        assert_eq!(raised.get(), 2);

        cmd.remove_can_execute_listener(id);
        cmd.raise_can_execute_changed();
        assert_eq!(raised.get(), 2);
    }

    #[test]
    fn test_drop_detaches_observations() {
        let notifier = Rc::new(ChangeNotifier::new());
        {
            let cmd = DelegateCommand::new(|_: &()| {});
            cmd.observe_property(&notifier, "busy");
            assert_eq!(notifier.listener_count(), 1);
        }
        assert_eq!(notifier.listener_count(), 0);
    }
}

//! Convention-based view to view-model pairing.
//!
//! The convention is a pure string transformation computed up front, not
//! reflection: strip a trailing `View` from the type name's leaf segment
//! and append `ViewModel`, keeping the module path. An explicit mapping
//! table covers the views the convention cannot reach.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::view::ViewModel;
use crate::core::container::{Container, ResolveError};
use crate::regions::ViewKey;

/// Derives the conventional view-model name for a view type name.
///
/// `settings::SettingsView` becomes `settings::SettingsViewModel`; a leaf
/// without the `View` suffix still gets `ViewModel` appended.
pub fn view_model_name(view_name: &str) -> String {
    let (path, leaf) = match view_name.rsplit_once("::") {
        Some((path, leaf)) => (Some(path), leaf),
        None => (None, view_name),
    };
    let stem = leaf.strip_suffix("View").unwrap_or(leaf);
    match path {
        Some(path) => format!("{}::{}ViewModel", path, stem),
        None => format!("{}ViewModel", stem),
    }
}

pub struct ViewModelResolver {
    overrides: RefCell<FxHashMap<String, String>>,
    bindings: RefCell<FxHashMap<ViewKey, Rc<dyn ViewModel>>>,
}

impl ViewModelResolver {
    pub fn new() -> Self {
        Self {
            overrides: RefCell::new(FxHashMap::default()),
            bindings: RefCell::new(FxHashMap::default()),
        }
    }

    /// Registers an explicit view -> view-model mapping consulted when
    /// the convention finds nothing.
    pub fn register_mapping(&self, view_name: &str, view_model_name: &str) {
        self.overrides
            .borrow_mut()
            .insert(view_name.to_string(), view_model_name.to_string());
    }

    /// Convention first, explicit mapping second. The error names the
    /// conventional candidate so a typo is visible in the message.
    pub fn resolve(
        &self,
        container: &Container,
        view_name: &str,
    ) -> Result<Rc<dyn ViewModel>, ResolveError> {
        let conventional = view_model_name(view_name);
        if container.has_view_model(&conventional) {
            debug!(view = view_name, view_model = %conventional, "resolved by convention");
            return container.create_view_model(&conventional);
        }

        if let Some(mapped) = self.overrides.borrow().get(view_name) {
            debug!(view = view_name, view_model = %mapped, "resolved by explicit mapping");
            return container.create_view_model(mapped);
        }

        Err(ResolveError::ViewModelNotRegistered(conventional))
    }

    /// Associates a materialized view with its view-model, exactly once.
    pub fn bind(&self, key: ViewKey, view_model: Rc<dyn ViewModel>) -> Result<(), ResolveError> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(&key) {
            return Err(ResolveError::AlreadyBound(format!("{:?}", key)));
        }
        bindings.insert(key, view_model);
        Ok(())
    }

    pub fn binding(&self, key: ViewKey) -> Option<Rc<dyn ViewModel>> {
        self.bindings.borrow().get(&key).cloned()
    }

    /// Drops the association when a view leaves its region.
    pub fn release(&self, key: ViewKey) {
        self.bindings.borrow_mut().remove(&key);
    }
}

impl Default for ViewModelResolver {
    fn default() -> Self {
        Self::new()
    }
}

//! A region: a named logical surface holding views.
//!
//! Views live in a slotmap; `order` preserves insertion order and
//! `active` preserves activation order. Single-active regions keep at
//! most one view active and fall back to activation history when the
//! active view is removed.

use std::any::Any;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::core::container::ResolveError;
use crate::views::View;

new_key_type! {
    pub struct ViewKey;
}

pub type Result<T> = std::result::Result<T, RegionError>;

#[derive(Debug)]
pub enum RegionError {
    RegionNotFound(String),
    ViewNotFound { region: String },
    AlreadyAttached(String),
    Materialize { region: String, failed: Vec<ResolveError> },
}

impl std::fmt::Display for RegionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionError::RegionNotFound(name) => write!(f, "Region not found: {}", name),
            RegionError::ViewNotFound { region } => {
                write!(f, "View not found in region: {}", region)
            }
            RegionError::AlreadyAttached(name) => {
                write!(f, "Region already attached: {}", name)
            }
            RegionError::Materialize { region, failed } => write!(
                f,
                "{} view(s) failed to materialize in region {}",
                failed.len(),
                region
            ),
        }
    }
}

impl std::error::Error for RegionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionBehavior {
    /// Content-style: at most one active view.
    SingleActive,
    /// List-style: any number of simultaneously active views.
    MultiActive,
}

pub struct Region {
    name: String,
    behavior: RegionBehavior,
    views: SlotMap<ViewKey, Box<dyn View>>,
    order: Vec<ViewKey>,
    active: Vec<ViewKey>,
    history: Vec<ViewKey>,
    context: FxHashMap<String, Box<dyn Any>>,
}

impl Region {
    pub fn new(name: &str, behavior: RegionBehavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            views: SlotMap::with_key(),
            order: Vec::new(),
            active: Vec::new(),
            history: Vec::new(),
            context: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn behavior(&self) -> RegionBehavior {
        self.behavior
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: ViewKey) -> bool {
        self.views.contains_key(key)
    }

    /// Appends a view to the sequence, optionally activating it.
    pub fn add(&mut self, view: Box<dyn View>, activate: bool) -> ViewKey {
        let key = self.views.insert(view);
        self.order.push(key);
        if activate {
            self.mark_active(key);
        }
        key
    }

    pub fn activate(&mut self, key: ViewKey) -> Result<()> {
        if !self.views.contains_key(key) {
            return Err(RegionError::ViewNotFound {
                region: self.name.clone(),
            });
        }
        self.mark_active(key);
        Ok(())
    }

    pub fn deactivate(&mut self, key: ViewKey) -> Result<()> {
        if !self.views.contains_key(key) {
            return Err(RegionError::ViewNotFound {
                region: self.name.clone(),
            });
        }
        self.active.retain(|k| *k != key);
        Ok(())
    }

    /// Removes a view from the region, deactivating it first. In a
    /// single-active region, removing the sole active view re-activates
    /// the most recent surviving entry of the activation history.
    pub fn remove(&mut self, key: ViewKey) -> Result<Box<dyn View>> {
        let view = self.views.remove(key).ok_or_else(|| RegionError::ViewNotFound {
            region: self.name.clone(),
        })?;

        let was_active = self.active.contains(&key);
        self.active.retain(|k| *k != key);
        self.order.retain(|k| *k != key);
        self.history.retain(|k| *k != key);

        if was_active
            && self.behavior == RegionBehavior::SingleActive
            && self.active.is_empty()
        {
            if let Some(&previous) = self.history.last() {
                self.active.push(previous);
            }
        }

        Ok(view)
    }

    /// Active view keys in activation order.
    pub fn active_views(&self) -> &[ViewKey] {
        &self.active
    }

    /// The single active view of a single-active region, if any.
    pub fn sole_active(&self) -> Option<ViewKey> {
        match self.behavior {
            RegionBehavior::SingleActive => self.active.first().copied(),
            RegionBehavior::MultiActive => None,
        }
    }

    pub fn is_active(&self, key: ViewKey) -> bool {
        self.active.contains(&key)
    }

    /// View keys in insertion order.
    pub fn keys_in_order(&self) -> impl Iterator<Item = ViewKey> + '_ {
        self.order.iter().copied()
    }

    pub fn view(&self, key: ViewKey) -> Option<&dyn View> {
        self.views.get(key).map(|v| v.as_ref())
    }

    pub fn view_mut(&mut self, key: ViewKey) -> Option<&mut (dyn View + 'static)> {
        match self.views.get_mut(key) {
            Some(view) => Some(view.as_mut()),
            None => None,
        }
    }

    /// First view (in insertion order) whose name matches.
    pub fn find_by_name(&self, name: &str) -> Option<ViewKey> {
        self.order
            .iter()
            .copied()
            .find(|&key| self.views.get(key).is_some_and(|v| v.name() == name))
    }

    pub fn set_context<V: Any>(&mut self, key: &str, value: V) {
        self.context.insert(key.to_string(), Box::new(value));
    }

    pub fn context<V: Any>(&self, key: &str) -> Option<&V> {
        self.context.get(key)?.downcast_ref::<V>()
    }

    fn mark_active(&mut self, key: ViewKey) {
        if self.active.contains(&key) {
            return;
        }
        if self.behavior == RegionBehavior::SingleActive {
            // The previous active view stays in the region, just inactive.
            self.active.clear();
        }
        self.active.push(key);
        self.history.retain(|k| *k != key);
        self.history.push(key);
    }
}

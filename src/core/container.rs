//! The dependency container collaborator.
//!
//! The engine treats resolution as a black box: typed singleton services
//! plus string-keyed factories for views and view-models. Anything more
//! elaborate (scoped lifetimes, decorators) lives behind this surface and
//! is none of the engine's business.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::views::{View, ViewModel};

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug)]
pub enum ResolveError {
    ServiceAlreadyRegistered(&'static str),
    ViewNotRegistered(String),
    ViewModelNotRegistered(String),
    AlreadyBound(String),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::ServiceAlreadyRegistered(name) => {
                write!(f, "Service already registered: {}", name)
            }
            ResolveError::ViewNotRegistered(name) => write!(f, "View not registered: {}", name),
            ResolveError::ViewModelNotRegistered(name) => {
                write!(f, "View model not registered: {}", name)
            }
            ResolveError::AlreadyBound(name) => {
                write!(f, "View already bound to a view model: {}", name)
            }
        }
    }
}

impl std::error::Error for ResolveError {}

type ViewFactory = Rc<dyn Fn() -> Box<dyn View>>;
type ViewModelFactory = Rc<dyn Fn() -> Rc<dyn ViewModel>>;

pub struct Container {
    services: RefCell<FxHashMap<TypeId, Rc<dyn Any>>>,
    view_factories: RefCell<FxHashMap<String, ViewFactory>>,
    view_model_factories: RefCell<FxHashMap<String, ViewModelFactory>>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: RefCell::new(FxHashMap::default()),
            view_factories: RefCell::new(FxHashMap::default()),
            view_model_factories: RefCell::new(FxHashMap::default()),
        }
    }

    /// Registers a singleton service instance keyed by its type.
    pub fn register_instance<S: Any>(&self, service: S) -> Result<()> {
        let type_id = TypeId::of::<S>();
        let mut services = self.services.borrow_mut();
        if services.contains_key(&type_id) {
            return Err(ResolveError::ServiceAlreadyRegistered(
                std::any::type_name::<S>(),
            ));
        }
        services.insert(type_id, Rc::new(service));
        Ok(())
    }

    pub fn resolve<S: Any>(&self) -> Option<Rc<S>> {
        let service = self.services.borrow().get(&TypeId::of::<S>())?.clone();
        service.downcast::<S>().ok()
    }

    pub fn contains<S: Any>(&self) -> bool {
        self.services.borrow().contains_key(&TypeId::of::<S>())
    }

    /// Registers a transient view factory under `name`. Later
    /// registrations replace earlier ones.
    pub fn register_view(&self, name: &str, factory: impl Fn() -> Box<dyn View> + 'static) {
        self.view_factories
            .borrow_mut()
            .insert(name.to_string(), Rc::new(factory));
    }

    pub fn register_view_model(
        &self,
        name: &str,
        factory: impl Fn() -> Rc<dyn ViewModel> + 'static,
    ) {
        self.view_model_factories
            .borrow_mut()
            .insert(name.to_string(), Rc::new(factory));
    }

    pub fn has_view(&self, name: &str) -> bool {
        self.view_factories.borrow().contains_key(name)
    }

    pub fn has_view_model(&self, name: &str) -> bool {
        self.view_model_factories.borrow().contains_key(name)
    }

    pub fn create_view(&self, name: &str) -> Result<Box<dyn View>> {
        let factory = self
            .view_factories
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::ViewNotRegistered(name.to_string()))?;
        Ok(factory())
    }

    pub fn create_view_model(&self, name: &str) -> Result<Rc<dyn ViewModel>> {
        let factory = self
            .view_model_factories
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::ViewModelNotRegistered(name.to_string()))?;
        Ok(factory())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ThemeService {
        accent: &'static str,
    }

    struct PlainView {
        name: &'static str,
    }

    impl View for PlainView {
        fn name(&self) -> &str {
            self.name
        }
    }

    #[test]
    fn test_register_and_resolve_service() {
        let container = Container::new();
        container
            .register_instance(ThemeService { accent: "blue" })
            .unwrap();

        let theme = container.resolve::<ThemeService>().unwrap();
        assert_eq!(theme.accent, "blue");
        assert!(container.contains::<ThemeService>());
    }

    #[test]
    fn test_duplicate_service_registration() {
        let container = Container::new();
        container
            .register_instance(ThemeService { accent: "blue" })
            .unwrap();
        let result = container.register_instance(ThemeService { accent: "red" });
        assert!(matches!(
            result,
            Err(ResolveError::ServiceAlreadyRegistered(_))
        ));
    }

    #[test]
    fn test_resolve_unregistered_service() {
        let container = Container::new();
        assert!(container.resolve::<ThemeService>().is_none());
    }

    #[test]
    fn test_create_view_from_factory() {
        let container = Container::new();
        container.register_view("HomeView", || Box::new(PlainView { name: "HomeView" }));

        let view = container.create_view("HomeView").unwrap();
        assert_eq!(view.name(), "HomeView");
    }

    #[test]
    fn test_create_unregistered_view_fails() {
        let container = Container::new();
        let result = container.create_view("MissingView");
        assert!(matches!(result, Err(ResolveError::ViewNotRegistered(_))));
    }
}

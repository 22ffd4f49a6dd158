//! Region bookkeeping: named regions, lazy creation, deferred
//! materialization.
//!
//! A view can be registered into a region that has no attached adapter
//! yet; the registration is queued and materialized the moment the host
//! attaches the region. Materialization creates the view through the
//! container and pairs it with its view-model.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use super::region::{Region, RegionBehavior, RegionError, Result, ViewKey};
use crate::core::container::{Container, ResolveError};
use crate::views::{View, ViewModel, ViewModelResolver};

pub struct RegionManager {
    container: Rc<Container>,
    resolver: Rc<ViewModelResolver>,
    regions: FxHashMap<String, Region>,
    pending: FxHashMap<String, Vec<String>>,
}

impl RegionManager {
    pub fn new(container: Rc<Container>, resolver: Rc<ViewModelResolver>) -> Self {
        Self {
            container,
            resolver,
            regions: FxHashMap::default(),
            pending: FxHashMap::default(),
        }
    }

    pub fn container(&self) -> &Rc<Container> {
        &self.container
    }

    pub fn resolver(&self) -> &Rc<ViewModelResolver> {
        &self.resolver
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn region_mut(&mut self, name: &str) -> Option<&mut Region> {
        self.regions.get_mut(name)
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(|name| name.as_str())
    }

    /// Attaches a UI adapter to `name`, creating the region and
    /// materializing every registration queued for it. One region
    /// instance per name: a second attachment is rejected.
    pub fn attach_region(&mut self, name: &str, behavior: RegionBehavior) -> Result<()> {
        if self.regions.contains_key(name) {
            return Err(RegionError::AlreadyAttached(name.to_string()));
        }
        self.regions
            .insert(name.to_string(), Region::new(name, behavior));
        info!(region = name, ?behavior, "region attached");

        let queued = self.pending.remove(name).unwrap_or_default();
        let mut failed = Vec::new();
        for view_name in queued {
            if let Err(err) = self.materialize_into(name, &view_name) {
                warn!(region = name, view = %view_name, error = %err, "deferred view failed to materialize");
                failed.push(err);
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(RegionError::Materialize {
                region: name.to_string(),
                failed,
            })
        }
    }

    /// Registers `view_name` into `region`. If the region has an adapter
    /// the view materializes immediately; otherwise the registration
    /// waits for attachment.
    pub fn register_view_with_region(&mut self, region: &str, view_name: &str) -> Result<()> {
        if self.regions.contains_key(region) {
            self.materialize_into(region, view_name)
                .map_err(|err| RegionError::Materialize {
                    region: region.to_string(),
                    failed: vec![err],
                })?;
            return Ok(());
        }

        debug!(region, view = view_name, "registration deferred until region attaches");
        self.pending
            .entry(region.to_string())
            .or_default()
            .push(view_name.to_string());
        Ok(())
    }

    /// Creates a view and its view-model without touching any region.
    /// Used by navigation, which inserts only after confirmation.
    pub fn create_wired_view(
        &self,
        view_name: &str,
    ) -> std::result::Result<(Box<dyn View>, Option<Rc<dyn ViewModel>>), ResolveError> {
        let view = self.container.create_view(view_name)?;
        let view_model = if view.auto_wire_view_model() {
            Some(self.resolver.resolve(&self.container, view_name)?)
        } else {
            None
        };
        Ok((view, view_model))
    }

    /// Inserts an already-wired view into an attached region and binds
    /// its view-model.
    pub fn insert_view(
        &mut self,
        region: &str,
        view: Box<dyn View>,
        view_model: Option<Rc<dyn ViewModel>>,
        activate: bool,
    ) -> Result<ViewKey> {
        let target = self
            .regions
            .get_mut(region)
            .ok_or_else(|| RegionError::RegionNotFound(region.to_string()))?;
        let key = target.add(view, activate);
        if let Some(view_model) = view_model {
            if let Err(err) = self.resolver.bind(key, view_model) {
                // A fresh slotmap key cannot be bound already.
                warn!(region, error = %err, "binding rejected for fresh view");
            }
        }
        Ok(key)
    }

    /// Removes a view and releases its view-model binding.
    pub fn remove_view(&mut self, region: &str, key: ViewKey) -> Result<Box<dyn View>> {
        let target = self
            .regions
            .get_mut(region)
            .ok_or_else(|| RegionError::RegionNotFound(region.to_string()))?;
        let view = target.remove(key)?;
        self.resolver.release(key);
        Ok(view)
    }

    pub fn view_model(&self, key: ViewKey) -> Option<Rc<dyn ViewModel>> {
        self.resolver.binding(key)
    }

    fn materialize_into(
        &mut self,
        region: &str,
        view_name: &str,
    ) -> std::result::Result<ViewKey, ResolveError> {
        let (view, view_model) = self.create_wired_view(view_name)?;

        let target = match self.regions.get_mut(region) {
            Some(target) => target,
            // Callers only materialize into attached regions.
            None => return Err(ResolveError::ViewNotRegistered(view_name.to_string())),
        };

        // Multi-active members show immediately; single-active regions
        // take the first view and let navigation drive the rest.
        let activate = match target.behavior() {
            RegionBehavior::MultiActive => true,
            RegionBehavior::SingleActive => target.active_views().is_empty(),
        };
        let key = target.add(view, activate);
        if let Some(view_model) = view_model {
            if let Err(err) = self.resolver.bind(key, view_model) {
                warn!(region, view = view_name, error = %err, "binding rejected for fresh view");
            }
        }
        info!(region, view = view_name, activate, "view materialized");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::ChangeNotifier;

    struct BareView {
        name: &'static str,
    }

    impl View for BareView {
        fn name(&self) -> &str {
            self.name
        }

        fn auto_wire_view_model(&self) -> bool {
            false
        }
    }

    struct WiredView;

    impl View for WiredView {
        fn name(&self) -> &str {
            "WiredView"
        }
    }

    struct WiredViewModel {
        notifier: Rc<ChangeNotifier>,
    }

    impl ViewModel for WiredViewModel {
        fn notifier(&self) -> &Rc<ChangeNotifier> {
            &self.notifier
        }
    }

    fn manager() -> RegionManager {
        let container = Rc::new(Container::new());
        container.register_view("HomeView", || Box::new(BareView { name: "HomeView" }));
        container.register_view("AboutView", || Box::new(BareView { name: "AboutView" }));
        container.register_view("WiredView", || Box::new(WiredView));
        container.register_view_model("WiredViewModel", || {
            Rc::new(WiredViewModel {
                notifier: Rc::new(ChangeNotifier::new()),
            })
        });
        let resolver = Rc::new(ViewModelResolver::new());
        RegionManager::new(container, resolver)
    }

    #[test]
    fn test_registration_deferred_until_attach() {
        let mut regions = manager();
        regions
            .register_view_with_region("content", "HomeView")
            .unwrap();
        assert!(!regions.is_attached("content"));

        regions
            .attach_region("content", RegionBehavior::SingleActive)
            .unwrap();
        let region = regions.region("content").unwrap();
        assert_eq!(region.len(), 1);
        assert_eq!(region.active_views().len(), 1);
    }

    #[test]
    fn test_registration_after_attach_materializes_immediately() {
        let mut regions = manager();
        regions
            .attach_region("content", RegionBehavior::SingleActive)
            .unwrap();
        regions
            .register_view_with_region("content", "HomeView")
            .unwrap();
        assert_eq!(regions.region("content").unwrap().len(), 1);
    }

    #[test]
    fn test_single_active_takes_first_view_only() {
        let mut regions = manager();
        regions
            .attach_region("content", RegionBehavior::SingleActive)
            .unwrap();
        regions
            .register_view_with_region("content", "HomeView")
            .unwrap();
        regions
            .register_view_with_region("content", "AboutView")
            .unwrap();

        let region = regions.region("content").unwrap();
        assert_eq!(region.len(), 2);
        assert_eq!(region.active_views().len(), 1);
    }

    #[test]
    fn test_multi_active_activates_every_view() {
        let mut regions = manager();
        regions
            .attach_region("toolbar", RegionBehavior::MultiActive)
            .unwrap();
        regions
            .register_view_with_region("toolbar", "HomeView")
            .unwrap();
        regions
            .register_view_with_region("toolbar", "AboutView")
            .unwrap();

        assert_eq!(regions.region("toolbar").unwrap().active_views().len(), 2);
    }

    #[test]
    fn test_double_attach_rejected() {
        let mut regions = manager();
        regions
            .attach_region("content", RegionBehavior::SingleActive)
            .unwrap();
        let result = regions.attach_region("content", RegionBehavior::SingleActive);
        assert!(matches!(result, Err(RegionError::AlreadyAttached(_))));
    }

    #[test]
    fn test_auto_wire_binds_view_model() {
        let mut regions = manager();
        regions
            .attach_region("content", RegionBehavior::SingleActive)
            .unwrap();
        regions
            .register_view_with_region("content", "WiredView")
            .unwrap();

        let key = regions.region("content").unwrap().find_by_name("WiredView").unwrap();
        assert!(regions.view_model(key).is_some());

        regions.remove_view("content", key).unwrap();
        assert!(regions.view_model(key).is_none());
    }

    #[test]
    fn test_resolution_failure_leaves_region_unchanged() {
        let mut regions = manager();
        // GhostView's factory exists but its view-model does not.
        regions
            .container()
            .register_view("GhostView", || Box::new(WiredView));
        regions
            .attach_region("content", RegionBehavior::SingleActive)
            .unwrap();

        let result = regions.register_view_with_region("content", "GhostView");
        assert!(matches!(result, Err(RegionError::Materialize { .. })));
        assert!(regions.region("content").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_view_name_surfaces() {
        let mut regions = manager();
        regions
            .attach_region("content", RegionBehavior::SingleActive)
            .unwrap();
        let result = regions.register_view_with_region("content", "NoSuchView");
        assert!(matches!(result, Err(RegionError::Materialize { .. })));
    }
}

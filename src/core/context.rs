//! The shared application context handed to modules.
//!
//! One context per application: the container, resolver, event
//! aggregator, region manager and navigation service all live here, so
//! a module's `initialize` can register types, wire regions and
//! navigate without threading five arguments around.

use std::rc::Rc;
use std::sync::Arc;

use crate::core::container::Container;
use crate::events::EventAggregator;
use crate::navigation::{
    self, NavigationOutcome, NavigationParameters, NavigationQueue, NavigationService,
};
use crate::regions::RegionManager;
use crate::views::ViewModelResolver;

pub struct AppContext {
    container: Rc<Container>,
    resolver: Rc<ViewModelResolver>,
    events: Arc<EventAggregator>,
    regions: RegionManager,
    navigation: NavigationService,
}

impl AppContext {
    pub fn new() -> Self {
        let container = Rc::new(Container::new());
        let resolver = Rc::new(ViewModelResolver::new());
        let regions = RegionManager::new(Rc::clone(&container), Rc::clone(&resolver));
        Self {
            container,
            resolver,
            events: Arc::new(EventAggregator::new()),
            regions,
            navigation: NavigationService::new(),
        }
    }

    pub fn container(&self) -> &Rc<Container> {
        &self.container
    }

    pub fn resolver(&self) -> &Rc<ViewModelResolver> {
        &self.resolver
    }

    pub fn events(&self) -> &Arc<EventAggregator> {
        &self.events
    }

    pub fn regions(&self) -> &RegionManager {
        &self.regions
    }

    pub fn regions_mut(&mut self) -> &mut RegionManager {
        &mut self.regions
    }

    pub fn navigation(&self) -> &NavigationService {
        &self.navigation
    }

    pub fn navigation_queue(&self) -> NavigationQueue {
        self.navigation.queue()
    }

    pub async fn request_navigate(
        &mut self,
        region: &str,
        target: &str,
        parameters: NavigationParameters,
    ) -> navigation::Result<NavigationOutcome> {
        self.navigation
            .request_navigate(&mut self.regions, region, target, parameters)
            .await
    }

    pub async fn go_back(&mut self, region: &str) -> navigation::Result<NavigationOutcome> {
        self.navigation.go_back(&mut self.regions, region).await
    }

    pub async fn go_forward(&mut self, region: &str) -> navigation::Result<NavigationOutcome> {
        self.navigation.go_forward(&mut self.regions, region).await
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

//! mosaic - modular UI composition runtime
//!
//! Module structure:
//! - core: primitives (Container, AppContext, DelegateCommand, ChangeNotifier)
//! - events: pub/sub (EventAggregator, UiDispatcher)
//! - modules: catalog and lifecycle (ModuleCatalog, ModuleManager)
//! - regions: named view surfaces (Region, RegionManager)
//! - views: view/view-model contracts (View, ViewModelResolver)
//! - navigation: journaled region navigation (NavigationService)
//! - app: bootstrap (MosaicApp, run_startup)

pub mod app;
pub mod core;
pub mod events;
pub mod logging;
pub mod modules;
pub mod navigation;
pub mod regions;
pub mod views;

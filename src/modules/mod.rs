pub mod catalog;
pub mod manager;
pub mod manifest;

pub use catalog::{
    InitMode, ModuleCatalog, ModuleDescriptor, ModuleError, ModuleState,
};
pub use manager::{InitFuture, InitReport, Module, ModuleManager};
pub use manifest::{apply_manifest, ManifestEntry, ModuleFactoryRegistry, ModuleManifest};

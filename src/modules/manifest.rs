//! Declarative module manifests.
//!
//! A manifest pairs module names with registered factory type names, so
//! hosts can describe their catalog in JSON instead of code. Factories
//! are registered by type name; the manifest references them.

use std::path::Path;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::info;

use super::catalog::{InitMode, ModuleCatalog, ModuleDescriptor, ModuleError, Result};
use super::manager::Module;

#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub mode: InitMode,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModuleManifest {
    pub modules: Vec<ManifestEntry>,
}

impl ModuleManifest {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| ModuleError::Manifest(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| ModuleError::Manifest(format!("{}: {}", path.display(), err)))?;
        Self::from_json(&text)
    }
}

/// Factories keyed by manifest type name.
#[derive(Default)]
pub struct ModuleFactoryRegistry {
    factories: FxHashMap<String, Rc<dyn Fn() -> Box<dyn Module>>>,
}

impl ModuleFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_name: &str, factory: impl Fn() -> Box<dyn Module> + 'static) {
        self.factories.insert(type_name.to_string(), Rc::new(factory));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    fn get(&self, type_name: &str) -> Option<Rc<dyn Fn() -> Box<dyn Module>>> {
        self.factories.get(type_name).cloned()
    }
}

/// Adds every manifest entry to the catalog in manifest order. An entry
/// naming an unregistered type fails without touching the catalog.
pub fn apply_manifest(
    catalog: &mut ModuleCatalog,
    manifest: &ModuleManifest,
    registry: &ModuleFactoryRegistry,
) -> Result<()> {
    // Resolve every type first so a bad entry leaves the catalog clean.
    let mut resolved = Vec::with_capacity(manifest.modules.len());
    for entry in &manifest.modules {
        let factory = registry
            .get(&entry.type_name)
            .ok_or_else(|| ModuleError::TypeNotRegistered(entry.type_name.clone()))?;
        resolved.push((entry, factory));
    }

    for (entry, factory) in resolved {
        let mut descriptor = ModuleDescriptor::new(&entry.name)
            .depends_on(&entry.depends_on.iter().map(|d| d.as_str()).collect::<Vec<_>>());
        if entry.mode == InitMode::OnDemand {
            descriptor = descriptor.on_demand();
        }
        catalog.add_module(descriptor, move || factory())?;
        info!(module = %entry.name, r#type = %entry.type_name, "module added from manifest");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::AppContext;
    use crate::modules::manager::InitFuture;
    use crate::modules::ModuleState;
    use std::io::Write;

    struct NoopModule;

    impl Module for NoopModule {
        fn initialize<'a>(&'a mut self, _ctx: &'a mut AppContext) -> InitFuture<'a> {
            Box::pin(async { Ok(()) })
        }
    }

    fn registry() -> ModuleFactoryRegistry {
        let mut registry = ModuleFactoryRegistry::new();
        registry.register("NoopModule", || Box::new(NoopModule));
        registry
    }

    const MANIFEST: &str = r#"{
        "modules": [
            { "name": "auth", "type": "NoopModule" },
            { "name": "reports", "type": "NoopModule", "mode": "on_demand", "depends_on": ["auth"] }
        ]
    }"#;

    #[test]
    fn test_manifest_parses_modes_and_dependencies() {
        let manifest = ModuleManifest::from_json(MANIFEST).unwrap();
        assert_eq!(manifest.modules.len(), 2);
        assert_eq!(manifest.modules[0].mode, InitMode::OnStartup);
        assert_eq!(manifest.modules[1].mode, InitMode::OnDemand);
        assert_eq!(manifest.modules[1].depends_on, vec!["auth"]);
    }

    #[test]
    fn test_apply_manifest_populates_catalog() {
        let manifest = ModuleManifest::from_json(MANIFEST).unwrap();
        let mut catalog = ModuleCatalog::new();
        apply_manifest(&mut catalog, &manifest, &registry()).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.state("reports"), Some(ModuleState::NotStarted));
        assert_eq!(
            catalog.descriptor("reports").unwrap().mode,
            InitMode::OnDemand
        );
        catalog.validate().unwrap();
    }

    #[test]
    fn test_unregistered_type_leaves_catalog_untouched() {
        let manifest = ModuleManifest::from_json(
            r#"{ "modules": [
                { "name": "auth", "type": "NoopModule" },
                { "name": "ghost", "type": "GhostModule" }
            ] }"#,
        )
        .unwrap();
        let mut catalog = ModuleCatalog::new();
        let result = apply_manifest(&mut catalog, &manifest, &registry());

        assert!(matches!(result, Err(ModuleError::TypeNotRegistered(_))));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = ModuleManifest::load(file.path()).unwrap();
        assert_eq!(manifest.modules.len(), 2);
    }

    #[test]
    fn test_malformed_manifest_reports_parse_error() {
        let result = ModuleManifest::from_json("{ not json");
        assert!(matches!(result, Err(ModuleError::Manifest(_))));
    }
}

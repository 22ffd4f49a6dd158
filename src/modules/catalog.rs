//! Module catalog: descriptors, validation, dependency ordering.
//!
//! The catalog owns one entry per module name. Validation runs entirely
//! before any module code: duplicate names are rejected at insert, and
//! unknown or circular dependencies are rejected by `validate()`.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::manager::Module;

pub type Result<T> = std::result::Result<T, ModuleError>;

#[derive(Debug)]
pub enum ModuleError {
    DuplicateModule(String),
    CircularDependency(String),
    UnknownDependency { module: String, dependency: String },
    LoadFailed { module: String, reason: String },
    Blocked { module: String, dependency: String },
    NotFound(String),
    TypeNotRegistered(String),
    Manifest(String),
}

impl std::fmt::Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleError::DuplicateModule(name) => write!(f, "Duplicate module: {}", name),
            ModuleError::CircularDependency(cycle) => {
                write!(f, "Circular module dependency: {}", cycle)
            }
            ModuleError::UnknownDependency { module, dependency } => {
                write!(f, "Module {} depends on unknown module {}", module, dependency)
            }
            ModuleError::LoadFailed { module, reason } => {
                write!(f, "Module {} failed to initialize: {}", module, reason)
            }
            ModuleError::Blocked { module, dependency } => {
                write!(f, "Module {} blocked by failed dependency {}", module, dependency)
            }
            ModuleError::NotFound(name) => write!(f, "Module not found: {}", name),
            ModuleError::TypeNotRegistered(type_name) => {
                write!(f, "Module type not registered: {}", type_name)
            }
            ModuleError::Manifest(reason) => write!(f, "Module manifest error: {}", reason),
        }
    }
}

impl std::error::Error for ModuleError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitMode {
    OnStartup,
    OnDemand,
}

impl Default for InitMode {
    fn default() -> Self {
        Self::OnStartup
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    NotStarted,
    Initializing,
    Initialized,
    Failed,
    Blocked,
}

#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    pub name: String,
    pub mode: InitMode,
    pub depends_on: Vec<String>,
}

impl ModuleDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: InitMode::OnStartup,
            depends_on: Vec::new(),
        }
    }

    pub fn on_demand(mut self) -> Self {
        self.mode = InitMode::OnDemand;
        self
    }

    pub fn depends_on(mut self, dependencies: &[&str]) -> Self {
        self.depends_on = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }
}

pub type ModuleFactory = Box<dyn Fn() -> Box<dyn Module>>;

pub(crate) struct CatalogEntry {
    pub descriptor: ModuleDescriptor,
    pub factory: ModuleFactory,
    pub state: ModuleState,
    pub failure: Option<String>,
}

pub struct ModuleCatalog {
    entries: FxHashMap<String, CatalogEntry>,
    order: Vec<String>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    pub fn add_module(
        &mut self,
        descriptor: ModuleDescriptor,
        factory: impl Fn() -> Box<dyn Module> + 'static,
    ) -> Result<()> {
        let name = descriptor.name.clone();
        if self.entries.contains_key(&name) {
            return Err(ModuleError::DuplicateModule(name));
        }
        self.order.push(name.clone());
        self.entries.insert(
            name,
            CatalogEntry {
                descriptor,
                factory: Box::new(factory),
                state: ModuleState::NotStarted,
                failure: None,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.entries.get(name).map(|e| &e.descriptor)
    }

    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.entries.get(name).map(|e| e.state)
    }

    pub fn failure(&self, name: &str) -> Option<&str> {
        self.entries.get(name)?.failure.as_deref()
    }

    pub fn names_in_order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|name| name.as_str())
    }

    /// Rejects unknown dependencies and dependency cycles. Runs before
    /// any module's code, so a bad catalog never half-initializes.
    pub fn validate(&self) -> Result<()> {
        for name in &self.order {
            if let Some(entry) = self.entries.get(name) {
                for dependency in &entry.descriptor.depends_on {
                    if !self.entries.contains_key(dependency) {
                        return Err(ModuleError::UnknownDependency {
                            module: name.clone(),
                            dependency: dependency.clone(),
                        });
                    }
                }
            }
        }
        self.find_cycle()
    }

    /// Topological order covering every `OnStartup` module and its
    /// transitive dependencies, ties broken by insertion order.
    pub(crate) fn startup_order(&self) -> Result<Vec<String>> {
        let mut needed = FxHashSet::default();
        for name in &self.order {
            let on_startup = self
                .entries
                .get(name)
                .is_some_and(|e| e.descriptor.mode == InitMode::OnStartup);
            if on_startup {
                self.collect_closure(name, &mut needed)?;
            }
        }
        self.order_subset(&needed)
    }

    /// Dependencies-first order for a single module's closure.
    pub(crate) fn load_order(&self, root: &str) -> Result<Vec<String>> {
        if !self.entries.contains_key(root) {
            return Err(ModuleError::NotFound(root.to_string()));
        }
        let mut needed = FxHashSet::default();
        self.collect_closure(root, &mut needed)?;
        self.order_subset(&needed)
    }

    pub(crate) fn set_state(&mut self, name: &str, state: ModuleState) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.state = state;
        }
    }

    pub(crate) fn set_failure(&mut self, name: &str, reason: &str) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.state = ModuleState::Failed;
            entry.failure = Some(reason.to_string());
        }
    }

    pub(crate) fn create_instance(&self, name: &str) -> Option<Box<dyn Module>> {
        self.entries.get(name).map(|entry| (entry.factory)())
    }

    fn collect_closure(&self, name: &str, needed: &mut FxHashSet<String>) -> Result<()> {
        if !needed.insert(name.to_string()) {
            return Ok(());
        }
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ModuleError::NotFound(name.to_string()))?;
        for dependency in &entry.descriptor.depends_on {
            if !self.entries.contains_key(dependency) {
                return Err(ModuleError::UnknownDependency {
                    module: name.to_string(),
                    dependency: dependency.clone(),
                });
            }
            self.collect_closure(dependency, needed)?;
        }
        Ok(())
    }

    /// Repeatedly takes the first (insertion order) member of `needed`
    /// whose dependencies are already placed.
    fn order_subset(&self, needed: &FxHashSet<String>) -> Result<Vec<String>> {
        let mut placed: FxHashSet<&str> = FxHashSet::default();
        let mut result = Vec::with_capacity(needed.len());

        while result.len() < needed.len() {
            let mut progressed = false;
            for name in &self.order {
                if !needed.contains(name) || placed.contains(name.as_str()) {
                    continue;
                }
                let ready = self.entries.get(name).is_some_and(|entry| {
                    entry
                        .descriptor
                        .depends_on
                        .iter()
                        .all(|d| placed.contains(d.as_str()))
                });
                if ready {
                    placed.insert(name.as_str());
                    result.push(name.clone());
                    progressed = true;
                }
            }
            if !progressed {
                // Only a cycle can starve the scan; name it.
                self.find_cycle()?;
                return Err(ModuleError::CircularDependency("unresolved".to_string()));
            }
        }

        Ok(result)
    }

    fn find_cycle(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            catalog: &ModuleCatalog,
            name: &str,
            marks: &mut FxHashMap<String, Mark>,
            stack: &mut Vec<String>,
        ) -> Result<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|n| n == name).unwrap_or(0);
                    let mut path: Vec<&str> =
                        stack[start..].iter().map(|n| n.as_str()).collect();
                    path.push(name);
                    return Err(ModuleError::CircularDependency(path.join(" -> ")));
                }
                None => {}
            }

            marks.insert(name.to_string(), Mark::Visiting);
            stack.push(name.to_string());
            if let Some(entry) = catalog.entries.get(name) {
                for dependency in &entry.descriptor.depends_on {
                    if catalog.entries.contains_key(dependency) {
                        visit(catalog, dependency, marks, stack)?;
                    }
                }
            }
            stack.pop();
            marks.insert(name.to_string(), Mark::Done);
            Ok(())
        }

        let mut marks = FxHashMap::default();
        let mut stack = Vec::new();
        for name in &self.order {
            visit(self, name, &mut marks, &mut stack)?;
        }
        Ok(())
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

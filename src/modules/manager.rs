//! Module initialization: startup sweep and on-demand loading.
//!
//! Initialization is dependency-first. A module whose `initialize`
//! fails is recorded as `Failed` with its reason; modules depending on
//! it (directly or transitively) are marked `Blocked` and never run.
//! One bad module never aborts the sweep.

use std::future::Future;
use std::pin::Pin;

use rustc_hash::FxHashMap;
use tracing::{error, info, warn};

use super::catalog::{ModuleCatalog, ModuleError, ModuleState, Result};
use crate::core::context::AppContext;

pub type InitFuture<'a> =
    Pin<Box<dyn Future<Output = std::result::Result<(), Box<dyn std::error::Error>>> + 'a>>;

/// A unit of composition. Modules register their types and views into
/// the shared context when initialized.
pub trait Module {
    fn initialize<'a>(&'a mut self, ctx: &'a mut AppContext) -> InitFuture<'a>;
}

/// Outcome of a startup sweep. `failed` and `blocked` carry the reason
/// respectively the name of the failed dependency.
#[derive(Debug, Default)]
pub struct InitReport {
    pub initialized: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub blocked: Vec<(String, String)>,
}

impl InitReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty()
    }
}

pub struct ModuleManager {
    catalog: ModuleCatalog,
    instances: FxHashMap<String, Box<dyn Module>>,
}

impl ModuleManager {
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self {
            catalog,
            instances: FxHashMap::default(),
        }
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.catalog.state(name)
    }

    /// Initializes every `OnStartup` module (and its dependencies) in
    /// dependency order. Catalog defects are fatal and reported before
    /// any module code runs.
    pub async fn run(&mut self, ctx: &mut AppContext) -> Result<InitReport> {
        self.catalog.validate()?;
        let order = self.catalog.startup_order()?;

        let mut report = InitReport::default();
        for name in order {
            self.initialize_one(ctx, &name, &mut report).await;
        }

        info!(
            initialized = report.initialized.len(),
            failed = report.failed.len(),
            blocked = report.blocked.len(),
            "module startup sweep finished"
        );
        Ok(report)
    }

    /// Initializes `name` and any of its not-yet-initialized
    /// dependencies. Already-initialized modules are skipped; a module
    /// already recorded as failed returns its recorded reason.
    pub async fn load_on_demand(&mut self, ctx: &mut AppContext, name: &str) -> Result<()> {
        let order = self.catalog.load_order(name)?;

        let mut report = InitReport::default();
        for member in order {
            match self.catalog.state(&member) {
                Some(ModuleState::Initialized) => continue,
                Some(ModuleState::Failed) => {
                    return Err(ModuleError::LoadFailed {
                        module: member.clone(),
                        reason: self
                            .catalog
                            .failure(&member)
                            .unwrap_or("unknown")
                            .to_string(),
                    });
                }
                _ => {}
            }
            self.initialize_one(ctx, &member, &mut report).await;
        }

        match self.catalog.state(name) {
            Some(ModuleState::Initialized) => Ok(()),
            Some(ModuleState::Failed) => Err(ModuleError::LoadFailed {
                module: name.to_string(),
                reason: self.catalog.failure(name).unwrap_or("unknown").to_string(),
            }),
            Some(ModuleState::Blocked) => Err(ModuleError::Blocked {
                module: name.to_string(),
                dependency: self.failed_dependency_of(name).unwrap_or_default(),
            }),
            _ => Err(ModuleError::NotFound(name.to_string())),
        }
    }

    async fn initialize_one(&mut self, ctx: &mut AppContext, name: &str, report: &mut InitReport) {
        if self.catalog.state(name) == Some(ModuleState::Initialized) {
            return;
        }

        if let Some(dependency) = self.failed_dependency_of(name) {
            warn!(module = name, dependency = %dependency, "module blocked");
            self.catalog.set_state(name, ModuleState::Blocked);
            report.blocked.push((name.to_string(), dependency));
            return;
        }

        let mut instance = match self.catalog.create_instance(name) {
            Some(instance) => instance,
            None => return,
        };

        self.catalog.set_state(name, ModuleState::Initializing);
        info!(module = name, "initializing module");

        match instance.initialize(ctx).await {
            Ok(()) => {
                self.catalog.set_state(name, ModuleState::Initialized);
                self.instances.insert(name.to_string(), instance);
                report.initialized.push(name.to_string());
            }
            Err(err) => {
                let reason = err.to_string();
                error!(module = name, error = %reason, "module failed to initialize");
                self.catalog.set_failure(name, &reason);
                report.failed.push((name.to_string(), reason));
            }
        }
    }

    /// First direct dependency in `Failed` or `Blocked` state, if any.
    /// Order is topological, so transitive blockage propagates.
    fn failed_dependency_of(&self, name: &str) -> Option<String> {
        let descriptor = self.catalog.descriptor(name)?;
        descriptor
            .depends_on
            .iter()
            .find(|dep| {
                matches!(
                    self.catalog.state(dep),
                    Some(ModuleState::Failed) | Some(ModuleState::Blocked)
                )
            })
            .cloned()
    }
}

//! Application bootstrap.
//!
//! The host implements `MosaicApp`; `run_startup` owns the sequencing:
//! type registration, catalog configuration, shell creation, then the
//! module startup sweep. The shell exists before any module runs, so
//! module-registered views materialize into attached regions directly.

use tracing::info;

use crate::core::context::AppContext;
use crate::modules::{InitReport, ModuleCatalog, ModuleError, ModuleManager};
use crate::regions::RegionError;

#[derive(Debug)]
pub enum StartupError {
    Module(ModuleError),
    Region(RegionError),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::Module(err) => write!(f, "Startup module error: {}", err),
            StartupError::Region(err) => write!(f, "Startup region error: {}", err),
        }
    }
}

impl std::error::Error for StartupError {}

impl From<ModuleError> for StartupError {
    fn from(err: ModuleError) -> Self {
        StartupError::Module(err)
    }
}

impl From<RegionError> for StartupError {
    fn from(err: RegionError) -> Self {
        StartupError::Region(err)
    }
}

/// The host application's composition root.
pub trait MosaicApp {
    /// Registers views, view-models and services into the container.
    fn register_types(&mut self, ctx: &mut AppContext);

    /// Declares the module catalog.
    fn configure_module_catalog(&mut self, catalog: &mut ModuleCatalog);

    /// Builds the shell: attaches the application's regions.
    fn create_shell(&mut self, ctx: &mut AppContext) -> Result<(), StartupError>;
}

/// Runs the full startup sequence and hands back the live context, the
/// module manager (for later on-demand loads) and the startup report.
pub async fn run_startup<A: MosaicApp>(
    app: &mut A,
) -> Result<(AppContext, ModuleManager, InitReport), StartupError> {
    let mut ctx = AppContext::new();

    app.register_types(&mut ctx);

    let mut catalog = ModuleCatalog::new();
    app.configure_module_catalog(&mut catalog);
    info!(modules = catalog.len(), "catalog configured");

    app.create_shell(&mut ctx)?;

    let mut modules = ModuleManager::new(catalog);
    let report = modules.run(&mut ctx).await?;

    Ok((ctx, modules, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{InitFuture, Module, ModuleDescriptor};
    use crate::regions::RegionBehavior;
    use crate::views::View;

    struct HomeView;

    impl View for HomeView {
        fn name(&self) -> &str {
            "HomeView"
        }

        fn auto_wire_view_model(&self) -> bool {
            false
        }
    }

    struct HomeModule;

    impl Module for HomeModule {
        fn initialize<'a>(&'a mut self, ctx: &'a mut AppContext) -> InitFuture<'a> {
            Box::pin(async move {
                ctx.regions_mut()
                    .register_view_with_region("content", "HomeView")?;
                Ok(())
            })
        }
    }

    struct TestApp;

    impl MosaicApp for TestApp {
        fn register_types(&mut self, ctx: &mut AppContext) {
            ctx.container().register_view("HomeView", || Box::new(HomeView));
        }

        fn configure_module_catalog(&mut self, catalog: &mut ModuleCatalog) {
            catalog
                .add_module(ModuleDescriptor::new("home"), || Box::new(HomeModule))
                .unwrap();
        }

        fn create_shell(&mut self, ctx: &mut AppContext) -> Result<(), StartupError> {
            ctx.regions_mut()
                .attach_region("content", RegionBehavior::SingleActive)?;
            Ok(())
        }
    }

    #[test]
    fn test_startup_builds_shell_then_runs_modules() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let (ctx, modules, report) = run_startup(&mut TestApp).await.unwrap();

            assert!(report.is_clean());
            assert_eq!(report.initialized, vec!["home"]);
            assert_eq!(ctx.regions().region("content").unwrap().len(), 1);
            assert!(modules.catalog().contains("home"));
        });
    }
}

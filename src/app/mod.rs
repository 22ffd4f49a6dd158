pub mod bootstrap;

pub use bootstrap::{run_startup, MosaicApp, StartupError};

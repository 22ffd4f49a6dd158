pub mod manager;
pub mod region;

pub use manager::RegionManager;
pub use region::{Region, RegionBehavior, RegionError, ViewKey};

pub mod command;
pub mod container;
pub mod context;
pub mod notify;

pub use command::DelegateCommand;
pub use container::{Container, ResolveError};
pub use context::AppContext;
pub use notify::{ChangeNotifier, Property};

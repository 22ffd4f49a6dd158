pub mod journal;
pub mod service;

pub use journal::{NavigationEntry, NavigationJournal, NavigationParameters};
pub use service::{
    NavigationContext, NavigationError, NavigationOutcome, NavigationQueue, NavigationService,
    PendingNavigation, Result,
};

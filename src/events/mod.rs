pub mod aggregator;
pub mod dispatcher;

pub use aggregator::{
    EventAggregator, PubSubEvent, PublishOutcome, SubscriberFailure, SubscriptionToken,
    ThreadAffinity,
};
pub use dispatcher::{ui_channel, UiDispatcher, UiTaskPump};

pub mod resolver;
pub mod view;

pub use resolver::{view_model_name, ViewModelResolver};
pub use view::{
    confirmation_channel, ConfirmFuture, ConfirmNavigationRequest, NavigationAware,
    RegionMemberLifetime, View, ViewModel,
};

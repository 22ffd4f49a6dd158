//! View and view-model traits.
//!
//! Views are logical composition members; rendering is someone else's
//! problem. Optional navigation capabilities are exposed through explicit
//! accessor methods instead of dynamic type probing: a view that
//! participates overrides the accessor to return itself.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use tokio::sync::oneshot;

use crate::core::notify::ChangeNotifier;
use crate::navigation::NavigationContext;

pub trait View: 'static {
    fn name(&self) -> &str;

    /// Whether materialization should pair this view with a view-model.
    /// Defaults to true; views without a view-model opt out.
    fn auto_wire_view_model(&self) -> bool {
        true
    }

    fn navigation_aware(&mut self) -> Option<&mut dyn NavigationAware> {
        None
    }

    fn confirm_navigation_request(&mut self) -> Option<&mut dyn ConfirmNavigationRequest> {
        None
    }

    fn member_lifetime(&self) -> Option<&dyn RegionMemberLifetime> {
        None
    }
}

pub trait ViewModel: 'static {
    fn notifier(&self) -> &Rc<ChangeNotifier>;
}

impl std::fmt::Debug for dyn ViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ViewModel")
    }
}

/// Navigation lifecycle hooks for views that track where they are shown.
pub trait NavigationAware {
    /// Whether this instance can serve as the target of a request, in
    /// which case it is re-activated instead of materializing a new view.
    fn is_navigation_target(&self, ctx: &NavigationContext) -> bool {
        let _ = ctx;
        true
    }

    fn on_navigated_from(&mut self, ctx: &NavigationContext) {
        let _ = ctx;
    }

    fn on_navigated_to(&mut self, ctx: &NavigationContext) {
        let _ = ctx;
    }
}

pub type ConfirmFuture<'a> = Pin<Box<dyn Future<Output = bool> + 'a>>;

/// An async yes/no gate consulted before the view is navigated away from.
pub trait ConfirmNavigationRequest {
    fn confirm_navigation(&mut self, ctx: &NavigationContext) -> ConfirmFuture<'_>;
}

/// Whether to keep a view in its region once deactivated.
pub trait RegionMemberLifetime {
    fn keep_alive(&self) -> bool;
}

/// Builds a confirmation future answered out of band. Dropping the sender
/// counts as declining.
pub fn confirmation_channel() -> (oneshot::Sender<bool>, ConfirmFuture<'static>) {
    let (tx, rx) = oneshot::channel();
    let fut = Box::pin(async move { rx.await.unwrap_or(false) });
    (tx, fut)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LabelView;

    impl View for LabelView {
        fn name(&self) -> &str {
            "LabelView"
        }
    }

    #[test]
    fn test_capabilities_default_to_absent() {
        let mut view = LabelView;
        assert!(view.auto_wire_view_model());
        assert!(view.navigation_aware().is_none());
        assert!(view.confirm_navigation_request().is_none());
        assert!(view.member_lifetime().is_none());
    }

    #[test]
    fn test_confirmation_channel_answers() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let (tx, fut) = confirmation_channel();
            tx.send(true).unwrap();
            assert!(fut.await);

            let (tx, fut) = confirmation_channel();
            drop(tx);
            assert!(!fut.await);
        });
    }
}

//! Region navigation: confirmation-gated view swaps plus journaling.
//!
//! A navigation runs in phases: resolve the target (reusing an existing
//! view that accepts the request, else creating a fresh wired one), ask
//! the outgoing view to confirm, then swap and journal. Cancellation is
//! not an error; a cancelled navigation leaves the region and journal
//! exactly as they were, and the freshly created view (if any) is
//! dropped without ever entering the region.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use super::journal::{NavigationJournal, NavigationParameters};
use crate::core::container::ResolveError;
use crate::regions::{RegionManager, ViewKey};

pub type Result<T> = std::result::Result<T, NavigationError>;

#[derive(Debug)]
pub enum NavigationError {
    RegionNotFound(String),
    TargetNotFound { region: String, target: String },
    NoHistory { region: String },
    Resolve(ResolveError),
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::RegionNotFound(region) => {
                write!(f, "Region not found: {}", region)
            }
            NavigationError::TargetNotFound { region, target } => {
                write!(f, "Navigation target {} not found for region {}", target, region)
            }
            NavigationError::NoHistory { region } => {
                write!(f, "No journal entry to navigate to in region {}", region)
            }
            NavigationError::Resolve(err) => write!(f, "Navigation resolve failure: {}", err),
        }
    }
}

impl std::error::Error for NavigationError {}

impl From<ResolveError> for NavigationError {
    fn from(err: ResolveError) -> Self {
        NavigationError::Resolve(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Committed,
    Cancelled,
}

/// What a navigation-aware view learns about the request it is part of.
#[derive(Debug, Clone)]
pub struct NavigationContext {
    pub region: String,
    pub target: String,
    pub parameters: NavigationParameters,
}

#[derive(Debug, Clone)]
pub struct PendingNavigation {
    pub region: String,
    pub target: String,
    pub parameters: NavigationParameters,
}

/// Cloneable handle for posting navigation requests from inside views
/// and handlers. Requests posted here are drained after the navigation
/// currently being processed resolves.
#[derive(Clone, Default)]
pub struct NavigationQueue {
    inner: Rc<RefCell<VecDeque<PendingNavigation>>>,
}

impl NavigationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, region: &str, target: &str, parameters: NavigationParameters) {
        self.inner.borrow_mut().push_back(PendingNavigation {
            region: region.to_string(),
            target: target.to_string(),
            parameters,
        });
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    fn pop(&self) -> Option<PendingNavigation> {
        self.inner.borrow_mut().pop_front()
    }
}

#[derive(Default)]
pub struct NavigationService {
    journals: FxHashMap<String, NavigationJournal>,
    queue: NavigationQueue,
}

impl NavigationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self) -> NavigationQueue {
        self.queue.clone()
    }

    pub fn journal(&self, region: &str) -> Option<&NavigationJournal> {
        self.journals.get(region)
    }

    pub fn can_go_back(&self, region: &str) -> bool {
        self.journals.get(region).is_some_and(|j| j.can_go_back())
    }

    pub fn can_go_forward(&self, region: &str) -> bool {
        self.journals.get(region).is_some_and(|j| j.can_go_forward())
    }

    /// Navigates `region` to `target`, then drains any requests posted
    /// to the queue while this one was in flight.
    pub async fn request_navigate(
        &mut self,
        regions: &mut RegionManager,
        region: &str,
        target: &str,
        parameters: NavigationParameters,
    ) -> Result<NavigationOutcome> {
        let outcome = self.navigate_once(regions, region, target, parameters).await;
        self.drain_queue(regions).await;
        outcome
    }

    /// Navigates back along the journal. The confirmation gate applies
    /// to journal moves too; a declined move leaves the journal intact.
    pub async fn go_back(
        &mut self,
        regions: &mut RegionManager,
        region: &str,
    ) -> Result<NavigationOutcome> {
        let entry = self
            .journals
            .get(region)
            .and_then(|j| j.peek_back())
            .cloned()
            .ok_or_else(|| NavigationError::NoHistory {
                region: region.to_string(),
            })?;

        let ctx = NavigationContext {
            region: region.to_string(),
            target: entry.target.clone(),
            parameters: entry.parameters.clone(),
        };
        if !confirm_leave(regions, region, &ctx).await? {
            debug!(region, target = %entry.target, "back navigation cancelled");
            return Ok(NavigationOutcome::Cancelled);
        }

        swap_to(regions, region, &entry.target, &ctx).await?;
        if let Some(journal) = self.journals.get_mut(region) {
            journal.go_back();
        }
        info!(region, target = %entry.target, "navigated back");
        Ok(NavigationOutcome::Committed)
    }

    pub async fn go_forward(
        &mut self,
        regions: &mut RegionManager,
        region: &str,
    ) -> Result<NavigationOutcome> {
        let entry = self
            .journals
            .get(region)
            .and_then(|j| j.peek_forward())
            .cloned()
            .ok_or_else(|| NavigationError::NoHistory {
                region: region.to_string(),
            })?;

        let ctx = NavigationContext {
            region: region.to_string(),
            target: entry.target.clone(),
            parameters: entry.parameters.clone(),
        };
        if !confirm_leave(regions, region, &ctx).await? {
            debug!(region, target = %entry.target, "forward navigation cancelled");
            return Ok(NavigationOutcome::Cancelled);
        }

        swap_to(regions, region, &entry.target, &ctx).await?;
        if let Some(journal) = self.journals.get_mut(region) {
            journal.go_forward();
        }
        info!(region, target = %entry.target, "navigated forward");
        Ok(NavigationOutcome::Committed)
    }

    async fn navigate_once(
        &mut self,
        regions: &mut RegionManager,
        region: &str,
        target: &str,
        parameters: NavigationParameters,
    ) -> Result<NavigationOutcome> {
        if !regions.is_attached(region) {
            return Err(NavigationError::RegionNotFound(region.to_string()));
        }

        let ctx = NavigationContext {
            region: region.to_string(),
            target: target.to_string(),
            parameters: parameters.clone(),
        };

        if !confirm_leave(regions, region, &ctx).await? {
            debug!(region, target, "navigation cancelled");
            return Ok(NavigationOutcome::Cancelled);
        }

        swap_to(regions, region, target, &ctx).await?;
        self.journals
            .entry(region.to_string())
            .or_default()
            .record(target, parameters);
        info!(region, target, "navigation committed");
        Ok(NavigationOutcome::Committed)
    }

    async fn drain_queue(&mut self, regions: &mut RegionManager) {
        while let Some(pending) = self.queue.pop() {
            let result = self
                .navigate_once(regions, &pending.region, &pending.target, pending.parameters)
                .await;
            if let Err(err) = result {
                warn!(region = %pending.region, target = %pending.target, error = %err,
                    "queued navigation failed");
            }
        }
    }
}

/// Asks the active view of a single-active region whether navigating
/// away is acceptable. Views that expose no confirmer consent.
async fn confirm_leave(
    regions: &mut RegionManager,
    region: &str,
    ctx: &NavigationContext,
) -> Result<bool> {
    let target = regions
        .region_mut(region)
        .ok_or_else(|| NavigationError::RegionNotFound(region.to_string()))?;
    let Some(active) = target.sole_active() else {
        return Ok(true);
    };

    let confirmed = match target.view_mut(active).and_then(|v| v.confirm_navigation_request()) {
        Some(confirmer) => confirmer.confirm_navigation(ctx).await,
        None => true,
    };
    Ok(confirmed)
}

/// Commits a target swap: reuse an accepting instance or insert a fresh
/// one, run the lifecycle hooks, and discard an outgoing view whose
/// member lifetime asked not to be kept.
async fn swap_to(
    regions: &mut RegionManager,
    region: &str,
    target: &str,
    ctx: &NavigationContext,
) -> Result<ViewKey> {
    let reuse = find_reusable(regions, region, target, ctx)?;

    // Create before touching the region so a resolve failure changes
    // nothing.
    let created = if reuse.is_none() {
        let (view, view_model) =
            regions
                .create_wired_view(target)
                .map_err(|err| match err {
                    ResolveError::ViewNotRegistered(_) => NavigationError::TargetNotFound {
                        region: region.to_string(),
                        target: target.to_string(),
                    },
                    other => NavigationError::Resolve(other),
                })?;
        Some((view, view_model))
    } else {
        None
    };

    let outgoing = regions
        .region(region)
        .and_then(|r| r.sole_active())
        .filter(|&key| Some(key) != reuse);

    // Leaving hook runs before the region changes hands.
    if let Some(out_key) = outgoing {
        let target_region = regions
            .region_mut(region)
            .ok_or_else(|| NavigationError::RegionNotFound(region.to_string()))?;
        if let Some(view) = target_region.view_mut(out_key) {
            if let Some(aware) = view.navigation_aware() {
                aware.on_navigated_from(ctx);
            }
        }
    }

    let incoming = match (reuse, created) {
        (Some(key), _) => {
            let target_region = regions
                .region_mut(region)
                .ok_or_else(|| NavigationError::RegionNotFound(region.to_string()))?;
            if target_region.activate(key).is_err() {
                return Err(NavigationError::TargetNotFound {
                    region: region.to_string(),
                    target: target.to_string(),
                });
            }
            key
        }
        (None, Some((view, view_model))) => regions
            .insert_view(region, view, view_model, true)
            .map_err(|_| NavigationError::RegionNotFound(region.to_string()))?,
        (None, None) => unreachable!("swap always has a reuse key or a created view"),
    };

    if let Some(out_key) = outgoing {
        let keep = regions
            .region(region)
            .and_then(|r| r.view(out_key))
            .and_then(|v| v.member_lifetime())
            .map(|l| l.keep_alive())
            .unwrap_or(true);
        if !keep {
            debug!(region, "discarding outgoing view with expired lifetime");
            let _ = regions.remove_view(region, out_key);
        }
    }

    let target_region = regions
        .region_mut(region)
        .ok_or_else(|| NavigationError::RegionNotFound(region.to_string()))?;
    if let Some(view) = target_region.view_mut(incoming) {
        if let Some(aware) = view.navigation_aware() {
            aware.on_navigated_to(ctx);
        }
    }

    Ok(incoming)
}

/// First existing instance of `target` that accepts the request. Views
/// without navigation awareness are always reusable.
fn find_reusable(
    regions: &mut RegionManager,
    region: &str,
    target: &str,
    ctx: &NavigationContext,
) -> Result<Option<ViewKey>> {
    let target_region = regions
        .region_mut(region)
        .ok_or_else(|| NavigationError::RegionNotFound(region.to_string()))?;

    let keys: Vec<ViewKey> = target_region.keys_in_order().collect();
    for key in keys {
        let Some(view) = target_region.view_mut(key) else {
            continue;
        };
        if view.name() != target {
            continue;
        }
        let accepts = match view.navigation_aware() {
            Some(aware) => aware.is_navigation_target(ctx),
            None => true,
        };
        if accepts {
            return Ok(Some(key));
        }
    }
    Ok(None)
}

//! Marshaling onto the UI-affine execution context.
//!
//! Publishers may live on any thread; handlers that asked for UI affinity
//! are posted here and executed when the host loop drains the pump.
//! Dispatch is fire-and-forget: `post` returning says nothing about the
//! handler having run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use tracing::warn;

type UiTask = Box<dyn FnOnce() + Send>;

#[derive(Clone)]
pub struct UiDispatcher {
    tx: Sender<UiTask>,
}

pub struct UiTaskPump {
    rx: Receiver<UiTask>,
}

/// Creates the dispatcher/pump pair. The pump stays on the UI thread; the
/// dispatcher may be cloned anywhere.
pub fn ui_channel() -> (UiDispatcher, UiTaskPump) {
    let (tx, rx) = mpsc::channel();
    (UiDispatcher { tx }, UiTaskPump { rx })
}

impl UiDispatcher {
    /// Queues a task for the UI loop. Returns false when the pump is gone.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(task)).is_ok()
    }
}

impl UiTaskPump {
    /// Runs every queued task, isolating panics per task. Returns how
    /// many tasks ran.
    pub fn drain(&mut self) -> usize {
        let mut ran = 0;
        loop {
            match self.rx.try_recv() {
                Ok(task) => {
                    ran += 1;
                    if catch_unwind(AssertUnwindSafe(task)).is_err() {
                        warn!("ui task panicked");
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return ran,
            }
        }
    }
}

//! Events the manager reacts to

use tokio::sync::broadcast;

/// Signals from outside the orchestration core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    /// The installed package set may have changed
    PackageStateChanged,
    /// Something asked for a catalog feature's packages to be installed
    FeatureRequested { feature: String, user_action: String },
}

/// Broadcast channel carrying [`ManagerEvent`]s to any number of listeners.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ManagerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish `event`; returns how many listeners received it.
    pub fn publish(&self, event: ManagerEvent) -> usize {
        tracing::trace!(?event, "Publishing manager event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

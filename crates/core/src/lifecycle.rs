//! Worker lifecycle state machine.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Lifecycle states, in the order a healthy worker goes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Created, no install attempted yet.
    #[default]
    Parsed,
    Installing,
    /// Installed and waiting to activate.
    Installed,
    Activating,
    Activated,
    /// Install failed. A later install may retry from here.
    Redundant,
}

impl LifecycleState {
    /// Whether moving to `next` is a legal transition.
    pub fn can_transition(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Parsed | Redundant, Installing)
                | (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (Installing | Installed | Activating | Activated, Redundant)
        )
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn transition(&mut self, next: LifecycleState) -> Result<(), Error> {
        if !self.can_transition(next) {
            return Err(Error::InvalidState(format!("cannot go from {self:?} to {next:?}")));
        }
        tracing::debug!(from = ?*self, to = ?next, "lifecycle transition");
        *self = next;
        Ok(())
    }

    pub fn is_waiting(self) -> bool {
        self == LifecycleState::Installed
    }

    /// Whether fetch events should be handled by the strategies.
    pub fn is_controlling(self) -> bool {
        self == LifecycleState::Activated
    }
}

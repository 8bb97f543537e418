use tracing::{debug, info};

use crate::controller::event_collector::DeviceSnapshot;
use crate::navigation::focus::ButtonRole;

// Result of one frame spent inside the confirmation interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalOutcome {
    Pending,
    // Closed with the pending fullscreen toggle accepted
    Confirmed,
    // Closed without toggling
    Cancelled,
}

/// Release-then-press guard for the fullscreen confirmation.
///
/// A freshly opened interrupt ignores the dismiss buttons until it has seen
/// one frame with both of them up, so the press that opened it cannot also
/// close it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModalGuard {
    open: bool,
    armed: bool,
}

impl ModalGuard {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn open(&mut self) {
        if !self.open {
            info!("Fullscreen confirmation opened");
        }
        self.open = true;
        self.armed = false;
    }

    fn close(&mut self, outcome: ModalOutcome) -> ModalOutcome {
        info!("Fullscreen confirmation closed: {:?}", outcome);
        self.open = false;
        self.armed = false;
        outcome
    }

    /// Feed one frame of controller state to the open interrupt.
    pub fn observe(&mut self, snapshot: &DeviceSnapshot) -> ModalOutcome {
        if !self.open {
            return ModalOutcome::Pending;
        }
        let primary = snapshot.is_pressed(ButtonRole::Primary.index());
        let secondary = snapshot.is_pressed(ButtonRole::Secondary.index());

        if !self.armed {
            if !primary && !secondary {
                debug!("Dismiss buttons released, confirmation armed");
                self.armed = true;
            }
            return ModalOutcome::Pending;
        }

        if primary {
            self.close(ModalOutcome::Confirmed)
        } else if secondary {
            self.close(ModalOutcome::Cancelled)
        } else {
            ModalOutcome::Pending
        }
    }

    // On-screen confirm; a click needs no arming
    pub fn confirm(&mut self) -> ModalOutcome {
        if self.open {
            self.close(ModalOutcome::Confirmed)
        } else {
            ModalOutcome::Pending
        }
    }

    // On-screen cancel
    pub fn cancel(&mut self) -> ModalOutcome {
        if self.open {
            self.close(ModalOutcome::Cancelled)
        } else {
            ModalOutcome::Pending
        }
    }
}

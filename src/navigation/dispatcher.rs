//! Registry that turns a finalized navigation decision into one call on an
//! external collaborator.
//!
//! The dispatcher does not retry, inspect or log the outcome of a callback.
//! Whatever the callback does with a failure is its own business.

use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

use crate::navigation::focus::{ButtonRole, FocusZone};

/// Actions the navigation core can ask collaborators to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SignOut,
    LoadInbox,
    ToggleFullscreen,
    ToggleColorMode,
    ToggleAccent,
    BeginSignIn,
}

/// Action bound to each index of the header and settings drawer.
pub const SETTINGS_ACTIONS: [Action; 5] = [
    Action::SignOut,
    Action::LoadInbox,
    Action::ToggleFullscreen,
    Action::ToggleColorMode,
    Action::ToggleAccent,
];

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::SignOut => "Sign out",
            Action::LoadInbox => "Load inbox",
            Action::ToggleFullscreen => "Full screen",
            Action::ToggleColorMode => "Toggle theme",
            Action::ToggleAccent => "Toggle accent",
            Action::BeginSignIn => "Connect with Google",
        }
    }

    pub fn settings_action(index: usize) -> Option<Action> {
        SETTINGS_ACTIONS.get(index).copied()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Resolve a (zone, index, role) triple to the action it triggers, if any.
///
/// Only the primary role on an action-bearing zone resolves. Detail panel
/// actions are handled by the focus machine itself and never leave the core.
pub fn resolve(zone: FocusZone, index: usize, role: ButtonRole) -> Option<Action> {
    match (zone, role) {
        (FocusZone::Header | FocusZone::Settings, ButtonRole::Primary) => {
            Action::settings_action(index)
        }
        _ => None,
    }
}

pub type Callback = Box<dyn FnMut() + Send>;

#[derive(Default)]
pub struct ActionDispatcher {
    callbacks: HashMap<Action, Callback>,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    // Builder-style registration
    pub fn with(mut self, action: Action, callback: impl FnMut() + Send + 'static) -> Self {
        self.register(action, callback);
        self
    }

    pub fn register(&mut self, action: Action, callback: impl FnMut() + Send + 'static) {
        if self.callbacks.insert(action, Box::new(callback)).is_some() {
            warn!("Replacing callback registered for {:?}", action);
        }
    }

    pub fn is_registered(&self, action: Action) -> bool {
        self.callbacks.contains_key(&action)
    }

    /// Invoke the callback registered for `action` once.
    ///
    /// Returns false when nothing is registered.
    pub fn dispatch(&mut self, action: Action) -> bool {
        match self.callbacks.get_mut(&action) {
            Some(callback) => {
                info!("Dispatching {:?}", action);
                callback();
                true
            }
            None => {
                warn!("No callback registered for {:?}, dropping it", action);
                false
            }
        }
    }
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<&Action> = self.callbacks.keys().collect();
        registered.sort_by_key(|a| a.label());
        f.debug_struct("ActionDispatcher")
            .field("registered", &registered)
            .finish()
    }
}

//! Navigation core: turns sampled controller state into focus changes and
//! collaborator calls.
//!
//! # Frame pipeline
//!
//! ```text
//! snapshot ──► EdgeDetector ──► ModalGuard (interrupt open: stops here)
//!                    │
//!                    ▼
//!              focus::transition ◄── RepeatTimer (held up/down)
//!                    │
//!                    ▼
//!             ActionDispatcher ──► collaborators
//! ```
//!
//! [`NavContext`] owns every piece of cross-frame state and is passed by
//! `&mut` into each frame. Host commands (pointer input, item counts,
//! sign-in state) are applied after the controller pass, so pointer input
//! has the last word for the frame it arrives in.

pub mod diagnostics;
pub mod dispatcher;
pub mod focus;
pub mod modal;
pub mod repeat;

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::controller::event_collector::DeviceSnapshot;
use crate::controller::event_processor::{EdgeDetector, InputEvent, ProcessorSettings};

use self::diagnostics::{DiagnosticsTracker, DiagnosticsView};
use self::dispatcher::{Action, ActionDispatcher};
use self::focus::{
    ButtonRole, Effect, FocusOptions, FocusZone, NavEvent, NavState, PointerEvent,
    SelectionIndices, Transition,
};
use self::modal::{ModalGuard, ModalOutcome};
use self::repeat::{RepeatSettings, RepeatTimer};

/// Commands the host sends into the loop between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    SetAuthenticated(bool),
    SetItemCount(usize),
    SetCompactLayout(bool),
    Pointer(PointerEvent),
    CycleFocus,
    // Host refused fullscreen for lack of a user gesture
    FullscreenRefused,
}

// Everything the navigation core needs to know up front
#[derive(Clone, Debug)]
pub struct NavSettings {
    pub processor: ProcessorSettings,
    pub repeat: RepeatSettings,
    pub diagnostics_interval: Duration,
    pub focus: FocusOptions,
}

impl Default for NavSettings {
    fn default() -> Self {
        Self {
            processor: ProcessorSettings::default(),
            repeat: RepeatSettings::default(),
            diagnostics_interval: Duration::from_millis(200),
            focus: FocusOptions {
                confirm_fullscreen_from_pad: true,
            },
        }
    }
}

/// Published after every frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub zone: FocusZone,
    pub selection: SelectionIndices,
    pub item_count: usize,
    pub authenticated: bool,
    pub modal_open: bool,
    pub modal_armed: bool,
    #[serde(skip)]
    pub dispatched: Vec<Action>,
    pub scroll_into_view: Option<FocusZone>,
    pub diagnostics: DiagnosticsView,
}

#[derive(Debug, Default)]
struct FrameEffects {
    dispatched: Vec<Action>,
    scroll_into_view: Option<FocusZone>,
}

#[derive(Debug)]
pub struct NavContext {
    detector: EdgeDetector,
    repeat: RepeatTimer,
    modal: ModalGuard,
    state: NavState,
    options: FocusOptions,
    dispatcher: ActionDispatcher,
    diagnostics: DiagnosticsTracker,
    frames: u64,
}

impl NavContext {
    pub fn new(settings: NavSettings, dispatcher: ActionDispatcher) -> Self {
        Self {
            detector: EdgeDetector::new(settings.processor),
            repeat: RepeatTimer::new(settings.repeat),
            modal: ModalGuard::default(),
            state: NavState::default(),
            options: settings.focus,
            dispatcher,
            diagnostics: DiagnosticsTracker::new(settings.diagnostics_interval),
            frames: 0,
        }
    }

    pub fn state(&self) -> &NavState {
        &self.state
    }

    /// Run one frame.
    ///
    /// `now` is monotonic time since the loop started. `snapshot` is `None`
    /// when no controller is connected, which yields no controller events.
    pub fn frame(
        &mut self,
        now: Duration,
        snapshot: Option<&DeviceSnapshot>,
        commands: impl IntoIterator<Item = HostCommand>,
    ) -> FrameReport {
        self.frames += 1;
        let mut out = FrameEffects::default();

        self.diagnostics.observe(now, snapshot);
        match snapshot {
            Some(snapshot) => {
                let events = self.detector.process(snapshot);
                self.diagnostics.record(&events);
                if self.modal.is_open() {
                    self.run_modal(snapshot, &mut out);
                } else {
                    self.run_focus(now, snapshot, &events, &mut out);
                }
            }
            None => {
                self.detector.reset();
                self.repeat.reset();
            }
        }

        for command in commands {
            self.handle_command(command, &mut out);
        }

        self.report(out)
    }

    fn run_modal(&mut self, snapshot: &DeviceSnapshot, out: &mut FrameEffects) {
        let outcome = self.modal.observe(snapshot);
        self.finish_modal(outcome, out);
    }

    fn finish_modal(&mut self, outcome: ModalOutcome, out: &mut FrameEffects) {
        if outcome == ModalOutcome::Confirmed {
            self.dispatch(Action::ToggleFullscreen, out);
        }
    }

    fn run_focus(
        &mut self,
        now: Duration,
        snapshot: &DeviceSnapshot,
        events: &[InputEvent],
        out: &mut FrameEffects,
    ) {
        for event in events {
            let InputEvent::ButtonPressed { index } = *event else {
                continue;
            };
            let Some(role) = ButtonRole::from_index(index) else {
                continue;
            };
            self.apply(NavEvent::Press(role), out);
            if self.modal.is_open() {
                // The interrupt takes over for the rest of this frame
                return;
            }
        }

        let eligible = self.state.authenticated
            && matches!(self.state.zone, FocusZone::List | FocusZone::Settings);
        if !eligible {
            self.repeat.reset();
            return;
        }
        for direction in self.repeat.update(now, self.state.zone, snapshot) {
            self.apply(NavEvent::Step(direction), out);
        }
    }

    fn handle_command(&mut self, command: HostCommand, out: &mut FrameEffects) {
        debug!("Host command: {:?}", command);
        match command {
            HostCommand::SetAuthenticated(authenticated) => {
                self.apply(NavEvent::Authenticated(authenticated), out)
            }
            HostCommand::SetItemCount(count) => self.apply(NavEvent::ItemCount(count), out),
            HostCommand::SetCompactLayout(compact) => {
                self.apply(NavEvent::CompactLayout(compact), out)
            }
            HostCommand::FullscreenRefused => self.open_confirmation(),
            HostCommand::Pointer(PointerEvent::ConfirmFullscreen) => {
                let outcome = self.modal.confirm();
                self.finish_modal(outcome, out);
            }
            HostCommand::Pointer(PointerEvent::CancelFullscreen) => {
                let outcome = self.modal.cancel();
                self.finish_modal(outcome, out);
            }
            HostCommand::Pointer(_) | HostCommand::CycleFocus if self.modal.is_open() => {
                debug!("Ignoring {:?} while the confirmation is open", command);
            }
            HostCommand::Pointer(pointer) => self.apply(NavEvent::Pointer(pointer), out),
            HostCommand::CycleFocus => self.apply(NavEvent::CycleFocus, out),
        }
    }

    fn apply(&mut self, event: NavEvent, out: &mut FrameEffects) {
        let Transition { state, effects } = focus::transition(self.state, event, &self.options);
        if state.zone != self.state.zone {
            info!("Focus {:?} -> {:?} on {:?}", self.state.zone, state.zone, event);
        }
        self.state = state;

        for effect in effects {
            match effect {
                Effect::Dispatch(action) => self.dispatch(action, out),
                Effect::ConfirmFullscreen => self.open_confirmation(),
                Effect::ScrollIntoView(zone) => out.scroll_into_view = Some(zone),
            }
        }
    }

    fn open_confirmation(&mut self) {
        self.modal.open();
        self.repeat.reset();
    }

    fn dispatch(&mut self, action: Action, out: &mut FrameEffects) {
        self.dispatcher.dispatch(action);
        out.dispatched.push(action);
    }

    fn report(&self, out: FrameEffects) -> FrameReport {
        FrameReport {
            frame: self.frames,
            zone: self.state.zone,
            selection: self.state.selection,
            item_count: self.state.item_count,
            authenticated: self.state.authenticated,
            modal_open: self.modal.is_open(),
            modal_armed: self.modal.is_armed(),
            dispatched: out.dispatched,
            scroll_into_view: out.scroll_into_view,
            diagnostics: self.diagnostics.view().clone(),
        }
    }
}

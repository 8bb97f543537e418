use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use serde::{Deserialize, Serialize};
use statum::{machine, state};
use std::collections::VecDeque;
use tracing::{debug, error, info, warn};

// Button order of the standard gamepad layout. Index = button role number.
pub const STANDARD_BUTTONS: [Button; 17] = [
    Button::South,         // 0  primary
    Button::East,          // 1  secondary
    Button::West,          // 2
    Button::North,         // 3
    Button::LeftTrigger,   // 4  bumper left
    Button::RightTrigger,  // 5  bumper right
    Button::LeftTrigger2,  // 6
    Button::RightTrigger2, // 7
    Button::Select,        // 8
    Button::Start,         // 9  start
    Button::LeftThumb,     // 10
    Button::RightThumb,    // 11
    Button::DPadUp,        // 12
    Button::DPadDown,      // 13
    Button::DPadLeft,      // 14
    Button::DPadRight,     // 15
    Button::Mode,          // 16
];

// Axis order of the standard gamepad layout
pub const STANDARD_AXES: [Axis; 4] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
];

// One button reading for one frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonReading {
    pub pressed: bool,
    pub value: f32,
}

impl ButtonReading {
    pub fn pressed() -> Self {
        Self {
            pressed: true,
            value: 1.0,
        }
    }

    pub fn released() -> Self {
        Self::default()
    }
}

/// State of one controller as sampled in a single frame.
///
/// Recreated every frame and never retained. Reads past the end of either
/// sequence behave as "not pressed" / centred, so short arrays from odd
/// devices never fault.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub id: String,
    pub mapping: String,
    pub buttons: Vec<ButtonReading>,
    pub axes: Vec<f32>,
}

impl DeviceSnapshot {
    // Build a snapshot from plain pressed flags and axis values
    pub fn from_states(buttons: &[bool], axes: &[f32]) -> Self {
        Self {
            id: "replay".to_string(),
            mapping: "standard".to_string(),
            buttons: buttons
                .iter()
                .map(|&pressed| {
                    if pressed {
                        ButtonReading::pressed()
                    } else {
                        ButtonReading::released()
                    }
                })
                .collect(),
            axes: axes.to_vec(),
        }
    }

    // Build a snapshot of the standard layout with the given button roles held
    pub fn with_held(held: &[usize]) -> Self {
        let mut pressed = [false; STANDARD_BUTTONS.len()];
        for &index in held {
            if let Some(slot) = pressed.get_mut(index) {
                *slot = true;
            }
        }
        Self::from_states(&pressed, &[0.0; STANDARD_AXES.len()])
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.buttons.get(index).is_some_and(|b| b.pressed)
    }

    pub fn pressed_states(&self) -> Vec<bool> {
        self.buttons.iter().map(|b| b.pressed).collect()
    }

    pub fn button_values(&self) -> Vec<f32> {
        self.buttons.iter().map(|b| b.value).collect()
    }
}

/// Anything that can hand out one controller snapshot per frame.
///
/// `None` means no controller is connected this frame, which is not an error.
pub trait DeviceSource {
    fn poll(&mut self) -> Option<DeviceSnapshot>;
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),
}

// Poller lifecycle states
#[state]
#[derive(Debug, Clone)]
pub enum PollerState {
    Initializing,
    Polling,
}

#[machine]
#[derive(Debug)]
pub struct DevicePoller<S: PollerState> {
    // Gilrs context
    gilrs: Gilrs,

    // Controller the last snapshot came from
    active_gamepad: Option<GamepadId>,
}

// Implementation for Initializing state
impl DevicePoller<Initializing> {
    pub fn create() -> Result<Self, CollectorError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, None))
    }

    // Log what is plugged in and start polling
    pub fn initialize(self) -> DevicePoller<Polling> {
        let mut count = 0;
        for (id, gamepad) in self.gilrs.gamepads() {
            info!(
                "  [{}] ID: {}, Name: {}, UUID: {:?}",
                count,
                id,
                gamepad.name(),
                gamepad.uuid()
            );
            count += 1;
        }
        if count == 0 {
            warn!("No gamepad connected, polling in idle mode");
        } else {
            info!("Found {} gamepads, the first one drives navigation", count);
        }

        self.transition()
    }
}

// Implementation for Polling state
impl DevicePoller<Polling> {
    // Drain pending gilrs events so the cached gamepad state is current
    fn pump_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => info!("Controller {} connected", id),
                EventType::Disconnected => {
                    warn!("Controller {} disconnected", id);
                    if self.active_gamepad == Some(id) {
                        self.active_gamepad = None;
                    }
                }
                _ => {}
            }
        }
    }
}

impl DeviceSource for DevicePoller<Polling> {
    fn poll(&mut self) -> Option<DeviceSnapshot> {
        self.pump_events();

        let (id, gamepad) = self.gilrs.gamepads().next()?;
        if self.active_gamepad != Some(id) {
            debug!("Switching active gamepad to {} ({})", gamepad.name(), id);
            self.active_gamepad = Some(id);
        }

        let buttons = STANDARD_BUTTONS
            .iter()
            .map(|&button| {
                let pressed = gamepad.is_pressed(button);
                let value = gamepad
                    .button_data(button)
                    .map(|data| data.value())
                    .unwrap_or(if pressed { 1.0 } else { 0.0 });
                ButtonReading { pressed, value }
            })
            .collect();

        // gilrs reports stick Y up as positive, the standard layout as negative
        let axes = STANDARD_AXES
            .iter()
            .map(|&axis| match axis {
                Axis::LeftStickY | Axis::RightStickY => -gamepad.value(axis),
                _ => gamepad.value(axis),
            })
            .collect();

        Some(DeviceSnapshot {
            id: format!("{} ({})", gamepad.name(), id),
            mapping: "standard".to_string(),
            buttons,
            axes,
        })
    }
}

// Create the gilrs poller and move it straight to polling
pub fn open_gamepads() -> Result<DevicePoller<Polling>, CollectorError> {
    Ok(DevicePoller::<Initializing>::create()?.initialize())
}

/// Plays back a fixed sequence of frames.
///
/// Once the script is exhausted the last frame repeats, so a held button
/// stays held.
#[derive(Debug, Default)]
pub struct ReplaySource {
    frames: VecDeque<Option<DeviceSnapshot>>,
    last: Option<DeviceSnapshot>,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = Option<DeviceSnapshot>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            last: None,
        }
    }
}

impl DeviceSource for ReplaySource {
    fn poll(&mut self) -> Option<DeviceSnapshot> {
        if let Some(frame) = self.frames.pop_front() {
            self.last = frame;
        }
        self.last.clone()
    }
}

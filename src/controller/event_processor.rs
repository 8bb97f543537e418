use tracing::debug;

use crate::controller::event_collector::DeviceSnapshot;

// Minimum axis delta treated as intentional movement
pub const DEFAULT_AXIS_THRESHOLD: f32 = 0.2;

// Discrete input produced from two consecutive snapshots
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // Button went from released to pressed
    ButtonPressed { index: usize },
    // Axis moved further than the threshold since its stored value
    AxisChanged { index: usize, value: f32 },
}

// Previous frame as remembered by the detector
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrevDeviceState {
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
}

// Processor settings
#[derive(Clone, Debug)]
pub struct ProcessorSettings {
    pub axis_threshold: f32,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            axis_threshold: DEFAULT_AXIS_THRESHOLD,
        }
    }
}

/// Turns per-frame controller state into rising-edge and axis events.
///
/// Button history is replaced wholesale every frame. Axis history only moves
/// for axes that crossed the threshold, so slow drift accumulates until it
/// finally registers as one change.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    settings: ProcessorSettings,
    previous: PrevDeviceState,
    // Device the history belongs to, None until first contact
    device: Option<String>,
}

impl EdgeDetector {
    pub fn new(settings: ProcessorSettings) -> Self {
        Self {
            settings,
            previous: PrevDeviceState::default(),
            device: None,
        }
    }

    pub fn previous(&self) -> &PrevDeviceState {
        &self.previous
    }

    // Forget history so the next snapshot seeds it again
    pub fn reset(&mut self) {
        if self.device.is_some() {
            debug!("Edge detector history cleared");
        }
        self.previous = PrevDeviceState::default();
        self.device = None;
    }

    /// Compare `snapshot` with the stored previous frame.
    ///
    /// Button edges come first in ascending index order, then axis changes.
    /// On first contact with a device the history is seeded from the
    /// snapshot itself, so nothing is emitted for that frame.
    pub fn process(&mut self, snapshot: &DeviceSnapshot) -> Vec<InputEvent> {
        if self.device.as_deref() != Some(snapshot.id.as_str()) {
            debug!("Seeding edge history from {}", snapshot.id);
            self.previous = PrevDeviceState {
                buttons: snapshot.pressed_states(),
                axes: snapshot.axes.clone(),
            };
            self.device = Some(snapshot.id.clone());
        }

        let mut events = Vec::new();

        let current = snapshot.pressed_states();
        for (index, &is_pressed) in current.iter().enumerate() {
            let was_pressed = self.previous.buttons.get(index).copied().unwrap_or(false);
            if !was_pressed && is_pressed {
                debug!("Rising edge on button {}", index);
                events.push(InputEvent::ButtonPressed { index });
            }
        }
        self.previous.buttons = current;

        self.previous.axes.resize(snapshot.axes.len(), 0.0);
        for (index, &value) in snapshot.axes.iter().enumerate() {
            let stored = &mut self.previous.axes[index];
            if (value - *stored).abs() > self.settings.axis_threshold {
                debug!("Axis {} moved {:.4} -> {:.4}", index, *stored, value);
                events.push(InputEvent::AxisChanged { index, value });
                *stored = value;
            }
        }

        events
    }
}

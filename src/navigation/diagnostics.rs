use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::controller::event_collector::DeviceSnapshot;
use crate::controller::event_processor::InputEvent;

// Raw readings of the active controller, refreshed on a slow cadence
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeviceDiagnostics {
    pub id: String,
    pub mapping: String,
    pub buttons: Vec<f32>,
    pub axes: Vec<f32>,
    pub captured_at: DateTime<Local>,
}

// What the host shows in its diagnostics panel
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DiagnosticsView {
    pub connected: bool,
    pub last_command: Option<String>,
    pub device: Option<DeviceDiagnostics>,
}

#[derive(Debug)]
pub struct DiagnosticsTracker {
    interval: Duration,
    last_capture: Option<Duration>,
    view: DiagnosticsView,
}

impl DiagnosticsTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_capture: None,
            view: DiagnosticsView::default(),
        }
    }

    pub fn view(&self) -> &DiagnosticsView {
        &self.view
    }

    // Track connection state and refresh the throttled device readout
    pub fn observe(&mut self, now: Duration, snapshot: Option<&DeviceSnapshot>) {
        let Some(snapshot) = snapshot else {
            if self.view.connected {
                warn!("Gamepad disconnected");
                self.view.connected = false;
                self.last_capture = None;
            }
            return;
        };

        if !self.view.connected {
            info!("Gamepad connected: {}", snapshot.id);
            self.view.connected = true;
        }

        let due = match self.last_capture {
            Some(last) => now.saturating_sub(last) > self.interval,
            None => true,
        };
        if due {
            self.view.device = Some(DeviceDiagnostics {
                id: snapshot.id.clone(),
                mapping: snapshot.mapping.clone(),
                buttons: snapshot.button_values(),
                axes: snapshot.axes.clone(),
                captured_at: Local::now(),
            });
            self.last_capture = Some(now);
        }
    }

    // The latest event in frame order becomes the command label
    pub fn record(&mut self, events: &[InputEvent]) {
        if let Some(event) = events.last() {
            self.view.last_command = Some(match event {
                InputEvent::ButtonPressed { index } => format!("Button {}", index),
                InputEvent::AxisChanged { index, value } => format!("Axis {}: {:.2}", index, value),
            });
        }
    }
}

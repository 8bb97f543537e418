use std::time::Duration;
use tracing::debug;

use crate::controller::event_collector::DeviceSnapshot;
use crate::navigation::focus::{ButtonRole, FocusZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Up, Direction::Down];

    pub fn role(self) -> ButtonRole {
        match self {
            Direction::Up => ButtonRole::DpadUp,
            Direction::Down => ButtonRole::DpadDown,
        }
    }
}

// Repeat cadence
#[derive(Clone, Debug)]
pub struct RepeatSettings {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Default for RepeatSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            interval: Duration::from_millis(120),
        }
    }
}

// Timestamps of an ongoing hold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Hold {
    started_at: Duration,
    last_fired: Duration,
}

/// Press-and-hold repeat for the vertical d-pad.
///
/// The caller decides eligibility (zone, open panels, interrupt) and calls
/// [`RepeatTimer::reset`] whenever the timer must not run. Settings fires on
/// the very first held frame, the list does not because its rising edge
/// already moved the cursor.
#[derive(Debug, Default)]
pub struct RepeatTimer {
    settings: RepeatSettings,
    up: Option<Hold>,
    down: Option<Hold>,
}

impl RepeatTimer {
    pub fn new(settings: RepeatSettings) -> Self {
        Self {
            settings,
            up: None,
            down: None,
        }
    }

    pub fn reset(&mut self) {
        self.up = None;
        self.down = None;
    }

    pub fn is_idle(&self) -> bool {
        self.up.is_none() && self.down.is_none()
    }

    /// Advance both directions by one frame and return the steps to apply.
    pub fn update(&mut self, now: Duration, zone: FocusZone, snapshot: &DeviceSnapshot) -> Vec<Direction> {
        let fire_on_arm = zone == FocusZone::Settings;
        let mut steps = Vec::new();
        for direction in Direction::ALL {
            let held = snapshot.is_pressed(direction.role().index());
            let slot = match direction {
                Direction::Up => &mut self.up,
                Direction::Down => &mut self.down,
            };
            if tick(slot, held, now, fire_on_arm, &self.settings) {
                debug!("Repeat step {:?} at {}ms", direction, now.as_millis());
                steps.push(direction);
            }
        }
        steps
    }
}

fn tick(
    slot: &mut Option<Hold>,
    held: bool,
    now: Duration,
    fire_on_arm: bool,
    settings: &RepeatSettings,
) -> bool {
    if !held {
        *slot = None;
        return false;
    }
    match slot {
        None => {
            *slot = Some(Hold {
                started_at: now,
                last_fired: now,
            });
            fire_on_arm
        }
        Some(hold) => {
            let held_for = now.saturating_sub(hold.started_at);
            let since_last = now.saturating_sub(hold.last_fired);
            if held_for >= settings.initial_delay && since_last >= settings.interval {
                hold.last_fired = now;
                true
            } else {
                false
            }
        }
    }
}

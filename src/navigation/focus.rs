//! Focus state machine.
//!
//! One tagged [`FocusZone`] plus a small set of per-zone cursors replaces the
//! pile of "is open" flags a dashboard would otherwise carry. Every change
//! goes through [`transition`], a pure `(state, event) -> state` function, so
//! the whole navigation model can be exercised without rendering anything.
//!
//! The fullscreen confirmation interrupt is not a zone. The machine only asks
//! for it through [`Effect::ConfirmFullscreen`]; the zone underneath stays as
//! it was.

use serde::Serialize;
use tracing::debug;

use crate::navigation::dispatcher::{self, Action, SETTINGS_ACTIONS};
use crate::navigation::repeat::Direction;

pub const SETTINGS_ACTION_COUNT: usize = SETTINGS_ACTIONS.len();
pub const DETAIL_ACTION_COUNT: usize = 3;
// Detail actions 0 and 1 are placeholders, only this one does something
pub const DETAIL_CLOSE_INDEX: usize = 2;

/// Panes visited by the bumpers and by cycle focus, in order.
pub const PANE_RING: [FocusZone; 3] = [FocusZone::List, FocusZone::Secondary, FocusZone::Tertiary];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum FocusZone {
    Header,
    #[default]
    List,
    Secondary,
    Tertiary,
    Settings,
    MessageDetail,
}

/// Controller buttons that mean something to navigation, by standard index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonRole {
    Primary,
    Secondary,
    BumperLeft,
    BumperRight,
    Start,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl ButtonRole {
    pub const fn index(self) -> usize {
        match self {
            ButtonRole::Primary => 0,
            ButtonRole::Secondary => 1,
            ButtonRole::BumperLeft => 4,
            ButtonRole::BumperRight => 5,
            ButtonRole::Start => 9,
            ButtonRole::DpadUp => 12,
            ButtonRole::DpadDown => 13,
            ButtonRole::DpadLeft => 14,
            ButtonRole::DpadRight => 15,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ButtonRole::Primary),
            1 => Some(ButtonRole::Secondary),
            4 => Some(ButtonRole::BumperLeft),
            5 => Some(ButtonRole::BumperRight),
            9 => Some(ButtonRole::Start),
            12 => Some(ButtonRole::DpadUp),
            13 => Some(ButtonRole::DpadDown),
            14 => Some(ButtonRole::DpadLeft),
            15 => Some(ButtonRole::DpadRight),
            _ => None,
        }
    }
}

// Cursors, one per zone with selectable items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SelectionIndices {
    // Shared by header and settings drawer
    pub action: usize,
    pub list: usize,
    pub detail: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NavState {
    pub zone: FocusZone,
    pub selection: SelectionIndices,
    pub item_count: usize,
    pub authenticated: bool,
    pub compact: bool,
}

impl NavState {
    pub fn detail_open(&self) -> bool {
        self.zone == FocusZone::MessageDetail
    }
}

/// Pointer input reported by the host. Indices are row or action positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    HoverRow(usize),
    ClickRow(usize),
    HoverHeaderAction(usize),
    ClickHeaderAction(usize),
    HoverSettingsAction(usize),
    ClickSettingsAction(usize),
    ClickDetailAction(usize),
    ConfirmFullscreen,
    CancelFullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavEvent {
    // Rising edge of a controller button
    Press(ButtonRole),
    // Synthetic step from the repeat timer
    Step(Direction),
    Pointer(PointerEvent),
    // Keyboard-tab equivalent
    CycleFocus,
    Authenticated(bool),
    ItemCount(usize),
    CompactLayout(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Dispatch(Action),
    // Open the confirmation interrupt with a fullscreen toggle pending
    ConfirmFullscreen,
    ScrollIntoView(FocusZone),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FocusOptions {
    // Route controller-originated fullscreen toggles through the interrupt
    pub confirm_fullscreen_from_pad: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: NavState,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    Forward,
    Backward,
}

// Clamp only ever pulls an index down
fn clamp_index(index: usize, count: usize) -> usize {
    index.min(count.saturating_sub(1))
}

/// Apply one event to `state`.
pub fn transition(state: NavState, event: NavEvent, options: &FocusOptions) -> Transition {
    let mut next = state;
    let mut effects = Vec::new();

    match event {
        NavEvent::Authenticated(authenticated) => next.authenticated = authenticated,
        NavEvent::CompactLayout(compact) => next.compact = compact,
        NavEvent::ItemCount(count) => {
            next.item_count = count;
            next.selection.list = clamp_index(next.selection.list, count);
        }
        _ if !state.authenticated => {
            if event == NavEvent::Press(ButtonRole::Primary) {
                effects.push(Effect::Dispatch(Action::BeginSignIn));
            }
        }
        NavEvent::Press(role) => press(&mut next, role, options, &mut effects),
        NavEvent::Step(direction) => step(&mut next, direction),
        NavEvent::Pointer(pointer) => point(&mut next, pointer, &mut effects),
        NavEvent::CycleFocus => cycle(&mut next, Cycle::Forward, &mut effects),
    }

    Transition {
        state: next,
        effects,
    }
}

fn press(state: &mut NavState, role: ButtonRole, options: &FocusOptions, effects: &mut Vec<Effect>) {
    let zone = state.zone;
    match role {
        ButtonRole::Primary => match zone {
            FocusZone::Header | FocusZone::Settings => {
                if let Some(action) = dispatcher::resolve(zone, state.selection.action, role) {
                    activate(action, true, options, effects);
                }
            }
            FocusZone::List if state.item_count >= 1 => {
                state.zone = FocusZone::MessageDetail;
                state.selection.detail = 0;
            }
            FocusZone::MessageDetail if state.selection.detail == DETAIL_CLOSE_INDEX => {
                state.zone = FocusZone::List;
            }
            _ => debug!("Primary is inert in {:?}", zone),
        },
        ButtonRole::Secondary => match zone {
            FocusZone::MessageDetail | FocusZone::Settings => state.zone = FocusZone::List,
            _ => {}
        },
        ButtonRole::Start => {
            state.zone = if zone == FocusZone::Settings {
                FocusZone::List
            } else {
                FocusZone::Settings
            };
        }
        ButtonRole::BumperRight => cycle(state, Cycle::Forward, effects),
        ButtonRole::BumperLeft => cycle(state, Cycle::Backward, effects),
        ButtonRole::DpadRight => match zone {
            FocusZone::MessageDetail => {
                state.selection.detail = clamp_index(state.selection.detail + 1, DETAIL_ACTION_COUNT)
            }
            FocusZone::Header | FocusZone::Settings => {
                state.selection.action = clamp_index(state.selection.action + 1, SETTINGS_ACTION_COUNT)
            }
            FocusZone::List => state.zone = FocusZone::Secondary,
            _ => {}
        },
        ButtonRole::DpadLeft => match zone {
            FocusZone::MessageDetail => {
                state.selection.detail = state.selection.detail.saturating_sub(1)
            }
            FocusZone::Header | FocusZone::Settings => {
                state.selection.action = state.selection.action.saturating_sub(1)
            }
            FocusZone::Secondary | FocusZone::Tertiary => state.zone = FocusZone::List,
            _ => {}
        },
        // Vertical movement in settings comes from repeat steps only
        ButtonRole::DpadDown => match zone {
            FocusZone::List => {
                state.selection.list = clamp_index(state.selection.list + 1, state.item_count)
            }
            FocusZone::Secondary => state.zone = FocusZone::Tertiary,
            _ => {}
        },
        ButtonRole::DpadUp => match zone {
            FocusZone::List => state.selection.list = state.selection.list.saturating_sub(1),
            FocusZone::Tertiary => state.zone = FocusZone::Secondary,
            _ => {}
        },
    }
}

fn step(state: &mut NavState, direction: Direction) {
    match (state.zone, direction) {
        (FocusZone::Settings, Direction::Down) => {
            state.selection.action = clamp_index(state.selection.action + 1, SETTINGS_ACTION_COUNT)
        }
        (FocusZone::Settings, Direction::Up) => {
            state.selection.action = state.selection.action.saturating_sub(1)
        }
        (FocusZone::List, Direction::Down) => {
            state.selection.list = clamp_index(state.selection.list + 1, state.item_count)
        }
        (FocusZone::List, Direction::Up) => {
            state.selection.list = state.selection.list.saturating_sub(1)
        }
        (zone, _) => debug!("Repeat step ignored in {:?}", zone),
    }
}

fn point(state: &mut NavState, pointer: PointerEvent, effects: &mut Vec<Effect>) {
    match pointer {
        PointerEvent::HoverRow(row) | PointerEvent::ClickRow(row) => {
            if row >= state.item_count {
                debug!("Pointer on row {} outside {} items", row, state.item_count);
                return;
            }
            state.selection.list = row;
            if matches!(pointer, PointerEvent::ClickRow(_)) {
                state.zone = FocusZone::MessageDetail;
                state.selection.detail = 0;
            } else {
                state.zone = FocusZone::List;
            }
        }
        PointerEvent::HoverHeaderAction(index)
        | PointerEvent::ClickHeaderAction(index)
        | PointerEvent::HoverSettingsAction(index)
        | PointerEvent::ClickSettingsAction(index) => {
            let Some(action) = Action::settings_action(index) else {
                debug!("Pointer on action {} outside the drawer", index);
                return;
            };
            state.zone = match pointer {
                PointerEvent::HoverHeaderAction(_) | PointerEvent::ClickHeaderAction(_) => {
                    FocusZone::Header
                }
                _ => FocusZone::Settings,
            };
            state.selection.action = index;
            if matches!(
                pointer,
                PointerEvent::ClickHeaderAction(_) | PointerEvent::ClickSettingsAction(_)
            ) {
                // A click is a real gesture, no confirmation needed
                activate(action, false, &FocusOptions::default(), effects);
            }
        }
        PointerEvent::ClickDetailAction(index) => {
            if !state.detail_open() || index >= DETAIL_ACTION_COUNT {
                return;
            }
            state.selection.detail = index;
            if index == DETAIL_CLOSE_INDEX {
                state.zone = FocusZone::List;
            }
        }
        // Owned by the confirmation interrupt
        PointerEvent::ConfirmFullscreen | PointerEvent::CancelFullscreen => {}
    }
}

fn activate(action: Action, from_pad: bool, options: &FocusOptions, effects: &mut Vec<Effect>) {
    if action == Action::ToggleFullscreen && from_pad && options.confirm_fullscreen_from_pad {
        effects.push(Effect::ConfirmFullscreen);
    } else {
        effects.push(Effect::Dispatch(action));
    }
}

fn cycle(state: &mut NavState, cycle: Cycle, effects: &mut Vec<Effect>) {
    if matches!(state.zone, FocusZone::Settings | FocusZone::MessageDetail) {
        return;
    }
    let next = match PANE_RING.iter().position(|&zone| zone == state.zone) {
        Some(position) => {
            let offset = match cycle {
                Cycle::Forward => 1,
                Cycle::Backward => PANE_RING.len() - 1,
            };
            PANE_RING[(position + offset) % PANE_RING.len()]
        }
        None => FocusZone::List,
    };
    state.zone = next;
    if state.compact {
        effects.push(Effect::ScrollIntoView(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(zone: FocusZone, items: usize) -> NavState {
        NavState {
            zone,
            item_count: items,
            authenticated: true,
            ..NavState::default()
        }
    }

    fn run(state: NavState, events: &[NavEvent]) -> (NavState, Vec<Effect>) {
        let options = FocusOptions::default();
        let mut effects = Vec::new();
        let state = events.iter().fold(state, |state, &event| {
            let t = transition(state, event, &options);
            effects.extend(t.effects);
            t.state
        });
        (state, effects)
    }

    fn press(role: ButtonRole) -> NavEvent {
        NavEvent::Press(role)
    }

    #[test]
    fn role_indices_round_trip() {
        for index in 0..20 {
            if let Some(role) = ButtonRole::from_index(index) {
                assert_eq!(role.index(), index);
            }
        }
        assert_eq!(ButtonRole::from_index(2), None);
    }

    #[test]
    fn signed_out_primary_begins_sign_in_and_nothing_else_moves() {
        let state = NavState::default();
        let (next, effects) = run(
            state,
            &[
                press(ButtonRole::Primary),
                press(ButtonRole::Start),
                press(ButtonRole::DpadRight),
                NavEvent::CycleFocus,
            ],
        );
        assert_eq!(next, state);
        assert_eq!(effects, vec![Effect::Dispatch(Action::BeginSignIn)]);
    }

    #[test]
    fn primary_on_list_opens_detail_at_first_action() {
        let mut state = signed_in(FocusZone::List, 3);
        state.selection.detail = 2;
        let (next, _) = run(state, &[press(ButtonRole::Primary)]);
        assert_eq!(next.zone, FocusZone::MessageDetail);
        assert_eq!(next.selection.detail, 0);
    }

    #[test]
    fn primary_on_empty_list_is_inert() {
        let state = signed_in(FocusZone::List, 0);
        let (next, effects) = run(state, &[press(ButtonRole::Primary)]);
        assert_eq!(next, state);
        assert!(effects.is_empty());
    }

    #[test]
    fn only_close_action_leaves_detail() {
        let state = signed_in(FocusZone::List, 2);
        let (next, _) = run(
            state,
            &[press(ButtonRole::Primary), press(ButtonRole::Primary)],
        );
        assert_eq!(next.zone, FocusZone::MessageDetail);

        let (next, _) = run(
            next,
            &[
                press(ButtonRole::DpadRight),
                press(ButtonRole::DpadRight),
                press(ButtonRole::DpadRight),
            ],
        );
        assert_eq!(next.selection.detail, 2);

        let (next, _) = run(next, &[press(ButtonRole::Primary)]);
        assert_eq!(next.zone, FocusZone::List);
    }

    #[test]
    fn secondary_closes_detail_then_settings() {
        let (next, _) = run(signed_in(FocusZone::MessageDetail, 1), &[press(ButtonRole::Secondary)]);
        assert_eq!(next.zone, FocusZone::List);

        let (next, _) = run(signed_in(FocusZone::Settings, 1), &[press(ButtonRole::Secondary)]);
        assert_eq!(next.zone, FocusZone::List);

        let (next, _) = run(signed_in(FocusZone::Tertiary, 1), &[press(ButtonRole::Secondary)]);
        assert_eq!(next.zone, FocusZone::Tertiary);
    }

    #[test]
    fn start_toggles_settings() {
        let state = signed_in(FocusZone::Tertiary, 1);
        let (next, _) = run(state, &[press(ButtonRole::Start)]);
        assert_eq!(next.zone, FocusZone::Settings);
        let (next, _) = run(next, &[press(ButtonRole::Start)]);
        assert_eq!(next.zone, FocusZone::List);
    }

    #[test]
    fn settings_primary_dispatches_bound_action() {
        let mut state = signed_in(FocusZone::Settings, 0);
        state.selection.action = 1;
        let (_, effects) = run(state, &[press(ButtonRole::Primary)]);
        assert_eq!(effects, vec![Effect::Dispatch(Action::LoadInbox)]);
    }

    #[test]
    fn pad_fullscreen_goes_through_confirmation_when_configured() {
        let mut state = signed_in(FocusZone::Settings, 0);
        state.selection.action = 2;
        let options = FocusOptions {
            confirm_fullscreen_from_pad: true,
        };
        let t = transition(state, press(ButtonRole::Primary), &options);
        assert_eq!(t.effects, vec![Effect::ConfirmFullscreen]);
        assert_eq!(t.state.zone, FocusZone::Settings);

        let t = transition(state, press(ButtonRole::Primary), &FocusOptions::default());
        assert_eq!(t.effects, vec![Effect::Dispatch(Action::ToggleFullscreen)]);
    }

    #[test]
    fn pointer_click_on_fullscreen_dispatches_directly() {
        let options = FocusOptions {
            confirm_fullscreen_from_pad: true,
        };
        let t = transition(
            signed_in(FocusZone::List, 0),
            NavEvent::Pointer(PointerEvent::ClickSettingsAction(2)),
            &options,
        );
        assert_eq!(t.state.zone, FocusZone::Settings);
        assert_eq!(t.state.selection.action, 2);
        assert_eq!(t.effects, vec![Effect::Dispatch(Action::ToggleFullscreen)]);
    }

    #[test]
    fn settings_dpad_moves_within_drawer() {
        let state = signed_in(FocusZone::Settings, 0);
        let rights = vec![press(ButtonRole::DpadRight); 7];
        let (next, _) = run(state, &rights);
        assert_eq!(next.selection.action, 4);
        let (next, _) = run(next, &[press(ButtonRole::DpadLeft); 9]);
        assert_eq!(next.selection.action, 0);
    }

    #[test]
    fn settings_ignores_vertical_edges_but_follows_steps() {
        let state = signed_in(FocusZone::Settings, 0);
        let (next, _) = run(state, &[press(ButtonRole::DpadDown)]);
        assert_eq!(next.selection.action, 0);

        let (next, _) = run(next, &[NavEvent::Step(Direction::Down); 6]);
        assert_eq!(next.selection.action, 4);
        let (next, _) = run(next, &[NavEvent::Step(Direction::Up)]);
        assert_eq!(next.selection.action, 3);
    }

    #[test]
    fn list_vertical_movement_clamps() {
        let state = signed_in(FocusZone::List, 3);
        let (next, _) = run(state, &[press(ButtonRole::DpadDown); 5]);
        assert_eq!(next.selection.list, 2);
        let (next, _) = run(next, &[press(ButtonRole::DpadUp); 5]);
        assert_eq!(next.selection.list, 0);
    }

    #[test]
    fn detail_ignores_vertical_input() {
        let state = signed_in(FocusZone::MessageDetail, 3);
        let (next, _) = run(
            state,
            &[
                press(ButtonRole::DpadDown),
                press(ButtonRole::DpadUp),
                NavEvent::Step(Direction::Down),
            ],
        );
        assert_eq!(next, state);
    }

    #[test]
    fn horizontal_dpad_between_list_and_panes() {
        let state = signed_in(FocusZone::List, 1);
        let (next, _) = run(state, &[press(ButtonRole::DpadRight)]);
        assert_eq!(next.zone, FocusZone::Secondary);
        let (next, _) = run(next, &[press(ButtonRole::DpadRight)]);
        assert_eq!(next.zone, FocusZone::Secondary);
        let (next, _) = run(next, &[press(ButtonRole::DpadDown)]);
        assert_eq!(next.zone, FocusZone::Tertiary);
        let (next, _) = run(next, &[press(ButtonRole::DpadLeft)]);
        assert_eq!(next.zone, FocusZone::List);
    }

    #[test]
    fn secondary_tertiary_vertical_moves() {
        let (next, _) = run(signed_in(FocusZone::Secondary, 1), &[press(ButtonRole::DpadUp)]);
        assert_eq!(next.zone, FocusZone::Secondary);
        let (next, _) = run(signed_in(FocusZone::Tertiary, 1), &[press(ButtonRole::DpadUp)]);
        assert_eq!(next.zone, FocusZone::Secondary);
        let (next, _) = run(signed_in(FocusZone::Tertiary, 1), &[press(ButtonRole::DpadDown)]);
        assert_eq!(next.zone, FocusZone::Tertiary);
    }

    #[test]
    fn cycling_forward_three_times_returns_to_list() {
        let state = signed_in(FocusZone::List, 1);
        let (next, _) = run(state, &[NavEvent::CycleFocus]);
        assert_eq!(next.zone, FocusZone::Secondary);
        let (next, _) = run(next, &[NavEvent::CycleFocus, NavEvent::CycleFocus]);
        assert_eq!(next.zone, FocusZone::List);

        let (next, _) = run(state, &[press(ButtonRole::BumperRight); 3]);
        assert_eq!(next.zone, FocusZone::List);
        let (next, _) = run(state, &[press(ButtonRole::BumperLeft)]);
        assert_eq!(next.zone, FocusZone::Tertiary);
    }

    #[test]
    fn cycling_is_gated_by_settings_and_detail() {
        for zone in [FocusZone::Settings, FocusZone::MessageDetail] {
            let state = signed_in(zone, 1);
            let (next, _) = run(
                state,
                &[
                    NavEvent::CycleFocus,
                    press(ButtonRole::BumperRight),
                    press(ButtonRole::BumperLeft),
                ],
            );
            assert_eq!(next.zone, zone);
        }
    }

    #[test]
    fn compact_layout_requests_scroll_on_cycle() {
        let mut state = signed_in(FocusZone::List, 1);
        let (_, effects) = run(state, &[NavEvent::CycleFocus]);
        assert!(effects.is_empty());

        state.compact = true;
        let (_, effects) = run(state, &[NavEvent::CycleFocus, press(ButtonRole::BumperLeft)]);
        assert_eq!(
            effects,
            vec![
                Effect::ScrollIntoView(FocusZone::Secondary),
                Effect::ScrollIntoView(FocusZone::List),
            ]
        );
    }

    #[test]
    fn header_joins_pane_ring_at_list() {
        let (next, _) = run(signed_in(FocusZone::Header, 1), &[NavEvent::CycleFocus]);
        assert_eq!(next.zone, FocusZone::List);
    }

    #[test]
    fn shrinking_item_count_clamps_down_only() {
        let mut state = signed_in(FocusZone::List, 3);
        state.selection.list = 2;
        let (next, _) = run(state, &[NavEvent::ItemCount(2)]);
        assert_eq!(next.selection.list, 1);

        let (next, _) = run(next, &[NavEvent::ItemCount(10)]);
        assert_eq!(next.selection.list, 1);

        let (next, _) = run(next, &[NavEvent::ItemCount(0)]);
        assert_eq!(next.selection.list, 0);
    }

    #[test]
    fn pointer_hover_and_click_on_rows() {
        let state = signed_in(FocusZone::Settings, 4);
        let (next, _) = run(state, &[NavEvent::Pointer(PointerEvent::HoverRow(3))]);
        assert_eq!(next.zone, FocusZone::List);
        assert_eq!(next.selection.list, 3);

        let (next, _) = run(next, &[NavEvent::Pointer(PointerEvent::ClickRow(1))]);
        assert_eq!(next.zone, FocusZone::MessageDetail);
        assert_eq!(next.selection.list, 1);
        assert_eq!(next.selection.detail, 0);

        let (after, _) = run(next, &[NavEvent::Pointer(PointerEvent::HoverRow(9))]);
        assert_eq!(after, next);
    }

    #[test]
    fn pointer_detail_close() {
        let state = signed_in(FocusZone::MessageDetail, 1);
        let (next, _) = run(state, &[NavEvent::Pointer(PointerEvent::ClickDetailAction(1))]);
        assert_eq!(next.zone, FocusZone::MessageDetail);
        assert_eq!(next.selection.detail, 1);
        let (next, _) = run(next, &[NavEvent::Pointer(PointerEvent::ClickDetailAction(2))]);
        assert_eq!(next.zone, FocusZone::List);
    }

    #[test]
    fn header_hover_shares_action_index() {
        let state = signed_in(FocusZone::List, 1);
        let (next, effects) = run(state, &[NavEvent::Pointer(PointerEvent::HoverHeaderAction(3))]);
        assert_eq!(next.zone, FocusZone::Header);
        assert_eq!(next.selection.action, 3);
        assert!(effects.is_empty());

        let (_, effects) = run(next, &[press(ButtonRole::Primary)]);
        assert_eq!(effects, vec![Effect::Dispatch(Action::ToggleColorMode)]);
    }
}

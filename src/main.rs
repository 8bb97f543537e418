pub mod config;
pub mod controller;
pub mod navigation;

use crate::config::NavigatorConfig;
use crate::controller::controller_handle::{open_gamepads, NavigationHandle};
use crate::controller::event_collector::{DeviceSnapshot, ReplaySource};
use crate::navigation::dispatcher::{Action, ActionDispatcher};
use crate::navigation::focus::{ButtonRole, FocusZone};
use crate::navigation::{FrameReport, HostCommand};
use color_eyre::{eyre::eyre, Result};
use tokio::sync::watch;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

// Set to run a scripted session instead of reading real gamepads
const DEMO_ENV: &str = "PADNAV_DEMO";

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = NavigatorConfig::default_path()?;
    NavigatorConfig::ensure_default_config(&config_path)?;
    let config = NavigatorConfig::load(&config_path)?;

    let demo = std::env::var(DEMO_ENV).is_ok();
    let dispatcher = logging_collaborators();

    let handle = if demo {
        info!("{} set, replaying a scripted session", DEMO_ENV);
        NavigationHandle::spawn(
            config.controller_settings(),
            config.nav_settings(),
            dispatcher,
            || Ok(ReplaySource::new(demo_script())),
        )
        .await
    } else {
        NavigationHandle::spawn(
            config.controller_settings(),
            config.nav_settings(),
            dispatcher,
            open_gamepads,
        )
        .await
    }
    .map_err(|e| eyre!("Failed to spawn navigation loop: {}", e))?;

    handle
        .send(HostCommand::SetCompactLayout(config.layout.compact))
        .await?;
    if demo {
        handle.send(HostCommand::SetAuthenticated(true)).await?;
        handle.send(HostCommand::SetItemCount(12)).await?;
    }

    let mut reports = handle.subscribe();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, shutting down"),
        _ = watch_reports(&mut reports) => warn!("Frame loop stopped publishing"),
    }

    handle.shutdown().await?;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

// Stand-ins for the inbox, theme and session collaborators
fn logging_collaborators() -> ActionDispatcher {
    [
        Action::SignOut,
        Action::LoadInbox,
        Action::ToggleFullscreen,
        Action::ToggleColorMode,
        Action::ToggleAccent,
        Action::BeginSignIn,
    ]
    .into_iter()
    .fold(ActionDispatcher::new(), |dispatcher, action| {
        dispatcher.with(action, move || info!("Collaborator invoked: {}", action))
    })
}

// Log focus movement as the host would render it
async fn watch_reports(reports: &mut watch::Receiver<FrameReport>) {
    let mut last: Option<(FocusZone, bool, bool)> = None;
    while reports.changed().await.is_ok() {
        let report = reports.borrow_and_update().clone();

        let current = (
            report.zone,
            report.modal_open,
            report.diagnostics.connected,
        );
        if last != Some(current) {
            info!(
                "Zone {:?}, selection {:?}, modal open: {}, controller connected: {}",
                report.zone, report.selection, report.modal_open, report.diagnostics.connected
            );
            last = Some(current);
        }
        if let Some(zone) = report.scroll_into_view {
            info!("Scroll {:?} into view", zone);
        }
    }
}

// Browse the list, open an item, then open settings and back out
fn demo_script() -> Vec<Option<DeviceSnapshot>> {
    let idle = || Some(DeviceSnapshot::with_held(&[]));
    let hold = |role: ButtonRole, frames: usize| {
        std::iter::repeat_with(move || Some(DeviceSnapshot::with_held(&[role.index()])))
            .take(frames)
    };

    let mut script = vec![None; 10];
    script.extend(std::iter::repeat_with(idle).take(10));
    script.extend(hold(ButtonRole::DpadDown, 60));
    script.extend(std::iter::repeat_with(idle).take(10));
    script.extend(hold(ButtonRole::Primary, 3));
    script.extend(std::iter::repeat_with(idle).take(20));
    script.extend(hold(ButtonRole::Start, 3));
    script.extend(std::iter::repeat_with(idle).take(10));
    script.extend(hold(ButtonRole::DpadDown, 30));
    script.extend(std::iter::repeat_with(idle).take(10));
    script.extend(hold(ButtonRole::Secondary, 3));
    script.extend(std::iter::repeat_with(idle).take(10));
    script
}

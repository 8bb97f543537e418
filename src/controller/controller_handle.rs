use chrono::Local;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// Re-export types that need to be public
pub use crate::controller::event_collector::{open_gamepads, CollectorError, DeviceSource};
use crate::navigation::dispatcher::ActionDispatcher;
use crate::navigation::{FrameReport, HostCommand, NavContext, NavSettings};

// Loop settings
#[derive(Clone, Debug)]
pub struct ControllerSettings {
    pub frame_interval_ms: u64,
    pub command_buffer: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            command_buffer: 100,
        }
    }
}

// Controller errors
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Collector error: {0}")]
    CollectorError(#[from] CollectorError),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),
}

/// Handle to the running frame loop.
///
/// The loop lives on its own thread and owns the device source together with
/// the whole [`NavContext`]. The handle only talks to it through channels.
/// Dropping the handle stops the loop.
pub struct NavigationHandle {
    command_sender: mpsc::Sender<HostCommand>,
    state_receiver: watch::Receiver<FrameReport>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl NavigationHandle {
    /// Start the frame loop.
    ///
    /// `make_source` runs on the loop thread, so the source itself never
    /// crosses threads. Fails if the source cannot be created.
    pub async fn spawn<S, F>(
        settings: ControllerSettings,
        nav_settings: NavSettings,
        dispatcher: ActionDispatcher,
        make_source: F,
    ) -> Result<Self, ControllerError>
    where
        S: DeviceSource + 'static,
        F: FnOnce() -> Result<S, CollectorError> + Send + 'static,
    {
        info!("Spawning navigation loop with settings: {:?}", settings);

        let (command_sender, command_receiver) = mpsc::channel(settings.command_buffer.max(1));
        let (state_sender, state_receiver) = watch::channel(FrameReport::default());
        let (ready_sender, ready_receiver) = oneshot::channel();
        let cancel = CancellationToken::new();

        let context = NavContext::new(nav_settings, dispatcher);
        let frame_interval = Duration::from_millis(settings.frame_interval_ms);
        let loop_cancel = cancel.clone();

        let thread = thread::Builder::new()
            .name("nav-frame-loop".to_string())
            .spawn(move || {
                let source = match make_source() {
                    Ok(source) => {
                        let _ = ready_sender.send(Ok(()));
                        source
                    }
                    Err(e) => {
                        error!("Failed to create device source: {}", e);
                        let _ = ready_sender.send(Err(e));
                        return;
                    }
                };
                run_frame_loop(
                    source,
                    context,
                    command_receiver,
                    state_sender,
                    loop_cancel,
                    frame_interval,
                );
            })
            .map_err(|e| ControllerError::InitializationError(e.to_string()))?;

        match ready_receiver.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e.into());
            }
            Err(_) => {
                return Err(ControllerError::InitializationError(
                    "frame loop exited before reporting readiness".to_string(),
                ))
            }
        }

        info!("Navigation loop successfully started");
        Ok(Self {
            command_sender,
            state_receiver,
            cancel,
            thread: Some(thread),
        })
    }

    // Get a receiver for the per-frame report
    pub fn subscribe(&self) -> watch::Receiver<FrameReport> {
        self.state_receiver.clone()
    }

    pub async fn send(&self, command: HostCommand) -> Result<(), ControllerError> {
        self.command_sender
            .send(command)
            .await
            .map_err(|e| ControllerError::ChannelError(e.to_string()))
    }

    // Stop rescheduling and wait for the loop thread to finish
    pub async fn shutdown(mut self) -> Result<(), ControllerError> {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .map_err(|e| ControllerError::ChannelError(e.to_string()))?
                .map_err(|_| ControllerError::ChannelError("frame loop panicked".to_string()))?;
        }
        info!("Navigation loop stopped");
        Ok(())
    }
}

impl Drop for NavigationHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// Run frames until cancelled
fn run_frame_loop<S: DeviceSource>(
    mut source: S,
    mut context: NavContext,
    mut commands: mpsc::Receiver<HostCommand>,
    state_sender: watch::Sender<FrameReport>,
    cancel: CancellationToken,
    frame_interval: Duration,
) {
    info!(
        "Starting frame loop with {}ms interval",
        frame_interval.as_millis()
    );
    let started = Instant::now();

    // Stats for performance monitoring
    let mut frames: u64 = 0;
    let mut overruns: u64 = 0;
    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(30);
    let mut commands_open = true;

    while !cancel.is_cancelled() {
        let frame_start = Instant::now();
        let now = frame_start.duration_since(started);

        let snapshot = source.poll();

        let mut pending = Vec::new();
        while commands_open {
            match commands.try_recv() {
                Ok(command) => pending.push(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("Host command channel closed, continuing with controller input only");
                    commands_open = false;
                }
            }
        }

        let report = context.frame(now, snapshot.as_ref(), pending);
        if !report.dispatched.is_empty() {
            debug!("Frame {} dispatched {:?}", report.frame, report.dispatched);
        }
        if state_sender.send(report).is_err() {
            debug!("No frame report subscribers left");
        }
        frames += 1;

        let elapsed = frame_start.elapsed();
        match frame_interval.checked_sub(elapsed) {
            Some(rest) => thread::sleep(rest),
            None => overruns += 1,
        }

        // Log stats periodically
        let wall = Local::now();
        if wall - last_stats_time > stats_interval {
            info!(
                "Frame loop stats: {} frames, {} overruns since {}",
                frames,
                overruns,
                last_stats_time.format("%H:%M:%S.%3f")
            );
            frames = 0;
            overruns = 0;
            last_stats_time = wall;
        }
    }

    info!("Frame loop cancelled after {:.1}s", started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::event_collector::{DeviceSnapshot, ReplaySource};
    use crate::navigation::dispatcher::Action;
    use crate::navigation::focus::{FocusZone, PointerEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> ControllerSettings {
        ControllerSettings {
            frame_interval_ms: 2,
            command_buffer: 16,
        }
    }

    async fn wait_for(
        receiver: &mut watch::Receiver<FrameReport>,
        condition: impl Fn(&FrameReport) -> bool,
    ) -> bool {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if condition(&receiver.borrow_and_update()) {
                    return;
                }
                if receiver.changed().await.is_err() {
                    return;
                }
            }
        })
        .await
        .is_ok()
    }

    #[tokio::test]
    async fn held_primary_signs_in_exactly_once() {
        let sign_ins = Arc::new(AtomicUsize::new(0));
        let dispatcher = ActionDispatcher::new().with(Action::BeginSignIn, {
            let sign_ins = sign_ins.clone();
            move || {
                sign_ins.fetch_add(1, Ordering::SeqCst);
            }
        });

        let handle = NavigationHandle::spawn(fast(), NavSettings::default(), dispatcher, || {
            Ok(ReplaySource::new([
                Some(DeviceSnapshot::with_held(&[])),
                Some(DeviceSnapshot::with_held(&[0])),
            ]))
        })
        .await
        .unwrap();

        let mut reports = handle.subscribe();
        assert!(wait_for(&mut reports, |r| r.frame > 20).await);
        handle.shutdown().await.unwrap();

        assert_eq!(sign_ins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn host_commands_reach_the_loop() {
        let handle = NavigationHandle::spawn(
            fast(),
            NavSettings::default(),
            ActionDispatcher::new(),
            || Ok(ReplaySource::default()),
        )
        .await
        .unwrap();

        handle.send(HostCommand::SetAuthenticated(true)).await.unwrap();
        handle.send(HostCommand::SetItemCount(4)).await.unwrap();
        handle
            .send(HostCommand::Pointer(PointerEvent::ClickRow(2)))
            .await
            .unwrap();

        let mut reports = handle.subscribe();
        assert!(
            wait_for(&mut reports, |r| {
                r.zone == FocusZone::MessageDetail && r.selection.list == 2
            })
            .await
        );
        assert!(!reports.borrow().diagnostics.connected);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failing_source_fails_spawn() {
        let result = NavigationHandle::spawn(
            fast(),
            NavSettings::default(),
            ActionDispatcher::new(),
            || -> Result<ReplaySource, CollectorError> {
                Err(CollectorError::InitializationError("no backend".to_string()))
            },
        )
        .await;
        assert!(matches!(result, Err(ControllerError::CollectorError(_))));
    }
}

//! Controller side of the navigation loop
//!
//! 1. [`event_collector`] - Samples the first connected gamepad once per frame
//! 2. [`event_processor`] - Turns consecutive snapshots into rising edges and axis changes
//! 3. [`controller_handle`] - Owns the frame loop thread and its channels
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► DevicePoller ──► EdgeDetector ──► NavContext ──► FrameReport
//!             (Snapshot)       (InputEvent)     (focus, modal)
//! ```
//!
//! The loop runs on a dedicated thread at roughly display rate (16ms by
//! default) so held buttons and the repeat timer feel immediate.

pub mod controller_handle;
pub mod event_collector;
pub mod event_processor;

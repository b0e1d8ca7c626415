// SPDX-License-Identifier: GPL-3.0-only

//! Message types flowing through the session inbox and out to the UI

use crate::engine::{EngineEvent, NormalizedPoint};
use crate::errors::EngineError;
use crate::session::state::{ActiveControl, CaptureMode};
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;

/// User gestures, delivered through the inbox like every other input
#[derive(Debug, Clone)]
pub enum UserIntent {
    /// Tap on the preview at screen coordinates
    TouchFocus {
        x: f32,
        y: f32,
        screen_width: f32,
        screen_height: f32,
    },
    /// Long-press: lock AE and AF together once both have converged
    LockFocusExposure,
    /// Manual focus slider moved; position is linear in `[0, 1]`
    SetManualFocus { slider: f32 },
    /// Step the manual ISO up or down the discrete table
    StepIso(i32),
    /// Step the manual shutter time up or down the discrete table
    StepShutter(i32),
    /// Set both manual exposure components at once
    SetManualExposure { iso: i32, shutter_ns: i64 },
    /// Return exposure to automatic control
    ResetExposure,
    /// Explicit capture-mode choice; latches until session restart
    SetCaptureMode(CaptureMode),
    /// Bind the shared value stepper to a control
    SetActiveControl(ActiveControl),
    /// Shutter button
    Capture,
    /// Regenerate the processed preview for the given frame
    RequestPreview { timestamp_ns: i64, scale: u32 },
    /// Tear the session down
    Shutdown,
}

/// Completions posted back from the dispatcher worker
#[derive(Debug)]
pub enum OpOutcome {
    SettingsEstimated(Result<crate::engine::PostProcessSettings, EngineError>),
    ZslCaptureFinished(Result<PathBuf, EngineError>),
    HdrCaptureIssued(Result<(), EngineError>),
    PreviewReady(Result<RgbaImage, EngineError>),
}

/// Everything the control loop consumes, in one ordered stream
#[derive(Debug)]
pub enum SessionEvent {
    Intent(UserIntent),
    Engine(EngineEvent),
    Op(OpOutcome),
}

/// Focus indicator control for the UI layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusIndicator {
    /// Show the indicator at the given normalized screen position
    Show(NormalizedPoint),
    /// Indicator locked (user long-press confirmed)
    Locked(NormalizedPoint),
    Hide,
}

/// State changes surfaced to the UI collaborator
#[derive(Debug, Clone)]
pub enum UiEvent {
    CaptureModeChanged(CaptureMode),
    FocusIndicator(FocusIndicator),
    ManualIsoChanged(i32),
    ManualShutterChanged(i64),
    ManualFocusChanged(f32),
    ActiveControlChanged(ActiveControl),
    CaptureProgress { completed: u32, total: u32 },
    CaptureFinished { output: PathBuf },
    CaptureFailed(String),
    PreviewReady(Arc<RgbaImage>),
    RecordingStateChanged(bool),
    /// Short confirmation tick; senders ignore delivery failures
    HapticTick,
    UnsupportedCamera(String),
}

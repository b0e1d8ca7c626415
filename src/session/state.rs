// SPDX-License-Identifier: GPL-3.0-only

//! Session state: the combined focus / exposure / capture-mode machine's data

use crate::engine::{AeState, AfState, NormalizedPoint, PostProcessSettings};
use crate::exposure::ExposureValue;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// Focus control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusMode {
    /// Continuous passive auto-focus
    #[default]
    Continuous,
    /// User tapped a focus point; still auto-exposed
    UserSelected,
    /// User long-pressed: AE locked, lens fixed at its current distance
    UserLocked,
    /// Explicit focus distance from the slider
    Manual,
}

/// Exposure control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExposureMode {
    #[default]
    Auto,
    Manual,
}

/// Capture pipeline selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Multi-frame HDR merge for dark scenes
    Night,
    /// Zero-shutter-lag merge from the running preview buffer
    #[default]
    ZeroShutterLag,
    /// Fixed-count burst
    Burst,
    /// RAW video streaming
    RawVideo,
}

impl CaptureMode {
    /// All modes for UI iteration
    pub const ALL: [CaptureMode; 4] = [
        CaptureMode::Night,
        CaptureMode::ZeroShutterLag,
        CaptureMode::Burst,
        CaptureMode::RawVideo,
    ];

    /// Tag recorded into capture metadata
    pub fn tag(&self) -> &'static str {
        match self {
            CaptureMode::Night => "night",
            CaptureMode::ZeroShutterLag => "zsl",
            CaptureMode::Burst => "burst",
            CaptureMode::RawVideo => "raw-video",
        }
    }

    /// Whether auto Night/ZSL switching may replace this mode
    pub fn allows_auto_switch(&self) -> bool {
        matches!(self, CaptureMode::Night | CaptureMode::ZeroShutterLag)
    }
}

/// Which control the shared value stepper is presently bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActiveControl {
    #[default]
    None,
    Iso,
    Shutter,
    Focus,
}

/// A capture decision frozen while estimation runs on the worker
#[derive(Debug, Clone)]
pub struct PendingCapture {
    /// Settings bag cloned at the moment the capture was issued
    pub settings: PostProcessSettings,
    /// Mode the capture was issued under
    pub mode: CaptureMode,
    /// Output file the engine will write
    pub output: PathBuf,
}

/// All mutable session state
///
/// Owned exclusively by the session and mutated only on the control thread;
/// the worker sees nothing but immutable value messages.
#[derive(Debug)]
pub struct SessionState {
    pub focus_mode: FocusMode,
    pub exposure_mode: ExposureMode,
    pub capture_mode: CaptureMode,
    /// One-way latch: the user explicitly picked a mode this session
    pub user_capture_mode_override: bool,
    /// Last camera-reported exposure
    pub reported_exposure: Option<ExposureValue>,
    /// Manual exposure, when the user has taken over
    pub manual_exposure: Option<ExposureValue>,
    /// Last accepted user focus point (normalized, pre-rotation)
    pub last_focus_point: Option<NormalizedPoint>,
    /// When the user last requested a focus point or lock
    pub last_user_focus_request: Option<Instant>,
    /// When the user last edited a manual exposure control
    pub last_user_exposure_request: Option<Instant>,
    pub ae_locked: bool,
    pub awb_locked: bool,
    /// A lock gesture waiting for focus and exposure to converge
    pub lock_pending: bool,
    /// At most one capture runs at a time; RawVideo toggles through this flag
    pub capture_in_progress: bool,
    /// Lens focus distance in meters, from the latest AF report
    pub focus_distance: f32,
    pub af_state: AfState,
    pub ae_state: AeState,
    pub active_control: ActiveControl,
    /// Most recent engine-estimated settings, reused when estimation fails
    pub last_estimated_settings: Option<PostProcessSettings>,
    /// Capture waiting on its estimation pass
    pub pending_capture: Option<PendingCapture>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            focus_mode: FocusMode::default(),
            exposure_mode: ExposureMode::default(),
            capture_mode: CaptureMode::default(),
            user_capture_mode_override: false,
            reported_exposure: None,
            manual_exposure: None,
            last_focus_point: None,
            last_user_focus_request: None,
            last_user_exposure_request: None,
            ae_locked: false,
            awb_locked: false,
            lock_pending: false,
            capture_in_progress: false,
            focus_distance: 0.0,
            af_state: AfState::Inactive,
            ae_state: AeState::Inactive,
            active_control: ActiveControl::default(),
            last_estimated_settings: None,
            pending_capture: None,
        }
    }

    /// The exposure to base capture math on: manual wins, then the camera
    /// report, then the bright-scene default
    pub fn effective_exposure(&self) -> ExposureValue {
        use crate::constants::exposure::{DEFAULT_ISO, DEFAULT_SHUTTER_NS};
        self.manual_exposure
            .or(self.reported_exposure)
            .unwrap_or(ExposureValue::new(DEFAULT_SHUTTER_NS, DEFAULT_ISO))
    }

    /// Manual exposure controls count as "set" for auto-mode suppression
    pub fn manual_controls_active(&self) -> bool {
        self.exposure_mode == ExposureMode::Manual || self.manual_exposure.is_some()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

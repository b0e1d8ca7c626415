// SPDX-License-Identifier: GPL-3.0-only

//! Camera engine boundary
//!
//! The native merge/denoise/HDR engine is consumed through the narrow
//! [`CameraEngine`] capability trait; the core never depends on binding
//! mechanics, only on operation signatures and their error shapes. Engine
//! feedback arrives as [`EngineEvent`] values which the embedding adapter
//! pushes into the session inbox — engine threads never touch session state.

pub mod types;

pub use types::{CameraInfo, NormalizedPoint, PostProcessSettings};

use crate::errors::EngineError;
use crate::exposure::ExposureValue;
use image::RgbaImage;
use std::path::Path;

/// Auto-focus state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfState {
    /// AF not running
    Inactive,
    /// Sweep in progress
    Scanning,
    /// Passive AF settled on a target
    PassiveFocused,
    /// AF locked after an explicit trigger
    FocusLocked,
    /// AF gave up without focus
    Unfocused,
}

impl AfState {
    /// Whether focus has settled well enough to be locked at the current
    /// lens position
    pub fn is_converged(&self) -> bool {
        matches!(self, AfState::PassiveFocused | AfState::FocusLocked)
    }
}

/// Auto-exposure state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeState {
    /// AE not running (manual exposure active)
    Inactive,
    /// Metering has not settled
    Searching,
    /// Metering settled
    Converged,
    /// AE locked
    Locked,
}

impl AeState {
    /// Whether metering has settled; `Inactive` does not count, it only
    /// means AE is not running
    pub fn is_converged(&self) -> bool {
        matches!(self, AeState::Converged | AeState::Locked)
    }
}

/// Feedback pushed from the engine into the session inbox
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Per-frame exposure report from the sensor
    ExposureStatus { iso: i32, shutter_ns: i64 },
    /// Auto-focus state with the current lens focus distance in meters
    AutoFocusState { state: AfState, focus_distance: f32 },
    /// Auto-exposure state
    AutoExposureState(AeState),
    /// HDR merge progress
    HdrCaptureProgress { completed: u32, total: u32 },
    /// HDR capture finished and the output file is complete
    HdrCaptureCompleted,
    /// HDR capture failed; the session may be retried by the user
    HdrCaptureFailed(String),
}

/// Narrow capability interface over the native capture/processing engine
///
/// Cheap settings calls are issued directly from the control thread; capture,
/// estimation, and preview operations go through the ordered dispatcher
/// because the engine is not reentrant.
pub trait CameraEngine: Send + Sync {
    fn set_manual_exposure(&self, iso: i32, shutter_ns: i64) -> Result<(), EngineError>;
    fn set_auto_exposure(&self) -> Result<(), EngineError>;
    fn set_ae_lock(&self, locked: bool) -> Result<(), EngineError>;
    fn set_awb_lock(&self, locked: bool) -> Result<(), EngineError>;
    /// Point the metering and focus regions at normalized sensor coordinates
    fn set_focus_point(
        &self,
        focus: NormalizedPoint,
        exposure: NormalizedPoint,
    ) -> Result<(), EngineError>;
    fn set_auto_focus(&self) -> Result<(), EngineError>;
    /// Fix the lens at the given focus distance in meters
    fn set_manual_focus(&self, distance: f32) -> Result<(), EngineError>;
    fn set_ois(&self, enabled: bool) -> Result<(), EngineError>;

    /// Merge `num_images` frames from the running preview buffer
    fn capture_zsl(
        &self,
        num_images: u32,
        settings: &PostProcessSettings,
        output: &Path,
    ) -> Result<(), EngineError>;

    /// Capture an HDR pair; completion is reported through
    /// [`EngineEvent::HdrCaptureCompleted`] / [`EngineEvent::HdrCaptureFailed`]
    fn capture_hdr(
        &self,
        num_images: u32,
        base: ExposureValue,
        hdr: ExposureValue,
        settings: &PostProcessSettings,
        output: &Path,
    ) -> Result<(), EngineError>;

    /// Ask the engine to estimate post-processing settings for the current
    /// scene, biased toward the given shadow lift
    fn estimate_post_process_settings(
        &self,
        shadows_bias: f32,
    ) -> Result<PostProcessSettings, EngineError>;

    /// Render a processed preview of the frame at `timestamp_ns` into `dst`,
    /// downscaled by `scale`
    fn generate_preview(
        &self,
        timestamp_ns: i64,
        settings: &PostProcessSettings,
        scale: u32,
        dst: &mut RgbaImage,
    ) -> Result<(), EngineError>;
}

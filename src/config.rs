// SPDX-License-Identifier: GPL-3.0-only

//! Session configuration

use crate::constants::{exposure, timing};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tunable parameters of a capture session
///
/// Persistence is the embedding application's concern; this type only carries
/// the values and their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Automatically switch between Night and zero-shutter-lag capture
    /// based on the reported scene exposure
    pub auto_night_mode: bool,
    /// Window after a user focus request in which exposure-searching
    /// reports do not cancel the user's focus point
    pub focus_revert_timeout_ms: u64,
    /// EV offset between the HDR base and secondary frame, in stops
    pub hdr_ev: f64,
    /// Shadows bias handed to the engine's settings estimator
    pub shadows_estimation_bias: f32,
    /// Frame count for burst captures
    pub burst_frames: u32,
    /// Ceiling on shutter time regardless of sensor capability
    pub max_shutter_ns: i64,
    /// Directory capture outputs are written into
    pub output_directory: PathBuf,
    /// Optical image stabilization at session start
    pub ois_enabled: bool,
    /// Write captures as DNG rather than the engine's processed format
    pub raw_output: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_night_mode: true,
            focus_revert_timeout_ms: timing::FOCUS_REVERT_TIMEOUT_MS,
            hdr_ev: exposure::DEFAULT_HDR_EV,
            shadows_estimation_bias: 0.0,
            burst_frames: 8,
            max_shutter_ns: exposure::MAX_SHUTTER_NS,
            output_directory: PathBuf::from("."),
            ois_enabled: true,
            raw_output: false,
        }
    }
}

impl SessionConfig {
    /// Profile for single-camera devices
    ///
    /// Identical to the default except for a tighter focus-revert window.
    pub fn single_camera() -> Self {
        Self {
            focus_revert_timeout_ms: timing::FOCUS_REVERT_TIMEOUT_SINGLE_CAMERA_MS,
            ..Self::default()
        }
    }

    /// Focus-revert window as a [`Duration`]
    pub fn focus_revert_timeout(&self) -> Duration {
        Duration::from_millis(self.focus_revert_timeout_ms)
    }
}

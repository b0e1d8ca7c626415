// SPDX-License-Identifier: GPL-3.0-only

//! Value types crossing the engine boundary

use serde::{Deserialize, Serialize};

/// A point in normalized sensor or screen coordinates, both axes in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &NormalizedPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Static properties of the camera behind the engine handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Engine-side camera identifier
    pub camera_id: String,
    /// Available apertures; empty when the camera does not report them
    pub apertures: Vec<f64>,
    /// Sensor ISO capability (min, max)
    pub iso_range: (i32, i32),
    /// Sensor shutter-time capability in ns (min, max)
    pub shutter_range_ns: (i64, i64),
    /// Lens focus-distance range in meters (min, max)
    pub focus_distance_range: (f32, f32),
    /// Sensor mounting orientation in degrees, clockwise from display-up
    pub sensor_orientation: i32,
    /// Preview stream dimensions
    pub preview_size: (u32, u32),
}

impl Default for CameraInfo {
    fn default() -> Self {
        Self {
            camera_id: String::new(),
            apertures: vec![],
            iso_range: (100, 12800),
            shutter_range_ns: (125_000, 1_000_000_000),
            focus_distance_range: (0.1, 10.0),
            sensor_orientation: 0,
            preview_size: (1920, 1080),
        }
    }
}

/// The full post-processing parameter bag for one capture
///
/// Cloned at the moment a capture is issued so later edits cannot race an
/// in-flight operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProcessSettings {
    pub contrast: f32,
    pub saturation: f32,
    pub temperature_offset: f32,
    pub tint_offset: f32,
    pub shadows: f32,
    pub exposure_bias: f32,
    pub sharpen0: f32,
    pub sharpen1: f32,
    /// Capture-mode tag recorded into the output metadata
    pub capture_mode: String,
    /// Write a DNG instead of the engine's processed output
    pub dng: bool,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            contrast: 0.5,
            saturation: 1.0,
            temperature_offset: 0.0,
            tint_offset: 0.0,
            shadows: 1.0,
            exposure_bias: 0.0,
            sharpen0: 2.0,
            sharpen1: 2.0,
            capture_mode: String::new(),
            dng: false,
        }
    }
}

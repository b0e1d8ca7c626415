// SPDX-License-Identifier: GPL-3.0-only

//! Coordinate and slider mapping helpers

use crate::constants::thresholds::TOUCH_EDGE_MARGIN;
use crate::engine::NormalizedPoint;

/// Normalize a screen-space touch to `[0, 1]`
///
/// Returns `None` for degenerate screen sizes or touches inside the edge
/// margin, where focus regions clip against the sensor border.
pub fn normalize_touch(x: f32, y: f32, width: f32, height: f32) -> Option<NormalizedPoint> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let nx = x / width;
    let ny = y / height;
    let margin = TOUCH_EDGE_MARGIN;
    if !(margin..=1.0 - margin).contains(&nx) || !(margin..=1.0 - margin).contains(&ny) {
        return None;
    }
    Some(NormalizedPoint::new(nx, ny))
}

/// Rotate a normalized point by the negative sensor orientation about the
/// center, so the coordinates sent to the engine are sensor-relative
/// regardless of display rotation
pub fn rotate_to_sensor(point: NormalizedPoint, orientation_degrees: i32) -> NormalizedPoint {
    let theta = -(orientation_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    let dx = point.x - 0.5;
    let dy = point.y - 0.5;
    NormalizedPoint::new(0.5 + dx * cos - dy * sin, 0.5 + dx * sin + dy * cos)
}

/// Map a focus distance onto a perceptually uniform slider position
///
/// Logarithmic, not linear: equal slider travel covers equal focus ratio.
pub fn focus_to_slider(distance: f32, min: f32, max: f32) -> f32 {
    (distance.ln() - min.ln()) / (max.ln() - min.ln())
}

/// Inverse of [`focus_to_slider`]
pub fn slider_to_focus(linear: f32, min: f32, max: f32) -> f32 {
    (linear * (max.ln() - min.ln()) + min.ln()).exp()
}

// SPDX-License-Identifier: GPL-3.0-only

//! Merge-count and sharpening heuristic for multi-frame noise reduction

use serde::{Deserialize, Serialize};

/// Parameters for the engine's multi-frame merge
///
/// Derived, never persisted; recomputed at each capture decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenoiseSettings {
    pub num_merge_images: u32,
    pub sharpen0: f32,
    pub sharpen1: f32,
}

/// Derive merge-image count and sharpening from scene EV and shadow boost
///
/// Bright scenes need few frames; dark scenes merge more and sharpen harder
/// to recover detail lost to the heavier denoise. Raising shadows amplifies
/// noise, so it adds frames on top of the EV bracket.
pub fn estimate(ev: f64, shadows: f64) -> DenoiseSettings {
    let (mut num_merge_images, sharpen0, sharpen1) = if ev > 7.99 {
        (4, 2.0, 2.0)
    } else if ev > 5.99 {
        (6, 2.0, 2.0)
    } else if ev > 3.99 {
        (8, 2.0, 2.0)
    } else if ev <= 0.0 {
        (12, 2.0, 3.0)
    } else {
        // 0 < ev <= 3.99 gets the same treatment as the dark case
        (12, 2.0, 3.0)
    };

    if shadows > 7.99 {
        num_merge_images += 4;
    }
    if shadows > 15.99 {
        num_merge_images += 2;
    }

    DenoiseSettings {
        num_merge_images,
        sharpen0,
        sharpen1,
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Exposure model: discrete step tables, EV arithmetic, canonical exposure
//! lines, and the multi-frame denoise heuristic

pub mod denoise;
pub mod line;
pub mod table;

pub use denoise::DenoiseSettings;
pub use line::ExposureLine;

use crate::constants::{ISO_TABLE, SHUTTER_TABLE_NS};
use serde::{Deserialize, Serialize};

/// An ISO/shutter pair
///
/// Immutable value type; snap through [`ExposureValue::normalized`] before
/// handing it to the engine so it always names realizable steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureValue {
    pub iso: i32,
    pub shutter_ns: i64,
}

impl ExposureValue {
    pub const fn new(shutter_ns: i64, iso: i32) -> Self {
        Self { iso, shutter_ns }
    }

    /// Snap both components to the discrete step tables
    pub fn normalized(self) -> Self {
        Self {
            iso: table::closest_iso(ISO_TABLE, self.iso),
            shutter_ns: table::closest_shutter(SHUTTER_TABLE_NS, self.shutter_ns),
        }
    }

    /// Exposure value at the given aperture:
    /// `log2((shutter_seconds * iso) / (aperture^2 * 100))`
    ///
    /// Higher means more light gathered.
    pub fn ev(&self, aperture: f64) -> f64 {
        let shutter_s = self.shutter_ns as f64 / 1_000_000_000.0;
        ((shutter_s * self.iso as f64) / (aperture * aperture * 100.0)).log2()
    }
}

impl std::fmt::Display for ExposureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.shutter_ns >= 1_000_000_000 {
            write!(
                f,
                "ISO {} {:.1}s",
                self.iso,
                self.shutter_ns as f64 / 1_000_000_000.0
            )
        } else {
            write!(
                f,
                "ISO {} 1/{}s",
                self.iso,
                (1_000_000_000.0 / self.shutter_ns as f64).round() as i64
            )
        }
    }
}

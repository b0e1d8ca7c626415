// SPDX-License-Identifier: GPL-3.0-only

//! Canonical exposure lines
//!
//! An exposure line is the ordered set of ISO/shutter pairs the engine is
//! known to realize well at a given aperture. Requested exposures are always
//! projected onto a line rather than sent verbatim, so the engine never sees
//! an extrapolated combination.

use super::ExposureValue;
use super::table::closest_shutter;
use crate::constants::{HDR_EXPOSURE_LINE, SHUTTER_TABLE_NS, STANDARD_EXPOSURE_LINE};

/// An ordered sequence of engine-realizable exposure anchors
///
/// Invariant: anchors are strictly monotonic in EV (at any fixed aperture,
/// since aperture only shifts every anchor's EV by the same offset).
#[derive(Debug, Clone)]
pub struct ExposureLine {
    anchors: Vec<ExposureValue>,
}

impl ExposureLine {
    /// Build a line from anchor values
    pub fn new(anchors: Vec<ExposureValue>) -> Self {
        debug_assert!(
            anchors
                .windows(2)
                .all(|w| w[0].ev(1.0) < w[1].ev(1.0)),
            "exposure line anchors must be monotonic in EV"
        );
        Self { anchors }
    }

    /// The standard line: shutter first, ISO when shutter headroom runs out
    pub fn standard() -> Self {
        Self::from_pairs(STANDARD_EXPOSURE_LINE)
    }

    /// The HDR line: motion-safe shutters, ISO ramps earlier
    pub fn hdr() -> Self {
        Self::from_pairs(HDR_EXPOSURE_LINE)
    }

    fn from_pairs(pairs: &[(i32, i64)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(iso, shutter_ns)| ExposureValue::new(shutter_ns, iso))
                .collect(),
        )
    }

    pub fn anchors(&self) -> &[ExposureValue] {
        &self.anchors
    }

    /// Project the requested exposure onto the closest anchor at the given
    /// aperture
    ///
    /// The result is always an anchor of the line; the line never
    /// extrapolates. Ties break toward the darker anchor. An empty line
    /// returns the request unchanged.
    pub fn map_to_line(&self, aperture: f64, value: ExposureValue) -> ExposureValue {
        let target = value.ev(aperture);
        let mut best: Option<(f64, ExposureValue)> = None;
        for &anchor in &self.anchors {
            let diff = (anchor.ev(aperture) - target).abs();
            match best {
                Some((best_diff, _)) if diff >= best_diff => {}
                _ => best = Some((diff, anchor)),
            }
        }
        best.map_or(value, |(_, anchor)| anchor)
    }

    /// Largest EV gap between adjacent anchors (the line's "step" size)
    pub fn max_step_ev(&self, aperture: f64) -> f64 {
        self.anchors
            .windows(2)
            .map(|w| w[1].ev(aperture) - w[0].ev(aperture))
            .fold(0.0, f64::max)
    }
}

/// Compute the secondary HDR exposure for a given base
///
/// The secondary frame is `hdr_ev` stops under the base: its shutter time is
/// the base's divided by `2^hdr_ev` (snapped to a table step) at the same
/// ISO, then projected onto the HDR line so the result stays realizable.
pub fn hdr_split(
    base: ExposureValue,
    hdr_ev: f64,
    line: &ExposureLine,
    aperture: f64,
) -> ExposureValue {
    let factor = 2f64.powf(hdr_ev);
    let shutter_ns = closest_shutter(SHUTTER_TABLE_NS, (base.shutter_ns as f64 / factor) as i64);
    line.map_to_line(aperture, ExposureValue::new(shutter_ns, base.iso))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::exposure::DEFAULT_APERTURE;

    #[test]
    fn test_lines_are_monotonic_in_ev() {
        for line in [ExposureLine::standard(), ExposureLine::hdr()] {
            let evs: Vec<f64> = line
                .anchors()
                .iter()
                .map(|a| a.ev(DEFAULT_APERTURE))
                .collect();
            assert!(
                evs.windows(2).all(|w| w[0] < w[1]),
                "anchors not monotonic: {evs:?}"
            );
        }
    }

    #[test]
    fn test_map_to_line_returns_an_anchor() {
        let line = ExposureLine::standard();
        for probe in [
            ExposureValue::new(40_000_000, 3200),
            ExposureValue::new(125_000, 100),
            ExposureValue::new(1_000_000_000, 12800),
        ] {
            let mapped = line.map_to_line(DEFAULT_APERTURE, probe);
            assert!(line.anchors().contains(&mapped));
        }
    }

    #[test]
    fn test_map_to_line_ev_proximity() {
        // The projection error can never exceed half the largest anchor gap
        // for in-range targets; test both canonical lines at two apertures.
        for line in [ExposureLine::standard(), ExposureLine::hdr()] {
            for aperture in [DEFAULT_APERTURE, 2.8] {
                let step = line.max_step_ev(aperture);
                for &anchor in line.anchors() {
                    for nudge in [-0.3, 0.0, 0.3] {
                        // Perturb the probe around each anchor by shifting ISO
                        let probe = ExposureValue::new(
                            anchor.shutter_ns,
                            ((anchor.iso as f64) * 2f64.powf(nudge)) as i32,
                        );
                        let mapped = line.map_to_line(aperture, probe);
                        let err = (mapped.ev(aperture) - probe.ev(aperture)).abs();
                        assert!(
                            err <= step,
                            "error {err} exceeds step {step} for {probe:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_map_to_line_exact_anchor_is_identity() {
        let line = ExposureLine::hdr();
        for &anchor in line.anchors() {
            assert_eq!(line.map_to_line(DEFAULT_APERTURE, anchor), anchor);
        }
    }

    #[test]
    fn test_hdr_split_is_darker_than_base() {
        let line = ExposureLine::hdr();
        let base = ExposureValue::new(66_666_667, 1600); // 1/15, night territory
        let hdr = hdr_split(base, 2.0, &line, DEFAULT_APERTURE);
        assert!(hdr.ev(DEFAULT_APERTURE) < base.ev(DEFAULT_APERTURE));
        assert!(line.anchors().contains(&hdr));
    }

    #[test]
    fn test_hdr_split_zero_offset_keeps_brightness() {
        let line = ExposureLine::hdr();
        let base = ExposureValue::new(16_666_667, 800);
        let hdr = hdr_split(base, 0.0, &line, DEFAULT_APERTURE);
        let diff = (hdr.ev(DEFAULT_APERTURE) - base.ev(DEFAULT_APERTURE)).abs();
        assert!(diff <= line.max_step_ev(DEFAULT_APERTURE));
    }
}

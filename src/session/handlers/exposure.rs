// SPDX-License-Identifier: GPL-3.0-only

//! Exposure handlers
//!
//! Manual ISO/shutter stepping along the discrete tables, the Auto/Manual
//! exposure mode switch, and processing of AE feedback (including the
//! time-based cancel of stale user focus points).

use crate::engine::AeState;
use crate::exposure::{ExposureValue, table};
use crate::session::state::{ActiveControl, ExposureMode, FocusMode};
use crate::session::{CaptureSession, UiEvent};
use std::time::Instant;
use tracing::{debug, info, warn};

impl CaptureSession {
    pub(crate) fn handle_ae_state(&mut self, state: AeState) {
        self.state.ae_state = state;
        if self.state.lock_pending {
            self.try_complete_lock();
        }
        // AE hunting again long after the user placed a focus point means the
        // scene moved on; give control back to the continuous loops
        if state == AeState::Searching {
            self.maybe_revert_user_focus();
        }
    }

    fn maybe_revert_user_focus(&mut self) {
        if !matches!(
            self.state.focus_mode,
            FocusMode::UserSelected | FocusMode::UserLocked
        ) {
            return;
        }
        let Some(requested) = self.state.last_user_focus_request else {
            return;
        };
        if requested.elapsed() > self.config.focus_revert_timeout() {
            self.revert_user_focus();
        }
    }

    /// Per-frame exposure report from the sensor
    pub(crate) fn handle_exposure_status(&mut self, iso: i32, shutter_ns: i64) {
        self.state.reported_exposure = Some(ExposureValue::new(shutter_ns, iso));
        self.auto_switch_capture_mode(iso, shutter_ns);
    }

    /// Step the manual ISO along the usable sub-table
    pub(crate) fn handle_step_iso(&mut self, delta: i32) {
        if self.iso_steps.is_empty() {
            return;
        }
        let current = self.state.effective_exposure();
        let index = table::closest_index(&self.iso_steps, current.iso).unwrap_or(0);
        let index =
            (index as i32 + delta).clamp(0, self.iso_steps.len() as i32 - 1) as usize;
        let iso = self.iso_steps[index];
        self.state.active_control = ActiveControl::Iso;
        self.apply_manual_exposure(iso, current.shutter_ns);
    }

    /// Step the manual shutter time along the usable sub-table
    pub(crate) fn handle_step_shutter(&mut self, delta: i32) {
        if self.shutter_steps.is_empty() {
            return;
        }
        let current = self.state.effective_exposure();
        let index = table::closest_index(&self.shutter_steps, current.shutter_ns).unwrap_or(0);
        let index =
            (index as i32 + delta).clamp(0, self.shutter_steps.len() as i32 - 1) as usize;
        let shutter_ns = self.shutter_steps[index];
        self.state.active_control = ActiveControl::Shutter;
        self.apply_manual_exposure(current.iso, shutter_ns);
    }

    pub(crate) fn handle_set_manual_exposure(&mut self, iso: i32, shutter_ns: i64) {
        self.apply_manual_exposure(iso, shutter_ns);
    }

    /// Normalize and send a manual exposure; any edit here moves the session
    /// into manual exposure mode until an explicit reset
    fn apply_manual_exposure(&mut self, iso: i32, shutter_ns: i64) {
        let value = self.normalize_to_steps(iso, shutter_ns);
        if let Err(e) = self.engine.set_manual_exposure(value.iso, value.shutter_ns) {
            warn!(error = %e, "Engine rejected manual exposure");
            return;
        }

        debug!(iso = value.iso, shutter_ns = value.shutter_ns, "Manual exposure applied");
        self.state.manual_exposure = Some(value);
        self.state.exposure_mode = ExposureMode::Manual;
        self.state.last_user_exposure_request = Some(Instant::now());
        self.emit_ui(UiEvent::ManualIsoChanged(value.iso));
        self.emit_ui(UiEvent::ManualShutterChanged(value.shutter_ns));
    }

    /// Snap a requested exposure to the steps this camera can actually use
    fn normalize_to_steps(&self, iso: i32, shutter_ns: i64) -> ExposureValue {
        ExposureValue::new(
            table::closest_shutter(&self.shutter_steps, shutter_ns),
            table::closest_iso(&self.iso_steps, iso),
        )
    }

    /// Return exposure to automatic control; the only way out of manual mode
    pub(crate) fn handle_reset_exposure(&mut self) {
        if let Err(e) = self.engine.set_auto_exposure() {
            warn!(error = %e, "Engine rejected return to auto exposure");
            return;
        }
        info!(session_id = %self.session_id(), "Exposure reset to auto");
        self.state.manual_exposure = None;
        self.state.exposure_mode = ExposureMode::Auto;
        self.state.active_control = ActiveControl::None;
        self.emit_ui(UiEvent::ActiveControlChanged(ActiveControl::None));
    }
}

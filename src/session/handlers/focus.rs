// SPDX-License-Identifier: GPL-3.0-only

//! Focus handlers
//!
//! Touch-to-focus, manual focus distance, the deferred AE/AF combined lock,
//! and the time-based revert back to continuous AF.

use crate::constants::thresholds::MIN_FOCUS_POINT_DISTANCE;
use crate::engine::{AfState, NormalizedPoint};
use crate::session::state::{ActiveControl, ExposureMode, FocusMode};
use crate::session::{CaptureSession, FocusIndicator, UiEvent, utils};
use std::time::Instant;
use tracing::{debug, info, warn};

impl CaptureSession {
    /// Tap on the preview: aim the focus and metering regions at the touched
    /// point
    ///
    /// Touches near the screen edge and near-duplicates of the last accepted
    /// point are ignored without any engine traffic.
    pub(crate) fn handle_touch_focus(
        &mut self,
        x: f32,
        y: f32,
        screen_width: f32,
        screen_height: f32,
    ) {
        let Some(point) = utils::normalize_touch(x, y, screen_width, screen_height) else {
            debug!("Touch outside usable area, ignoring");
            return;
        };

        if let Some(last) = self.state.last_focus_point {
            if point.distance_to(&last) < MIN_FOCUS_POINT_DISTANCE {
                debug!(x = point.x, y = point.y, "Near-duplicate focus point, ignoring");
                return;
            }
        }

        let sensor_point = utils::rotate_to_sensor(point, self.camera.sensor_orientation);
        if let Err(e) = self.engine.set_focus_point(sensor_point, sensor_point) {
            warn!(error = %e, "Engine rejected focus point");
            return;
        }

        debug!(
            x = point.x,
            y = point.y,
            sensor_x = sensor_point.x,
            sensor_y = sensor_point.y,
            "Focus point set"
        );

        self.state.focus_mode = FocusMode::UserSelected;
        self.state.last_focus_point = Some(point);
        self.state.last_user_focus_request = Some(Instant::now());
        self.emit_ui(UiEvent::FocusIndicator(FocusIndicator::Show(point)));
    }

    /// Long-press: lock exposure and focus together
    ///
    /// The lock is deferred until both loops have converged; until then the
    /// request stays pending and is re-checked on every AF/AE report.
    pub(crate) fn handle_lock_request(&mut self) {
        self.state.lock_pending = true;
        self.state.last_user_focus_request = Some(Instant::now());
        self.try_complete_lock();
    }

    pub(crate) fn try_complete_lock(&mut self) {
        if !self.state.lock_pending {
            return;
        }
        let focus_ready =
            self.state.af_state.is_converged() || self.state.focus_mode == FocusMode::Manual;
        let exposure_ready = self.state.ae_state.is_converged()
            || self.state.exposure_mode == ExposureMode::Manual;
        if !(focus_ready && exposure_ready) {
            debug!(
                af_state = ?self.state.af_state,
                ae_state = ?self.state.ae_state,
                "Lock pending, waiting for convergence"
            );
            return;
        }

        self.state.lock_pending = false;

        // Both locks land back-to-back so exposure cannot drift while the
        // lens is being fixed
        let result = self
            .engine
            .set_ae_lock(true)
            .and_then(|_| self.engine.set_awb_lock(true))
            .and_then(|_| self.engine.set_manual_focus(self.state.focus_distance));

        match result {
            Ok(()) => {
                self.state.ae_locked = true;
                self.state.awb_locked = true;
                self.state.focus_mode = FocusMode::UserLocked;
                let indicator = self
                    .state
                    .last_focus_point
                    .unwrap_or(NormalizedPoint::new(0.5, 0.5));
                self.emit_ui(UiEvent::FocusIndicator(FocusIndicator::Locked(indicator)));
                self.emit_ui(UiEvent::HapticTick);
                info!(
                    session_id = %self.session_id(),
                    focus_distance = self.state.focus_distance,
                    "AE/AF locked"
                );
            }
            Err(e) => {
                // Non-fatal: the user can long-press again
                warn!(error = %e, "AE/AF lock failed");
            }
        }
    }

    /// Manual focus slider moved
    pub(crate) fn handle_manual_focus(&mut self, slider: f32) {
        let slider = slider.clamp(0.0, 1.0);
        let (min, max) = self.camera.focus_distance_range;
        let distance = utils::slider_to_focus(slider, min, max);

        if let Err(e) = self.engine.set_manual_focus(distance) {
            warn!(error = %e, "Engine rejected manual focus");
            return;
        }

        debug!(slider, distance, "Manual focus set");
        self.state.focus_mode = FocusMode::Manual;
        self.state.focus_distance = distance;
        self.state.active_control = ActiveControl::Focus;
        self.emit_ui(UiEvent::ManualFocusChanged(distance));
    }

    pub(crate) fn handle_af_state(&mut self, state: AfState, focus_distance: f32) {
        self.state.af_state = state;
        self.state.focus_distance = focus_distance;
        if self.state.lock_pending {
            self.try_complete_lock();
        }
    }

    /// Drop the user's focus point and return to continuous AF
    pub(crate) fn revert_user_focus(&mut self) {
        info!(session_id = %self.session_id(), "User focus expired, reverting to continuous AF");

        if self.state.ae_locked {
            if let Err(e) = self.engine.set_ae_lock(false) {
                warn!(error = %e, "AE unlock failed");
            }
            self.state.ae_locked = false;
        }
        if self.state.awb_locked {
            if let Err(e) = self.engine.set_awb_lock(false) {
                warn!(error = %e, "AWB unlock failed");
            }
            self.state.awb_locked = false;
        }
        if let Err(e) = self.engine.set_auto_focus() {
            warn!(error = %e, "Engine rejected return to auto focus");
        }

        self.state.focus_mode = FocusMode::Continuous;
        self.state.last_focus_point = None;
        self.state.last_user_focus_request = None;
        self.state.lock_pending = false;
        self.emit_ui(UiEvent::FocusIndicator(FocusIndicator::Hide));
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Capture-mode handlers
//!
//! Explicit user mode selection (which latches for the rest of the session)
//! and the automatic Night/ZSL switch driven by sensor exposure reports.

use crate::constants::thresholds::{NIGHT_MODE_ISO, NIGHT_MODE_SHUTTER_NS};
use crate::session::state::{ActiveControl, CaptureMode};
use crate::session::{CaptureSession, UiEvent};
use tracing::{info, warn};

impl CaptureSession {
    /// Explicit mode choice from the user
    ///
    /// Sets the one-way override latch: from here on the session never
    /// auto-switches modes again, until a new session starts.
    pub(crate) fn handle_set_capture_mode(&mut self, mode: CaptureMode) {
        if self.state.capture_in_progress {
            warn!(mode = ?mode, "Mode change ignored while capture in progress");
            return;
        }
        self.state.user_capture_mode_override = true;
        if self.state.capture_mode == mode {
            return;
        }
        info!(session_id = %self.session_id(), mode = ?mode, "Capture mode selected");
        self.state.capture_mode = mode;
        self.emit_ui(UiEvent::CaptureModeChanged(mode));
    }

    /// Auto-switch between Night and ZSL from the reported scene exposure
    ///
    /// Suppressed when auto-night is disabled, the user has latched a mode,
    /// the current mode is not auto-switchable, manual exposure controls are
    /// active, or a capture is running.
    pub(crate) fn auto_switch_capture_mode(&mut self, iso: i32, shutter_ns: i64) {
        if !self.config.auto_night_mode
            || self.state.user_capture_mode_override
            || !self.state.capture_mode.allows_auto_switch()
            || self.state.manual_controls_active()
            || self.state.capture_in_progress
        {
            return;
        }

        let night = iso > NIGHT_MODE_ISO || shutter_ns > NIGHT_MODE_SHUTTER_NS;
        let desired = if night {
            CaptureMode::Night
        } else {
            CaptureMode::ZeroShutterLag
        };

        if desired != self.state.capture_mode {
            info!(
                session_id = %self.session_id(),
                iso,
                shutter_ns,
                mode = ?desired,
                "Auto-switching capture mode"
            );
            self.state.capture_mode = desired;
            self.emit_ui(UiEvent::CaptureModeChanged(desired));
        }
    }

    /// Rebind the shared value stepper
    pub(crate) fn handle_set_active_control(&mut self, control: ActiveControl) {
        self.state.active_control = control;
        self.emit_ui(UiEvent::ActiveControlChanged(control));
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Capture handlers
//!
//! The capture guard, the estimate-then-capture flow on the dispatcher
//! worker, HDR progress plumbing, RAW video toggling, and skippable preview
//! regeneration.

use crate::engine::PostProcessSettings;
use crate::errors::EngineError;
use crate::exposure::{denoise, line};
use crate::session::events::{OpOutcome, SessionEvent};
use crate::session::state::{CaptureMode, PendingCapture};
use crate::session::{CaptureSession, UiEvent};
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl CaptureSession {
    /// Shutter button pressed
    ///
    /// Photo modes freeze the settings bag and kick off estimation on the
    /// worker; RAW video toggles streaming through the same guard flag.
    pub(crate) fn handle_capture(&mut self) {
        if self.state.capture_mode == CaptureMode::RawVideo {
            self.toggle_raw_video();
            return;
        }
        if self.state.capture_in_progress {
            debug!("Capture already in progress, ignoring");
            return;
        }
        self.state.capture_in_progress = true;

        let mode = self.state.capture_mode;
        let output = self.capture_output_path();

        // Clone the settings bag now; edits made while the capture is in
        // flight must not affect it
        let mut settings = self
            .state
            .last_estimated_settings
            .clone()
            .unwrap_or_default();
        settings.capture_mode = mode.tag().to_string();
        settings.dng = self.config.raw_output;
        self.state.pending_capture = Some(PendingCapture {
            settings,
            mode,
            output,
        });

        info!(session_id = %self.session_id(), mode = ?mode, "Capture started, estimating settings");

        let engine = Arc::clone(&self.engine);
        let bias = self.config.shadows_estimation_bias;
        self.dispatcher.submit(move || {
            SessionEvent::Op(OpOutcome::SettingsEstimated(
                engine.estimate_post_process_settings(bias),
            ))
        });
    }

    /// Estimation finished on the worker; issue the actual capture
    pub(crate) fn handle_settings_estimated(
        &mut self,
        result: Result<PostProcessSettings, EngineError>,
    ) {
        let Some(pending) = self.state.pending_capture.clone() else {
            debug!("Estimation completed with no capture pending, dropping");
            return;
        };

        let settings = match result {
            Ok(mut estimated) => {
                estimated.capture_mode = pending.settings.capture_mode.clone();
                estimated.dng = pending.settings.dng;
                self.state.last_estimated_settings = Some(estimated.clone());
                estimated
            }
            Err(e) => {
                // Recoverable: capture with what we knew before
                warn!(error = %e, "Settings estimation failed, using last known settings");
                pending.settings.clone()
            }
        };

        self.issue_capture(pending.mode, settings, pending.output);
    }

    fn issue_capture(&mut self, mode: CaptureMode, settings: PostProcessSettings, output: PathBuf) {
        let aperture = self.aperture();
        let exposure = self.state.effective_exposure();
        let ev = exposure.ev(aperture);
        let denoise = denoise::estimate(ev, settings.shadows as f64);

        let mut settings = settings;
        settings.sharpen0 = denoise.sharpen0;
        settings.sharpen1 = denoise.sharpen1;

        let engine = Arc::clone(&self.engine);
        match mode {
            CaptureMode::Night => {
                let base = self.standard_line.map_to_line(aperture, exposure);
                let hdr = line::hdr_split(base, self.config.hdr_ev, &self.hdr_line, aperture);
                let num_images = denoise.num_merge_images;
                info!(
                    ev,
                    base = %base,
                    hdr = %hdr,
                    num_images,
                    "Issuing HDR capture"
                );
                self.dispatcher.submit(move || {
                    SessionEvent::Op(OpOutcome::HdrCaptureIssued(engine.capture_hdr(
                        num_images,
                        base,
                        hdr,
                        &settings,
                        &output,
                    )))
                });
            }
            CaptureMode::ZeroShutterLag | CaptureMode::Burst => {
                let num_images = if mode == CaptureMode::Burst {
                    self.config.burst_frames
                } else {
                    denoise.num_merge_images
                };
                info!(ev, num_images, "Issuing ZSL capture");
                self.dispatcher.submit(move || {
                    let result = engine.capture_zsl(num_images, &settings, &output);
                    SessionEvent::Op(OpOutcome::ZslCaptureFinished(result.map(|_| output)))
                });
            }
            CaptureMode::RawVideo => {
                debug!("RawVideo capture reached issue_capture, ignoring");
            }
        }
    }

    pub(crate) fn handle_zsl_finished(&mut self, result: Result<PathBuf, EngineError>) {
        self.state.capture_in_progress = false;
        self.state.pending_capture = None;
        match result {
            Ok(output) => {
                info!(session_id = %self.session_id(), output = %output.display(), "Capture finished");
                self.emit_ui(UiEvent::CaptureFinished { output });
            }
            Err(e) => {
                warn!(error = %e, "Capture failed");
                self.emit_ui(UiEvent::CaptureFailed(e.to_string()));
            }
        }
    }

    /// The HDR capture call itself returned; completion still arrives as an
    /// engine event
    pub(crate) fn handle_hdr_issued(&mut self, result: Result<(), EngineError>) {
        if let Err(e) = result {
            warn!(error = %e, "HDR capture rejected");
            self.state.capture_in_progress = false;
            self.state.pending_capture = None;
            self.emit_ui(UiEvent::CaptureFailed(e.to_string()));
        }
    }

    pub(crate) fn handle_hdr_progress(&mut self, completed: u32, total: u32) {
        self.emit_ui(UiEvent::CaptureProgress { completed, total });
    }

    pub(crate) fn handle_hdr_completed(&mut self) {
        self.state.capture_in_progress = false;
        let output = self
            .state
            .pending_capture
            .take()
            .map(|p| p.output)
            .unwrap_or_default();
        info!(session_id = %self.session_id(), output = %output.display(), "HDR capture finished");
        self.emit_ui(UiEvent::CaptureFinished { output });
    }

    pub(crate) fn handle_hdr_failed(&mut self, message: String) {
        warn!(message = %message, "HDR capture failed");
        self.state.capture_in_progress = false;
        self.state.pending_capture = None;
        self.emit_ui(UiEvent::CaptureFailed(message));
    }

    /// RAW video start/stop shares the capture guard flag
    fn toggle_raw_video(&mut self) {
        if self.state.capture_in_progress {
            self.state.capture_in_progress = false;
            if self.config.ois_enabled {
                if let Err(e) = self.engine.set_ois(true) {
                    debug!(error = %e, "OIS not restored after recording");
                }
            }
            info!(session_id = %self.session_id(), "RAW video recording stopped");
            self.emit_ui(UiEvent::RecordingStateChanged(false));
        } else {
            self.state.capture_in_progress = true;
            // Lens wobble compensation fights the rolling readout; keep the
            // lens still while streaming
            if let Err(e) = self.engine.set_ois(false) {
                debug!(error = %e, "OIS not disabled for recording");
            }
            info!(session_id = %self.session_id(), "RAW video recording started");
            self.emit_ui(UiEvent::RecordingStateChanged(true));
        }
    }

    /// Regenerate the processed preview; silently skipped while the worker
    /// is busy so stale previews never queue up
    pub(crate) fn handle_request_preview(&mut self, timestamp_ns: i64, scale: u32) {
        let scale = scale.max(1);
        let (width, height) = self.camera.preview_size;
        let settings = self
            .state
            .last_estimated_settings
            .clone()
            .unwrap_or_default();
        let engine = Arc::clone(&self.engine);

        self.dispatcher.submit_skippable(move || {
            let mut dst = RgbaImage::new((width / scale).max(1), (height / scale).max(1));
            let result = engine.generate_preview(timestamp_ns, &settings, scale, &mut dst);
            SessionEvent::Op(OpOutcome::PreviewReady(result.map(|_| dst)))
        });
    }

    pub(crate) fn handle_preview_ready(&mut self, result: Result<RgbaImage, EngineError>) {
        match result {
            Ok(preview) => self.emit_ui(UiEvent::PreviewReady(Arc::new(preview))),
            // Previews are best-effort; the next frame brings another chance
            Err(e) => debug!(error = %e, "Preview generation failed"),
        }
    }

    fn capture_output_path(&self) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let extension = if self.config.raw_output { "dng" } else { "jpg" };
        self.config
            .output_directory
            .join(format!("IMG_{timestamp}.{extension}"))
    }
}

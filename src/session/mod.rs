// SPDX-License-Identifier: GPL-3.0-only

//! Capture session orchestration
//!
//! [`CaptureSession`] owns the combined focus / exposure / capture-mode state
//! machine. Every input — user gestures, engine feedback, dispatcher
//! completions — arrives as a [`SessionEvent`] through one ordered inbox and
//! is processed on the control thread; the dispatcher worker only ever sees
//! immutable value messages. Cheap idempotent engine settings are issued
//! directly, capture/estimation/preview operations go through the ordered
//! dispatcher.

pub mod events;
pub mod handlers;
pub mod state;
pub mod utils;

pub use events::{FocusIndicator, OpOutcome, SessionEvent, UiEvent, UserIntent};
pub use state::{ActiveControl, CaptureMode, ExposureMode, FocusMode, SessionState};

use crate::config::SessionConfig;
use crate::constants::exposure::DEFAULT_APERTURE;
use crate::dispatcher::OpsDispatcher;
use crate::engine::{CameraEngine, CameraInfo, EngineEvent};
use crate::errors::{SessionError, SessionResult};
use crate::exposure::line::ExposureLine;
use crate::exposure::table;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

/// Identity of one capture session, generated by the session's owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Handle for submitting user intents into a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    pub fn touch_focus(&self, x: f32, y: f32, screen_width: f32, screen_height: f32) {
        self.send(UserIntent::TouchFocus {
            x,
            y,
            screen_width,
            screen_height,
        });
    }

    pub fn lock_focus_exposure(&self) {
        self.send(UserIntent::LockFocusExposure);
    }

    pub fn set_manual_focus(&self, slider: f32) {
        self.send(UserIntent::SetManualFocus { slider });
    }

    pub fn step_iso(&self, delta: i32) {
        self.send(UserIntent::StepIso(delta));
    }

    pub fn step_shutter(&self, delta: i32) {
        self.send(UserIntent::StepShutter(delta));
    }

    pub fn set_manual_exposure(&self, iso: i32, shutter_ns: i64) {
        self.send(UserIntent::SetManualExposure { iso, shutter_ns });
    }

    pub fn reset_exposure(&self) {
        self.send(UserIntent::ResetExposure);
    }

    pub fn set_capture_mode(&self, mode: CaptureMode) {
        self.send(UserIntent::SetCaptureMode(mode));
    }

    pub fn set_active_control(&self, control: ActiveControl) {
        self.send(UserIntent::SetActiveControl(control));
    }

    pub fn capture(&self) {
        self.send(UserIntent::Capture);
    }

    pub fn request_preview(&self, timestamp_ns: i64, scale: u32) {
        self.send(UserIntent::RequestPreview {
            timestamp_ns,
            scale,
        });
    }

    pub fn shutdown(&self) {
        self.send(UserIntent::Shutdown);
    }

    fn send(&self, intent: UserIntent) {
        let _ = self.tx.send(SessionEvent::Intent(intent));
    }
}

/// Marshals engine callbacks into the session inbox
///
/// Engine adapters call [`EngineEventSender::send`] from whatever thread the
/// native library delivers on; the event is processed later on the control
/// thread. This re-dispatch is a hard invariant, not an optimization.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    tx: UnboundedSender<SessionEvent>,
}

impl EngineEventSender {
    pub fn send(&self, event: EngineEvent) {
        let _ = self.tx.send(SessionEvent::Engine(event));
    }
}

/// The capture-session orchestration core
pub struct CaptureSession {
    id: SessionId,
    config: SessionConfig,
    camera: CameraInfo,
    engine: Arc<dyn CameraEngine>,
    dispatcher: OpsDispatcher<SessionEvent>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    ui_tx: UnboundedSender<UiEvent>,
    state: SessionState,
    standard_line: ExposureLine,
    hdr_line: ExposureLine,
    iso_steps: Vec<i32>,
    shutter_steps: Vec<i64>,
}

impl CaptureSession {
    /// Start a session over an opened engine handle
    ///
    /// Applies the initial engine configuration; an engine that rejects it is
    /// unusable, so the failure is surfaced once as
    /// [`UiEvent::UnsupportedCamera`] and the constructor fails. No retry.
    pub fn new(
        id: SessionId,
        engine: Arc<dyn CameraEngine>,
        camera: CameraInfo,
        config: SessionConfig,
        ui_tx: UnboundedSender<UiEvent>,
    ) -> SessionResult<Self> {
        let (events_tx, events_rx) = unbounded_channel();
        let dispatcher = OpsDispatcher::new("engine-ops", events_tx.clone());

        let iso_steps = table::iso_in_range(
            crate::constants::ISO_TABLE,
            camera.iso_range.0,
            camera.iso_range.1,
        );
        let shutter_steps = table::shutter_in_range(
            crate::constants::SHUTTER_TABLE_NS,
            camera.shutter_range_ns.0,
            camera.shutter_range_ns.1,
            config.max_shutter_ns,
        );

        let session = Self {
            id,
            config,
            camera,
            engine,
            dispatcher,
            events_tx,
            events_rx,
            ui_tx,
            state: SessionState::new(),
            standard_line: ExposureLine::standard(),
            hdr_line: ExposureLine::hdr(),
            iso_steps,
            shutter_steps,
        };

        session.apply_initial_engine_state()?;

        info!(
            session_id = %session.id,
            camera_id = %session.camera.camera_id,
            iso_steps = session.iso_steps.len(),
            shutter_steps = session.shutter_steps.len(),
            "Capture session started"
        );

        // Let the UI render without probing for the starting state
        session.emit_ui(UiEvent::CaptureModeChanged(session.state.capture_mode));
        session.emit_ui(UiEvent::ActiveControlChanged(session.state.active_control));
        session.emit_ui(UiEvent::FocusIndicator(FocusIndicator::Hide));

        Ok(session)
    }

    fn apply_initial_engine_state(&self) -> SessionResult<()> {
        let initial = self
            .engine
            .set_auto_exposure()
            .and_then(|_| self.engine.set_auto_focus());
        if let Err(e) = initial {
            warn!(session_id = %self.id, error = %e, "Engine rejected initial configuration");
            self.emit_ui(UiEvent::UnsupportedCamera(e.to_string()));
            return Err(SessionError::Engine(e));
        }
        // OIS is best-effort; cameras without it still capture fine
        if let Err(e) = self.engine.set_ois(self.config.ois_enabled) {
            debug!(session_id = %self.id, error = %e, "OIS not applied");
        }
        Ok(())
    }

    /// Handle for submitting user intents; clone freely
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.events_tx.clone(),
        }
    }

    /// Sender the engine adapter uses to marshal callbacks into the inbox
    pub fn engine_events(&self) -> EngineEventSender {
        EngineEventSender {
            tx: self.events_tx.clone(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraInfo {
        &self.camera
    }

    /// Widest reported aperture, or the default when the camera reports none
    pub(crate) fn aperture(&self) -> f64 {
        self.camera
            .apertures
            .first()
            .copied()
            .unwrap_or(DEFAULT_APERTURE)
    }

    pub(crate) fn emit_ui(&self, event: UiEvent) {
        let _ = self.ui_tx.send(event);
    }

    /// Run the control loop until shutdown
    pub async fn run(mut self) {
        info!(session_id = %self.id, "Control loop running");
        while let Some(event) = self.events_rx.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        self.dispatcher.close();
        info!(session_id = %self.id, "Capture session stopped");
    }

    /// Drain and process every event currently queued, without blocking
    ///
    /// For embeddings that tick the session from their own update loop
    /// instead of spawning [`CaptureSession::run`]. Returns `false` once a
    /// shutdown intent has been processed.
    pub fn pump_pending(&mut self) -> bool {
        while let Ok(event) = self.events_rx.try_recv() {
            if !self.handle_event(event) {
                self.dispatcher.close();
                return false;
            }
        }
        true
    }

    /// Process one inbox event; returns `false` on shutdown
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Intent(intent) => match intent {
                UserIntent::TouchFocus {
                    x,
                    y,
                    screen_width,
                    screen_height,
                } => self.handle_touch_focus(x, y, screen_width, screen_height),
                UserIntent::LockFocusExposure => self.handle_lock_request(),
                UserIntent::SetManualFocus { slider } => self.handle_manual_focus(slider),
                UserIntent::StepIso(delta) => self.handle_step_iso(delta),
                UserIntent::StepShutter(delta) => self.handle_step_shutter(delta),
                UserIntent::SetManualExposure { iso, shutter_ns } => {
                    self.handle_set_manual_exposure(iso, shutter_ns)
                }
                UserIntent::ResetExposure => self.handle_reset_exposure(),
                UserIntent::SetCaptureMode(mode) => self.handle_set_capture_mode(mode),
                UserIntent::SetActiveControl(control) => self.handle_set_active_control(control),
                UserIntent::Capture => self.handle_capture(),
                UserIntent::RequestPreview {
                    timestamp_ns,
                    scale,
                } => self.handle_request_preview(timestamp_ns, scale),
                UserIntent::Shutdown => return false,
            },
            SessionEvent::Engine(event) => match event {
                EngineEvent::ExposureStatus { iso, shutter_ns } => {
                    self.handle_exposure_status(iso, shutter_ns)
                }
                EngineEvent::AutoFocusState {
                    state,
                    focus_distance,
                } => self.handle_af_state(state, focus_distance),
                EngineEvent::AutoExposureState(state) => self.handle_ae_state(state),
                EngineEvent::HdrCaptureProgress { completed, total } => {
                    self.handle_hdr_progress(completed, total)
                }
                EngineEvent::HdrCaptureCompleted => self.handle_hdr_completed(),
                EngineEvent::HdrCaptureFailed(msg) => self.handle_hdr_failed(msg),
            },
            SessionEvent::Op(outcome) => match outcome {
                OpOutcome::SettingsEstimated(result) => self.handle_settings_estimated(result),
                OpOutcome::ZslCaptureFinished(result) => self.handle_zsl_finished(result),
                OpOutcome::HdrCaptureIssued(result) => self.handle_hdr_issued(result),
                OpOutcome::PreviewReady(result) => self.handle_preview_ready(result),
            },
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AeState, AfState, NormalizedPoint, PostProcessSettings};
    use crate::errors::EngineError;
    use crate::exposure::ExposureValue;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MockEngine {
        calls: Mutex<Vec<String>>,
        fail_init: bool,
        fail_estimation: bool,
        fail_zsl: bool,
        preview_delay: Option<Duration>,
    }

    impl MockEngine {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn count(&self, prefix: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.starts_with(prefix))
                .count()
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl crate::engine::CameraEngine for MockEngine {
        fn set_manual_exposure(&self, iso: i32, shutter_ns: i64) -> Result<(), EngineError> {
            self.record(format!("set_manual_exposure:{iso}:{shutter_ns}"));
            Ok(())
        }

        fn set_auto_exposure(&self) -> Result<(), EngineError> {
            if self.fail_init {
                return Err(EngineError::Unsupported("no manual sensor".into()));
            }
            self.record("set_auto_exposure".into());
            Ok(())
        }

        fn set_ae_lock(&self, locked: bool) -> Result<(), EngineError> {
            self.record(format!("set_ae_lock:{locked}"));
            Ok(())
        }

        fn set_awb_lock(&self, locked: bool) -> Result<(), EngineError> {
            self.record(format!("set_awb_lock:{locked}"));
            Ok(())
        }

        fn set_focus_point(
            &self,
            focus: NormalizedPoint,
            _exposure: NormalizedPoint,
        ) -> Result<(), EngineError> {
            self.record(format!("set_focus_point:{:.2}:{:.2}", focus.x, focus.y));
            Ok(())
        }

        fn set_auto_focus(&self) -> Result<(), EngineError> {
            self.record("set_auto_focus".into());
            Ok(())
        }

        fn set_manual_focus(&self, distance: f32) -> Result<(), EngineError> {
            self.record(format!("set_manual_focus:{distance:.3}"));
            Ok(())
        }

        fn set_ois(&self, enabled: bool) -> Result<(), EngineError> {
            self.record(format!("set_ois:{enabled}"));
            Ok(())
        }

        fn capture_zsl(
            &self,
            num_images: u32,
            _settings: &PostProcessSettings,
            _output: &Path,
        ) -> Result<(), EngineError> {
            self.record(format!("capture_zsl:{num_images}"));
            if self.fail_zsl {
                return Err(EngineError::CaptureFailed("merge rejected".into()));
            }
            Ok(())
        }

        fn capture_hdr(
            &self,
            num_images: u32,
            base: ExposureValue,
            hdr: ExposureValue,
            _settings: &PostProcessSettings,
            _output: &Path,
        ) -> Result<(), EngineError> {
            self.record(format!(
                "capture_hdr:{num_images}:{}:{}:{}:{}",
                base.iso, base.shutter_ns, hdr.iso, hdr.shutter_ns
            ));
            Ok(())
        }

        fn estimate_post_process_settings(
            &self,
            _shadows_bias: f32,
        ) -> Result<PostProcessSettings, EngineError> {
            self.record("estimate".into());
            if self.fail_estimation {
                return Err(EngineError::Io("settings probe failed".into()));
            }
            Ok(PostProcessSettings::default())
        }

        fn generate_preview(
            &self,
            _timestamp_ns: i64,
            _settings: &PostProcessSettings,
            _scale: u32,
            _dst: &mut image::RgbaImage,
        ) -> Result<(), EngineError> {
            self.record("generate_preview".into());
            if let Some(delay) = self.preview_delay {
                std::thread::sleep(delay);
            }
            Ok(())
        }
    }

    fn new_session(
        engine: Arc<MockEngine>,
        config: SessionConfig,
    ) -> (
        CaptureSession,
        tokio::sync::mpsc::UnboundedReceiver<UiEvent>,
    ) {
        new_session_with_camera(engine, CameraInfo::default(), config)
    }

    fn new_session_with_camera(
        engine: Arc<MockEngine>,
        camera: CameraInfo,
        config: SessionConfig,
    ) -> (
        CaptureSession,
        tokio::sync::mpsc::UnboundedReceiver<UiEvent>,
    ) {
        let (ui_tx, ui_rx) = unbounded_channel();
        let session =
            CaptureSession::new(SessionId::new(), engine, camera, config, ui_tx).unwrap();
        (session, ui_rx)
    }

    fn intent(session: &mut CaptureSession, intent: UserIntent) {
        session.handle_event(SessionEvent::Intent(intent));
    }

    fn engine_event(session: &mut CaptureSession, event: EngineEvent) {
        session.handle_event(SessionEvent::Engine(event));
    }

    /// Pump the inbox until the predicate holds or a generous deadline passes
    fn pump_until<F>(session: &mut CaptureSession, predicate: F)
    where
        F: Fn(&CaptureSession) -> bool,
    {
        for _ in 0..400 {
            session.pump_pending();
            if predicate(session) {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("condition not reached before deadline");
    }

    fn drain_ui(rx: &mut tokio::sync::mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_near_duplicate_touch_produces_no_engine_call() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, _ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(
            &mut session,
            UserIntent::TouchFocus {
                x: 960.0,
                y: 540.0,
                screen_width: 1920.0,
                screen_height: 1080.0,
            },
        );
        intent(
            &mut session,
            UserIntent::TouchFocus {
                x: 965.0,
                y: 542.0,
                screen_width: 1920.0,
                screen_height: 1080.0,
            },
        );

        assert_eq!(engine.count("set_focus_point"), 1);
        assert_eq!(session.state().focus_mode, FocusMode::UserSelected);
    }

    #[test]
    fn test_edge_touch_rejected() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, _ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(
            &mut session,
            UserIntent::TouchFocus {
                x: 10.0,
                y: 540.0,
                screen_width: 1920.0,
                screen_height: 1080.0,
            },
        );

        assert_eq!(engine.count("set_focus_point"), 0);
        assert_eq!(session.state().focus_mode, FocusMode::Continuous);
    }

    #[test]
    fn test_touch_point_rotated_to_sensor_orientation() {
        let engine = Arc::new(MockEngine::default());
        let camera = CameraInfo {
            sensor_orientation: 90,
            ..CameraInfo::default()
        };
        let (mut session, _ui) =
            new_session_with_camera(Arc::clone(&engine), camera, SessionConfig::default());

        // Right of center on screen lands below center on the sensor
        intent(
            &mut session,
            UserIntent::TouchFocus {
                x: 0.75 * 1920.0,
                y: 0.5 * 1080.0,
                screen_width: 1920.0,
                screen_height: 1080.0,
            },
        );

        assert!(engine.calls().contains(&"set_focus_point:0.50:0.25".to_string()));
    }

    #[test]
    fn test_manual_iso_edit_enters_manual_mode_until_reset() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, _ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(&mut session, UserIntent::StepIso(1));

        assert_eq!(session.state().exposure_mode, ExposureMode::Manual);
        // One step up from the ISO 100 default
        assert_eq!(session.state().manual_exposure.unwrap().iso, 125);
        assert_eq!(engine.count("set_manual_exposure"), 1);

        // Auto-exposure reports never revert manual mode
        engine_event(
            &mut session,
            EngineEvent::AutoExposureState(crate::engine::AeState::Converged),
        );
        assert_eq!(session.state().exposure_mode, ExposureMode::Manual);

        intent(&mut session, UserIntent::ResetExposure);
        assert_eq!(session.state().exposure_mode, ExposureMode::Auto);
        assert!(session.state().manual_exposure.is_none());
        // Once at session start, once for the reset
        assert_eq!(engine.count("set_auto_exposure"), 2);
    }

    #[test]
    fn test_shutter_stepping_respects_app_cap() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, _ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        // Step far past the end of the table; must clamp at the 1/4s cap
        for _ in 0..100 {
            intent(&mut session, UserIntent::StepShutter(1));
        }
        assert_eq!(
            session.state().manual_exposure.unwrap().shutter_ns,
            250_000_000
        );
    }

    #[test]
    fn test_dark_scene_report_switches_to_night() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, mut ui) = new_session(Arc::clone(&engine), SessionConfig::default());
        drain_ui(&mut ui);

        engine_event(
            &mut session,
            EngineEvent::ExposureStatus {
                iso: 2000,
                shutter_ns: 20_000_000,
            },
        );
        assert_eq!(session.state().capture_mode, CaptureMode::Night);
        assert!(
            drain_ui(&mut ui)
                .iter()
                .any(|e| matches!(e, UiEvent::CaptureModeChanged(CaptureMode::Night)))
        );

        // Bright again: back to zero-shutter-lag
        engine_event(
            &mut session,
            EngineEvent::ExposureStatus {
                iso: 100,
                shutter_ns: 10_000_000,
            },
        );
        assert_eq!(session.state().capture_mode, CaptureMode::ZeroShutterLag);
    }

    #[test]
    fn test_user_mode_choice_latches_off_auto_switching() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, _ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(
            &mut session,
            UserIntent::SetCaptureMode(CaptureMode::ZeroShutterLag),
        );
        assert!(session.state().user_capture_mode_override);

        // No report sequence may auto-switch after the explicit choice
        for (iso, shutter_ns) in [
            (2000, 20_000_000),
            (100, 40_000_000),
            (12800, 250_000_000),
            (100, 1_000_000),
        ] {
            engine_event(&mut session, EngineEvent::ExposureStatus { iso, shutter_ns });
            assert_eq!(session.state().capture_mode, CaptureMode::ZeroShutterLag);
        }
    }

    #[test]
    fn test_manual_controls_suppress_auto_switching() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, _ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(&mut session, UserIntent::StepIso(1));
        engine_event(
            &mut session,
            EngineEvent::ExposureStatus {
                iso: 2000,
                shutter_ns: 20_000_000,
            },
        );
        assert_eq!(session.state().capture_mode, CaptureMode::ZeroShutterLag);
    }

    #[test]
    fn test_capture_guard_allows_single_capture() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, mut ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(&mut session, UserIntent::Capture);
        intent(&mut session, UserIntent::Capture);

        pump_until(&mut session, |s| !s.state().capture_in_progress);

        assert_eq!(engine.count("estimate"), 1);
        assert_eq!(engine.count("capture_zsl"), 1);
        assert!(
            drain_ui(&mut ui)
                .iter()
                .any(|e| matches!(e, UiEvent::CaptureFinished { .. }))
        );
    }

    #[test]
    fn test_estimation_failure_still_captures() {
        let engine = Arc::new(MockEngine {
            fail_estimation: true,
            ..MockEngine::default()
        });
        let (mut session, mut ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(&mut session, UserIntent::Capture);
        pump_until(&mut session, |s| !s.state().capture_in_progress);

        assert_eq!(engine.count("capture_zsl"), 1);
        assert!(
            drain_ui(&mut ui)
                .iter()
                .any(|e| matches!(e, UiEvent::CaptureFinished { .. }))
        );
    }

    #[test]
    fn test_capture_failure_clears_guard_and_allows_retry() {
        let engine = Arc::new(MockEngine {
            fail_zsl: true,
            ..MockEngine::default()
        });
        let (mut session, mut ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(&mut session, UserIntent::Capture);
        pump_until(&mut session, |s| !s.state().capture_in_progress);
        assert!(
            drain_ui(&mut ui)
                .iter()
                .any(|e| matches!(e, UiEvent::CaptureFailed(_)))
        );

        // Immediate retry must be accepted
        intent(&mut session, UserIntent::Capture);
        pump_until(&mut session, |s| !s.state().capture_in_progress);
        assert_eq!(engine.count("capture_zsl"), 2);
    }

    #[test]
    fn test_night_capture_runs_hdr_pipeline() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, mut ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        engine_event(
            &mut session,
            EngineEvent::ExposureStatus {
                iso: 2000,
                shutter_ns: 20_000_000,
            },
        );
        assert_eq!(session.state().capture_mode, CaptureMode::Night);

        intent(&mut session, UserIntent::Capture);
        {
            let engine = Arc::clone(&engine);
            pump_until(&mut session, move |_| engine.count("capture_hdr") == 1);
        }
        // HDR completion arrives as an engine event, not an op completion
        assert!(session.state().capture_in_progress);

        engine_event(
            &mut session,
            EngineEvent::HdrCaptureProgress {
                completed: 4,
                total: 12,
            },
        );
        engine_event(&mut session, EngineEvent::HdrCaptureCompleted);

        assert!(!session.state().capture_in_progress);
        let events = drain_ui(&mut ui);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, UiEvent::CaptureProgress { completed: 4, total: 12 }))
        );
        assert!(events.iter().any(|e| matches!(e, UiEvent::CaptureFinished { .. })));
    }

    #[test]
    fn test_raw_video_toggles_through_capture_guard() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, mut ui) = new_session(Arc::clone(&engine), SessionConfig::default());
        drain_ui(&mut ui);

        intent(&mut session, UserIntent::SetCaptureMode(CaptureMode::RawVideo));
        intent(&mut session, UserIntent::Capture);
        assert!(session.state().capture_in_progress);
        assert!(engine.calls().contains(&"set_ois:false".to_string()));
        assert!(
            drain_ui(&mut ui)
                .iter()
                .any(|e| matches!(e, UiEvent::RecordingStateChanged(true)))
        );

        intent(&mut session, UserIntent::Capture);
        assert!(!session.state().capture_in_progress);
        assert!(
            drain_ui(&mut ui)
                .iter()
                .any(|e| matches!(e, UiEvent::RecordingStateChanged(false)))
        );
    }

    #[test]
    fn test_lock_waits_for_convergence() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, mut ui) = new_session(Arc::clone(&engine), SessionConfig::default());
        drain_ui(&mut ui);

        intent(&mut session, UserIntent::LockFocusExposure);
        assert_eq!(engine.count("set_ae_lock"), 0);
        assert!(session.state().lock_pending);

        engine_event(
            &mut session,
            EngineEvent::AutoFocusState {
                state: AfState::PassiveFocused,
                focus_distance: 1.2,
            },
        );
        // Focus ready, exposure not yet converged
        assert_eq!(engine.count("set_ae_lock"), 0);

        engine_event(&mut session, EngineEvent::AutoExposureState(AeState::Converged));

        assert_eq!(engine.count("set_ae_lock:true"), 1);
        assert_eq!(engine.count("set_awb_lock:true"), 1);
        assert!(engine.calls().contains(&"set_manual_focus:1.200".to_string()));
        assert_eq!(session.state().focus_mode, FocusMode::UserLocked);
        assert!(
            drain_ui(&mut ui)
                .iter()
                .any(|e| matches!(e, UiEvent::HapticTick))
        );
    }

    #[test]
    fn test_stale_user_focus_reverts_on_exposure_search() {
        let engine = Arc::new(MockEngine::default());
        let config = SessionConfig {
            focus_revert_timeout_ms: 0,
            ..SessionConfig::default()
        };
        let (mut session, mut ui) = new_session(Arc::clone(&engine), config);

        intent(
            &mut session,
            UserIntent::TouchFocus {
                x: 960.0,
                y: 540.0,
                screen_width: 1920.0,
                screen_height: 1080.0,
            },
        );
        assert_eq!(session.state().focus_mode, FocusMode::UserSelected);
        drain_ui(&mut ui);

        engine_event(&mut session, EngineEvent::AutoExposureState(AeState::Searching));

        assert_eq!(session.state().focus_mode, FocusMode::Continuous);
        assert!(session.state().last_focus_point.is_none());
        // Once at session start, once for the revert
        assert_eq!(engine.count("set_auto_focus"), 2);
        assert!(
            drain_ui(&mut ui)
                .iter()
                .any(|e| matches!(e, UiEvent::FocusIndicator(FocusIndicator::Hide)))
        );
    }

    #[test]
    fn test_fresh_user_focus_survives_exposure_search() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, _ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(
            &mut session,
            UserIntent::TouchFocus {
                x: 960.0,
                y: 540.0,
                screen_width: 1920.0,
                screen_height: 1080.0,
            },
        );
        engine_event(&mut session, EngineEvent::AutoExposureState(AeState::Searching));

        // Inside the 3000ms window the user's point stays
        assert_eq!(session.state().focus_mode, FocusMode::UserSelected);
    }

    #[test]
    fn test_manual_focus_always_allowed() {
        let engine = Arc::new(MockEngine::default());
        let (mut session, _ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(&mut session, UserIntent::LockFocusExposure);
        intent(&mut session, UserIntent::SetManualFocus { slider: 0.5 });

        assert_eq!(session.state().focus_mode, FocusMode::Manual);
        // Geometric midpoint of the 0.1..10.0 range
        assert!((session.state().focus_distance - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_unsupported_engine_is_fatal() {
        let engine = Arc::new(MockEngine {
            fail_init: true,
            ..MockEngine::default()
        });
        let (ui_tx, mut ui_rx) = unbounded_channel();
        let result = CaptureSession::new(
            SessionId::new(),
            engine,
            CameraInfo::default(),
            SessionConfig::default(),
            ui_tx,
        );

        assert!(result.is_err());
        assert!(
            drain_ui(&mut ui_rx)
                .iter()
                .any(|e| matches!(e, UiEvent::UnsupportedCamera(_)))
        );
    }

    #[test]
    fn test_preview_requests_do_not_backlog() {
        let engine = Arc::new(MockEngine {
            preview_delay: Some(Duration::from_millis(50)),
            ..MockEngine::default()
        });
        let (mut session, mut ui) = new_session(Arc::clone(&engine), SessionConfig::default());

        intent(
            &mut session,
            UserIntent::RequestPreview {
                timestamp_ns: 1,
                scale: 4,
            },
        );
        intent(
            &mut session,
            UserIntent::RequestPreview {
                timestamp_ns: 2,
                scale: 4,
            },
        );

        // Wait for the worker to drain; completions land in the inbox
        // before the pending count drops
        pump_until(&mut session, |s| s.dispatcher.pending() == 0);
        session.pump_pending();

        // The second request was skipped while the worker was busy
        assert_eq!(engine.count("generate_preview"), 1);
        assert_eq!(
            drain_ui(&mut ui)
                .iter()
                .filter(|e| matches!(e, UiEvent::PreviewReady(_)))
                .count(),
            1
        );
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture-session core

use std::fmt;

/// Result type alias using SessionError
pub type SessionResult<T> = Result<T, SessionError>;

/// Top-level error type for session operations
#[derive(Debug, Clone)]
pub enum SessionError {
    /// Engine-reported errors
    Engine(EngineError),
    /// Dispatcher refused the operation (already closed)
    DispatcherClosed,
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Errors reported by the camera engine boundary
#[derive(Debug, Clone)]
pub enum EngineError {
    /// Camera or engine cannot run on this device; fatal for the session
    Unsupported(String),
    /// I/O failure inside an engine operation
    Io(String),
    /// A capture operation failed (e.g. HDR merge rejected the frames)
    CaptureFailed(String),
    /// Parameters outside what the engine accepts
    InvalidParameter(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Engine(e) => write!(f, "Engine error: {}", e),
            SessionError::DispatcherClosed => write!(f, "Dispatcher is closed"),
            SessionError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SessionError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Unsupported(msg) => write!(f, "Camera not supported: {}", msg),
            EngineError::Io(msg) => write!(f, "I/O error: {}", msg),
            EngineError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            EngineError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
        }
    }
}

impl std::error::Error for SessionError {}
impl std::error::Error for EngineError {}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        SessionError::Engine(err)
    }
}

impl From<String> for SessionError {
    fn from(msg: String) -> Self {
        SessionError::Other(msg)
    }
}

impl From<&str> for SessionError {
    fn from(msg: &str) -> Self {
        SessionError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

//! Error types for the Umbra3D engine
//!
//! This module defines the error types used throughout the engine,
//! including rendering, initialization, object handles and configuration.

use std::fmt;

/// Result type for Umbra3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Umbra3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (OpenGL driver, mock device, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, framebuffer, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, device, subsystems)
    InitializationFailed(String),

    /// Object handle is stale (object deleted) or would corrupt the hierarchy
    InvalidHandle(String),

    /// Configuration value rejected by validation
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an error and build an `Error::BackendError` from the same message
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("umbra3d::mock", "buffer {} was released", id);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::umbra3d::Engine::log_detailed(
            $crate::umbra3d::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::umbra3d::Error::BackendError(message)
    }};
}

/// Log an error and return it from the enclosing function
///
/// # Example
///
/// ```ignore
/// engine_bail!("umbra3d::mock", "offset {} out of range", offset);
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log an error and build an `Error::InvalidHandle`
///
/// Used for use-after-delete and hierarchy misuse on object handles.
#[macro_export]
macro_rules! engine_handle_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::umbra3d::Engine::log_detailed(
            $crate::umbra3d::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::umbra3d::Error::InvalidHandle(message)
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

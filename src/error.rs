//! Error types for the viewport-shrink controller.

/// Errors that can occur inside the viewport-shrink subsystem.
///
/// Most of these never reach the caller of the control API: policy rejections
/// are reported as `false`, and collaborator failures are logged and absorbed.
/// They are returned by constructors and by the host-facing traits.
#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    /// A mode was built with a scale that is not a positive finite number.
    #[error("Invalid scale {0} (expected a finite value > 0)")]
    InvalidScale(f32),

    /// Raw anchor bits did not name exactly one horizontal and one vertical edge.
    #[error("Invalid anchor bits {0:#x} (expected one of LEFT/RIGHT and one of TOP/BOTTOM)")]
    InvalidAnchor(u32),

    /// The container (display) geometry could not be queried.
    #[error("Display geometry unavailable: {0}")]
    GeometryUnavailable(String),

    /// The host failed to create, update or remove an overlay surface.
    #[error("Overlay surface error: {0}")]
    Surface(String),

    /// The settings store failed to persist a value.
    #[error("Settings store error: {0}")]
    Settings(String),

    /// A mode listener reported a failure while being notified.
    #[error("Listener failed: {0}")]
    Listener(String),

    /// The telemetry sink rejected an operation record.
    #[error("Telemetry sink error: {0}")]
    Telemetry(String),

    /// An I/O error occurred (e.g., spawning the worker thread).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Collaborator traits implemented by the host system.
//!
//! The controller never talks to a compositor, input stack or settings
//! provider directly. Everything goes through these traits so the host can
//! plug its own services in, and tests can use [`MockHost`](crate::MockHost).

use std::fmt;
use std::sync::Arc;

use crate::error::ViewportError;
use crate::mode::Horizontal;
use crate::monitor::OperationSink;
use crate::settings::SettingsStore;
use crate::transform::{Rect, Transform};

// =============================================================================
// Plain data exchanged with the host
// =============================================================================

/// Logical size of the default display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayInfo {
    /// Logical width in pixels.
    pub width: i32,
    /// Logical height in pixels.
    pub height: i32,
}

impl DisplayInfo {
    /// Display of the given logical size.
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Whether the display is wider than tall.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// Parameters the input stack uses to map raw touches into the shrunk space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMapping {
    /// Offset added to raw x before scaling.
    pub offset_x: i32,
    /// Offset added to raw y before scaling.
    pub offset_y: i32,
    /// Inverse of the viewport scale.
    pub inverse_scale: f32,
    /// Container width.
    pub width: i32,
    /// Container height.
    pub height: i32,
}

impl PointerMapping {
    /// Mapping that undoes `transform` inside a container of size `display`.
    pub fn for_transform(transform: &Transform, display: DisplayInfo) -> Self {
        Self {
            offset_x: -(transform.translate_x as i32),
            offset_y: -(transform.translate_y as i32),
            inverse_scale: 1.0 / transform.scale,
            width: display.width,
            height: display.height,
        }
    }

    /// Mapping that leaves touches untouched.
    pub fn identity(display: DisplayInfo) -> Self {
        Self::for_transform(&Transform::IDENTITY, display)
    }
}

impl fmt::Display for PointerMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "offsetX={} offsetY={} inverseScale={}",
            self.offset_x, self.offset_y, self.inverse_scale
        )
    }
}

/// The overlay surfaces the control-surface manager installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Full-screen, non-touchable guide drawn behind the shrunk viewport.
    Guide,
    /// Touchable frame around the shrunk viewport carrying the handles.
    Control,
}

/// Placement and input flags of an overlay surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSpec {
    /// Which surface this describes.
    pub kind: SurfaceKind,
    /// Left edge in untransformed display coordinates.
    pub x: i32,
    /// Top edge in untransformed display coordinates.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Whether the surface receives touches.
    pub touchable: bool,
    /// Whether touches may slide out of the surface into the one below.
    pub slippery: bool,
}

/// What was in the foreground when a user action happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForegroundContext {
    /// The lock screen was showing.
    Keyguard,
    /// A named application was on top.
    App(String),
    /// Nothing could be determined.
    Unknown,
}

impl fmt::Display for ForegroundContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyguard => f.write_str("KEYGUARD"),
            Self::App(name) => f.write_str(name),
            Self::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

// =============================================================================
// Collaborator traits
// =============================================================================

/// The host compositor's animation scheduler.
pub trait HostCompositor: Send + Sync {
    /// Ask for [`ModeController::step`](crate::ModeController::step) to be
    /// called on the next frame.
    fn schedule_animation(&self);
}

/// The input subsystem's touch remapper.
pub trait PointerMapper: Send + Sync {
    /// Replace the current remapping parameters.
    fn update_pointer_mapping(&self, mapping: PointerMapping);
}

/// Environment signals the availability policy depends on.
pub trait Environment: Send + Sync {
    /// Query the default display's logical size.
    fn display_info(&self) -> Result<DisplayInfo, ViewportError>;

    /// Whether the device is currently powered by a wireless charger.
    fn is_wireless_charging(&self) -> bool;

    /// Whether `user` finished initial device setup.
    fn is_user_setup_complete(&self, user: u32) -> bool;

    /// Whether a magnification or touch-exploration capability is active for `user`.
    fn has_conflicting_accessibility(&self, user: u32) -> bool;

    /// Whether a presentation-category auxiliary display is attached.
    fn has_presentation_display(&self) -> bool;
}

/// The host's overlay window manager.
pub trait OverlayHost: Send + Sync {
    /// Create a surface.
    fn add_surface(&self, spec: &SurfaceSpec) -> Result<(), ViewportError>;

    /// Re-layout an existing surface.
    fn update_surface(&self, spec: &SurfaceSpec) -> Result<(), ViewportError>;

    /// Destroy a surface.
    fn remove_surface(&self, kind: SurfaceKind) -> Result<(), ViewportError>;

    /// Dock the flip and resize buttons to `side` of the control surface.
    fn set_button_side(&self, side: Horizontal);

    /// On-screen bounds of the guide's settings hot-zone, once laid out.
    fn guide_bounds(&self) -> Option<Rect>;

    /// Start the external setup flow for the feature.
    fn launch_setup(&self) -> Result<(), ViewportError>;
}

/// Reports what is in the foreground, for operation records.
pub trait ForegroundProbe: Send + Sync {
    /// Current foreground context.
    fn foreground(&self) -> ForegroundContext;
}

/// Observer of off/non-off crossings.
///
/// Errors and panics from one listener are logged and never reach the
/// controller or the other listeners.
pub trait ModeListener: Send + Sync {
    /// The viewport left the off mode.
    fn on_enter(&self) -> Result<(), ViewportError>;

    /// The viewport returned to the off mode.
    fn on_exit(&self) -> Result<(), ViewportError>;
}

/// Bundle of host collaborators handed to a controller at construction.
#[derive(Clone)]
pub struct HostServices {
    /// Frame scheduler.
    pub compositor: Arc<dyn HostCompositor>,
    /// Touch remapper.
    pub pointer: Arc<dyn PointerMapper>,
    /// Environment signals.
    pub environment: Arc<dyn Environment>,
    /// Overlay window manager.
    pub overlays: Arc<dyn OverlayHost>,
    /// Durable key/value store.
    pub settings: Arc<dyn SettingsStore>,
    /// Foreground probe for operation records.
    pub foreground: Arc<dyn ForegroundProbe>,
    /// Optional external telemetry sink.
    pub telemetry: Option<Arc<dyn OperationSink>>,
}

impl fmt::Debug for HostServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices")
            .field("telemetry", &self.telemetry.is_some())
            .finish_non_exhaustive()
    }
}

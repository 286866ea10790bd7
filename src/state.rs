//! Controller state snapshot.

use std::fmt;

use crate::config::UserId;
use crate::host::{DisplayInfo, PointerMapping};
use crate::mode::ViewportMode;
use crate::policy::AvailabilityFlags;
use crate::transform::Transform;

/// A snapshot of the controller's current state.
///
/// This captures the mode, transition and policy inputs at a point in time.
/// Use [`ModeController::state`](crate::ModeController::state) to obtain a snapshot.
#[derive(Debug, Clone)]
pub struct ControllerState {
    /// The authoritative logical mode.
    pub mode: ViewportMode,
    /// The live interpolated transform, while a transition is in flight.
    pub transition: Option<Transform>,
    /// Cached availability inputs.
    pub flags: AvailabilityFlags,
    /// Last known container geometry.
    pub display: DisplayInfo,
    /// Last mapping pushed to the input subsystem.
    pub pointer_mapping: PointerMapping,
    /// Whether pointer-mapping pushes are suspended.
    pub pointer_sync_suspended: bool,
    /// Whether overlay surfaces are (to be) installed.
    pub surfaces_installed: bool,
    /// Number of registered listeners.
    pub listener_count: usize,
    /// Current session user.
    pub user: UserId,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Current Mode: {}", self.mode)?;
        writeln!(f, "  Current input pointer mapping: {}", self.pointer_mapping)?;
        match &self.transition {
            Some(t) => writeln!(
                f,
                "  Transition: translate=({}, {}) scale={}",
                t.translate_x, t.translate_y, t.scale
            )?,
            None => writeln!(f, "  Transition: none")?,
        }
        writeln!(f, "  Internal status:")?;
        writeln!(f, "    pointerSyncSuspended={}", self.pointer_sync_suspended)?;
        writeln!(f, "    display={}x{}", self.display.width, self.display.height)?;
        writeln!(f, "    flags={:?}", self.flags)?;
        writeln!(f, "    surfacesInstalled={}", self.surfaces_installed)?;
        writeln!(f, "    user={}", self.user)?;
        write!(f, "    Number of listeners={}", self.listener_count)
    }
}

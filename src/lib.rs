//! Viewport shrinking ("one-handed mode") for a compositor.
//!
//! This crate shrinks the whole logical screen into a scaled-down region
//! docked to a corner, so a large display can be operated with one hand. It
//! owns the current mode, animates between modes, keeps the input stack's
//! pointer remapping in sync, enforces when shrinking is allowed at all, and
//! manages the overlay handles used to move, resize and flip the region.
//!
//! The host plugs in through the traits bundled in [`HostServices`]: a frame
//! scheduler, a pointer remapper, environment signals, an overlay window
//! manager and a settings store.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use shrinkview_core::{Anchor, Horizontal, MockHost, ModeController, Session, Vertical, ViewportConfig, ViewportMode};
//!
//! fn main() -> Result<(), shrinkview_core::ViewportError> {
//!     let host = MockHost::new();
//!     host.set_feature_enabled(0, true);
//!
//!     let controller = ModeController::new(ViewportConfig::default(), Session::new(0), host.services())?;
//!
//!     // Shrink to 75%, docked bottom-right, 80px above the bottom edge
//!     let mode = ViewportMode::new(0, 80, 0.75, Anchor::new(Horizontal::Right, Vertical::Bottom))?;
//!     assert!(controller.request_mode(mode, false));
//!
//!     // The host's frame pump drives the animation
//!     let mut now = Instant::now();
//!     while controller.step(now) {
//!         now += Duration::from_millis(16);
//!     }
//!
//!     let transform = controller.current_transform().unwrap();
//!     assert_eq!((transform.translate_x, transform.translate_y), (270.0, 400.0));
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! Use [`MockHost`] to drive a controller without a compositor:
//!
//! ```
//! use shrinkview_core::{MockHost, ModeController, Session, ViewportConfig, ViewportMode};
//!
//! let host = MockHost::new();
//! let controller = ModeController::new(ViewportConfig::default(), Session::new(0), host.services()).unwrap();
//! assert!(controller.request_mode(ViewportMode::OFF, true));
//! assert!(controller.current_transform().is_none());
//! ```

#![warn(missing_docs)]

mod animation;
mod config;
mod controller;
mod error;
mod events;
mod host;
mod mock;
mod mode;
mod monitor;
mod panel;
mod policy;
mod settings;
mod state;
mod transform;
mod trigger;

// Re-export public API
pub use animation::{ease_in_out, Transition};
pub use config::{Session, UserId, ViewportConfig};
pub use controller::{ListenerId, ModeController};
pub use error::ViewportError;
pub use events::EnvironmentEvent;
pub use host::{
    DisplayInfo, Environment, ForegroundContext, ForegroundProbe, HostCompositor, HostServices, ModeListener,
    OverlayHost, PointerMapper, PointerMapping, SurfaceKind, SurfaceSpec,
};
pub use mock::{MockHost, MockListener};
pub use mode::{Anchor, Horizontal, Vertical, ViewportMode};
pub use monitor::{Operation, OperationEvent, OperationMonitor, OperationSink};
pub use panel::alpha::{control_bar_top, progress_alpha, proximity_alpha};
pub use panel::gesture::{DragGesture, DragKind};
pub use panel::{ControlTarget, SurfaceTransform, TouchEvent, TouchPhase};
pub use policy::{evaluate as evaluate_policy, AvailabilityFlags, Unavailable};
pub use settings::{MemorySettingsStore, SettingValue, Settings, SettingsStore};
pub use state::ControllerState;
pub use transform::{clamp_scale, clamp_y_offset, compute_transform, sanitize, Rect, Transform, MIN_SCALE};
pub use trigger::{SwipeConfig, SwipeTrigger, TouchSample};

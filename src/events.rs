//! Environment notifications delivered by the host.

use log::{debug, error, info, warn};

use crate::config::UserId;
use crate::controller::ModeController;
use crate::mode::{Anchor, Horizontal, Vertical, ViewportMode};
use crate::monitor::Operation;

/// A discrete notification from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentEvent {
    /// An auxiliary display was attached.
    DisplayAdded,
    /// An auxiliary display was detached.
    DisplayRemoved,
    /// The default display's configuration (size, rotation) changed.
    DisplayChanged,
    /// Battery or charger state changed.
    BatteryChanged,
    /// The screen turned off.
    ScreenOff,
    /// The screensaver started.
    DreamingStarted,
    /// An accessibility service was enabled or disabled.
    AccessibilityChanged,
    /// Explicit enter/exit request, e.g. from a navigation-bar swipe.
    ///
    /// `alignment` picks the side to dock to; `None` means "go home" and
    /// exits. `vertical_position` optionally pins the bottom of the shrunk
    /// viewport at that many pixels from the top of the container.
    Trigger {
        /// Side to dock to, `None` to exit.
        alignment: Option<Horizontal>,
        /// Optional explicit vertical position.
        vertical_position: Option<i32>,
    },
    /// The foreground user changed.
    UserSwitchComplete(UserId),
    /// A user finished initial device setup.
    UserSetupComplete(UserId),
    /// The persisted feature-enabled flag changed.
    FeatureEnabledChanged,
}

impl ModeController {
    /// React to an environment notification.
    ///
    /// Every event refreshes the cached availability inputs it affects; a
    /// non-off mode that is no longer permitted is left immediately.
    pub fn handle_event(&self, event: EnvironmentEvent) {
        debug!("environment event: {event:?}");

        match event {
            EnvironmentEvent::DisplayAdded
            | EnvironmentEvent::DisplayRemoved
            | EnvironmentEvent::BatteryChanged
            | EnvironmentEvent::AccessibilityChanged
            | EnvironmentEvent::FeatureEnabledChanged => {
                self.refresh_flags();
                self.enforce_policy();
            }
            EnvironmentEvent::DisplayChanged => self.display_changed(),
            EnvironmentEvent::ScreenOff => {
                self.request_mode(ViewportMode::OFF, true);
            }
            EnvironmentEvent::DreamingStarted => {
                self.request_mode(ViewportMode::OFF, false);
            }
            EnvironmentEvent::Trigger {
                alignment,
                vertical_position,
            } => self.trigger(alignment, vertical_position),
            EnvironmentEvent::UserSwitchComplete(user) => {
                info!("switching to user {user}");
                self.set_user(user);
                self.refresh_flags();
                self.request_mode(ViewportMode::OFF, false);
            }
            EnvironmentEvent::UserSetupComplete(user) => self.user_setup_complete(user),
        }
    }

    fn display_changed(&self) {
        let display = match self.services.environment.display_info() {
            Ok(display) => display,
            Err(e) => {
                error!("failed to query display geometry after change: {e}");
                return;
            }
        };
        self.refresh_flags();
        self.update_display(display);
    }

    fn trigger(&self, alignment: Option<Horizontal>, vertical_position: Option<i32>) {
        if !self.state.lock().flags.feature_enabled {
            debug!("trigger ignored, feature disabled");
            return;
        }

        if !self.mode().is_off() {
            if alignment.is_none() {
                self.monitor.push(Operation::ExitHome);
                self.request_mode(ViewportMode::OFF, false);
            }
            return;
        }

        let Some(horizontal) = alignment else {
            return;
        };
        let display = match self.services.environment.display_info() {
            Ok(display) => display,
            Err(e) => {
                error!("failed to query display geometry for trigger: {e}");
                return;
            }
        };

        let scale = self.saved_scale();
        let anchor = Anchor::new(horizontal, Vertical::Bottom);
        let y_offset = match vertical_position {
            Some(pos) => display.height - pos - (display.height as f32 * scale) as i32,
            None => self.settings.y_offset(),
        };
        let mode = match ViewportMode::new(self.settings.x_offset(), y_offset, scale, anchor) {
            Ok(mode) => mode,
            Err(e) => {
                warn!("cannot build mode from persisted values: {e}");
                return;
            }
        };

        if self.request_mode(mode, false) {
            let entered = self.mode();
            self.settings.save_anchor(entered.anchor());
            self.settings.save_y_offset(entered.y_offset());
            self.monitor.push(Operation::Enter);
        }
    }

    fn user_setup_complete(&self, user: UserId) {
        if self.services.environment.is_user_setup_complete(user)
            && self.settings.is_feature_setting_missing(user)
        {
            info!("enabling viewport shrinking for newly set up user {user}");
            self.settings.set_feature_enabled(user, true);
        }
        self.refresh_flags();
        self.enforce_policy();
    }
}

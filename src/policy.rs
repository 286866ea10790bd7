//! Availability policy: the environmental conditions that gate entry.

use std::fmt;

use crate::host::{DisplayInfo, Environment};

/// Cached environment flags the policy is evaluated against.
///
/// Refreshed by the controller on each relevant environment event and
/// consulted synchronously on every entry request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilityFlags {
    /// The persisted feature-enabled flag is on.
    pub feature_enabled: bool,
    /// The device is charging wirelessly.
    pub wireless_charging: bool,
    /// A magnification or touch-exploration capability is active.
    pub accessibility_conflict: bool,
    /// A presentation-category auxiliary display is attached.
    pub presentation_display: bool,
    /// The current user has not finished initial setup.
    pub setup_incomplete: bool,
}

impl AvailabilityFlags {
    /// Query every environment-backed flag for `user`.
    ///
    /// `feature_enabled` comes from settings, not the environment, and is
    /// passed in.
    pub fn query(env: &dyn Environment, user: u32, feature_enabled: bool) -> Self {
        Self {
            feature_enabled,
            wireless_charging: env.is_wireless_charging(),
            accessibility_conflict: env.has_conflicting_accessibility(user),
            presentation_display: env.has_presentation_display(),
            setup_incomplete: !env.is_user_setup_complete(user),
        }
    }
}

/// Why entry is currently forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// The feature is switched off in settings.
    FeatureDisabled,
    /// The display is wider than tall.
    Landscape,
    /// The device is charging wirelessly.
    WirelessCharging,
    /// Initial setup is not complete.
    SetupIncomplete,
    /// A conflicting accessibility capability is active.
    AccessibilityConflict,
    /// A presentation display is attached.
    PresentationDisplay,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::FeatureDisabled => "feature disabled",
            Self::Landscape => "display is landscape",
            Self::WirelessCharging => "wireless charging",
            Self::SetupIncomplete => "user setup incomplete",
            Self::AccessibilityConflict => "conflicting accessibility capability",
            Self::PresentationDisplay => "presentation display attached",
        };
        f.write_str(reason)
    }
}

/// Evaluate the policy; `Ok` means a non-off mode may be entered.
pub fn evaluate(flags: &AvailabilityFlags, display: &DisplayInfo) -> Result<(), Unavailable> {
    if !flags.feature_enabled {
        return Err(Unavailable::FeatureDisabled);
    }
    if display.is_landscape() {
        return Err(Unavailable::Landscape);
    }
    if flags.wireless_charging {
        return Err(Unavailable::WirelessCharging);
    }
    if flags.setup_incomplete {
        return Err(Unavailable::SetupIncomplete);
    }
    if flags.accessibility_conflict {
        return Err(Unavailable::AccessibilityConflict);
    }
    if flags.presentation_display {
        return Err(Unavailable::PresentationDisplay);
    }
    Ok(())
}

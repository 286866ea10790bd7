//! Tunables and the per-session user context.

use std::time::Duration;

/// Identifier of the user whose settings and policy are in effect.
pub type UserId = u32;

/// Tunables for a [`ModeController`](crate::ModeController).
#[derive(Debug, Clone)]
pub struct ViewportConfig {
    /// Length of an animated transition.
    pub transition_duration: Duration,
    /// How long the pointer-remap "active" flag stays set after the mapping
    /// returns to scale 1.
    pub remap_inactive_delay: Duration,
    /// Thickness of the control surface around the shrunk viewport, in pixels.
    pub surface_thickness: i32,
    /// Extra margin around the shrunk viewport in which backdrop taps are
    /// ignored, in screen pixels.
    pub protect_zone_padding: f32,
    /// Scale used when nothing has been persisted yet.
    pub default_scale: f32,
    /// Capacity of the control-surface worker queue.
    pub queue_capacity: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            transition_duration: Duration::from_millis(350),
            remap_inactive_delay: Duration::from_millis(700),
            surface_thickness: 48,
            protect_zone_padding: 24.0,
            default_scale: 0.75,
            queue_capacity: 32,
        }
    }
}

impl ViewportConfig {
    /// Override the transition duration.
    pub fn with_transition_duration(mut self, duration: Duration) -> Self {
        self.transition_duration = duration;
        self
    }

    /// Override the pointer-remap inactive delay.
    pub fn with_remap_inactive_delay(mut self, delay: Duration) -> Self {
        self.remap_inactive_delay = delay;
        self
    }

    /// Override the control-surface thickness.
    pub fn with_surface_thickness(mut self, thickness: i32) -> Self {
        self.surface_thickness = thickness.max(0);
        self
    }

    /// Override the worker queue capacity (at least 1).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

/// The user context a controller starts in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    /// Current foreground user.
    pub user: UserId,
}

impl Session {
    /// Session for `user`.
    pub fn new(user: UserId) -> Self {
        Self { user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = ViewportConfig::default()
            .with_transition_duration(Duration::from_millis(200))
            .with_remap_inactive_delay(Duration::ZERO)
            .with_surface_thickness(24)
            .with_queue_capacity(8);

        assert_eq!(config.transition_duration, Duration::from_millis(200));
        assert_eq!(config.remap_inactive_delay, Duration::ZERO);
        assert_eq!(config.surface_thickness, 24);
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.default_scale, 0.75);
    }

    #[test]
    fn builders_reject_degenerate_values() {
        let config = ViewportConfig::default().with_surface_thickness(-5).with_queue_capacity(0);
        assert_eq!(config.surface_thickness, 0);
        assert_eq!(config.queue_capacity, 1);
    }
}

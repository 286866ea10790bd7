//! Time-based interpolation between two transforms.

use std::f32::consts::PI;
use std::time::{Duration, Instant};

use crate::transform::Transform;

/// Accelerate-decelerate curve: slow start, fast middle, slow end.
///
/// Maps `[0, 1]` onto `[0, 1]`, with exact endpoints.
pub fn ease_in_out(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    ((t + 1.0) * PI).cos() / 2.0 + 0.5
}

/// An in-flight animated transition.
///
/// The start time latches on the first [`Transition::advance`] call, so a
/// transition created between two host frames starts on the next frame.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    from: Transform,
    to: Transform,
    live: Transform,
    start: Option<Instant>,
    duration: Duration,
}

impl Transition {
    /// Create a transition that has not started yet; its live value is `from`.
    pub fn new(from: Transform, to: Transform, duration: Duration) -> Self {
        Self {
            from,
            to,
            live: from,
            start: None,
            duration,
        }
    }

    /// Transform the transition starts from.
    pub fn from(&self) -> Transform {
        self.from
    }

    /// Transform the transition ends at.
    pub fn to(&self) -> Transform {
        self.to
    }

    /// Current interpolated transform.
    pub fn live(&self) -> Transform {
        self.live
    }

    /// Advance to `now` and return whether more steps are needed.
    ///
    /// Allocation-free and constant time.
    pub fn advance(&mut self, now: Instant) -> bool {
        let start = *self.start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);

        let fraction = if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
        };

        self.live = self.from.lerp(&self.to, ease_in_out(fraction));
        fraction < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TO: Transform = Transform {
        translate_x: 270.0,
        translate_y: 80.0,
        scale: 0.75,
    };

    #[test]
    fn curve_endpoints_and_symmetry() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!(ease_in_out(0.1) < 0.1);
        assert!(ease_in_out(0.9) > 0.9);
    }

    #[test]
    fn first_advance_latches_start() {
        let start = Instant::now() + Duration::from_secs(5);
        let mut transition = Transition::new(Transform::IDENTITY, TO, Duration::from_millis(350));

        assert_eq!(transition.from(), Transform::IDENTITY);
        assert_eq!(transition.to(), TO);
        assert_eq!(transition.live(), Transform::IDENTITY);
        assert!(transition.advance(start));
        assert_eq!(transition.live(), Transform::IDENTITY);

        assert!(transition.advance(start + Duration::from_millis(175)));
        let mid = transition.live();
        assert!(mid.scale < 1.0 && mid.scale > 0.75);
    }

    #[test]
    fn terminates_on_target() {
        let start = Instant::now();
        let mut transition = Transition::new(Transform::IDENTITY, TO, Duration::from_millis(350));

        let mut now = start;
        let mut steps = 0;
        while transition.advance(now) {
            now += Duration::from_millis(16);
            steps += 1;
            assert!(steps < 100);
        }
        assert!(now.duration_since(start) <= Duration::from_millis(350 + 16));
        assert_eq!(transition.live(), TO);
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut transition = Transition::new(Transform::IDENTITY, TO, Duration::ZERO);
        assert!(!transition.advance(Instant::now()));
        assert_eq!(transition.live(), TO);
    }
}

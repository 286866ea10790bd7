//! Opacity of the overlay surfaces while the viewport animates.

use crate::transform::Transform;

/// How far the live transform has progressed towards full shrink.
///
/// `(1 - current) / (1 - last_target)`, clamped to `[0, 1]`. A non-1 target
/// replaces `last_target`, so an exit animation (target 1) fades out against
/// the scale it is leaving.
pub fn progress_alpha(current_scale: f32, target_scale: f32, last_target_scale: &mut f32) -> f32 {
    if target_scale != 1.0 {
        *last_target_scale = target_scale;
    }

    let span = 1.0 - *last_target_scale;
    if span.abs() < f32::EPSILON {
        return 0.0;
    }
    ((1.0 - current_scale) / span).clamp(0.0, 1.0)
}

/// Fade for the guide as the control bar's top edge rises past the guide.
///
/// Quick fade early, slow fade late; `1` while the bar is below the guide or
/// the guide has not been laid out.
pub fn proximity_alpha(control_bar_top: f32, guide_bottom: i32) -> f32 {
    if guide_bottom <= 0 || control_bar_top > guide_bottom as f32 {
        return 1.0;
    }

    let ratio = control_bar_top / guide_bottom as f32;
    let early = 2.0 * ratio - 1.0;
    let late = ratio / 2.0;
    early.max(late).max(0.0)
}

/// Screen y of the control bar's top edge: the live transform applied to a
/// point one surface thickness above the viewport.
pub fn control_bar_top(live: &Transform, surface_thickness: i32) -> f32 {
    -(surface_thickness as f32) * live.scale + live.translate_y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_tracks_scale_towards_target() {
        let mut last = 1.0;
        assert_eq!(progress_alpha(1.0, 0.75, &mut last), 0.0);
        assert_eq!(last, 0.75);
        assert_eq!(progress_alpha(0.875, 0.75, &mut last), 0.5);
        assert_eq!(progress_alpha(0.75, 0.75, &mut last), 1.0);
        assert_eq!(progress_alpha(0.7, 0.75, &mut last), 1.0);
    }

    #[test]
    fn progress_on_exit_uses_last_target() {
        let mut last = 0.75;
        let alpha = progress_alpha(0.9, 1.0, &mut last);
        assert!((alpha - 0.4).abs() < 1e-6);
        assert_eq!(last, 0.75);
    }

    #[test]
    fn progress_without_any_target_is_zero() {
        let mut last = 1.0;
        assert_eq!(progress_alpha(1.0, 1.0, &mut last), 0.0);
    }

    #[test]
    fn proximity_fades_fast_then_slow() {
        assert_eq!(proximity_alpha(300.0, 200), 1.0);
        assert_eq!(proximity_alpha(150.0, 0), 1.0);
        assert_eq!(proximity_alpha(200.0, 200), 1.0);
        assert_eq!(proximity_alpha(150.0, 200), 0.5);
        assert_eq!(proximity_alpha(100.0, 200), 0.25);
        assert_eq!(proximity_alpha(-10.0, 200), 0.0);
    }

    #[test]
    fn bar_top_sits_above_viewport() {
        let live = Transform {
            translate_x: 270.0,
            translate_y: 80.0,
            scale: 0.75,
        };
        assert_eq!(control_bar_top(&live, 48), 44.0);
    }
}

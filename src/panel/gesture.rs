//! Gesture math for the control-surface handles.
//!
//! Kept free of I/O so every gesture is a pure function of the mode captured
//! at touch-down and the current pointer position.

use crate::host::DisplayInfo;
use crate::mode::{Vertical, ViewportMode};
use crate::transform::{clamp_scale, clamp_y_offset};

/// Which handle is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// Vertical move with the drag handle.
    Move,
    /// Resize with the resize handle.
    Resize,
}

/// A drag in progress: the mode and pointer position at touch-down.
#[derive(Debug, Clone, Copy)]
pub struct DragGesture {
    kind: DragKind,
    start_mode: ViewportMode,
    start_x: f32,
    start_y: f32,
}

impl DragGesture {
    /// Capture the start of a drag.
    pub fn begin(kind: DragKind, start_mode: ViewportMode, x: f32, y: f32) -> Self {
        Self {
            kind,
            start_mode,
            start_x: x,
            start_y: y,
        }
    }

    /// Which handle started the drag.
    pub fn kind(&self) -> DragKind {
        self.kind
    }

    /// Mode at touch-down.
    pub fn start_mode(&self) -> ViewportMode {
        self.start_mode
    }

    /// Pointer position at touch-down.
    pub fn start_point(&self) -> (f32, f32) {
        (self.start_x, self.start_y)
    }

    /// Mode for the pointer now at `(_, y)`, clamped to the container.
    ///
    /// The pointer delta is measured in the shrunk space, so it is scaled by
    /// the start scale to get container pixels; a bottom anchor inverts it
    /// because its offset grows upwards. Returns `None` if the drag started
    /// in the off mode.
    pub fn update(&self, _x: f32, y: f32, display: DisplayInfo, surface_thickness: i32) -> Option<ViewportMode> {
        let start = self.start_mode;
        if start.is_off() {
            return None;
        }

        let scale = start.scale();
        let mut delta = ((y - self.start_y) * scale).round() as i32;
        if start.anchor().vertical == Vertical::Bottom {
            delta = -delta;
        }

        match self.kind {
            DragKind::Move => {
                let y_offset = clamp_y_offset(
                    scale,
                    start.y_offset() + delta,
                    display.height,
                    surface_thickness,
                );
                Some(start.with_y_offset(y_offset))
            }
            DragKind::Resize => {
                let before = display.height as f32 * scale;
                let requested = (before + delta as f32) / display.height as f32;
                let clamped = clamp_scale(
                    requested,
                    start.y_offset(),
                    display.width,
                    display.height,
                    surface_thickness,
                );
                start.with_scale(clamped).ok()
            }
        }
    }
}

/// The same mode docked to the other horizontal edge.
pub fn flip(mode: ViewportMode) -> ViewportMode {
    mode.with_anchor(mode.anchor().flipped_horizontally())
}

/// Region of the control surface, in its local coordinates, where backdrop
/// taps are ignored: the shrunk viewport plus a padding that stays constant in
/// screen pixels.
///
/// Returned as `(left, top, right, bottom)`.
pub fn protect_zone(display: DisplayInfo, surface_thickness: i32, padding: f32, scale: f32) -> (f32, f32, f32, f32) {
    let t = surface_thickness as f32;
    let pad = padding / scale;
    (
        t - pad,
        t - pad,
        display.width as f32 + t + pad,
        display.height as f32 + t + pad,
    )
}

/// Whether `(x, y)` lies inside a zone from [`protect_zone`].
pub fn zone_contains(zone: (f32, f32, f32, f32), x: f32, y: f32) -> bool {
    let (left, top, right, bottom) = zone;
    x >= left && x < right && y >= top && y < bottom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{Anchor, Horizontal};

    const DISPLAY: DisplayInfo = DisplayInfo::new(1080, 1920);

    fn mode(y: i32, scale: f32, h: Horizontal, v: Vertical) -> ViewportMode {
        ViewportMode::new(0, y, scale, Anchor::new(h, v)).unwrap()
    }

    #[test]
    fn resize_maps_pointer_delta_into_container_space() {
        let start = mode(0, 0.75, Horizontal::Left, Vertical::Top);
        let drag = DragGesture::begin(DragKind::Resize, start, 50.0, 500.0);
        assert_eq!(drag.start_point(), (50.0, 500.0));
        assert_eq!(drag.start_mode(), start);

        let resized = drag.update(50.0, 400.0, DISPLAY, 48).unwrap();
        assert_eq!(resized.scale(), 1365.0 / 1920.0);
        assert_eq!(resized.y_offset(), 0);
        assert_eq!(resized.anchor(), start.anchor());
    }

    #[test]
    fn resize_is_clamped() {
        let start = mode(0, 0.75, Horizontal::Left, Vertical::Top);
        let drag = DragGesture::begin(DragKind::Resize, start, 0.0, 0.0);

        let shrunk = drag.update(0.0, -1000.0, DISPLAY, 48).unwrap();
        assert_eq!(shrunk.scale(), crate::transform::MIN_SCALE);

        let grown = drag.update(0.0, 1000.0, DISPLAY, 48).unwrap();
        assert_eq!(grown.scale(), 1080.0 / 1176.0);
    }

    #[test]
    fn move_with_bottom_anchor_inverts_delta() {
        let start = mode(100, 0.75, Horizontal::Right, Vertical::Bottom);
        let drag = DragGesture::begin(DragKind::Move, start, 0.0, 300.0);

        // Dragging up by 40 shrunk pixels raises the viewport by 30 container pixels.
        let moved = drag.update(0.0, 260.0, DISPLAY, 48).unwrap();
        assert_eq!(moved.y_offset(), 130);
        assert_eq!(moved.scale(), 0.75);

        let clamped = drag.update(0.0, -2000.0, DISPLAY, 48).unwrap();
        assert_eq!(clamped.y_offset(), 408);

        let floored = drag.update(0.0, 2000.0, DISPLAY, 48).unwrap();
        assert_eq!(floored.y_offset(), 0);
    }

    #[test]
    fn drag_from_off_mode_does_nothing() {
        let drag = DragGesture::begin(DragKind::Move, ViewportMode::OFF, 0.0, 0.0);
        assert!(drag.update(0.0, 100.0, DISPLAY, 48).is_none());
    }

    #[test]
    fn flip_preserves_offsets_and_scale() {
        let start = mode(250, 0.7, Horizontal::Left, Vertical::Bottom);
        let flipped = flip(start);
        assert_eq!(flipped.y_offset(), 250);
        assert_eq!(flipped.scale(), 0.7);
        assert_eq!(flipped.anchor().horizontal, Horizontal::Right);
        assert_eq!(flipped.anchor().vertical, Vertical::Bottom);
    }

    #[test]
    fn protect_zone_padding_is_scale_independent_on_screen() {
        let zone = protect_zone(DISPLAY, 48, 24.0, 0.5);
        assert_eq!(zone, (0.0, 0.0, 1176.0, 2016.0));
        assert!(zone_contains(zone, 10.0, 10.0));
        assert!(!zone_contains(zone, 1176.0, 10.0));

        let zone = protect_zone(DISPLAY, 48, 24.0, 1.0);
        assert!(!zone_contains(zone, 10.0, 10.0));
        assert!(zone_contains(zone, 30.0, 30.0));
    }
}

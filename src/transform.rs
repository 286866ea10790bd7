//! Pure transform math: anchor placement, clamping and interpolation.
//!
//! Everything here is a function of its arguments only. The controller and
//! the control-surface worker both call into this module, so a given
//! `(mode, container)` pair always produces the same placement.

use crate::mode::{Horizontal, Vertical, ViewportMode};

/// Smallest scale a shrunk viewport may take.
///
/// A 4-inch usable area on a 6-inch reference screen.
pub const MIN_SCALE: f32 = 4.0 / 6.0;

/// A uniform scale followed by a translation, in container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Horizontal translation applied after scaling.
    pub translate_x: f32,
    /// Vertical translation applied after scaling.
    pub translate_y: f32,
    /// Uniform scale factor.
    pub scale: f32,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    /// Whether this transform leaves every point where it is.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Map a point through the transform.
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.translate_x, y * self.scale + self.translate_y)
    }

    /// Map a rectangle, rounding the top-left corner and truncating the
    /// bottom-right one so the result never grows past the mapped area.
    pub fn map_rect(&self, rect: Rect) -> Rect {
        let (left, top) = self.map_point(rect.left as f32, rect.top as f32);
        let (right, bottom) = self.map_point(rect.right as f32, rect.bottom as f32);
        Rect {
            left: (left + 0.5) as i32,
            top: (top + 0.5) as i32,
            right: right as i32,
            bottom: bottom as i32,
        }
    }

    /// Linear blend from `self` to `to`; `t == 1` yields `to` exactly.
    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        if t >= 1.0 {
            return *to;
        }
        Self {
            translate_x: self.translate_x + (to.translate_x - self.translate_x) * t,
            translate_y: self.translate_y + (to.translate_y - self.translate_y) * t,
            scale: self.scale + (to.scale - self.scale) * t,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Integer rectangle, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl Rect {
    /// Create a rectangle from its edges.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height of the rectangle.
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Whether the point lies inside (left/top inclusive, right/bottom exclusive).
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.left < self.right
            && self.top < self.bottom
            && x >= self.left
            && x < self.right
            && y >= self.top
            && y < self.bottom
    }
}

/// Compute where `mode` places the shrunk viewport inside a
/// `container_w` x `container_h` container.
///
/// The scaled box is aligned to the anchor edges, then pushed by the offsets
/// towards the opposite edges. The translation is always integral.
pub fn compute_transform(mode: &ViewportMode, container_w: i32, container_h: i32) -> Transform {
    let scale = mode.scale();
    let scaled_w = (container_w as f32 * scale + 0.5) as i32;
    let scaled_h = (container_h as f32 * scale + 0.5) as i32;
    let anchor = mode.anchor();

    let left = match anchor.horizontal {
        Horizontal::Left => mode.x_offset(),
        Horizontal::Right => container_w - scaled_w - mode.x_offset(),
    };
    let top = match anchor.vertical {
        Vertical::Top => mode.y_offset(),
        Vertical::Bottom => container_h - scaled_h - mode.y_offset(),
    };

    Transform {
        translate_x: left as f32,
        translate_y: top as f32,
        scale,
    }
}

/// Clamp a vertical offset so the shrunk viewport plus its control-surface
/// margins stays inside the container. Never returns a negative offset.
pub fn clamp_y_offset(scale: f32, y_offset: i32, container_h: i32, surface_thickness: i32) -> i32 {
    let window_h = (container_h + 2 * surface_thickness) as f32 * scale;

    let mut y = y_offset;
    if window_h + y as f32 > container_h as f32 {
        y = (container_h as f32 - window_h) as i32;
    }
    y.max(0)
}

/// Clamp a requested scale to `[MIN_SCALE, max]`, where `max` keeps the shrunk
/// viewport and its control-surface margins inside the container on both axes.
///
/// When the container is too small for `MIN_SCALE`, the container cap wins.
pub fn clamp_scale(
    requested: f32,
    y_offset: i32,
    container_w: i32,
    container_h: i32,
    surface_thickness: i32,
) -> f32 {
    let scale = requested.max(MIN_SCALE);

    let max_height_scale =
        (container_h - y_offset) as f32 / (container_h + 2 * surface_thickness) as f32;
    let max_width_scale = container_w as f32 / (container_w + 2 * surface_thickness) as f32;
    let max_scale = max_height_scale.min(max_width_scale);

    if max_scale > 0.0 && scale > max_scale {
        max_scale
    } else {
        scale
    }
}

/// Bring a non-off mode within the container limits: scale first (against a
/// non-negative offset), then the offset against the resulting scale.
///
/// The off mode is returned unchanged.
pub fn sanitize(mode: ViewportMode, container_w: i32, container_h: i32, surface_thickness: i32) -> ViewportMode {
    if mode.is_off() {
        return mode;
    }

    let y = mode.y_offset().max(0);
    let scale = clamp_scale(mode.scale(), y, container_w, container_h, surface_thickness);
    let y = clamp_y_offset(scale, y, container_h, surface_thickness);

    // `clamp_scale` only returns positive values for positive containers; keep
    // the caller's scale if the container is degenerate.
    let with_scale = mode.with_scale(scale).unwrap_or(mode);
    with_scale.with_y_offset(y)
}

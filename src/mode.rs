//! Viewport mode definitions.

use std::fmt;

use crate::error::ViewportError;

// =============================================================================
// Anchor
// =============================================================================

/// Horizontal edge the shrunk viewport docks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizontal {
    /// Box-left aligned to container-left.
    Left,
    /// Box-right aligned to container-right.
    Right,
}

impl Horizontal {
    /// The other horizontal edge.
    pub fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Vertical edge the shrunk viewport docks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertical {
    /// Box-top aligned to container-top.
    Top,
    /// Box-bottom aligned to container-bottom.
    Bottom,
}

/// The screen corner a shrunk viewport is aligned to.
///
/// Exactly one edge per axis is always set; the type cannot express an
/// unset or doubly-set axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    /// Horizontal edge.
    pub horizontal: Horizontal,
    /// Vertical edge.
    pub vertical: Vertical,
}

impl Anchor {
    /// Bit for [`Horizontal::Left`] in the persisted representation.
    pub const LEFT_BIT: u32 = 0x1;
    /// Bit for [`Horizontal::Right`] in the persisted representation.
    pub const RIGHT_BIT: u32 = 0x2;
    /// Bit for [`Vertical::Top`] in the persisted representation.
    pub const TOP_BIT: u32 = 0x4;
    /// Bit for [`Vertical::Bottom`] in the persisted representation.
    pub const BOTTOM_BIT: u32 = 0x8;

    /// The anchor of the off mode.
    pub const TOP_LEFT: Self = Self::new(Horizontal::Left, Vertical::Top);

    /// Create an anchor from one edge per axis.
    pub const fn new(horizontal: Horizontal, vertical: Vertical) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Decode the persisted bit representation.
    ///
    /// # Errors
    /// Returns [`ViewportError::InvalidAnchor`] unless exactly one horizontal and
    /// exactly one vertical bit is set and no unknown bit is present.
    pub fn from_bits(bits: u32) -> Result<Self, ViewportError> {
        let known = Self::LEFT_BIT | Self::RIGHT_BIT | Self::TOP_BIT | Self::BOTTOM_BIT;
        if bits & !known != 0 {
            return Err(ViewportError::InvalidAnchor(bits));
        }

        let horizontal = match (bits & Self::LEFT_BIT != 0, bits & Self::RIGHT_BIT != 0) {
            (true, false) => Horizontal::Left,
            (false, true) => Horizontal::Right,
            _ => return Err(ViewportError::InvalidAnchor(bits)),
        };
        let vertical = match (bits & Self::TOP_BIT != 0, bits & Self::BOTTOM_BIT != 0) {
            (true, false) => Vertical::Top,
            (false, true) => Vertical::Bottom,
            _ => return Err(ViewportError::InvalidAnchor(bits)),
        };

        Ok(Self::new(horizontal, vertical))
    }

    /// Encode into the persisted bit representation.
    pub fn to_bits(self) -> u32 {
        let h = match self.horizontal {
            Horizontal::Left => Self::LEFT_BIT,
            Horizontal::Right => Self::RIGHT_BIT,
        };
        let v = match self.vertical {
            Vertical::Top => Self::TOP_BIT,
            Vertical::Bottom => Self::BOTTOM_BIT,
        };
        h | v
    }

    /// Same vertical edge, opposite horizontal edge.
    pub fn flipped_horizontally(self) -> Self {
        Self::new(self.horizontal.flipped(), self.vertical)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = match self.horizontal {
            Horizontal::Left => "LEFT",
            Horizontal::Right => "RIGHT",
        };
        let v = match self.vertical {
            Vertical::Top => "TOP",
            Vertical::Bottom => "BOTTOM",
        };
        write!(f, "{h}-{v}")
    }
}

// =============================================================================
// Viewport Mode
// =============================================================================

/// A requested or active viewport transform: offsets, scale and anchor.
///
/// Modes are plain values. The controller copies them for the endpoints of a
/// transition, so a mode handed to it is never observed changing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMode {
    x_offset: i32,
    y_offset: i32,
    scale: f32,
    anchor: Anchor,
}

impl ViewportMode {
    /// The single identity mode: no offset, scale 1, anchored top-left.
    pub const OFF: Self = Self {
        x_offset: 0,
        y_offset: 0,
        scale: 1.0,
        anchor: Anchor::TOP_LEFT,
    };

    /// Create a new mode.
    ///
    /// # Errors
    /// Returns [`ViewportError::InvalidScale`] if `scale` is not finite or not > 0.
    pub fn new(x_offset: i32, y_offset: i32, scale: f32, anchor: Anchor) -> Result<Self, ViewportError> {
        ensure_scale_valid(scale)?;
        Ok(Self {
            x_offset,
            y_offset,
            scale,
            anchor,
        })
    }

    /// Horizontal offset applied after anchor placement.
    pub fn x_offset(&self) -> i32 {
        self.x_offset
    }

    /// Vertical offset applied after anchor placement.
    pub fn y_offset(&self) -> i32 {
        self.y_offset
    }

    /// Scale factor, always > 0.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Corner the shrunk viewport docks to.
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Whether this is the canonical identity mode.
    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }

    /// Copy with a different vertical offset.
    pub fn with_y_offset(self, y_offset: i32) -> Self {
        Self { y_offset, ..self }
    }

    /// Copy with a different horizontal offset.
    pub fn with_x_offset(self, x_offset: i32) -> Self {
        Self { x_offset, ..self }
    }

    /// Copy with a different anchor.
    pub fn with_anchor(self, anchor: Anchor) -> Self {
        Self { anchor, ..self }
    }

    /// Copy with a different scale.
    ///
    /// # Errors
    /// Returns [`ViewportError::InvalidScale`] if `scale` is not finite or not > 0.
    pub fn with_scale(self, scale: f32) -> Result<Self, ViewportError> {
        ensure_scale_valid(scale)?;
        Ok(Self { scale, ..self })
    }
}

impl Default for ViewportMode {
    fn default() -> Self {
        Self::OFF
    }
}

impl fmt::Display for ViewportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ViewportMode: ({},{}), {}, {}",
            self.x_offset, self.y_offset, self.scale, self.anchor
        )
    }
}

fn ensure_scale_valid(scale: f32) -> Result<(), ViewportError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ViewportError::InvalidScale(scale));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_mode_is_unique_identity() {
        assert!(ViewportMode::OFF.is_off());
        assert!(ViewportMode::default().is_off());

        let bottom_left = Anchor::new(Horizontal::Left, Vertical::Bottom);
        let mode = ViewportMode::new(0, 0, 1.0, bottom_left).unwrap();
        assert!(!mode.is_off());

        let shrunk = ViewportMode::new(0, 0, 0.75, Anchor::TOP_LEFT).unwrap();
        assert!(!shrunk.is_off());
    }

    #[test]
    fn rejects_non_positive_scale() {
        assert!(matches!(
            ViewportMode::new(0, 0, 0.0, Anchor::TOP_LEFT),
            Err(ViewportError::InvalidScale(_))
        ));
        assert!(ViewportMode::new(0, 0, -0.5, Anchor::TOP_LEFT).is_err());
        assert!(ViewportMode::new(0, 0, f32::NAN, Anchor::TOP_LEFT).is_err());
        assert!(ViewportMode::OFF.with_scale(0.0).is_err());
    }

    #[test]
    fn anchor_bits_require_one_edge_per_axis() {
        let anchor = Anchor::new(Horizontal::Right, Vertical::Bottom);
        assert_eq!(Anchor::from_bits(anchor.to_bits()).unwrap(), anchor);

        assert!(Anchor::from_bits(Anchor::LEFT_BIT).is_err());
        assert!(Anchor::from_bits(Anchor::LEFT_BIT | Anchor::RIGHT_BIT | Anchor::TOP_BIT).is_err());
        assert!(Anchor::from_bits(Anchor::TOP_BIT | Anchor::BOTTOM_BIT | Anchor::LEFT_BIT).is_err());
        assert!(Anchor::from_bits(0x100 | Anchor::LEFT_BIT | Anchor::TOP_BIT).is_err());
        assert!(Anchor::from_bits(0).is_err());
    }

    #[test]
    fn flip_keeps_vertical_edge() {
        let anchor = Anchor::new(Horizontal::Left, Vertical::Bottom);
        let flipped = anchor.flipped_horizontally();
        assert_eq!(flipped.horizontal, Horizontal::Right);
        assert_eq!(flipped.vertical, Vertical::Bottom);
        assert_eq!(flipped.flipped_horizontally(), anchor);
    }

    #[test]
    fn with_helpers_change_one_field() {
        let mode = ViewportMode::new(0, 400, 0.75, Anchor::TOP_LEFT).unwrap();
        let moved = mode.with_x_offset(12).with_y_offset(30);
        assert_eq!((moved.x_offset(), moved.y_offset()), (12, 30));
        assert_eq!(moved.scale(), 0.75);
        assert_eq!(moved.anchor(), Anchor::TOP_LEFT);
    }

    #[test]
    fn display_names_offsets_and_corner() {
        let mode = ViewportMode::new(0, 400, 0.75, Anchor::new(Horizontal::Right, Vertical::Bottom)).unwrap();
        assert_eq!(mode.to_string(), "ViewportMode: (0,400), 0.75, RIGHT-BOTTOM");
    }
}

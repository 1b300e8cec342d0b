//! Entity view-model values: normalized motion parameters and text styling.
//!
//! A [`Layer`] is deliberately resolution-independent - position is a fraction
//! of the canvas, scale is relative to the baseline fit scale - which is what
//! lets a persisted entity re-normalize when restored at a different canvas
//! size.

use crate::color::PackedColor;

/// Bounds on a layer's uniform scale, per entity kind.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleLimits {
    pub min: f32,
    pub max: f32,
    pub initial: f32,
}

impl ScaleLimits {
    /// Generic (image/sticker) entities.
    pub const GENERIC: Self = Self {
        min: 0.06,
        max: 4.0,
        initial: 0.4,
    };
    /// Text entities. Tighter, so users can't set a tiny font size and then
    /// scale it 100+ times.
    pub const TEXT: Self = Self {
        min: 0.2,
        max: 2.0,
        initial: 0.8,
    };
}

/// Normalized motion state of one entity.
///
/// All user motion (drag, pinch, rotate, flip) lands here; the entity's
/// intrinsic corner points are never touched.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    /// Rotation relative to the layer center, in degrees, kept in `0..360`.
    rotation_degrees: f32,
    scale: f32,
    /// Top-left X coordinate, as a fraction of the canvas width.
    x: f32,
    /// Top-left Y coordinate, as a fraction of the canvas height.
    y: f32,
    /// Flipped horizontally (by X coordinate)?
    flipped: bool,
    limits: ScaleLimits,
}

impl Layer {
    #[must_use]
    pub fn new(limits: ScaleLimits) -> Self {
        Self {
            rotation_degrees: 0.0,
            scale: 1.0,
            x: 0.0,
            y: 0.0,
            flipped: false,
            limits,
        }
    }

    #[must_use]
    pub fn rotation_degrees(&self) -> f32 {
        self.rotation_degrees
    }
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }
    #[must_use]
    pub fn x(&self) -> f32 {
        self.x
    }
    #[must_use]
    pub fn y(&self) -> f32 {
        self.y
    }
    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }
    /// Scale a freshly placed entity starts at.
    #[must_use]
    pub fn initial_scale(&self) -> f32 {
        self.limits.initial
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }
    /// Adjust the scale by `diff`, ignoring the change if it would leave the
    /// kind's limits.
    pub fn post_scale(&mut self, diff: f32) {
        let new = self.scale + diff;
        if (self.limits.min..=self.limits.max).contains(&new) {
            self.scale = new;
        }
    }
    pub fn post_rotate(&mut self, degrees_diff: f32) {
        self.rotation_degrees = (self.rotation_degrees + degrees_diff).rem_euclid(360.0);
    }
    pub fn post_translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(ScaleLimits::GENERIC)
    }
}

/// Text styling. `size` is a fraction of the canvas width, so the same value
/// renders proportionally on any surface.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Font {
    pub color: PackedColor,
    /// Typeface name, resolved by the host's text collaborator.
    /// `None` means the collaborator's default face.
    pub typeface: Option<String>,
    pub size: f32,
}

impl Font {
    pub const SIZE_STEP: f32 = 0.008;
    pub const INITIAL_SIZE: f32 = 0.2;
    pub const MIN_SIZE: f32 = 0.01;

    pub fn increase_size(&mut self, diff: f32) {
        self.size += diff;
    }
    /// Shrinks by `diff` unless that would go below [`Self::MIN_SIZE`].
    pub fn decrease_size(&mut self, diff: f32) {
        if self.size - diff >= Self::MIN_SIZE {
            self.size -= diff;
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Self {
            color: PackedColor::BLACK,
            typeface: None,
            size: Self::INITIAL_SIZE,
        }
    }
}

/// Identity payload of a text entity: what it says and how it's styled,
/// plus its motion state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextLayer {
    pub layer: Layer,
    pub text: String,
    pub font: Font,
}

impl TextLayer {
    #[must_use]
    pub fn new(text: impl Into<String>, font: Font) -> Self {
        Self {
            layer: Layer::new(ScaleLimits::TEXT),
            text: text.into(),
            font,
        }
    }
}

impl Default for TextLayer {
    fn default() -> Self {
        Self::new("", Font::default())
    }
}

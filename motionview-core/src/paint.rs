//! Border/outline styles: the live paint and its persistable mirror.

use crate::color::PackedColor;

/// Runtime style used to stroke an entity's selection border.
#[derive(Clone, Debug, PartialEq)]
pub struct Paint {
    pub stroke_width: f32,
    pub color: PackedColor,
    pub anti_alias: bool,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            stroke_width: 0.0,
            color: PackedColor::BLACK,
            anti_alias: false,
        }
    }
}

/// Persistable mirror of a border [`Paint`]: stroke width and color only.
/// Anti-aliasing is a rendering policy and is re-enabled on every rebuild
/// rather than persisted.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PaintRecord {
    pub stroke_size: f32,
    pub color: PackedColor,
}

impl PaintRecord {
    /// Rebuild the live paint object.
    #[must_use]
    pub fn to_paint(self) -> Paint {
        Paint {
            stroke_width: self.stroke_size,
            color: self.color,
            anti_alias: true,
        }
    }
}

impl From<&Paint> for PaintRecord {
    fn from(paint: &Paint) -> Self {
        Self {
            stroke_size: paint.stroke_width,
            color: paint.color,
        }
    }
}

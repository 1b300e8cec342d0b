//! Entities backed by a rendered text block.
//!
//! Glyph rendering and layout live outside this crate: a [`TextRasterizer`]
//! is injected at construction and invoked again on every edit. This crate
//! only carries the [`TextLayer`] value.

use std::sync::Arc;

use super::{EntityBase, MotionEntity, SerializeError, Surface};
use crate::bitmap::Bitmap;
use crate::layer::{Font, TextLayer};
use crate::paint::Paint;
use crate::snapshot::{BaseSnapshot, EntitySnapshot, TextSnapshot};

/// Text layout/glyph rendering collaborator, implemented by the host.
///
/// Contract carried over from the original layout: the returned block's width
/// matches `canvas_width` (text is laid out to fill the parent width) and its
/// height is at least [`TextEntity::MIN_BITMAP_HEIGHT`] of `canvas_height`,
/// with the glyphs vertically centered in any excess.
pub trait TextRasterizer {
    fn rasterize(&self, layer: &TextLayer, canvas_width: u32, canvas_height: u32) -> Bitmap;
}

pub struct TextEntity {
    base: EntityBase,
    text: String,
    font: Font,
    bitmap: Bitmap,
    rasterizer: Arc<dyn TextRasterizer>,
}

impl TextEntity {
    /// Fraction of the canvas height a rasterized text block should never
    /// shrink below.
    pub const MIN_BITMAP_HEIGHT: f32 = 0.13;

    #[must_use]
    pub fn new(
        text_layer: TextLayer,
        canvas_width: u32,
        canvas_height: u32,
        rasterizer: Arc<dyn TextRasterizer>,
    ) -> Self {
        let bitmap = rasterizer.rasterize(&text_layer, canvas_width.max(1), canvas_height.max(1));
        let natural = [bitmap.width() as f32, bitmap.height() as f32];
        let TextLayer { layer, text, font } = text_layer;
        Self {
            base: EntityBase::new(layer, natural, canvas_width, canvas_height),
            text,
            font,
            bitmap,
            rasterizer,
        }
    }

    /// Reassemble the identity payload (what serialize persists).
    #[must_use]
    pub fn text_layer(&self) -> TextLayer {
        TextLayer {
            layer: self.base.layer().clone(),
            text: self.text.clone(),
            font: self.font.clone(),
        }
    }
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
    #[must_use]
    pub fn font(&self) -> &Font {
        &self.font
    }
    #[must_use]
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.relayout();
    }
    pub fn set_font(&mut self, font: Font) {
        self.font = font;
        self.relayout();
    }

    /// Re-render the text block and re-anchor the geometry, preserving the
    /// absolute center the user placed the entity at.
    fn relayout(&mut self) {
        let old_center = self.base.absolute_center();

        let next = self.rasterizer.rasterize(
            &self.text_layer(),
            self.base.canvas_width(),
            self.base.canvas_height(),
        );
        // Free the previous block as soon as possible.
        self.bitmap.release();
        self.bitmap = next;

        self.base
            .reset_natural([self.bitmap.width() as f32, self.bitmap.height() as f32]);
        self.base.move_center_to(old_center);
    }
}

impl MotionEntity for TextEntity {
    fn base(&self) -> &EntityBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
    fn width(&self) -> u32 {
        self.bitmap.width()
    }
    fn height(&self) -> u32 {
        self.bitmap.height()
    }

    fn draw_content(&self, surface: &mut dyn Surface, overlay: Option<&Paint>) {
        if self.bitmap.is_released() {
            log::warn!("text entity drawn after release, skipping");
            return;
        }
        surface.draw_bitmap(&self.bitmap, self.base.transform(), overlay);
    }

    fn release(&mut self) {
        self.bitmap.release();
    }

    fn serialize(&self) -> Result<EntitySnapshot, SerializeError> {
        Ok(EntitySnapshot::Text(TextSnapshot {
            layer: self.text_layer(),
            base: BaseSnapshot::of(&self.base),
        }))
    }
}

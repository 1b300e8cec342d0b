//! Entities backed by decoded pixel content.

use super::{EntityBase, MotionEntity, SerializeError, Surface};
use crate::bitmap::{Bitmap, BitmapSource, DecodeError, ResourceBundle};
use crate::layer::Layer;
use crate::paint::Paint;
use crate::snapshot::{BaseSnapshot, EntitySnapshot, ImageSnapshot};

pub struct ImageEntity {
    base: EntityBase,
    bitmap: Bitmap,
    /// Re-decode capability. Without one the entity cannot be serialized.
    source: Option<BitmapSource>,
}

impl ImageEntity {
    /// Decode pixel content through `source` and retain the source, keeping
    /// the entity serializable.
    ///
    /// # Errors
    /// Forwarded from [`BitmapSource::decode`].
    pub fn new(
        layer: Layer,
        source: BitmapSource,
        resources: &dyn ResourceBundle,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Result<Self, DecodeError> {
        let bitmap = source.decode(resources)?;
        let mut entity = Self::from_bitmap(layer, bitmap, canvas_width, canvas_height);
        entity.source = Some(source);
        Ok(entity)
    }

    /// Adopt already-decoded pixels. No source is retained, so the entity is
    /// not serializable until [`Self::attach_source`] provides one.
    #[must_use]
    pub fn from_bitmap(layer: Layer, bitmap: Bitmap, canvas_width: u32, canvas_height: u32) -> Self {
        let natural = [bitmap.width() as f32, bitmap.height() as f32];
        Self {
            base: EntityBase::new(layer, natural, canvas_width, canvas_height),
            bitmap,
            source: None,
        }
    }

    pub fn attach_source(&mut self, source: BitmapSource) {
        self.source = Some(source);
    }
    #[must_use]
    pub fn source(&self) -> Option<&BitmapSource> {
        self.source.as_ref()
    }
    #[must_use]
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }
}

impl MotionEntity for ImageEntity {
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
            log::warn!("image entity drawn after release, skipping");
            return;
        }
        surface.draw_bitmap(&self.bitmap, self.base.transform(), overlay);
    }

    fn release(&mut self) {
        self.bitmap.release();
    }

    fn serialize(&self) -> Result<EntitySnapshot, SerializeError> {
        let source = self.source.clone().ok_or(SerializeError::MissingSource)?;
        Ok(EntitySnapshot::Image(ImageSnapshot {
            layer: self.base.layer().clone(),
            base: BaseSnapshot::of(&self.base),
            source,
        }))
    }
}

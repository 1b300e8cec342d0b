//! The editor surface: a z-ordered collection of entities with selection
//! state and the capture/restore entry points.
//!
//! Gesture *recognition* belongs to the host - this type only exposes the
//! operations the gesture layer drives (tap/double-tap/long-press selection
//! bookkeeping, translate/scale/rotate of the focused entity) and the draw
//! pass the render loop invokes.

use crate::color::PackedColor;
use crate::entity::{MotionEntity, SerializeError, Surface};
use crate::paint::Paint;
use crate::snapshot::{self, CanvasStateSnapshot, Restorer};

/// Alpha of the translucent pass the selected entity is re-drawn with.
const SELECTED_LAYER_ALPHA: f32 = 0.15;

/// Selection/gesture callbacks, fired back at the host.
pub trait MotionViewCallback {
    fn on_entity_selected(&mut self, entity: Option<&dyn MotionEntity>);
    fn on_entity_double_tap(&mut self, entity: &dyn MotionEntity);
}

pub struct MotionView {
    /// Z-order: later entities draw over earlier ones.
    entities: Vec<Box<dyn MotionEntity>>,
    selected: Option<usize>,
    canvas_width: u32,
    canvas_height: u32,
    /// Border style handed to newly positioned entities.
    border_style: Paint,
    overlay_paint: Paint,
    callback: Option<Box<dyn MotionViewCallback>>,
}

impl MotionView {
    #[must_use]
    pub fn new(canvas_width: u32, canvas_height: u32, border_style: Paint) -> Self {
        let overlay_paint = Paint {
            stroke_width: 0.0,
            color: PackedColor::WHITE.with_alpha((255.0 * SELECTED_LAYER_ALPHA) as u8),
            anti_alias: true,
        };
        Self {
            entities: Vec::new(),
            selected: None,
            canvas_width: canvas_width.max(1),
            canvas_height: canvas_height.max(1),
            border_style,
            overlay_paint,
            callback: None,
        }
    }

    pub fn set_callback(&mut self, callback: Option<Box<dyn MotionViewCallback>>) {
        self.callback = callback;
    }

    #[must_use]
    pub fn entities(&self) -> &[Box<dyn MotionEntity>] {
        &self.entities
    }
    #[must_use]
    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }
    #[must_use]
    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }
    /// Which entity (if any) currently holds focus.
    #[must_use]
    pub fn selected_entity(&self) -> Option<&dyn MotionEntity> {
        self.selected.map(|index| self.entities[index].as_ref())
    }
    #[must_use]
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Append on top of the z-order and select, without firing the callback.
    pub fn add_entity(&mut self, entity: Box<dyn MotionEntity>) {
        self.entities.push(entity);
        self.select(Some(self.entities.len() - 1), false);
    }

    /// Append, style the border, and place at the canvas center at the
    /// layer's initial scale.
    pub fn add_entity_and_position(&mut self, mut entity: Box<dyn MotionEntity>) {
        let base = entity.base_mut();
        base.set_border_paint(self.border_style.clone());
        base.move_to_canvas_center();
        let initial = base.layer().initial_scale();
        base.layer_mut().set_scale(initial);

        self.entities.push(entity);
        self.select(Some(self.entities.len() - 1), true);
    }

    fn select(&mut self, index: Option<usize>, fire_callback: bool) {
        if let Some(previous) = self.selected {
            if let Some(entity) = self.entities.get_mut(previous) {
                entity.base_mut().set_selected(false);
            }
        }
        if let Some(index) = index {
            self.entities[index].base_mut().set_selected(true);
        }
        self.selected = index;

        if fire_callback {
            let entity = index.map(|index| self.entities[index].as_ref());
            if let Some(callback) = &mut self.callback {
                callback.on_entity_selected(entity);
            }
        }
    }

    /// Select by index (out-of-range clears the selection), firing the
    /// callback.
    pub fn select_entity(&mut self, index: Option<usize>) {
        let index = index.filter(|&index| index < self.entities.len());
        self.select(index, true);
    }

    pub fn unselect_entity(&mut self) {
        if self.selected.is_some() {
            self.select(None, true);
        }
    }

    /// Topmost entity whose transformed bounds contain the point.
    #[must_use]
    pub fn find_entity_at_point(&self, point: [f32; 2]) -> Option<usize> {
        self.entities
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entity)| entity.base().point_in_layer_rect(point))
            .map(|(index, _)| index)
    }

    /// Single tap: select whatever is under the point, or clear.
    pub fn tap_at(&mut self, point: [f32; 2]) {
        let hit = self.find_entity_at_point(point);
        self.select(hit, true);
    }

    /// Double tap: notify the host about the focused entity.
    pub fn double_tap(&mut self) {
        if let Some(index) = self.selected {
            let entity = self.entities[index].as_ref();
            if let Some(callback) = &mut self.callback {
                callback.on_entity_double_tap(entity);
            }
        }
    }

    /// Long press: bring the focused entity to the front when the press is
    /// inside it.
    pub fn long_press_at(&mut self, point: [f32; 2]) {
        if let Some(index) = self.selected {
            if self.entities[index].base().point_in_layer_rect(point) {
                self.bring_selected_to_front();
            }
        }
    }

    pub fn bring_selected_to_front(&mut self) {
        if let Some(index) = self.selected {
            let entity = self.entities.remove(index);
            self.entities.push(entity);
            self.selected = Some(self.entities.len() - 1);
        }
    }

    pub fn move_selected_to_back(&mut self) {
        if let Some(index) = self.selected {
            let entity = self.entities.remove(index);
            self.entities.insert(0, entity);
            self.selected = Some(0);
        }
    }

    pub fn flip_selected(&mut self) {
        if let Some(index) = self.selected {
            self.entities[index].base_mut().layer_mut().flip();
        }
    }

    /// Translate the focused entity by a canvas-space delta, per axis only as
    /// far as keeps its center within the canvas bounds.
    pub fn translate_selected(&mut self, delta: [f32; 2]) {
        let Some(index) = self.selected else {
            return;
        };
        let (width, height) = (self.canvas_width as f32, self.canvas_height as f32);
        let base = self.entities[index].base_mut();
        let center = base.absolute_center();

        if (0.0..=width).contains(&(center[0] + delta[0])) {
            base.layer_mut().post_translate(delta[0] / width, 0.0);
        }
        if (0.0..=height).contains(&(center[1] + delta[1])) {
            base.layer_mut().post_translate(0.0, delta[1] / height);
        }
    }

    pub fn scale_selected(&mut self, scale_diff: f32) {
        if let Some(index) = self.selected {
            self.entities[index].base_mut().layer_mut().post_scale(scale_diff);
        }
    }

    pub fn rotate_selected(&mut self, degrees_diff: f32) {
        if let Some(index) = self.selected {
            self.entities[index]
                .base_mut()
                .layer_mut()
                .post_rotate(degrees_diff);
        }
    }

    /// Remove and release the focused entity, then report the cleared
    /// selection.
    pub fn delete_selected(&mut self) {
        let Some(index) = self.selected else {
            return;
        };
        let mut entity = self.entities.remove(index);
        entity.release();
        self.selected = None;
        self.select(None, true);
    }

    /// Draw every entity in z-order, then the selected one again with the
    /// translucent overlay on top.
    pub fn draw(&self, surface: &mut dyn Surface) {
        for entity in &self.entities {
            entity.draw(surface, None);
        }
        if let Some(index) = self.selected {
            self.entities[index].draw(surface, Some(&self.overlay_paint));
        }
    }

    /// Release every entity's resources without removing them.
    pub fn release(&mut self) {
        for entity in &mut self.entities {
            entity.release();
        }
    }

    /// Release and drop every entity, clearing the selection.
    pub fn clear(&mut self) {
        self.release();
        self.entities.clear();
        self.selected = None;
        self.select(None, true);
    }

    /// Capture the full editor state for the host persistence channel.
    ///
    /// # Errors
    /// Propagates the first unserializable entity; capture is atomic.
    pub fn capture_state(&self) -> Result<CanvasStateSnapshot, SerializeError> {
        snapshot::capture_state(&self.entities)
    }

    /// Replace the editor contents with entities restored at this view's
    /// current canvas size. Existing entities are released first.
    pub fn restore_state(&mut self, snapshot: &CanvasStateSnapshot, restorer: &Restorer) {
        self.release();
        self.entities = restorer.restore(snapshot, self.canvas_width, self.canvas_height);
        self.selected = None;
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::{MotionView, MotionViewCallback};
    use crate::bitmap::{Bitmap, BitmapSource, MemoryResourceBundle, ResourceId};
    use crate::entity::{ImageEntity, MotionEntity, TextEntity, TextRasterizer};
    use crate::layer::{Font, Layer, TextLayer};
    use crate::paint::Paint;
    use crate::snapshot::{EntitySnapshot, Restorer};
    use crate::transform::Matrix;

    struct FixedRasterizer;
    impl TextRasterizer for FixedRasterizer {
        fn rasterize(&self, _: &TextLayer, canvas_width: u32, canvas_height: u32) -> Bitmap {
            let height = (canvas_height as f32 * TextEntity::MIN_BITMAP_HEIGHT) as u32;
            Bitmap::from_rgba8(
                canvas_width,
                height,
                vec![0; (canvas_width * height * 4) as usize],
            )
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        image::RgbaImage::new(width, height)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn bundle() -> MemoryResourceBundle {
        let mut bundle = MemoryResourceBundle::new();
        bundle.insert(ResourceId(1), png_bytes(8, 4));
        bundle
    }

    fn view_with_two(bundle: &MemoryResourceBundle) -> MotionView {
        let mut view = MotionView::new(1080, 1920, Paint::default());
        view.add_entity_and_position(Box::new(TextEntity::new(
            TextLayer::new("Hello", Font::default()),
            1080,
            1920,
            Arc::new(FixedRasterizer),
        )));
        view.add_entity_and_position(Box::new(
            ImageEntity::new(
                Layer::default(),
                BitmapSource::Resource { id: ResourceId(1) },
                bundle,
                1080,
                1920,
            )
            .unwrap(),
        ));
        view
    }

    /// Records selection traffic for assertions.
    struct SpyCallback(Rc<RefCell<Vec<String>>>);
    impl MotionViewCallback for SpyCallback {
        fn on_entity_selected(&mut self, entity: Option<&dyn MotionEntity>) {
            self.0
                .borrow_mut()
                .push(format!("selected {}", entity.is_some()));
        }
        fn on_entity_double_tap(&mut self, _: &dyn MotionEntity) {
            self.0.borrow_mut().push("double tap".into());
        }
    }

    struct NullSurface;
    impl crate::entity::Surface for NullSurface {
        fn draw_bitmap(&mut self, _: &Bitmap, _: Matrix, _: Option<&Paint>) {}
        fn draw_lines(&mut self, _: &[[f32; 2]], _: &Paint) {}
    }

    #[test]
    fn adding_selects_last() {
        let bundle = bundle();
        let view = view_with_two(&bundle);
        assert_eq!(view.entities().len(), 2);
        assert_eq!(view.selected_index(), Some(1));
        assert!(view.entities()[1].base().is_selected());
        assert!(!view.entities()[0].base().is_selected());
    }

    #[test]
    fn positioning_centers_at_initial_scale() {
        let bundle = bundle();
        let view = view_with_two(&bundle);
        let base = view.entities()[1].base();
        assert_eq!(base.layer().scale(), base.layer().initial_scale());
        let center = base.absolute_center();
        assert!((center[0] - 540.0).abs() < 1e-2);
        assert!((center[1] - 960.0).abs() < 1e-2);
    }

    #[test]
    fn reorder_operations() {
        let bundle = bundle();
        let mut view = view_with_two(&bundle);

        // Select the text entity (index 0) and raise it.
        view.select_entity(Some(0));
        view.bring_selected_to_front();
        assert_eq!(view.selected_index(), Some(1));
        let snapshot = view.capture_state().unwrap();
        assert!(matches!(snapshot.entities[0], EntitySnapshot::Image(_)));
        assert!(matches!(snapshot.entities[1], EntitySnapshot::Text(_)));

        view.move_selected_to_back();
        assert_eq!(view.selected_index(), Some(0));
        let snapshot = view.capture_state().unwrap();
        assert!(matches!(snapshot.entities[0], EntitySnapshot::Text(_)));
    }

    #[test]
    fn tap_selection_and_callbacks() {
        let bundle = bundle();
        let mut view = view_with_two(&bundle);
        let log = Rc::new(RefCell::new(Vec::new()));
        view.set_callback(Some(Box::new(SpyCallback(Rc::clone(&log)))));

        // Both entities sit centered; a corner tap hits neither.
        view.tap_at([5.0, 5.0]);
        assert_eq!(view.selected_index(), None);

        view.tap_at([540.0, 960.0]);
        assert_eq!(view.selected_index(), Some(1));
        view.double_tap();

        let log = log.borrow();
        assert_eq!(
            log.as_slice(),
            ["selected false", "selected true", "double tap"]
        );
    }

    #[test]
    fn translate_clamps_to_canvas() {
        let bundle = bundle();
        let mut view = view_with_two(&bundle);
        let before = view.entities()[1].base().absolute_center();

        // A delta that would throw the center far off the canvas is ignored
        // on that axis.
        view.translate_selected([1e6, 10.0]);
        let after = view.entities()[1].base().absolute_center();
        assert_eq!(after[0], before[0]);
        assert!((after[1] - (before[1] + 10.0)).abs() < 1e-2);
    }

    #[test]
    fn delete_releases_and_clears_selection() {
        let bundle = bundle();
        let mut view = view_with_two(&bundle);
        view.delete_selected();
        assert_eq!(view.entities().len(), 1);
        assert_eq!(view.selected_index(), None);
        // Deleting with nothing selected is a no-op.
        view.delete_selected();
        assert_eq!(view.entities().len(), 1);
    }

    #[test]
    fn draw_covers_selection_pass() {
        let bundle = bundle();
        let view = view_with_two(&bundle);
        // Smoke: the selected entity is drawn twice, nothing panics.
        view.draw(&mut NullSurface);
    }

    #[test]
    fn full_save_restore_cycle() {
        let bundle = bundle();
        let mut view = view_with_two(&bundle);
        view.flip_selected();
        view.rotate_selected(45.0);

        let snapshot = view.capture_state().unwrap();
        let restorer = Restorer::new(Arc::new(FixedRasterizer), Arc::new(bundle));

        let mut restored_view = MotionView::new(1080, 1920, Paint::default());
        restored_view.restore_state(&snapshot, &restorer);

        assert_eq!(restored_view.entities().len(), 2);
        assert_eq!(restored_view.selected_index(), None);
        assert_eq!(
            restored_view.entities()[1].base().transform(),
            view.entities()[1].base().transform()
        );
    }
}

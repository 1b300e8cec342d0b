//! Motion entities: user-placed, transformable visual objects on the canvas.
//!
//! Geometry model: each entity fixes its intrinsic corner points once, at
//! construction, and every move/scale/rotate afterwards is expressed purely
//! as an update to its [`Layer`] - the transform is recomposed from the layer
//! on demand, never accumulated. That separation is what makes save/restore
//! at a different canvas size well-defined.

pub mod image;
pub mod text;

pub use image::ImageEntity;
pub use text::{TextEntity, TextRasterizer};

use crate::bitmap::Bitmap;
use crate::layer::Layer;
use crate::paint::Paint;
use crate::snapshot::EntitySnapshot;
use crate::transform::{self, Matrix};

/// Drawing surface collaborator, implemented by the host's render loop.
pub trait Surface {
    /// Draw `bitmap` mapped through `transform`. `overlay`, when present,
    /// modulates the draw (the selected-entity pass uses a translucent one).
    fn draw_bitmap(&mut self, bitmap: &Bitmap, transform: Matrix, overlay: Option<&Paint>);
    /// Stroke line segments given as consecutive point pairs.
    fn draw_lines(&mut self, segments: &[[f32; 2]], paint: &Paint);
}

/// Failure to produce an [`EntitySnapshot`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeError {
    /// The entity has no re-decode capability, so a snapshot of it could
    /// never be restored - it would be asked to re-materialize its content
    /// from nothing.
    #[error("entity has no bitmap source to re-materialize from")]
    MissingSource,
}

/// State shared by every entity variant: the motion layer, the canvas size it
/// was built against, the baseline fit scale, the fixed intrinsic corners,
/// and border/selection state.
pub struct EntityBase {
    layer: Layer,
    canvas_width: u32,
    canvas_height: u32,
    /// Baseline uniform scale fitting the natural size into the canvas.
    /// Set exactly once, here; immutable thereafter.
    holy_scale: f32,
    /// Intrinsic corner points, clockwise from the upper left.
    /// Never mutated by motion - all of that lives in `layer`.
    src_points: [[f32; 2]; 4],
    border_paint: Paint,
    selected: bool,
}

impl EntityBase {
    /// `natural` is the intrinsic (unscaled, unrotated) content size in
    /// pixels. A zero-sized canvas is treated as 1px.
    pub(crate) fn new(layer: Layer, natural: [f32; 2], canvas_width: u32, canvas_height: u32) -> Self {
        let canvas_width = canvas_width.max(1);
        let canvas_height = canvas_height.max(1);
        let [w, h] = natural;

        let width_aspect = canvas_width as f32 / w;
        let height_aspect = canvas_height as f32 / h;
        // Fit the smallest side.
        let holy_scale = width_aspect.min(height_aspect);

        Self {
            layer,
            canvas_width,
            canvas_height,
            holy_scale,
            src_points: [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]],
            border_paint: Paint::default(),
            selected: false,
        }
    }

    /// Re-anchor the corners after the content itself was re-rendered (text
    /// re-layout). User motion stays where it was, in `layer`.
    pub(crate) fn reset_natural(&mut self, natural: [f32; 2]) {
        let [w, h] = natural;
        self.src_points = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    #[must_use]
    pub fn layer(&self) -> &Layer {
        &self.layer
    }
    pub fn layer_mut(&mut self) -> &mut Layer {
        &mut self.layer
    }
    #[must_use]
    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }
    #[must_use]
    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }
    #[must_use]
    pub fn holy_scale(&self) -> f32 {
        self.holy_scale
    }
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }
    #[must_use]
    pub fn border_paint(&self) -> &Paint {
        &self.border_paint
    }
    pub fn set_border_paint(&mut self, paint: Paint) {
        self.border_paint = paint;
    }

    fn natural_size(&self) -> [f32; 2] {
        // The lower-right corner is the natural size.
        self.src_points[2]
    }

    /// The current transform, recomposed from the layer.
    ///
    /// S - scale, R - rotate, T - translate; applied to a point as
    /// `L = S * R * T * S_holy`, i.e. baseline fit scale first, then the
    /// layer's translation, then rotation and scale about the entity center.
    #[must_use]
    pub fn transform(&self) -> Matrix {
        let top_left = [
            self.layer.x() * self.canvas_width as f32,
            self.layer.y() * self.canvas_height as f32,
        ];
        let [nw, nh] = self.natural_size();
        let center = [
            top_left[0] + nw * self.holy_scale * 0.5,
            top_left[1] + nh * self.holy_scale * 0.5,
        ];

        let mut rotation = self.layer.rotation_degrees();
        let mut scale_x = self.layer.scale();
        let scale_y = self.layer.scale();
        if self.layer.is_flipped() {
            // Flip by X coordinate: mirror the rotation with it.
            rotation = -rotation;
            scale_x = -scale_x;
        }

        Matrix::scale_about(scale_x, scale_y, center)
            * Matrix::rotation_about(rotation, center)
            * Matrix::translation(top_left[0], top_left[1])
            * Matrix::uniform_scale(self.holy_scale)
    }

    /// Center of the entity in canvas coordinates (before rotation/scale,
    /// which both pivot on it).
    #[must_use]
    pub fn absolute_center(&self) -> [f32; 2] {
        let [nw, nh] = self.natural_size();
        [
            self.layer.x() * self.canvas_width as f32 + nw * self.holy_scale * 0.5,
            self.layer.y() * self.canvas_height as f32 + nh * self.holy_scale * 0.5,
        ]
    }

    pub fn move_center_to(&mut self, center: [f32; 2]) {
        let current = self.absolute_center();
        self.layer.post_translate(
            (center[0] - current[0]) / self.canvas_width as f32,
            (center[1] - current[1]) / self.canvas_height as f32,
        );
    }

    pub fn move_to_canvas_center(&mut self) {
        self.move_to_canvas_center_of(self.canvas_width, self.canvas_height);
    }

    fn move_to_canvas_center_of(&mut self, width: u32, height: u32) {
        self.move_center_to([width as f32 * 0.5, height as f32 * 0.5]);
    }

    /// The intrinsic corners mapped through the current transform, clockwise
    /// from the upper left.
    #[must_use]
    pub fn dst_points(&self) -> [[f32; 2]; 4] {
        self.transform().map_quad(&self.src_points)
    }

    /// Whether a canvas-space point falls inside the transformed bounds.
    /// Applies the same transform to the untouched source points and tests
    /// the two triangles of the resulting quad.
    #[must_use]
    pub fn point_in_layer_rect(&self, point: [f32; 2]) -> bool {
        let [a, b, c, d] = self.dst_points();
        transform::point_in_triangle(point, a, b, c) || transform::point_in_triangle(point, a, d, c)
    }
}

/// A user-placed, transformable visual object (image or text).
pub trait MotionEntity {
    fn base(&self) -> &EntityBase;
    fn base_mut(&mut self) -> &mut EntityBase;

    /// Intrinsic (unscaled) content width in pixels.
    fn width(&self) -> u32;
    /// Intrinsic (unscaled) content height in pixels.
    fn height(&self) -> u32;

    /// Render the intrinsic content through the current transform.
    /// Writes pixels to `surface`; mutates nothing.
    fn draw_content(&self, surface: &mut dyn Surface, overlay: Option<&Paint>);

    /// Tear down heavyweight resources. Idempotent; call before discarding
    /// the entity.
    fn release(&mut self);

    /// Produce the persistable snapshot of this entity.
    ///
    /// # Errors
    /// [`SerializeError::MissingSource`] when the entity lacks the capability
    /// to re-materialize its content.
    fn serialize(&self) -> Result<EntitySnapshot, SerializeError>;

    /// Full draw pass: content, then the selection border when selected.
    fn draw(&self, surface: &mut dyn Surface, overlay: Option<&Paint>) {
        self.draw_content(surface, overlay);

        if self.base().is_selected() {
            let [a, b, c, d] = self.base().dst_points();
            let mut border = self.base().border_paint().clone();
            if let Some(overlay) = overlay {
                // The border borrows the overlay's alpha, as in the original
                // selected-layer pass.
                border.color = border.color.with_alpha(overlay.color.alpha());
            }
            surface.draw_lines(&[a, b, b, c, c, d, d, a], &border);
        }
    }
}

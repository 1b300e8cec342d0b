pub mod bitmap;
pub mod color;
pub mod entity;
pub mod layer;
pub mod paint;
pub mod snapshot;
pub mod transform;
pub mod view;

//! Decoded pixel content and the capabilities that re-materialize it.
//!
//! Decoded pixels never cross the persistence boundary - they can be large,
//! and pixel formats aren't portable across processes. What persists is a
//! [`BitmapSource`], a small value that can be invoked again (and again) to
//! decode the same content on demand.

use std::io::{Error as IOError, ErrorKind, Result as IOResult};

/// A decoded RGBA8 pixel buffer.
///
/// This is the one heavyweight resource in the crate. [`Bitmap::release`]
/// frees the buffer eagerly and is idempotent; dropping the bitmap frees it
/// too, so no exit path leaks.
#[derive(Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Option<Vec<u8>>,
}

impl Bitmap {
    /// Wrap raw RGBA8 pixels. `pixels.len()` must equal `width * height * 4`.
    #[must_use]
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len() as u64, u64::from(width) * u64::from(height) * 4);
        Self {
            width,
            height,
            pixels: Some(pixels),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
    /// The pixel data, or `None` once released.
    #[must_use]
    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.pixels.is_none()
    }
    /// Free the pixel buffer. Safe to call any number of times.
    pub fn release(&mut self) {
        self.pixels = None;
    }
}

impl From<image::RgbaImage> for Bitmap {
    fn from(value: image::RgbaImage) -> Self {
        let (width, height) = value.dimensions();
        Self {
            width,
            height,
            pixels: Some(value.into_raw()),
        }
    }
}

/// Identifier of an entry in the host's resource bundle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ResourceId(pub u32);

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resource {}", self.0)
    }
}

/// Resolves resource identifiers to encoded image bytes. Provided by the
/// host; this core never owns the bundle.
pub trait ResourceBundle {
    /// # Errors
    /// A `NotFound`-kind error when the bundle has no such entry; any other
    /// I/O error the host's storage produces.
    fn load(&self, id: ResourceId) -> IOResult<Vec<u8>>;
}

/// An in-memory [`ResourceBundle`], for hosts that embed their assets (and
/// for tests).
#[derive(Default, Clone, Debug)]
pub struct MemoryResourceBundle {
    entries: hashbrown::HashMap<ResourceId, Vec<u8>>,
}

impl MemoryResourceBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, id: ResourceId, bytes: Vec<u8>) {
        self.entries.insert(id, bytes);
    }
}

impl ResourceBundle for MemoryResourceBundle {
    fn load(&self, id: ResourceId) -> IOResult<Vec<u8>> {
        self.entries
            .get(&id)
            .cloned()
            .ok_or_else(|| IOError::new(ErrorKind::NotFound, format!("{id} not in bundle")))
    }
}

/// A bundle containing nothing, for hosts that only use file-backed sources.
#[derive(Default, Clone, Copy, Debug)]
pub struct NoResources;

impl ResourceBundle for NoResources {
    fn load(&self, id: ResourceId) -> IOResult<Vec<u8>> {
        Err(IOError::new(
            ErrorKind::NotFound,
            format!("{id} requested but host provides no bundle"),
        ))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] IOError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// A capability that materializes pixel content on demand.
///
/// Stays valid and re-invocable after deserialization: the variant and its
/// path/id round-trip exactly, the decoded pixels never do.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BitmapSource {
    /// Decode from an image file on disk.
    File { path: std::path::PathBuf },
    /// Decode from an entry in the host's resource bundle.
    Resource { id: ResourceId },
}

impl BitmapSource {
    /// Decode the pixel content. Blocking; expensive for large images.
    ///
    /// # Errors
    /// I/O failure reaching the file or bundle entry, or a malformed image.
    pub fn decode(&self, resources: &dyn ResourceBundle) -> Result<Bitmap, DecodeError> {
        let decoded = match self {
            Self::File { path } => image::open(path)?,
            Self::Resource { id } => {
                let bytes = resources.load(*id)?;
                image::load_from_memory(&bytes)?
            }
        };
        Ok(decoded.to_rgba8().into())
    }
}

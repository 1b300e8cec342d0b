/// A packed 8-bit-per-channel RGBA color, layout `0xRRGGBBAA`.
///
/// This is the form that crosses the persistence boundary; conversion into
/// whatever representation the render backend prefers is the host's business.
#[repr(transparent)]
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    bytemuck::Pod,
    bytemuck::Zeroable,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub const TRANSPARENT: Self = Self(0);
    pub const BLACK: Self = Self(0x0000_00FF);
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    #[must_use]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, a]))
    }
    #[must_use]
    pub const fn red(self) -> u8 {
        (self.0 >> 24) as u8
    }
    #[must_use]
    pub const fn green(self) -> u8 {
        (self.0 >> 16) as u8
    }
    #[must_use]
    pub const fn blue(self) -> u8 {
        (self.0 >> 8) as u8
    }
    #[must_use]
    pub const fn alpha(self) -> u8 {
        self.0 as u8
    }
    /// The same color with the alpha channel replaced.
    #[must_use]
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self(self.0 & 0xFFFF_FF00 | alpha as u32)
    }
}

impl Default for PackedColor {
    fn default() -> Self {
        Self::BLACK
    }
}

//! Application-side image encodings.
//!
//! Every encoding decodes to, and encodes from, four 8-bit channels in
//! R, G, B, A order. The packed 32-bit encodings store one `u32` per pixel
//! in host byte order, so their byte layout differs between little- and
//! big-endian hosts.

use crate::error::{ConvertError, ConvertResult};

/// Four 8-bit channels in R, G, B, A order.
pub type Channels = [u8; 4];

pub(crate) const OPAQUE: u8 = u8::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceImageFormat {
    /// Byte-interleaved R, G, B, A.
    Rgba8,
    /// Byte-interleaved R, G, B.
    Rgb8,
    /// Byte-interleaved B, G, R.
    Bgr8,
    /// Byte-interleaved B, G, R, A; the common 32-bit upload layout.
    Bgra8,
    /// Byte-interleaved A, B, G, R.
    Abgr8,
    /// Luminance byte followed by an alpha byte.
    LuminanceAlpha8,
    /// Single grayscale byte, alpha synthesized as opaque.
    Luminance8,
    /// Single byte replicated into every channel including alpha.
    Intensity8,
    /// Alpha-only byte, color channels zero.
    Alpha8,
    /// Host-endian `u32`: `a << 24 | r << 16 | g << 8 | b`.
    PackedArgb32,
    /// Host-endian `u32`: `a << 24 | b << 16 | g << 8 | r`.
    PackedAbgr32,
    /// Host-endian `u32`: `r << 24 | g << 16 | b << 8 | a`.
    PackedRgba32,
}

impl SourceImageFormat {
    pub const ALL: [Self; 12] = [
        Self::Rgba8,
        Self::Rgb8,
        Self::Bgr8,
        Self::Bgra8,
        Self::Abgr8,
        Self::LuminanceAlpha8,
        Self::Luminance8,
        Self::Intensity8,
        Self::Alpha8,
        Self::PackedArgb32,
        Self::PackedAbgr32,
        Self::PackedRgba32,
    ];

    /// Parse the raw id the texture layer stores with each image.
    pub fn from_raw(raw: u32) -> ConvertResult<Self> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(ConvertError::UnsupportedSourceFormat(raw))
    }

    pub const fn raw(self) -> u32 {
        self as u32
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rgba8 => "rgba8",
            Self::Rgb8 => "rgb8",
            Self::Bgr8 => "bgr8",
            Self::Bgra8 => "bgra8",
            Self::Abgr8 => "abgr8",
            Self::LuminanceAlpha8 => "luminance-alpha8",
            Self::Luminance8 => "luminance8",
            Self::Intensity8 => "intensity8",
            Self::Alpha8 => "alpha8",
            Self::PackedArgb32 => "packed-argb32",
            Self::PackedAbgr32 => "packed-abgr32",
            Self::PackedRgba32 => "packed-rgba32",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == normalized)
    }

    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Luminance8 | Self::Intensity8 | Self::Alpha8 => 1,
            Self::LuminanceAlpha8 => 2,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8
            | Self::Bgra8
            | Self::Abgr8
            | Self::PackedArgb32
            | Self::PackedAbgr32
            | Self::PackedRgba32 => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        !matches!(self, Self::Rgb8 | Self::Bgr8 | Self::Luminance8)
    }

    /// Decode one pixel. `px` must hold at least
    /// [`bytes_per_pixel`](Self::bytes_per_pixel) bytes.
    #[inline(always)]
    pub fn decode(self, px: &[u8]) -> Channels {
        match self {
            Self::Rgba8 => [px[0], px[1], px[2], px[3]],
            Self::Rgb8 => [px[0], px[1], px[2], OPAQUE],
            Self::Bgr8 => [px[2], px[1], px[0], OPAQUE],
            Self::Bgra8 => [px[2], px[1], px[0], px[3]],
            Self::Abgr8 => [px[3], px[2], px[1], px[0]],
            Self::LuminanceAlpha8 => [px[0], px[0], px[0], px[1]],
            Self::Luminance8 => [px[0], px[0], px[0], OPAQUE],
            Self::Intensity8 => [px[0]; 4],
            Self::Alpha8 => [0, 0, 0, px[0]],
            Self::PackedArgb32 => {
                let [b, g, r, a] = read_packed(px).to_le_bytes();
                [r, g, b, a]
            }
            Self::PackedAbgr32 => {
                let [r, g, b, a] = read_packed(px).to_le_bytes();
                [r, g, b, a]
            }
            Self::PackedRgba32 => read_packed(px).to_be_bytes(),
        }
    }

    /// Encode one pixel into `px`, the inverse of [`decode`](Self::decode).
    ///
    /// Single-channel gray encodings take a weighted luminance of the color
    /// channels, which is exact for gray input.
    #[inline(always)]
    pub fn encode(self, channels: Channels, px: &mut [u8]) {
        let [r, g, b, a] = channels;
        match self {
            Self::Rgba8 => px[..4].copy_from_slice(&[r, g, b, a]),
            Self::Rgb8 => px[..3].copy_from_slice(&[r, g, b]),
            Self::Bgr8 => px[..3].copy_from_slice(&[b, g, r]),
            Self::Bgra8 => px[..4].copy_from_slice(&[b, g, r, a]),
            Self::Abgr8 => px[..4].copy_from_slice(&[a, b, g, r]),
            Self::LuminanceAlpha8 => px[..2].copy_from_slice(&[luminance(r, g, b), a]),
            Self::Luminance8 => px[0] = luminance(r, g, b),
            Self::Intensity8 => px[0] = luminance(r, g, b),
            Self::Alpha8 => px[0] = a,
            Self::PackedArgb32 => write_packed(px, u32::from_le_bytes([b, g, r, a])),
            Self::PackedAbgr32 => write_packed(px, u32::from_le_bytes([r, g, b, a])),
            Self::PackedRgba32 => write_packed(px, u32::from_be_bytes([r, g, b, a])),
        }
    }
}

impl std::fmt::Display for SourceImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[inline(always)]
fn read_packed(px: &[u8]) -> u32 {
    u32::from_ne_bytes([px[0], px[1], px[2], px[3]])
}

#[inline(always)]
fn write_packed(px: &mut [u8], value: u32) {
    px[..4].copy_from_slice(&value.to_ne_bytes());
}

#[inline(always)]
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32) >> 8) as u8
}

//! Destination surface layouts.
//!
//! A destination surface is described by nothing but a handful of masks and
//! a total width: [`PixelFormatDescriptor`] for color surfaces and
//! [`DepthFormatDescriptor`] for depth/stencil surfaces. The device layer
//! reports an opaque [`NativeFormat`] id which [`color_descriptor_for`] and
//! [`depth_descriptor_for`] resolve through constant tables.

mod table;

use std::fmt;

use crate::bits::{first_bit, popcount};
use crate::error::{ConvertError, ConvertResult};

pub use table::{color_descriptor_for, depth_descriptor_for};

/// Opaque native surface format id as reported by the device layer.
///
/// The numeric values follow the Direct3D 9 `D3DFMT_*` enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativeFormat(pub u32);

impl NativeFormat {
    pub const R8G8B8: Self = Self(20);
    pub const A8R8G8B8: Self = Self(21);
    pub const X8R8G8B8: Self = Self(22);
    pub const R5G6B5: Self = Self(23);
    pub const X1R5G5B5: Self = Self(24);
    pub const A1R5G5B5: Self = Self(25);
    pub const A4R4G4B4: Self = Self(26);
    pub const R3G3B2: Self = Self(27);
    pub const A8: Self = Self(28);
    pub const A8R3G3B2: Self = Self(29);
    pub const X4R4G4B4: Self = Self(30);
    pub const A2B10G10R10: Self = Self(31);
    pub const A8B8G8R8: Self = Self(32);
    pub const X8B8G8R8: Self = Self(33);
    pub const A2R10G10B10: Self = Self(35);
    pub const L8: Self = Self(50);
    pub const A8L8: Self = Self(51);
    pub const A4L4: Self = Self(52);

    pub const D16_LOCKABLE: Self = Self(70);
    pub const D32: Self = Self(71);
    pub const D15S1: Self = Self(73);
    pub const D24S8: Self = Self(75);
    pub const D24X8: Self = Self(77);
    pub const D24X4S4: Self = Self(79);
    pub const D16: Self = Self(80);

    pub const L16: Self = Self(81);

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_depth(self) -> bool {
        matches!(self.0, 70 | 71 | 73 | 75 | 77 | 79 | 80)
    }

    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            20 => "R8G8B8",
            21 => "A8R8G8B8",
            22 => "X8R8G8B8",
            23 => "R5G6B5",
            24 => "X1R5G5B5",
            25 => "A1R5G5B5",
            26 => "A4R4G4B4",
            27 => "R3G3B2",
            28 => "A8",
            29 => "A8R3G3B2",
            30 => "X4R4G4B4",
            31 => "A2B10G10R10",
            32 => "A8B8G8R8",
            33 => "X8B8G8R8",
            35 => "A2R10G10B10",
            50 => "L8",
            51 => "A8L8",
            52 => "A4L4",
            70 => "D16_LOCKABLE",
            71 => "D32",
            73 => "D15S1",
            75 => "D24S8",
            77 => "D24X8",
            79 => "D24X4S4",
            80 => "D16",
            81 => "L16",
            _ => return None,
        })
    }
}

impl fmt::Display for NativeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "#{}", self.0),
        }
    }
}

/// Packed color layout: total width plus one mask per channel.
///
/// Luminance layouts alias the same mask into red, green and blue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormatDescriptor {
    pub bits_per_pixel: u32,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub alpha_mask: u32,
    pub has_alpha: bool,
}

impl PixelFormatDescriptor {
    /// Best-effort descriptor handed out for unknown format ids.
    pub const ZEROED: Self = Self::new(8, 0, 0, 0, 0);

    pub const fn new(
        bits_per_pixel: u32,
        red_mask: u32,
        green_mask: u32,
        blue_mask: u32,
        alpha_mask: u32,
    ) -> Self {
        Self {
            bits_per_pixel,
            red_mask,
            green_mask,
            blue_mask,
            alpha_mask,
            has_alpha: alpha_mask != 0,
        }
    }

    /// Bytes each packed pixel occupies, `ceil(bits_per_pixel / 8)`.
    #[inline]
    pub const fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel.div_ceil(8) as usize
    }

    /// Channel masks in R, G, B, A order.
    #[inline]
    pub const fn masks(&self) -> [u32; 4] {
        [self.red_mask, self.green_mask, self.blue_mask, self.alpha_mask]
    }

    pub fn is_zeroed(&self) -> bool {
        self.masks() == [0; 4]
    }

    pub(crate) fn ensure_supported(&self) -> ConvertResult<()> {
        if self.bits_per_pixel > 32 {
            return Err(ConvertError::UnsupportedDestinationBitWidth(
                self.bits_per_pixel,
            ));
        }
        if self.bits_per_pixel == 0 {
            return Err(ConvertError::InvalidLayout(
                "destination descriptor has zero bits per pixel".into(),
            ));
        }
        Ok(())
    }
}

/// Packed depth/stencil layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DepthFormatDescriptor {
    /// Width of the whole packed value, 16 or 32.
    pub container_bits: u32,
    pub z_bits: u32,
    pub z_mask: u32,
    pub stencil_bits: u32,
    pub stencil_mask: u32,
}

impl DepthFormatDescriptor {
    pub const fn new(container_bits: u32, z_mask: u32, stencil_mask: u32) -> Self {
        Self {
            container_bits,
            z_bits: popcount(z_mask),
            z_mask,
            stencil_bits: popcount(stencil_mask),
            stencil_mask,
        }
    }

    #[inline]
    pub const fn bytes_per_pixel(&self) -> usize {
        self.container_bits.div_ceil(8) as usize
    }

    #[inline]
    pub const fn z_shift(&self) -> u32 {
        first_bit(self.z_mask)
    }

    #[inline]
    pub const fn stencil_shift(&self) -> u32 {
        first_bit(self.stencil_mask)
    }

    pub(crate) fn ensure_supported(&self) -> ConvertResult<()> {
        if self.container_bits > 32 {
            return Err(ConvertError::UnsupportedDestinationBitWidth(
                self.container_bits,
            ));
        }
        if self.z_mask == 0 || self.z_bits + self.stencil_bits > self.container_bits {
            return Err(ConvertError::InvalidLayout(format!(
                "depth layout z={} stencil={} does not fit a {}-bit container",
                self.z_bits, self.stencil_bits, self.container_bits
            )));
        }
        Ok(())
    }
}

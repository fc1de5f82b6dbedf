use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use super::{DepthFormatDescriptor, NativeFormat, PixelFormatDescriptor};
use crate::error::{ConvertError, ConvertResult};

const COLOR_FORMATS: &[(NativeFormat, PixelFormatDescriptor)] = &[
    (
        NativeFormat::R8G8B8,
        PixelFormatDescriptor::new(24, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0),
    ),
    (
        NativeFormat::A8R8G8B8,
        PixelFormatDescriptor::new(32, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000),
    ),
    (
        NativeFormat::X8R8G8B8,
        PixelFormatDescriptor::new(32, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0),
    ),
    (
        NativeFormat::R5G6B5,
        PixelFormatDescriptor::new(16, 0xf800, 0x07e0, 0x001f, 0),
    ),
    (
        NativeFormat::X1R5G5B5,
        PixelFormatDescriptor::new(16, 0x7c00, 0x03e0, 0x001f, 0),
    ),
    (
        NativeFormat::A1R5G5B5,
        PixelFormatDescriptor::new(16, 0x7c00, 0x03e0, 0x001f, 0x8000),
    ),
    (
        NativeFormat::A4R4G4B4,
        PixelFormatDescriptor::new(16, 0x0f00, 0x00f0, 0x000f, 0xf000),
    ),
    (
        NativeFormat::X4R4G4B4,
        PixelFormatDescriptor::new(16, 0x0f00, 0x00f0, 0x000f, 0),
    ),
    (
        NativeFormat::R3G3B2,
        PixelFormatDescriptor::new(8, 0xe0, 0x1c, 0x03, 0),
    ),
    (
        NativeFormat::A8R3G3B2,
        PixelFormatDescriptor::new(16, 0x00e0, 0x001c, 0x0003, 0xff00),
    ),
    (NativeFormat::A8, PixelFormatDescriptor::new(8, 0, 0, 0, 0xff)),
    (
        NativeFormat::A2B10G10R10,
        PixelFormatDescriptor::new(32, 0x0000_03ff, 0x000f_fc00, 0x3ff0_0000, 0xc000_0000),
    ),
    (
        NativeFormat::A2R10G10B10,
        PixelFormatDescriptor::new(32, 0x3ff0_0000, 0x000f_fc00, 0x0000_03ff, 0xc000_0000),
    ),
    (
        NativeFormat::A8B8G8R8,
        PixelFormatDescriptor::new(32, 0x0000_00ff, 0x0000_ff00, 0x00ff_0000, 0xff00_0000),
    ),
    (
        NativeFormat::X8B8G8R8,
        PixelFormatDescriptor::new(32, 0x0000_00ff, 0x0000_ff00, 0x00ff_0000, 0),
    ),
    (NativeFormat::L8, PixelFormatDescriptor::new(8, 0xff, 0xff, 0xff, 0)),
    (
        NativeFormat::A8L8,
        PixelFormatDescriptor::new(16, 0x00ff, 0x00ff, 0x00ff, 0xff00),
    ),
    (
        NativeFormat::A4L4,
        PixelFormatDescriptor::new(8, 0x0f, 0x0f, 0x0f, 0xf0),
    ),
    (
        NativeFormat::L16,
        PixelFormatDescriptor::new(16, 0xffff, 0xffff, 0xffff, 0),
    ),
];

const DEPTH_FORMATS: &[(NativeFormat, DepthFormatDescriptor)] = &[
    (NativeFormat::D16, DepthFormatDescriptor::new(16, 0xffff, 0)),
    (
        NativeFormat::D16_LOCKABLE,
        DepthFormatDescriptor::new(16, 0xffff, 0),
    ),
    (NativeFormat::D15S1, DepthFormatDescriptor::new(16, 0xfffe, 0x0001)),
    (
        NativeFormat::D24S8,
        DepthFormatDescriptor::new(32, 0xffff_ff00, 0x0000_00ff),
    ),
    (
        NativeFormat::D24X8,
        DepthFormatDescriptor::new(32, 0xffff_ff00, 0),
    ),
    (
        NativeFormat::D24X4S4,
        DepthFormatDescriptor::new(32, 0xffff_ff00, 0x0000_000f),
    ),
    (NativeFormat::D32, DepthFormatDescriptor::new(32, 0xffff_ffff, 0)),
];

fn color_table() -> &'static FxHashMap<NativeFormat, PixelFormatDescriptor> {
    static TABLE: OnceLock<FxHashMap<NativeFormat, PixelFormatDescriptor>> = OnceLock::new();
    TABLE.get_or_init(|| COLOR_FORMATS.iter().copied().collect())
}

fn depth_table() -> &'static FxHashMap<NativeFormat, DepthFormatDescriptor> {
    static TABLE: OnceLock<FxHashMap<NativeFormat, DepthFormatDescriptor>> = OnceLock::new();
    TABLE.get_or_init(|| DEPTH_FORMATS.iter().copied().collect())
}

/// Resolve a color surface format.
///
/// Unknown ids resolve to [`PixelFormatDescriptor::ZEROED`] so the caller's
/// larger operation can carry on; a warning is logged.
pub fn color_descriptor_for(format: NativeFormat) -> PixelFormatDescriptor {
    match color_table().get(&format) {
        Some(descriptor) => *descriptor,
        None => {
            log::warn!("unknown color surface format {format}; using a zeroed 8-bit layout");
            PixelFormatDescriptor::ZEROED
        }
    }
}

/// Resolve a depth/stencil surface format.
///
/// There is no usable fallback for a depth layout, so unknown ids are an
/// error the caller should treat as fatal for that surface.
pub fn depth_descriptor_for(format: NativeFormat) -> ConvertResult<DepthFormatDescriptor> {
    depth_table().get(&format).copied().ok_or_else(|| {
        log::warn!("unknown depth surface format {format}");
        ConvertError::UnknownFormatId(format)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::popcount;

    #[test]
    fn color_masks_fit_their_container() {
        for (format, descriptor) in COLOR_FORMATS {
            let container = if descriptor.bits_per_pixel == 32 {
                u32::MAX
            } else {
                (1u32 << descriptor.bits_per_pixel) - 1
            };
            for mask in descriptor.masks() {
                assert_eq!(mask & !container, 0, "{format} mask {mask:#x} overflows");
            }
        }
    }

    #[test]
    fn color_masks_do_not_overlap_except_luminance() {
        for (format, descriptor) in COLOR_FORMATS {
            let [r, g, b, a] = descriptor.masks();
            let luminance = r == g && g == b;
            if !luminance {
                assert_eq!(r & g, 0, "{format}");
                assert_eq!(g & b, 0, "{format}");
                assert_eq!(r & b, 0, "{format}");
            }
            assert_eq!((r | g | b) & a, 0, "{format}");
        }
    }

    #[test]
    fn depth_layouts_fit_their_container() {
        for (format, descriptor) in DEPTH_FORMATS {
            assert!(
                descriptor.z_bits + descriptor.stencil_bits <= descriptor.container_bits,
                "{format}"
            );
            assert_eq!(descriptor.z_mask & descriptor.stencil_mask, 0, "{format}");
            assert!(format.is_depth());
        }
    }

    #[test]
    fn resolves_known_color_formats() {
        let rgb565 = color_descriptor_for(NativeFormat::R5G6B5);
        assert_eq!(rgb565.bits_per_pixel, 16);
        assert_eq!(popcount(rgb565.green_mask), 6);
        assert!(!rgb565.has_alpha);

        let argb = color_descriptor_for(NativeFormat::A8R8G8B8);
        assert_eq!(argb.alpha_mask, 0xff00_0000);
        assert!(argb.has_alpha);
    }

    #[test]
    fn unknown_color_format_falls_back_to_zeroed() {
        let descriptor = color_descriptor_for(NativeFormat(12345));
        assert_eq!(descriptor, PixelFormatDescriptor::ZEROED);
        assert_eq!(descriptor.bits_per_pixel, 8);
        assert!(descriptor.is_zeroed());
    }

    #[test]
    fn resolves_depth_formats_and_rejects_unknown() {
        let d15s1 = depth_descriptor_for(NativeFormat::D15S1).unwrap();
        assert_eq!((d15s1.z_bits, d15s1.stencil_bits), (15, 1));
        assert_eq!(d15s1.z_shift(), 1);

        let d24x4s4 = depth_descriptor_for(NativeFormat::D24X4S4).unwrap();
        assert_eq!((d24x4s4.z_bits, d24x4s4.stencil_bits), (24, 4));

        assert!(matches!(
            depth_descriptor_for(NativeFormat::A8R8G8B8),
            Err(ConvertError::UnknownFormatId(NativeFormat::A8R8G8B8))
        ));
    }
}

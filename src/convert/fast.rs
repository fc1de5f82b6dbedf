use super::addressing::Direction;
use crate::format::PixelFormatDescriptor;
use crate::source::SourceImageFormat;

const ARGB8888_ALPHA: PixelFormatDescriptor =
    PixelFormatDescriptor::new(32, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000);
const XRGB8888: PixelFormatDescriptor =
    PixelFormatDescriptor::new(32, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0);
const ARGB4444: PixelFormatDescriptor =
    PixelFormatDescriptor::new(16, 0x0f00, 0x00f0, 0x000f, 0xf000);

/// Byte-reassignment kernels for the destination layouts that dominate
/// texture uploads. Each produces exactly what the generic mask path does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FastKernel {
    /// 8-8-8(-8) source into a 32-bit `0xff0000/0xff00/0xff` surface.
    Argb8888 { keep_alpha: bool },
    /// Any source into 16-bit 4-4-4-4.
    Argb4444,
}

impl FastKernel {
    pub(crate) fn select(
        source: SourceImageFormat,
        destination: &PixelFormatDescriptor,
    ) -> Option<Self> {
        let byte_source = matches!(
            source,
            SourceImageFormat::Bgra8 | SourceImageFormat::Rgba8 | SourceImageFormat::PackedArgb32
        );
        if byte_source && *destination == ARGB8888_ALPHA {
            return Some(Self::Argb8888 { keep_alpha: true });
        }
        if byte_source && *destination == XRGB8888 {
            return Some(Self::Argb8888 { keep_alpha: false });
        }
        if *destination == ARGB4444 {
            return Some(Self::Argb4444);
        }
        None
    }

    /// Convert one row; `dst` is exactly the destination window row.
    #[inline]
    pub(crate) fn convert_row(
        self,
        source: SourceImageFormat,
        src: &[u8],
        dst: &mut [u8],
        direction: Direction,
    ) {
        match self {
            Self::Argb8888 { keep_alpha } => {
                argb8888_row(source, src, dst, direction, keep_alpha)
            }
            Self::Argb4444 => argb4444_row(source, src, dst, direction),
        }
    }
}

#[inline(always)]
pub(crate) fn swap_rgba_to_bgra(pixel: u32) -> u32 {
    ((pixel & 0x0000_00FF) << 16)
        | (pixel & 0x0000_FF00)
        | ((pixel & 0x00FF_0000) >> 16)
        | (pixel & 0xFF00_0000)
}

fn argb8888_row(
    source: SourceImageFormat,
    src: &[u8],
    dst: &mut [u8],
    direction: Direction,
    keep_alpha: bool,
) {
    let alpha_mask = if keep_alpha { 0xFF00_0000 } else { 0 };
    let columns = dst.len() / 4;

    // A little-endian ARGB surface stores B, G, R, A, which is the Bgra8
    // byte order; without mirroring the row is a straight copy.
    if source == SourceImageFormat::Bgra8 && keep_alpha && direction != Direction::MirrorX {
        dst.copy_from_slice(&src[..dst.len()]);
        return;
    }

    for (column, px) in src.chunks_exact(4).take(columns).enumerate() {
        let raw = [px[0], px[1], px[2], px[3]];
        let argb = match source {
            SourceImageFormat::Bgra8 => u32::from_le_bytes(raw),
            SourceImageFormat::Rgba8 => swap_rgba_to_bgra(u32::from_le_bytes(raw)),
            _ => u32::from_ne_bytes(raw),
        } & (0x00FF_FFFF | alpha_mask);
        let target = direction.destination_column(column, columns) * 4;
        dst[target..target + 4].copy_from_slice(&argb.to_le_bytes());
    }
}

fn argb4444_row(source: SourceImageFormat, src: &[u8], dst: &mut [u8], direction: Direction) {
    let bytes_per_pixel = source.bytes_per_pixel();
    let columns = dst.len() / 2;

    for (column, px) in src.chunks_exact(bytes_per_pixel).take(columns).enumerate() {
        let [r, g, b, a] = source.decode(px);
        let packed = ((a as u16 >> 4) << 12)
            | ((r as u16 >> 4) << 8)
            | ((g as u16 >> 4) << 4)
            | (b as u16 >> 4);
        let target = direction.destination_column(column, columns) * 2;
        dst[target..target + 2].copy_from_slice(&packed.to_le_bytes());
    }
}

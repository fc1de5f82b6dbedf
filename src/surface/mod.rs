//! Surface orchestration.
//!
//! Locks a device surface through [`LockableSurface`], places an application
//! image on it and drives the color or depth kernel once per affected slice.
//!
//! The application image shares coordinates with the surface: image pixel
//! `(x, y)` of slice `s` belongs at surface pixel `(x, y)` of slice `s`. A
//! request rectangle is clipped against both before anything is locked.
//! Cube faces are the exception: their mirror or flip applies across the
//! whole face, so image column `x` of a mirrored face lands on surface
//! column `width - 1 - x` whatever rectangle carries it.

mod memory;

use std::ops::Range;

use crate::convert::{
    self, ConversionOptions, ConversionRequest, DEPTH_SAMPLE_BYTES, DepthConversionRequest,
    DepthReadbackRequest, DepthWritePolicy, Direction, ReadbackRequest, convert_depth,
    convert_pixels, read_back_pixels,
};
use crate::error::{ConvertError, ConvertResult};
use crate::format::{NativeFormat, color_descriptor_for, depth_descriptor_for};
use crate::region::{Rect, SurfaceExtent};
use crate::source::SourceImageFormat;

pub use memory::MemorySurface;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Bytes of a locked surface, valid until the lock callback returns.
#[derive(Debug)]
pub struct LockedSurface<'a> {
    pub bytes: &'a mut [u8],
    pub row_pitch: usize,
    /// Distance between volume slices; unused for single-slice surfaces.
    pub slice_pitch: usize,
}

impl LockedSurface<'_> {
    fn slice_start(&self, slice: u32) -> ConvertResult<usize> {
        let start = (slice as usize)
            .checked_mul(self.slice_pitch)
            .ok_or_else(|| ConvertError::InvalidLayout("slice offset overflows usize".into()))?;
        if start > self.bytes.len() {
            return Err(ConvertError::buffer_too_small(
                "locked surface",
                start,
                self.bytes.len(),
            ));
        }
        Ok(start)
    }

    fn slice(&self, slice: u32) -> ConvertResult<&[u8]> {
        let start = self.slice_start(slice)?;
        Ok(&self.bytes[start..])
    }

    fn slice_mut(&mut self, slice: u32) -> ConvertResult<&mut [u8]> {
        let start = self.slice_start(slice)?;
        Ok(&mut self.bytes[start..])
    }
}

/// The device-layer seam: a surface that reports its format and size and
/// can be mapped into memory for the duration of a callback.
pub trait LockableSurface {
    fn native_format(&self) -> NativeFormat;

    fn extent(&self) -> SurfaceExtent;

    /// Lock the surface, run `f` on the mapped bytes, then unlock.
    ///
    /// Implementations must unlock whether or not `f` fails, and report lock
    /// failures as [`ConvertError::Surface`].
    fn with_locked(
        &mut self,
        access: LockAccess,
        f: &mut dyn FnMut(LockedSurface<'_>) -> ConvertResult<()>,
    ) -> ConvertResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [Self; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    /// Addressing that maps application face images onto the device's cube
    /// face orientation.
    pub const fn direction(self) -> Direction {
        match self {
            Self::PositiveY | Self::NegativeY => Direction::MirrorX,
            Self::PositiveX | Self::NegativeX | Self::PositiveZ | Self::NegativeZ => {
                Direction::FlipOriginY
            }
        }
    }
}

/// Which part of a surface an upload or read-back addresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SurfaceTarget {
    #[default]
    Plain,
    CubeFace(CubeFace),
    Volume { first_slice: u32, slice_count: u32 },
}

impl SurfaceTarget {
    pub const fn direction(self) -> Direction {
        match self {
            Self::CubeFace(face) => face.direction(),
            Self::Plain | Self::Volume { .. } => Direction::Normal,
        }
    }

    fn slices(self) -> Range<u32> {
        match self {
            Self::Plain | Self::CubeFace(_) => 0..1,
            Self::Volume {
                first_slice,
                slice_count,
            } => first_slice..first_slice.saturating_add(slice_count),
        }
    }
}

/// Geometry of an application image buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    pub width: u32,
    pub height: u32,
    pub slices: u32,
    pub row_stride: usize,
    pub slice_stride: usize,
}

impl ImageLayout {
    /// Single-slice layout with rows packed back to back.
    pub const fn packed(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        let row_stride = width as usize * bytes_per_pixel;
        Self {
            width,
            height,
            slices: 1,
            row_stride,
            slice_stride: row_stride * height as usize,
        }
    }

    pub const fn with_slices(self, slices: u32) -> Self {
        Self { slices, ..self }
    }

    /// Buffer length that holds every slice of a layout.
    pub const fn byte_len(&self) -> usize {
        self.slice_stride * self.slices as usize
    }

    fn start_of(&self, slice: u32, rect: &Rect, bytes_per_pixel: usize) -> ConvertResult<usize> {
        (slice as usize)
            .checked_mul(self.slice_stride)
            .and_then(|base| {
                (rect.y as usize)
                    .checked_mul(self.row_stride)
                    .and_then(|row| base.checked_add(row))
            })
            .and_then(|base| {
                (rect.x as usize)
                    .checked_mul(bytes_per_pixel)
                    .and_then(|column| base.checked_add(column))
            })
            .ok_or_else(|| ConvertError::InvalidLayout("image offset overflows usize".into()))
    }
}

#[derive(Debug)]
pub struct ImageUpload<'a> {
    pub pixels: &'a [u8],
    pub format: SourceImageFormat,
    pub layout: ImageLayout,
    pub rect: Rect,
    pub target: SurfaceTarget,
}

#[derive(Debug)]
pub struct ImageReadback<'a> {
    pub pixels: &'a mut [u8],
    pub format: SourceImageFormat,
    pub layout: ImageLayout,
    pub rect: Rect,
    pub target: SurfaceTarget,
}

/// Depth samples are [`DEPTH_SAMPLE_BYTES`] wide; `layout` strides count
/// bytes.
#[derive(Debug)]
pub struct DepthUpload<'a> {
    pub samples: &'a [u8],
    pub layout: ImageLayout,
    pub rect: Rect,
    pub target: SurfaceTarget,
    pub write_policy: DepthWritePolicy,
    pub normalize_float: bool,
    pub stencil_value: u32,
}

#[derive(Debug)]
pub struct DepthReadback<'a> {
    pub samples: &'a mut [u8],
    pub layout: ImageLayout,
    pub rect: Rect,
    pub target: SurfaceTarget,
    pub normalize_float: bool,
}

/// A request after clipping: where it reads from the image, where it lands
/// on the surface, the slices it spans and the addressing for the target.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Placement {
    image_rect: Rect,
    surface_rect: Rect,
    slices: Range<u32>,
    direction: Direction,
}

impl Placement {
    fn resolve(
        rect: Rect,
        target: SurfaceTarget,
        extent: SurfaceExtent,
        layout: &ImageLayout,
    ) -> Option<Self> {
        let requested = target.slices();
        let end = requested.end.min(extent.depth).min(layout.slices);
        if requested.start >= end {
            return None;
        }
        let image_rect = rect
            .clamp_to(extent.width, extent.height)?
            .clamp_to(layout.width, layout.height)?;
        let direction = target.direction();
        Some(Self {
            image_rect,
            surface_rect: reflect_across(image_rect, direction, extent),
            slices: requested.start..end,
            direction,
        })
    }

    /// Check the last slice of a plane reaches the end of the rectangle.
    /// Slices only grow toward the end of the buffer, so this covers all of
    /// them before any byte is written.
    fn ensure_fits(
        &self,
        rect: &Rect,
        what: &'static str,
        len: usize,
        bytes_per_pixel: usize,
        row_pitch: usize,
        slice_pitch: usize,
    ) -> ConvertResult<()> {
        let row_bytes = (rect.width as usize).saturating_mul(bytes_per_pixel);
        if row_pitch < row_bytes {
            return Err(ConvertError::InvalidLayout(format!(
                "{what} stride {row_pitch} is smaller than a {row_bytes}-byte row"
            )));
        }
        let last_slice = self.slices.end - 1;
        let required = (last_slice as usize)
            .checked_mul(slice_pitch)
            .and_then(|base| {
                (rect.bottom() as usize - 1)
                    .checked_mul(row_pitch)
                    .and_then(|row| base.checked_add(row))
            })
            .and_then(|base| {
                (rect.right() as usize)
                    .checked_mul(bytes_per_pixel)
                    .and_then(|column| base.checked_add(column))
            })
            .ok_or_else(|| ConvertError::InvalidLayout(format!("{what} size overflows usize")))?;
        if len < required {
            return Err(ConvertError::buffer_too_small(what, required, len));
        }
        Ok(())
    }
}

/// Mirror or flip a clipped rectangle across the whole surface, so a
/// sub-rectangle of a cube face lands where a full-face upload puts it.
fn reflect_across(rect: Rect, direction: Direction, extent: SurfaceExtent) -> Rect {
    match direction {
        Direction::Normal => rect,
        Direction::MirrorX => Rect {
            x: (i64::from(extent.width) - rect.right()) as i32,
            ..rect
        },
        Direction::FlipOriginY => Rect {
            y: (i64::from(extent.height) - rect.bottom()) as i32,
            ..rect
        },
    }
}

fn format_mismatch(message: String) -> ConvertError {
    log::warn!("{message}");
    ConvertError::FormatMismatch(message)
}

/// Copy application pixels into a color surface.
///
/// A rectangle that clips to nothing is a successful no-op and does not lock
/// the surface.
pub fn upload_image<S>(
    surface: &mut S,
    upload: ImageUpload<'_>,
    options: &ConversionOptions,
) -> ConvertResult<()>
where
    S: LockableSurface + ?Sized,
{
    let ImageUpload {
        pixels,
        format: image_format,
        layout,
        rect,
        target,
    } = upload;
    let format = surface.native_format();
    if format.is_depth() {
        return Err(format_mismatch(format!(
            "cannot upload {image_format} pixels into depth surface {format}"
        )));
    }
    let descriptor = color_descriptor_for(format);
    descriptor
        .ensure_supported()
        .inspect_err(|err| log::warn!("rejected upload into {format}: {err}"))?;

    let Some(placement) = Placement::resolve(rect, target, surface.extent(), &layout) else {
        log::debug!("upload of {rect:?} into {format} clips to nothing");
        return Ok(());
    };
    let image_bpp = image_format.bytes_per_pixel();
    placement
        .ensure_fits(
            &placement.image_rect,
            "source image",
            pixels.len(),
            image_bpp,
            layout.row_stride,
            layout.slice_stride,
        )
        .inspect_err(|err| log::warn!("rejected upload into {format}: {err}"))?;

    surface.with_locked(LockAccess::WriteOnly, &mut |mut locked| {
        let row_pitch = locked.row_pitch;
        placement.ensure_fits(
            &placement.surface_rect,
            "locked surface",
            locked.bytes.len(),
            descriptor.bytes_per_pixel(),
            row_pitch,
            locked.slice_pitch,
        )?;
        for slice in placement.slices.clone() {
            let start = layout.start_of(slice, &placement.image_rect, image_bpp)?;
            convert_pixels(
                ConversionRequest {
                    source: &pixels[start..],
                    source_stride: layout.row_stride,
                    source_format: image_format,
                    destination: locked.slice_mut(slice)?,
                    destination_stride: row_pitch,
                    destination_format: descriptor,
                    rect: placement.surface_rect,
                    direction: placement.direction,
                },
                options,
            )?;
        }
        Ok(())
    })
}

/// Copy a rectangle of a color surface back into application pixels.
pub fn read_back_image<S>(
    surface: &mut S,
    readback: ImageReadback<'_>,
    options: &ConversionOptions,
) -> ConvertResult<()>
where
    S: LockableSurface + ?Sized,
{
    let ImageReadback {
        pixels,
        format: image_format,
        layout,
        rect,
        target,
    } = readback;
    let format = surface.native_format();
    if format.is_depth() {
        return Err(format_mismatch(format!(
            "cannot read {image_format} pixels back from depth surface {format}"
        )));
    }
    let descriptor = color_descriptor_for(format);
    descriptor
        .ensure_supported()
        .inspect_err(|err| log::warn!("rejected read-back of {format}: {err}"))?;

    let Some(placement) = Placement::resolve(rect, target, surface.extent(), &layout) else {
        log::debug!("read-back of {rect:?} from {format} clips to nothing");
        return Ok(());
    };
    let image_bpp = image_format.bytes_per_pixel();
    placement
        .ensure_fits(
            &placement.image_rect,
            "read-back image",
            pixels.len(),
            image_bpp,
            layout.row_stride,
            layout.slice_stride,
        )
        .inspect_err(|err| log::warn!("rejected read-back of {format}: {err}"))?;

    surface.with_locked(LockAccess::ReadOnly, &mut |locked| {
        placement.ensure_fits(
            &placement.surface_rect,
            "locked surface",
            locked.bytes.len(),
            descriptor.bytes_per_pixel(),
            locked.row_pitch,
            locked.slice_pitch,
        )?;
        for slice in placement.slices.clone() {
            let start = layout.start_of(slice, &placement.image_rect, image_bpp)?;
            read_back_pixels(
                ReadbackRequest {
                    surface: locked.slice(slice)?,
                    surface_stride: locked.row_pitch,
                    surface_format: descriptor,
                    rect: placement.surface_rect,
                    destination: &mut pixels[start..],
                    destination_stride: layout.row_stride,
                    destination_format: image_format,
                    direction: placement.direction,
                },
                options,
            )?;
        }
        Ok(())
    })
}

/// Pack application depth samples into a depth surface.
///
/// `CompareLess` locks for reading and writing; every other upload only
/// writes.
pub fn upload_depth<S>(
    surface: &mut S,
    upload: DepthUpload<'_>,
    options: &ConversionOptions,
) -> ConvertResult<()>
where
    S: LockableSurface + ?Sized,
{
    let DepthUpload {
        samples,
        layout,
        rect,
        target,
        write_policy,
        normalize_float,
        stencil_value,
    } = upload;
    let format = surface.native_format();
    if !format.is_depth() {
        return Err(format_mismatch(format!(
            "cannot upload depth samples into color surface {format}"
        )));
    }
    let descriptor = depth_descriptor_for(format)?;
    descriptor
        .ensure_supported()
        .inspect_err(|err| log::warn!("rejected depth upload into {format}: {err}"))?;

    let Some(placement) = Placement::resolve(rect, target, surface.extent(), &layout) else {
        log::debug!("depth upload of {rect:?} into {format} clips to nothing");
        return Ok(());
    };
    placement
        .ensure_fits(
            &placement.image_rect,
            "depth source",
            samples.len(),
            DEPTH_SAMPLE_BYTES,
            layout.row_stride,
            layout.slice_stride,
        )
        .inspect_err(|err| log::warn!("rejected depth upload into {format}: {err}"))?;

    let access = match write_policy {
        DepthWritePolicy::AlwaysWrite => LockAccess::WriteOnly,
        DepthWritePolicy::CompareLess => LockAccess::ReadWrite,
    };
    surface.with_locked(access, &mut |mut locked| {
        let row_pitch = locked.row_pitch;
        placement.ensure_fits(
            &placement.surface_rect,
            "locked surface",
            locked.bytes.len(),
            descriptor.bytes_per_pixel(),
            row_pitch,
            locked.slice_pitch,
        )?;
        for slice in placement.slices.clone() {
            let start = layout.start_of(slice, &placement.image_rect, DEPTH_SAMPLE_BYTES)?;
            convert_depth(
                DepthConversionRequest {
                    source: &samples[start..],
                    source_stride: layout.row_stride,
                    destination: locked.slice_mut(slice)?,
                    destination_stride: row_pitch,
                    destination_format: descriptor,
                    rect: placement.surface_rect,
                    direction: placement.direction,
                    write_policy,
                    normalize_float,
                    stencil_value,
                },
                options,
            )?;
        }
        Ok(())
    })
}

/// Unpack the z values of a depth surface into application samples.
pub fn read_back_depth<S>(
    surface: &mut S,
    readback: DepthReadback<'_>,
    options: &ConversionOptions,
) -> ConvertResult<()>
where
    S: LockableSurface + ?Sized,
{
    let DepthReadback {
        samples,
        layout,
        rect,
        target,
        normalize_float,
    } = readback;
    let format = surface.native_format();
    if !format.is_depth() {
        return Err(format_mismatch(format!(
            "cannot read depth samples back from color surface {format}"
        )));
    }
    let descriptor = depth_descriptor_for(format)?;
    descriptor
        .ensure_supported()
        .inspect_err(|err| log::warn!("rejected depth read-back of {format}: {err}"))?;

    let Some(placement) = Placement::resolve(rect, target, surface.extent(), &layout) else {
        log::debug!("depth read-back of {rect:?} from {format} clips to nothing");
        return Ok(());
    };
    placement
        .ensure_fits(
            &placement.image_rect,
            "depth read-back",
            samples.len(),
            DEPTH_SAMPLE_BYTES,
            layout.row_stride,
            layout.slice_stride,
        )
        .inspect_err(|err| log::warn!("rejected depth read-back of {format}: {err}"))?;

    surface.with_locked(LockAccess::ReadOnly, &mut |locked| {
        placement.ensure_fits(
            &placement.surface_rect,
            "locked surface",
            locked.bytes.len(),
            descriptor.bytes_per_pixel(),
            locked.row_pitch,
            locked.slice_pitch,
        )?;
        for slice in placement.slices.clone() {
            let start = layout.start_of(slice, &placement.image_rect, DEPTH_SAMPLE_BYTES)?;
            convert::read_back_depth(
                DepthReadbackRequest {
                    surface: locked.slice(slice)?,
                    surface_stride: locked.row_pitch,
                    surface_format: descriptor,
                    rect: placement.surface_rect,
                    destination: &mut samples[start..],
                    destination_stride: layout.row_stride,
                    normalize_float,
                    direction: placement.direction,
                },
                options,
            )?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertErrorClass;

    fn serial() -> ConversionOptions {
        ConversionOptions {
            parallel: false,
            ..ConversionOptions::default()
        }
    }

    /// Luminance image whose pixel `(x, y)` of slice `s` holds
    /// `s * 100 + y * width + x + 1`.
    fn numbered_image(width: u32, height: u32, slices: u32) -> (Vec<u8>, ImageLayout) {
        let layout = ImageLayout::packed(width, height, 1).with_slices(slices);
        let pixels = (0..slices)
            .flat_map(|s| (0..width * height).map(move |i| (s * 100 + i + 1) as u8))
            .collect();
        (pixels, layout)
    }

    fn l8_surface(extent: SurfaceExtent) -> MemorySurface {
        MemorySurface::new(NativeFormat::L8, extent).unwrap()
    }

    fn upload_l8(
        surface: &mut MemorySurface,
        pixels: &[u8],
        layout: ImageLayout,
        rect: Rect,
        target: SurfaceTarget,
    ) -> ConvertResult<()> {
        upload_image(
            surface,
            ImageUpload {
                pixels,
                format: SourceImageFormat::Luminance8,
                layout,
                rect,
                target,
            },
            &serial(),
        )
    }

    struct LostDevice;

    impl LockableSurface for LostDevice {
        fn native_format(&self) -> NativeFormat {
            NativeFormat::A8R8G8B8
        }

        fn extent(&self) -> SurfaceExtent {
            SurfaceExtent::plane(4, 4)
        }

        fn with_locked(
            &mut self,
            _access: LockAccess,
            _f: &mut dyn FnMut(LockedSurface<'_>) -> ConvertResult<()>,
        ) -> ConvertResult<()> {
            Err(ConvertError::Surface(anyhow::anyhow!("device lost")))
        }
    }

    #[test]
    fn cube_faces_pick_mirror_or_flip() {
        for face in CubeFace::ALL {
            let expected = match face {
                CubeFace::PositiveY | CubeFace::NegativeY => Direction::MirrorX,
                _ => Direction::FlipOriginY,
            };
            assert_eq!(SurfaceTarget::CubeFace(face).direction(), expected, "{face:?}");
        }
        assert_eq!(SurfaceTarget::Plain.direction(), Direction::Normal);
    }

    #[test]
    fn argb_upload_reads_back_unchanged() {
        let mut surface =
            MemorySurface::new(NativeFormat::A8R8G8B8, SurfaceExtent::plane(3, 2)).unwrap();
        let layout = ImageLayout::packed(3, 2, 4);
        let pixels: Vec<u8> = (0..layout.byte_len() as u8).map(|v| v * 7).collect();

        upload_image(
            &mut surface,
            ImageUpload {
                pixels: &pixels,
                format: SourceImageFormat::Rgba8,
                layout,
                rect: Rect::full(3, 2),
                target: SurfaceTarget::Plain,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(surface.pixel(0, 0, 0), Some(0x1500_070e));

        let mut back = vec![0u8; pixels.len()];
        read_back_image(
            &mut surface,
            ImageReadback {
                pixels: &mut back,
                format: SourceImageFormat::Rgba8,
                layout,
                rect: Rect::full(3, 2),
                target: SurfaceTarget::Plain,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(back, pixels);
        assert_eq!(surface.last_access(), Some(LockAccess::ReadOnly));
        assert!(!surface.is_locked());
    }

    #[test]
    fn rect_is_clipped_to_surface_bounds() {
        let mut surface = l8_surface(SurfaceExtent::plane(4, 4));
        let (pixels, layout) = numbered_image(8, 8, 1);
        upload_l8(
            &mut surface,
            &pixels,
            layout,
            Rect::new(2, 2, 8, 8),
            SurfaceTarget::Plain,
        )
        .unwrap();

        assert_eq!(surface.pixel(1, 1, 0), Some(0));
        assert_eq!(surface.pixel(2, 2, 0), Some(2 * 8 + 2 + 1));
        assert_eq!(surface.pixel(3, 3, 0), Some(3 * 8 + 3 + 1));
        assert_eq!(surface.pixel(3, 1, 0), Some(0));
    }

    #[test]
    fn negative_origin_keeps_the_in_bounds_part() {
        let mut surface = l8_surface(SurfaceExtent::plane(4, 4));
        let (pixels, layout) = numbered_image(4, 4, 1);
        upload_l8(
            &mut surface,
            &pixels,
            layout,
            Rect::new(-2, -1, 4, 3),
            SurfaceTarget::Plain,
        )
        .unwrap();

        let expected: Vec<u8> = vec![1, 2, 0, 0, 5, 6, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(surface.bytes(), &expected[..]);
    }

    #[test]
    fn rect_is_clipped_to_image_bounds() {
        let mut surface = l8_surface(SurfaceExtent::plane(4, 4));
        let (pixels, layout) = numbered_image(2, 1, 1);
        upload_l8(
            &mut surface,
            &pixels,
            layout,
            Rect::full(4, 4),
            SurfaceTarget::Plain,
        )
        .unwrap();
        assert_eq!(&surface.bytes()[..5], &[1, 2, 0, 0, 0]);
    }

    #[test]
    fn disjoint_rect_succeeds_without_locking() {
        let mut surface = l8_surface(SurfaceExtent::plane(4, 4));
        let (pixels, layout) = numbered_image(4, 4, 1);
        upload_l8(
            &mut surface,
            &pixels,
            layout,
            Rect::new(10, 10, 2, 2),
            SurfaceTarget::Plain,
        )
        .unwrap();
        assert_eq!(surface.lock_count(), 0);
        assert!(surface.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn volume_upload_advances_by_slice_pitch() {
        let mut surface =
            MemorySurface::with_row_pitch(NativeFormat::L8, SurfaceExtent::new(2, 2, 3), 4)
                .unwrap();
        let (pixels, layout) = numbered_image(2, 2, 3);
        upload_l8(
            &mut surface,
            &pixels,
            layout,
            Rect::full(2, 2),
            SurfaceTarget::Volume {
                first_slice: 1,
                slice_count: 5,
            },
        )
        .unwrap();

        assert_eq!(surface.pixel(0, 0, 0), Some(0));
        assert_eq!(surface.pixel(0, 0, 1), Some(101));
        assert_eq!(surface.pixel(1, 1, 1), Some(104));
        assert_eq!(surface.pixel(1, 1, 2), Some(204));
        assert_eq!(surface.lock_count(), 1);
    }

    #[test]
    fn short_volume_source_writes_nothing() {
        let mut surface = l8_surface(SurfaceExtent::new(2, 2, 2));
        let (pixels, layout) = numbered_image(2, 2, 2);
        let err = upload_l8(
            &mut surface,
            &pixels[..7],
            layout,
            Rect::full(2, 2),
            SurfaceTarget::Volume {
                first_slice: 0,
                slice_count: 2,
            },
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConvertError::BufferTooSmall {
                required: 8,
                actual: 7,
                ..
            }
        ));
        assert_eq!(surface.lock_count(), 0);
        assert!(surface.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn y_faces_mirror_and_other_faces_flip() {
        let (pixels, layout) = numbered_image(2, 2, 1);

        let mut surface = l8_surface(SurfaceExtent::plane(2, 2));
        upload_l8(
            &mut surface,
            &pixels,
            layout,
            Rect::full(2, 2),
            SurfaceTarget::CubeFace(CubeFace::NegativeY),
        )
        .unwrap();
        assert_eq!(surface.bytes(), &[2, 1, 4, 3]);

        let mut surface = l8_surface(SurfaceExtent::plane(2, 2));
        upload_l8(
            &mut surface,
            &pixels,
            layout,
            Rect::full(2, 2),
            SurfaceTarget::CubeFace(CubeFace::PositiveZ),
        )
        .unwrap();
        assert_eq!(surface.bytes(), &[3, 4, 1, 2]);
    }

    #[test]
    fn depth_and_color_paths_reject_each_others_surfaces() {
        let mut depth = MemorySurface::new(NativeFormat::D16, SurfaceExtent::plane(1, 1)).unwrap();
        let err = upload_l8(
            &mut depth,
            &[1],
            ImageLayout::packed(1, 1, 1),
            Rect::full(1, 1),
            SurfaceTarget::Plain,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::FormatMismatch(_)));
        assert_eq!(depth.lock_count(), 0);

        let mut color = l8_surface(SurfaceExtent::plane(1, 1));
        let err = upload_depth(
            &mut color,
            DepthUpload {
                samples: &0u32.to_ne_bytes(),
                layout: ImageLayout::packed(1, 1, DEPTH_SAMPLE_BYTES),
                rect: Rect::full(1, 1),
                target: SurfaceTarget::Plain,
                write_policy: DepthWritePolicy::AlwaysWrite,
                normalize_float: false,
                stencil_value: 0,
            },
            &serial(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::FormatMismatch(_)));
        assert_eq!(err.class(), ConvertErrorClass::InvalidInput);
    }

    #[test]
    fn compare_less_depth_locks_read_write() {
        let mut surface =
            MemorySurface::new(NativeFormat::D24S8, SurfaceExtent::plane(2, 1)).unwrap();
        surface.bytes_mut()[..4].copy_from_slice(&(10u32 << 8).to_le_bytes());
        surface.bytes_mut()[4..].copy_from_slice(&(10u32 << 8).to_le_bytes());

        let samples: Vec<u8> = [5u32, 15].iter().flat_map(|v| v.to_ne_bytes()).collect();
        upload_depth(
            &mut surface,
            DepthUpload {
                samples: &samples,
                layout: ImageLayout::packed(2, 1, DEPTH_SAMPLE_BYTES),
                rect: Rect::full(2, 1),
                target: SurfaceTarget::Plain,
                write_policy: DepthWritePolicy::CompareLess,
                normalize_float: false,
                stencil_value: 0,
            },
            &serial(),
        )
        .unwrap();

        assert_eq!(surface.last_access(), Some(LockAccess::ReadWrite));
        assert_eq!(surface.pixel(0, 0, 0), Some(5 << 8));
        assert_eq!(surface.pixel(1, 0, 0), Some(10 << 8));

        let mut back = vec![0u8; 8];
        read_back_depth(
            &mut surface,
            DepthReadback {
                samples: &mut back,
                layout: ImageLayout::packed(2, 1, DEPTH_SAMPLE_BYTES),
                rect: Rect::full(2, 1),
                target: SurfaceTarget::Plain,
                normalize_float: false,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(back[..4], 5u32.to_ne_bytes());
        assert_eq!(back[4..], 10u32.to_ne_bytes());
    }

    #[test]
    fn lock_failures_surface_as_fatal_errors() {
        let err = upload_image(
            &mut LostDevice,
            ImageUpload {
                pixels: &[0; 64],
                format: SourceImageFormat::Bgra8,
                layout: ImageLayout::packed(4, 4, 4),
                rect: Rect::full(4, 4),
                target: SurfaceTarget::Plain,
            },
            &serial(),
        )
        .unwrap_err();
        assert_eq!(err.class(), ConvertErrorClass::Fatal);
        assert!(err.to_string().contains("device lost"));
    }

    #[test]
    fn padded_rows_keep_their_padding() {
        let mut surface =
            MemorySurface::with_row_pitch(NativeFormat::X8R8G8B8, SurfaceExtent::plane(1, 2), 8)
                .unwrap();
        surface.bytes_mut().fill(0xEE);
        let pixels = [1, 2, 3, 4, 5, 6, 7, 8];
        upload_image(
            &mut surface,
            ImageUpload {
                pixels: &pixels,
                format: SourceImageFormat::Bgra8,
                layout: ImageLayout::packed(1, 2, 4),
                rect: Rect::full(1, 2),
                target: SurfaceTarget::Plain,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(
            surface.bytes(),
            &[1, 2, 3, 0, 0xEE, 0xEE, 0xEE, 0xEE, 5, 6, 7, 0, 0xEE, 0xEE, 0xEE, 0xEE]
        );
    }

    fn depth_samples(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    #[test]
    fn cube_face_sub_rect_lands_where_the_full_face_does() {
        let (pixels, layout) = numbered_image(4, 4, 1);
        let face = SurfaceTarget::CubeFace(CubeFace::NegativeY);

        let mut surface = l8_surface(SurfaceExtent::plane(4, 4));
        upload_l8(&mut surface, &pixels, layout, Rect::full(4, 4), face).unwrap();
        let full = surface.bytes().to_vec();
        assert_eq!(&full[..8], &[4, 3, 2, 1, 8, 7, 6, 5]);

        upload_l8(&mut surface, &pixels, layout, Rect::new(0, 0, 2, 2), face).unwrap();
        assert_eq!(surface.bytes(), &full[..]);

        let mut fresh = l8_surface(SurfaceExtent::plane(4, 4));
        upload_l8(&mut fresh, &pixels, layout, Rect::new(0, 0, 2, 2), face).unwrap();
        assert_eq!(&fresh.bytes()[..8], &[0, 0, 2, 1, 0, 0, 6, 5]);
    }

    #[test]
    fn flipped_face_sub_rect_reads_back_from_the_reflected_rows() {
        let (pixels, layout) = numbered_image(2, 4, 1);
        let face = SurfaceTarget::CubeFace(CubeFace::PositiveX);

        let mut surface = l8_surface(SurfaceExtent::plane(2, 4));
        upload_l8(&mut surface, &pixels, layout, Rect::new(0, 1, 2, 1), face).unwrap();
        // image row 1 belongs on surface row 4 - 1 - 1
        assert_eq!(surface.bytes(), &[0, 0, 0, 0, 3, 4, 0, 0]);

        let mut back = vec![0u8; 8];
        read_back_image(
            &mut surface,
            ImageReadback {
                pixels: &mut back,
                format: SourceImageFormat::Luminance8,
                layout,
                rect: Rect::new(0, 1, 2, 1),
                target: face,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(back, [0, 0, 3, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn depth_volume_upload_crosses_slices() {
        let mut surface =
            MemorySurface::new(NativeFormat::D16, SurfaceExtent::new(2, 1, 3)).unwrap();
        let layout = ImageLayout::packed(2, 1, DEPTH_SAMPLE_BYTES).with_slices(3);
        let samples = depth_samples(&[1, 2, 3, 4, 5, 6]);
        let target = SurfaceTarget::Volume {
            first_slice: 1,
            slice_count: 2,
        };

        upload_depth(
            &mut surface,
            DepthUpload {
                samples: &samples,
                layout,
                rect: Rect::full(2, 1),
                target,
                write_policy: DepthWritePolicy::AlwaysWrite,
                normalize_float: false,
                stencil_value: 0,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(surface.bytes(), &[0, 0, 0, 0, 3, 0, 4, 0, 5, 0, 6, 0]);

        let mut back = vec![0u8; layout.byte_len()];
        read_back_depth(
            &mut surface,
            DepthReadback {
                samples: &mut back,
                layout,
                rect: Rect::full(2, 1),
                target,
                normalize_float: false,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(back, depth_samples(&[0, 0, 3, 4, 5, 6]));
    }

    #[test]
    fn depth_on_a_flipped_face_round_trips() {
        let mut surface = MemorySurface::new(NativeFormat::D16, SurfaceExtent::plane(2, 2)).unwrap();
        let layout = ImageLayout::packed(2, 2, DEPTH_SAMPLE_BYTES);
        let samples = depth_samples(&[1, 2, 3, 4]);
        let face = SurfaceTarget::CubeFace(CubeFace::NegativeZ);

        upload_depth(
            &mut surface,
            DepthUpload {
                samples: &samples,
                layout,
                rect: Rect::new(0, 0, 2, 1),
                target: face,
                write_policy: DepthWritePolicy::AlwaysWrite,
                normalize_float: false,
                stencil_value: 0,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(surface.bytes(), &[0, 0, 0, 0, 1, 0, 2, 0]);

        upload_depth(
            &mut surface,
            DepthUpload {
                samples: &samples,
                layout,
                rect: Rect::full(2, 2),
                target: face,
                write_policy: DepthWritePolicy::AlwaysWrite,
                normalize_float: false,
                stencil_value: 0,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(surface.bytes(), &[3, 0, 4, 0, 1, 0, 2, 0]);

        let mut back = vec![0u8; samples.len()];
        read_back_depth(
            &mut surface,
            DepthReadback {
                samples: &mut back,
                layout,
                rect: Rect::full(2, 2),
                target: face,
                normalize_float: false,
            },
            &serial(),
        )
        .unwrap();
        assert_eq!(back, samples);
    }
}

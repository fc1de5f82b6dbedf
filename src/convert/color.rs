use super::ConversionOptions;
use super::addressing::{Direction, PlaneSide, rect_windows};
use super::channel::{ChannelPlan, load_packed, store_packed};
use super::fast::FastKernel;
use super::parallel::for_each_row_mut;
use crate::error::ConvertResult;
use crate::format::PixelFormatDescriptor;
use crate::region::Rect;
use crate::source::SourceImageFormat;

/// Upload of one rectangle of application pixels into a locked color surface.
///
/// `source` starts at the pixel that lands on `rect`'s origin; `rect` is in
/// destination pixel coordinates and must already be clamped to the surface.
#[derive(Debug)]
pub struct ConversionRequest<'a> {
    pub source: &'a [u8],
    pub source_stride: usize,
    pub source_format: SourceImageFormat,
    pub destination: &'a mut [u8],
    pub destination_stride: usize,
    pub destination_format: PixelFormatDescriptor,
    pub rect: Rect,
    pub direction: Direction,
}

/// Read-back of one rectangle of a locked color surface into application
/// pixels; the mirror image of [`ConversionRequest`].
#[derive(Debug)]
pub struct ReadbackRequest<'a> {
    pub surface: &'a [u8],
    pub surface_stride: usize,
    pub surface_format: PixelFormatDescriptor,
    pub rect: Rect,
    pub destination: &'a mut [u8],
    pub destination_stride: usize,
    pub destination_format: SourceImageFormat,
    pub direction: Direction,
}

#[derive(Clone, Copy, Debug)]
enum RowKernel {
    Fast(FastKernel),
    Generic(ChannelPlan),
}

/// Convert `request.rect` pixel by pixel into the destination layout.
///
/// Nothing is written unless the whole request validates.
pub fn convert_pixels(
    request: ConversionRequest<'_>,
    options: &ConversionOptions,
) -> ConvertResult<()> {
    let ConversionRequest {
        source,
        source_stride,
        source_format,
        destination,
        destination_stride,
        destination_format,
        rect,
        direction,
    } = request;

    let (dst_window, src_window) = destination_format
        .ensure_supported()
        .and_then(|()| {
            rect_windows(
                &rect,
                PlaneSide {
                    what: "destination",
                    bytes_per_pixel: destination_format.bytes_per_pixel(),
                    stride: destination_stride,
                    len: destination.len(),
                },
                PlaneSide {
                    what: "source",
                    bytes_per_pixel: source_format.bytes_per_pixel(),
                    stride: source_stride,
                    len: source.len(),
                },
            )
        })
        .inspect_err(|err| {
            log::warn!("rejected {source_format} upload into {destination_format:?}: {err}");
        })?;
    if rect.is_empty() {
        return Ok(());
    }

    let kernel = options
        .fast_path
        .then(|| FastKernel::select(source_format, &destination_format))
        .flatten()
        .map(RowKernel::Fast)
        .unwrap_or_else(|| RowKernel::Generic(ChannelPlan::for_descriptor(&destination_format)));
    log::trace!("converting {rect:?} from {source_format} with {kernel:?} ({direction:?})");

    let rows = src_window.rows;
    let src_bpp = source_format.bytes_per_pixel();
    let dst_bpp = destination_format.bytes_per_pixel();
    let parallel = options.parallelize(rect);

    for_each_row_mut(destination, dst_window, parallel, |row, dst_row| {
        let src_row = src_window.row(source, direction.source_row(row, rows));
        match kernel {
            RowKernel::Fast(fast) => fast.convert_row(source_format, src_row, dst_row, direction),
            RowKernel::Generic(plan) => {
                pack_row(source_format, &plan, src_row, src_bpp, dst_row, dst_bpp, direction)
            }
        }
    });
    Ok(())
}

#[inline]
fn pack_row(
    format: SourceImageFormat,
    plan: &ChannelPlan,
    src: &[u8],
    src_bpp: usize,
    dst: &mut [u8],
    dst_bpp: usize,
    direction: Direction,
) {
    let columns = dst.len() / dst_bpp;
    for (column, px) in src.chunks_exact(src_bpp).enumerate() {
        let packed = plan.pack(format.decode(px));
        let target = direction.destination_column(column, columns) * dst_bpp;
        store_packed(&mut dst[target..target + dst_bpp], packed);
    }
}

/// Decode `request.rect` of a locked surface back into application pixels.
pub fn read_back_pixels(
    request: ReadbackRequest<'_>,
    options: &ConversionOptions,
) -> ConvertResult<()> {
    let ReadbackRequest {
        surface,
        surface_stride,
        surface_format,
        rect,
        destination,
        destination_stride,
        destination_format,
        direction,
    } = request;

    let (surface_window, image_window) = surface_format
        .ensure_supported()
        .and_then(|()| {
            rect_windows(
                &rect,
                PlaneSide {
                    what: "surface",
                    bytes_per_pixel: surface_format.bytes_per_pixel(),
                    stride: surface_stride,
                    len: surface.len(),
                },
                PlaneSide {
                    what: "read-back",
                    bytes_per_pixel: destination_format.bytes_per_pixel(),
                    stride: destination_stride,
                    len: destination.len(),
                },
            )
        })
        .inspect_err(|err| {
            log::warn!("rejected read-back of {surface_format:?} into {destination_format}: {err}");
        })?;
    if rect.is_empty() {
        return Ok(());
    }

    let plan = ChannelPlan::for_descriptor(&surface_format);
    let rows = image_window.rows;
    let surface_bpp = surface_format.bytes_per_pixel();
    let image_bpp = destination_format.bytes_per_pixel();
    let parallel = options.parallelize(rect);

    for_each_row_mut(destination, image_window, parallel, |row, image_row| {
        let surface_row = surface_window.row(surface, direction.source_row(row, rows));
        let columns = surface_row.len() / surface_bpp;
        for (column, px) in image_row.chunks_exact_mut(image_bpp).enumerate() {
            let source = direction.destination_column(column, columns) * surface_bpp;
            let packed = load_packed(&surface_row[source..source + surface_bpp]);
            destination_format.encode(plan.unpack(packed), px);
        }
    });
    Ok(())
}

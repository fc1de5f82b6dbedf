use super::ConversionOptions;
use super::addressing::{Direction, PlaneSide, rect_windows};
use super::channel::{load_packed, store_packed};
use super::parallel::for_each_row_mut;
use crate::bits::max_for_bits;
use crate::error::ConvertResult;
use crate::format::DepthFormatDescriptor;
use crate::region::Rect;

/// Every application depth sample is a host-endian `u32`, or an `f32` in
/// `[0, 1]` when `normalize_float` is set.
pub const DEPTH_SAMPLE_BYTES: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthWritePolicy {
    #[default]
    AlwaysWrite,
    /// Software `LESS` depth test: a sample is written only when it is
    /// strictly closer than the value already stored.
    CompareLess,
}

#[derive(Debug)]
pub struct DepthConversionRequest<'a> {
    pub source: &'a [u8],
    pub source_stride: usize,
    pub destination: &'a mut [u8],
    pub destination_stride: usize,
    pub destination_format: DepthFormatDescriptor,
    pub rect: Rect,
    pub direction: Direction,
    pub write_policy: DepthWritePolicy,
    pub normalize_float: bool,
    /// Packed into the stencil field of every written pixel.
    pub stencil_value: u32,
}

#[derive(Debug)]
pub struct DepthReadbackRequest<'a> {
    pub surface: &'a [u8],
    pub surface_stride: usize,
    pub surface_format: DepthFormatDescriptor,
    pub rect: Rect,
    pub destination: &'a mut [u8],
    pub destination_stride: usize,
    pub normalize_float: bool,
    pub direction: Direction,
}

#[derive(Clone, Copy, Debug)]
struct DepthPlan {
    z_mask: u32,
    z_shift: u32,
    z_max: u32,
    /// `2^z_bits`, the float normalization factor.
    scale: f64,
    normalize_float: bool,
    stencil: u32,
}

impl DepthPlan {
    fn new(format: &DepthFormatDescriptor, normalize_float: bool, stencil_value: u32) -> Self {
        let stencil = stencil_value
            .checked_shl(format.stencil_shift())
            .unwrap_or(0)
            & format.stencil_mask;
        Self {
            z_mask: format.z_mask,
            z_shift: format.z_shift(),
            z_max: max_for_bits(format.z_bits),
            scale: 2f64.powi(format.z_bits as i32),
            normalize_float,
            stencil,
        }
    }

    /// Sample to integer depth, clamped to what the z field can hold.
    #[inline(always)]
    fn quantize(&self, sample: [u8; DEPTH_SAMPLE_BYTES]) -> u32 {
        if self.normalize_float {
            let value = f32::from_ne_bytes(sample) as f64;
            // `as` saturates, and maps NaN to zero
            ((value * self.scale) as u64).min(self.z_max as u64) as u32
        } else {
            u32::from_ne_bytes(sample).min(self.z_max)
        }
    }

    #[inline(always)]
    fn to_sample(&self, z: u32) -> [u8; DEPTH_SAMPLE_BYTES] {
        if self.normalize_float {
            ((z as f64 / self.scale) as f32).to_ne_bytes()
        } else {
            z.to_ne_bytes()
        }
    }

    #[inline(always)]
    fn pack(&self, z: u32) -> u32 {
        ((z << self.z_shift) & self.z_mask) | self.stencil
    }

    #[inline(always)]
    fn decode(&self, packed: u32) -> u32 {
        (packed & self.z_mask) >> self.z_shift
    }
}

/// Pack `request.rect` of depth samples into a locked depth surface,
/// optionally behind the software `LESS` test.
pub fn convert_depth(
    request: DepthConversionRequest<'_>,
    options: &ConversionOptions,
) -> ConvertResult<()> {
    let DepthConversionRequest {
        source,
        source_stride,
        destination,
        destination_stride,
        destination_format,
        rect,
        direction,
        write_policy,
        normalize_float,
        stencil_value,
    } = request;

    let (dst_window, src_window) = destination_format
        .ensure_supported()
        .and_then(|()| {
            rect_windows(
                &rect,
                PlaneSide {
                    what: "depth destination",
                    bytes_per_pixel: destination_format.bytes_per_pixel(),
                    stride: destination_stride,
                    len: destination.len(),
                },
                PlaneSide {
                    what: "depth source",
                    bytes_per_pixel: DEPTH_SAMPLE_BYTES,
                    stride: source_stride,
                    len: source.len(),
                },
            )
        })
        .inspect_err(|err| {
            log::warn!("rejected depth upload into {destination_format:?}: {err}");
        })?;
    if rect.is_empty() {
        return Ok(());
    }

    let plan = DepthPlan::new(&destination_format, normalize_float, stencil_value);
    let rows = src_window.rows;
    let dst_bpp = destination_format.bytes_per_pixel();
    let parallel = options.parallelize(rect);

    for_each_row_mut(destination, dst_window, parallel, |row, dst_row| {
        let src_row = src_window.row(source, direction.source_row(row, rows));
        let columns = dst_row.len() / dst_bpp;
        for (column, sample) in src_row.chunks_exact(DEPTH_SAMPLE_BYTES).enumerate() {
            let z = plan.quantize([sample[0], sample[1], sample[2], sample[3]]);
            let target = direction.destination_column(column, columns) * dst_bpp;
            let px = &mut dst_row[target..target + dst_bpp];
            if write_policy == DepthWritePolicy::CompareLess && z >= plan.decode(load_packed(px)) {
                continue;
            }
            store_packed(px, plan.pack(z));
        }
    });
    Ok(())
}

/// Unpack `request.rect` of a locked depth surface into depth samples.
pub fn read_back_depth(
    request: DepthReadbackRequest<'_>,
    options: &ConversionOptions,
) -> ConvertResult<()> {
    let DepthReadbackRequest {
        surface,
        surface_stride,
        surface_format,
        rect,
        destination,
        destination_stride,
        normalize_float,
        direction,
    } = request;

    let (surface_window, image_window) = surface_format
        .ensure_supported()
        .and_then(|()| {
            rect_windows(
                &rect,
                PlaneSide {
                    what: "depth surface",
                    bytes_per_pixel: surface_format.bytes_per_pixel(),
                    stride: surface_stride,
                    len: surface.len(),
                },
                PlaneSide {
                    what: "depth read-back",
                    bytes_per_pixel: DEPTH_SAMPLE_BYTES,
                    stride: destination_stride,
                    len: destination.len(),
                },
            )
        })
        .inspect_err(|err| {
            log::warn!("rejected depth read-back of {surface_format:?}: {err}");
        })?;
    if rect.is_empty() {
        return Ok(());
    }

    let plan = DepthPlan::new(&surface_format, normalize_float, 0);
    let rows = image_window.rows;
    let surface_bpp = surface_format.bytes_per_pixel();
    let parallel = options.parallelize(rect);

    for_each_row_mut(destination, image_window, parallel, |row, image_row| {
        let surface_row = surface_window.row(surface, direction.source_row(row, rows));
        let columns = surface_row.len() / surface_bpp;
        for (column, sample) in image_row.chunks_exact_mut(DEPTH_SAMPLE_BYTES).enumerate() {
            let source = direction.destination_column(column, columns) * surface_bpp;
            let z = plan.decode(load_packed(&surface_row[source..source + surface_bpp]));
            sample.copy_from_slice(&plan.to_sample(z));
        }
    });
    Ok(())
}

use crate::error::{ConvertError, ConvertResult};
use crate::format::{NativeFormat, color_descriptor_for, depth_descriptor_for};
use crate::region::SurfaceExtent;

use super::{LockAccess, LockableSurface, LockedSurface};

/// A software surface backed by a `Vec<u8>`.
///
/// Rows may be padded beyond the packed width, the way device surfaces
/// usually are. Every slice holds `height` rows.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    format: NativeFormat,
    extent: SurfaceExtent,
    row_pitch: usize,
    slice_pitch: usize,
    bytes: Vec<u8>,
    lock_count: usize,
    locked: bool,
    last_access: Option<LockAccess>,
}

struct UnlockOnDrop<'a>(&'a mut bool);

impl Drop for UnlockOnDrop<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl MemorySurface {
    /// Zero-filled surface with packed rows.
    pub fn new(format: NativeFormat, extent: SurfaceExtent) -> ConvertResult<Self> {
        let bytes_per_pixel = bytes_per_pixel_for(format)?;
        let row_pitch = (extent.width as usize)
            .checked_mul(bytes_per_pixel)
            .ok_or_else(|| ConvertError::InvalidLayout("surface row overflows usize".into()))?;
        Self::with_row_pitch(format, extent, row_pitch)
    }

    /// Zero-filled surface whose rows are `row_pitch` bytes apart.
    pub fn with_row_pitch(
        format: NativeFormat,
        extent: SurfaceExtent,
        row_pitch: usize,
    ) -> ConvertResult<Self> {
        let bytes_per_pixel = bytes_per_pixel_for(format)?;
        let row_bytes = extent.width as usize * bytes_per_pixel;
        if row_pitch < row_bytes {
            return Err(ConvertError::InvalidLayout(format!(
                "row pitch {row_pitch} is smaller than a {row_bytes}-byte {format} row"
            )));
        }
        let overflow = || ConvertError::InvalidLayout("surface size overflows usize".into());
        let slice_pitch = row_pitch
            .checked_mul(extent.height as usize)
            .ok_or_else(overflow)?;
        let len = slice_pitch
            .checked_mul(extent.depth as usize)
            .ok_or_else(overflow)?;

        Ok(Self {
            format,
            extent,
            row_pitch,
            slice_pitch,
            bytes: vec![0; len],
            lock_count: 0,
            locked: false,
            last_access: None,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn row_pitch(&self) -> usize {
        self.row_pitch
    }

    pub fn slice_pitch(&self) -> usize {
        self.slice_pitch
    }

    /// Number of completed or in-flight locks.
    pub fn lock_count(&self) -> usize {
        self.lock_count
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn last_access(&self) -> Option<LockAccess> {
        self.last_access
    }

    /// Packed little-endian value of one pixel, or `None` out of bounds.
    pub fn pixel(&self, x: u32, y: u32, slice: u32) -> Option<u32> {
        if x >= self.extent.width || y >= self.extent.height || slice >= self.extent.depth {
            return None;
        }
        let bytes_per_pixel = bytes_per_pixel_for(self.format).ok()?;
        let start = slice as usize * self.slice_pitch
            + y as usize * self.row_pitch
            + x as usize * bytes_per_pixel;
        let value = self.bytes[start..start + bytes_per_pixel]
            .iter()
            .rev()
            .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte));
        Some(value)
    }
}

impl LockableSurface for MemorySurface {
    fn native_format(&self) -> NativeFormat {
        self.format
    }

    fn extent(&self) -> SurfaceExtent {
        self.extent
    }

    fn with_locked(
        &mut self,
        access: LockAccess,
        f: &mut dyn FnMut(LockedSurface<'_>) -> ConvertResult<()>,
    ) -> ConvertResult<()> {
        self.lock_count += 1;
        self.last_access = Some(access);
        log::trace!("locking {} surface for {access:?}", self.format);
        let Self {
            bytes,
            row_pitch,
            slice_pitch,
            locked,
            ..
        } = self;
        *locked = true;
        let _unlock = UnlockOnDrop(locked);

        f(LockedSurface {
            bytes: bytes.as_mut_slice(),
            row_pitch: *row_pitch,
            slice_pitch: *slice_pitch,
        })
    }
}

fn bytes_per_pixel_for(format: NativeFormat) -> ConvertResult<usize> {
    if format.is_depth() {
        return Ok(depth_descriptor_for(format)?.bytes_per_pixel());
    }
    let descriptor = color_descriptor_for(format);
    descriptor.ensure_supported()?;
    Ok(descriptor.bytes_per_pixel())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_pitch_sizes_every_slice() {
        let surface =
            MemorySurface::with_row_pitch(NativeFormat::R5G6B5, SurfaceExtent::new(3, 2, 4), 8)
                .unwrap();
        assert_eq!(surface.row_pitch(), 8);
        assert_eq!(surface.slice_pitch(), 16);
        assert_eq!(surface.bytes().len(), 64);
    }

    #[test]
    fn pitch_shorter_than_a_row_is_rejected() {
        let err =
            MemorySurface::with_row_pitch(NativeFormat::A8R8G8B8, SurfaceExtent::plane(4, 1), 15)
                .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidLayout(_)));
    }

    #[test]
    fn unknown_color_format_backs_one_byte_pixels() {
        let surface =
            MemorySurface::new(NativeFormat(0x4242), SurfaceExtent::plane(3, 2)).unwrap();
        assert_eq!(surface.row_pitch(), 3);
        assert_eq!(surface.bytes().len(), 6);
    }

    #[test]
    fn lock_is_released_when_the_callback_fails() {
        let mut surface = MemorySurface::new(NativeFormat::L8, SurfaceExtent::plane(2, 2)).unwrap();
        let result = surface.with_locked(LockAccess::WriteOnly, &mut |locked| {
            locked.bytes[0] = 9;
            Err(ConvertError::InvalidRect("stop".into()))
        });
        assert!(result.is_err());
        assert!(!surface.is_locked());
        assert_eq!(surface.lock_count(), 1);
        assert_eq!(surface.last_access(), Some(LockAccess::WriteOnly));
        assert_eq!(surface.pixel(0, 0, 0), Some(9));
    }

    #[test]
    fn pixel_reads_little_endian_values() {
        let mut surface =
            MemorySurface::new(NativeFormat::R8G8B8, SurfaceExtent::plane(2, 1)).unwrap();
        surface.bytes_mut()[3..6].copy_from_slice(&[0x33, 0x22, 0x11]);
        assert_eq!(surface.pixel(1, 0, 0), Some(0x11_2233));
        assert_eq!(surface.pixel(2, 0, 0), None);
    }
}

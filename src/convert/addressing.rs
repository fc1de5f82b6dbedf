use crate::error::{ConvertError, ConvertResult};
use crate::region::Rect;

/// Row/column addressing used when writing cube-map faces.
///
/// Only one of the two inversions ever applies to a call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Normal,
    /// Source columns run left to right while destination columns run
    /// right to left.
    MirrorX,
    /// Source rows are read bottom to top; destination row 0 receives the
    /// last source row.
    FlipOriginY,
}

impl Direction {
    /// Source row feeding destination row `row` of a `rows`-high window.
    ///
    /// The mapping is its own inverse, so read-back uses it unchanged.
    #[inline(always)]
    pub(crate) const fn source_row(self, row: usize, rows: usize) -> usize {
        match self {
            Self::FlipOriginY => rows - 1 - row,
            Self::Normal | Self::MirrorX => row,
        }
    }

    /// Destination column receiving source column `column`.
    #[inline(always)]
    pub(crate) const fn destination_column(self, column: usize, columns: usize) -> usize {
        match self {
            Self::MirrorX => columns - 1 - column,
            Self::Normal | Self::FlipOriginY => column,
        }
    }
}

/// Byte window of a rectangle inside a strided plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PlaneWindow {
    /// Byte offset of the window's first pixel.
    pub(crate) offset: usize,
    pub(crate) stride: usize,
    pub(crate) row_bytes: usize,
    pub(crate) rows: usize,
}

impl PlaneWindow {
    pub(crate) fn new(
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        stride: usize,
    ) -> ConvertResult<Self> {
        let overflow = || ConvertError::InvalidLayout("window byte size overflows usize".into());
        let row_bytes = width.checked_mul(bytes_per_pixel).ok_or_else(overflow)?;
        let offset = y
            .checked_mul(stride)
            .and_then(|base| x.checked_mul(bytes_per_pixel).and_then(|xo| base.checked_add(xo)))
            .ok_or_else(overflow)?;
        Ok(Self {
            offset,
            stride,
            row_bytes,
            rows: height,
        })
    }

    /// Smallest buffer length that contains every row of the window.
    pub(crate) fn required_len(&self) -> Option<usize> {
        if self.rows == 0 {
            return Some(0);
        }
        (self.rows - 1)
            .checked_mul(self.stride)
            .and_then(|last| last.checked_add(self.offset))
            .and_then(|last| last.checked_add(self.row_bytes))
    }

    /// Check the window fits a buffer of `len` bytes.
    pub(crate) fn validate(&self, len: usize, what: &'static str) -> ConvertResult<()> {
        if self.stride < self.row_bytes {
            return Err(ConvertError::InvalidLayout(format!(
                "{what} stride {} is smaller than a {}-byte row",
                self.stride, self.row_bytes
            )));
        }
        let required = self.required_len().ok_or_else(|| {
            ConvertError::InvalidLayout(format!("{what} window byte size overflows usize"))
        })?;
        if len < required {
            return Err(ConvertError::buffer_too_small(what, required, len));
        }
        Ok(())
    }

    /// Row `row` of a validated window.
    #[inline(always)]
    pub(crate) fn row<'a>(&self, bytes: &'a [u8], row: usize) -> &'a [u8] {
        let start = self.offset + row * self.stride;
        &bytes[start..start + self.row_bytes]
    }
}

/// One side of a conversion: a strided plane of `len` bytes.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlaneSide {
    pub(crate) what: &'static str,
    pub(crate) bytes_per_pixel: usize,
    pub(crate) stride: usize,
    pub(crate) len: usize,
}

/// Windows for `rect` on the surface side (placed at the rect origin) and
/// on the application side (starting at its first byte).
///
/// Empty rects yield empty windows without checking either buffer.
pub(crate) fn rect_windows(
    rect: &Rect,
    surface: PlaneSide,
    image: PlaneSide,
) -> ConvertResult<(PlaneWindow, PlaneWindow)> {
    let (x, y) = rect.origin()?;
    let (width, height) = (rect.width as usize, rect.height as usize);
    let surface_window =
        PlaneWindow::new(x, y, width, height, surface.bytes_per_pixel, surface.stride)?;
    let image_window = PlaneWindow::new(0, 0, width, height, image.bytes_per_pixel, image.stride)?;
    if !rect.is_empty() {
        surface_window.validate(surface.len, surface.what)?;
        image_window.validate(image.len, image.what)?;
    }
    Ok((surface_window, image_window))
}

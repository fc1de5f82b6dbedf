//! Conversion rectangles and surface bounds.
//!
//! [`Rect`] is expressed in surface pixel coordinates and may hang off any
//! edge of the surface; [`Rect::clamp_to`] trims it to the pixels that
//! actually exist before any buffer is touched.

use crate::error::{ConvertError, ConvertResult};

/// A rectangle in surface pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` plane.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Intersect with the `[0, width) x [0, height)` plane.
    ///
    /// Returns `None` when nothing of the rectangle is in bounds.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let left = (self.x as i64).max(0);
        let top = (self.y as i64).max(0);
        let right = self.right().min(width as i64);
        let bottom = self.bottom().min(height as i64);

        if left < right && top < bottom {
            Some(Self {
                x: left as i32,
                y: top as i32,
                width: (right - left) as u32,
                height: (bottom - top) as u32,
            })
        } else {
            None
        }
    }

    /// Origin as buffer indices; negative origins are rejected.
    pub(crate) fn origin(&self) -> ConvertResult<(usize, usize)> {
        let x = usize::try_from(self.x)
            .map_err(|_| ConvertError::InvalidRect(format!("negative x offset {}", self.x)))?;
        let y = usize::try_from(self.y)
            .map_err(|_| ConvertError::InvalidRect(format!("negative y offset {}", self.y)))?;
        Ok((x, y))
    }
}

/// Pixel dimensions of a surface; `depth` counts volume slices and is 1 for
/// plain surfaces and cube faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceExtent {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl SurfaceExtent {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub const fn plane(width: u32, height: u32) -> Self {
        Self::new(width, height, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_in_bounds_rect() {
        let rect = Rect::new(2, 3, 4, 5);
        assert_eq!(rect.clamp_to(16, 16), Some(rect));
    }

    #[test]
    fn clamp_trims_rect_hanging_off_the_far_edges() {
        let rect = Rect::new(6, 6, 10, 10);
        assert_eq!(rect.clamp_to(8, 7), Some(Rect::new(6, 6, 2, 1)));
    }

    #[test]
    fn clamp_trims_negative_origin() {
        let rect = Rect::new(-3, -1, 5, 4);
        assert_eq!(rect.clamp_to(8, 8), Some(Rect::new(0, 0, 2, 3)));
    }

    #[test]
    fn clamp_rejects_disjoint_and_empty_rects() {
        assert_eq!(Rect::new(8, 0, 4, 4).clamp_to(8, 8), None);
        assert_eq!(Rect::new(-4, 0, 4, 4).clamp_to(8, 8), None);
        assert_eq!(Rect::new(0, 0, 0, 4).clamp_to(8, 8), None);
    }

    #[test]
    fn clamp_handles_extreme_offsets_without_overflow() {
        let rect = Rect::new(i32::MAX - 1, 0, u32::MAX, 1);
        let clamped = rect.clamp_to(u32::MAX, 1).unwrap();
        assert_eq!(clamped.x, i32::MAX - 1);
        assert_eq!(clamped.width, 2_147_483_649);
    }

    #[test]
    fn origin_rejects_negative_offsets() {
        assert_eq!(Rect::new(1, 2, 1, 1).origin().unwrap(), (1, 2));
        assert!(Rect::new(-1, 0, 1, 1).origin().is_err());
    }
}

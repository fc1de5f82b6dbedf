mod addressing;
mod channel;
mod color;
mod depth;
mod fast;
mod parallel;

use std::sync::OnceLock;

use crate::env_config::{define_env_flag, env_var_positive_u64};
use crate::region::Rect;

pub use addressing::Direction;
pub use color::{ConversionRequest, ReadbackRequest, convert_pixels, read_back_pixels};
pub use depth::{
    DEPTH_SAMPLE_BYTES, DepthConversionRequest, DepthReadbackRequest, DepthWritePolicy,
    convert_depth, read_back_depth,
};

/// Rects below this many pixels are converted on the calling thread.
pub const DEFAULT_PARALLEL_MIN_PIXELS: usize = 262_144;

define_env_flag!(enabled_unless(fast_path_enabled, "SURFACE_CONVERT_DISABLE_FAST_PATH"));
define_env_flag!(enabled_unless(parallel_enabled, "SURFACE_CONVERT_DISABLE_PARALLEL"));

fn parallel_min_pixels_from_env() -> usize {
    static VALUE: OnceLock<usize> = OnceLock::new();
    *VALUE.get_or_init(|| {
        env_var_positive_u64("SURFACE_CONVERT_PARALLEL_MIN_PIXELS")
            .and_then(|value| usize::try_from(value).ok())
            .unwrap_or(DEFAULT_PARALLEL_MIN_PIXELS)
    })
}

/// Tuning knobs shared by every conversion entry point.
///
/// None of them change the bytes produced, only how they are produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Use the byte-reassignment kernels for ARGB8888 / XRGB8888 / ARGB4444
    /// destinations.
    pub fast_path: bool,
    /// Allow row-parallel conversion on the shared pool.
    pub parallel: bool,
    pub parallel_min_pixels: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            fast_path: fast_path_enabled(),
            parallel: parallel_enabled(),
            parallel_min_pixels: parallel_min_pixels_from_env(),
        }
    }
}

impl ConversionOptions {
    pub(crate) fn parallelize(&self, rect: Rect) -> bool {
        let pixels = (rect.width as usize).saturating_mul(rect.height as usize);
        self.parallel && parallel::should_parallelize(pixels, self.parallel_min_pixels)
    }
}

/// Pre-initialize the conversion thread pool so the first large upload
/// doesn't pay the cost. Safe to call multiple times.
pub fn warmup() {
    parallel::warmup_pool();
}

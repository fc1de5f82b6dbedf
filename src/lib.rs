//! Pixel and depth surface format conversion.
//!
//! Application images in a handful of fixed byte encodings are packed into
//! surfaces whose layout is known only by per-channel bitmasks and a bit
//! width, and unpacked again on read-back. Depth surfaces get the same
//! treatment with an optional software `LESS` depth test.
//!
//! [`surface`] is the usual entry point; [`convert`] exposes the per-rect
//! kernels for callers that manage locking themselves.

pub mod bits;
pub mod convert;
pub(crate) mod env_config;
pub mod error;
pub mod format;
pub mod logging;
pub mod region;
pub mod source;
pub mod surface;

pub use convert::{ConversionOptions, Direction, DepthWritePolicy};
pub use error::{ConvertError, ConvertErrorClass, ConvertResult};
pub use format::{
    DepthFormatDescriptor, NativeFormat, PixelFormatDescriptor, color_descriptor_for,
    depth_descriptor_for,
};
pub use logging::{LoggingConfig, init_logging};
pub use region::{Rect, SurfaceExtent};
pub use source::SourceImageFormat;
pub use surface::{
    CubeFace, DepthReadback, DepthUpload, ImageLayout, ImageReadback, ImageUpload, LockAccess,
    LockableSurface, LockedSurface, MemorySurface, SurfaceTarget, read_back_depth,
    read_back_image, upload_depth, upload_image,
};

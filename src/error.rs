use std::fmt;

use crate::format::NativeFormat;

#[derive(Debug)]
pub enum ConvertError {
    /// Raw source format id outside [`SourceImageFormat`](crate::SourceImageFormat).
    UnsupportedSourceFormat(u32),

    /// Destination descriptor claims more than 32 bits per pixel.
    UnsupportedDestinationBitWidth(u32),

    /// Native format id with no descriptor in the resolver tables.
    UnknownFormatId(NativeFormat),

    /// A color format was handed to the depth path or vice versa.
    FormatMismatch(String),

    InvalidRect(String),

    InvalidLayout(String),

    BufferTooSmall {
        what: &'static str,
        required: usize,
        actual: usize,
    },

    /// The device layer failed to lock or unlock a surface.
    Surface(anyhow::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvertErrorClass {
    InvalidInput,
    Unsupported,
    Fatal,
}

impl ConvertError {
    pub fn class(&self) -> ConvertErrorClass {
        match self {
            Self::InvalidRect(_)
            | Self::InvalidLayout(_)
            | Self::BufferTooSmall { .. }
            | Self::FormatMismatch(_) => ConvertErrorClass::InvalidInput,
            Self::UnsupportedSourceFormat(_)
            | Self::UnsupportedDestinationBitWidth(_)
            | Self::UnknownFormatId(_) => ConvertErrorClass::Unsupported,
            Self::Surface(_) => ConvertErrorClass::Fatal,
        }
    }

    /// Whether the texture upload that hit this error can be skipped while
    /// the rest of the frame keeps rendering.
    pub fn is_local(&self) -> bool {
        !matches!(self.class(), ConvertErrorClass::Fatal)
    }

    pub(crate) fn buffer_too_small(what: &'static str, required: usize, actual: usize) -> Self {
        Self::BufferTooSmall {
            what,
            required,
            actual,
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSourceFormat(id) => write!(f, "unsupported source image format id {id}"),
            Self::UnsupportedDestinationBitWidth(bits) => write!(
                f,
                "destination surface uses {bits} bits per pixel; at most 32 are supported"
            ),
            Self::UnknownFormatId(format) => {
                write!(f, "no descriptor for native format {format}")
            }
            Self::FormatMismatch(message) => write!(f, "format mismatch: {message}"),
            Self::InvalidRect(message) => write!(f, "invalid conversion rectangle: {message}"),
            Self::InvalidLayout(message) => write!(f, "invalid buffer layout: {message}"),
            Self::BufferTooSmall {
                what,
                required,
                actual,
            } => write!(
                f,
                "{what} buffer too small: got {actual} bytes, need at least {required}"
            ),
            Self::Surface(inner) => write!(f, "surface access failed: {inner}"),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Surface(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;

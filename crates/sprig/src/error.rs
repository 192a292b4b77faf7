//! Errors for descriptor loading, frame resolution, and GPU setup.
//!
//! Configuration problems (a malformed [`SpriteSheetDesc`](crate::sheet::SpriteSheetDesc))
//! are reported when a descriptor is validated, before any frame is resolved
//! from it. Out-of-range frames are reported by the resolver. GPU problems
//! surface when a pipeline or context is built, never mid-draw.

use std::fmt;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpriteError>;

/// Errors that can occur while loading sheets or building the renderer.
#[derive(Debug)]
pub enum SpriteError {
    /// A required string field was empty.
    MissingField(&'static str),
    /// A dimension that must be non-zero was zero.
    ZeroDimension(&'static str),
    /// `total` is larger than the frame grid can hold.
    GridOverflow { total: u32, capacity: u32 },
    /// The frame grid extends past the edge of the atlas image.
    FrameOutOfBounds {
        axis: &'static str,
        extent: u32,
        image: u32,
    },
    /// A frame index outside `0..total` was requested.
    IndexOutOfRange { index: i64, total: u16 },
    /// Descriptor bytes or text could not be decoded.
    Decode(String),
    /// A descriptor could not be encoded.
    Encode(String),
    /// An atlas image could not be loaded.
    Image { path: String, message: String },
    /// An atlas image does not match the size its descriptor declares.
    ImageSizeMismatch {
        path: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// A sheet with this name is already registered.
    DuplicateSheet(String),
    /// A handle does not refer to a registered sheet.
    UnknownSheet(usize),
    /// A draw group reaches past the end of its batch's instances.
    GroupOutOfRange { first: u32, count: u32, instances: usize },
    /// No GPU adapter is available.
    NoAdapter(String),
    /// The GPU device could not be created.
    Device(String),
    /// Shader compilation or pipeline validation failed.
    Pipeline(String),
    /// Reading a render target back to the host failed.
    Readback(String),
    /// A renderer configuration file was malformed.
    Config(String),
    /// Filesystem error.
    Io(std::io::Error),
}

impl fmt::Display for SpriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteError::MissingField(field) => write!(f, "required field `{field}` is empty"),
            SpriteError::ZeroDimension(field) => write!(f, "`{field}` must be non-zero"),
            SpriteError::GridOverflow { total, capacity } => {
                write!(f, "total of {total} frames exceeds grid capacity of {capacity}")
            }
            SpriteError::FrameOutOfBounds { axis, extent, image } => write!(
                f,
                "frame grid reaches {extent}px along {axis} but the image is only {image}px"
            ),
            SpriteError::IndexOutOfRange { index, total } => {
                write!(f, "frame index {index} out of range (sheet has {total} frames)")
            }
            SpriteError::Decode(e) => write!(f, "descriptor decode failed: {e}"),
            SpriteError::Encode(e) => write!(f, "descriptor encode failed: {e}"),
            SpriteError::Image { path, message } => {
                write!(f, "failed to load image '{path}': {message}")
            }
            SpriteError::ImageSizeMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "image '{path}' is {}x{}, descriptor declares {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            SpriteError::DuplicateSheet(name) => {
                write!(f, "a sprite sheet named '{name}' is already registered")
            }
            SpriteError::UnknownSheet(id) => write!(f, "no sprite sheet with handle {id}"),
            SpriteError::GroupOutOfRange {
                first,
                count,
                instances,
            } => write!(
                f,
                "draw group of {count} instances from {first} overruns a batch of {instances}"
            ),
            SpriteError::NoAdapter(e) => write!(f, "no suitable GPU adapter: {e}"),
            SpriteError::Device(e) => write!(f, "GPU device creation failed: {e}"),
            SpriteError::Pipeline(e) => write!(f, "sprite pipeline build failed: {e}"),
            SpriteError::Readback(e) => write!(f, "render target readback failed: {e}"),
            SpriteError::Config(e) => write!(f, "invalid renderer config: {e}"),
            SpriteError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for SpriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpriteError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SpriteError {
    fn from(e: std::io::Error) -> Self {
        SpriteError::Io(e)
    }
}

use std::fmt;
use std::io;

use enough::StopReason;

/// Which header a read or write failure refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderPart {
    /// The 14-byte bitmap file header.
    File,
    /// The fixed 40-byte DIB info header core.
    Info,
    /// Info header bytes beyond the 40-byte core.
    Extra,
}

impl fmt::Display for HeaderPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "bitmap file header",
            Self::Info => "DIB header",
            Self::Extra => "extended DIB header",
        })
    }
}

/// Errors from BMP decoding and encoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BitmapError {
    #[error("invalid file descriptor: {0}")]
    InvalidDescriptor(#[source] io::Error),

    #[error("failed to read the {0}")]
    HeaderReadFailure(HeaderPart, #[source] io::Error),

    #[error("invalid bitmap file signature {0:02x?}")]
    BadSignature([u8; 2]),

    #[error("invalid DIB header size: {extra} extra bytes exceed the limit of {max}")]
    OversizedHeader { extra: usize, max: usize },

    #[error("invalid DIB header size: {0} is smaller than the 40-byte core")]
    UndersizedHeader(u32),

    #[error("invalid color depth {0} (not 24 or 32 bits per pixel)")]
    UnsupportedDepth(u16),

    #[error("unsupported compression scheme {0}")]
    UnsupportedCompression(u32),

    /// Bitfield masks (red, green, blue, alpha) that do not select plain
    /// B,G,R(,A) bytes.
    #[error("unsupported bitfield masks {0:08x?}")]
    UnsupportedBitfields([u32; 4]),

    #[error("the bitmap image contains invalid size information: file size {file_size}, headers {header_size}")]
    InvalidSizeInformation { file_size: u32, header_size: usize },

    #[error("not enough memory to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("failed to read the image data")]
    PayloadReadFailure(#[source] io::Error),

    #[error("invalid pixel offset {offset} (headers {header_size}, payload {payload_len} bytes)")]
    InvalidPixelOffset {
        offset: u32,
        header_size: usize,
        payload_len: usize,
    },

    #[error("failed to calculate padding information: pixel rows need {needed} bytes, {available} available")]
    PaddingCalculationFailure { needed: usize, available: usize },

    #[error("failed to write the {0}")]
    HeaderWriteFailure(HeaderPart, #[source] io::Error),

    #[error("failed to write the image data")]
    ImageWriteFailure(#[source] io::Error),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("pixel plane does not match the image: expected {expected} bytes, got {actual}")]
    PlaneMismatch { expected: usize, actual: usize },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for BitmapError {
    fn from(r: StopReason) -> Self {
        BitmapError::Cancelled(r)
    }
}

/// Payload-free discriminant of [`BitmapError`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDescriptor,
    HeaderReadFailure,
    BadSignature,
    OversizedHeader,
    UndersizedHeader,
    UnsupportedDepth,
    UnsupportedCompression,
    UnsupportedBitfields,
    InvalidSizeInformation,
    OutOfMemory,
    PayloadReadFailure,
    InvalidPixelOffset,
    PaddingCalculationFailure,
    HeaderWriteFailure,
    ImageWriteFailure,
    DimensionsTooLarge,
    LimitExceeded,
    PlaneMismatch,
    Cancelled,
}

impl BitmapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDescriptor(_) => ErrorKind::InvalidDescriptor,
            Self::HeaderReadFailure(..) => ErrorKind::HeaderReadFailure,
            Self::BadSignature(_) => ErrorKind::BadSignature,
            Self::OversizedHeader { .. } => ErrorKind::OversizedHeader,
            Self::UndersizedHeader(_) => ErrorKind::UndersizedHeader,
            Self::UnsupportedDepth(_) => ErrorKind::UnsupportedDepth,
            Self::UnsupportedCompression(_) => ErrorKind::UnsupportedCompression,
            Self::UnsupportedBitfields(_) => ErrorKind::UnsupportedBitfields,
            Self::InvalidSizeInformation { .. } => ErrorKind::InvalidSizeInformation,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::PayloadReadFailure(_) => ErrorKind::PayloadReadFailure,
            Self::InvalidPixelOffset { .. } => ErrorKind::InvalidPixelOffset,
            Self::PaddingCalculationFailure { .. } => ErrorKind::PaddingCalculationFailure,
            Self::HeaderWriteFailure(..) => ErrorKind::HeaderWriteFailure,
            Self::ImageWriteFailure(_) => ErrorKind::ImageWriteFailure,
            Self::DimensionsTooLarge { .. } => ErrorKind::DimensionsTooLarge,
            Self::LimitExceeded(_) => ErrorKind::LimitExceeded,
            Self::PlaneMismatch { .. } => ErrorKind::PlaneMismatch,
            Self::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}

/// Errors from the worker pool and the parallel transform driver.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    #[error("a worker pool needs at least one thread")]
    ZeroThreads,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("task queue lock poisoned")]
    Poisoned,

    #[error("{0} worker thread(s) panicked")]
    WorkerPanicked(usize),

    #[error("{lost} task(s) did not complete")]
    TaskFailed { lost: usize },

    #[error(transparent)]
    Bitmap(#[from] BitmapError),
}

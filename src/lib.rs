//! # bmpfx
//!
//! Uncompressed BMP decoder and encoder, plus a small worker pool for running
//! per-pixel transforms over the decoded image in parallel.
//!
//! ## Pixel plane
//!
//! Decoding reads the whole file after the headers into memory and builds a
//! [`NormalizedPlane`]: one BGRA row per image row, 4 bytes per pixel, no row
//! padding, starting on a 64-byte boundary. 24-bit sources get alpha 255.
//! Rows stay in file order, so a bottom-up file has its bottom row first.
//! Encoding packs the plane back into the original payload, so anything the
//! decoder did not interpret (extended header fields, gaps before the pixel
//! array, trailing bytes) round-trips unchanged.
//!
//! ## Supported files
//!
//! - 24-bit BGR and 32-bit BGRA, bottom-up or top-down
//! - `BI_RGB`, and `BI_BITFIELDS`/`BI_ALPHABITFIELDS` when the masks select
//!   plain B,G,R(,A) bytes
//! - Any info header of at least 40 bytes, extra bytes kept verbatim up to
//!   [`Limits::max_extra_header_bytes`]
//!
//! ## Non-Goals
//!
//! - Palettized and 16-bit images
//! - RLE, JPEG or PNG compression
//! - Colour management
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use bmpfx::{BmpImage, Limits, WorkerPool};
//! use bmpfx::transform::{self, Kernel, Sepia};
//!
//! let mut image = BmpImage::open("photo.bmp", &Limits::default())?;
//! let pool = WorkerPool::new(4)?;
//! transform::apply_parallel(&pool, &mut image, Arc::new(Sepia::new(Kernel::Wide)))?;
//! pool.shutdown()?;
//! image.save("sepia.bmp")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod error;
mod limits;
mod pixel;
mod plane;

pub mod bmp;
pub mod pool;
pub mod sample;
pub mod transform;

// Re-exports
pub use bmp::BmpImage;
pub use enough::{Stop, StopReason, Unstoppable};
pub use error::{BitmapError, ErrorKind, HeaderPart, PoolError};
pub use limits::{DEFAULT_MAX_EXTRA_HEADER_BYTES, Limits};
pub use pixel::PixelLayout;
pub use plane::{NormalizedPlane, PLANE_ALIGNMENT, PLANE_CHANNELS, PlaneSegment, aligned_allocation_size};
pub use pool::{CountdownLatch, PoolConfig, WorkerPool};
pub use transform::{Kernel, PixelTransform};

//! Uncompressed 24-bit and 32-bit BMP codec.
//!
//! Decoding normalizes the padded BGR/BGRA pixel rows into a 64-byte aligned
//! BGRA [`NormalizedPlane`](crate::NormalizedPlane); encoding repacks the plane
//! into the original payload. Headers, extended header bytes, row padding and
//! any bytes around the pixel array are preserved, so an untouched image
//! re-encodes byte for byte.

mod decode;
mod encode;
mod header;
mod image;
mod utils;

pub use header::{
    BI_ALPHABITFIELDS, BI_BITFIELDS, BI_RGB, FILE_HEADER_SIZE, FileHeader, INFO_HEADER_SIZE,
    InfoHeader, SIGNATURE,
};
pub use image::BmpImage;
pub use utils::row_padding;

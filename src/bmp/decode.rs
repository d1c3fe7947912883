//! BMP decoder: header parsing and payload normalization.
//!
//! Decoding is two-phase. [`parse_headers`] reads and validates both headers
//! and the extended info header bytes; [`read_payload`] reads the rest of the
//! file and builds the normalized plane. Either phase can fail on its own.

use std::io::{self, Read};

use enough::Stop;

use super::header::{
    ALPHA_MASK, BGR_MASKS, BI_ALPHABITFIELDS, BI_BITFIELDS, BI_RGB, FILE_HEADER_SIZE, FileHeader,
    INFO_HEADER_SIZE, InfoHeader, SIGNATURE, bitfield_masks,
};
use super::image::BmpImage;
use super::utils::{RowGeometry, unpack_rows};
use crate::error::{BitmapError, HeaderPart};
use crate::limits::Limits;
use crate::pixel::PixelLayout;
use crate::plane::NormalizedPlane;

/// Read and validate the file header, info header and extended header bytes.
pub(crate) fn parse_headers<R: Read>(
    reader: &mut R,
    limits: &Limits,
) -> Result<BmpImage, BitmapError> {
    let mut buf = [0u8; FILE_HEADER_SIZE];
    reader
        .read_exact(&mut buf)
        .map_err(|e| BitmapError::HeaderReadFailure(HeaderPart::File, e))?;
    let file_header = FileHeader::from_bytes(&buf);
    if file_header.signature != SIGNATURE {
        return Err(BitmapError::BadSignature(file_header.signature));
    }

    let mut buf = [0u8; INFO_HEADER_SIZE];
    reader
        .read_exact(&mut buf)
        .map_err(|e| BitmapError::HeaderReadFailure(HeaderPart::Info, e))?;
    let info_header = InfoHeader::from_bytes(&buf);

    let declared = info_header.header_size as usize;
    let extra_len = declared
        .checked_sub(INFO_HEADER_SIZE)
        .ok_or(BitmapError::UndersizedHeader(info_header.header_size))?;
    if extra_len > limits.max_extra_header_bytes {
        return Err(BitmapError::OversizedHeader {
            extra: extra_len,
            max: limits.max_extra_header_bytes,
        });
    }
    let mut extra_header = vec![0u8; extra_len];
    reader
        .read_exact(&mut extra_header)
        .map_err(|e| BitmapError::HeaderReadFailure(HeaderPart::Extra, e))?;

    let layout = PixelLayout::from_bits_per_pixel(info_header.bits_per_pixel)?;
    match info_header.compression {
        BI_RGB | BI_BITFIELDS | BI_ALPHABITFIELDS => {}
        other => return Err(BitmapError::UnsupportedCompression(other)),
    }

    let header_size = FILE_HEADER_SIZE + declared;
    if file_header.file_size as usize <= header_size {
        return Err(BitmapError::InvalidSizeInformation {
            file_size: file_header.file_size,
            header_size,
        });
    }

    Ok(BmpImage::from_headers(
        file_header,
        info_header,
        extra_header,
        layout,
    ))
}

/// Read everything after the headers and normalize the pixel array into the
/// image's plane. On error the image keeps its headers and holds no payload.
pub(crate) fn read_payload<R: Read>(
    reader: &mut R,
    image: &mut BmpImage,
    limits: &Limits,
    stop: &dyn Stop,
) -> Result<(), BitmapError> {
    let header_size = image.header_size();
    let file_size = image.file_header.file_size;
    let payload_len = (file_size as usize)
        .checked_sub(header_size)
        .filter(|&len| len > 0)
        .ok_or(BitmapError::InvalidSizeInformation {
            file_size,
            header_size,
        })?;

    limits.check_memory(payload_len)?;
    let mut payload = Vec::new();
    payload
        .try_reserve_exact(payload_len)
        .map_err(|_| BitmapError::OutOfMemory { bytes: payload_len })?;
    reader
        .by_ref()
        .take(payload_len as u64)
        .read_to_end(&mut payload)
        .map_err(BitmapError::PayloadReadFailure)?;
    if payload.len() != payload_len {
        return Err(BitmapError::PayloadReadFailure(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {payload_len} bytes, got {}", payload.len()),
        )));
    }

    let offset = image.file_header.pixel_array_offset;
    let pixel_start = (offset as usize)
        .checked_sub(header_size)
        .filter(|&start| start < payload_len)
        .ok_or(BitmapError::InvalidPixelOffset {
            offset,
            header_size,
            payload_len,
        })?;

    let compression = image.info_header.compression;
    if compression != BI_RGB {
        check_bitfields(compression, &image.extra_header, &payload[..pixel_start])?;
    }

    let width = image.info_header.width.unsigned_abs();
    let height = image.info_header.height.unsigned_abs();
    limits.check(width, height)?;
    let geometry = RowGeometry::new(image.layout, width, height)?;

    // The pixel array has to fit in what follows the pixel offset.
    let available = payload_len - pixel_start;
    if geometry.image_size > available {
        return Err(BitmapError::PaddingCalculationFailure {
            needed: geometry.image_size,
            available,
        });
    }

    stop.check()?;
    let mut plane = NormalizedPlane::allocate(geometry.width, geometry.height, limits)?;
    let raw = &payload[pixel_start..pixel_start + geometry.image_size];
    unpack_rows(raw, plane.as_bytes_mut(), &geometry, stop)?;

    image.install_payload(payload, pixel_start, geometry, plane);
    Ok(())
}

/// Bitfields pixels are read as plain bytes, so the masks have to say so.
fn check_bitfields(compression: u32, extra_header: &[u8], gap: &[u8]) -> Result<(), BitmapError> {
    let masks = bitfield_masks(compression, extra_header, gap);
    if masks[..3] == BGR_MASKS && (masks[3] == 0 || masks[3] == ALPHA_MASK) {
        Ok(())
    } else {
        Err(BitmapError::UnsupportedBitfields(masks))
    }
}

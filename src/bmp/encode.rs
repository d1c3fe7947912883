//! BMP encoder: header serialization and repacking the plane into the payload.

use std::io::Write;

use enough::Stop;

use super::header::{BI_RGB, FILE_HEADER_SIZE, FileHeader, INFO_HEADER_SIZE, InfoHeader, SIGNATURE};
use super::image::BmpImage;
use super::utils::{RowGeometry, pack_rows};
use crate::error::{BitmapError, HeaderPart};
use crate::pixel::PixelLayout;

/// 72 DPI.
const DEFAULT_PIXELS_PER_METER: i32 = 2835;

/// Payload written for an image with no pixels. A file must be longer than
/// its headers to decode.
const EMPTY_PAYLOAD_LEN: usize = 4;

/// Payload length of a new image: the pixel array, or a zeroed stub when the
/// image has no pixels.
pub(crate) fn new_payload_len(geometry: &RowGeometry) -> usize {
    geometry.image_size.max(EMPTY_PAYLOAD_LEN)
}

/// Write the file header, then the info header using its declared size as the
/// write length: the 40-byte core followed by the extended header bytes,
/// truncated or zero-filled to fit.
pub(crate) fn write_headers<W: Write>(writer: &mut W, image: &BmpImage) -> Result<(), BitmapError> {
    writer
        .write_all(&image.file_header.to_bytes())
        .map_err(|e| BitmapError::HeaderWriteFailure(HeaderPart::File, e))?;

    let declared = image.info_header.header_size as usize;
    let mut info = Vec::with_capacity(declared.max(INFO_HEADER_SIZE));
    info.extend_from_slice(&image.info_header.to_bytes());
    info.extend_from_slice(&image.extra_header);
    info.resize(declared, 0);
    writer
        .write_all(&info)
        .map_err(|e| BitmapError::HeaderWriteFailure(HeaderPart::Info, e))?;
    Ok(())
}

/// Repack the plane into the payload and write the payload.
pub(crate) fn write_payload<W: Write>(
    writer: &mut W,
    image: &mut BmpImage,
    stop: &dyn Stop,
) -> Result<(), BitmapError> {
    repack(image, stop)?;
    writer
        .write_all(&image.payload)
        .map_err(BitmapError::ImageWriteFailure)?;
    writer.flush().map_err(BitmapError::ImageWriteFailure)?;
    Ok(())
}

/// Copy the plane back over the pixel array, re-checking that the plane still
/// matches the geometry the payload was read with.
pub(crate) fn repack(image: &mut BmpImage, stop: &dyn Stop) -> Result<(), BitmapError> {
    let Some(geo) = image.geometry else {
        return Err(BitmapError::PlaneMismatch {
            expected: image.payload_len_from_headers(),
            actual: image.payload.len(),
        });
    };
    if image.plane.width() != geo.width
        || image.plane.height() != geo.height
        || image.plane.len() != geo.plane_len()
    {
        return Err(BitmapError::PlaneMismatch {
            expected: geo.plane_len(),
            actual: image.plane.len(),
        });
    }
    let end = image.pixel_start + geo.image_size;
    if end > image.payload.len() {
        return Err(BitmapError::PaddingCalculationFailure {
            needed: geo.image_size,
            available: image.payload.len().saturating_sub(image.pixel_start),
        });
    }
    let raw = &mut image.payload[image.pixel_start..end];
    pack_rows(image.plane.as_bytes(), raw, &geo, stop)
}

/// Headers for a new BITMAPINFOHEADER image with the pixel array right after
/// the headers. Negative `height` gives a top-down image.
pub(crate) fn synthesize_headers(
    width: u32,
    height: i32,
    layout: PixelLayout,
) -> Result<(FileHeader, InfoHeader, RowGeometry), BitmapError> {
    let too_large = || BitmapError::DimensionsTooLarge {
        width,
        height: height.unsigned_abs(),
    };
    let signed_width = i32::try_from(width).map_err(|_| too_large())?;
    let geometry = RowGeometry::new(layout, width, height.unsigned_abs())?;
    let header_size = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
    let image_size = u32::try_from(geometry.image_size).map_err(|_| too_large())?;
    let file_size = new_payload_len(&geometry)
        .checked_add(header_size)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(too_large)?;

    let file_header = FileHeader {
        signature: SIGNATURE,
        file_size,
        reserved: [0, 0],
        pixel_array_offset: header_size as u32,
    };
    let info_header = InfoHeader {
        header_size: INFO_HEADER_SIZE as u32,
        width: signed_width,
        height,
        planes: 1,
        bits_per_pixel: layout.bits_per_pixel(),
        compression: BI_RGB,
        image_size,
        x_pixels_per_meter: DEFAULT_PIXELS_PER_METER,
        y_pixels_per_meter: DEFAULT_PIXELS_PER_METER,
        colors_used: 0,
        important_colors: 0,
    };
    Ok((file_header, info_header, geometry))
}

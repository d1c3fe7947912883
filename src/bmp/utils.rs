//! Row geometry and the row copies between the file's pixel array and the
//! normalized plane.

use enough::Stop;

use crate::error::BitmapError;
use crate::pixel::PixelLayout;
use crate::plane::PLANE_CHANNELS;

/// Alpha written for pixels of 24-bit sources.
pub(crate) const OPAQUE: u8 = 255;

/// Filler bytes after each row of `width` pixels at `bits_per_pixel`, so rows
/// start on 4-byte boundaries.
///
/// `round_up(bits_per_pixel * width, 32) / 8 - (bits_per_pixel / 8) * width`.
/// Returns `None` on overflow.
pub fn row_padding(bits_per_pixel: u16, width: usize) -> Option<usize> {
    let bits = usize::from(bits_per_pixel).checked_mul(width)?;
    let padded = bits.checked_next_multiple_of(32)? / 8;
    padded.checked_sub(usize::from(bits_per_pixel / 8) * width)
}

/// Layout of the pixel array in the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RowGeometry {
    pub layout: PixelLayout,
    pub width: usize,
    pub height: usize,
    /// Pixel bytes per row, without padding.
    pub row_bytes: usize,
    pub padding: usize,
    /// `height * (row_bytes + padding)`.
    pub image_size: usize,
}

impl RowGeometry {
    pub fn new(layout: PixelLayout, width: u32, height: u32) -> Result<Self, BitmapError> {
        let too_large = || BitmapError::DimensionsTooLarge { width, height };
        let w = width as usize;
        let h = height as usize;
        let row_bytes = w.checked_mul(layout.channels()).ok_or_else(too_large)?;
        let padding = row_padding(layout.bits_per_pixel(), w).ok_or_else(too_large)?;
        let image_size = row_bytes
            .checked_add(padding)
            .and_then(|stride| stride.checked_mul(h))
            .ok_or_else(too_large)?;
        Ok(Self {
            layout,
            width: w,
            height: h,
            row_bytes,
            padding,
            image_size,
        })
    }

    /// Distance between row starts in the payload.
    pub fn stride(&self) -> usize {
        self.row_bytes + self.padding
    }

    /// Bytes the normalized plane needs.
    pub fn plane_len(&self) -> usize {
        self.width.saturating_mul(PLANE_CHANNELS).saturating_mul(self.height)
    }
}

/// Copy file rows into the plane, dropping padding and adding alpha for
/// 24-bit rows. `raw` must hold `geo.image_size` bytes and `plane`
/// `geo.plane_len()` bytes.
pub(crate) fn unpack_rows(
    raw: &[u8],
    plane: &mut [u8],
    geo: &RowGeometry,
    stop: &dyn Stop,
) -> Result<(), BitmapError> {
    if geo.width == 0 || geo.height == 0 {
        return Ok(());
    }
    let rows = raw
        .chunks_exact(geo.stride())
        .zip(plane.chunks_exact_mut(geo.width * PLANE_CHANNELS));
    for (y, (src, dst)) in rows.enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        let src = &src[..geo.row_bytes];
        match geo.layout {
            PixelLayout::Bgra8 => dst.copy_from_slice(src),
            PixelLayout::Bgr8 => {
                for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
                    d[..3].copy_from_slice(s);
                    d[3] = OPAQUE;
                }
            }
        }
    }
    Ok(())
}

/// Inverse of [`unpack_rows`]: copy plane rows back over the file rows,
/// dropping alpha for 24-bit rows. Padding bytes in `raw` are left as they are.
pub(crate) fn pack_rows(
    plane: &[u8],
    raw: &mut [u8],
    geo: &RowGeometry,
    stop: &dyn Stop,
) -> Result<(), BitmapError> {
    if geo.width == 0 || geo.height == 0 {
        return Ok(());
    }
    let rows = plane
        .chunks_exact(geo.width * PLANE_CHANNELS)
        .zip(raw.chunks_exact_mut(geo.stride()));
    for (y, (src, dst)) in rows.enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        let dst = &mut dst[..geo.row_bytes];
        match geo.layout {
            PixelLayout::Bgra8 => dst.copy_from_slice(src),
            PixelLayout::Bgr8 => {
                for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(3)) {
                    d.copy_from_slice(&s[..3]);
                }
            }
        }
    }
    Ok(())
}

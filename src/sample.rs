//! Edge-clamped pixel addressing for neighborhood-aware transforms.
//!
//! Coordinates outside the image are clamped to the nearest edge pixel, never
//! wrapped and never rejected.

fn clamp_coord(v: isize, extent: usize) -> usize {
    if v <= 0 {
        0
    } else {
        v.unsigned_abs().min(extent.saturating_sub(1))
    }
}

/// Byte offset of the pixel at the clamped `(x, y)` in a buffer with the given
/// row stride and pixel size.
pub fn pixel_offset(
    x: isize,
    y: isize,
    width: usize,
    height: usize,
    row_stride: usize,
    pixel_size: usize,
) -> usize {
    clamp_coord(y, height) * row_stride + clamp_coord(x, width) * pixel_size
}

/// Returned for every coordinate of an image with no pixels.
static EMPTY_PIXEL: [u8; 4] = [0; 4];

/// Pixel at the clamped `(x, y)` of a normalized plane (`width * 4` stride).
/// An image with zero width or height reads as a single zero pixel.
///
/// # Panics
/// If `plane` is shorter than `width * height * 4` bytes.
pub fn sample(plane: &[u8], x: isize, y: isize, width: usize, height: usize) -> &[u8; 4] {
    if width == 0 || height == 0 {
        return &EMPTY_PIXEL;
    }
    let off = pixel_offset(x, y, width, height, width * 4, 4);
    match plane[off..].first_chunk::<4>() {
        Some(px) => px,
        None => panic!("pixel offset {off} outside a {}-byte plane", plane.len()),
    }
}

/// Mutable variant of [`sample`].
///
/// # Panics
/// If `plane` is shorter than `width * height * 4` bytes, or the image is
/// empty: there is no pixel to write.
pub fn sample_mut(
    plane: &mut [u8],
    x: isize,
    y: isize,
    width: usize,
    height: usize,
) -> &mut [u8; 4] {
    let off = pixel_offset(x, y, width, height, width * 4, 4);
    let len = plane.len();
    match plane[off..].first_chunk_mut::<4>() {
        Some(px) => px,
        None => panic!("pixel offset {off} outside a {len}-byte plane"),
    }
}

/// Pixel at the clamped `(x, y)` of the raw, padded pixel array as stored in
/// the file. Rows are `width * channels + padding` bytes apart; the returned
/// slice is `channels` bytes long, zeros for an image with no pixels.
///
/// # Panics
/// If `raw` does not hold the addressed pixel, or `channels` exceeds 4 for an
/// empty image.
pub fn sample_raw(
    raw: &[u8],
    x: isize,
    y: isize,
    width: usize,
    height: usize,
    channels: usize,
    padding: usize,
) -> &[u8] {
    if width == 0 || height == 0 {
        return &EMPTY_PIXEL[..channels];
    }
    let stride = width * channels + padding;
    let off = pixel_offset(x, y, width, height, stride, channels);
    &raw[off..off + channels]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_low_and_high() {
        assert_eq!(clamp_coord(-5, 10), 0);
        assert_eq!(clamp_coord(0, 10), 0);
        assert_eq!(clamp_coord(9, 10), 9);
        assert_eq!(clamp_coord(15, 10), 9);
        assert_eq!(clamp_coord(isize::MIN, 10), 0);
        assert_eq!(clamp_coord(isize::MAX, 10), 9);
        assert_eq!(clamp_coord(3, 0), 0);
    }

    #[test]
    fn offsets_use_stride() {
        assert_eq!(pixel_offset(2, 1, 4, 3, 16, 4), 16 + 8);
        assert_eq!(pixel_offset(2, 1, 4, 3, 14, 3), 14 + 6);
        assert_eq!(pixel_offset(100, 100, 4, 3, 16, 4), 2 * 16 + 3 * 4);
    }

    #[test]
    fn sample_reads_pixel() {
        let plane: Vec<u8> = (0..24).collect();
        assert_eq!(sample(&plane, 1, 1, 3, 2), &[16, 17, 18, 19]);
        assert_eq!(sample(&plane, -1, 7, 3, 2), &[12, 13, 14, 15]);
    }

    #[test]
    fn empty_image_reads_zero() {
        for (w, h) in [(0, 3), (3, 0), (0, 0)] {
            assert_eq!(sample(&[], isize::MIN, 7, w, h), &[0; 4]);
            assert_eq!(sample_raw(&[], -1, isize::MAX, w, h, 3, 1), &[0; 3]);
        }
    }

    #[test]
    fn sample_mut_writes_pixel() {
        let mut plane = vec![0u8; 16];
        *sample_mut(&mut plane, 5, 0, 2, 2) = [1, 2, 3, 4];
        assert_eq!(&plane[4..8], &[1, 2, 3, 4]);
    }

    #[test]
    fn raw_sample_skips_padding() {
        // 2x2 at 24 bpp: 6 pixel bytes + 2 padding per row
        let raw = [1, 1, 1, 2, 2, 2, 0, 0, 3, 3, 3, 4, 4, 4, 0, 0];
        assert_eq!(sample_raw(&raw, 0, 1, 2, 2, 3, 2), &[3, 3, 3]);
        assert_eq!(sample_raw(&raw, 9, 9, 2, 2, 3, 2), &[4, 4, 4]);
        assert_eq!(sample_raw(&raw, -9, -9, 2, 2, 3, 2), &[1, 1, 1]);
    }
}

//! Fixed-layout BMP headers (little-endian).

/// Size of the bitmap file header.
pub const FILE_HEADER_SIZE: usize = 14;

/// Size of the BITMAPINFOHEADER core that every supported info header starts with.
pub const INFO_HEADER_SIZE: usize = 40;

/// `BM`
pub const SIGNATURE: [u8; 2] = *b"BM";

/// Uncompressed pixel data.
pub const BI_RGB: u32 = 0;
/// Channel masks follow the info header; pixels are still plain bytes.
pub const BI_BITFIELDS: u32 = 3;
/// Like [`BI_BITFIELDS`] with an alpha mask.
pub const BI_ALPHABITFIELDS: u32 = 6;

/// Red, green and blue masks that select plain B,G,R bytes.
pub const BGR_MASKS: [u32; 3] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF];
/// Alpha mask selecting the fourth byte of a 32-bit pixel.
pub const ALPHA_MASK: u32 = 0xFF00_0000;

/// Red, green, blue and alpha masks of a bitfields image.
///
/// Info headers of 52 bytes and up carry the masks in their extended part
/// (alpha from 56 bytes). A bare 40-byte header is followed by them instead,
/// in the gap before the pixel array; the alpha mask is only there for
/// [`BI_ALPHABITFIELDS`]. Masks that are not present read as zero.
pub(crate) fn bitfield_masks(compression: u32, extra_header: &[u8], gap: &[u8]) -> [u32; 4] {
    let (src, mask_count) = if extra_header.len() >= 12 {
        (extra_header, 4)
    } else if compression == BI_ALPHABITFIELDS {
        (gap, 4)
    } else {
        (gap, 3)
    };
    core::array::from_fn(|i| {
        if i < mask_count && src.len() >= (i + 1) * 4 {
            u32_at(src, i * 4)
        } else {
            0
        }
    })
}

fn u16_at(b: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([b[off], b[off + 1]])
}

fn u32_at(b: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

fn i32_at(b: &[u8], off: usize) -> i32 {
    i32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

/// The 14-byte file header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileHeader {
    pub signature: [u8; 2],
    /// Total file length in bytes.
    pub file_size: u32,
    pub reserved: [u16; 2],
    /// Offset from the start of the file to the pixel array.
    pub pixel_array_offset: u32,
}

impl FileHeader {
    pub fn from_bytes(b: &[u8; FILE_HEADER_SIZE]) -> Self {
        Self {
            signature: [b[0], b[1]],
            file_size: u32_at(b, 2),
            reserved: [u16_at(b, 6), u16_at(b, 8)],
            pixel_array_offset: u32_at(b, 10),
        }
    }

    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut out = [0u8; FILE_HEADER_SIZE];
        out[0..2].copy_from_slice(&self.signature);
        out[2..6].copy_from_slice(&self.file_size.to_le_bytes());
        out[6..8].copy_from_slice(&self.reserved[0].to_le_bytes());
        out[8..10].copy_from_slice(&self.reserved[1].to_le_bytes());
        out[10..14].copy_from_slice(&self.pixel_array_offset.to_le_bytes());
        out
    }
}

/// The 40-byte info header core. Longer headers (V4, V5) carry their
/// additional fields as opaque extra bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InfoHeader {
    /// Declared size of the whole info header, extra bytes included.
    pub header_size: u32,
    pub width: i32,
    /// Negative for top-down row order, positive for bottom-up.
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_meter: i32,
    pub y_pixels_per_meter: i32,
    pub colors_used: u32,
    pub important_colors: u32,
}

impl InfoHeader {
    pub fn from_bytes(b: &[u8; INFO_HEADER_SIZE]) -> Self {
        Self {
            header_size: u32_at(b, 0),
            width: i32_at(b, 4),
            height: i32_at(b, 8),
            planes: u16_at(b, 12),
            bits_per_pixel: u16_at(b, 14),
            compression: u32_at(b, 16),
            image_size: u32_at(b, 20),
            x_pixels_per_meter: i32_at(b, 24),
            y_pixels_per_meter: i32_at(b, 28),
            colors_used: u32_at(b, 32),
            important_colors: u32_at(b, 36),
        }
    }

    pub fn to_bytes(&self) -> [u8; INFO_HEADER_SIZE] {
        let mut out = [0u8; INFO_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.header_size.to_le_bytes());
        out[4..8].copy_from_slice(&self.width.to_le_bytes());
        out[8..12].copy_from_slice(&self.height.to_le_bytes());
        out[12..14].copy_from_slice(&self.planes.to_le_bytes());
        out[14..16].copy_from_slice(&self.bits_per_pixel.to_le_bytes());
        out[16..20].copy_from_slice(&self.compression.to_le_bytes());
        out[20..24].copy_from_slice(&self.image_size.to_le_bytes());
        out[24..28].copy_from_slice(&self.x_pixels_per_meter.to_le_bytes());
        out[28..32].copy_from_slice(&self.y_pixels_per_meter.to_le_bytes());
        out[32..36].copy_from_slice(&self.colors_used.to_le_bytes());
        out[36..40].copy_from_slice(&self.important_colors.to_le_bytes());
        out
    }

    /// Top row stored first (negative height).
    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }
}

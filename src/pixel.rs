use crate::error::BitmapError;

/// On-disk pixel layout of a supported bitmap.
///
/// The working plane is always 4-byte BGRA regardless of layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// 24 bits per pixel, B,G,R byte order.
    Bgr8,
    /// 32 bits per pixel, B,G,R,A byte order.
    Bgra8,
}

impl PixelLayout {
    /// Map a `bits_per_pixel` header field to a layout.
    pub fn from_bits_per_pixel(bits: u16) -> Result<Self, BitmapError> {
        match bits {
            24 => Ok(Self::Bgr8),
            32 => Ok(Self::Bgra8),
            other => Err(BitmapError::UnsupportedDepth(other)),
        }
    }

    pub fn bits_per_pixel(&self) -> u16 {
        match self {
            Self::Bgr8 => 24,
            Self::Bgra8 => 32,
        }
    }

    /// Bytes per pixel in the file (3 or 4).
    pub fn channels(&self) -> usize {
        match self {
            Self::Bgr8 => 3,
            Self::Bgra8 => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Bgra8)
    }
}

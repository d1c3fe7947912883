use crate::error::BitmapError;

/// Default cap on info header bytes beyond the 40-byte core.
///
/// Large enough for BITMAPV5HEADER (124 bytes) followed by bitfield masks.
pub const DEFAULT_MAX_EXTRA_HEADER_BYTES: usize = 256;

/// Resource limits for decode operations.
///
/// Dimension and memory fields default to `None` (no limit).
#[derive(Clone, Debug)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for a single payload or plane allocation.
    pub max_memory_bytes: Option<u64>,
    /// Maximum info header bytes accepted beyond the 40-byte core.
    pub max_extra_header_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_pixels: None,
            max_memory_bytes: None,
            max_extra_header_bytes: DEFAULT_MAX_EXTRA_HEADER_BYTES,
        }
    }
}

impl Limits {
    /// Reject a header whose dimensions are over any configured cap, before
    /// anything is allocated for its pixels.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), BitmapError> {
        if let Some(max_w) = self.max_width {
            if u64::from(width) > max_w {
                return Err(BitmapError::LimitExceeded(format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if u64::from(height) > max_h {
                return Err(BitmapError::LimitExceeded(format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_px {
                return Err(BitmapError::LimitExceeded(format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Reject a payload or plane allocation larger than `max_memory_bytes`.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), BitmapError> {
        if let Some(max_mem) = self.max_memory_bytes {
            if bytes as u64 > max_mem {
                return Err(BitmapError::LimitExceeded(format!(
                    "allocation {bytes} bytes exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }
}

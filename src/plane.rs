//! The normalized working plane: tightly packed BGRA rows in a 64-byte
//! aligned allocation.

use core::fmt;

use bytemuck::{Pod, Zeroable};

use crate::error::BitmapError;
use crate::limits::Limits;
use crate::sample;

/// Alignment of the plane start, and the unit its allocation is rounded to.
pub const PLANE_ALIGNMENT: usize = 64;

/// Bytes per pixel in the plane.
pub const PLANE_CHANNELS: usize = 4;

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(64))]
pub(crate) struct Block([u8; PLANE_ALIGNMENT]);

/// Allocation size for `len` plane bytes: rounded up to the alignment plus one
/// unit of zeroed slack, so vector loads past the last pixel stay in bounds.
pub fn aligned_allocation_size(len: usize) -> Option<usize> {
    len.checked_next_multiple_of(PLANE_ALIGNMENT)?
        .checked_add(PLANE_ALIGNMENT)
}

fn zeroed_blocks(count: usize) -> Result<Vec<Block>, BitmapError> {
    let mut blocks = Vec::new();
    blocks
        .try_reserve_exact(count)
        .map_err(|_| BitmapError::OutOfMemory {
            bytes: count.saturating_mul(PLANE_ALIGNMENT),
        })?;
    blocks.resize(count, Block::zeroed());
    Ok(blocks)
}

/// Decoded pixels, one row per image row, `width * 4` bytes per row, B,G,R,A.
///
/// Rows are stored in file order; the plane never flips. The bytes between
/// [`len`](Self::len) and the end of the allocation are always zero.
#[derive(Clone, Default)]
pub struct NormalizedPlane {
    blocks: Vec<Block>,
    width: usize,
    height: usize,
}

impl fmt::Debug for NormalizedPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedPlane")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("allocated", &self.allocated_len())
            .finish()
    }
}

impl NormalizedPlane {
    /// Allocate a zeroed plane for `width` x `height` pixels.
    pub fn new(width: usize, height: usize) -> Result<Self, BitmapError> {
        Self::allocate(width, height, &Limits::default())
    }

    pub(crate) fn allocate(
        width: usize,
        height: usize,
        limits: &Limits,
    ) -> Result<Self, BitmapError> {
        let too_large = || BitmapError::DimensionsTooLarge {
            width: width.try_into().unwrap_or(u32::MAX),
            height: height.try_into().unwrap_or(u32::MAX),
        };
        let len = width
            .checked_mul(PLANE_CHANNELS)
            .and_then(|stride| stride.checked_mul(height))
            .ok_or_else(too_large)?;
        let total = aligned_allocation_size(len).ok_or_else(too_large)?;
        limits.check_memory(total)?;
        let blocks = zeroed_blocks(total / PLANE_ALIGNMENT)?;
        Ok(Self {
            blocks,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row (`width * 4`).
    pub fn stride(&self) -> usize {
        self.width * PLANE_CHANNELS
    }

    /// Pixel bytes, excluding alignment slack.
    pub fn len(&self) -> usize {
        self.stride() * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the whole allocation, slack included.
    pub fn allocated_len(&self) -> usize {
        self.blocks.len() * PLANE_ALIGNMENT
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.allocation()[..self.len()]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        &mut bytemuck::cast_slice_mut(&mut self.blocks)[..len]
    }

    /// The whole allocation, including the zeroed slack after the last row.
    pub fn allocation(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    /// Row `y` in storage order.
    ///
    /// # Panics
    /// If `y >= height`.
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        &self.as_bytes()[y * stride..(y + 1) * stride]
    }

    /// # Panics
    /// If `y >= height`.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let stride = self.stride();
        &mut self.as_bytes_mut()[y * stride..(y + 1) * stride]
    }

    /// Iterate rows top to bottom in storage order. Yields nothing when the
    /// width is zero.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.as_bytes().chunks_exact(self.stride().max(1))
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        let stride = self.stride().max(1);
        self.as_bytes_mut().chunks_exact_mut(stride)
    }

    /// Pixel at `(x, y)` with coordinates clamped to the image edges. An
    /// empty plane reads as a zero pixel.
    pub fn sample(&self, x: isize, y: isize) -> &[u8; 4] {
        sample::sample(self.as_bytes(), x, y, self.width, self.height)
    }

    /// # Panics
    /// If the plane is empty.
    pub fn sample_mut(&mut self, x: isize, y: isize) -> &mut [u8; 4] {
        let (width, height) = (self.width, self.height);
        sample::sample_mut(self.as_bytes_mut(), x, y, width, height)
    }

    /// Split the plane into at most `parts` contiguous segments covering all
    /// pixel bytes. Segment boundaries fall on [`PLANE_ALIGNMENT`], so each
    /// segment holds whole pixels and starts aligned.
    ///
    /// The first segment reuses the plane's allocation; [`join`](Self::join)
    /// extends it in place.
    pub fn split(self, parts: usize) -> Vec<PlaneSegment> {
        let len = self.len();
        if len == 0 {
            return Vec::new();
        }
        let content_blocks = len.div_ceil(PLANE_ALIGNMENT);
        let per_part = content_blocks.div_ceil(parts.max(1));

        let mut rest = self.blocks;
        rest.truncate(content_blocks);

        let mut segments = Vec::with_capacity(content_blocks.div_ceil(per_part));
        let mut start = (content_blocks - 1) / per_part * per_part;
        loop {
            // Cut from the back so only the tail segments are copied.
            let blocks = if start == 0 {
                core::mem::take(&mut rest)
            } else {
                rest.split_off(start)
            };
            let offset = start * PLANE_ALIGNMENT;
            let seg_len = (blocks.len() * PLANE_ALIGNMENT).min(len - offset);
            segments.push(PlaneSegment {
                offset,
                len: seg_len,
                blocks,
            });
            if start == 0 {
                break;
            }
            start -= per_part;
        }
        segments.reverse();
        segments
    }

    /// Reassemble segments produced by [`split`](Self::split) into a plane of
    /// `width` x `height`.
    ///
    /// Fails with [`BitmapError::PlaneMismatch`] when the segments do not tile
    /// the plane exactly.
    pub fn join(
        mut segments: Vec<PlaneSegment>,
        width: usize,
        height: usize,
    ) -> Result<Self, BitmapError> {
        segments.sort_by_key(|s| s.offset);

        let mut plane = NormalizedPlane {
            blocks: Vec::new(),
            width,
            height,
        };
        let expected = plane.len();
        let actual: usize = segments.iter().map(|s| s.len).sum();
        let mut next = 0;
        for seg in &segments {
            if seg.offset != next || seg.blocks.len() * PLANE_ALIGNMENT < seg.len {
                return Err(BitmapError::PlaneMismatch { expected, actual });
            }
            next += seg.blocks.len() * PLANE_ALIGNMENT;
        }
        if actual != expected {
            return Err(BitmapError::PlaneMismatch { expected, actual });
        }

        let total_blocks = aligned_allocation_size(expected)
            .ok_or(BitmapError::PlaneMismatch { expected, actual })?
            / PLANE_ALIGNMENT;
        let mut iter = segments.into_iter();
        let mut blocks = match iter.next() {
            Some(first) => first.blocks,
            None => Vec::new(),
        };
        let extra = total_blocks.saturating_sub(blocks.len());
        blocks
            .try_reserve_exact(extra)
            .map_err(|_| BitmapError::OutOfMemory {
                bytes: total_blocks * PLANE_ALIGNMENT,
            })?;
        for seg in iter {
            blocks.extend_from_slice(&seg.blocks);
        }
        blocks.resize(total_blocks, Block::zeroed());
        plane.blocks = blocks;
        Ok(plane)
    }

    /// View the pixel bytes as typed BGRA pixels.
    #[cfg(feature = "rgb")]
    pub fn as_pixels(&self) -> &[rgb::alt::BGRA<u8>] {
        use rgb::AsPixels as _;
        self.as_bytes().as_pixels()
    }

    /// Zero-copy 2D view of the plane.
    #[cfg(feature = "imgref")]
    pub fn as_imgref(&self) -> imgref::ImgRef<'_, rgb::alt::BGRA<u8>> {
        imgref::ImgRef::new(self.as_pixels(), self.width, self.height)
    }
}

/// A contiguous, aligned byte range of a split [`NormalizedPlane`].
///
/// Segments own their bytes, so each one can be handed to a different worker.
pub struct PlaneSegment {
    offset: usize,
    len: usize,
    blocks: Vec<Block>,
}

impl fmt::Debug for PlaneSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaneSegment")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

impl PlaneSegment {
    /// Byte offset of this segment within the plane.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.blocks)[..self.len]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut bytemuck::cast_slice_mut(&mut self.blocks)[..len]
    }
}

use core::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use enough::{Stop, Unstoppable};

use super::header::{FILE_HEADER_SIZE, FileHeader, InfoHeader};
use super::utils::{OPAQUE, RowGeometry};
use super::{decode, encode};
use crate::error::BitmapError;
use crate::limits::Limits;
use crate::pixel::PixelLayout;
use crate::plane::NormalizedPlane;
use crate::sample;

/// A 24- or 32-bit uncompressed bitmap.
///
/// Holds the headers as read, the raw payload (everything after the headers,
/// including any gap before the pixel array and any trailing bytes), and the
/// normalized BGRA plane that transforms work on. Writing repacks the plane
/// into the payload, so bytes outside the pixel rows are written back exactly
/// as they were read.
///
/// ```no_run
/// use bmpfx::{BmpImage, Limits};
///
/// let mut image = BmpImage::open("in.bmp", &Limits::default())?;
/// for px in image.plane_mut().as_bytes_mut().chunks_exact_mut(4) {
///     px[0] = 255 - px[0];
/// }
/// image.save("out.bmp")?;
/// # Ok::<(), bmpfx::BitmapError>(())
/// ```
pub struct BmpImage {
    pub(crate) file_header: FileHeader,
    pub(crate) info_header: InfoHeader,
    pub(crate) extra_header: Vec<u8>,
    pub(crate) layout: PixelLayout,
    pub(crate) payload: Vec<u8>,
    pub(crate) pixel_start: usize,
    /// Set once the payload has been read.
    pub(crate) geometry: Option<RowGeometry>,
    pub(crate) plane: NormalizedPlane,
}

impl fmt::Debug for BmpImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BmpImage")
            .field("file_header", &self.file_header)
            .field("info_header", &self.info_header)
            .field("extra_header_len", &self.extra_header.len())
            .field("layout", &self.layout)
            .field("payload_len", &self.payload.len())
            .field("pixel_start", &self.pixel_start)
            .field("plane", &self.plane)
            .finish()
    }
}

impl BmpImage {
    pub(crate) fn from_headers(
        file_header: FileHeader,
        info_header: InfoHeader,
        extra_header: Vec<u8>,
        layout: PixelLayout,
    ) -> Self {
        Self {
            file_header,
            info_header,
            extra_header,
            layout,
            payload: Vec::new(),
            pixel_start: 0,
            geometry: None,
            plane: NormalizedPlane::default(),
        }
    }

    pub(crate) fn install_payload(
        &mut self,
        payload: Vec<u8>,
        pixel_start: usize,
        geometry: RowGeometry,
        plane: NormalizedPlane,
    ) {
        self.payload = payload;
        self.pixel_start = pixel_start;
        self.geometry = Some(geometry);
        self.plane = plane;
    }

    /// Create a blank image with a BITMAPINFOHEADER and the pixel array right
    /// after the headers. A negative `height` makes the image top-down.
    ///
    /// All pixels start black; 24-bit images get alpha 255 in the plane. An
    /// image with zero width or height still gets a 4-byte payload so the file
    /// it encodes to decodes again.
    pub fn new(width: u32, height: i32, layout: PixelLayout) -> Result<Self, BitmapError> {
        let (file_header, info_header, geometry) =
            encode::synthesize_headers(width, height, layout)?;
        let payload_len = encode::new_payload_len(&geometry);
        let mut payload = Vec::new();
        payload
            .try_reserve_exact(payload_len)
            .map_err(|_| BitmapError::OutOfMemory { bytes: payload_len })?;
        payload.resize(payload_len, 0);

        let mut plane = NormalizedPlane::new(geometry.width, geometry.height)?;
        if layout == PixelLayout::Bgr8 {
            for px in plane.as_bytes_mut().chunks_exact_mut(4) {
                px[3] = OPAQUE;
            }
        }

        let mut image = Self::from_headers(file_header, info_header, Vec::new(), layout);
        image.install_payload(payload, 0, geometry, plane);
        Ok(image)
    }

    /// First decode phase: read and validate the headers.
    pub fn parse_headers<R: Read>(reader: &mut R, limits: &Limits) -> Result<Self, BitmapError> {
        decode::parse_headers(reader, limits)
    }

    /// Second decode phase: read the payload and build the plane.
    ///
    /// On error the image keeps its headers and holds no payload or plane.
    pub fn read_payload<R: Read>(
        &mut self,
        reader: &mut R,
        limits: &Limits,
        stop: &dyn Stop,
    ) -> Result<(), BitmapError> {
        decode::read_payload(reader, self, limits, stop)
    }

    /// Both decode phases.
    pub fn decode<R: Read>(
        reader: &mut R,
        limits: &Limits,
        stop: &dyn Stop,
    ) -> Result<Self, BitmapError> {
        let mut image = Self::parse_headers(reader, limits)?;
        image.read_payload(reader, limits, stop)?;
        Ok(image)
    }

    /// Decode an in-memory file.
    pub fn from_bytes(data: &[u8], limits: &Limits) -> Result<Self, BitmapError> {
        let mut reader = data;
        Self::decode(&mut reader, limits, &Unstoppable)
    }

    /// Decode a file from disk. Failure to open it is
    /// [`BitmapError::InvalidDescriptor`].
    pub fn open<P: AsRef<Path>>(path: P, limits: &Limits) -> Result<Self, BitmapError> {
        let file = File::open(path).map_err(BitmapError::InvalidDescriptor)?;
        Self::decode(&mut BufReader::new(file), limits, &Unstoppable)
    }

    /// Write both headers.
    pub fn write_headers<W: Write>(&self, writer: &mut W) -> Result<(), BitmapError> {
        encode::write_headers(writer, self)
    }

    /// Repack the plane into the payload and write the payload.
    pub fn write_payload<W: Write>(
        &mut self,
        writer: &mut W,
        stop: &dyn Stop,
    ) -> Result<(), BitmapError> {
        encode::write_payload(writer, self, stop)
    }

    /// Write headers and payload.
    pub fn encode<W: Write>(&mut self, writer: &mut W, stop: &dyn Stop) -> Result<(), BitmapError> {
        self.write_headers(writer)?;
        self.write_payload(writer, stop)
    }

    /// Encode into a new buffer.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, BitmapError> {
        let mut out = Vec::with_capacity(self.header_size() + self.payload.len());
        self.encode(&mut out, &Unstoppable)?;
        Ok(out)
    }

    /// Encode to a file on disk, creating or truncating it. Failure to create
    /// it is [`BitmapError::InvalidDescriptor`].
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), BitmapError> {
        let file = File::create(path).map_err(BitmapError::InvalidDescriptor)?;
        self.encode(&mut BufWriter::new(file), &Unstoppable)
    }

    /// Drop the payload and plane, keeping the headers. Safe to call any
    /// number of times.
    pub fn release(&mut self) {
        self.payload = Vec::new();
        self.plane = NormalizedPlane::default();
        self.geometry = None;
        self.pixel_start = 0;
    }

    /// Whether the payload has been read and the plane is populated.
    pub fn is_loaded(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn info_header(&self) -> &InfoHeader {
        &self.info_header
    }

    /// Info header bytes beyond the 40-byte core, round-tripped verbatim.
    pub fn extra_header(&self) -> &[u8] {
        &self.extra_header
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// 3 for 24-bit images, 4 for 32-bit.
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    pub fn width(&self) -> usize {
        self.info_header.width.unsigned_abs() as usize
    }

    pub fn height(&self) -> usize {
        self.info_header.height.unsigned_abs() as usize
    }

    pub fn is_top_down(&self) -> bool {
        self.info_header.is_top_down()
    }

    /// Padding bytes after each pixel row in the file.
    pub fn row_padding(&self) -> usize {
        self.geometry.map_or(0, |g| g.padding)
    }

    /// Size of the pixel rows in the file, padding included.
    pub fn image_size(&self) -> usize {
        self.geometry.map_or(0, |g| g.image_size)
    }

    /// File header plus declared info header size.
    pub fn header_size(&self) -> usize {
        FILE_HEADER_SIZE + self.info_header.header_size as usize
    }

    pub(crate) fn payload_len_from_headers(&self) -> usize {
        (self.file_header.file_size as usize).saturating_sub(self.header_size())
    }

    /// Everything after the headers, as read (or as last repacked).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The padded pixel rows inside the payload.
    pub fn raw_pixels(&self) -> &[u8] {
        match self.geometry {
            Some(geo) => &self.payload[self.pixel_start..self.pixel_start + geo.image_size],
            None => &[],
        }
    }

    pub fn plane(&self) -> &NormalizedPlane {
        &self.plane
    }

    pub fn plane_mut(&mut self) -> &mut NormalizedPlane {
        &mut self.plane
    }

    /// Move the plane out, leaving an empty one. Put it back with
    /// [`replace_plane`](Self::replace_plane) before writing.
    pub fn take_plane(&mut self) -> NormalizedPlane {
        core::mem::take(&mut self.plane)
    }

    /// Install a plane, which must have this image's dimensions.
    pub fn replace_plane(&mut self, plane: NormalizedPlane) -> Result<(), BitmapError> {
        let expected = self.geometry.map_or(0, |g| g.plane_len());
        if plane.width() != self.width() || plane.height() != self.height() {
            return Err(BitmapError::PlaneMismatch {
                expected,
                actual: plane.len(),
            });
        }
        self.plane = plane;
        Ok(())
    }

    /// Plane pixel at the edge-clamped `(x, y)`. An image with no pixels reads
    /// as a zero pixel.
    pub fn sample(&self, x: isize, y: isize) -> &[u8; 4] {
        self.plane.sample(x, y)
    }

    /// File pixel (3 or 4 bytes) at the edge-clamped `(x, y)` of the raw pixel
    /// rows, zeros when the image has no pixels or none are loaded.
    pub fn sample_raw(&self, x: isize, y: isize) -> &[u8] {
        let raw = self.raw_pixels();
        let (width, height) = if raw.is_empty() {
            (0, 0)
        } else {
            (self.width(), self.height())
        };
        sample::sample_raw(
            raw,
            x,
            y,
            width,
            height,
            self.channels(),
            self.row_padding(),
        )
    }
}

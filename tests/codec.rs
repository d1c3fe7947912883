use bmpfx::*;

// ── Fixture builders ─────────────────────────────────────────────────

fn noise_pattern(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

/// Hand-assembled BMP file. `rows` is the padded pixel array as it sits on disk.
struct Fixture {
    width: i32,
    height: i32,
    bits: u16,
    compression: u32,
    info_size: u32,
    gap: usize,
    trailing: usize,
    rows: Vec<u8>,
}

impl Fixture {
    fn new(width: i32, height: i32, bits: u16) -> Self {
        let channels = usize::from(bits / 8).max(1);
        let row = width.unsigned_abs() as usize * channels;
        let stride = row.div_ceil(4) * 4;
        let len = stride * height.unsigned_abs() as usize;
        Self {
            width,
            height,
            bits,
            compression: 0,
            info_size: 40,
            gap: 0,
            trailing: 0,
            rows: noise_pattern(len, 0xDEAD_BEEF ^ (width as u32) ^ ((height as u32) << 8)),
        }
    }

    fn header_size(&self) -> usize {
        14 + self.info_size as usize
    }

    fn pixel_offset(&self) -> u32 {
        (self.header_size() + self.gap) as u32
    }

    fn file_size(&self) -> u32 {
        (self.header_size() + self.gap + self.rows.len() + self.trailing) as u32
    }

    fn build_with(&self, file_size: u32, pixel_offset: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&file_size.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&pixel_offset.to_le_bytes());

        out.extend_from_slice(&self.info_size.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&self.bits.to_le_bytes());
        out.extend_from_slice(&self.compression.to_le_bytes());
        out.extend_from_slice(&(self.rows.len() as u32).to_le_bytes());
        out.extend_from_slice(&2835i32.to_le_bytes());
        out.extend_from_slice(&2835i32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        // Extended header fields: recognisable non-zero bytes.
        let extra = (self.info_size as usize).saturating_sub(40);
        out.extend((0..extra).map(|i| (i as u8).wrapping_mul(3).wrapping_add(1)));

        out.extend(std::iter::repeat_n(0xAB, self.gap));
        out.extend_from_slice(&self.rows);
        out.extend(std::iter::repeat_n(0xCD, self.trailing));
        out
    }

    fn build(&self) -> Vec<u8> {
        self.build_with(self.file_size(), self.pixel_offset())
    }
}

fn decode(data: &[u8]) -> Result<BmpImage, BitmapError> {
    BmpImage::from_bytes(data, &Limits::default())
}

// ── Round trips ──────────────────────────────────────────────────────

#[test]
fn bgra32_roundtrip_is_byte_exact() {
    for (w, h) in [(1, 1), (5, 3), (64, 2), (7, -9)] {
        let file = Fixture::new(w, h, 32).build();
        let mut image = decode(&file).unwrap();
        assert_eq!(image.layout(), PixelLayout::Bgra8);
        assert_eq!(image.channels(), 4);
        assert_eq!(image.row_padding(), 0);
        assert_eq!(image.is_top_down(), h < 0);
        // 32-bit rows have no padding, so the plane is the pixel array.
        assert_eq!(image.plane().as_bytes(), image.raw_pixels());
        assert_eq!(image.to_bytes().unwrap(), file, "{w}x{h}");
    }
}

#[test]
fn bgr24_expands_alpha_and_roundtrips_with_padding() {
    for w in [1, 2, 3, 4, 5, 31, 33] {
        let fixture = Fixture::new(w, 3, 24);
        let file = fixture.build();
        let mut image = decode(&file).unwrap();
        assert_eq!(image.layout(), PixelLayout::Bgr8);
        assert_eq!(image.row_padding(), (4 - (w as usize * 3) % 4) % 4);

        let stride = w as usize * 3 + image.row_padding();
        for (y, row) in image.plane().rows().enumerate() {
            let src = &fixture.rows[y * stride..];
            for (x, px) in row.chunks_exact(4).enumerate() {
                assert_eq!(&px[..3], &src[x * 3..x * 3 + 3]);
                assert_eq!(px[3], 255);
            }
        }

        // Padding bytes hold noise; they must survive untouched.
        assert_eq!(image.to_bytes().unwrap(), file, "width {w}");
    }
}

#[test]
fn extended_header_gap_and_trailing_bytes_survive() {
    let mut fixture = Fixture::new(6, 4, 24);
    fixture.info_size = 124;
    fixture.gap = 10;
    fixture.trailing = 7;
    let file = fixture.build();

    let mut image = decode(&file).unwrap();
    assert_eq!(image.header_size(), 138);
    assert_eq!(image.extra_header().len(), 84);
    assert_eq!(image.extra_header()[0], 1);
    assert_eq!(image.raw_pixels(), &fixture.rows[..]);
    assert_eq!(image.payload().len(), 10 + fixture.rows.len() + 7);
    assert_eq!(image.to_bytes().unwrap(), file);
}

const BGRA_MASKS: [u32; 4] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000];

fn put_masks(file: &mut [u8], at: usize, masks: &[u32]) {
    for (i, m) in masks.iter().enumerate() {
        file[at + i * 4..at + i * 4 + 4].copy_from_slice(&m.to_le_bytes());
    }
}

#[test]
fn bitfields_compression_is_accepted() {
    // Masks inside a V3 header.
    let mut fixture = Fixture::new(3, 3, 32);
    fixture.compression = 3;
    fixture.info_size = 56;
    let mut file = fixture.build();
    put_masks(&mut file, 54, &BGRA_MASKS);
    let mut image = decode(&file).unwrap();
    assert_eq!(image.to_bytes().unwrap(), file);

    // Masks after a bare 40-byte header, alpha mask included for tag 6.
    let mut fixture = Fixture::new(3, 3, 32);
    fixture.compression = 6;
    fixture.gap = 16;
    let mut file = fixture.build();
    put_masks(&mut file, 54, &BGRA_MASKS);
    let mut image = decode(&file).unwrap();
    assert_eq!(image.to_bytes().unwrap(), file);

    // An absent alpha mask is fine too.
    let mut fixture = Fixture::new(3, 3, 32);
    fixture.compression = 3;
    fixture.gap = 12;
    let mut file = fixture.build();
    put_masks(&mut file, 54, &BGRA_MASKS[..3]);
    decode(&file).unwrap();
}

#[test]
fn reordered_bitfields_are_rejected() {
    let mut fixture = Fixture::new(3, 3, 32);
    fixture.compression = 3;
    fixture.info_size = 56;
    let mut file = fixture.build();
    // R and B swapped: pixels are RGBA, not BGRA.
    let swapped = [0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000];
    put_masks(&mut file, 54, &swapped);
    assert!(matches!(
        decode(&file),
        Err(BitmapError::UnsupportedBitfields(m)) if m == swapped
    ));

    // Bitfields tag on a bare header with no masks before the pixels.
    let mut fixture = Fixture::new(3, 3, 32);
    fixture.compression = 3;
    let err = decode(&fixture.build()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedBitfields);
}

#[test]
fn edits_reach_the_file() {
    let fixture = Fixture::new(2, 2, 24);
    let file = fixture.build();
    let mut image = decode(&file).unwrap();
    image.plane_mut().sample_mut(1, 0).copy_from_slice(&[1, 2, 3, 4]);
    let out = image.to_bytes().unwrap();

    // Alpha is dropped for 24-bit output; only the second pixel of row 0 changes.
    let pixels = &out[54..];
    assert_eq!(&pixels[3..6], &[1, 2, 3]);
    assert_eq!(&pixels[..3], &fixture.rows[..3]);
    assert_eq!(&pixels[6..], &fixture.rows[6..]);
}

#[test]
fn new_image_roundtrips() {
    for layout in [PixelLayout::Bgr8, PixelLayout::Bgra8] {
        let mut image = BmpImage::new(13, -4, layout).unwrap();
        assert!(image.is_top_down());
        for (i, b) in image.plane_mut().as_bytes_mut().iter_mut().enumerate() {
            if i % 4 != 3 {
                *b = i as u8;
            }
        }
        let bytes = image.to_bytes().unwrap();
        assert_eq!(&bytes[..2], b"BM");
        assert_eq!(bytes.len(), image.file_header().file_size as usize);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.width(), 13);
        assert_eq!(decoded.height(), 4);
        assert_eq!(decoded.layout(), layout);
        assert_eq!(decoded.plane().as_bytes(), image.plane().as_bytes());
    }
}

#[test]
fn zero_dimensions_are_accepted() {
    for (w, h) in [(0, 5), (5, 0)] {
        let mut fixture = Fixture::new(w, h, 24);
        fixture.trailing = 4;
        let file = fixture.build();
        let mut image = decode(&file).unwrap();
        assert!(image.is_loaded());
        assert!(image.plane().is_empty());
        assert_eq!(image.image_size(), 0);
        assert_eq!(image.sample(-5, 0), &[0; 4]);
        assert_eq!(image.sample(isize::MAX, isize::MIN), &[0; 4]);
        assert_eq!(image.sample_raw(3, 3), &[0; 3]);
        assert_eq!(image.to_bytes().unwrap(), file);
    }
}

#[test]
fn new_empty_image_roundtrips() {
    for (w, h) in [(0, 3), (3, 0), (0, -2)] {
        for layout in [PixelLayout::Bgr8, PixelLayout::Bgra8] {
            let mut image = BmpImage::new(w, h, layout).unwrap();
            assert_eq!(image.sample(1, 1), &[0; 4]);
            let bytes = image.to_bytes().unwrap();
            assert!(bytes.len() > 54);
            assert_eq!(bytes.len(), image.file_header().file_size as usize);

            let mut decoded = decode(&bytes).unwrap();
            assert_eq!(decoded.width(), w as usize);
            assert_eq!(decoded.height(), h.unsigned_abs() as usize);
            assert!(decoded.plane().is_empty());
            assert_eq!(decoded.to_bytes().unwrap(), bytes);
        }
    }
}

#[test]
fn open_and_save() {
    let dir = std::env::temp_dir().join(format!("bmpfx-codec-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let src = dir.join("in.bmp");
    let dst = dir.join("out.bmp");

    let file = Fixture::new(9, 5, 24).build();
    std::fs::write(&src, &file).unwrap();
    let mut image = BmpImage::open(&src, &Limits::default()).unwrap();
    image.save(&dst).unwrap();
    assert_eq!(std::fs::read(&dst).unwrap(), file);

    let missing = BmpImage::open(dir.join("missing.bmp"), &Limits::default()).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::InvalidDescriptor);
    let unwritable = image.save(dir.join("no-such-dir").join("x.bmp")).unwrap_err();
    assert_eq!(unwritable.kind(), ErrorKind::InvalidDescriptor);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn two_phase_decode() {
    let file = Fixture::new(4, 4, 32).build();
    let mut reader = &file[..];
    let mut image = BmpImage::parse_headers(&mut reader, &Limits::default()).unwrap();
    assert_eq!(image.width(), 4);
    assert!(!image.is_loaded());
    assert!(image.plane().is_empty());

    image
        .read_payload(&mut reader, &Limits::default(), &Unstoppable)
        .unwrap();
    assert!(image.is_loaded());
    assert_eq!(image.plane().len(), 64);
}

// ── Write failures and cancellation ──────────────────────────────────

/// Accepts `budget` bytes, then fails every write.
struct ShortWriter {
    budget: usize,
    written: Vec<u8>,
}

impl ShortWriter {
    fn new(budget: usize) -> Self {
        Self {
            budget,
            written: Vec::new(),
        }
    }
}

impl std::io::Write for ShortWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.budget == 0 {
            return Err(std::io::Error::other("device full"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct Cancelled;

impl Stop for Cancelled {
    fn check(&self) -> Result<(), StopReason> {
        Err(StopReason::Cancelled)
    }
}

#[test]
fn header_write_failures() {
    let mut image = decode(&Fixture::new(4, 4, 24).build()).unwrap();

    let mut out = ShortWriter::new(0);
    let err = image.encode(&mut out, &Unstoppable).unwrap_err();
    assert!(matches!(err, BitmapError::HeaderWriteFailure(HeaderPart::File, _)), "{err}");

    // File header fits, info header does not.
    let mut out = ShortWriter::new(14);
    let err = image.encode(&mut out, &Unstoppable).unwrap_err();
    assert!(matches!(err, BitmapError::HeaderWriteFailure(HeaderPart::Info, _)), "{err}");
    assert_eq!(err.kind(), ErrorKind::HeaderWriteFailure);
    assert_eq!(out.written.len(), 14);
}

#[test]
fn payload_write_failure() {
    let file = Fixture::new(4, 4, 24).build();
    let mut image = decode(&file).unwrap();
    let mut out = ShortWriter::new(60);
    let err = image.encode(&mut out, &Unstoppable).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImageWriteFailure);
    assert_eq!(out.written, &file[..60]);

    // The image is still usable.
    assert_eq!(image.to_bytes().unwrap(), file);
}

#[test]
fn stop_cancels_decode_and_encode() {
    let file = Fixture::new(5, 20, 32).build();
    let mut reader = &file[..];
    let err = BmpImage::decode(&mut reader, &Limits::default(), &Cancelled).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(matches!(err, BitmapError::Cancelled(StopReason::Cancelled)));

    let mut image = decode(&file).unwrap();
    let mut out = Vec::new();
    image.write_headers(&mut out).unwrap();
    let err = image.write_payload(&mut out, &Cancelled).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(out.len(), 54);
}

// ── Rejections ───────────────────────────────────────────────────────

#[test]
fn unsupported_depths() {
    for bits in [1u16, 4, 8, 16] {
        let err = decode(&Fixture::new(4, 4, bits).build()).unwrap_err();
        assert!(
            matches!(err, BitmapError::UnsupportedDepth(b) if b == bits),
            "{bits}: {err}"
        );
    }
}

#[test]
fn bad_signature() {
    let mut file = Fixture::new(2, 2, 32).build();
    file[..2].copy_from_slice(b"PM");
    assert!(matches!(decode(&file), Err(BitmapError::BadSignature(s)) if &s == b"PM"));
}

#[test]
fn truncated_headers() {
    let file = Fixture::new(2, 2, 32).build();
    let err = decode(&file[..10]).unwrap_err();
    assert!(matches!(err, BitmapError::HeaderReadFailure(HeaderPart::File, _)));
    let err = decode(&file[..30]).unwrap_err();
    assert!(matches!(err, BitmapError::HeaderReadFailure(HeaderPart::Info, _)));

    let mut fixture = Fixture::new(2, 2, 32);
    fixture.info_size = 108;
    let file = fixture.build();
    let err = decode(&file[..80]).unwrap_err();
    assert!(matches!(err, BitmapError::HeaderReadFailure(HeaderPart::Extra, _)));
}

#[test]
fn truncated_payload() {
    let file = Fixture::new(8, 8, 24).build();
    let err = decode(&file[..file.len() - 5]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PayloadReadFailure);
}

#[test]
fn header_size_bounds() {
    let mut fixture = Fixture::new(2, 2, 32);
    fixture.info_size = 40 + DEFAULT_MAX_EXTRA_HEADER_BYTES as u32 + 1;
    let err = decode(&fixture.build()).unwrap_err();
    assert!(matches!(err, BitmapError::OversizedHeader { extra: 257, max: 256 }));

    // Exactly at the cap is fine.
    fixture.info_size = 40 + DEFAULT_MAX_EXTRA_HEADER_BYTES as u32;
    decode(&fixture.build()).unwrap();

    let mut file = Fixture::new(2, 2, 32).build();
    file[14..18].copy_from_slice(&12u32.to_le_bytes());
    assert!(matches!(decode(&file), Err(BitmapError::UndersizedHeader(12))));
}

#[test]
fn unsupported_compression() {
    let mut fixture = Fixture::new(2, 2, 24);
    fixture.compression = 1;
    assert!(matches!(
        decode(&fixture.build()),
        Err(BitmapError::UnsupportedCompression(1))
    ));
}

#[test]
fn file_size_not_larger_than_headers() {
    let fixture = Fixture::new(2, 2, 32);
    for file_size in [0, 14, 54] {
        let file = fixture.build_with(file_size, 54);
        let err = decode(&file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSizeInformation, "{file_size}");
    }
}

#[test]
fn pixel_offset_outside_payload() {
    let fixture = Fixture::new(2, 2, 32);
    // Before the end of the headers.
    let file = fixture.build_with(fixture.file_size(), 20);
    assert!(matches!(decode(&file), Err(BitmapError::InvalidPixelOffset { offset: 20, .. })));
    // At or past the end of the file.
    let end = fixture.file_size();
    let file = fixture.build_with(end, end);
    assert_eq!(decode(&file).unwrap_err().kind(), ErrorKind::InvalidPixelOffset);
}

#[test]
fn pixel_rows_overrun_payload() {
    let fixture = Fixture::new(5, 5, 24);
    let mut file = fixture.build();
    // Claim a taller image than the file holds.
    file[22..26].copy_from_slice(&9i32.to_le_bytes());
    let err = decode(&file).unwrap_err();
    assert!(matches!(
        err,
        BitmapError::PaddingCalculationFailure { needed: 144, available: 80 }
    ));

    // A pixel offset that leaves too little room.
    let file = fixture.build_with(fixture.file_size(), fixture.pixel_offset() + 4);
    assert_eq!(decode(&file).unwrap_err().kind(), ErrorKind::PaddingCalculationFailure);
}

#[test]
fn limits_are_enforced() {
    let file = Fixture::new(50, 20, 32).build();
    let limits = Limits {
        max_width: Some(49),
        ..Default::default()
    };
    let err = BmpImage::from_bytes(&file, &limits).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);

    let limits = Limits {
        max_memory_bytes: Some(1000),
        ..Default::default()
    };
    let err = BmpImage::from_bytes(&file, &limits).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);

    let limits = Limits {
        max_extra_header_bytes: 0,
        ..Default::default()
    };
    let mut fixture = Fixture::new(2, 2, 32);
    fixture.info_size = 41;
    let err = BmpImage::from_bytes(&fixture.build(), &limits).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OversizedHeader);
}

// ── Plane handling ───────────────────────────────────────────────────

#[test]
fn plane_is_aligned_with_slack() {
    let image = decode(&Fixture::new(3, 3, 24).build()).unwrap();
    let plane = image.plane();
    assert_eq!(plane.len(), 36);
    assert_eq!(plane.allocated_len(), 128);
    assert_eq!(plane.allocation().as_ptr() as usize % PLANE_ALIGNMENT, 0);
    assert!(plane.allocation()[36..].iter().all(|&b| b == 0));
}

#[test]
fn take_and_replace_plane() {
    let file = Fixture::new(4, 3, 32).build();
    let mut image = decode(&file).unwrap();
    let plane = image.take_plane();
    assert!(image.plane().is_empty());
    assert_eq!(image.to_bytes().unwrap_err().kind(), ErrorKind::PlaneMismatch);

    let wrong = NormalizedPlane::new(3, 4).unwrap();
    assert_eq!(image.replace_plane(wrong).unwrap_err().kind(), ErrorKind::PlaneMismatch);

    image.replace_plane(plane).unwrap();
    assert_eq!(image.to_bytes().unwrap(), file);
}

#[test]
fn release_is_idempotent() {
    let mut image = decode(&Fixture::new(4, 4, 24).build()).unwrap();
    image.release();
    image.release();
    assert!(!image.is_loaded());
    assert!(image.payload().is_empty());
    assert!(image.raw_pixels().is_empty());
    assert!(image.plane().is_empty());
    // Headers stay readable.
    assert_eq!(image.width(), 4);
    assert_eq!(image.to_bytes().unwrap_err().kind(), ErrorKind::PlaneMismatch);
}

// ── Clamped addressing ───────────────────────────────────────────────

#[test]
fn sample_clamps_to_edges() {
    let image = decode(&Fixture::new(7, 5, 24).build()).unwrap();
    let (w, h) = (image.width() as isize, image.height() as isize);
    for y in 0..h {
        assert!(std::ptr::eq(image.sample(-5, y), image.sample(0, y)));
        assert!(std::ptr::eq(image.sample(w + 5, y), image.sample(w - 1, y)));
        assert!(std::ptr::eq(
            image.sample_raw(-5, y).as_ptr(),
            image.sample_raw(0, y).as_ptr()
        ));
        assert!(std::ptr::eq(
            image.sample_raw(w + 5, y).as_ptr(),
            image.sample_raw(w - 1, y).as_ptr()
        ));
    }
    assert!(std::ptr::eq(image.sample(3, -2), image.sample(3, 0)));
    assert!(std::ptr::eq(image.sample(3, h + 2), image.sample(3, h - 1)));
}

#[test]
fn sample_raw_matches_plane() {
    let image = decode(&Fixture::new(6, 4, 24).build()).unwrap();
    for y in 0..4 {
        for x in 0..6 {
            let raw = image.sample_raw(x, y);
            assert_eq!(raw.len(), 3);
            assert_eq!(raw, &image.sample(x, y)[..3]);
        }
    }
}

#[test]
fn errors_display() {
    let err = decode(&Fixture::new(2, 2, 8).build()).unwrap_err();
    assert!(err.to_string().contains('8'));
    let err = decode(&[]).unwrap_err();
    assert!(err.to_string().contains("bitmap file header"), "{err}");
}

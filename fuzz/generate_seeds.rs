#!/usr/bin/env -S cargo +nightly -Zscript
//! Generate seed corpus files for fuzzing.
//! Run: cargo +nightly -Zscript fuzz/generate_seeds.rs

fn bmp(width: i32, height: i32, bits: u16, info_size: u32, gap: usize) -> Vec<u8> {
    let channels = usize::from(bits / 8);
    let stride = (width.unsigned_abs() as usize * channels).div_ceil(4) * 4;
    let image_size = stride * height.unsigned_abs() as usize;
    let offset = 14 + info_size as usize + gap;
    let file_size = offset + image_size;

    let mut out = vec![0u8; file_size];
    out[0] = b'B'; out[1] = b'M';
    out[2..6].copy_from_slice(&(file_size as u32).to_le_bytes()); // file size
    out[10..14].copy_from_slice(&(offset as u32).to_le_bytes()); // data offset
    out[14..18].copy_from_slice(&info_size.to_le_bytes()); // DIB header size
    out[18..22].copy_from_slice(&width.to_le_bytes());
    out[22..26].copy_from_slice(&height.to_le_bytes());
    out[26..28].copy_from_slice(&1u16.to_le_bytes()); // planes
    out[28..30].copy_from_slice(&bits.to_le_bytes()); // bpp
    out[34..38].copy_from_slice(&(image_size as u32).to_le_bytes());
    for (i, b) in out[offset..].iter_mut().enumerate() {
        *b = (i * 37) as u8;
    }
    out
}

fn main() {
    use std::fs;
    let dir = "fuzz/corpus/fuzz_decode";
    fs::create_dir_all(dir).unwrap();

    fs::write(format!("{dir}/bgr_1x1.bmp"), bmp(1, 1, 24, 40, 0)).unwrap();
    fs::write(format!("{dir}/bgr_5x3.bmp"), bmp(5, 3, 24, 40, 0)).unwrap();
    fs::write(format!("{dir}/bgra_4x4_topdown.bmp"), bmp(4, -4, 32, 40, 0)).unwrap();
    fs::write(format!("{dir}/bgra_v5_gap.bmp"), bmp(3, 2, 32, 124, 6)).unwrap();

    // Truncated/malformed seeds for edge coverage
    fs::write(format!("{dir}/empty.bin"), b"").unwrap();
    fs::write(format!("{dir}/bm_short.bin"), b"BM\x00\x00").unwrap();
    let mut pal8 = bmp(4, 4, 8, 40, 0);
    pal8[28] = 8;
    fs::write(format!("{dir}/pal8.bmp"), pal8).unwrap();

    println!("Generated seed corpus in {dir}/");
}

#![no_main]
use bmpfx::{BmpImage, Limits};
use enough::Unstoppable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        max_memory_bytes: Some(1 << 26),
        ..Default::default()
    };
    // Must never panic, whatever the input.
    let mut reader = data;
    let Ok(image) = BmpImage::decode(&mut reader, &limits, &Unstoppable) else {
        return;
    };
    let (w, h) = (image.width() as isize, image.height() as isize);
    for (x, y) in [(-1, -1), (w, h), (w / 2, h / 2), (isize::MIN, isize::MAX)] {
        let _ = image.sample(x, y);
        let _ = image.sample_raw(x, y);
    }
});

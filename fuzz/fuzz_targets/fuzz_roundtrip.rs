#![no_main]
use bmpfx::{BmpImage, Limits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        max_memory_bytes: Some(1 << 26),
        ..Default::default()
    };
    // Anything that decodes must re-encode to a file that decodes to the same plane.
    let Ok(mut image) = BmpImage::from_bytes(data, &limits) else {
        return;
    };
    let encoded = image.to_bytes().expect("decoded image failed to encode");
    let Ok(mut decoded) = BmpImage::from_bytes(&encoded, &limits) else {
        panic!("re-encoded data failed to decode");
    };

    assert_eq!(image.plane().as_bytes(), decoded.plane().as_bytes(), "roundtrip pixel mismatch");
    assert_eq!(image.width(), decoded.width());
    assert_eq!(image.height(), decoded.height());
    assert_eq!(decoded.to_bytes().expect("second encode failed"), encoded);
});

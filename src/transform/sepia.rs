use super::{Kernel, LANES, PixelTransform};

/// Output channel weights over `(b, g, r)` input, one row per output channel
/// in BGR order.
const WEIGHTS: [[f32; 3]; 3] = [
    [0.272, 0.534, 0.131],
    [0.349, 0.686, 0.168],
    [0.393, 0.769, 0.189],
];

/// Classic sepia tone. Each output channel is a weighted sum of the input
/// colour channels, capped at 255. Alpha is left alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sepia {
    kernel: Kernel,
}

impl Sepia {
    pub fn new(kernel: Kernel) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }
}

impl PixelTransform for Sepia {
    fn name(&self) -> &'static str {
        "sepia"
    }

    fn apply(&self, pixels: &mut [u8]) {
        match self.kernel {
            Kernel::Scalar => sepia_scalar(pixels),
            Kernel::Wide => sepia_wide(pixels),
        }
    }
}

#[inline(always)]
fn weigh(row: &[f32; 3], b: f32, g: f32, r: f32) -> u8 {
    (row[0] * b + row[1] * g + row[2] * r).min(255.0) as u8
}

fn sepia_scalar(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let (b, g, r) = (f32::from(px[0]), f32::from(px[1]), f32::from(px[2]));
        px[0] = weigh(&WEIGHTS[0], b, g, r);
        px[1] = weigh(&WEIGHTS[1], b, g, r);
        px[2] = weigh(&WEIGHTS[2], b, g, r);
    }
}

fn sepia_wide(pixels: &mut [u8]) {
    let mut chunks = pixels.chunks_exact_mut(LANES * 4);
    for chunk in &mut chunks {
        let b: [f32; LANES] = core::array::from_fn(|i| f32::from(chunk[i * 4]));
        let g: [f32; LANES] = core::array::from_fn(|i| f32::from(chunk[i * 4 + 1]));
        let r: [f32; LANES] = core::array::from_fn(|i| f32::from(chunk[i * 4 + 2]));

        let out: [[u8; LANES]; 3] =
            core::array::from_fn(|c| core::array::from_fn(|i| weigh(&WEIGHTS[c], b[i], g[i], r[i])));

        for (i, px) in chunk.chunks_exact_mut(4).enumerate() {
            px[0] = out[0][i];
            px[1] = out[1][i];
            px[2] = out[2][i];
        }
    }
    sepia_scalar(chunks.into_remainder());
}

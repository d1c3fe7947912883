use super::{Kernel, LANES, PixelTransform};

/// Affine colour adjustment: `c' = clamp(c * contrast + brightness, 0, 255)`
/// on blue, green and red. Alpha is left alone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrightnessContrast {
    brightness: f32,
    contrast: f32,
    kernel: Kernel,
}

impl BrightnessContrast {
    pub fn new(brightness: f32, contrast: f32, kernel: Kernel) -> Self {
        Self {
            brightness,
            contrast,
            kernel,
        }
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    #[inline(always)]
    fn adjust(&self, c: u8) -> u8 {
        (f32::from(c) * self.contrast + self.brightness).clamp(0.0, 255.0) as u8
    }

    fn apply_scalar(&self, pixels: &mut [u8]) {
        for px in pixels.chunks_exact_mut(4) {
            for c in &mut px[..3] {
                *c = self.adjust(*c);
            }
        }
    }

    fn apply_wide(&self, pixels: &mut [u8]) {
        let mut chunks = pixels.chunks_exact_mut(LANES * 4);
        for chunk in &mut chunks {
            let lanes: [u8; LANES * 4] = core::array::from_fn(|i| {
                if i % 4 == 3 {
                    chunk[i]
                } else {
                    self.adjust(chunk[i])
                }
            });
            chunk.copy_from_slice(&lanes);
        }
        self.apply_scalar(chunks.into_remainder());
    }
}

impl PixelTransform for BrightnessContrast {
    fn name(&self) -> &'static str {
        "brightness-contrast"
    }

    fn apply(&self, pixels: &mut [u8]) {
        match self.kernel {
            Kernel::Scalar => self.apply_scalar(pixels),
            Kernel::Wide => self.apply_wide(pixels),
        }
    }
}

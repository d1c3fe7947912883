//! Per-pixel transforms over the normalized BGRA plane.
//!
//! A transform is a function over a byte range whose length is a multiple of
//! 4. [`apply`] runs it over a whole image on the calling thread;
//! [`apply_parallel`] splits the plane into aligned segments and fans them out
//! over a [`WorkerPool`].

mod brightness;
mod sepia;

pub use brightness::BrightnessContrast;
pub use sepia::Sepia;

use std::sync::{Arc, Mutex};

use log::trace;

use crate::bmp::BmpImage;
use crate::error::PoolError;
use crate::plane::{NormalizedPlane, PlaneSegment};
use crate::pool::{CountdownLatch, WorkerPool};

/// Pixels per step of the [`Kernel::Wide`] loops.
pub(crate) const LANES: usize = 4;

/// An in-place operation on BGRA pixels.
///
/// `apply` receives whole pixels (the length is a multiple of 4) and must not
/// touch the alpha byte.
pub trait PixelTransform: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn apply(&self, pixels: &mut [u8]);
}

/// Which implementation of a transform to run. Both give identical output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// One pixel at a time.
    #[default]
    Scalar,
    /// Four pixels (16 bytes) per step on fixed-size arrays, which the compiler
    /// can keep in vector registers. The tail goes through the scalar path.
    Wide,
}

impl Kernel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kernel::Scalar => "scalar",
            Kernel::Wide => "wide",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scalar" => Some(Kernel::Scalar),
            "wide" => Some(Kernel::Wide),
            _ => None,
        }
    }
}

/// Run `transform` over the whole plane on the calling thread.
pub fn apply<T: PixelTransform + ?Sized>(image: &mut BmpImage, transform: &T) {
    trace!("applying {} to {}x{}", transform.name(), image.width(), image.height());
    transform.apply(image.plane_mut().as_bytes_mut());
}

/// Run `transform` over the plane with one task per pool worker and wait for
/// all of them.
///
/// The plane is moved out of the image for the duration. If a task panics its
/// segment is lost, the result is [`PoolError::TaskFailed`], and the image is
/// left with an empty plane.
pub fn apply_parallel<T>(
    pool: &WorkerPool,
    image: &mut BmpImage,
    transform: Arc<T>,
) -> Result<(), PoolError>
where
    T: PixelTransform + ?Sized + 'static,
{
    let plane = image.take_plane();
    let (width, height) = (plane.width(), plane.height());
    if plane.is_empty() {
        *image.plane_mut() = plane;
        return Ok(());
    }

    let segments = plane.split(pool.size());
    let expected = segments.len();
    trace!(
        "applying {} to {width}x{height} in {expected} segment(s)",
        transform.name()
    );

    let latch = Arc::new(CountdownLatch::new(expected));
    let finished = Arc::new(Mutex::new(Vec::with_capacity(expected)));
    for segment in segments {
        let transform = Arc::clone(&transform);
        let finished = Arc::clone(&finished);
        let done = latch.guard();
        pool.submit(
            move |mut segment: PlaneSegment| {
                transform.apply(segment.as_bytes_mut());
                segment
            },
            segment,
            Some(Box::new(move |segment: PlaneSegment| {
                if let Ok(mut finished) = finished.lock() {
                    finished.push(segment);
                }
                drop(done);
            })),
        )?;
    }
    latch.wait()?;

    let segments = core::mem::take(&mut *finished.lock().map_err(|_| PoolError::Poisoned)?);
    if segments.len() != expected {
        return Err(PoolError::TaskFailed {
            lost: expected - segments.len(),
        });
    }
    let plane = NormalizedPlane::join(segments, width, height)?;
    image.replace_plane(plane)?;
    Ok(())
}

//! Scharr gradient magnitude with border clamping.
//!
//! Only the magnitude is needed by the pooled features, so no orientation
//! buffers are kept.
use crate::image::{ImageF32, ImageView, ImageViewMut};

type Kernel3 = [[f32; 3]; 3];

const SCHARR_KERNEL_X: Kernel3 = [[-3.0, 0.0, 3.0], [-10.0, 0.0, 10.0], [-3.0, 0.0, 3.0]];
const SCHARR_KERNEL_Y: Kernel3 = [[-3.0, -10.0, -3.0], [0.0, 0.0, 0.0], [3.0, 10.0, 3.0]];

/// Largest response of the Scharr pair on a `[0, 1]` image (a unit step).
pub const SCHARR_MAX_RESPONSE: f32 = 16.0 * std::f32::consts::SQRT_2;

/// Per-pixel `sqrt(gx^2 + gy^2)` of the Scharr kernels.
pub fn scharr_magnitude(l: &ImageF32) -> ImageF32 {
    let (w, h) = (l.w, l.h);
    let mut mag = ImageF32::new(w, h);
    if w == 0 || h == 0 {
        return mag;
    }

    for y in 0..h {
        let rows = [
            l.row(y.saturating_sub(1)),
            l.row(y),
            l.row((y + 1).min(h - 1)),
        ];
        let out = mag.row_mut(y);
        for (x, px) in out.iter_mut().enumerate() {
            let xs = [x.saturating_sub(1), x, (x + 1).min(w - 1)];
            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, row) in rows.iter().enumerate() {
                for (kx, &sx) in xs.iter().enumerate() {
                    sum_x += row[sx] * SCHARR_KERNEL_X[ky][kx];
                    sum_y += row[sx] * SCHARR_KERNEL_Y[ky][kx];
                }
            }
            *px = (sum_x * sum_x + sum_y * sum_y).sqrt();
        }
    }
    mag
}

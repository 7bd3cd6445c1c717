//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Input frames are converted once into this format (values in `[0, 1]`) and
//! resampled per scan level by the feature extractors.
use super::traits::{ImageView, ImageViewMut};
use super::ImageU8;
use crate::pyramid::Dims;

#[derive(Clone, Debug)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0.0; w * h],
        }
    }

    /// Convert an 8-bit frame to `[0, 1]` floats.
    pub fn from_u8(gray: ImageU8<'_>) -> Self {
        let mut out = Self::new(gray.w, gray.h);
        for y in 0..gray.h {
            let src = gray.row(y);
            let dst = out.row_mut(y);
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = s as f32 / 255.0;
            }
        }
        out
    }

    pub fn dims(&self) -> Dims {
        Dims::new(self.w, self.h)
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Bilinear resample to `dims` with pixel-center alignment and clamped
    /// borders. Returns a copy when the size already matches.
    pub fn resize_bilinear(&self, dims: Dims) -> ImageF32 {
        if dims.w == self.w && dims.h == self.h {
            return self.clone();
        }
        let mut out = ImageF32::new(dims.w, dims.h);
        if self.w == 0 || self.h == 0 || dims.w == 0 || dims.h == 0 {
            return out;
        }
        let sx_ratio = self.w as f32 / dims.w as f32;
        let sy_ratio = self.h as f32 / dims.h as f32;
        let max_x = (self.w - 1) as f32;
        let max_y = (self.h - 1) as f32;
        for y in 0..dims.h {
            let fy = ((y as f32 + 0.5) * sy_ratio - 0.5).clamp(0.0, max_y);
            let y0 = fy.floor() as usize;
            let y1 = (y0 + 1).min(self.h - 1);
            let ty = fy - y0 as f32;
            let row0 = self.row(y0);
            let row1 = self.row(y1);
            let dst = out.row_mut(y);
            for (x, px) in dst.iter_mut().enumerate() {
                let fx = ((x as f32 + 0.5) * sx_ratio - 0.5).clamp(0.0, max_x);
                let x0 = fx.floor() as usize;
                let x1 = (x0 + 1).min(self.w - 1);
                let tx = fx - x0 as f32;
                let top = row0[x0] + (row0[x1] - row0[x0]) * tx;
                let bottom = row1[x0] + (row1[x1] - row1[x0]) * tx;
                *px = top + (bottom - top) * ty;
            }
        }
        out
    }
}

impl ImageView for ImageF32 {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for ImageF32 {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}

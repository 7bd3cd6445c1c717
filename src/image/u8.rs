use super::traits::ImageView;

/// Borrowed 8-bit grayscale frame, possibly with padded rows.
#[derive(Clone, Copy, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    /// Bytes between the starts of consecutive rows.
    pub stride: usize,
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    /// Tightly packed view (`stride == w`).
    pub fn packed(w: usize, h: usize, data: &'a [u8]) -> Self {
        Self {
            w,
            h,
            stride: w,
            data,
        }
    }
}

impl ImageView for ImageU8<'_> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF32;

    #[test]
    fn padded_rows_skip_the_padding() {
        // 3x2 frame stored with a stride of 4; the padding byte is 99.
        let data = [0u8, 51, 255, 99, 102, 153, 204, 99];
        let view = ImageU8 {
            w: 3,
            h: 2,
            stride: 4,
            data: &data,
        };
        assert_eq!(view.row(1), &[102, 153, 204]);
        let img = ImageF32::from_u8(view);
        assert_eq!(img.data.len(), 6);
        assert!(img.data.iter().all(|&v| (v - 99.0 / 255.0).abs() > 1e-3));
        assert!((img.get(2, 1) - 0.8).abs() < 1e-6);
    }
}

/// Row access to a single-channel image whose rows may be padded.
pub trait ImageView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// The `width()` pixels of row `y`, without padding.
    fn row(&self, y: usize) -> &[Self::Pixel];
}

pub trait ImageViewMut: ImageView {
    fn row_mut(&mut self, y: usize) -> &mut [Self::Pixel];
}

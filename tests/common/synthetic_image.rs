use cascade_detector::image::ImageF32;
use std::path::Path;

/// High-contrast checkerboard; `phase` shifts the pattern right and down.
pub fn checkerboard_u8(width: usize, height: usize, cell: usize, phase: usize) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(cell > 0, "cell size must be positive");

    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let cx = (x + phase) / cell;
            let cy = (y + phase) / cell;
            img[y * width + x] = if (cx + cy) & 1 == 0 { 32 } else { 220 };
        }
    }
    img
}

pub fn flat_u8(width: usize, height: usize, level: u8) -> Vec<u8> {
    vec![level; width * height]
}

/// Shallow left-to-right ramp from `from` to `to`.
pub fn ramp_u8(width: usize, height: usize, from: u8, to: u8) -> Vec<u8> {
    let span = to as f32 - from as f32;
    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let t = x as f32 / (width.max(2) - 1) as f32;
            img[y * width + x] = (from as f32 + span * t).round() as u8;
        }
    }
    img
}

pub fn to_f32(width: usize, height: usize, data: &[u8]) -> ImageF32 {
    let mut img = ImageF32::new(width, height);
    for (dst, &src) in img.data.iter_mut().zip(data) {
        *dst = src as f32 / 255.0;
    }
    img
}

pub fn save_png(path: &Path, width: usize, height: usize, data: Vec<u8>) {
    image::GrayImage::from_raw(width as u32, height as u32, data)
        .expect("buffer matches dimensions")
        .save(path)
        .expect("write png");
}

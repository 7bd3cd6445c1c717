//! Grayscale image buffers consumed by the scanner and feature extractors.
//!
//! - `ImageU8`: borrowed 8-bit view with stride (camera frames, decoded files).
//! - `ImageF32`: owned float buffer in `[0, 1]`, the working format of the
//!   feature extractors.
pub mod f32;
pub mod io;
pub mod traits;
pub mod u8;

pub use self::f32::ImageF32;
pub use self::traits::{ImageView, ImageViewMut};
pub use self::u8::ImageU8;

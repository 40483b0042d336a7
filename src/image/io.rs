//! Loading and saving images through the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{Image, Mask};
use crate::util::{PatchFillError, PatchFillResult};
use std::path::Path;

fn io_error(err: impl std::fmt::Display) -> PatchFillError {
    PatchFillError::ImageIo {
        reason: err.to_string(),
    }
}

fn open<P: AsRef<Path>>(path: P) -> PatchFillResult<image::DynamicImage> {
    image::open(path).map_err(io_error)
}

/// Converts a decoded RGB buffer into a 3-channel image.
pub fn from_rgb_image(img: &image::RgbImage) -> PatchFillResult<Image<u8>> {
    Image::new(
        img.as_raw().clone(),
        img.width() as usize,
        img.height() as usize,
        3,
    )
}

/// Converts a decoded grayscale buffer into a 1-channel image.
pub fn from_gray_image(img: &image::GrayImage) -> PatchFillResult<Image<u8>> {
    Image::new(
        img.as_raw().clone(),
        img.width() as usize,
        img.height() as usize,
        1,
    )
}

/// Loads an image from disk as 3-channel RGB.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> PatchFillResult<Image<u8>> {
    from_rgb_image(&open(path)?.to_rgb8())
}

/// Loads an image from disk as single-channel grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> PatchFillResult<Image<u8>> {
    from_gray_image(&open(path)?.to_luma8())
}

/// Loads a mask; any nonzero luminance becomes `255`.
pub fn load_mask<P: AsRef<Path>>(path: P) -> PatchFillResult<Mask> {
    let mut mask = load_gray_image(path)?;
    for v in mask.data_mut() {
        if *v != 0 {
            *v = 255;
        }
    }
    Ok(mask)
}

/// Writes a 1- or 3-channel image; the format follows the file extension.
pub fn save_image<P: AsRef<Path>>(img: &Image<u8>, path: P) -> PatchFillResult<()> {
    let (w, h) = (img.width() as u32, img.height() as u32);
    match img.channels() {
        1 => image::GrayImage::from_raw(w, h, img.data().to_vec())
            .ok_or_else(|| io_error("buffer does not match image size"))?
            .save(path)
            .map_err(io_error),
        3 => image::RgbImage::from_raw(w, h, img.data().to_vec())
            .ok_or_else(|| io_error("buffer does not match image size"))?
            .save(path)
            .map_err(io_error),
        got => Err(PatchFillError::UnsupportedChannels {
            expected: "1 or 3",
            got,
        }),
    }
}

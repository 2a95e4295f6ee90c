use crate::error::OcrError;
use image::{DynamicImage, GrayImage, Luma};

/// Convert image to 8-bit grayscale.
/// Transparent pixels are composited onto white so cut-out text keeps its contrast.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    if !image.color().has_alpha() {
        return Ok(DynamicImage::ImageLuma8(image.to_luma8()));
    }

    let la = image.to_luma_alpha8();
    let flattened = GrayImage::from_fn(la.width(), la.height(), |x, y| {
        let [l, a] = la.get_pixel(x, y).0;
        let alpha = a as u32;
        Luma([((l as u32 * alpha + 255 * (255 - alpha)) / 255) as u8])
    });
    Ok(DynamicImage::ImageLuma8(flattened))
}

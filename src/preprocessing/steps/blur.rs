use crate::error::OcrError;
use image::{DynamicImage, Luma};
use imageproc::filter::separable_filter_equal;

/// 1-D taps of the fixed 3x3 Gaussian kernel ([1 2 1; 2 4 2; 1 2 1] / 16)
const KERNEL_3X3: [f32; 3] = [0.25, 0.5, 0.25];

/// Smooth sensor and compression noise with a 3x3 Gaussian
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let gray = image.to_luma8();
    let blurred = separable_filter_equal::<Luma<u8>, f32>(&gray, &KERNEL_3X3);
    Ok(DynamicImage::ImageLuma8(blurred))
}

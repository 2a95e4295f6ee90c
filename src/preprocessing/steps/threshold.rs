use crate::error::OcrError;
use image::{DynamicImage, GrayImage, Luma};

/// Adaptive threshold parameters
const BLOCK_SIZE: usize = 11;
const OFFSET: i32 = 2;

/// Apply adaptive Gaussian thresholding.
///
/// A pixel turns white when it is brighter than the Gaussian-weighted mean of
/// its 11x11 neighbourhood minus `OFFSET`, black otherwise. Handles uneven
/// lighting but can erase faint strokes.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let gray = image.to_luma8();
    let binarized = adaptive_gaussian_threshold(&gray, BLOCK_SIZE, OFFSET)?;
    Ok(DynamicImage::ImageLuma8(binarized))
}

fn adaptive_gaussian_threshold(
    img: &GrayImage,
    block_size: usize,
    offset: i32,
) -> Result<GrayImage, OcrError> {
    if block_size % 2 == 0 || block_size < 3 {
        return Err(OcrError::PreprocessingError(format!(
            "block size must be odd and >= 3, got {}",
            block_size
        )));
    }

    let means = local_means(img, &gaussian_kernel(block_size));
    let width = img.width() as usize;

    Ok(GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let mean = means[y as usize * width + x as usize].round() as i32;
        let pixel = img.get_pixel(x, y).0[0] as i32;
        if pixel - mean > -offset {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    }))
}

/// Normalized Gaussian taps, sigma derived from the window size
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as f32;
    let taps: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - half;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

/// Separable convolution with mirrored borders (`dcb|abcd|cba`)
///
/// imageproc's filters clamp at the edges, so they cannot produce this border.
fn local_means(img: &GrayImage, kernel: &[f32]) -> Vec<f32> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let radius = (kernel.len() / 2) as i64;

    let mut horizontal = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            horizontal[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let sx = reflect(x as i64 + k as i64 - radius, width);
                    w * img.get_pixel(sx as u32, y as u32).0[0] as f32
                })
                .sum();
        }
    }

    let mut means = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            means[y * width + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let sy = reflect(y as i64 + k as i64 - radius, height);
                    w * horizontal[sy * width + x]
                })
                .sum();
        }
    }

    means
}

fn reflect(mut i: i64, len: usize) -> usize {
    let n = len as i64;
    if n == 1 {
        return 0;
    }
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * n - 2 - i;
        }
    }
    i as usize
}

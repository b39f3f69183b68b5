//! Image decoding and conversion to the network's input tensor.

use image::{imageops, imageops::FilterType, DynamicImage, RgbImage};

use crate::{Error, Result, Tensor};

/// Antialiased bilinear filter, the closest match to PIL's default resize.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Decode raw upload bytes (JPEG, PNG, ...) into an image with at least one pixel.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image)
}

/// Resize an RGB image to `size`x`size`.
fn resize_image(image: &RgbImage, size: u32) -> RgbImage {
    imageops::resize(image, size, size, RESIZE_FILTER)
}

/// Convert to RGB, resize to `size`x`size` and scale to `[0, 1]`.
/// Returns CHW layout: `[3, size, size]`.
pub fn to_tensor(image: &DynamicImage, size: u32) -> Result<Tensor> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }

    // Color conversion happens before resizing, matching the training pipeline.
    let rgb = image.to_rgb8();
    let resized = resize_image(&rgb, size);

    let side = size as usize;
    let num_pixels = side * side;
    let mut chw = vec![0.0f32; 3 * num_pixels];

    for (i, pixel) in resized.pixels().enumerate() {
        chw[i] = pixel[0] as f32 / 255.0;
        chw[num_pixels + i] = pixel[1] as f32 / 255.0;
        chw[2 * num_pixels + i] = pixel[2] as f32 / 255.0;
    }

    Tensor::from_vec(chw, &[3, side, side])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_to_tensor_shape_and_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(300, 200, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));

        let tensor = to_tensor(&img, 128).unwrap();

        assert_eq!(tensor.shape(), &[3, 128, 128]);
        assert!(tensor.to_vec().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_channel_first_layout() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 0, 51])));

        let tensor = to_tensor(&img, 4).unwrap();
        let chw = tensor.as_chw().unwrap();

        assert_eq!(chw[[0, 2, 3]], 1.0);
        assert_eq!(chw[[1, 2, 3]], 0.0);
        assert!((chw[[2, 2, 3]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_is_dropped() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            8,
            8,
            image::Rgba([255, 255, 255, 0]),
        ));

        let tensor = to_tensor(&img, 8).unwrap();
        assert!(tensor.to_vec().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_resize_is_deterministic() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(97, 61, |x, y| {
            Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
        }));

        let a = to_tensor(&img, 128).unwrap();
        let b = to_tensor(&img, 128).unwrap();
        assert_eq!(a.to_vec(), b.to_vec());
    }

    #[test]
    fn test_decode_png() {
        let bytes = png_bytes(DynamicImage::ImageRgb8(RgbImage::new(5, 7)));

        let img = decode_image(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (5, 7));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_image(b"not an image at all"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_empty_image_rejected() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(to_tensor(&img, 128), Err(Error::EmptyImage { .. })));
    }
}

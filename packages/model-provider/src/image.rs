//! Image input handling shared by every backend.

use ndarray::Array4;
use sightline_types::image::{
    self, DynamicImage, GenericImageView, ImageFormat, imageops::FilterType,
};
use thiserror::Error;

/// ImageNet channel means (RGB), used by timm/mobilenet style models.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations (RGB).
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Error)]
pub enum ImageInputError {
    #[error("Image is empty")]
    Empty,

    #[error("Image is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Bytes are not a recognised image format")]
    UnrecognizedFormat,

    #[error("Failed to decode {format} image: {message}")]
    Decode { format: String, message: String },
}

/// Validate and decode raw upload bytes.
///
/// The format is sniffed from the magic bytes; the declared file type of the
/// upload is never trusted.
pub fn decode_image(bytes: &[u8], max_bytes: usize) -> Result<DynamicImage, ImageInputError> {
    if bytes.is_empty() {
        return Err(ImageInputError::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(ImageInputError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let format = image::guess_format(bytes).map_err(|_| ImageInputError::UnrecognizedFormat)?;
    image::load_from_memory_with_format(bytes, format).map_err(|e| ImageInputError::Decode {
        format: format_name(format),
        message: e.to_string(),
    })
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| format!("{:?}", format).to_lowercase())
}

/// Resize to `width`x`height` and lay out as a normalised `1x3xHxW` tensor.
pub fn to_nchw_tensor(img: &DynamicImage, width: u32, height: u32) -> Array4<f32> {
    let (img_w, img_h) = img.dimensions();
    let rgb = if img_w == width && img_h == height {
        img.to_rgb8()
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
            .to_rgb8()
    };

    Array4::from_shape_fn(
        (1, 3, height as usize, width as usize),
        |(_, c, y, x)| {
            let p = rgb.get_pixel(x as u32, y as u32);
            (p[c] as f32 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c]
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_types::image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x % 2 == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png() {
        let img = decode_image(&png_bytes(4, 3), 1 << 20).unwrap();
        assert_eq!(img.dimensions(), (4, 3));
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(decode_image(&[], 1024), Err(ImageInputError::Empty)));
    }

    #[test]
    fn rejects_oversized() {
        let bytes = png_bytes(4, 4);
        let err = decode_image(&bytes, 8).unwrap_err();
        assert!(matches!(err, ImageInputError::TooLarge { limit: 8, .. }));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = decode_image(b"definitely not an image", 1024).unwrap_err();
        assert!(matches!(err, ImageInputError::UnrecognizedFormat));
    }

    #[test]
    fn rejects_truncated_image() {
        let bytes = png_bytes(8, 8);
        let err = decode_image(&bytes[..24], 1 << 20).unwrap_err();
        assert!(matches!(err, ImageInputError::Decode { .. }));
    }

    #[test]
    fn tensor_is_nchw_and_normalised() {
        let img = decode_image(&png_bytes(4, 4), 1 << 20).unwrap();
        let tensor = to_nchw_tensor(&img, 2, 2);
        assert_eq!(tensor.shape(), &[1, 3, 2, 2]);

        let same = to_nchw_tensor(&img, 4, 4);
        // pixel (0,0) is pure red
        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let blue = (0.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
        assert!((same[[0, 0, 0, 0]] - red).abs() < 1e-5);
        assert!((same[[0, 2, 0, 0]] - blue).abs() < 1e-5);
    }
}

//! Image preprocessing: grayscale + gamma, re-encoded as PNG.
//!
//! Menus are often photographed under uneven light or printed in thin,
//! low-contrast type. Dropping colour and applying a gamma above 1 darkens
//! mid-tones so faint print stands out against the paper before the model
//! sees the page.
//!
//! PNG with best compression keeps the output lossless. The source ICC
//! profile is copied onto the PNG, and the EXIF orientation is applied to
//! the pixels so phone photos reach the model upright.

use crate::error::MenuScanError;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Preprocess the image at `path` and return PNG bytes.
///
/// The format is guessed from the file content, not the extension, since
/// staged uploads carry no extension. An alpha channel is carried through.
///
/// `page` only labels errors.
pub fn preprocess_image(path: &Path, gamma: f32, page: usize) -> Result<Vec<u8>, MenuScanError> {
    let fail = |detail: String| MenuScanError::PreprocessFailed { page, detail };

    let mut decoder = ImageReader::open(path)
        .map_err(|e| fail(format!("{}: {e}", path.display())))?
        .with_guessed_format()
        .map_err(|e| fail(e.to_string()))?
        .into_decoder()
        .map_err(|e| fail(e.to_string()))?;

    // Unreadable metadata never fails the page
    let icc_profile = decoder.icc_profile().ok().flatten();
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| fail(e.to_string()))?;
    img.apply_orientation(orientation);

    let adjusted = grayscale_with_gamma(&img, gamma);

    let mut buf = Vec::new();
    let mut encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buf),
        CompressionType::Best,
        FilterType::Adaptive,
    );
    if let Some(icc) = icc_profile {
        if let Err(e) = encoder.set_icc_profile(icc) {
            debug!("Page {}: ICC profile dropped: {}", page, e);
        }
    }
    adjusted
        .write_with_encoder(encoder)
        .map_err(|e| fail(format!("PNG encoding: {e}")))?;

    debug!(
        "Page {}: preprocessed {}x{} px → {} bytes PNG",
        page,
        adjusted.width(),
        adjusted.height(),
        buf.len()
    );
    Ok(buf)
}

/// Async wrapper around [`preprocess_image`]; decoding and PNG compression of
/// a 3000 px page are CPU-bound, so they run on the blocking pool.
pub async fn preprocess_page(
    path: PathBuf,
    gamma: f32,
    page: usize,
) -> Result<Vec<u8>, MenuScanError> {
    tokio::task::spawn_blocking(move || preprocess_image(&path, gamma, page))
        .await
        .map_err(|e| MenuScanError::Internal(format!("Preprocess task panicked: {e}")))?
}

/// Convert to single-channel luminance and apply `255 · (v/255)^gamma`.
pub fn grayscale_with_gamma(img: &DynamicImage, gamma: f32) -> DynamicImage {
    let lut = gamma_lut(gamma);
    if img.color().has_alpha() {
        let mut luma = img.to_luma_alpha8();
        for px in luma.pixels_mut() {
            px.0[0] = lut[px.0[0] as usize];
        }
        DynamicImage::ImageLumaA8(luma)
    } else {
        let mut luma = img.to_luma8();
        for px in luma.pixels_mut() {
            px.0[0] = lut[px.0[0] as usize];
        }
        DynamicImage::ImageLuma8(luma)
    }
}

fn gamma_lut(gamma: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        let v = 255.0 * (i as f32 / 255.0).powf(gamma);
        *slot = v.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngDecoder;
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn lut_fixes_endpoints_and_darkens_midtones() {
        let lut = gamma_lut(3.0);
        assert_eq!(lut[0], 0);
        assert_eq!(lut[255], 255);
        // 255 * 0.5^3 ≈ 31.9, but 128/255 is slightly above a half
        assert_eq!(lut[128], 32);
        assert!(lut.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn gamma_one_is_identity() {
        let lut = gamma_lut(1.0);
        assert!(lut.iter().enumerate().all(|(i, &v)| v as usize == i));
    }

    #[test]
    fn colour_becomes_single_channel() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 120, 40])));
        let out = grayscale_with_gamma(&img, 3.0);
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn alpha_is_preserved() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 77])));
        let out = grayscale_with_gamma(&img, 3.0);
        let DynamicImage::ImageLumaA8(luma) = out else {
            panic!("expected LumaA8");
        };
        assert_eq!(luma.get_pixel(0, 0).0, [255, 77]);
    }

    #[test]
    fn file_round_trip_produces_png() {
        let dir = tempfile::tempdir().unwrap();
        // No extension, as a staged upload would have
        let path = dir.path().join("menu-upload");
        let img = RgbImage::from_pixel(8, 6, Rgb([128, 128, 128]));
        img.save_with_format(&path, image::ImageFormat::Jpeg).unwrap();

        let png = preprocess_image(&path, 3.0, 1).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (8, 6));
        assert!(decoded.get_pixel(3, 3).0[0] < 64);
    }

    #[test]
    fn icc_profile_is_carried_into_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        let icc: Vec<u8> = (0..=255u8).cycle().take(560).collect();

        let mut input = Vec::new();
        let mut encoder = PngEncoder::new(Cursor::new(&mut input));
        encoder.set_icc_profile(icc.clone()).unwrap();
        let pixels = RgbImage::from_pixel(5, 3, Rgb([90, 140, 200]));
        encoder
            .write_image(pixels.as_raw(), 5, 3, image::ExtendedColorType::Rgb8)
            .unwrap();
        std::fs::write(&path, &input).unwrap();

        let png = preprocess_image(&path, 3.0, 1).unwrap();
        let mut decoder = PngDecoder::new(Cursor::new(&png)).unwrap();
        assert_eq!(decoder.icc_profile().unwrap(), Some(icc));
    }

    #[test]
    fn exif_orientation_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");

        let mut jpeg = Vec::new();
        RgbImage::from_pixel(8, 4, Rgb([200, 200, 200]))
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        // APP1 Exif segment: big-endian TIFF, one IFD entry, Orientation = 6 (rotate 90° CW)
        let tiff: &[u8] = &[
            b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, // header
            0x00, 0x01, // one entry
            0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x06, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, // no next IFD
        ];
        let len = (2 + 6 + tiff.len()) as u16;
        let mut app1 = vec![0xFF, 0xE1];
        app1.extend_from_slice(&len.to_be_bytes());
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(tiff);
        jpeg.splice(2..2, app1);
        std::fs::write(&path, &jpeg).unwrap();

        let png = preprocess_image(&path, 3.0, 1).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (4, 8));
    }

    #[test]
    fn non_image_fails_with_page_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();
        let err = preprocess_image(&path, 3.0, 5).unwrap_err();
        assert!(matches!(err, MenuScanError::PreprocessFailed { page: 5, .. }));
    }

    #[tokio::test]
    async fn async_wrapper_runs_on_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        RgbImage::from_pixel(3, 3, Rgb([10, 20, 30])).save(&path).unwrap();
        let png = preprocess_page(path, 2.0, 1).await.unwrap();
        assert!(!png.is_empty());
    }
}

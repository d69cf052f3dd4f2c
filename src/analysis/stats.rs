//! Basic image statistics used by the heuristic scorers.
//!
//! Everything here is pure: bytes in, numbers out. The statistics double as
//! the `basic_analysis` section attached to every analysis result.

use image::{DynamicImage, ImageFormat, ImageReader};
use imageproc::edges::canny;
use imageproc::filter::laplacian_filter;
use serde::Serialize;
use std::io::Cursor;

use super::AnalysisError;
use crate::constants::{CANNY_HIGH, CANNY_LOW};

/// Statistics computed from a decoded image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageStats {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub format: Option<String>,
    /// Per-channel mean in [0, 255]; one entry for grayscale, three for color
    pub mean_color: Vec<f64>,
    /// Per-channel standard deviation, same shape as `mean_color`
    pub std_color: Vec<f64>,
    /// Fraction of pixels flagged by Canny edge detection
    pub edge_density: f64,
    /// Variance of the discrete Laplacian of the grayscale image
    pub sharpness: f64,
    /// 256-bin per-channel histograms (color images only)
    pub histogram: Option<ColorHistogram>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorHistogram {
    pub red: Vec<u32>,
    pub green: Vec<u32>,
    pub blue: Vec<u32>,
}

impl ImageStats {
    /// Mean of the per-channel standard deviations ("color variance")
    pub fn color_variance(&self) -> f64 {
        mean(&self.std_color)
    }

    /// Mean of the per-channel means ("color balance")
    pub fn color_balance(&self) -> f64 {
        mean(&self.mean_color)
    }

    pub fn is_color(&self) -> bool {
        self.channels >= 3
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0 {
            self.width as f64 / self.height as f64
        } else {
            1.0
        }
    }

    /// The `basic_analysis` payload attached to analysis results
    pub fn to_basic_analysis(&self) -> serde_json::Value {
        serde_json::json!({
            "image_properties": {
                "width": self.width,
                "height": self.height,
                "channels": self.channels,
                "format": self.format,
            },
            "color_analysis": {
                "mean_color": self.mean_color,
                "std_color": self.std_color,
                "edge_density": self.edge_density,
                "sharpness": self.sharpness,
            },
            "histogram": {
                "red": self.histogram.as_ref().map(|h| &h.red),
                "green": self.histogram.as_ref().map(|h| &h.green),
                "blue": self.histogram.as_ref().map(|h| &h.blue),
            },
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Decode raw upload bytes, remembering the container format when detectable.
pub fn decode(bytes: &[u8]) -> Result<(DynamicImage, Option<ImageFormat>), AnalysisError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AnalysisError::Decode(e.to_string()))?;
    let format = reader.format();
    let image = reader
        .decode()
        .map_err(|e| AnalysisError::Decode(e.to_string()))?;
    Ok((image, format))
}

/// Compute all statistics from a decoded image.
pub fn compute(image: &DynamicImage, format: Option<ImageFormat>) -> ImageStats {
    let width = image.width();
    let height = image.height();
    let channels = image.color().channel_count();
    let pixel_count = (width as u64 * height as u64).max(1) as f64;

    let (mean_color, std_color, histogram) = if channels >= 3 {
        let rgb = image.to_rgb8();
        let mut sum = [0f64; 3];
        let mut sum_sq = [0f64; 3];
        let mut bins = [[0u32; 256], [0u32; 256], [0u32; 256]];
        for px in rgb.pixels() {
            for c in 0..3 {
                let v = px.0[c] as f64;
                sum[c] += v;
                sum_sq[c] += v * v;
                bins[c][px.0[c] as usize] += 1;
            }
        }
        let mut means = Vec::with_capacity(3);
        let mut stds = Vec::with_capacity(3);
        for c in 0..3 {
            let m = sum[c] / pixel_count;
            means.push(m);
            stds.push((sum_sq[c] / pixel_count - m * m).max(0.0).sqrt());
        }
        let histogram = ColorHistogram {
            red: bins[0].to_vec(),
            green: bins[1].to_vec(),
            blue: bins[2].to_vec(),
        };
        (means, stds, Some(histogram))
    } else {
        let luma = image.to_luma8();
        let mut sum = 0f64;
        let mut sum_sq = 0f64;
        for px in luma.pixels() {
            let v = px.0[0] as f64;
            sum += v;
            sum_sq += v * v;
        }
        let m = sum / pixel_count;
        let std = (sum_sq / pixel_count - m * m).max(0.0).sqrt();
        (vec![m], vec![std], None)
    };

    let gray = image.to_luma8();

    let edges = canny(&gray, CANNY_LOW, CANNY_HIGH);
    let edge_pixels = edges.pixels().filter(|p| p.0[0] > 0).count();
    let edge_density = edge_pixels as f64 / pixel_count;

    let laplacian = laplacian_filter(&gray);
    let mut sum = 0f64;
    let mut sum_sq = 0f64;
    for px in laplacian.pixels() {
        let v = px.0[0] as f64;
        sum += v;
        sum_sq += v * v;
    }
    let lap_mean = sum / pixel_count;
    let sharpness = (sum_sq / pixel_count - lap_mean * lap_mean).max(0.0);

    ImageStats {
        width,
        height,
        channels,
        format: format.map(format_name),
        mean_color,
        std_color,
        edge_density,
        sharpness,
        histogram,
    }
}

/// Decode and compute in one step.
pub fn extract(bytes: &[u8]) -> Result<ImageStats, AnalysisError> {
    let (image, format) = decode(bytes)?;
    Ok(compute(&image, format))
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        other => other
            .extensions_str()
            .first()
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| format!("{:?}", other).to_uppercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbImage};
    use rand::Rng;

    fn noise_rgb(width: u32, height: u32) -> DynamicImage {
        let mut rng = rand::rng();
        let img = RgbImage::from_fn(width, height, |_, _| {
            Rgb([rng.random(), rng.random(), rng.random()])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_constant_grayscale_stats() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, image::Luma([128])));
        let stats = compute(&img, None);
        assert_eq!(stats.channels, 1);
        assert_eq!(stats.mean_color.len(), 1);
        assert!((stats.mean_color[0] - 128.0).abs() < 1e-9);
        assert!(stats.std_color[0] < 1e-9);
        assert_eq!(stats.edge_density, 0.0);
        assert_eq!(stats.sharpness, 0.0);
        assert!(stats.histogram.is_none());
    }

    #[test]
    fn test_noise_rgb_stats_in_range() {
        let stats = compute(&noise_rgb(224, 224), None);
        assert_eq!(stats.width, 224);
        assert_eq!(stats.channels, 3);
        assert_eq!(stats.mean_color.len(), 3);
        assert!(stats.edge_density >= 0.0 && stats.edge_density <= 1.0);
        assert!(stats.sharpness > 0.0);
        let hist = stats.histogram.expect("color image has histograms");
        assert_eq!(hist.red.len(), 256);
        assert_eq!(hist.red.iter().map(|&n| n as u64).sum::<u64>(), 224 * 224);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = extract(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn test_decode_png_roundtrip() {
        let mut buf = Vec::new();
        noise_rgb(32, 32)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        let stats = extract(&buf).unwrap();
        assert_eq!(stats.format.as_deref(), Some("PNG"));
        assert_eq!(stats.width, 32);
    }

    #[test]
    fn test_basic_analysis_shape() {
        let stats = compute(&noise_rgb(16, 16), Some(ImageFormat::Png));
        let value = stats.to_basic_analysis();
        assert_eq!(value["image_properties"]["width"], 16);
        assert!(value["color_analysis"]["edge_density"].is_number());
        assert!(value["histogram"]["red"].is_array());
    }
}

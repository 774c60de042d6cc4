// src/export/png.rs
//
// Rasterized report export. The UI hands over a finished screenshot and the
// region the report occupied; nothing here depends on the renderer.
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

use super::ExportError;

pub const EXPORT_SCALE: f32 = 2.0;

/// Rectangle in logical points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Screenshot pixels (straight, non-premultiplied RGBA) plus the report region.
#[derive(Debug, Clone)]
pub struct ReportCapture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    pixels_per_point: f32,
    region: CaptureRegion,
}

impl ReportCapture {
    pub fn new(
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        pixels_per_point: f32,
        region: CaptureRegion,
    ) -> Result<Self, ExportError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(ExportError::Image(format!(
                "capture holds {} bytes, expected {} for {}x{}",
                rgba.len(), expected, width, height
            )));
        }
        if !(pixels_per_point > 0.0) {
            return Err(ExportError::Image("pixels per point must be positive".to_string()));
        }
        Ok(Self { width, height, rgba, pixels_per_point, region })
    }

    pub fn region(&self) -> CaptureRegion {
        self.region
    }

    /// Region converted to pixel bounds and clamped to the screenshot.
    fn pixel_bounds(&self) -> (u32, u32, u32, u32) {
        let to_px = |v: f32, max: u32| ((v * self.pixels_per_point).round().max(0.0) as u32).min(max);
        let x0 = to_px(self.region.x, self.width);
        let y0 = to_px(self.region.y, self.height);
        let x1 = to_px(self.region.x + self.region.width, self.width);
        let y1 = to_px(self.region.y + self.region.height, self.height);
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    fn crop(&self) -> Result<RgbaImage, ExportError> {
        let full = RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
            .ok_or_else(|| ExportError::Image("invalid capture dimensions".to_string()))?;
        let (x, y, w, h) = self.pixel_bounds();
        if w == 0 || h == 0 {
            return Err(ExportError::Image("the report region is empty".to_string()));
        }
        Ok(image::imageops::crop_imm(&full, x, y, w, h).to_image())
    }
}

fn blend_over_white(channel: u8, alpha: f32) -> u8 {
    (f32::from(channel) * alpha + 255.0 * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8
}

fn flatten_on_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = f32::from(a) / 255.0;
        Rgb([
            blend_over_white(r, alpha),
            blend_over_white(g, alpha),
            blend_over_white(b, alpha),
        ])
    })
}

/// Crop, flatten onto white and rescale to twice the logical size of the
/// part of the region that was actually on screen.
pub fn render_png(capture: &ReportCapture) -> Result<Vec<u8>, ExportError> {
    let cropped = capture.crop()?;
    let flat = DynamicImage::ImageRgb8(flatten_on_white(&cropped));

    let scale = EXPORT_SCALE / capture.pixels_per_point;
    let target_w = (cropped.width() as f32 * scale).round().max(1.0) as u32;
    let target_h = (cropped.height() as f32 * scale).round().max(1.0) as u32;
    let scaled = if flat.width() == target_w && flat.height() == target_h {
        flat
    } else {
        flat.resize_exact(target_w, target_h, FilterType::Lanczos3)
    };

    let mut bytes = Vec::new();
    scaled.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(ppp: f32, region: CaptureRegion) -> ReportCapture {
        // 8x8 screenshot: opaque red everywhere except a transparent top-left pixel
        let mut rgba = Vec::new();
        for i in 0..64 {
            if i == 0 {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                rgba.extend_from_slice(&[200, 10, 10, 255]);
            }
        }
        ReportCapture::new(8, 8, rgba, ppp, region).unwrap()
    }

    #[test]
    fn output_is_twice_logical_size() {
        let region = CaptureRegion { x: 0.0, y: 0.0, width: 4.0, height: 2.0 };
        let bytes = render_png(&capture(1.0, region)).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn region_past_the_edge_keeps_aspect() {
        // 6x4 points asked for, only 3x4 of it lies inside the 8x8 screenshot
        let region = CaptureRegion { x: 5.0, y: 0.0, width: 6.0, height: 4.0 };
        let bytes = render_png(&capture(1.0, region)).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (6, 8));

        let region = CaptureRegion { x: 2.0, y: 3.0, width: 4.0, height: 4.0 };
        let bytes = render_png(&capture(2.0, region)).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 2));
    }

    #[test]
    fn high_dpi_capture_keeps_pixels() {
        let region = CaptureRegion { x: 0.0, y: 0.0, width: 2.0, height: 2.0 };
        let bytes = render_png(&capture(2.0, region)).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(decoded.get_pixel(3, 3).0, [200, 10, 10]);
    }

    #[test]
    fn region_outside_screenshot_is_error() {
        let region = CaptureRegion { x: 20.0, y: 20.0, width: 4.0, height: 4.0 };
        assert!(matches!(render_png(&capture(1.0, region)), Err(ExportError::Image(_))));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let region = CaptureRegion { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };
        assert!(ReportCapture::new(2, 2, vec![0; 3], 1.0, region).is_err());
        assert!(ReportCapture::new(1, 1, vec![0; 4], 0.0, region).is_err());
    }
}

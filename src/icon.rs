// ABOUTME: Status icon model and icon sources (named images, SF Symbols, raster bytes)
// ABOUTME: Raster icons are decoded and scaled to menu bar size with the image crate

use crate::geometry::Size;
use anyhow::{Context, Result};
use image::{ImageFormat, imageops::FilterType};
use std::fmt;
use std::io::Cursor;
use std::path::Path;

/// Menu bar icons are drawn in an 18pt box.
pub const MENU_BAR_ICON_POINTS: f64 = 18.0;

/// Raster icons are kept at 2x for Retina displays.
const MENU_BAR_ICON_PIXELS: u32 = 36;

#[derive(Debug, Clone, PartialEq)]
pub enum IconSpec {
    /// An image looked up by name in the app bundle or the system image set.
    Named(String),
    /// An SF Symbol name, e.g. `"cloud.sun"`.
    Symbol(String),
    Raster(RasterIcon),
}

impl IconSpec {
    pub fn named(name: impl Into<String>) -> Self {
        IconSpec::Named(name.into())
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        IconSpec::Symbol(name.into())
    }
}

/// PNG bytes normalized for the menu bar, plus the point size to draw them at.
#[derive(Clone, PartialEq)]
pub struct RasterIcon {
    pub png: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub point_size: Size,
}

impl fmt::Debug for RasterIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterIcon")
            .field("png_len", &self.png.len())
            .field("pixel_width", &self.pixel_width)
            .field("pixel_height", &self.pixel_height)
            .field("point_size", &self.point_size)
            .finish()
    }
}

impl RasterIcon {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut decoded =
            image::load_from_memory(bytes).context("Failed to decode status icon image")?;

        if decoded.width() > MENU_BAR_ICON_PIXELS || decoded.height() > MENU_BAR_ICON_PIXELS {
            decoded = decoded.resize(
                MENU_BAR_ICON_PIXELS,
                MENU_BAR_ICON_PIXELS,
                FilterType::Lanczos3,
            );
        }

        let (pixel_width, pixel_height) = (decoded.width(), decoded.height());
        if pixel_width == 0 || pixel_height == 0 {
            anyhow::bail!("Status icon image has no pixels");
        }

        let mut png = Cursor::new(Vec::new());
        decoded
            .write_to(&mut png, ImageFormat::Png)
            .context("Failed to encode status icon as PNG")?;

        let scale = MENU_BAR_ICON_POINTS / f64::from(pixel_width.max(pixel_height));

        Ok(Self {
            png: png.into_inner(),
            pixel_width,
            pixel_height,
            point_size: Size::new(
                f64::from(pixel_width) * scale,
                f64::from(pixel_height) * scale,
            ),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read status icon: {}", path.display()))?;
        Self::from_bytes(&bytes)
    }
}

/// What the controller believes the menu bar button currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusIcon {
    pub title: String,
    pub image: Option<IconSpec>,
    pub visible: bool,
    pub highlighted: bool,
    pub opacity: f64,
}

impl StatusIcon {
    pub fn new(title: impl Into<String>, image: Option<IconSpec>) -> Self {
        Self {
            title: title.into(),
            image,
            visible: false,
            highlighted: false,
            opacity: 1.0,
        }
    }

    /// True when the button has no image and renders its title alone.
    pub fn is_text_only(&self) -> bool {
        self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_large_raster_is_scaled_down() {
        let icon = RasterIcon::from_bytes(&png_bytes(64, 32)).unwrap();

        assert_eq!(icon.pixel_width, 36);
        assert_eq!(icon.pixel_height, 18);
        assert_eq!(icon.point_size, Size::new(18.0, 9.0));
        assert!(image::load_from_memory(&icon.png).is_ok());
    }

    #[test]
    fn test_small_raster_keeps_pixels() {
        let icon = RasterIcon::from_bytes(&png_bytes(16, 16)).unwrap();

        assert_eq!(icon.pixel_width, 16);
        assert_eq!(icon.pixel_height, 16);
        assert_eq!(icon.point_size, Size::new(18.0, 18.0));
    }

    #[test]
    fn test_invalid_raster_is_rejected() {
        let result = RasterIcon::from_bytes(b"not an image");

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to decode status icon image")
        );
    }

    #[test]
    fn test_raster_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("icon.png");
        std::fs::write(&path, png_bytes(20, 40)).unwrap();

        let icon = RasterIcon::from_file(&path).unwrap();
        assert_eq!(icon.pixel_width, 18);
        assert_eq!(icon.pixel_height, 36);
    }

    #[test]
    fn test_missing_raster_file() {
        let result = RasterIcon::from_file(Path::new("/nonexistent/icon.png"));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read status icon"));
    }

    #[test]
    fn test_status_icon_defaults() {
        let icon = StatusIcon::new("Weather", None);

        assert!(icon.is_text_only());
        assert!(!icon.visible);
        assert!(!icon.highlighted);
        assert_eq!(icon.opacity, 1.0);

        let icon = StatusIcon::new("Weather", Some(IconSpec::symbol("cloud.sun")));
        assert!(!icon.is_text_only());
    }
}

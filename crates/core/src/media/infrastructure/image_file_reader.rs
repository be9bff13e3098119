use std::path::Path;

use crate::media::domain::image_reader::ImageReader;
use crate::shared::constants::ANALYSIS_SIZE;
use crate::shared::thumbnail::Thumbnail;

/// Decodes photos with the `image` crate and reduces them to a square.
///
/// The largest centered square is cropped out and resized to `size`×`size`,
/// so every photo reaches the detector at the same resolution.
pub struct ImageFileReader {
    size: u32,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self::with_size(ANALYSIS_SIZE)
    }

    pub fn with_size(size: u32) -> Self {
        Self { size: size.max(1) }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Thumbnail, Box<dyn std::error::Error>> {
        let rgb = image::open(path)?.to_rgb8();
        let (w, h) = rgb.dimensions();
        if w == 0 || h == 0 {
            return Err(format!("Empty image: {}", path.display()).into());
        }

        let side = w.min(h);
        let x = (w - side) / 2;
        let y = (h - side) / 2;
        let square = image::imageops::crop_imm(&rgb, x, y, side, side).to_image();
        let resized = image::imageops::resize(
            &square,
            self.size,
            self.size,
            image::imageops::FilterType::Triangle,
        );

        Ok(Thumbnail::new(resized.into_raw(), self.size, self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_striped(path: &Path, width: u32, height: u32) {
        // Outer quarters red/blue, middle half green.
        let img = image::RgbImage::from_fn(width, height, |x, _| {
            if x < width / 4 {
                image::Rgb([255, 0, 0])
            } else if x >= width * 3 / 4 {
                image::Rgb([0, 0, 255])
            } else {
                image::Rgb([0, 255, 0])
            }
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_reads_square_thumbnail_of_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_striped(&path, 400, 200);

        let thumb = ImageFileReader::with_size(64).read(&path).unwrap();

        assert_eq!(thumb.width(), 64);
        assert_eq!(thumb.height(), 64);
        assert_eq!(thumb.data().len(), 64 * 64 * 3);
    }

    #[test]
    fn test_center_crop_discards_edges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        write_striped(&path, 400, 200);

        let thumb = ImageFileReader::with_size(32).read(&path).unwrap();

        let arr = thumb.as_ndarray();
        for &(row, col) in &[(0, 0), (16, 16), (31, 31), (0, 31)] {
            assert_eq!(
                [arr[[row, col, 0]], arr[[row, col, 1]], arr[[row, col, 2]]],
                [0, 255, 0]
            );
        }
    }

    #[test]
    fn test_default_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.png");
        write_striped(&path, 40, 40);

        let thumb = ImageFileReader::new().read(&path).unwrap();

        assert_eq!(thumb.width(), ANALYSIS_SIZE);
    }

    #[test]
    fn test_non_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        assert!(ImageFileReader::new().read(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFileReader::new()
            .read(&dir.path().join("missing.png"))
            .is_err());
    }
}

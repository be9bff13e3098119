use std::path::Path;

use crate::shared::thumbnail::Thumbnail;

/// Domain interface for decoding a photo into an analysis thumbnail.
pub trait ImageReader: Send {
    fn read(&self, path: &Path) -> Result<Thumbnail, Box<dyn std::error::Error>>;
}

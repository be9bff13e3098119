use std::path::Path;

use chrono::NaiveDateTime;

/// Domain interface for recovering when a photo was taken.
///
/// `None` means the photo has no usable capture time; it is not an error.
pub trait TimestampReader: Send {
    fn read(&self, path: &Path) -> Option<NaiveDateTime>;
}

use crate::shared::photo_record::FaceDetection;
use crate::shared::thumbnail::Thumbnail;

/// Domain interface for the face detection and embedding collaborator.
///
/// Returns the single most prominent face, or `None` when the photo has
/// none. Errors are reported to the caller, which treats them as "no face".
pub trait FaceAnalyzer: Send {
    fn analyze(
        &mut self,
        thumbnail: &Thumbnail,
    ) -> Result<Option<FaceDetection>, Box<dyn std::error::Error>>;
}

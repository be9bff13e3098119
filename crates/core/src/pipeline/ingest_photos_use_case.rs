use std::path::PathBuf;
use std::time::Instant;

use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::media::domain::image_reader::ImageReader;
use crate::media::domain::timestamp_reader::TimestampReader;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::photo_record::{FailedPhoto, PhotoRecord};

/// Outcome of an ingestion run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestResult {
    /// Decoded photos in input order, each with a settled face state.
    pub records: Vec<PhotoRecord>,
    /// Photos that could not be decoded.
    pub failed: Vec<FailedPhoto>,
}

/// Turns photo files into records ready for grouping.
///
/// Each photo is decoded, timestamped and run through face analysis in
/// turn. A photo that fails to decode is listed in `failed`; a failed
/// analysis only costs the photo its face.
pub struct IngestPhotosUseCase {
    reader: Box<dyn ImageReader>,
    timestamps: Box<dyn TimestampReader>,
    analyzer: Box<dyn FaceAnalyzer>,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
}

impl IngestPhotosUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        timestamps: Box<dyn TimestampReader>,
        analyzer: Box<dyn FaceAnalyzer>,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    ) -> Self {
        Self {
            reader,
            timestamps,
            analyzer,
            logger,
            on_progress,
        }
    }

    /// Processes `paths` in order. Returns an error only when cancelled
    /// through the progress callback.
    pub fn execute(
        &mut self,
        paths: &[PathBuf],
    ) -> Result<IngestResult, Box<dyn std::error::Error>> {
        let total = paths.len();
        let mut result = IngestResult::default();

        for (index, path) in paths.iter().enumerate() {
            let started = Instant::now();
            match self.reader.read(path) {
                Ok(thumbnail) => {
                    self.logger.timing("decode", elapsed_ms(started));

                    let started = Instant::now();
                    let timestamp = self.timestamps.read(path);
                    self.logger.timing("timestamp", elapsed_ms(started));
                    if timestamp.is_none() {
                        log::debug!("No capture time for {}", path.display());
                    }

                    let mut record = PhotoRecord::new(path.clone(), timestamp);
                    let started = Instant::now();
                    record.apply_detection(self.analyzer.analyze(&thumbnail));
                    self.logger.timing("detect", elapsed_ms(started));

                    result.records.push(record);
                }
                Err(e) => {
                    log::warn!("Cannot decode {}: {e}", path.display());
                    result.failed.push(FailedPhoto {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }

            self.logger.progress(index + 1, total);
            self.report_progress(index + 1, total)?;
        }

        let faces = result.records.iter().filter(|r| r.has_face()).count();
        let undated = result
            .records
            .iter()
            .filter(|r| r.timestamp.is_none())
            .count();
        self.logger.info(&format!(
            "Analyzed {} photos: {faces} with a face, {undated} without a timestamp, {} failed",
            result.records.len(),
            result.failed.len()
        ));
        self.logger.summary();

        Ok(result)
    }

    fn report_progress(
        &self,
        current: usize,
        total: usize,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(ref callback) = self.on_progress {
            if !callback(current, total) {
                return Err("Cancelled".into());
            }
        }
        Ok(())
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::photo_record::{FaceDetection, FaceState};
    use crate::shared::thumbnail::Thumbnail;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Fails to decode any path whose file name contains "broken".
    struct StubReader;

    impl ImageReader for StubReader {
        fn read(&self, path: &Path) -> Result<Thumbnail, Box<dyn std::error::Error>> {
            if path.to_string_lossy().contains("broken") {
                return Err("unsupported image format".into());
            }
            Ok(Thumbnail::new(vec![0; 4 * 4 * 3], 4, 4))
        }
    }

    /// Photos named "undated*" have no timestamp.
    struct StubTimestamps;

    impl TimestampReader for StubTimestamps {
        fn read(&self, path: &Path) -> Option<NaiveDateTime> {
            if path.to_string_lossy().contains("undated") {
                return None;
            }
            NaiveDate::from_ymd_opt(2021, 6, 1)?.and_hms_opt(10, 0, 0)
        }
    }

    /// Never finds a face; counts how often it ran.
    struct StubAnalyzer {
        calls: Arc<Mutex<usize>>,
    }

    impl FaceAnalyzer for StubAnalyzer {
        fn analyze(
            &mut self,
            _thumbnail: &Thumbnail,
        ) -> Result<Option<FaceDetection>, Box<dyn std::error::Error>> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            Ok(None)
        }
    }

    /// Replays one scripted outcome per call.
    struct ScriptedAnalyzer {
        script: Vec<Result<Option<FaceDetection>, String>>,
    }

    impl FaceAnalyzer for ScriptedAnalyzer {
        fn analyze(
            &mut self,
            _thumbnail: &Thumbnail,
        ) -> Result<Option<FaceDetection>, Box<dyn std::error::Error>> {
            match self.script.remove(0) {
                Ok(detection) => Ok(detection),
                Err(e) => Err(e.into()),
            }
        }
    }

    struct RecordingLogger {
        stages: Arc<Mutex<Vec<String>>>,
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, _current: usize, _total: usize) {}

        fn timing(&mut self, stage: &str, _duration_ms: f64) {
            self.stages.lock().unwrap().push(stage.to_string());
        }

        fn info(&mut self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    // --- Helpers ---

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    fn face() -> FaceDetection {
        FaceDetection {
            embedding: vec![1.0, 0.0],
            confidence: 0.93,
        }
    }

    fn use_case(
        analyzer: Box<dyn FaceAnalyzer>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    ) -> IngestPhotosUseCase {
        IngestPhotosUseCase::new(
            Box::new(StubReader),
            Box::new(StubTimestamps),
            analyzer,
            Box::new(crate::pipeline::pipeline_logger::NullPipelineLogger),
            on_progress,
        )
    }

    // --- Tests ---

    #[test]
    fn test_records_keep_input_order_and_outcomes() {
        let analyzer = ScriptedAnalyzer {
            script: vec![Ok(Some(face())), Ok(None), Err("model crashed".into())],
        };
        let mut uc = use_case(Box::new(analyzer), None);

        let result = uc
            .execute(&paths(&["face.jpg", "scene.jpg", "error.jpg"]))
            .unwrap();

        let names: Vec<&Path> = result.records.iter().map(|r| r.path()).collect();
        assert_eq!(
            names,
            vec![Path::new("face.jpg"), Path::new("scene.jpg"), Path::new("error.jpg")]
        );
        assert!(result.records[0].has_face());
        assert_eq!(result.records[0].confidence(), 0.93);
        assert_eq!(result.records[1].face, FaceState::NoFace);
        assert_eq!(result.records[2].face, FaceState::NoFace);
        assert!(result.records.iter().all(|r| !r.is_pending()));
        assert!(result.failed.is_empty());
    }

    #[test]
    fn test_undecodable_photos_are_listed_as_failed() {
        let calls = Arc::new(Mutex::new(0));
        let mut uc = use_case(
            Box::new(StubAnalyzer {
                calls: calls.clone(),
            }),
            None,
        );

        let result = uc
            .execute(&paths(&["a.jpg", "broken.heic", "b.jpg"]))
            .unwrap();

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].path, PathBuf::from("broken.heic"));
        assert!(result.failed[0].error.contains("unsupported"));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_missing_timestamp_is_kept() {
        let mut uc = use_case(
            Box::new(StubAnalyzer {
                calls: Arc::new(Mutex::new(0)),
            }),
            None,
        );

        let result = uc.execute(&paths(&["undated.jpg", "dated.jpg"])).unwrap();

        assert_eq!(result.records[0].timestamp, None);
        assert!(result.records[1].timestamp.is_some());
    }

    #[test]
    fn test_progress_reported_for_every_photo() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let mut uc = use_case(
            Box::new(StubAnalyzer {
                calls: Arc::new(Mutex::new(0)),
            }),
            Some(Box::new(move |current, total| {
                seen_cb.lock().unwrap().push((current, total));
                true
            })),
        );

        uc.execute(&paths(&["a.jpg", "broken.jpg", "c.jpg"]))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_cancel_stops_processing() {
        let calls = Arc::new(Mutex::new(0));
        let mut uc = use_case(
            Box::new(StubAnalyzer {
                calls: calls.clone(),
            }),
            Some(Box::new(|current, _| current < 2)),
        );

        let err = uc
            .execute(&paths(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]))
            .unwrap_err();

        assert_eq!(err.to_string(), "Cancelled");
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_empty_input() {
        let mut uc = use_case(
            Box::new(StubAnalyzer {
                calls: Arc::new(Mutex::new(0)),
            }),
            None,
        );

        let result = uc.execute(&[]).unwrap();

        assert_eq!(result, IngestResult::default());
    }

    #[test]
    fn test_logger_receives_stage_timings_and_summary() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let messages = Arc::new(Mutex::new(Vec::new()));
        let mut uc = IngestPhotosUseCase::new(
            Box::new(StubReader),
            Box::new(StubTimestamps),
            Box::new(ScriptedAnalyzer {
                script: vec![Ok(Some(face()))],
            }),
            Box::new(RecordingLogger {
                stages: stages.clone(),
                messages: messages.clone(),
            }),
            None,
        );

        uc.execute(&paths(&["face.jpg", "broken.jpg"])).unwrap();

        assert_eq!(*stages.lock().unwrap(), vec!["decode", "timestamp", "detect"]);
        let messages = messages.lock().unwrap();
        assert_eq!(
            messages.last().unwrap(),
            "Analyzed 1 photos: 1 with a face, 0 without a timestamp, 1 failed"
        );
    }
}

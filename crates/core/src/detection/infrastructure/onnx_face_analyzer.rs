//! Face detection and embedding with ONNX Runtime via `ort`.
//!
//! A YOLO face model finds the most confident face in the thumbnail; an
//! ArcFace model turns a square crop around it into an L2-normalized
//! embedding, so cosine similarity reduces to a dot product.
use std::path::Path;

use ndarray::Array4;
use ort::session::Session;

use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::shared::photo_record::FaceDetection;
use crate::shared::thumbnail::Thumbnail;

use super::onnx_session::open_session;

/// Fallback YOLO input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// YOLO padding gray (114/255).
const PAD_VALUE: f32 = 114.0 / 255.0;

const EMBEDDING_INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

/// Extra context around the detected box, as a fraction of its longer side.
const FACE_MARGIN: f64 = 0.2;

/// Detector output box in thumbnail coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
}

/// Maps letterboxed model coordinates back to the source image.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LetterboxTransform {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl LetterboxTransform {
    fn to_source(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

pub struct OnnxFaceAnalyzer {
    detector: Session,
    embedder: Session,
    input_size: u32,
    min_confidence: f64,
}

impl OnnxFaceAnalyzer {
    /// Loads both models. The detector's input resolution is read from its
    /// NCHW input shape, falling back to 640 when the shape is dynamic.
    pub fn new(
        detector_path: &Path,
        embedder_path: &Path,
        min_confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let detector = open_session(detector_path)?;
        let embedder = open_session(embedder_path)?;

        let input_size = detector
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            detector,
            embedder,
            input_size,
            min_confidence,
        })
    }

    fn detect(&mut self, thumbnail: &Thumbnail) -> Result<Option<FaceBox>, Box<dyn std::error::Error>> {
        let (input, transform) = letterbox(thumbnail, self.input_size);
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.detector.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Face detector produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get detector output slice")?;

        let boxes = parse_detections(data, tensor.shape(), &transform, self.min_confidence)?;
        log::trace!("{} candidate faces above {}", boxes.len(), self.min_confidence);
        Ok(best_face(&boxes))
    }

    fn embed(&mut self, face: &Thumbnail) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let input_value = ort::value::Tensor::from_array(preprocess_face(face))?;
        let outputs = self.embedder.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Embedding model produced no outputs".into());
        }
        let array = outputs[0].try_extract_array::<f32>()?;
        let mut embedding = array
            .as_slice()
            .ok_or("Cannot get embedding slice")?
            .to_vec();
        if embedding.is_empty() {
            return Err("Embedding model produced an empty vector".into());
        }
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

impl FaceAnalyzer for OnnxFaceAnalyzer {
    fn analyze(
        &mut self,
        thumbnail: &Thumbnail,
    ) -> Result<Option<FaceDetection>, Box<dyn std::error::Error>> {
        let Some(face) = self.detect(thumbnail)? else {
            return Ok(None);
        };
        let Some(crop) = square_crop(thumbnail, &face, FACE_MARGIN) else {
            log::debug!("Detected face box lies outside the thumbnail: {face:?}");
            return Ok(None);
        };
        let embedding = self.embed(&crop)?;
        Ok(Some(FaceDetection {
            embedding,
            confidence: face.confidence,
        }))
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Letterbox-resize into a `target_size`² NCHW tensor, nearest neighbour.
fn letterbox(thumbnail: &Thumbnail, target_size: u32) -> (Array4<f32>, LetterboxTransform) {
    let src_w = thumbnail.width() as usize;
    let src_h = thumbnail.height() as usize;
    let target = target_size as f64;

    let scale = (target / src_w as f64).min(target / src_h as f64);
    let new_w = ((src_w as f64 * scale).round() as u32).min(target_size);
    let new_h = ((src_h as f64 * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let side = target_size as usize;
    let mut tensor = Array4::<f32>::from_elem((1, 3, side, side), PAD_VALUE);
    let src = thumbnail.as_ndarray();

    for y in 0..new_h as usize {
        let sy = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let sx = ((x as f64 / scale) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, pad_y as usize + y, pad_x as usize + x]] =
                    src[[sy, sx, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        LetterboxTransform {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        },
    )
}

/// Decodes YOLO rows of `[cx, cy, w, h, conf, ...]`.
///
/// Accepts both `[1, features, detections]` and `[1, detections, features]`
/// layouts; the smaller axis is taken to be the feature axis.
fn parse_detections(
    data: &[f32],
    shape: &[usize],
    transform: &LetterboxTransform,
    min_confidence: f64,
) -> Result<Vec<FaceBox>, String> {
    if shape.len() != 3 {
        return Err(format!("Unexpected detector output shape: {shape:?}"));
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 || data.len() < num_dets * num_feats {
        return Err(format!("Detector output too small for shape {shape:?}"));
    }

    let value = |det: usize, feat: usize| -> f64 {
        let idx = if transposed {
            feat * num_dets + det
        } else {
            det * num_feats + feat
        };
        data[idx] as f64
    };

    let boxes = (0..num_dets)
        .filter(|&i| value(i, 4) >= min_confidence)
        .map(|i| {
            let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
            let (x1, y1) = transform.to_source(cx - w / 2.0, cy - h / 2.0);
            let (x2, y2) = transform.to_source(cx + w / 2.0, cy + h / 2.0);
            FaceBox {
                x1,
                y1,
                x2,
                y2,
                confidence: value(i, 4),
            }
        })
        .collect();
    Ok(boxes)
}

/// The most confident box; ties keep the earliest.
fn best_face(boxes: &[FaceBox]) -> Option<FaceBox> {
    boxes.iter().copied().reduce(|best, b| {
        if b.confidence > best.confidence {
            b
        } else {
            best
        }
    })
}

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

/// Square crop centred on the box, grown by `margin` and clamped to the image.
fn square_crop(thumbnail: &Thumbnail, face: &FaceBox, margin: f64) -> Option<Thumbnail> {
    let cx = (face.x1 + face.x2) / 2.0;
    let cy = (face.y1 + face.y2) / 2.0;
    let side = (face.x2 - face.x1).max(face.y2 - face.y1) * (1.0 + margin);
    if !side.is_finite() || side <= 0.0 {
        return None;
    }
    let half = side / 2.0;
    thumbnail.crop(
        (cx - half).floor() as i64,
        (cy - half).floor() as i64,
        (cx + half).ceil() as i64,
        (cy + half).ceil() as i64,
    )
}

/// Resize a face crop to 112x112, normalize to [-1, 1], NCHW layout.
fn preprocess_face(face: &Thumbnail) -> Array4<f32> {
    let src_w = face.width() as usize;
    let src_h = face.height() as usize;
    let src = face.as_ndarray();

    let mut tensor = Array4::<f32>::zeros((1, 3, EMBEDDING_INPUT_SIZE, EMBEDDING_INPUT_SIZE));
    for y in 0..EMBEDDING_INPUT_SIZE {
        let sy = (((y as f64 + 0.5) * src_h as f64 / EMBEDDING_INPUT_SIZE as f64) as usize)
            .min(src_h - 1);
        for x in 0..EMBEDDING_INPUT_SIZE {
            let sx = (((x as f64 + 0.5) * src_w as f64 / EMBEDDING_INPUT_SIZE as f64) as usize)
                .min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[sy, sx, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

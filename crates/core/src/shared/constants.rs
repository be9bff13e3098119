pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Side length of the square thumbnail every photo is reduced to before detection.
pub const ANALYSIS_SIZE: u32 = 300;

/// Minimum detector score for a face to count as present.
pub const DEFAULT_MIN_FACE_CONFIDENCE: f64 = 0.8;

pub const MS_PER_MINUTE: i64 = 60 * 1000;
pub const MS_PER_DAY: i64 = 24 * 60 * MS_PER_MINUTE;

/// Max gap between consecutive photos of the same cluster.
pub const DEFAULT_CLUSTER_GAP_MINUTES: u32 = 10;

/// Inclusive bounds on the gap between two linked clusters.
pub const DEFAULT_MIN_LINK_GAP_DAYS: u32 = 7;
pub const DEFAULT_MAX_LINK_GAP_DAYS: u32 = 365;

/// Minimum best-pair cosine similarity for two clusters to link.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.97;

/// Default file name of the analyzed-photo manifest.
pub const DEFAULT_MANIFEST_NAME: &str = "photochain-manifest.json";

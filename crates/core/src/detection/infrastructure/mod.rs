pub mod onnx_face_analyzer;
pub mod onnx_session;

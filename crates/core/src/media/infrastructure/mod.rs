pub mod exif_timestamp_reader;
pub mod image_file_reader;
pub mod photo_finder;

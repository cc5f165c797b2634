pub mod asset_locator;
pub mod catalog;
pub mod pipeline_logger;
pub mod segment_writer;
pub mod split_audio_use_case;
pub mod split_error;

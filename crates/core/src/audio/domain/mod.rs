pub mod audio_segment;
pub mod boundary_detector;
pub mod language_identifier;
pub mod silence_locator;
pub mod speech_recognizer;
pub mod split_point;
pub mod text_normalizer;
pub mod transcript;
pub mod word_error_rate;

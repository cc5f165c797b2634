pub mod whatlang_identifier;
pub mod whisper_recognizer;

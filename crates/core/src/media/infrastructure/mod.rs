pub mod ffmpeg_audio_reader;
pub mod ffmpeg_wav_writer;

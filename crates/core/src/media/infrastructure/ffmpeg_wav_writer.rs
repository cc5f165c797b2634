use std::fs;
use std::path::Path;

use ffmpeg_next::format::sample::Type as SampleType;
use ffmpeg_next::format::Sample;
use ffmpeg_next::util::frame::audio::Audio;
use ffmpeg_next::ChannelLayout;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::media::domain::audio_writer::AudioWriter;

const DEFAULT_FRAME_SIZE: usize = 1024;

/// Encodes an AudioSegment as 16-bit PCM in a WAV container using ffmpeg-next.
///
/// Output goes to a sibling `.part.wav` file first and is renamed over the
/// destination once the trailer is written.
pub struct FfmpegWavWriter;

impl AudioWriter for FfmpegWavWriter {
    fn write_audio(
        &self,
        path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let temp_path = path.with_extension("part.wav");
        match encode_wav(&temp_path, audio) {
            Ok(()) => {
                fs::rename(&temp_path, path)?;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }
}

fn channel_layout(channels: u16) -> Result<ChannelLayout, Box<dyn std::error::Error>> {
    match channels {
        1 => Ok(ChannelLayout::MONO),
        2 => Ok(ChannelLayout::STEREO),
        n => Err(format!("Unsupported channel count for WAV output: {n}").into()),
    }
}

fn encode_wav(path: &Path, audio: &AudioSegment) -> Result<(), Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;

    let layout = channel_layout(audio.channels())?;
    let sample_rate = audio.sample_rate();

    let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::PCM_S16LE)
        .ok_or("PCM s16le encoder not found")?;

    let mut octx = ffmpeg_next::format::output(&path)?;
    let mut ost = octx.add_stream(Some(codec))?;
    let stream_idx = ost.index();

    let mut encoder = ffmpeg_next::codec::context::Context::new_with_codec(codec)
        .encoder()
        .audio()?;
    encoder.set_rate(sample_rate as i32);
    encoder.set_channel_layout(layout);
    encoder.set_format(Sample::I16(SampleType::Packed));
    encoder.set_time_base((1, sample_rate as i32));

    let mut encoder = encoder.open_as(codec)?;
    ost.set_parameters(&encoder);

    octx.write_header()?;

    let enc_time_base = encoder.time_base();
    let ost_time_base = octx
        .stream(stream_idx)
        .ok_or("Output stream disappeared after header")?
        .time_base();

    let frame_size = match encoder.frame_size() as usize {
        0 => DEFAULT_FRAME_SIZE,
        n => n,
    };
    let channels = audio.channels() as usize;
    let mut pts: i64 = 0;

    for chunk in audio.samples().chunks(frame_size * channels) {
        let frames_in_chunk = chunk.len() / channels;
        let mut frame = Audio::new(Sample::I16(SampleType::Packed), frames_in_chunk, layout);
        frame.set_rate(sample_rate);
        frame.set_pts(Some(pts));

        let dst = frame.data_mut(0);
        for (i, &sample) in chunk.iter().enumerate() {
            let bytes = to_pcm16(sample).to_le_bytes();
            dst[i * 2..i * 2 + 2].copy_from_slice(&bytes);
        }

        encoder.send_frame(&frame)?;
        write_packets(&mut encoder, &mut octx, stream_idx, enc_time_base, ost_time_base)?;

        pts += frames_in_chunk as i64;
    }

    encoder.send_eof()?;
    write_packets(&mut encoder, &mut octx, stream_idx, enc_time_base, ost_time_base)?;

    octx.write_trailer()?;
    Ok(())
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn write_packets(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_idx);
        encoded.rescale_ts(enc_time_base, ost_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}

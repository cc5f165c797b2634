use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::format::{sample, Sample};
use ffmpeg_next::software::resampling;
use ffmpeg_next::util::frame::audio::Audio;
use ffmpeg_next::ChannelLayout;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::media::domain::audio_reader::AudioReader;

/// Decodes any ffmpeg-readable audio file (wav, mp3, m4a, ...) to f32 PCM.
pub struct FfmpegAudioReader;

type Decoder = ffmpeg_next::decoder::Audio;

/// Opens `path` and a decoder for its best audio stream, or `None` when the
/// container has no audio.
fn open_audio(
    path: &Path,
) -> Result<Option<(Input, usize, Decoder)>, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;

    let ictx = ffmpeg_next::format::input(path)?;
    let (index, parameters) = match ictx.streams().best(ffmpeg_next::media::Type::Audio) {
        Some(stream) => (stream.index(), stream.parameters()),
        None => return Ok(None),
    };

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(parameters)?;
    let decoder = codec_ctx.decoder().audio()?;
    Ok(Some((ictx, index, decoder)))
}

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
        decode(path, |_| (ChannelLayout::MONO, target_sample_rate))
    }

    fn read_native(
        &self,
        path: &Path,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
        decode(path, |decoder| (source_layout(decoder), decoder.rate()))
    }
}

/// Some containers leave the layout unset; fall back to the default layout
/// for the stream's channel count.
fn source_layout(decoder: &Decoder) -> ChannelLayout {
    let layout = decoder.channel_layout();
    if layout.is_empty() {
        ChannelLayout::default(decoder.channels() as i32)
    } else {
        layout
    }
}

/// Decodes the best audio stream of `path` to interleaved f32 in the layout
/// and rate `target` picks for it.
fn decode(
    path: &Path,
    target: impl FnOnce(&Decoder) -> (ChannelLayout, u32),
) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
    let (mut ictx, stream_index, mut decoder) = match open_audio(path)? {
        Some(opened) => opened,
        None => return Ok(None),
    };

    let (layout, rate) = target(&decoder);
    let channels = layout.channels().max(1) as usize;
    let mut resampler = resampling::Context::get(
        decoder.format(),
        source_layout(&decoder),
        decoder.rate(),
        Sample::F32(sample::Type::Packed),
        layout,
        rate,
    )?;

    let mut samples: Vec<f32> = Vec::new();
    let mut decoded = Audio::empty();
    let mut resampled = Audio::empty();

    for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        drain_decoder(&mut decoder, &mut resampler, &mut decoded, &mut resampled, channels, &mut samples)?;
    }

    decoder.send_eof()?;
    drain_decoder(&mut decoder, &mut resampler, &mut decoded, &mut resampled, channels, &mut samples)?;

    // The resampler may still hold buffered samples
    if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
        if delay.output > 0 {
            extract_f32_samples(&resampled, channels, &mut samples);
        }
    }

    log::debug!(
        "Decoded {} ({} samples, {channels} ch at {rate} Hz)",
        path.display(),
        samples.len()
    );

    Ok(Some(AudioSegment::new(samples, rate, channels as u16)))
}

fn drain_decoder(
    decoder: &mut Decoder,
    resampler: &mut resampling::Context,
    decoded: &mut Audio,
    resampled: &mut Audio,
    channels: usize,
    out: &mut Vec<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    while decoder.receive_frame(decoded).is_ok() {
        resampler.run(decoded, resampled)?;
        extract_f32_samples(resampled, channels, out);
    }
    Ok(())
}

/// Extract interleaved f32 samples from a packed resampled frame.
fn extract_f32_samples(frame: &Audio, channels: usize, out: &mut Vec<f32>) {
    let num_samples = frame.samples() * channels;
    if num_samples == 0 {
        return;
    }
    let data = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
    out.extend_from_slice(floats);
}

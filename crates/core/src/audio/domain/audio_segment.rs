/// A segment of decoded audio: interleaved PCM samples normalized to [-1.0, 1.0].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (one sample per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Whole milliseconds of audio, rounded down.
    pub fn duration_ms(&self) -> u64 {
        (self.frame_count() as u64 * 1000) / self.sample_rate.max(1) as u64
    }

    /// Interleaved sample index of the frame starting at `ms`, clamped to the
    /// end of the buffer. Always lands on a frame boundary.
    pub fn sample_index_at_ms(&self, ms: f64) -> usize {
        let frame = (ms.max(0.0) * self.sample_rate as f64 / 1000.0) as usize;
        (frame * self.channels as usize).min(self.samples.len())
    }

    /// Split into `[0, cut_ms)` and `[cut_ms, end)`.
    pub fn split_at_ms(&self, cut_ms: f64) -> (AudioSegment, AudioSegment) {
        let idx = self.sample_index_at_ms(cut_ms);
        let (head, tail) = self.samples.split_at(idx);
        (
            AudioSegment::new(head.to_vec(), self.sample_rate, self.channels),
            AudioSegment::new(tail.to_vec(), self.sample_rate, self.channels),
        )
    }
}

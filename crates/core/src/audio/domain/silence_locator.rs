use super::audio_segment::AudioSegment;

/// A stretch of audio quieter than the silence threshold, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SilenceInterval {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SilenceInterval {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Finds silent gaps by sliding a `min_silence_ms` window over the audio in
/// 1 ms steps.
///
/// A window is silent when its RMS is at or below the threshold (dBFS,
/// full scale = 1.0). Overlapping or touching silent windows merge into one
/// interval that ends where the last silent window ends.
#[derive(Clone, Debug)]
pub struct SilenceLocator {
    threshold_dbfs: f64,
    min_silence_ms: u64,
}

impl SilenceLocator {
    pub fn new(threshold_dbfs: f64, min_silence_ms: u64) -> Self {
        Self {
            threshold_dbfs,
            min_silence_ms: min_silence_ms.max(1),
        }
    }

    pub fn locate(&self, audio: &AudioSegment) -> Vec<SilenceInterval> {
        let window = self.min_silence_ms;
        let len_ms = audio.duration_ms();
        if len_ms < window {
            return Vec::new();
        }

        let threshold = dbfs_to_amplitude(self.threshold_dbfs);
        let energy = energy_prefix(audio.samples());

        let mut intervals = Vec::new();
        // (first silent window start, most recent silent window start)
        let mut run: Option<(u64, u64)> = None;

        for start in 0..=(len_ms - window) {
            let from = audio.sample_index_at_ms(start as f64);
            let to = audio.sample_index_at_ms((start + window) as f64);
            if !is_quiet(&energy, from, to, threshold) {
                continue;
            }

            run = match run {
                Some((range_start, prev)) if start <= prev + window => Some((range_start, start)),
                Some((range_start, prev)) => {
                    intervals.push(SilenceInterval::new(range_start, prev + window));
                    Some((start, start))
                }
                None => Some((start, start)),
            };
        }

        if let Some((range_start, prev)) = run {
            intervals.push(SilenceInterval::new(range_start, prev + window));
        }

        intervals
    }
}

pub fn dbfs_to_amplitude(dbfs: f64) -> f64 {
    10f64.powf(dbfs / 20.0)
}

/// Cumulative sum of squared samples; `prefix[i]` covers `samples[..i]`.
fn energy_prefix(samples: &[f32]) -> Vec<f64> {
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    let mut acc = 0.0f64;
    prefix.push(acc);
    for &s in samples {
        acc += (s as f64) * (s as f64);
        prefix.push(acc);
    }
    prefix
}

fn is_quiet(prefix: &[f64], from: usize, to: usize, threshold: f64) -> bool {
    if to <= from {
        return false;
    }
    let mean_square = (prefix[to] - prefix[from]).max(0.0) / (to - from) as f64;
    mean_square.sqrt() <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{MIN_SILENCE_MS, SILENCE_THRESHOLD_DBFS};
    use approx::assert_relative_eq;
    use rstest::rstest;

    const RATE: u32 = 16000;

    /// Builds mono audio from `(duration_ms, amplitude)` pieces.
    fn pieces(parts: &[(u64, f32)]) -> AudioSegment {
        let mut samples = Vec::new();
        for &(ms, amp) in parts {
            let n = (ms * RATE as u64 / 1000) as usize;
            samples.extend(std::iter::repeat(amp).take(n));
        }
        AudioSegment::new(samples, RATE, 1)
    }

    fn default_locator() -> SilenceLocator {
        SilenceLocator::new(SILENCE_THRESHOLD_DBFS, MIN_SILENCE_MS)
    }

    #[test]
    fn test_dbfs_to_amplitude() {
        assert_relative_eq!(dbfs_to_amplitude(0.0), 1.0);
        assert_relative_eq!(dbfs_to_amplitude(-20.0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(dbfs_to_amplitude(-50.0), 0.003_162_277, epsilon = 1e-8);
    }

    #[test]
    fn test_single_gap_between_speech() {
        let audio = pieces(&[(1000, 0.5), (300, 0.0), (1000, 0.5)]);
        let gaps = default_locator().locate(&audio);
        assert_eq!(gaps, vec![SilenceInterval::new(1000, 1300)]);
    }

    #[test]
    fn test_multiple_gaps_in_order() {
        let audio = pieces(&[
            (200, 0.4),
            (100, 0.0),
            (500, 0.4),
            (400, 0.0),
            (200, 0.4),
        ]);
        let gaps = default_locator().locate(&audio);
        assert_eq!(
            gaps,
            vec![SilenceInterval::new(200, 300), SilenceInterval::new(800, 1200)]
        );
    }

    #[test]
    fn test_gap_shorter_than_minimum_ignored() {
        let audio = pieces(&[(500, 0.5), (30, 0.0), (500, 0.5)]);
        assert!(default_locator().locate(&audio).is_empty());
    }

    #[test]
    fn test_all_silent_audio_is_one_interval() {
        let audio = pieces(&[(400, 0.0)]);
        assert_eq!(
            default_locator().locate(&audio),
            vec![SilenceInterval::new(0, 400)]
        );
    }

    #[test]
    fn test_audio_shorter_than_window_has_no_gaps() {
        let audio = pieces(&[(40, 0.0)]);
        assert!(default_locator().locate(&audio).is_empty());
    }

    #[test]
    fn test_empty_audio_has_no_gaps() {
        let audio = AudioSegment::new(Vec::new(), RATE, 1);
        assert!(default_locator().locate(&audio).is_empty());
    }

    #[rstest]
    #[case::quiet_noise_counts_as_silence(0.001, 1)]
    #[case::audible_noise_is_not_silence(0.01, 0)]
    fn test_threshold_applies_to_noise_floor(#[case] floor: f32, #[case] expected: usize) {
        let audio = pieces(&[(300, 0.5), (200, floor), (300, 0.5)]);
        assert_eq!(default_locator().locate(&audio).len(), expected);
    }

    #[test]
    fn test_stereo_gap_located_in_milliseconds() {
        let mut samples = vec![0.5f32; 2 * 44100 / 2];
        samples.extend(vec![0.0f32; 2 * 44100 / 5]);
        samples.extend(vec![0.5f32; 2 * 44100 / 2]);
        let audio = AudioSegment::new(samples, 44100, 2);
        let gaps = default_locator().locate(&audio);
        assert_eq!(gaps, vec![SilenceInterval::new(500, 700)]);
    }

    #[test]
    fn test_interval_duration() {
        assert_eq!(SilenceInterval::new(100, 250).duration_ms(), 150);
    }
}

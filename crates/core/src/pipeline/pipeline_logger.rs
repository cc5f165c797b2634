use std::time::Instant;

/// Cross-cutting logger for split job stages.
///
/// Keeps the use case independent of where timings end up (log output,
/// nothing at all in tests).
pub trait PipelineLogger: Send {
    /// Record how long a named stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. silence gap count, WER).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-job summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Records each stage of one split job in the order it ran and logs a
/// one-line breakdown through the `log` facade when the job ends.
pub struct LogPipelineLogger {
    job: String,
    started: Instant,
    stages: Vec<(String, f64)>,
    metrics: Vec<(String, f64)>,
}

impl LogPipelineLogger {
    pub fn new(job: &str) -> Self {
        Self {
            job: job.to_string(),
            started: Instant::now(),
            stages: Vec::new(),
            metrics: Vec::new(),
        }
    }

    /// `Split <job> took <total>ms (decode 12ms, ...; wer 0.125, ...)`, or
    /// `None` when nothing ran.
    fn summary_line(&self, total_ms: f64) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let stages: Vec<String> = self
            .stages
            .iter()
            .map(|(stage, ms)| format!("{stage} {ms:.0}ms"))
            .collect();
        let metrics: Vec<String> = self
            .metrics
            .iter()
            .map(|(name, value)| format!("{name} {value:.3}"))
            .collect();

        let mut line = format!("Split {} took {:.0}ms ({}", self.job, total_ms, stages.join(", "));
        if !metrics.is_empty() {
            line.push_str("; ");
            line.push_str(&metrics.join(", "));
        }
        line.push(')');
        Some(line)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        log::debug!("[{}] {stage} took {duration_ms:.1}ms", self.job);
        self.stages.push((stage.to_string(), duration_ms));
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.push((name.to_string(), value));
    }

    fn info(&mut self, message: &str) {
        log::info!("[{}] {message}", self.job);
    }

    fn summary(&self) {
        let total_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        if let Some(line) = self.summary_line(total_ms) {
            log::info!("{line}");
        }
    }
}
